use crate::duration::K8sDuration;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overrides the upstream generated for the Service with the same name.
///
/// Settings apply to every port of the Service unless a `portLevelSettings` entry names the port.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize)]
#[kube(
    group = "apisix.apache.org",
    version = "v2",
    kind = "ApisixUpstream",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ApisixUpstreamSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,

    #[serde(flatten)]
    pub config: ApisixUpstreamConfig,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_level_settings: Vec<PortLevelSettings>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixUpstreamConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<UpstreamTimeout>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsets: Vec<Subset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<Discovery>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PortLevelSettings {
    pub port: i32,

    #[serde(flatten)]
    pub config: ApisixUpstreamConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_on: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpstreamTimeout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<K8sDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send: Option<K8sDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<K8sDuration>,
}

/// A named group of endpoints selected by pod labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subset {
    pub name: String,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Hands node discovery to an APISIX discovery plugin instead of the controller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub service_name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<ActiveHealthCheck>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive: Option<PassiveHealthCheck>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveHealthCheck {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<K8sDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,

    #[serde(default, rename = "strictTLS", skip_serializing_if = "Option::is_none")]
    pub strict_tls: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub request_headers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<ActiveHealthCheckHealthy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy: Option<ActiveHealthCheckUnhealthy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveHealthCheckHealthy {
    /// When present, must be non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_codes: Option<Vec<i32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successes: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<K8sDuration>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveHealthCheckUnhealthy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_codes: Option<Vec<i32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_failures: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_failures: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<K8sDuration>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassiveHealthCheck {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<PassiveHealthCheckHealthy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy: Option<PassiveHealthCheckUnhealthy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassiveHealthCheckHealthy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_codes: Option<Vec<i32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successes: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassiveHealthCheckUnhealthy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_codes: Option<Vec<i32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_failures: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_failures: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<i32>,
}

// === impl ApisixUpstreamSpec ===

impl ApisixUpstreamSpec {
    /// Returns the settings that apply to `port`: the first matching port-level entry, else the
    /// service-level settings.
    pub fn config_for_port(&self, port: i32) -> &ApisixUpstreamConfig {
        self.port_level_settings
            .iter()
            .find(|pls| pls.port == port)
            .map(|pls| &pls.config)
            .unwrap_or(&self.config)
    }

    pub fn subset(&self, name: &str) -> Option<&Subset> {
        self.config.subsets.iter().find(|s| s.name == name)
    }
}

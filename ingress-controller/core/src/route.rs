use crate::{expr::Expr, upstream::Timeout};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plugin configurations keyed by plugin name.
///
/// Plugin payloads are opaque JSON: they are validated by the data plane, not here.
pub type Plugins = BTreeMap<String, serde_json::Value>;

/// An HTTP match-and-forward rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_addrs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<Expr>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upstream_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_config_id: Option<String>,

    #[serde(default, skip_serializing_if = "Plugins::is_empty")]
    pub plugins: Plugins,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_websocket: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Timeout>,
}

/// A layer-4 (TCP/UDP) forwarding rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamRoute {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upstream_id: String,

    #[serde(default, skip_serializing_if = "Plugins::is_empty")]
    pub plugins: Plugins,
}

/// Configuration of the `traffic-split` plugin.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSplitConfig {
    pub rules: Vec<TrafficSplitRule>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSplitRule {
    pub weighted_upstreams: Vec<WeightedUpstream>,
}

/// A share of traffic sent to an upstream. An empty `upstream_id` refers to the route's own upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedUpstream {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upstream_id: String,
    pub weight: u32,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

// === impl TrafficSplitConfig ===

impl TrafficSplitConfig {
    pub const PLUGIN_NAME: &'static str = "traffic-split";

    pub fn to_plugin(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

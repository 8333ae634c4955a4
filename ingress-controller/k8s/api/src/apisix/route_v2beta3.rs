//! The `v2beta3` ApisixRoute shape.
//!
//! Translation only ever sees the `v2` types; older objects are converted with
//! `From<ApisixRouteSpec>` as soon as they are read.

use super::route::{self as v2, ApisixRouteHttpBackend, ApisixRoutePlugin, ApisixRouteStream};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize)]
#[kube(
    group = "apisix.apache.org",
    version = "v2beta3",
    kind = "ApisixRoute",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http: Vec<ApisixRouteHttp>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream: Vec<ApisixRouteStream>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteHttp {
    pub name: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<v2::ApisixRouteTimeout>,

    #[serde(default, rename = "match")]
    pub matches: v2::ApisixRouteHttpMatch,

    /// Deprecated single-backend form; used only when `backends` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<ApisixRouteHttpBackend>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<ApisixRouteHttpBackend>,

    #[serde(default)]
    pub websocket: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_config_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<ApisixRoutePlugin>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<ApisixRouteAuthentication>,
}

/// Only `keyAuth` carried settings in this version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteAuthentication {
    #[serde(default)]
    pub enable: bool,

    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_auth: Option<v2::KeyAuth>,
}

impl From<ApisixRouteSpec> for v2::ApisixRouteSpec {
    fn from(spec: ApisixRouteSpec) -> Self {
        Self {
            ingress_class_name: None,
            http: spec.http.into_iter().map(Into::into).collect(),
            stream: spec.stream,
        }
    }
}

impl From<ApisixRouteHttp> for v2::ApisixRouteHttp {
    fn from(rule: ApisixRouteHttp) -> Self {
        let backends = if rule.backends.is_empty() {
            rule.backend.into_iter().collect()
        } else {
            rule.backends
        };
        Self {
            name: rule.name,
            priority: rule.priority,
            timeout: rule.timeout,
            matches: rule.matches,
            backends,
            websocket: rule.websocket,
            plugin_config_name: rule.plugin_config_name,
            plugins: rule.plugins,
            authentication: rule.authentication.map(Into::into),
        }
    }
}

impl From<ApisixRouteAuthentication> for v2::ApisixRouteAuthentication {
    fn from(authn: ApisixRouteAuthentication) -> Self {
        Self {
            enable: authn.enable,
            kind: authn.kind,
            key_auth: authn.key_auth,
            jwt_auth: None,
            ldap_auth: None,
        }
    }
}

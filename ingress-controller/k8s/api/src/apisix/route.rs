use crate::duration::K8sDuration;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Describes HTTP and L4 routes served by APISIX.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize)]
#[kube(
    group = "apisix.apache.org",
    version = "v2",
    kind = "ApisixRoute",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http: Vec<ApisixRouteHttp>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream: Vec<ApisixRouteStream>,
}

/// A named HTTP rule. Rule names must be unique within a resource since they feed the route id.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteHttp {
    pub name: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<ApisixRouteTimeout>,

    #[serde(default, rename = "match")]
    pub matches: ApisixRouteHttpMatch,

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

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApisixRouteTimeout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<K8sDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send: Option<K8sDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<K8sDuration>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteHttpMatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_addrs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exprs: Vec<ApisixRouteHttpMatchExpr>,
}

/// A generic match on a request attribute.
///
/// `scope` and `op` are kept as strings so that unknown values surface as translation errors
/// rather than as deserialization failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApisixRouteHttpMatchExpr {
    pub subject: ApisixRouteHttpMatchExprSubject,
    pub op: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApisixRouteHttpMatchExprSubject {
    pub scope: String,

    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteHttpBackend {
    pub service_name: String,
    pub service_port: IntOrString,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_granularity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRoutePlugin {
    pub name: String,

    #[serde(default)]
    pub enable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Map<String, serde_json::Value>>,

    /// Names a Secret in the route's namespace whose data is merged into `config`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteAuthentication {
    #[serde(default)]
    pub enable: bool,

    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_auth: Option<KeyAuth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_auth: Option<JwtAuth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldap_auth: Option<LdapAuth>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyAuth {
    #[serde(default)]
    pub header: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct JwtAuth {
    #[serde(default)]
    pub header: String,

    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub cookie: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LdapAuth {
    #[serde(default)]
    pub ldap_uri: String,

    #[serde(default)]
    pub base_dn: String,

    #[serde(default)]
    pub use_tls: bool,

    #[serde(default)]
    pub uid: String,
}

/// A TCP or UDP rule.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteStream {
    pub name: String,

    /// Either `TCP` or `UDP`.
    pub protocol: String,

    #[serde(rename = "match")]
    pub matches: ApisixRouteStreamMatch,

    pub backend: ApisixRouteStreamBackend,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<ApisixRoutePlugin>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteStreamMatch {
    pub ingress_port: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteStreamBackend {
    pub service_name: String,
    pub service_port: IntOrString,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_granularity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,
}

// === impl ApisixRouteStreamBackend ===

impl From<ApisixRouteStreamBackend> for ApisixRouteHttpBackend {
    fn from(backend: ApisixRouteStreamBackend) -> Self {
        Self {
            service_name: backend.service_name,
            service_port: backend.service_port,
            resolve_granularity: backend.resolve_granularity,
            weight: None,
            subset: backend.subset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_route_spec() {
        let spec: ApisixRouteSpec = serde_json::from_value(serde_json::json!({
            "http": [{
                "name": "rule1",
                "match": {
                    "paths": ["/ip"],
                    "exprs": [{
                        "subject": {"scope": "Header", "name": "X-Env"},
                        "op": "In",
                        "set": ["a", "b"],
                    }],
                },
                "backends": [{"serviceName": "httpbin", "servicePort": 80, "weight": 10}],
                "plugins": [{"name": "cors", "enable": true, "secretRef": "cors-conf"}],
            }],
            "stream": [{
                "name": "tcp",
                "protocol": "TCP",
                "match": {"ingressPort": 9100},
                "backend": {"serviceName": "redis", "servicePort": "tcp"},
            }],
        }))
        .unwrap();

        let rule = &spec.http[0];
        assert_eq!(rule.matches.paths, vec!["/ip".to_string()]);
        assert_eq!(rule.matches.exprs[0].set.as_deref().map(<[_]>::len), Some(2));
        assert_eq!(rule.backends[0].service_port, IntOrString::Int(80));
        assert_eq!(rule.plugins[0].secret_ref.as_deref(), Some("cors-conf"));
        assert_eq!(
            spec.stream[0].backend.service_port,
            IntOrString::String("tcp".to_string())
        );
    }
}

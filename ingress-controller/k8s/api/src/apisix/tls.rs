use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Binds a certificate Secret to a set of hosts.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize)]
#[kube(
    group = "apisix.apache.org",
    version = "v2",
    kind = "ApisixTls",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ApisixTlsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,

    #[serde(default)]
    pub hosts: Vec<String>,

    pub secret: ApisixSecret,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ApisixMutualTlsClientConfig>,
}

/// A Secret reference that always names its namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ApisixSecret {
    pub name: String,
    pub namespace: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisixMutualTlsClientConfig {
    pub ca_secret: ApisixSecret,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,

    #[serde(
        default,
        rename = "skip_mtls_uri_regex",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub skip_mtls_uri_regex: Vec<String>,
}

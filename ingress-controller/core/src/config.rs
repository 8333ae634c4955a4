use serde::Deserialize;
use std::time::Duration;

/// Settings shared by every translation call.
///
/// This is built once by the embedding process and passed by reference into each translator, so
/// that translators never consult process-global state.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslateConfig {
    /// Weight given to nodes and backends that do not specify one.
    pub default_weight: u32,

    /// Applied to each upstream timeout that an `ApisixUpstream` leaves unset.
    pub default_upstream_timeout_secs: u64,

    /// The ingress class served by this controller, e.g. "apisix".
    ///
    /// Resources that do not name a class are assumed to belong to this one.
    pub ingress_class: String,

    /// The GatewayClass controller name owned by this controller.
    pub controller_name: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            default_weight: crate::DEFAULT_WEIGHT,
            default_upstream_timeout_secs: crate::DEFAULT_UPSTREAM_TIMEOUT_SECS,
            ingress_class: "apisix".to_string(),
            controller_name: "apisix.apache.org/apisix-ingress-controller".to_string(),
        }
    }
}

impl TranslateConfig {
    pub fn default_upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.default_upstream_timeout_secs)
    }
}

//! APISIX ingress controller core
//!
//! Models the configuration objects consumed by the APISIX data plane: routes, stream routes,
//! upstreams, SSL objects and the `traffic-split` plugin configuration. Everything in this crate is
//! a plain value; the `k8s` crates produce these values from cluster resources and an external
//! collaborator pushes them to the APISIX admin API.
//!
//! ```text
//! [ ApisixRoute ] -> [ Route ] -> upstream_id -> [ Upstream ] <- [ ApisixUpstream ]
//!                              -> plugins["traffic-split"] -> [ Upstream ]...
//! [ ApisixTls ] -> [ Ssl ]
//! ```

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod config;
pub mod expr;
mod id;
pub mod route;
pub mod ssl;
pub mod upstream;

pub use self::{
    config::TranslateConfig,
    expr::{Expr, Operator, Scope, Token},
    id::{
        gen_id, plugin_config_name, route_name, ssl_name, stream_route_name, ResolveGranularity,
        UpstreamIdentity,
    },
    route::{Plugins, Route, StreamRoute, TrafficSplitConfig, TrafficSplitRule, WeightedUpstream},
    ssl::{ClientTls, Ssl},
    upstream::{Node, Timeout, Upstream},
};

/// Weight given to nodes and backends that do not specify one.
pub const DEFAULT_WEIGHT: u32 = 100;

/// Seconds applied to any upstream timeout that an override leaves unset.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// Largest value accepted for health-check success/failure counters.
pub const HEALTH_CHECK_MAX_CONSECUTIVE: i32 = 254;

/// Smallest interval accepted between active health-check probes.
pub const ACTIVE_HEALTH_CHECK_MIN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// A resource field that failed validation.
///
/// The field is a dotted path into the resource spec, e.g. `healthCheck.active.healthy.interval`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

// === impl FieldError ===

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(field: impl Into<String>) -> Self {
        Self::new(field, "invalid value")
    }

    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, "empty")
    }
}

//! Translates APISIX custom resources and Gateway API routes into APISIX data-plane objects.
//!
//! Translation is a pure function of one resource and the cluster objects it references, which are
//! read through a [`Lookup`]. Every call produces a fresh [`TranslateContext`]; nothing is cached
//! between calls.
//!
//! ```text
//! [ ApisixRoute ] --http--> [ Route ] ---upstream_id---> [ Upstream ] <- [ Service, Endpoints ]
//!                 --stream-> [ StreamRoute ]              ^
//!                                                         '-- overrides -- [ ApisixUpstream ]
//! [ HTTPRoute ] ----------> [ Route ]
//! [ ApisixTls ] ----------> [ Ssl ]
//! ```

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod backend;
mod context;
pub mod expr;
mod gateway_route;
mod nodes;
mod route;
mod stream;
mod tls;
mod traffic_split;
pub mod upstream;


pub use self::{
    backend::{translate_backend, Backend},
    context::TranslateContext,
    expr::{compile_expr, compile_rule, CompiledMatch, ExprError, MatchRule},
    gateway_route::translate_http_route,
    nodes::{resolve_nodes, service_port},
    route::translate_apisix_route,
    tls::translate_apisix_tls,
    traffic_split::translate_traffic_split,
    upstream::{translate_upstream, translate_upstream_config},
};
use apisix_ingress_controller_core::FieldError;
use apisix_ingress_controller_k8s_api::{secret::SecretError, LookupError};

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("port not defined")]
    PortNotDefined,

    #[error("conflict headless service and backend resolve granularity")]
    HeadlessGranularity,

    #[error("duplicate rule name {0:?}")]
    DuplicateRule(String),

    #[error("failed to encode plugin config: {0}")]
    Json(#[from] serde_json::Error),
}

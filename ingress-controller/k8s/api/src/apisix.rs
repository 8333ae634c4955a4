//! Custom resources in the `apisix.apache.org` group.

pub mod route;
pub mod route_v2beta3;
pub mod tls;
pub mod upstream;

pub use self::{
    route::{
        ApisixRoute, ApisixRouteAuthentication, ApisixRouteHttp, ApisixRouteHttpBackend,
        ApisixRouteHttpMatch, ApisixRouteHttpMatchExpr, ApisixRouteHttpMatchExprSubject,
        ApisixRoutePlugin, ApisixRouteSpec, ApisixRouteStream, ApisixRouteStreamBackend,
        ApisixRouteStreamMatch, ApisixRouteTimeout,
    },
    tls::{ApisixMutualTlsClientConfig, ApisixSecret, ApisixTls, ApisixTlsSpec},
    upstream::{
        ActiveHealthCheck, ActiveHealthCheckHealthy, ActiveHealthCheckUnhealthy, ApisixUpstream,
        ApisixUpstreamConfig, ApisixUpstreamSpec, Discovery, HealthCheck, LoadBalancer,
        PassiveHealthCheck, PassiveHealthCheckHealthy, PassiveHealthCheckUnhealthy,
        PortLevelSettings, Subset, UpstreamTimeout,
    },
};

/// The API group shared by all APISIX custom resources.
pub const GROUP: &str = "apisix.apache.org";

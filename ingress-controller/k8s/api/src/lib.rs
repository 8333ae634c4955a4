//! Kubernetes object model for the APISIX ingress controller: the `apisix.apache.org` custom
//! resources, the Gateway API and core types they reference, and the [`Lookup`] seam through which
//! translators read cluster state.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod apisix;
pub mod duration;
mod lookup;
pub mod secret;

pub use self::{
    duration::K8sDuration,
    lookup::{Lookup, LookupError, Snapshot},
};
pub use k8s_openapi::{
    api::{
        self,
        core::v1::{Endpoints, Pod, Secret, Service, ServicePort},
        networking::v1::{Ingress, IngressClass},
    },
    apimachinery::pkg::{apis::meta::v1::ObjectMeta, util::intstr::IntOrString},
};
pub use kube::{Resource, ResourceExt};

/// Gateway API types from the standard channel.
pub mod gateway {
    pub use gateway_api::apis::standard::{
        gatewayclasses::{GatewayClass, GatewayClassParametersRef, GatewayClassSpec},
        gateways::{Gateway, GatewayListeners, GatewayListenersTls, GatewaySpec},
        httproutes::{
            HTTPRoute, HTTPRouteRules, HTTPRouteRulesBackendRefs, HTTPRouteRulesMatches,
            HTTPRouteRulesMatchesHeaders, HTTPRouteRulesMatchesHeadersType,
            HTTPRouteRulesMatchesPath, HTTPRouteRulesMatchesPathType,
            HTTPRouteRulesMatchesQueryParams, HTTPRouteRulesMatchesQueryParamsType, HTTPRouteSpec,
        },
    };
}

//! Wires translation and validation to a Kubernetes cluster.
//!
//! [`Admission`] decides admission requests for APISIX, Gateway API and Ingress resources.
//! [`ClusterLookup`] and [`ClusterGroups`] back it with a `kube::Client`. Serving the webhook and
//! running reconcilers is left to the embedding binary, which configures translation with
//! [`TranslateArgs`].

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use apisix_ingress_controller_core as core;
pub use apisix_ingress_controller_k8s_api as k8s;
pub use apisix_ingress_controller_k8s_translate as translate;
pub use apisix_ingress_controller_k8s_validate as validate;

mod admission;
mod args;
mod groups;
mod lookup;


pub use self::{
    admission::{Admission, AdmissionRequest, AdmissionResponse},
    args::TranslateArgs,
    groups::{
        apisix_tls_class_name, gateway_class_group, ingress_class_group, ingress_class_name,
        ClusterGroups, INGRESS_CLASS_ANNOTATION,
    },
    lookup::ClusterLookup,
};

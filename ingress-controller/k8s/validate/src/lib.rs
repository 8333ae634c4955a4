//! Admission-time checks that span more than one resource.
//!
//! * [`ConflictDetector`] rejects TLS configuration that would serve two different certificates
//!   for the same host within a group of resources handled by one data plane.
//! * [`ReferenceChecker`] warns about Services and Secrets that a resource names but that do not
//!   exist (yet).
//!
//! Both read cluster state through [`Lookup`](apisix_ingress_controller_k8s_api::Lookup) and keep
//! no state between calls. Lookup failures other than "not found" are logged and treated as
//! having found nothing, so that an unavailable API server never blocks admission by itself.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cert;
mod conflict;
mod group;
mod mapping;
mod references;

#[cfg(test)]
mod tests;

pub use self::{
    cert::{inspect_secret, normalize_host, parse_certificate, CertCache, CertError, CertInfo},
    conflict::{format_conflicts, Conflict, ConflictDetector},
    group::{GroupIndex, GroupKey, Member, ResourceRef},
    mapping::{
        build_apisix_tls_mappings, build_gateway_mappings, build_ingress_mappings,
        build_member_mappings, HostCertMapping,
    },
    references::{
        apisix_route_references, apisix_tls_references, apisix_upstream_references,
        gateway_references, ingress_references, Reference, ReferenceChecker, SecretKey,
    },
};

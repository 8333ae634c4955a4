use crate::{normalize_host, CertCache, Member, ResourceRef};
use apisix_ingress_controller_k8s_api::{apisix::ApisixTls, gateway::Gateway, Ingress, Lookup};
use tracing::warn;

/// A host that a resource serves with a particular certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostCertMapping {
    /// Normalized with [`normalize_host`].
    pub host: String,
    pub cert_hash: String,
    pub resource: ResourceRef,
}

pub async fn build_member_mappings<L: Lookup + ?Sized>(
    lookup: &L,
    cache: &mut CertCache,
    member: &Member,
) -> Vec<HostCertMapping> {
    match member {
        Member::Gateway(gw) => build_gateway_mappings(lookup, cache, gw).await,
        Member::Ingress(ing) => build_ingress_mappings(lookup, cache, ing).await,
        Member::ApisixTls(tls) => build_apisix_tls_mappings(lookup, cache, tls).await,
    }
}

/// One mapping per listener host and certificate reference. A listener without a hostname serves
/// every DNS name of its certificates.
pub async fn build_gateway_mappings<L: Lookup + ?Sized>(
    lookup: &L,
    cache: &mut CertCache,
    gw: &Gateway,
) -> Vec<HostCertMapping> {
    let resource = ResourceRef::new("Gateway", gw);
    let mut mappings = Vec::new();

    for listener in &gw.spec.listeners {
        let refs = listener
            .tls
            .iter()
            .flat_map(|tls| tls.certificate_refs.iter().flatten());
        for cert_ref in refs {
            let kind = cert_ref.kind.as_deref().unwrap_or("Secret");
            let group = cert_ref.group.as_deref().unwrap_or_default();
            if kind != "Secret" || !group.is_empty() {
                continue;
            }
            let ns = cert_ref
                .namespace
                .clone()
                .unwrap_or_else(|| resource.namespace.clone());
            let hosts = listener.hostname.iter().cloned().collect::<Vec<_>>();
            add_mappings(lookup, cache, &resource, &ns, &cert_ref.name, &hosts, &mut mappings)
                .await;
        }
    }

    mappings
}

pub async fn build_ingress_mappings<L: Lookup + ?Sized>(
    lookup: &L,
    cache: &mut CertCache,
    ing: &Ingress,
) -> Vec<HostCertMapping> {
    let resource = ResourceRef::new("Ingress", ing);
    let mut mappings = Vec::new();

    let tls = ing.spec.iter().flat_map(|spec| spec.tls.iter().flatten());
    for entry in tls {
        let Some(secret_name) = entry.secret_name.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let hosts = entry.hosts.clone().unwrap_or_default();
        let ns = resource.namespace.clone();
        add_mappings(lookup, cache, &resource, &ns, secret_name, &hosts, &mut mappings).await;
    }

    mappings
}

pub async fn build_apisix_tls_mappings<L: Lookup + ?Sized>(
    lookup: &L,
    cache: &mut CertCache,
    tls: &ApisixTls,
) -> Vec<HostCertMapping> {
    let resource = ResourceRef::new("ApisixTls", tls);
    let mut mappings = Vec::new();
    add_mappings(
        lookup,
        cache,
        &resource,
        &tls.spec.secret.namespace,
        &tls.spec.secret.name,
        &tls.spec.hosts,
        &mut mappings,
    )
    .await;
    mappings
}

async fn add_mappings<L: Lookup + ?Sized>(
    lookup: &L,
    cache: &mut CertCache,
    resource: &ResourceRef,
    ns: &str,
    secret: &str,
    hosts: &[String],
    mappings: &mut Vec<HostCertMapping>,
) {
    let info = match cache.inspect(lookup, ns, secret).await {
        Ok(info) => info,
        Err(error) => {
            warn!(%error, %resource, secret.ns = %ns, secret.name = %secret, "Failed to inspect certificate");
            return;
        }
    };

    let hosts = if hosts.is_empty() {
        info.dns_names.clone()
    } else {
        hosts.iter().map(|h| normalize_host(h)).collect()
    };
    for host in hosts {
        mappings.push(HostCertMapping {
            host,
            cert_hash: info.hash.clone(),
            resource: resource.clone(),
        });
    }
}

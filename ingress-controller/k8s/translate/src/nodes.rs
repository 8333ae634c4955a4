use crate::TranslateError;
use apisix_ingress_controller_core::{Node, ResolveGranularity, TranslateConfig};
use apisix_ingress_controller_k8s_api::{
    api::core::v1::EndpointAddress, IntOrString, Lookup, ResourceExt, Service, ServicePort,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Finds the Service port referenced by number or by name.
pub fn service_port(svc: &Service, port: &IntOrString) -> Result<ServicePort, TranslateError> {
    svc.spec
        .iter()
        .flat_map(|spec| spec.ports.iter().flatten())
        .find(|sp| match port {
            IntOrString::Int(n) => sp.port == *n,
            IntOrString::String(name) => sp.name.as_deref() == Some(name.as_str()),
        })
        .cloned()
        .ok_or(TranslateError::PortNotDefined)
}

/// Resolves the nodes that back one Service port.
///
/// With [`ResolveGranularity::Service`] the Service's cluster IP is the only node. Otherwise each
/// ready endpoint address becomes a node on the endpoint port named like the Service port. When
/// `labels` is set, only addresses whose pod carries all of the labels are kept; an address whose
/// pod cannot be read is skipped.
pub async fn resolve_nodes<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    svc: &Service,
    port: &ServicePort,
    granularity: ResolveGranularity,
    labels: Option<&BTreeMap<String, String>>,
) -> Result<Vec<Node>, TranslateError> {
    let ns = svc.namespace().unwrap_or_default();
    let name = svc.name_any();
    let spec = svc.spec.clone().unwrap_or_default();

    if granularity == ResolveGranularity::Service {
        let cluster_ip = spec.cluster_ip.unwrap_or_default();
        if cluster_ip.is_empty() || cluster_ip == "None" {
            return Err(TranslateError::HeadlessGranularity);
        }
        return Ok(vec![Node {
            host: cluster_ip,
            port: port.port,
            weight: config.default_weight,
        }]);
    }

    if spec.type_.as_deref() == Some("ExternalName") {
        let host = spec.external_name.unwrap_or_default();
        return Ok(vec![Node {
            host,
            port: port.port,
            weight: config.default_weight,
        }]);
    }

    let endpoints = lookup.endpoints(&ns, &name).await?;
    let mut nodes = Vec::new();
    for subset in endpoints.subsets.iter().flatten() {
        let target = subset
            .ports
            .iter()
            .flatten()
            .find(|ep| ep.name.as_deref().unwrap_or_default() == port.name.as_deref().unwrap_or_default());
        let Some(target) = target else {
            continue;
        };

        for addr in subset.addresses.iter().flatten() {
            if let Some(labels) = labels {
                if !pod_matches(lookup, &ns, addr, labels).await {
                    continue;
                }
            }
            nodes.push(Node {
                host: addr.ip.clone(),
                port: target.port,
                weight: config.default_weight,
            });
        }
    }

    if nodes.is_empty() {
        debug!(%ns, service = %name, port = port.port, "No ready endpoints");
    }
    Ok(nodes)
}

async fn pod_matches<L: Lookup + ?Sized>(
    lookup: &L,
    ns: &str,
    addr: &EndpointAddress,
    labels: &BTreeMap<String, String>,
) -> bool {
    let Some(target) = addr.target_ref.as_ref() else {
        return false;
    };
    if target.kind.as_deref() != Some("Pod") {
        return false;
    }
    let Some(pod_name) = target.name.as_deref() else {
        return false;
    };
    let pod_ns = target.namespace.as_deref().unwrap_or(ns);

    let pod = match lookup.pod(pod_ns, pod_name).await {
        Ok(pod) => pod,
        Err(error) => {
            warn!(%error, ip = %addr.ip, "Skipping endpoint address");
            return false;
        }
    };
    let pod_labels = pod.labels();
    labels.iter().all(|(k, v)| pod_labels.get(k) == Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apisix_ingress_controller_k8s_api::{
        api::core::v1::{EndpointPort, EndpointSubset, Endpoints, ObjectReference, Pod, ServiceSpec},
        ObjectMeta, Snapshot,
    };
    use maplit::btreemap;

    fn mk_meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            namespace: Some("default".to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn mk_service(cluster_ip: &str) -> Service {
        Service {
            metadata: mk_meta("httpbin"),
            spec: Some(ServiceSpec {
                cluster_ip: Some(cluster_ip.to_string()),
                ports: Some(vec![ServicePort {
                    name: Some("http".to_string()),
                    port: 80,
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn mk_address(ip: &str, pod: &str) -> EndpointAddress {
        EndpointAddress {
            ip: ip.to_string(),
            target_ref: Some(ObjectReference {
                kind: Some("Pod".to_string()),
                name: Some(pod.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn mk_endpoints() -> Endpoints {
        Endpoints {
            metadata: mk_meta("httpbin"),
            subsets: Some(vec![EndpointSubset {
                addresses: Some(vec![mk_address("10.0.0.1", "a"), mk_address("10.0.0.2", "b")]),
                not_ready_addresses: Some(vec![mk_address("10.0.0.3", "c")]),
                ports: Some(vec![
                    EndpointPort {
                        name: Some("metrics".to_string()),
                        port: 9090,
                        ..Default::default()
                    },
                    EndpointPort {
                        name: Some("http".to_string()),
                        port: 8080,
                        ..Default::default()
                    },
                ]),
            }]),
        }
    }

    fn mk_pod(name: &str, version: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                labels: Some(btreemap! { "version".to_string() => version.to_string() }),
                ..mk_meta(name)
            },
            ..Default::default()
        }
    }

    fn mk_node(host: &str, port: i32) -> Node {
        Node {
            host: host.to_string(),
            port,
            weight: 100,
        }
    }

    #[test]
    fn finds_ports_by_number_or_name() {
        let svc = mk_service("10.96.0.10");
        assert_eq!(service_port(&svc, &IntOrString::Int(80)).unwrap().port, 80);
        assert_eq!(
            service_port(&svc, &IntOrString::String("http".to_string()))
                .unwrap()
                .port,
            80
        );
        assert!(matches!(
            service_port(&svc, &IntOrString::Int(443)),
            Err(TranslateError::PortNotDefined)
        ));
    }

    #[tokio::test]
    async fn ready_endpoints_on_named_port() {
        let svc = mk_service("10.96.0.10");
        let lookup = Snapshot::default().with_endpoints(mk_endpoints());
        let port = service_port(&svc, &IntOrString::Int(80)).unwrap();

        let nodes = resolve_nodes(
            &lookup,
            &TranslateConfig::default(),
            &svc,
            &port,
            ResolveGranularity::Endpoint,
            None,
        )
        .await
        .unwrap();
        assert_eq!(
            nodes,
            vec![mk_node("10.0.0.1", 8080), mk_node("10.0.0.2", 8080)]
        );
    }

    #[tokio::test]
    async fn service_granularity() {
        let lookup = Snapshot::default();
        let svc = mk_service("10.96.0.10");
        let port = service_port(&svc, &IntOrString::Int(80)).unwrap();
        let nodes = resolve_nodes(
            &lookup,
            &TranslateConfig::default(),
            &svc,
            &port,
            ResolveGranularity::Service,
            None,
        )
        .await
        .unwrap();
        assert_eq!(nodes, vec![mk_node("10.96.0.10", 80)]);

        let headless = mk_service("None");
        let err = resolve_nodes(
            &lookup,
            &TranslateConfig::default(),
            &headless,
            &port,
            ResolveGranularity::Service,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "conflict headless service and backend resolve granularity"
        );
    }

    #[tokio::test]
    async fn subset_labels_filter_pods() {
        let svc = mk_service("10.96.0.10");
        let lookup = Snapshot::default()
            .with_endpoints(mk_endpoints())
            .with_pod(mk_pod("a", "v1"))
            .with_pod(mk_pod("b", "v2"));
        let port = service_port(&svc, &IntOrString::Int(80)).unwrap();
        let labels = btreemap! { "version".to_string() => "v2".to_string() };

        let nodes = resolve_nodes(
            &lookup,
            &TranslateConfig::default(),
            &svc,
            &port,
            ResolveGranularity::Endpoint,
            Some(&labels),
        )
        .await
        .unwrap();
        assert_eq!(nodes, vec![mk_node("10.0.0.2", 8080)]);
    }

    #[tokio::test]
    async fn subset_skips_missing_pods() {
        let svc = mk_service("10.96.0.10");
        // Pod `b` was deleted but is still listed in the endpoints.
        let lookup = Snapshot::default()
            .with_endpoints(mk_endpoints())
            .with_pod(mk_pod("a", "v1"));
        let port = service_port(&svc, &IntOrString::Int(80)).unwrap();
        let labels = btreemap! { "version".to_string() => "v1".to_string() };

        let nodes = resolve_nodes(
            &lookup,
            &TranslateConfig::default(),
            &svc,
            &port,
            ResolveGranularity::Endpoint,
            Some(&labels),
        )
        .await
        .unwrap();
        assert_eq!(nodes, vec![mk_node("10.0.0.1", 8080)]);
    }
}

use crate::{nodes, upstream::translate_upstream, TranslateError};
use apisix_ingress_controller_core::{
    FieldError, ResolveGranularity, TranslateConfig, Upstream, UpstreamIdentity,
};
use apisix_ingress_controller_k8s_api::{apisix::ApisixRouteHttpBackend, IntOrString, Lookup};

/// A reference to one Service port that traffic is forwarded to.
///
/// ApisixRoute backends, stream backends and Gateway API `backendRefs` all reduce to this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backend {
    pub service_name: String,
    pub service_port: IntOrString,

    /// Overrides the namespace of the referencing resource.
    pub namespace: Option<String>,

    pub subset: Option<String>,
    pub granularity: ResolveGranularity,
    pub weight: Option<u32>,
}

/// Builds the upstream for a backend from its Service, endpoints and any same-named
/// `ApisixUpstream`.
pub async fn translate_backend<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    ns: &str,
    backend: &Backend,
) -> Result<Upstream, TranslateError> {
    let ns = backend.namespace.as_deref().unwrap_or(ns);
    let svc = lookup.service(ns, &backend.service_name).await?;
    let port = nodes::service_port(&svc, &backend.service_port)?;

    let au = match lookup.apisix_upstream(ns, &backend.service_name).await {
        Ok(au) => Some(au),
        Err(error) if error.is_not_found() => None,
        Err(error) => return Err(error.into()),
    };

    let labels = match (au.as_ref(), backend.subset.as_deref()) {
        (Some(au), Some(subset)) => au.spec.subset(subset).map(|s| &s.labels),
        _ => None,
    };
    let nodes =
        nodes::resolve_nodes(lookup, config, &svc, &port, backend.granularity, labels).await?;

    let identity = UpstreamIdentity::new(ns, &backend.service_name, port.port)
        .with_subset(backend.subset.clone())
        .with_granularity(backend.granularity);
    let ups = translate_upstream(config, &identity, nodes, au.as_ref().map(|au| &au.spec))?;
    Ok(ups)
}

// === impl Backend ===

impl Backend {
    pub fn new(service_name: impl Into<String>, service_port: IntOrString) -> Self {
        Self {
            service_name: service_name.into(),
            service_port,
            namespace: None,
            subset: None,
            granularity: ResolveGranularity::Endpoint,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: Option<u32>) -> Self {
        self.weight = weight;
        self
    }
}

fn granularity(value: Option<&str>) -> Result<ResolveGranularity, FieldError> {
    value
        .unwrap_or_default()
        .parse()
        .map_err(|_| FieldError::invalid("backends.resolveGranularity"))
}

impl TryFrom<&ApisixRouteHttpBackend> for Backend {
    type Error = FieldError;

    fn try_from(b: &ApisixRouteHttpBackend) -> Result<Self, Self::Error> {
        Ok(Self {
            service_name: b.service_name.clone(),
            service_port: b.service_port.clone(),
            namespace: None,
            subset: b.subset.clone(),
            granularity: granularity(b.resolve_granularity.as_deref())?,
            weight: b.weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_granularity() {
        let b: ApisixRouteHttpBackend = serde_json::from_value(serde_json::json!({
            "serviceName": "httpbin",
            "servicePort": 80,
            "resolveGranularity": "pod",
        }))
        .unwrap();
        assert_eq!(
            Backend::try_from(&b).unwrap_err(),
            FieldError::invalid("backends.resolveGranularity")
        );

        let b: ApisixRouteHttpBackend = serde_json::from_value(serde_json::json!({
            "serviceName": "httpbin",
            "servicePort": "http",
            "resolveGranularity": "service",
            "weight": 10,
        }))
        .unwrap();
        let backend = Backend::try_from(&b).unwrap();
        assert_eq!(backend.granularity, ResolveGranularity::Service);
        assert_eq!(backend.service_port, IntOrString::String("http".to_string()));
        assert_eq!(backend.weight, Some(10));
    }
}

use crate::apisix::ApisixUpstream;
use ahash::AHashMap;
use k8s_openapi::api::core::v1::{Endpoints, Pod, Secret, Service};
use kube::ResourceExt;

/// Read-only access to the cluster objects that translation and validation depend on.
///
/// Implementations may be backed by an API client, an informer cache, or a static [`Snapshot`].
#[async_trait::async_trait]
pub trait Lookup: Send + Sync {
    async fn service(&self, ns: &str, name: &str) -> Result<Service, LookupError>;

    async fn endpoints(&self, ns: &str, name: &str) -> Result<Endpoints, LookupError>;

    async fn pod(&self, ns: &str, name: &str) -> Result<Pod, LookupError>;

    async fn secret(&self, ns: &str, name: &str) -> Result<Secret, LookupError>;

    async fn apisix_upstream(&self, ns: &str, name: &str) -> Result<ApisixUpstream, LookupError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{kind} not found: {namespace}/{name}")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("failed to get {kind} {namespace}/{name}: {source}")]
    Api {
        kind: &'static str,
        namespace: String,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// An immutable set of objects served through [`Lookup`].
///
/// Useful for translating a fixed set of manifests without a cluster connection.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    services: Objects<Service>,
    endpoints: Objects<Endpoints>,
    pods: Objects<Pod>,
    secrets: Objects<Secret>,
    apisix_upstreams: Objects<ApisixUpstream>,
}

#[derive(Clone, Debug)]
struct Objects<T>(AHashMap<(String, String), T>);

// === impl LookupError ===

impl LookupError {
    pub fn not_found(kind: &'static str, ns: &str, name: &str) -> Self {
        Self::NotFound {
            kind,
            namespace: ns.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// === impl Snapshot ===

impl Snapshot {
    pub fn with_service(mut self, svc: Service) -> Self {
        self.services.insert(svc);
        self
    }

    pub fn with_endpoints(mut self, ep: Endpoints) -> Self {
        self.endpoints.insert(ep);
        self
    }

    pub fn with_pod(mut self, pod: Pod) -> Self {
        self.pods.insert(pod);
        self
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secrets.insert(secret);
        self
    }

    pub fn with_apisix_upstream(mut self, au: ApisixUpstream) -> Self {
        self.apisix_upstreams.insert(au);
        self
    }
}

#[async_trait::async_trait]
impl Lookup for Snapshot {
    async fn service(&self, ns: &str, name: &str) -> Result<Service, LookupError> {
        self.services.get("Service", ns, name)
    }

    async fn endpoints(&self, ns: &str, name: &str) -> Result<Endpoints, LookupError> {
        self.endpoints.get("Endpoints", ns, name)
    }

    async fn pod(&self, ns: &str, name: &str) -> Result<Pod, LookupError> {
        self.pods.get("Pod", ns, name)
    }

    async fn secret(&self, ns: &str, name: &str) -> Result<Secret, LookupError> {
        self.secrets.get("Secret", ns, name)
    }

    async fn apisix_upstream(&self, ns: &str, name: &str) -> Result<ApisixUpstream, LookupError> {
        self.apisix_upstreams.get("ApisixUpstream", ns, name)
    }
}

// === impl Objects ===

impl<T> Default for Objects<T> {
    fn default() -> Self {
        Self(AHashMap::default())
    }
}

impl<T: ResourceExt + Clone> Objects<T> {
    fn insert(&mut self, obj: T) {
        let ns = obj.namespace().unwrap_or_default();
        self.0.insert((ns, obj.name_any()), obj);
    }

    fn get(&self, kind: &'static str, ns: &str, name: &str) -> Result<T, LookupError> {
        self.0
            .get(&(ns.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| LookupError::not_found(kind, ns, name))
    }
}

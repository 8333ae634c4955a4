use crate::k8s::{apisix::ApisixUpstream, Endpoints, Lookup, LookupError, Pod, Secret, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt;

/// Reads objects directly from the Kubernetes API.
#[derive(Clone)]
pub struct ClusterLookup {
    client: Client,
}

// === impl ClusterLookup ===

impl ClusterLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get<T>(&self, kind: &'static str, ns: &str, name: &str) -> Result<T, LookupError>
    where
        T: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + fmt::Debug,
        T::DynamicType: Default,
    {
        let api = Api::<T>::namespaced(self.client.clone(), ns);
        match api.get_opt(name).await {
            Ok(Some(obj)) => Ok(obj),
            Ok(None) => Err(LookupError::not_found(kind, ns, name)),
            Err(error) => Err(LookupError::Api {
                kind,
                namespace: ns.to_string(),
                name: name.to_string(),
                source: Box::new(error),
            }),
        }
    }
}

impl fmt::Debug for ClusterLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterLookup").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Lookup for ClusterLookup {
    async fn service(&self, ns: &str, name: &str) -> Result<Service, LookupError> {
        self.get("Service", ns, name).await
    }

    async fn endpoints(&self, ns: &str, name: &str) -> Result<Endpoints, LookupError> {
        self.get("Endpoints", ns, name).await
    }

    async fn pod(&self, ns: &str, name: &str) -> Result<Pod, LookupError> {
        self.get("Pod", ns, name).await
    }

    async fn secret(&self, ns: &str, name: &str) -> Result<Secret, LookupError> {
        self.get("Secret", ns, name).await
    }

    async fn apisix_upstream(&self, ns: &str, name: &str) -> Result<ApisixUpstream, LookupError> {
        self.get("ApisixUpstream", ns, name).await
    }
}

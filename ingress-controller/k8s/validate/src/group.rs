use apisix_ingress_controller_k8s_api::{
    apisix::ApisixTls, gateway::Gateway, Ingress, LookupError, ResourceExt,
};
use std::fmt;

/// Identifies the set of resources served by one data plane, e.g. the Gateway proxy config that
/// a GatewayClass or IngressClass points at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub namespace: String,
    pub name: String,
}

/// A resource that can bind certificates to hosts.
#[derive(Clone, Debug)]
pub enum Member {
    Gateway(Gateway),
    Ingress(Ingress),
    ApisixTls(ApisixTls),
}

/// `Kind/namespace/name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub kind: &'static str,
    pub namespace: String,
    pub name: String,
}

/// Resolves groups and enumerates their members.
///
/// The order in which [`GroupIndex::members`] returns resources determines which one is cited
/// when several existing resources conflict with a candidate, so implementations should return
/// a stable order.
#[async_trait::async_trait]
pub trait GroupIndex: Send + Sync {
    /// Returns `None` when the resource does not belong to a group served by this controller.
    async fn group_of(&self, member: &Member) -> Result<Option<GroupKey>, LookupError>;

    async fn members(&self, group: &GroupKey) -> Result<Vec<Member>, LookupError>;
}

// === impl GroupKey ===

impl GroupKey {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl Member ===

impl Member {
    pub fn resource_ref(&self) -> ResourceRef {
        match self {
            Self::Gateway(gw) => ResourceRef::new("Gateway", gw),
            Self::Ingress(ing) => ResourceRef::new("Ingress", ing),
            Self::ApisixTls(tls) => ResourceRef::new("ApisixTls", tls),
        }
    }
}

impl From<Gateway> for Member {
    fn from(gw: Gateway) -> Self {
        Self::Gateway(gw)
    }
}

impl From<Ingress> for Member {
    fn from(ing: Ingress) -> Self {
        Self::Ingress(ing)
    }
}

impl From<ApisixTls> for Member {
    fn from(tls: ApisixTls) -> Self {
        Self::ApisixTls(tls)
    }
}

// === impl ResourceRef ===

impl ResourceRef {
    pub(crate) fn new(kind: &'static str, obj: &impl ResourceExt) -> Self {
        Self {
            kind,
            namespace: obj.namespace().unwrap_or_default(),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

use crate::{
    core::TranslateConfig,
    k8s::{
        apisix::ApisixTls,
        gateway::{Gateway, GatewayClass},
        Ingress, IngressClass, LookupError, ResourceExt,
    },
    validate::{GroupIndex, GroupKey, Member},
};
use ahash::AHashSet;
use futures::future;
use kube::{api::ListParams, Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// The legacy annotation naming an Ingress's class.
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

/// Groups resources by the proxy configuration that their GatewayClass or IngressClass points at.
///
/// A class owned by this controller that names `parameters` joins the group of those parameters, so
/// that a GatewayClass and an IngressClass sharing parameters share one group. A class without
/// parameters forms a group of its own. Resources whose class belongs to another controller are not
/// part of any group.
#[derive(Clone)]
pub struct ClusterGroups {
    client: Client,
    controller_name: String,
    ingress_class: String,
}

// === impl ClusterGroups ===

impl ClusterGroups {
    pub fn new(client: Client, config: &TranslateConfig) -> Self {
        Self {
            client,
            controller_name: config.controller_name.clone(),
            ingress_class: config.ingress_class.clone(),
        }
    }

    async fn get<T>(&self, kind: &'static str, name: &str) -> Result<Option<T>, LookupError>
    where
        T: Resource + Clone + DeserializeOwned + fmt::Debug,
        T::DynamicType: Default,
    {
        Api::<T>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(|error| api_error(kind, name, error))
    }

    async fn list<T>(&self, kind: &'static str) -> Result<Vec<T>, LookupError>
    where
        T: Resource + Clone + DeserializeOwned + fmt::Debug,
        T::DynamicType: Default,
    {
        let list = Api::<T>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(|error| api_error(kind, "", error))?;
        Ok(list.items)
    }

    async fn gateway_class_group(&self, name: &str) -> Result<Option<GroupKey>, LookupError> {
        let Some(gc) = self.get::<GatewayClass>("GatewayClass", name).await? else {
            debug!(%name, "GatewayClass not found");
            return Ok(None);
        };
        Ok(gateway_class_group(&gc, &self.controller_name))
    }

    async fn ingress_class_group(&self, name: &str) -> Result<Option<GroupKey>, LookupError> {
        let Some(ic) = self.get::<IngressClass>("IngressClass", name).await? else {
            debug!(%name, "IngressClass not found");
            return Ok(None);
        };
        Ok(ingress_class_group(&ic, &self.controller_name))
    }
}

impl fmt::Debug for ClusterGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterGroups")
            .field("controller_name", &self.controller_name)
            .field("ingress_class", &self.ingress_class)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl GroupIndex for ClusterGroups {
    async fn group_of(&self, member: &Member) -> Result<Option<GroupKey>, LookupError> {
        match member {
            Member::Gateway(gw) => self.gateway_class_group(&gw.spec.gateway_class_name).await,
            Member::Ingress(ing) => {
                let class = ingress_class_name(ing, &self.ingress_class);
                self.ingress_class_group(&class).await
            }
            Member::ApisixTls(tls) => {
                let class = apisix_tls_class_name(tls, &self.ingress_class);
                self.ingress_class_group(&class).await
            }
        }
    }

    async fn members(&self, group: &GroupKey) -> Result<Vec<Member>, LookupError> {
        let (gateway_classes, ingress_classes) = future::try_join(
            self.list::<GatewayClass>("GatewayClass"),
            self.list::<IngressClass>("IngressClass"),
        )
        .await?;
        let gateway_classes = gateway_classes
            .iter()
            .filter(|gc| gateway_class_group(gc, &self.controller_name).as_ref() == Some(group))
            .map(|gc| gc.name_any())
            .collect::<AHashSet<_>>();
        let ingress_classes = ingress_classes
            .iter()
            .filter(|ic| ingress_class_group(ic, &self.controller_name).as_ref() == Some(group))
            .map(|ic| ic.name_any())
            .collect::<AHashSet<_>>();

        let mut members = Vec::new();
        if !gateway_classes.is_empty() {
            let gateways = self.list::<Gateway>("Gateway").await?;
            members.extend(
                gateways
                    .into_iter()
                    .filter(|gw| gateway_classes.contains(&gw.spec.gateway_class_name))
                    .map(Member::from),
            );
        }
        if !ingress_classes.is_empty() {
            let (ingresses, tlss) = future::try_join(
                self.list::<Ingress>("Ingress"),
                self.list::<ApisixTls>("ApisixTls"),
            )
            .await?;
            members.extend(
                ingresses
                    .into_iter()
                    .filter(|ing| ingress_classes.contains(&ingress_class_name(ing, &self.ingress_class)))
                    .map(Member::from),
            );
            members.extend(
                tlss.into_iter()
                    .filter(|tls| {
                        ingress_classes.contains(&apisix_tls_class_name(tls, &self.ingress_class))
                    })
                    .map(Member::from),
            );
        }

        debug!(%group, members = members.len(), "Listed group members");
        Ok(members)
    }
}

/// The group of a GatewayClass owned by `controller_name`.
pub fn gateway_class_group(gc: &GatewayClass, controller_name: &str) -> Option<GroupKey> {
    if gc.spec.controller_name != controller_name {
        return None;
    }
    let key = match gc.spec.parameters_ref.as_ref() {
        Some(params) => GroupKey::new(params.namespace.as_deref().unwrap_or_default(), &params.name),
        None => GroupKey::new("", format!("GatewayClass/{}", gc.name_any())),
    };
    Some(key)
}

/// The group of an IngressClass owned by `controller_name`.
pub fn ingress_class_group(ic: &IngressClass, controller_name: &str) -> Option<GroupKey> {
    let spec = ic.spec.as_ref()?;
    if spec.controller.as_deref() != Some(controller_name) {
        return None;
    }
    let key = match spec.parameters.as_ref() {
        Some(params) => GroupKey::new(params.namespace.as_deref().unwrap_or_default(), &params.name),
        None => GroupKey::new("", format!("IngressClass/{}", ic.name_any())),
    };
    Some(key)
}

/// An Ingress's class, from `spec.ingressClassName`, then the legacy annotation, then `default`.
pub fn ingress_class_name(ing: &Ingress, default: &str) -> String {
    ing.spec
        .as_ref()
        .and_then(|spec| spec.ingress_class_name.clone())
        .or_else(|| ing.annotations().get(INGRESS_CLASS_ANNOTATION).cloned())
        .unwrap_or_else(|| default.to_string())
}

pub fn apisix_tls_class_name(tls: &ApisixTls, default: &str) -> String {
    tls.spec
        .ingress_class_name
        .clone()
        .unwrap_or_else(|| default.to_string())
}

fn api_error(kind: &'static str, name: &str, error: kube::Error) -> LookupError {
    LookupError::Api {
        kind,
        namespace: String::new(),
        name: name.to_string(),
        source: Box::new(error),
    }
}

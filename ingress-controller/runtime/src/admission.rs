use crate::{
    core::TranslateConfig,
    groups::{apisix_tls_class_name, ingress_class_name},
    k8s::{
        apisix::{route_v2beta3, ApisixRoute, ApisixTls, ApisixUpstream},
        gateway::{Gateway, HTTPRoute},
        Ingress, Lookup, ResourceExt,
    },
    translate::{
        translate_apisix_route, translate_apisix_tls, translate_http_route,
        translate_upstream_config, TranslateError,
    },
    validate::{
        apisix_route_references, apisix_tls_references, apisix_upstream_references,
        format_conflicts, gateway_references, ingress_references, ConflictDetector, GroupIndex,
        Member, Reference, ReferenceChecker,
    },
};
use anyhow::{anyhow, bail, Result};
use kube::{
    core::{admission::Operation, DynamicObject},
    Resource,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

pub type AdmissionRequest = kube::core::admission::AdmissionRequest<DynamicObject>;
pub type AdmissionResponse = kube::core::admission::AdmissionResponse;

/// Validates APISIX, Gateway API and Ingress resources before they are stored.
///
/// A resource is denied when it cannot be translated or when it would serve a host with a
/// different certificate than another resource in its group. Services and Secrets that do not
/// exist yet only produce warnings.
#[derive(Clone, Debug)]
pub struct Admission<L, G> {
    lookup: L,
    groups: G,
    config: TranslateConfig,
}

#[async_trait::async_trait]
trait Validate<T> {
    /// Returns warnings for an acceptable resource.
    async fn validate(&self, obj: T) -> Result<Vec<String>>;
}

// === impl Admission ===

impl<L, G> Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    pub fn new(lookup: L, groups: G, config: TranslateConfig) -> Self {
        Self {
            lookup,
            groups,
            config,
        }
    }

    pub async fn admit(&self, req: AdmissionRequest) -> AdmissionResponse {
        if matches!(req.operation, Operation::Delete) {
            return AdmissionResponse::from(&req);
        }

        if is_kind::<ApisixRoute>(&req) {
            if req.kind.version == route_v2beta3::ApisixRoute::version(&()) {
                return self.admit_object::<route_v2beta3::ApisixRoute>(req).await;
            }
            return self.admit_object::<ApisixRoute>(req).await;
        }

        if is_kind::<ApisixUpstream>(&req) {
            return self.admit_object::<ApisixUpstream>(req).await;
        }

        if is_kind::<ApisixTls>(&req) {
            return self.admit_object::<ApisixTls>(req).await;
        }

        if is_kind::<Gateway>(&req) {
            return self.admit_object::<Gateway>(req).await;
        }

        if is_kind::<HTTPRoute>(&req) {
            return self.admit_object::<HTTPRoute>(req).await;
        }

        if is_kind::<Ingress>(&req) {
            return self.admit_object::<Ingress>(req).await;
        }

        AdmissionResponse::invalid(format_args!(
            "unsupported resource type: {}.{}.{}",
            req.kind.group, req.kind.version, req.kind.kind
        ))
    }

    async fn admit_object<T>(&self, req: AdmissionRequest) -> AdmissionResponse
    where
        T: DeserializeOwned + Send,
        Self: Validate<T>,
    {
        let mut rsp = AdmissionResponse::from(&req);

        let kind = req.kind.kind.clone();
        let ns = req.namespace.clone().unwrap_or_default();
        let name = req.name.clone();
        let obj = match parse_object::<T>(req) {
            Ok(obj) => obj,
            Err(error) => {
                info!(%error, "Failed to parse {}", kind);
                return rsp.deny(error);
            }
        };

        match self.validate(obj).await {
            Ok(warnings) => {
                if !warnings.is_empty() {
                    debug!(%ns, %name, %kind, ?warnings, "Admitted with warnings");
                    rsp.warnings = Some(warnings);
                }
                rsp
            }
            Err(error) => {
                info!(%error, %ns, %name, %kind, "Denied");
                rsp.deny(error)
            }
        }
    }

    fn serves_class(&self, class: Option<&str>) -> bool {
        class.map_or(true, |class| class == self.config.ingress_class)
    }

    async fn check_references(&self, refs: Vec<Reference>) -> Vec<String> {
        let mut checker = ReferenceChecker::new(&self.lookup);
        checker.check_all(refs).await;
        checker.into_warnings()
    }

    async fn check_conflicts(&self, member: Member) -> Result<()> {
        let conflicts = ConflictDetector::new(&self.lookup, &self.groups)
            .detect(&member)
            .await;
        if let Some(msg) = format_conflicts(&conflicts) {
            bail!(msg);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<L, G> Validate<ApisixRoute> for Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    async fn validate(&self, ar: ApisixRoute) -> Result<Vec<String>> {
        if !self.serves_class(ar.spec.ingress_class_name.as_deref()) {
            return Ok(vec![]);
        }
        skip_unresolved(translate_apisix_route(&self.lookup, &self.config, &ar).await)?;
        Ok(self.check_references(apisix_route_references(&ar)).await)
    }
}

#[async_trait::async_trait]
impl<L, G> Validate<route_v2beta3::ApisixRoute> for Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    async fn validate(&self, old: route_v2beta3::ApisixRoute) -> Result<Vec<String>> {
        let mut ar = ApisixRoute::new(&old.name_any(), old.spec.into());
        ar.metadata = old.metadata;
        <Self as Validate<ApisixRoute>>::validate(self, ar).await
    }
}

#[async_trait::async_trait]
impl<L, G> Validate<ApisixUpstream> for Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    async fn validate(&self, au: ApisixUpstream) -> Result<Vec<String>> {
        if !self.serves_class(au.spec.ingress_class_name.as_deref()) {
            return Ok(vec![]);
        }
        translate_upstream_config(&self.config, &au.spec.config)?;
        for (i, pls) in au.spec.port_level_settings.iter().enumerate() {
            translate_upstream_config(&self.config, &pls.config)
                .map_err(|error| anyhow!("portLevelSettings[{i}].{error}"))?;
        }
        Ok(self.check_references(apisix_upstream_references(&au)).await)
    }
}

#[async_trait::async_trait]
impl<L, G> Validate<ApisixTls> for Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    async fn validate(&self, tls: ApisixTls) -> Result<Vec<String>> {
        let class = apisix_tls_class_name(&tls, &self.config.ingress_class);
        if !self.serves_class(Some(class.as_str())) {
            return Ok(vec![]);
        }
        skip_unresolved(translate_apisix_tls(&self.lookup, &tls).await)?;
        let warnings = self.check_references(apisix_tls_references(&tls)).await;
        self.check_conflicts(tls.into()).await?;
        Ok(warnings)
    }
}

#[async_trait::async_trait]
impl<L, G> Validate<Gateway> for Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    async fn validate(&self, gw: Gateway) -> Result<Vec<String>> {
        let warnings = self.check_references(gateway_references(&gw)).await;
        self.check_conflicts(gw.into()).await?;
        Ok(warnings)
    }
}

#[async_trait::async_trait]
impl<L, G> Validate<HTTPRoute> for Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    async fn validate(&self, route: HTTPRoute) -> Result<Vec<String>> {
        skip_unresolved(translate_http_route(&self.lookup, &self.config, &route).await)?;
        Ok(vec![])
    }
}

#[async_trait::async_trait]
impl<L, G> Validate<Ingress> for Admission<L, G>
where
    L: Lookup,
    G: GroupIndex,
{
    async fn validate(&self, ing: Ingress) -> Result<Vec<String>> {
        let class = ingress_class_name(&ing, &self.config.ingress_class);
        if !self.serves_class(Some(class.as_str())) {
            return Ok(vec![]);
        }
        let warnings = self.check_references(ingress_references(&ing)).await;
        self.check_conflicts(ing.into()).await?;
        Ok(warnings)
    }
}

/// Missing Services and Secrets are reported as warnings by the reference checks, so translation
/// failures caused by them do not deny the resource.
fn skip_unresolved<T>(res: Result<T, TranslateError>) -> Result<()> {
    match res {
        Ok(_) => Ok(()),
        Err(TranslateError::Lookup(error)) if error.is_not_found() => {
            debug!(%error, "Skipped unresolved reference");
            Ok(())
        }
        Err(TranslateError::Secret(error)) => {
            debug!(%error, "Skipped incomplete Secret");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

fn is_kind<T>(req: &AdmissionRequest) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    req.kind.group.eq_ignore_ascii_case(&T::group(&dt))
        && req.kind.kind.eq_ignore_ascii_case(&T::kind(&dt))
}

fn parse_object<T: DeserializeOwned>(req: AdmissionRequest) -> Result<T> {
    let obj = req
        .object
        .ok_or_else(|| anyhow!("admission request missing 'object'"))?;
    if !obj.data.get("spec").is_some_and(|spec| spec.is_object()) {
        bail!("admission request missing 'spec'");
    }
    let obj = serde_json::from_value(serde_json::to_value(obj)?)?;
    Ok(obj)
}

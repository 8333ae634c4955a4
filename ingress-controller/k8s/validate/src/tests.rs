
use crate::{GroupIndex, GroupKey, Member};
use apisix_ingress_controller_k8s_api::{
    apisix::{ApisixTls, ApisixTlsSpec, ApisixUpstream},
    gateway::{Gateway, GatewaySpec},
    Endpoints, Lookup, LookupError, ObjectMeta, Pod, Secret, Service, Snapshot,
};
use maplit::btreemap;

/// Every resource belongs to the same group unless `group` is `None`.
#[derive(Debug, Default)]
pub struct StaticGroups {
    pub group: Option<GroupKey>,
    pub members: Vec<Member>,
}

#[async_trait::async_trait]
impl GroupIndex for StaticGroups {
    async fn group_of(&self, _: &Member) -> Result<Option<GroupKey>, LookupError> {
        Ok(self.group.clone())
    }

    async fn members(&self, _: &GroupKey) -> Result<Vec<Member>, LookupError> {
        Ok(self.members.clone())
    }
}

/// A group whose members cannot be listed.
#[derive(Debug)]
pub struct UnlistedGroup(pub GroupKey);

#[async_trait::async_trait]
impl GroupIndex for UnlistedGroup {
    async fn group_of(&self, _: &Member) -> Result<Option<GroupKey>, LookupError> {
        Ok(Some(self.0.clone()))
    }

    async fn members(&self, group: &GroupKey) -> Result<Vec<Member>, LookupError> {
        Err(api_error("GatewayProxy", &group.namespace, &group.name))
    }
}

/// Serves a [`Snapshot`], except that reads of the named objects fail as if the API server were
/// unreachable.
#[derive(Debug, Default)]
pub struct Unavailable {
    pub snapshot: Snapshot,
    pub names: Vec<&'static str>,
}

#[async_trait::async_trait]
impl Lookup for Unavailable {
    async fn service(&self, ns: &str, name: &str) -> Result<Service, LookupError> {
        self.check("Service", ns, name)?;
        self.snapshot.service(ns, name).await
    }

    async fn endpoints(&self, ns: &str, name: &str) -> Result<Endpoints, LookupError> {
        self.check("Endpoints", ns, name)?;
        self.snapshot.endpoints(ns, name).await
    }

    async fn pod(&self, ns: &str, name: &str) -> Result<Pod, LookupError> {
        self.check("Pod", ns, name)?;
        self.snapshot.pod(ns, name).await
    }

    async fn secret(&self, ns: &str, name: &str) -> Result<Secret, LookupError> {
        self.check("Secret", ns, name)?;
        self.snapshot.secret(ns, name).await
    }

    async fn apisix_upstream(&self, ns: &str, name: &str) -> Result<ApisixUpstream, LookupError> {
        self.check("ApisixUpstream", ns, name)?;
        self.snapshot.apisix_upstream(ns, name).await
    }
}

impl Unavailable {
    fn check(&self, kind: &'static str, ns: &str, name: &str) -> Result<(), LookupError> {
        if self.names.iter().any(|n| *n == name) {
            return Err(api_error(kind, ns, name));
        }
        Ok(())
    }
}

pub fn api_error(kind: &'static str, ns: &str, name: &str) -> LookupError {
    LookupError::Api {
        kind,
        namespace: ns.to_string(),
        name: name.to_string(),
        source: "connection refused".into(),
    }
}

pub fn mk_meta(ns: impl ToString, name: impl ToString) -> ObjectMeta {
    ObjectMeta {
        namespace: Some(ns.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

/// A self-signed serving certificate for `hosts`, stored under `tls.crt`/`tls.key`.
pub fn mk_tls_secret(ns: &str, name: &str, hosts: &[&str]) -> Secret {
    let certified =
        rcgen::generate_simple_self_signed(hosts.iter().map(|h| h.to_string()).collect::<Vec<_>>())
            .expect("certificate must generate");
    Secret {
        metadata: mk_meta(ns, name),
        string_data: Some(btreemap! {
            "tls.crt".to_string() => certified.cert.pem(),
            "tls.key".to_string() => certified.key_pair.serialize_pem(),
        }),
        ..Default::default()
    }
}

/// A copy of `secret` under another name, holding the same certificate.
pub fn mk_secret_copy(secret: &Secret, name: &str) -> Secret {
    let mut copy = secret.clone();
    copy.metadata.name = Some(name.to_string());
    copy
}

pub fn mk_gateway(ns: &str, name: &str, spec: serde_json::Value) -> Gateway {
    let spec: GatewaySpec = serde_json::from_value(spec).expect("spec must parse");
    let mut gw = Gateway::new(name, spec);
    gw.metadata.namespace = Some(ns.to_string());
    gw
}

pub fn mk_apisix_tls(ns: &str, name: &str, hosts: &[&str], secret: &str) -> ApisixTls {
    let spec: ApisixTlsSpec = serde_json::from_value(serde_json::json!({
        "hosts": hosts,
        "secret": {"name": secret, "namespace": ns},
    }))
    .expect("spec must parse");
    let mut tls = ApisixTls::new(name, spec);
    tls.metadata.namespace = Some(ns.to_string());
    tls
}

pub fn init_tracing() -> tracing::subscriber::DefaultGuard {
    tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .finish(),
    )
}

use ahash::AHashSet;
use apisix_ingress_controller_k8s_api::{
    apisix::{ApisixRoute, ApisixTls, ApisixUpstream},
    gateway::Gateway,
    secret, Ingress, Lookup, LookupError, ResourceExt,
};
use std::fmt;
use tracing::{debug, warn};

/// A Service or Secret named by a resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    Service {
        namespace: String,
        name: String,
    },
    Secret {
        namespace: String,
        name: String,
        required_keys: Vec<SecretKey>,
    },
}

/// An entry that a referenced Secret must carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SecretKey {
    Cert,
    PrivateKey,
    CaCert,
}

/// Warns about references that do not resolve.
///
/// Each missing Service, Secret or Secret key is reported once per checker; create a new checker
/// for each validation.
#[derive(Debug)]
pub struct ReferenceChecker<'a, L: ?Sized> {
    lookup: &'a L,
    seen: AHashSet<(&'static str, String, String, Option<SecretKey>)>,
    warnings: Vec<String>,
}

// === impl Reference ===

impl Reference {
    pub fn service(namespace: impl ToString, name: impl ToString) -> Self {
        Self::Service {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn secret(
        namespace: impl ToString,
        name: impl ToString,
        required_keys: impl IntoIterator<Item = SecretKey>,
    ) -> Self {
        Self::Secret {
            namespace: namespace.to_string(),
            name: name.to_string(),
            required_keys: required_keys.into_iter().collect(),
        }
    }
}

// === impl SecretKey ===

impl SecretKey {
    /// Keys that satisfy the requirement, in lookup order.
    fn alternatives(self) -> &'static [&'static str] {
        match self {
            Self::Cert => &secret::CERT_KEYS,
            Self::PrivateKey => &secret::KEY_KEYS,
            Self::CaCert => &secret::CA_KEYS,
        }
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cert => secret::TLS_CERT_KEY,
            Self::PrivateKey => secret::TLS_PRIVATE_KEY_KEY,
            Self::CaCert => secret::CA_CERT_KEY,
        })
    }
}

// === impl ReferenceChecker ===

impl<'a, L: Lookup + ?Sized> ReferenceChecker<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            seen: AHashSet::new(),
            warnings: Vec::new(),
        }
    }

    pub async fn check_all(&mut self, refs: impl IntoIterator<Item = Reference>) {
        for r in refs {
            self.check(&r).await;
        }
    }

    pub async fn check(&mut self, reference: &Reference) {
        match reference {
            Reference::Service { namespace, name } => {
                if !self.first_sighting("Service", namespace, name, None) {
                    return;
                }
                if let Err(error) = self.lookup.service(namespace, name).await {
                    self.lookup_failed("Service", namespace, name, error);
                }
            }

            Reference::Secret {
                namespace,
                name,
                required_keys,
            } => {
                let first = self.first_sighting("Secret", namespace, name, None);
                let pending = required_keys
                    .iter()
                    .copied()
                    .filter(|key| !self.seen.contains(&("Secret", namespace.clone(), name.clone(), Some(*key))))
                    .collect::<Vec<_>>();
                if !first && pending.is_empty() {
                    return;
                }

                let secret = match self.lookup.secret(namespace, name).await {
                    Ok(secret) => secret,
                    Err(error) => {
                        if first {
                            self.lookup_failed("Secret", namespace, name, error);
                        }
                        return;
                    }
                };
                for key in pending {
                    self.first_sighting("Secret", namespace, name, Some(key));
                    let present = key
                        .alternatives()
                        .iter()
                        .any(|k| secret::has_key(&secret, k));
                    if !present {
                        self.warnings.push(format!(
                            "Secret '{namespace}/{name}' is missing required key '{key}'"
                        ));
                    }
                }
            }
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn first_sighting(
        &mut self,
        kind: &'static str,
        ns: &str,
        name: &str,
        key: Option<SecretKey>,
    ) -> bool {
        self.seen
            .insert((kind, ns.to_string(), name.to_string(), key))
    }

    fn lookup_failed(&mut self, kind: &'static str, ns: &str, name: &str, error: LookupError) {
        if error.is_not_found() {
            self.warnings
                .push(format!("Referenced {kind} '{ns}/{name}' not found"));
        } else {
            warn!(%error, %kind, %ns, %name, "Failed to check reference");
        }
    }
}

/// Backend Services of every HTTP and stream rule, and the Secrets plugins read settings from.
pub fn apisix_route_references(ar: &ApisixRoute) -> Vec<Reference> {
    let ns = ar.namespace().unwrap_or_default();
    let mut refs = Vec::new();
    for rule in &ar.spec.http {
        for backend in &rule.backends {
            refs.push(Reference::service(&ns, &backend.service_name));
        }
        for plugin in rule.plugins.iter().filter(|p| p.enable) {
            if let Some(secret) = plugin.secret_ref.as_deref().filter(|s| !s.is_empty()) {
                refs.push(Reference::secret(&ns, secret, []));
            }
        }
    }
    for rule in &ar.spec.stream {
        refs.push(Reference::service(&ns, &rule.backend.service_name));
        for plugin in rule.plugins.iter().filter(|p| p.enable) {
            if let Some(secret) = plugin.secret_ref.as_deref().filter(|s| !s.is_empty()) {
                refs.push(Reference::secret(&ns, secret, []));
            }
        }
    }
    refs
}

/// An `ApisixUpstream` configures the Service with the same name.
pub fn apisix_upstream_references(au: &ApisixUpstream) -> Vec<Reference> {
    if au.spec.config.discovery.is_some() {
        debug!(name = %au.name_any(), "Upstream uses service discovery");
        return vec![];
    }
    vec![Reference::service(
        au.namespace().unwrap_or_default(),
        au.name_any(),
    )]
}

pub fn apisix_tls_references(tls: &ApisixTls) -> Vec<Reference> {
    let mut refs = vec![Reference::secret(
        &tls.spec.secret.namespace,
        &tls.spec.secret.name,
        [SecretKey::Cert, SecretKey::PrivateKey],
    )];
    if let Some(client) = tls.spec.client.as_ref() {
        refs.push(Reference::secret(
            &client.ca_secret.namespace,
            &client.ca_secret.name,
            [SecretKey::CaCert],
        ));
    }
    refs
}

/// Certificate Secrets of TLS listeners.
pub fn gateway_references(gw: &Gateway) -> Vec<Reference> {
    let ns = gw.namespace().unwrap_or_default();
    gw.spec
        .listeners
        .iter()
        .filter_map(|l| l.tls.as_ref())
        .flat_map(|tls| tls.certificate_refs.iter().flatten())
        .filter(|r| {
            r.kind.as_deref().unwrap_or("Secret") == "Secret"
                && r.group.as_deref().unwrap_or_default().is_empty()
        })
        .map(|r| {
            Reference::secret(
                r.namespace.as_deref().unwrap_or(&ns),
                &r.name,
                [SecretKey::Cert, SecretKey::PrivateKey],
            )
        })
        .collect()
}

/// TLS Secrets and backend Services, including the default backend.
pub fn ingress_references(ing: &Ingress) -> Vec<Reference> {
    let ns = ing.namespace().unwrap_or_default();
    let Some(spec) = ing.spec.as_ref() else {
        return vec![];
    };

    let mut refs = Vec::new();
    for tls in spec.tls.iter().flatten() {
        if let Some(name) = tls.secret_name.as_deref().filter(|s| !s.is_empty()) {
            refs.push(Reference::secret(
                &ns,
                name,
                [SecretKey::Cert, SecretKey::PrivateKey],
            ));
        }
    }

    let default_backend = spec.default_backend.iter();
    let rule_backends = spec
        .rules
        .iter()
        .flatten()
        .filter_map(|rule| rule.http.as_ref())
        .flat_map(|http| http.paths.iter().map(|path| &path.backend));
    for backend in default_backend.chain(rule_backends) {
        if let Some(svc) = backend.service.as_ref() {
            refs.push(Reference::service(&ns, &svc.name));
        }
    }
    refs
}

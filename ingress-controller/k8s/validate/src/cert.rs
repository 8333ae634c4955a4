use ahash::AHashMap;
use apisix_ingress_controller_k8s_api::{
    secret::{self, SecretError},
    Lookup, LookupError, Secret,
};
use sha2::{Digest, Sha256};
use x509_parser::{
    extensions::GeneralName,
    pem::parse_x509_pem,
    prelude::{FromDer, X509Certificate},
};

#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("invalid PEM: {0}")]
    Pem(String),

    #[error("invalid certificate: {0}")]
    X509(String),
}

/// What conflict detection needs to know about a serving certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertInfo {
    /// Hex SHA-256 of the leaf certificate's DER encoding.
    pub hash: String,

    /// DNS subject alternative names, normalized with [`normalize_host`] and deduplicated.
    pub dns_names: Vec<String>,
}

/// Caches inspected Secrets by namespace and name.
///
/// A cache is meant to live for a single detection call so that a Secret referenced by several
/// resources is only fetched and parsed once. Failures are not cached.
#[derive(Debug, Default)]
pub struct CertCache {
    entries: AHashMap<(String, String), CertInfo>,
}

/// Lowercases a host name and strips a trailing dot.
pub fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Parses the first certificate of a PEM bundle, or a bare DER certificate.
pub fn parse_certificate(data: &[u8]) -> Result<CertInfo, CertError> {
    let is_pem = std::str::from_utf8(data)
        .map(|s| s.trim_start().starts_with("-----BEGIN"))
        .unwrap_or(false);
    let der = if is_pem {
        let (_, pem) = parse_x509_pem(data).map_err(|e| CertError::Pem(e.to_string()))?;
        pem.contents
    } else {
        data.to_vec()
    };

    let (_, cert) = X509Certificate::from_der(&der).map_err(|e| CertError::X509(e.to_string()))?;
    let mut dns_names = Vec::<String>::new();
    let san = cert
        .subject_alternative_name()
        .map_err(|e| CertError::X509(e.to_string()))?;
    for name in san.iter().flat_map(|san| san.value.general_names.iter()) {
        if let GeneralName::DNSName(dns) = name {
            let host = normalize_host(dns);
            if !dns_names.contains(&host) {
                dns_names.push(host);
            }
        }
    }

    Ok(CertInfo {
        hash: hex::encode(Sha256::digest(&der)),
        dns_names,
    })
}

/// Inspects the serving certificate held in a Secret, in either the `tls.crt` or `cert` layout.
pub fn inspect_secret(secret: &Secret) -> Result<CertInfo, CertError> {
    let data = secret::CERT_KEYS
        .iter()
        .find_map(|key| secret::value(secret, key))
        .ok_or(SecretError::MissingCert)?;
    parse_certificate(data)
}

// === impl CertCache ===

impl CertCache {
    pub async fn inspect<L: Lookup + ?Sized>(
        &mut self,
        lookup: &L,
        ns: &str,
        name: &str,
    ) -> Result<CertInfo, CertError> {
        let key = (ns.to_string(), name.to_string());
        if let Some(info) = self.entries.get(&key) {
            return Ok(info.clone());
        }

        let secret = lookup.secret(ns, name).await?;
        let info = inspect_secret(&secret)?;
        self.entries.insert(key, info.clone());
        Ok(info)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Reads certificate material and plugin settings out of core `Secret`s.

use k8s_openapi::api::core::v1::Secret;
use std::{collections::BTreeMap, fmt};

/// Keys holding a serving certificate, in lookup order. `cert`/`key` is the APISIX layout and
/// `tls.crt`/`tls.key` the `kubernetes.io/tls` layout.
pub const CERT_KEYS: [&str; 2] = ["cert", "tls.crt"];
pub const KEY_KEYS: [&str; 2] = ["key", "tls.key"];
pub const CA_KEYS: [&str; 2] = ["ca.crt", "cert"];

pub const TLS_CERT_KEY: &str = "tls.crt";
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";
pub const CA_CERT_KEY: &str = "ca.crt";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("missing cert field")]
    MissingCert,

    #[error("missing key field")]
    MissingKey,

    #[error("missing ca.crt field")]
    MissingCa,

    #[error("field {0:?} is not valid UTF-8")]
    NotUtf8(String),
}

/// A PEM-encoded certificate chain and its private key.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub cert: String,
    pub key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("cert", &self.cert.len())
            .finish_non_exhaustive()
    }
}

/// Returns the raw bytes stored under `key`, preferring `data` over `stringData`.
pub fn value<'s>(secret: &'s Secret, key: &str) -> Option<&'s [u8]> {
    if let Some(v) = secret.data.as_ref().and_then(|data| data.get(key)) {
        return Some(v.0.as_slice());
    }
    secret
        .string_data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|s| s.as_bytes())
}

pub fn has_key(secret: &Secret, key: &str) -> bool {
    value(secret, key).is_some()
}

fn first_string(secret: &Secret, keys: &[&str]) -> Result<Option<String>, SecretError> {
    for key in keys {
        if let Some(bytes) = value(secret, key) {
            let s = std::str::from_utf8(bytes).map_err(|_| SecretError::NotUtf8(key.to_string()))?;
            return Ok(Some(s.to_string()));
        }
    }
    Ok(None)
}

pub fn key_pair(secret: &Secret) -> Result<KeyPair, SecretError> {
    let cert = first_string(secret, &CERT_KEYS)?.ok_or(SecretError::MissingCert)?;
    let key = first_string(secret, &KEY_KEYS)?.ok_or(SecretError::MissingKey)?;
    Ok(KeyPair { cert, key })
}

pub fn ca_cert(secret: &Secret) -> Result<String, SecretError> {
    first_string(secret, &CA_KEYS)?.ok_or(SecretError::MissingCa)
}

/// All UTF-8 entries of the secret, with `data` taking precedence over `stringData`.
///
/// Non-UTF-8 values are skipped.
pub fn string_data(secret: &Secret) -> BTreeMap<String, String> {
    let mut out = secret.string_data.clone().unwrap_or_default();
    for (k, v) in secret.data.iter().flatten() {
        if let Ok(s) = std::str::from_utf8(&v.0) {
            out.insert(k.clone(), s.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use maplit::btreemap;

    fn mk_secret(data: BTreeMap<String, ByteString>) -> Secret {
        Secret {
            data: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn reads_either_layout() {
        let apisix = mk_secret(btreemap! {
            "cert".to_string() => ByteString(b"C".to_vec()),
            "key".to_string() => ByteString(b"K".to_vec()),
        });
        let kp = key_pair(&apisix).unwrap();
        assert_eq!((kp.cert.as_str(), kp.key.as_str()), ("C", "K"));

        let tls = mk_secret(btreemap! {
            "tls.crt".to_string() => ByteString(b"C2".to_vec()),
            "tls.key".to_string() => ByteString(b"K2".to_vec()),
        });
        assert_eq!(key_pair(&tls).unwrap().cert, "C2");
    }

    #[test]
    fn reports_missing_fields() {
        let no_key = mk_secret(btreemap! {
            "tls.crt".to_string() => ByteString(b"C".to_vec()),
        });
        assert_eq!(key_pair(&no_key), Err(SecretError::MissingKey));
        assert_eq!(key_pair(&Secret::default()), Err(SecretError::MissingCert));
        assert_eq!(ca_cert(&no_key), Err(SecretError::MissingCa));
    }

    #[test]
    fn string_data_merges() {
        let secret = Secret {
            data: Some(btreemap! {
                "a".to_string() => ByteString(b"from-data".to_vec()),
                "bin".to_string() => ByteString(vec![0xff, 0xfe]),
            }),
            string_data: Some(btreemap! {
                "a".to_string() => "from-string".to_string(),
                "b".to_string() => "b".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            string_data(&secret),
            btreemap! {
                "a".to_string() => "from-data".to_string(),
                "b".to_string() => "b".to_string(),
            }
        );
    }
}

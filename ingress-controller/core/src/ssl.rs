use serde::{Deserialize, Serialize};
use std::fmt;

/// A certificate/key pair served for a set of SNIs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssl {
    pub id: String,
    pub snis: Vec<String>,
    pub cert: String,
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientTls>,
}

/// Mutual-TLS settings: the CA used to verify client certificates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTls {
    pub ca: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_mtls_uri_regex: Vec<String>,
}

// The private key is never written to logs.
impl fmt::Debug for Ssl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ssl")
            .field("id", &self.id)
            .field("snis", &self.snis)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

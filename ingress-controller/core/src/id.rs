use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// How a backend Service is turned into upstream nodes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResolveGranularity {
    /// One node per endpoint address.
    #[default]
    Endpoint,

    /// A single node at the Service's cluster IP.
    Service,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid resolve granularity: {0:?}")]
pub struct InvalidGranularity(String);

/// Identifies the upstream generated for one Service port.
///
/// Identical inputs always produce the identical [`UpstreamIdentity::id`], which is the key the
/// admin API upserts on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UpstreamIdentity {
    pub namespace: String,
    pub service: String,
    pub subset: Option<String>,
    pub port: i32,
    pub granularity: ResolveGranularity,
}

/// Hashes a composed object name into the id used by the APISIX admin API.
///
/// Returns an empty id for an empty name.
pub fn gen_id(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let digest = Sha256::digest(name.as_bytes());
    hex::encode(&digest[..8])
}

pub fn route_name(ns: &str, name: &str, rule: &str) -> String {
    format!("{ns}_{name}_{rule}")
}

pub fn stream_route_name(ns: &str, name: &str, rule: &str) -> String {
    format!("{ns}_{name}_{rule}_tcp")
}

pub fn plugin_config_name(ns: &str, name: &str) -> String {
    format!("{ns}_{name}")
}

pub fn ssl_name(ns: &str, name: &str) -> String {
    format!("{ns}_{name}")
}

// === impl ResolveGranularity ===

impl FromStr for ResolveGranularity {
    type Err = InvalidGranularity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "endpoint" => Ok(Self::Endpoint),
            "service" => Ok(Self::Service),
            s => Err(InvalidGranularity(s.to_string())),
        }
    }
}

impl fmt::Display for ResolveGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoint => f.write_str("endpoint"),
            Self::Service => f.write_str("service"),
        }
    }
}

// === impl UpstreamIdentity ===

impl UpstreamIdentity {
    pub fn new(namespace: impl Into<String>, service: impl Into<String>, port: i32) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
            subset: None,
            port,
            granularity: ResolveGranularity::Endpoint,
        }
    }

    pub fn with_subset(mut self, subset: Option<String>) -> Self {
        self.subset = subset.filter(|s| !s.is_empty());
        self
    }

    pub fn with_granularity(mut self, granularity: ResolveGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Composes `<ns>_<service>_[<subset>_]<port>[_service]`.
    pub fn name(&self) -> String {
        let mut name = format!("{}_{}_", self.namespace, self.service);
        if let Some(subset) = self.subset.as_deref() {
            name.push_str(subset);
            name.push('_');
        }
        name.push_str(&self.port.to_string());
        if self.granularity == ResolveGranularity::Service {
            name.push_str("_service");
        }
        name
    }

    pub fn id(&self) -> String {
        gen_id(&self.name())
    }
}

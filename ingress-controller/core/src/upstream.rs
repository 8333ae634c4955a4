use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
    Grpc,
    Grpcs,
    Tcp,
    Udp,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadBalancer {
    #[default]
    #[serde(rename = "roundrobin")]
    RoundRobin,
    #[serde(rename = "chash")]
    ConsistentHash,
    #[serde(rename = "ewma")]
    Ewma,
    #[serde(rename = "least_conn")]
    LeastConn,
}

/// The request attribute a consistent-hash balancer keys on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashOn {
    Vars,
    Header,
    Cookie,
    Consumer,
    VarsCombinations,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    #[default]
    Http,
    Https,
    Tcp,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported value: {0:?}")]
pub struct UnsupportedValue(pub String);

/// A pool of backend endpoints along with balancing, retry and health-check policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    pub id: String,
    pub name: String,

    #[serde(rename = "type")]
    pub load_balancer: LoadBalancer,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_on: Option<HashOn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    pub scheme: Scheme,

    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthCheck>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Timeout>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_args: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub host: String,
    pub port: i32,
    pub weight: u32,
}

/// Connect, send and read timeouts, in seconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    pub connect: u64,
    pub send: u64,
    pub read: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<ActiveCheck>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive: Option<PassiveCheck>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCheck {
    #[serde(rename = "type")]
    pub kind: CheckType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,

    pub https_verify_certificate: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub req_headers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<ActiveHealthy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy: Option<ActiveUnhealthy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHealthy {
    pub interval: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_statuses: Vec<i32>,

    pub successes: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUnhealthy {
    pub interval: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_statuses: Vec<i32>,

    pub http_failures: u32,
    pub tcp_failures: u32,
    pub timeouts: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveCheck {
    #[serde(rename = "type")]
    pub kind: CheckType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<PassiveHealthy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy: Option<PassiveUnhealthy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveHealthy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_statuses: Vec<i32>,

    pub successes: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveUnhealthy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_statuses: Vec<i32>,

    pub http_failures: u32,
    pub tcp_failures: u32,
    pub timeouts: u32,
}

// === impl Upstream ===

impl Upstream {
    /// An upstream with the default policy (plain HTTP, round robin, no checks).
    pub fn new(name: String, nodes: Vec<Node>) -> Self {
        Self {
            id: crate::gen_id(&name),
            name,
            nodes,
            ..Default::default()
        }
    }

    /// Renames the upstream, keeping its id in step with the name.
    pub fn set_name(&mut self, name: String) {
        self.id = crate::gen_id(&name);
        self.name = name;
    }
}

// === impl Scheme ===

impl FromStr for Scheme {
    type Err = UnsupportedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "grpc" => Ok(Self::Grpc),
            "grpcs" => Ok(Self::Grpcs),
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            s => Err(UnsupportedValue(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Grpc => "grpc",
            Self::Grpcs => "grpcs",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        })
    }
}

// === impl LoadBalancer ===

impl FromStr for LoadBalancer {
    type Err = UnsupportedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roundrobin" => Ok(Self::RoundRobin),
            "chash" => Ok(Self::ConsistentHash),
            "ewma" => Ok(Self::Ewma),
            "least_conn" => Ok(Self::LeastConn),
            s => Err(UnsupportedValue(s.to_string())),
        }
    }
}

// === impl HashOn ===

impl FromStr for HashOn {
    type Err = UnsupportedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vars" => Ok(Self::Vars),
            "header" => Ok(Self::Header),
            "cookie" => Ok(Self::Cookie),
            "consumer" => Ok(Self::Consumer),
            "vars_combinations" => Ok(Self::VarsCombinations),
            s => Err(UnsupportedValue(s.to_string())),
        }
    }
}

// === impl CheckType ===

impl FromStr for CheckType {
    type Err = UnsupportedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "tcp" => Ok(Self::Tcp),
            s => Err(UnsupportedValue(s.to_string())),
        }
    }
}

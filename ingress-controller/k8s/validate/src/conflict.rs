use crate::{build_member_mappings, CertCache, GroupIndex, HostCertMapping, Member, ResourceRef};
use ahash::{AHashMap, AHashSet};
use apisix_ingress_controller_k8s_api::Lookup;
use std::fmt::Write;
use tracing::{debug, warn};

/// A host that a candidate resource would serve with a different certificate than an existing
/// resource (or than another of the candidate's own entries).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub host: String,

    /// The resource whose certificate the candidate disagrees with.
    pub resource: ResourceRef,

    /// Hash of that resource's certificate.
    pub cert_hash: String,
}

/// Finds hosts that would be served with more than one certificate within a group.
#[derive(Debug)]
pub struct ConflictDetector<'a, L: ?Sized, G: ?Sized> {
    lookup: &'a L,
    groups: &'a G,
}

/// Renders conflicts as a single admission error message, or `None` if there are none.
pub fn format_conflicts(conflicts: &[Conflict]) -> Option<String> {
    if conflicts.is_empty() {
        return None;
    }
    let mut msg = String::from("SSL configuration conflicts detected:");
    for c in conflicts {
        let _ = write!(
            msg,
            "\n- Host '{}' is already configured with a different certificate in {}",
            c.host, c.resource
        );
    }
    Some(msg)
}

// === impl ConflictDetector ===

impl<'a, L, G> ConflictDetector<'a, L, G>
where
    L: Lookup + ?Sized,
    G: GroupIndex + ?Sized,
{
    pub fn new(lookup: &'a L, groups: &'a G) -> Self {
        Self { lookup, groups }
    }

    /// Checks a candidate against itself and against the other members of its group.
    ///
    /// Conflicts of the candidate with itself are reported first, once per host. Failures to
    /// resolve the group, enumerate members or read certificates never produce conflicts.
    pub async fn detect(&self, candidate: &Member) -> Vec<Conflict> {
        let candidate_ref = candidate.resource_ref();
        let group = match self.groups.group_of(candidate).await {
            Ok(Some(group)) => group,
            Ok(None) => {
                debug!(resource = %candidate_ref, "Not part of a group");
                return vec![];
            }
            Err(error) => {
                warn!(%error, resource = %candidate_ref, "Failed to resolve group");
                return vec![];
            }
        };

        let mut cache = CertCache::default();
        let candidate_mappings = build_member_mappings(self.lookup, &mut cache, candidate).await;
        if candidate_mappings.is_empty() {
            return vec![];
        }

        let members = match self.groups.members(&group).await {
            Ok(members) => members,
            Err(error) => {
                warn!(%error, %group, "Failed to list group members");
                vec![]
            }
        };
        let mut existing = AHashMap::<String, HostCertMapping>::new();
        for member in members {
            if member.resource_ref() == candidate_ref {
                continue;
            }
            for mapping in build_member_mappings(self.lookup, &mut cache, &member).await {
                existing.entry(mapping.host.clone()).or_insert(mapping);
            }
        }

        let mut conflicts = Vec::new();

        // The first certificate seen for a host is the candidate's own.
        let mut own = AHashMap::<&str, &str>::new();
        let mut self_conflicts = AHashSet::<&str>::new();
        let mut hosts = Vec::new();
        for mapping in &candidate_mappings {
            match own.get(mapping.host.as_str()) {
                None => {
                    own.insert(&mapping.host, &mapping.cert_hash);
                    hosts.push(mapping.host.as_str());
                }
                Some(hash) if *hash != mapping.cert_hash && self_conflicts.insert(&mapping.host) => {
                    conflicts.push(Conflict {
                        host: mapping.host.clone(),
                        resource: candidate_ref.clone(),
                        cert_hash: hash.to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        for host in hosts {
            let Some(other) = existing.get(host) else {
                continue;
            };
            if own.get(host) != Some(&other.cert_hash.as_str()) {
                conflicts.push(Conflict {
                    host: host.to_string(),
                    resource: other.resource.clone(),
                    cert_hash: other.cert_hash.clone(),
                });
            }
        }

        if !conflicts.is_empty() {
            debug!(resource = %candidate_ref, %group, conflicts = conflicts.len(), "Found certificate conflicts");
        }
        conflicts
    }
}

use ahash::AHashSet;
use apisix_ingress_controller_core::{Route, Ssl, StreamRoute, Upstream};

/// Collects the objects produced by translating one resource.
///
/// Upstreams are deduplicated by id: several backends (or rules) that resolve to the same Service
/// port share one upstream. Objects keep the order they were first added in.
#[derive(Clone, Debug, Default)]
pub struct TranslateContext {
    pub routes: Vec<Route>,
    pub stream_routes: Vec<StreamRoute>,
    pub upstreams: Vec<Upstream>,
    pub ssls: Vec<Ssl>,
    upstream_ids: AHashSet<String>,
}

// === impl TranslateContext ===

impl TranslateContext {
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn add_stream_route(&mut self, route: StreamRoute) {
        self.stream_routes.push(route);
    }

    /// Adds an upstream unless one with the same id was already added.
    ///
    /// Returns `true` if the upstream was added.
    pub fn add_upstream(&mut self, ups: Upstream) -> bool {
        if !self.upstream_ids.insert(ups.id.clone()) {
            return false;
        }
        self.upstreams.push(ups);
        true
    }

    pub fn add_ssl(&mut self, ssl: Ssl) {
        self.ssls.push(ssl);
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
            && self.stream_routes.is_empty()
            && self.upstreams.is_empty()
            && self.ssls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstreams_are_deduplicated() {
        let mut ctx = TranslateContext::default();
        assert!(ctx.is_empty());
        assert!(ctx.add_upstream(Upstream::new("default_a_80".to_string(), vec![])));
        assert!(ctx.add_upstream(Upstream::new("default_b_80".to_string(), vec![])));
        assert!(!ctx.add_upstream(Upstream::new("default_a_80".to_string(), vec![])));

        let names = ctx
            .upstreams
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["default_a_80", "default_b_80"]);
    }
}

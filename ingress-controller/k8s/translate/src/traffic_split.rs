use crate::{backend::translate_backend, Backend, TranslateContext, TranslateError};
use apisix_ingress_controller_core::{
    TrafficSplitConfig, TrafficSplitRule, TranslateConfig, WeightedUpstream,
};
use apisix_ingress_controller_k8s_api::Lookup;

/// Splits traffic between a route's own upstream and additional backends.
///
/// Produces a single rule with one weighted entry per backend, followed by an entry with an
/// empty upstream id that stands for the route's own upstream at `default_weight`. Backends that
/// resolve to the same upstream each keep their own entry, but the upstream is added to `ctx`
/// once.
pub async fn translate_traffic_split<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    ns: &str,
    backends: &[Backend],
    default_weight: u32,
    ctx: &mut TranslateContext,
) -> Result<TrafficSplitConfig, TranslateError> {
    let mut weighted_upstreams = Vec::with_capacity(backends.len() + 1);
    for backend in backends {
        let ups = translate_backend(lookup, config, ns, backend).await?;
        weighted_upstreams.push(WeightedUpstream {
            upstream_id: ups.id.clone(),
            weight: backend.weight.unwrap_or(config.default_weight),
        });
        ctx.add_upstream(ups);
    }

    weighted_upstreams.push(WeightedUpstream {
        upstream_id: String::new(),
        weight: default_weight,
    });

    Ok(TrafficSplitConfig {
        rules: vec![TrafficSplitRule { weighted_upstreams }],
    })
}

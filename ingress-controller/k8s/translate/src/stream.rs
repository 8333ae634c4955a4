use crate::{
    backend::translate_backend, route::collect_plugins, Backend, TranslateContext, TranslateError,
};
use apisix_ingress_controller_core::{
    gen_id, stream_route_name, upstream::Scheme, FieldError, StreamRoute, TranslateConfig,
};
use apisix_ingress_controller_k8s_api::{
    apisix::{ApisixRouteHttpBackend, ApisixRouteStream},
    Lookup,
};
use tracing::debug;

pub(crate) async fn translate_stream_rule<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    ns: &str,
    name: &str,
    rule: &ApisixRouteStream,
    ctx: &mut TranslateContext,
) -> Result<(), TranslateError> {
    let scheme = match rule.protocol.to_ascii_uppercase().as_str() {
        "TCP" => Scheme::Tcp,
        "UDP" => Scheme::Udp,
        _ => return Err(FieldError::invalid("stream.protocol").into()),
    };

    let backend = Backend::try_from(&ApisixRouteHttpBackend::from(rule.backend.clone()))?;
    let mut ups = translate_backend(lookup, config, ns, &backend).await?;
    ups.scheme = scheme;

    let route = StreamRoute {
        id: gen_id(&stream_route_name(ns, name, &rule.name)),
        server_port: Some(rule.matches.ingress_port),
        sni: rule.matches.host.clone().filter(|h| !h.is_empty()),
        upstream_id: ups.id.clone(),
        plugins: collect_plugins(lookup, ns, &rule.plugins).await?,
        ..Default::default()
    };
    debug!(%ns, %name, rule = %rule.name, id = %route.id, "Translated stream rule");

    ctx.add_upstream(ups);
    ctx.add_stream_route(route);
    Ok(())
}

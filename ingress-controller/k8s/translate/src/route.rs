use crate::{
    backend::translate_backend, expr::compile_rule, stream, traffic_split::translate_traffic_split,
    Backend, MatchRule, TranslateContext, TranslateError,
};
use ahash::AHashSet;
use apisix_ingress_controller_core::{
    gen_id, plugin_config_name, route_name, FieldError, Plugins, Route, Timeout,
    TrafficSplitConfig, TranslateConfig,
};
use apisix_ingress_controller_k8s_api::{
    apisix::{
        ApisixRoute, ApisixRouteAuthentication, ApisixRouteHttp, ApisixRoutePlugin,
        ApisixRouteTimeout,
    },
    secret, K8sDuration, Lookup, ResourceExt,
};
use serde_json::{json, Value};
use tracing::debug;

/// Translates every HTTP and stream rule of an `ApisixRoute`.
///
/// Rule names must be unique within each of the `http` and `stream` lists.
pub async fn translate_apisix_route<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    ar: &ApisixRoute,
) -> Result<TranslateContext, TranslateError> {
    let ns = ar.namespace().unwrap_or_default();
    let name = ar.name_any();
    let mut ctx = TranslateContext::default();

    let mut seen = AHashSet::new();
    for rule in &ar.spec.http {
        if !seen.insert(rule.name.as_str()) {
            return Err(TranslateError::DuplicateRule(rule.name.clone()));
        }
        let route = translate_http_rule(lookup, config, &ns, &name, rule, &mut ctx).await?;
        debug!(%ns, %name, rule = %rule.name, id = %route.id, "Translated HTTP rule");
        ctx.add_route(route);
    }

    let mut seen = AHashSet::new();
    for rule in &ar.spec.stream {
        if !seen.insert(rule.name.as_str()) {
            return Err(TranslateError::DuplicateRule(rule.name.clone()));
        }
        stream::translate_stream_rule(lookup, config, &ns, &name, rule, &mut ctx).await?;
    }

    Ok(ctx)
}

async fn translate_http_rule<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    ns: &str,
    name: &str,
    rule: &ApisixRouteHttp,
    ctx: &mut TranslateContext,
) -> Result<Route, TranslateError> {
    let matches = compile_rule(&MatchRule::from(&rule.matches))?;

    let mut plugins = collect_plugins(lookup, ns, &rule.plugins).await?;
    if let Some(auth) = rule.authentication.as_ref().filter(|a| a.enable) {
        let (plugin, config) = authentication_plugin(auth);
        plugins.insert(plugin.to_string(), config);
    }

    let timeout = rule
        .timeout
        .as_ref()
        .map(|t| route_timeout(config, t))
        .transpose()?;

    let plugin_config_id = rule
        .plugin_config_name
        .as_deref()
        .filter(|pc| !pc.is_empty())
        .map(|pc| gen_id(&plugin_config_name(ns, pc)));

    let route_name = route_name(ns, name, &rule.name);
    let mut route = Route {
        id: gen_id(&route_name),
        name: route_name,
        priority: rule.priority,
        uris: matches.uris,
        hosts: matches.hosts,
        methods: matches.methods,
        remote_addrs: matches.remote_addrs,
        vars: matches.vars,
        plugin_config_id,
        enable_websocket: rule.websocket,
        timeout,
        plugins,
        ..Default::default()
    };

    let backends = rule
        .backends
        .iter()
        .map(Backend::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(split) = route_backends(lookup, config, ns, &backends, &mut route, ctx).await? {
        let split = split.to_plugin()?;
        if let Some(user) = route
            .plugins
            .insert(TrafficSplitConfig::PLUGIN_NAME.to_string(), split)
        {
            debug!(%ns, %name, rule = %rule.name, ?user, "Backend weights override traffic-split plugin");
        }
    }

    Ok(route)
}

/// Fields left unset take the default upstream timeout. Negative durations are rejected.
fn route_timeout(
    config: &TranslateConfig,
    t: &ApisixRouteTimeout,
) -> Result<Timeout, FieldError> {
    let default = config.default_upstream_timeout_secs;
    let secs = |d: Option<&K8sDuration>, field: &str| match d {
        None => Ok(default),
        Some(d) if d.is_negative() => Err(FieldError::invalid(field)),
        Some(d) => Ok(d.as_secs()),
    };
    Ok(Timeout {
        connect: secs(t.connect.as_ref(), "timeout.connect")?,
        send: secs(t.send.as_ref(), "timeout.send")?,
        read: secs(t.read.as_ref(), "timeout.read")?,
    })
}

/// Points the route at its first backend and returns a traffic split for any further backends.
///
/// The route's own upstream keeps the first backend's weight in the split.
pub(crate) async fn route_backends<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    ns: &str,
    backends: &[Backend],
    route: &mut Route,
    ctx: &mut TranslateContext,
) -> Result<Option<TrafficSplitConfig>, TranslateError> {
    let Some((first, rest)) = backends.split_first() else {
        return Ok(None);
    };

    let ups = translate_backend(lookup, config, ns, first).await?;
    route.upstream_id = ups.id.clone();
    ctx.add_upstream(ups);

    if rest.is_empty() {
        return Ok(None);
    }
    let default_weight = first.weight.unwrap_or(config.default_weight);
    let split = translate_traffic_split(lookup, config, ns, rest, default_weight, ctx).await?;
    Ok(Some(split))
}

/// Collects the enabled plugins. A plugin's `secretRef` names a Secret in the route's namespace
/// whose entries are merged into the plugin config.
pub(crate) async fn collect_plugins<L: Lookup + ?Sized>(
    lookup: &L,
    ns: &str,
    plugins: &[ApisixRoutePlugin],
) -> Result<Plugins, TranslateError> {
    let mut out = Plugins::new();
    for plugin in plugins.iter().filter(|p| p.enable) {
        let mut config = plugin.config.clone().unwrap_or_default();
        if let Some(secret_ref) = plugin.secret_ref.as_deref().filter(|s| !s.is_empty()) {
            let secret = lookup.secret(ns, secret_ref).await?;
            for (k, v) in secret::string_data(&secret) {
                config.insert(k, Value::String(v));
            }
        }
        out.insert(plugin.name.clone(), Value::Object(config));
    }
    Ok(out)
}

fn authentication_plugin(auth: &ApisixRouteAuthentication) -> (&'static str, Value) {
    match auth.kind.as_str() {
        "keyAuth" => {
            let mut config = serde_json::Map::new();
            if let Some(header) = auth.key_auth.as_ref().map(|k| &k.header) {
                if !header.is_empty() {
                    config.insert("header".to_string(), Value::String(header.clone()));
                }
            }
            ("key-auth", Value::Object(config))
        }
        "jwtAuth" => {
            let mut config = serde_json::Map::new();
            if let Some(jwt) = auth.jwt_auth.as_ref() {
                for (k, v) in [
                    ("header", &jwt.header),
                    ("query", &jwt.query),
                    ("cookie", &jwt.cookie),
                ] {
                    if !v.is_empty() {
                        config.insert(k.to_string(), Value::String(v.clone()));
                    }
                }
            }
            ("jwt-auth", Value::Object(config))
        }
        "ldapAuth" => {
            let ldap = auth.ldap_auth.clone().unwrap_or_default();
            let config = json!({
                "ldap_uri": ldap.ldap_uri,
                "base_dn": ldap.base_dn,
                "use_tls": ldap.use_tls,
                "uid": ldap.uid,
            });
            ("ldap-auth", config)
        }
        "wolfRBAC" => ("wolf-rbac", json!({})),
        "hmacAuth" => ("hmac-auth", json!({})),
        _ => ("basic-auth", json!({})),
    }
}

use crate::{
    expr::compile_rule, route::route_backends, Backend, MatchRule, TranslateContext,
    TranslateError,
};
use apisix_ingress_controller_core::{gen_id, route_name, Route, TrafficSplitConfig, TranslateConfig};
use apisix_ingress_controller_k8s_api::{
    apisix::{ApisixRouteHttpMatchExpr, ApisixRouteHttpMatchExprSubject},
    gateway::{
        HTTPRoute, HTTPRouteRulesBackendRefs, HTTPRouteRulesMatches,
        HTTPRouteRulesMatchesHeadersType, HTTPRouteRulesMatchesPathType,
        HTTPRouteRulesMatchesQueryParamsType,
    },
    IntOrString, Lookup, ResourceExt,
};
use tracing::debug;

/// Translates a Gateway API `HTTPRoute` into one route per rule and match.
///
/// A rule without matches is treated as matching every path.
pub async fn translate_http_route<L: Lookup + ?Sized>(
    lookup: &L,
    config: &TranslateConfig,
    httproute: &HTTPRoute,
) -> Result<TranslateContext, TranslateError> {
    let ns = httproute.namespace().unwrap_or_default();
    let name = httproute.name_any();
    let hosts = httproute.spec.hostnames.clone().unwrap_or_default();
    let mut ctx = TranslateContext::default();

    for (i, rule) in httproute.spec.rules.iter().flatten().enumerate() {
        let backends = rule
            .backend_refs
            .iter()
            .flatten()
            .filter_map(|br| backend(&ns, &name, br))
            .collect::<Result<Vec<_>, _>>()?;

        let matches: Vec<Option<&HTTPRouteRulesMatches>> = match rule.matches.as_deref() {
            Some(matches) if !matches.is_empty() => matches.iter().map(Some).collect(),
            _ => vec![None],
        };
        for (j, m) in matches.into_iter().enumerate() {
            let mut mr = match_rule(m)?;
            mr.hosts = hosts.clone();
            let compiled = compile_rule(&mr)?;

            let route_name = route_name(&ns, &name, &format!("{i}-{j}"));
            let mut route = Route {
                id: gen_id(&route_name),
                name: route_name,
                uris: compiled.uris,
                hosts: compiled.hosts,
                methods: compiled.methods,
                vars: compiled.vars,
                ..Default::default()
            };
            if let Some(split) =
                route_backends(lookup, config, &ns, &backends, &mut route, &mut ctx).await?
            {
                route
                    .plugins
                    .insert(TrafficSplitConfig::PLUGIN_NAME.to_string(), split.to_plugin()?);
            }
            ctx.add_route(route);
        }
    }

    Ok(ctx)
}

/// Only Service backends are supported; other kinds are skipped.
fn backend(
    ns: &str,
    name: &str,
    br: &HTTPRouteRulesBackendRefs,
) -> Option<Result<Backend, TranslateError>> {
    let group = br.group.as_deref().unwrap_or_default();
    let kind = br.kind.as_deref().unwrap_or("Service");
    if !group.is_empty() || kind != "Service" {
        debug!(%ns, %name, backend = %br.name, %group, %kind, "Skipping unsupported backend kind");
        return None;
    }
    let Some(port) = br.port else {
        return Some(Err(TranslateError::PortNotDefined));
    };

    let mut backend = Backend::new(br.name.clone(), IntOrString::Int(port))
        .with_weight(br.weight.map(|w| u32::try_from(w).unwrap_or(0)));
    backend.namespace = br.namespace.clone();
    Some(Ok(backend))
}

fn match_rule(m: Option<&HTTPRouteRulesMatches>) -> Result<MatchRule, TranslateError> {
    let mut rule = MatchRule::default();

    let path = m.and_then(|m| m.path.as_ref());
    let kind = path
        .and_then(|p| p.r#type.clone())
        .unwrap_or(HTTPRouteRulesMatchesPathType::PathPrefix);
    let value = path
        .and_then(|p| p.value.clone())
        .unwrap_or_else(|| "/".to_string());
    match kind {
        HTTPRouteRulesMatchesPathType::Exact => rule.paths = vec![value],
        HTTPRouteRulesMatchesPathType::PathPrefix => {
            let prefix = value.trim_end_matches('/');
            rule.paths = if prefix.is_empty() {
                vec!["/*".to_string()]
            } else {
                vec![prefix.to_string(), format!("{prefix}/*")]
            };
        }
        HTTPRouteRulesMatchesPathType::RegularExpression => {
            rule.paths = vec!["/*".to_string()];
            rule.exprs.push(mk_expr("Path", "", "RegexMatch", value));
        }
    }

    let Some(m) = m else {
        return Ok(rule);
    };

    for h in m.headers.iter().flatten() {
        let op = match h.r#type {
            Some(HTTPRouteRulesMatchesHeadersType::RegularExpression) => "RegexMatch",
            _ => "Equal",
        };
        rule.headers.push(mk_expr("Header", &h.name, op, h.value.clone()));
    }

    for q in m.query_params.iter().flatten() {
        let op = match q.r#type {
            Some(HTTPRouteRulesMatchesQueryParamsType::RegularExpression) => "RegexMatch",
            _ => "Equal",
        };
        rule.query.push(mk_expr("Query", &q.name, op, q.value.clone()));
    }

    if let Some(method) = m.method.as_ref() {
        if let serde_json::Value::String(method) = serde_json::to_value(method)? {
            rule.methods.push(method);
        }
    }

    Ok(rule)
}

fn mk_expr(scope: &str, name: &str, op: &str, value: String) -> ApisixRouteHttpMatchExpr {
    ApisixRouteHttpMatchExpr {
        subject: ApisixRouteHttpMatchExprSubject {
            scope: scope.to_string(),
            name: name.to_string(),
        },
        op: op.to_string(),
        value: Some(value),
        set: None,
    }
}

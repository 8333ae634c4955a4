use super::*;
use crate::{translate_http_route, TranslateError};
use apisix_ingress_controller_core::{gen_id, TranslateConfig};
use apisix_ingress_controller_k8s_api::gateway::{HTTPRoute, HTTPRouteSpec};
use pretty_assertions::assert_eq;
use serde_json::json;

fn mk_http_route(spec: serde_json::Value) -> HTTPRoute {
    let spec: HTTPRouteSpec = serde_json::from_value(spec).expect("spec must parse");
    let mut route = HTTPRoute::new("web", spec);
    route.metadata.namespace = Some("default".to_string());
    route
}

#[tokio::test]
async fn route_per_rule_and_match() {
    let _tracing = init_tracing();
    let hr = mk_http_route(json!({
        "hostnames": ["example.com"],
        "rules": [
            {
                "matches": [
                    {"path": {"type": "Exact", "value": "/login"}, "method": "POST"},
                    {"path": {"type": "PathPrefix", "value": "/api/"}},
                ],
                "backendRefs": [{"name": "httpbin", "port": 80}],
            },
            {
                "backendRefs": [{"name": "svc-a", "port": 80}],
            },
        ],
    }));

    let ctx = translate_http_route(&mk_lookup(), &TranslateConfig::default(), &hr)
        .await
        .expect("route must translate");

    let summary = ctx
        .routes
        .iter()
        .map(|r| (r.name.as_str(), r.uris.clone(), r.methods.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("default_web_0-0", vec!["/login".to_string()], vec!["POST".to_string()]),
            (
                "default_web_0-1",
                vec!["/api".to_string(), "/api/*".to_string()],
                vec![]
            ),
            ("default_web_1-0", vec!["/*".to_string()], vec![]),
        ]
    );
    assert_eq!(ctx.routes[0].id, gen_id("default_web_0-0"));
    assert_eq!(ctx.routes[0].hosts, vec!["example.com".to_string()]);
    assert_eq!(ctx.routes[0].upstream_id, upstream_id("httpbin"));
    assert_eq!(ctx.routes[2].upstream_id, upstream_id("svc-a"));
    assert_eq!(ctx.upstreams.len(), 2);
}

#[tokio::test]
async fn headers_and_query_become_vars() {
    let hr = mk_http_route(json!({
        "rules": [{
            "matches": [{
                "path": {"type": "RegularExpression", "value": "^/v[0-9]+/"},
                "queryParams": [{"name": "Debug", "value": "1"}],
                "headers": [
                    {"name": "X-Canary", "value": "true"},
                    {"type": "RegularExpression", "name": "User-Agent", "value": ".*Mobile.*"},
                ],
            }],
        }],
    }));

    let ctx = translate_http_route(&mk_lookup(), &TranslateConfig::default(), &hr)
        .await
        .unwrap();
    let route = &ctx.routes[0];
    assert_eq!(route.uris, vec!["/*".to_string()]);
    let vars = route
        .vars
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert_eq!(
        vars,
        vec![
            r#"["http_x_canary","==","true"]"#,
            r#"["http_user_agent","~~",".*Mobile.*"]"#,
            r#"["arg_debug","==","1"]"#,
            r#"["uri","~~","^/v[0-9]+/"]"#,
        ]
    );
    assert!(route.upstream_id.is_empty());
}

#[tokio::test]
async fn weighted_backend_refs() {
    let hr = mk_http_route(json!({
        "rules": [{
            "backendRefs": [
                {"name": "httpbin", "port": 80, "weight": 50},
                {"name": "svc-a", "port": 80, "weight": 25},
                {"name": "bucket", "kind": "Bucket", "group": "storage.example.com"},
            ],
        }],
    }));

    let ctx = translate_http_route(&mk_lookup(), &TranslateConfig::default(), &hr)
        .await
        .unwrap();
    let route = &ctx.routes[0];
    assert_eq!(route.upstream_id, upstream_id("httpbin"));
    assert_eq!(
        route.plugins.get("traffic-split"),
        Some(&json!({
            "rules": [{
                "weighted_upstreams": [
                    {"upstream_id": upstream_id("svc-a"), "weight": 25},
                    {"weight": 50},
                ],
            }],
        }))
    );
}

#[tokio::test]
async fn backend_ref_without_port() {
    let hr = mk_http_route(json!({
        "rules": [{"backendRefs": [{"name": "httpbin"}]}],
    }));
    let err = translate_http_route(&mk_lookup(), &TranslateConfig::default(), &hr)
        .await
        .expect_err("missing port must fail");
    assert!(matches!(err, TranslateError::PortNotDefined));
}

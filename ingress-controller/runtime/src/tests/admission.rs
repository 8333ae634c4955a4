use super::*;
use crate::k8s::apisix::{ApisixTls, ApisixTlsSpec};
use pretty_assertions::assert_eq;
use serde_json::json;

fn apisix_route(spec: serde_json::Value) -> serde_json::Value {
    json!({
        "apiVersion": "apisix.apache.org/v2",
        "kind": "ApisixRoute",
        "metadata": {"namespace": "default", "name": "route"},
        "spec": spec,
    })
}

#[tokio::test]
async fn denies_invalid_route() {
    let _tracing = init_tracing();
    let admission = mk_admission(Snapshot::default(), vec![]);

    let rsp = admission
        .admit(mk_request(apisix_route(json!({
            "http": [{
                "name": "rule1",
                "match": {
                    "paths": ["/*"],
                    "exprs": [{"subject": {"scope": "Query", "name": "id"}, "op": "In", "value": "1"}],
                },
            }],
        }))))
        .await;
    assert_eq!(denial(&rsp), Some("empty set value"));

    let rsp = admission
        .admit(mk_request(apisix_route(json!({
            "http": [
                {"name": "rule1", "match": {"paths": ["/a"]}},
                {"name": "rule1", "match": {"paths": ["/b"]}},
            ],
        }))))
        .await;
    assert_eq!(denial(&rsp), Some("duplicate rule name \"rule1\""));
}

#[tokio::test]
async fn warns_about_missing_backends() {
    let _tracing = init_tracing();
    let admission = mk_admission(Snapshot::default(), vec![]);

    let rsp = admission
        .admit(mk_request(apisix_route(json!({
            "http": [{
                "name": "rule1",
                "match": {"paths": ["/*"]},
                "backends": [{"serviceName": "httpbin", "servicePort": 80}],
            }],
        }))))
        .await;
    assert!(rsp.allowed);
    assert_eq!(
        rsp.warnings,
        Some(vec!["Referenced Service 'default/httpbin' not found".to_string()])
    );
}

#[tokio::test]
async fn adapts_v2beta3_routes() {
    let _tracing = init_tracing();
    let admission = mk_admission(Snapshot::default(), vec![]);

    let rsp = admission
        .admit(mk_request(json!({
            "apiVersion": "apisix.apache.org/v2beta3",
            "kind": "ApisixRoute",
            "metadata": {"namespace": "default", "name": "route"},
            "spec": {
                "http": [{
                    "name": "rule1",
                    "match": {"paths": ["/*"]},
                    "backend": {"serviceName": "legacy", "servicePort": 80},
                }],
            },
        })))
        .await;
    assert!(rsp.allowed);
    assert_eq!(
        rsp.warnings,
        Some(vec!["Referenced Service 'default/legacy' not found".to_string()])
    );
}

#[tokio::test]
async fn ignores_other_ingress_classes() {
    let _tracing = init_tracing();
    let admission = mk_admission(Snapshot::default(), vec![]);

    let rsp = admission
        .admit(mk_request(apisix_route(json!({
            "ingressClassName": "nginx",
            "http": [{"name": "rule1", "match": {"paths": ["/*"]}, "backends": [{"serviceName": "httpbin", "servicePort": 80}]}],
        }))))
        .await;
    assert!(rsp.allowed);
    assert_eq!(rsp.warnings, None);
}

#[tokio::test]
async fn validates_upstream_settings() {
    let _tracing = init_tracing();
    let admission = mk_admission(Snapshot::default(), vec![]);
    let upstream = |spec: serde_json::Value| {
        json!({
            "apiVersion": "apisix.apache.org/v2",
            "kind": "ApisixUpstream",
            "metadata": {"namespace": "default", "name": "httpbin"},
            "spec": spec,
        })
    };

    let rsp = admission
        .admit(mk_request(upstream(json!({
            "healthCheck": {"active": {"type": "redis"}},
        }))))
        .await;
    assert_eq!(denial(&rsp), Some("healthCheck.active.Type: invalid value"));

    let rsp = admission
        .admit(mk_request(upstream(json!({
            "portLevelSettings": [{"port": 80, "scheme": "ftp"}],
        }))))
        .await;
    assert_eq!(denial(&rsp), Some("portLevelSettings[0].scheme: invalid value"));

    let rsp = admission
        .admit(mk_request(upstream(json!({"retries": 3}))))
        .await;
    assert!(rsp.allowed);
    assert_eq!(
        rsp.warnings,
        Some(vec!["Referenced Service 'default/httpbin' not found".to_string()])
    );
}

#[tokio::test]
async fn denies_conflicting_certificates() {
    let _tracing = init_tracing();

    let lookup = Snapshot::default()
        .with_secret(mk_tls_secret("default", "existing", &["example.com"]))
        .with_secret(mk_tls_secret("default", "candidate", &["example.com"]));
    let existing = {
        let spec: ApisixTlsSpec = serde_json::from_value(json!({
            "hosts": ["example.com"],
            "secret": {"name": "existing", "namespace": "default"},
        }))
        .unwrap();
        let mut tls = ApisixTls::new("existing", spec);
        tls.metadata.namespace = Some("default".to_string());
        tls
    };
    let admission = mk_admission(lookup, vec![existing.into()]);

    let gateway = |secret: &str| {
        json!({
            "apiVersion": "gateway.networking.k8s.io/v1",
            "kind": "Gateway",
            "metadata": {"namespace": "default", "name": "gw"},
            "spec": {
                "gatewayClassName": "apisix",
                "listeners": [{
                    "name": "https",
                    "port": 443,
                    "protocol": "HTTPS",
                    "hostname": "example.com",
                    "tls": {"certificateRefs": [{"name": secret}]},
                }],
            },
        })
    };

    let rsp = admission.admit(mk_request(gateway("candidate"))).await;
    assert_eq!(
        denial(&rsp),
        Some(
            "SSL configuration conflicts detected:\n\
             - Host 'example.com' is already configured with a different certificate in ApisixTls/default/existing"
        )
    );

    let rsp = admission.admit(mk_request(gateway("existing"))).await;
    assert!(rsp.allowed);
    assert_eq!(rsp.warnings, None);

    // A certificate that cannot be read does not conflict but is reported.
    let rsp = admission.admit(mk_request(gateway("missing"))).await;
    assert!(rsp.allowed);
    assert_eq!(
        rsp.warnings,
        Some(vec!["Referenced Secret 'default/missing' not found".to_string()])
    );
}

#[tokio::test]
async fn allows_deletes() {
    let _tracing = init_tracing();
    let admission = mk_admission(Snapshot::default(), vec![]);

    let rsp = admission
        .admit(mk_operation(
            "DELETE",
            apisix_route(json!({"http": [{"name": "a"}, {"name": "a"}]})),
        ))
        .await;
    assert!(rsp.allowed);
}

#[tokio::test]
async fn rejects_unsupported_kinds() {
    let _tracing = init_tracing();
    let admission = mk_admission(Snapshot::default(), vec![]);

    let rsp = admission
        .admit(mk_request(json!({
            "apiVersion": "apisix.apache.org/v2",
            "kind": "ApisixConsumer",
            "metadata": {"namespace": "default", "name": "jack"},
            "spec": {},
        })))
        .await;
    assert!(!rsp.allowed);
}

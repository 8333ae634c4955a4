use super::*;
use crate::{
    gateway_class_group, ingress_class_group, ingress_class_name,
    k8s::{
        api::networking::v1::{IngressClassParametersReference, IngressClassSpec, IngressSpec},
        gateway::{GatewayClass, GatewayClassSpec},
        Ingress, IngressClass,
    },
    INGRESS_CLASS_ANNOTATION,
};
use pretty_assertions::assert_eq;

const CONTROLLER: &str = "apisix.apache.org/apisix-ingress-controller";

fn mk_gateway_class(name: &str, spec: serde_json::Value) -> GatewayClass {
    let spec: GatewayClassSpec = serde_json::from_value(spec).expect("spec must parse");
    GatewayClass::new(name, spec)
}

#[test]
fn gateway_classes_group_by_parameters() {
    let gc = mk_gateway_class(
        "apisix",
        serde_json::json!({
            "controllerName": CONTROLLER,
            "parametersRef": {
                "group": "apisix.apache.org",
                "kind": "GatewayProxy",
                "name": "proxy",
                "namespace": "apisix",
            },
        }),
    );
    assert_eq!(
        gateway_class_group(&gc, CONTROLLER),
        Some(GroupKey::new("apisix", "proxy"))
    );

    let gc = mk_gateway_class("plain", serde_json::json!({"controllerName": CONTROLLER}));
    assert_eq!(
        gateway_class_group(&gc, CONTROLLER),
        Some(GroupKey::new("", "GatewayClass/plain"))
    );

    let gc = mk_gateway_class("other", serde_json::json!({"controllerName": "example.com/other"}));
    assert_eq!(gateway_class_group(&gc, CONTROLLER), None);
}

#[test]
fn ingress_classes_share_groups_with_gateway_classes() {
    let ic = IngressClass {
        metadata: mk_meta("", "apisix"),
        spec: Some(IngressClassSpec {
            controller: Some(CONTROLLER.to_string()),
            parameters: Some(IngressClassParametersReference {
                api_group: Some("apisix.apache.org".to_string()),
                kind: "GatewayProxy".to_string(),
                name: "proxy".to_string(),
                namespace: Some("apisix".to_string()),
                scope: Some("Namespace".to_string()),
            }),
        }),
    };
    assert_eq!(
        ingress_class_group(&ic, CONTROLLER),
        Some(GroupKey::new("apisix", "proxy"))
    );

    let ic = IngressClass {
        metadata: mk_meta("", "nginx"),
        spec: Some(IngressClassSpec {
            controller: Some("k8s.io/ingress-nginx".to_string()),
            parameters: None,
        }),
    };
    assert_eq!(ingress_class_group(&ic, CONTROLLER), None);
}

#[test]
fn ingress_class_fallbacks() {
    let mut ing = Ingress {
        metadata: mk_meta("default", "site"),
        ..Default::default()
    };
    assert_eq!(ingress_class_name(&ing, "apisix"), "apisix");

    ing.metadata.annotations = Some(btreemap! {
        INGRESS_CLASS_ANNOTATION.to_string() => "legacy".to_string(),
    });
    assert_eq!(ingress_class_name(&ing, "apisix"), "legacy");

    ing.spec = Some(IngressSpec {
        ingress_class_name: Some("edge".to_string()),
        ..Default::default()
    });
    assert_eq!(ingress_class_name(&ing, "apisix"), "edge");
}

use apisix_ingress_controller_core::{
    expr::ParseError, Expr, FieldError, Operator, Scope, Token,
};
use apisix_ingress_controller_k8s_api::apisix::{ApisixRouteHttpMatch, ApisixRouteHttpMatchExpr};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("empty subject name")]
    EmptySubjectName,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("empty set value")]
    EmptySet,

    #[error("empty value")]
    EmptyValue,

    #[error("neither set nor value is provided")]
    NoValue,

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Everything a single route matches on.
///
/// Header and query matches are expressed as scoped expressions so that both ApisixRoute `exprs`
/// and Gateway API header/query matches compile through [`compile_expr`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchRule {
    pub paths: Vec<String>,
    pub methods: Vec<String>,
    pub hosts: Vec<String>,
    pub headers: Vec<ApisixRouteHttpMatchExpr>,
    pub query: Vec<ApisixRouteHttpMatchExpr>,
    pub remote_addrs: Vec<String>,
    pub exprs: Vec<ApisixRouteHttpMatchExpr>,
}

/// The route fields produced from a [`MatchRule`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledMatch {
    pub uris: Vec<String>,
    pub hosts: Vec<String>,
    pub methods: Vec<String>,
    pub remote_addrs: Vec<String>,
    pub vars: Vec<Expr>,
}

/// Compiles one match expression into the proxy's `[subject, ("!")?, op, value]` form.
pub fn compile_expr(expr: &ApisixRouteHttpMatchExpr) -> Result<Expr, ExprError> {
    let scope = expr.subject.scope.parse::<Scope>()?;
    if scope.requires_name() && expr.subject.name.is_empty() {
        return Err(ExprError::EmptySubjectName);
    }
    let subject = scope.subject_key(&expr.subject.name);

    let op = expr.op.parse::<Operator>()?;
    let operand = if op.takes_set() {
        match expr.set.as_ref() {
            Some(set) if !set.is_empty() => Token::Set(set.clone()),
            _ => return Err(ExprError::EmptySet),
        }
    } else {
        match (expr.value.as_ref(), expr.set.as_ref()) {
            (Some(value), _) => Token::Str(value.clone()),
            (None, Some(_)) => return Err(ExprError::EmptyValue),
            (None, None) => return Err(ExprError::NoValue),
        }
    };

    Ok(Expr::new(subject, op, operand))
}

/// Compiles a full match rule. Expressions are emitted headers first, then query, then generic
/// expressions, each group in source order.
pub fn compile_rule(rule: &MatchRule) -> Result<CompiledMatch, ExprError> {
    for addr in &rule.remote_addrs {
        let valid = addr.parse::<ipnet::IpNet>().is_ok() || addr.parse::<std::net::IpAddr>().is_ok();
        if !valid {
            return Err(FieldError::invalid("match.remoteAddrs").into());
        }
    }

    let vars = rule
        .headers
        .iter()
        .chain(&rule.query)
        .chain(&rule.exprs)
        .map(compile_expr)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledMatch {
        uris: rule.paths.clone(),
        hosts: rule.hosts.clone(),
        methods: rule.methods.clone(),
        remote_addrs: rule.remote_addrs.clone(),
        vars,
    })
}

// === impl MatchRule ===

impl From<&ApisixRouteHttpMatch> for MatchRule {
    fn from(m: &ApisixRouteHttpMatch) -> Self {
        Self {
            paths: m.paths.clone(),
            methods: m.methods.clone(),
            hosts: m.hosts.clone(),
            headers: vec![],
            query: vec![],
            remote_addrs: m.remote_addrs.clone(),
            exprs: m.exprs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apisix_ingress_controller_k8s_api::apisix::ApisixRouteHttpMatchExprSubject;

    fn mk_expr(scope: &str, name: &str, op: &str) -> ApisixRouteHttpMatchExpr {
        ApisixRouteHttpMatchExpr {
            subject: ApisixRouteHttpMatchExprSubject {
                scope: scope.to_string(),
                name: name.to_string(),
            },
            op: op.to_string(),
            value: None,
            set: None,
        }
    }

    fn with_value(mut expr: ApisixRouteHttpMatchExpr, v: &str) -> ApisixRouteHttpMatchExpr {
        expr.value = Some(v.to_string());
        expr
    }

    fn with_set(mut expr: ApisixRouteHttpMatchExpr, set: &[&str]) -> ApisixRouteHttpMatchExpr {
        expr.set = Some(set.iter().map(|s| s.to_string()).collect());
        expr
    }

    #[test]
    fn header_equal() {
        let expr = compile_expr(&with_value(
            mk_expr("Header", "Content-Type", "Equal"),
            "text/plain",
        ))
        .unwrap();
        assert_eq!(expr.to_string(), r#"["http_content_type","==","text/plain"]"#);
    }

    #[test]
    fn query_regex_not_match() {
        let expr = compile_expr(&with_value(
            mk_expr("Query", "ID", "RegexNotMatch"),
            ".*\\.php",
        ))
        .unwrap();
        assert_eq!(expr.to_string(), r#"["arg_id","!","~~",".*\\.php"]"#);
    }

    #[test]
    fn every_operator_symbol() {
        let cases = [
            ("Equal", r#"["cookie_a","==","v"]"#),
            ("NotEqual", r#"["cookie_a","~=","v"]"#),
            ("GreaterThan", r#"["cookie_a",">","v"]"#),
            ("GreaterThanEqual", r#"["cookie_a",">=","v"]"#),
            ("LessThan", r#"["cookie_a","<","v"]"#),
            ("LessThanEqual", r#"["cookie_a","<=","v"]"#),
            ("RegexMatch", r#"["cookie_a","~~","v"]"#),
            ("RegexMatchCaseInsensitive", r#"["cookie_a","~*","v"]"#),
            ("RegexNotMatchCaseInsensitive", r#"["cookie_a","!","~*","v"]"#),
        ];
        for (op, expected) in cases {
            let expr = compile_expr(&with_value(mk_expr("Cookie", "a", op), "v")).unwrap();
            assert_eq!(expr.to_string(), expected, "{op}");
        }
    }

    #[test]
    fn set_operators() {
        let expr = compile_expr(&with_set(mk_expr("Variable", "remote_port", "NotIn"), &["1", "2"]))
            .unwrap();
        assert_eq!(expr.to_string(), r#"["remote_port","!","in",["1","2"]]"#);

        let err = compile_expr(&with_value(mk_expr("Header", "x", "In"), "a")).unwrap_err();
        assert_eq!(err, ExprError::EmptySet);
        assert_eq!(err.to_string(), "empty set value");

        let err = compile_expr(&with_set(mk_expr("Header", "x", "In"), &[])).unwrap_err();
        assert_eq!(err, ExprError::EmptySet);
    }

    #[test]
    fn scalar_operators_need_a_value() {
        let err = compile_expr(&with_set(mk_expr("Header", "x", "Equal"), &["a"])).unwrap_err();
        assert_eq!(err, ExprError::EmptyValue);

        let err = compile_expr(&mk_expr("Header", "x", "Equal")).unwrap_err();
        assert_eq!(err.to_string(), "neither set nor value is provided");
    }

    #[test]
    fn subject_validation() {
        assert_eq!(
            compile_expr(&with_value(mk_expr("Header", "", "Equal"), "v")).unwrap_err(),
            ExprError::EmptySubjectName
        );

        let path = compile_expr(&with_value(mk_expr("Path", "", "RegexMatch"), "^/api")).unwrap();
        assert_eq!(path.to_string(), r#"["uri","~~","^/api"]"#);

        assert!(matches!(
            compile_expr(&with_value(mk_expr("Body", "x", "Equal"), "v")),
            Err(ExprError::Parse(ParseError::Scope(_)))
        ));
        assert!(matches!(
            compile_expr(&with_value(mk_expr("Header", "x", "Like"), "v")),
            Err(ExprError::Parse(ParseError::Operator(_)))
        ));
    }

    #[test]
    fn rule_orders_headers_query_exprs() {
        let rule = MatchRule {
            paths: vec!["/api/*".to_string()],
            headers: vec![with_value(mk_expr("Header", "X-A", "Equal"), "1")],
            query: vec![with_value(mk_expr("Query", "b", "Equal"), "2")],
            exprs: vec![with_value(mk_expr("Cookie", "c", "Equal"), "3")],
            remote_addrs: vec!["10.0.0.0/8".to_string(), "192.168.1.1".to_string()],
            ..Default::default()
        };
        let compiled = compile_rule(&rule).unwrap();
        let vars = compiled
            .vars
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(
            vars,
            vec![
                r#"["http_x_a","==","1"]"#,
                r#"["arg_b","==","2"]"#,
                r#"["cookie_c","==","3"]"#,
            ]
        );
        assert_eq!(compiled.uris, vec!["/api/*".to_string()]);
    }

    #[test]
    fn rejects_bad_remote_addrs() {
        let rule = MatchRule {
            remote_addrs: vec!["10.0.0.0/33".to_string()],
            ..Default::default()
        };
        assert_eq!(
            compile_rule(&rule).unwrap_err(),
            ExprError::Field(FieldError::invalid("match.remoteAddrs"))
        );
    }
}

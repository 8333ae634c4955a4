use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The request attribute a match expression inspects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Query,
    Header,
    Cookie,
    Path,
    Variable,
}

/// A comparison applied to a request attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    RegexMatch,
    RegexNotMatch,
    RegexMatchCI,
    RegexNotMatchCI,
    In,
    NotIn,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("bad subject scope: {0:?}")]
    Scope(String),

    #[error("unknown operator: {0:?}")]
    Operator(String),
}

/// One element of a compiled expression: either a scalar or a nested set of values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Str(String),
    Set(Vec<String>),
}

/// A match expression in the proxy's variable-comparison format, e.g.
/// `["http_content_type", "==", "text/plain"]` or `["arg_id", "!", "in", ["1", "2"]]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expr(Vec<Token>);

// === impl Scope ===

impl Scope {
    /// Whether expressions in this scope must name the attribute they inspect.
    pub fn requires_name(self) -> bool {
        !matches!(self, Self::Path)
    }

    /// The proxy variable that holds the attribute `name` in this scope.
    pub fn subject_key(self, name: &str) -> String {
        match self {
            Self::Query => format!("arg_{}", name.to_ascii_lowercase()),
            Self::Header => format!("http_{}", name.to_ascii_lowercase().replace('-', "_")),
            Self::Cookie => format!("cookie_{name}"),
            Self::Path => "uri".to_string(),
            Self::Variable => name.to_string(),
        }
    }
}

impl FromStr for Scope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Query" => Ok(Self::Query),
            "Header" => Ok(Self::Header),
            "Cookie" => Ok(Self::Cookie),
            "Path" => Ok(Self::Path),
            "Variable" => Ok(Self::Variable),
            s => Err(ParseError::Scope(s.to_string())),
        }
    }
}

// === impl Operator ===

impl Operator {
    /// The proxy's symbol for this comparison. Negated operators share the symbol of their positive
    /// form and are distinguished by [`Operator::is_negated`].
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "~=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::RegexMatch | Self::RegexNotMatch => "~~",
            Self::RegexMatchCI | Self::RegexNotMatchCI => "~*",
            Self::In | Self::NotIn => "in",
        }
    }

    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Self::NotIn | Self::RegexNotMatch | Self::RegexNotMatchCI
        )
    }

    /// Whether the operator compares against a set of values rather than a single value.
    pub fn takes_set(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl FromStr for Operator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Equal" => Ok(Self::Equal),
            "NotEqual" => Ok(Self::NotEqual),
            "GreaterThan" => Ok(Self::GreaterThan),
            "GreaterThanEqual" => Ok(Self::GreaterThanEqual),
            "LessThan" => Ok(Self::LessThan),
            "LessThanEqual" => Ok(Self::LessThanEqual),
            "RegexMatch" => Ok(Self::RegexMatch),
            "RegexNotMatch" => Ok(Self::RegexNotMatch),
            "RegexMatchCaseInsensitive" | "RegexMatchCI" => Ok(Self::RegexMatchCI),
            "RegexNotMatchCaseInsensitive" | "RegexNotMatchCI" => Ok(Self::RegexNotMatchCI),
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            s => Err(ParseError::Operator(s.to_string())),
        }
    }
}

// === impl Token ===

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<String>> for Token {
    fn from(set: Vec<String>) -> Self {
        Self::Set(set)
    }
}

// === impl Expr ===

impl Expr {
    /// Builds an expression from its parts, inserting the `!` token for negated operators.
    pub fn new(subject: String, op: Operator, operand: Token) -> Self {
        let mut tokens = Vec::with_capacity(4);
        tokens.push(Token::Str(subject));
        if op.is_negated() {
            tokens.push("!".into());
        }
        tokens.push(op.symbol().into());
        tokens.push(operand);
        Self(tokens)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }
}

impl<T: Into<Token>> FromIterator<T> for Expr {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_subject_is_normalized() {
        assert_eq!(
            Scope::Header.subject_key("X-Request-Id"),
            "http_x_request_id"
        );
        assert_eq!(Scope::Query.subject_key("ID"), "arg_id");
        assert_eq!(Scope::Path.subject_key(""), "uri");
    }

    #[test]
    fn negated_expressions_have_four_tokens() {
        let expr = Expr::new("arg_id".into(), Operator::RegexNotMatch, ".*\\.php".into());
        assert_eq!(expr.tokens().len(), 4);
        assert_eq!(expr.to_string(), r#"["arg_id","!","~~",".*\\.php"]"#);
    }

    #[test]
    fn sets_serialize_nested() {
        let expr = Expr::new(
            "http_x_env".into(),
            Operator::In,
            vec!["a".to_string(), "b".to_string()].into(),
        );
        assert_eq!(expr.to_string(), r#"["http_x_env","in",["a","b"]]"#);
    }

    #[test]
    fn case_insensitive_operator_aliases() {
        assert_eq!(
            "RegexMatchCaseInsensitive".parse::<Operator>(),
            Ok(Operator::RegexMatchCI)
        );
        assert_eq!(
            "RegexNotMatchCI".parse::<Operator>(),
            Ok(Operator::RegexNotMatchCI)
        );
        assert!("Like".parse::<Operator>().is_err());
    }
}

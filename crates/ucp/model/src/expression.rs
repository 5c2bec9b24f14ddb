//! Constraint operands and operators.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// An operand of an atomic constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    /// A literal JSON value
    Literal(Value),
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// The literal value of this expression
    pub fn value(&self) -> &Value {
        match self {
            Self::Literal(value) => value,
        }
    }

    /// Key used for scope binding and function dispatch.
    ///
    /// A JSON string yields its contents; any other value yields its JSON
    /// text, so `42` and `"42"` map to the same key.
    pub fn as_key(&self) -> String {
        match self {
            Self::Literal(Value::String(s)) => s.clone(),
            Self::Literal(other) => other.to_string(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Self::Literal(other) => write!(f, "{}", other),
        }
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Self::Literal(Value::String(value))
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

macro_rules! literal_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expression {
                fn from(value: $ty) -> Self {
                    Self::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, u32, u64, f64);

/// Comparison operator of an atomic constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Geq,
    Lt,
    Leq,
    In,
    HasPart,
    IsA,
    IsAllOf,
    IsAnyOf,
    IsNoneOf,
}

impl Operator {
    /// All operators, in declaration order.
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Geq,
        Operator::Lt,
        Operator::Leq,
        Operator::In,
        Operator::HasPart,
        Operator::IsA,
        Operator::IsAllOf,
        Operator::IsAnyOf,
        Operator::IsNoneOf,
    ];

    /// Canonical textual form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Neq => "NEQ",
            Self::Gt => "GT",
            Self::Geq => "GEQ",
            Self::Lt => "LT",
            Self::Leq => "LEQ",
            Self::In => "IN",
            Self::HasPart => "HAS_PART",
            Self::IsA => "IS_A",
            Self::IsAllOf => "IS_ALL_OF",
            Self::IsAnyOf => "IS_ANY_OF",
            Self::IsNoneOf => "IS_NONE_OF",
        }
    }

    /// Whether the right operand is expected to be a list of values
    pub fn expects_collection(&self) -> bool {
        matches!(
            self,
            Self::In | Self::IsAllOf | Self::IsAnyOf | Self::IsNoneOf
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownOperator(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_literal_key_is_unquoted() {
        assert_eq!(Expression::from("region").as_key(), "region");
    }

    #[test]
    fn non_string_literal_key_is_json_text() {
        assert_eq!(Expression::literal(42).as_key(), "42");
        assert_eq!(Expression::literal(json!(["a"])).as_key(), "[\"a\"]");
    }

    #[test]
    fn operator_parses_case_insensitively() {
        assert_eq!("geq".parse::<Operator>().unwrap(), Operator::Geq);
        assert_eq!("is-any-of".parse::<Operator>().unwrap(), Operator::IsAnyOf);
        assert!(matches!(
            "LIKE".parse::<Operator>(),
            Err(ModelError::UnknownOperator(_))
        ));
    }

    #[test]
    fn operator_serializes_in_screaming_case() {
        assert_eq!(
            serde_json::to_value(Operator::HasPart).unwrap(),
            json!("HAS_PART")
        );
        for op in Operator::ALL {
            assert_eq!(op.to_string().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn literal_deserializes_from_bare_value() {
        let expr: Expression = serde_json::from_value(json!("eu")).unwrap();
        assert_eq!(expr, Expression::from("eu"));
        assert_eq!(expr.to_string(), "'eu'");
    }
}

//! Operator semantics over JSON values.
//!
//! `actual` is the value known to the caller (a claim, a request attribute),
//! `expected` is the constraint's right operand. Set operators treat a
//! scalar `actual` as a one-element set.

use serde_json::{Number, Value};
use std::cmp::Ordering;
use ucp_model::Operator;

/// Apply `operator` to `actual` and `expected`
pub fn compare(operator: Operator, actual: &Value, expected: &Value) -> bool {
    match operator {
        Operator::Eq | Operator::IsA => values_equal(actual, expected),
        Operator::Neq => !values_equal(actual, expected),
        Operator::Gt => ordering(actual, expected) == Some(Ordering::Greater),
        Operator::Geq => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => ordering(actual, expected) == Some(Ordering::Less),
        Operator::Leq => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::In => match expected {
            Value::Array(candidates) => contains(candidates, actual),
            other => values_equal(actual, other),
        },
        Operator::HasPart => match (actual, expected) {
            (Value::String(whole), Value::String(part)) => whole.contains(part.as_str()),
            (Value::Array(items), part) => contains(items, part),
            _ => false,
        },
        Operator::IsAllOf => {
            let actual = as_set(actual);
            as_set(expected).iter().all(|e| contains(&actual, e))
        }
        Operator::IsAnyOf => {
            let expected = as_set(expected);
            as_set(actual).iter().any(|a| contains(&expected, a))
        }
        Operator::IsNoneOf => {
            let expected = as_set(expected);
            !as_set(actual).iter().any(|a| contains(&expected, a))
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => number_ordering(l, r) == Some(Ordering::Equal),
        _ => left == right,
    }
}

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => number_ordering(l, r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Integers compare exactly; `f64` only when either side is fractional
fn number_ordering(left: &Number, right: &Number) -> Option<Ordering> {
    match (integer(left), integer(right)) {
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn contains(items: &[Value], value: &Value) -> bool {
    items.iter().any(|item| values_equal(item, value))
}

fn as_set(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_normalizes_numbers() {
        assert!(compare(Operator::Eq, &json!(1), &json!(1.0)));
        assert!(compare(Operator::Neq, &json!("eu"), &json!("us")));
        assert!(compare(Operator::IsA, &json!("dataset"), &json!("dataset")));
    }

    #[test]
    fn ordering_applies_to_numbers_and_strings() {
        assert!(compare(Operator::Gt, &json!(5), &json!(3)));
        assert!(compare(Operator::Geq, &json!(3), &json!(3)));
        assert!(compare(Operator::Lt, &json!("2024-01-01"), &json!("2025-01-01")));
        assert!(compare(Operator::Leq, &json!(2.5), &json!(2.5)));
        assert!(!compare(Operator::Gt, &json!("5"), &json!(3)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let above = json!(9_007_199_254_740_993u64);
        let below = json!(9_007_199_254_740_992u64);
        assert!(!compare(Operator::Eq, &above, &below));
        assert!(compare(Operator::Neq, &above, &below));
        assert!(compare(Operator::Gt, &above, &below));
        assert!(compare(Operator::Lt, &json!(-1), &json!(u64::MAX)));
        assert!(compare(Operator::Eq, &json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn membership_operators() {
        assert!(compare(Operator::In, &json!("eu"), &json!(["eu", "us"])));
        assert!(!compare(Operator::In, &json!("apac"), &json!(["eu", "us"])));
        assert!(compare(Operator::HasPart, &json!("europe-west"), &json!("west")));
        assert!(compare(Operator::HasPart, &json!(["a", "b"]), &json!("b")));
    }

    #[test]
    fn set_operators() {
        assert!(compare(Operator::IsAllOf, &json!(["a", "b", "c"]), &json!(["a", "c"])));
        assert!(!compare(Operator::IsAllOf, &json!(["a"]), &json!(["a", "c"])));
        assert!(compare(Operator::IsAnyOf, &json!("b"), &json!(["a", "b"])));
        assert!(compare(Operator::IsNoneOf, &json!(["x", "y"]), &json!(["a", "b"])));
        assert!(!compare(Operator::IsNoneOf, &json!(["x", "a"]), &json!(["a", "b"])));
    }
}

//! Claim-based constraint function
//!
//! Compares the right operand of a constraint with a claim presented by the
//! requesting party. Claims travel in the context as [`Claims`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use ucp_model::{Expression, Operator, RuleRef};

use super::operators::compare;
use crate::context::PolicyContext;
use crate::function::DynamicAtomicConstraintFunction;

/// Claims of the requesting party, keyed by claim name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(pub BTreeMap<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

/// Dynamic function handling a fixed set of claim names.
#[derive(Debug, Clone)]
pub struct ClaimConstraintFunction {
    name: String,
    keys: BTreeSet<String>,
}

impl ClaimConstraintFunction {
    pub fn new<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl DynamicAtomicConstraintFunction for ClaimConstraintFunction {
    fn can_handle(&self, left_operand: &str) -> bool {
        self.keys.contains(left_operand)
    }

    fn evaluate(
        &self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool {
        let key = left.as_key();
        let actual = context.data::<Claims>().and_then(|claims| claims.get(&key)).cloned();
        let Some(actual) = actual else {
            context.report_problem(format!("claim '{}' required by {} is not present", key, rule));
            return false;
        };

        if compare(operator, &actual, right.value()) {
            true
        } else {
            context.report_problem(format!(
                "claim '{}' with value {} does not satisfy {} {}",
                key, actual, operator, right
            ));
            false
        }
    }

    fn validate(
        &self,
        _left: &Expression,
        operator: Operator,
        right: &Expression,
        _rule: RuleRef<'_>,
    ) -> Result<(), String> {
        if operator.expects_collection() && !right.value().is_array() {
            return Err(format!("operator {} expects a list as right operand", operator));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

//! Evaluation plan types
//!
//! A plan mirrors the shape of the policy it was computed for. Nothing is
//! removed: nodes the scope filter would drop carry `filtered: true` and
//! the reasons why.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use ucp_model::{Operator, RuleKind};

/// Explainable report of what evaluating a policy in a scope would do.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyEvaluationPlan {
    pub policy_id: String,
    pub scope: String,
    pub planned_at: DateTime<Utc>,
    pub pre_validators: Vec<ValidatorStep>,
    pub permission_steps: Vec<RuleStep>,
    pub prohibition_steps: Vec<RuleStep>,
    pub obligation_steps: Vec<RuleStep>,
    pub post_validators: Vec<ValidatorStep>,
}

impl PolicyEvaluationPlan {
    /// Top-level rule steps in permission, prohibition, obligation order
    pub fn rule_steps(&self) -> impl Iterator<Item = &RuleStep> {
        self.permission_steps
            .iter()
            .chain(&self.prohibition_steps)
            .chain(&self.obligation_steps)
    }

    /// Every filtering reason in the plan, depth-first
    pub fn filtering_reasons(&self) -> Vec<&str> {
        let mut reasons = Vec::new();
        for step in self.rule_steps() {
            step.collect_reasons(&mut reasons);
        }
        reasons
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorStep {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFunctionStep {
    pub name: String,
}

/// Plan for one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStep {
    pub kind: RuleKind,
    pub action: Option<String>,
    pub filtered: bool,
    pub filtering_reasons: Vec<String>,
    pub rule_functions: Vec<RuleFunctionStep>,
    pub constraint_steps: Vec<ConstraintStep>,

    /// Nested duties of a permission, or the consequence of a duty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duty_steps: Vec<RuleStep>,
}

impl RuleStep {
    /// Number of direct steps: constraints plus rule functions
    pub fn step_count(&self) -> usize {
        self.constraint_steps.len() + self.rule_functions.len()
    }

    fn collect_reasons<'a>(&'a self, reasons: &mut Vec<&'a str>) {
        reasons.extend(self.filtering_reasons.iter().map(String::as_str));
        for step in &self.constraint_steps {
            step.collect_reasons(reasons);
        }
        for duty in &self.duty_steps {
            duty.collect_reasons(reasons);
        }
    }
}

/// Plan for one constraint node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintStep {
    Atomic(AtomicConstraintStep),
    And(MultiplicityConstraintStep),
    Or(MultiplicityConstraintStep),
    Xone(MultiplicityConstraintStep),
}

impl ConstraintStep {
    /// Whether the scope filter would remove this node.
    ///
    /// Only atomic steps can be filtered; a multiplicity node is always kept,
    /// possibly with fewer or no children.
    pub fn is_filtered(&self) -> bool {
        match self {
            Self::Atomic(step) => step.filtered,
            Self::And(_) | Self::Or(_) | Self::Xone(_) => false,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicConstraintStep> {
        match self {
            Self::Atomic(step) => Some(step),
            _ => None,
        }
    }

    fn collect_reasons<'a>(&'a self, reasons: &mut Vec<&'a str>) {
        match self {
            Self::Atomic(step) => {
                reasons.extend(step.filtering_reasons.iter().map(String::as_str))
            }
            Self::And(step) | Self::Or(step) | Self::Xone(step) => {
                for child in &step.constraint_steps {
                    child.collect_reasons(reasons);
                }
            }
        }
    }
}

/// Plan for an atomic constraint.
///
/// A constraint can be out of scope and lack a function at the same time;
/// both reasons are listed then.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomicConstraintStep {
    pub left_operand: String,
    pub operator: Operator,
    pub right_operand: Value,
    pub filtered: bool,
    pub filtering_reasons: Vec<String>,
    pub function_name: Option<String>,
}

/// Plan for an AND, OR or XONE constraint.
///
/// Carries no `filtered` flag or reasons of its own: the scope filter keeps
/// multiplicity nodes and only elides their atomic descendants. Use
/// [`MultiplicityConstraintStep::all_children_filtered`] to spot a node that
/// will be evaluated with no children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiplicityConstraintStep {
    pub constraint_steps: Vec<ConstraintStep>,
}

impl MultiplicityConstraintStep {
    /// True when every child would be filtered, including when there are none
    pub fn all_children_filtered(&self) -> bool {
        self.constraint_steps.iter().all(ConstraintStep::is_filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn atomic(key: &str, filtered: bool) -> ConstraintStep {
        ConstraintStep::Atomic(AtomicConstraintStep {
            left_operand: key.to_string(),
            operator: Operator::Eq,
            right_operand: json!(1),
            filtered,
            filtering_reasons: if filtered {
                vec![format!("left operand '{}' is not bound to scope 's'", key)]
            } else {
                Vec::new()
            },
            function_name: None,
        })
    }

    #[test]
    fn multiplicity_is_kept_when_every_child_is_filtered() {
        let and = MultiplicityConstraintStep {
            constraint_steps: vec![atomic("a", true), atomic("b", true)],
        };
        assert!(and.all_children_filtered());

        let step = ConstraintStep::And(and);
        assert!(!step.is_filtered());

        let mut reasons = Vec::new();
        step.collect_reasons(&mut reasons);
        assert_eq!(reasons.len(), 2);
    }

    #[test]
    fn multiplicity_with_a_kept_child() {
        let or = MultiplicityConstraintStep {
            constraint_steps: vec![atomic("a", true), atomic("b", false)],
        };
        assert!(!or.all_children_filtered());
        assert!(!ConstraintStep::Or(or).is_filtered());
    }
}

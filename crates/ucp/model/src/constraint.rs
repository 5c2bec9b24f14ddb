//! Constraints: atomic predicates and their boolean combinators.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, Result};
use crate::expression::{Expression, Operator};

/// A single `left operator right` predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicConstraint {
    pub left_expression: Expression,
    pub operator: Operator,
    pub right_expression: Expression,
}

impl AtomicConstraint {
    pub fn new(
        left: impl Into<Expression>,
        operator: Operator,
        right: impl Into<Expression>,
    ) -> Self {
        Self {
            left_expression: left.into(),
            operator,
            right_expression: right.into(),
        }
    }

    pub fn builder() -> AtomicConstraintBuilder {
        AtomicConstraintBuilder::default()
    }

    /// Binding and dispatch key of the left operand
    pub fn left_operand_key(&self) -> String {
        self.left_expression.as_key()
    }
}

impl fmt::Display for AtomicConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.left_expression, self.operator, self.right_expression
        )
    }
}

/// Builder for [`AtomicConstraint`].
///
/// All three parts are required; `build` fails fast when one is missing.
#[derive(Debug, Default)]
pub struct AtomicConstraintBuilder {
    left: Option<Expression>,
    operator: Option<Operator>,
    right: Option<Expression>,
}

impl AtomicConstraintBuilder {
    /// Set the left operand (REQUIRED)
    pub fn left(mut self, left: impl Into<Expression>) -> Self {
        self.left = Some(left.into());
        self
    }

    /// Set the operator (REQUIRED)
    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Set the right operand (REQUIRED)
    pub fn right(mut self, right: impl Into<Expression>) -> Self {
        self.right = Some(right.into());
        self
    }

    pub fn build(self) -> Result<AtomicConstraint> {
        Ok(AtomicConstraint {
            left_expression: self.left.ok_or(ModelError::MissingField {
                builder: "AtomicConstraint",
                field: "left_expression",
            })?,
            operator: self.operator.ok_or(ModelError::MissingField {
                builder: "AtomicConstraint",
                field: "operator",
            })?,
            right_expression: self.right.ok_or(ModelError::MissingField {
                builder: "AtomicConstraint",
                field: "right_expression",
            })?,
        })
    }
}

/// Boolean combinator kind of a multiplicity constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplicityKind {
    /// All children must hold
    And,
    /// At least one child must hold
    Or,
    /// Exactly one child must hold
    Xone,
}

impl fmt::Display for MultiplicityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
            Self::Xone => f.write_str("xone"),
        }
    }
}

/// A constraint node.
///
/// Multiplicity variants hold their children in order; the order is kept
/// through scope filtering and reported in evaluation plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Atomic(AtomicConstraint),
    And(Vec<Constraint>),
    Or(Vec<Constraint>),
    Xone(Vec<Constraint>),
}

impl Constraint {
    pub fn atomic(
        left: impl Into<Expression>,
        operator: Operator,
        right: impl Into<Expression>,
    ) -> Self {
        Self::Atomic(AtomicConstraint::new(left, operator, right))
    }

    pub fn and(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self::And(constraints.into_iter().collect())
    }

    pub fn or(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self::Or(constraints.into_iter().collect())
    }

    pub fn xone(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self::Xone(constraints.into_iter().collect())
    }

    /// Build a multiplicity constraint of the given kind
    pub fn multiplicity(kind: MultiplicityKind, constraints: Vec<Constraint>) -> Self {
        match kind {
            MultiplicityKind::And => Self::And(constraints),
            MultiplicityKind::Or => Self::Or(constraints),
            MultiplicityKind::Xone => Self::Xone(constraints),
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicConstraint> {
        match self {
            Self::Atomic(atomic) => Some(atomic),
            _ => None,
        }
    }

    /// Kind and children when this is a multiplicity constraint
    pub fn as_multiplicity(&self) -> Option<(MultiplicityKind, &[Constraint])> {
        match self {
            Self::Atomic(_) => None,
            Self::And(children) => Some((MultiplicityKind::And, children)),
            Self::Or(children) => Some((MultiplicityKind::Or, children)),
            Self::Xone(children) => Some((MultiplicityKind::Xone, children)),
        }
    }

    /// All atomic constraints in this subtree, depth-first
    pub fn atomics(&self) -> Vec<&AtomicConstraint> {
        let mut out = Vec::new();
        self.collect_atomics(&mut out);
        out
    }

    fn collect_atomics<'a>(&'a self, out: &mut Vec<&'a AtomicConstraint>) {
        match self {
            Self::Atomic(atomic) => out.push(atomic),
            Self::And(children) | Self::Or(children) | Self::Xone(children) => {
                for child in children {
                    child.collect_atomics(out);
                }
            }
        }
    }
}

impl From<AtomicConstraint> for Constraint {
    fn from(atomic: AtomicConstraint) -> Self {
        Self::Atomic(atomic)
    }
}

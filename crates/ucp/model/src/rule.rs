//! Rules: permissions, prohibitions and duties.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::Action;
use crate::constraint::Constraint;

/// Kind of a rule.
///
/// Functions are registered per rule kind, so the same left operand can be
/// evaluated differently inside a permission and inside a duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Permission,
    Prohibition,
    Duty,
}

impl RuleKind {
    pub const ALL: [RuleKind; 3] = [RuleKind::Permission, RuleKind::Prohibition, RuleKind::Duty];
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permission => f.write_str("permission"),
            Self::Prohibition => f.write_str("prohibition"),
            Self::Duty => f.write_str("duty"),
        }
    }
}

/// Allows an action, subject to constraints and nested duties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    /// Duties that must be fulfilled to exercise this permission
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duties: Vec<Duty>,
}

impl Permission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    pub fn with_duty(mut self, duty: Duty) -> Self {
        self.duties.push(duty);
        self
    }
}

/// Forbids an action, subject to constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prohibition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Prohibition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }
}

/// Obliges an action, subject to constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    /// Duty that applies when this one is not fulfilled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<Box<Duty>>,
}

impl Duty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    pub fn with_consequence(mut self, consequence: Duty) -> Self {
        self.consequence = Some(Box::new(consequence));
        self
    }
}

/// Borrowed view of any rule.
///
/// This is what the evaluation walk hands down to constraint functions as
/// "the rule I am inside".
#[derive(Debug, Clone, Copy)]
pub enum RuleRef<'a> {
    Permission(&'a Permission),
    Prohibition(&'a Prohibition),
    Duty(&'a Duty),
}

impl<'a> RuleRef<'a> {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Permission(_) => RuleKind::Permission,
            Self::Prohibition(_) => RuleKind::Prohibition,
            Self::Duty(_) => RuleKind::Duty,
        }
    }

    pub fn action(&self) -> Option<&'a Action> {
        match self {
            Self::Permission(p) => p.action.as_ref(),
            Self::Prohibition(p) => p.action.as_ref(),
            Self::Duty(d) => d.action.as_ref(),
        }
    }

    pub fn action_type(&self) -> Option<&'a str> {
        self.action().map(|a| a.action_type.as_str())
    }

    pub fn constraints(&self) -> &'a [Constraint] {
        match self {
            Self::Permission(p) => &p.constraints,
            Self::Prohibition(p) => &p.constraints,
            Self::Duty(d) => &d.constraints,
        }
    }
}

impl<'a> From<&'a Permission> for RuleRef<'a> {
    fn from(rule: &'a Permission) -> Self {
        Self::Permission(rule)
    }
}

impl<'a> From<&'a Prohibition> for RuleRef<'a> {
    fn from(rule: &'a Prohibition) -> Self {
        Self::Prohibition(rule)
    }
}

impl<'a> From<&'a Duty> for RuleRef<'a> {
    fn from(rule: &'a Duty) -> Self {
        Self::Duty(rule)
    }
}

impl fmt::Display for RuleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action_type() {
            Some(action) => write!(f, "{} '{}'", self.kind(), action),
            None => write!(f, "{} without action", self.kind()),
        }
    }
}

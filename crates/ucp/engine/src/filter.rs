//! Scope filter
//!
//! Produces a new policy tree containing only what is bound to a scope:
//!
//! - a rule whose action is not in scope is dropped entirely
//! - an atomic constraint whose left operand is not in scope is elided from
//!   its parent, while the rule itself survives
//! - a multiplicity constraint keeps its kind and the order of the children
//!   that survive, even when some are removed
//! - a policy is never dropped; its metadata is copied unchanged
//!
//! A rule without an action is always in scope.

use std::sync::Arc;

use tracing::trace;
use ucp_model::{Action, AtomicConstraint, Constraint, Duty, Permission, Policy, Prohibition};

use crate::bindings::RuleBindingRegistry;

/// Tree nodes the [`ScopeFilter`] knows how to filter.
pub trait ScopeFilterable {
    /// `Policy` for a policy, `Option<Self>` for everything that can be dropped
    type Output;

    fn filter_scope(&self, filter: &ScopeFilter, scope: &str) -> Self::Output;
}

/// Prunes policy trees against a [`RuleBindingRegistry`].
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    bindings: Arc<RuleBindingRegistry>,
}

impl ScopeFilter {
    pub fn new(bindings: Arc<RuleBindingRegistry>) -> Self {
        Self { bindings }
    }

    /// Filter any supported node for `scope`
    pub fn apply_scope<T: ScopeFilterable + ?Sized>(&self, node: &T, scope: &str) -> T::Output {
        node.filter_scope(self, scope)
    }

    pub fn bindings(&self) -> &Arc<RuleBindingRegistry> {
        &self.bindings
    }

    fn action_in_scope(&self, action: Option<&Action>, scope: &str) -> bool {
        match action {
            Some(action) => {
                let in_scope = self.bindings.is_in_scope(&action.action_type, scope);
                if !in_scope {
                    trace!(action = %action.action_type, scope, "Rule dropped by scope filter");
                }
                in_scope
            }
            None => true,
        }
    }

    fn filter_constraints(&self, constraints: &[Constraint], scope: &str) -> Vec<Constraint> {
        constraints
            .iter()
            .filter_map(|constraint| constraint.filter_scope(self, scope))
            .collect()
    }
}

impl ScopeFilterable for Policy {
    type Output = Policy;

    fn filter_scope(&self, filter: &ScopeFilter, scope: &str) -> Policy {
        let permissions = self
            .permissions
            .iter()
            .filter_map(|p| p.filter_scope(filter, scope))
            .collect();
        let prohibitions = self
            .prohibitions
            .iter()
            .filter_map(|p| p.filter_scope(filter, scope))
            .collect();
        let obligations = self
            .obligations
            .iter()
            .filter_map(|d| d.filter_scope(filter, scope))
            .collect();
        self.with_rules(permissions, prohibitions, obligations)
    }
}

impl ScopeFilterable for Permission {
    type Output = Option<Permission>;

    fn filter_scope(&self, filter: &ScopeFilter, scope: &str) -> Option<Permission> {
        if !filter.action_in_scope(self.action.as_ref(), scope) {
            return None;
        }
        Some(Permission {
            action: self.action.clone(),
            constraints: filter.filter_constraints(&self.constraints, scope),
            duties: self
                .duties
                .iter()
                .filter_map(|d| d.filter_scope(filter, scope))
                .collect(),
        })
    }
}

impl ScopeFilterable for Prohibition {
    type Output = Option<Prohibition>;

    fn filter_scope(&self, filter: &ScopeFilter, scope: &str) -> Option<Prohibition> {
        if !filter.action_in_scope(self.action.as_ref(), scope) {
            return None;
        }
        Some(Prohibition {
            action: self.action.clone(),
            constraints: filter.filter_constraints(&self.constraints, scope),
        })
    }
}

impl ScopeFilterable for Duty {
    type Output = Option<Duty>;

    fn filter_scope(&self, filter: &ScopeFilter, scope: &str) -> Option<Duty> {
        if !filter.action_in_scope(self.action.as_ref(), scope) {
            return None;
        }
        Some(Duty {
            action: self.action.clone(),
            constraints: filter.filter_constraints(&self.constraints, scope),
            consequence: self
                .consequence
                .as_deref()
                .and_then(|c| c.filter_scope(filter, scope))
                .map(Box::new),
        })
    }
}

impl ScopeFilterable for Constraint {
    type Output = Option<Constraint>;

    fn filter_scope(&self, filter: &ScopeFilter, scope: &str) -> Option<Constraint> {
        match self {
            Constraint::Atomic(atomic) => {
                atomic.filter_scope(filter, scope).map(Constraint::Atomic)
            }
            Constraint::And(children) => {
                Some(Constraint::And(filter.filter_constraints(children, scope)))
            }
            Constraint::Or(children) => {
                Some(Constraint::Or(filter.filter_constraints(children, scope)))
            }
            Constraint::Xone(children) => {
                Some(Constraint::Xone(filter.filter_constraints(children, scope)))
            }
        }
    }
}

impl ScopeFilterable for AtomicConstraint {
    type Output = Option<AtomicConstraint>;

    fn filter_scope(&self, filter: &ScopeFilter, scope: &str) -> Option<AtomicConstraint> {
        let key = self.left_operand_key();
        if filter.bindings.is_in_scope(&key, scope) {
            Some(self.clone())
        } else {
            trace!(left_operand = %key, scope, "Constraint elided by scope filter");
            None
        }
    }
}

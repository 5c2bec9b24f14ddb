//! Request scope extraction
//!
//! Accumulates the scopes a request needs (for example the OAuth scopes of
//! a token request) while a policy is evaluated. [`DefaultScopeInjector`]
//! seeds the accumulator before the rule walk; [`ActionScopeExtractor`]
//! adds a scope for every rule whose action carries the configured prefix.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::trace;
use ucp_model::{Policy, RuleRef};

use crate::context::PolicyContext;
use crate::error::ValidatorError;
use crate::function::{PolicyValidatorFunction, RuleFunction};

/// Scopes collected during one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestScope {
    scopes: BTreeSet<String>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scope: impl Into<String>) {
        self.scopes.insert(scope.into());
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Pre-validator adding fixed scopes to every request.
#[derive(Debug, Clone)]
pub struct DefaultScopeInjector {
    scopes: Vec<String>,
}

impl DefaultScopeInjector {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }
}

impl PolicyValidatorFunction for DefaultScopeInjector {
    fn validate(
        &self,
        _policy: &Policy,
        context: &mut PolicyContext,
    ) -> Result<bool, ValidatorError> {
        let request_scope = context.data_or_default::<RequestScope>();
        for scope in &self.scopes {
            request_scope.add(scope.clone());
        }
        Ok(true)
    }

    fn name(&self) -> &str {
        "default-scope-injector"
    }
}

/// Rule function turning `<prefix><scope>` actions into request scopes.
#[derive(Debug, Clone)]
pub struct ActionScopeExtractor {
    prefix: String,
}

impl ActionScopeExtractor {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl RuleFunction for ActionScopeExtractor {
    fn evaluate(&self, rule: RuleRef<'_>, context: &mut PolicyContext) -> bool {
        let Some(scope) = rule
            .action_type()
            .and_then(|action| action.strip_prefix(self.prefix.as_str()))
        else {
            return true;
        };
        if scope.is_empty() {
            context.report_problem(format!("{} names an empty request scope", rule));
            return false;
        }
        trace!(scope, "Request scope extracted");
        context.data_or_default::<RequestScope>().add(scope);
        true
    }

    fn name(&self) -> &str {
        "action-scope-extractor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucp_model::{Action, Duty};

    #[test]
    fn injector_seeds_request_scope() {
        let injector = DefaultScopeInjector::new(["read", "catalog"]);
        let mut context = PolicyContext::new();

        assert_eq!(injector.validate(&Policy::new(), &mut context), Ok(true));
        let scopes: Vec<_> =
            context.data::<RequestScope>().unwrap().scopes().iter().cloned().collect();
        assert_eq!(scopes, vec!["catalog", "read"]);
    }

    #[test]
    fn extractor_adds_prefixed_actions() {
        let extractor = ActionScopeExtractor::new("scope:");
        let duty = Duty::new().with_action(Action::new("scope:transfer"));
        let plain = Duty::new().with_action(Action::new("notify"));
        let mut context = PolicyContext::new();

        assert!(extractor.evaluate(RuleRef::from(&duty), &mut context));
        assert!(extractor.evaluate(RuleRef::from(&plain), &mut context));

        let request_scope = context.data::<RequestScope>().unwrap();
        assert!(request_scope.contains("transfer"));
        assert_eq!(request_scope.scopes().len(), 1);
    }

    #[test]
    fn extractor_rejects_empty_scope() {
        let extractor = ActionScopeExtractor::new("scope:");
        let duty = Duty::new().with_action(Action::new("scope:"));
        let mut context = PolicyContext::new();

        assert!(!extractor.evaluate(RuleRef::from(&duty), &mut context));
        assert_eq!(context.problems(), ["duty 'scope:' names an empty request scope"]);
    }
}

//! Scoped function registry
//!
//! Holds every function registered on a [`PolicyEngineBuilder`](crate::PolicyEngineBuilder).
//! Lookups match registration scopes hierarchically, the same way rule
//! bindings do. Once the engine is built the registry is never mutated.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ucp_model::{Expression, Operator, RuleKind, RuleRef};

use crate::context::PolicyContext;
use crate::function::{
    AtomicConstraintFunction, DynamicAtomicConstraintFunction, PolicyValidatorFunction,
    RuleFunction,
};
use crate::scope::scope_matches;

/// A function together with the scope it was registered for.
struct Scoped<T> {
    scope: String,
    function: T,
}

impl<T> Scoped<T> {
    fn applies_to(&self, scope: &str) -> bool {
        scope_matches(&self.scope, scope)
    }
}

/// Which function resolved an atomic constraint.
#[derive(Clone)]
pub enum ResolvedFunction {
    Static(Arc<dyn AtomicConstraintFunction>),
    Dynamic(Arc<dyn DynamicAtomicConstraintFunction>),
}

impl ResolvedFunction {
    pub fn name(&self) -> &str {
        match self {
            Self::Static(function) => function.name(),
            Self::Dynamic(function) => function.name(),
        }
    }

    pub fn evaluate(
        &self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool {
        match self {
            Self::Static(function) => function.evaluate(left, operator, right, rule, context),
            Self::Dynamic(function) => function.evaluate(left, operator, right, rule, context),
        }
    }

    pub fn validate(
        &self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
        rule: RuleRef<'_>,
    ) -> Result<(), String> {
        match self {
            Self::Static(function) => function.validate(left, operator, right, rule),
            Self::Dynamic(function) => function.validate(left, operator, right, rule),
        }
    }
}

impl fmt::Debug for ResolvedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(function) => f.debug_tuple("Static").field(&function.name()).finish(),
            Self::Dynamic(function) => f.debug_tuple("Dynamic").field(&function.name()).finish(),
        }
    }
}

/// Registered functions, grouped by kind.
#[derive(Default)]
pub struct FunctionRegistry {
    constraint_functions:
        HashMap<(RuleKind, String), Vec<Scoped<Arc<dyn AtomicConstraintFunction>>>>,
    dynamic_functions: Vec<(RuleKind, Scoped<Arc<dyn DynamicAtomicConstraintFunction>>)>,
    rule_functions: Vec<(RuleKind, Scoped<Arc<dyn RuleFunction>>)>,
    pre_validators: Vec<Scoped<Arc<dyn PolicyValidatorFunction>>>,
    post_validators: Vec<Scoped<Arc<dyn PolicyValidatorFunction>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register_constraint_function(
        &mut self,
        scope: impl Into<String>,
        kind: RuleKind,
        key: impl Into<String>,
        function: Arc<dyn AtomicConstraintFunction>,
    ) {
        self.constraint_functions
            .entry((kind, key.into()))
            .or_default()
            .push(Scoped {
                scope: scope.into(),
                function,
            });
    }

    pub(crate) fn register_dynamic_function(
        &mut self,
        scope: impl Into<String>,
        kind: RuleKind,
        function: Arc<dyn DynamicAtomicConstraintFunction>,
    ) {
        self.dynamic_functions.push((
            kind,
            Scoped {
                scope: scope.into(),
                function,
            },
        ));
    }

    pub(crate) fn register_rule_function(
        &mut self,
        scope: impl Into<String>,
        kind: RuleKind,
        function: Arc<dyn RuleFunction>,
    ) {
        self.rule_functions.push((
            kind,
            Scoped {
                scope: scope.into(),
                function,
            },
        ));
    }

    pub(crate) fn register_pre_validator(
        &mut self,
        scope: impl Into<String>,
        function: Arc<dyn PolicyValidatorFunction>,
    ) {
        self.pre_validators.push(Scoped {
            scope: scope.into(),
            function,
        });
    }

    pub(crate) fn register_post_validator(
        &mut self,
        scope: impl Into<String>,
        function: Arc<dyn PolicyValidatorFunction>,
    ) {
        self.post_validators.push(Scoped {
            scope: scope.into(),
            function,
        });
    }

    /// Resolve the function evaluating `key` inside a rule of `kind`.
    ///
    /// Static functions registered for the key win over dynamic ones; within
    /// each group the first registration visible from `scope` wins.
    pub fn resolve(&self, scope: &str, kind: RuleKind, key: &str) -> Option<ResolvedFunction> {
        self.resolve_matching(kind, key, |registered| scope_matches(registered, scope))
    }

    /// Like [`resolve`](Self::resolve), ignoring registration scopes
    pub fn resolve_any_scope(&self, kind: RuleKind, key: &str) -> Option<ResolvedFunction> {
        self.resolve_matching(kind, key, |_| true)
    }

    fn resolve_matching(
        &self,
        kind: RuleKind,
        key: &str,
        visible: impl Fn(&str) -> bool,
    ) -> Option<ResolvedFunction> {
        let lookup = (kind, key.to_string());
        let static_match = self
            .constraint_functions
            .get(&lookup)
            .and_then(|candidates| candidates.iter().find(|c| visible(&c.scope)))
            .map(|c| ResolvedFunction::Static(Arc::clone(&c.function)));
        if static_match.is_some() {
            return static_match;
        }

        self.dynamic_functions
            .iter()
            .filter(|(registered_kind, _)| *registered_kind == kind)
            .map(|(_, candidate)| candidate)
            .find(|c| visible(&c.scope) && c.function.can_handle(key))
            .map(|c| ResolvedFunction::Dynamic(Arc::clone(&c.function)))
    }

    /// Rule functions for `kind` visible from `scope`, in registration order
    pub fn rule_functions(&self, scope: &str, kind: RuleKind) -> Vec<Arc<dyn RuleFunction>> {
        self.rule_functions
            .iter()
            .filter(|(registered_kind, f)| *registered_kind == kind && f.applies_to(scope))
            .map(|(_, f)| Arc::clone(&f.function))
            .collect()
    }

    pub fn pre_validators(&self, scope: &str) -> Vec<Arc<dyn PolicyValidatorFunction>> {
        Self::visible_validators(&self.pre_validators, scope)
    }

    pub fn post_validators(&self, scope: &str) -> Vec<Arc<dyn PolicyValidatorFunction>> {
        Self::visible_validators(&self.post_validators, scope)
    }

    fn visible_validators(
        validators: &[Scoped<Arc<dyn PolicyValidatorFunction>>],
        scope: &str,
    ) -> Vec<Arc<dyn PolicyValidatorFunction>> {
        validators
            .iter()
            .filter(|v| v.applies_to(scope))
            .map(|v| Arc::clone(&v.function))
            .collect()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field(
                "constraint_functions",
                &self.constraint_functions.values().map(Vec::len).sum::<usize>(),
            )
            .field("dynamic_functions", &self.dynamic_functions.len())
            .field("rule_functions", &self.rule_functions.len())
            .field("pre_validators", &self.pre_validators.len())
            .field("post_validators", &self.post_validators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{constraint_fn, dynamic_fn, rule_fn, validator_fn};
    use crate::scope::ALL_SCOPES;

    fn named(name: &'static str) -> Arc<dyn AtomicConstraintFunction> {
        Arc::new(constraint_fn(name, |_, _, _, _, _| true))
    }

    #[test]
    fn static_function_is_found_from_child_scope() {
        let mut registry = FunctionRegistry::new();
        registry.register_constraint_function(
            "catalog",
            RuleKind::Permission,
            "region",
            named("region"),
        );

        let resolved = registry.resolve("catalog.offer", RuleKind::Permission, "region");
        assert_eq!(resolved.map(|f| f.name().to_string()), Some("region".into()));
        assert!(registry.resolve("negotiation", RuleKind::Permission, "region").is_none());
        assert!(registry.resolve("catalog", RuleKind::Duty, "region").is_none());
    }

    #[test]
    fn static_wins_over_dynamic() {
        let mut registry = FunctionRegistry::new();
        registry.register_dynamic_function(
            ALL_SCOPES,
            RuleKind::Permission,
            Arc::new(dynamic_fn("catch-all", |_| true, |_, _, _, _, _| false)),
        );
        registry.register_constraint_function(
            ALL_SCOPES,
            RuleKind::Permission,
            "region",
            named("region"),
        );

        let resolved = registry.resolve("any", RuleKind::Permission, "region");
        assert!(matches!(resolved, Some(ResolvedFunction::Static(_))));

        let fallback = registry.resolve("any", RuleKind::Permission, "purpose");
        assert_eq!(fallback.map(|f| f.name().to_string()), Some("catch-all".into()));
    }

    #[test]
    fn first_dynamic_match_wins() {
        let mut registry = FunctionRegistry::new();
        registry.register_dynamic_function(
            ALL_SCOPES,
            RuleKind::Duty,
            Arc::new(dynamic_fn("never", |_| false, |_, _, _, _, _| true)),
        );
        registry.register_dynamic_function(
            ALL_SCOPES,
            RuleKind::Duty,
            Arc::new(dynamic_fn("first", |_| true, |_, _, _, _, _| true)),
        );
        registry.register_dynamic_function(
            ALL_SCOPES,
            RuleKind::Duty,
            Arc::new(dynamic_fn("second", |_| true, |_, _, _, _, _| true)),
        );

        let resolved = registry.resolve("s", RuleKind::Duty, "anything");
        assert_eq!(resolved.map(|f| f.name().to_string()), Some("first".into()));
    }

    #[test]
    fn any_scope_resolution_ignores_registration_scope() {
        let mut registry = FunctionRegistry::new();
        registry.register_constraint_function(
            "catalog",
            RuleKind::Prohibition,
            "region",
            named("region"),
        );

        assert!(registry.resolve("negotiation", RuleKind::Prohibition, "region").is_none());
        assert!(registry.resolve_any_scope(RuleKind::Prohibition, "region").is_some());
    }

    #[test]
    fn rule_functions_and_validators_are_filtered_by_scope() {
        let mut registry = FunctionRegistry::new();
        let always = |name: &str| Arc::new(rule_fn(name, |_, _| true));
        registry.register_rule_function(ALL_SCOPES, RuleKind::Duty, always("global"));
        registry.register_rule_function("catalog", RuleKind::Duty, always("catalog"));
        registry.register_rule_function("catalog", RuleKind::Permission, always("other-kind"));
        registry.register_pre_validator("catalog", Arc::new(validator_fn("pre", |_, _| Ok(true))));
        registry
            .register_post_validator(ALL_SCOPES, Arc::new(validator_fn("post", |_, _| Ok(true))));

        let names: Vec<_> = registry
            .rule_functions("catalog.offer", RuleKind::Duty)
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["global", "catalog"]);
        assert_eq!(registry.rule_functions("negotiation", RuleKind::Duty).len(), 1);

        assert_eq!(registry.pre_validators("catalog").len(), 1);
        assert!(registry.pre_validators("negotiation").is_empty());
        assert_eq!(registry.post_validators("negotiation").len(), 1);
    }
}

//! Recursive evaluation walk over a scope-filtered policy.
//!
//! The rule being evaluated is passed down explicitly as a [`RuleRef`].
//! Every rule and every constraint of an AND or XONE is evaluated so the
//! context ends up with the full problem set; only OR short-circuits.

use std::sync::Arc;

use tracing::{debug, trace};
use ucp_model::{AtomicConstraint, Constraint, Duty, Permission, Policy, Prohibition, RuleRef};

use crate::context::PolicyContext;
use crate::function::PolicyValidatorFunction;
use crate::registry::FunctionRegistry;

pub(crate) struct Evaluator<'a> {
    functions: &'a FunctionRegistry,
    scope: &'a str,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(functions: &'a FunctionRegistry, scope: &'a str) -> Self {
        Self { functions, scope }
    }

    /// Run one validator phase. Every validator runs; the phase fails if any fails.
    pub(crate) fn run_validators(
        &self,
        phase: &str,
        validators: &[Arc<dyn PolicyValidatorFunction>],
        policy: &Policy,
        context: &mut PolicyContext,
    ) -> bool {
        let mut passed = true;
        for validator in validators {
            let mark = context.problem_count();
            match validator.validate(policy, context) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(phase, validator = validator.name(), "Validator rejected policy");
                    if context.problem_count() == mark {
                        context.report_problem(format!(
                            "{} validator '{}' failed",
                            phase,
                            validator.name()
                        ));
                    }
                    passed = false;
                }
                Err(err) => {
                    debug!(phase, validator = validator.name(), error = %err, "Validator errored");
                    context.report_problem(format!(
                        "{} validator '{}' failed: {}",
                        phase,
                        validator.name(),
                        err
                    ));
                    passed = false;
                }
            }
        }
        passed
    }

    /// Evaluate every rule of an already filtered policy
    pub(crate) fn evaluate_rules(&self, policy: &Policy, context: &mut PolicyContext) -> bool {
        let mut passed = true;
        for permission in &policy.permissions {
            passed &= self.evaluate_permission(permission, context);
        }
        for prohibition in &policy.prohibitions {
            passed &= self.evaluate_prohibition(prohibition, context);
        }
        for duty in &policy.obligations {
            passed &= self.evaluate_duty(duty, context);
        }
        passed
    }

    fn evaluate_permission(&self, permission: &Permission, context: &mut PolicyContext) -> bool {
        let rule = RuleRef::from(permission);
        let mark = context.problem_count();
        let mut passed = self.evaluate_rule_body(rule, context);
        for duty in &permission.duties {
            passed &= self.evaluate_duty(duty, context);
        }
        self.finish_rule(rule, passed, mark, context)
    }

    fn evaluate_prohibition(&self, prohibition: &Prohibition, context: &mut PolicyContext) -> bool {
        let rule = RuleRef::from(prohibition);
        let mark = context.problem_count();
        let passed = self.evaluate_rule_body(rule, context);
        self.finish_rule(rule, passed, mark, context)
    }

    fn evaluate_duty(&self, duty: &Duty, context: &mut PolicyContext) -> bool {
        let rule = RuleRef::from(duty);
        let mark = context.problem_count();
        let passed = self.evaluate_rule_body(rule, context);
        self.finish_rule(rule, passed, mark, context)
    }

    /// Rule functions AND constraints
    fn evaluate_rule_body(&self, rule: RuleRef<'_>, context: &mut PolicyContext) -> bool {
        let mut passed = true;
        for function in self.functions.rule_functions(self.scope, rule.kind()) {
            let mark = context.problem_count();
            if !function.evaluate(rule, context) {
                if context.problem_count() == mark {
                    context.report_problem(format!(
                        "rule function '{}' failed for {}",
                        function.name(),
                        rule
                    ));
                }
                passed = false;
            }
        }
        for constraint in rule.constraints() {
            passed &= self.evaluate_constraint(constraint, rule, context);
        }
        passed
    }

    fn finish_rule(
        &self,
        rule: RuleRef<'_>,
        passed: bool,
        mark: usize,
        context: &mut PolicyContext,
    ) -> bool {
        trace!(rule = %rule, passed, "Rule evaluated");
        if !passed && context.problem_count() == mark {
            context.report_problem(format!("{} was not satisfied", rule));
        }
        passed
    }

    fn evaluate_constraint(
        &self,
        constraint: &Constraint,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool {
        match constraint {
            Constraint::Atomic(atomic) => self.evaluate_atomic(atomic, rule, context),
            Constraint::And(children) => {
                let mut passed = true;
                for child in children {
                    passed &= self.evaluate_constraint(child, rule, context);
                }
                passed
            }
            Constraint::Or(children) => {
                let mark = context.problem_count();
                for child in children {
                    if self.evaluate_constraint(child, rule, context) {
                        context.discard_problems_since(mark);
                        return true;
                    }
                }
                false
            }
            Constraint::Xone(children) => {
                let mark = context.problem_count();
                let mut satisfied = 0usize;
                for child in children {
                    if self.evaluate_constraint(child, rule, context) {
                        satisfied += 1;
                    }
                }
                if satisfied == 1 {
                    context.discard_problems_since(mark);
                    true
                } else {
                    if satisfied > 1 {
                        context.report_problem(format!(
                            "{} of {} children of an exclusive constraint in {} were satisfied",
                            satisfied,
                            children.len(),
                            rule
                        ));
                    }
                    false
                }
            }
        }
    }

    fn evaluate_atomic(
        &self,
        atomic: &AtomicConstraint,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool {
        let key = atomic.left_operand_key();
        let Some(function) = self.functions.resolve(self.scope, rule.kind(), &key) else {
            debug!(left_operand = %key, scope = self.scope, "No function for bound constraint");
            context.report_problem(format!(
                "left operand '{}' is not bound to any function within scope '{}'",
                key, self.scope
            ));
            return false;
        };

        let mark = context.problem_count();
        let passed = function.evaluate(
            &atomic.left_expression,
            atomic.operator,
            &atomic.right_expression,
            rule,
            context,
        );
        trace!(constraint = %atomic, function = function.name(), passed, "Constraint evaluated");
        if !passed && context.problem_count() == mark {
            context.report_problem(format!("constraint {} in {} was not satisfied", atomic, rule));
        }
        passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{constraint_fn, rule_fn};
    use crate::scope::ALL_SCOPES;
    use ucp_model::{Action, Operator, RuleKind};

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        for kind in RuleKind::ALL {
            registry.register_constraint_function(
                ALL_SCOPES,
                kind,
                "yes",
                Arc::new(constraint_fn("yes", |_, _, _, _, _| true)),
            );
            registry.register_constraint_function(
                ALL_SCOPES,
                kind,
                "no",
                Arc::new(constraint_fn("no", |_, _, _, _, _| false)),
            );
        }
        registry
    }

    fn yes() -> Constraint {
        Constraint::atomic("yes", Operator::Eq, true)
    }

    fn no() -> Constraint {
        Constraint::atomic("no", Operator::Eq, true)
    }

    fn evaluate(registry: &FunctionRegistry, constraint: Constraint) -> (bool, PolicyContext) {
        let policy = Policy::new().with_permission(
            Permission::new()
                .with_action(Action::new("use"))
                .with_constraint(constraint),
        );
        let mut context = PolicyContext::new();
        let passed = Evaluator::new(registry, "s").evaluate_rules(&policy, &mut context);
        (passed, context)
    }

    #[test]
    fn or_discards_problems_of_failed_alternatives() {
        let registry = registry();
        let (passed, context) = evaluate(&registry, Constraint::or([no(), yes()]));
        assert!(passed);
        assert!(!context.has_problems());
    }

    #[test]
    fn xone_requires_exactly_one() {
        let registry = registry();
        assert!(evaluate(&registry, Constraint::xone([no(), yes()])).0);

        let (passed, context) = evaluate(&registry, Constraint::xone([yes(), yes()]));
        assert!(!passed);
        assert!(context.problems()[0].contains("2 of 2 children"));

        assert!(!evaluate(&registry, Constraint::xone([no(), no()])).0);
    }

    #[test]
    fn and_reports_every_failure() {
        let registry = registry();
        let (passed, context) = evaluate(&registry, Constraint::and([no(), no()]));
        assert!(!passed);
        assert_eq!(context.problems().len(), 2);
    }

    #[test]
    fn missing_function_fails_constraint() {
        let registry = registry();
        let (passed, context) =
            evaluate(&registry, Constraint::atomic("unknown", Operator::Eq, 1));
        assert!(!passed);
        assert_eq!(
            context.problems(),
            ["left operand 'unknown' is not bound to any function within scope 's'"]
        );
    }

    #[test]
    fn failing_rule_function_reports_generic_problem() {
        let mut registry = registry();
        registry.register_rule_function(
            ALL_SCOPES,
            RuleKind::Permission,
            Arc::new(rule_fn("gate", |_, _| false)),
        );
        let (passed, context) = evaluate(&registry, yes());
        assert!(!passed);
        assert_eq!(
            context.problems(),
            ["rule function 'gate' failed for permission 'use'"]
        );
    }

    #[test]
    fn permission_requires_its_duties() {
        let registry = registry();
        let policy = Policy::new().with_permission(
            Permission::new()
                .with_action(Action::new("use"))
                .with_constraint(yes())
                .with_duty(Duty::new().with_action(Action::new("notify")).with_constraint(no())),
        );
        let mut context = PolicyContext::new();
        assert!(!Evaluator::new(&registry, "s").evaluate_rules(&policy, &mut context));
        assert!(context.problems()[0].contains("duty 'notify'"));
    }

    #[test]
    fn empty_rule_is_satisfied() {
        let registry = FunctionRegistry::new();
        let policy = Policy::new().with_obligation(Duty::new());
        let mut context = PolicyContext::new();
        assert!(Evaluator::new(&registry, "s").evaluate_rules(&policy, &mut context));
    }
}

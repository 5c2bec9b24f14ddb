//! Static policy validation
//!
//! Checks a policy once, independent of any scope: every action and left
//! operand must be bound somewhere, every left operand must have a function
//! for the kind of rule it appears in, and that function must accept the
//! operator and right operand.

use tracing::debug;
use ucp_model::{Constraint, Duty, Policy, RuleRef};

use crate::bindings::RuleBindingRegistry;
use crate::error::{EngineError, Result};
use crate::registry::FunctionRegistry;

pub(crate) struct PolicyValidator<'a> {
    bindings: &'a RuleBindingRegistry,
    functions: &'a FunctionRegistry,
}

impl<'a> PolicyValidator<'a> {
    pub(crate) fn new(bindings: &'a RuleBindingRegistry, functions: &'a FunctionRegistry) -> Self {
        Self {
            bindings,
            functions,
        }
    }

    pub(crate) fn validate(&self, policy: &Policy) -> Result<()> {
        let mut problems = Vec::new();
        for permission in &policy.permissions {
            self.validate_rule(RuleRef::from(permission), &mut problems);
            for duty in &permission.duties {
                self.validate_duty(duty, &mut problems);
            }
        }
        for prohibition in &policy.prohibitions {
            self.validate_rule(RuleRef::from(prohibition), &mut problems);
        }
        for duty in &policy.obligations {
            self.validate_duty(duty, &mut problems);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            debug!(policy_id = %policy.id, problems = problems.len(), "Policy failed validation");
            Err(EngineError::InvalidPolicy { problems })
        }
    }

    fn validate_duty(&self, duty: &Duty, problems: &mut Vec<String>) {
        self.validate_rule(RuleRef::from(duty), problems);
        if let Some(consequence) = duty.consequence.as_deref() {
            self.validate_duty(consequence, problems);
        }
    }

    fn validate_rule(&self, rule: RuleRef<'_>, problems: &mut Vec<String>) {
        if let Some(action) = rule.action_type() {
            if !self.bindings.is_bound(action) {
                problems.push(format!("action '{}' is not bound to any scope", action));
            }
        }
        for constraint in rule.constraints() {
            self.validate_constraint(constraint, rule, problems);
        }
    }

    fn validate_constraint(
        &self,
        constraint: &Constraint,
        rule: RuleRef<'_>,
        problems: &mut Vec<String>,
    ) {
        for atomic in constraint.atomics() {
            let key = atomic.left_operand_key();
            if !self.bindings.is_bound(&key) {
                problems.push(format!("left operand '{}' is not bound to any scope", key));
            }
            match self.functions.resolve_any_scope(rule.kind(), &key) {
                Some(function) => {
                    if let Err(reason) = function.validate(
                        &atomic.left_expression,
                        atomic.operator,
                        &atomic.right_expression,
                        rule,
                    ) {
                        problems.push(format!(
                            "constraint {} in {} is invalid: {}",
                            atomic, rule, reason
                        ));
                    }
                }
                None => problems.push(format!(
                    "left operand '{}' is not bound to any function for {} rules",
                    key,
                    rule.kind()
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::AtomicConstraintFunction;
    use crate::context::PolicyContext;
    use crate::scope::ALL_SCOPES;
    use std::sync::Arc;
    use ucp_model::{Action, Expression, Operator, Permission, RuleKind};

    struct RegionFunction;

    impl AtomicConstraintFunction for RegionFunction {
        fn evaluate(
            &self,
            _left: &Expression,
            _operator: Operator,
            _right: &Expression,
            _rule: RuleRef<'_>,
            _context: &mut PolicyContext,
        ) -> bool {
            true
        }

        fn validate(
            &self,
            _left: &Expression,
            operator: Operator,
            _right: &Expression,
            _rule: RuleRef<'_>,
        ) -> std::result::Result<(), String> {
            if operator == Operator::Eq {
                Ok(())
            } else {
                Err(format!("operator {} is not supported", operator))
            }
        }

        fn name(&self) -> &str {
            "region"
        }
    }

    fn fixtures() -> (RuleBindingRegistry, FunctionRegistry) {
        let bindings = RuleBindingRegistry::new();
        bindings.bind("use", "catalog");
        bindings.bind("region", ALL_SCOPES);
        let mut functions = FunctionRegistry::new();
        functions.register_constraint_function(
            "catalog",
            RuleKind::Permission,
            "region",
            Arc::new(RegionFunction),
        );
        (bindings, functions)
    }

    #[test]
    fn valid_policy_passes() {
        let (bindings, functions) = fixtures();
        let policy = Policy::new().with_permission(
            Permission::new()
                .with_action(Action::new("use"))
                .with_constraint(Constraint::atomic("region", Operator::Eq, "eu")),
        );
        assert!(PolicyValidator::new(&bindings, &functions).validate(&policy).is_ok());
    }

    #[test]
    fn every_problem_is_collected() {
        let (bindings, functions) = fixtures();
        let policy = Policy::new()
            .with_permission(
                Permission::new()
                    .with_action(Action::new("transfer"))
                    .with_constraint(Constraint::atomic(
                        "region",
                        Operator::In,
                        serde_json::json!(["eu"]),
                    )),
            )
            .with_obligation(Duty::new().with_constraint(Constraint::or([Constraint::atomic(
                "region",
                Operator::Eq,
                "eu",
            )])));

        let Err(EngineError::InvalidPolicy { problems }) =
            PolicyValidator::new(&bindings, &functions).validate(&policy)
        else {
            panic!("expected an invalid policy");
        };
        assert_eq!(
            problems,
            vec![
                "action 'transfer' is not bound to any scope",
                "constraint 'region' IN [\"eu\"] in permission 'transfer' is invalid: \
                 operator IN is not supported",
                "left operand 'region' is not bound to any function for duty rules",
            ]
        );
    }
}

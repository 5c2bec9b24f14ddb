//! Evaluation planner
//!
//! Walks the unfiltered policy the same way the engine walks the filtered
//! one, recording for every node whether it would be filtered and why,
//! and which functions would run. The planner never executes a function.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use ucp_model::{
    AtomicConstraint, Constraint, Duty, Permission, Policy, Prohibition, RuleKind, RuleRef,
};

use crate::bindings::RuleBindingRegistry;
use crate::error::{EngineError, Result};
use crate::function::PolicyValidatorFunction;
use crate::plan::{
    AtomicConstraintStep, ConstraintStep, MultiplicityConstraintStep, PolicyEvaluationPlan,
    RuleFunctionStep, RuleStep, ValidatorStep,
};
use crate::registry::FunctionRegistry;

/// Computes [`PolicyEvaluationPlan`]s for one scope.
#[derive(Debug, Clone)]
pub struct EvaluationPlanner {
    scope: String,
    bindings: Arc<RuleBindingRegistry>,
    functions: Arc<FunctionRegistry>,
}

impl EvaluationPlanner {
    pub fn builder() -> EvaluationPlannerBuilder {
        EvaluationPlannerBuilder::default()
    }

    pub(crate) fn from_parts(
        scope: impl Into<String>,
        bindings: Arc<RuleBindingRegistry>,
        functions: Arc<FunctionRegistry>,
    ) -> Self {
        Self {
            scope: scope.into(),
            bindings,
            functions,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn plan(&self, policy: &Policy) -> PolicyEvaluationPlan {
        let plan = PolicyEvaluationPlan {
            policy_id: policy.id.clone(),
            scope: self.scope.clone(),
            planned_at: Utc::now(),
            pre_validators: self.validator_steps(self.functions.pre_validators(&self.scope)),
            permission_steps: policy.permissions.iter().map(|p| self.plan_permission(p)).collect(),
            prohibition_steps: policy
                .prohibitions
                .iter()
                .map(|p| self.plan_prohibition(p))
                .collect(),
            obligation_steps: policy.obligations.iter().map(|d| self.plan_duty(d)).collect(),
            post_validators: self.validator_steps(self.functions.post_validators(&self.scope)),
        };
        debug!(
            policy_id = %plan.policy_id,
            scope = %plan.scope,
            rule_steps = plan.rule_steps().count(),
            "Evaluation plan computed"
        );
        plan
    }

    fn validator_steps(
        &self,
        validators: Vec<Arc<dyn PolicyValidatorFunction>>,
    ) -> Vec<ValidatorStep> {
        validators
            .iter()
            .map(|v| ValidatorStep {
                name: v.name().to_string(),
            })
            .collect()
    }

    fn plan_permission(&self, permission: &Permission) -> RuleStep {
        let mut step = self.plan_rule(RuleRef::from(permission));
        step.duty_steps = permission.duties.iter().map(|d| self.plan_duty(d)).collect();
        step
    }

    fn plan_prohibition(&self, prohibition: &Prohibition) -> RuleStep {
        self.plan_rule(RuleRef::from(prohibition))
    }

    fn plan_duty(&self, duty: &Duty) -> RuleStep {
        let mut step = self.plan_rule(RuleRef::from(duty));
        step.duty_steps = duty
            .consequence
            .as_deref()
            .map(|c| self.plan_duty(c))
            .into_iter()
            .collect();
        step
    }

    fn plan_rule(&self, rule: RuleRef<'_>) -> RuleStep {
        let mut filtering_reasons = Vec::new();
        if let Some(action) = rule.action_type() {
            if !self.bindings.is_in_scope(action, &self.scope) {
                filtering_reasons.push(format!(
                    "action '{}' is not bound to scope '{}'",
                    action, self.scope
                ));
            }
        }

        RuleStep {
            kind: rule.kind(),
            action: rule.action_type().map(str::to_string),
            filtered: !filtering_reasons.is_empty(),
            filtering_reasons,
            rule_functions: self
                .functions
                .rule_functions(&self.scope, rule.kind())
                .iter()
                .map(|f| RuleFunctionStep {
                    name: f.name().to_string(),
                })
                .collect(),
            constraint_steps: rule
                .constraints()
                .iter()
                .map(|c| self.plan_constraint(c, rule.kind()))
                .collect(),
            duty_steps: Vec::new(),
        }
    }

    fn plan_constraint(&self, constraint: &Constraint, kind: RuleKind) -> ConstraintStep {
        let children = |children: &[Constraint]| MultiplicityConstraintStep {
            constraint_steps: children.iter().map(|c| self.plan_constraint(c, kind)).collect(),
        };
        match constraint {
            Constraint::Atomic(atomic) => ConstraintStep::Atomic(self.plan_atomic(atomic, kind)),
            Constraint::And(list) => ConstraintStep::And(children(list)),
            Constraint::Or(list) => ConstraintStep::Or(children(list)),
            Constraint::Xone(list) => ConstraintStep::Xone(children(list)),
        }
    }

    fn plan_atomic(&self, atomic: &AtomicConstraint, kind: RuleKind) -> AtomicConstraintStep {
        let key = atomic.left_operand_key();
        let mut filtering_reasons = Vec::new();

        if !self.bindings.is_in_scope(&key, &self.scope) {
            filtering_reasons.push(format!(
                "left operand '{}' is not bound to scope '{}'",
                key, self.scope
            ));
        }

        let function_name = self
            .functions
            .resolve(&self.scope, kind, &key)
            .map(|f| f.name().to_string());
        if function_name.is_none() {
            filtering_reasons.push(format!(
                "left operand '{}' is not bound to any function within scope '{}'",
                key, self.scope
            ));
        }

        AtomicConstraintStep {
            left_operand: key,
            operator: atomic.operator,
            right_operand: atomic.right_expression.value().clone(),
            filtered: !filtering_reasons.is_empty(),
            filtering_reasons,
            function_name,
        }
    }
}

/// Builder for [`EvaluationPlanner`].
///
/// `scope` and `rule_bindings` are required; without `functions` every
/// atomic constraint is reported as lacking a function.
#[derive(Default)]
pub struct EvaluationPlannerBuilder {
    scope: Option<String>,
    bindings: Option<Arc<RuleBindingRegistry>>,
    functions: Option<Arc<FunctionRegistry>>,
}

impl EvaluationPlannerBuilder {
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn rule_bindings(mut self, bindings: Arc<RuleBindingRegistry>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn build(self) -> Result<EvaluationPlanner> {
        let scope = self.scope.ok_or(EngineError::MissingField {
            builder: "EvaluationPlanner",
            field: "scope",
        })?;
        let bindings = self.bindings.ok_or(EngineError::MissingField {
            builder: "EvaluationPlanner",
            field: "rule_bindings",
        })?;
        Ok(EvaluationPlanner::from_parts(
            scope,
            bindings,
            self.functions.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{constraint_fn, rule_fn, validator_fn};
    use crate::scope::ALL_SCOPES;
    use ucp_model::{Action, Operator};

    fn bindings(pairs: &[(&str, &str)]) -> Arc<RuleBindingRegistry> {
        let registry = RuleBindingRegistry::new();
        for (key, scope) in pairs {
            registry.bind(*key, *scope);
        }
        Arc::new(registry)
    }

    #[test]
    fn build_requires_scope_and_bindings() {
        let err = EvaluationPlanner::builder()
            .rule_bindings(bindings(&[]))
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingField { field: "scope", .. }));

        let err = EvaluationPlanner::builder().scope("s").build().unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingField {
                field: "rule_bindings",
                ..
            }
        ));
    }

    #[test]
    fn unbound_rule_is_reported_not_dropped() {
        let planner = EvaluationPlanner::builder()
            .scope("s")
            .rule_bindings(bindings(&[]))
            .build()
            .unwrap();
        let policy = Policy::new().with_permission(
            Permission::new()
                .with_action(Action::new("use"))
                .with_constraint(Constraint::atomic("region", Operator::Eq, "eu")),
        );

        let plan = planner.plan(&policy);
        assert_eq!(plan.permission_steps.len(), 1);
        let step = &plan.permission_steps[0];
        assert!(step.filtered);
        assert_eq!(step.filtering_reasons, vec!["action 'use' is not bound to scope 's'"]);
        assert_eq!(step.constraint_steps.len(), 1);
    }

    #[test]
    fn atomic_step_lists_both_reasons() {
        let planner = EvaluationPlanner::builder()
            .scope("s")
            .rule_bindings(bindings(&[]))
            .build()
            .unwrap();
        let policy = Policy::new().with_obligation(
            Duty::new().with_constraint(Constraint::atomic("region", Operator::Eq, "eu")),
        );

        let plan = planner.plan(&policy);
        let atomic = plan.obligation_steps[0].constraint_steps[0]
            .as_atomic()
            .expect("atomic step");
        assert!(atomic.filtered);
        assert_eq!(
            atomic.filtering_reasons,
            vec![
                "left operand 'region' is not bound to scope 's'",
                "left operand 'region' is not bound to any function within scope 's'",
            ]
        );
        assert_eq!(atomic.function_name, None);
        assert_eq!(atomic.right_operand, serde_json::json!("eu"));
    }

    #[test]
    fn resolved_functions_are_named() {
        let mut functions = FunctionRegistry::new();
        functions.register_constraint_function(
            ALL_SCOPES,
            RuleKind::Permission,
            "region",
            Arc::new(constraint_fn("region-check", |_, _, _, _, _| true)),
        );
        functions.register_rule_function(
            ALL_SCOPES,
            RuleKind::Permission,
            Arc::new(rule_fn("audit", |_, _| true)),
        );
        functions.register_pre_validator("s", Arc::new(validator_fn("shape", |_, _| Ok(true))));

        let planner = EvaluationPlanner::builder()
            .scope("s.child")
            .rule_bindings(bindings(&[("use", "s"), ("region", "s")]))
            .functions(Arc::new(functions))
            .build()
            .unwrap();
        let policy = Policy::new().with_permission(
            Permission::new()
                .with_action(Action::new("use"))
                .with_constraint(Constraint::and([Constraint::atomic(
                    "region",
                    Operator::Eq,
                    "eu",
                )])),
        );

        let plan = planner.plan(&policy);
        assert_eq!(plan.pre_validators, vec![ValidatorStep { name: "shape".into() }]);
        let step = &plan.permission_steps[0];
        assert!(!step.filtered);
        assert_eq!(step.rule_functions, vec![RuleFunctionStep { name: "audit".into() }]);
        assert_eq!(step.step_count(), 2);

        let ConstraintStep::And(and) = &step.constraint_steps[0] else {
            panic!("expected an AND step");
        };
        let atomic = and.constraint_steps[0].as_atomic().unwrap();
        assert!(!atomic.filtered);
        assert_eq!(atomic.function_name.as_deref(), Some("region-check"));
        assert!(plan.filtering_reasons().is_empty());
    }

    #[test]
    fn plan_serializes_with_tagged_constraint_steps() {
        let planner = EvaluationPlanner::builder()
            .scope("s")
            .rule_bindings(bindings(&[("use", "s")]))
            .build()
            .unwrap();
        let policy = Policy::new().with_id("p-1").with_permission(
            Permission::new()
                .with_action(Action::new("use"))
                .with_constraint(Constraint::or([Constraint::atomic("a", Operator::Eq, 1)])),
        );

        let json = serde_json::to_value(planner.plan(&policy)).unwrap();
        assert_eq!(json["policy_id"], "p-1");
        assert_eq!(json["permission_steps"][0]["kind"], "permission");
        assert_eq!(json["permission_steps"][0]["constraint_steps"][0]["type"], "or");
        assert_eq!(
            json["permission_steps"][0]["constraint_steps"][0]["constraint_steps"][0]["type"],
            "atomic"
        );
    }
}

//! Policy engine
//!
//! Functions are registered on a [`PolicyEngineBuilder`] during startup.
//! [`PolicyEngineBuilder::build`] freezes them into an immutable
//! [`PolicyEngine`] that any number of threads can evaluate against.
//! [`SharedPolicyEngine`] swaps whole engines for deployments that
//! re-register at runtime.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, instrument, warn};
use ucp_model::{Policy, RuleKind};

use crate::bindings::RuleBindingRegistry;
use crate::context::PolicyContext;
use crate::error::{EngineError, Result};
use crate::evaluator::Evaluator;
use crate::filter::ScopeFilter;
use crate::function::{
    AtomicConstraintFunction, DynamicAtomicConstraintFunction, PolicyValidatorFunction,
    RuleFunction,
};
use crate::plan::PolicyEvaluationPlan;
use crate::planner::EvaluationPlanner;
use crate::registry::FunctionRegistry;
use crate::validator::PolicyValidator;

/// Outcome of [`PolicyEngine::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyEvaluationResult {
    pub policy_id: String,
    pub scope: String,
    pub succeeded: bool,

    /// Problems reported to the context during this evaluation
    pub problems: Vec<String>,
}

impl PolicyEvaluationResult {
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn failed(&self) -> bool {
        !self.succeeded
    }
}

/// Collects registrations for a [`PolicyEngine`].
#[derive(Default)]
pub struct PolicyEngineBuilder {
    bindings: Option<Arc<RuleBindingRegistry>>,
    functions: FunctionRegistry,
}

impl PolicyEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry consulted by the scope filter and the planner. Required.
    pub fn with_rule_bindings(mut self, bindings: Arc<RuleBindingRegistry>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    /// Register a function for atomic constraints with left operand `key`
    /// inside rules of `kind`
    pub fn register_function<F>(
        mut self,
        scope: impl Into<String>,
        kind: RuleKind,
        key: impl Into<String>,
        function: F,
    ) -> Self
    where
        F: AtomicConstraintFunction + 'static,
    {
        self.functions
            .register_constraint_function(scope, kind, key, Arc::new(function));
        self
    }

    /// Register one function for `key` inside every rule kind
    pub fn register_function_for_all_kinds<F>(
        mut self,
        scope: impl Into<String>,
        key: impl Into<String>,
        function: F,
    ) -> Self
    where
        F: AtomicConstraintFunction + 'static,
    {
        let scope = scope.into();
        let key = key.into();
        let function: Arc<dyn AtomicConstraintFunction> = Arc::new(function);
        for kind in RuleKind::ALL {
            self.functions.register_constraint_function(
                scope.clone(),
                kind,
                key.clone(),
                Arc::clone(&function),
            );
        }
        self
    }

    pub fn register_dynamic_function<F>(
        mut self,
        scope: impl Into<String>,
        kind: RuleKind,
        function: F,
    ) -> Self
    where
        F: DynamicAtomicConstraintFunction + 'static,
    {
        self.functions
            .register_dynamic_function(scope, kind, Arc::new(function));
        self
    }

    pub fn register_dynamic_function_for_all_kinds<F>(
        mut self,
        scope: impl Into<String>,
        function: F,
    ) -> Self
    where
        F: DynamicAtomicConstraintFunction + 'static,
    {
        let scope = scope.into();
        let function: Arc<dyn DynamicAtomicConstraintFunction> = Arc::new(function);
        for kind in RuleKind::ALL {
            self.functions
                .register_dynamic_function(scope.clone(), kind, Arc::clone(&function));
        }
        self
    }

    pub fn register_rule_function<F>(
        mut self,
        scope: impl Into<String>,
        kind: RuleKind,
        function: F,
    ) -> Self
    where
        F: RuleFunction + 'static,
    {
        self.functions
            .register_rule_function(scope, kind, Arc::new(function));
        self
    }

    pub fn register_pre_validator<F>(mut self, scope: impl Into<String>, validator: F) -> Self
    where
        F: PolicyValidatorFunction + 'static,
    {
        self.functions
            .register_pre_validator(scope, Arc::new(validator));
        self
    }

    pub fn register_post_validator<F>(mut self, scope: impl Into<String>, validator: F) -> Self
    where
        F: PolicyValidatorFunction + 'static,
    {
        self.functions
            .register_post_validator(scope, Arc::new(validator));
        self
    }

    pub fn build(self) -> Result<PolicyEngine> {
        let bindings = self.bindings.ok_or(EngineError::MissingField {
            builder: "PolicyEngine",
            field: "rule_bindings",
        })?;
        info!(functions = ?self.functions, "Policy engine built");
        Ok(PolicyEngine {
            filter: ScopeFilter::new(Arc::clone(&bindings)),
            bindings,
            functions: Arc::new(self.functions),
        })
    }
}

/// Immutable, thread-safe policy engine.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    bindings: Arc<RuleBindingRegistry>,
    functions: Arc<FunctionRegistry>,
    filter: ScopeFilter,
}

impl PolicyEngine {
    pub fn builder() -> PolicyEngineBuilder {
        PolicyEngineBuilder::new()
    }

    /// Evaluate `policy` in `scope`.
    ///
    /// Pre-validators run first; if any fails, the rule walk and the
    /// post-validators are skipped. Otherwise the scope-filtered rules are
    /// evaluated and the post-validators run regardless of their outcome.
    #[instrument(skip(self, policy, context), fields(policy_id = %policy.id))]
    pub fn evaluate(
        &self,
        policy: &Policy,
        scope: &str,
        context: &mut PolicyContext,
    ) -> PolicyEvaluationResult {
        let evaluator = Evaluator::new(&self.functions, scope);
        let mark = context.problem_count();

        let pre_validators = self.functions.pre_validators(scope);
        let succeeded = if evaluator.run_validators("pre", &pre_validators, policy, context) {
            let filtered = self.filter.apply_scope(policy, scope);
            let rules_passed = evaluator.evaluate_rules(&filtered, context);

            let post_validators = self.functions.post_validators(scope);
            let post_passed =
                evaluator.run_validators("post", &post_validators, &filtered, context);
            rules_passed && post_passed
        } else {
            false
        };

        let problems = context.problems()[mark..].to_vec();
        if succeeded {
            info!(policy_id = %policy.id, scope, "Policy evaluation succeeded");
        } else {
            warn!(
                policy_id = %policy.id,
                scope,
                problems = problems.len(),
                "Policy evaluation failed"
            );
        }

        PolicyEvaluationResult {
            policy_id: policy.id.clone(),
            scope: scope.to_string(),
            succeeded,
            problems,
        }
    }

    /// Explain what evaluating `policy` in `scope` would do
    pub fn plan(&self, policy: &Policy, scope: &str) -> PolicyEvaluationPlan {
        self.planner(scope).plan(policy)
    }

    pub fn planner(&self, scope: &str) -> EvaluationPlanner {
        EvaluationPlanner::from_parts(
            scope,
            Arc::clone(&self.bindings),
            Arc::clone(&self.functions),
        )
    }

    /// Scope-independent check that every rule and constraint of `policy`
    /// can be evaluated somewhere.
    pub fn validate(&self, policy: &Policy) -> Result<()> {
        PolicyValidator::new(&self.bindings, &self.functions).validate(policy)
    }

    pub fn filter(&self) -> &ScopeFilter {
        &self.filter
    }

    pub fn bindings(&self) -> &Arc<RuleBindingRegistry> {
        &self.bindings
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }
}

/// Copy-on-write handle to the current engine.
///
/// Evaluations take a [`snapshot`](Self::snapshot) and never observe a
/// partially updated function set; [`replace`](Self::replace) swaps in a
/// freshly built engine.
#[derive(Debug)]
pub struct SharedPolicyEngine {
    current: RwLock<Arc<PolicyEngine>>,
}

impl SharedPolicyEngine {
    pub fn new(engine: PolicyEngine) -> Self {
        Self {
            current: RwLock::new(Arc::new(engine)),
        }
    }

    pub fn snapshot(&self) -> Arc<PolicyEngine> {
        Arc::clone(&self.current.read())
    }

    /// Install a new engine, returning the previous one
    pub fn replace(&self, engine: PolicyEngine) -> Arc<PolicyEngine> {
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(engine));
        info!("Policy engine replaced");
        previous
    }
}

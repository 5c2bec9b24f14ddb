//! # UCP Policy Engine
//!
//! Scope-bound evaluation and explanation of usage-control policies.
//!
//! ## Overview
//!
//! A policy is evaluated in a named, dot-delimited *scope* such as
//! `catalog.offer`. What may be evaluated in which scope is decided by a
//! [`RuleBindingRegistry`]: a rule whose action is not bound to the scope is
//! dropped, an atomic constraint whose left operand is not bound is elided.
//! The remaining tree is folded by the functions registered on the engine.
//!
//! ## Key Components
//!
//! - [`RuleBindingRegistry`]: key-to-scope bindings with hierarchical matching
//! - [`ScopeFilter`]: produces the scope-filtered copy of a policy
//! - [`PolicyEngine`]: evaluates a policy to a [`PolicyEvaluationResult`]
//! - [`EvaluationPlanner`]: explains an evaluation as a [`PolicyEvaluationPlan`]
//! - [`PolicyContext`]: per-evaluation problems and typed collaborator data
//! - [`EngineConfig`]: bindings and built-in functions from file and environment
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ucp_engine::{
//!     constraint_fn, PolicyContext, PolicyEngine, RuleBindingRegistry, ALL_SCOPES,
//! };
//! use ucp_model::{Action, Constraint, Operator, Permission, Policy, RuleKind};
//!
//! let bindings = RuleBindingRegistry::new();
//! bindings.bind("use", "catalog");
//! bindings.bind("region", "catalog");
//!
//! let engine = PolicyEngine::builder()
//!     .with_rule_bindings(Arc::new(bindings))
//!     .register_function(
//!         ALL_SCOPES,
//!         RuleKind::Permission,
//!         "region",
//!         constraint_fn("region", |_, _, right, _, _| right.as_key() == "eu"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let policy = Policy::new().with_permission(
//!     Permission::new()
//!         .with_action(Action::new("use"))
//!         .with_constraint(Constraint::atomic("region", Operator::Eq, "eu")),
//! );
//!
//! let result = engine.evaluate(&policy, "catalog.offer", &mut PolicyContext::new());
//! assert!(result.succeeded());
//!
//! let plan = engine.plan(&policy, "negotiation");
//! assert!(plan.permission_steps[0].filtered);
//! ```

#![deny(unsafe_code)]

pub mod bindings;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
mod evaluator;
pub mod filter;
pub mod function;
pub mod functions;
pub mod plan;
pub mod planner;
pub mod registry;
pub mod scope;
mod validator;

pub use bindings::RuleBindingRegistry;
pub use config::{
    BindingConfig, ClaimFunctionConfig, EngineConfig, LoggingConfig, RequestScopeConfig,
};
pub use context::PolicyContext;
pub use engine::{PolicyEngine, PolicyEngineBuilder, PolicyEvaluationResult, SharedPolicyEngine};
pub use error::{EngineError, Result, ValidatorError};
pub use filter::{ScopeFilter, ScopeFilterable};
pub use function::{
    constraint_fn, dynamic_fn, rule_fn, validator_fn, AtomicConstraintFunction,
    DynamicAtomicConstraintFunction, PolicyValidatorFunction, RuleFunction,
};
pub use plan::{
    AtomicConstraintStep, ConstraintStep, MultiplicityConstraintStep, PolicyEvaluationPlan,
    RuleFunctionStep, RuleStep, ValidatorStep,
};
pub use planner::{EvaluationPlanner, EvaluationPlannerBuilder};
pub use registry::{FunctionRegistry, ResolvedFunction};
pub use scope::{scope_matches, ALL_SCOPES, SCOPE_DELIMITER};

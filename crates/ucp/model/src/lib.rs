//! # ucp-model
//!
//! In-memory model of usage-control policies.
//!
//! A [`Policy`] is an immutable tree:
//!
//! ```text
//! Policy ─┬─ Permission ─┬─ Action
//!         │              ├─ Constraint*
//!         │              └─ Duty*
//!         ├─ Prohibition ─┬─ Action
//!         │               └─ Constraint*
//!         └─ Duty (obligation) ─┬─ Action
//!                               ├─ Constraint*
//!                               └─ consequence Duty?
//!
//! Constraint = Atomic(left, operator, right) | And[..] | Or[..] | Xone[..]
//! ```
//!
//! The tree is pure data. Walks over it are exhaustive `match`es on
//! [`Constraint`] and [`RuleRef`]; there is no visitor trait to keep in sync
//! when a variant is added.
//!
//! ## Example
//!
//! ```rust
//! use ucp_model::{Action, Constraint, Operator, Permission, Policy};
//!
//! let policy = Policy::new().with_permission(
//!     Permission::new()
//!         .with_action(Action::new("use"))
//!         .with_constraint(Constraint::atomic("region", Operator::Eq, "eu")),
//! );
//!
//! assert_eq!(policy.permissions.len(), 1);
//! assert_eq!(policy.rule_count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod constraint;
pub mod error;
pub mod expression;
pub mod policy;
pub mod rule;

pub use action::Action;
pub use constraint::{AtomicConstraint, AtomicConstraintBuilder, Constraint, MultiplicityKind};
pub use error::{ModelError, Result};
pub use expression::{Expression, Operator};
pub use policy::{Policy, PolicyType};
pub use rule::{Duty, Permission, Prohibition, RuleKind, RuleRef};

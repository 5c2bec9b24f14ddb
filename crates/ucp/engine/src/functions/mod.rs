//! Built-in functions

pub mod claims;
pub mod operators;
pub mod request_scope;

pub use claims::{ClaimConstraintFunction, Claims};
pub use operators::compare;
pub use request_scope::{ActionScopeExtractor, DefaultScopeInjector, RequestScope};

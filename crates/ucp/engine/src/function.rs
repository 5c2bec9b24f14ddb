//! Function traits plugged into the engine
//!
//! Four kinds of functions take part in an evaluation:
//!
//! - [`AtomicConstraintFunction`]: evaluates atomic constraints whose left
//!   operand equals the key it was registered under
//! - [`DynamicAtomicConstraintFunction`]: evaluates any left operand it
//!   claims through [`can_handle`](DynamicAtomicConstraintFunction::can_handle)
//! - [`RuleFunction`]: runs once per rule, in addition to constraint folding
//! - [`PolicyValidatorFunction`]: runs before or after the rule walk
//!
//! Closures can be registered through [`constraint_fn`], [`dynamic_fn`],
//! [`rule_fn`] and [`validator_fn`], which attach the name shown in plans.

use ucp_model::{Expression, Operator, Policy, RuleRef};

use crate::context::PolicyContext;
use crate::error::ValidatorError;

/// Evaluates atomic constraints for one left operand key.
pub trait AtomicConstraintFunction: Send + Sync {
    fn evaluate(
        &self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool;

    /// Static check of an operator and right operand, used by policy validation
    fn validate(
        &self,
        _left: &Expression,
        _operator: Operator,
        _right: &Expression,
        _rule: RuleRef<'_>,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Name reported in evaluation plans
    fn name(&self) -> &str;
}

/// Evaluates atomic constraints for every left operand it can handle.
pub trait DynamicAtomicConstraintFunction: Send + Sync {
    fn can_handle(&self, left_operand: &str) -> bool;

    fn evaluate(
        &self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool;

    fn validate(
        &self,
        _left: &Expression,
        _operator: Operator,
        _right: &Expression,
        _rule: RuleRef<'_>,
    ) -> Result<(), String> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Rule-level function, evaluated for every rule of its kind in scope.
pub trait RuleFunction: Send + Sync {
    fn evaluate(&self, rule: RuleRef<'_>, context: &mut PolicyContext) -> bool;

    fn name(&self) -> &str;
}

/// Validator run against the whole policy before or after the rule walk.
///
/// Returning `Ok(false)` fails the evaluation; `Err` is turned into a
/// reported problem and also fails it. Neither stops the remaining
/// validators of the same phase.
pub trait PolicyValidatorFunction: Send + Sync {
    fn validate(&self, policy: &Policy, context: &mut PolicyContext)
        -> Result<bool, ValidatorError>;

    fn name(&self) -> &str;
}

/// Closure-backed [`AtomicConstraintFunction`].
pub struct FnConstraintFunction<F> {
    name: String,
    function: F,
}

/// Wrap a closure as a named atomic constraint function
pub fn constraint_fn<F>(name: impl Into<String>, function: F) -> FnConstraintFunction<F>
where
    F: Fn(&Expression, Operator, &Expression, RuleRef<'_>, &mut PolicyContext) -> bool
        + Send
        + Sync,
{
    FnConstraintFunction {
        name: name.into(),
        function,
    }
}

impl<F> AtomicConstraintFunction for FnConstraintFunction<F>
where
    F: Fn(&Expression, Operator, &Expression, RuleRef<'_>, &mut PolicyContext) -> bool
        + Send
        + Sync,
{
    fn evaluate(
        &self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool {
        (self.function)(left, operator, right, rule, context)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Closure-backed [`DynamicAtomicConstraintFunction`].
pub struct FnDynamicFunction<H, F> {
    name: String,
    can_handle: H,
    function: F,
}

/// Wrap a key predicate and a closure as a named dynamic function
pub fn dynamic_fn<H, F>(
    name: impl Into<String>,
    can_handle: H,
    function: F,
) -> FnDynamicFunction<H, F>
where
    H: Fn(&str) -> bool + Send + Sync,
    F: Fn(&Expression, Operator, &Expression, RuleRef<'_>, &mut PolicyContext) -> bool
        + Send
        + Sync,
{
    FnDynamicFunction {
        name: name.into(),
        can_handle,
        function,
    }
}

impl<H, F> DynamicAtomicConstraintFunction for FnDynamicFunction<H, F>
where
    H: Fn(&str) -> bool + Send + Sync,
    F: Fn(&Expression, Operator, &Expression, RuleRef<'_>, &mut PolicyContext) -> bool
        + Send
        + Sync,
{
    fn can_handle(&self, left_operand: &str) -> bool {
        (self.can_handle)(left_operand)
    }

    fn evaluate(
        &self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
        rule: RuleRef<'_>,
        context: &mut PolicyContext,
    ) -> bool {
        (self.function)(left, operator, right, rule, context)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Closure-backed [`RuleFunction`].
pub struct FnRuleFunction<F> {
    name: String,
    function: F,
}

/// Wrap a closure as a named rule function
pub fn rule_fn<F>(name: impl Into<String>, function: F) -> FnRuleFunction<F>
where
    F: Fn(RuleRef<'_>, &mut PolicyContext) -> bool + Send + Sync,
{
    FnRuleFunction {
        name: name.into(),
        function,
    }
}

impl<F> RuleFunction for FnRuleFunction<F>
where
    F: Fn(RuleRef<'_>, &mut PolicyContext) -> bool + Send + Sync,
{
    fn evaluate(&self, rule: RuleRef<'_>, context: &mut PolicyContext) -> bool {
        (self.function)(rule, context)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Closure-backed [`PolicyValidatorFunction`].
pub struct FnValidator<F> {
    name: String,
    function: F,
}

/// Wrap a closure as a named validator
pub fn validator_fn<F>(name: impl Into<String>, function: F) -> FnValidator<F>
where
    F: Fn(&Policy, &mut PolicyContext) -> Result<bool, ValidatorError> + Send + Sync,
{
    FnValidator {
        name: name.into(),
        function,
    }
}

impl<F> PolicyValidatorFunction for FnValidator<F>
where
    F: Fn(&Policy, &mut PolicyContext) -> Result<bool, ValidatorError> + Send + Sync,
{
    fn validate(
        &self,
        policy: &Policy,
        context: &mut PolicyContext,
    ) -> Result<bool, ValidatorError> {
        (self.function)(policy, context)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucp_model::Permission;

    #[test]
    fn closure_adapters_keep_their_names() {
        let constraint = constraint_fn("region-check", |_, _, _, _, _| true);
        let dynamic = dynamic_fn("claims", |key| key.starts_with("claim"), |_, _, _, _, _| true);
        let rule = rule_fn("audit", |_, _| true);
        let validator = validator_fn("shape", |_, _| Ok(true));

        assert_eq!(AtomicConstraintFunction::name(&constraint), "region-check");
        assert_eq!(DynamicAtomicConstraintFunction::name(&dynamic), "claims");
        assert_eq!(RuleFunction::name(&rule), "audit");
        assert_eq!(PolicyValidatorFunction::name(&validator), "shape");
    }

    #[test]
    fn closure_adapters_forward_arguments() {
        let function = constraint_fn("eq", |left, operator, right, rule, ctx| {
            ctx.report_problem(format!("{} {} {} in {}", left, operator, right, rule));
            operator == Operator::Eq
        });
        let permission = Permission::new();
        let mut ctx = PolicyContext::new();

        let result = function.evaluate(
            &"region".into(),
            Operator::Eq,
            &"eu".into(),
            RuleRef::from(&permission),
            &mut ctx,
        );

        assert!(result);
        assert_eq!(ctx.problems(), ["'region' EQ 'eu' in permission without action"]);
    }

    #[test]
    fn dynamic_adapter_delegates_can_handle() {
        let dynamic = dynamic_fn("claims", |key| key.starts_with("claim:"), |_, _, _, _, _| false);
        assert!(dynamic.can_handle("claim:region"));
        assert!(!dynamic.can_handle("region"));
    }

    #[test]
    fn default_validate_accepts_everything() {
        let function = constraint_fn("any", |_, _, _, _, _| true);
        let permission = Permission::new();
        assert!(function
            .validate(&"a".into(), Operator::In, &"b".into(), RuleRef::from(&permission))
            .is_ok());
    }
}

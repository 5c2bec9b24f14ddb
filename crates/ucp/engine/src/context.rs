//! Per-evaluation context
//!
//! A context is created fresh for each evaluation and owned by the calling
//! thread. It collects the problems reported while walking the policy and
//! carries typed, collaborator-defined data (claims, request scope
//! accumulators, ...) that functions read and write.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Context handed to every validator and function during one evaluation.
#[derive(Default)]
pub struct PolicyContext {
    problems: Vec<String>,
    data: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PolicyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach typed data, replacing any previous value of the same type
    pub fn with_data<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.put_data(value);
        self
    }

    /// Record a problem
    pub fn report_problem(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }

    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    pub(crate) fn problem_count(&self) -> usize {
        self.problems.len()
    }

    /// Drop problems reported after `count` problems were recorded
    pub(crate) fn discard_problems_since(&mut self, count: usize) {
        self.problems.truncate(count);
    }

    /// Store typed data, returning the previous value of that type
    pub fn put_data<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.data
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn data_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.data
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Typed data, inserting the default value first if absent
    pub fn data_or_default<T: Any + Send + Sync + Default>(&mut self) -> &mut T {
        let value = self
            .data
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()) as Box<dyn Any + Send + Sync>);
        match value.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("context data is keyed by its own TypeId"),
        }
    }

    pub fn remove_data<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.data
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }
}

impl fmt::Debug for PolicyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyContext")
            .field("problems", &self.problems)
            .field("data_entries", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Counter(u32);

    #[test]
    fn problems_accumulate_in_order() {
        let mut ctx = PolicyContext::new();
        assert!(!ctx.has_problems());

        ctx.report_problem("first");
        ctx.report_problem(String::from("second"));

        assert!(ctx.has_problems());
        assert_eq!(ctx.problems(), ["first", "second"]);
    }

    #[test]
    fn problems_can_be_rolled_back_to_a_mark() {
        let mut ctx = PolicyContext::new();
        ctx.report_problem("kept");
        let mark = ctx.problem_count();
        ctx.report_problem("discarded");

        ctx.discard_problems_since(mark);
        assert_eq!(ctx.problems(), ["kept"]);
    }

    #[test]
    fn typed_data_is_keyed_by_type() {
        let mut ctx = PolicyContext::new().with_data(Counter(1));
        assert_eq!(ctx.data::<Counter>(), Some(&Counter(1)));
        assert!(ctx.data::<String>().is_none());

        let previous = ctx.put_data(Counter(2));
        assert_eq!(previous, Some(Counter(1)));

        ctx.data_mut::<Counter>().unwrap().0 += 1;
        assert_eq!(ctx.remove_data::<Counter>(), Some(Counter(3)));
        assert!(ctx.data::<Counter>().is_none());
    }

    #[test]
    fn data_or_default_inserts_once() {
        let mut ctx = PolicyContext::new();
        ctx.data_or_default::<Counter>().0 += 1;
        ctx.data_or_default::<Counter>().0 += 1;
        assert_eq!(ctx.data::<Counter>(), Some(&Counter(2)));
    }
}

//! Rule binding registry
//!
//! Maps a key (an action type or an atomic constraint's left operand) to
//! the scopes in which it may be evaluated. The registry does not know
//! which of the two a key is; callers keep their keys consistent.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::scope::scope_matches;

type Binder = Box<dyn Fn(&str) -> BTreeSet<String> + Send + Sync>;

/// Registry of key-to-scope bindings.
///
/// Written during startup, then read concurrently by every evaluation.
/// Reads take no global lock.
#[derive(Default)]
pub struct RuleBindingRegistry {
    bindings: DashMap<String, BTreeSet<String>>,

    /// Computed bindings, consulted in addition to static ones
    dynamic_binders: RwLock<Vec<Binder>>,
}

impl RuleBindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `scope`. Idempotent.
    pub fn bind(&self, key: impl Into<String>, scope: impl Into<String>) {
        let key = key.into();
        let scope = scope.into();
        debug!(key = %key, scope = %scope, "Rule binding registered");
        self.bindings.entry(key).or_default().insert(scope);
    }

    /// Remove a single binding. Returns whether it existed.
    pub fn unbind(&self, key: &str, scope: &str) -> bool {
        let Some(mut scopes) = self.bindings.get_mut(key) else {
            return false;
        };
        let removed = scopes.remove(scope);
        let now_empty = scopes.is_empty();
        drop(scopes);
        if now_empty {
            self.bindings.remove_if(key, |_, scopes| scopes.is_empty());
        }
        removed
    }

    /// Register a binder that computes scopes for a key on demand
    pub fn dynamic_bind<F>(&self, binder: F)
    where
        F: Fn(&str) -> BTreeSet<String> + Send + Sync + 'static,
    {
        self.dynamic_binders.write().push(Box::new(binder));
    }

    /// Scopes `key` is bound to, static and dynamic
    pub fn bindings(&self, key: &str) -> BTreeSet<String> {
        let mut scopes = self
            .bindings
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        for binder in self.dynamic_binders.read().iter() {
            scopes.extend(binder(key));
        }
        scopes
    }

    /// Whether `key` may be evaluated in `scope`
    pub fn is_in_scope(&self, key: &str, scope: &str) -> bool {
        if let Some(scopes) = self.bindings.get(key) {
            if scopes.iter().any(|bound| scope_matches(bound, scope)) {
                return true;
            }
        }
        self.dynamic_binders
            .read()
            .iter()
            .any(|binder| binder(key).iter().any(|bound| scope_matches(bound, scope)))
    }

    /// Whether `key` is bound to at least one scope
    pub fn is_bound(&self, key: &str) -> bool {
        !self.bindings(key).is_empty()
    }

    /// Statically bound keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.bindings.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for RuleBindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBindingRegistry")
            .field("keys", &self.keys())
            .field("dynamic_binders", &self.dynamic_binders.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ALL_SCOPES;

    #[test]
    fn bound_scope_and_descendants_are_in_scope() {
        let registry = RuleBindingRegistry::new();
        registry.bind("use", "catalog");

        assert!(registry.is_in_scope("use", "catalog"));
        assert!(registry.is_in_scope("use", "catalog.offer"));
        assert!(!registry.is_in_scope("use", "negotiation"));
    }

    #[test]
    fn child_binding_is_not_visible_from_parent() {
        let registry = RuleBindingRegistry::new();
        registry.bind("use", "catalog.offer");

        assert!(registry.is_in_scope("use", "catalog.offer"));
        assert!(!registry.is_in_scope("use", "catalog"));
    }

    #[test]
    fn wildcard_binding_is_visible_everywhere() {
        let registry = RuleBindingRegistry::new();
        registry.bind("use", ALL_SCOPES);

        assert!(registry.is_in_scope("use", "catalog"));
        assert!(registry.is_in_scope("use", "transfer.process"));
    }

    #[test]
    fn unknown_key_is_not_in_scope() {
        let registry = RuleBindingRegistry::new();
        assert!(!registry.is_in_scope("unknown", "catalog"));
        assert!(!registry.is_bound("unknown"));
    }

    #[test]
    fn bind_is_idempotent_and_accumulates_scopes() {
        let registry = RuleBindingRegistry::new();
        registry.bind("use", "catalog");
        registry.bind("use", "catalog");
        registry.bind("use", "negotiation");

        let scopes: Vec<_> = registry.bindings("use").into_iter().collect();
        assert_eq!(scopes, vec!["catalog", "negotiation"]);
    }

    #[test]
    fn unbind_removes_single_scope() {
        let registry = RuleBindingRegistry::new();
        registry.bind("use", "catalog");
        registry.bind("use", "negotiation");

        assert!(registry.unbind("use", "catalog"));
        assert!(!registry.unbind("use", "catalog"));
        assert!(!registry.is_in_scope("use", "catalog"));
        assert!(registry.is_in_scope("use", "negotiation"));

        assert!(registry.unbind("use", "negotiation"));
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn dynamic_binder_contributes_scopes() {
        let registry = RuleBindingRegistry::new();
        registry.dynamic_bind(|key| {
            if key.starts_with("claim:") {
                BTreeSet::from(["negotiation".to_string()])
            } else {
                BTreeSet::new()
            }
        });

        assert!(registry.is_in_scope("claim:region", "negotiation.request"));
        assert!(!registry.is_in_scope("region", "negotiation"));
        assert!(registry.is_bound("claim:region"));
        assert!(registry.keys().is_empty());
    }
}

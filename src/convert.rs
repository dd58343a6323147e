//! Pluggable converters, consulted after the built-in coercion rules fail.
use std::cell::RefCell;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::coerce::Kind;

/// Last-resort conversion of a node into a node of the requested kind.
///
/// `node` is `null` when the key was absent, so a converter can also supply
/// values for missing keys.
pub trait Converter: Send + Sync {
    fn convert(&self, node: &Value, target: Kind) -> Option<Value>;
}

impl<F> Converter for F
where
    F: Fn(&Value, Kind) -> Option<Value> + Send + Sync,
{
    fn convert(&self, node: &Value, target: Kind) -> Option<Value> {
        self(node, target)
    }
}

// ----------------------------- Registry ----------------------------------- //

/// Append-only list of converters, tried in registration order.
///
/// Clones are handles onto the same list.
#[derive(Clone, Default)]
pub struct Registry {
    converters: Arc<RwLock<Vec<Arc<dyn Converter>>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn register(&self, converter: impl Converter + 'static) {
        self.converters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(converter));
    }

    pub fn len(&self) -> usize { self.snapshot().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Every non-null candidate, in registration order. The lock is released
    /// before any converter runs.
    pub fn candidates<'a>(&'a self, node: &'a Value, target: Kind) -> impl Iterator<Item = Value> + 'a {
        self.snapshot()
            .into_iter()
            .filter_map(move |c| c.convert(node, target))
            .filter(|v| !v.is_null())
    }

    fn snapshot(&self) -> Vec<Arc<dyn Converter>> {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("converters", &self.len()).finish()
    }
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry used by every entry point without an `_in` suffix.
pub fn global() -> &'static Registry { &GLOBAL }

/// Append `converter` to the process-wide registry.
pub fn register(converter: impl Converter + 'static) {
    GLOBAL.register(converter);
}

// --------------------------- Active registry ------------------------------ //

thread_local! {
    static ACTIVE: RefCell<Vec<Registry>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a registry active on this thread until dropped.
pub(crate) struct ActiveGuard(());

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Make `registry` the one records nested inside serde containers decode with.
pub(crate) fn activate(registry: &Registry) -> ActiveGuard {
    ACTIVE.with(|stack| stack.borrow_mut().push(registry.clone()));
    ActiveGuard(())
}

/// Registry of the innermost decode running on this thread, else the global one.
pub fn active() -> Registry {
    ACTIVE
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(|| GLOBAL.clone())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closures_are_converters() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        registry.register(|node: &Value, target: Kind| match (node, target) {
            (Value::Bool(b), Kind::Float(_)) => Some(json!(if *b { 1.0 } else { 0.0 })),
            _ => None,
        });
        assert_eq!(registry.len(), 1);
        let out: Vec<Value> = registry.candidates(&json!(true), Kind::Float(64)).collect();
        assert_eq!(out, [json!(1.0)]);
        assert_eq!(registry.candidates(&json!(true), Kind::String).count(), 0);
    }

    #[test]
    fn active_registry_is_scoped_to_the_guard() {
        let outer = Registry::new();
        outer.register(|_: &Value, _: Kind| Some(json!("outer")));
        let inner = Registry::new();
        {
            let _outer = activate(&outer);
            assert_eq!(active().len(), 1);
            {
                let _inner = activate(&inner);
                assert!(active().is_empty());
            }
            let out: Vec<Value> = active().candidates(&Value::Null, Kind::String).collect();
            assert_eq!(out, [json!("outer")]);
        }
        assert!(ACTIVE.with(|stack| stack.borrow().is_empty()));
    }

    #[test]
    fn clones_share_one_list() {
        let registry = Registry::new();
        let handle = registry.clone();
        handle.register(|_: &Value, _: Kind| None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn candidates_keep_registration_order_and_skip_null() {
        let registry = Registry::new();
        registry.register(|_: &Value, _: Kind| Some(Value::Null));
        registry.register(|_: &Value, _: Kind| Some(json!("first")));
        registry.register(|_: &Value, _: Kind| Some(json!("second")));
        let out: Vec<Value> = registry.candidates(&Value::Null, Kind::String).collect();
        assert_eq!(out, [json!("first"), json!("second")]);
    }
}

//! Exposed properties grafted onto the store by plugins.
//!
//! Functions are bound to a [`StoreCell`] shared by every facade of one
//! construction. The cell is read when the function is called, so a store
//! replaced by a later `on_store_created` hook is what the function sees,
//! even when it is called through a facade built before the replacement.

use crate::plugin::{Exposed, ExposedFn, Plugin};
use crate::store::{Facade, Store};
use crate::sync::{read, write};
use modelstore_core::StoreError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, Weak};

/// Shared reference to the current store of one construction
///
/// Holds the facade weakly; the store owns its properties, which own the cell.
#[derive(Clone, Default)]
pub struct StoreCell {
    current: Arc<RwLock<Weak<Facade>>>,
}

impl StoreCell {
    /// Create an empty cell
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `store` the current store
    pub fn set(&self, store: &Store) {
        *write(&self.current) = store.downgrade();
    }

    /// Current store, if it is still alive
    #[must_use]
    pub fn get(&self) -> Option<Store> {
        read(&self.current).upgrade().map(Store::from_facade)
    }
}

impl std::fmt::Debug for StoreCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCell")
            .field("name", &self.get().map(|store| store.name().to_string()))
            .finish()
    }
}

/// An exposed function with the current store bound as first argument
#[derive(Clone)]
pub struct BoundFunction {
    key: String,
    original: ExposedFn,
    current: StoreCell,
}

impl BoundFunction {
    /// Bind `original` to the store held by `current`
    #[must_use]
    pub fn new(key: impl Into<String>, original: ExposedFn, current: StoreCell) -> Self {
        Self {
            key: key.into(),
            original,
            current,
        }
    }

    /// Call the function with the current store followed by `args`
    ///
    /// Falls back to `caller` if the current store has been dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Exposed`] wrapping the function's error.
    pub fn call(&self, caller: &Store, args: Vec<Value>) -> Result<Value, StoreError> {
        let store = self.current.get().unwrap_or_else(|| caller.clone());
        (self.original)(&store, args).map_err(|source| StoreError::Exposed {
            key: self.key.clone(),
            source,
        })
    }
}

impl std::fmt::Debug for BoundFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundFunction")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// A property installed on a store
#[derive(Debug, Clone)]
pub enum ExposedProperty {
    /// Bound function, see [`BoundFunction`]
    Function(BoundFunction),

    /// Value shared with the plugin until the store updates it
    Value(Arc<Value>),
}

impl ExposedProperty {
    /// Install an exposed entry
    #[must_use]
    pub fn install(key: &str, exposed: &Exposed, current: &StoreCell) -> Self {
        match exposed {
            Exposed::Function(original) => {
                Self::Function(BoundFunction::new(key, Arc::clone(original), current.clone()))
            },
            Exposed::Value(value) => Self::Value(Arc::clone(value)),
        }
    }

    /// Check if the property is a function
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

/// Install every plugin's exposed properties, in plugin order
///
/// A key exposed by several plugins ends up with the last plugin's entry.
#[must_use]
pub fn merge_exposed(plugins: &[Arc<Plugin>], current: &StoreCell) -> BTreeMap<String, ExposedProperty> {
    let mut properties = BTreeMap::new();
    for plugin in plugins {
        for (key, exposed) in plugin.exposed() {
            let property = ExposedProperty::install(key, exposed, current);
            if properties.insert(key.clone(), property).is_some() {
                tracing::warn!(
                    key = %key,
                    plugin = plugin.name(),
                    "Exposed property overwritten by a later plugin"
                );
            }
        }
    }
    properties
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    #[test]
    fn last_plugin_wins() {
        let plugins = vec![
            Arc::new(Plugin::new("first").expose_value("limit", json!(1))),
            Arc::new(
                Plugin::new("second")
                    .expose_value("limit", json!(2))
                    .expose_fn("noop", |_store, _args| Ok(Value::Null)),
            ),
        ];
        let properties = merge_exposed(&plugins, &StoreCell::new());

        assert_eq!(properties.len(), 2);
        assert!(properties["noop"].is_function());
        assert!(matches!(&properties["limit"], ExposedProperty::Value(v) if **v == json!(2)));
    }

    #[test]
    fn values_share_the_plugin_allocation() {
        let plugin = Arc::new(Plugin::new("values").expose_value("config", json!({ "a": 1 })));
        let properties = merge_exposed(std::slice::from_ref(&plugin), &StoreCell::new());

        let Some(Exposed::Value(original)) = plugin.exposed().get("config") else {
            panic!("value expected");
        };
        let ExposedProperty::Value(installed) = &properties["config"] else {
            panic!("value expected");
        };
        assert!(Arc::ptr_eq(original, installed));
    }

    #[test]
    fn empty_cell_has_no_store() {
        assert!(StoreCell::new().get().is_none());
    }
}

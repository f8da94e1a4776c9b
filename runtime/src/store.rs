//! The store facade returned by [`crate::init`].
//!
//! A [`Store`] wraps the base store and adds a name, the two-level dispatch
//! table, runtime model registration and the properties exposed by plugins.
//!
//! # Example
//!
//! ```
//! use modelstore_runtime::{init, InitConfig};
//! use modelstore_core::Model;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), modelstore_core::StoreError> {
//! let count = Model::new("count", json!(0))
//!     .reducer("increment", |state, payload| {
//!         Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(1)))
//!     });
//! let store = init(InitConfig::new().with_model(count))?;
//!
//! store.dispatch_to("count", "increment", Some(json!(5)))?;
//! assert_eq!(store.get_state()["count"], json!(5));
//! # Ok(())
//! # }
//! ```

use crate::bag::{Bag, EffectRegistry};
use crate::base::{BaseStore, Subscription};
use crate::dispatcher::{create_dispatcher, DispatchTable, ModelDispatcher};
use crate::exposed::{ExposedProperty, StoreCell};
use crate::lifecycle;
use crate::metrics::ModelMetrics;
use crate::plugin::Exposed;
use crate::reducers::{ActionReducer, SliceReducer};
use crate::sync::{lock, read, write};
use modelstore_core::action::REPLACE_ACTION_TYPE;
use modelstore_core::validate::validate_new_model;
use modelstore_core::{Action, Dispatched, Model, StoreApi, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock, Weak};

pub(crate) struct Facade {
    name: String,
    base: BaseStore,
    bag: Arc<Mutex<Bag>>,
    effects: EffectRegistry,
    dispatch: Arc<RwLock<DispatchTable>>,
    properties: RwLock<BTreeMap<String, ExposedProperty>>,
    current: StoreCell,
}

/// Handle to a store
///
/// Cheap to clone; clones are the same store. Stores derived with
/// [`Store::derive`] share state, models and dispatch table but have their
/// own name and exposed properties.
///
/// Dispatches from several threads commit one after another, like the
/// base store's. An `add_model` racing a dispatch may not see that dispatch
/// reach the new model's reducer.
#[derive(Clone)]
pub struct Store {
    facade: Arc<Facade>,
}

impl Store {
    pub(crate) fn assemble(
        name: String,
        base: BaseStore,
        bag: Bag,
        properties: BTreeMap<String, ExposedProperty>,
        current: StoreCell,
    ) -> Self {
        let effects = bag.effects().clone();
        tracing::debug!(store = %name, properties = properties.len(), "Store assembled");
        Self {
            facade: Arc::new(Facade {
                name,
                base,
                bag: Arc::new(Mutex::new(bag)),
                effects,
                dispatch: Arc::new(RwLock::new(DispatchTable::new())),
                properties: RwLock::new(properties),
                current,
            }),
        }
    }

    pub(crate) const fn from_facade(facade: Arc<Facade>) -> Self {
        Self { facade }
    }

    pub(crate) fn downgrade(&self) -> Weak<Facade> {
        Arc::downgrade(&self.facade)
    }

    /// Store name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.facade.name
    }

    /// Dispatch a raw action through the whole middleware chain
    ///
    /// # Errors
    ///
    /// Returns the failure of a middleware, a reducer or the action's effect.
    pub fn dispatch(&self, action: Action) -> Result<Dispatched, StoreError> {
        self.facade.base.dispatch(action)
    }

    /// Dispatch table of one model
    #[must_use]
    pub fn dispatcher(&self, model: &str) -> Option<ModelDispatcher> {
        read(&self.facade.dispatch).get(model).cloned()
    }

    /// Dispatch `action` of `model`, as `dispatch[model][action](payload)`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownModel`] or [`StoreError::UnknownAction`]
    /// if the table has no such entry, otherwise any failure raised while the
    /// action is handled.
    pub fn dispatch_to(
        &self,
        model: &str,
        action: &str,
        payload: Option<Value>,
    ) -> Result<Dispatched, StoreError> {
        self.dispatcher(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?
            .dispatch(action, payload)
    }

    /// Check if the dispatch table has an entry for `model`
    #[must_use]
    pub fn has_model(&self, model: &str) -> bool {
        read(&self.facade.dispatch).contains_key(model)
    }

    /// Registered model names, in registration order
    #[must_use]
    pub fn model_names(&self) -> Vec<String> {
        lock(&self.facade.bag)
            .model_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Snapshot of the root state
    #[must_use]
    pub fn get_state(&self) -> Value {
        self.facade.base.get_state()
    }

    /// Read the root state without cloning it
    pub fn select<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Value) -> T,
    {
        self.facade.base.select(f)
    }

    /// Register a listener called after every committed state transition
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.facade.base.subscribe(listener)
    }

    /// Swap the root reducer of the base store
    ///
    /// The next `add_model` rebuilds the root reducer from the registered
    /// models and replaces this one.
    pub fn replace_reducer(&self, reducer: ActionReducer) {
        self.facade.base.replace_reducer(reducer);
    }

    /// Snapshot of the bag
    #[must_use]
    pub fn bag(&self) -> Bag {
        lock(&self.facade.bag).clone()
    }

    /// Register a model at runtime
    ///
    /// Validates the model, builds its reducer, installs its dispatcher,
    /// notifies model observers, installs the new root reducer and finally
    /// dispatches `@@modelstore/REPLACE` so subscribers see the new slice.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the model is malformed or its
    /// name is taken, and [`StoreError::PluginHook`] if a reducer enhancer or
    /// model observer fails. In every one of these cases nothing stays
    /// installed. A failure of the final replace dispatch is returned after
    /// the model is installed.
    #[tracing::instrument(skip_all, fields(store = %self.facade.name, model = %model.name()))]
    pub fn add_model(&self, model: Model) -> Result<(), StoreError> {
        let snapshot = self.bag();
        validate_new_model(&model, snapshot.model_names())?;

        let reducer = lifecycle::build_model_reducer(&model, &snapshot)?;
        {
            let mut bag = lock(&self.facade.bag);
            bag.add_model(model.clone())?;
            bag.register_reducer(SliceReducer {
                model: model.name().to_string(),
                initial: model.initial_state().clone(),
                reducer,
            });
        }

        if let Err(err) = self.prepare_model(&model) {
            lock(&self.facade.bag).remove_model(model.name());
            return Err(err);
        }

        let root = lock(&self.facade.bag).root_reducer();
        self.facade.base.replace_reducer(root);
        ModelMetrics::record_added();
        tracing::debug!("Model added");

        self.facade.base.dispatch(Action::bare(REPLACE_ACTION_TYPE))?;
        Ok(())
    }

    /// Install a model's dispatcher and run the model observers
    ///
    /// Rolls back the dispatcher and the effect registrations if an observer
    /// fails.
    pub(crate) fn prepare_model(&self, model: &Model) -> Result<(), StoreError> {
        let dispatcher = create_dispatcher(&self.facade.base, &self.facade.effects, model);
        let previous = write(&self.facade.dispatch).insert(model.name().to_string(), dispatcher);
        if previous.is_some() {
            tracing::warn!(model = model.name(), "Dispatch table entry overwritten");
        }

        let plugins = lock(&self.facade.bag).plugins().to_vec();
        if let Err(err) = lifecycle::notify_model(&plugins, model, self) {
            self.facade.effects.remove_model(model.name());

            let mut table = write(&self.facade.dispatch);
            match previous {
                Some(previous) => {
                    table.insert(model.name().to_string(), previous);
                },
                None => {
                    table.remove(model.name());
                },
            }
            return Err(err);
        }
        Ok(())
    }

    fn property(&self, key: &str) -> Option<ExposedProperty> {
        read(&self.facade.properties).get(key).cloned()
    }

    /// Call an exposed function with the current store bound first
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownProperty`], [`StoreError::NotCallable`]
    /// for an exposed value, or [`StoreError::Exposed`] if the function fails.
    pub fn call(&self, key: &str, args: Vec<Value>) -> Result<Value, StoreError> {
        match self.property(key) {
            Some(ExposedProperty::Function(function)) => function.call(self, args),
            Some(ExposedProperty::Value(_)) => Err(StoreError::NotCallable(key.to_string())),
            None => Err(StoreError::UnknownProperty(key.to_string())),
        }
    }

    /// Read an exposed value
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownProperty`], or [`StoreError::NotAValue`]
    /// for an exposed function.
    pub fn exposed_value(&self, key: &str) -> Result<Value, StoreError> {
        match self.property(key) {
            Some(ExposedProperty::Value(value)) => Ok(Value::clone(&value)),
            Some(ExposedProperty::Function(_)) => Err(StoreError::NotAValue(key.to_string())),
            None => Err(StoreError::UnknownProperty(key.to_string())),
        }
    }

    /// Update an exposed value on this store only
    ///
    /// The plugin's value and other facades are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownProperty`], or [`StoreError::NotAValue`]
    /// for an exposed function.
    pub fn update_exposed_value<F>(&self, key: &str, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Value),
    {
        let mut value = match self.property(key) {
            Some(ExposedProperty::Value(value)) => value,
            Some(ExposedProperty::Function(_)) => return Err(StoreError::NotAValue(key.to_string())),
            None => return Err(StoreError::UnknownProperty(key.to_string())),
        };
        update(Arc::make_mut(&mut value));
        write(&self.facade.properties).insert(key.to_string(), ExposedProperty::Value(value));
        Ok(())
    }

    /// Check if a property is exposed under `key`
    #[must_use]
    pub fn has_property(&self, key: &str) -> bool {
        read(&self.facade.properties).contains_key(key)
    }

    /// Exposed property keys, sorted
    #[must_use]
    pub fn property_keys(&self) -> Vec<String> {
        read(&self.facade.properties).keys().cloned().collect()
    }

    /// Install a property on this store, replacing any property with the key
    pub fn expose(&self, key: impl Into<String>, exposed: Exposed) {
        let key = key.into();
        let property = ExposedProperty::install(&key, &exposed, &self.facade.current);
        if write(&self.facade.properties)
            .insert(key.clone(), property)
            .is_some()
        {
            tracing::warn!(store = %self.facade.name, key = %key, "Exposed property overwritten");
        }
    }

    /// Build a new facade over the same store
    ///
    /// The result shares state, bag, dispatch table and current-store cell
    /// and starts with a copy of this store's exposed properties. Return it
    /// from `on_store_created` to replace the store.
    #[must_use]
    pub fn derive(&self, name: impl Into<String>) -> Self {
        let facade = &self.facade;
        Self {
            facade: Arc::new(Facade {
                name: name.into(),
                base: facade.base.clone(),
                bag: Arc::clone(&facade.bag),
                effects: facade.effects.clone(),
                dispatch: Arc::clone(&facade.dispatch),
                properties: RwLock::new(read(&facade.properties).clone()),
                current: facade.current.clone(),
            }),
        }
    }

    /// Check if both handles are the same facade
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.facade, &other.facade)
    }
}

impl StoreApi for Store {
    fn get_state(&self) -> Value {
        Self::get_state(self)
    }

    fn dispatch(&self, action: Action) -> Result<Dispatched, StoreError> {
        Self::dispatch(self, action)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.facade.name)
            .field("models", &read(&self.facade.dispatch).keys().collect::<Vec<_>>())
            .field("properties", &self.property_keys())
            .finish_non_exhaustive()
    }
}

//! Construction-time context shared by every component of a store.
//!
//! The bag records registered models and plugins in order, the effect
//! registry consulted by the effects middleware, the passthrough options for
//! the base store and the per-model reducers the root reducer is combined
//! from.

use crate::plugin::Plugin;
use crate::reducers::{root_reducer, ActionReducer, SliceReducer};
use crate::sync::{read, write};
use modelstore_core::action::TYPE_SEPARATOR;
use modelstore_core::validate::validate_new_model;
use modelstore_core::{EffectFn, Middleware, Model, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Effect handlers keyed by fully-qualified action type
///
/// Clones share the same map. Handlers are registered when a model's
/// dispatcher is synthesized.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    effects: Arc<RwLock<BTreeMap<String, EffectFn>>>,
}

impl EffectRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the type
    pub fn register(&self, action_type: impl Into<String>, effect: EffectFn) {
        write(&self.effects).insert(action_type.into(), effect);
    }

    /// Handler for an action type
    #[must_use]
    pub fn get(&self, action_type: &str) -> Option<EffectFn> {
        read(&self.effects).get(action_type).cloned()
    }

    /// Check if an action type has a handler
    #[must_use]
    pub fn contains(&self, action_type: &str) -> bool {
        read(&self.effects).contains_key(action_type)
    }

    /// Remove every handler registered under `<model>/`
    pub fn remove_model(&self, model: &str) {
        let prefix = format!("{model}{TYPE_SEPARATOR}");
        write(&self.effects).retain(|action_type, _| !action_type.starts_with(&prefix));
    }

    /// Registered action types, sorted
    #[must_use]
    pub fn action_types(&self) -> Vec<String> {
        read(&self.effects).keys().cloned().collect()
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.effects).len()
    }

    /// Check if no handler is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.effects).is_empty()
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("action_types", &self.action_types())
            .finish()
    }
}

/// Passthrough options for the base store
///
/// # Example
///
/// ```
/// use modelstore_runtime::ReduxConfig;
/// use serde_json::json;
///
/// let redux = ReduxConfig::new().with_initial_state(json!({ "count": 10 }));
/// assert!(redux.middlewares.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct ReduxConfig {
    /// State preloaded into the base store; missing slices take their
    /// model's initial state
    pub initial_state: Option<Value>,

    /// Middleware appended after the effects and plugin middleware
    pub middlewares: Vec<Arc<dyn Middleware>>,

    /// Reducers over the whole root state, keyed by action type
    pub root_reducers: BTreeMap<String, ActionReducer>,
}

impl ReduxConfig {
    /// Create an empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preloaded root state
    #[must_use]
    pub fn with_initial_state(mut self, state: Value) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Append a passthrough middleware
    #[must_use]
    pub fn with_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Add a reducer run on the whole root state for one action type
    #[must_use]
    pub fn with_root_reducer<F>(mut self, action_type: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(Value, &modelstore_core::Action) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.root_reducers
            .insert(action_type.into(), Arc::new(reducer));
        self
    }
}

impl std::fmt::Debug for ReduxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReduxConfig")
            .field("initial_state", &self.initial_state)
            .field("middlewares", &self.middlewares.len())
            .field("root_reducers", &self.root_reducers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Shared construction context
///
/// Hooks receive a snapshot; the effect registry inside it is shared with
/// the live store.
#[derive(Clone)]
pub struct Bag {
    models: Vec<Model>,
    plugins: Vec<Arc<Plugin>>,
    effects: EffectRegistry,
    redux: ReduxConfig,
    middlewares: Vec<Arc<dyn Middleware>>,
    reducers: Vec<SliceReducer>,
}

impl Bag {
    /// Validate the configured models and record models and plugins in order
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for the first malformed model or
    /// repeated model name. Nothing is built in that case.
    pub fn new(
        models: Vec<Model>,
        plugins: Vec<Arc<Plugin>>,
        redux: ReduxConfig,
    ) -> Result<Self, StoreError> {
        for (index, model) in models.iter().enumerate() {
            validate_new_model(model, models[..index].iter().map(Model::name))?;
        }

        Ok(Self {
            models,
            plugins,
            effects: EffectRegistry::new(),
            redux,
            middlewares: Vec::new(),
            reducers: Vec::new(),
        })
    }

    /// Registered models, in registration order
    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Names of registered models, in registration order
    #[must_use]
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(Model::name).collect()
    }

    /// Plugins, in registration order
    #[must_use]
    pub fn plugins(&self) -> &[Arc<Plugin>] {
        &self.plugins
    }

    /// Shared effect registry
    #[must_use]
    pub const fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    /// Passthrough options for the base store
    #[must_use]
    pub const fn redux(&self) -> &ReduxConfig {
        &self.redux
    }

    /// Middleware collected so far: effects first, then plugin middleware
    #[must_use]
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Append to the middleware list
    pub fn push_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Full middleware list for the base store, passthrough middleware last
    #[must_use]
    pub fn pipeline(&self) -> Vec<Arc<dyn Middleware>> {
        self.middlewares
            .iter()
            .chain(&self.redux.middlewares)
            .cloned()
            .collect()
    }

    /// Validate a model against the registered ones and append it
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] and leaves the bag unchanged if
    /// the model is malformed or its name is taken.
    pub fn add_model(&mut self, model: Model) -> Result<(), StoreError> {
        validate_new_model(&model, self.model_names())?;
        self.models.push(model);
        Ok(())
    }

    /// Remove a model and its reducer
    pub fn remove_model(&mut self, name: &str) {
        self.models.retain(|model| model.name() != name);
        self.remove_reducer(name);
    }

    /// Register the reducer for a model's slice, replacing an earlier one
    pub fn register_reducer(&mut self, slice: SliceReducer) {
        match self
            .reducers
            .iter_mut()
            .find(|existing| existing.model == slice.model)
        {
            Some(existing) => *existing = slice,
            None => self.reducers.push(slice),
        }
    }

    /// Drop a model's slice reducer
    pub fn remove_reducer(&mut self, model: &str) {
        self.reducers.retain(|slice| slice.model != model);
    }

    /// Registered slice reducers, in registration order
    #[must_use]
    pub fn reducers(&self) -> &[SliceReducer] {
        &self.reducers
    }

    /// Combine root reducers and every slice reducer into the root reducer
    #[must_use]
    pub fn root_reducer(&self) -> ActionReducer {
        root_reducer(self.reducers.clone(), self.redux.root_reducers.clone())
    }
}

impl std::fmt::Debug for Bag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bag")
            .field("models", &self.model_names())
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("effects", &self.effects)
            .field("redux", &self.redux)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

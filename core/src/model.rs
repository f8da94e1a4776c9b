//! Models: named units of state ownership.
//!
//! A model bundles an initial state slice, pure reducers keyed by action
//! name, effect handlers keyed by action name, and an optional base reducer
//! that sees every action before the keyed reducers do.
//!
//! # Example
//!
//! ```
//! use modelstore_core::Model;
//! use serde_json::json;
//!
//! let count = Model::new("count", json!(0))
//!     .reducer("increment", |state, payload| {
//!         Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(1)))
//!     })
//!     .effect("double", |_payload, root| Ok(json!(root["count"].as_i64().unwrap_or(0) * 2)));
//!
//! assert_eq!(count.action_names(), vec!["double", "increment"]);
//! ```

use crate::action::Action;
use crate::effect::{EffectContext, EffectOutput};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// Keyed reducer: `(state slice, payload) -> next state slice`
pub type ReducerFn = Arc<dyn Fn(Value, &Value) -> anyhow::Result<Value> + Send + Sync>;

/// Base reducer: `(state slice, action) -> next state slice`, run on every action
pub type BaseReducerFn = Arc<dyn Fn(Value, &Action) -> anyhow::Result<Value> + Send + Sync>;

/// Effect handler: `(payload, root state, context) -> result`
pub type EffectFn =
    Arc<dyn Fn(Value, &Value, &EffectContext<'_>) -> anyhow::Result<EffectOutput> + Send + Sync>;

/// A named slice of state with its reducers and effects
#[derive(Clone)]
pub struct Model {
    name: String,
    state: Value,
    reducers: BTreeMap<String, ReducerFn>,
    effects: BTreeMap<String, EffectFn>,
    base_reducer: Option<BaseReducerFn>,
}

impl Model {
    /// Create a model with a name and an initial state slice
    pub fn new(name: impl Into<String>, state: Value) -> Self {
        Self {
            name: name.into(),
            state,
            reducers: BTreeMap::new(),
            effects: BTreeMap::new(),
            base_reducer: None,
        }
    }

    /// Add a reducer
    ///
    /// A plain key handles `<model>/<key>`. A key that already contains `/`
    /// (e.g. `"session/logout"`) listens to that exact action type.
    #[must_use]
    pub fn reducer<F>(mut self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(Value, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.reducers.insert(name.into(), Arc::new(reducer));
        self
    }

    /// Add a synchronous effect receiving `(payload, root state)`
    #[must_use]
    pub fn effect<F>(self, name: impl Into<String>, effect: F) -> Self
    where
        F: Fn(Value, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.effect_with_context(name, move |payload, state, _ctx| {
            effect(payload, state).map(EffectOutput::Ready)
        })
    }

    /// Add an effect returning a future
    ///
    /// The future is handed back to the dispatch caller without being awaited.
    #[must_use]
    pub fn async_effect<F, Fut>(self, name: impl Into<String>, effect: F) -> Self
    where
        F: Fn(Value, &Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.effect_with_context(name, move |payload, state, _ctx| {
            Ok(EffectOutput::pending(effect(payload, state)))
        })
    }

    /// Add an effect that also receives an [`EffectContext`] for follow-up dispatches
    #[must_use]
    pub fn effect_with_context<F>(mut self, name: impl Into<String>, effect: F) -> Self
    where
        F: Fn(Value, &Value, &EffectContext<'_>) -> anyhow::Result<EffectOutput>
            + Send
            + Sync
            + 'static,
    {
        self.effects.insert(name.into(), Arc::new(effect));
        self
    }

    /// Set the base reducer
    #[must_use]
    pub fn base_reducer<F>(mut self, reducer: F) -> Self
    where
        F: Fn(Value, &Action) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.base_reducer = Some(Arc::new(reducer));
        self
    }

    /// Model name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial state slice
    #[must_use]
    pub const fn initial_state(&self) -> &Value {
        &self.state
    }

    /// Reducers keyed by action name
    #[must_use]
    pub const fn reducers(&self) -> &BTreeMap<String, ReducerFn> {
        &self.reducers
    }

    /// Effects keyed by action name
    #[must_use]
    pub const fn effects(&self) -> &BTreeMap<String, EffectFn> {
        &self.effects
    }

    /// Base reducer, if set
    #[must_use]
    pub const fn base(&self) -> Option<&BaseReducerFn> {
        self.base_reducer.as_ref()
    }

    /// Every reducer and effect name, sorted and deduplicated
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .reducers
            .keys()
            .chain(self.effects.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Check if the model declares a reducer or effect with this name
    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.reducers.contains_key(name) || self.effects.contains_key(name)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("reducers", &self.reducers.keys().collect::<Vec<_>>())
            .field("effects", &self.effects.keys().collect::<Vec<_>>())
            .field("base_reducer", &self.base_reducer.is_some())
            .finish()
    }
}

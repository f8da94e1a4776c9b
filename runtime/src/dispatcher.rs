//! Per-model dispatch tables.
//!
//! For every reducer and effect key of a model, synthesis produces an
//! [`ActionDispatcher`] that builds the action and hands it to the base
//! store's dispatch. The resulting [`ModelDispatcher`] is what
//! `store.dispatcher("count")` returns.

use crate::bag::EffectRegistry;
use crate::base::BaseStore;
use modelstore_core::action::qualify;
use modelstore_core::{Action, Dispatched, Model, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Dispatch function for one action of one model
///
/// For a listener key such as `"session/logout"` on model `todos`, the
/// entry `todos` → `session/logout` sends that other model's action
/// verbatim rather than `todos/session/logout`.
#[derive(Clone)]
pub struct ActionDispatcher {
    action_type: String,
    is_effect: bool,
    base: BaseStore,
}

impl ActionDispatcher {
    /// Type of the actions this dispatcher produces
    #[must_use]
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Check if an effect is registered for this action
    #[must_use]
    pub const fn is_effect(&self) -> bool {
        self.is_effect
    }

    /// Build the action and dispatch it
    ///
    /// # Errors
    ///
    /// Returns any failure raised while the action is handled.
    pub fn dispatch(&self, payload: Option<Value>) -> Result<Dispatched, StoreError> {
        self.base
            .dispatch(Action::new(self.action_type.clone(), payload))
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("action_type", &self.action_type)
            .field("is_effect", &self.is_effect)
            .finish_non_exhaustive()
    }
}

/// Dispatch functions for every action of one model
#[derive(Debug, Clone)]
pub struct ModelDispatcher {
    model: String,
    actions: BTreeMap<String, ActionDispatcher>,
}

impl ModelDispatcher {
    /// Name of the model
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Dispatcher for one action name
    #[must_use]
    pub fn get(&self, action: &str) -> Option<&ActionDispatcher> {
        self.actions.get(action)
    }

    /// Action names in the table, sorted
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Dispatch one of the model's actions
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownAction`] if the model declares no such
    /// action, otherwise any failure raised while it is handled.
    pub fn dispatch(&self, action: &str, payload: Option<Value>) -> Result<Dispatched, StoreError> {
        self.actions
            .get(action)
            .ok_or_else(|| StoreError::UnknownAction {
                model: self.model.clone(),
                action: action.to_string(),
            })?
            .dispatch(payload)
    }

    /// Number of actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the model declares no actions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// The store's two-level dispatch table: model name, then action name
pub type DispatchTable = BTreeMap<String, ModelDispatcher>;

/// Build a model's dispatch table and register its effects
///
/// Plain keys dispatch `<model>/<key>`. Keys that already contain `/` are
/// listeners for another model's action and dispatch that type verbatim.
#[must_use]
pub fn create_dispatcher(base: &BaseStore, effects: &EffectRegistry, model: &Model) -> ModelDispatcher {
    for (name, effect) in model.effects() {
        effects.register(qualify(model.name(), name), effect.clone());
    }

    let actions = model
        .action_names()
        .into_iter()
        .map(|name| {
            let dispatcher = ActionDispatcher {
                action_type: qualify(model.name(), name),
                is_effect: model.effects().contains_key(name),
                base: base.clone(),
            };
            (name.to_string(), dispatcher)
        })
        .collect();

    tracing::trace!(model = model.name(), "Dispatcher created");

    ModelDispatcher {
        model: model.name().to_string(),
        actions,
    }
}

//! Model reducers and the combined root reducer.
//!
//! A model reducer runs the model's base reducer (if any) and then the keyed
//! reducer matching the action type. The root reducer runs matching root
//! reducers on the whole state, then every model reducer on its own slice.

use modelstore_core::action::qualify;
use modelstore_core::{Action, BaseReducerFn, Model, ReducerFn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reducer over a whole action: `(state, action) -> next state`
///
/// Used for model reducers, root reducers and the store's root reducer.
pub type ActionReducer = BaseReducerFn;

static NULL: Value = Value::Null;

/// A model reducer registered for the root reducer
#[derive(Clone)]
pub struct SliceReducer {
    /// Model owning the slice
    pub model: String,
    /// Slice value used when the root state has none
    pub initial: Value,
    /// Reducer for the slice
    pub reducer: ActionReducer,
}

impl std::fmt::Debug for SliceReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceReducer")
            .field("model", &self.model)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

/// Build the reducer for one model's slice
#[must_use]
pub fn model_reducer(model: &Model) -> ActionReducer {
    let handlers: BTreeMap<String, ReducerFn> = model
        .reducers()
        .iter()
        .map(|(name, reducer)| (qualify(model.name(), name), Arc::clone(reducer)))
        .collect();
    let base = model.base().cloned();

    Arc::new(move |state: Value, action: &Action| -> anyhow::Result<Value> {
        let state = match &base {
            Some(base) => base(state, action)?,
            None => state,
        };
        match handlers.get(&action.action_type) {
            Some(handler) => handler(state, action.payload.as_ref().unwrap_or(&NULL)),
            None => Ok(state),
        }
    })
}

/// Combine root reducers and slice reducers into the store's root reducer
///
/// The result is always a JSON object holding exactly one key per model, in
/// registration order. A root reducer that returns a non-object resets
/// every slice to its initial value.
#[must_use]
pub fn root_reducer(
    slices: Vec<SliceReducer>,
    root_reducers: BTreeMap<String, ActionReducer>,
) -> ActionReducer {
    Arc::new(move |state: Value, action: &Action| -> anyhow::Result<Value> {
        let state = match root_reducers.get(&action.action_type) {
            Some(reducer) => reducer(state, action)?,
            None => state,
        };

        let mut previous = match state {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let mut next = Map::new();
        for slice in &slices {
            let current = previous
                .remove(&slice.model)
                .unwrap_or_else(|| slice.initial.clone());
            next.insert(slice.model.clone(), (slice.reducer)(current, action)?);
        }
        Ok(Value::Object(next))
    })
}

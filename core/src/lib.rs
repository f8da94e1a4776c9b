//! # Modelstore Core
//!
//! Core types and traits for modelstore.
//!
//! This crate holds everything that does not need a live store: the action
//! wire shape, models with their reducers and effects, the middleware seam,
//! model validation and the error taxonomy. The runtime crate assembles these
//! into a store.
//!
//! ## Core Concepts
//!
//! - **Model**: Named state slice with reducers and effects
//! - **Action**: `{ type: "<model>/<action>", payload }`
//! - **Reducer**: Pure function `(state slice, payload) → next state slice`
//! - **Effect**: Handler run after its same-named reducer committed; its result
//!   is the result of `dispatch`
//! - **Middleware**: Layer in the dispatch pipeline, composed outermost-first
//!
//! ## Example
//!
//! ```
//! use modelstore_core::{validate::validate_model, Model};
//! use serde_json::json;
//!
//! let count = Model::new("count", json!(0))
//!     .reducer("increment", |state, payload| {
//!         Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(1)))
//!     });
//!
//! assert!(validate_model(&count).is_ok());
//! ```

/// Action type, wire shape and type-naming helpers
pub mod action;

/// Effect results, dispatch results and the effect context
pub mod effect;

/// Error types
pub mod error;

/// Middleware trait and chain cursor
pub mod middleware;

/// Models and handler types
pub mod model;

/// Model validation
pub mod validate;

pub use action::Action;
pub use effect::{Dispatched, EffectContext, EffectOutput};
pub use error::{Hook, StoreError, ValidationError};
pub use middleware::{Middleware, Next, StoreApi};
pub use model::{BaseReducerFn, EffectFn, Model, ReducerFn};

// Re-export the value type every handler works with
pub use serde_json::{json, Value};

//! # Modelstore Runtime
//!
//! Runtime implementation for modelstore.
//!
//! This crate assembles models and plugins into a [`Store`]: a reducer and
//! middleware store with a two-level dispatch table, effects that run after
//! their reducers, runtime model registration and plugin-exposed properties.
//!
//! ## Core Components
//!
//! - **`BaseStore`**: State, root reducer, middleware pipeline, listeners
//! - **`EffectsMiddleware`**: Runs the reducers, then the action's effect
//! - **Dispatcher**: `store.dispatch_to("count", "increment", payload)`
//! - **Plugins**: Middleware, model observers, store transformers, reducer
//!   enhancers and exposed properties
//! - **`Store`**: The facade returned by [`init`]
//!
//! ## Example
//!
//! ```
//! use modelstore_core::Model;
//! use modelstore_runtime::{init, InitConfig};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), modelstore_core::StoreError> {
//! let count = Model::new("count", json!(2))
//!     .reducer("incrementAsync", |state, payload| {
//!         Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(0)))
//!     })
//!     .effect("incrementAsync", |payload, root| {
//!         Ok(json!(root["count"].as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(0)))
//!     });
//!
//! let store = init(InitConfig::new().with_model(count))?;
//! let result = store.dispatch_to("count", "incrementAsync", Some(json!(3)))?;
//!
//! // The reducer committed 5, then the effect saw it
//! assert_eq!(store.get_state()["count"], json!(5));
//! assert_eq!(result.as_value(), Some(&json!(8)));
//! # Ok(())
//! # }
//! ```

/// Construction context: models, plugins, effect registry, redux options
pub mod bag;

/// Reducer + middleware store primitive
pub mod base;

/// Per-model dispatch tables
pub mod dispatcher;

/// Middleware running effects after their reducers
pub mod effects;

/// Plugin-exposed properties
pub mod exposed;

/// Store construction
pub mod init;

/// Plugin hook runner
pub mod lifecycle;

/// Action tracing middleware
pub mod logging;

/// Metric names and recorders
pub mod metrics;

/// Plugins and their capabilities
pub mod plugin;

/// Model reducers and the root reducer
pub mod reducers;

/// The store facade
pub mod store;

mod sync;

pub use bag::{Bag, EffectRegistry, ReduxConfig};
pub use base::{BaseStore, Subscription};
pub use dispatcher::{ActionDispatcher, DispatchTable, ModelDispatcher};
pub use effects::EffectsMiddleware;
pub use exposed::{ExposedProperty, StoreCell};
pub use init::{init, InitConfig};
pub use logging::LoggingMiddleware;
pub use plugin::{
    Exposed, ExposedFn, MiddlewareProvider, ModelObserver, Plugin, ReducerEnhancer,
    StoreTransformer,
};
pub use reducers::ActionReducer;
pub use store::Store;

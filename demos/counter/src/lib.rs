//! # Counter Example
//!
//! A counter model demonstrating modelstore.
//!
//! This example showcases:
//! - Reducers on a model slice
//! - A synchronous effect that runs after its same-named reducer
//! - An asynchronous effect whose future the caller awaits
//! - A plugin contributing middleware and exposed properties
//!
//! ## Example
//!
//! ```
//! use counter::{counter_store, COUNT};
//! use serde_json::json;
//!
//! let store = counter_store().unwrap();
//! store.dispatch_to(COUNT, "increment", None).unwrap();
//! assert_eq!(store.get_state()[COUNT], json!(1));
//! ```

use modelstore_core::middleware::from_fn;
use modelstore_core::{Model, StoreError};
use modelstore_runtime::{init, InitConfig, Plugin, Store};
use serde_json::{json, Value};
use std::time::Duration;

/// Name of the counter model
pub const COUNT: &str = "count";

fn amount(payload: &Value, default: i64) -> i64 {
    payload.as_i64().unwrap_or(default)
}

/// The counter model
///
/// | action           | reducer        | effect                                 |
/// |------------------|----------------|----------------------------------------|
/// | `increment`      | `+payload` (1) |                                        |
/// | `decrement`      | `-payload` (1) |                                        |
/// | `reset`          | `0`            |                                        |
/// | `incrementTwice` | `+payload`     | returns the doubled count              |
/// | `fetchStep`      |                | resolves to the step after a short wait |
#[must_use]
pub fn counter_model() -> Model {
    Model::new(COUNT, json!(0))
        .reducer("increment", |state, payload| {
            Ok(json!(amount(&state, 0) + amount(payload, 1)))
        })
        .reducer("decrement", |state, payload| {
            Ok(json!(amount(&state, 0) - amount(payload, 1)))
        })
        .reducer("reset", |_state, _payload| Ok(json!(0)))
        .reducer("incrementTwice", |state, payload| {
            Ok(json!(amount(&state, 0) + amount(payload, 1)))
        })
        .effect("incrementTwice", |_payload, root| {
            // the reducer already committed, so the root state holds the new count
            Ok(json!(amount(&root[COUNT], 0) * 2))
        })
        .async_effect("fetchStep", |payload, _root| {
            let step = amount(&payload, 1);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, anyhow::Error>(json!(step))
            }
        })
}

/// Plugin that logs every action and exposes `version` and `doubled`
#[must_use]
pub fn counter_plugin() -> Plugin {
    Plugin::new("counter-tools")
        .with_middleware(from_fn(|api, action, next| {
            tracing::info!(action = %action.action_type, "Counter action");
            let result = next.run(action);
            tracing::debug!(count = %api.get_state()[COUNT], "Counter state");
            result
        }))
        .expose_value("version", json!("1.0.0"))
        .expose_fn("doubled", |store, _args| {
            Ok(json!(amount(&store.get_state()[COUNT], 0) * 2))
        })
}

/// Build a store holding the counter model and its plugin
///
/// # Errors
///
/// Returns a [`StoreError`] if the store cannot be built.
pub fn counter_store() -> Result<Store, StoreError> {
    init(
        InitConfig::new()
            .with_name("counter")
            .with_model(counter_model())
            .with_plugin(counter_plugin()),
    )
}

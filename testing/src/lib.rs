//! # Modelstore Testing
//!
//! Testing utilities and helpers for modelstore.
//!
//! This crate provides:
//! - [`ModelTest`]: Given-When-Then tests for one model
//! - Mock plugins and middleware that record what they see
//! - Test helpers for building stores and resolving dispatch results
//! - proptest strategies for model and action names
//!
//! ## Example
//!
//! ```
//! use modelstore_core::Model;
//! use modelstore_testing::{test_store, RecordingPlugin};
//! use serde_json::json;
//!
//! let recorder = RecordingPlugin::new("recorder");
//! let store = test_store(vec![Model::new("count", json!(0))], vec![recorder.plugin()]);
//!
//! assert_eq!(store.get_state(), json!({ "count": 0 }));
//! assert_eq!(recorder.models_seen(), vec!["count".to_string()]);
//! ```

/// Given-When-Then model tests
pub mod model_test;

pub use model_test::{assertions, ModelTest};

/// Mock plugins and middleware for testing.
pub mod mocks {
    use modelstore_core::{Action, Dispatched, Middleware, Next, StoreApi, StoreError};
    use modelstore_runtime::{Bag, Plugin};
    use std::sync::{Arc, Mutex, PoisonError};

    /// A hook invocation recorded by [`RecordingPlugin`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HookCall {
        /// `create_middleware`, with the number of middleware already collected
        CreateMiddleware(usize),
        /// `on_reducer`, with the model name
        OnReducer(String),
        /// `on_model`, with the model name and store name
        OnModel {
            /// Model passed to the hook
            model: String,
            /// Name of the store passed to the hook
            store: String,
        },
        /// `on_store_created`, with the store name
        OnStoreCreated(String),
    }

    /// Plugin that journals every hook call and changes nothing
    ///
    /// Clones share the journal.
    #[derive(Debug, Clone)]
    pub struct RecordingPlugin {
        name: String,
        calls: Arc<Mutex<Vec<HookCall>>>,
    }

    impl RecordingPlugin {
        /// Create a recorder
        #[must_use]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn record(calls: &Mutex<Vec<HookCall>>, call: HookCall) {
            calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        }

        /// Build the plugin; every hook appends to this recorder's journal
        #[must_use]
        pub fn plugin(&self) -> Plugin {
            let on_middleware = Arc::clone(&self.calls);
            let on_reducer = Arc::clone(&self.calls);
            let on_model = Arc::clone(&self.calls);
            let on_store = Arc::clone(&self.calls);

            Plugin::new(self.name.clone())
                .create_middleware(move |bag: &Bag| {
                    Self::record(&on_middleware, HookCall::CreateMiddleware(bag.middlewares().len()));
                    let middleware: Arc<dyn Middleware> = Arc::new(RecordingMiddleware::new());
                    Ok(middleware)
                })
                .on_reducer(move |_reducer, model, _bag| {
                    Self::record(&on_reducer, HookCall::OnReducer(model.to_string()));
                    Ok(None)
                })
                .on_model(move |model, store| {
                    Self::record(
                        &on_model,
                        HookCall::OnModel {
                            model: model.name().to_string(),
                            store: store.name().to_string(),
                        },
                    );
                    Ok(())
                })
                .on_store_created(move |store, _bag| {
                    Self::record(&on_store, HookCall::OnStoreCreated(store.name().to_string()));
                    Ok(None)
                })
        }

        /// Every recorded call, in order
        #[must_use]
        pub fn calls(&self) -> Vec<HookCall> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Models passed to `on_model`, in order
        #[must_use]
        pub fn models_seen(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    HookCall::OnModel { model, .. } => Some(model),
                    _ => None,
                })
                .collect()
        }
    }

    /// Middleware that records every action type it forwards
    ///
    /// Clones share the record.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingMiddleware {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingMiddleware {
        /// Create a recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Action types seen so far, in order
        #[must_use]
        pub fn action_types(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl Middleware for RecordingMiddleware {
        fn handle(
            &self,
            _api: &dyn StoreApi,
            action: Action,
            next: Next<'_>,
        ) -> Result<Dispatched, StoreError> {
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(action.action_type.clone());
            next.run(action)
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use modelstore_core::{Dispatched, Model, StoreError};
    use modelstore_runtime::{init, InitConfig, Plugin, Store};
    use serde_json::Value;

    /// Build a store from models and plugins
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn test_store(models: Vec<Model>, plugins: Vec<Plugin>) -> Store {
        let config = plugins
            .into_iter()
            .fold(InitConfig::new().with_models(models), InitConfig::with_plugin);
        init(config).expect("test store should build")
    }

    /// Block on a dispatch result, awaiting a pending effect
    ///
    /// # Errors
    ///
    /// Returns the pending effect's failure.
    pub fn resolve_now(result: Dispatched) -> Result<Value, StoreError> {
        futures::executor::block_on(result.resolve())
    }

    /// Install a test-friendly tracing subscriber honoring `RUST_LOG`
    ///
    /// Safe to call from every test; only the first call installs it.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Valid model names
    pub fn model_name() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9_]{0,11}"
    }

    /// Valid unqualified action names
    pub fn action_name() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9_]{0,11}"
    }

    /// Distinct action names
    pub fn action_names(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set(action_name(), 0..=max)
            .prop_map(|names| names.into_iter().collect())
    }
}

// Re-export commonly used items
pub use helpers::{init_tracing, resolve_now, test_store};
pub use mocks::{HookCall, RecordingMiddleware, RecordingPlugin};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use modelstore_core::Model;
    use serde_json::json;

    #[test]
    fn test_recording_plugin_journal() {
        let recorder = RecordingPlugin::new("recorder");
        let store = test_store(vec![Model::new("count", json!(0))], vec![recorder.plugin()]);

        assert_eq!(
            recorder.calls(),
            vec![
                HookCall::CreateMiddleware(1),
                HookCall::OnReducer("count".into()),
                HookCall::OnModel {
                    model: "count".into(),
                    store: store.name().to_string(),
                },
                HookCall::OnStoreCreated(store.name().to_string()),
            ]
        );
    }

    #[test]
    fn test_recording_middleware() {
        let middleware = RecordingMiddleware::new();
        let store = init_store_with(middleware.clone());
        store.dispatch_to("count", "increment", None).unwrap();
        assert_eq!(middleware.action_types(), vec!["count/increment".to_string()]);
    }

    fn init_store_with(middleware: RecordingMiddleware) -> modelstore_runtime::Store {
        let count = Model::new("count", json!(0)).reducer("increment", |state, _payload| {
            Ok(json!(state.as_i64().unwrap_or(0) + 1))
        });
        modelstore_runtime::init(
            modelstore_runtime::InitConfig::new()
                .with_model(count)
                .with_redux(modelstore_runtime::ReduxConfig::new().with_middleware(middleware)),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_now() {
        let count = Model::new("count", json!(0))
            .async_effect("load", |_payload, _root| async { Ok::<_, anyhow::Error>(json!(3)) });
        let store = test_store(vec![count], vec![]);
        let pending = store.dispatch_to("count", "load", None).unwrap();
        assert_eq!(resolve_now(pending).unwrap(), json!(3));
    }
}

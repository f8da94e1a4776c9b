//! Plugin hooks, run in plugin registration order.
//!
//! Every hook failure is wrapped as [`StoreError::PluginHook`] and aborts the
//! operation that ran it. Nothing is skipped and continued.

use crate::bag::Bag;
use crate::exposed::StoreCell;
use crate::plugin::Plugin;
use crate::reducers::{model_reducer, ActionReducer};
use crate::store::Store;
use modelstore_core::{Hook, Model, StoreError};
use std::sync::Arc;

fn hook_failed(plugin: &Plugin, hook: Hook, source: anyhow::Error) -> StoreError {
    tracing::warn!(plugin = plugin.name(), %hook, error = %source, "Plugin hook failed");
    StoreError::plugin_hook(plugin.name(), hook, source)
}

/// Append each plugin's middleware to the bag
///
/// Each plugin sees the middleware contributed before it.
///
/// # Errors
///
/// Returns the first `create_middleware` failure.
pub fn collect_middlewares(bag: &mut Bag) -> Result<(), StoreError> {
    let plugins = bag.plugins().to_vec();
    for plugin in &plugins {
        if let Some(provider) = plugin.middleware_provider() {
            let middleware = provider
                .create_middleware(bag)
                .map_err(|source| hook_failed(plugin, Hook::CreateMiddleware, source))?;
            bag.push_middleware(middleware);
        }
    }
    Ok(())
}

/// Build a model's reducer and pass it through every reducer enhancer
///
/// # Errors
///
/// Returns the first `on_reducer` failure.
pub fn build_model_reducer(model: &Model, bag: &Bag) -> Result<ActionReducer, StoreError> {
    bag.plugins()
        .iter()
        .try_fold(model_reducer(model), |reducer, plugin| {
            let Some(enhancer) = plugin.reducer_enhancer() else {
                return Ok(reducer);
            };
            let enhanced = enhancer
                .on_reducer(Arc::clone(&reducer), model.name(), bag)
                .map_err(|source| hook_failed(plugin, Hook::OnReducer, source))?;
            Ok(enhanced.unwrap_or(reducer))
        })
}

/// Tell every model observer about a model
///
/// # Errors
///
/// Returns the first `on_model` failure; later plugins are not called.
pub fn notify_model(plugins: &[Arc<Plugin>], model: &Model, store: &Store) -> Result<(), StoreError> {
    for plugin in plugins {
        if let Some(observer) = plugin.model_observer() {
            observer
                .on_model(model, store)
                .map_err(|source| hook_failed(plugin, Hook::OnModel, source))?;
        }
    }
    Ok(())
}

/// Run every store transformer, threading the store through them
///
/// A returned store replaces the current one for later plugins and in
/// `current`, so exposed functions see it.
///
/// # Errors
///
/// Returns the first `on_store_created` failure.
pub fn run_store_created(store: Store, bag: &Bag, current: &StoreCell) -> Result<Store, StoreError> {
    bag.plugins().iter().try_fold(store, |store, plugin| {
        let Some(transformer) = plugin.store_transformer() else {
            return Ok(store);
        };
        match transformer
            .on_store_created(&store, bag)
            .map_err(|source| hook_failed(plugin, Hook::OnStoreCreated, source))?
        {
            Some(replacement) => {
                tracing::debug!(
                    plugin = plugin.name(),
                    store = replacement.name(),
                    "Store replaced"
                );
                current.set(&replacement);
                Ok(replacement)
            },
            None => Ok(store),
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::bag::ReduxConfig;
    use modelstore_core::middleware::from_fn;
    use modelstore_core::{Action, Middleware};
    use serde_json::{json, Value};

    fn bag_with(plugins: Vec<Plugin>) -> Bag {
        Bag::new(
            vec![],
            plugins.into_iter().map(Arc::new).collect(),
            ReduxConfig::new(),
        )
        .unwrap()
    }

    #[test]
    fn middlewares_are_collected_incrementally() {
        let counts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let plugin = |name: &str| {
            let counts = Arc::clone(&counts);
            Plugin::new(name).create_middleware(move |bag: &Bag| {
                counts.lock().unwrap().push(bag.middlewares().len());
                let middleware: Arc<dyn Middleware> =
                    Arc::new(from_fn(|_api, action, next| next.run(action)));
                Ok(middleware)
            })
        };
        let mut bag = bag_with(vec![plugin("a"), Plugin::new("none"), plugin("b")]);
        collect_middlewares(&mut bag).unwrap();

        assert_eq!(bag.middlewares().len(), 2);
        assert_eq!(*counts.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn create_middleware_failure_names_plugin() {
        let mut bag = bag_with(vec![Plugin::new("broken").create_middleware(|_bag| {
            Err(anyhow::anyhow!("no config"))
        })]);
        let err = collect_middlewares(&mut bag).unwrap_err();
        assert_eq!(
            err.to_string(),
            "plugin `broken` failed in create_middleware: no config"
        );
    }

    #[test]
    fn reducer_enhancers_chain_in_order() {
        let doubling = |reducer: ActionReducer, _model: &str, _bag: &Bag| -> anyhow::Result<Option<ActionReducer>> {
            let wrapped: ActionReducer = Arc::new(move |state: Value, action: &Action| -> anyhow::Result<Value> {
                let next = reducer(state, action)?;
                Ok(json!(next.as_i64().unwrap_or(0) * 2))
            });
            Ok(Some(wrapped))
        };
        let bag = bag_with(vec![
            Plugin::new("double").on_reducer(doubling),
            Plugin::new("observe").on_reducer(|_reducer, _model, _bag| Ok(None)),
        ]);
        let model = Model::new("count", json!(0)).reducer("increment", |state, _payload| {
            Ok(json!(state.as_i64().unwrap_or(0) + 1))
        });

        let reducer = build_model_reducer(&model, &bag).unwrap();
        assert_eq!(reducer(json!(1), &Action::bare("count/increment")).unwrap(), json!(4));
    }
}

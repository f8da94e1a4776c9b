//! Store construction.

use crate::bag::{Bag, ReduxConfig};
use crate::base::BaseStore;
use crate::effects::EffectsMiddleware;
use crate::exposed::{merge_exposed, StoreCell};
use crate::lifecycle;
use crate::metrics::ModelMetrics;
use crate::plugin::Plugin;
use crate::reducers::SliceReducer;
use crate::store::Store;
use modelstore_core::{Model, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static STORE_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Store configuration
///
/// # Example
///
/// ```
/// use modelstore_runtime::{InitConfig, Plugin, ReduxConfig};
/// use modelstore_core::Model;
/// use serde_json::json;
///
/// let config = InitConfig::new()
///     .with_name("app")
///     .with_model(Model::new("count", json!(0)))
///     .with_plugin(Plugin::new("noop"))
///     .with_redux(ReduxConfig::new().with_initial_state(json!({ "count": 3 })));
/// assert_eq!(config.models.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InitConfig {
    /// Store name; defaults to `modelstore-<n>`
    pub name: Option<String>,

    /// Models, in registration order
    pub models: Vec<Model>,

    /// Plugins, in registration order
    pub plugins: Vec<Plugin>,

    /// Passthrough options for the base store
    pub redux: ReduxConfig,
}

impl InitConfig {
    /// Create an empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a model
    #[must_use]
    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Add several models
    #[must_use]
    pub fn with_models(mut self, models: impl IntoIterator<Item = Model>) -> Self {
        self.models.extend(models);
        self
    }

    /// Add a plugin
    #[must_use]
    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Set the passthrough options
    #[must_use]
    pub fn with_redux(mut self, redux: ReduxConfig) -> Self {
        self.redux = redux;
        self
    }
}

/// Build a store
///
/// Construction order:
///
/// 1. validate every model and build the bag
/// 2. install the effects middleware, then each plugin's middleware
/// 3. build every model reducer and create the base store
/// 4. assemble the facade and merge exposed properties
/// 5. install each model's dispatcher and run the model observers
/// 6. run the store transformers, each one seeing the latest store
///
/// # Errors
///
/// Returns [`StoreError::Validation`] for a malformed or repeated model,
/// [`StoreError::PluginHook`] for the first failing plugin hook and
/// [`StoreError::Handler`] if a reducer fails on the init action. No store
/// is returned in any of these cases.
#[tracing::instrument(skip_all, fields(name = config.name.as_deref()))]
pub fn init(config: InitConfig) -> Result<Store, StoreError> {
    let index = STORE_COUNT.fetch_add(1, Ordering::Relaxed);
    let InitConfig {
        name,
        models,
        plugins,
        redux,
    } = config;
    let name = name.unwrap_or_else(|| format!("modelstore-{index}"));

    let mut bag = Bag::new(models, plugins.into_iter().map(Arc::new).collect(), redux)?;
    bag.push_middleware(Arc::new(EffectsMiddleware::new(bag.effects().clone())));
    lifecycle::collect_middlewares(&mut bag)?;

    for model in bag.models().to_vec() {
        let reducer = lifecycle::build_model_reducer(&model, &bag)?;
        bag.register_reducer(SliceReducer {
            model: model.name().to_string(),
            initial: model.initial_state().clone(),
            reducer,
        });
    }

    let base = BaseStore::new(
        bag.root_reducer(),
        bag.redux().initial_state.clone(),
        bag.pipeline(),
    )?;

    let current = StoreCell::new();
    let properties = merge_exposed(bag.plugins(), &current);
    let models = bag.models().to_vec();
    let store = Store::assemble(name, base, bag, properties, current.clone());
    current.set(&store);

    for model in &models {
        store.prepare_model(model)?;
        ModelMetrics::record_added();
    }

    let store = lifecycle::run_store_created(store.clone(), &store.bag(), &current)?;
    tracing::debug!(store = store.name(), models = models.len(), "Store created");
    Ok(store)
}

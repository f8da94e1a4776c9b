//! Plugins and their capabilities.
//!
//! A plugin is a name plus any subset of four independent capabilities and a
//! map of exposed properties. Each capability is a trait with a blanket
//! impl for matching closures, so most plugins are built from closures:
//!
//! ```
//! use modelstore_runtime::Plugin;
//! use serde_json::json;
//!
//! let plugin = Plugin::new("version")
//!     .expose_value("version", json!("1.0.0"))
//!     .on_model(|model, _store| {
//!         println!("registered {}", model.name());
//!         Ok(())
//!     });
//! assert!(plugin.model_observer().is_some());
//! ```

use crate::bag::Bag;
use crate::reducers::ActionReducer;
use crate::store::Store;
use modelstore_core::{Middleware, Model};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Contributes a middleware before the base store is created
pub trait MiddlewareProvider: Send + Sync {
    /// Build the middleware; the bag holds every middleware collected so far
    ///
    /// # Errors
    ///
    /// Any error aborts store construction.
    fn create_middleware(&self, bag: &Bag) -> anyhow::Result<Arc<dyn Middleware>>;
}

impl<F> MiddlewareProvider for F
where
    F: Fn(&Bag) -> anyhow::Result<Arc<dyn Middleware>> + Send + Sync,
{
    fn create_middleware(&self, bag: &Bag) -> anyhow::Result<Arc<dyn Middleware>> {
        self(bag)
    }
}

/// Observes every model once its dispatcher is installed
pub trait ModelObserver: Send + Sync {
    /// Called for each model at construction and for each `add_model`
    ///
    /// # Errors
    ///
    /// Any error aborts construction, or rolls back the `add_model` call.
    fn on_model(&self, model: &Model, store: &Store) -> anyhow::Result<()>;
}

impl<F> ModelObserver for F
where
    F: Fn(&Model, &Store) -> anyhow::Result<()> + Send + Sync,
{
    fn on_model(&self, model: &Model, store: &Store) -> anyhow::Result<()> {
        self(model, store)
    }
}

/// Sees the finished store and may replace it
pub trait StoreTransformer: Send + Sync {
    /// Return `Some(store)` to replace the store seen by later plugins and
    /// returned from `init`
    ///
    /// # Errors
    ///
    /// Any error aborts store construction.
    fn on_store_created(&self, store: &Store, bag: &Bag) -> anyhow::Result<Option<Store>>;
}

impl<F> StoreTransformer for F
where
    F: Fn(&Store, &Bag) -> anyhow::Result<Option<Store>> + Send + Sync,
{
    fn on_store_created(&self, store: &Store, bag: &Bag) -> anyhow::Result<Option<Store>> {
        self(store, bag)
    }
}

/// Wraps model reducers as they are built
pub trait ReducerEnhancer: Send + Sync {
    /// Return `Some(reducer)` to replace the model's reducer
    ///
    /// # Errors
    ///
    /// Any error aborts construction or the `add_model` call.
    fn on_reducer(
        &self,
        reducer: ActionReducer,
        model: &str,
        bag: &Bag,
    ) -> anyhow::Result<Option<ActionReducer>>;
}

impl<F> ReducerEnhancer for F
where
    F: Fn(ActionReducer, &str, &Bag) -> anyhow::Result<Option<ActionReducer>> + Send + Sync,
{
    fn on_reducer(
        &self,
        reducer: ActionReducer,
        model: &str,
        bag: &Bag,
    ) -> anyhow::Result<Option<ActionReducer>> {
        self(reducer, model, bag)
    }
}

/// Exposed function: receives the current store followed by the call arguments
pub type ExposedFn = Arc<dyn Fn(&Store, Vec<Value>) -> anyhow::Result<Value> + Send + Sync>;

/// A property a plugin grafts onto the store
#[derive(Clone)]
pub enum Exposed {
    /// Called through `Store::call`, with the current store bound first
    Function(ExposedFn),

    /// Read through `Store::exposed_value`; updates through the store never
    /// reach the plugin's copy
    Value(Arc<Value>),
}

impl std::fmt::Debug for Exposed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function(_) => write!(f, "Exposed::Function(<fn>)"),
            Self::Value(value) => f.debug_tuple("Exposed::Value").field(value).finish(),
        }
    }
}

/// A named set of optional capabilities
#[derive(Clone)]
pub struct Plugin {
    name: String,
    exposed: BTreeMap<String, Exposed>,
    middleware: Option<Arc<dyn MiddlewareProvider>>,
    model_observer: Option<Arc<dyn ModelObserver>>,
    store_transformer: Option<Arc<dyn StoreTransformer>>,
    reducer_enhancer: Option<Arc<dyn ReducerEnhancer>>,
}

impl Plugin {
    /// Create a plugin with no capabilities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exposed: BTreeMap::new(),
            middleware: None,
            model_observer: None,
            store_transformer: None,
            reducer_enhancer: None,
        }
    }

    /// Provide a middleware built from the bag
    #[must_use]
    pub fn create_middleware<F>(self, f: F) -> Self
    where
        F: Fn(&Bag) -> anyhow::Result<Arc<dyn Middleware>> + Send + Sync + 'static,
    {
        self.with_middleware_provider(f)
    }

    /// Provide a fixed middleware
    #[must_use]
    pub fn with_middleware<M>(self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        let middleware: Arc<dyn Middleware> = Arc::new(middleware);
        self.create_middleware(move |_bag: &Bag| Ok(Arc::clone(&middleware)))
    }

    /// Observe models
    #[must_use]
    pub fn on_model<F>(self, f: F) -> Self
    where
        F: Fn(&Model, &Store) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_model_observer(f)
    }

    /// See, and possibly replace, the finished store
    #[must_use]
    pub fn on_store_created<F>(self, f: F) -> Self
    where
        F: Fn(&Store, &Bag) -> anyhow::Result<Option<Store>> + Send + Sync + 'static,
    {
        self.with_store_transformer(f)
    }

    /// Wrap model reducers
    #[must_use]
    pub fn on_reducer<F>(self, f: F) -> Self
    where
        F: Fn(ActionReducer, &str, &Bag) -> anyhow::Result<Option<ActionReducer>>
            + Send
            + Sync
            + 'static,
    {
        self.with_reducer_enhancer(f)
    }

    /// Expose a function; it receives the current store, then the call arguments
    #[must_use]
    pub fn expose_fn<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Store, Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.exposed.insert(key.into(), Exposed::Function(Arc::new(f)));
        self
    }

    /// Expose a value
    #[must_use]
    pub fn expose_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.exposed
            .insert(key.into(), Exposed::Value(Arc::new(value)));
        self
    }

    /// Set the middleware capability
    #[must_use]
    pub fn with_middleware_provider<P>(mut self, provider: P) -> Self
    where
        P: MiddlewareProvider + 'static,
    {
        self.middleware = Some(Arc::new(provider));
        self
    }

    /// Set the model observer capability
    #[must_use]
    pub fn with_model_observer<O>(mut self, observer: O) -> Self
    where
        O: ModelObserver + 'static,
    {
        self.model_observer = Some(Arc::new(observer));
        self
    }

    /// Set the store transformer capability
    #[must_use]
    pub fn with_store_transformer<T>(mut self, transformer: T) -> Self
    where
        T: StoreTransformer + 'static,
    {
        self.store_transformer = Some(Arc::new(transformer));
        self
    }

    /// Set the reducer enhancer capability
    #[must_use]
    pub fn with_reducer_enhancer<E>(mut self, enhancer: E) -> Self
    where
        E: ReducerEnhancer + 'static,
    {
        self.reducer_enhancer = Some(Arc::new(enhancer));
        self
    }

    /// Plugin name, used in errors and logs
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exposed properties, by key
    #[must_use]
    pub const fn exposed(&self) -> &BTreeMap<String, Exposed> {
        &self.exposed
    }

    /// Middleware capability
    #[must_use]
    pub fn middleware_provider(&self) -> Option<&dyn MiddlewareProvider> {
        self.middleware.as_deref()
    }

    /// Model observer capability
    #[must_use]
    pub fn model_observer(&self) -> Option<&dyn ModelObserver> {
        self.model_observer.as_deref()
    }

    /// Store transformer capability
    #[must_use]
    pub fn store_transformer(&self) -> Option<&dyn StoreTransformer> {
        self.store_transformer.as_deref()
    }

    /// Reducer enhancer capability
    #[must_use]
    pub fn reducer_enhancer(&self) -> Option<&dyn ReducerEnhancer> {
        self.reducer_enhancer.as_deref()
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("exposed", &self.exposed.keys().collect::<Vec<_>>())
            .field("create_middleware", &self.middleware.is_some())
            .field("on_model", &self.model_observer.is_some())
            .field("on_store_created", &self.store_transformer.is_some())
            .field("on_reducer", &self.reducer_enhancer.is_some())
            .finish()
    }
}

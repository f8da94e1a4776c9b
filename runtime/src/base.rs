//! The underlying store primitive.
//!
//! `BaseStore` holds the root state, the root reducer, the middleware
//! pipeline and the listeners. It knows nothing about models, plugins or
//! dispatch tables; the facade in [`crate::store`] builds those on top.

use crate::metrics::{counter, ACTIONS_DISPATCHED};
use crate::reducers::ActionReducer;
use crate::sync::{lock, read, write};
use modelstore_core::action::INIT_ACTION_TYPE;
use modelstore_core::{Action, Dispatched, Middleware, Next, StoreApi, StoreError};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

type Listener = Arc<dyn Fn() + Send + Sync>;

struct BaseInner {
    state: RwLock<Value>,
    reducer: RwLock<ActionReducer>,
    middlewares: Vec<Arc<dyn Middleware>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
    // held from reading the state until the reducer's result is written
    commit: Mutex<()>,
}

/// Reducer + middleware store
///
/// Cheap to clone; clones share the same state.
///
/// Commits are serialized: the root reducer always runs on the state left
/// by the previous commit, so concurrent dispatches never lose an update.
/// No lock is held while middleware or listeners run, so they may dispatch
/// again. Reducers must not dispatch.
#[derive(Clone)]
pub struct BaseStore {
    inner: Arc<BaseInner>,
}

impl BaseStore {
    /// Create a store and run the root reducer once with the init action
    ///
    /// The init action bypasses middleware so every slice receives its
    /// initial value before anything can observe the state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Handler`] if the root reducer fails on init.
    pub fn new(
        reducer: ActionReducer,
        preloaded_state: Option<Value>,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<Self, StoreError> {
        let init = Action::bare(INIT_ACTION_TYPE);
        let state = reducer(preloaded_state.unwrap_or(Value::Null), &init)
            .map_err(|source| StoreError::handler(INIT_ACTION_TYPE, source))?;

        tracing::debug!(middlewares = middlewares.len(), "Base store created");

        Ok(Self {
            inner: Arc::new(BaseInner {
                state: RwLock::new(state),
                reducer: RwLock::new(reducer),
                middlewares,
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                commit: Mutex::new(()),
            }),
        })
    }

    /// Snapshot of the root state
    #[must_use]
    pub fn get_state(&self) -> Value {
        read(&self.inner.state).clone()
    }

    /// Read the root state without cloning it
    pub fn select<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Value) -> T,
    {
        f(&read(&self.inner.state))
    }

    /// Dispatch an action through the middleware chain and the root reducer
    ///
    /// # Errors
    ///
    /// Returns the first failure raised by a middleware, the reducer phase
    /// or an effect.
    pub fn dispatch(&self, action: Action) -> Result<Dispatched, StoreError> {
        let terminal = |action: Action| self.reduce(action);
        Next::new(&self.inner.middlewares, self, &terminal).run(action)
    }

    fn reduce(&self, action: Action) -> Result<Dispatched, StoreError> {
        {
            let _commit = lock(&self.inner.commit);
            let reducer = Arc::clone(&*read(&self.inner.reducer));
            let current = self.get_state();

            tracing::trace!(action_type = %action.action_type, "Reducing action");
            let next = reducer(current, &action)
                .map_err(|source| StoreError::handler(action.action_type.as_str(), source))?;

            *write(&self.inner.state) = next;
        }
        counter!(ACTIONS_DISPATCHED).increment(1);

        self.notify();
        Ok(Dispatched::Action(action))
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Register a listener called after every committed state transition
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Swap the root reducer; the state is left as it is
    pub fn replace_reducer(&self, reducer: ActionReducer) {
        *write(&self.inner.reducer) = reducer;
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }
}

impl StoreApi for BaseStore {
    fn get_state(&self) -> Value {
        Self::get_state(self)
    }

    fn dispatch(&self, action: Action) -> Result<Dispatched, StoreError> {
        Self::dispatch(self, action)
    }
}

impl std::fmt::Debug for BaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseStore")
            .field("middlewares", &self.inner.middlewares.len())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// Handle returned by `subscribe`
///
/// Dropping it keeps the listener registered; call [`Subscription::unsubscribe`]
/// to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: Weak<BaseInner>,
}

impl Subscription {
    /// Remove the listener
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            lock(&inner.listeners).retain(|(id, _)| *id != self.id);
        }
    }
}

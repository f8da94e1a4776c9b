//! Middleware seam of the underlying store.
//!
//! Middleware compose redux-style: the first middleware in the list is the
//! outermost. Each one receives the store API, the action, and a [`Next`]
//! cursor over the rest of the chain. The chain ends in the store's reducer
//! step, which commits the new state and returns [`Dispatched::Action`].
//!
//! # Example
//!
//! ```
//! use modelstore_core::middleware::{from_fn, Middleware};
//!
//! // Drop every action whose type starts with "debug/"
//! let filter = from_fn(|_api, action, next| {
//!     if action.action_type.starts_with("debug/") {
//!         Ok(modelstore_core::Dispatched::Action(action))
//!     } else {
//!         next.run(action)
//!     }
//! });
//! # let _: &dyn Middleware = &filter;
//! ```

use crate::action::Action;
use crate::effect::Dispatched;
use crate::error::StoreError;
use serde_json::Value;
use std::sync::Arc;

/// What a middleware (or an effect) may do with the store it runs in
pub trait StoreApi: Send + Sync {
    /// Snapshot of the current root state
    fn get_state(&self) -> Value;

    /// Dispatch an action through the whole middleware chain
    ///
    /// # Errors
    ///
    /// Returns whatever the chain or the reducers fail with.
    fn dispatch(&self, action: Action) -> Result<Dispatched, StoreError>;
}

/// A layer in the dispatch pipeline
pub trait Middleware: Send + Sync {
    /// Handle an action, usually by forwarding it with `next.run(action)`
    ///
    /// # Errors
    ///
    /// Errors propagate unchanged to the original `dispatch` caller.
    fn handle(
        &self,
        api: &dyn StoreApi,
        action: Action,
        next: Next<'_>,
    ) -> Result<Dispatched, StoreError>;
}

/// Terminal step of a middleware chain
pub type Terminal<'a> = &'a dyn Fn(Action) -> Result<Dispatched, StoreError>;

/// Cursor over the remaining middleware of one dispatch
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    api: &'a dyn StoreApi,
    terminal: Terminal<'a>,
}

impl<'a> Next<'a> {
    /// Start a dispatch over `chain`, ending in `terminal`
    #[must_use]
    pub const fn new(
        chain: &'a [Arc<dyn Middleware>],
        api: &'a dyn StoreApi,
        terminal: Terminal<'a>,
    ) -> Self {
        Self {
            chain,
            api,
            terminal,
        }
    }

    /// Pass the action to the next middleware, or to the reducers if none is left
    ///
    /// # Errors
    ///
    /// Returns the first failure raised further down the chain.
    pub fn run(self, action: Action) -> Result<Dispatched, StoreError> {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(
                self.api,
                action,
                Next {
                    chain: rest,
                    ..self
                },
            ),
            None => (self.terminal)(action),
        }
    }

    /// Number of middleware still ahead of the reducers
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.chain.len()
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// Middleware built from a closure, see [`from_fn`]
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&dyn StoreApi, Action, Next<'_>) -> Result<Dispatched, StoreError> + Send + Sync,
{
    fn handle(
        &self,
        api: &dyn StoreApi,
        action: Action,
        next: Next<'_>,
    ) -> Result<Dispatched, StoreError> {
        (self.f)(api, action, next)
    }
}

/// Build a middleware from a closure
pub const fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&dyn StoreApi, Action, Next<'_>) -> Result<Dispatched, StoreError> + Send + Sync,
{
    FnMiddleware { f }
}

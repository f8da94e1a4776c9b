//! Effect results and dispatch results.
//!
//! An effect runs after the reducer phase of its action has committed and
//! its result becomes the result of the whole `dispatch` call. Effects may
//! finish synchronously ([`EffectOutput::Ready`]) or hand back a future
//! ([`EffectOutput::Pending`]); the store never waits on that future, the
//! caller decides whether to.

use crate::action::Action;
use crate::error::StoreError;
use crate::middleware::StoreApi;
use futures::future::BoxFuture;
use futures::TryFutureExt;
use serde_json::Value;
use std::future::Future;

/// Asynchronous effect result as produced by an effect handler
pub type PendingEffect = BoxFuture<'static, anyhow::Result<Value>>;

/// Asynchronous dispatch result, failures already attributed to an action type
pub type PendingDispatch = BoxFuture<'static, Result<Value, StoreError>>;

/// What an effect handler produced
pub enum EffectOutput {
    /// Finished synchronously
    Ready(Value),

    /// Still running, to be awaited by the caller
    Pending(PendingEffect),
}

impl EffectOutput {
    /// Wrap a future as a pending output
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    /// Attribute failures of this output to `action_type`
    #[must_use]
    pub fn into_dispatched(self, action_type: &str) -> Dispatched {
        match self {
            Self::Ready(value) => Dispatched::Ready(value),
            Self::Pending(future) => {
                let action_type = action_type.to_string();
                Dispatched::Pending(Box::pin(
                    future.map_err(move |source| StoreError::handler(action_type, source)),
                ))
            },
        }
    }
}

impl From<Value> for EffectOutput {
    fn from(value: Value) -> Self {
        Self::Ready(value)
    }
}

impl std::fmt::Debug for EffectOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("EffectOutput::Ready").field(value).finish(),
            Self::Pending(_) => write!(f, "EffectOutput::Pending(<future>)"),
        }
    }
}

/// Result of a `dispatch` call
pub enum Dispatched {
    /// No effect claimed the action; the reducers saw it and it is handed back
    Action(Action),

    /// An effect finished synchronously with this value
    Ready(Value),

    /// An effect returned a future that has not been awaited
    Pending(PendingDispatch),
}

impl Dispatched {
    /// The passed-through action, if no effect handled the dispatch
    #[must_use]
    pub const fn as_action(&self) -> Option<&Action> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }

    /// The synchronous effect result, if any
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Check if an effect returned a future
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Resolve to a value, awaiting a pending effect if there is one
    ///
    /// A passed-through action resolves to its JSON wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Handler`] if a pending effect fails.
    pub async fn resolve(self) -> Result<Value, StoreError> {
        match self {
            Self::Action(action) => serde_json::to_value(&action)
                .map_err(|source| StoreError::handler(action.action_type.as_str(), source.into())),
            Self::Ready(value) => Ok(value),
            Self::Pending(future) => future.await,
        }
    }
}

impl std::fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Dispatched::Action").field(action).finish(),
            Self::Ready(value) => f.debug_tuple("Dispatched::Ready").field(value).finish(),
            Self::Pending(_) => write!(f, "Dispatched::Pending(<future>)"),
        }
    }
}

/// Handle given to an effect so it can read state and dispatch follow-up actions
///
/// Dispatches made here enter the full middleware chain, like any other
/// dispatch.
#[derive(Clone, Copy)]
pub struct EffectContext<'a> {
    model: &'a str,
    api: &'a dyn StoreApi,
}

impl<'a> EffectContext<'a> {
    /// Create a context for an effect of `model`
    #[must_use]
    pub const fn new(model: &'a str, api: &'a dyn StoreApi) -> Self {
        Self { model, api }
    }

    /// Name of the model owning the running effect
    #[must_use]
    pub const fn model_name(&self) -> &str {
        self.model
    }

    /// Current root state
    #[must_use]
    pub fn get_state(&self) -> Value {
        self.api.get_state()
    }

    /// Dispatch a raw action
    ///
    /// # Errors
    ///
    /// Returns any failure of the dispatched action's handlers.
    pub fn dispatch(&self, action: Action) -> Result<Dispatched, StoreError> {
        self.api.dispatch(action)
    }

    /// Dispatch one of the owning model's own actions
    ///
    /// # Errors
    ///
    /// Returns any failure of the dispatched action's handlers.
    pub fn dispatch_local(
        &self,
        action: &str,
        payload: Option<Value>,
    ) -> Result<Dispatched, StoreError> {
        self.api
            .dispatch(Action::for_model(self.model, action, payload))
    }

    /// Dispatch another model's action
    ///
    /// # Errors
    ///
    /// Returns any failure of the dispatched action's handlers.
    pub fn dispatch_to(
        &self,
        model: &str,
        action: &str,
        payload: Option<Value>,
    ) -> Result<Dispatched, StoreError> {
        self.api.dispatch(Action::for_model(model, action, payload))
    }
}

impl std::fmt::Debug for EffectContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectContext")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_covers_every_variant() {
        let action = Dispatched::Action(Action::for_model("count", "increment", Some(json!(2))));
        assert_eq!(
            action.resolve().await.unwrap(),
            json!({ "type": "count/increment", "payload": 2 })
        );

        let bare = Dispatched::Action(Action::bare("count/reset"));
        assert_eq!(bare.resolve().await.unwrap(), json!({ "type": "count/reset" }));

        let ready = Dispatched::Ready(json!(5));
        assert_eq!(ready.resolve().await.unwrap(), json!(5));

        let pending = EffectOutput::pending(async { Ok::<_, anyhow::Error>(json!("later")) })
            .into_dispatched("count/load");
        assert!(pending.is_pending());
        assert_eq!(pending.resolve().await.unwrap(), json!("later"));
    }

    #[tokio::test]
    async fn pending_failure_names_action_type() {
        let pending = EffectOutput::pending(async { Err::<Value, _>(anyhow::anyhow!("offline")) })
            .into_dispatched("count/load");
        let err = pending.resolve().await.unwrap_err();
        assert_eq!(err.to_string(), "handler for `count/load` failed: offline");
    }

    #[test]
    fn ready_output_from_value() {
        let output: EffectOutput = json!(1).into();
        let dispatched = output.into_dispatched("a/b");
        assert_eq!(dispatched.as_value(), Some(&json!(1)));
        assert!(dispatched.as_action().is_none());
    }
}

//! The effects middleware.
//!
//! Always the outermost middleware. For an action whose type has a
//! registered effect it runs the rest of the chain first, so the reducers
//! have committed before the effect sees the state, then calls the effect
//! and returns its result instead of the chain's. Any other action passes
//! straight through.

use crate::bag::EffectRegistry;
use crate::metrics::EffectMetrics;
use modelstore_core::action::split_type;
use modelstore_core::{Action, Dispatched, EffectContext, Middleware, Next, StoreApi, StoreError};

/// Middleware running effects after their reducers
#[derive(Debug, Clone)]
pub struct EffectsMiddleware {
    effects: EffectRegistry,
}

impl EffectsMiddleware {
    /// Create the middleware over a shared registry
    #[must_use]
    pub const fn new(effects: EffectRegistry) -> Self {
        Self { effects }
    }
}

impl Middleware for EffectsMiddleware {
    fn handle(
        &self,
        api: &dyn StoreApi,
        action: Action,
        next: Next<'_>,
    ) -> Result<Dispatched, StoreError> {
        let Some(effect) = self.effects.get(&action.action_type) else {
            return next.run(action);
        };

        let action_type = action.action_type.clone();
        let payload = action.payload_or_null();

        // Reducer failures surface here and the effect never runs
        next.run(action)?;

        let state = api.get_state();
        let model = split_type(&action_type).map_or("", |(model, _)| model);
        let ctx = EffectContext::new(model, api);

        tracing::trace!(action_type = %action_type, "Running effect");
        EffectMetrics::record_execution();

        match effect(payload, &state, &ctx) {
            Ok(output) => Ok(output.into_dispatched(&action_type)),
            Err(source) => {
                EffectMetrics::record_failure();
                tracing::debug!(action_type = %action_type, error = %source, "Effect failed");
                Err(StoreError::handler(action_type, source))
            },
        }
    }
}

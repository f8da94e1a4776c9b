//! `LoggingMiddleware` - traces every action passing through the store

use modelstore_core::{Action, Dispatched, Middleware, Next, StoreApi, StoreError};

/// Logs every action and whether the rest of the chain accepted it
///
/// Internal `@@` actions are logged at trace level to reduce noise.
///
/// ```
/// use modelstore_runtime::{InitConfig, LoggingMiddleware, ReduxConfig};
///
/// let redux = ReduxConfig::new().with_middleware(LoggingMiddleware::new());
/// let config = InitConfig::new().with_redux(redux);
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Create the middleware
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(
        &self,
        _api: &dyn StoreApi,
        action: Action,
        next: Next<'_>,
    ) -> Result<Dispatched, StoreError> {
        let action_type = action.action_type.clone();
        if action.is_internal() {
            tracing::trace!(action_type = %action_type, "Action");
        } else {
            tracing::debug!(action_type = %action_type, payload = ?action.payload, "Action");
        }

        let result = next.run(action);
        if let Err(error) = &result {
            tracing::debug!(action_type = %action_type, error = %error, "Action failed");
        }
        result
    }
}

//! Metrics for observability and monitoring.
//!
//! Counters are recorded through the `metrics` facade, so they go to
//! whatever recorder the application installs. Nothing is exported from
//! here.
//!
//! # Example
//!
//! ```rust
//! use modelstore_runtime::metrics::register_metrics;
//!
//! // Once at startup, after installing a recorder
//! register_metrics();
//! ```

use metrics::describe_counter;

// Re-export metrics macros for use in other modules
pub use metrics::counter;

/// Actions committed by the root reducer
pub const ACTIONS_DISPATCHED: &str = "modelstore_actions_dispatched_total";

/// Effect handlers invoked
pub const EFFECTS_EXECUTED: &str = "modelstore_effects_executed_total";

/// Effect handlers that returned an error
pub const EFFECTS_FAILED: &str = "modelstore_effects_failed_total";

/// Models registered, at construction or through `add_model`
pub const MODELS_ADDED: &str = "modelstore_models_added_total";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        ACTIONS_DISPATCHED,
        "Total number of actions committed by the root reducer"
    );
    describe_counter!(EFFECTS_EXECUTED, "Total number of effects executed");
    describe_counter!(EFFECTS_FAILED, "Total number of effects that failed");
    describe_counter!(MODELS_ADDED, "Total number of models registered");
}

/// Effect metrics recorder.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record an effect execution.
    pub fn record_execution() {
        counter!(EFFECTS_EXECUTED).increment(1);
    }

    /// Record an effect failure.
    pub fn record_failure() {
        counter!(EFFECTS_FAILED).increment(1);
    }
}

/// Model registration metrics recorder.
pub struct ModelMetrics;

impl ModelMetrics {
    /// Record a registered model.
    pub fn record_added() {
        counter!(MODELS_ADDED).increment(1);
    }
}

//! Ergonomic testing utilities for models
//!
//! This module provides a fluent API for testing one model with readable
//! Given-When-Then syntax. The model runs inside a real store, so reducers,
//! base reducer and effects all take part.

#![allow(clippy::module_name_repetitions)] // ModelTest is the natural name

use modelstore_core::{Dispatched, Model, StoreError};
use modelstore_runtime::{init, InitConfig, ReduxConfig};
use serde_json::{Map, Value};

/// Type alias for state assertion functions
type StateAssertion = Box<dyn FnOnce(&Value)>;

/// Type alias for dispatch result assertion functions
type ResultAssertion = Box<dyn FnOnce(&Dispatched)>;

/// Type alias for error assertion functions
type ErrorAssertion = Box<dyn FnOnce(&StoreError)>;

/// Fluent API for testing a model with Given-When-Then syntax
///
/// # Example
///
/// ```
/// use modelstore_core::Model;
/// use modelstore_testing::ModelTest;
/// use serde_json::json;
///
/// let count = Model::new("count", json!(0))
///     .reducer("increment", |state, payload| {
///         Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(1)))
///     });
///
/// ModelTest::new(count)
///     .given_state(json!(4))
///     .when_action("increment", Some(json!(2)))
///     .then_state(|state| assert_eq!(state, &json!(6)))
///     .run();
/// ```
pub struct ModelTest {
    model: Model,
    initial_state: Option<Value>,
    action: Option<(String, Option<Value>)>,
    state_assertions: Vec<StateAssertion>,
    result_assertions: Vec<ResultAssertion>,
    error_assertions: Vec<ErrorAssertion>,
}

impl ModelTest {
    /// Create a new model test
    #[must_use]
    pub const fn new(model: Model) -> Self {
        Self {
            model,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            result_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the model's slice before the action (Given)
    ///
    /// Without it the slice starts at the model's initial state.
    #[must_use]
    pub fn given_state(mut self, state: Value) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to dispatch, by the model's action name (When)
    #[must_use]
    pub fn when_action(mut self, action: impl Into<String>, payload: Option<Value>) -> Self {
        self.action = Some((action.into(), payload));
        self
    }

    /// Add an assertion about the model's slice after the action (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Value) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the dispatch result (Then)
    #[must_use]
    pub fn then_result<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Dispatched) + 'static,
    {
        self.result_assertions.push(Box::new(assertion));
        self
    }

    /// Expect the dispatch to fail, and assert about the error (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&StoreError) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if no action is set, if the store cannot be built, if the
    /// dispatch fails without error assertions (or succeeds with some), or
    /// if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let (action, payload) = self.action.expect("Action must be set with when_action()");
        let name = self.model.name().to_string();

        let mut redux = ReduxConfig::new();
        if let Some(state) = self.initial_state {
            let mut root = Map::new();
            root.insert(name.clone(), state);
            redux = redux.with_initial_state(Value::Object(root));
        }
        let store = init(InitConfig::new().with_model(self.model).with_redux(redux))
            .expect("Model must build a store");

        match store.dispatch_to(&name, &action, payload) {
            Ok(result) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected `{name}/{action}` to fail, but it succeeded with {result:?}"
                );
                for assertion in self.result_assertions {
                    assertion(&result);
                }
            },
            Err(error) => {
                assert!(
                    !self.error_assertions.is_empty(),
                    "Dispatching `{name}/{action}` failed: {error}"
                );
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            },
        }

        let state = store.get_state();
        for assertion in self.state_assertions {
            assertion(&state[name.as_str()]);
        }
    }
}

/// Helper assertions for dispatch results
pub mod assertions {
    use modelstore_core::Dispatched;
    use serde_json::Value;

    /// Assert that no effect handled the action
    ///
    /// # Panics
    ///
    /// Panics if the result is not a passed-through action.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_passed_through(result: &Dispatched) {
        assert!(
            result.as_action().is_some(),
            "Expected the action to pass through, but found {result:?}"
        );
    }

    /// Assert that an effect finished with `expected`
    ///
    /// # Panics
    ///
    /// Panics if the result is not a ready effect value equal to `expected`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_ready(result: &Dispatched, expected: &Value) {
        assert_eq!(
            result.as_value(),
            Some(expected),
            "Expected effect result {expected}, but found {result:?}"
        );
    }

    /// Assert that an effect returned a future
    ///
    /// # Panics
    ///
    /// Panics if the result is not pending.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_pending(result: &Dispatched) {
        assert!(
            result.is_pending(),
            "Expected a pending effect, but found {result:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn count() -> Model {
        Model::new("count", json!(0))
            .reducer("increment", |state, payload| {
                Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(1)))
            })
            .reducer("incrementAsync", |state, payload| {
                Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(0)))
            })
            .effect("incrementAsync", |payload, root| {
                Ok(json!(root["count"].as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(0)))
            })
            .reducer("fail", |_state, _payload| Err(anyhow::anyhow!("refused")))
            .async_effect("load", |_payload, _root| async { Ok::<_, anyhow::Error>(json!("done")) })
    }

    #[test]
    fn test_model_test_increment() {
        ModelTest::new(count())
            .when_action("increment", Some(json!(5)))
            .then_state(|state| {
                assert_eq!(state, &json!(5));
            })
            .then_result(assertions::assert_passed_through)
            .run();
    }

    #[test]
    fn test_model_test_effect_after_reducer() {
        ModelTest::new(count())
            .given_state(json!(2))
            .when_action("incrementAsync", Some(json!(3)))
            .then_state(|state| assert_eq!(state, &json!(5)))
            .then_result(|result| assertions::assert_ready(result, &json!(8)))
            .run();
    }

    #[test]
    fn test_model_test_error() {
        ModelTest::new(count())
            .given_state(json!(9))
            .when_action("fail", None)
            .then_error(|error| {
                assert_eq!(error.to_string(), "handler for `count/fail` failed: refused");
            })
            .then_state(|state| assert_eq!(state, &json!(9)))
            .run();
    }

    #[test]
    fn test_model_test_pending() {
        ModelTest::new(count())
            .when_action("load", None)
            .then_result(assertions::assert_pending)
            .run();
    }
}

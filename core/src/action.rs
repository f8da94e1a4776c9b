//! Actions: the only input a store understands.
//!
//! An action is `{ "type": "<model>/<action>", "payload": <any> }`. Reducer
//! maps and the effect registry are both keyed by the fully-qualified type,
//! so one dispatched action can drive a reducer and an effect of the same
//! name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between the model name and the action name in an action type
pub const TYPE_SEPARATOR: char = '/';

/// Action dispatched once when a base store is created
pub const INIT_ACTION_TYPE: &str = "@@modelstore/INIT";

/// Action dispatched after the root reducer is replaced
pub const REPLACE_ACTION_TYPE: &str = "@@modelstore/REPLACE";

/// Prefix reserved for internal action types
pub const RESERVED_PREFIX: &str = "@@";

/// A dispatched action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Fully-qualified action type, conventionally `<model>/<action>`
    #[serde(rename = "type")]
    pub action_type: String,

    /// Optional payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    /// Create an action with the given type and payload
    pub fn new(action_type: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }

    /// Create an action without a payload
    pub fn bare(action_type: impl Into<String>) -> Self {
        Self::new(action_type, None)
    }

    /// Create an action addressed to `model`'s `action` handler
    #[must_use]
    pub fn for_model(model: &str, action: &str, payload: Option<Value>) -> Self {
        Self::new(qualify(model, action), payload)
    }

    /// Payload, reading an absent payload as `null`
    #[must_use]
    pub fn payload_or_null(&self) -> Value {
        self.payload.clone().unwrap_or(Value::Null)
    }

    /// Model part of the type, if the type follows the `<model>/<action>` shape
    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        split_type(&self.action_type).map(|(model, _)| model)
    }

    /// Check if this is one of the store's internal actions
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.action_type.starts_with(RESERVED_PREFIX)
    }
}

/// Build the fully-qualified type for a model action
///
/// Keys that already contain the separator are treated as fully qualified
/// and returned verbatim.
#[must_use]
pub fn qualify(model: &str, action: &str) -> String {
    if is_qualified(action) {
        action.to_string()
    } else {
        format!("{model}{TYPE_SEPARATOR}{action}")
    }
}

/// Check if an action key already names another model's action
#[must_use]
pub fn is_qualified(action: &str) -> bool {
    action.contains(TYPE_SEPARATOR)
}

/// Split `<model>/<action>` at the first separator
#[must_use]
pub fn split_type(action_type: &str) -> Option<(&str, &str)> {
    action_type
        .split_once(TYPE_SEPARATOR)
        .filter(|(model, action)| !model.is_empty() && !action.is_empty())
}

//! Error types shared by every modelstore crate.
//!
//! Failures surface synchronously at the call site that triggered them:
//! store construction, `add_model`, `dispatch` or an exposed call. Nothing
//! here is logged-and-swallowed.

use thiserror::Error;

/// A model was rejected before anything was installed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The model name is empty
    #[error("model name is required")]
    MissingName,

    /// The model name contains the `/` action-type separator
    #[error("model name `{0}` must not contain `/`")]
    InvalidName(String),

    /// The model name uses the internal `@@` action namespace
    #[error("model name `{0}` is reserved")]
    ReservedName(String),

    /// A model with this name is already registered
    #[error("model `{0}` is already registered")]
    DuplicateModel(String),

    /// A reducer or effect key is not a usable action name
    #[error("model `{model}` declares an invalid action name `{action}`")]
    InvalidActionName {
        /// Model declaring the action
        model: String,
        /// Offending key
        action: String,
    },
}

/// Plugin extension points, used to say which hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `create_middleware`
    CreateMiddleware,
    /// `on_model`
    OnModel,
    /// `on_store_created`
    OnStoreCreated,
    /// `on_reducer`
    OnReducer,
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateMiddleware => write!(f, "create_middleware"),
            Self::OnModel => write!(f, "on_model"),
            Self::OnStoreCreated => write!(f, "on_store_created"),
            Self::OnReducer => write!(f, "on_reducer"),
        }
    }
}

/// Errors returned by store construction, dispatch and model registration
#[derive(Error, Debug)]
pub enum StoreError {
    /// A model failed validation
    #[error("invalid model: {0}")]
    Validation(#[from] ValidationError),

    /// A reducer, base reducer or effect handler failed
    ///
    /// Reducer failures leave the state untouched. Effect failures happen
    /// after the reducer phase committed, so that state stays committed.
    #[error("handler for `{action_type}` failed: {source}")]
    Handler {
        /// Type of the action being handled
        action_type: String,
        /// Error returned by the handler
        #[source]
        source: anyhow::Error,
    },

    /// A plugin hook failed
    #[error("plugin `{plugin}` failed in {hook}: {source}")]
    PluginHook {
        /// Name of the failing plugin
        plugin: String,
        /// Hook that failed
        hook: Hook,
        /// Error returned by the hook
        #[source]
        source: anyhow::Error,
    },

    /// No model with this name is registered
    #[error("model `{0}` is not registered")]
    UnknownModel(String),

    /// The model has no reducer or effect with this name
    #[error("model `{model}` has no action `{action}`")]
    UnknownAction {
        /// Model that was addressed
        model: String,
        /// Missing action name
        action: String,
    },

    /// No exposed property with this key
    #[error("store has no exposed property `{0}`")]
    UnknownProperty(String),

    /// The exposed property is a value, not a function
    #[error("exposed property `{0}` is not callable")]
    NotCallable(String),

    /// The exposed property is a function, not a value
    #[error("exposed property `{0}` is not a value")]
    NotAValue(String),

    /// An exposed function failed
    #[error("exposed function `{key}` failed: {source}")]
    Exposed {
        /// Key of the exposed function
        key: String,
        /// Error returned by the function
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    /// Wrap a handler failure for the given action type
    pub fn handler(action_type: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            action_type: action_type.into(),
            source,
        }
    }

    /// Wrap a plugin hook failure
    pub fn plugin_hook(plugin: impl Into<String>, hook: Hook, source: anyhow::Error) -> Self {
        Self::PluginHook {
            plugin: plugin.into(),
            hook,
            source,
        }
    }

    /// Check if this is a validation failure
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

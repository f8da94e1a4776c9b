//! Model validation.
//!
//! Runs before a model touches any store structure, so a rejected model
//! leaves nothing behind.

use crate::action::{split_type, RESERVED_PREFIX, TYPE_SEPARATOR};
use crate::error::ValidationError;
use crate::model::Model;

/// Check a model's own shape: name and action keys
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_model(model: &Model) -> Result<(), ValidationError> {
    let name = model.name();

    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(ValidationError::ReservedName(name.to_string()));
    }
    if name.contains(TYPE_SEPARATOR) {
        return Err(ValidationError::InvalidName(name.to_string()));
    }

    for key in model.reducers().keys() {
        // listener keys must name a full `<model>/<action>` type
        let valid = if key.contains(TYPE_SEPARATOR) {
            split_type(key).is_some()
        } else {
            !key.is_empty()
        };
        if !valid {
            return Err(invalid_action(name, key));
        }
    }

    // effects always belong to their own model
    if let Some(key) = model
        .effects()
        .keys()
        .find(|key| key.is_empty() || key.contains(TYPE_SEPARATOR))
    {
        return Err(invalid_action(name, key));
    }

    Ok(())
}

/// Check a model against the names already registered
///
/// # Errors
///
/// Returns [`ValidationError::DuplicateModel`] on a name collision, or any
/// error from [`validate_model`].
pub fn validate_new_model<'a, I>(model: &Model, registered: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    validate_model(model)?;

    if registered.into_iter().any(|existing| existing == model.name()) {
        return Err(ValidationError::DuplicateModel(model.name().to_string()));
    }

    Ok(())
}

fn invalid_action(model: &str, action: &str) -> ValidationError {
    ValidationError::InvalidActionName {
        model: model.to_string(),
        action: action.to_string(),
    }
}

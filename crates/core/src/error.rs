use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::workflow::ContentStatus;

/// Domain error shared by every layer of the application.
///
/// All variants are recoverable at the request boundary; the API layer maps
/// each one to an HTTP status and a stable error code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ContentStatus,
        to: ContentStatus,
    },

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("Image ingestion failed: {0}")]
    IngestFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] keyed by any displayable value.
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        CoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for a validation error on a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        CoreError::Validation(FieldErrors::single(field, message))
    }
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Field-level validation messages, keyed by field name.
///
/// Serializes as a plain JSON object (`{"title": ["must not be empty"]}`) so
/// the API can return it verbatim in the error `details`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Append a message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when empty, otherwise a [`CoreError::Validation`].
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(&field.to_string(), message);
            }
        }
        out
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "must not be empty"))]
        title: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn field_errors_display_lists_every_message() {
        let mut errors = FieldErrors::new();
        errors.add("title", "must not be empty");
        errors.add("body", "too short");
        assert_eq!(
            errors.to_string(),
            "body: too short; title: must not be empty"
        );
    }

    #[test]
    fn empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn validator_errors_keep_field_names() {
        let sample = Sample {
            title: String::new(),
            email: "nope".into(),
        };
        let errors: FieldErrors = sample.validate().unwrap_err().into();
        assert_eq!(errors.get("title").unwrap(), ["must not be empty"]);
        // No custom message: the validator code is used.
        assert_eq!(errors.get("email").unwrap(), ["email"]);
    }

    #[test]
    fn field_errors_serialize_as_object() {
        let errors = FieldErrors::single("title", "required");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"title": ["required"]}));
    }

    #[test]
    fn not_found_display() {
        let err = CoreError::not_found("Post", "hello-world");
        assert_eq!(err.to_string(), "Post not found: hello-world");
    }
}

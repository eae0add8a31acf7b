//! Error types for field and form validation.
//!
//! Validation *content* failures are not errors: a value that breaks its rules
//! comes back as an invalid [`ValidationResult`](crate::validation::ValidationResult).
//! The types here cover infrastructure failures and misuse.

use thiserror::Error;

/// Error raised by a [`RuleValidator`](crate::validation::RuleValidator) when
/// the validation call itself could not be carried out (malformed rule
/// expression, unreachable backend, ...).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidatorError {
    /// Error message
    pub message: String,
}

impl ValidatorError {
    /// Create a new validator error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ValidatorError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<String> for ValidatorError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ValidatorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors surfaced by fields and forms.
#[derive(Debug, Error)]
pub enum FormError {
    /// The external validator failed to run.
    #[error("Validator failed: {0}")]
    Validator(#[from] ValidatorError),

    /// A field value could not be converted into a JSON value.
    #[error("Value of field '{field}' could not be serialized: {source}")]
    Serialize {
        /// Name of the field whose value failed to serialize.
        field: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// Another field with the same name is already registered on the form.
    #[error("A different field named '{0}' is already registered")]
    DuplicateField(String),
}

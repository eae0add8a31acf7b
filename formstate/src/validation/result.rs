use serde::{Deserialize, Serialize};

/// Outcome of validating one value against its rules.
///
/// A value that breaks its rules is reported here, not as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the value satisfied every rule.
    pub valid: bool,
    /// Messages for the rules that failed, in rule order.
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// A passing result with no messages.
    pub fn passed() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing result carrying `errors`.
    pub fn failed<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            valid: false,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if the value passed validation.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Check if the value failed validation.
    pub fn is_invalid(&self) -> bool {
        !self.valid
    }

    /// Get the first error message (if any).
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

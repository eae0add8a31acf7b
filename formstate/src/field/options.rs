//! Field configuration.

use std::time::Duration;

use crate::form::Form;

/// Debounce delay used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Per-field configuration.
#[derive(Debug, Clone)]
pub struct FieldOptions {
    /// Commit the initial validation visibly (`validated`, errors) instead of
    /// only seeding `valid`/`invalid`.
    pub immediate: bool,

    /// Quiet period between the last change and the automatic validation.
    /// Zero disables debouncing.
    pub debounce: Duration,

    /// Form to register with. The field keeps only a weak reference.
    pub form: Option<Form>,

    /// Construction-time value of the `required` flag, restored on reset.
    pub required: bool,

    /// Drop results of validations that were overtaken by a later one
    /// instead of letting the last one to finish win.
    pub discard_stale: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            immediate: false,
            debounce: DEFAULT_DEBOUNCE,
            form: None,
            required: false,
            discard_stale: false,
        }
    }
}

impl FieldOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the initial validation is committed visibly.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Set the debounce delay.
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Register the field with `form`.
    pub fn form(mut self, form: &Form) -> Self {
        self.form = Some(form.clone());
        self
    }

    /// Mark the field as required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Discard results of overtaken validations.
    pub fn discard_stale(mut self, discard: bool) -> Self {
        self.discard_stale = discard;
        self
    }
}

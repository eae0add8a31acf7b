//! The seam to the external rule validator.

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::result::ValidationResult;
use super::rules::ResolvedRules;
use crate::error::ValidatorError;

/// Current values of a form's fields, keyed by field name.
pub type ValueRecords = BTreeMap<String, Value>;

/// What the validator gets to know about the field being validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationContext {
    /// Name of the field.
    pub name: String,
    /// Values of every field registered on the same form, this one included.
    /// Empty when the field is not attached to a form.
    pub values: ValueRecords,
}

/// An asynchronous rule validator.
///
/// Implementations interpret the rule expression and report whether `value`
/// satisfies it. They must not touch field or form state; a failing value is
/// reported through [`ValidationResult`], while `Err` is reserved for the
/// validator being unable to do its job.
#[async_trait]
pub trait RuleValidator: Send + Sync {
    async fn validate(
        &self,
        value: &Value,
        rules: &ResolvedRules,
        context: &ValidationContext,
    ) -> Result<ValidationResult, ValidatorError>;
}

/// Adapter turning an async closure into a [`RuleValidator`].
///
/// # Example
///
/// ```
/// use formstate::validation::{validator_fn, ValidationResult};
///
/// let validator = validator_fn(|value, rules, _cx| async move {
///     let required = rules.as_text() == Some("required");
///     if required && value.as_str().is_some_and(str::is_empty) {
///         Ok(ValidationResult::failed(["This field is required"]))
///     } else {
///         Ok(ValidationResult::passed())
///     }
/// });
/// # let _ = validator;
/// ```
pub fn validator_fn<F, Fut>(f: F) -> FnValidator<F>
where
    F: Fn(Value, ResolvedRules, ValidationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ValidationResult, ValidatorError>> + Send,
{
    FnValidator(f)
}

/// See [`validator_fn`].
pub struct FnValidator<F>(F);

#[async_trait]
impl<F, Fut> RuleValidator for FnValidator<F>
where
    F: Fn(Value, ResolvedRules, ValidationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ValidationResult, ValidatorError>> + Send,
{
    async fn validate(
        &self,
        value: &Value,
        rules: &ResolvedRules,
        context: &ValidationContext,
    ) -> Result<ValidationResult, ValidatorError> {
        (self.0)(value.clone(), rules.clone(), context.clone()).await
    }
}

impl<F> std::fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnValidator").finish_non_exhaustive()
    }
}

//! Validation results, rule expressions and the validator seam.
//!
//! Fields never interpret rules themselves. They resolve their [`Rules`] and
//! hand value, rules and a [`ValidationContext`] to a [`RuleValidator`].
//!
//! # Example
//!
//! ```
//! use formstate::validation::{validator_fn, RuleExpr, Rules, ValidationResult};
//! use serde_json::json;
//!
//! let rules: Rules = RuleExpr::map([("min", json!(3))]).into();
//! assert_eq!(rules.resolve().param("min"), Some(&json!(3)));
//!
//! let _validator = validator_fn(|value, rules, _cx| async move {
//!     let min = rules.param("min").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
//!     let len = value.as_str().map(|s| s.chars().count()).unwrap_or(0);
//!     if len >= min {
//!         Ok(ValidationResult::passed())
//!     } else {
//!         Ok(ValidationResult::failed([format!("Must be at least {min} characters")]))
//!     }
//! });
//! ```

mod result;
mod rules;
mod validator;

pub use result::ValidationResult;
pub use rules::{ResolvedRules, RuleExpr, RuleParam, Rules};
pub use validator::{FnValidator, RuleValidator, ValidationContext, ValueRecords, validator_fn};

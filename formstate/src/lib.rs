//! Reactive validation state for form fields and forms.
//!
//! A [`Field`](field::Field) watches a caller-owned [`State`](state::State)
//! cell, validates it through an external [`RuleValidator`](validation::RuleValidator)
//! after a debounce delay, and tracks flags such as `valid`, `dirty` and
//! `pending`. A [`Form`](form::Form) aggregates the flags of its registered
//! fields and gates submission on validity.

pub mod debounce;
pub mod error;
pub mod field;
pub mod flags;
pub mod form;
pub mod state;
pub mod subscription;
pub mod validation;

pub use error::{FormError, ValidatorError};

pub mod prelude {
    pub use crate::debounce::{Debounced, DebouncedCall, debounce};
    pub use crate::error::{FormError, ValidatorError};
    pub use crate::field::{DEFAULT_DEBOUNCE, Field, FieldId, FieldOptions, FieldValue};
    pub use crate::flags::{FieldFlags, Flag, FormFlags, Quantifier};
    pub use crate::form::{Form, FormField, FormOptions};
    pub use crate::state::State;
    pub use crate::subscription::Subscription;
    pub use crate::validation::{
        ResolvedRules, RuleExpr, RuleParam, RuleValidator, Rules, ValidationContext,
        ValidationResult, ValueRecords, validator_fn,
    };
}

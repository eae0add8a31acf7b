//! The validation flag vocabulary.
//!
//! A field carries ten primitive flags ([`FieldFlags`]); `passed` and `failed`
//! are derived from them. A form reduces each flag over its registered fields
//! with a fixed [`Quantifier`] into [`FormFlags`].

use serde::{Deserialize, Serialize};

/// A named facet of validation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Valid,
    Invalid,
    Validated,
    Dirty,
    Pristine,
    Pending,
    Touched,
    Untouched,
    Changed,
    Required,
    Passed,
    Failed,
}

impl Flag {
    /// Every flag, in vocabulary order.
    pub const ALL: [Flag; 12] = [
        Flag::Valid,
        Flag::Invalid,
        Flag::Validated,
        Flag::Dirty,
        Flag::Pristine,
        Flag::Pending,
        Flag::Touched,
        Flag::Untouched,
        Flag::Changed,
        Flag::Required,
        Flag::Passed,
        Flag::Failed,
    ];

    /// Lowercase flag name.
    pub fn name(self) -> &'static str {
        match self {
            Flag::Valid => "valid",
            Flag::Invalid => "invalid",
            Flag::Validated => "validated",
            Flag::Dirty => "dirty",
            Flag::Pristine => "pristine",
            Flag::Pending => "pending",
            Flag::Touched => "touched",
            Flag::Untouched => "untouched",
            Flag::Changed => "changed",
            Flag::Required => "required",
            Flag::Passed => "passed",
            Flag::Failed => "failed",
        }
    }

    /// How this flag is aggregated across the fields of a form.
    pub fn quantifier(self) -> Quantifier {
        match self {
            Flag::Valid
            | Flag::Pristine
            | Flag::Untouched
            | Flag::Validated
            | Flag::Passed => Quantifier::Every,
            Flag::Invalid
            | Flag::Dirty
            | Flag::Touched
            | Flag::Pending
            | Flag::Changed
            | Flag::Failed
            | Flag::Required => Quantifier::Some,
        }
    }

    /// Whether the flag is computed from other flags rather than stored.
    pub fn is_derived(self) -> bool {
        matches!(self, Flag::Passed | Flag::Failed)
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reduction used to fold a per-field flag into a form-level flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Logical AND; `true` over no fields.
    Every,
    /// Logical OR; `false` over no fields.
    Some,
}

impl Quantifier {
    /// Fold a sequence of booleans.
    pub fn reduce(self, values: impl IntoIterator<Item = bool>) -> bool {
        let mut values = values.into_iter();
        match self {
            Quantifier::Every => values.all(|v| v),
            Quantifier::Some => values.any(|v| v),
        }
    }
}

/// Primitive validation flags of a single field.
///
/// `dirty`/`pristine` and `touched`/`untouched` are kept as complements by
/// the field; `valid` and `invalid` are both `false` until the first result
/// is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlags {
    pub valid: bool,
    pub invalid: bool,
    pub validated: bool,
    pub dirty: bool,
    pub pristine: bool,
    pub pending: bool,
    pub touched: bool,
    pub untouched: bool,
    pub changed: bool,
    pub required: bool,
}

impl FieldFlags {
    /// Construction-time defaults.
    pub fn new(required: bool) -> Self {
        Self {
            valid: false,
            invalid: false,
            validated: false,
            dirty: false,
            pristine: true,
            pending: false,
            touched: false,
            untouched: true,
            changed: false,
            required,
        }
    }

    /// Validated and found valid.
    pub fn passed(&self) -> bool {
        self.valid && self.validated
    }

    /// Validated and found invalid.
    pub fn failed(&self) -> bool {
        self.invalid && self.validated
    }

    /// Read any flag, derived ones included.
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Valid => self.valid,
            Flag::Invalid => self.invalid,
            Flag::Validated => self.validated,
            Flag::Dirty => self.dirty,
            Flag::Pristine => self.pristine,
            Flag::Pending => self.pending,
            Flag::Touched => self.touched,
            Flag::Untouched => self.untouched,
            Flag::Changed => self.changed,
            Flag::Required => self.required,
            Flag::Passed => self.passed(),
            Flag::Failed => self.failed(),
        }
    }

    pub(crate) fn set_validity(&mut self, valid: bool) {
        self.valid = valid;
        self.invalid = !valid;
    }
}

impl Default for FieldFlags {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Aggregated flags of a form.
///
/// Unlike [`FieldFlags`], `passed` and `failed` are stored: they are reduced
/// from each field's derived value, not derived from the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFlags {
    pub valid: bool,
    pub invalid: bool,
    pub validated: bool,
    pub dirty: bool,
    pub pristine: bool,
    pub pending: bool,
    pub touched: bool,
    pub untouched: bool,
    pub changed: bool,
    pub required: bool,
    pub passed: bool,
    pub failed: bool,
}

impl FormFlags {
    /// Reduce the flags of every field with each flag's quantifier.
    pub fn aggregate<'a>(fields: impl IntoIterator<Item = &'a FieldFlags>) -> Self {
        let fields: Vec<&FieldFlags> = fields.into_iter().collect();
        let reduce = |flag: Flag| flag.quantifier().reduce(fields.iter().map(|f| f.get(flag)));

        Self {
            valid: reduce(Flag::Valid),
            invalid: reduce(Flag::Invalid),
            validated: reduce(Flag::Validated),
            dirty: reduce(Flag::Dirty),
            pristine: reduce(Flag::Pristine),
            pending: reduce(Flag::Pending),
            touched: reduce(Flag::Touched),
            untouched: reduce(Flag::Untouched),
            changed: reduce(Flag::Changed),
            required: reduce(Flag::Required),
            passed: reduce(Flag::Passed),
            failed: reduce(Flag::Failed),
        }
    }

    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Valid => self.valid,
            Flag::Invalid => self.invalid,
            Flag::Validated => self.validated,
            Flag::Dirty => self.dirty,
            Flag::Pristine => self.pristine,
            Flag::Pending => self.pending,
            Flag::Touched => self.touched,
            Flag::Untouched => self.untouched,
            Flag::Changed => self.changed,
            Flag::Required => self.required,
            Flag::Passed => self.passed,
            Flag::Failed => self.failed,
        }
    }
}

impl Default for FormFlags {
    /// Flags of a form with no registered fields.
    fn default() -> Self {
        Self::aggregate(std::iter::empty())
    }
}

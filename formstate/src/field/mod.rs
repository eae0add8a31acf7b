//! Field controller: one observed value, its rules, flags and errors.

mod options;

pub use options::{DEFAULT_DEBOUNCE, FieldOptions};

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::debounce::{Debounced, debounce};
use crate::error::FormError;
use crate::flags::{FieldFlags, Flag};
use crate::form::{FormField, WeakForm};
use crate::state::State;
use crate::subscription::{Listeners, Subscription};
use crate::validation::{RuleValidator, Rules, ValidationContext, ValidationResult, ValueRecords};

/// Types a field can hold.
pub trait FieldValue: Clone + PartialEq + Serialize + Send + Sync + 'static {}

impl<T> FieldValue for T where T: Clone + PartialEq + Serialize + Send + Sync + 'static {}

/// Unique identifier for a field instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(usize);

impl FieldId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__field_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldState {
    flags: FieldFlags,
    errors: Vec<String>,
}

struct FieldInner<T> {
    id: FieldId,
    name: String,
    value: State<T>,
    /// Value at construction, compared against to compute `changed`.
    initial: T,
    rules: Rules,
    validator: Arc<dyn RuleValidator>,
    form: Option<WeakForm>,
    required: bool,
    discard_stale: bool,
    state: RwLock<FieldState>,
    /// Sequence number of the most recently started validation.
    issued: AtomicU64,
    listeners: Listeners<FieldFlags>,
    trigger: Debounced<(), ()>,
    subscriptions: Mutex<Vec<Subscription>>,
}

/// A validated form field.
///
/// `Field<T>` watches a caller-owned [`State<T>`] and its [`Rules`]. Every
/// change schedules a debounced validation; results are committed into the
/// field's flags and error list. The handle is cheap to clone; the watch
/// subscriptions are released when the last clone is dropped.
///
/// # Example
///
/// ```ignore
/// let email = State::new(String::new());
/// let field = Field::new("email", email.clone(), "required", validator, FieldOptions::new()).await?;
///
/// email.set("a@b.com".to_string());
/// // ...after the debounce delay
/// assert!(field.flags().valid);
/// ```
pub struct Field<T> {
    inner: Arc<FieldInner<T>>,
}

impl<T: FieldValue> Field<T> {
    /// Create a field and run its initial validation.
    ///
    /// The initial pass validates the value as it is now. With
    /// `options.immediate` the result is committed like any other;
    /// otherwise only `valid`/`invalid` are seeded, so the field does not
    /// look validated yet. If `options.form` is set the field is registered
    /// with it afterwards.
    pub async fn new(
        name: impl Into<String>,
        value: State<T>,
        rules: impl Into<Rules>,
        validator: Arc<dyn RuleValidator>,
        options: FieldOptions,
    ) -> Result<Self, FormError> {
        let name = name.into();
        let rules = rules.into();
        let initial = value.get();

        let inner = Arc::new_cyclic(|weak: &Weak<FieldInner<T>>| {
            let weak = weak.clone();
            let trigger = debounce(
                options.debounce,
                move |()| {
                    let weak = weak.clone();
                    async move {
                        if let Some(inner) = weak.upgrade() {
                            Field { inner }.validate_in_background().await;
                        }
                    }
                },
                None,
            );

            FieldInner {
                id: FieldId::new(),
                name,
                value,
                initial,
                rules,
                validator,
                form: options.form.as_ref().map(|form| form.downgrade()),
                required: options.required,
                discard_stale: options.discard_stale,
                state: RwLock::new(FieldState {
                    flags: FieldFlags::new(options.required),
                    errors: Vec::new(),
                }),
                issued: AtomicU64::new(0),
                listeners: Listeners::new(),
                trigger,
                subscriptions: Mutex::new(Vec::new()),
            }
        });

        let field = Field { inner };
        field.watch();
        field.validate_initial(options.immediate).await?;

        if let Some(form) = &options.form {
            form.register(&field)?;
        }

        Ok(field)
    }

    fn watch(&self) {
        let weak = Arc::downgrade(&self.inner);
        let on_change: Arc<dyn Fn() + Send + Sync> = Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                log::trace!("Field '{}' changed, scheduling validation", inner.name);
                let _ = inner.trigger.call(());
            }
        });

        let mut subscriptions = vec![self.inner.value.subscribe({
            let on_change = Arc::clone(&on_change);
            move |_: &T| on_change()
        })];
        subscriptions.extend(self.inner.rules.watch(on_change));

        if let Ok(mut guard) = self.inner.subscriptions.lock() {
            *guard = subscriptions;
        }
    }

    async fn validate_initial(&self, immediate: bool) -> Result<(), FormError> {
        let inner = &self.inner;
        let value = to_json(&inner.name, &inner.initial)?;
        let context = inner.context()?;
        let result = inner
            .validator
            .validate(&value, &inner.rules.resolve(), &context)
            .await?;

        if immediate {
            inner.commit(&result);
        } else {
            inner.update_state(|state| state.flags.set_validity(result.valid));
        }
        log::debug!(
            "Initial validation of field '{}': valid={}",
            inner.name,
            result.valid
        );
        Ok(())
    }

    /// Validate the current value now.
    ///
    /// `pending` is raised and the value, rules and sibling values are read
    /// before this returns, ahead of any async work. The returned future
    /// resolves once the validator has answered and the result is committed.
    /// Validator failures are returned as errors and leave `pending` raised.
    pub fn validate(
        &self,
    ) -> impl Future<Output = Result<ValidationResult, FormError>> + Send + use<T> {
        let inner = Arc::clone(&self.inner);
        let seq = inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        inner.update_state(|state| state.flags.pending = true);

        let input = inner
            .value
            .with(|value| to_json(&inner.name, value))
            .and_then(|value| Ok((value, inner.rules.resolve(), inner.context()?)));

        async move {
            let (value, rules, context) = input?;

            log::debug!("Validating field '{}' (#{})", inner.name, seq);
            let result = inner.validator.validate(&value, &rules, &context).await?;

            if inner.discard_stale && inner.issued.load(Ordering::SeqCst) != seq {
                log::debug!(
                    "Discarding result #{} of field '{}', a newer validation is running",
                    seq,
                    inner.name
                );
            } else {
                inner.commit(&result);
            }
            Ok(result)
        }
    }

    async fn validate_in_background(self) {
        if let Err(e) = self.validate().await {
            log::warn!("Validation of field '{}' failed: {}", self.inner.name, e);
        }
    }

    /// Mark the field as touched.
    pub fn on_blur(&self) {
        self.inner.update_state(|state| {
            state.flags.touched = true;
            state.flags.untouched = false;
        });
    }

    /// Mark the field as dirty.
    pub fn on_input(&self) {
        self.inner.update_state(|state| {
            state.flags.dirty = true;
            state.flags.pristine = false;
        });
    }

    /// Restore every flag to its construction-time default and clear the
    /// errors. The value and its initial snapshot are kept.
    pub fn reset(&self) {
        let required = self.inner.required;
        self.inner.update_state(|state| {
            state.flags = FieldFlags::new(required);
            state.errors.clear();
        });
        log::debug!("Reset field '{}'", self.inner.name);
    }

    /// Subscribe to flag or error changes.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FieldFlags) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(callback)
    }

    pub fn id(&self) -> FieldId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get a clone of the current value
    pub fn value(&self) -> T {
        self.inner.value.get()
    }

    /// The observed value cell
    pub fn value_handle(&self) -> &State<T> {
        &self.inner.value
    }

    /// The value the field was created with
    pub fn initial_value(&self) -> &T {
        &self.inner.initial
    }

    pub fn rules(&self) -> &Rules {
        &self.inner.rules
    }

    /// Snapshot of the primitive flags
    pub fn flags(&self) -> FieldFlags {
        self.inner.read_state(|state| state.flags)
    }

    /// Read a single flag, derived ones included
    pub fn flag(&self, flag: Flag) -> bool {
        self.flags().get(flag)
    }

    /// Error messages of the last committed result
    pub fn errors(&self) -> Vec<String> {
        self.inner.read_state(|state| state.errors.clone())
    }
}

impl Field<String> {
    /// Create a text field over a fresh empty cell with default options.
    pub async fn with_rules(
        name: impl Into<String>,
        rules: impl Into<Rules>,
        validator: Arc<dyn RuleValidator>,
    ) -> Result<Self, FormError> {
        Self::new(
            name,
            State::new(String::new()),
            rules,
            validator,
            FieldOptions::default(),
        )
        .await
    }
}

impl<T: FieldValue> FieldInner<T> {
    fn read_state<R>(&self, f: impl FnOnce(&FieldState) -> R) -> R {
        match self.state.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// Apply `f` and notify listeners if anything changed.
    fn update_state(&self, f: impl FnOnce(&mut FieldState)) {
        let flags = {
            let Ok(mut guard) = self.state.write() else {
                return;
            };
            let before = guard.clone();
            f(&mut guard);
            if *guard == before {
                return;
            }
            guard.flags
        };
        self.listeners.notify(&flags);
    }

    /// Apply a validation result.
    fn commit(&self, result: &ValidationResult) {
        // Compared against the live value, which may have moved on since the
        // validation started.
        let changed = self.value.with(|current| *current != self.initial);
        self.update_state(|state| {
            state.errors = result.errors.clone();
            state.flags.changed = changed;
            state.flags.set_validity(result.valid);
            state.flags.validated = true;
            state.flags.pending = false;
        });
    }

    fn context(&self) -> Result<ValidationContext, FormError> {
        let values = match self.form.as_ref().and_then(WeakForm::upgrade) {
            Some(form) => form.value_records()?,
            None => ValueRecords::new(),
        };
        Ok(ValidationContext {
            name: self.name.clone(),
            values,
        })
    }
}

fn to_json<T: Serialize>(name: &str, value: &T) -> Result<Value, FormError> {
    serde_json::to_value(value).map_err(|source| FormError::Serialize {
        field: name.to_string(),
        source,
    })
}

impl<T: FieldValue> FormField for Field<T> {
    fn id(&self) -> FieldId {
        self.inner.id
    }

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn flags(&self) -> FieldFlags {
        Field::flags(self)
    }

    fn errors(&self) -> Vec<String> {
        Field::errors(self)
    }

    fn value_json(&self) -> Result<Value, FormError> {
        self.inner.value.with(|value| to_json(&self.inner.name, value))
    }

    fn validate(&self) -> BoxFuture<'static, Result<ValidationResult, FormError>> {
        Box::pin(Field::validate(self))
    }

    fn reset(&self) {
        Field::reset(self)
    }

    fn subscribe(&self, callback: Box<dyn Fn(&FieldFlags) + Send + Sync>) -> Subscription {
        self.inner.listeners.subscribe(callback)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Field");
        s.field("id", &self.inner.id).field("name", &self.inner.name);
        if let Ok(state) = self.inner.state.read() {
            s.field("flags", &state.flags).field("errors", &state.errors);
        }
        s.finish_non_exhaustive()
    }
}

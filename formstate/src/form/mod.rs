//! Form controller: an ordered set of fields and their aggregated flags.
//!
//! # Example
//!
//! ```ignore
//! let form = Form::new(FormOptions::new());
//! let email = Field::new("email", email_value, "required", validator.clone(), FieldOptions::new().form(&form)).await?;
//! let name = Field::new("name", name_value, "required", validator, FieldOptions::new().form(&form)).await?;
//!
//! let submitted = form
//!     .handle_submit(|| async { save(form.value_records()) })
//!     .await?;
//! ```

mod options;

pub use options::{FormOptions, SubmitHandler};

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock, Weak};

use futures::future::{BoxFuture, join_all};
use serde_json::Value;

use crate::error::FormError;
use crate::field::FieldId;
use crate::flags::{FieldFlags, Flag, FormFlags};
use crate::subscription::{Listeners, Subscription};
use crate::validation::{ValidationResult, ValueRecords};

/// Type-erased view of a field, as seen by its form.
///
/// Implemented by [`Field`](crate::field::Field); forms hold fields of
/// different value types through this trait.
pub trait FormField: Send + Sync {
    fn id(&self) -> FieldId;

    fn name(&self) -> &str;

    fn flags(&self) -> FieldFlags;

    fn errors(&self) -> Vec<String>;

    /// Current value as JSON.
    fn value_json(&self) -> Result<Value, FormError>;

    /// Start a validation; `pending` is raised before this returns.
    fn validate(&self) -> BoxFuture<'static, Result<ValidationResult, FormError>>;

    fn reset(&self);

    /// Subscribe to flag or error changes.
    fn subscribe(&self, callback: Box<dyn Fn(&FieldFlags) + Send + Sync>) -> Subscription;
}

struct Registration {
    field: Arc<dyn FormField>,
    _subscription: Subscription,
}

struct FormInner {
    fields: RwLock<Vec<Registration>>,
    /// Aggregate of the registered fields' flags, refreshed on every change.
    flags: RwLock<FormFlags>,
    listeners: Listeners<FormFlags>,
    options: FormOptions,
}

/// A form: registered fields plus aggregated validation state.
///
/// Cheap to clone; all clones share the same registration list. Fields hold
/// only a [`WeakForm`], so a form and its fields never keep each other alive.
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

/// Weak reference to a [`Form`].
#[derive(Clone)]
pub struct WeakForm {
    inner: Weak<FormInner>,
}

impl WeakForm {
    pub fn upgrade(&self) -> Option<Form> {
        self.inner.upgrade().map(|inner| Form { inner })
    }
}

impl std::fmt::Debug for WeakForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakForm")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Form {
    /// Create an empty form
    pub fn new(options: FormOptions) -> Self {
        Self {
            inner: Arc::new(FormInner {
                fields: RwLock::new(Vec::new()),
                flags: RwLock::new(FormFlags::default()),
                listeners: Listeners::new(),
                options,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakForm {
        WeakForm {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Append a field to the registration list.
    ///
    /// Registering the same field twice is a no-op. Registering a different
    /// field under a name that is already taken fails with
    /// [`FormError::DuplicateField`].
    pub fn register<F>(&self, field: &F) -> Result<(), FormError>
    where
        F: FormField + Clone + 'static,
    {
        let id = field.id();
        let name = field.name().to_string();

        {
            let mut fields = self.inner.fields.write().unwrap_or_else(|p| p.into_inner());
            if fields.iter().any(|r| r.field.id() == id) {
                return Ok(());
            }
            if fields.iter().any(|r| r.field.name() == name) {
                log::warn!("Rejected duplicate registration of field '{}'", name);
                return Err(FormError::DuplicateField(name));
            }

            let weak = Arc::downgrade(&self.inner);
            let subscription = field.subscribe(Box::new(move |_: &FieldFlags| {
                if let Some(inner) = weak.upgrade() {
                    inner.refresh();
                }
            }));

            fields.push(Registration {
                field: Arc::new(field.clone()),
                _subscription: subscription,
            });
        }

        log::debug!("Registered field '{}'", name);
        self.inner.refresh();
        Ok(())
    }

    /// Names of the registered fields, in registration order
    pub fn field_names(&self) -> Vec<String> {
        self.inner
            .snapshot()
            .iter()
            .map(|field| field.name().to_string())
            .collect()
    }

    /// Check if a field with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .fields
            .read()
            .map(|fields| fields.iter().any(|r| r.field.name() == name))
            .unwrap_or(false)
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        self.inner.fields.read().map(|fields| fields.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current value of every registered field, read fresh.
    pub fn value_records(&self) -> Result<ValueRecords, FormError> {
        self.inner
            .snapshot()
            .iter()
            .map(|field| -> Result<(String, Value), FormError> {
                Ok((field.name().to_string(), field.value_json()?))
            })
            .collect()
    }

    /// Current errors of every registered field, read fresh.
    pub fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.inner
            .snapshot()
            .iter()
            .map(|field| (field.name().to_string(), field.errors()))
            .collect()
    }

    /// Aggregated flags
    pub fn flags(&self) -> FormFlags {
        self.inner
            .flags
            .read()
            .map(|flags| *flags)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    /// Read a single aggregated flag
    pub fn flag(&self, flag: Flag) -> bool {
        self.flags().get(flag)
    }

    /// Subscribe to changes of the aggregated flags.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FormFlags) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(callback)
    }

    /// Validate every field concurrently.
    ///
    /// All fields are validated even when some fail. Returns whether every
    /// result was valid; if a validator itself fails, the first such error
    /// is returned once all validations have settled.
    pub async fn validate(&self) -> Result<bool, FormError> {
        let fields = self.inner.snapshot();
        log::debug!("Validating form with {} field(s)", fields.len());

        let results = join_all(fields.iter().map(|field| field.validate())).await;

        let mut all_valid = true;
        for result in results {
            all_valid &= result?.valid;
        }
        Ok(all_valid)
    }

    /// Reset every field, in registration order.
    pub fn reset(&self) {
        for field in self.inner.snapshot() {
            field.reset();
        }
    }

    /// Validate, then run `callback` if every field is valid.
    ///
    /// Returns `Ok(None)` without calling `callback` when validation fails.
    pub async fn handle_submit<F, Fut, R>(&self, callback: F) -> Result<Option<R>, FormError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        if !self.validate().await? {
            log::debug!("Form is invalid, skipping submit callback");
            return Ok(None);
        }
        Ok(Some(callback().await))
    }

    /// Validate, then run the configured [`FormOptions::on_submit`] handler
    /// if every field is valid.
    ///
    /// Returns whether the handler ran; without a handler this only
    /// validates.
    pub async fn submit(&self) -> Result<bool, FormError> {
        let valid = self.validate().await?;
        match &self.inner.options.on_submit {
            Some(handler) if valid => {
                handler().await;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new(FormOptions::default())
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("fields", &self.field_names())
            .field("flags", &self.flags())
            .finish()
    }
}

impl FormInner {
    fn snapshot(&self) -> Vec<Arc<dyn FormField>> {
        let fields = self.fields.read().unwrap_or_else(|p| p.into_inner());
        fields.iter().map(|r| Arc::clone(&r.field)).collect()
    }

    /// Recompute the aggregate and notify listeners if it changed.
    fn refresh(&self) {
        let changed = {
            let mut cached = self.flags.write().unwrap_or_else(|p| p.into_inner());
            let flags: Vec<FieldFlags> = self.snapshot().iter().map(|f| f.flags()).collect();
            let next = FormFlags::aggregate(&flags);
            if *cached == next {
                None
            } else {
                *cached = next;
                Some(next)
            }
        };

        if let Some(flags) = changed {
            self.listeners.notify(&flags);
        }
    }
}

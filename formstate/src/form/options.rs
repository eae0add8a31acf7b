//! Form configuration.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

/// Callback run by [`Form::submit`](super::Form::submit) once every field is
/// valid.
pub type SubmitHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Per-form configuration.
#[derive(Clone, Default)]
pub struct FormOptions {
    /// Submit callback. Without one, `submit` validates and stops there.
    pub on_submit: Option<SubmitHandler>,
}

impl FormOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the submit callback.
    pub fn on_submit<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_submit = Some(Arc::new(move || Box::pin(handler())));
        self
    }
}

impl std::fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormOptions")
            .field("on_submit", &self.on_submit.is_some())
            .finish()
    }
}

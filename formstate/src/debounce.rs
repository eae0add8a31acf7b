//! Cancellable, delayed invocation of a single-argument async function.
//!
//! Each call to a [`Debounced`] wrapper cancels the timer armed by the
//! previous call and arms a new one, so within a burst of calls only the last
//! one runs, with its own argument, once the delay has elapsed.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

type DebouncedFn<A, R> = Box<dyn Fn(A) -> BoxFuture<'static, R> + Send + Sync>;

/// Wrap `f` so that calls are delayed by `delay` and coalesced.
///
/// If `token` is given and gets cancelled, calls whose timer has not fired
/// yet are dropped without running `f`. With a zero `delay` there is no
/// timer: every call runs `f` straight away and the token is not consulted.
///
/// Calls must be made from within a tokio runtime.
pub fn debounce<A, R, F, Fut>(
    delay: Duration,
    f: F,
    token: Option<CancellationToken>,
) -> Debounced<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    Debounced {
        inner: Arc::new(DebouncedInner {
            delay,
            func: Box::new(move |arg| Box::pin(f(arg))),
            token: token.unwrap_or_default(),
            timer: Mutex::new(PendingTimer::default()),
        }),
    }
}

/// A debounced function handle.
///
/// Cheap to clone; clones share the same pending timer.
pub struct Debounced<A, R> {
    inner: Arc<DebouncedInner<A, R>>,
}

struct DebouncedInner<A, R> {
    delay: Duration,
    func: DebouncedFn<A, R>,
    token: CancellationToken,
    timer: Mutex<PendingTimer>,
}

/// The single timer a wrapper may have armed at any time.
#[derive(Default)]
struct PendingTimer {
    generation: u64,
    superseded: Option<CancellationToken>,
}

impl<A: Send + 'static, R: Send + 'static> Debounced<A, R> {
    /// Schedule a call with `arg`, superseding any call still waiting.
    ///
    /// The returned [`DebouncedCall`] may be awaited for the result or simply
    /// dropped; the call runs either way.
    pub fn call(&self, arg: A) -> DebouncedCall<R> {
        let (tx, rx) = oneshot::channel();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("Debounced call requested outside a tokio runtime; dropping it");
                return DebouncedCall { rx };
            }
        };

        if self.inner.delay.is_zero() {
            let fut = (self.inner.func)(arg);
            handle.spawn(async move {
                let _ = tx.send(fut.await);
            });
            return DebouncedCall { rx };
        }

        let superseded = CancellationToken::new();
        let generation = {
            let mut timer = self.inner.timer.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(previous) = timer.superseded.replace(superseded.clone()) {
                log::trace!("Debounce timer superseded");
                previous.cancel();
            }
            timer.generation += 1;
            timer.generation
        };

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            tokio::select! {
                biased;
                _ = superseded.cancelled() => return,
                _ = inner.token.cancelled() => {
                    log::trace!("Debounced call cancelled by token");
                    return;
                }
                _ = tokio::time::sleep(inner.delay) => {}
            }

            {
                let mut timer = inner.timer.lock().unwrap_or_else(|p| p.into_inner());
                if timer.generation == generation {
                    timer.superseded = None;
                }
            }

            if inner.token.is_cancelled() {
                return;
            }

            let result = (inner.func)(arg).await;
            let _ = tx.send(result);
        });

        DebouncedCall { rx }
    }

    /// Drop the call currently waiting on its timer, if any.
    pub fn cancel(&self) {
        let mut timer = self.inner.timer.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(pending) = timer.superseded.take() {
            pending.cancel();
        }
    }

    /// Check if a call is waiting on its timer
    pub fn is_pending(&self) -> bool {
        self.inner
            .timer
            .lock()
            .map(|timer| timer.superseded.is_some())
            .unwrap_or(false)
    }

    /// The configured delay
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// The token that suppresses calls still waiting on their timer
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }
}

impl<A, R> Clone for Debounced<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> std::fmt::Debug for Debounced<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounced")
            .field("delay", &self.inner.delay)
            .field("cancelled", &self.inner.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Outcome of one [`Debounced::call`].
///
/// Resolves to `Some(result)` once the wrapped function has run for this
/// call, or `None` if the call was superseded or cancelled.
#[derive(Debug)]
pub struct DebouncedCall<R> {
    rx: oneshot::Receiver<R>,
}

impl<R> Future for DebouncedCall<R> {
    type Output = Option<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

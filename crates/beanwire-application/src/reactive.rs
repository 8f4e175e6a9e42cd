//! Reactive Bridge
//!
//! [`Reactive`] is a push-based result cell. Producers complete it once;
//! consumers either subscribe a callback or convert it into a future or a
//! single-item stream.
//!
//! Delivery rules:
//!
//! - every subscriber receives exactly one notification
//! - the notification is either the value or the error, never both
//! - subscribing to a completed result delivers synchronously on the
//!   subscribing thread
//! - subscribing before completion delivers on the completing thread

use std::future::Future;
use std::sync::Arc;

use beanwire_domain::error::{Error, Result};
use futures::FutureExt;
use futures::StreamExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use parking_lot::Mutex;

type Subscriber<T> = Box<dyn FnOnce(Result<T>) + Send>;

enum Slot<T> {
    Pending(Vec<Subscriber<T>>),
    Done(Result<T>),
}

struct State<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Clone + Send + 'static> State<T> {
    fn complete(&self, result: Result<T>) -> bool {
        let subscribers = {
            let mut slot = self.slot.lock();
            match &mut *slot {
                Slot::Done(_) => return false,
                Slot::Pending(subscribers) => {
                    let subscribers = std::mem::take(subscribers);
                    *slot = Slot::Done(result.clone());
                    subscribers
                }
            }
        };
        for subscriber in subscribers {
            subscriber(result.clone());
        }
        true
    }
}

/// Result of an asynchronous remote call, delivered by push
pub struct Reactive<T> {
    state: Arc<State<T>>,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> Reactive<T> {
    /// Pending result and the handle that completes it
    pub fn pending() -> (Self, Completer<T>) {
        let state = Arc::new(State {
            slot: Mutex::new(Slot::Pending(Vec::new())),
        });
        let completer = Completer {
            state: Some(Arc::clone(&state)),
        };
        (Self { state }, completer)
    }

    /// Already completed result
    pub fn completed(result: Result<T>) -> Self {
        Self {
            state: Arc::new(State {
                slot: Mutex::new(Slot::Done(result)),
            }),
        }
    }

    /// Drive `future` on the current tokio runtime and complete with its output
    ///
    /// Outside a runtime the result completes immediately with an internal
    /// error.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return Self::completed(Err(Error::internal(
                "asynchronous call submitted outside a tokio runtime",
            )));
        };
        let (reactive, completer) = Self::pending();
        runtime.spawn(async move {
            completer.complete(future.await);
        });
        reactive
    }

    /// Register a callback for the outcome
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let ready = {
            let mut slot = self.state.slot.lock();
            match &mut *slot {
                Slot::Done(result) => result.clone(),
                Slot::Pending(subscribers) => {
                    subscribers.push(Box::new(subscriber));
                    return;
                }
            }
        };
        subscriber(ready);
    }

    /// Whether the outcome is known
    pub fn is_done(&self) -> bool {
        matches!(*self.state.slot.lock(), Slot::Done(_))
    }

    /// Outcome, if already known
    pub fn try_get(&self) -> Option<Result<T>> {
        match &*self.state.slot.lock() {
            Slot::Done(result) => Some(result.clone()),
            Slot::Pending(_) => None,
        }
    }

    /// Future resolving to the outcome
    pub fn into_future(self) -> BoxFuture<'static, Result<T>> {
        let (tx, rx) = oneshot::channel();
        self.subscribe(move |result| {
            let _ = tx.send(result);
        });
        rx.map(|received| {
            received.unwrap_or_else(|_| Err(Error::internal("reactive result was abandoned")))
        })
        .boxed()
    }

    /// Stream yielding the outcome once
    pub fn into_stream(self) -> BoxStream<'static, Result<T>> {
        futures::stream::once(self.into_future()).boxed()
    }

    /// Transform the value once it arrives
    pub fn map<U, F>(&self, f: F) -> Reactive<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let (mapped, completer) = Reactive::pending();
        self.subscribe(move |result| completer.complete(result.map(f)));
        mapped
    }
}

impl<T> std::fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let done = matches!(*self.state.slot.lock(), Slot::Done(_));
        f.debug_struct("Reactive").field("done", &done).finish()
    }
}

/// Completes a pending [`Reactive`]
///
/// Dropping an unused completer completes the result with an error so
/// subscribers are never left waiting.
pub struct Completer<T: Clone + Send + 'static> {
    state: Option<Arc<State<T>>>,
}

impl<T: Clone + Send + 'static> Completer<T> {
    /// Deliver the outcome to all current and future subscribers
    pub fn complete(mut self, result: Result<T>) {
        if let Some(state) = self.state.take() {
            state.complete(result);
        }
    }
}

impl<T: Clone + Send + 'static> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.complete(Err(Error::internal(
                "reactive result dropped before completion",
            )));
        }
    }
}

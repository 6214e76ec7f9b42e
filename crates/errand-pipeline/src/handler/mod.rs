//! Handler values and the continuation passed to them.

use std::fmt;
use std::sync::Arc;

type HandlerFn<S, P, R> = dyn Fn(&mut S, P, Next<'_, S, P, R>) -> R + Send + Sync;

/// A wrapping handler for one operation.
///
/// A handler receives the owner of the operation, the call parameters and a
/// [`Next`] continuation. It may call the continuation any number of times,
/// including not at all, and returns the operation's result.
///
/// Handlers are compared by identity: clones of one handler are equal to
/// each other, while two handlers built from identical closures are not.
/// Keep a clone of a handler to remove it later.
pub struct Handler<S, P, R> {
    inner: Arc<HandlerFn<S, P, R>>,
}

impl<S, P, R> Handler<S, P, R> {
    /// Wraps a closure as a handler.
    #[must_use]
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut S, P, Next<'_, S, P, R>) -> R + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(handler),
        }
    }

    /// Returns `true` when both values refer to the same registered handler.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn call(&self, owner: &mut S, params: P, next: Next<'_, S, P, R>) -> R {
        (self.inner)(owner, params, next)
    }
}

impl<S, P, R> Clone for Handler<S, P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, P, R> PartialEq for Handler<S, P, R> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<S, P, R> Eq for Handler<S, P, R> {}

impl<S, P, R> fmt::Debug for Handler<S, P, R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Continuation that runs the remainder of a handler chain.
///
/// Calling [`Next::run`] invokes the handlers registered after the current
/// one and, once every one of them forwards, the terminal default. The
/// continuation is `Copy`, so a handler may run the remainder several times.
pub struct Next<'a, S, P, R> {
    rest: &'a [Handler<S, P, R>],
    terminal: &'a dyn Fn(&mut S, P) -> R,
}

impl<'a, S, P, R> Next<'a, S, P, R> {
    pub(crate) const fn new(rest: &'a [Handler<S, P, R>], terminal: &'a dyn Fn(&mut S, P) -> R) -> Self {
        Self { rest, terminal }
    }

    /// Runs the remaining handlers and the default with `params`.
    pub fn run(self, owner: &mut S, params: P) -> R {
        run_chain(self.rest, self.terminal, owner, params)
    }

    /// Number of handlers still to run before the default.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.rest.len()
    }
}

impl<S, P, R> Clone for Next<'_, S, P, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, P, R> Copy for Next<'_, S, P, R> {}

impl<S, P, R> fmt::Debug for Next<'_, S, P, R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Next")
            .field("remaining", &self.rest.len())
            .finish_non_exhaustive()
    }
}

/// Runs `handlers` front to back around `terminal`.
pub(crate) fn run_chain<S, P, R>(
    handlers: &[Handler<S, P, R>],
    terminal: &dyn Fn(&mut S, P) -> R,
    owner: &mut S,
    params: P,
) -> R {
    match handlers.split_first() {
        Some((first, rest)) => first.call(owner, params, Next::new(rest, terminal)),
        None => terminal(owner, params),
    }
}

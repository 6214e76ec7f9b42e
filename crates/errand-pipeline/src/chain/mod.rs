//! Ordered handler chain for a single operation.

use std::fmt;

use crate::handler::{Handler, run_chain};

/// Ordered sequence of handlers wrapping one operation.
///
/// Insertion order is execution order. The same handler may be added more
/// than once; [`HandlerChain::remove`] drops the first occurrence.
///
/// Cloning a chain is cheap: handlers are reference counted. Owners that
/// keep their chains inside themselves clone the chain before invoking it,
/// which also means handlers added or removed during an invocation only
/// affect later invocations.
pub struct HandlerChain<S, P, R> {
    handlers: Vec<Handler<S, P, R>>,
}

impl<S, P, R> HandlerChain<S, P, R> {
    /// Creates an empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends `handler` to the end of the chain.
    pub fn add(&mut self, handler: Handler<S, P, R>) {
        self.handlers.push(handler);
    }

    /// Removes the first occurrence of `handler`.
    ///
    /// Returns `true` when a handler was removed. Removing a handler that is
    /// not registered is a no-op.
    pub fn remove(&mut self, handler: &Handler<S, P, R>) -> bool {
        match self.handlers.iter().position(|candidate| candidate == handler) {
            Some(index) => {
                self.handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` when `handler` is registered at least once.
    #[must_use]
    pub fn contains(&self, handler: &Handler<S, P, R>) -> bool {
        self.handlers.iter().any(|candidate| candidate == handler)
    }

    /// Number of registered handlers, counting duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the chain around `default`.
    ///
    /// The first handler runs first. Each handler decides whether to call
    /// the remainder; `default` runs only when every handler forwards. The
    /// returned value is whatever the outermost handler returns, or the
    /// default's result when the chain is empty.
    pub fn invoke<D>(&self, owner: &mut S, params: P, default: D) -> R
    where
        D: Fn(&mut S, P) -> R,
    {
        run_chain(&self.handlers, &default, owner, params)
    }
}

impl<S, P, R> Default for HandlerChain<S, P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P, R> Clone for HandlerChain<S, P, R> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<S, P, R> fmt::Debug for HandlerChain<S, P, R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HandlerChain")
            .field("handlers", &self.handlers)
            .finish()
    }
}

#[cfg(test)]
mod tests;

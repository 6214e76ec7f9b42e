//! Operation-keyed collection of handler chains.
//!
//! [`Pipeline`] maps an operation tag to the chain of handlers wrapping it.
//! Tags are ordinary values, normally a fieldless enum, so the set of
//! interceptable operations is fixed at compile time. Chains are created
//! lazily when the first handler for an operation is added.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::chain::HandlerChain;
use crate::handler::Handler;

/// Handler chains keyed by operation.
pub struct Pipeline<K, S, P, R> {
    chains: HashMap<K, HandlerChain<S, P, R>>,
}

impl<K, S, P, R> Pipeline<K, S, P, R>
where
    K: Eq + Hash,
{
    /// Creates a pipeline with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    /// Appends `handler` to the chain for `operation`.
    pub fn add_handler(&mut self, operation: K, handler: Handler<S, P, R>) {
        self.chains.entry(operation).or_default().add(handler);
    }

    /// Removes the first occurrence of `handler` from the chain for
    /// `operation`. Returns `true` when a handler was removed.
    pub fn remove_handler(&mut self, operation: &K, handler: &Handler<S, P, R>) -> bool {
        self.chains
            .get_mut(operation)
            .is_some_and(|chain| chain.remove(handler))
    }

    /// Returns a snapshot of the chain for `operation`.
    ///
    /// Operations without handlers yield an empty chain.
    #[must_use]
    pub fn chain(&self, operation: &K) -> HandlerChain<S, P, R> {
        self.chains.get(operation).cloned().unwrap_or_default()
    }

    /// Number of handlers registered for `operation`.
    #[must_use]
    pub fn handler_count(&self, operation: &K) -> usize {
        self.chains.get(operation).map_or(0, HandlerChain::len)
    }

    /// Runs the chain for `operation` around `default`.
    ///
    /// An operation with no registered handlers runs `default` directly.
    pub fn invoke<D>(&self, operation: &K, owner: &mut S, params: P, default: D) -> R
    where
        D: Fn(&mut S, P) -> R,
    {
        match self.chains.get(operation) {
            Some(chain) => chain.invoke(owner, params, default),
            None => default(owner, params),
        }
    }
}

impl<K, S, P, R> Default for Pipeline<K, S, P, R>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S, P, R> Clone for Pipeline<K, S, P, R>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            chains: self.chains.clone(),
        }
    }
}

impl<K, S, P, R> fmt::Debug for Pipeline<K, S, P, R>
where
    K: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Pipeline")
            .field("chains", &self.chains)
            .finish()
    }
}

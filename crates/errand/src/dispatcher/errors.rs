//! Error types returned by the dispatcher.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::record::FaultRecord;
use crate::runtime::RuntimeError;

/// Fault handed back to the caller instead of being handled.
///
/// Each variant carries the record that could not be dispatched so the
/// caller can decide whether to abort the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The fault arrived while the dispatcher was already handling one.
    #[error("fault raised while another fault was being handled: {record}")]
    Reentrant {
        /// The fault that triggered the bail-out.
        record: Box<FaultRecord>,
    },
    /// A handler asked for the fault to be rethrown after handling.
    #[error("fault propagated by handler: {record}")]
    Propagated {
        /// The propagated fault.
        record: Box<FaultRecord>,
    },
    /// The exception hook is not installed on this dispatcher.
    #[error("exception hook is not registered: {record}")]
    Unregistered {
        /// The fault that was not dispatched.
        record: Box<FaultRecord>,
    },
}

impl DispatchError {
    /// The fault carried by this error.
    #[must_use]
    pub fn record(&self) -> &FaultRecord {
        match self {
            Self::Reentrant { record }
            | Self::Propagated { record }
            | Self::Unregistered { record } => record,
        }
    }

    /// Consumes the error and returns its fault.
    #[must_use]
    pub fn into_record(self) -> FaultRecord {
        match self {
            Self::Reentrant { record }
            | Self::Propagated { record }
            | Self::Unregistered { record } => *record,
        }
    }
}

/// Errors raised while installing hooks.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The fatal-path memory reserve could not be allocated.
    #[error("failed to reserve {size} bytes for fatal handling")]
    MemoryReserve {
        /// Requested reserve size in bytes.
        size: usize,
        /// Allocator failure.
        #[source]
        source: TryReserveError,
    },
    /// The host runtime rejected a hook.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

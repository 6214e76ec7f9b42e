//! Seam between the dispatcher and the host runtime's fault primitives.
//!
//! The dispatcher never touches process-wide state directly. Everything it
//! needs from the host (hook installation, the suppression query, the last
//! recorded fault, output discarding and termination) goes through
//! [`Runtime`], so tests can drive the dispatcher against an in-memory host
//! and [`ProcessRuntime`](crate::ProcessRuntime) can drive it against the
//! real process.

use std::sync::Arc;

use thiserror::Error;

use crate::record::FaultRecord;
use crate::severity::SeveritySet;

/// Recoverable-fault hook. Returns `true` when the fault was handled and the
/// runtime should skip its own default handling.
pub type ErrorHook = Arc<dyn Fn(&FaultRecord) -> bool + Send + Sync>;

/// Uncaught-exception hook.
pub type ExceptionHook = Arc<dyn Fn(&FaultRecord) + Send + Sync>;

/// Errors reported by host runtime primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The process-termination callback could not be installed.
    #[error("failed to install shutdown hook: {message}")]
    ShutdownHook {
        /// Description supplied by the host.
        message: String,
    },
}

/// Fault primitives provided by the host runtime.
///
/// Installing a hook installs the dispatcher's own entry point for that
/// fault category and returns whichever hook was active before, if any.
/// Restoring a hook reinstates that previous hook.
pub trait Runtime {
    /// Installs the dispatcher's error hook for severities in `mask`.
    fn install_error_hook(&mut self, mask: SeveritySet) -> Option<ErrorHook>;

    /// Removes the dispatcher's error hook.
    fn restore_error_hook(&mut self);

    /// Installs the dispatcher's exception hook.
    fn install_exception_hook(&mut self) -> Option<ExceptionHook>;

    /// Removes the dispatcher's exception hook.
    fn restore_exception_hook(&mut self);

    /// Arranges for the dispatcher's fatal path to run at process end.
    ///
    /// Called at most once per dispatcher; the host cannot revoke it.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ShutdownHook`] when the callback cannot be
    /// registered.
    fn install_shutdown_hook(&mut self) -> Result<(), RuntimeError>;

    /// Returns `true` while an enclosing scope has silenced fault reporting.
    fn reporting_suppressed(&self) -> bool;

    /// Most recent fault no hook handled, if any.
    fn last_fault(&self) -> Option<FaultRecord>;

    /// Drops buffered output that has not been flushed yet.
    fn discard_output(&mut self);

    /// Ends the process with `code`.
    ///
    /// The process backend never returns from this call. In-memory hosts
    /// record the request and return so the dispatcher can report it.
    fn terminate(&mut self, code: i32);
}

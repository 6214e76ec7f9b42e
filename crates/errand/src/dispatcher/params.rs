//! Operation tags, handler parameters and outcomes.

use std::fmt;

use errand_pipeline::Handler;
use serde::Serialize;
use strum::Display;

use super::{DispatchError, Dispatcher};
use crate::record::FaultRecord;
use crate::runtime::{ErrorHook, ExceptionHook};
use crate::severity::SeveritySet;

/// Interceptable dispatcher operations.
///
/// Each operation has its own [`HandlerChain`](errand_pipeline::HandlerChain)
/// with its own parameter and result types, so the dispatcher keeps three
/// typed chains rather than one keyed
/// [`Pipeline`](errand_pipeline::Pipeline). The tag names a chain in
/// [`Dispatcher::handler_count`] and in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// Recoverable fault handling.
    Error,
    /// Uncaught-exception handling, the terminal path.
    Exception,
    /// Fault outstanding at process end.
    Fatal,
}

/// Parameters passed through the error chain.
#[derive(Clone)]
pub struct ErrorParams {
    /// The fault being handled.
    pub record: FaultRecord,
    /// Error hook active before registration, when chaining was requested.
    pub previous: Option<ErrorHook>,
    /// Severities forwarded to `previous`.
    pub previous_mask: SeveritySet,
    /// Asks the runtime to run its own default handling as well.
    pub defer_to_runtime: bool,
}

/// Parameters passed through the exception chain.
#[derive(Clone)]
pub struct ExceptionParams {
    /// The fault being handled.
    pub record: FaultRecord,
    /// Exception hook active before registration, when chaining was
    /// requested.
    pub previous: Option<ExceptionHook>,
    /// Exit status to terminate with. Zero keeps the process running.
    pub exit: i32,
    /// Hands the record back as [`DispatchError::Propagated`] once the
    /// default path has run.
    pub rethrow: bool,
}

/// Parameters passed through the fatal chain.
#[derive(Debug, Clone)]
pub struct FatalParams {
    /// Record synthesised from the last outstanding fault.
    pub record: FaultRecord,
    /// Escalates the record to the exception path when the default runs.
    pub escalate: bool,
}

impl fmt::Debug for ErrorParams {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ErrorParams")
            .field("record", &self.record)
            .field("previous", &self.previous.is_some())
            .field("previous_mask", &self.previous_mask)
            .field("defer_to_runtime", &self.defer_to_runtime)
            .finish()
    }
}

impl fmt::Debug for ExceptionParams {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ExceptionParams")
            .field("record", &self.record)
            .field("previous", &self.previous.is_some())
            .field("exit", &self.exit)
            .field("rethrow", &self.rethrow)
            .finish()
    }
}

/// Outcome of the error chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorDisposition {
    /// The fault never entered the chain.
    Ignored,
    /// The chain handled the fault.
    Absorbed,
    /// The chain asks the runtime to apply its default handling.
    Deferred,
}

impl ErrorDisposition {
    /// Returns `true` when the runtime should skip its own handling.
    #[must_use]
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Absorbed)
    }
}

/// Outcome of the exception and fatal chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Disposition {
    /// Nothing was dispatched.
    Skipped,
    /// The fault was handled and the process continues.
    Handled,
    /// Termination was requested with `code`.
    Terminated {
        /// Requested exit status.
        code: i32,
    },
}

/// Result of the exception and fatal chains.
pub type DispatchResult = Result<Disposition, DispatchError>;

/// Handler wrapping [`Dispatcher::handle_error`].
pub type ErrorHandler<R> = Handler<Dispatcher<R>, ErrorParams, ErrorDisposition>;

/// Handler wrapping [`Dispatcher::handle_exception`].
pub type ExceptionHandler<R> = Handler<Dispatcher<R>, ExceptionParams, DispatchResult>;

/// Handler wrapping [`Dispatcher::handle_fatal`].
pub type FatalHandler<R> = Handler<Dispatcher<R>, FatalParams, DispatchResult>;

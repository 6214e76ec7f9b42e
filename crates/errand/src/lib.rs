//! Fault-unification dispatcher.
//!
//! `errand` intercepts the three kinds of fault a process can produce
//! (recoverable errors, uncaught exceptions and faults still outstanding
//! when the process ends) and routes each through one extensible pipeline.
//! Every fault is normalised into a [`FaultRecord`] before any handler sees
//! it; handlers wrap the dispatcher's default policy using the composition
//! rules of [`errand_pipeline`].
//!
//! A [`Dispatcher`] is generic over the [`Runtime`] it installs hooks into.
//! [`install`] places one over [`ProcessRuntime`] in a process-wide slot,
//! where [`process::raise`] signals recoverable faults and panics arrive as
//! uncaught exceptions.
//!
//! # Example
//!
//! ```
//! use errand::{
//!     DispatcherConfig, ErrorDisposition, ErrorHandler, ErrorParams, Handler, Next,
//!     ProcessRuntime, Severity, process,
//! };
//!
//! type Global = errand::Dispatcher<ProcessRuntime>;
//!
//! # fn main() -> Result<(), errand::RegisterError> {
//! errand::install(&DispatcherConfig::default())?;
//!
//! let quiet: ErrorHandler<ProcessRuntime> = Handler::new(
//!     |_: &mut Global, params: ErrorParams, _: Next<'_, Global, ErrorParams, ErrorDisposition>| {
//!         assert_eq!(params.record.message(), "cache is cold");
//!         ErrorDisposition::Absorbed
//!     },
//! );
//! assert!(errand::with_dispatcher(|dispatcher| dispatcher.add_error_handler(quiet)).is_some());
//!
//! assert!(process::raise(Severity::Notice, "cache is cold"));
//! assert!(errand::uninstall());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
mod global;
pub mod process;
pub mod record;
pub mod render;
pub mod reserve;
pub mod runtime;
pub mod severity;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use errand_pipeline::{Handler, Next};

pub use self::config::{DispatcherConfig, LogFormat, TelemetryConfig};
pub use self::dispatcher::{
    DispatchError, DispatchResult, Dispatcher, Disposition, ErrorDisposition, ErrorHandler,
    ErrorParams, ExceptionHandler, ExceptionParams, FatalHandler, FatalParams, Lifecycle,
    Operation, RegisterError, RegistrationSnapshot, RegistrationState,
};
pub use self::global::{ProcessRuntime, install, uninstall, with_dispatcher};
pub use self::record::{FaultContext, FaultRecord, SourceLocation};
pub use self::render::{FaultRenderer, TracingRenderer};
pub use self::reserve::MemoryReserve;
pub use self::runtime::{ErrorHook, ExceptionHook, Runtime, RuntimeError};
pub use self::severity::{Severity, SeveritySet};

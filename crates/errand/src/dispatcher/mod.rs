//! The fault dispatcher.
//!
//! A [`Dispatcher`] owns the lifecycle of the three fault hooks and exposes
//! error, exception and fatal handling as interceptable operations. Each
//! operation runs its handler chain around a default policy:
//!
//! - errors are forwarded to the previously installed error hook when
//!   chaining was requested, and otherwise absorbed;
//! - exceptions are forwarded to the previous exception hook (or rendered
//!   when there is none) and then terminate the process unless the exit
//!   status is zero;
//! - fatal faults release the memory reserve and escalate to the exception
//!   path.
//!
//! Handlers receive the dispatcher itself as owner, so they may inspect its
//! state or add and remove handlers while they run.

mod errors;
mod params;
mod state;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use errand_pipeline::HandlerChain;

pub use self::errors::{DispatchError, RegisterError};
pub use self::params::{
    DispatchResult, Disposition, ErrorDisposition, ErrorHandler, ErrorParams, ExceptionHandler,
    ExceptionParams, FatalHandler, FatalParams, Operation,
};
pub use self::state::{Lifecycle, RegistrationSnapshot, RegistrationState};
use crate::config::DispatcherConfig;
use crate::record::{FaultContext, FaultRecord, SourceLocation};
use crate::render::{FaultRenderer, TracingRenderer};
use crate::reserve::MemoryReserve;
use crate::runtime::Runtime;
use crate::severity::{FATAL_EXIT_CODE, Severity, SeveritySet};

const LOG_TARGET: &str = "errand::dispatcher";

/// Routes every fault a process raises through one handler pipeline.
pub struct Dispatcher<R> {
    runtime: R,
    state: RegistrationState,
    lifecycle: Lifecycle,
    handling_exception: bool,
    fatal_handled: bool,
    renderer: Arc<dyn FaultRenderer>,
    error_chain: HandlerChain<Self, ErrorParams, ErrorDisposition>,
    exception_chain: HandlerChain<Self, ExceptionParams, DispatchResult>,
    fatal_chain: HandlerChain<Self, FatalParams, DispatchResult>,
}

impl<R: Runtime> Dispatcher<R> {
    /// Creates an unregistered dispatcher over `runtime` that renders faults
    /// with [`TracingRenderer`].
    #[must_use]
    pub fn new(runtime: R) -> Self {
        Self::with_renderer(runtime, Arc::new(TracingRenderer))
    }

    /// Creates an unregistered dispatcher with a custom renderer.
    #[must_use]
    pub fn with_renderer(runtime: R, renderer: Arc<dyn FaultRenderer>) -> Self {
        Self {
            runtime,
            state: RegistrationState::default(),
            lifecycle: Lifecycle::Unregistered,
            handling_exception: false,
            fatal_handled: false,
            renderer,
            error_chain: HandlerChain::new(),
            exception_chain: HandlerChain::new(),
            fatal_chain: HandlerChain::new(),
        }
    }

    /// The host runtime.
    #[must_use]
    pub const fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Mutable access to the host runtime.
    pub const fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// What is currently installed.
    #[must_use]
    pub const fn state(&self) -> &RegistrationState {
        &self.state
    }

    /// Registration lifecycle.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether the exception path is running.
    #[must_use]
    pub const fn is_handling_exception(&self) -> bool {
        self.handling_exception
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Installs all three hooks according to `config`.
    ///
    /// Registering again first removes this dispatcher's own error and
    /// exception hooks, so hooks never chain to themselves.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::MemoryReserve`] when the reserve cannot be
    /// allocated and [`RegisterError::Runtime`] when the shutdown hook cannot
    /// be installed. No hook is installed in either case.
    pub fn register(&mut self, config: &DispatcherConfig) -> Result<(), RegisterError> {
        self.register_fatal_hook(
            config.effective_fatal_severities(),
            config.memory_reserve_size,
        )?;
        self.register_error_hook(
            config.severity_mask,
            config
                .chain_previous_error_hook
                .then_some(config.previous_error_mask),
        );
        self.register_exception_hook(config.chain_previous_exception_hook);
        Ok(())
    }

    /// Installs the error hook for `mask`.
    ///
    /// When `chain_previous` is set, the hook active before this call is
    /// kept and receives faults whose severity is in the given set once the
    /// error chain's default runs.
    pub fn register_error_hook(&mut self, mask: SeveritySet, chain_previous: Option<SeveritySet>) {
        self.restore_error_hook();
        let previous = self.runtime.install_error_hook(mask);
        self.state.error_hook_installed = true;
        self.state.severity_mask = mask;
        if let Some(previous_mask) = chain_previous {
            self.state.previous_error_hook = previous;
            self.state.previous_error_mask = previous_mask;
        }
        self.lifecycle = Lifecycle::Registered;
        tracing::debug!(
            target: LOG_TARGET,
            event = "error_hook_installed",
            mask = ?mask,
            chained = self.state.chains_previous_error_hook(),
            "error hook installed"
        );
    }

    /// Installs the exception hook, optionally chaining the previous one.
    pub fn register_exception_hook(&mut self, chain_previous: bool) {
        self.restore_exception_hook();
        let previous = self.runtime.install_exception_hook();
        self.state.exception_hook_installed = true;
        if chain_previous {
            self.state.previous_exception_hook = previous;
        }
        self.lifecycle = Lifecycle::Registered;
        tracing::debug!(
            target: LOG_TARGET,
            event = "exception_hook_installed",
            chained = self.state.chains_previous_exception_hook(),
            "exception hook installed"
        );
    }

    /// Arms the fatal path for `fatals` with a reserve of `reserve_size`
    /// bytes. An empty `fatals` selects [`SeveritySet::default_fatal`].
    ///
    /// The shutdown hook is installed on first use only.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::MemoryReserve`] when the reserve cannot be
    /// allocated and [`RegisterError::Runtime`] when the shutdown hook cannot
    /// be installed.
    pub fn register_fatal_hook(
        &mut self,
        fatals: SeveritySet,
        reserve_size: usize,
    ) -> Result<(), RegisterError> {
        let reserve = MemoryReserve::allocate(reserve_size).map_err(|source| {
            RegisterError::MemoryReserve {
                size: reserve_size,
                source,
            }
        })?;
        if !self.state.fatal_hook_installed {
            self.runtime.install_shutdown_hook()?;
            self.state.fatal_hook_installed = true;
        }
        self.state.fatal_severities = if fatals.is_empty() {
            SeveritySet::default_fatal()
        } else {
            fatals
        };
        self.state.memory_reserve = reserve;
        self.lifecycle = Lifecycle::Registered;
        tracing::debug!(
            target: LOG_TARGET,
            event = "fatal_hook_armed",
            fatals = ?self.state.fatal_severities,
            reserve = reserve_size,
            "fatal hook armed"
        );
        Ok(())
    }

    /// Removes the error and exception hooks and neutralises the fatal path.
    pub fn restore(&mut self) {
        self.restore_error_hook();
        self.restore_fatal_hook();
        self.restore_exception_hook();
        self.lifecycle = Lifecycle::Restored;
    }

    /// Removes the error hook, reinstating the previous one.
    pub fn restore_error_hook(&mut self) {
        if self.state.error_hook_installed {
            self.runtime.restore_error_hook();
            self.state.clear_error_hook();
            tracing::debug!(target: LOG_TARGET, event = "error_hook_restored", "error hook restored");
        }
    }

    /// Removes the exception hook, reinstating the previous one.
    pub fn restore_exception_hook(&mut self) {
        if self.state.exception_hook_installed {
            self.runtime.restore_exception_hook();
            self.state.clear_exception_hook();
            tracing::debug!(
                target: LOG_TARGET,
                event = "exception_hook_restored",
                "exception hook restored"
            );
        }
    }

    /// Clears the fatal set and releases the reserve. The shutdown hook
    /// itself stays installed.
    pub fn restore_fatal_hook(&mut self) {
        self.state.neutralise_fatal_hook();
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    /// Appends a handler to the error chain.
    pub fn add_error_handler(&mut self, handler: ErrorHandler<R>) {
        self.error_chain.add(handler);
        log_handler_change(Operation::Error, "handler_added");
    }

    /// Removes the first occurrence of `handler` from the error chain.
    pub fn remove_error_handler(&mut self, handler: &ErrorHandler<R>) -> bool {
        let removed = self.error_chain.remove(handler);
        if removed {
            log_handler_change(Operation::Error, "handler_removed");
        }
        removed
    }

    /// Appends a handler to the exception chain.
    pub fn add_exception_handler(&mut self, handler: ExceptionHandler<R>) {
        self.exception_chain.add(handler);
        log_handler_change(Operation::Exception, "handler_added");
    }

    /// Removes the first occurrence of `handler` from the exception chain.
    pub fn remove_exception_handler(&mut self, handler: &ExceptionHandler<R>) -> bool {
        let removed = self.exception_chain.remove(handler);
        if removed {
            log_handler_change(Operation::Exception, "handler_removed");
        }
        removed
    }

    /// Appends a handler to the fatal chain.
    pub fn add_fatal_handler(&mut self, handler: FatalHandler<R>) {
        self.fatal_chain.add(handler);
        log_handler_change(Operation::Fatal, "handler_added");
    }

    /// Removes the first occurrence of `handler` from the fatal chain.
    pub fn remove_fatal_handler(&mut self, handler: &FatalHandler<R>) -> bool {
        let removed = self.fatal_chain.remove(handler);
        if removed {
            log_handler_change(Operation::Fatal, "handler_removed");
        }
        removed
    }

    /// Number of handlers registered for `operation`.
    #[must_use]
    pub fn handler_count(&self, operation: Operation) -> usize {
        match operation {
            Operation::Error => self.error_chain.len(),
            Operation::Exception => self.exception_chain.len(),
            Operation::Fatal => self.fatal_chain.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Fault handling
    // -----------------------------------------------------------------------

    /// Handles a recoverable fault.
    ///
    /// Returns [`ErrorDisposition::Ignored`] without running any handler
    /// when the error hook is not installed, when reporting is suppressed or
    /// when `severity` is outside the mask. A fault raised while the
    /// exception path is running is deferred to the runtime.
    pub fn handle_error(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        location: Option<SourceLocation>,
        context: Option<FaultContext>,
    ) -> ErrorDisposition {
        if !self.accepts_error(severity) {
            return ErrorDisposition::Ignored;
        }
        let record = FaultRecord::from_parts(severity, message.into(), location, context);
        self.dispatch_error(record)
    }

    /// Handles a recoverable fault that already has a record, as delivered
    /// by a runtime error hook. Gated like [`Self::handle_error`].
    pub fn handle_error_record(&mut self, record: FaultRecord) -> ErrorDisposition {
        if !self.accepts_error(record.severity()) {
            return ErrorDisposition::Ignored;
        }
        self.dispatch_error(record)
    }

    /// Handles an uncaught exception.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unregistered`] when the exception hook is not
    /// installed, [`DispatchError::Reentrant`] when the exception path is
    /// already running and whatever error the chain produces otherwise.
    pub fn handle_exception(&mut self, record: FaultRecord) -> DispatchResult {
        if !self.state.exception_hook_installed {
            return Err(DispatchError::Unregistered {
                record: Box::new(record),
            });
        }
        self.dispatch_exception(record)
    }

    /// Handles the fault outstanding at process end.
    ///
    /// Does nothing unless the fatal set is non-empty and the runtime's last
    /// fault has a severity in it. Runs at most once per dispatcher.
    ///
    /// # Errors
    ///
    /// Returns whatever error the fatal chain or the exception path produces.
    pub fn handle_fatal(&mut self) -> DispatchResult {
        if self.fatal_handled || self.state.fatal_severities.is_empty() {
            return Ok(Disposition::Skipped);
        }
        let Some(last) = self.runtime.last_fault() else {
            return Ok(Disposition::Skipped);
        };
        if !self.state.fatal_severities.contains(last.severity()) {
            tracing::debug!(
                target: LOG_TARGET,
                event = "fatal_skipped",
                severity = %last.severity(),
                "last fault is not fatal"
            );
            return Ok(Disposition::Skipped);
        }
        self.fatal_handled = true;
        let released = self.state.memory_reserve.release();
        let code = last
            .exit_hint()
            .filter(|hint| *hint != 0)
            .unwrap_or(FATAL_EXIT_CODE);
        let record = last.with_exit_hint(code);
        tracing::info!(
            target: LOG_TARGET,
            event = "fatal",
            severity = %record.severity(),
            released,
            "handling fatal fault"
        );
        let params = FatalParams {
            record,
            escalate: true,
        };
        let chain = self.fatal_chain.clone();
        chain.invoke(self, params, escalate_fatal::<R>)
    }

    fn accepts_error(&self, severity: Severity) -> bool {
        if !self.state.error_hook_installed {
            return false;
        }
        if self.runtime.reporting_suppressed() || !self.state.severity_mask.contains(severity) {
            tracing::trace!(
                target: LOG_TARGET,
                event = "error_ignored",
                severity = %severity,
                "fault suppressed or masked"
            );
            return false;
        }
        true
    }

    fn dispatch_error(&mut self, record: FaultRecord) -> ErrorDisposition {
        if self.handling_exception {
            tracing::warn!(
                target: LOG_TARGET,
                event = "error_during_exception",
                severity = %record.severity(),
                "fault raised while handling an exception; deferring to runtime"
            );
            return ErrorDisposition::Deferred;
        }
        let params = ErrorParams {
            record,
            previous: self.state.previous_error_hook.clone(),
            previous_mask: self.state.previous_error_mask,
            defer_to_runtime: false,
        };
        let chain = self.error_chain.clone();
        chain.invoke(self, params, finish_error::<R>)
    }

    fn dispatch_exception(&mut self, record: FaultRecord) -> DispatchResult {
        self.runtime.discard_output();
        if self.handling_exception {
            tracing::warn!(
                target: LOG_TARGET,
                event = "reentrant_fault",
                severity = %record.severity(),
                "fault raised while handling an exception; bailing out"
            );
            return Err(DispatchError::Reentrant {
                record: Box::new(record),
            });
        }
        self.handling_exception = true;
        let exit = record
            .exit_hint()
            .unwrap_or_else(|| record.severity().default_exit_code());
        let params = ExceptionParams {
            record,
            previous: self.state.previous_exception_hook.clone(),
            exit,
            rethrow: false,
        };
        let chain = self.exception_chain.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            chain.invoke(self, params, finish_exception::<R>)
        }));
        match outcome {
            Ok(outcome) => {
                if !matches!(outcome, Ok(Disposition::Terminated { .. })) {
                    self.handling_exception = false;
                }
                outcome
            }
            Err(payload) => {
                // A handler unwound; the guard must not outlive it.
                self.handling_exception = false;
                panic::resume_unwind(payload)
            }
        }
    }
}

fn log_handler_change(operation: Operation, event: &'static str) {
    tracing::debug!(target: LOG_TARGET, event, operation = %operation, "handler chain changed");
}

fn finish_error<R: Runtime>(_dispatcher: &mut Dispatcher<R>, params: ErrorParams) -> ErrorDisposition {
    if let Some(previous) = &params.previous
        && params.previous_mask.contains(params.record.severity())
    {
        previous(&params.record);
    }
    if params.defer_to_runtime {
        ErrorDisposition::Deferred
    } else {
        ErrorDisposition::Absorbed
    }
}

fn finish_exception<R: Runtime>(
    dispatcher: &mut Dispatcher<R>,
    params: ExceptionParams,
) -> DispatchResult {
    params.previous.as_ref().map_or_else(
        || dispatcher.renderer.render_fault(&params.record),
        |previous| previous(&params.record),
    );
    if params.exit != 0 {
        tracing::info!(
            target: LOG_TARGET,
            event = "terminate",
            code = params.exit,
            "terminating after unhandled fault"
        );
        dispatcher.runtime.terminate(params.exit);
        return Ok(Disposition::Terminated { code: params.exit });
    }
    if params.rethrow {
        return Err(DispatchError::Propagated {
            record: Box::new(params.record),
        });
    }
    Ok(Disposition::Handled)
}

fn escalate_fatal<R: Runtime>(dispatcher: &mut Dispatcher<R>, params: FatalParams) -> DispatchResult {
    if params.escalate {
        dispatcher.dispatch_exception(params.record)
    } else {
        Ok(Disposition::Handled)
    }
}

impl<R: fmt::Debug> fmt::Debug for Dispatcher<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("runtime", &self.runtime)
            .field("state", &self.state)
            .field("lifecycle", &self.lifecycle)
            .field("handling_exception", &self.handling_exception)
            .field("fatal_handled", &self.fatal_handled)
            .field("error_handlers", &self.error_chain.len())
            .field("exception_handlers", &self.exception_chain.len())
            .field("fatal_handlers", &self.fatal_chain.len())
            .finish_non_exhaustive()
    }
}

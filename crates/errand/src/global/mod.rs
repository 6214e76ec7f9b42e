//! The process-wide dispatcher.
//!
//! [`install`] places a [`Dispatcher`] over [`ProcessRuntime`] in a global
//! slot and wires the process hooks to it. Hooks lock the slot with
//! `try_lock`: a fault raised while the slot is already held (by a handler,
//! or by code running inside [`with_dispatcher`]) is reentrant and falls
//! back to the process default instead of deadlocking.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use once_cell::sync::{Lazy, OnceCell};

use crate::config::DispatcherConfig;
use crate::dispatcher::{DispatchError, Dispatcher, RegisterError};
use crate::process;
use crate::record::FaultRecord;
use crate::runtime::{ErrorHook, ExceptionHook, Runtime, RuntimeError};
use crate::severity::SeveritySet;

const LOG_TARGET: &str = "errand::process";

static DISPATCHER: Lazy<Mutex<Option<Dispatcher<ProcessRuntime>>>> =
    Lazy::new(|| Mutex::new(None));

static SHUTDOWN_ROUTED: OnceCell<()> = OnceCell::new();

/// [`Runtime`] over the [`process`] primitives.
///
/// Hooks installed through this runtime route faults to the process-wide
/// dispatcher slot, so it is only constructed by [`install`].
#[derive(Debug)]
pub struct ProcessRuntime {
    _private: (),
}

impl Runtime for ProcessRuntime {
    fn install_error_hook(&mut self, mask: SeveritySet) -> Option<ErrorHook> {
        process::set_error_hook(Arc::new(route_error), mask)
    }

    fn restore_error_hook(&mut self) {
        if !process::restore_error_hook() {
            tracing::warn!(
                target: LOG_TARGET,
                event = "restore_without_hook",
                "no error hook to restore"
            );
        }
    }

    fn install_exception_hook(&mut self) -> Option<ExceptionHook> {
        process::set_exception_hook(Arc::new(route_exception))
    }

    fn restore_exception_hook(&mut self) {
        if !process::restore_exception_hook() {
            tracing::warn!(
                target: LOG_TARGET,
                event = "restore_without_hook",
                "no exception hook to restore"
            );
        }
    }

    fn install_shutdown_hook(&mut self) -> Result<(), RuntimeError> {
        SHUTDOWN_ROUTED
            .get_or_try_init(|| process::on_shutdown(route_shutdown))
            .map(|_| ())
    }

    fn reporting_suppressed(&self) -> bool {
        process::is_silenced()
    }

    fn last_fault(&self) -> Option<FaultRecord> {
        process::last_fault()
    }

    fn discard_output(&mut self) {
        let discarded = process::discard_output();
        if discarded > 0 {
            tracing::debug!(
                target: LOG_TARGET,
                event = "output_discarded",
                discarded,
                "discarded buffered output"
            );
        }
    }

    fn terminate(&mut self, code: i32) {
        process::terminate(code);
    }
}

/// Installs the process-wide dispatcher, or re-registers it with `config`
/// when one is already installed.
///
/// # Errors
///
/// Returns [`RegisterError`] when registration fails. A dispatcher that
/// fails its first registration is not installed.
pub fn install(config: &DispatcherConfig) -> Result<(), RegisterError> {
    let mut slot = lock_slot();
    if let Some(dispatcher) = slot.as_mut() {
        return dispatcher.register(config);
    }
    let mut dispatcher = Dispatcher::new(ProcessRuntime { _private: () });
    dispatcher.register(config)?;
    *slot = Some(dispatcher);
    tracing::info!(target: LOG_TARGET, event = "installed", "fault dispatcher installed");
    Ok(())
}

/// Restores the process hooks and removes the process-wide dispatcher.
///
/// Returns `false` when no dispatcher was installed.
#[must_use]
pub fn uninstall() -> bool {
    let Some(mut dispatcher) = lock_slot().take() else {
        return false;
    };
    dispatcher.restore();
    tracing::info!(target: LOG_TARGET, event = "uninstalled", "fault dispatcher removed");
    true
}

/// Runs `body` with the process-wide dispatcher, typically to add or remove
/// handlers.
///
/// Returns `None` when no dispatcher is installed or when the dispatcher is
/// busy, for example when called from inside one of its own handlers. Such
/// handlers already receive the dispatcher as their owner.
#[must_use]
pub fn with_dispatcher<T>(body: impl FnOnce(&mut Dispatcher<ProcessRuntime>) -> T) -> Option<T> {
    let mut slot = try_lock_slot()?;
    slot.as_mut().map(body)
}

fn lock_slot() -> MutexGuard<'static, Option<Dispatcher<ProcessRuntime>>> {
    DISPATCHER.lock().unwrap_or_else(PoisonError::into_inner)
}

fn try_lock_slot() -> Option<MutexGuard<'static, Option<Dispatcher<ProcessRuntime>>>> {
    match DISPATCHER.try_lock() {
        Ok(slot) => Some(slot),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

fn route_error(record: &FaultRecord) -> bool {
    let routed = with_dispatcher(|dispatcher| dispatcher.handle_error_record(record.clone()));
    routed.is_some_and(crate::ErrorDisposition::is_handled)
}

fn route_exception(record: &FaultRecord) {
    match with_dispatcher(|dispatcher| dispatcher.handle_exception(record.clone())) {
        Some(Ok(_)) => {}
        Some(Err(error)) => report_bail_out(&error),
        None => report_bail_out(&DispatchError::Reentrant {
            record: Box::new(record.clone()),
        }),
    }
}

fn route_shutdown() {
    if let Some(Err(error)) = with_dispatcher(Dispatcher::handle_fatal) {
        report_bail_out(&error);
    }
}

fn report_bail_out(error: &DispatchError) {
    let record = error.record();
    tracing::error!(
        target: LOG_TARGET,
        event = "bail_out",
        severity = %record.severity(),
        exit_hint = record.exit_hint(),
        "{error}"
    );
}

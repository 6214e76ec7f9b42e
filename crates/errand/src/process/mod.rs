//! Host fault primitives for a Rust process.
//!
//! Rust has no global error or exception hooks of its own, so this module
//! provides them:
//!
//! - [`raise`] signals a recoverable fault to the innermost error hook
//!   installed with [`set_error_hook`];
//! - panics are bridged onto a stack of exception hooks managed by
//!   [`set_exception_hook`];
//! - [`on_shutdown`] runs callbacks when the process exits;
//! - [`silence`] suppresses fault reporting for the duration of a closure;
//! - [`BufferedStdout`] collects output that [`discard_output`] can drop
//!   when a fault interrupts a half-written response.
//!
//! Hook stacks are process-wide. Hooks are called without any internal lock
//! held, so a hook may itself raise faults or install hooks.

mod error;
mod exception;
mod output;
mod shutdown;
mod silence;

use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

pub use self::error::{raise, raise_record, restore_error_hook, set_error_hook};
pub use self::exception::{report_exception, restore_exception_hook, set_exception_hook};
pub use self::output::{BufferedStdout, buffered_len, discard_output, flush_output};
pub use self::shutdown::{is_shutting_down, on_shutdown};
pub use self::silence::{is_silenced, silence};
use crate::record::{FaultRecord, SourceLocation};
use crate::severity::{FATAL_EXIT_CODE, Severity};

const LOG_TARGET: &str = "errand::process";

static LAST_FAULT: Lazy<Mutex<Option<FaultRecord>>> = Lazy::new(|| Mutex::new(None));

/// Most recent fault that no hook handled.
#[must_use]
pub fn last_fault() -> Option<FaultRecord> {
    lock(&LAST_FAULT).clone()
}

/// Forgets the most recent unhandled fault.
pub fn clear_last_fault() {
    lock(&LAST_FAULT).take();
}

pub(crate) fn record_fault(record: FaultRecord) {
    *lock(&LAST_FAULT) = Some(record);
}

/// Records an unrecoverable fault and exits the process.
///
/// The fault becomes [`last_fault`], so shutdown callbacks can see what
/// ended the process.
#[track_caller]
pub fn raise_fatal(severity: Severity, message: impl Into<String>) -> ! {
    let record = FaultRecord::new(severity, message).with_location(SourceLocation::caller());
    tracing::error!(
        target: LOG_TARGET,
        event = "fatal_raised",
        severity = %record.severity(),
        "{}",
        record.message()
    );
    record_fault(record);
    terminate(FATAL_EXIT_CODE)
}

/// Ends the process with `code`.
///
/// Inside shutdown callbacks the process is already exiting, and calling
/// `exit` again is undefined behaviour, so `_exit` is used instead.
pub fn terminate(code: i32) -> ! {
    if is_shutting_down() {
        // SAFETY: `_exit` never returns and touches no Rust state.
        unsafe { libc::_exit(code) }
    }
    std::process::exit(code)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

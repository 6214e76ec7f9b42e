//! Process-termination callbacks.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::{Lazy, OnceCell};

use super::{LOG_TARGET, lock};
use crate::runtime::RuntimeError;

static CALLBACKS: Lazy<Mutex<Vec<fn()>>> = Lazy::new(|| Mutex::new(Vec::new()));

static ATEXIT: OnceCell<()> = OnceCell::new();

static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Runs `callback` once when the process exits normally or through
/// [`std::process::exit`].
///
/// Callbacks run in registration order and cannot be removed.
///
/// # Errors
///
/// Returns [`RuntimeError::ShutdownHook`] when the C runtime refuses to
/// register the exit handler.
pub fn on_shutdown(callback: fn()) -> Result<(), RuntimeError> {
    ATEXIT.get_or_try_init(register_exit_handler)?;
    lock(&CALLBACKS).push(callback);
    Ok(())
}

/// Returns `true` while shutdown callbacks are running.
#[must_use]
pub fn is_shutting_down() -> bool {
    SHUTTING_DOWN.load(Ordering::SeqCst)
}

fn register_exit_handler() -> Result<(), RuntimeError> {
    // SAFETY: `run_callbacks` is a plain `extern "C"` function with no
    // arguments, as `atexit` requires.
    let status = unsafe { libc::atexit(run_callbacks) };
    if status == 0 {
        Ok(())
    } else {
        Err(RuntimeError::ShutdownHook {
            message: format!("atexit returned {status}"),
        })
    }
}

extern "C" fn run_callbacks() {
    SHUTTING_DOWN.store(true, Ordering::SeqCst);
    let callbacks = lock(&CALLBACKS).clone();
    tracing::debug!(
        target: LOG_TARGET,
        event = "shutdown",
        callbacks = callbacks.len(),
        "running shutdown callbacks"
    );
    for callback in callbacks {
        callback();
    }
}

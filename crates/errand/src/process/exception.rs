//! Uncaught-exception hook stack bridged onto the panic hook.

use std::any::Any;
use std::panic::{self, PanicHookInfo};
use std::sync::{Arc, Mutex};

use once_cell::sync::{Lazy, OnceCell};

use super::lock;
use crate::record::{FaultRecord, SourceLocation};
use crate::runtime::ExceptionHook;
use crate::severity::Severity;

static EXCEPTION_HOOKS: Lazy<Mutex<Vec<ExceptionHook>>> = Lazy::new(|| Mutex::new(Vec::new()));

static PANIC_BRIDGE: OnceCell<()> = OnceCell::new();

/// Installs `hook` and returns the hook it replaces.
///
/// The first call replaces the process panic hook with a bridge that
/// delivers panics to the innermost exception hook. The panic hook that was
/// installed before still runs whenever no other exception hook sits below
/// the innermost one, so the usual panic report is not lost.
///
/// Panic hooks run before unwinding, when it is not yet known whether the
/// panic will be caught. Bridged records therefore carry an exit hint of
/// zero: hooks report the panic, and unwinding decides whether the process
/// or thread ends.
#[must_use]
pub fn set_exception_hook(hook: ExceptionHook) -> Option<ExceptionHook> {
    PANIC_BRIDGE.get_or_init(install_panic_bridge);
    let mut hooks = lock(&EXCEPTION_HOOKS);
    let previous = hooks.last().map(Arc::clone);
    hooks.push(hook);
    previous
}

/// Reinstates the hook that was active before the last
/// [`set_exception_hook`].
///
/// Returns `false` when no hook was installed.
#[must_use]
pub fn restore_exception_hook() -> bool {
    lock(&EXCEPTION_HOOKS).pop().is_some()
}

/// Delivers `record` to the innermost exception hook.
///
/// Returns `false` when no hook is installed.
#[must_use]
pub fn report_exception(record: &FaultRecord) -> bool {
    let hook = lock(&EXCEPTION_HOOKS).last().map(Arc::clone);
    hook.is_some_and(|installed| {
        installed(record);
        true
    })
}

fn install_panic_bridge() {
    let original = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let chained = lock(&EXCEPTION_HOOKS).len() > 1;
        if !report_exception(&panic_record(info)) || !chained {
            original(info);
        }
    }));
}

pub(super) fn panic_record(info: &PanicHookInfo<'_>) -> FaultRecord {
    FaultRecord::from_parts(
        Severity::Fatal,
        panic_message(info.payload()),
        info.location().map(SourceLocation::from),
        None,
    )
    .with_exit_hint(0)
}

pub(super) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_else(|| String::from("Box<dyn Any>"))
}

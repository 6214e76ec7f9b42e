//! Recoverable-fault hook stack.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use super::{LOG_TARGET, is_silenced, lock, record_fault};
use crate::record::{FaultRecord, SourceLocation};
use crate::runtime::ErrorHook;
use crate::severity::{Severity, SeveritySet};

struct InstalledHook {
    hook: ErrorHook,
    mask: SeveritySet,
}

static ERROR_HOOKS: Lazy<Mutex<Vec<InstalledHook>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Installs `hook` for severities in `mask` and returns the hook it
/// replaces.
#[must_use]
pub fn set_error_hook(hook: ErrorHook, mask: SeveritySet) -> Option<ErrorHook> {
    let mut hooks = lock(&ERROR_HOOKS);
    let previous = hooks.last().map(|installed| Arc::clone(&installed.hook));
    hooks.push(InstalledHook { hook, mask });
    previous
}

/// Reinstates the hook that was active before the last [`set_error_hook`].
///
/// Returns `false` when no hook was installed.
#[must_use]
pub fn restore_error_hook() -> bool {
    lock(&ERROR_HOOKS).pop().is_some()
}

/// Signals a recoverable fault raised at the caller's location.
///
/// Returns `true` when the innermost error hook handled the fault.
#[must_use]
#[track_caller]
pub fn raise(severity: Severity, message: impl Into<String>) -> bool {
    raise_record(FaultRecord::new(severity, message).with_location(SourceLocation::caller()))
}

/// Signals a recoverable fault described by `record`.
///
/// The innermost hook receives the fault when its mask accepts the
/// severity. Faults no hook handles become the
/// [`last_fault`](super::last_fault) and are logged unless reporting is
/// silenced.
#[must_use]
pub fn raise_record(record: FaultRecord) -> bool {
    let hook = lock(&ERROR_HOOKS)
        .last()
        .filter(|installed| installed.mask.contains(record.severity()))
        .map(|installed| Arc::clone(&installed.hook));
    if hook.is_some_and(|installed| installed(&record)) {
        return true;
    }
    if !is_silenced() {
        let location = record.location().map(ToString::to_string);
        tracing::warn!(
            target: LOG_TARGET,
            event = "unhandled_fault",
            severity = %record.severity(),
            location = location.as_deref().unwrap_or("unknown"),
            "{}",
            record.message()
        );
    }
    record_fault(record);
    false
}

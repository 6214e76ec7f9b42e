//! What a dispatcher currently has installed.

use std::fmt;

use serde::Serialize;
use strum::Display;

use crate::reserve::MemoryReserve;
use crate::runtime::{ErrorHook, ExceptionHook};
use crate::severity::SeveritySet;

/// Registration lifecycle of a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Lifecycle {
    /// Nothing has been registered yet.
    #[default]
    Unregistered,
    /// Hooks are installed.
    Registered,
    /// Hooks were removed and the fatal path neutralised.
    Restored,
}

/// Hooks, masks and the reserve held by one dispatcher.
#[derive(Default)]
pub struct RegistrationState {
    pub(super) error_hook_installed: bool,
    pub(super) exception_hook_installed: bool,
    pub(super) fatal_hook_installed: bool,
    pub(super) severity_mask: SeveritySet,
    pub(super) fatal_severities: SeveritySet,
    pub(super) previous_error_hook: Option<ErrorHook>,
    pub(super) previous_error_mask: SeveritySet,
    pub(super) previous_exception_hook: Option<ExceptionHook>,
    pub(super) memory_reserve: MemoryReserve,
}

impl RegistrationState {
    /// Whether the error hook is installed.
    #[must_use]
    pub const fn error_hook_installed(&self) -> bool {
        self.error_hook_installed
    }

    /// Whether the exception hook is installed.
    #[must_use]
    pub const fn exception_hook_installed(&self) -> bool {
        self.exception_hook_installed
    }

    /// Whether the shutdown hook has been installed. Never reset.
    #[must_use]
    pub const fn fatal_hook_installed(&self) -> bool {
        self.fatal_hook_installed
    }

    /// Severities the error hook intercepts.
    #[must_use]
    pub const fn severity_mask(&self) -> SeveritySet {
        self.severity_mask
    }

    /// Severities treated as fatal at process end. Empty once restored.
    #[must_use]
    pub const fn fatal_severities(&self) -> SeveritySet {
        self.fatal_severities
    }

    /// Whether a previous error hook is chained.
    #[must_use]
    pub const fn chains_previous_error_hook(&self) -> bool {
        self.previous_error_hook.is_some()
    }

    /// Severities forwarded to the previous error hook.
    #[must_use]
    pub const fn previous_error_mask(&self) -> SeveritySet {
        self.previous_error_mask
    }

    /// Whether a previous exception hook is chained.
    #[must_use]
    pub const fn chains_previous_exception_hook(&self) -> bool {
        self.previous_exception_hook.is_some()
    }

    /// Bytes held in the fatal-path reserve.
    #[must_use]
    pub fn reserve_size(&self) -> usize {
        self.memory_reserve.size()
    }

    /// Comparable summary of the state.
    #[must_use]
    pub fn snapshot(&self) -> RegistrationSnapshot {
        RegistrationSnapshot {
            error_hook_installed: self.error_hook_installed,
            exception_hook_installed: self.exception_hook_installed,
            fatal_hook_installed: self.fatal_hook_installed,
            severity_mask: self.severity_mask,
            fatal_severities: self.fatal_severities,
            chains_previous_error_hook: self.chains_previous_error_hook(),
            previous_error_mask: self.previous_error_mask,
            chains_previous_exception_hook: self.chains_previous_exception_hook(),
            reserve_size: self.reserve_size(),
        }
    }

    pub(super) fn clear_error_hook(&mut self) {
        self.error_hook_installed = false;
        self.severity_mask = SeveritySet::empty();
        self.previous_error_hook = None;
        self.previous_error_mask = SeveritySet::empty();
    }

    pub(super) fn clear_exception_hook(&mut self) {
        self.exception_hook_installed = false;
        self.previous_exception_hook = None;
    }

    pub(super) fn neutralise_fatal_hook(&mut self) {
        self.fatal_severities = SeveritySet::empty();
        self.memory_reserve.release();
    }
}

impl fmt::Debug for RegistrationState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.snapshot(), formatter)
    }
}

/// Plain-data view of a [`RegistrationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag mirrors an independent hook"
)]
pub struct RegistrationSnapshot {
    /// Whether the error hook is installed.
    pub error_hook_installed: bool,
    /// Whether the exception hook is installed.
    pub exception_hook_installed: bool,
    /// Whether the shutdown hook has been installed.
    pub fatal_hook_installed: bool,
    /// Severities the error hook intercepts.
    pub severity_mask: SeveritySet,
    /// Severities treated as fatal at process end.
    pub fatal_severities: SeveritySet,
    /// Whether a previous error hook is chained.
    pub chains_previous_error_hook: bool,
    /// Severities forwarded to the previous error hook.
    pub previous_error_mask: SeveritySet,
    /// Whether a previous exception hook is chained.
    pub chains_previous_exception_hook: bool,
    /// Bytes held in the fatal-path reserve.
    pub reserve_size: usize,
}

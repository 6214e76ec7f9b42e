//! Normalised fault records.
//!
//! Every fault that reaches the dispatcher, whatever its origin, is
//! converted into exactly one [`FaultRecord`] before any handler sees it.
//! Records are immutable: the `with_*` builders consume a record and return
//! a new one, so a handler that wants to pass on a modified fault produces
//! a fresh record instead of mutating one shared with other handlers.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::severity::Severity;

/// Snapshot of caller state captured alongside a fault.
pub type FaultContext = BTreeMap<String, String>;

/// Source position a fault was raised from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// Path of the source file.
    pub file: String,
    /// One-based line number.
    pub line: u32,
}

impl SourceLocation {
    /// Creates a location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the caller of the function this is invoked from.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(std::panic::Location::caller())
    }
}

impl From<&std::panic::Location<'_>> for SourceLocation {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.file, self.line)
    }
}

/// Normalised representation of an intercepted fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultRecord {
    severity: Severity,
    message: String,
    location: Option<SourceLocation>,
    context: Option<FaultContext>,
    exit_hint: Option<i32>,
}

impl FaultRecord {
    /// Creates a record with no location, context or exit hint.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
            context: None,
            exit_hint: None,
        }
    }

    pub(crate) fn from_parts(
        severity: Severity,
        message: String,
        location: Option<SourceLocation>,
        context: Option<FaultContext>,
    ) -> Self {
        Self {
            severity,
            message,
            location,
            context,
            exit_hint: None,
        }
    }

    /// Severity of the fault.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable description of the fault.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Where the fault was raised, when known.
    #[must_use]
    pub const fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Caller state captured with the fault, when any.
    #[must_use]
    pub const fn context(&self) -> Option<&FaultContext> {
        self.context.as_ref()
    }

    /// Exit status the fault suggests for the process.
    #[must_use]
    pub const fn exit_hint(&self) -> Option<i32> {
        self.exit_hint
    }

    /// Returns the record with a different severity.
    #[must_use]
    pub fn with_severity(self, severity: Severity) -> Self {
        Self { severity, ..self }
    }

    /// Returns the record with a different message.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    /// Returns the record with `location` attached.
    #[must_use]
    pub fn with_location(self, location: SourceLocation) -> Self {
        Self {
            location: Some(location),
            ..self
        }
    }

    /// Returns the record with `context` attached.
    #[must_use]
    pub fn with_context(self, context: FaultContext) -> Self {
        Self {
            context: Some(context),
            ..self
        }
    }

    /// Returns the record suggesting `code` as the process exit status.
    #[must_use]
    pub fn with_exit_hint(self, code: i32) -> Self {
        Self {
            exit_hint: Some(code),
            ..self
        }
    }

    /// Returns the record without an exit hint.
    #[must_use]
    pub fn without_exit_hint(self) -> Self {
        Self {
            exit_hint: None,
            ..self
        }
    }
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.severity, self.message)?;
        if let Some(location) = &self.location {
            write!(formatter, " at {location}")?;
        }
        Ok(())
    }
}

//! Dispatcher and telemetry configuration.
//!
//! Both types deserialise with every field optional so applications can
//! embed them in whatever configuration format they already load.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::severity::SeveritySet;

/// Default log filter expression used by [`TelemetryConfig`].
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Options recognised by [`Dispatcher::register`](crate::Dispatcher::register).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Recoverable severities the error hook intercepts.
    pub severity_mask: SeveritySet,
    /// Severities treated as fatal when still outstanding at process end.
    /// An empty set selects [`SeveritySet::default_fatal`].
    pub fatal_severities: SeveritySet,
    /// Bytes allocated at registration and released before fatal handling.
    pub memory_reserve_size: usize,
    /// Forward faults to the error hook that was active before registration.
    pub chain_previous_error_hook: bool,
    /// Severities forwarded to the previous error hook when chaining.
    pub previous_error_mask: SeveritySet,
    /// Forward faults to the exception hook that was active before
    /// registration.
    pub chain_previous_exception_hook: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            severity_mask: SeveritySet::all(),
            fatal_severities: SeveritySet::default_fatal(),
            memory_reserve_size: 0,
            chain_previous_error_hook: false,
            previous_error_mask: SeveritySet::all(),
            chain_previous_exception_hook: false,
        }
    }
}

impl DispatcherConfig {
    /// Sets the severities the error hook intercepts.
    #[must_use]
    pub const fn with_severity_mask(mut self, mask: SeveritySet) -> Self {
        self.severity_mask = mask;
        self
    }

    /// Sets the severities treated as fatal at process end.
    #[must_use]
    pub const fn with_fatal_severities(mut self, fatals: SeveritySet) -> Self {
        self.fatal_severities = fatals;
        self
    }

    /// Sets the size of the fatal-handling memory reserve in bytes.
    #[must_use]
    pub const fn with_memory_reserve_size(mut self, bytes: usize) -> Self {
        self.memory_reserve_size = bytes;
        self
    }

    /// Chains the previous error hook for severities in `mask`.
    #[must_use]
    pub const fn chaining_previous_error_hook(mut self, mask: SeveritySet) -> Self {
        self.chain_previous_error_hook = true;
        self.previous_error_mask = mask;
        self
    }

    /// Chains the previous exception hook.
    #[must_use]
    pub const fn chaining_previous_exception_hook(mut self) -> Self {
        self.chain_previous_exception_hook = true;
        self
    }

    /// Fatal set to install, substituting the default for an empty set.
    #[must_use]
    pub const fn effective_fatal_severities(&self) -> SeveritySet {
        if self.fatal_severities.is_empty() {
            SeveritySet::default_fatal()
        } else {
            self.fatal_severities
        }
    }
}

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Options for [`telemetry::initialise`](crate::telemetry::initialise).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `tracing` filter directive, such as `info` or `errand=debug`.
    pub log_filter: String,
    /// Output format for log lines.
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: LogFormat::default(),
        }
    }
}

impl TelemetryConfig {
    /// Returns the configured filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

//! Structured logging for processes that host the dispatcher.
//!
//! Fault reports from [`TracingRenderer`](crate::TracingRenderer) use the
//! `errand::fault` target. Subscribers built here always let those events
//! through, whatever the configured filter, so a fault that ends the
//! process is never reported to nobody.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::{self, MakeWriter};

use crate::config::{LogFormat, TelemetryConfig};

/// Directive appended to every filter so fault reports are never dropped.
pub const FAULT_DIRECTIVE: &str = "errand::fault=error";

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Subscriber produced by [`subscriber`].
pub type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter expression did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Builds a subscriber for `config` that writes to `writer`.
///
/// Nothing is installed; pass the result to
/// [`tracing::subscriber::with_default`] or install it yourself.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the filter expression does not
/// parse.
pub fn subscriber<W>(config: &TelemetryConfig, writer: W) -> Result<BoxedSubscriber, TelemetryError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    build(config, writer, false)
}

/// Installs a stderr subscriber as the global default on first use.
///
/// Later calls succeed without touching global state, even when `config`
/// differs.
///
/// # Examples
///
/// ```rust
/// use errand::TelemetryConfig;
/// use errand::telemetry;
///
/// # fn main() -> Result<(), errand::telemetry::TelemetryError> {
/// let config = TelemetryConfig::default();
/// telemetry::initialise(&config)?;
/// telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid filter expression and
/// [`TelemetryError::Subscriber`] when another subscriber is already
/// installed.
pub fn initialise(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD.get_or_try_init(|| -> Result<(), TelemetryError> {
        let subscriber = build(config, io::stderr, io::stderr().is_terminal())?;
        tracing::subscriber::set_global_default(subscriber)?;
        tracing::debug!(
            target: "errand::telemetry",
            event = "initialised",
            format = %config.log_format(),
            filter = config.log_filter(),
            "telemetry initialised"
        );
        Ok(())
    })?;
    Ok(())
}

fn filter_for(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    let invalid = |error: &dyn std::fmt::Display| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message: error.to_string(),
    };
    let faults: Directive = FAULT_DIRECTIVE.parse().map_err(|error| invalid(&error))?;
    let filter = EnvFilter::try_new(config.log_filter()).map_err(|error| invalid(&error))?;
    Ok(filter.add_directive(faults))
}

fn build<W>(config: &TelemetryConfig, writer: W, ansi: bool) -> Result<BoxedSubscriber, TelemetryError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter_for(config)?)
        .with_target(true)
        .with_level(true)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: BoxedSubscriber = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    Ok(subscriber)
}

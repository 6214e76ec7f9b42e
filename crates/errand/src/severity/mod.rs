//! Fault severities and compact severity sets.
//!
//! A [`Severity`] classifies how serious a fault is. The same
//! [`SeveritySet`] type is used for the error-hook mask (which recoverable
//! faults the dispatcher intercepts) and for the fatal set (which faults,
//! when still outstanding at process end, are treated as fatal).

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Exit status used for fatal faults that do not suggest their own.
pub const FATAL_EXIT_CODE: i32 = 255;

/// Exit status used for non-fatal faults that reach the terminal path
/// without suggesting their own.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Classification of a fault's seriousness.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
    /// Use of functionality scheduled for removal.
    Deprecated,
    /// Informational fault that does not indicate a problem.
    Notice,
    /// Recoverable warning.
    Warning,
    /// Recoverable error; execution may continue.
    Recoverable,
    /// Error raised explicitly by application code.
    UserError,
    /// Unrecoverable runtime error.
    Fatal,
    /// Failure to parse input the process depends on.
    Parse,
    /// Failure during runtime start-up.
    Core,
    /// Failure while compiling or loading code.
    Compile,
}

/// Errors encountered while parsing a [`Severity`] from text.
pub type SeverityParseError = strum::ParseError;

impl Severity {
    /// Every severity, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Deprecated,
        Self::Notice,
        Self::Warning,
        Self::Recoverable,
        Self::UserError,
        Self::Fatal,
        Self::Parse,
        Self::Core,
        Self::Compile,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Returns `true` when the severity belongs to the default fatal set.
    #[must_use]
    pub const fn is_default_fatal(self) -> bool {
        SeveritySet::default_fatal().contains(self)
    }

    /// Exit status used when a fault of this severity reaches the terminal
    /// path without an exit hint of its own.
    #[must_use]
    pub const fn default_exit_code(self) -> i32 {
        if self.is_default_fatal() {
            FATAL_EXIT_CODE
        } else {
            FAILURE_EXIT_CODE
        }
    }
}

/// Set of severities stored as a bit mask.
///
/// Serialises as a list of severity names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(from = "Vec<Severity>", into = "Vec<Severity>")]
pub struct SeveritySet(u16);

impl SeveritySet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every severity.
    #[must_use]
    pub const fn all() -> Self {
        Self((1 << Severity::ALL.len()) - 1)
    }

    /// Severities treated as fatal when the configuration names none:
    /// fatal, parse, core, compile and user errors.
    #[must_use]
    pub const fn default_fatal() -> Self {
        Self::empty()
            .with(Severity::Fatal)
            .with(Severity::Parse)
            .with(Severity::Core)
            .with(Severity::Compile)
            .with(Severity::UserError)
    }

    /// Returns a copy of the set that also contains `severity`.
    #[must_use]
    pub const fn with(self, severity: Severity) -> Self {
        Self(self.0 | severity.bit())
    }

    /// Returns a copy of the set without `severity`.
    #[must_use]
    pub const fn without(self, severity: Severity) -> Self {
        Self(self.0 & !severity.bit())
    }

    /// Adds `severity` to the set.
    pub const fn insert(&mut self, severity: Severity) {
        self.0 |= severity.bit();
    }

    /// Removes `severity` from the set.
    pub const fn remove(&mut self, severity: Severity) {
        self.0 &= !severity.bit();
    }

    /// Returns `true` when `severity` is a member.
    #[must_use]
    pub const fn contains(self, severity: Severity) -> bool {
        self.0 & severity.bit() != 0
    }

    /// Returns `true` when the set has no members.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of members.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members of both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Members of either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Iterates over the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Severity> {
        Severity::ALL
            .into_iter()
            .filter(move |severity| self.contains(*severity))
    }
}

impl fmt::Debug for SeveritySet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Severity> for SeveritySet {
    fn from_iter<I: IntoIterator<Item = Severity>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<Severity>> for SeveritySet {
    fn from(severities: Vec<Severity>) -> Self {
        severities.into_iter().collect()
    }
}

impl From<SeveritySet> for Vec<Severity> {
    fn from(set: SeveritySet) -> Self {
        set.iter().collect()
    }
}

impl From<Severity> for SeveritySet {
    fn from(severity: Severity) -> Self {
        Self::empty().with(severity)
    }
}

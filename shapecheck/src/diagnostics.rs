//! Warnings emitted when a function cannot be abstracted.
//!
//! Abstraction failures are recoverable: the offending function is skipped
//! and callers treat it as opaque. The checker reports the reason through an
//! injected [`WarningSink`] and never formats beyond the message text;
//! presentation belongs to the front end.

use crate::loc::SourceLocation;
use std::fmt;

/// A single abstraction warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Human-readable reason the function was skipped.
    pub message: String,
    /// Source position, if the parser provided one for the offending site.
    pub location: Option<SourceLocation>,
}

impl Warning {
    /// Create a warning without a source position.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source position.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {}", self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Sink the checker writes abstraction warnings to.
pub trait WarningSink {
    /// Record one warning.
    fn warn(&mut self, warning: Warning);
}

/// Vec-backed sink for tests and batch drivers.
#[derive(Debug, Default)]
pub struct CollectedWarnings {
    warnings: Vec<Warning>,
}

impl CollectedWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all collected warnings, clearing the collection.
    pub fn take(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }
}

impl WarningSink for CollectedWarnings {
    fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Sink that drops every warning.
#[derive(Debug, Default)]
pub struct IgnoreWarnings;

impl WarningSink for IgnoreWarnings {
    fn warn(&mut self, _warning: Warning) {}
}

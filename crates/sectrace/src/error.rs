//! Error types for the section tracker.

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TraceError>;

/// Message used when ending a section with nothing active.
pub const NEVER_STARTED: &str = "Trying to end a trace section that was never started";

/// Message used when beginning a section without a name.
pub const MISSING_NAME: &str = "Section name cannot be null";

/// Usage errors raised by the tracker in strict mode.
///
/// In lenient mode neither variant is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// A section was begun without a name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A section was ended while no section was active.
    #[error("Illegal usage: {0}")]
    IllegalUsage(String),
}

impl TraceError {
    pub(crate) fn missing_name() -> Self {
        TraceError::InvalidArgument(MISSING_NAME.to_string())
    }

    pub(crate) fn never_started() -> Self {
        TraceError::IllegalUsage(NEVER_STARTED.to_string())
    }
}

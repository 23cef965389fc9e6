//! Tracker configuration.

use serde::{Deserialize, Serialize};

/// Initial settings for a [`SectionTracker`](crate::SectionTracker).
///
/// Deserializes from the `[tracker]` table of a config file; missing keys
/// fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Fail on malformed usage instead of warning. Default: `false`.
    pub strict: bool,
}

impl TrackerConfig {
    /// Config with strict mode enabled.
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

//! Scope-bound sections.

use tracing::error;

use crate::error::Result;
use crate::tracker::SectionTracker;

/// Ends a section when dropped.
///
/// The tracker keeps one shared stack, so dropping a guard ends whichever
/// section is on top at that moment, which is the guard's own section only
/// if callers nest correctly.
#[must_use = "dropping the guard ends the section immediately"]
#[derive(Debug)]
pub struct SectionGuard<'a> {
    tracker: &'a SectionTracker,
    open: bool,
}

impl<'a> SectionGuard<'a> {
    pub(crate) fn new(tracker: &'a SectionTracker) -> Self {
        Self {
            tracker,
            open: true,
        }
    }

    /// End the section now and report the outcome.
    pub fn end(mut self) -> Result<()> {
        self.open = false;
        self.tracker.end_section()
    }
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.tracker.end_section() {
                error!("Failed to end section on drop: {}", e);
            }
        }
    }
}

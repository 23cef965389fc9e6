//! Shared section ledger.
//!
//! A [`SectionTracker`] keeps one LIFO stack of active section names and one
//! queue of completed names. Every thread that holds a reference to the
//! tracker pushes onto and pops from the same stack, so ordering reflects
//! lock acquisition, not per-thread nesting.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use crate::config::TrackerConfig;
use crate::error::{NEVER_STARTED, Result, TraceError};
use crate::guard::SectionGuard;
use crate::snapshot::Snapshot;

/// Both containers live behind one lock so that ending a section is a single
/// step for any concurrent reader or resetter.
#[derive(Debug, Default)]
struct Ledger {
    /// Front is the most recently begun section.
    active: VecDeque<String>,
    /// Oldest completion first.
    completed: Vec<String>,
}

/// Thread-safe tracker of active and completed trace sections.
///
/// Construct one per usage epoch (or call [`reset`](Self::reset) between
/// epochs) and share it by reference or `Arc`.
#[derive(Debug, Default)]
pub struct SectionTracker {
    ledger: Mutex<Ledger>,
    strict: AtomicBool,
}

impl SectionTracker {
    /// Create an empty tracker in lenient mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tracker with the given initial settings.
    pub fn with_config(config: &TrackerConfig) -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            strict: AtomicBool::new(config.strict),
        }
    }

    // No operation panics while holding the lock, so a poisoned ledger is
    // still consistent.
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new section with the given name.
    ///
    /// Pass `None` for an absent name. In strict mode that fails with
    /// [`TraceError::InvalidArgument`] and nothing is pushed; in lenient mode
    /// the section is recorded under the empty name.
    pub fn begin_section<'n>(&self, name: impl Into<Option<&'n str>>) -> Result<()> {
        let name = match name.into() {
            Some(name) => name.to_owned(),
            None if self.is_strict_mode() => return Err(TraceError::missing_name()),
            None => {
                debug!("Section begun without a name, recording it as empty");
                String::new()
            }
        };

        trace!(section = %name, "begin section");
        self.ledger().active.push_front(name);
        Ok(())
    }

    /// End the most recently begun section that is still active.
    ///
    /// The popped name is not checked against the caller's intent. With no
    /// active section this fails with [`TraceError::IllegalUsage`] in strict
    /// mode and logs a warning otherwise; state is left unchanged either way.
    pub fn end_section(&self) -> Result<()> {
        let mut ledger = self.ledger();
        match ledger.active.pop_front() {
            Some(name) => {
                trace!(section = %name, "end section");
                ledger.completed.push(name);
                Ok(())
            }
            None if self.is_strict_mode() => Err(TraceError::never_started()),
            None => {
                drop(ledger);
                warn!("{}", NEVER_STARTED);
                Ok(())
            }
        }
    }

    /// Copy of the active sections, most recent first.
    pub fn current_sections(&self) -> Vec<String> {
        self.ledger().active.iter().cloned().collect()
    }

    /// Copy of the completed sections, oldest first.
    pub fn previous_sections(&self) -> Vec<String> {
        self.ledger().completed.clone()
    }

    /// Both containers and the mode flag, read together.
    pub fn snapshot(&self) -> Snapshot {
        let ledger = self.ledger();
        Snapshot {
            current: ledger.active.iter().cloned().collect(),
            previous: ledger.completed.clone(),
            strict: self.is_strict_mode(),
        }
    }

    /// Number of active sections.
    pub fn depth(&self) -> usize {
        self.ledger().active.len()
    }

    /// Number of completed sections recorded since the last reset.
    pub fn completed_count(&self) -> usize {
        self.ledger().completed.len()
    }

    /// Switch between strict and lenient validation.
    ///
    /// Applies to every later begin/end on any thread. Sections that are
    /// already active are not revalidated.
    pub fn set_strict_mode(&self, enabled: bool) {
        self.strict.store(enabled, Ordering::Release);
    }

    /// Whether malformed usage currently fails instead of warning.
    pub fn is_strict_mode(&self) -> bool {
        self.strict.load(Ordering::Acquire)
    }

    /// Discard all active and completed sections and return to lenient mode.
    ///
    /// Active sections are dropped without being recorded as completed.
    pub fn reset(&self) {
        let discarded = {
            let mut ledger = self.ledger();
            let discarded = ledger.active.len();
            ledger.active.clear();
            ledger.completed.clear();
            discarded
        };
        self.set_strict_mode(false);

        debug!(discarded, "Section tracker reset");
    }

    /// Begin a section and return a guard that ends it when dropped.
    pub fn section<'n>(&self, name: impl Into<Option<&'n str>>) -> Result<SectionGuard<'_>> {
        self.begin_section(name)?;
        Ok(SectionGuard::new(self))
    }

    /// Run `f` inside a section.
    ///
    /// The section is ended even if `f` panics. An error from ending the
    /// section is returned in place of `f`'s value.
    pub fn in_section<'n, T>(
        &self,
        name: impl Into<Option<&'n str>>,
        f: impl FnOnce() -> T,
    ) -> Result<T> {
        let guard = self.section(name)?;
        let value = f();
        guard.end()?;
        Ok(value)
    }
}

//! Concurrent trace-section tracking.
//!
//! This crate records which named sections of work are open and which have
//! completed, so a test or diagnostic harness can inspect them afterwards:
//!
//! - **Tracker**: one shared LIFO stack of active sections and a history of
//!   completed ones, behind a single lock
//! - **Guard**: scope-bound sections that end on drop
//! - **Snapshot**: consistent, serializable copies of the tracker state
//!
//! # Usage
//!
//! ```rust
//! use sectrace::SectionTracker;
//!
//! let tracker = SectionTracker::new();
//!
//! tracker.begin_section("outer").unwrap();
//! tracker.begin_section("inner").unwrap();
//! tracker.end_section().unwrap();
//! tracker.end_section().unwrap();
//!
//! assert_eq!(tracker.previous_sections(), vec!["inner", "outer"]);
//! assert!(tracker.current_sections().is_empty());
//! ```
//!
//! # Strict Mode
//!
//! By default, ending a section with nothing active only logs a warning.
//! Strict mode turns that, and beginning a section without a name, into
//! errors:
//!
//! ```rust
//! use sectrace::{SectionTracker, TraceError};
//!
//! let tracker = SectionTracker::new();
//! tracker.set_strict_mode(true);
//!
//! assert!(matches!(tracker.end_section(), Err(TraceError::IllegalUsage(_))));
//!
//! tracker.reset();
//! assert!(!tracker.is_strict_mode());
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod snapshot;
pub mod tracker;

// Re-export main types
pub use config::TrackerConfig;
pub use error::{Result, TraceError};
pub use guard::SectionGuard;
pub use snapshot::Snapshot;
pub use tracker::SectionTracker;

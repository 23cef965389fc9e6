//! Concurrency and end-to-end tests
//!
//! These tests drive one shared tracker from many threads and tasks and
//! check that the history never gains, loses, or duplicates entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use sectrace::{SectionTracker, Snapshot, TraceError, TrackerConfig};

fn count_names(history: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for name in history {
        *counts.entry(name.clone()).or_insert(0) += 1;
    }
    counts
}

/// Two threads, one beginning "A" and one beginning "B", each followed by an
/// end. Ends may pop the other thread's section, but the totals must match.
#[test]
fn test_two_thread_interleaving() {
    const ITERATIONS: usize = 5_000;

    let tracker = Arc::new(SectionTracker::new());
    let handles: Vec<_> = ["A", "B"]
        .into_iter()
        .map(|name| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    tracker.begin_section(name).unwrap();
                    tracker.end_section().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let history = tracker.previous_sections();
    assert_eq!(history.len(), 2 * ITERATIONS);
    assert!(tracker.current_sections().is_empty());

    let counts = count_names(&history);
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["A"], ITERATIONS);
    assert_eq!(counts["B"], ITERATIONS);
}

/// Snapshots taken while workers run never show a name in both containers
/// and never show more entries than have been begun.
#[test]
fn test_snapshots_consistent_under_contention() {
    const WORKERS: usize = 4;
    const ITERATIONS: usize = 2_000;

    let tracker = Arc::new(SectionTracker::new());
    let begun = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..WORKERS)
        .map(|w| {
            let tracker = Arc::clone(&tracker);
            let begun = Arc::clone(&begun);
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    let name = format!("{}-{}", w, i);
                    begun.fetch_add(1, Ordering::SeqCst);
                    tracker.begin_section(name.as_str()).unwrap();
                    tracker.end_section().unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let tracker = Arc::clone(&tracker);
        let begun = Arc::clone(&begun);
        thread::spawn(move || {
            for _ in 0..500 {
                let snapshot = tracker.snapshot();
                let total = snapshot.current.len() + snapshot.previous.len();
                assert!(total <= begun.load(Ordering::SeqCst));

                let counts = count_names(&snapshot.previous);
                assert!(counts.values().all(|&c| c == 1));
                for name in &snapshot.current {
                    assert!(!counts.contains_key(name));
                }
            }
        })
    };

    for handle in workers {
        handle.join().unwrap();
    }
    reader.join().unwrap();

    let history = tracker.previous_sections();
    assert_eq!(history.len(), WORKERS * ITERATIONS);
    assert_eq!(count_names(&history).len(), WORKERS * ITERATIONS);
}

/// Resets racing with begin/end pairs never fail and leave the tracker in a
/// state where every history entry was begun.
#[test]
fn test_reset_races_with_workers() {
    let tracker = Arc::new(SectionTracker::new());

    let workers: Vec<_> = (0..4)
        .map(|w| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                let name = format!("worker-{}", w);
                for _ in 0..2_000 {
                    tracker.begin_section(name.as_str()).unwrap();
                    // Lenient mode: an end after a concurrent reset only warns.
                    tracker.end_section().unwrap();
                }
            })
        })
        .collect();

    let resetter = {
        let tracker = Arc::clone(&tracker);
        thread::spawn(move || {
            for _ in 0..100 {
                tracker.reset();
                thread::yield_now();
            }
        })
    };

    for handle in workers {
        handle.join().unwrap();
    }
    resetter.join().unwrap();

    for name in tracker.previous_sections() {
        assert!(name.starts_with("worker-"));
    }
    for name in tracker.current_sections() {
        assert!(name.starts_with("worker-"));
    }

    tracker.reset();
    assert_eq!(tracker.snapshot(), Snapshot::default());
}

/// Strict mode toggled from one task is seen by calls made on other tasks.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_strict_mode_across_tasks() {
    let tracker = Arc::new(SectionTracker::with_config(&TrackerConfig::default()));

    let toggler = Arc::clone(&tracker);
    tokio::spawn(async move { toggler.set_strict_mode(true) })
        .await
        .unwrap();

    let caller = Arc::clone(&tracker);
    let result = tokio::spawn(async move { caller.end_section() })
        .await
        .unwrap();

    assert!(matches!(result, Err(TraceError::IllegalUsage(_))));
    assert!(tracker.current_sections().is_empty());
    assert!(tracker.previous_sections().is_empty());

    tracker.reset();
    assert!(!tracker.is_strict_mode());
}

/// Many async tasks using scope guards leave a complete history.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_guards_across_tasks() {
    const TASKS: usize = 32;
    const ITERATIONS: usize = 100;

    let tracker = Arc::new(SectionTracker::new());
    tracker.set_strict_mode(true);

    let mut handles = Vec::new();
    for t in 0..TASKS {
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            let name = format!("task-{}", t);
            for _ in 0..ITERATIONS {
                let value = tracker.in_section(name.as_str(), || t * 2).unwrap();
                assert_eq!(value, t * 2);
                tokio::task::yield_now().await;
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = tracker.snapshot();
    assert!(snapshot.is_idle());
    assert!(snapshot.strict);
    assert_eq!(snapshot.previous.len(), TASKS * ITERATIONS);

    let counts = count_names(&snapshot.previous);
    for t in 0..TASKS {
        assert_eq!(counts[&format!("task-{}", t)], ITERATIONS);
    }
}

/// The snapshot serializes to the shape the CLI prints with `--json`.
#[test]
fn test_snapshot_json_shape() {
    let tracker = SectionTracker::new();
    tracker.begin_section("outer").unwrap();
    tracker.begin_section("inner").unwrap();
    tracker.end_section().unwrap();

    let json = serde_json::to_value(tracker.snapshot()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "current": ["outer"],
            "previous": ["inner"],
            "strict": false,
        })
    );
}

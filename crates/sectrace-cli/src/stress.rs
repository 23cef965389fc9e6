//! Concurrent begin/end stress check.
//!
//! Each worker repeatedly begins a section named after itself and ends the
//! top of the shared stack. Because every end follows its own worker's
//! begin, the stack is never empty at an end, so every end must move exactly
//! one begun name into the history.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use sectrace::SectionTracker;
use serde::Serialize;

/// Parameters for a stress run.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    pub threads: usize,
    pub iterations: usize,
}

/// Result of a stress run.
#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub threads: usize,
    pub iterations: usize,
    /// Calls to `end_section` that returned `Ok`.
    pub ends: usize,
    /// Entries found in the completed history.
    pub history_len: usize,
    /// Sections still active after all workers joined.
    pub leftover: usize,
    pub elapsed_ms: u64,
}

fn worker_name(index: usize) -> String {
    format!("worker-{}", index)
}

/// Run the workers against `tracker` and verify the history.
///
/// Fails if any worker's call fails, or if the history contains a name that
/// was never begun, a name more often than it was begun, or a different
/// number of entries than successful ends.
pub fn run(tracker: &SectionTracker, config: StressConfig) -> Result<StressReport> {
    let start = Instant::now();

    let ends = thread::scope(|scope| -> Result<usize> {
        let handles: Vec<_> = (0..config.threads)
            .map(|index| {
                scope.spawn(move || -> sectrace::Result<usize> {
                    let name = worker_name(index);
                    let mut ends = 0;
                    for _ in 0..config.iterations {
                        tracker.begin_section(name.as_str())?;
                        tracker.end_section()?;
                        ends += 1;
                    }
                    Ok(ends)
                })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            match handle.join() {
                Ok(ends) => total += ends?,
                Err(_) => bail!("stress worker panicked"),
            }
        }
        Ok(total)
    })?;

    let elapsed = start.elapsed();
    let history = tracker.previous_sections();
    verify(&history, config, ends)?;

    let report = StressReport {
        threads: config.threads,
        iterations: config.iterations,
        ends,
        history_len: history.len(),
        leftover: tracker.depth(),
        elapsed_ms: duration_ms(elapsed),
    };
    tracing::debug!(?report, "Stress run complete");
    Ok(report)
}

fn verify(history: &[String], config: StressConfig, ends: usize) -> Result<()> {
    if history.len() != ends {
        bail!(
            "history has {} entries but {} sections were ended",
            history.len(),
            ends
        );
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in history {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let begun: HashMap<String, usize> = (0..config.threads)
        .map(|index| (worker_name(index), config.iterations))
        .collect();
    for (name, count) in counts {
        match begun.get(name) {
            None => bail!("history contains '{}', which was never begun", name),
            Some(&expected) if count > expected => bail!(
                "'{}' appears {} times in history but was begun {} times",
                name,
                count,
                expected
            ),
            Some(_) => {}
        }
    }

    Ok(())
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

//! Section scripts.
//!
//! A script is a line-oriented list of tracker calls:
//!
//! ```text
//! # comment
//! strict on
//! begin outer
//! begin inner
//! end
//! show
//! end
//! begin!
//! reset
//! ```
//!
//! A line is a comment only if its first non-blank character is `#`.
//! Everything after the single separator following `begin` is the section
//! name, kept verbatim, so names may contain `#` and surrounding spaces.
//! `begin!` begins a section with an absent name.

use std::io::Write;

use anyhow::{Context, Result, bail};
use sectrace::{SectionTracker, TraceError};

/// A single tracker call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin a section; `None` is an absent name.
    Begin(Option<String>),
    End,
    Strict(bool),
    Reset,
    /// Print the current snapshot.
    Show,
}

/// A command and the script line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub line: usize,
    pub command: Command,
}

/// Outcome of replaying a script.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Commands that ran, including failed ones.
    pub executed: usize,
    /// Strict-mode failures, by line number.
    pub failures: Vec<(usize, TraceError)>,
}

/// Parse a script into steps. Line numbers start at 1.
pub fn parse(source: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim_start();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let command = parse_command(text).with_context(|| format!("line {}", line))?;
        steps.push(Step { line, command });
    }

    Ok(steps)
}

/// Split `text` after its first word, dropping the one separator character.
fn split_word(text: &str) -> (&str, &str) {
    match text.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((pos, sep)) => (&text[..pos], &text[pos + sep.len_utf8()..]),
        None => (text, ""),
    }
}

fn parse_command(text: &str) -> Result<Command> {
    let (word, name) = split_word(text);
    let rest = name.trim();

    let command = match word {
        "begin" => Command::Begin(Some(name.to_string())),
        "begin!" if rest.is_empty() => Command::Begin(None),
        "end" if rest.is_empty() => Command::End,
        "reset" if rest.is_empty() => Command::Reset,
        "show" if rest.is_empty() => Command::Show,
        "strict" => match rest {
            "on" | "true" => Command::Strict(true),
            "off" | "false" => Command::Strict(false),
            other => bail!("expected 'on' or 'off' after 'strict', got '{}'", other),
        },
        "begin!" | "end" | "reset" | "show" => {
            bail!("'{}' takes no arguments", word)
        }
        other => bail!("unknown command '{}'", other),
    };

    Ok(command)
}

/// Run steps against a tracker, writing `show` output to `out`.
///
/// A strict-mode failure stops the replay unless `keep_going` is set, in
/// which case it is logged and recorded in the report.
pub fn replay(
    tracker: &SectionTracker,
    steps: &[Step],
    keep_going: bool,
    out: &mut impl Write,
) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();

    for step in steps {
        report.executed += 1;
        let result = match &step.command {
            Command::Begin(name) => tracker.begin_section(name.as_deref()),
            Command::End => tracker.end_section(),
            Command::Strict(enabled) => {
                tracker.set_strict_mode(*enabled);
                Ok(())
            }
            Command::Reset => {
                tracker.reset();
                Ok(())
            }
            Command::Show => {
                writeln!(out, "--- line {} ---\n{}", step.line, tracker.snapshot())?;
                Ok(())
            }
        };

        if let Err(e) = result {
            if !keep_going {
                return Err(e).with_context(|| format!("line {}", step.line));
            }
            tracing::warn!("line {}: {}", step.line, e);
            report.failures.push((step.line, e));
        }
    }

    Ok(report)
}

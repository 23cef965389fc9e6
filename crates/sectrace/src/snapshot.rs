//! Point-in-time views of the tracker state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Consistent copy of both containers and the mode flag.
///
/// `current` and `previous` are captured in the same critical section, so a
/// name is never missing from both or present in both because of a
/// concurrent `end_section`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Active sections, most recent first.
    pub current: Vec<String>,

    /// Completed sections, oldest first.
    pub previous: Vec<String>,

    /// Whether strict mode was enabled when the snapshot was taken.
    pub strict: bool,
}

impl Snapshot {
    /// Number of currently open sections.
    pub fn depth(&self) -> usize {
        self.current.len()
    }

    /// True if no section is open.
    pub fn is_idle(&self) -> bool {
        self.current.is_empty()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "mode: {}",
            if self.strict { "strict" } else { "lenient" }
        )?;
        writeln!(f, "active ({}):", self.current.len())?;
        for name in &self.current {
            writeln!(f, "  {:?}", name)?;
        }
        write!(f, "completed ({}):", self.previous.len())?;
        for name in &self.previous {
            write!(f, "\n  {:?}", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_display() {
        let snapshot = Snapshot {
            current: vec!["inner".to_string(), "outer".to_string()],
            previous: vec!["setup".to_string()],
            strict: true,
        };

        let rendered = snapshot.to_string();
        assert!(rendered.starts_with("mode: strict\n"));
        assert!(rendered.contains("active (2):\n  \"inner\"\n  \"outer\"\n"));
        assert!(rendered.ends_with("completed (1):\n  \"setup\""));
        assert_eq!(snapshot.depth(), 2);
        assert!(!snapshot.is_idle());
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = Snapshot {
            current: vec![],
            previous: vec!["a".to_string(), "b".to_string()],
            strict: false,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"current":[],"previous":["a","b"],"strict":false}"#
        );
        assert!(snapshot.is_idle());
    }
}

/// Ordered diagnostics shown to the user. Adjacent duplicates are suppressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    entries: Vec<String>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `diagnostic` unless it matches the last entry after trimming.
    /// Returns whether the entry was appended.
    pub fn record(&mut self, diagnostic: &str) -> bool {
        if let Some(last) = self.entries.last() {
            if last.trim() == diagnostic.trim() {
                tracing::debug!("duplicate diagnostic suppressed");
                return false;
            }
        }
        self.entries.push(diagnostic.to_string());
        true
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppresses_adjacent_duplicates_ignoring_whitespace() {
        let mut log = ErrorLog::new();
        assert!(log.record("ERROR: 0:3: 'foo' : undeclared identifier"));
        assert!(!log.record("  ERROR: 0:3: 'foo' : undeclared identifier\n"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn records_recurrence_after_different_entry() {
        let mut log = ErrorLog::new();
        log.record("a");
        log.record("b");
        log.record("a");
        assert_eq!(log.entries(), ["a", "b", "a"]);
        assert_eq!(log.last(), Some("a"));
    }

    #[test]
    fn never_holds_adjacent_identical_entries() {
        let mut log = ErrorLog::new();
        for entry in ["x", "x", "y", " y", "x", "x ", "z", "z"] {
            log.record(entry);
        }
        for pair in log.entries().windows(2) {
            assert_ne!(pair[0].trim(), pair[1].trim());
        }
    }
}

//! In-memory logger that records every message

use parking_lot::Mutex;

use super::traits::{LogLevel, Logger};

/// A logger that keeps every message in memory
///
/// Intended for tests that need to assert a warning or error was reported.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Create an empty memory logger
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Messages recorded at exactly `level`
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any message at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    /// Drop all recorded entries
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn record(&self, level: LogLevel, message: &str) {
        self.entries.lock().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.record(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.record(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.debug("connecting");
        logger.warn("tool 'echo' overridden");
        logger.error("spawn failed");

        assert_eq!(logger.entries().len(), 3);
        assert_eq!(logger.messages(LogLevel::Warn), vec!["tool 'echo' overridden"]);
        assert!(logger.contains(LogLevel::Error, "spawn"));
        assert!(!logger.contains(LogLevel::Info, "spawn"));

        logger.clear();
        assert!(logger.entries().is_empty());
    }
}

//! Silent logger

use super::traits::Logger;

/// Discards every message
///
/// The default logger in tests, and for hosts that don't want library logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl NoOpLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NoOpLogger {
    fn debug(&self, _: &str) {}

    fn info(&self, _: &str) {}

    fn warn(&self, _: &str) {}

    fn error(&self, _: &str) {}
}

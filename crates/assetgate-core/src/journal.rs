//! # Build Journal
//!
//! Diagnostics raised while gating a command. Each entry is emitted through
//! `tracing` as it is recorded and kept so callers can report on or assert
//! against what happened, including on the error path.

use tracing::Level;

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Ordered diagnostics for one gated invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildLog {
    entries: Vec<LogEntry>,
}

impl BuildLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(Level::INFO, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.push(Level::WARN, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(Level::ERROR, message);
    }

    fn push(&mut self, level: Level, message: String) {
        self.entries.push(LogEntry { level, message });
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries recorded at exactly `level`.
    pub fn at(&self, level: Level) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    /// True if an entry at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.at(level).any(|e| e.message.contains(needle))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

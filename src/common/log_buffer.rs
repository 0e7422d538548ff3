//! Bounded, most-recent-first event log shared with the control surface

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info, warn};

/// Default number of retained entries
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Human-readable event log
///
/// Written by the worker and read by `status()` concurrently. Each entry
/// is also forwarded to `tracing`. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Record an informational event
    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(message);
    }

    /// Record a warning
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.push(message);
    }

    /// Record an error
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.push(message);
    }

    /// Prepend a timestamped entry, dropping the oldest on overflow
    pub fn push(&self, message: impl AsRef<str>) {
        let stamped = format!(
            "[{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message.as_ref()
        );
        let mut entries = self.lock();
        entries.push_front(stamped);
        entries.truncate(self.capacity);
    }

    /// Copy of the current entries, newest first
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// True if any entry contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|entry| entry.contains(needle))
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

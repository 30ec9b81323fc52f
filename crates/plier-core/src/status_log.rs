//! StatusLog — the few lines of user-facing feedback shown in the header.

use std::collections::VecDeque;

/// Lines kept on screen.
pub const STATUS_LOG_CAPACITY: usize = 3;

/// Bounded FIFO of status lines. Appending past capacity evicts the oldest.
#[derive(Debug, Clone)]
pub struct StatusLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::with_capacity(STATUS_LOG_CAPACITY)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "StatusLog capacity must be greater than 0");
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_last_three_in_order() {
        let mut log = StatusLog::new();
        for i in 0..10 {
            log.push(format!("line {}", i));
            assert!(log.len() <= STATUS_LOG_CAPACITY);
        }
        let lines: Vec<&str> = log.iter().collect();
        assert_eq!(lines, vec!["line 7", "line 8", "line 9"]);
        assert_eq!(log.last(), Some("line 9"));
    }

    #[test]
    fn test_under_capacity() {
        let mut log = StatusLog::new();
        assert!(log.is_empty());
        log.push("stop");
        log.push("rewind");
        assert_eq!(log.iter().collect::<Vec<_>>(), vec!["stop", "rewind"]);
    }

    #[test]
    fn test_custom_capacity() {
        let mut log = StatusLog::with_capacity(1);
        log.push("a");
        log.push("b");
        assert_eq!(log.len(), 1);
        assert_eq!(log.last(), Some("b"));
    }
}

//! Pending utterance queue
//!
//! Holds translated messages while the synthesizer is busy. Entries are
//! unique and leave in arrival order.

use std::collections::VecDeque;

/// Number of queued messages above which the oldest one is dropped
pub const DEFAULT_QUEUE_LIMIT: usize = 20;

/// Result of [`PendingQueue::push`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Appended to the back of the queue
    Queued,

    /// An identical message was already waiting; nothing changed
    Duplicate,

    /// Appended after dropping the oldest message
    Evicted(String),
}

/// Bounded FIFO of unique messages
#[derive(Clone, Debug)]
pub struct PendingQueue {
    entries: VecDeque<String>,
    limit: usize,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_LIMIT)
    }
}

impl PendingQueue {
    /// Create a queue that starts evicting once more than `limit` messages wait
    ///
    /// The queue can therefore hold `limit + 1` entries.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    /// Add a message unless an identical one is already waiting
    pub fn push(&mut self, text: impl Into<String>) -> EnqueueOutcome {
        let text = text.into();
        if self.contains(&text) {
            return EnqueueOutcome::Duplicate;
        }

        let evicted = if self.entries.len() > self.limit {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(text);

        match evicted {
            Some(oldest) => EnqueueOutcome::Evicted(oldest),
            None => EnqueueOutcome::Queued,
        }
    }

    /// Take the oldest waiting message
    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop_front()
    }

    /// Whether an identical message is already waiting
    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|entry| entry == text)
    }

    /// Waiting messages, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Drop every waiting message
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of waiting messages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Eviction threshold given to [`PendingQueue::new`]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = PendingQueue::default();
        queue.push("first");
        queue.push("second");
        queue.push("third");

        assert_eq!(queue.pop().as_deref(), Some("first"));
        assert_eq!(queue.pop().as_deref(), Some("second"));
        assert_eq!(queue.pop().as_deref(), Some("third"));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_duplicate_is_ignored() {
        let mut queue = PendingQueue::default();
        assert_eq!(queue.push("armado"), EnqueueOutcome::Queued);
        assert_eq!(queue.push("armado"), EnqueueOutcome::Duplicate);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_same_text_can_return_after_pop() {
        let mut queue = PendingQueue::default();
        queue.push("armado");
        queue.pop();
        assert_eq!(queue.push("armado"), EnqueueOutcome::Queued);
    }

    #[test]
    fn test_eviction_above_limit() {
        let mut queue = PendingQueue::default();
        for i in 0..21 {
            assert_eq!(queue.push(format!("msg {}", i)), EnqueueOutcome::Queued);
        }
        assert_eq!(queue.len(), 21);

        assert_eq!(
            queue.push("msg 21"),
            EnqueueOutcome::Evicted("msg 0".to_string())
        );
        assert_eq!(queue.len(), 21);
        assert_eq!(queue.iter().next(), Some("msg 1"));
        assert_eq!(queue.iter().last(), Some("msg 21"));
    }

    #[test]
    fn test_small_limit() {
        let mut queue = PendingQueue::new(1);
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.push("c"), EnqueueOutcome::Evicted("a".to_string()));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut queue = PendingQueue::default();
        queue.push("a");
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.limit(), DEFAULT_QUEUE_LIMIT);
    }
}

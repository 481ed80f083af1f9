//! Work queue of pending fetch requests
//!
//! A plain FIFO: no priorities, no capacity bound. The engine is its only
//! writer, so it needs no synchronization.

use crate::state::QueueEntry;
use crate::url::UrlResolver;
use crate::UrlError;
use std::collections::VecDeque;

/// Ordered sequence of pending fetch requests
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    entries: VecDeque<QueueEntry>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns the new length
    pub fn enqueue(&mut self, entry: QueueEntry) -> usize {
        self.entries.push_back(entry);
        self.entries.len()
    }

    /// Canonicalizes and enqueues `to`
    ///
    /// `from` is resolved against the base URL (a missing referrer means the
    /// base itself) and `to` against `from`. Nothing is enqueued if either
    /// cannot be canonicalized.
    pub fn add(
        &mut self,
        resolver: &UrlResolver,
        to: &str,
        from: Option<&str>,
    ) -> Result<usize, UrlError> {
        let from = match from {
            Some(from) => resolver.resolve(from, None)?,
            None => resolver.base().clone(),
        };
        let to = resolver.resolve(to, Some(from.as_str()))?;

        Ok(self.enqueue(QueueEntry::new(to, Some(from.into()))))
    }

    /// Removes and returns the head
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Returns the head without removing it
    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the entries out in queue order
    pub fn to_vec(&self) -> Vec<QueueEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl From<Vec<QueueEntry>> for WorkQueue {
    fn from(entries: Vec<QueueEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }
}

// src/core/scanner/queue.rs

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core::models::Candidate;

/// Ordered candidates waiting to be probed.
///
/// Workers share one queue and pop from the front under a short lock.
/// Duplicates are kept: a word listed twice is probed twice.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: Mutex<VecDeque<Candidate>>,
}

impl WorkQueue {
    pub fn new(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        Self {
            pending: Mutex::new(candidates.into_iter().collect()),
        }
    }

    /// Returns the next candidate in wordlist order, or `None` once exhausted.
    /// Never waits for new work.
    pub fn dequeue_next(&self) -> Option<Candidate> {
        // A poisoned lock only means another worker panicked mid-pop; the
        // deque itself is still consistent.
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

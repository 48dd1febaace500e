//! Frontier queue and visited set for one job
//!
//! Entries are served strictly first-in first-out, which gives breadth-first
//! order from the seed. Every URL is accepted into the queue at most once per
//! job, so it is also dequeued and exported at most once.

use crate::url::FrontierEntry;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// FIFO traversal queue with deduplication
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    /// Every URL ever accepted, queued or already dequeued
    seen: HashSet<Url>,
    /// URLs dequeued and attempted
    visited: HashSet<Url>,
}

impl Frontier {
    /// Creates a frontier seeded with `initial`, in order
    ///
    /// # Arguments
    ///
    /// * `initial` - Initial entries from the URL scoper
    ///
    /// # Returns
    ///
    /// A frontier containing every distinct initial URL once
    pub fn new(initial: Vec<FrontierEntry>) -> Self {
        let mut frontier = Self::default();
        for entry in initial {
            frontier.push(entry);
        }
        frontier
    }

    /// Enqueues an entry unless its URL was already accepted
    ///
    /// Returns true if the entry was queued.
    pub fn push(&mut self, entry: FrontierEntry) -> bool {
        if self.has_seen(&entry.url) {
            return false;
        }
        self.seen.insert(entry.url.clone());
        self.queue.push_back(entry);
        true
    }

    /// Removes and returns the oldest queued entry
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Records that `url` was dequeued; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.clone())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    /// Returns true if `url` is queued or visited
    pub fn has_seen(&self, url: &Url) -> bool {
        self.seen.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of entries still queued
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

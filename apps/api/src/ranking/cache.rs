//! Bounded LRU cache for job-description reads.
//!
//! Scoring runs frequently reuse the same on-disk job description; this cache
//! makes repeat reads free without growing unbounded. It is the only
//! synchronized state shared across concurrent document processing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

struct Entry {
    text: String,
    last_used: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<PathBuf, Entry>,
    tick: u64,
}

/// Read-through cache of reference-document text keyed by file path.
/// Holds at most `capacity` entries; inserting past capacity evicts the
/// least-recently-used path.
pub struct ReferenceCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl ReferenceCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the trimmed text of the file at `path`, reading it at most
    /// once per residency. A hit refreshes the entry's recency.
    pub fn read(&self, path: &Path) -> Result<String> {
        {
            let mut state = self.state.lock().expect("reference cache poisoned");
            state.tick += 1;
            let tick = state.tick;
            if let Some(entry) = state.entries.get_mut(path) {
                entry.last_used = tick;
                debug!(path = %path.display(), "reference cache hit");
                return Ok(entry.text.clone());
            }
        }

        // Read outside the lock; a concurrent miss on the same path just
        // reads twice and the second insert wins.
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job description {}", path.display()))?
            .trim()
            .to_string();

        let mut state = self.state.lock().expect("reference cache poisoned");
        state.tick += 1;
        let tick = state.tick;
        if state.entries.len() >= self.capacity && !state.entries.contains_key(path) {
            if let Some(evict) = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(p, _)| p.clone())
            {
                debug!(path = %evict.display(), "evicting least-recently-used reference");
                state.entries.remove(&evict);
            }
        }
        state.entries.insert(
            path.to_path_buf(),
            Entry {
                text: text.clone(),
                last_used: tick,
            },
        );
        Ok(text)
    }

    #[cfg(test)]
    fn contains(&self, path: &Path) -> bool {
        self.state
            .lock()
            .expect("reference cache poisoned")
            .entries
            .contains_key(path)
    }
}

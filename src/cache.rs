use crate::types::{Highlight, MatchId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

const CACHE_TTL: Duration = Duration::from_secs(10 * 60); // 10 minutes

/// Last known discovery outcome for one match.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub match_id: MatchId,
    pub highlights: Vec<Highlight>,
    /// `false` with an empty list is a negative entry: checked, nothing found.
    pub has_highlights: bool,
    pub stored_at: Instant,
}

/// Session-scoped highlight cache keyed by match. Expired entries are
/// dropped when read; there is no background sweep.
pub struct HighlightCache {
    entries: Mutex<HashMap<MatchId, CacheEntry>>,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, match_id: MatchId) -> Option<CacheEntry> {
        let mut guard = self.entries();
        let entry = guard.get(&match_id)?;
        if entry.stored_at.elapsed() > CACHE_TTL {
            debug!(match_id, "cache entry expired, evicting");
            guard.remove(&match_id);
            return None;
        }
        Some(entry.clone())
    }

    pub fn set(&self, match_id: MatchId, highlights: Vec<Highlight>, has_highlights: bool) {
        debug!(match_id, count = highlights.len(), has_highlights, "caching highlights");
        self.entries().insert(
            match_id,
            CacheEntry {
                match_id,
                highlights,
                has_highlights,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn clear_one(&self, match_id: MatchId) {
        self.entries().remove(&match_id);
    }

    /// Number of entries held, stale ones included until they are next read.
    pub fn size(&self) -> usize {
        self.entries().len()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<MatchId, CacheEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("highlight cache lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for HighlightCache {
    fn default() -> Self {
        Self::new()
    }
}

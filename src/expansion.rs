use crate::types::MatchId;
use std::sync::Mutex;
use tracing::debug;

/// Result of a toggle, so callers know which match lost its expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded { replaced: Option<MatchId> },
    Collapsed,
}

/// Tracks the one match expanded across every list.
pub struct ExpansionTracker {
    expanded: Mutex<Option<MatchId>>,
}

impl ExpansionTracker {
    pub fn new() -> Self {
        Self {
            expanded: Mutex::new(None),
        }
    }

    pub fn toggle(&self, match_id: MatchId) -> ToggleOutcome {
        let mut guard = match self.expanded.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard == Some(match_id) {
            *guard = None;
            debug!(match_id, "match collapsed");
            ToggleOutcome::Collapsed
        } else {
            let replaced = guard.replace(match_id);
            debug!(match_id, ?replaced, "match expanded");
            ToggleOutcome::Expanded { replaced }
        }
    }

    /// Clear the expansion. Returns the match that was expanded, if any.
    pub fn collapse_all(&self) -> Option<MatchId> {
        match self.expanded.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    pub fn is_expanded(&self, match_id: MatchId) -> bool {
        self.expanded_match() == Some(match_id)
    }

    pub fn expanded_match(&self) -> Option<MatchId> {
        match self.expanded.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Default for ExpansionTracker {
    fn default() -> Self {
        Self::new()
    }
}

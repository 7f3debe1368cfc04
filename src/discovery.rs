use crate::api::HighlightsApi;
use crate::cache::HighlightCache;
use crate::error::{ApiError, DiscoveryError};
use crate::types::{DiscoveryReport, FetchOutcome, MatchId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryState {
    #[default]
    Idle,
    Checking,
    Discovering,
    Displaying,
    Failed,
}

#[derive(Debug, Default)]
struct MatchSlot {
    /// Flight guard: id of the run currently owning this match.
    flight: Option<u64>,
    state: DiscoveryState,
    error: Option<DiscoveryError>,
    report: Option<DiscoveryReport>,
}

/// Walks each match through cache lookup, fetch, and remote discovery.
/// One run per match at a time; collapsed runs finish into the cache only.
pub struct DiscoveryOrchestrator {
    api: Arc<dyn HighlightsApi>,
    cache: Arc<HighlightCache>,
    slots: Mutex<HashMap<MatchId, MatchSlot>>,
    next_flight: AtomicU64,
}

impl DiscoveryOrchestrator {
    pub fn new(api: Arc<dyn HighlightsApi>, cache: Arc<HighlightCache>) -> Self {
        Self {
            api,
            cache,
            slots: Mutex::new(HashMap::new()),
            next_flight: AtomicU64::new(1),
        }
    }

    pub fn cache(&self) -> &HighlightCache {
        &self.cache
    }

    /// Make highlights for `match_id` available, discovering them if needed.
    ///
    /// Resolves to whether highlights exist. Never fails: boundary errors are
    /// recorded and exposed through [`discovery_error`](Self::discovery_error).
    /// Returns `false` without doing anything if a run for this match is
    /// already in flight.
    pub async fn orchestrate(&self, match_id: MatchId) -> bool {
        let Some(flight) = self.begin_flight(match_id) else {
            debug!(match_id, "discovery already in flight, ignoring trigger");
            return false;
        };

        let has_highlights = self.run(match_id, flight).await;
        self.finish_flight(match_id, flight);
        has_highlights
    }

    async fn run(&self, match_id: MatchId, flight: u64) -> bool {
        if let Some(entry) = self.cache.get(match_id) {
            debug!(match_id, has_highlights = entry.has_highlights, "cache hit");
            self.transition(match_id, flight, DiscoveryState::Displaying);
            return entry.has_highlights;
        }

        match self.api.fetch_existing(match_id).await {
            Ok(FetchOutcome::Found(highlights)) => {
                info!(match_id, count = highlights.len(), "found stored highlights");
                self.cache.set(match_id, highlights, true);
                self.transition(match_id, flight, DiscoveryState::Displaying);
                return true;
            }
            Ok(FetchOutcome::Empty) => {}
            Err(e) => return self.fail(match_id, flight, "fetch existing highlights", &e),
        }

        self.transition(match_id, flight, DiscoveryState::Discovering);
        info!(match_id, "no stored highlights, triggering discovery");

        let report = match self.api.trigger_discovery(match_id).await {
            Ok(report) => report,
            Err(e) => return self.fail(match_id, flight, "trigger discovery", &e),
        };
        info!(
            match_id,
            videos_found = report.videos_found,
            highlights_stored = report.highlights_stored,
            "discovery finished"
        );
        self.record_report(match_id, flight, report);

        match self.api.fetch_existing(match_id).await {
            Ok(FetchOutcome::Found(highlights)) => {
                self.cache.set(match_id, highlights, true);
                self.transition(match_id, flight, DiscoveryState::Displaying);
                true
            }
            Ok(FetchOutcome::Empty) => {
                info!(match_id, "discovery found no highlights");
                self.cache.set(match_id, Vec::new(), false);
                self.transition(match_id, flight, DiscoveryState::Displaying);
                false
            }
            Err(e) => self.fail(match_id, flight, "re-fetch highlights", &e),
        }
    }

    /// Record a classified failure. The cache is left untouched so the next
    /// attempt retries instead of remembering a transient error.
    fn fail(&self, match_id: MatchId, flight: u64, step: &str, error: &ApiError) -> bool {
        let discovery_error = DiscoveryError::from_api(error);
        warn!(match_id, kind = ?discovery_error.kind, "failed to {step}: {error}");

        let mut slots = self.slots();
        if let Some(slot) = current_slot(&mut slots, match_id, flight) {
            slot.state = DiscoveryState::Failed;
            slot.error = Some(discovery_error);
        }
        false
    }

    fn begin_flight(&self, match_id: MatchId) -> Option<u64> {
        let mut slots = self.slots();
        let slot = slots.entry(match_id).or_default();
        if slot.flight.is_some() {
            return None;
        }
        let flight = self.next_flight.fetch_add(1, Ordering::Relaxed);
        slot.flight = Some(flight);
        slot.state = DiscoveryState::Checking;
        slot.error = None;
        Some(flight)
    }

    fn finish_flight(&self, match_id: MatchId, flight: u64) {
        let mut slots = self.slots();
        match current_slot(&mut slots, match_id, flight) {
            Some(slot) => slot.flight = None,
            None => debug!(match_id, flight, "stale discovery run completed after collapse"),
        }
    }

    fn transition(&self, match_id: MatchId, flight: u64, state: DiscoveryState) {
        let mut slots = self.slots();
        if let Some(slot) = current_slot(&mut slots, match_id, flight) {
            debug!(match_id, from = ?slot.state, to = ?state, "discovery state");
            slot.state = state;
        }
    }

    fn record_report(&self, match_id: MatchId, flight: u64, report: DiscoveryReport) {
        let mut slots = self.slots();
        if let Some(slot) = current_slot(&mut slots, match_id, flight) {
            slot.report = Some(report);
        }
    }

    /// Reset a collapsed match to `Idle`: guard, error, and report are
    /// dropped. An outstanding remote call keeps running.
    pub fn collapse(&self, match_id: MatchId) {
        if let Some(slot) = self.slots().remove(&match_id) {
            if slot.flight.is_some() {
                debug!(match_id, "collapsed with discovery still in flight");
            }
        }
    }

    /// `collapse` for every match the orchestrator knows about.
    pub fn collapse_all(&self) {
        let mut slots = self.slots();
        let in_flight = slots.values().filter(|s| s.flight.is_some()).count();
        debug!(matches = slots.len(), in_flight, "collapsing all matches");
        slots.clear();
    }

    pub fn state(&self, match_id: MatchId) -> DiscoveryState {
        self.slots()
            .get(&match_id)
            .map(|slot| slot.state)
            .unwrap_or_default()
    }

    pub fn is_in_flight(&self, match_id: MatchId) -> bool {
        self.slots()
            .get(&match_id)
            .is_some_and(|slot| slot.flight.is_some())
    }

    pub fn discovery_error(&self, match_id: MatchId) -> Option<DiscoveryError> {
        self.slots()
            .get(&match_id)
            .and_then(|slot| slot.error.clone())
    }

    pub fn clear_discovery_error(&self, match_id: MatchId) {
        if let Some(slot) = self.slots().get_mut(&match_id) {
            slot.error = None;
            if slot.state == DiscoveryState::Failed {
                slot.state = DiscoveryState::Idle;
            }
        }
    }

    /// Report from the last successful discovery trigger for this match.
    pub fn last_report(&self, match_id: MatchId) -> Option<DiscoveryReport> {
        self.slots()
            .get(&match_id)
            .and_then(|slot| slot.report.clone())
    }

    pub async fn discovery_status(&self) -> Result<serde_json::Value, ApiError> {
        self.api.discovery_status().await
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<MatchId, MatchSlot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The slot for `match_id`, only while `flight` still owns it.
fn current_slot<'a>(
    slots: &'a mut HashMap<MatchId, MatchSlot>,
    match_id: MatchId,
    flight: u64,
) -> Option<&'a mut MatchSlot> {
    slots
        .get_mut(&match_id)
        .filter(|slot| slot.flight == Some(flight))
}

use crate::discovery::DiscoveryState;
use crate::error::ErrorKind;
use crate::expansion::ToggleOutcome;
use crate::types::{Highlight, MatchId};
use crate::AppState;
use serde::Serialize;
use tracing::info;

/// Everything a match card needs to render its highlight section.
#[derive(Debug, Clone, Serialize)]
pub struct MatchPanel {
    pub match_id: MatchId,
    pub expanded: bool,
    pub state: DiscoveryState,
    pub highlights: Vec<Highlight>,
    pub has_highlights: bool,
    pub error: Option<String>,
    pub rate_limited: bool,
}

/// Expand or collapse a match. Expanding runs discovery for it; expanding a
/// different match collapses the previous one first.
pub async fn toggle_match(match_id: MatchId, app: &AppState) -> MatchPanel {
    match app.expansion.toggle(match_id) {
        ToggleOutcome::Collapsed => app.discovery.collapse(match_id),
        ToggleOutcome::Expanded { replaced } => {
            if let Some(previous) = replaced {
                app.discovery.collapse(previous);
            }
            app.discovery.orchestrate(match_id).await;
        }
    }
    match_panel(match_id, app)
}

/// Collapse the expanded match, if any, and reset every match the
/// orchestrator still tracks, including ones touched by `refresh_match`.
pub fn collapse_all(app: &AppState) {
    if let Some(previous) = app.expansion.collapse_all() {
        info!(match_id = previous, "collapsing expanded match");
    }
    app.discovery.collapse_all();
}

pub fn match_panel(match_id: MatchId, app: &AppState) -> MatchPanel {
    let cached = app.discovery.cache().get(match_id);
    let error = app.discovery.discovery_error(match_id);

    MatchPanel {
        match_id,
        expanded: app.expansion.is_expanded(match_id),
        state: app.discovery.state(match_id),
        has_highlights: cached.as_ref().is_some_and(|c| c.has_highlights),
        highlights: cached.map(|c| c.highlights).unwrap_or_default(),
        rate_limited: error
            .as_ref()
            .is_some_and(|e| e.kind == ErrorKind::RateLimited),
        error: error.map(|e| e.to_string()),
    }
}

pub fn dismiss_error(match_id: MatchId, app: &AppState) {
    app.discovery.clear_discovery_error(match_id);
}

/// Drop what is cached for a match and discover again.
pub async fn refresh_match(match_id: MatchId, app: &AppState) -> Result<MatchPanel, String> {
    if app.discovery.is_in_flight(match_id) {
        return Err(format!("Highlight discovery already running for match {match_id}"));
    }
    info!(match_id, "refreshing highlights");
    app.discovery.cache().clear_one(match_id);
    app.discovery.orchestrate(match_id).await;
    Ok(match_panel(match_id, app))
}

pub fn clear_cache(app: &AppState) {
    app.discovery.cache().clear();
}

pub fn cache_size(app: &AppState) -> usize {
    app.discovery.cache().size()
}

pub async fn discovery_status(app: &AppState) -> Result<serde_json::Value, String> {
    app.discovery
        .discovery_status()
        .await
        .map_err(|e| format!("Failed to get AI discovery status: {e}"))
}

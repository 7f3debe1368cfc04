use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a match, as issued by the backend.
pub type MatchId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: i64,
    pub title: String,
    pub youtube_url: String,
    pub thumbnail_url: Option<String>,
    pub channel_name: Option<String>,
    pub view_count: Option<u64>,
    pub duration_seconds: Option<u32>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Highlight {
    /// Embeddable player URL for the source video. Falls back to the raw
    /// reference when no video id can be extracted.
    pub fn embed_url(&self) -> String {
        match youtube_video_id(&self.youtube_url) {
            Some(id) => format!(
                "https://www.youtube.com/embed/{id}?autoplay=1&rel=0&modestbranding=1"
            ),
            None => self.youtube_url.clone(),
        }
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

/// Extract the video id from watch, short-link, or embed URLs.
fn youtube_video_id(url: &str) -> Option<&str> {
    const PREFIXES: [&str; 3] = ["youtube.com/watch?v=", "youtu.be/", "youtube.com/embed/"];

    let rest = PREFIXES
        .iter()
        .find_map(|prefix| url.find(*prefix).map(|pos| &url[pos + prefix.len()..]))?;
    let end = rest
        .find(|c| matches!(c, '&' | '?' | '#' | '\n'))
        .unwrap_or(rest.len());
    let id = &rest[..end];
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Format a duration as `m:ss`; zero or missing durations render as "N/A".
pub fn format_duration(seconds: Option<u32>) -> String {
    match seconds {
        Some(s) if s > 0 => format!("{}:{:02}", s / 60, s % 60),
        _ => "N/A".to_string(),
    }
}

/// Payload returned by the trigger-discovery endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    #[serde(default)]
    pub videos_found: u32,
    #[serde(default)]
    pub highlights_stored: u32,
    #[serde(default)]
    pub best_videos: Vec<Highlight>,
}

/// `{ success, data, message }` envelope shared by every backend response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// Error body attached to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// Outcome of the fetch-existing boundary call. An empty result is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(Vec<Highlight>),
    Empty,
}

impl FetchOutcome {
    pub fn from_highlights(highlights: Vec<Highlight>) -> Self {
        if highlights.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Found(highlights)
        }
    }
}

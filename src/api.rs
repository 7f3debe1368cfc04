use crate::config::Config;
use crate::error::ApiError;
use crate::types::{ApiEnvelope, DiscoveryReport, ErrorBody, FetchOutcome, Highlight, MatchId};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Remote highlight boundary consumed by the discovery orchestrator.
#[async_trait]
pub trait HighlightsApi: Send + Sync {
    /// Highlights already stored for a match. No stored highlights is `Empty`, not an error.
    async fn fetch_existing(&self, match_id: MatchId) -> Result<FetchOutcome, ApiError>;

    /// Ask the backend to search for and store highlights for a match.
    async fn trigger_discovery(&self, match_id: MatchId) -> Result<DiscoveryReport, ApiError>;

    /// Status document of the discovery service, passed through untouched.
    async fn discovery_status(&self) -> Result<serde_json::Value, ApiError>;
}

/// `HighlightsApi` over the Hilites REST backend.
pub struct HttpHighlightsApi {
    client: Client,
    base_url: String,
}

impl HttpHighlightsApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        if !config.api_url.starts_with("http://") && !config.api_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(config.api_url.clone()));
        }
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    fn highlights_url(&self, match_id: MatchId) -> String {
        format!("{}/ai/highlights/{match_id}", self.base_url)
    }

    fn discover_url(&self, match_id: MatchId) -> String {
        format!("{}/ai/discover/{match_id}", self.base_url)
    }

    fn status_url(&self) -> String {
        format!("{}/ai/status", self.base_url)
    }
}

#[async_trait]
impl HighlightsApi for HttpHighlightsApi {
    async fn fetch_existing(&self, match_id: MatchId) -> Result<FetchOutcome, ApiError> {
        let url = self.highlights_url(match_id);
        debug!(match_id, %url, "fetching existing highlights");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        let highlights: Option<Vec<Highlight>> =
            parse_response(status, &body, "Failed to get AI discovered highlights")?;
        Ok(FetchOutcome::from_highlights(highlights.unwrap_or_default()))
    }

    async fn trigger_discovery(&self, match_id: MatchId) -> Result<DiscoveryReport, ApiError> {
        let url = self.discover_url(match_id);
        debug!(match_id, %url, "triggering highlight discovery");
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        let report: Option<DiscoveryReport> =
            parse_response(status, &body, "Failed to discover highlights")?;
        Ok(report.unwrap_or_default())
    }

    async fn discovery_status(&self) -> Result<serde_json::Value, ApiError> {
        let resp = self.client.get(self.status_url()).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        let data: Option<serde_json::Value> =
            parse_response(status, &body, "Failed to get AI discovery status")?;
        Ok(data.unwrap_or(serde_json::Value::Null))
    }
}

/// Turn a raw response into the envelope's `data`. Non-2xx statuses become
/// `ApiError::Http`; `success: false` becomes `ApiError::Rejected`.
fn parse_response<T: DeserializeOwned>(
    status: u16,
    body: &str,
    default_message: &str,
) -> Result<Option<T>, ApiError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        return Err(ApiError::Http { status, message });
    }

    let envelope: ApiEnvelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if !envelope.success {
        return Err(ApiError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| default_message.to_string()),
        ));
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{classify, ErrorKind};

    #[test]
    fn test_new_rejects_non_http_url() {
        let config = Config::default().with_api_url("localhost:3000/api");
        assert!(matches!(
            HttpHighlightsApi::new(&config),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_url_construction() {
        let config = Config::default().with_api_url("https://hilites.example.com/api/");
        let api = HttpHighlightsApi::new(&config).unwrap();
        assert_eq!(
            api.highlights_url(42),
            "https://hilites.example.com/api/ai/highlights/42"
        );
        assert_eq!(api.discover_url(7), "https://hilites.example.com/api/ai/discover/7");
        assert_eq!(api.status_url(), "https://hilites.example.com/api/ai/status");
    }

    #[tokio::test]
    async fn test_connection_failure_is_generic_whatever_the_match_id() {
        let config = Config::default().with_api_url("http://127.0.0.1:1/api");
        let api = HttpHighlightsApi::new(&config).unwrap();

        for match_id in [1, 429, 14290, 404] {
            let err = api.fetch_existing(match_id).await.unwrap_err();
            assert!(matches!(err, ApiError::Transport(_)));
            assert!(
                !err.to_string().contains("/ai/highlights/"),
                "request URL leaked into {err}"
            );
            assert_eq!(classify(&err), ErrorKind::Generic, "match {match_id}: {err}");
        }
    }

    #[test]
    fn test_parse_highlights_found() {
        let body = r#"{
            "success": true,
            "data": [
                {"id": 1, "title": "Extended highlights", "youtube_url": "https://youtu.be/a",
                 "channel_name": "Premier League", "view_count": 120000, "duration_seconds": 612},
                {"id": 2, "title": "All goals", "youtube_url": "https://youtu.be/b"}
            ]
        }"#;
        let data: Option<Vec<Highlight>> = parse_response(200, body, "x").unwrap();
        let outcome = FetchOutcome::from_highlights(data.unwrap_or_default());
        match outcome {
            FetchOutcome::Found(hs) => {
                assert_eq!(hs.len(), 2);
                assert_eq!(hs[0].title, "Extended highlights");
                assert_eq!(hs[0].duration_seconds, Some(612));
            }
            FetchOutcome::Empty => panic!("expected highlights"),
        }
    }

    #[test]
    fn test_parse_highlights_empty_is_not_error() {
        let body = r#"{"success": true, "data": []}"#;
        let data: Option<Vec<Highlight>> = parse_response(200, body, "x").unwrap();
        assert_eq!(
            FetchOutcome::from_highlights(data.unwrap_or_default()),
            FetchOutcome::Empty
        );
    }

    #[test]
    fn test_parse_success_false_is_rejected() {
        let body = r#"{"success": false, "message": "Match has not finished yet"}"#;
        let err = parse_response::<Vec<Highlight>>(200, body, "default").unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Match has not finished yet"));
    }

    #[test]
    fn test_parse_success_false_without_message_uses_default() {
        let body = r#"{"success": false}"#;
        let err = parse_response::<Vec<Highlight>>(200, body, "Failed to discover highlights")
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to discover highlights");
    }

    #[test]
    fn test_parse_429_with_message_body() {
        let body = r#"{"message": "Too many requests, please try again later."}"#;
        let err = parse_response::<DiscoveryReport>(429, body, "x").unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(classify(&err), ErrorKind::RateLimited);
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn test_parse_error_status_without_body() {
        let err = parse_response::<DiscoveryReport>(502, "<html>Bad Gateway</html>", "x")
            .unwrap_err();
        assert_eq!(err.to_string(), "502: HTTP error! status: 502");
        assert_eq!(classify(&err), ErrorKind::Generic);
    }

    #[test]
    fn test_parse_malformed_success_body() {
        let err = parse_response::<Vec<Highlight>>(200, "not json", "x").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_parse_discovery_report() {
        let body = r#"{
            "success": true,
            "data": {
                "videosFound": 3,
                "highlightsStored": 3,
                "bestVideos": [{"id": 9, "title": "Best", "youtube_url": "https://youtu.be/z"}]
            }
        }"#;
        let report: Option<DiscoveryReport> = parse_response(200, body, "x").unwrap();
        let report = report.unwrap();
        assert_eq!(report.videos_found, 3);
        assert_eq!(report.best_videos[0].id, 9);
    }
}

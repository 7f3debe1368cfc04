use std::time::Duration;
use tracing::warn;

const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "Hilites/1.0";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the Hilites backend, without a trailing slash.
    pub api_url: String,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Read `HILITES_API_URL`, `HILITES_HTTP_TIMEOUT_SECS` and `HILITES_USER_AGENT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("HILITES_API_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_base_url(&v))
            .unwrap_or(defaults.api_url);

        let http_timeout = match lookup("HILITES_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!("Ignoring invalid HILITES_HTTP_TIMEOUT_SECS={raw:?}");
                    defaults.http_timeout
                }
            },
            None => defaults.http_timeout,
        };

        let user_agent = lookup("HILITES_USER_AGENT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.user_agent);

        Self {
            api_url,
            http_timeout,
            user_agent,
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_base_url(api_url);
        self
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "http://localhost:3000/api");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("HILITES_API_URL", "https://hilites.example.com/api/"),
            ("HILITES_HTTP_TIMEOUT_SECS", "5"),
            ("HILITES_USER_AGENT", "HilitesTest/0.1"),
        ]));
        assert_eq!(config.api_url, "https://hilites.example.com/api");
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "HilitesTest/0.1");
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("HILITES_HTTP_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.http_timeout, Duration::from_secs(30));

        let config = Config::from_lookup(lookup_from(&[("HILITES_HTTP_TIMEOUT_SECS", "0")]));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_with_api_url_strips_trailing_slash() {
        let config = Config::default().with_api_url("http://10.0.0.2:3000/api//");
        assert_eq!(config.api_url, "http://10.0.0.2:3000/api");
    }
}

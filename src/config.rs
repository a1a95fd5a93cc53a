//! Runtime configuration read from the environment.

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://www.producthunt.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Every 30 minutes, on the minute.
pub const DEFAULT_CACHE_CLEAR_CRON: &str = "0 */30 * * * *";

/// Settings for the transport, the scout and the `watch` loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub cache_clear_cron: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_clear_cron: DEFAULT_CACHE_CLEAR_CRON.to_string(),
        }
    }
}

impl Config {
    /// Reads `LAUNCH_SCOUT_*` variables; call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Blank or invalid values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = value("LAUNCH_SCOUT_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);

        let timeout = match value("LAUNCH_SCOUT_TIMEOUT_SECS") {
            None => defaults.timeout,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(
                        "LAUNCH_SCOUT_TIMEOUT_SECS={raw} is not a positive number of seconds, using {}s",
                        defaults.timeout.as_secs()
                    );
                    defaults.timeout
                }
            },
        };

        Self {
            base_url,
            user_agent: value("LAUNCH_SCOUT_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout,
            cache_clear_cron: value("LAUNCH_SCOUT_CACHE_CLEAR_CRON")
                .unwrap_or(defaults.cache_clear_cron),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("LAUNCH_SCOUT_BASE_URL", "http://127.0.0.1:8080/"),
            ("LAUNCH_SCOUT_USER_AGENT", "test-agent"),
            ("LAUNCH_SCOUT_TIMEOUT_SECS", "3"),
            ("LAUNCH_SCOUT_CACHE_CLEAR_CRON", "0 0 * * * *"),
        ]);
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.cache_clear_cron, "0 0 * * * *");
    }

    #[test]
    fn bad_timeouts_fall_back() {
        for raw in ["0", "-5", "soon", "  "] {
            let config = config_from(&[("LAUNCH_SCOUT_TIMEOUT_SECS", raw)]);
            assert_eq!(config.timeout, DEFAULT_TIMEOUT, "timeout {raw:?}");
        }
    }

    #[test]
    fn blank_values_fall_back() {
        let config = config_from(&[("LAUNCH_SCOUT_BASE_URL", " "), ("LAUNCH_SCOUT_USER_AGENT", "")]);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}

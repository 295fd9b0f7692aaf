//! Monitor Configuration
//!
//! Defaults mirror the reference dashboard: poll every 5 seconds, keep at
//! most 100 history points, prefer EDA over HR over temperature over
//! acceleration when picking a channel to plot.

use std::env;
use std::time::Duration;

use crate::client::Subject;

/// Configuration for the live-refresh pipeline.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the data service.
    pub base_url: String,
    /// Monitored participant.
    pub subject: Subject,
    /// Delay between the end of one refresh cycle and the start of the next.
    pub poll_interval: Duration,
    /// Per-request timeout; a hung request surfaces as a transport failure
    /// instead of wedging the in-flight guard forever.
    pub request_timeout: Duration,
    /// Maximum number of display history points.
    pub history_cap: usize,
    /// Channel-name substrings, most preferred first.
    pub preferences: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            subject: Subject::new("S2"),
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            history_cap: 100,
            preferences: vec![
                "eda".to_string(),
                "hr".to_string(),
                "temp".to_string(),
                "acc".to_string(),
            ],
        }
    }
}

impl MonitorConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("MONITOR_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(subject) = env::var("MONITOR_SUBJECT") {
            config.subject = Subject::new(subject);
        }
        if let Ok(secs) = env::var("MONITOR_POLL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.poll_interval = Duration::from_secs(secs);
            }
        }
        if let Ok(secs) = env::var("MONITOR_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(cap) = env::var("MONITOR_HISTORY_CAP") {
            if let Ok(cap) = cap.parse() {
                config.history_cap = cap;
            }
        }
        if let Ok(prefs) = env::var("MONITOR_CHANNELS") {
            let prefs: Vec<String> = prefs
                .split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
            if !prefs.is_empty() {
                config.preferences = prefs;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.history_cap, 100);
        assert_eq!(config.preferences, vec!["eda", "hr", "temp", "acc"]);
        assert_eq!(config.subject.normalized(), "2");
    }
}

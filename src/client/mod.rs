//! Data Service Client
//!
//! Thin HTTP boundary over the remote data service. Non-2xx responses are
//! surfaced as explicit failures carrying the status code and body text,
//! never silently returned as partial data.

mod params;

pub use params::{ParamsSpec, RangeSpec, Subject};

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::error::MonitorError;

/// Whether to request the large initial payload or the lightweight summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Full,
    Summary,
}

impl FetchMode {
    fn flag(self) -> &'static str {
        match self {
            FetchMode::Full => "1",
            FetchMode::Summary => "0",
        }
    }
}

/// Participant discovery index, keyed by source file.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantsIndex {
    #[serde(default)]
    pub subjects_by_file: HashMap<String, Vec<String>>,
}

/// One server-computed history window.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub score: Option<f64>,
}

/// Server-side stress assessment with optional windowed history.
#[derive(Debug, Clone, Deserialize)]
pub struct StressState {
    pub state: Option<String>,
    pub trend: Option<String>,
    pub score: Option<f64>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl StressState {
    /// Map the server history to display points: drop entries without a
    /// numeric score, clamp to [0, 100], keep the most recent `cap`.
    pub fn score_history(&self, cap: usize) -> Vec<u8> {
        let mut points: Vec<u8> = self
            .history
            .iter()
            .filter_map(|h| h.score)
            .filter(|s| s.is_finite())
            .map(|s| s.round().clamp(0.0, 100.0) as u8)
            .collect();
        if points.len() > cap {
            points.drain(..points.len() - cap);
        }
        points
    }
}

/// Active dataset directory on the service side.
#[derive(Debug, Clone, Deserialize)]
pub struct DataDirInfo {
    pub data_dir: String,
    #[serde(default)]
    pub files: Vec<String>,
}

/// HTTP client for the data service endpoints the dashboard consumes.
pub struct DataServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl DataServiceClient {
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Primary participant payload: `state`, `trend`, `score` and (in full
    /// mode) the `available_signals` location→channel structure.
    pub async fn fetch_participant(
        &self,
        subject: &Subject,
        params: Option<&ParamsSpec>,
        mode: FetchMode,
    ) -> Result<Value, MonitorError> {
        let id = ensure_subject(subject)?;
        let mut url = format!(
            "{}/participant/{}?allow_unpickle=1",
            self.base_url,
            urlencoding::encode(id)
        );
        if let Some(params) = params {
            url.push_str("&params=");
            url.push_str(&urlencoding::encode(&params.to_query()).into_owned());
        }
        url.push_str("&full=");
        url.push_str(mode.flag());
        self.get_json(&url).await
    }

    /// Range-scoped participant payload used by the secondary viewer surface.
    pub async fn fetch_participant_range(
        &self,
        subject: &Subject,
        range: &RangeSpec,
        params: Option<&ParamsSpec>,
        mode: FetchMode,
    ) -> Result<Value, MonitorError> {
        let id = ensure_subject(subject)?;
        let mut url = format!(
            "{}/api/participant/{}?allow_unpickle=1&range={}",
            self.base_url,
            urlencoding::encode(id),
            urlencoding::encode(range.as_str())
        );
        if let Some(params) = params {
            url.push_str("&params=");
            url.push_str(&urlencoding::encode(&params.to_query()).into_owned());
        }
        url.push_str("&full=");
        url.push_str(mode.flag());
        self.get_json(&url).await
    }

    /// Discover which subjects each dataset file contains.
    pub async fn list_participants(&self) -> Result<ParticipantsIndex, MonitorError> {
        let url = format!(
            "{}/api/participants?allow_unpickle=1&search_all=1",
            self.base_url
        );
        let value = self.get_json(&url).await?;
        serde_json::from_value(value)
            .map_err(|e| MonitorError::Payload(format!("participants index: {e}")))
    }

    /// Server-computed stress assessment over the requested windows.
    pub async fn fetch_stress_state(
        &self,
        subject: &Subject,
        windows: u32,
        window_size: u32,
    ) -> Result<StressState, MonitorError> {
        ensure_subject(subject)?;
        let url = format!(
            "{}/api/stress_state?subject={}&windows={}&window_size={}&allow_unpickle=1",
            self.base_url,
            urlencoding::encode(subject.as_str()),
            windows,
            window_size
        );
        let value = self.get_json(&url).await?;
        serde_json::from_value(value)
            .map_err(|e| MonitorError::Payload(format!("stress state: {e}")))
    }

    /// Select the server-side active dataset directory. Non-idempotent; the
    /// subject-scoped queries implicitly depend on it.
    pub async fn select_data_dir(&self, dir: &str) -> Result<DataDirInfo, MonitorError> {
        let url = format!("{}/data_dir?dir={}", self.base_url, urlencoding::encode(dir));
        let value = self.get_json(&url).await?;
        serde_json::from_value(value)
            .map_err(|e| MonitorError::Payload(format!("data dir info: {e}")))
    }

    async fn get_json(&self, url: &str) -> Result<Value, MonitorError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| MonitorError::Payload(format!("undecodable JSON body: {e}")))
    }
}

fn ensure_subject(subject: &Subject) -> Result<&str, MonitorError> {
    let id = subject.normalized();
    if id.is_empty() {
        return Err(MonitorError::Validation("empty subject selection".to_string()));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_history_clamps_and_caps() {
        let state: StressState = serde_json::from_value(json!({
            "state": "stres",
            "trend": "rising",
            "score": 87.2,
            "history": [
                {"score": -4.0},
                {"score": 42.4},
                {"score": null},
                {"score": 141.0},
                {"score": 99.6}
            ]
        }))
        .unwrap();

        assert_eq!(state.score_history(100), vec![0, 42, 100, 100]);
        // most recent entries win when the cap is smaller than the history
        assert_eq!(state.score_history(2), vec![100, 100]);
    }

    #[test]
    fn test_stress_state_tolerates_missing_fields() {
        let state: StressState = serde_json::from_value(json!({
            "state": "neutralny",
            "trend": null,
            "score": null
        }))
        .unwrap();
        assert!(state.history.is_empty());
        assert!(state.score_history(10).is_empty());
    }
}

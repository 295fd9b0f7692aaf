//! Query-Parameter Value Types
//!
//! Everything the data service accepts in its query string gets validated
//! here, before a request is ever issued: subject tokens, `start:end` sample
//! ranges, and the `TEMP:100,EDA`-style channel filter CSV.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::MonitorError;

lazy_static! {
    static ref RANGE_RE: Regex = Regex::new(r"^\d*:\d*$").expect("range regex is valid");
}

/// Identifier for a monitored participant.
///
/// The data service keys participants by bare number, while the UI and the
/// dataset files use `S`-prefixed tokens, so `normalized` strips a leading
/// non-digit prefix when the remainder is all digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(String);

impl Subject {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    /// Raw token as supplied by the caller.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"S2"` → `"2"`, `"s10"` → `"10"`; purely numeric or non-conforming
    /// tokens pass through unchanged.
    pub fn normalized(&self) -> &str {
        match self.0.find(|c: char| c.is_ascii_digit()) {
            Some(idx) if idx > 0 && self.0[idx..].chars().all(|c| c.is_ascii_digit()) => {
                &self.0[idx..]
            }
            _ => &self.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated `start:end` sample range, both ends optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec(String);

impl RangeSpec {
    /// Accepts only `^\d*:\d*$`; everything else is rejected client-side
    /// before any fetch.
    pub fn parse(spec: &str) -> Result<Self, MonitorError> {
        let spec = spec.trim();
        if RANGE_RE.is_match(spec) {
            Ok(Self(spec.to_string()))
        } else {
            Err(MonitorError::Validation(format!(
                "malformed range spec '{spec}', expected digits in the form start:end"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamEntry {
    name: String,
    count: Option<usize>,
}

/// Channel filter passed as the `params` query value.
///
/// Each entry is a channel name, optionally with a per-channel sample count
/// (`TEMP:100`). The service matches names case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsSpec {
    entries: Vec<ParamEntry>,
}

impl ParamsSpec {
    /// Parse a `TEMP:100,EDA`-style CSV filter.
    pub fn parse(csv: &str) -> Result<Self, MonitorError> {
        let mut entries = Vec::new();
        for part in csv.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once(':') {
                Some((name, count)) => {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(MonitorError::Validation(format!(
                            "params entry '{part}' has no channel name"
                        )));
                    }
                    let count = count.trim().parse::<usize>().map_err(|_| {
                        MonitorError::Validation(format!(
                            "invalid sample count in params entry '{part}'"
                        ))
                    })?;
                    entries.push(ParamEntry {
                        name: name.to_string(),
                        count: Some(count),
                    });
                }
                None => entries.push(ParamEntry {
                    name: part.to_string(),
                    count: None,
                }),
            }
        }
        if entries.is_empty() {
            return Err(MonitorError::Validation(
                "params filter selects no channels".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    /// Serialize back to the CSV form the service expects.
    pub fn to_query(&self) -> String {
        self.entries
            .iter()
            .map(|e| match e.count {
                Some(count) => format!("{}:{}", e.name, count),
                None => e.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

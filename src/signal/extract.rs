//! Signal Locator / Extractor
//!
//! The data service summarizes channel series into a handful of wrapper
//! shapes depending on dataset and mode: a flat array, `{data: [...]}`,
//! `{full: [...]}`, `{full: {location: [...]}}`, or an arbitrary object
//! whose values contain an array somewhere. Each recognized shape gets one
//! matched case instead of cascading type checks.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::MonitorError;

/// A channel series found in a payload, with its origin recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedSignal {
    pub location: String,
    pub channel: String,
    pub samples: Vec<f64>,
}

/// The closed set of wrapper shapes a channel value may arrive in.
enum SeriesShape<'a> {
    Flat(&'a [Value]),
    DataWrapped(&'a [Value]),
    FullArray(&'a [Value]),
    FullObject(&'a Map<String, Value>),
    Object(&'a Map<String, Value>),
}

fn classify(value: &Value) -> Option<SeriesShape<'_>> {
    match value {
        Value::Array(items) => Some(SeriesShape::Flat(items)),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("data") {
                return Some(SeriesShape::DataWrapped(items));
            }
            match map.get("full") {
                Some(Value::Array(items)) => Some(SeriesShape::FullArray(items)),
                Some(Value::Object(inner)) => Some(SeriesShape::FullObject(inner)),
                _ => Some(SeriesShape::Object(map)),
            }
        }
        _ => None,
    }
}

/// Unwrap a sample that may arrive singly- or doubly-nested (`x`, `[x]`,
/// `[[x]]`): take the first element recursively, at most two levels, and
/// discard anything that is not a finite number afterwards.
fn unwrap_sample(value: &Value) -> Option<f64> {
    fn step(value: &Value, depth: u8) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::Array(items) if depth < 2 => items.first().and_then(|v| step(v, depth + 1)),
            _ => None,
        }
    }
    step(value, 0)
}

fn samples_from(items: &[Value]) -> Option<Vec<f64>> {
    let samples: Vec<f64> = items.iter().filter_map(unwrap_sample).collect();
    if samples.is_empty() {
        None
    } else {
        Some(samples)
    }
}

fn first_array_in(map: &Map<String, Value>) -> Option<&[Value]> {
    map.values().find_map(|v| v.as_array().map(Vec::as_slice))
}

/// Coerce a channel value into a flat numeric series, whatever wrapper it
/// arrived in. Returns `None` when no numeric samples survive.
pub fn extract_series(value: &Value) -> Option<Vec<f64>> {
    match classify(value)? {
        SeriesShape::Flat(items)
        | SeriesShape::DataWrapped(items)
        | SeriesShape::FullArray(items) => samples_from(items),
        SeriesShape::FullObject(map) | SeriesShape::Object(map) => {
            first_array_in(map).and_then(samples_from)
        }
    }
}

/// Location→channel mapping from a payload: either the mapping itself or
/// the same mapping nested one level under a `full` key.
pub fn signals_map(signals: &Value) -> Option<&Map<String, Value>> {
    let map = signals.as_object()?;
    match map.get("full") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(map),
    }
}

/// Find the first channel whose lowercase name contains one of the preferred
/// substrings and whose value yields a numeric series.
///
/// Traversal is in encounter order, locations outer and channels inner, and
/// the first match wins; when no preferred name matches anywhere, the first
/// channel with any extractable series is returned instead.
pub fn locate_signal<S: AsRef<str>>(
    signals: &Value,
    preferences: &[S],
) -> Result<LocatedSignal, MonitorError> {
    let locations = signals_map(signals)
        .ok_or_else(|| MonitorError::Payload("signals are not a location mapping".to_string()))?;

    let mut fallback: Option<LocatedSignal> = None;

    for (location, channels) in locations {
        let Some(channels) = channels.as_object() else {
            continue;
        };
        for (channel, value) in channels {
            let lower = channel.to_lowercase();
            let preferred = preferences.iter().any(|p| lower.contains(p.as_ref()));
            if !preferred && fallback.is_some() {
                continue;
            }
            let Some(samples) = extract_series(value) else {
                continue;
            };
            let located = LocatedSignal {
                location: location.clone(),
                channel: channel.clone(),
                samples,
            };
            if preferred {
                debug!(
                    location = %located.location,
                    channel = %located.channel,
                    samples = located.samples.len(),
                    "matched preferred channel"
                );
                return Ok(located);
            }
            fallback = Some(located);
        }
    }

    match fallback {
        Some(located) => {
            debug!(
                location = %located.location,
                channel = %located.channel,
                "no preferred channel matched, falling back to first extractable"
            );
            Ok(located)
        }
        None => Err(MonitorError::NoUsableSignal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_flat_array() {
        let value = json!([1.0, 2.0, 3.5]);
        assert_eq!(extract_series(&value), Some(vec![1.0, 2.0, 3.5]));
    }

    #[test]
    fn test_extract_data_wrapped() {
        let value = json!({"data": [0.5, 0.6], "length": 2});
        assert_eq!(extract_series(&value), Some(vec![0.5, 0.6]));
    }

    #[test]
    fn test_extract_full_array_and_full_object() {
        let value = json!({"full": [7.0, 8.0]});
        assert_eq!(extract_series(&value), Some(vec![7.0, 8.0]));

        let value = json!({"full": {"chest": [9.0], "wrist": [10.0]}});
        assert_eq!(extract_series(&value), Some(vec![9.0]));
    }

    #[test]
    fn test_extract_scans_object_values_as_last_resort() {
        let value = json!({"length": 3, "sample": [4.0, 5.0], "dtype": "float64"});
        assert_eq!(extract_series(&value), Some(vec![4.0, 5.0]));
    }

    #[test]
    fn test_extract_unwraps_nested_samples() {
        let value = json!([[0.1], [0.2], [[0.3]]]);
        assert_eq!(extract_series(&value), Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_extract_discards_non_numeric_entries() {
        let value = json!([1.0, "x", null, [2.0], {"a": 3.0}]);
        assert_eq!(extract_series(&value), Some(vec![1.0, 2.0]));
        assert_eq!(extract_series(&json!(["a", "b"])), None);
        assert_eq!(extract_series(&json!("not a series")), None);
    }

    #[test]
    fn test_locate_prefers_named_channel_over_earlier_unnamed() {
        let signals = json!({
            "chest": {
                "Label": [0, 0, 1],
                "EDA": [[0.1], [0.2], [0.3]]
            }
        });
        let located = locate_signal(&signals, &["eda"]).unwrap();
        assert_eq!(located.channel, "EDA");
        assert_eq!(located.location, "chest");
        assert_eq!(located.samples, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_locate_first_found_wins_across_locations() {
        let signals = json!({
            "chest": {"Temp": [30.0, 30.1]},
            "wrist": {"TEMP": [31.0, 31.2]}
        });
        let located = locate_signal(&signals, &["temp"]).unwrap();
        assert_eq!(located.location, "chest");
        assert_eq!(located.channel, "Temp");
    }

    #[test]
    fn test_locate_falls_back_to_any_extractable_channel() {
        let signals = json!({
            "chest": {"Mystery": {"data": [5.0, 6.0]}}
        });
        let located = locate_signal(&signals, &["eda", "hr"]).unwrap();
        assert_eq!(located.channel, "Mystery");
        assert_eq!(located.samples, vec![5.0, 6.0]);
    }

    #[test]
    fn test_locate_reports_no_usable_signal() {
        let signals = json!({"chest": {"Notes": "text only"}});
        let err = locate_signal(&signals, &["eda"]).unwrap_err();
        assert!(matches!(err, MonitorError::NoUsableSignal));
    }

    #[test]
    fn test_locate_accepts_full_nested_mapping() {
        let signals = json!({
            "full": {
                "wrist": {"BVP": [0.9, 1.1]}
            }
        });
        let located = locate_signal(&signals, &["bvp"]).unwrap();
        assert_eq!(located.location, "wrist");
    }

    #[test]
    fn test_locate_is_deterministic() {
        let signals = json!({
            "chest": {"ECG": [1.0, 2.0], "EDA": [3.0, 4.0]},
            "wrist": {"EDA": [5.0, 6.0]}
        });
        let first = locate_signal(&signals, &["eda", "ecg"]).unwrap();
        let second = locate_signal(&signals, &["eda", "ecg"]).unwrap();
        assert_eq!(first, second);
    }
}

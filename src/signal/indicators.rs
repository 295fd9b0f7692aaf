//! Indicator Matcher
//!
//! Groups raw channel names under the canonical physiological categories
//! using case-insensitive substring rules. Pure lookup: matches are
//! recomputed on every call, never merged with prior results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extract::signals_map;

/// The fixed closed set of physiological indicator categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCategory {
    Respiration,
    Acceleration,
    Temperature,
    Emg,
    Eda,
    Ecg,
    Hr,
    Bvp,
}

impl IndicatorCategory {
    pub const ALL: [IndicatorCategory; 8] = [
        IndicatorCategory::Respiration,
        IndicatorCategory::Acceleration,
        IndicatorCategory::Temperature,
        IndicatorCategory::Emg,
        IndicatorCategory::Eda,
        IndicatorCategory::Ecg,
        IndicatorCategory::Hr,
        IndicatorCategory::Bvp,
    ];

    /// Lowercase substrings that mark a channel name as belonging here.
    pub fn patterns(self) -> &'static [&'static str] {
        match self {
            IndicatorCategory::Respiration => &["resp", "breath"],
            IndicatorCategory::Acceleration => &["acc"],
            IndicatorCategory::Temperature => &["temp"],
            IndicatorCategory::Emg => &["emg"],
            IndicatorCategory::Eda => &["eda", "gsr"],
            IndicatorCategory::Ecg => &["ecg"],
            IndicatorCategory::Hr => &["hr", "bpm", "pulse"],
            IndicatorCategory::Bvp => &["bvp"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IndicatorCategory::Respiration => "respiration",
            IndicatorCategory::Acceleration => "acceleration",
            IndicatorCategory::Temperature => "temperature",
            IndicatorCategory::Emg => "EMG",
            IndicatorCategory::Eda => "EDA",
            IndicatorCategory::Ecg => "ECG",
            IndicatorCategory::Hr => "HR",
            IndicatorCategory::Bvp => "BVP",
        }
    }
}

impl fmt::Display for IndicatorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map every category to the distinct raw channel names matching it, in
/// input order. Categories with no matches map to an empty list, and a
/// channel may land in several categories independently.
pub fn match_indicators<S: AsRef<str>>(names: &[S]) -> BTreeMap<IndicatorCategory, Vec<String>> {
    let mut matched: BTreeMap<IndicatorCategory, Vec<String>> = IndicatorCategory::ALL
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect();

    for name in names {
        let name = name.as_ref();
        let lower = name.to_lowercase();
        for category in IndicatorCategory::ALL {
            if category.patterns().iter().any(|p| lower.contains(p)) {
                let bucket = matched.entry(category).or_default();
                if !bucket.iter().any(|existing| existing == name) {
                    bucket.push(name.to_string());
                }
            }
        }
    }

    matched
}

/// Collect channel names visible under the selected locations, or under all
/// locations when no filter is given. Names keep their first-encountered
/// casing and order.
pub fn channels_in_locations(signals: &Value, locations: Option<&[&str]>) -> Vec<String> {
    let Some(map) = signals_map(signals) else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for (location, channels) in map {
        if let Some(filter) = locations {
            if !filter.iter().any(|l| l.eq_ignore_ascii_case(location)) {
                continue;
            }
        }
        let Some(channels) = channels.as_object() else {
            continue;
        };
        for name in channels.keys() {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.clone());
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_channel_names() {
        let matched = match_indicators(&["ECG2", "Resp_rate", "TempSkin"]);

        assert_eq!(matched[&IndicatorCategory::Ecg], vec!["ECG2"]);
        assert_eq!(matched[&IndicatorCategory::Respiration], vec!["Resp_rate"]);
        assert_eq!(matched[&IndicatorCategory::Temperature], vec!["TempSkin"]);
        for category in [
            IndicatorCategory::Acceleration,
            IndicatorCategory::Emg,
            IndicatorCategory::Eda,
            IndicatorCategory::Hr,
            IndicatorCategory::Bvp,
        ] {
            assert!(matched[&category].is_empty(), "{category} should be empty");
        }
    }

    #[test]
    fn test_every_category_is_present() {
        let matched = match_indicators::<&str>(&[]);
        assert_eq!(matched.len(), IndicatorCategory::ALL.len());
        assert!(matched.values().all(Vec::is_empty));
    }

    #[test]
    fn test_channel_may_match_multiple_categories() {
        // "hrv" contains "hr"; a combined name can land in two buckets
        let matched = match_indicators(&["ECG_HR"]);
        assert_eq!(matched[&IndicatorCategory::Ecg], vec!["ECG_HR"]);
        assert_eq!(matched[&IndicatorCategory::Hr], vec!["ECG_HR"]);
    }

    #[test]
    fn test_matching_is_case_insensitive_and_deduplicated() {
        let matched = match_indicators(&["eda", "EDA", "eda"]);
        assert_eq!(matched[&IndicatorCategory::Eda], vec!["eda", "EDA"]);
    }

    #[test]
    fn test_repeated_calls_do_not_accumulate() {
        let names = ["BVP", "ACC_X"];
        let first = match_indicators(&names);
        let second = match_indicators(&names);
        assert_eq!(first, second);
        assert_eq!(second[&IndicatorCategory::Bvp].len(), 1);
    }

    #[test]
    fn test_channels_under_selected_locations() {
        let signals = json!({
            "chest": {"ECG": [], "EMG": []},
            "wrist": {"BVP": [], "ECG": []}
        });

        let all = channels_in_locations(&signals, None);
        assert_eq!(all, vec!["ECG", "EMG", "BVP"]);

        let wrist_only = channels_in_locations(&signals, Some(&["wrist"]));
        assert_eq!(wrist_only, vec!["BVP", "ECG"]);

        let none = channels_in_locations(&signals, Some(&["ankle"]));
        assert!(none.is_empty());
    }
}

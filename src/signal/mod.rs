//! Signal Pipeline
//!
//! Pure leaves of the refresh cycle: locating a numeric series inside an
//! unpredictable payload, rescaling it for display, and classifying channel
//! names into physiological indicator categories.

pub mod extract;
pub mod indicators;
pub mod normalize;

pub use extract::{extract_series, locate_signal, signals_map, LocatedSignal};
pub use indicators::{channels_in_locations, match_indicators, IndicatorCategory};
pub use normalize::normalize_series;

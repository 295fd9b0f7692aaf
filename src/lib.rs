//! Live-Refresh Stress Monitor
//!
//! Client-side data pipeline for a caregiver dashboard over a WESAD-style
//! physiological data service:
//! - Single-flight refresh scheduler (one owner, one in-flight cycle)
//! - HTTP payload fetcher with full/summary modes and validated query inputs
//! - Signal locator tolerant of nested wrapper shapes
//! - 0-100 normalizer/downsampler for bounded display history
//! - Indicator matcher grouping channels into physiological categories

pub mod client;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod signal;

// Re-exports for convenience
pub use client::{DataServiceClient, FetchMode, ParamsSpec, RangeSpec, StressState, Subject};
pub use config::MonitorConfig;
pub use error::MonitorError;
pub use scheduler::{RefreshCoordinator, RefreshScheduler, Snapshot};
pub use signal::{locate_signal, match_indicators, normalize_series, IndicatorCategory};

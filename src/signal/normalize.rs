//! Normalizer / Downsampler
//!
//! Rescales an arbitrary-range series to the 0-100 display range and
//! reduces it to a bounded number of points for plotting. A constant
//! series degenerates to a flat line rather than failing on a zero range.

/// Produce at most `max_points` integers in [0, 100] from a numeric series.
///
/// Downsampling keeps every `stride`-th sample (`stride = max(1, len /
/// max_points)`) and then trims to the most recent `max_points`, preferring
/// recency over earliest data. Fewer than 2 output points means
/// "insufficient for a trend line"; that is the caller's call, not an error.
pub fn normalize_series(samples: &[f64], max_points: usize) -> Vec<u8> {
    if samples.is_empty() || max_points == 0 {
        return Vec::new();
    }

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    let stride = (samples.len() / max_points).max(1);
    let mut kept: Vec<f64> = samples.iter().copied().step_by(stride).collect();
    if kept.len() > max_points {
        kept.drain(..kept.len() - max_points);
    }

    kept.into_iter()
        .map(|v| (((v - min) / range) * 100.0).round().clamp(0.0, 100.0) as u8)
        .collect()
}

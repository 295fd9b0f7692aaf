//! Monitor Error Taxonomy
//!
//! Splits failures the way the refresh pipeline treats them: validation
//! errors are raised before any request leaves the process, request errors
//! are recorded per-cycle without stopping the schedule, and extraction
//! failure is a soft outcome that clears the displayed history.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Network-level failure, including per-request timeouts.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the data service, body text retained.
    #[error("data service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response decoded, but not into a shape the pipeline understands.
    #[error("unexpected payload shape: {0}")]
    Payload(String),

    /// No channel anywhere in the payload yielded a numeric series.
    #[error("no usable signal found in payload")]
    NoUsableSignal,

    /// Bad caller input (malformed range spec, empty subject, bad params CSV),
    /// caught before any request is issued.
    #[error("invalid request input: {0}")]
    Validation(String),
}

impl MonitorError {
    /// Soft outcomes clear the display history instead of keeping stale data.
    pub fn is_soft(&self) -> bool {
        matches!(self, MonitorError::NoUsableSignal)
    }
}

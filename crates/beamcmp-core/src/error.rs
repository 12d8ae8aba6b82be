//! Error types for the comparison pipeline.
//!
//! Every stage returns [`BeamResult`]. Schema, configuration and overlap
//! failures abort the current run; [`BeamError::InsufficientData`] is only
//! ever produced per group by the figure-of-merit aggregator, which keeps
//! going and reports the failed groups alongside the successful ones.
//!
//! # Example
//!
//! ```ignore
//! use beamcmp_core::{BeamError, BeamResult};
//!
//! fn compare(model: SampleTable, scope: SampleTable, config: &Config) -> BeamResult<()> {
//!     let output = run_comparison(model, scope, config)?;
//!     for failure in output.failures() {
//!         eprintln!("{failure}");
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::channel::Channel;
use crate::config::IndependentVariable;

/// Unified error type for all comparison operations.
#[derive(Error, Debug)]
pub enum BeamError {
    /// Required input columns are absent or have the wrong type/length.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A configuration field holds a value the pipeline cannot honour.
    #[error("Configuration error: {field} = '{value}': {reason}")]
    Config {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The inner join of model and scope produced no rows.
    #[error(
        "No overlapping (Time, Freq) keys between model ({model_rows} rows) and scope ({scope_rows} rows)"
    )]
    NoOverlap { model_rows: usize, scope_rows: usize },

    /// A figure-of-merit group holds too few samples for a correlation.
    #[error(
        "Insufficient data: channel {channel} at {variable} = {group} has {samples} sample(s), need at least 2"
    )]
    InsufficientData {
        channel: Channel,
        variable: IndependentVariable,
        group: String,
        samples: usize,
    },

    /// I/O errors raised by collaborators.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using BeamError.
pub type BeamResult<T> = Result<T, BeamError>;

impl BeamError {
    pub(crate) fn config(
        field: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        BeamError::Config {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error must halt the current invocation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BeamError::InsufficientData { .. })
    }
}

impl From<anyhow::Error> for BeamError {
    fn from(err: anyhow::Error) -> Self {
        BeamError::Other(err.to_string())
    }
}

impl From<String> for BeamError {
    fn from(s: String) -> Self {
        BeamError::Other(s)
    }
}

impl From<&str> for BeamError {
    fn from(s: &str) -> Self {
        BeamError::Other(s.to_string())
    }
}

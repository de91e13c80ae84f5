//! Error taxonomy of the selection and aggregation engine.
//!
//! Load-time structural failures ([`ShapeMismatch`],
//! [`Timestamp`]) abort a load. Per-frame sampling failures
//! never surface as errors from the series builders; they
//! are absorbed into sentinel values and reported as
//! [`SampleWarning`][crate::series::SampleWarning]s.
//!
//! [`ShapeMismatch`]: ThermalError::ShapeMismatch
//! [`Timestamp`]: ThermalError::Timestamp
use thiserror::Error;

use crate::frame::Shape;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThermalError {
    #[error("no frames to process")]
    EmptySequence,

    #[error(
        "not enough data points for window size {window}: \
         need at least {required}, have {available}"
    )]
    InsufficientData {
        window: usize,
        available: usize,
        required: usize,
    },

    #[error("window size must be at least 1")]
    InvalidWindow,

    #[error("could not decode frame `{frame}`: {message}")]
    FrameDecode { frame: String, message: String },

    #[error("point ({x}, {y}) is outside the {shape} grid")]
    OutOfBounds { x: f64, y: f64, shape: Shape },

    #[error("frame `{frame}` has shape {found}, expected {expected}")]
    ShapeMismatch {
        frame: String,
        expected: Shape,
        found: Shape,
    },

    #[error("could not extract timestamp from `{id}`: {message}")]
    Timestamp { id: String, message: String },

    #[error("no grid cells inside the selected region")]
    EmptyRegion,

    #[error("no active selection")]
    NoSelection,

    #[error("a polygon needs at least 3 vertices, got {vertices}")]
    InvalidPolygon { vertices: usize },

    #[error("invalid percentile range: {low}..{high} (must satisfy 0 <= low <= high <= 100)")]
    InvalidPercentile { low: f64, high: f64 },
}

impl ThermalError {
    pub(crate) fn frame_decode(frame: impl Into<String>, err: &anyhow::Error) -> Self {
        ThermalError::FrameDecode {
            frame: frame.into(),
            message: format!("{:#}", err),
        }
    }
}

pub type Result<T, E = ThermalError> = std::result::Result<T, E>;

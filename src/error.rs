use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid XDF file: {0}")]
    Xdf(String),

    #[error("Reference stream '{name}' not found (available: {available:?})")]
    ReferenceNotFound { name: String, available: Vec<String> },

    #[error("Reference stream name '{name}' matches {count} streams")]
    AmbiguousReference { name: String, count: usize },

    #[error("Multiple Marker streams are not supported currently (found {count})")]
    MultipleMarkerStreams { count: usize },

    #[error("Malformed channel descriptor in stream '{stream}': {reason}")]
    MalformedDescriptor { stream: String, reason: String },

    #[error("Reference stream '{0}' has no samples")]
    EmptyReferenceStream(String),

    #[error("Reference stream '{name}' has non-numeric channel format {format}")]
    NonNumericReference { name: String, format: String },

    #[error("Reference stream '{name}' has invalid sampling rate {rate}")]
    InvalidSampleRate { name: String, rate: f64 },

    #[error("Marker value '{value}' at index {index} is not an integer code")]
    InvalidMarker { index: usize, value: String },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

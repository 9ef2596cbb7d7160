//! Error types shared across the prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// A display label (or canonical value) that a registry does not know
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {registry} option: {label:?}")]
pub struct LookupError {
    pub registry: &'static str,
    pub label: String,
}

/// Rejected edit of a single form field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("{field}: cannot parse {raw:?} as {expected}")]
    Unparseable {
        field: &'static str,
        raw: String,
        expected: &'static str,
    },

    #[error("{field}: {value} is below the minimum of {min}")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        min: f64,
    },

    #[error("{field}: {raw:?} is not one of the allowed options")]
    NotAnOption { field: &'static str, raw: String },
}

/// Checks run on trigger, before the predictor is touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Distance must be greater than zero.")]
    NonPositiveDistance,

    #[error("Preparation time cannot be negative.")]
    NegativePreparationTime,
}

/// Failure while turning form inputs into a prediction request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// The model artifact could not be read or understood at all
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Encoder reconfiguration did not apply; the model is still usable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error updating one-hot encoder: {reason}")]
pub struct ArtifactLoadWarning {
    pub reason: String,
}

impl ArtifactLoadWarning {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The model failed while scoring a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("Found unknown category {value:?} in column {column}")]
    UnknownCategory { column: String, value: String },

    #[error("column {0} is missing from the record")]
    MissingColumn(String),

    #[error("column {column} holds a {actual} value, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("X has {actual} features, but the regressor is expecting {expected} features as input")]
    FeatureCount { expected: usize, actual: usize },

    #[error("model produced a non-finite output: {0}")]
    NonFinite(f64),

    #[error("model could not be loaded: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Model(String),
}

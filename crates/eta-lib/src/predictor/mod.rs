//! Delivery-time prediction engine

mod output;
mod pipeline;
mod store;

pub use output::{round_to_tenth, EtaEstimate, DISCLAIMER};
pub use pipeline::{
    ColumnTransformer, HandleUnknown, LinearRegressor, OneHotEncoder, Pipeline, Step,
    TransformStep, Transformer, Tree, TreeEnsemble, TreeNode, CATEGORICAL_TRANSFORMER_INDEX,
    ONEHOT_STEP, PREPROCESSOR_STEP, UNVERSIONED,
};
pub use store::{load_pipeline, read_pipeline, LoadedModel, ModelStore, DEFAULT_MODEL_PATH};

use crate::error::PredictionError;
use crate::record::PredictionRequest;
use std::panic::{self, AssertUnwindSafe};

/// Trait for prediction implementations
pub trait Predictor: Send + Sync {
    /// Score a single record, returning minutes
    fn predict(&self, request: &PredictionRequest) -> Result<f64, PredictionError>;

    /// Get current model version
    fn model_version(&self) -> &str;
}

/// Run a predictor on one record.
///
/// Any failure inside the model, including a panic, comes back as a
/// `PredictionError`.
pub fn predict(model: &dyn Predictor, request: &PredictionRequest) -> Result<f64, PredictionError> {
    let value = panic::catch_unwind(AssertUnwindSafe(|| model.predict(request))).map_err(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        PredictionError::Model(format!("model panicked: {}", detail))
    })??;

    if !value.is_finite() {
        return Err(PredictionError::NonFinite(value));
    }
    Ok(value)
}

//! Delivery time prediction library
//!
//! This crate provides the core functionality for:
//! - Option registries mapping display labels to model categories
//! - Form input collection and validation
//! - Prediction request assembly
//! - Cached model loading and inference
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod inputs;
pub mod observability;
pub mod options;
pub mod predictor;
pub mod record;
pub mod session;

pub use error::{
    ArtifactError, ArtifactLoadWarning, AssembleError, InputError, LookupError, PredictionError,
    ValidationError,
};
pub use health::{ComponentStatus, HealthResponse};
pub use inputs::{Field, FieldSpec, FormInputs};
pub use observability::{EtaMetrics, StructuredLogger};
pub use options::{OptionRegistry, TimeOfDay, TrafficLevel};
pub use predictor::{EtaEstimate, LoadedModel, ModelStore, Predictor};
pub use record::{assemble, PredictionRequest};
pub use session::{DeliveryForm, Outcome, SummaryLine};

//! Prediction form controller
//!
//! Holds the current form inputs and runs the validate → assemble →
//! predict → display sequence each time the user asks for a prediction.
//! Every failure ends up in the returned [`Outcome`]; nothing here aborts
//! the process.

use crate::error::{ArtifactLoadWarning, AssembleError, InputError, PredictionError, ValidationError};
use crate::inputs::{format_real, Field, FormInputs};
use crate::observability::{EtaMetrics, StructuredLogger};
use crate::options::OptionRegistry;
use crate::predictor::{self, EtaEstimate, ModelStore, DISCLAIMER};
use crate::record::assemble;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// One line of the input summary, e.g. `Distance: 5.0 km`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label: &'static str,
    pub value: String,
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Summary of the inputs with canonical values and units
pub fn summarize(inputs: &FormInputs) -> Vec<SummaryLine> {
    let canonical = |registry: OptionRegistry, label: &str| {
        registry
            .canonical(label)
            .map(str::to_string)
            .unwrap_or_else(|_| label.to_string())
    };
    vec![
        SummaryLine {
            label: "Distance",
            value: format!("{} km", format_real(inputs.distance_km)),
        },
        SummaryLine {
            label: "Weather",
            value: canonical(OptionRegistry::weather(), &inputs.weather),
        },
        SummaryLine {
            label: "Traffic Level",
            value: inputs.traffic_level.to_string(),
        },
        SummaryLine {
            label: "Time of Day",
            value: inputs.time_of_day.to_string(),
        },
        SummaryLine {
            label: "Vehicle Type",
            value: canonical(OptionRegistry::vehicle_type(), &inputs.vehicle_type),
        },
        SummaryLine {
            label: "Preparation Time",
            value: format!("{} min", inputs.preparation_time_min),
        },
        SummaryLine {
            label: "Courier Experience",
            value: format!("{} years", format_real(inputs.courier_experience_yrs)),
        },
    ]
}

/// Result of one "Predict" trigger
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Predicted {
        estimate: EtaEstimate,
        warning: Option<ArtifactLoadWarning>,
    },
    Rejected(ValidationError),
    Failed {
        error: PredictionError,
        warning: Option<ArtifactLoadWarning>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Predicted { .. })
    }

    pub fn estimate(&self) -> Option<&EtaEstimate> {
        match self {
            Outcome::Predicted { estimate, .. } => Some(estimate),
            _ => None,
        }
    }

    /// Non-fatal warning raised while loading the model
    pub fn warning(&self) -> Option<&ArtifactLoadWarning> {
        match self {
            Outcome::Predicted { warning, .. } | Outcome::Failed { warning, .. } => warning.as_ref(),
            Outcome::Rejected(_) => None,
        }
    }

    /// The user-facing message for this outcome
    pub fn message(&self) -> String {
        match self {
            Outcome::Predicted { estimate, .. } => estimate.headline(),
            Outcome::Rejected(reason) => reason.to_string(),
            Outcome::Failed { error, .. } => {
                format!("An error occurred during prediction: {}", error)
            }
        }
    }

    /// Disclaimer shown with successful predictions
    pub fn disclaimer(&self) -> Option<&'static str> {
        self.is_success().then_some(DISCLAIMER)
    }
}

/// The prediction form: current inputs plus the shared model
pub struct DeliveryForm {
    inputs: FormInputs,
    store: Arc<ModelStore>,
    metrics: EtaMetrics,
    logger: StructuredLogger,
}

impl DeliveryForm {
    pub fn new(store: Arc<ModelStore>, logger: StructuredLogger) -> Self {
        Self::with_inputs(store, logger, FormInputs::default())
    }

    pub fn with_inputs(store: Arc<ModelStore>, logger: StructuredLogger, inputs: FormInputs) -> Self {
        Self {
            inputs,
            store,
            metrics: EtaMetrics::new(),
            logger,
        }
    }

    pub fn inputs(&self) -> &FormInputs {
        &self.inputs
    }

    pub fn set(&mut self, field: Field, raw: &str) -> Result<(), InputError> {
        self.inputs.set(field, raw)
    }

    pub fn summary(&self) -> Vec<SummaryLine> {
        summarize(&self.inputs)
    }

    /// Run one prediction from scratch with the current inputs
    pub fn trigger(&self) -> Outcome {
        if let Err(reason) = self.inputs.validate() {
            return self.reject(reason);
        }

        let request = match assemble(&self.inputs) {
            Ok(request) => request,
            Err(AssembleError::Validation(reason)) => return self.reject(reason),
            Err(AssembleError::Lookup(e)) => {
                return self.fail(PredictionError::Model(e.to_string()), None)
            }
        };

        let loaded = match self.store.load() {
            Ok(loaded) => loaded,
            Err(e) => return self.fail(PredictionError::Unavailable(e.to_string()), None),
        };
        self.metrics
            .set_model_info(loaded.model_version(), loaded.warning.is_none());

        let start = Instant::now();
        let result = predictor::predict(loaded.predictor.as_ref(), &request);
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());

        match result {
            Ok(minutes) => {
                self.metrics.inc_predictions();
                self.logger
                    .log_prediction(&request, minutes, loaded.model_version());
                Outcome::Predicted {
                    estimate: EtaEstimate::new(minutes, loaded.model_version()),
                    warning: loaded.warning.clone(),
                }
            }
            Err(error) => self.fail(error, loaded.warning.clone()),
        }
    }

    fn reject(&self, reason: ValidationError) -> Outcome {
        self.metrics.inc_validation_rejections();
        self.logger.log_validation_rejected(&reason.to_string());
        Outcome::Rejected(reason)
    }

    fn fail(&self, error: PredictionError, warning: Option<ArtifactLoadWarning>) -> Outcome {
        self.metrics.inc_prediction_errors();
        self.logger.log_prediction_failed(&error.to_string());
        Outcome::Failed { error, warning }
    }
}

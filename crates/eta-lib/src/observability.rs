//! Observability infrastructure for the delivery ETA predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcome counters, model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EtaMetricsInner> = OnceLock::new();

struct EtaMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors: IntCounter,
    validation_rejections: IntCounter,
    model_info: GaugeVec,
}

impl EtaMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "delivery_eta_prediction_latency_seconds",
                "Time spent assembling and scoring one prediction request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "delivery_eta_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter!(
                "delivery_eta_prediction_errors_total",
                "Total number of predictions that failed inside the model"
            )
            .expect("Failed to register prediction_errors"),

            validation_rejections: register_int_counter!(
                "delivery_eta_validation_rejections_total",
                "Total number of triggers rejected before reaching the model"
            )
            .expect("Failed to register validation_rejections"),

            model_info: register_gauge_vec!(
                "delivery_eta_model_info",
                "Information about the currently loaded model",
                &["version", "unknown_categories"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide metrics.
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct EtaMetrics {
    _private: (),
}

impl Default for EtaMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EtaMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EtaMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EtaMetricsInner {
        GLOBAL_METRICS.get_or_init(EtaMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn inc_validation_rejections(&self) {
        self.inner().validation_rejections.inc();
    }

    /// Record which model is loaded and whether it tolerates unseen categories
    pub fn set_model_info(&self, version: &str, tolerates_unknown: bool) {
        let mode = if tolerates_unknown { "ignore" } else { "error" };
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[version, mode])
            .set(1.0);
    }

    pub fn predictions(&self) -> u64 {
        self.inner().predictions_total.get()
    }

    pub fn prediction_errors(&self) -> u64 {
        self.inner().prediction_errors.get()
    }

    pub fn validation_rejections(&self) -> u64 {
        self.inner().validation_rejections.get()
    }
}

/// Structured logger for prediction events
#[derive(Clone)]
pub struct StructuredLogger {
    surface: String,
}

impl StructuredLogger {
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_source: &str) {
        info!(
            event = "service_started",
            surface = %self.surface,
            service_version = %version,
            model_source = %model_source,
            "Delivery ETA predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            surface = %self.surface,
            reason = %reason,
            "Delivery ETA predictor shutting down"
        );
    }

    pub fn log_prediction(&self, request: &crate::record::PredictionRequest, minutes: f64, model_version: &str) {
        info!(
            event = "prediction_generated",
            surface = %self.surface,
            distance_km = request.distance_km,
            weather = %request.weather,
            traffic_level = %request.traffic_level,
            time_of_day = %request.time_of_day,
            vehicle_type = %request.vehicle_type,
            preparation_time_min = request.preparation_time_min,
            courier_experience_yrs = request.courier_experience_yrs,
            minutes = minutes,
            model_version = %model_version,
            "Generated delivery time prediction"
        );
    }

    pub fn log_prediction_failed(&self, error: &str) {
        warn!(
            event = "prediction_failed",
            surface = %self.surface,
            error = %error,
            "Prediction failed"
        );
    }

    pub fn log_validation_rejected(&self, reason: &str) {
        info!(
            event = "validation_rejected",
            surface = %self.surface,
            reason = %reason,
            "Inputs rejected before prediction"
        );
    }
}

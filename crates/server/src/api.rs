//! HTTP routes: the prediction form, a JSON API and health/metrics endpoints

use crate::render;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use eta_lib::{
    health::{self, ComponentStatus},
    inputs::{field_specs, Field},
    observability::{EtaMetrics, StructuredLogger},
    DeliveryForm, FormInputs, ModelStore, OptionRegistry, Outcome, TimeOfDay, TrafficLevel,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ModelStore>,
    pub logger: StructuredLogger,
    pub metrics: EtaMetrics,
}

impl AppState {
    pub fn new(store: Arc<ModelStore>, logger: StructuredLogger) -> Self {
        Self {
            store,
            logger,
            metrics: EtaMetrics::new(),
        }
    }

    /// Run one trigger against a fresh form holding `inputs`
    fn trigger(&self, inputs: FormInputs) -> Outcome {
        DeliveryForm::with_inputs(self.store.clone(), self.logger.clone(), inputs).trigger()
    }
}

/// Apply submitted raw values to a default form, collecting rejected edits.
///
/// Fields missing from the submission keep their defaults.
fn collect_inputs(fields: &HashMap<String, String>) -> (FormInputs, Vec<String>) {
    let mut inputs = FormInputs::default();
    let mut errors = Vec::new();
    for field in Field::ALL {
        if let Some(raw) = fields.get(field.name()) {
            if let Err(e) = inputs.set(field, raw) {
                errors.push(e.to_string());
            }
        }
    }
    (inputs, errors)
}

/// The form with default values and no result
async fn index() -> Html<String> {
    Html(render::page(&FormInputs::default(), None, &[]))
}

/// Form submission: re-render with the inputs kept and the outcome shown
async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let (inputs, errors) = collect_inputs(&fields);
    let outcome = errors.is_empty().then(|| state.trigger(inputs.clone()));
    Html(render::page(&inputs, outcome.as_ref(), &errors))
}

#[derive(Serialize)]
struct OptionEntry {
    label: &'static str,
    value: &'static str,
}

fn registry_entries(registry: OptionRegistry) -> Vec<OptionEntry> {
    registry
        .entries()
        .iter()
        .map(|&(label, value)| OptionEntry { label, value })
        .collect()
}

/// Choices for every categorical field
async fn options() -> Json<Value> {
    Json(json!({
        "weather": registry_entries(OptionRegistry::weather()),
        "vehicle_type": registry_entries(OptionRegistry::vehicle_type()),
        "traffic_level": TrafficLevel::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        "time_of_day": TimeOfDay::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
    }))
}

/// Field descriptors: type, default and constraint
async fn fields() -> Json<Value> {
    Json(json!(field_specs()))
}

/// JSON prediction; values may be strings or numbers keyed by field name
async fn predict_json(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Map<String, Value>>,
) -> impl IntoResponse {
    let fields: HashMap<String, String> = body
        .into_iter()
        .map(|(k, v)| {
            let raw = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, raw)
        })
        .collect();

    let (inputs, errors) = collect_inputs(&fields);
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        );
    }

    let summary: Vec<String> = eta_lib::session::summarize(&inputs)
        .iter()
        .map(ToString::to_string)
        .collect();
    let outcome = state.trigger(inputs);
    let warning = outcome.warning().map(ToString::to_string);

    match &outcome {
        Outcome::Predicted { estimate, .. } => (
            StatusCode::OK,
            Json(json!({
                "prediction_minutes": estimate.minutes,
                "display": estimate.to_string(),
                "message": outcome.message(),
                "disclaimer": outcome.disclaimer(),
                "model_version": estimate.model_version,
                "summary": summary,
                "warning": warning,
            })),
        ),
        Outcome::Rejected(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": outcome.message(), "summary": summary })),
        ),
        Outcome::Failed { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": outcome.message(), "warning": warning })),
        ),
    }
}

/// Model health - 200 if healthy or degraded, 503 if the model cannot load
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = health::check_model(&state.store);

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            e.to_string().into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/options", get(options))
        .route("/api/fields", get(fields))
        .route("/api/predict", post(predict_json))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the server and run until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_inputs_applies_known_fields() {
        let mut fields = HashMap::new();
        fields.insert("distance_km".to_string(), "7.5".to_string());
        fields.insert("weather".to_string(), "Rainy 🌧️".to_string());
        fields.insert("unrelated".to_string(), "x".to_string());

        let (inputs, errors) = collect_inputs(&fields);
        assert!(errors.is_empty());
        assert_eq!(inputs.distance_km, 7.5);
        assert_eq!(inputs.weather, "Rainy 🌧️");
        assert_eq!(inputs.preparation_time_min, 15);
    }

    #[test]
    fn test_collect_inputs_reports_errors() {
        let mut fields = HashMap::new();
        fields.insert("preparation_time_min".to_string(), "soon".to_string());
        let (_, errors) = collect_inputs(&fields);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("preparation_time_min"));
    }
}

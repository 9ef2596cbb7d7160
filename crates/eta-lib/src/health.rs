//! Health reporting for the model behind the form
//!
//! The only component with a lifecycle is the cached model, so health is
//! derived from what the model store holds.

use crate::predictor::ModelStore;
use serde::{Deserialize, Serialize};

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is experiencing issues but still operational
    Degraded,
    /// Component has failed
    Unhealthy,
}

impl ComponentStatus {
    /// Returns true if the component is at least partially operational
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

/// Health of the model component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub model_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

/// Check the model, loading it if nothing is cached yet.
///
/// A load warning reports `Degraded`; a failed load reports `Unhealthy`.
pub fn check_model(store: &ModelStore) -> HealthResponse {
    let now = chrono::Utc::now().timestamp();
    match store.load() {
        Ok(model) => HealthResponse {
            status: if model.warning.is_some() {
                ComponentStatus::Degraded
            } else {
                ComponentStatus::Healthy
            },
            model_source: store.source().to_string(),
            model_version: Some(model.model_version().to_string()),
            checksum: model.checksum.clone(),
            loaded_at: Some(model.loaded_at),
            message: model.warning.as_ref().map(ToString::to_string),
            last_check_timestamp: now,
        },
        Err(e) => HealthResponse {
            status: ComponentStatus::Unhealthy,
            model_source: store.source().to_string(),
            model_version: None,
            checksum: None,
            loaded_at: None,
            message: Some(e.to_string()),
            last_check_timestamp: now,
        },
    }
}

//! Prediction output formatting

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown under every successful prediction
pub const DISCLAIMER: &str =
    "Note: This prediction is based on historical data and may vary depending on actual conditions.";

/// Round to one decimal place, ties to even
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Predicted delivery time ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaEstimate {
    /// Raw model output in minutes
    pub raw_minutes: f64,
    /// Output rounded to one decimal place
    pub minutes: f64,
    pub model_version: String,
    pub generated_at: i64,
}

impl EtaEstimate {
    pub fn new(raw_minutes: f64, model_version: &str) -> Self {
        Self {
            raw_minutes,
            minutes: round_to_tenth(raw_minutes),
            model_version: model_version.to_string(),
            generated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// e.g. `Predicted Delivery Time: 32.5 minutes`
    pub fn headline(&self) -> String {
        format!("Predicted Delivery Time: {}", self)
    }
}

impl fmt::Display for EtaEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} minutes", self.minutes)
    }
}

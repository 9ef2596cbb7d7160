//! Prediction request assembly
//!
//! Builds the fixed seven-column record the model was trained on from the
//! current form inputs.

use crate::error::{AssembleError, ValidationError};
use crate::inputs::FormInputs;
use crate::options::{OptionRegistry, TimeOfDay, TrafficLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names in the order the model expects them
pub const SCHEMA: [&str; 7] = [
    "Distance_km",
    "Weather",
    "Traffic_Level",
    "Time_of_Day",
    "Vehicle_Type",
    "Preparation_Time_min",
    "Courier_Experience_yrs",
];

/// A single cell of the record
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Numeric(_) => "numeric",
            FeatureValue::Categorical(_) => "categorical",
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{}", v),
            FeatureValue::Categorical(s) => f.write_str(s),
        }
    }
}

/// One row in the model's input schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "Distance_km")]
    pub distance_km: f64,
    #[serde(rename = "Weather")]
    pub weather: String,
    #[serde(rename = "Traffic_Level")]
    pub traffic_level: TrafficLevel,
    #[serde(rename = "Time_of_Day")]
    pub time_of_day: TimeOfDay,
    #[serde(rename = "Vehicle_Type")]
    pub vehicle_type: String,
    #[serde(rename = "Preparation_Time_min")]
    pub preparation_time_min: u32,
    #[serde(rename = "Courier_Experience_yrs")]
    pub courier_experience_yrs: f64,
}

impl PredictionRequest {
    /// Columns in schema order
    pub fn columns(&self) -> [(&'static str, FeatureValue); 7] {
        [
            (SCHEMA[0], FeatureValue::Numeric(self.distance_km)),
            (SCHEMA[1], FeatureValue::Categorical(self.weather.clone())),
            (SCHEMA[2], FeatureValue::Categorical(self.traffic_level.to_string())),
            (SCHEMA[3], FeatureValue::Categorical(self.time_of_day.to_string())),
            (SCHEMA[4], FeatureValue::Categorical(self.vehicle_type.clone())),
            (SCHEMA[5], FeatureValue::Numeric(self.preparation_time_min as f64)),
            (SCHEMA[6], FeatureValue::Numeric(self.courier_experience_yrs)),
        ]
    }

    /// Look up a column by schema name
    pub fn value(&self, column: &str) -> Option<FeatureValue> {
        let value = match column {
            "Distance_km" => FeatureValue::Numeric(self.distance_km),
            "Weather" => FeatureValue::Categorical(self.weather.clone()),
            "Traffic_Level" => FeatureValue::Categorical(self.traffic_level.to_string()),
            "Time_of_Day" => FeatureValue::Categorical(self.time_of_day.to_string()),
            "Vehicle_Type" => FeatureValue::Categorical(self.vehicle_type.clone()),
            "Preparation_Time_min" => FeatureValue::Numeric(self.preparation_time_min as f64),
            "Courier_Experience_yrs" => FeatureValue::Numeric(self.courier_experience_yrs),
            _ => return None,
        };
        Some(value)
    }
}

/// Translate form inputs into a prediction request.
///
/// Pure: the same inputs always give the same record.
pub fn assemble(inputs: &FormInputs) -> Result<PredictionRequest, AssembleError> {
    let weather = OptionRegistry::weather().canonical(&inputs.weather)?;
    let vehicle_type = OptionRegistry::vehicle_type().canonical(&inputs.vehicle_type)?;
    let preparation_time_min = u32::try_from(inputs.preparation_time_min)
        .map_err(|_| ValidationError::NegativePreparationTime)?;

    Ok(PredictionRequest {
        distance_km: inputs.distance_km,
        weather: weather.to_string(),
        traffic_level: inputs.traffic_level,
        time_of_day: inputs.time_of_day,
        vehicle_type: vehicle_type.to_string(),
        preparation_time_min,
        courier_experience_yrs: inputs.courier_experience_yrs,
    })
}

//! Form input collection
//!
//! Holds the current value of every form field together with its declared
//! type, default and constraint. Edits are parsed from raw text so every
//! surface (web form, CLI flags) goes through the same checks.

use crate::error::{InputError, ValidationError};
use crate::options::{OptionRegistry, TimeOfDay, TrafficLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DISTANCE_KM: f64 = 5.0;
pub const DEFAULT_PREPARATION_TIME_MIN: i64 = 15;
pub const DEFAULT_COURIER_EXPERIENCE_YRS: f64 = 2.0;

/// Fields of the prediction form, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    DistanceKm,
    Weather,
    TrafficLevel,
    TimeOfDay,
    VehicleType,
    PreparationTimeMin,
    CourierExperienceYrs,
}

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Real,
    Integer,
    Choice,
}

/// Constraint a field value must satisfy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    Minimum { min: f64, step: f64 },
    OneOf { options: Vec<&'static str> },
}

impl Constraint {
    pub fn describe(&self) -> String {
        match self {
            Constraint::Minimum { min, .. } => format!(">= {}", min),
            Constraint::OneOf { options } => options.join(" | "),
        }
    }
}

/// Everything a surface needs to render one input control
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub field: Field,
    pub label: &'static str,
    pub help: &'static str,
    pub kind: FieldKind,
    pub default: String,
    pub constraint: Constraint,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::DistanceKm,
        Field::Weather,
        Field::TrafficLevel,
        Field::TimeOfDay,
        Field::VehicleType,
        Field::PreparationTimeMin,
        Field::CourierExperienceYrs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::DistanceKm => "distance_km",
            Field::Weather => "weather",
            Field::TrafficLevel => "traffic_level",
            Field::TimeOfDay => "time_of_day",
            Field::VehicleType => "vehicle_type",
            Field::PreparationTimeMin => "preparation_time_min",
            Field::CourierExperienceYrs => "courier_experience_yrs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::DistanceKm => "Distance (km)",
            Field::Weather => "Weather",
            Field::TrafficLevel => "Traffic Level",
            Field::TimeOfDay => "Time of Day",
            Field::VehicleType => "Vehicle Type",
            Field::PreparationTimeMin => "Preparation Time (min)",
            Field::CourierExperienceYrs => "Courier Experience (years)",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Field::DistanceKm => "Enter the delivery distance in kilometers.",
            Field::Weather => "Select the current weather condition.",
            Field::TrafficLevel => "Select the traffic level.",
            Field::TimeOfDay => "Select the time of day.",
            Field::VehicleType => "Select the vehicle type used for delivery.",
            Field::PreparationTimeMin => "Enter the time taken to prepare the order in minutes.",
            Field::CourierExperienceYrs => "Enter the courier's experience in years.",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::DistanceKm | Field::CourierExperienceYrs => FieldKind::Real,
            Field::PreparationTimeMin => FieldKind::Integer,
            _ => FieldKind::Choice,
        }
    }

    pub fn constraint(&self) -> Constraint {
        match self {
            Field::DistanceKm | Field::CourierExperienceYrs => Constraint::Minimum {
                min: 0.0,
                step: 0.1,
            },
            Field::PreparationTimeMin => Constraint::Minimum { min: 0.0, step: 1.0 },
            Field::Weather => Constraint::OneOf {
                options: OptionRegistry::weather().display_labels().collect(),
            },
            Field::VehicleType => Constraint::OneOf {
                options: OptionRegistry::vehicle_type().display_labels().collect(),
            },
            Field::TrafficLevel => Constraint::OneOf {
                options: TrafficLevel::ALL.iter().map(|t| t.as_str()).collect(),
            },
            Field::TimeOfDay => Constraint::OneOf {
                options: TimeOfDay::ALL.iter().map(|t| t.as_str()).collect(),
            },
        }
    }

    pub fn spec(&self) -> FieldSpec {
        FieldSpec {
            field: *self,
            label: self.label(),
            help: self.help(),
            kind: self.kind(),
            default: FormInputs::default().value(*self),
            constraint: self.constraint(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| InputError::UnknownField(s.to_string()))
    }
}

/// Descriptors for every field in presentation order
pub fn field_specs() -> Vec<FieldSpec> {
    Field::ALL.iter().map(Field::spec).collect()
}

/// Current values of the prediction form
///
/// Categorical fields with decorated options hold the display label; the
/// record assembler translates them to canonical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInputs {
    pub distance_km: f64,
    pub weather: String,
    pub traffic_level: TrafficLevel,
    pub time_of_day: TimeOfDay,
    pub vehicle_type: String,
    pub preparation_time_min: i64,
    pub courier_experience_yrs: f64,
}

impl Default for FormInputs {
    fn default() -> Self {
        Self {
            distance_km: DEFAULT_DISTANCE_KM,
            weather: OptionRegistry::weather().default_label().to_string(),
            traffic_level: TrafficLevel::default(),
            time_of_day: TimeOfDay::default(),
            vehicle_type: OptionRegistry::vehicle_type().default_label().to_string(),
            preparation_time_min: DEFAULT_PREPARATION_TIME_MIN,
            courier_experience_yrs: DEFAULT_COURIER_EXPERIENCE_YRS,
        }
    }
}

impl FormInputs {
    /// Parse `raw` for `field`, check its constraint and store it.
    ///
    /// On error the current value is left untouched.
    pub fn set(&mut self, field: Field, raw: &str) -> Result<(), InputError> {
        match field {
            Field::DistanceKm => self.distance_km = parse_real(field, raw)?,
            Field::CourierExperienceYrs => self.courier_experience_yrs = parse_real(field, raw)?,
            Field::PreparationTimeMin => {
                let value: i64 = raw.trim().parse().map_err(|_| InputError::Unparseable {
                    field: field.name(),
                    raw: raw.to_string(),
                    expected: "an integer",
                })?;
                check_minimum(field, value as f64)?;
                self.preparation_time_min = value;
            }
            Field::Weather => self.weather = resolve_label(field, OptionRegistry::weather(), raw)?,
            Field::VehicleType => {
                self.vehicle_type = resolve_label(field, OptionRegistry::vehicle_type(), raw)?
            }
            Field::TrafficLevel => {
                self.traffic_level = raw.parse().map_err(|_| not_an_option(field, raw))?
            }
            Field::TimeOfDay => self.time_of_day = raw.parse().map_err(|_| not_an_option(field, raw))?,
        }
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, raw: &str) -> Result<(), InputError> {
        let field: Field = name.parse()?;
        self.set(field, raw)
    }

    /// Current value as entered (display labels for decorated options)
    pub fn value(&self, field: Field) -> String {
        match field {
            Field::DistanceKm => format_real(self.distance_km),
            Field::Weather => self.weather.clone(),
            Field::TrafficLevel => self.traffic_level.to_string(),
            Field::TimeOfDay => self.time_of_day.to_string(),
            Field::VehicleType => self.vehicle_type.clone(),
            Field::PreparationTimeMin => self.preparation_time_min.to_string(),
            Field::CourierExperienceYrs => format_real(self.courier_experience_yrs),
        }
    }

    /// Pre-prediction checks; the predictor must not be called on failure
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.distance_km.is_nan() || self.distance_km <= 0.0 {
            return Err(ValidationError::NonPositiveDistance);
        }
        if self.preparation_time_min < 0 {
            return Err(ValidationError::NegativePreparationTime);
        }
        Ok(())
    }
}

/// Render a real the way the form shows it (always with a fractional part)
pub fn format_real(value: f64) -> String {
    format!("{:?}", value)
}

fn parse_real(field: Field, raw: &str) -> Result<f64, InputError> {
    let value: f64 = raw
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| InputError::Unparseable {
            field: field.name(),
            raw: raw.to_string(),
            expected: "a number",
        })?;
    check_minimum(field, value)?;
    Ok(value)
}

fn check_minimum(field: Field, value: f64) -> Result<(), InputError> {
    if let Constraint::Minimum { min, .. } = field.constraint() {
        if value < min {
            return Err(InputError::BelowMinimum {
                field: field.name(),
                value,
                min,
            });
        }
    }
    Ok(())
}

fn resolve_label(field: Field, registry: OptionRegistry, raw: &str) -> Result<String, InputError> {
    registry
        .resolve(raw)
        .map(str::to_string)
        .map_err(|_| not_an_option(field, raw))
}

fn not_an_option(field: Field, raw: &str) -> InputError {
    InputError::NotAnOption {
        field: field.name(),
        raw: raw.to_string(),
    }
}

//! Option registries for the categorical form fields
//!
//! Maps decorated display labels to the canonical values the model was
//! trained on. Presentation order is insertion order.

use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weather options offered in the form
const WEATHER_OPTIONS: &[(&str, &str)] = &[
    ("Clear ☀️", "Clear"),
    ("Rainy 🌧️", "Rainy"),
    ("Snowy ❄️", "Snowy"),
    ("Foggy 🌫️", "Foggy"),
    ("Windy 💨", "Windy"),
];

/// Vehicle options offered in the form
const VEHICLE_TYPE_OPTIONS: &[(&str, &str)] = &[
    ("Bike 🚲", "Bike"),
    ("Scooter 🛵", "Scooter"),
    ("Car 🚗", "Car"),
];

/// Ordered, immutable label → canonical value table
#[derive(Debug, Clone, Copy)]
pub struct OptionRegistry {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl OptionRegistry {
    pub const fn weather() -> Self {
        Self {
            name: "weather",
            entries: WEATHER_OPTIONS,
        }
    }

    pub const fn vehicle_type() -> Self {
        Self {
            name: "vehicle type",
            entries: VEHICLE_TYPE_OPTIONS,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Labels in presentation order
    pub fn display_labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(label, _)| *label)
    }

    /// Canonical values in presentation order
    pub fn canonical_values(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }

    /// All `(label, canonical)` pairs in presentation order
    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }

    /// The label shown before the user picks anything
    pub fn default_label(&self) -> &'static str {
        self.entries[0].0
    }

    pub fn canonical(&self, label: &str) -> Result<&'static str, LookupError> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, value)| *value)
            .ok_or_else(|| self.lookup_error(label))
    }

    /// Reverse lookup from a canonical value to its display label
    pub fn label_for(&self, canonical: &str) -> Result<&'static str, LookupError> {
        self.entries
            .iter()
            .find(|(_, v)| *v == canonical)
            .map(|(label, _)| *label)
            .ok_or_else(|| self.lookup_error(canonical))
    }

    /// Accept either a display label or a canonical value (case-insensitive)
    /// and return the display label.
    pub fn resolve(&self, input: &str) -> Result<&'static str, LookupError> {
        let trimmed = input.trim();
        self.entries
            .iter()
            .find(|(label, value)| *label == trimmed || value.eq_ignore_ascii_case(trimmed))
            .map(|(label, _)| *label)
            .ok_or_else(|| self.lookup_error(input))
    }

    fn lookup_error(&self, label: &str) -> LookupError {
        LookupError {
            registry: self.name,
            label: label.to_string(),
        }
    }
}

/// Traffic level on the route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    pub const ALL: [TrafficLevel; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Part of the day the order is delivered in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    #[default]
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

macro_rules! choice_impls {
    ($ty:ty, $registry:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = LookupError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| LookupError {
                        registry: $registry,
                        label: s.to_string(),
                    })
            }
        }
    };
}

choice_impls!(TrafficLevel, "traffic level");
choice_impls!(TimeOfDay, "time of day");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_label_has_canonical_value() {
        for registry in [OptionRegistry::weather(), OptionRegistry::vehicle_type()] {
            for label in registry.display_labels() {
                let value = registry.canonical(label).unwrap();
                assert!(!value.is_empty(), "{} has empty canonical value", label);
                assert!(label.starts_with(value), "{} should start with {}", label, value);
            }
        }
    }

    #[test]
    fn test_labels_unique_and_registries_disjoint() {
        let weather: HashSet<_> = OptionRegistry::weather().canonical_values().collect();
        let vehicle: HashSet<_> = OptionRegistry::vehicle_type().canonical_values().collect();
        assert_eq!(weather.len(), 5);
        assert_eq!(vehicle.len(), 3);
        assert!(weather.is_disjoint(&vehicle));

        let labels: HashSet<_> = OptionRegistry::weather().display_labels().collect();
        assert_eq!(labels.len(), 5);
    }

    #[test]
    fn test_canonical_values_carry_no_glyphs() {
        for registry in [OptionRegistry::weather(), OptionRegistry::vehicle_type()] {
            for value in registry.canonical_values() {
                assert!(value.chars().all(|c| c.is_ascii_alphabetic()), "{}", value);
            }
        }
    }

    #[test]
    fn test_presentation_order() {
        let labels: Vec<_> = OptionRegistry::vehicle_type().display_labels().collect();
        assert_eq!(labels, vec!["Bike 🚲", "Scooter 🛵", "Car 🚗"]);
        assert_eq!(OptionRegistry::weather().default_label(), "Clear ☀️");
    }

    #[test]
    fn test_unknown_label_is_lookup_error() {
        let err = OptionRegistry::weather().canonical("Hail").unwrap_err();
        assert_eq!(err.registry, "weather");
        assert_eq!(err.label, "Hail");
        // Canonical values are not labels
        assert!(OptionRegistry::weather().canonical("Clear").is_err());
    }

    #[test]
    fn test_resolve_accepts_label_or_canonical() {
        let registry = OptionRegistry::weather();
        assert_eq!(registry.resolve("Rainy 🌧️").unwrap(), "Rainy 🌧️");
        assert_eq!(registry.resolve("rainy").unwrap(), "Rainy 🌧️");
        assert_eq!(registry.label_for("Windy").unwrap(), "Windy 💨");
        assert!(registry.resolve("sunny").is_err());
    }

    #[test]
    fn test_choice_parsing() {
        assert_eq!("medium".parse::<TrafficLevel>().unwrap(), TrafficLevel::Medium);
        assert_eq!("Night".parse::<TimeOfDay>().unwrap(), TimeOfDay::Night);
        assert!("Dusk".parse::<TimeOfDay>().is_err());
        assert_eq!(TimeOfDay::Evening.to_string(), "Evening");
        assert_eq!(TrafficLevel::default(), TrafficLevel::Low);
    }
}

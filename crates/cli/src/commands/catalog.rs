//! Listing of form fields and their allowed options

use anyhow::Result;
use eta_lib::inputs::field_specs;
use eta_lib::{OptionRegistry, TimeOfDay, TrafficLevel};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_table, OutputFormat};

/// Row for the options table
#[derive(Tabled, Serialize)]
struct OptionRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Model Value")]
    value: &'static str,
    #[tabled(rename = "Default")]
    default: bool,
}

/// Row for the fields table
#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Allowed")]
    allowed: String,
}

fn registry_rows(field: &'static str, registry: OptionRegistry) -> Vec<OptionRow> {
    let default = registry.default_label();
    registry
        .entries()
        .iter()
        .map(|&(label, value)| OptionRow {
            field,
            label,
            value,
            default: label == default,
        })
        .collect()
}

fn plain_rows(field: &'static str, values: &[&'static str]) -> Vec<OptionRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| OptionRow {
            field,
            label: value,
            value,
            default: i == 0,
        })
        .collect()
}

fn option_rows() -> Vec<OptionRow> {
    let traffic: Vec<_> = TrafficLevel::ALL.iter().map(|t| t.as_str()).collect();
    let time: Vec<_> = TimeOfDay::ALL.iter().map(|t| t.as_str()).collect();

    let mut rows = registry_rows("weather", OptionRegistry::weather());
    rows.extend(plain_rows("traffic_level", &traffic));
    rows.extend(plain_rows("time_of_day", &time));
    rows.extend(registry_rows("vehicle_type", OptionRegistry::vehicle_type()));
    rows
}

fn field_rows() -> Vec<FieldRow> {
    field_specs()
        .into_iter()
        .map(|spec| FieldRow {
            name: spec.field.name(),
            label: spec.label,
            kind: format!("{:?}", spec.kind).to_lowercase(),
            default: spec.default,
            allowed: spec.constraint.describe(),
        })
        .collect()
}

/// Show every categorical option with its model value
pub fn show_options(format: OutputFormat) -> Result<()> {
    print_table(&option_rows(), format);
    Ok(())
}

/// Show the form fields with defaults and constraints
pub fn show_fields(format: OutputFormat) -> Result<()> {
    print_table(&field_rows(), format);
    Ok(())
}

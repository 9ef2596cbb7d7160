//! One-shot prediction from command-line flags

use anyhow::{bail, Result};
use colored::Colorize;
use eta_lib::{
    observability::StructuredLogger, session::summarize, DeliveryForm, Field, FormInputs,
    ModelStore, Outcome,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::output::{print_error, print_heading, print_info, print_success, print_warning, OutputFormat};
use crate::PredictArgs;

impl PredictArgs {
    /// Raw values given on the command line, keyed by field
    fn provided(&self) -> Vec<(Field, &str)> {
        [
            (Field::DistanceKm, &self.distance_km),
            (Field::Weather, &self.weather),
            (Field::TrafficLevel, &self.traffic_level),
            (Field::TimeOfDay, &self.time_of_day),
            (Field::VehicleType, &self.vehicle_type),
            (Field::PreparationTimeMin, &self.preparation_time_min),
            (Field::CourierExperienceYrs, &self.courier_experience_yrs),
        ]
        .into_iter()
        .filter_map(|(field, raw)| raw.as_deref().map(|raw| (field, raw)))
        .collect()
    }
}

/// Apply the flags to a default form; unset fields keep their defaults
pub fn collect_inputs(args: &PredictArgs) -> Result<FormInputs> {
    let mut inputs = FormInputs::default();
    let mut errors = Vec::new();
    for (field, raw) in args.provided() {
        if let Err(e) = inputs.set(field, raw) {
            errors.push(e.to_string());
        }
    }
    if !errors.is_empty() {
        bail!("invalid input: {}", errors.join("; "));
    }
    Ok(inputs)
}

/// Run a single prediction and print the outcome
pub fn run(model_path: &Path, args: &PredictArgs, format: OutputFormat) -> Result<()> {
    let inputs = collect_inputs(args)?;
    debug!(model_path = %model_path.display(), "Using model artifact");
    let store = Arc::new(ModelStore::from_path(model_path));
    let form = DeliveryForm::with_inputs(store, StructuredLogger::new("cli"), inputs);

    let summary = summarize(form.inputs());
    let outcome = form.trigger();

    match format {
        OutputFormat::Json => {
            let summary: Vec<String> = summary.iter().map(ToString::to_string).collect();
            let body = json!({
                "success": outcome.is_success(),
                "prediction_minutes": outcome.estimate().map(|e| e.minutes),
                "model_version": outcome.estimate().map(|e| e.model_version.clone()),
                "message": outcome.message(),
                "disclaimer": outcome.disclaimer(),
                "warning": outcome.warning().map(ToString::to_string),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            print_heading("Summary of Inputs");
            for line in &summary {
                println!("{:<20}{}", format!("{}:", line.label), line.value.cyan());
            }
            println!();

            if let Some(warning) = outcome.warning() {
                print_warning(&warning.to_string());
            }
            match &outcome {
                Outcome::Predicted { .. } => {
                    print_success(&outcome.message());
                    if let Some(disclaimer) = outcome.disclaimer() {
                        print_info(disclaimer);
                    }
                }
                _ => print_error(&outcome.message()),
            }
        }
    }

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

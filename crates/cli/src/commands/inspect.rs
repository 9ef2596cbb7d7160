//! Model artifact inspection

use anyhow::{Context, Result};
use colored::Colorize;
use eta_lib::predictor::{read_pipeline, HandleUnknown, Pipeline, Step, TransformStep};
use eta_lib::Predictor;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;
use tracing::debug;

use crate::output::{color_flag, print_heading, print_warning, short_checksum, OutputFormat};

/// Row for the transformer table
#[derive(Tabled, Serialize)]
struct TransformerRow {
    #[tabled(rename = "Transformer")]
    name: String,
    #[tabled(rename = "Columns")]
    columns: String,
    #[tabled(rename = "Steps")]
    steps: String,
}

/// Row for the encoder category table
#[derive(Tabled, Serialize)]
struct CategoryRow {
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Known Categories")]
    categories: String,
}

/// What an artifact contains and how it would be served
#[derive(Debug, Serialize)]
struct ArtifactReport {
    path: String,
    model_version: String,
    checksum: String,
    steps: Vec<(String, &'static str)>,
    handle_unknown: Option<HandleUnknown>,
    tolerates_unknown_after_load: bool,
    load_warning: Option<String>,
}

fn step_label(name: &str, step: &TransformStep) -> String {
    let kind = match step {
        TransformStep::SimpleImputer { .. } => "simple_imputer",
        TransformStep::StandardScaler { .. } => "standard_scaler",
        TransformStep::OneHotEncoder(_) => "one_hot_encoder",
        TransformStep::Passthrough => "passthrough",
    };
    format!("{} ({})", name, kind)
}

fn report(path: &Path, pipeline: &Pipeline, checksum: String) -> ArtifactReport {
    let mut reconfigured = pipeline.clone();
    let load_warning = reconfigured
        .tolerate_unknown_categories()
        .err()
        .map(|w| w.to_string());

    ArtifactReport {
        path: path.display().to_string(),
        model_version: pipeline.model_version().to_string(),
        checksum,
        steps: pipeline
            .steps
            .iter()
            .map(|(name, step)| (name.clone(), step.kind()))
            .collect(),
        handle_unknown: pipeline.unknown_category_mode(),
        tolerates_unknown_after_load: reconfigured.unknown_category_mode()
            == Some(HandleUnknown::Ignore),
        load_warning,
    }
}

fn transformer_rows(pipeline: &Pipeline) -> Vec<TransformerRow> {
    pipeline
        .preprocessor()
        .map(|ct| {
            ct.transformers
                .iter()
                .map(|t| TransformerRow {
                    name: t.name.clone(),
                    columns: t.columns.join(", "),
                    steps: t
                        .steps
                        .iter()
                        .map(|(name, step)| step_label(name, step))
                        .collect::<Vec<_>>()
                        .join(" → "),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn category_rows(pipeline: &Pipeline) -> Vec<CategoryRow> {
    pipeline
        .encoders()
        .into_iter()
        .flat_map(|(transformer, encoder)| {
            transformer
                .columns
                .iter()
                .zip(&encoder.categories)
                .map(|(column, categories)| CategoryRow {
                    column: column.clone(),
                    categories: categories.join(", "),
                })
        })
        .collect()
}

/// Describe the pipeline artifact at `path`
pub fn inspect_model(path: &Path, format: OutputFormat) -> Result<()> {
    let (pipeline, checksum) = read_pipeline(path)
        .with_context(|| format!("Failed to read model artifact {}", path.display()))?;

    let report = report(path, &pipeline, checksum);
    debug!(
        model_path = %path.display(),
        steps = report.steps.len(),
        "Inspected model artifact"
    );

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_heading("Model Artifact");
            println!("Path:             {}", report.path.cyan());
            println!("Version:          {}", report.model_version);
            println!("Checksum:         {}", short_checksum(&report.checksum));
            let regressor = match pipeline.regressor() {
                Some(Step::Linear(linear)) => format!("linear ({} coefficients)", linear.coef.len()),
                Some(Step::TreeEnsemble(ensemble)) => {
                    format!("tree_ensemble ({} trees)", ensemble.trees.len())
                }
                Some(other) => other.kind().to_string(),
                None => "none".to_string(),
            };
            println!("Regressor:        {}", regressor);
            println!(
                "Unseen values:    {}",
                color_flag(report.tolerates_unknown_after_load)
            );
            println!();

            let transformers = transformer_rows(&pipeline);
            if !transformers.is_empty() {
                println!("{}", "Preprocessor".bold());
                let table = tabled::Table::new(transformers)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }

            let categories = category_rows(&pipeline);
            if !categories.is_empty() {
                println!("{}", "Categories".bold());
                let table = tabled::Table::new(categories)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }

            if let Some(warning) = &report.load_warning {
                print_warning(warning);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../../../models/best_model.json");

    #[test]
    fn test_report_for_sample_artifact() {
        let pipeline = Pipeline::from_slice(SAMPLE.as_bytes()).unwrap();
        let report = report(Path::new("best_model.json"), &pipeline, "ab".to_string());

        assert_eq!(report.model_version, "linear-2024.11");
        assert_eq!(report.handle_unknown, Some(HandleUnknown::Error));
        assert!(report.tolerates_unknown_after_load);
        assert!(report.load_warning.is_none());
        assert_eq!(report.steps[0], ("preprocessor".to_string(), "column_transformer"));
    }

    #[test]
    fn test_report_flags_unexpected_layout() {
        let moved = SAMPLE.replacen("\"onehot\"", "\"encoder\"", 1);
        let pipeline = Pipeline::from_slice(moved.as_bytes()).unwrap();
        let report = report(Path::new("best_model.json"), &pipeline, "ab".to_string());

        assert!(!report.tolerates_unknown_after_load);
        assert!(report
            .load_warning
            .unwrap()
            .starts_with("Error updating one-hot encoder"));
    }

    #[test]
    fn test_category_rows() {
        let pipeline = Pipeline::from_slice(SAMPLE.as_bytes()).unwrap();
        let rows = category_rows(&pipeline);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].column, "Weather");
        assert!(rows[0].categories.contains("Windy"));
    }
}

//! HTML rendering for the single-page prediction form

use eta_lib::inputs::{Constraint, Field, FieldKind, FormInputs};
use eta_lib::session::summarize;
use eta_lib::Outcome;

const TITLE: &str = "Food Delivery Time Prediction";
const INTRO: &str = "This app predicts delivery time in minutes based on your inputs. \
                     Please provide the required details below.";

/// Input controls grouped the way the form lays them out
const SECTIONS: &[(&str, &[Field])] = &[
    (
        "Delivery Conditions",
        &[Field::Weather, Field::TrafficLevel, Field::TimeOfDay],
    ),
    (
        "Courier Details",
        &[Field::VehicleType, Field::CourierExperienceYrs],
    ),
    (
        "Order Details",
        &[Field::DistanceKm, Field::PreparationTimeMin],
    ),
];

const STYLE: &str = r#"
body { font-family: sans-serif; background-color: #F5F5F5; margin: 0; }
.header { font-size: 2.5rem; font-weight: bold; text-align: center; padding: 1rem 0; color: #FFFFFF; background-color: #333333; }
main { max-width: 56rem; margin: 0 auto; padding: 1rem; }
.row { display: flex; gap: 1rem; }
.row label { flex: 1; display: flex; flex-direction: column; }
button { background-color: #ff5733; color: white; font-size: 1rem; font-weight: bold; padding: 0.5rem 1rem; display: block; margin: 1rem auto; border: none; }
.result { text-align: center; color: green; }
.error { color: #b00020; }
.warning { color: #8a6d00; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the whole page.
///
/// `errors` are input problems found while reading the submitted form;
/// `outcome` is the result of the last Predict trigger, if any.
pub fn page(inputs: &FormInputs, outcome: Option<&Outcome>, errors: &[String]) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{style}</style></head><body><div class=\"header\">{title}</div><main><p>{intro}</p>\
         <form method=\"post\" action=\"/predict\">",
        title = TITLE,
        style = STYLE,
        intro = escape(INTRO),
    ));

    for (heading, fields) in SECTIONS {
        html.push_str(&format!("<h3>{}</h3><div class=\"row\">", heading));
        for field in *fields {
            html.push_str(&control(inputs, *field));
        }
        html.push_str("</div>");
    }

    html.push_str("<h3>Summary of Inputs</h3><ul>");
    for line in summarize(inputs) {
        html.push_str(&format!(
            "<li><strong>{}</strong>: {}</li>",
            escape(line.label),
            escape(&line.value)
        ));
    }
    html.push_str("</ul><button type=\"submit\">Predict Delivery Time</button></form>");

    for error in errors {
        html.push_str(&format!("<p class=\"error\">{}</p>", escape(error)));
    }
    if let Some(outcome) = outcome {
        html.push_str(&outcome_block(outcome));
    }

    html.push_str("</main></body></html>");
    html
}

fn control(inputs: &FormInputs, field: Field) -> String {
    let name = field.name();
    let current = inputs.value(field);
    let mut html = format!(
        "<label title=\"{help}\">{label}",
        help = escape(field.help()),
        label = escape(field.label())
    );

    match (field.kind(), field.constraint()) {
        (FieldKind::Choice, Constraint::OneOf { options }) => {
            html.push_str(&format!("<select name=\"{}\">", name));
            for option in options {
                let selected = if option == current { " selected" } else { "" };
                html.push_str(&format!(
                    "<option value=\"{v}\"{selected}>{v}</option>",
                    v = escape(option),
                    selected = selected
                ));
            }
            html.push_str("</select>");
        }
        (_, Constraint::Minimum { min, step }) => {
            html.push_str(&format!(
                "<input type=\"number\" name=\"{name}\" min=\"{min}\" step=\"{step}\" value=\"{value}\">",
                name = name,
                min = min,
                step = step,
                value = escape(&current)
            ));
        }
        (_, Constraint::OneOf { .. }) => {}
    }

    html.push_str("</label>");
    html
}

fn outcome_block(outcome: &Outcome) -> String {
    let mut html = String::new();
    if let Some(warning) = outcome.warning() {
        html.push_str(&format!("<p class=\"warning\">{}</p>", escape(&warning.to_string())));
    }
    match outcome {
        Outcome::Predicted { .. } => {
            html.push_str(&format!("<h2 class=\"result\">{}</h2>", escape(&outcome.message())));
            if let Some(disclaimer) = outcome.disclaimer() {
                html.push_str(&format!("<p><em>{}</em></p>", escape(disclaimer)));
            }
        }
        _ => {
            html.push_str(&format!("<p class=\"error\">{}</p>", escape(&outcome.message())));
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use eta_lib::{ArtifactLoadWarning, EtaEstimate, PredictionError, ValidationError};

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_page_renders_controls_and_summary() {
        let html = page(&FormInputs::default(), None, &[]);
        for field in Field::ALL {
            assert!(html.contains(&format!("name=\"{}\"", field.name())), "{}", field);
        }
        assert!(html.contains("<option value=\"Clear ☀️\" selected>"));
        assert!(html.contains("<strong>Weather</strong>: Clear</li>"));
        assert!(html.contains("value=\"5.0\""));
        assert!(!html.contains("class=\"result\""));
    }

    #[test]
    fn test_page_renders_outcomes() {
        let predicted = Outcome::Predicted {
            estimate: EtaEstimate::new(32.47, "v1"),
            warning: None,
        };
        let html = page(&FormInputs::default(), Some(&predicted), &[]);
        assert!(html.contains("Predicted Delivery Time: 32.5 minutes"));
        assert!(html.contains("historical data"));

        let rejected = Outcome::Rejected(ValidationError::NonPositiveDistance);
        let html = page(&FormInputs::default(), Some(&rejected), &[]);
        assert!(html.contains("<p class=\"error\">Distance must be greater than zero.</p>"));
    }

    #[test]
    fn test_page_renders_warning_and_input_errors_escaped() {
        let failed = Outcome::Failed {
            error: PredictionError::Model("<bad>".to_string()),
            warning: Some(ArtifactLoadWarning::new("no step named 'preprocessor'")),
        };
        let errors = vec!["distance_km: cannot parse \"far\" as a number".to_string()];
        let html = page(&FormInputs::default(), Some(&failed), &errors);

        assert!(html.contains(
            "<p class=\"warning\">Error updating one-hot encoder: no step named &#39;preprocessor&#39;</p>"
        ));
        assert!(html.contains(
            "<p class=\"error\">distance_km: cannot parse &quot;far&quot; as a number</p>"
        ));
        assert!(html.contains(
            "<p class=\"error\">An error occurred during prediction: &lt;bad&gt;</p>"
        ));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</main></body></html>"));
    }
}

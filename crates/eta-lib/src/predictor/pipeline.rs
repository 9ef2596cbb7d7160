//! Fitted preprocessing + regression pipeline
//!
//! The artifact is a JSON document describing a column transformer followed
//! by a regressor:
//!
//! ```json
//! { "version": "2024-11-rf",
//!   "steps": [
//!     ["preprocessor", { "type": "column_transformer", "transformers": [...] }],
//!     ["regressor", { "type": "linear", "coef": [...], "intercept": 12.0 }]
//!   ] }
//! ```
//!
//! The feature vector is the concatenation of each transformer's output in
//! order. Record columns not named by any transformer are dropped.

use super::Predictor;
use crate::error::{ArtifactError, ArtifactLoadWarning, PredictionError};
use crate::record::{FeatureValue, PredictionRequest};
use serde::{Deserialize, Serialize};

/// Name of the preprocessing step the encoder lives under
pub const PREPROCESSOR_STEP: &str = "preprocessor";

/// Position of the categorical transformer inside the preprocessor
pub const CATEGORICAL_TRANSFORMER_INDEX: usize = 1;

/// Name of the one-hot encoding sub-step in the categorical transformer
pub const ONEHOT_STEP: &str = "onehot";

/// Version reported for artifacts that carry none
pub const UNVERSIONED: &str = "unversioned";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub steps: Vec<(String, Step)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    ColumnTransformer(ColumnTransformer),
    Linear(LinearRegressor),
    TreeEnsemble(TreeEnsemble),
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::ColumnTransformer(_) => "column_transformer",
            Step::Linear(_) => "linear",
            Step::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub transformers: Vec<Transformer>,
}

/// A named chain of steps applied to a subset of record columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformer {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub steps: Vec<(String, TransformStep)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformStep {
    /// Replace non-finite numeric inputs with a per-column statistic
    SimpleImputer { statistics: Vec<f64> },
    StandardScaler { mean: Vec<f64>, scale: Vec<f64> },
    OneHotEncoder(OneHotEncoder),
    Passthrough,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<Vec<String>>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// Additive ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

fn default_learning_rate() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// Internal node when `value` is `None`, leaf otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Pipeline {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let pipeline: Pipeline = serde_json::from_slice(bytes)?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    pub fn named_step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn named_step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// The column transformer feeding the regressor
    pub fn preprocessor(&self) -> Option<&ColumnTransformer> {
        match self.steps.first() {
            Some((_, Step::ColumnTransformer(ct))) => Some(ct),
            _ => None,
        }
    }

    pub fn regressor(&self) -> Option<&Step> {
        self.steps.last().map(|(_, s)| s)
    }

    /// Check the pipeline shape and that every width lines up
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let (preprocessor, regressor) = match self.steps.as_slice() {
            [(_, Step::ColumnTransformer(ct)), (_, regressor)] => (ct, regressor),
            _ => {
                return Err(ArtifactError::Invalid(
                    "expected exactly a column transformer followed by a regressor".to_string(),
                ))
            }
        };

        let width = preprocessor.output_width()?;
        let expected = match regressor {
            Step::Linear(linear) => linear.coef.len(),
            Step::TreeEnsemble(ensemble) => {
                ensemble.validate()?;
                ensemble.n_features
            }
            Step::ColumnTransformer(_) => {
                return Err(ArtifactError::Invalid(
                    "final step must be a regressor".to_string(),
                ))
            }
        };

        if width != expected {
            return Err(ArtifactError::Invalid(format!(
                "preprocessor produces {} features but regressor expects {}",
                width, expected
            )));
        }
        Ok(())
    }

    /// Reconfigure the categorical encoder so unseen categories encode to
    /// all zeros instead of failing.
    ///
    /// Relies on the usual layout: a `preprocessor` step whose second
    /// transformer has a `onehot` sub-step. Anything else is reported as a
    /// warning and the pipeline is left untouched.
    pub fn tolerate_unknown_categories(&mut self) -> Result<(), ArtifactLoadWarning> {
        let step = self.named_step_mut(PREPROCESSOR_STEP).ok_or_else(|| {
            ArtifactLoadWarning::new(format!("no step named '{}'", PREPROCESSOR_STEP))
        })?;

        let kind = step.kind();
        let Step::ColumnTransformer(preprocessor) = step else {
            return Err(ArtifactLoadWarning::new(format!(
                "step '{}' is a {}, not a column transformer",
                PREPROCESSOR_STEP, kind
            )));
        };

        let transformer = preprocessor
            .transformers
            .get_mut(CATEGORICAL_TRANSFORMER_INDEX)
            .ok_or_else(|| {
                ArtifactLoadWarning::new(format!(
                    "'{}' has no transformer at position {}",
                    PREPROCESSOR_STEP, CATEGORICAL_TRANSFORMER_INDEX
                ))
            })?;

        let transformer_name = transformer.name.clone();
        match transformer.named_step_mut(ONEHOT_STEP) {
            Some(TransformStep::OneHotEncoder(encoder)) => {
                encoder.handle_unknown = HandleUnknown::Ignore;
                Ok(())
            }
            Some(_) => Err(ArtifactLoadWarning::new(format!(
                "step '{}' in transformer '{}' is not a one-hot encoder",
                ONEHOT_STEP, transformer_name
            ))),
            None => Err(ArtifactLoadWarning::new(format!(
                "transformer '{}' has no step named '{}'",
                transformer_name, ONEHOT_STEP
            ))),
        }
    }

    /// All one-hot encoders with the transformer they belong to
    pub fn encoders(&self) -> Vec<(&Transformer, &OneHotEncoder)> {
        let Some(preprocessor) = self.preprocessor() else {
            return Vec::new();
        };
        preprocessor
            .transformers
            .iter()
            .flat_map(|t| {
                t.steps.iter().filter_map(move |(_, step)| match step {
                    TransformStep::OneHotEncoder(encoder) => Some((t, encoder)),
                    _ => None,
                })
            })
            .collect()
    }

    /// How the categorical encoders treat unseen values; `None` without any
    pub fn unknown_category_mode(&self) -> Option<HandleUnknown> {
        let encoders = self.encoders();
        if encoders.is_empty() {
            None
        } else if encoders
            .iter()
            .all(|(_, e)| e.handle_unknown == HandleUnknown::Ignore)
        {
            Some(HandleUnknown::Ignore)
        } else {
            Some(HandleUnknown::Error)
        }
    }

    /// Run the preprocessor on a record
    pub fn transform(&self, request: &PredictionRequest) -> Result<Vec<f64>, PredictionError> {
        let preprocessor = self
            .preprocessor()
            .ok_or_else(|| PredictionError::Model("pipeline has no preprocessor".to_string()))?;
        preprocessor.transform(request)
    }
}

impl Predictor for Pipeline {
    fn predict(&self, request: &PredictionRequest) -> Result<f64, PredictionError> {
        let features = self.transform(request)?;
        match self.regressor() {
            Some(Step::Linear(linear)) => linear.predict(&features),
            Some(Step::TreeEnsemble(ensemble)) => ensemble.predict(&features),
            _ => Err(PredictionError::Model("pipeline has no regressor".to_string())),
        }
    }

    fn model_version(&self) -> &str {
        self.version.as_deref().unwrap_or(UNVERSIONED)
    }
}

impl ColumnTransformer {
    pub fn output_width(&self) -> Result<usize, ArtifactError> {
        self.transformers.iter().map(Transformer::output_width).sum()
    }

    pub fn transform(&self, request: &PredictionRequest) -> Result<Vec<f64>, PredictionError> {
        let mut features = Vec::new();
        for transformer in &self.transformers {
            features.extend(transformer.transform(request)?);
        }
        Ok(features)
    }
}

impl Transformer {
    pub fn named_step_mut(&mut self, name: &str) -> Option<&mut TransformStep> {
        self.steps.iter_mut().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    fn output_width(&self) -> Result<usize, ArtifactError> {
        let mut width = self.columns.len();
        for (step_name, step) in &self.steps {
            let check = |len: usize| {
                if len == width {
                    Ok(())
                } else {
                    Err(ArtifactError::Invalid(format!(
                        "step '{}' in transformer '{}' is fitted on {} columns, got {}",
                        step_name, self.name, len, width
                    )))
                }
            };
            match step {
                TransformStep::SimpleImputer { statistics } => check(statistics.len())?,
                TransformStep::StandardScaler { mean, scale } => {
                    check(mean.len())?;
                    check(scale.len())?;
                }
                TransformStep::OneHotEncoder(encoder) => {
                    check(encoder.categories.len())?;
                    width = encoder.categories.iter().map(Vec::len).sum();
                }
                TransformStep::Passthrough => {}
            }
        }
        Ok(width)
    }

    fn transform(&self, request: &PredictionRequest) -> Result<Vec<f64>, PredictionError> {
        let mut values = self
            .columns
            .iter()
            .map(|column| {
                request
                    .value(column)
                    .ok_or_else(|| PredictionError::MissingColumn(column.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (_, step) in &self.steps {
            values = step.apply(&self.columns, values)?;
        }

        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                FeatureValue::Numeric(v) => Ok(v),
                other => Err(PredictionError::TypeMismatch {
                    column: self.column_name(i),
                    expected: "numeric",
                    actual: other.kind(),
                }),
            })
            .collect()
    }

    fn column_name(&self, index: usize) -> String {
        self.columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("{}[{}]", self.name, index))
    }
}

impl TransformStep {
    fn apply(
        &self,
        columns: &[String],
        values: Vec<FeatureValue>,
    ) -> Result<Vec<FeatureValue>, PredictionError> {
        let column = |i: usize| columns.get(i).cloned().unwrap_or_else(|| format!("x{}", i));
        match self {
            TransformStep::Passthrough => Ok(values),
            TransformStep::SimpleImputer { statistics } => Ok(values
                .into_iter()
                .zip(statistics)
                .map(|(value, fill)| match value {
                    FeatureValue::Numeric(v) if !v.is_finite() => FeatureValue::Numeric(*fill),
                    other => other,
                })
                .collect()),
            TransformStep::StandardScaler { mean, scale } => values
                .into_iter()
                .enumerate()
                .map(|(i, value)| match value {
                    FeatureValue::Numeric(v) => {
                        let s = scale[i];
                        let s = if s == 0.0 { 1.0 } else { s };
                        Ok(FeatureValue::Numeric((v - mean[i]) / s))
                    }
                    other => Err(PredictionError::TypeMismatch {
                        column: column(i),
                        expected: "numeric",
                        actual: other.kind(),
                    }),
                })
                .collect(),
            TransformStep::OneHotEncoder(encoder) => {
                let mut out = Vec::new();
                for (i, value) in values.iter().enumerate() {
                    let categories = &encoder.categories[i];
                    let key = value.to_string();
                    let hit = categories.iter().position(|c| *c == key);
                    if hit.is_none() && encoder.handle_unknown == HandleUnknown::Error {
                        return Err(PredictionError::UnknownCategory {
                            column: column(i),
                            value: key,
                        });
                    }
                    out.extend((0..categories.len()).map(|j| {
                        FeatureValue::Numeric(if Some(j) == hit { 1.0 } else { 0.0 })
                    }));
                }
                Ok(out)
            }
        }
    }
}

impl LinearRegressor {
    pub fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.coef.len() {
            return Err(PredictionError::FeatureCount {
                expected: self.coef.len(),
                actual: features.len(),
            });
        }
        Ok(self.intercept + self.coef.iter().zip(features).map(|(c, x)| c * x).sum::<f64>())
    }
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), ArtifactError> {
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ArtifactError::Invalid(format!("tree {} has no nodes", t)));
            }
            for node in tree.nodes.iter().filter(|n| n.value.is_none()) {
                if node.left >= tree.nodes.len() || node.right >= tree.nodes.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {} has a child index out of range",
                        t
                    )));
                }
                if node.feature >= self.n_features {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {} splits on feature {} of {}",
                        t, node.feature, self.n_features
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.eval(features)?;
        }
        Ok(self.base_score + self.learning_rate * sum)
    }
}

impl Tree {
    /// Walk from the root; `x <= threshold` goes left
    pub fn eval(&self, features: &[f64]) -> Result<f64, PredictionError> {
        let mut idx = 0usize;
        // A valid path visits each node at most once
        for _ in 0..=self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| PredictionError::Model(format!("tree node {} out of range", idx)))?;
            if let Some(value) = node.value {
                return Ok(value);
            }
            let x = features.get(node.feature).copied().ok_or_else(|| {
                PredictionError::Model(format!("tree splits on missing feature {}", node.feature))
            })?;
            idx = if x <= node.threshold { node.left } else { node.right };
        }
        Err(PredictionError::Model("tree contains a cycle".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::FormInputs;
    use crate::record::assemble;

    fn sample_pipeline() -> Pipeline {
        serde_json::from_str(include_str!("../../../../models/best_model.json")).unwrap()
    }

    fn request() -> PredictionRequest {
        assemble(&FormInputs::default()).unwrap()
    }

    fn leaf(value: f64) -> TreeNode {
        TreeNode {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
        }
    }

    #[test]
    fn test_sample_artifact_is_valid() {
        let pipeline = sample_pipeline();
        pipeline.validate().unwrap();
        assert_eq!(pipeline.model_version(), "linear-2024.11");
        let eta = pipeline.predict(&request()).unwrap();
        assert!(eta.is_finite() && eta > 0.0, "eta was {}", eta);
    }

    #[test]
    fn test_linear_prediction_matches_hand_computation() {
        let pipeline = Pipeline {
            version: None,
            steps: vec![
                (
                    "preprocessor".to_string(),
                    Step::ColumnTransformer(ColumnTransformer {
                        transformers: vec![
                            Transformer {
                                name: "num".to_string(),
                                columns: vec!["Distance_km".to_string()],
                                steps: vec![(
                                    "scaler".to_string(),
                                    TransformStep::StandardScaler {
                                        mean: vec![1.0],
                                        scale: vec![2.0],
                                    },
                                )],
                            },
                            Transformer {
                                name: "cat".to_string(),
                                columns: vec!["Weather".to_string()],
                                steps: vec![(
                                    "onehot".to_string(),
                                    TransformStep::OneHotEncoder(OneHotEncoder {
                                        categories: vec![vec!["Clear".to_string(), "Rainy".to_string()]],
                                        handle_unknown: HandleUnknown::Error,
                                    }),
                                )],
                            },
                        ],
                    }),
                ),
                (
                    "regressor".to_string(),
                    Step::Linear(LinearRegressor {
                        coef: vec![3.0, 1.0, 10.0],
                        intercept: 20.0,
                    }),
                ),
            ],
        };
        pipeline.validate().unwrap();
        // (5 - 1) / 2 = 2 -> 20 + 3*2 + 1*1 (Clear) = 27
        assert_eq!(pipeline.predict(&request()).unwrap(), 27.0);
        assert_eq!(pipeline.model_version(), UNVERSIONED);
    }

    #[test]
    fn test_unknown_category_fails_until_reconfigured() {
        let mut pipeline = sample_pipeline();
        let mut request = request();
        request.weather = "Sandstorm".to_string();

        let err = pipeline.predict(&request).unwrap_err();
        assert_eq!(
            err,
            PredictionError::UnknownCategory {
                column: "Weather".to_string(),
                value: "Sandstorm".to_string()
            }
        );

        assert_eq!(pipeline.unknown_category_mode(), Some(HandleUnknown::Error));
        pipeline.tolerate_unknown_categories().unwrap();
        assert_eq!(pipeline.unknown_category_mode(), Some(HandleUnknown::Ignore));
        assert!(pipeline.predict(&request).is_ok());
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let mut pipeline = sample_pipeline();
        pipeline.tolerate_unknown_categories().unwrap();
        let mut request = request();
        request.vehicle_type = "Drone".to_string();
        let features = pipeline.transform(&request).unwrap();

        let cat = &pipeline.preprocessor().unwrap().transformers[1];
        let numeric_width = pipeline.preprocessor().unwrap().transformers[0].columns.len();
        let TransformStep::OneHotEncoder(encoder) = &cat.steps[0].1 else {
            panic!("expected encoder");
        };
        let vehicle_col = cat.columns.iter().position(|c| c == "Vehicle_Type").unwrap();
        let offset: usize = numeric_width
            + encoder.categories[..vehicle_col].iter().map(Vec::len).sum::<usize>();
        let block = &features[offset..offset + encoder.categories[vehicle_col].len()];
        assert!(block.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_reconfiguration_warns_on_unexpected_layout() {
        let mut pipeline = sample_pipeline();
        pipeline.steps[0].0 = "features".to_string();
        let warning = pipeline.tolerate_unknown_categories().unwrap_err();
        assert!(warning.to_string().starts_with("Error updating one-hot encoder"));

        let mut pipeline = sample_pipeline();
        if let Step::ColumnTransformer(ct) = &mut pipeline.steps[0].1 {
            ct.transformers.truncate(1);
        }
        assert!(pipeline.tolerate_unknown_categories().is_err());

        let mut pipeline = sample_pipeline();
        if let Step::ColumnTransformer(ct) = &mut pipeline.steps[0].1 {
            ct.transformers[1].steps[0].0 = "encoder".to_string();
        }
        let warning = pipeline.tolerate_unknown_categories().unwrap_err();
        assert!(warning.reason.contains("onehot"));
    }

    #[test]
    fn test_validate_rejects_width_mismatch() {
        let mut pipeline = sample_pipeline();
        if let Some((_, Step::Linear(linear))) = pipeline.steps.last_mut() {
            linear.coef.pop();
        }
        assert!(matches!(pipeline.validate(), Err(ArtifactError::Invalid(_))));
        assert!(matches!(
            pipeline.predict(&request()),
            Err(PredictionError::FeatureCount { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_shape() {
        let pipeline = Pipeline {
            version: None,
            steps: vec![(
                "regressor".to_string(),
                Step::Linear(LinearRegressor {
                    coef: vec![],
                    intercept: 1.0,
                }),
            )],
        };
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_tree_ensemble() {
        let tree = Tree {
            nodes: vec![
                TreeNode {
                    feature: 0,
                    threshold: 3.0,
                    left: 1,
                    right: 2,
                    value: None,
                },
                leaf(10.0),
                leaf(20.0),
            ],
        };
        let ensemble = TreeEnsemble {
            n_features: 1,
            base_score: 5.0,
            learning_rate: 0.5,
            trees: vec![tree.clone(), tree],
        };
        ensemble.validate().unwrap();
        assert_eq!(ensemble.predict(&[2.0]).unwrap(), 15.0);
        assert_eq!(ensemble.predict(&[3.5]).unwrap(), 25.0);
        assert!(ensemble.predict(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_tree_cycle_is_an_error() {
        let tree = Tree {
            nodes: vec![TreeNode {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
                value: None,
            }],
        };
        assert!(tree.eval(&[1.0]).is_err());
    }

    #[test]
    fn test_imputer_fills_non_finite() {
        let step = TransformStep::SimpleImputer {
            statistics: vec![4.0],
        };
        let out = step
            .apply(&["Distance_km".to_string()], vec![FeatureValue::Numeric(f64::NAN)])
            .unwrap();
        assert_eq!(out, vec![FeatureValue::Numeric(4.0)]);
    }

    #[test]
    fn test_scaler_rejects_categorical_input() {
        let step = TransformStep::StandardScaler {
            mean: vec![0.0],
            scale: vec![1.0],
        };
        let err = step
            .apply(&["Weather".to_string()], vec![FeatureValue::Categorical("Clear".to_string())])
            .unwrap_err();
        assert!(matches!(err, PredictionError::TypeMismatch { .. }));
    }
}

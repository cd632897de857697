//! Random Forest Classifier
//!
//! Bagged ensemble of single-split decision stumps. Each stump is fit on a
//! bootstrap sample drawn with a seeded RNG, so training is deterministic
//! for a fixed configuration.

use crate::classifier::{validate_training_set, zero_one_loss, Classifier};
use crate::persist::{check_pipeline_compatibility, load_envelope, save_envelope, ModelEnvelope};
use crate::{ClassifierError, PersistenceError};
use feature_pipeline::{FeatureVector, PipelineDescriptor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const ALGORITHM: &str = "random_forest";

/// Ensemble size used when none is configured
const DEFAULT_ENSEMBLE_SIZE: usize = 100;

/// Bootstrap sample ratio used when none is configured
const DEFAULT_SAMPLE_RATIO: f64 = 0.632;

/// Forest hyperparameters. `None` means "use the algorithm default";
/// explicitly set values are validated when training starts.
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of stumps in the ensemble
    pub ensemble_size: Option<usize>,
    /// Fraction of the training set drawn (with replacement) per stump
    pub sample_ratio: Option<f64>,
    /// RNG seed for bootstrap sampling
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            ensemble_size: None,
            sample_ratio: None,
            seed: 42,
        }
    }
}

/// One axis-aligned split: `value <= threshold` votes left, else right
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature: usize,
    threshold: f64,
    left: i32,
    right: i32,
}

impl Stump {
    fn decide(&self, values: &[f64]) -> i32 {
        if values[self.feature] <= self.threshold {
            self.left
        } else {
            self.right
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ForestModel {
    dimension: usize,
    stumps: Vec<Stump>,
}

impl ForestModel {
    /// Reject decoded state that would break the classify invariants
    fn validate(&self, feature_dimension: usize) -> Result<(), PersistenceError> {
        if self.stumps.is_empty() {
            return Err(PersistenceError::Corrupt("model has no stumps".to_string()));
        }
        if self.dimension == 0 || self.dimension != feature_dimension {
            return Err(PersistenceError::Corrupt(format!(
                "model dimension {} does not match envelope dimension {}",
                self.dimension, feature_dimension
            )));
        }
        if self.stumps.iter().any(|s| s.feature >= self.dimension) {
            return Err(PersistenceError::Corrupt(
                "stump feature index exceeds model dimension".to_string(),
            ));
        }
        Ok(())
    }

    fn decide(&self, values: &[f64]) -> i32 {
        let mut votes: BTreeMap<i32, usize> = BTreeMap::new();
        for stump in &self.stumps {
            *votes.entry(stump.decide(values)).or_insert(0) += 1;
        }
        // Ties resolve to the smallest label through the ordered iteration
        let mut best_label = 0;
        let mut best_count = 0;
        for (label, count) in votes {
            if count > best_count {
                best_count = count;
                best_label = label;
            }
        }
        best_label
    }
}

/// Bagged-stump random forest honoring the ensemble-size and sample-ratio
/// knobs of the classic formulation.
#[derive(Debug, Clone, Default)]
pub struct RandomForest {
    config: ForestConfig,
    pipeline: Option<PipelineDescriptor>,
    model: Option<ForestModel>,
    training_error: Option<f64>,
}

impl RandomForest {
    /// Create an untrained forest with the given hyperparameters
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            pipeline: None,
            model: None,
            training_error: None,
        }
    }

    /// Bind the pipeline configuration used to compute features
    pub fn with_pipeline(mut self, descriptor: PipelineDescriptor) -> Self {
        self.pipeline = Some(descriptor);
        self
    }

    fn model(&self) -> Result<&ForestModel, ClassifierError> {
        self.model.as_ref().ok_or(ClassifierError::NotTrained)
    }

    fn resolved_ensemble_size(&self) -> Result<usize, ClassifierError> {
        match self.config.ensemble_size {
            Some(0) => Err(ClassifierError::InvalidHyperparameter {
                name: "ensemble_size",
                value: 0.0,
            }),
            Some(n) => Ok(n),
            None => Ok(DEFAULT_ENSEMBLE_SIZE),
        }
    }

    fn resolved_sample_ratio(&self) -> Result<f64, ClassifierError> {
        match self.config.sample_ratio {
            Some(r) if r <= 0.0 || r > 1.0 => Err(ClassifierError::InvalidHyperparameter {
                name: "sample_ratio",
                value: r,
            }),
            Some(r) => Ok(r),
            None => Ok(DEFAULT_SAMPLE_RATIO),
        }
    }
}

/// Majority label of an index set; ties resolve to the smallest label
fn majority(labels: impl Iterator<Item = i32>) -> Option<i32> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut best = None;
    let mut best_count = 0;
    for (label, count) in counts {
        if count > best_count {
            best_count = count;
            best = Some(label);
        }
    }
    best
}

/// Exhaustively fit the lowest-error stump over the sampled rows
fn fit_stump(data: &[FeatureVector], labels: &[i32], indices: &[usize]) -> Stump {
    let dimension = data[0].len();
    let mut best_errors = usize::MAX;
    let mut best = Stump {
        feature: 0,
        threshold: 0.0,
        left: labels[indices[0]],
        right: labels[indices[0]],
    };

    for feature in 0..dimension {
        let mut pairs: Vec<(f64, i32)> = indices
            .iter()
            .map(|&i| (data[i].values()[feature], labels[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Midpoints between distinct consecutive values; a constant feature
        // contributes one degenerate threshold
        let mut thresholds: Vec<f64> = pairs
            .windows(2)
            .filter(|w| w[0].0 < w[1].0)
            .map(|w| (w[0].0 + w[1].0) / 2.0)
            .collect();
        if thresholds.is_empty() {
            thresholds.push(pairs[0].0);
        }

        for threshold in thresholds {
            let left = majority(
                pairs
                    .iter()
                    .filter(|(v, _)| *v <= threshold)
                    .map(|(_, l)| *l),
            );
            let right = majority(
                pairs
                    .iter()
                    .filter(|(v, _)| *v > threshold)
                    .map(|(_, l)| *l),
            );
            let (left, right) = match (left, right) {
                (Some(l), Some(r)) => (l, r),
                (Some(l), None) => (l, l),
                (None, Some(r)) => (r, r),
                (None, None) => continue,
            };

            let errors = pairs
                .iter()
                .filter(|(v, l)| {
                    let predicted = if *v <= threshold { left } else { right };
                    predicted != *l
                })
                .count();

            if errors < best_errors {
                best_errors = errors;
                best = Stump {
                    feature,
                    threshold,
                    left,
                    right,
                };
            }
        }
    }
    best
}

impl Classifier for RandomForest {
    fn train(
        &mut self,
        data: &[FeatureVector],
        labels: &[i32],
        calculate_error: bool,
    ) -> Result<(), ClassifierError> {
        let dimension = validate_training_set(data, labels)?;
        let ensemble_size = self.resolved_ensemble_size()?;
        let sample_ratio = self.resolved_sample_ratio()?;

        let n = data.len();
        let sample_size = ((sample_ratio * n as f64).ceil() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut stumps = Vec::with_capacity(ensemble_size);
        for _ in 0..ensemble_size {
            let indices: Vec<usize> = (0..sample_size).map(|_| rng.gen_range(0..n)).collect();
            stumps.push(fit_stump(data, labels, &indices));
        }

        let model = ForestModel { dimension, stumps };

        if calculate_error {
            let predictions: Vec<i32> =
                data.iter().map(|v| model.decide(v.values())).collect();
            self.training_error = Some(zero_one_loss(&predictions, labels));
        } else {
            self.training_error = None;
        }

        info!(
            examples = n,
            ensemble_size,
            sample_size,
            error = ?self.training_error,
            "random forest trained"
        );
        self.model = Some(model);
        Ok(())
    }

    fn classify(&self, vector: &FeatureVector) -> Result<i32, ClassifierError> {
        let model = self.model()?;
        if vector.len() != model.dimension {
            return Err(ClassifierError::DimensionMismatch {
                expected: model.dimension,
                actual: vector.len(),
            });
        }
        Ok(model.decide(vector.values()))
    }

    fn calculate_training_error(
        &mut self,
        data: &[FeatureVector],
        labels: &[i32],
    ) -> Result<f64, ClassifierError> {
        validate_training_set(data, labels)?;
        let model = self.model()?;
        let mut predictions = Vec::with_capacity(data.len());
        for vector in data {
            if vector.len() != model.dimension {
                return Err(ClassifierError::DimensionMismatch {
                    expected: model.dimension,
                    actual: vector.len(),
                });
            }
            predictions.push(model.decide(vector.values()));
        }
        let error = zero_one_loss(&predictions, labels);
        self.training_error = Some(error);
        Ok(error)
    }

    fn training_error(&self) -> Option<f64> {
        self.training_error
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        let model = self.model()?;
        let envelope = ModelEnvelope {
            algorithm: ALGORITHM.to_string(),
            feature_dimension: model.dimension,
            pipeline: self.pipeline.clone(),
            training_error: self.training_error,
            model: model.clone(),
        };
        save_envelope(path, &envelope)?;
        debug!(path = %path.display(), stumps = model.stumps.len(), "forest model saved");
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<(), ClassifierError> {
        let envelope: ModelEnvelope<ForestModel> = load_envelope(path, ALGORITHM)?;
        check_pipeline_compatibility(envelope.pipeline.as_ref(), self.pipeline.as_ref())?;
        envelope.model.validate(envelope.feature_dimension)?;

        self.model = Some(envelope.model);
        self.training_error = envelope.training_error;
        if self.pipeline.is_none() {
            self.pipeline = envelope.pipeline;
        }
        debug!(path = %path.display(), "forest model loaded");
        Ok(())
    }
}

//! Nearest-Centroid Classifier

use crate::classifier::{validate_training_set, zero_one_loss, Classifier};
use crate::persist::{check_pipeline_compatibility, load_envelope, save_envelope, ModelEnvelope};
use crate::{ClassifierError, PersistenceError};
use feature_pipeline::{FeatureVector, PipelineDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const ALGORITHM: &str = "nearest_centroid";

/// Fitted state: one mean vector per class, ordered by label
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CentroidModel {
    dimension: usize,
    centroids: Vec<(i32, Vec<f64>)>,
}

impl CentroidModel {
    /// Reject decoded state that would break the classify invariants
    fn validate(&self, feature_dimension: usize) -> Result<(), PersistenceError> {
        if self.centroids.is_empty() {
            return Err(PersistenceError::Corrupt(
                "model has no centroids".to_string(),
            ));
        }
        if self.dimension == 0 || self.dimension != feature_dimension {
            return Err(PersistenceError::Corrupt(format!(
                "model dimension {} does not match envelope dimension {}",
                self.dimension, feature_dimension
            )));
        }
        if self.centroids.iter().any(|(_, c)| c.len() != self.dimension) {
            return Err(PersistenceError::Corrupt(
                "centroid length does not match model dimension".to_string(),
            ));
        }
        Ok(())
    }

    fn decide(&self, values: &[f64]) -> i32 {
        let mut best_label = self.centroids[0].0;
        let mut best_distance = f64::MAX;
        for (label, centroid) in &self.centroids {
            let distance: f64 = centroid
                .iter()
                .zip(values)
                .map(|(c, v)| (c - v) * (c - v))
                .sum();
            if distance < best_distance {
                best_distance = distance;
                best_label = *label;
            }
        }
        best_label
    }
}

/// Minimum-distance classifier over per-class mean vectors.
///
/// Fully deterministic, which makes it the reference implementation for the
/// trait contract and for persistence round-trip checks.
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid {
    pipeline: Option<PipelineDescriptor>,
    model: Option<CentroidModel>,
    training_error: Option<f64>,
}

impl NearestCentroid {
    /// Create an untrained classifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the pipeline configuration used to compute features, enabling
    /// the compatibility check on load
    pub fn with_pipeline(mut self, descriptor: PipelineDescriptor) -> Self {
        self.pipeline = Some(descriptor);
        self
    }

    fn model(&self) -> Result<&CentroidModel, ClassifierError> {
        self.model.as_ref().ok_or(ClassifierError::NotTrained)
    }

    fn check_dimension(&self, vector: &FeatureVector) -> Result<(), ClassifierError> {
        let expected = self.model()?.dimension;
        if vector.len() != expected {
            return Err(ClassifierError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl Classifier for NearestCentroid {
    fn train(
        &mut self,
        data: &[FeatureVector],
        labels: &[i32],
        calculate_error: bool,
    ) -> Result<(), ClassifierError> {
        let dimension = validate_training_set(data, labels)?;

        let mut sums: BTreeMap<i32, (Vec<f64>, usize)> = BTreeMap::new();
        for (vector, &label) in data.iter().zip(labels) {
            let entry = sums.entry(label).or_insert_with(|| (vec![0.0; dimension], 0));
            for (acc, v) in entry.0.iter_mut().zip(vector.values()) {
                *acc += v;
            }
            entry.1 += 1;
        }

        let centroids = sums
            .into_iter()
            .map(|(label, (mut sum, count))| {
                for v in &mut sum {
                    *v /= count as f64;
                }
                (label, sum)
            })
            .collect::<Vec<_>>();

        let model = CentroidModel {
            dimension,
            centroids,
        };

        if calculate_error {
            let predictions: Vec<i32> =
                data.iter().map(|v| model.decide(v.values())).collect();
            self.training_error = Some(zero_one_loss(&predictions, labels));
        } else {
            self.training_error = None;
        }

        info!(
            examples = data.len(),
            classes = model.centroids.len(),
            error = ?self.training_error,
            "nearest-centroid model trained"
        );
        self.model = Some(model);
        Ok(())
    }

    fn classify(&self, vector: &FeatureVector) -> Result<i32, ClassifierError> {
        self.check_dimension(vector)?;
        Ok(self.model()?.decide(vector.values()))
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
        debug!(path = %path.display(), "nearest-centroid model saved");
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<(), ClassifierError> {
        let envelope: ModelEnvelope<CentroidModel> = load_envelope(path, ALGORITHM)?;
        check_pipeline_compatibility(envelope.pipeline.as_ref(), self.pipeline.as_ref())?;
        envelope.model.validate(envelope.feature_dimension)?;

        // All checks passed; update state in one step
        self.model = Some(envelope.model);
        self.training_error = envelope.training_error;
        if self.pipeline.is_none() {
            self.pipeline = envelope.pipeline;
        }
        debug!(path = %path.display(), "nearest-centroid model loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(rows: &[&[f64]]) -> Vec<FeatureVector> {
        rows.iter().map(|r| FeatureVector::new(r.to_vec())).collect()
    }

    fn separable_set() -> (Vec<FeatureVector>, Vec<i32>) {
        let data = vectors(&[
            &[0.0, 0.1],
            &[0.2, 0.0],
            &[0.1, 0.2],
            &[5.0, 5.1],
            &[5.2, 4.9],
            &[4.8, 5.0],
        ]);
        (data, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn test_untrained_classify_rejected() {
        let clf = NearestCentroid::new();
        let err = clf.classify(&FeatureVector::new(vec![1.0])).unwrap_err();
        assert!(matches!(err, ClassifierError::NotTrained));
        assert!(!clf.is_trained());
    }

    #[test]
    fn test_separable_data_zero_error() {
        let (data, labels) = separable_set();
        let mut clf = NearestCentroid::new();
        clf.train(&data, &labels, true).unwrap();
        assert_eq!(clf.training_error(), Some(0.0));
        assert_eq!(clf.classify(&FeatureVector::new(vec![0.0, 0.0])).unwrap(), 0);
        assert_eq!(clf.classify(&FeatureVector::new(vec![5.0, 5.0])).unwrap(), 1);
    }

    #[test]
    fn test_mismatched_lengths_leave_model_untouched() {
        let (data, labels) = separable_set();
        let mut clf = NearestCentroid::new();
        clf.train(&data, &labels, true).unwrap();

        let bad = vectors(&[&[1.0, 1.0], &[2.0, 2.0], &[3.0, 3.0]]);
        let err = clf.train(&bad, &[0, 1], true).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::LengthMismatch { data: 3, labels: 2 }
        ));

        // Previous model still answers
        assert_eq!(clf.classify(&FeatureVector::new(vec![0.0, 0.0])).unwrap(), 0);
    }

    #[test]
    fn test_untrained_train_mismatch_sets_no_model() {
        let mut clf = NearestCentroid::new();
        let bad = vectors(&[&[1.0], &[2.0], &[3.0]]);
        assert!(clf.train(&bad, &[0, 1], true).is_err());
        assert!(!clf.is_trained());
    }

    #[test]
    fn test_classify_dimension_checked() {
        let (data, labels) = separable_set();
        let mut clf = NearestCentroid::new();
        clf.train(&data, &labels, true).unwrap();

        let err = clf.classify(&FeatureVector::new(vec![1.0])).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_holdout_error_uses_test_set() {
        let (data, labels) = separable_set();
        let mut clf = NearestCentroid::new();
        // Held-out labels deliberately inverted: error must be 1.0
        let test = vectors(&[&[0.0, 0.0], &[5.0, 5.0]]);
        clf.train_with_holdout(&data, &labels, &test, &[1, 0]).unwrap();
        assert_eq!(clf.training_error(), Some(1.0));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("centroid.model");

        let (data, labels) = separable_set();
        let mut clf = NearestCentroid::new();
        clf.train(&data, &labels, true).unwrap();
        clf.save(&path).unwrap();

        let mut restored = NearestCentroid::new();
        restored.load(&path).unwrap();
        assert!(restored.is_trained());
        assert_eq!(restored.training_error(), Some(0.0));

        for probe in &[vec![0.1, 0.1], vec![4.9, 5.1], vec![2.6, 2.6]] {
            let vector = FeatureVector::new(probe.clone());
            assert_eq!(
                clf.classify(&vector).unwrap(),
                restored.classify(&vector).unwrap()
            );
        }
    }

    #[test]
    fn test_save_untrained_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let clf = NearestCentroid::new();
        let err = clf.save(&dir.path().join("x.model")).unwrap_err();
        assert!(matches!(err, ClassifierError::NotTrained));
    }

    #[test]
    fn test_failed_load_keeps_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let (data, labels) = separable_set();
        let mut clf = NearestCentroid::new();
        clf.train(&data, &labels, true).unwrap();

        let err = clf.load(&dir.path().join("missing.model")).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::Persistence(crate::PersistenceError::NotFound { .. })
        ));
        assert!(clf.is_trained());
        assert_eq!(clf.classify(&FeatureVector::new(vec![0.0, 0.0])).unwrap(), 0);
    }

    #[test]
    fn test_empty_centroid_model_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hollow.model");

        // Well-formed envelope whose decoded model breaks the invariants
        let envelope = ModelEnvelope {
            algorithm: ALGORITHM.to_string(),
            feature_dimension: 2,
            pipeline: None,
            training_error: None,
            model: CentroidModel {
                dimension: 2,
                centroids: Vec::new(),
            },
        };
        save_envelope(&path, &envelope).unwrap();

        let mut clf = NearestCentroid::new();
        let err = clf.load(&path).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::Persistence(PersistenceError::Corrupt(_))
        ));
        assert!(!clf.is_trained());
        assert!(matches!(
            clf.classify(&FeatureVector::new(vec![0.0, 0.0])).unwrap_err(),
            ClassifierError::NotTrained
        ));
    }

    #[test]
    fn test_dimension_mismatched_model_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skewed.model");

        let envelope = ModelEnvelope {
            algorithm: ALGORITHM.to_string(),
            feature_dimension: 3,
            pipeline: None,
            training_error: None,
            model: CentroidModel {
                dimension: 2,
                centroids: vec![(0, vec![0.0, 0.0])],
            },
        };
        save_envelope(&path, &envelope).unwrap();

        let mut clf = NearestCentroid::new();
        assert!(matches!(
            clf.load(&path).unwrap_err(),
            ClassifierError::Persistence(PersistenceError::Corrupt(_))
        ));
        assert!(!clf.is_trained());
    }

    #[test]
    fn test_incompatible_pipeline_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("centroid.model");

        let trained_with = PipelineDescriptor {
            extractors: vec!["sum".into(), "mean".into()],
            channels: 1,
            output_len: 2,
        };
        let (data, labels) = separable_set();
        let mut clf = NearestCentroid::new().with_pipeline(trained_with);
        clf.train(&data, &labels, false).unwrap();
        clf.save(&path).unwrap();

        let other = PipelineDescriptor {
            extractors: vec!["mean".into()],
            channels: 1,
            output_len: 1,
        };
        let mut restored = NearestCentroid::new().with_pipeline(other);
        let err = restored.load(&path).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::Persistence(crate::PersistenceError::IncompatiblePipeline { .. })
        ));
        assert!(!restored.is_trained());
    }
}

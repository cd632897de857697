//! Classifier Capability

use crate::ClassifierError;
use feature_pipeline::FeatureVector;
use std::path::Path;

/// A trainable, persistable classifier over feature vectors.
///
/// Implementations move from Untrained to Trained through [`train`] or
/// [`load`]; [`classify`], [`save`], and [`calculate_training_error`] reject
/// the Untrained state with [`ClassifierError::NotTrained`]. A failed train
/// or load never leaves a partially updated model behind.
///
/// [`train`]: Classifier::train
/// [`load`]: Classifier::load
/// [`classify`]: Classifier::classify
/// [`save`]: Classifier::save
/// [`calculate_training_error`]: Classifier::calculate_training_error
pub trait Classifier {
    /// Fit a model to index-aligned data and labels.
    ///
    /// When `calculate_error` is set, the 0/1 loss over the training set is
    /// computed from the freshly fit model and stored.
    fn train(
        &mut self,
        data: &[FeatureVector],
        labels: &[i32],
        calculate_error: bool,
    ) -> Result<(), ClassifierError>;

    /// Fit on the first pair, then evaluate against the held-out second pair
    fn train_with_holdout(
        &mut self,
        data: &[FeatureVector],
        labels: &[i32],
        test_data: &[FeatureVector],
        test_labels: &[i32],
    ) -> Result<(), ClassifierError> {
        self.train(data, labels, false)?;
        self.calculate_training_error(test_data, test_labels)?;
        Ok(())
    }

    /// Infer the class id for one feature vector
    fn classify(&self, vector: &FeatureVector) -> Result<i32, ClassifierError>;

    /// Recompute the stored 0/1 loss against an arbitrary labeled set
    fn calculate_training_error(
        &mut self,
        data: &[FeatureVector],
        labels: &[i32],
    ) -> Result<f64, ClassifierError>;

    /// Misclassification rate from the last train/evaluate, if any
    fn training_error(&self) -> Option<f64>;

    /// Whether a model is available for inference
    fn is_trained(&self) -> bool;

    /// Persist the current model
    fn save(&self, path: &Path) -> Result<(), ClassifierError>;

    /// Restore a previously saved model, replacing any current one.
    /// On failure the classifier keeps its prior state.
    fn load(&mut self, path: &Path) -> Result<(), ClassifierError>;
}

/// Check data/label alignment and vector uniformity; returns the feature
/// dimension on success.
pub(crate) fn validate_training_set(
    data: &[FeatureVector],
    labels: &[i32],
) -> Result<usize, ClassifierError> {
    if data.len() != labels.len() {
        return Err(ClassifierError::LengthMismatch {
            data: data.len(),
            labels: labels.len(),
        });
    }
    if data.is_empty() {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    let dimension = data[0].len();
    for vector in data {
        if vector.len() != dimension {
            return Err(ClassifierError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
    }
    Ok(dimension)
}

/// Fraction of predictions that disagree with the labels
pub(crate) fn zero_one_loss(predictions: &[i32], labels: &[i32]) -> f64 {
    let misses = predictions
        .iter()
        .zip(labels)
        .filter(|(p, l)| p != l)
        .count();
    misses as f64 / labels.len() as f64
}

//! Shared Classifier Handle with Atomic Model Swap

use crate::classifier::Classifier;
use crate::ClassifierError;
use feature_pipeline::FeatureVector;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Thread-safe handle that lets live inference continue while a replacement
/// model is trained in the background.
///
/// `retrain` snapshots the classifier, fits the snapshot without holding any
/// lock, and installs the result with a brief write lock. Concurrent
/// `classify` calls therefore see either the old or the new model in full,
/// never a partially updated one.
#[derive(Debug)]
pub struct SharedClassifier<C> {
    inner: Arc<RwLock<C>>,
}

impl<C> Clone for SharedClassifier<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Classifier + Clone> SharedClassifier<C> {
    /// Wrap a classifier for shared use
    pub fn new(classifier: C) -> Self {
        Self {
            inner: Arc::new(RwLock::new(classifier)),
        }
    }

    /// Infer a class id under a read lock
    pub fn classify(&self, vector: &FeatureVector) -> Result<i32, ClassifierError> {
        let guard = self.inner.read().map_err(|_| ClassifierError::LockPoisoned)?;
        guard.classify(vector)
    }

    /// Whether the current model is trained
    pub fn is_trained(&self) -> Result<bool, ClassifierError> {
        let guard = self.inner.read().map_err(|_| ClassifierError::LockPoisoned)?;
        Ok(guard.is_trained())
    }

    /// Misclassification rate of the current model, if computed
    pub fn training_error(&self) -> Result<Option<f64>, ClassifierError> {
        let guard = self.inner.read().map_err(|_| ClassifierError::LockPoisoned)?;
        Ok(guard.training_error())
    }

    /// Train a replacement model off-lock, then swap it in atomically.
    ///
    /// On any training failure the handle keeps serving the previous model.
    pub fn retrain(
        &self,
        data: &[FeatureVector],
        labels: &[i32],
        calculate_error: bool,
    ) -> Result<(), ClassifierError> {
        let mut candidate = {
            let guard = self.inner.read().map_err(|_| ClassifierError::LockPoisoned)?;
            guard.clone()
        };
        candidate.train(data, labels, calculate_error)?;

        let mut guard = self.inner.write().map_err(|_| ClassifierError::LockPoisoned)?;
        *guard = candidate;
        info!(examples = data.len(), "retrained model swapped in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NearestCentroid;

    fn separable_set() -> (Vec<FeatureVector>, Vec<i32>) {
        (
            vec![
                FeatureVector::new(vec![0.0]),
                FeatureVector::new(vec![0.5]),
                FeatureVector::new(vec![10.0]),
                FeatureVector::new(vec![10.5]),
            ],
            vec![0, 0, 1, 1],
        )
    }

    #[test]
    fn test_retrain_swaps_model() {
        let shared = SharedClassifier::new(NearestCentroid::new());
        assert!(!shared.is_trained().unwrap());

        let (data, labels) = separable_set();
        shared.retrain(&data, &labels, true).unwrap();
        assert!(shared.is_trained().unwrap());
        assert_eq!(shared.classify(&FeatureVector::new(vec![0.2])).unwrap(), 0);
        assert_eq!(shared.classify(&FeatureVector::new(vec![9.8])).unwrap(), 1);
    }

    #[test]
    fn test_failed_retrain_keeps_old_model() {
        let shared = SharedClassifier::new(NearestCentroid::new());
        let (data, labels) = separable_set();
        shared.retrain(&data, &labels, true).unwrap();

        // Misaligned retrain must not disturb the serving model
        assert!(shared.retrain(&data, &[0], true).is_err());
        assert!(shared.is_trained().unwrap());
        assert_eq!(shared.classify(&FeatureVector::new(vec![0.2])).unwrap(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedClassifier::new(NearestCentroid::new());
        let observer = shared.clone();

        let (data, labels) = separable_set();
        shared.retrain(&data, &labels, false).unwrap();
        assert!(observer.is_trained().unwrap());
    }

    #[test]
    fn test_concurrent_inference_during_retrain() {
        let shared = SharedClassifier::new(NearestCentroid::new());
        let (data, labels) = separable_set();
        shared.retrain(&data, &labels, false).unwrap();

        let trainer = shared.clone();
        let (train_data, train_labels) = separable_set();
        let handle = std::thread::spawn(move || {
            for _ in 0..50 {
                trainer.retrain(&train_data, &train_labels, true).unwrap();
            }
        });

        let probe = FeatureVector::new(vec![0.1]);
        for _ in 0..200 {
            // Always a complete model: either pre- or post-swap
            assert_eq!(shared.classify(&probe).unwrap(), 0);
        }
        handle.join().unwrap();
    }
}

//! Trainable Classifier Abstraction
//!
//! Defines the train/classify/persist contract shared by every learning
//! strategy, plus two concrete implementations: a deterministic
//! nearest-centroid reference and a bagged-stump random forest.

mod centroid;
mod classifier;
mod forest;
mod persist;
mod shared;

pub use centroid::NearestCentroid;
pub use classifier::Classifier;
pub use forest::{ForestConfig, RandomForest};
pub use shared::SharedClassifier;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by classifiers
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Classify/save/evaluate requested before any model was fit or loaded
    #[error("classifier has no trained model")]
    NotTrained,

    /// Feature vector length disagrees with the model's training dimension
    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Training data and labels are not index-aligned
    #[error("{data} feature vectors but {labels} labels")]
    LengthMismatch { data: usize, labels: usize },

    /// Training requires at least one example
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// A hyperparameter was explicitly set to a meaningless value
    #[error("invalid hyperparameter {name}: {value}")]
    InvalidHyperparameter { name: &'static str, value: f64 },

    /// A shared classifier lock was poisoned by a panicking writer
    #[error("classifier lock poisoned")]
    LockPoisoned,

    /// Model save/load failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors raised while persisting or restoring a model
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No model file at the given path
    #[error("model file not found: {path}")]
    NotFound { path: PathBuf },

    /// File exists but does not decode into the expected model
    #[error("model file is corrupt: {0}")]
    Corrupt(String),

    /// Model state could not be serialized
    #[error("model serialization failed: {0}")]
    Encode(String),

    /// Saved model was trained against a differently configured pipeline
    #[error("model pipeline {saved:?} does not match configured pipeline {current:?}")]
    IncompatiblePipeline { saved: Vec<String>, current: Vec<String> },

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

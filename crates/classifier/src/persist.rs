//! Model Persistence
//!
//! Saved models are a postcard-encoded envelope carrying the model state,
//! the feature dimension, and the pipeline descriptor used at training time.

use crate::PersistenceError;
use feature_pipeline::PipelineDescriptor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

/// On-disk wrapper around an algorithm-specific model blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ModelEnvelope<M> {
    /// Algorithm tag, checked on load
    pub algorithm: String,
    /// Feature vector length the model was trained with
    pub feature_dimension: usize,
    /// Pipeline configuration at training time, if one was bound
    pub pipeline: Option<PipelineDescriptor>,
    /// Stored misclassification rate
    pub training_error: Option<f64>,
    /// Algorithm-specific model state
    pub model: M,
}

/// Write an envelope to disk. The file handle is scope-bound, so it is
/// closed on every exit path.
pub(crate) fn save_envelope<M: Serialize>(
    path: &Path,
    envelope: &ModelEnvelope<M>,
) -> Result<(), PersistenceError> {
    let bytes =
        postcard::to_allocvec(envelope).map_err(|e| PersistenceError::Encode(e.to_string()))?;
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Read and decode an envelope, verifying the algorithm tag.
pub(crate) fn load_envelope<M: DeserializeOwned>(
    path: &Path,
    algorithm: &str,
) -> Result<ModelEnvelope<M>, PersistenceError> {
    let mut bytes = Vec::new();
    match File::open(path) {
        Ok(mut file) => {
            file.read_to_end(&mut bytes)?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PersistenceError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    }

    let envelope: ModelEnvelope<M> =
        postcard::from_bytes(&bytes).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
    if envelope.algorithm != algorithm {
        return Err(PersistenceError::Corrupt(format!(
            "model algorithm '{}' does not match '{}'",
            envelope.algorithm, algorithm
        )));
    }
    Ok(envelope)
}

/// Reject a saved model whose pipeline disagrees with the configured one
pub(crate) fn check_pipeline_compatibility(
    saved: Option<&PipelineDescriptor>,
    current: Option<&PipelineDescriptor>,
) -> Result<(), PersistenceError> {
    if let (Some(saved), Some(current)) = (saved, current) {
        if saved != current {
            return Err(PersistenceError::IncompatiblePipeline {
                saved: saved.extractors.clone(),
                current: current.extractors.clone(),
            });
        }
    }
    Ok(())
}

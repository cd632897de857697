//! Feature Vector Assembly

use crate::{FeatureExtractor, PipelineError};
use sample_window::Window;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Feature vector produced by a pipeline for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap raw feature values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no features
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Feature values in pipeline order
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Serializable description of a pipeline configuration.
///
/// Persisted alongside trained models so that a load can reject a model
/// whose features were computed by a differently configured pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDescriptor {
    /// Extractor names in declared order
    pub extractors: Vec<String>,
    /// Channel count the pipeline was configured for
    pub channels: usize,
    /// Total feature vector length
    pub output_len: usize,
}

/// Ordered list of extractors applied to every window.
///
/// Output is the concatenation of each extractor's values in declared order,
/// so the vector length is fixed for a given configuration. The same pipeline
/// instance must serve both training and inference; the descriptor exists to
/// catch accidental divergence at model-load time.
pub struct FeaturePipeline {
    extractors: Vec<Box<dyn FeatureExtractor>>,
    channels: usize,
    output_len: usize,
}

impl core::fmt::Debug for FeaturePipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeaturePipeline")
            .field(
                "extractors",
                &self.extractors.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("channels", &self.channels)
            .field("output_len", &self.output_len)
            .finish()
    }
}

impl FeaturePipeline {
    /// Create a pipeline for a `channels`-wide stream
    pub fn new(
        extractors: Vec<Box<dyn FeatureExtractor>>,
        channels: usize,
    ) -> Result<Self, PipelineError> {
        if extractors.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }
        let output_len = extractors.iter().map(|e| e.arity(channels)).sum();
        debug!(
            extractors = extractors.len(),
            channels, output_len, "feature pipeline configured"
        );
        Ok(Self {
            extractors,
            channels,
            output_len,
        })
    }

    /// Run every extractor over one window and concatenate the results
    pub fn extract(&self, window: &Window) -> FeatureVector {
        let mut values = Vec::with_capacity(self.output_len);
        for extractor in &self.extractors {
            values.extend(extractor.calculate(window));
        }
        FeatureVector::new(values)
    }

    /// Channel count the pipeline was configured for
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Feature vector length for every window this pipeline processes
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Descriptor for model-compatibility checks
    pub fn descriptor(&self) -> PipelineDescriptor {
        PipelineDescriptor {
            extractors: self.extractors.iter().map(|e| e.name().to_string()).collect(),
            channels: self.channels,
            output_len: self.output_len,
        }
    }
}

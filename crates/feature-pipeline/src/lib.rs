//! Feature Extraction Pipeline
//!
//! Reduces each completed sample window to a fixed-length feature vector by
//! running an ordered list of pluggable extractors and concatenating their
//! outputs.

mod pipeline;
mod spectral;
mod time_domain;

pub use pipeline::{FeaturePipeline, FeatureVector, PipelineDescriptor};
pub use spectral::{FrequencyBands, SpectralPower};
pub use time_domain::{Max, Mean, Min, RootMeanSquare, StandardDeviation, Sum};

use sample_window::Window;
use thiserror::Error;

/// Errors raised when assembling a pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A pipeline with no extractors can never produce a feature vector
    #[error("feature pipeline requires at least one extractor")]
    EmptyPipeline,
}

/// A named, stateless transform from one window to a fixed number of values.
///
/// `calculate` must be pure: the same window always yields the same output,
/// and the window is never mutated. `arity` declares how many values the
/// extractor emits for a given channel count, so total feature-vector length
/// is known before any data flows.
pub trait FeatureExtractor: Send + Sync {
    /// Stable name, recorded in persisted model metadata
    fn name(&self) -> &'static str;

    /// Number of output values for a window with `channels` channels
    fn arity(&self, channels: usize) -> usize;

    /// Compute this extractor's values for one window
    fn calculate(&self, window: &Window) -> Vec<f64>;
}

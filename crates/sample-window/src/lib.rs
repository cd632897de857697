//! Sliding-Window Segmentation
//!
//! Buffers an unbounded stream of multi-channel sensor samples and emits
//! fixed-size, overlapping windows with bounded memory.

mod sliding;

pub use sliding::SlidingWindow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the windowing layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    /// Window size must allow at least one sample
    #[error("window size must be at least 1")]
    InvalidWindowSize,

    /// Overlap must leave a positive step between windows
    #[error("overlap {overlap} must be smaller than window size {window_size}")]
    InvalidOverlap { overlap: usize, window_size: usize },

    /// Sample width disagrees with the established channel count
    #[error("sample has {actual} channels, stream is {expected}-channel")]
    ChannelMismatch { expected: usize, actual: usize },
}

/// One tick of sensor data: a fixed-width vector with one value per channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    channels: Vec<f64>,
}

impl Sample {
    /// Create a sample from raw channel values
    pub fn new(channels: Vec<f64>) -> Self {
        Self { channels }
    }

    /// Number of channels in this sample
    pub fn width(&self) -> usize {
        self.channels.len()
    }

    /// Channel values in declared order
    pub fn values(&self) -> &[f64] {
        &self.channels
    }
}

impl From<Vec<f64>> for Sample {
    fn from(channels: Vec<f64>) -> Self {
        Self::new(channels)
    }
}

/// A contiguous run of exactly `window_size` samples in arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    samples: Vec<Sample>,
}

impl Window {
    pub(crate) fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Windows produced by the buffer are never empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Channel count shared by every sample in the window
    pub fn channels(&self) -> usize {
        self.samples.first().map_or(0, Sample::width)
    }

    /// Samples in arrival order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Extract one channel as a time series across the window.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.channels()`.
    pub fn channel(&self, index: usize) -> Vec<f64> {
        self.samples.iter().map(|s| s.values()[index]).collect()
    }
}

//! Virtual Sensor Orchestration
//!
//! Wires a push-based sample feed through the sliding-window buffer and the
//! feature pipeline, then either collects feature vectors for offline
//! training or routes them to a classifier for live inference.

mod sensor;

pub use sensor::{SensorConfig, SensorMode, SensorOutput, VirtualSensor};

use classifier::ClassifierError;
use sample_window::WindowError;
use thiserror::Error;

/// Errors surfaced by the virtual sensor
#[derive(Debug, Error)]
pub enum SensorError {
    /// Rejected at construction: invalid window geometry or an empty
    /// extractor list
    #[error("invalid sensor configuration: {0}")]
    Configuration(String),

    /// Channel-width violation on the sample path
    #[error(transparent)]
    Window(#[from] WindowError),

    /// Classification or training failure
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

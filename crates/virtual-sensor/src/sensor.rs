//! Virtual Sensor Implementation

use crate::SensorError;
use classifier::Classifier;
use feature_pipeline::{FeatureExtractor, FeaturePipeline, FeatureVector, PipelineDescriptor};
use sample_window::{Sample, SlidingWindow};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Construction-time configuration for a virtual sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Samples per window
    pub window_size: usize,
    /// Samples shared between consecutive windows
    pub overlap: usize,
    /// Channels per sample
    pub channels: usize,
}

/// Operating mode of the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorMode {
    /// Accumulate feature vectors for offline training
    Collect,
    /// Route feature vectors to the classifier and emit labels
    Classify,
}

/// Downstream output produced for one completed window
#[derive(Debug, Clone, PartialEq)]
pub enum SensorOutput {
    /// Feature vector captured during the collection phase
    Features(FeatureVector),
    /// Class id inferred during live classification
    Label(i32),
}

/// Orchestrates SampleSource → SlidingWindow → FeaturePipeline → Classifier.
///
/// Samples are processed synchronously on the arrival path: a push that
/// completes a window runs feature extraction (and, in classify mode,
/// inference) before returning, so window completion and dispatch form one
/// atomic unit per sensor instance.
pub struct VirtualSensor<C> {
    window: SlidingWindow,
    pipeline: FeaturePipeline,
    classifier: C,
    mode: SensorMode,
    collected: Vec<FeatureVector>,
}

impl<C: Classifier> VirtualSensor<C> {
    /// Validate the configuration and assemble the sensor.
    ///
    /// Fails if the window geometry is invalid or no extractors are given.
    pub fn new(
        config: SensorConfig,
        extractors: Vec<Box<dyn FeatureExtractor>>,
        classifier: C,
    ) -> Result<Self, SensorError> {
        let window =
            SlidingWindow::with_channels(config.window_size, config.overlap, config.channels)
                .map_err(|e| SensorError::Configuration(e.to_string()))?;
        let pipeline = FeaturePipeline::new(extractors, config.channels)
            .map_err(|e| SensorError::Configuration(e.to_string()))?;

        info!(
            window_size = config.window_size,
            overlap = config.overlap,
            channels = config.channels,
            features = pipeline.output_len(),
            "virtual sensor configured"
        );
        Ok(Self {
            window,
            pipeline,
            classifier,
            mode: SensorMode::Collect,
            collected: Vec::new(),
        })
    }

    /// Switch between collection and classification
    pub fn set_mode(&mut self, mode: SensorMode) {
        debug!(?mode, "sensor mode changed");
        self.mode = mode;
    }

    /// Current operating mode
    pub fn mode(&self) -> SensorMode {
        self.mode
    }

    /// Descriptor of the configured feature pipeline, for binding to models
    pub fn pipeline_descriptor(&self) -> PipelineDescriptor {
        self.pipeline.descriptor()
    }

    /// Feed one sample; returns an output when a window completes.
    pub fn push(&mut self, sample: Sample) -> Result<Option<SensorOutput>, SensorError> {
        let Some(window) = self.window.push(sample)? else {
            return Ok(None);
        };

        let vector = self.pipeline.extract(&window);
        debug!(features = vector.len(), "window reduced to feature vector");

        match self.mode {
            SensorMode::Collect => {
                self.collected.push(vector.clone());
                Ok(Some(SensorOutput::Features(vector)))
            }
            SensorMode::Classify => {
                let label = self.classifier.classify(&vector)?;
                Ok(Some(SensorOutput::Label(label)))
            }
        }
    }

    /// Number of feature vectors accumulated in collect mode
    pub fn collected_len(&self) -> usize {
        self.collected.len()
    }

    /// Drain the vectors accumulated in collect mode
    pub fn take_collected(&mut self) -> Vec<FeatureVector> {
        std::mem::take(&mut self.collected)
    }

    /// Train the classifier on the collected vectors with caller-supplied
    /// labels, draining the training buffer on success.
    pub fn train_collected(&mut self, labels: &[i32]) -> Result<(), SensorError> {
        self.classifier.train(&self.collected, labels, true)?;
        self.collected.clear();
        Ok(())
    }

    /// The classifier owned by this sensor
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Mutable access, e.g. for loading a persisted model
    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }

    /// Consume a push-based sample feed and forward outputs downstream.
    ///
    /// Runs until the sample channel closes; stopping ingestion is simply
    /// dropping the sender. Outputs are forwarded without blocking the
    /// arrival path.
    pub async fn run(
        &mut self,
        mut samples: mpsc::Receiver<Sample>,
        outputs: mpsc::Sender<SensorOutput>,
    ) -> Result<(), SensorError> {
        info!("virtual sensor ingestion started");
        while let Some(sample) = samples.recv().await {
            if let Some(output) = self.push(sample)? {
                let _ = outputs.try_send(output);
            }
        }
        info!("virtual sensor ingestion stopped");
        Ok(())
    }
}

//! Sliding Window Buffer Implementation

use crate::{Sample, Window, WindowError};
use std::collections::VecDeque;

/// Push-driven buffer that segments a sample stream into overlapping windows.
///
/// A window of `window_size` samples is emitted once the buffer first fills,
/// then again every `step = window_size - overlap` samples. Only the most
/// recent `window_size` samples are retained, so memory stays bounded no
/// matter how long the stream runs.
#[derive(Debug)]
pub struct SlidingWindow {
    /// Samples per emitted window
    window_size: usize,
    /// Samples shared between consecutive windows
    overlap: usize,
    /// New samples required between emissions
    step: usize,
    /// Channel count, fixed by configuration or by the first sample
    channels: Option<usize>,
    /// Retained tail of the stream (at most `window_size` samples)
    buffer: VecDeque<Sample>,
    /// Samples still needed before the next emission
    pending: usize,
    /// Total windows emitted (for diagnostics)
    emitted: u64,
}

impl SlidingWindow {
    /// Create a buffer; the channel count is locked in by the first sample.
    pub fn new(window_size: usize, overlap: usize) -> Result<Self, WindowError> {
        if window_size == 0 {
            return Err(WindowError::InvalidWindowSize);
        }
        if overlap >= window_size {
            return Err(WindowError::InvalidOverlap {
                overlap,
                window_size,
            });
        }
        Ok(Self {
            window_size,
            overlap,
            step: window_size - overlap,
            channels: None,
            buffer: VecDeque::with_capacity(window_size),
            pending: window_size,
            emitted: 0,
        })
    }

    /// Create a buffer with a known channel count, enforced from the first push.
    pub fn with_channels(
        window_size: usize,
        overlap: usize,
        channels: usize,
    ) -> Result<Self, WindowError> {
        let mut buffer = Self::new(window_size, overlap)?;
        buffer.channels = Some(channels);
        Ok(buffer)
    }

    /// Append one sample, returning a completed window when one becomes due.
    pub fn push(&mut self, sample: Sample) -> Result<Option<Window>, WindowError> {
        let expected = *self.channels.get_or_insert(sample.width());
        if sample.width() != expected {
            return Err(WindowError::ChannelMismatch {
                expected,
                actual: sample.width(),
            });
        }

        if self.buffer.len() == self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(sample);

        self.pending -= 1;
        if self.pending > 0 {
            return Ok(None);
        }
        self.pending = self.step;
        self.emitted += 1;

        Ok(Some(Window::new(self.buffer.iter().cloned().collect())))
    }

    /// Samples per emitted window
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Samples shared between consecutive windows
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// New samples required between emissions
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of samples currently retained
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no samples have been retained yet
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total windows emitted since construction
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

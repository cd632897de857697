//! Time-Domain Feature Extractors
//!
//! Each extractor emits one value per channel, computed over the window's
//! samples for that channel.

use crate::FeatureExtractor;
use sample_window::Window;

fn per_channel(window: &Window, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..window.channels())
        .map(|c| f(&window.channel(c)))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Per-channel sum of the window
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl FeatureExtractor for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn arity(&self, channels: usize) -> usize {
        channels
    }

    fn calculate(&self, window: &Window) -> Vec<f64> {
        per_channel(window, |v| v.iter().sum())
    }
}

/// Per-channel arithmetic mean
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl FeatureExtractor for Mean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn arity(&self, channels: usize) -> usize {
        channels
    }

    fn calculate(&self, window: &Window) -> Vec<f64> {
        per_channel(window, mean)
    }
}

/// Per-channel minimum
#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

impl FeatureExtractor for Min {
    fn name(&self) -> &'static str {
        "min"
    }

    fn arity(&self, channels: usize) -> usize {
        channels
    }

    fn calculate(&self, window: &Window) -> Vec<f64> {
        per_channel(window, |v| v.iter().cloned().fold(f64::MAX, f64::min))
    }
}

/// Per-channel maximum
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl FeatureExtractor for Max {
    fn name(&self) -> &'static str {
        "max"
    }

    fn arity(&self, channels: usize) -> usize {
        channels
    }

    fn calculate(&self, window: &Window) -> Vec<f64> {
        per_channel(window, |v| v.iter().cloned().fold(f64::MIN, f64::max))
    }
}

/// Per-channel population standard deviation
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDeviation;

impl FeatureExtractor for StandardDeviation {
    fn name(&self) -> &'static str {
        "std_dev"
    }

    fn arity(&self, channels: usize) -> usize {
        channels
    }

    fn calculate(&self, window: &Window) -> Vec<f64> {
        per_channel(window, |values| {
            let m = mean(values);
            let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>()
                / values.len().max(1) as f64;
            variance.sqrt()
        })
    }
}

/// Per-channel root mean square
#[derive(Debug, Clone, Copy, Default)]
pub struct RootMeanSquare;

impl FeatureExtractor for RootMeanSquare {
    fn name(&self) -> &'static str {
        "rms"
    }

    fn arity(&self, channels: usize) -> usize {
        channels
    }

    fn calculate(&self, window: &Window) -> Vec<f64> {
        per_channel(window, |values| {
            mean(&values.iter().map(|v| v * v).collect::<Vec<_>>()).sqrt()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_window::{Sample, SlidingWindow};

    fn window_of(rows: &[&[f64]]) -> Window {
        let mut buffer = SlidingWindow::new(rows.len(), 0).unwrap();
        let mut emitted = None;
        for row in rows {
            emitted = buffer.push(Sample::new(row.to_vec())).unwrap();
        }
        emitted.unwrap()
    }

    #[test]
    fn test_sum_per_channel() {
        let window = window_of(&[&[1.0, 10.0], &[2.0, 20.0], &[3.0, 30.0]]);
        assert_eq!(Sum.calculate(&window), vec![6.0, 60.0]);
        assert_eq!(Sum.arity(2), 2);
    }

    #[test]
    fn test_mean_and_extrema() {
        let window = window_of(&[&[2.0], &[4.0], &[6.0]]);
        assert_eq!(Mean.calculate(&window), vec![4.0]);
        assert_eq!(Min.calculate(&window), vec![2.0]);
        assert_eq!(Max.calculate(&window), vec![6.0]);
    }

    #[test]
    fn test_std_dev() {
        let window = window_of(&[&[2.0], &[4.0], &[4.0], &[4.0], &[5.0], &[5.0], &[7.0], &[9.0]]);
        let std = StandardDeviation.calculate(&window)[0];
        assert!((std - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_rms_constant_signal() {
        let window = window_of(&[&[3.0], &[3.0], &[3.0]]);
        assert!((RootMeanSquare.calculate(&window)[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_is_pure() {
        let window = window_of(&[&[1.0], &[2.0]]);
        assert_eq!(Sum.calculate(&window), Sum.calculate(&window));
    }
}

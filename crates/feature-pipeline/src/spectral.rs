//! FFT-based Spectral Feature Extraction

use crate::FeatureExtractor;
use rustfft::{num_complex::Complex, FftPlanner};
use sample_window::Window;

/// Frequency band boundaries (Hz)
#[derive(Debug, Clone, Copy)]
pub struct FrequencyBands {
    /// Low frequency band
    pub low: (f64, f64),
    /// Medium frequency band
    pub medium: (f64, f64),
    /// High frequency band
    pub high: (f64, f64),
}

impl Default for FrequencyBands {
    fn default() -> Self {
        Self {
            low: (0.0, 2.0),
            medium: (2.0, 5.0),
            high: (5.0, 10.0),
        }
    }
}

/// Per-channel band power extractor.
///
/// Emits three values per channel: the summed power spectral density in the
/// low, medium, and high bands. The window is Hamming-weighted before the
/// transform to reduce spectral leakage.
#[derive(Debug, Clone, Copy)]
pub struct SpectralPower {
    sample_rate: f64,
    bands: FrequencyBands,
}

impl SpectralPower {
    /// Create an extractor for a stream sampled at `sample_rate` Hz
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            bands: FrequencyBands::default(),
        }
    }

    /// Override the default band boundaries
    pub fn with_bands(sample_rate: f64, bands: FrequencyBands) -> Self {
        Self { sample_rate, bands }
    }

    fn apply_hamming_window(signal: &mut [f64]) {
        let n = signal.len();
        if n < 2 {
            return;
        }
        for (i, v) in signal.iter_mut().enumerate() {
            let w = 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos();
            *v *= w;
        }
    }

    fn band_powers(&self, signal: &[f64]) -> [f64; 3] {
        if signal.is_empty() {
            return [0.0; 3];
        }

        let n = signal.len();
        let mut windowed = signal.to_vec();
        Self::apply_hamming_window(&mut windowed);

        let mut buffer: Vec<Complex<f64>> =
            windowed.iter().map(|&v| Complex::new(v, 0.0)).collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        // Positive frequencies only, magnitude squared, normalized
        let freq_resolution = self.sample_rate / n as f64;
        let mut powers = [0.0; 3];
        for (i, c) in buffer.iter().take(n / 2).enumerate() {
            let power = c.norm_sqr() / n as f64;
            let freq = i as f64 * freq_resolution;
            if freq >= self.bands.low.0 && freq < self.bands.low.1 {
                powers[0] += power;
            } else if freq >= self.bands.medium.0 && freq < self.bands.medium.1 {
                powers[1] += power;
            } else if freq >= self.bands.high.0 && freq < self.bands.high.1 {
                powers[2] += power;
            }
        }
        powers
    }
}

impl FeatureExtractor for SpectralPower {
    fn name(&self) -> &'static str {
        "spectral_power"
    }

    fn arity(&self, channels: usize) -> usize {
        3 * channels
    }

    fn calculate(&self, window: &Window) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.arity(window.channels()));
        for c in 0..window.channels() {
            values.extend(self.band_powers(&window.channel(c)));
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_window::{Sample, SlidingWindow};

    fn sine_window(freq_hz: f64, sample_rate: f64, len: usize) -> Window {
        let mut buffer = SlidingWindow::new(len, 0).unwrap();
        let mut emitted = None;
        for i in 0..len {
            let v = (2.0 * std::f64::consts::PI * freq_hz * i as f64 / sample_rate).sin();
            emitted = buffer.push(Sample::new(vec![v])).unwrap();
        }
        emitted.unwrap()
    }

    #[test]
    fn test_low_band_dominates_for_slow_sine() {
        let extractor = SpectralPower::new(100.0);
        let window = sine_window(1.0, 100.0, 256);
        let values = extractor.calculate(&window);
        assert_eq!(values.len(), 3);
        assert!(values[0] > values[2]);
    }

    #[test]
    fn test_arity_per_channel() {
        let extractor = SpectralPower::new(50.0);
        assert_eq!(extractor.arity(1), 3);
        assert_eq!(extractor.arity(4), 12);
    }
}

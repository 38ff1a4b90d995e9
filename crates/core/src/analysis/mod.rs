use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Features extracted from one window of the output signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSnapshot {
    pub rms: f32,
    /// Normalised [0, 1] spectral centroid where 1.0 corresponds to the
    /// Nyquist frequency.
    pub spectral_centroid: f32,
    /// Mean magnitude per equal-width band, normalised so the loudest band
    /// is 1.0.
    pub bands: Vec<f32>,
}

/// FFT-backed analyser. Plans are cached and rebuilt only when the window
/// size changes.
pub struct SignalAnalyzer {
    sample_rate: u32,
    band_count: usize,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl SignalAnalyzer {
    pub fn new(sample_rate: u32, band_count: usize) -> Self {
        Self {
            sample_rate,
            band_count: band_count.max(1),
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Analyses `samples`. Windows shorter than two samples read as silence.
    pub fn analyse(&mut self, samples: &[f32]) -> Result<SpectrumSnapshot> {
        if samples.len() < 2 {
            return Ok(SpectrumSnapshot {
                bands: vec![0.0; self.band_count],
                ..Default::default()
            });
        }

        let band_count = self.band_count;
        let bin_hz = self.sample_rate as f32 / samples.len() as f32;
        let nyquist = (self.sample_rate as f32).max(1.0) * 0.5;
        let magnitudes = self.magnitudes(samples)?;

        let mut magnitude_sum = 0.0;
        let mut weighted_sum = 0.0;
        for (i, magnitude) in magnitudes.iter().enumerate() {
            magnitude_sum += magnitude;
            weighted_sum += magnitude * (i as f32 * bin_hz);
        }
        let centroid_hz = if magnitude_sum <= f32::EPSILON {
            0.0
        } else {
            weighted_sum / magnitude_sum
        };

        Ok(SpectrumSnapshot {
            rms: compute_rms(samples),
            spectral_centroid: (centroid_hz / nyquist).clamp(0.0, 1.0),
            bands: band_energies(&magnitudes, band_count),
        })
    }

    fn magnitudes(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let len = samples.len();
        let fft = self.prepare_fft(len);

        for (index, value) in samples.iter().enumerate() {
            fft.input[index] = *value * hann_value(index, len);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        Ok(fft.spectrum.iter().map(|bin| bin.norm()).collect())
    }

    fn prepare_fft(&mut self, size: usize) -> &mut FftResources {
        if self.fft.as_ref().is_some_and(|fft| fft.size != size) {
            self.fft = None;
        }

        let planner = &mut self.fft_planner;
        self.fft.get_or_insert_with(|| {
            let plan = planner.plan_fft_forward(size);
            FftResources {
                size,
                scratch: plan.make_scratch_vec(),
                spectrum: plan.make_output_vec(),
                input: plan.make_input_vec(),
                plan,
            }
        })
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for SignalAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalAnalyzer")
            .field("sample_rate", &self.sample_rate)
            .field("band_count", &self.band_count)
            .field("fft_size", &self.fft.as_ref().map(|fft| fft.size))
            .finish()
    }
}

fn band_energies(magnitudes: &[f32], band_count: usize) -> Vec<f32> {
    let per_band = magnitudes.len().div_ceil(band_count).max(1);
    let mut bands: Vec<f32> = magnitudes
        .chunks(per_band)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect();
    bands.resize(band_count, 0.0);

    let peak = bands.iter().copied().fold(0.0f32, f32::max);
    if peak > f32::EPSILON {
        for band in &mut bands {
            *band /= peak;
        }
    }
    bands
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frequency: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn silence_has_no_features() {
        let mut analyzer = SignalAnalyzer::new(48_000, 4);
        let snapshot = analyzer.analyse(&[0.0; 1024]).unwrap();

        assert_eq!(snapshot.rms, 0.0);
        assert_eq!(snapshot.spectral_centroid, 0.0);
        assert_eq!(snapshot.bands, vec![0.0; 4]);
    }

    #[test]
    fn short_windows_read_as_silence() {
        let mut analyzer = SignalAnalyzer::new(48_000, 3);
        let snapshot = analyzer.analyse(&[1.0]).unwrap();
        assert_eq!(snapshot.bands.len(), 3);
        assert_eq!(snapshot.rms, 0.0);
    }

    #[test]
    fn low_tones_land_in_the_first_band() {
        let mut analyzer = SignalAnalyzer::new(8_000, 4);
        let snapshot = analyzer.analyse(&tone(200.0, 8_000, 512)).unwrap();

        assert!((snapshot.rms - 0.707).abs() < 0.02);
        assert_eq!(snapshot.bands[0], 1.0);
        assert!(snapshot.bands[3] < 0.1);
        assert!(snapshot.spectral_centroid < 0.25);
    }

    #[test]
    fn higher_tones_raise_the_centroid() {
        let mut analyzer = SignalAnalyzer::new(8_000, 4);
        let low = analyzer.analyse(&tone(200.0, 8_000, 512)).unwrap();
        let high = analyzer.analyse(&tone(3_500.0, 8_000, 256)).unwrap();

        assert!(high.spectral_centroid > low.spectral_centroid);
        assert_eq!(high.bands[3], 1.0);
    }
}

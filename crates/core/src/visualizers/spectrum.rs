use std::sync::{Mutex, MutexGuard};

use crate::{BusTap, Result, SandboxError, SignalAnalyzer, SurfaceView, VisualizerSurface, Widget};

/// Band meters plus loudness and brightness readouts.
#[derive(Debug)]
pub struct Spectrum {
    tap: BusTap,
    window: usize,
    analyzer: Mutex<SignalAnalyzer>,
}

impl Spectrum {
    pub fn new(tap: BusTap, window: usize, bands: usize) -> Self {
        let analyzer = SignalAnalyzer::new(tap.sample_rate(), bands);
        Self {
            tap,
            window: window.max(2),
            analyzer: Mutex::new(analyzer),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SignalAnalyzer>> {
        self.analyzer
            .lock()
            .map_err(|_| SandboxError::msg("spectrum analyser has been poisoned"))
    }
}

impl VisualizerSurface for Spectrum {
    fn render(&self) -> Result<SurfaceView> {
        let samples = self.tap.recent(self.window)?;
        let snapshot = self.lock()?.analyse(&samples)?;

        let mut view = SurfaceView::new("Spectrum");
        view.push(Widget::Meter {
            label: "rms".to_string(),
            value: snapshot.rms,
        });
        view.push(Widget::Meter {
            label: "centroid".to_string(),
            value: snapshot.spectral_centroid,
        });
        for (index, value) in snapshot.bands.into_iter().enumerate() {
            view.push(Widget::Meter {
                label: format!("band {}", index + 1),
                value,
            });
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AudioBus, AudioConfig};

    #[test]
    fn reports_bands_for_the_bus_signal() {
        let bus = AudioBus::new(&AudioConfig {
            sample_rate: 8_000,
            ..AudioConfig::default()
        });
        let spectrum = Spectrum::new(bus.tap(), 256, 4);

        let silent = spectrum.render().unwrap();
        assert_eq!(silent.meter("rms"), Some(0.0));
        assert_eq!(silent.meter("band 4"), Some(0.0));

        let id = bus.connect().unwrap();
        let square: Vec<f32> = (0..256)
            .map(|i| if (i / 8) % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        bus.write(id, &square).unwrap();

        let view = spectrum.render().unwrap();
        assert!(view.meter("rms").unwrap() > 0.4);
        assert_eq!(view.meter("band 1"), Some(1.0));
        assert_eq!(view.widgets.len(), 6);
    }
}

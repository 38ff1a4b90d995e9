//! Built-in visualizers. Each observes the output bus through its own tap.

mod spectrum;
mod waveform;

use crate::{BusTap, Registry, Result, SandboxConfig, VisualizerDescriptor, VisualizerSurface};

pub use spectrum::Spectrum;
pub use waveform::Waveform;

/// Registers the stock visualizers in display order.
pub fn defaults(config: &SandboxConfig, tap: BusTap) -> Result<Registry<dyn VisualizerSurface>> {
    Registry::new()
        .with(VisualizerDescriptor::visualizer(
            "Waveform",
            Waveform::new(tap.clone(), config.visuals.waveform_points),
        ))?
        .with(VisualizerDescriptor::visualizer(
            "Spectrum",
            Spectrum::new(tap, config.visuals.spectrum_window, config.visuals.spectrum_bands),
        ))
}

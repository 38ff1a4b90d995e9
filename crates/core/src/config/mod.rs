use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the sandbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub audio: AudioConfig,
    pub visuals: VisualConfig,
}

impl SandboxConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Configuration specific to the output bus and sound engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Upper bound on the samples a single note trigger renders.
    pub block_size: usize,
    /// Samples retained on the output bus for visualizers to read.
    pub bus_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 1024,
            bus_capacity: 8192,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub waveform_points: usize,
    pub spectrum_window: usize,
    pub spectrum_bands: usize,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            waveform_points: 256,
            spectrum_window: 1024,
            spectrum_bands: 8,
        }
    }
}

//! Sound-producing engines and the factory that builds them.
//!
//! The composition core only stores, replaces and instructs engines through
//! [`SoundEngine`]; everything behind that trait is a collaborator. The
//! implementations here route into an [`AudioBus`] so the rest of the sandbox
//! has something audible (and observable) to work with.

mod sampler;
mod synth;

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{AudioBus, Note, Result, SandboxError};

pub use sampler::Sampler;
pub use synth::OscillatorSynth;

/// Waveform menu offered by oscillator synths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OscillatorKind {
    #[default]
    Sine,
    Sawtooth,
    Square,
    Triangle,
    FmSine,
    FmSawtooth,
    FmTriangle,
    AmSine,
    AmSawtooth,
    AmTriangle,
}

impl OscillatorKind {
    pub const ALL: [OscillatorKind; 10] = [
        Self::Sine,
        Self::Sawtooth,
        Self::Square,
        Self::Triangle,
        Self::FmSine,
        Self::FmSawtooth,
        Self::FmTriangle,
        Self::AmSine,
        Self::AmSawtooth,
        Self::AmTriangle,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Sawtooth => "sawtooth",
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::FmSine => "fmsine",
            Self::FmSawtooth => "fmsawtooth",
            Self::FmTriangle => "fmtriangle",
            Self::AmSine => "amsine",
            Self::AmSawtooth => "amsawtooth",
            Self::AmTriangle => "amtriangle",
        }
    }
}

impl fmt::Display for OscillatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OscillatorKind {
    type Err = SandboxError;

    fn from_str(text: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(text.trim()))
            .ok_or_else(|| SandboxError::UnknownOscillator(text.to_string()))
    }
}

/// Recorded audio a [`Sampler`] plays back, pitched relative to `root`.
#[derive(Clone, PartialEq)]
pub struct SamplerConfig {
    pub root: Note,
    pub sample: Arc<[f32]>,
}

impl fmt::Debug for SamplerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerConfig")
            .field("root", &self.root)
            .field("sample_len", &self.sample.len())
            .finish()
    }
}

/// Everything needed to construct an engine instance.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineConfig {
    Oscillator(OscillatorKind),
    Sampler(SamplerConfig),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::Oscillator(OscillatorKind::default())
    }
}

impl EngineConfig {
    pub fn oscillator(&self) -> Option<OscillatorKind> {
        match self {
            Self::Oscillator(kind) => Some(*kind),
            Self::Sampler(_) => None,
        }
    }
}

/// Call contract of a sound-producing engine instance.
pub trait SoundEngine {
    fn config(&self) -> &EngineConfig;

    /// Starts sounding `note`.
    fn trigger_attack(&mut self, note: Note) -> Result<()>;

    /// Releases whatever is sounding after `delay` seconds.
    fn trigger_release(&mut self, delay: f32) -> Result<()>;

    /// Plays `note` for `duration` seconds and releases it.
    fn trigger_attack_release(&mut self, note: Note, duration: f32) -> Result<()>;

    /// Tears down the engine's output routing. Must be idempotent.
    fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;
}

/// Builds engines from configuration values.
pub trait EngineFactory {
    fn create(&self, config: &EngineConfig) -> Result<Box<dyn SoundEngine>>;
}

/// Factory whose engines all render into a shared [`AudioBus`].
#[derive(Debug, Clone)]
pub struct BusEngineFactory {
    bus: AudioBus,
    block_size: usize,
}

impl BusEngineFactory {
    pub fn new(bus: AudioBus, block_size: usize) -> Self {
        Self {
            bus,
            block_size: block_size.max(1),
        }
    }

    pub fn bus(&self) -> &AudioBus {
        &self.bus
    }
}

impl EngineFactory for BusEngineFactory {
    fn create(&self, config: &EngineConfig) -> Result<Box<dyn SoundEngine>> {
        let engine: Box<dyn SoundEngine> = match config {
            EngineConfig::Oscillator(kind) => Box::new(OscillatorSynth::connect(
                *kind,
                self.bus.clone(),
                self.block_size,
            )?),
            EngineConfig::Sampler(sampler) => Box::new(Sampler::connect(
                sampler.clone(),
                self.bus.clone(),
                self.block_size,
            )?),
        };
        tracing::debug!(?config, "constructed sound engine");
        Ok(engine)
    }
}

/// Number of samples a trigger of `duration` seconds renders, capped at one
/// block.
fn render_len(duration: f32, sample_rate: u32, block_size: usize) -> usize {
    let wanted = (duration.max(0.0) * sample_rate as f32).round() as usize;
    wanted.clamp(1, block_size)
}

/// Linear fade in and out over the first and last few milliseconds.
fn envelope(index: usize, len: usize, sample_rate: u32) -> f32 {
    let ramp = ((sample_rate as usize) / 200).clamp(1, len.max(1));
    let fade_in = (index as f32 / ramp as f32).min(1.0);
    let fade_out = ((len - index) as f32 / ramp as f32).min(1.0);
    fade_in.min(fade_out)
}

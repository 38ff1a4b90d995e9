use super::{envelope, render_len, EngineConfig, SamplerConfig, SoundEngine};
use crate::{audio::ConnectionId, AudioBus, Note, Result, SandboxError};

const ATTACK_SECONDS: f32 = 1.0;

/// Plays a recorded sample, resampled to the requested pitch.
#[derive(Debug)]
pub struct Sampler {
    config: EngineConfig,
    root_frequency: f32,
    sample: std::sync::Arc<[f32]>,
    bus: AudioBus,
    connection: Option<ConnectionId>,
    block_size: usize,
}

impl Sampler {
    pub(crate) fn connect(config: SamplerConfig, bus: AudioBus, block_size: usize) -> Result<Self> {
        if config.sample.is_empty() {
            return Err(SandboxError::engine("sampler requires sample data"));
        }

        let connection = bus.connect()?;
        Ok(Self {
            root_frequency: config.root.frequency(),
            sample: config.sample.clone(),
            config: EngineConfig::Sampler(config),
            bus,
            connection: Some(connection),
            block_size,
        })
    }

    fn render(&self, note: Note, duration: f32) -> Result<()> {
        let connection = self
            .connection
            .ok_or_else(|| SandboxError::engine("sampler has been disconnected"))?;

        let ratio = note.frequency() / self.root_frequency;
        let sample_rate = self.bus.sample_rate();
        let planned = render_len(duration, sample_rate, self.block_size);
        let mut block: Vec<f32> = (0..planned)
            .map_while(|i| interpolate(&self.sample, i as f32 * ratio))
            .collect();

        // The sample may run out before `planned`; fade over what was rendered.
        let len = block.len();
        for (i, value) in block.iter_mut().enumerate() {
            *value *= envelope(i, len, sample_rate);
        }

        self.bus.write(connection, &block)
    }
}

impl SoundEngine for Sampler {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn trigger_attack(&mut self, note: Note) -> Result<()> {
        self.render(note, ATTACK_SECONDS)
    }

    fn trigger_release(&mut self, _delay: f32) -> Result<()> {
        Ok(())
    }

    fn trigger_attack_release(&mut self, note: Note, duration: f32) -> Result<()> {
        self.render(note, duration)
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            self.bus.disconnect(connection)?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// Linear interpolation between neighbouring samples; `None` past the end.
fn interpolate(sample: &[f32], position: f32) -> Option<f32> {
    let index = position.floor() as usize;
    let current = *sample.get(index)?;
    let next = sample.get(index + 1).copied().unwrap_or(current);
    let frac = position - index as f32;
    Some(current + (next - current) * frac)
}

use std::f32::consts::TAU;

use super::{envelope, render_len, EngineConfig, OscillatorKind, SoundEngine};
use crate::{audio::ConnectionId, AudioBus, Note, Result, SandboxError};

const GAIN: f32 = 0.5;
const MOD_RATIO: f32 = 2.0;
const FM_INDEX: f32 = 1.5;
/// Note length rendered by a bare attack.
const ATTACK_SECONDS: f32 = 0.5;

/// Single-voice oscillator synth.
#[derive(Debug)]
pub struct OscillatorSynth {
    config: EngineConfig,
    kind: OscillatorKind,
    bus: AudioBus,
    connection: Option<ConnectionId>,
    block_size: usize,
    held: Option<Note>,
}

impl OscillatorSynth {
    pub(crate) fn connect(kind: OscillatorKind, bus: AudioBus, block_size: usize) -> Result<Self> {
        let connection = bus.connect()?;
        Ok(Self {
            config: EngineConfig::Oscillator(kind),
            kind,
            bus,
            connection: Some(connection),
            block_size,
            held: None,
        })
    }

    pub fn kind(&self) -> OscillatorKind {
        self.kind
    }

    /// Note currently held down, if any.
    pub fn held(&self) -> Option<Note> {
        self.held
    }

    fn render(&self, note: Note, duration: f32) -> Result<()> {
        let connection = self
            .connection
            .ok_or_else(|| SandboxError::engine("synth has been disconnected"))?;

        let sample_rate = self.bus.sample_rate();
        let len = render_len(duration, sample_rate, self.block_size);
        let step = note.frequency() / sample_rate as f32;
        let block: Vec<f32> = (0..len)
            .map(|i| {
                let phase = (i as f32 * step).fract();
                GAIN * waveform(self.kind, phase) * envelope(i, len, sample_rate)
            })
            .collect();

        self.bus.write(connection, &block)
    }
}

impl SoundEngine for OscillatorSynth {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn trigger_attack(&mut self, note: Note) -> Result<()> {
        self.render(note, ATTACK_SECONDS)?;
        self.held = Some(note);
        Ok(())
    }

    fn trigger_release(&mut self, delay: f32) -> Result<()> {
        if let Some(note) = self.held.take() {
            tracing::trace!(%note, delay, "released note");
        }
        Ok(())
    }

    fn trigger_attack_release(&mut self, note: Note, duration: f32) -> Result<()> {
        self.render(note, duration)?;
        self.held = None;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.held = None;
        if let Some(connection) = self.connection.take() {
            self.bus.disconnect(connection)?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// Evaluates one cycle of `kind` at `phase` in [0, 1).
fn waveform(kind: OscillatorKind, phase: f32) -> f32 {
    let modulator = (TAU * phase * MOD_RATIO).sin();
    match kind {
        OscillatorKind::Sine => basic(Shape::Sine, phase),
        OscillatorKind::Sawtooth => basic(Shape::Sawtooth, phase),
        OscillatorKind::Square => basic(Shape::Square, phase),
        OscillatorKind::Triangle => basic(Shape::Triangle, phase),
        OscillatorKind::FmSine => basic(Shape::Sine, bend(phase, modulator)),
        OscillatorKind::FmSawtooth => basic(Shape::Sawtooth, bend(phase, modulator)),
        OscillatorKind::FmTriangle => basic(Shape::Triangle, bend(phase, modulator)),
        OscillatorKind::AmSine => basic(Shape::Sine, phase) * tremolo(modulator),
        OscillatorKind::AmSawtooth => basic(Shape::Sawtooth, phase) * tremolo(modulator),
        OscillatorKind::AmTriangle => basic(Shape::Triangle, phase) * tremolo(modulator),
    }
}

#[derive(Clone, Copy)]
enum Shape {
    Sine,
    Sawtooth,
    Square,
    Triangle,
}

fn basic(shape: Shape, phase: f32) -> f32 {
    match shape {
        Shape::Sine => (TAU * phase).sin(),
        Shape::Sawtooth => 2.0 * phase - 1.0,
        Shape::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Shape::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
    }
}

fn bend(phase: f32, modulator: f32) -> f32 {
    (phase + FM_INDEX * modulator / TAU).rem_euclid(1.0)
}

fn tremolo(modulator: f32) -> f32 {
    0.5 + 0.5 * modulator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AudioConfig;

    fn synth(kind: OscillatorKind) -> (OscillatorSynth, AudioBus) {
        let bus = AudioBus::new(&AudioConfig {
            sample_rate: 1_000,
            block_size: 64,
            bus_capacity: 256,
        });
        (OscillatorSynth::connect(kind, bus.clone(), 64).unwrap(), bus)
    }

    #[test]
    fn waveforms_stay_in_range() {
        for kind in OscillatorKind::ALL {
            for step in 0..100 {
                let value = waveform(kind, step as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&value), "{kind} produced {value}");
            }
        }
    }

    #[test]
    fn attack_holds_until_release() {
        let (mut synth, bus) = synth(OscillatorKind::Triangle);
        let note = "E4".parse().unwrap();

        synth.trigger_attack(note).unwrap();
        assert_eq!(synth.held(), Some(note));
        assert_eq!(bus.tap().recent(1024).unwrap().len(), 64);

        synth.trigger_release(0.25).unwrap();
        assert_eq!(synth.held(), None);
    }

    #[test]
    fn disconnected_synth_refuses_to_play() {
        let (mut synth, bus) = synth(OscillatorKind::Sine);
        synth.disconnect().unwrap();

        assert!(!synth.is_connected());
        assert_eq!(bus.active_connections().unwrap(), 0);
        assert!(synth.trigger_attack("A4".parse().unwrap()).is_err());
    }
}

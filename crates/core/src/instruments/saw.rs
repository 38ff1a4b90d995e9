use std::{f32::consts::TAU, ops::RangeInclusive, sync::Arc};

use super::{keyboard, oscillator_menu};
use crate::{
    EngineConfig, EngineFactory, EngineGuard, InstrumentProps, InstrumentSurface, Note,
    OscillatorKind, Result, SamplerConfig, SurfaceInput, SurfaceView,
};

const NOTE_SECONDS: f32 = 1.0;
const RELEASE_DELAY: f32 = 0.25;
const SAMPLE_SECONDS: f32 = 0.5;
const VIBRATO_HZ: f32 = 5.5;
const VIBRATO_DEPTH: f32 = 0.01;

/// Five-octave keyboard playing a bowed-saw sample rooted at C5. Picking an
/// oscillator swaps the sampler for an oscillator synth.
#[derive(Debug, Clone)]
pub struct MusicalSaw {
    octaves: RangeInclusive<i8>,
    root: Note,
    sample: Arc<[f32]>,
}

impl MusicalSaw {
    pub fn new(sample_rate: u32) -> Self {
        let root = Note::new(0, 5);
        Self {
            octaves: 2..=6,
            root,
            sample: bowed_tone(root.frequency(), sample_rate),
        }
    }
}

impl InstrumentSurface for MusicalSaw {
    fn initial_engine(&self) -> EngineConfig {
        EngineConfig::Sampler(SamplerConfig {
            root: self.root,
            sample: self.sample.clone(),
        })
    }

    fn render(&self, props: &InstrumentProps<'_>) -> SurfaceView {
        let mut view = SurfaceView::new("Musical Saw");
        view.widgets.extend(keyboard(self.octaves.clone()));
        view.widgets.extend(oscillator_menu(props));
        view
    }

    fn handle(&self, input: &SurfaceInput, props: &mut InstrumentProps<'_>) -> Result<()> {
        match input {
            SurfaceInput::Press(note) => {
                if let Some(synth) = props.synth_mut() {
                    synth.trigger_attack_release(*note, NOTE_SECONDS)?;
                }
            }
            SurfaceInput::Release(_) => {
                if let Some(synth) = props.synth_mut() {
                    synth.trigger_release(RELEASE_DELAY)?;
                }
            }
            SurfaceInput::Select(option) => {
                let config = EngineConfig::Oscillator(option.parse::<OscillatorKind>()?);
                let engines = props.engines();
                props.set_synth(|previous| {
                    if let Some(previous) = previous {
                        previous.release()?;
                    }
                    let engine = engines.create(&config)?;
                    tracing::debug!(%option, "musical saw switched oscillator");
                    Ok(Some(EngineGuard::new(engine)))
                })?;
            }
        }
        Ok(())
    }
}

/// Slow-attack sine with a light vibrato, standing in for a recorded saw.
fn bowed_tone(frequency: f32, sample_rate: u32) -> Arc<[f32]> {
    let rate = sample_rate.max(1) as f32;
    let len = (SAMPLE_SECONDS * rate) as usize;
    let mut phase = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            let bend = 1.0 + VIBRATO_DEPTH * (TAU * VIBRATO_HZ * t).sin();
            phase = (phase + frequency * bend / rate).fract();
            let swell = (t / SAMPLE_SECONDS * 4.0).min(1.0);
            0.6 * swell * (TAU * phase).sin()
        })
        .collect()
}

use std::ops::RangeInclusive;

use super::{keyboard, oscillator_menu};
use crate::{
    EngineConfig, InstrumentProps, InstrumentSurface, OscillatorKind, Result, SurfaceInput,
    SurfaceView,
};

const RELEASE_DELAY: f32 = 0.25;

/// Two-octave keyboard over an oscillator synth with a waveform menu.
#[derive(Debug, Clone)]
pub struct Piano {
    octaves: RangeInclusive<i8>,
}

impl Piano {
    pub fn new() -> Self {
        Self { octaves: 4..=5 }
    }
}

impl Default for Piano {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumentSurface for Piano {
    fn render(&self, props: &InstrumentProps<'_>) -> SurfaceView {
        let mut view = SurfaceView::new("Piano");
        view.widgets.extend(keyboard(self.octaves.clone()));
        view.widgets.extend(oscillator_menu(props));
        view
    }

    fn handle(&self, input: &SurfaceInput, props: &mut InstrumentProps<'_>) -> Result<()> {
        match input {
            SurfaceInput::Press(note) => {
                if let Some(synth) = props.synth_mut() {
                    synth.trigger_attack(*note)?;
                }
            }
            SurfaceInput::Release(_) => {
                if let Some(synth) = props.synth_mut() {
                    synth.trigger_release(RELEASE_DELAY)?;
                }
            }
            SurfaceInput::Select(option) => {
                let kind = option.parse::<OscillatorKind>()?;
                props.rebuild_synth(&EngineConfig::Oscillator(kind))?;
            }
        }
        Ok(())
    }
}

//! Built-in instruments.

mod piano;
mod saw;

use std::ops::RangeInclusive;

use crate::{
    InstrumentDescriptor, InstrumentProps, InstrumentSurface, Note, OscillatorKind, Registry,
    Result, SandboxConfig, Widget,
};

pub use piano::Piano;
pub use saw::MusicalSaw;

/// Pitch class and horizontal offset (in white-key widths) of each key in one
/// octave.
static OCTAVE_LAYOUT: [(u8, f32); 12] = [
    (0, 0.0),
    (1, 0.5),
    (2, 1.0),
    (3, 1.5),
    (4, 2.0),
    (5, 3.0),
    (6, 3.5),
    (7, 4.0),
    (8, 4.5),
    (9, 5.0),
    (10, 5.5),
    (11, 6.0),
];

const WHITE_KEYS_PER_OCTAVE: f32 = 7.0;

/// Key widgets for every note in `octaves`, laid out left to right.
pub(crate) fn keyboard(octaves: RangeInclusive<i8>) -> Vec<Widget> {
    let first = *octaves.start();
    octaves
        .flat_map(|octave| {
            OCTAVE_LAYOUT.iter().map(move |&(pitch_class, offset)| {
                let note = Note::new(pitch_class, octave);
                Widget::Key {
                    note,
                    minor: note.is_minor(),
                    offset: f32::from(octave - first) * WHITE_KEYS_PER_OCTAVE + offset,
                }
            })
        })
        .collect()
}

/// One toggle per oscillator type, marking the one the current synth uses.
pub(crate) fn oscillator_menu(props: &InstrumentProps<'_>) -> impl Iterator<Item = Widget> {
    let current = props.synth().and_then(|synth| synth.config().oscillator());
    OscillatorKind::ALL.into_iter().map(move |kind| Widget::Toggle {
        label: kind.label().to_string(),
        active: current == Some(kind),
    })
}

/// Registers the stock instruments in display order.
pub fn defaults(config: &SandboxConfig) -> Result<Registry<dyn InstrumentSurface>> {
    Registry::new()
        .with(InstrumentDescriptor::instrument("Piano", Piano::new()))?
        .with(InstrumentDescriptor::instrument(
            "Musical Saw",
            MusicalSaw::new(config.audio.sample_rate),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_spans_seven_white_keys_per_octave() {
        let keys = keyboard(2..=3);
        assert_eq!(keys.len(), 24);

        match &keys[13] {
            Widget::Key {
                note,
                minor,
                offset,
            } => {
                assert_eq!(note.to_string(), "Db3");
                assert!(*minor);
                assert_eq!(*offset, 7.5);
            }
            other => panic!("unexpected widget {other:?}"),
        }
    }
}

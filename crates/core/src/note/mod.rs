use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Result, SandboxError};

const PITCH_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A pitch in scientific notation, e.g. `C4` or `Bb2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note {
    pitch_class: u8,
    octave: i8,
}

impl Note {
    /// Builds a note from a pitch class (0 = C, 11 = B) and an octave.
    pub fn new(pitch_class: u8, octave: i8) -> Self {
        Self {
            pitch_class: pitch_class % 12,
            octave,
        }
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// MIDI note number, with C4 = 60.
    pub fn midi(&self) -> i32 {
        (i32::from(self.octave) + 1) * 12 + i32::from(self.pitch_class)
    }

    /// Equal-tempered frequency relative to A4 = 440 Hz.
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.midi() - 69) as f32 / 12.0)
    }

    /// Accidentals sit on the raised "minor" keys of a keyboard.
    pub fn is_minor(&self) -> bool {
        matches!(self.pitch_class, 1 | 3 | 6 | 8 | 10)
    }

    pub fn pitch_name(&self) -> &'static str {
        PITCH_NAMES[usize::from(self.pitch_class)]
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = SandboxError;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || SandboxError::InvalidNote(text.to_string());
        let mut chars = text.trim().chars();

        let base: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (shift, octave) = if let Some(octave) = rest.strip_prefix('#') {
            (1, octave)
        } else if let Some(octave) = rest.strip_prefix('b') {
            (-1, octave)
        } else {
            (0, rest)
        };

        let octave: i8 = octave.parse().map_err(|_| invalid())?;
        let semitone = base + shift;
        let octave = match semitone {
            -1 => octave.checked_sub(1).ok_or_else(invalid)?,
            12 => octave.checked_add(1).ok_or_else(invalid)?,
            _ => octave,
        };

        Ok(Self::new(semitone.rem_euclid(12) as u8, octave))
    }
}

impl TryFrom<String> for Note {
    type Error = SandboxError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.to_string()
    }
}

//! Notes, rests and diatonic pitch spelling.

use super::length::PlayableLength;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter names within an octave, indexed by diatonic step.
const STEP_NAMES: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// Diatonic step and accidental for each chromatic pitch class, with sharps.
const SHARP_SPELLING: [(i32, i8); 12] = [
    (0, 0),
    (0, 1),
    (1, 0),
    (1, 1),
    (2, 0),
    (3, 0),
    (3, 1),
    (4, 0),
    (4, 1),
    (5, 0),
    (5, 1),
    (6, 0),
];

/// Same as [`SHARP_SPELLING`], with flats for the black keys.
const FLAT_SPELLING: [(i32, i8); 12] = [
    (0, 0),
    (1, -1),
    (1, 0),
    (2, -1),
    (2, 0),
    (3, 0),
    (4, -1),
    (4, 0),
    (5, -1),
    (5, 0),
    (6, -1),
    (6, 0),
];

/// How black keys are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spelling {
    #[default]
    Sharps,
    Flats,
}

impl Spelling {
    /// Flats for keys with flats in the signature, sharps otherwise.
    pub fn for_key(sharps: i8) -> Self {
        if sharps < 0 {
            Spelling::Flats
        } else {
            Spelling::Sharps
        }
    }
}

/// A pitch as written on a staff: a diatonic position plus accidentals.
///
/// `note_name` counts diatonic steps from the C five octaves below middle C,
/// so middle C (MIDI 60) is 28.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiatonicPitch {
    pub note_name: i32,
    /// Sharps when positive, flats when negative.
    pub accidentals: i8,
}

impl DiatonicPitch {
    /// Converts a chromatic MIDI note number.
    ///
    /// # Examples
    ///
    /// ```
    /// use midiscore::score::{DiatonicPitch, Spelling};
    ///
    /// let c = DiatonicPitch::from_midi(60, Spelling::Sharps);
    /// assert_eq!(c.note_name, 28);
    /// assert_eq!(DiatonicPitch::from_midi(61, Spelling::Flats).to_string(), "Db4");
    /// ```
    pub fn from_midi(pitch: u8, spelling: Spelling) -> Self {
        let table = match spelling {
            Spelling::Sharps => &SHARP_SPELLING,
            Spelling::Flats => &FLAT_SPELLING,
        };
        let (step, accidentals) = table[(pitch % 12) as usize];
        let octave = (pitch / 12) as i32 - 1;
        Self {
            note_name: octave * 7 + step,
            accidentals,
        }
    }

    /// Octave number in scientific notation (middle C is in octave 4).
    pub fn octave(&self) -> i32 {
        self.note_name.div_euclid(7)
    }

    /// Letter name of the diatonic step.
    pub fn step_name(&self) -> char {
        STEP_NAMES[self.note_name.rem_euclid(7) as usize]
    }
}

impl fmt::Display for DiatonicPitch {
    /// Writes names like "C4", "F#5" or "Bb3".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step_name())?;
        let sign = if self.accidentals > 0 { "#" } else { "b" };
        for _ in 0..self.accidentals.unsigned_abs() {
            f.write_str(sign)?;
        }
        write!(f, "{}", self.octave())
    }
}

/// A sounding note in a voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Start in score ticks, set when the note is appended to a voice.
    pub time_start: u32,
    pub length: PlayableLength,
    pub pitch: DiatonicPitch,
    /// The MIDI note number the pitch was spelled from.
    pub midi_pitch: u8,
    /// Tied to the following note.
    pub tie_start: bool,
    /// Tied from the preceding note.
    pub tie_end: bool,
}

impl Note {
    /// Creates an untied note.
    pub fn new(midi_pitch: u8, spelling: Spelling, length: PlayableLength) -> Self {
        Self {
            time_start: 0,
            length,
            pitch: DiatonicPitch::from_midi(midi_pitch, spelling),
            midi_pitch,
            tie_start: false,
            tie_end: false,
        }
    }

    /// Sets the tie flags.
    pub fn with_ties(mut self, tie_start: bool, tie_end: bool) -> Self {
        self.tie_start = tie_start;
        self.tie_end = tie_end;
        self
    }
}

/// A rest in a voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rest {
    /// Start in score ticks, set when the rest is appended to a voice.
    pub time_start: u32,
    pub length: PlayableLength,
}

impl Rest {
    pub fn new(length: PlayableLength) -> Self {
        Self {
            time_start: 0,
            length,
        }
    }
}

/// Anything a voice holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Note(Note),
    Rest(Rest),
}

impl Element {
    /// Start in score ticks.
    pub fn time_start(&self) -> u32 {
        match self {
            Element::Note(note) => note.time_start,
            Element::Rest(rest) => rest.time_start,
        }
    }

    /// Duration in score ticks.
    pub fn time_length(&self) -> u32 {
        self.length().ticks()
    }

    /// Returns the end tick (start + length), saturating at `u32::MAX`.
    pub fn time_end(&self) -> u32 {
        self.time_start().saturating_add(self.time_length())
    }

    pub fn length(&self) -> PlayableLength {
        match self {
            Element::Note(note) => note.length,
            Element::Rest(rest) => rest.length,
        }
    }

    pub(crate) fn set_time_start(&mut self, time_start: u32) {
        match self {
            Element::Note(note) => note.time_start = time_start,
            Element::Rest(rest) => rest.time_start = time_start,
        }
    }

    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Element::Note(note) => Some(note),
            Element::Rest(_) => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Element::Rest(_))
    }
}

impl From<Note> for Element {
    fn from(note: Note) -> Self {
        Element::Note(note)
    }
}

impl From<Rest> for Element {
    fn from(rest: Rest) -> Self {
        Element::Rest(rest)
    }
}

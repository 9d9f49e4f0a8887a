//! Standard MIDI File decoding and the passes that turn raw note events
//! into quantized, non-overlapping notes.
//!
//! The import runs leaves first: [`reader`] decodes primitive values,
//! [`decoder`] walks the chunks and sorts note events by channel, then
//! [`combine_events`], [`quantize_events`] and [`resolve_overlaps`] rewrite
//! each channel's list in place before the score builder takes over.

mod combine;
pub mod decoder;
mod error;
mod midi_import;
pub mod note;
mod overlap;
mod quantize;
pub mod reader;

pub use combine::combine_events;
pub use decoder::{decode, DecodedFile, FileSummary, KeySignature, TimeSignature, TrackHeader};
pub use error::{MidiImportError, ParseError, ParseErrorKind, ParseResult};
pub use midi_import::{import_from_midi, ImportOptions, ImportReport, ImportStats, MidiImport};
pub use note::{ChannelEvents, RawEvent};
pub use overlap::{resolve_overlaps, OverlapPolicy};
pub use quantize::{quantize_events, round_to_grid};

/// Number of MIDI channels.
pub const CHANNEL_COUNT: usize = 16;

/// Default quantization grid in ticks.
pub const DEFAULT_QUANTIZATION_UNIT: u32 = 32;

/// Default maximum number of dots on a written length.
pub const DEFAULT_MAX_DOTS: u8 = 4;

/// Standard MIDI note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Arguments
///
/// * `note` - MIDI note number (0-127)
///
/// # Returns
///
/// String representation like "C4" or "F#5"
///
/// # Examples
///
/// ```
/// use midiscore::midi::note_to_name;
///
/// let name = note_to_name(60); // Middle C
/// assert_eq!(name, "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Converts a tempo meta value (microseconds per quarter note) to whole
/// beats per minute. A tempo of 0 yields 0.
pub fn tempo_to_bpm(micros_per_quarter: u32) -> u32 {
    60_000_000u32.checked_div(micros_per_quarter).unwrap_or(0)
}

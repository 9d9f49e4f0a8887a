//! midiscore - Standard MIDI File import into a notated score.
//!
//! This library decodes MIDI files and rebuilds their rhythm as staffs of
//! notes, rests and ties.

pub mod midi;
pub mod score;

// Re-export commonly used types
pub use midi::{import_from_midi, ImportOptions, ImportReport, MidiImport, MidiImportError};
pub use score::{Document, Sheet};

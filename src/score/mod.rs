//! A minimal score model: documents of sheets, staffs, voices, notes and rests.
//!
//! The importer fills a [`Sheet`] of an existing [`Document`]; everything
//! here is serializable so a score can be dumped as JSON.
//!
//! # Limitations
//!
//! - No clefs, key or time signatures on the staff
//! - One voice per imported channel; no chords

pub mod builder;
mod length;
mod note;
mod staff;

pub use builder::{BuildError, BuildSummary, ScoreBuilder};
pub use length::{
    total_ticks, MusicLength, PlayableLength, UnrepresentableLength, MIN_LENGTH_TICKS,
    WHOLE_NOTE_TICKS,
};
pub use note::{DiatonicPitch, Element, Note, Rest, Spelling};
pub use staff::{Staff, Voice, STAFF_LINES};

use serde::{Deserialize, Serialize};

/// Name of the sheet created when an import target has none.
pub const DEFAULT_SHEET_NAME: &str = "imported";

/// A page of staffs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub staffs: Vec<Staff>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            staffs: Vec::new(),
        }
    }

    /// Total number of notes on all staffs.
    pub fn note_count(&self) -> usize {
        self.staffs
            .iter()
            .flat_map(|s| &s.voices)
            .map(|v| v.notes().count())
            .sum()
    }
}

/// A score document holding one or more sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub sheets: Vec<Sheet>,
}

impl Document {
    /// Creates an empty document.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sheets: Vec::new(),
        }
    }

    /// Returns the first sheet and its index, creating a
    /// [`DEFAULT_SHEET_NAME`] sheet if the document has none.
    pub fn first_sheet_or_insert(&mut self) -> (usize, &mut Sheet) {
        if self.sheets.is_empty() {
            self.sheets.push(Sheet::new(DEFAULT_SHEET_NAME));
        }
        (0, &mut self.sheets[0])
    }

    /// Serializes the document to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Loads a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

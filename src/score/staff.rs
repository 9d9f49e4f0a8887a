//! Staffs and the voices they hold.

use super::note::Element;
use serde::{Deserialize, Serialize};

/// Default number of lines of a new staff.
pub const STAFF_LINES: u8 = 5;

/// One horizontal line of elements with no gaps and no overlaps.
///
/// Elements can only be added at the end, so a voice stays in time order
/// by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// 1-based number within the staff.
    pub number: u32,
    elements: Vec<Element>,
}

impl Voice {
    pub fn new(number: u32) -> Self {
        Self {
            name: format!("Voice {number}"),
            number,
            elements: Vec::new(),
        }
    }

    /// Appends `element` where the voice currently ends.
    ///
    /// # Returns
    ///
    /// The start tick the element was placed at.
    pub fn append(&mut self, element: impl Into<Element>) -> u32 {
        let mut element = element.into();
        let start = self.time_end();
        element.set_time_start(start);
        self.elements.push(element);
        start
    }

    /// End tick of the last element, 0 for an empty voice.
    pub fn time_end(&self) -> u32 {
        self.elements.last().map_or(0, Element::time_end)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns an iterator over the notes, skipping rests.
    pub fn notes(&self) -> impl Iterator<Item = &super::Note> {
        self.elements.iter().filter_map(Element::as_note)
    }
}

/// A staff with its voices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub name: String,
    pub line_count: u8,
    pub voices: Vec<Voice>,
}

impl Staff {
    /// Creates a five-line staff with a single empty voice.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line_count: STAFF_LINES,
            voices: vec![Voice::new(1)],
        }
    }

    /// Returns the first voice, adding one if the staff has none.
    pub fn voice_or_insert(&mut self) -> &mut Voice {
        if self.voices.is_empty() {
            self.voices.push(Voice::new(1));
        }
        &mut self.voices[0]
    }
}

//! Errors that can occur while importing a MIDI file.
//!
//! Decoding failures are reported as a [`ParseError`]: the kind of problem plus
//! the byte offset in the input where it was detected. Everything that can go
//! wrong around decoding (file access, bad options, unwritable scores) is
//! wrapped by [`MidiImportError`].

use crate::score::BuildError;
use thiserror::Error;

/// A decoding failure and the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at byte {position}: {kind}")]
pub struct ParseError {
    position: usize,
    kind: ParseErrorKind,
}

/// The kinds of decoding failure. All of them abort the import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The buffer ended in the middle of a read.
    #[error("stream ended {needed} byte(s) short")]
    TruncatedStream {
        /// Bytes still missing when the read gave up.
        needed: usize,
    },
    /// A variable-length quantity ran past its four byte maximum.
    #[error("variable-length quantity longer than 4 bytes")]
    MalformedVariableLength,
    /// The `MThd` chunk has a bad length or appears twice.
    #[error("malformed header chunk: {0}")]
    MalformedHeader(&'static str),
    /// An `MTrk` chunk declares a length that cannot be right.
    #[error("malformed track chunk: declared {declared} byte(s), {available} available")]
    MalformedTrack {
        /// Length field as found in the file.
        declared: u32,
        /// Bytes left in the input after the length field.
        available: usize,
    },
    /// A known meta event with an inconsistent size.
    #[error("malformed meta event 0x{meta_type:02x} of size {size}")]
    MalformedMeta {
        /// Meta type byte.
        meta_type: u8,
        /// Declared data size.
        size: usize,
    },
    /// A meta event this importer does not know.
    #[error("unsupported meta event 0x{0:02x}")]
    UnsupportedMeta(u8),
    /// A status byte or channel message this importer does not handle.
    #[error("unsupported event with status 0x{0:02x}")]
    UnsupportedEvent(u8),
    /// A top-level chunk that is neither `MThd` nor `MTrk`.
    #[error("unrecognized chunk {0:?}")]
    UnrecognizedChunk(String),
}

impl ParseError {
    /// Create a parse error from a position and kind
    pub const fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }

    /// Returns the byte offset where the error was detected.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// True if the input ended unexpectedly.
    pub fn is_truncated(&self) -> bool {
        matches!(self.kind, ParseErrorKind::TruncatedStream { .. })
    }
}

/// The result type of every decoding step (see [`ParseError`]).
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur during MIDI import.
#[derive(Debug, Error)]
pub enum MidiImportError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// MIDI decoding failed
    #[error("MIDI parse error {0}")]
    Parse(#[from] ParseError),
    /// The import options cannot produce a notated score
    #[error("invalid import options: {0}")]
    InvalidOptions(String),
    /// The quantized notes could not be written as a score
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl MidiImportError {
    /// Returns the parse error, if decoding is what failed.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            MidiImportError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

//! Byte-level reading of Standard MIDI File data.
//!
//! [`Reader`] is a cursor over a borrowed byte buffer. Every read either
//! succeeds and advances the cursor, or fails and leaves it where it was.
//! The first failure is latched: all later reads return that same error, so a
//! caller decoding a long run of fields can check for failure once.

use super::error::{ParseError, ParseErrorKind, ParseResult};

/// Longest variable-length quantity allowed by the file format.
const MAX_VARIABLE_LENGTH_BYTES: usize = 4;

/// Cursor over MIDI file bytes.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    cursor: usize,
    /// Absolute offset of `data[0]` in the original input.
    base: usize,
    failed: Option<ParseError>,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: 0,
            base: 0,
            failed: None,
        }
    }

    /// Absolute byte offset of the cursor in the original input.
    pub fn position(&self) -> usize {
        self.base + self.cursor
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The latched error, if a read has failed.
    pub fn error(&self) -> Option<&ParseError> {
        self.failed.as_ref()
    }

    /// Records a decoding failure detected at `position` and latches it.
    ///
    /// Used by higher layers for problems that are not plain read failures,
    /// such as a meta event with the wrong size.
    pub fn invalid(&mut self, position: usize, kind: ParseErrorKind) -> ParseError {
        let err = ParseError::new(position, kind);
        self.failed = Some(err.clone());
        err
    }

    fn check(&self) -> ParseResult<()> {
        match &self.failed {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Reads the next `n` bytes.
    pub fn read_fixed(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        self.check()?;
        if n > self.remaining() {
            let needed = n - self.remaining();
            return Err(self.invalid(
                self.position(),
                ParseErrorKind::TruncatedStream { needed },
            ));
        }
        let bytes = &self.data[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(bytes)
    }

    /// Reads a single unsigned byte.
    pub fn read_byte(&mut self) -> ParseResult<u8> {
        Ok(self.read_fixed(1)?[0])
    }

    /// Reads a big-endian 16-bit unsigned integer.
    pub fn read_be16(&mut self) -> ParseResult<u16> {
        let bytes = self.read_fixed(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian 24-bit unsigned integer (tempo values).
    pub fn read_be24(&mut self) -> ParseResult<u32> {
        let bytes = self.read_fixed(3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    /// Reads a big-endian 32-bit unsigned integer.
    pub fn read_be32(&mut self) -> ParseResult<u32> {
        let bytes = self.read_fixed(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a MIDI variable-length quantity.
    ///
    /// Each byte contributes its low 7 bits, most significant group first;
    /// a set high bit means another byte follows.
    pub fn read_variable_length(&mut self) -> ParseResult<u32> {
        self.check()?;
        let start = self.position();
        let mut value: u32 = 0;
        for (i, &byte) in self.data[self.cursor..].iter().enumerate() {
            if i == MAX_VARIABLE_LENGTH_BYTES {
                return Err(self.invalid(start, ParseErrorKind::MalformedVariableLength));
            }
            value = (value << 7) | (byte & 0x7f) as u32;
            if byte & 0x80 == 0 {
                self.cursor += i + 1;
                return Ok(value);
            }
        }
        Err(self.invalid(start, ParseErrorKind::TruncatedStream { needed: 1 }))
    }

    /// Skips `n` bytes.
    pub fn skip(&mut self, n: usize) -> ParseResult<()> {
        self.read_fixed(n).map(|_| ())
    }

    /// Splits off the next `n` bytes as a reader of their own.
    ///
    /// Positions reported by the returned reader stay absolute.
    pub fn sub_reader(&mut self, n: usize) -> ParseResult<Reader<'a>> {
        let base = self.position();
        let data = self.read_fixed(n)?;
        Ok(Reader {
            data,
            cursor: 0,
            base,
            failed: None,
        })
    }
}

/// Writes a variable-length quantity (VLQ) used for delta times in MIDI.
///
/// VLQ encodes values using 7 bits per byte, with the MSB indicating
/// whether more bytes follow (1 = more bytes, 0 = last byte).
pub fn write_variable_length(value: u32, buffer: &mut Vec<u8>) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut temp = value;
    loop {
        groups[count] = (temp & 0x7f) as u8;
        count += 1;
        temp >>= 7;
        if temp == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        buffer.push(groups[i] | continuation);
    }
}

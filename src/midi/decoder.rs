//! Chunk and event decoding for Standard MIDI Files.
//!
//! [`decode`] walks the top-level chunks of a file and turns every track's
//! note messages into [`RawEvent`]s, grouped by channel. Meta events are
//! kept only as far as they describe the file (tempo, signatures, names).
//!
//! # Limitations
//!
//! - Each `MTrk` restarts its clock at tick 0. Times are track-relative,
//!   even in format 1 files where tracks play in parallel.
//! - Only note on/off, program change and control change are accepted as
//!   channel messages. Aftertouch, channel pressure and pitch bend abort the
//!   import.
//! - Unknown chunk types abort the import rather than being skipped.

use super::error::{ParseErrorKind, ParseResult};
use super::note::{ChannelEvents, RawEvent};
use super::reader::Reader;
use super::{note_to_name, tempo_to_bpm, CHANNEL_COUNT};
use std::borrow::Cow;
use tracing::{debug, info, warn};

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
const HEADER_LENGTH: u32 = 6;

const STATUS_META: u8 = 0xff;
const STATUS_SYSEX: u8 = 0xf0;
const STATUS_SYSEX_ESCAPE: u8 = 0xf7;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xb0;
const PROGRAM_CHANGE: u8 = 0xc0;

const META_SEQUENCE_NUMBER: u8 = 0x00;
const META_TEXT: u8 = 0x01;
const META_COPYRIGHT: u8 = 0x02;
const META_TRACK_NAME: u8 = 0x03;
const META_INSTRUMENT_NAME: u8 = 0x04;
const META_LYRIC: u8 = 0x05;
const META_MARKER: u8 = 0x06;
const META_CUE_POINT: u8 = 0x07;
const META_CHANNEL_PREFIX: u8 = 0x20;
const META_MIDI_PORT: u8 = 0x21;
const META_END_OF_TRACK: u8 = 0x2f;
const META_TEMPO: u8 = 0x51;
const META_SMPTE_OFFSET: u8 = 0x54;
const META_TIME_SIGNATURE: u8 = 0x58;
const META_KEY_SIGNATURE: u8 = 0x59;
const META_SEQUENCER_SPECIFIC: u8 = 0x7f;

/// Contents of the `MThd` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackHeader {
    /// SMF format (0, 1 or 2).
    pub format: u16,
    /// Number of tracks the header announces.
    pub track_count: u16,
    /// Raw time division field.
    pub division: u16,
}

impl TrackHeader {
    /// Ticks per quarter note, when the division is metrical.
    pub fn ticks_per_quarter(&self) -> Option<u16> {
        (self.division & 0x8000 == 0).then_some(self.division)
    }
}

/// Which text meta event a piece of text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
}

/// Key signature as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySignature {
    /// Sharps when positive, flats when negative.
    pub sharps: i8,
    /// Minor key when true.
    pub minor: bool,
}

/// Time signature as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u8,
    /// The denominator is stored as a power of two (2 means a quarter).
    pub denominator_power: u8,
    pub clocks_per_click: Option<u8>,
    pub thirty_seconds_per_quarter: Option<u8>,
}

impl TimeSignature {
    /// The decoded denominator, if the power is in range.
    pub fn denominator(&self) -> Option<u32> {
        1u32.checked_shl(self.denominator_power as u32)
    }
}

/// A decoded meta event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaEvent<'a> {
    Text { kind: TextKind, text: Cow<'a, str> },
    SmpteOffset([u8; 5]),
    /// Microseconds per quarter note.
    Tempo(u32),
    KeySignature(KeySignature),
    TimeSignature(TimeSignature),
    EndOfTrack,
    /// A meta event that is understood and deliberately skipped.
    Ignored { meta_type: u8 },
}

impl<'a> MetaEvent<'a> {
    /// Decodes the data of a meta event of type `meta_type`.
    pub fn parse(meta_type: u8, data: &'a [u8]) -> Result<Self, ParseErrorKind> {
        let malformed = || ParseErrorKind::MalformedMeta {
            meta_type,
            size: data.len(),
        };
        let text = |kind| MetaEvent::Text {
            kind,
            text: String::from_utf8_lossy(data),
        };

        Ok(match meta_type {
            META_TEXT => text(TextKind::Text),
            META_COPYRIGHT => text(TextKind::Copyright),
            META_TRACK_NAME => text(TextKind::TrackName),
            META_INSTRUMENT_NAME => text(TextKind::InstrumentName),
            META_LYRIC => text(TextKind::Lyric),
            META_MARKER => text(TextKind::Marker),
            META_CUE_POINT => text(TextKind::CuePoint),
            META_SMPTE_OFFSET => {
                let offset: [u8; 5] = data.try_into().map_err(|_| malformed())?;
                MetaEvent::SmpteOffset(offset)
            }
            META_TEMPO => match data {
                [a, b, c] => MetaEvent::Tempo(u32::from_be_bytes([0, *a, *b, *c])),
                _ => return Err(malformed()),
            },
            META_KEY_SIGNATURE => match data {
                [sharps, minor, ..] => MetaEvent::KeySignature(KeySignature {
                    sharps: *sharps as i8,
                    minor: *minor != 0,
                }),
                _ => return Err(malformed()),
            },
            META_TIME_SIGNATURE => match data {
                [numerator, denominator_power, rest @ ..] => {
                    MetaEvent::TimeSignature(TimeSignature {
                        numerator: *numerator,
                        denominator_power: *denominator_power,
                        clocks_per_click: rest.first().copied(),
                        thirty_seconds_per_quarter: rest.get(1).copied(),
                    })
                }
                _ => return Err(malformed()),
            },
            META_END_OF_TRACK => MetaEvent::EndOfTrack,
            META_SEQUENCE_NUMBER | META_CHANNEL_PREFIX | META_MIDI_PORT
            | META_SEQUENCER_SPECIFIC => MetaEvent::Ignored { meta_type },
            other => return Err(ParseErrorKind::UnsupportedMeta(other)),
        })
    }
}

/// The channel voice messages this importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8, velocity: u8 },
    ProgramChange { program: u8 },
    ControlChange { controller: u8, value: u8 },
}

/// One decoded track event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent<'a> {
    Meta(MetaEvent<'a>),
    /// A system exclusive message, skipped.
    SysEx { length: usize },
    Channel { channel: u8, message: ChannelMessage },
}

/// Decodes one event: its delta time and the event itself.
///
/// `running_status` carries the last channel status byte of the track. A
/// data byte in status position reuses it; meta and sysex events clear it.
pub fn decode_event<'a>(
    reader: &mut Reader<'a>,
    running_status: &mut Option<u8>,
) -> ParseResult<(u32, TrackEvent<'a>)> {
    let delta = reader.read_variable_length()?;
    let status_at = reader.position();
    let byte = reader.read_byte()?;

    let (status, first_data) = if byte < 0x80 {
        match *running_status {
            Some(status) => (status, Some(byte)),
            None => return Err(reader.invalid(status_at, ParseErrorKind::UnsupportedEvent(byte))),
        }
    } else {
        (byte, None)
    };

    let event = match status {
        STATUS_META => {
            *running_status = None;
            let meta_type = reader.read_byte()?;
            let size = reader.read_variable_length()? as usize;
            let data = reader.read_fixed(size)?;
            let meta = MetaEvent::parse(meta_type, data)
                .map_err(|kind| reader.invalid(status_at, kind))?;
            TrackEvent::Meta(meta)
        }
        STATUS_SYSEX | STATUS_SYSEX_ESCAPE => {
            *running_status = None;
            let length = reader.read_variable_length()? as usize;
            reader.skip(length)?;
            TrackEvent::SysEx { length }
        }
        0xf1..=0xfe => {
            return Err(reader.invalid(status_at, ParseErrorKind::UnsupportedEvent(status)))
        }
        _ => {
            let channel = status & 0x0f;
            let mut first = first_data;
            let message = match status & 0xf0 {
                NOTE_ON => ChannelMessage::NoteOn {
                    pitch: data_byte(reader, &mut first)?,
                    velocity: data_byte(reader, &mut first)?,
                },
                NOTE_OFF => ChannelMessage::NoteOff {
                    pitch: data_byte(reader, &mut first)?,
                    velocity: data_byte(reader, &mut first)?,
                },
                PROGRAM_CHANGE => ChannelMessage::ProgramChange {
                    program: data_byte(reader, &mut first)?,
                },
                CONTROL_CHANGE => ChannelMessage::ControlChange {
                    controller: data_byte(reader, &mut first)?,
                    value: data_byte(reader, &mut first)?,
                },
                _ => {
                    return Err(reader.invalid(status_at, ParseErrorKind::UnsupportedEvent(status)))
                }
            };
            *running_status = Some(status);
            TrackEvent::Channel { channel, message }
        }
    };

    Ok((delta, event))
}

/// Next data byte of a channel message, taking the running-status byte first.
fn data_byte(reader: &mut Reader<'_>, pending: &mut Option<u8>) -> ParseResult<u8> {
    match pending.take() {
        Some(byte) => Ok(byte),
        None => reader.read_byte(),
    }
}

/// Everything the decoder learned about the file besides the notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    /// Number of `MTrk` chunks decoded.
    pub track_chunks: usize,
    /// Last tempo seen, in microseconds per quarter note.
    pub tempo: Option<u32>,
    /// First time signature seen.
    pub time_signature: Option<TimeSignature>,
    /// First key signature seen.
    pub key_signature: Option<KeySignature>,
    /// Track names in file order.
    pub track_names: Vec<String>,
    /// Program changes read and ignored.
    pub program_changes: usize,
    /// Control changes read and ignored.
    pub control_changes: usize,
}

impl FileSummary {
    fn record_meta(&mut self, meta: MetaEvent<'_>, time: u32) {
        match meta {
            MetaEvent::Text { kind, text } => {
                debug!(?kind, %text, time, "text meta event");
                if kind == TextKind::TrackName {
                    self.track_names.push(text.into_owned());
                }
            }
            MetaEvent::SmpteOffset(offset) => debug!(?offset, "SMPTE offset"),
            MetaEvent::Tempo(micros) => {
                debug!(micros, bpm = tempo_to_bpm(micros), time, "tempo");
                self.tempo = Some(micros);
            }
            MetaEvent::KeySignature(key) => {
                debug!(sharps = key.sharps, minor = key.minor, "key signature");
                self.key_signature.get_or_insert(key);
            }
            MetaEvent::TimeSignature(sig) => {
                debug!(
                    numerator = sig.numerator,
                    denominator = ?sig.denominator(),
                    "time signature"
                );
                self.time_signature.get_or_insert(sig);
            }
            MetaEvent::Ignored { meta_type } => debug!(meta_type, "skipping meta event"),
            MetaEvent::EndOfTrack => {}
        }
    }
}

/// A fully decoded file: header, summary and per-channel events.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    /// The `MThd` contents, if the file had a header chunk.
    pub header: Option<TrackHeader>,
    /// File-level information gathered from meta events.
    pub summary: FileSummary,
    /// One event list per MIDI channel, indexed by channel number.
    pub channels: Vec<ChannelEvents>,
}

impl DecodedFile {
    fn new() -> Self {
        Self {
            header: None,
            summary: FileSummary::default(),
            channels: (0..CHANNEL_COUNT as u8).map(ChannelEvents::new).collect(),
        }
    }

    /// Total number of raw note events across all channels.
    pub fn event_count(&self) -> usize {
        self.channels.iter().map(|c| c.len()).sum()
    }
}

/// Decodes a complete Standard MIDI File.
///
/// # Errors
///
/// Returns the first decoding failure with its byte offset. Nothing is
/// returned for a file that fails part way.
pub fn decode(bytes: &[u8]) -> ParseResult<DecodedFile> {
    let mut reader = Reader::new(bytes);
    let mut file = DecodedFile::new();

    if reader.is_empty() {
        return Err(reader.invalid(0, ParseErrorKind::TruncatedStream { needed: 4 }));
    }

    while !reader.is_empty() {
        let chunk_at = reader.position();
        let tag = reader.read_fixed(4)?;
        match tag {
            t if t == HEADER_TAG => {
                let header = decode_header(&mut reader, chunk_at, file.header.is_some())?;
                info!(
                    format = header.format,
                    tracks = header.track_count,
                    division = header.division,
                    "read MIDI header"
                );
                file.header = Some(header);
            }
            t if t == TRACK_TAG => {
                let declared = reader.read_be32()?;
                let available = reader.remaining();
                if (declared as i32) < 0 || declared as usize > available {
                    return Err(reader.invalid(
                        chunk_at,
                        ParseErrorKind::MalformedTrack {
                            declared,
                            available,
                        },
                    ));
                }
                let mut track = reader.sub_reader(declared as usize)?;
                decode_track(&mut track, &mut file)?;
                file.summary.track_chunks += 1;
            }
            other => {
                let tag = String::from_utf8_lossy(other).into_owned();
                return Err(reader.invalid(chunk_at, ParseErrorKind::UnrecognizedChunk(tag)));
            }
        }
    }

    match file.header {
        Some(header) if header.track_count as usize != file.summary.track_chunks => warn!(
            announced = header.track_count,
            found = file.summary.track_chunks,
            "track count in header does not match the file"
        ),
        None => warn!("file has no MThd header chunk"),
        _ => {}
    }

    Ok(file)
}

fn decode_header(
    reader: &mut Reader<'_>,
    chunk_at: usize,
    seen_before: bool,
) -> ParseResult<TrackHeader> {
    if seen_before {
        return Err(reader.invalid(
            chunk_at,
            ParseErrorKind::MalformedHeader("more than one MThd chunk"),
        ));
    }
    if reader.read_be32()? != HEADER_LENGTH {
        return Err(reader.invalid(
            chunk_at,
            ParseErrorKind::MalformedHeader("header length is not 6"),
        ));
    }
    Ok(TrackHeader {
        format: reader.read_be16()?,
        track_count: reader.read_be16()?,
        division: reader.read_be16()?,
    })
}

/// Decodes the events of one track chunk into the file's channel lists.
fn decode_track(track: &mut Reader<'_>, file: &mut DecodedFile) -> ParseResult<()> {
    // Every track starts over at tick 0
    let mut time: u32 = 0;
    let mut running_status = None;
    let mut notes = 0usize;

    while !track.is_empty() {
        let (delta, event) = decode_event(track, &mut running_status)?;
        time = time.saturating_add(delta);

        match event {
            TrackEvent::Meta(MetaEvent::EndOfTrack) => {
                if !track.is_empty() {
                    debug!(trailing = track.remaining(), "bytes after end of track");
                }
                break;
            }
            TrackEvent::Meta(meta) => file.summary.record_meta(meta, time),
            TrackEvent::SysEx { length } => debug!(length, time, "skipping system exclusive"),
            TrackEvent::Channel { channel, message } => {
                let events = &mut file.channels[channel as usize];
                match message {
                    ChannelMessage::NoteOn { pitch, velocity } => {
                        debug!(channel, note = %note_to_name(pitch), velocity, time, "note on");
                        events.push(RawEvent::note_on(channel, pitch, velocity, time));
                        notes += 1;
                    }
                    ChannelMessage::NoteOff { pitch, velocity } => {
                        debug!(channel, note = %note_to_name(pitch), velocity, time, "note off");
                        events.push(RawEvent::note_off(channel, pitch, velocity, time));
                        notes += 1;
                    }
                    ChannelMessage::ProgramChange { program } => {
                        debug!(channel, program, "program change ignored");
                        file.summary.program_changes += 1;
                    }
                    ChannelMessage::ControlChange { controller, value } => {
                        debug!(channel, controller, value, "control change ignored");
                        file.summary.control_changes += 1;
                    }
                }
            }
        }
    }

    debug!(notes, end = time, "decoded track");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::reader::write_variable_length;

    fn header_chunk(tracks: u16) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend([0, 0, 0, 6, 0, 1]);
        bytes.extend(tracks.to_be_bytes());
        bytes.extend([0x01, 0xe0]);
        bytes
    }

    fn track_chunk(events: &[u8]) -> Vec<u8> {
        let mut bytes = b"MTrk".to_vec();
        bytes.extend((events.len() as u32).to_be_bytes());
        bytes.extend(events);
        bytes
    }

    fn decode_one(bytes: &[u8]) -> ParseResult<TrackEvent<'_>> {
        let mut reader = Reader::new(bytes);
        decode_event(&mut reader, &mut None).map(|(_, event)| event)
    }

    #[test]
    fn test_decode_note_events() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[
            0x00, 0x90, 60, 100, // note on
            0x83, 0x60, 0x80, 60, 0, // note off after 480 ticks
            0x00, 0xff, 0x2f, 0x00,
        ]));
        let file = decode(&bytes).unwrap();

        assert_eq!(
            file.header,
            Some(TrackHeader {
                format: 1,
                track_count: 1,
                division: 480
            })
        );
        let events = file.channels[0].events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RawEvent::note_on(0, 60, 100, 0));
        assert_eq!(events[1], RawEvent::note_off(0, 60, 0, 480));
        assert_eq!(file.summary.track_chunks, 1);
    }

    #[test]
    fn test_channels_are_separated() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[
            0x00, 0x93, 64, 90, //
            0x00, 0x9a, 36, 90, //
            0x10, 0x83, 64, 0, //
            0x00, 0x8a, 36, 0,
        ]));
        let file = decode(&bytes).unwrap();
        assert_eq!(file.channels[3].len(), 2);
        assert_eq!(file.channels[10].len(), 2);
        assert_eq!(file.channels[10].events()[0].channel, 10);
        assert_eq!(file.event_count(), 4);
    }

    #[test]
    fn test_time_restarts_for_each_track() {
        let mut bytes = header_chunk(2);
        bytes.extend(track_chunk(&[0x60, 0x90, 60, 100, 0x00, 0xff, 0x2f, 0x00]));
        bytes.extend(track_chunk(&[0x20, 0x90, 62, 100, 0x00, 0xff, 0x2f, 0x00]));
        let file = decode(&bytes).unwrap();
        let starts: Vec<u32> = file.channels[0]
            .events()
            .iter()
            .map(|e| e.start_time)
            .collect();
        assert_eq!(starts, vec![0x60, 0x20]);
        assert_eq!(file.summary.track_chunks, 2);
    }

    #[test]
    fn test_running_status() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[
            0x00, 0x90, 60, 100, // explicit status
            0x10, 62, 100, // running status note on
            0x10, 60, 0, // running status, velocity 0
        ]));
        let file = decode(&bytes).unwrap();
        let events = file.channels[0].events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], RawEvent::note_on(0, 62, 100, 0x10));
        assert_eq!(events[2], RawEvent::note_on(0, 60, 0, 0x20));
    }

    #[test]
    fn test_data_byte_without_running_status() {
        let err = decode_one(&[0x00, 0x3c, 0x40]).unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnsupportedEvent(0x3c));
        assert_eq!(err.position(), 1);
    }

    #[test]
    fn test_meta_clears_running_status() {
        let mut reader = Reader::new(&[0x00, 0x90, 60, 100, 0x00, 0xff, 0x01, 0x00, 0x00, 62, 0]);
        let mut status = None;
        decode_event(&mut reader, &mut status).unwrap();
        assert_eq!(status, Some(0x90));
        decode_event(&mut reader, &mut status).unwrap();
        assert_eq!(status, None);
        assert!(decode_event(&mut reader, &mut status).is_err());
    }

    #[test]
    fn test_program_and_control_changes_are_counted() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[0x00, 0xc2, 5, 0x00, 0xb2, 7, 100, 0x00, 0xb2, 10, 64]));
        let file = decode(&bytes).unwrap();
        assert_eq!(file.summary.program_changes, 1);
        assert_eq!(file.summary.control_changes, 2);
        assert_eq!(file.event_count(), 0);
    }

    #[test]
    fn test_unsupported_channel_message() {
        // Pitch bend
        let err = decode_one(&[0x00, 0xe0, 0x00, 0x40]).unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnsupportedEvent(0xe0));
        // System common
        let err = decode_one(&[0x00, 0xf2, 0x00, 0x00]).unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnsupportedEvent(0xf2));
    }

    #[test]
    fn test_meta_events() {
        let tempo = decode_one(&[0x00, 0xff, 0x51, 0x03, 0x07, 0xa1, 0x20]).unwrap();
        assert_eq!(tempo, TrackEvent::Meta(MetaEvent::Tempo(500_000)));

        let key = decode_one(&[0x00, 0xff, 0x59, 0x02, 0xfd, 0x01]).unwrap();
        assert_eq!(
            key,
            TrackEvent::Meta(MetaEvent::KeySignature(KeySignature {
                sharps: -3,
                minor: true
            }))
        );

        let time = decode_one(&[0x00, 0xff, 0x58, 0x04, 0x06, 0x03, 0x24, 0x08]).unwrap();
        let TrackEvent::Meta(MetaEvent::TimeSignature(sig)) = time else {
            panic!("expected a time signature, got {time:?}");
        };
        assert_eq!(sig.numerator, 6);
        assert_eq!(sig.denominator(), Some(8));
        assert_eq!(sig.clocks_per_click, Some(0x24));

        let name = decode_one(&[0x00, 0xff, 0x03, 0x05, b'P', b'i', b'a', b'n', b'o']).unwrap();
        assert_eq!(
            name,
            TrackEvent::Meta(MetaEvent::Text {
                kind: TextKind::TrackName,
                text: Cow::Borrowed("Piano")
            })
        );
    }

    #[test]
    fn test_long_text_uses_variable_length_size() {
        let text = vec![b'x'; 200];
        let mut bytes = vec![0x00, 0xff, 0x01];
        write_variable_length(text.len() as u32, &mut bytes);
        bytes.extend(&text);
        let event = decode_one(&bytes).unwrap();
        let TrackEvent::Meta(MetaEvent::Text { text, .. }) = event else {
            panic!("expected text");
        };
        assert_eq!(text.len(), 200);
    }

    #[test]
    fn test_malformed_meta_sizes() {
        let err = decode_one(&[0x00, 0xff, 0x51, 0x02, 0x07, 0xa1]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::MalformedMeta {
                meta_type: 0x51,
                size: 2
            }
        );

        let err = decode_one(&[0x00, 0xff, 0x54, 0x04, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::MalformedMeta {
                meta_type: 0x54,
                size: 4
            }
        );
    }

    #[test]
    fn test_unknown_meta_aborts() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[0x00, 0xff, 0x60, 0x00]));
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnsupportedMeta(0x60));
        assert_eq!(err.position(), 23);
    }

    #[test]
    fn test_sysex_is_skipped() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[
            0x00, 0xf0, 0x03, 0x7e, 0x7f, 0xf7, //
            0x00, 0x90, 60, 100,
        ]));
        let file = decode(&bytes).unwrap();
        assert_eq!(file.channels[0].len(), 1);
    }

    #[test]
    fn test_end_of_track_skips_trailing_bytes() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[0x00, 0xff, 0x2f, 0x00, 0x00, 0x90, 60, 100]));
        let file = decode(&bytes).unwrap();
        assert!(file.channels[0].is_empty());
    }

    #[test]
    fn test_header_length_must_be_six() {
        let mut bytes = b"MThd".to_vec();
        bytes.extend([0, 0, 0, 8, 0, 0, 0, 1, 0, 96, 0, 0]);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MalformedHeader(_)));
        assert_eq!(err.position(), 0);
    }

    #[test]
    fn test_duplicate_header() {
        let mut bytes = header_chunk(0);
        bytes.extend(header_chunk(0));
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MalformedHeader(_)));
        assert_eq!(err.position(), 14);
    }

    #[test]
    fn test_negative_track_length() {
        let mut bytes = header_chunk(1);
        bytes.extend(b"MTrk");
        bytes.extend([0xff, 0xff, 0xff, 0xf0]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::MalformedTrack {
                declared: 0xffff_fff0,
                available: 0
            }
        );
    }

    #[test]
    fn test_track_length_past_end_of_input() {
        let mut bytes = header_chunk(1);
        bytes.extend(b"MTrk");
        bytes.extend([0, 0, 0, 10, 0x00, 0x90, 60]);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MalformedTrack { .. }));
    }

    #[test]
    fn test_event_cut_off_by_track_length() {
        let mut bytes = header_chunk(1);
        // Declared length ends in the middle of a note on
        bytes.extend(b"MTrk");
        bytes.extend([0, 0, 0, 3, 0x00, 0x90, 60, 100]);
        let err = decode(&bytes).unwrap_err();
        assert!(err.is_truncated());
        assert_eq!(err.position(), 25);
    }

    #[test]
    fn test_unrecognized_chunk() {
        let mut bytes = header_chunk(0);
        bytes.extend(b"RIFF");
        bytes.extend([0, 0, 0, 0]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::UnrecognizedChunk("RIFF".to_string())
        );
        assert_eq!(err.position(), 14);
    }

    #[test]
    fn test_empty_and_truncated_input() {
        assert!(decode(&[]).unwrap_err().is_truncated());
        assert!(decode(b"MTh").unwrap_err().is_truncated());
        assert!(decode(b"MThd\0\0\0\x06\0").unwrap_err().is_truncated());
    }

    #[test]
    fn test_summary_keeps_first_signatures() {
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[
            0x00, 0xff, 0x58, 0x02, 0x03, 0x02, //
            0x00, 0xff, 0x58, 0x02, 0x06, 0x03, //
            0x00, 0xff, 0x59, 0x02, 0x02, 0x00, //
            0x00, 0xff, 0x51, 0x03, 0x09, 0x27, 0xc0, //
            0x00, 0xff, 0x51, 0x03, 0x07, 0xa1, 0x20,
        ]));
        let summary = decode(&bytes).unwrap().summary;
        assert_eq!(summary.time_signature.unwrap().numerator, 3);
        assert_eq!(summary.key_signature.unwrap().sharps, 2);
        assert_eq!(summary.tempo, Some(500_000));
    }

    #[test]
    fn test_ticks_per_quarter() {
        let metrical = TrackHeader {
            format: 0,
            track_count: 1,
            division: 480,
        };
        assert_eq!(metrical.ticks_per_quarter(), Some(480));
        let smpte = TrackHeader {
            division: 0xe728,
            ..metrical
        };
        assert_eq!(smpte.ticks_per_quarter(), None);
    }

    #[test]
    fn test_known_meta_types_are_ignored() {
        // Sequence number, channel prefix, MIDI port, sequencer specific
        let cases: [&[u8]; 4] = [
            &[0x00, 0xff, 0x00, 0x02, 0x00, 0x07],
            &[0x00, 0xff, 0x20, 0x01, 0x03],
            &[0x00, 0xff, 0x21, 0x01, 0x00],
            &[0x00, 0xff, 0x7f, 0x03, 0x00, 0x00, 0x41],
        ];
        for bytes in cases {
            let event = decode_one(bytes).unwrap();
            assert_eq!(event, TrackEvent::Meta(MetaEvent::Ignored { meta_type: bytes[2] }));
        }

        // Ignored metas do not stop the track
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[
            0x00, 0xff, 0x21, 0x01, 0x00, //
            0x00, 0x90, 60, 100,
        ]));
        assert_eq!(decode(&bytes).unwrap().channels[0].len(), 1);
    }

    #[test]
    fn test_short_signatures_are_malformed() {
        let err = decode_one(&[0x00, 0xff, 0x59, 0x01, 0x02]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::MalformedMeta {
                meta_type: 0x59,
                size: 1
            }
        );
        assert_eq!(err.position(), 1);

        let err = decode_one(&[0x00, 0xff, 0x58, 0x01, 0x04]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::MalformedMeta {
                meta_type: 0x58,
                size: 1
            }
        );

        let err = decode_one(&[0x00, 0xff, 0x58, 0x00]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::MalformedMeta {
                meta_type: 0x58,
                size: 0
            }
        );
    }

    #[test]
    fn test_track_count_mismatch_is_not_fatal() {
        // The header announces three tracks, the file has one
        let mut bytes = header_chunk(3);
        bytes.extend(track_chunk(&[0x00, 0x90, 60, 100, 0x00, 0xff, 0x2f, 0x00]));
        let file = decode(&bytes).unwrap();
        assert_eq!(file.header.map(|h| h.track_count), Some(3));
        assert_eq!(file.summary.track_chunks, 1);
        assert_eq!(file.channels[0].len(), 1);

        // And the other way round
        let mut bytes = header_chunk(1);
        bytes.extend(track_chunk(&[0x00, 0xff, 0x2f, 0x00]));
        bytes.extend(track_chunk(&[0x00, 0xff, 0x2f, 0x00]));
        assert_eq!(decode(&bytes).unwrap().summary.track_chunks, 2);
    }
}

//! Standard MIDI File (SMF) import into a score document.
//!
//! Runs the whole pipeline: decode the file, pair note-on/note-off events,
//! quantize them to a tick grid, drop overlapping notes and write every
//! channel with notes as one voice of the document's first sheet.
//!
//! # Limitations
//!
//! - Ticks are taken as they are; the file's time division is not applied
//! - Every track starts its clock at 0, so tracks are not merged in time
//! - Overlapping notes in a channel are discarded, not turned into chords
//! - Program and control changes are counted and otherwise ignored
//! - Pitch bend, aftertouch and channel pressure abort the import

use super::combine::combine_events;
use super::decoder::{decode, FileSummary, TrackHeader};
use super::error::MidiImportError;
use super::overlap::{resolve_overlaps, OverlapPolicy};
use super::quantize::quantize_events;
use super::{DEFAULT_MAX_DOTS, DEFAULT_QUANTIZATION_UNIT};
use crate::score::{BuildSummary, Document, ScoreBuilder, Spelling, MIN_LENGTH_TICKS};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Settings of one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Grid in ticks that note starts and lengths are rounded to.
    pub quantization_unit: u32,
    /// Most dots on a single written length.
    pub max_dots: u8,
    pub overlap_policy: OverlapPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            quantization_unit: DEFAULT_QUANTIZATION_UNIT,
            max_dots: DEFAULT_MAX_DOTS,
            overlap_policy: OverlapPolicy::Discard,
        }
    }
}

impl ImportOptions {
    /// Checks that every quantized duration will be writable.
    ///
    /// # Errors
    ///
    /// Returns [`MidiImportError::InvalidOptions`] unless the quantization
    /// unit is a positive multiple of a 128th note.
    pub fn validate(&self) -> Result<(), MidiImportError> {
        if self.quantization_unit == 0 || self.quantization_unit % MIN_LENGTH_TICKS != 0 {
            return Err(MidiImportError::InvalidOptions(format!(
                "quantization unit {} is not a positive multiple of {MIN_LENGTH_TICKS}",
                self.quantization_unit
            )));
        }
        Ok(())
    }
}

/// Counts of what the import kept, dropped and wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Note events decoded from the file (note-ons and note-offs).
    pub events_decoded: usize,
    /// Note starts without a matching note-off.
    pub unmatched_notes: usize,
    /// Notes whose length rounded to zero.
    pub lost_to_quantization: usize,
    /// Notes dropped because they overlapped an earlier one.
    pub discarded_overlaps: usize,
    /// Channels that contributed at least one note.
    pub channels_used: usize,
    /// What the score builder wrote.
    pub build: BuildSummary,
}

impl ImportStats {
    /// Notes that were in the file but are not in the score.
    pub fn notes_dropped(&self) -> usize {
        self.unmatched_notes + self.lost_to_quantization + self.discarded_overlaps
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Index of the sheet that was written.
    pub sheet_index: usize,
    /// The `MThd` contents, if the file had one.
    pub header: Option<TrackHeader>,
    pub summary: FileSummary,
    pub stats: ImportStats,
}

/// Imports Standard MIDI Files with fixed options.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidiImport {
    options: ImportOptions,
}

impl MidiImport {
    /// Creates an importer.
    ///
    /// # Errors
    ///
    /// Returns error if the options fail [`ImportOptions::validate`].
    pub fn new(options: ImportOptions) -> Result<Self, MidiImportError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Imports `bytes` into the first sheet of `document`.
    ///
    /// The sheet is created when the document has none. Nothing in the
    /// document changes unless the import succeeds.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Contents of a Standard MIDI File
    /// * `document` - Document receiving the notes
    ///
    /// # Errors
    ///
    /// Returns the first decoding failure, with its byte offset, or a
    /// [`BuildError`](crate::score::BuildError) if the notes do not fit a
    /// score (a voice would end past `u32::MAX` ticks).
    pub fn import_sheet(
        &self,
        bytes: &[u8],
        document: &mut Document,
    ) -> Result<ImportReport, MidiImportError> {
        let mut file = decode(bytes)?;

        let mut stats = ImportStats {
            events_decoded: file.event_count(),
            ..ImportStats::default()
        };
        for channel in file.channels.iter_mut().filter(|c| !c.is_empty()) {
            let events = channel.events_mut();
            stats.unmatched_notes += combine_events(events);
            let lost = quantize_events(events, self.options.quantization_unit);
            if lost > 0 {
                warn!(
                    channel = channel.channel,
                    lost,
                    unit = self.options.quantization_unit,
                    "notes too short for the quantization grid"
                );
            }
            stats.lost_to_quantization += lost;
            stats.discarded_overlaps +=
                resolve_overlaps(channel.events_mut(), self.options.overlap_policy);
            if channel.sounding_count() > 0 {
                stats.channels_used += 1;
            }
        }
        if stats.unmatched_notes > 0 {
            warn!(count = stats.unmatched_notes, "dropped notes without a note-off");
        }
        if stats.discarded_overlaps > 0 {
            warn!(count = stats.discarded_overlaps, "dropped overlapping notes");
        }

        let spelling = file
            .summary
            .key_signature
            .map_or(Spelling::Sharps, |key| Spelling::for_key(key.sharps));
        let builder = ScoreBuilder::new(self.options.max_dots, spelling);

        let created_sheet = document.sheets.is_empty();
        let (sheet_index, sheet) = document.first_sheet_or_insert();
        stats.build = match builder.write_channels(&file.channels, sheet) {
            Ok(build) => build,
            Err(err) => {
                if created_sheet {
                    document.sheets.clear();
                }
                return Err(err.into());
            }
        };

        info!(
            sheet = sheet_index,
            staffs = stats.build.staffs_written,
            notes = stats.build.notes_written,
            rests = stats.build.rests_written,
            dropped = stats.notes_dropped(),
            "MIDI import finished"
        );

        Ok(ImportReport {
            sheet_index,
            header: file.header,
            summary: file.summary,
            stats,
        })
    }
}

/// Imports a MIDI file into a new document.
///
/// The document is titled after the file name without its extension.
///
/// # Arguments
///
/// * `path` - Path to the .mid or .midi file
/// * `options` - Quantization and notation settings
///
/// # Returns
///
/// The document and the report of the import
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn import_from_midi<P: AsRef<Path>>(
    path: P,
    options: ImportOptions,
) -> Result<(Document, ImportReport), MidiImportError> {
    let path = path.as_ref();
    let importer = MidiImport::new(options)?;
    let data = fs::read(path)?;

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Imported MIDI");
    let mut document = Document::new(title);
    let report = importer.import_sheet(&data, &mut document)?;
    Ok((document, report))
}

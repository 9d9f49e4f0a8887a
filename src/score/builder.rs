//! Writing of quantized channel events into the staffs of a sheet.
//!
//! Each channel with at least one sounding note becomes one voice. The
//! channel's notes are visited in start order; gaps between them become
//! rests and every note is written as one or more tied notes whose lengths
//! add up to its quantized duration.

use super::length::{PlayableLength, UnrepresentableLength};
use super::note::{Element, Note, Rest, Spelling};
use super::staff::Staff;
use super::Sheet;
use crate::midi::note::ChannelEvents;
use crate::midi::DEFAULT_MAX_DOTS;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a channel could not be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A note or gap length no note lengths add up to.
    #[error(transparent)]
    Unrepresentable(#[from] UnrepresentableLength),
    /// The channel's notes would end after the last tick a voice can hold.
    #[error("channel {channel} would end at tick {end}, past the last score tick")]
    TooLong {
        /// MIDI channel (0-15).
        channel: u8,
        /// End tick the voice would reach.
        end: u64,
    },
}

/// What the builder added to a sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Staffs that received elements.
    pub staffs_written: usize,
    /// Staffs that had to be added to the sheet.
    pub staffs_created: usize,
    pub notes_written: usize,
    pub rests_written: usize,
    /// Notes that needed more than one element, written as a tied chain.
    pub tied_notes: usize,
    /// Notes starting before the previous note ended, left out.
    pub skipped_overlaps: usize,
}

/// Converts channel event lists into staff contents.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBuilder {
    /// Most dots on a single written length.
    pub max_dots: u8,
    /// Accidental spelling of black keys.
    pub spelling: Spelling,
}

impl Default for ScoreBuilder {
    fn default() -> Self {
        Self {
            max_dots: DEFAULT_MAX_DOTS,
            spelling: Spelling::Sharps,
        }
    }
}

/// The elements planned for one channel.
struct ChannelPlan {
    channel: u8,
    elements: Vec<Element>,
    /// Ticks covered by `elements`.
    length: u64,
}

impl ScoreBuilder {
    pub fn new(max_dots: u8, spelling: Spelling) -> Self {
        Self { max_dots, spelling }
    }

    /// Writes every channel that has sounding notes into `sheet`.
    ///
    /// Channels are assigned to staffs in channel order: the n-th channel
    /// with notes goes to the sheet's n-th staff if there is one, otherwise
    /// a new staff is appended. Elements go to the staff's first voice,
    /// after anything it already holds.
    ///
    /// # Errors
    ///
    /// Fails if a note or gap length is not writable, or if a voice would
    /// extend past `u32::MAX` ticks. The sheet is only modified once every
    /// channel has been converted, so on error it is left untouched.
    pub fn write_channels(
        &self,
        channels: &[ChannelEvents],
        sheet: &mut Sheet,
    ) -> Result<BuildSummary, BuildError> {
        let mut summary = BuildSummary::default();
        let mut plans = Vec::new();
        for events in channels {
            if let Some(plan) = self.plan_channel(events, &mut summary)? {
                plans.push(plan);
            }
        }

        for (staff_index, plan) in plans.iter().enumerate() {
            let offset = sheet
                .staffs
                .get(staff_index)
                .and_then(|staff| staff.voices.first())
                .map_or(0, |voice| voice.time_end());
            check_end(plan.channel, offset as u64 + plan.length)?;
        }

        for (staff_index, plan) in plans.into_iter().enumerate() {
            if staff_index >= sheet.staffs.len() {
                sheet.staffs.push(Staff::new(format!("Channel {}", plan.channel + 1)));
                summary.staffs_created += 1;
            }
            let voice = sheet.staffs[staff_index].voice_or_insert();
            let offset = voice.time_end();
            for element in plan.elements {
                voice.append(element);
            }
            debug!(
                channel = plan.channel,
                staff_index,
                offset,
                end = voice.time_end(),
                "wrote channel"
            );
            summary.staffs_written += 1;
        }
        Ok(summary)
    }

    fn plan_channel(
        &self,
        events: &ChannelEvents,
        summary: &mut BuildSummary,
    ) -> Result<Option<ChannelPlan>, BuildError> {
        let notes = events.sounding_in_time_order();
        if notes.is_empty() {
            return Ok(None);
        }

        let mut elements = Vec::new();
        let mut cursor: u64 = 0;
        for event in notes {
            let Some(pitch) = event.midi_pitch() else {
                continue;
            };
            let start = event.start_time as u64;
            let end = start + event.length as u64;
            check_end(events.channel, end)?;
            if start < cursor {
                warn!(
                    channel = events.channel,
                    pitch,
                    start = event.start_time,
                    "note overlaps the previous one, skipping"
                );
                summary.skipped_overlaps += 1;
                continue;
            }

            if start > cursor {
                // Both are at most u32::MAX after the check above
                let gap = (start - cursor) as u32;
                for length in PlayableLength::decompose(gap, self.max_dots)? {
                    elements.push(Rest::new(length).into());
                    summary.rests_written += 1;
                }
            }

            let lengths = PlayableLength::decompose(event.length, self.max_dots)?;
            let last = lengths.len() - 1;
            if last > 0 {
                summary.tied_notes += 1;
            }
            for (i, length) in lengths.into_iter().enumerate() {
                let note = Note::new(pitch, self.spelling, length).with_ties(i < last, i > 0);
                elements.push(note.into());
                summary.notes_written += 1;
            }
            cursor = end;
        }

        Ok(Some(ChannelPlan {
            channel: events.channel,
            elements,
            length: cursor,
        }))
    }
}

fn check_end(channel: u8, end: u64) -> Result<(), BuildError> {
    if end > u32::MAX as u64 {
        return Err(BuildError::TooLong { channel, end });
    }
    Ok(())
}

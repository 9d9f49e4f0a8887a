//! Removal of notes that overlap in time within one channel.
//!
//! A channel becomes a single voice, and a voice cannot hold two notes at
//! once. Overlapping notes are not merged into chords and not moved to
//! another voice; they are discarded.

use super::note::RawEvent;
use serde::{Deserialize, Serialize};

/// What to do with a note that starts before the previous one ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapPolicy {
    /// Drop the later note.
    #[default]
    Discard,
}

/// Resolves overlaps between the sounding notes of one channel.
///
/// Notes are visited in start order. Each surviving note invalidates every
/// later note that starts before it ends; a discarded note never causes
/// further discards.
///
/// # Returns
///
/// The number of discarded notes.
pub fn resolve_overlaps(events: &mut [RawEvent], policy: OverlapPolicy) -> usize {
    let mut order: Vec<usize> = (0..events.len())
        .filter(|&i| events[i].is_sounding())
        .collect();
    order.sort_by_key(|&i| events[i].start_time);

    let mut discarded = 0;
    for (k, &i) in order.iter().enumerate() {
        if !events[i].is_sounding() {
            continue;
        }
        let (start, end) = (events[i].start_time, events[i].end_time());
        for &j in &order[k + 1..] {
            if !events[j].is_sounding() {
                continue;
            }
            // Later notes start no earlier, so the first miss ends the run
            if !events[j].overlaps_range(start, end) {
                break;
            }
            match policy {
                OverlapPolicy::Discard => events[j].invalidate(),
            }
            discarded += 1;
        }
    }
    discarded
}

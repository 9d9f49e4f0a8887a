//! Pairing of note-on and note-off events into notes with a length.

use super::note::RawEvent;

/// Combines note-on/note-off pairs of one channel into notes.
///
/// Every note start is paired with the first later event of the same pitch
/// that ends a note (a note-off, or a note-on with velocity 0). The start
/// gets the distance as its length and the terminator is invalidated, so it
/// can never end a second note. Note starts left without a length afterwards
/// are invalidated as well: a note that never ends is dropped rather than
/// given a made-up length.
///
/// # Returns
///
/// The number of note starts that were dropped.
pub fn combine_events(events: &mut [RawEvent]) -> usize {
    for i in 0..events.len() {
        if !events[i].is_note_start() {
            continue;
        }
        let pitch = events[i].pitch;
        let Some(j) = (i + 1..events.len()).find(|&j| events[j].terminates(pitch)) else {
            continue;
        };
        // Only a terminator from a later-starting track can lie before the start
        events[i].length = events[j].start_time.saturating_sub(events[i].start_time);
        events[j].invalidate();
    }

    let mut unmatched = 0;
    for event in events.iter_mut().filter(|e| e.on && e.length == 0) {
        if event.is_note_start() {
            unmatched += 1;
        }
        event.invalidate();
    }
    unmatched
}

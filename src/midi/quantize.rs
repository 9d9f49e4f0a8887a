//! Snapping of note times and lengths to a fixed tick grid.

use super::note::RawEvent;

/// Rounds `ticks` to the nearest multiple of `unit`, halves rounding up.
///
/// # Examples
///
/// ```
/// use midiscore::midi::round_to_grid;
///
/// assert_eq!(round_to_grid(47, 32), 32);
/// assert_eq!(round_to_grid(48, 32), 64);
/// ```
pub fn round_to_grid(ticks: u32, unit: u32) -> u32 {
    if unit == 0 {
        return ticks;
    }
    let unit = unit as u64;
    let rounded = (ticks as u64 + unit / 2) / unit * unit;
    let last_on_grid = u32::MAX as u64 / unit * unit;
    rounded.min(last_on_grid) as u32
}

/// Quantizes the start and length of every note in one channel.
///
/// The shift applied to each value is kept in the event's correction
/// fields. A note whose length rounds to zero is invalidated: it is too short
/// for the grid and dropping it is preferred over a note without duration.
///
/// # Returns
///
/// The number of notes lost to rounding.
pub fn quantize_events(events: &mut [RawEvent], unit: u32) -> usize {
    let mut lost = 0;
    for event in events.iter_mut() {
        event.time_correction = 0;
        event.length_correction = 0;
        if !event.on || event.pitch <= 0 {
            continue;
        }

        let start = round_to_grid(event.start_time, unit);
        event.time_correction = correction(event.start_time, start);
        event.start_time = start;

        let length = round_to_grid(event.length, unit);
        event.length_correction = correction(event.length, length);
        event.length = length;

        if length == 0 {
            event.invalidate();
            lost += 1;
        }
    }
    lost
}

fn correction(before: u32, after: u32) -> i32 {
    (after as i64 - before as i64) as i32
}

//! Raw note events as decoded from a MIDI file.
//!
//! A [`RawEvent`] starts life as a single note-on or note-off message. The
//! import passes then rewrite it in place: the combiner gives note-ons a
//! length and consumes their matching note-offs, the quantizer snaps times
//! to a grid, and the overlap resolver drops notes that collide. Events are
//! never removed from their [`ChannelEvents`] list, only invalidated.

use super::CHANNEL_COUNT;

/// Pitch value marking an event as consumed or dropped.
pub const INVALID_PITCH: i16 = -1;

/// A note-on or note-off event and, once combined, a whole note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Note-on (true) or note-off (false). Cleared when invalidated.
    pub on: bool,

    /// MIDI channel (0-15).
    pub channel: u8,

    /// MIDI note number, or [`INVALID_PITCH`] once invalidated.
    pub pitch: i16,

    /// Note velocity (0-127). A note-on with velocity 0 acts as a note-off.
    pub velocity: u8,

    /// Start time in ticks from the beginning of the track.
    pub start_time: u32,

    /// Length in ticks; 0 until the combiner pairs the event.
    pub length: u32,

    /// Shift applied to `start_time` by quantization.
    pub time_correction: i32,

    /// Shift applied to `length` by quantization.
    pub length_correction: i32,
}

impl RawEvent {
    /// Creates an event as read from the file.
    pub fn new(on: bool, channel: u8, pitch: u8, velocity: u8, start_time: u32) -> Self {
        Self {
            on,
            channel: channel.min(CHANNEL_COUNT as u8 - 1),
            pitch: pitch as i16,
            velocity,
            start_time,
            length: 0,
            time_correction: 0,
            length_correction: 0,
        }
    }

    /// Shorthand for a note-on event.
    pub fn note_on(channel: u8, pitch: u8, velocity: u8, start_time: u32) -> Self {
        Self::new(true, channel, pitch, velocity, start_time)
    }

    /// Shorthand for a note-off event.
    pub fn note_off(channel: u8, pitch: u8, velocity: u8, start_time: u32) -> Self {
        Self::new(false, channel, pitch, velocity, start_time)
    }

    /// Returns the end tick of this note (start + length).
    pub fn end_time(&self) -> u32 {
        self.start_time.saturating_add(self.length)
    }

    /// True for a note-on that begins a sounding note.
    ///
    /// Pitch 0 never starts a note; it is dropped with the unmatched events.
    pub fn is_note_start(&self) -> bool {
        self.on && self.pitch > 0 && self.velocity > 0
    }

    /// True for a note start that has been given a length.
    pub fn is_sounding(&self) -> bool {
        self.is_note_start() && self.length > 0
    }

    /// True if this event ends a note of `pitch`: an explicit note-off, or
    /// a note-on with velocity 0.
    pub fn terminates(&self, pitch: i16) -> bool {
        self.pitch == pitch && (!self.on || self.velocity == 0)
    }

    /// Marks the event as consumed so that no later pass considers it.
    pub fn invalidate(&mut self) {
        self.on = false;
        self.pitch = INVALID_PITCH;
    }

    /// MIDI note number of a valid event.
    pub fn midi_pitch(&self) -> Option<u8> {
        u8::try_from(self.pitch).ok()
    }

    /// Checks if this note overlaps with a given tick range.
    ///
    /// # Arguments
    ///
    /// * `start` - Start of the range (inclusive)
    /// * `end` - End of the range (exclusive)
    pub fn overlaps_range(&self, start: u32, end: u32) -> bool {
        self.start_time < end && self.end_time() > start
    }
}

/// All events of one MIDI channel in file order.
#[derive(Debug, Clone, Default)]
pub struct ChannelEvents {
    /// MIDI channel (0-15).
    pub channel: u8,

    events: Vec<RawEvent>,
}

impl ChannelEvents {
    /// Creates an empty list for `channel`.
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            events: Vec::new(),
        }
    }

    /// Appends an event in file order.
    pub fn push(&mut self, event: RawEvent) {
        self.events.push(event);
    }

    /// Returns all events, including invalidated ones.
    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    /// Returns mutable access to all events.
    pub fn events_mut(&mut self) -> &mut [RawEvent] {
        &mut self.events
    }

    /// Returns the number of events in the list.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the channel received no events at all.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the sounding notes ordered by start time.
    ///
    /// Tracks restart their clock at 0, so file order is not time order when
    /// several tracks feed one channel. The sort is stable: notes with equal
    /// start keep their file order.
    pub fn sounding_in_time_order(&self) -> Vec<&RawEvent> {
        let mut notes: Vec<&RawEvent> = self.events.iter().filter(|e| e.is_sounding()).collect();
        notes.sort_by_key(|e| e.start_time);
        notes
    }

    /// Returns the number of sounding notes.
    pub fn sounding_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_sounding()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = RawEvent::note_on(3, 60, 100, 480);
        assert!(event.on);
        assert_eq!(event.channel, 3);
        assert_eq!(event.pitch, 60);
        assert_eq!(event.start_time, 480);
        assert_eq!(event.length, 0);
        assert!(event.is_note_start());
        assert!(!event.is_sounding());
    }

    #[test]
    fn test_terminators() {
        let off = RawEvent::note_off(0, 60, 64, 100);
        let silent_on = RawEvent::note_on(0, 60, 0, 100);
        let loud_on = RawEvent::note_on(0, 60, 90, 100);
        assert!(off.terminates(60));
        assert!(silent_on.terminates(60));
        assert!(!loud_on.terminates(60));
        assert!(!off.terminates(62));
        assert!(!silent_on.is_note_start());
    }

    #[test]
    fn test_pitch_zero_never_starts_a_note() {
        let event = RawEvent::note_on(0, 0, 100, 0);
        assert!(!event.is_note_start());
    }

    #[test]
    fn test_invalidate() {
        let mut event = RawEvent::note_on(0, 60, 100, 0);
        event.length = 96;
        event.invalidate();
        assert!(!event.on);
        assert_eq!(event.pitch, INVALID_PITCH);
        assert_eq!(event.midi_pitch(), None);
        assert!(!event.is_sounding());
    }

    #[test]
    fn test_event_overlap() {
        let mut event = RawEvent::note_on(0, 60, 100, 100);
        event.length = 200; // 100-300
        assert!(event.overlaps_range(0, 150));
        assert!(event.overlaps_range(200, 400));
        assert!(!event.overlaps_range(0, 100));
        assert!(!event.overlaps_range(300, 400));
    }

    #[test]
    fn test_sounding_in_time_order_is_stable() {
        let mut list = ChannelEvents::new(0);
        for (pitch, start) in [(64, 480), (60, 0), (62, 0)] {
            let mut event = RawEvent::note_on(0, pitch, 100, start);
            event.length = 96;
            list.push(event);
        }
        list.push(RawEvent::note_off(0, 60, 0, 96));

        let ordered: Vec<i16> = list
            .sounding_in_time_order()
            .iter()
            .map(|e| e.pitch)
            .collect();
        assert_eq!(ordered, vec![60, 62, 64]);
        assert_eq!(list.sounding_count(), 3);
        assert_eq!(list.len(), 4);
    }
}

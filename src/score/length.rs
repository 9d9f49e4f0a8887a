//! Canonical note lengths and the decomposition of tick durations into them.
//!
//! Score time is measured in the same ticks as the quantized MIDI events.
//! A whole note lasts [`WHOLE_NOTE_TICKS`]; every shorter length halves it
//! down to the 128th note, the shortest writable value.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Ticks in a whole note.
pub const WHOLE_NOTE_TICKS: u32 = 1024;

/// Ticks in a 128th note. Every writable duration is a multiple of this.
pub const MIN_LENGTH_TICKS: u32 = WHOLE_NOTE_TICKS / 128;

/// Undotted note values, longest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MusicLength {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    HundredTwentyEighth,
}

impl MusicLength {
    /// Returns the duration in ticks.
    pub fn ticks(self) -> u32 {
        WHOLE_NOTE_TICKS / self.denominator()
    }

    /// The note value as a fraction of a whole (4 for a quarter).
    pub fn denominator(self) -> u32 {
        match self {
            MusicLength::Whole => 1,
            MusicLength::Half => 2,
            MusicLength::Quarter => 4,
            MusicLength::Eighth => 8,
            MusicLength::Sixteenth => 16,
            MusicLength::ThirtySecond => 32,
            MusicLength::SixtyFourth => 64,
            MusicLength::HundredTwentyEighth => 128,
        }
    }

    /// The next shorter value, or None for a 128th.
    pub fn halved(self) -> Option<Self> {
        Some(match self {
            MusicLength::Whole => MusicLength::Half,
            MusicLength::Half => MusicLength::Quarter,
            MusicLength::Quarter => MusicLength::Eighth,
            MusicLength::Eighth => MusicLength::Sixteenth,
            MusicLength::Sixteenth => MusicLength::ThirtySecond,
            MusicLength::ThirtySecond => MusicLength::SixtyFourth,
            MusicLength::SixtyFourth => MusicLength::HundredTwentyEighth,
            MusicLength::HundredTwentyEighth => return None,
        })
    }

    /// Most dots this value can carry while every dot stays at least a 128th.
    pub fn dot_limit(self) -> u8 {
        (self.ticks() / MIN_LENGTH_TICKS).trailing_zeros() as u8
    }
}

/// A note value with its dots, e.g. a dotted quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayableLength {
    pub music_length: MusicLength,
    pub dots: u8,
}

/// A duration that no sequence of note lengths adds up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{ticks} ticks cannot be written with note lengths (not a positive multiple of a 128th)")]
pub struct UnrepresentableLength {
    pub ticks: u32,
}

impl PlayableLength {
    /// Creates a length with `dots` dots.
    pub fn new(music_length: MusicLength, dots: u8) -> Self {
        Self { music_length, dots }
    }

    /// Creates an undotted length.
    pub fn plain(music_length: MusicLength) -> Self {
        Self::new(music_length, 0)
    }

    /// Returns the duration in ticks: each dot adds half the previous part.
    pub fn ticks(&self) -> u32 {
        let base = self.music_length.ticks();
        (0..=self.dots as u32).map(|d| base >> d).sum()
    }

    /// Decomposes `ticks` into note lengths whose durations sum to it.
    ///
    /// Greedy, longest first: starting from the whole note, take the current
    /// value with as many dots (up to `max_dots`) as still fit; when not even
    /// the undotted value fits, move on to the next shorter value. Durations
    /// above a whole note become a run of whole-note-based lengths.
    ///
    /// # Errors
    ///
    /// Fails for 0 and for durations that are not a multiple of a 128th.
    ///
    /// # Examples
    ///
    /// ```
    /// use midiscore::score::{MusicLength, PlayableLength};
    ///
    /// // A quarter with three dots: 256 + 128 + 64 + 32
    /// let lengths = PlayableLength::decompose(480, 4).unwrap();
    /// assert_eq!(lengths, vec![PlayableLength::new(MusicLength::Quarter, 3)]);
    /// ```
    pub fn decompose(ticks: u32, max_dots: u8) -> Result<Vec<Self>, UnrepresentableLength> {
        if ticks == 0 || ticks % MIN_LENGTH_TICKS != 0 {
            return Err(UnrepresentableLength { ticks });
        }

        let mut lengths = Vec::new();
        let mut remaining = ticks;
        let mut value = MusicLength::Whole;
        while remaining > 0 {
            match Self::largest_fit(value, remaining, max_dots) {
                Some(length) => {
                    remaining -= length.ticks();
                    lengths.push(length);
                }
                // A 128th always fits a non-zero multiple of itself
                None => value = value.halved().ok_or(UnrepresentableLength { ticks })?,
            }
        }
        Ok(lengths)
    }

    /// The `value` with the most dots that is not longer than `ticks`.
    fn largest_fit(value: MusicLength, ticks: u32, max_dots: u8) -> Option<Self> {
        let dots = max_dots.min(value.dot_limit());
        (0..=dots)
            .rev()
            .map(|d| Self::new(value, d))
            .find(|length| length.ticks() <= ticks)
    }
}

impl fmt::Display for PlayableLength {
    /// Writes the length as its denominator followed by dots, e.g. `4..`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.music_length.denominator())?;
        for _ in 0..self.dots {
            f.write_str(".")?;
        }
        Ok(())
    }
}

/// Sum of the tick durations of `lengths`.
pub fn total_ticks(lengths: &[PlayableLength]) -> u32 {
    lengths.iter().map(|l| l.ticks()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use MusicLength::*;

    #[test]
    fn test_music_length_ticks() {
        assert_eq!(Whole.ticks(), 1024);
        assert_eq!(Quarter.ticks(), 256);
        assert_eq!(ThirtySecond.ticks(), 32);
        assert_eq!(HundredTwentyEighth.ticks(), MIN_LENGTH_TICKS);
        assert_eq!(HundredTwentyEighth.halved(), None);
    }

    #[test]
    fn test_dotted_ticks() {
        assert_eq!(PlayableLength::new(Quarter, 1).ticks(), 384);
        assert_eq!(PlayableLength::new(Quarter, 3).ticks(), 480);
        assert_eq!(PlayableLength::new(Whole, 4).ticks(), 1984);
    }

    #[test]
    fn test_dot_limit() {
        assert_eq!(Whole.dot_limit(), 7);
        assert_eq!(ThirtySecond.dot_limit(), 2);
        assert_eq!(HundredTwentyEighth.dot_limit(), 0);
    }

    #[test]
    fn test_single_element_decompositions() {
        assert_eq!(
            PlayableLength::decompose(1024, 4).unwrap(),
            vec![PlayableLength::plain(Whole)]
        );
        assert_eq!(
            PlayableLength::decompose(384, 4).unwrap(),
            vec![PlayableLength::new(Quarter, 1)]
        );
        assert_eq!(
            PlayableLength::decompose(8, 4).unwrap(),
            vec![PlayableLength::plain(HundredTwentyEighth)]
        );
    }

    #[test]
    fn test_greedy_decompositions() {
        assert_eq!(
            PlayableLength::decompose(40, 4).unwrap(),
            vec![PlayableLength::plain(ThirtySecond), PlayableLength::plain(HundredTwentyEighth)]
        );
        assert_eq!(
            PlayableLength::decompose(2048, 4).unwrap(),
            vec![PlayableLength::new(Whole, 4), PlayableLength::plain(Sixteenth)]
        );
        // Without dots a dotted half becomes a half and a quarter
        assert_eq!(
            PlayableLength::decompose(768, 0).unwrap(),
            vec![PlayableLength::plain(Half), PlayableLength::plain(Quarter)]
        );
    }

    #[test]
    fn test_decomposition_sums() {
        for ticks in (MIN_LENGTH_TICKS..=8 * WHOLE_NOTE_TICKS).step_by(MIN_LENGTH_TICKS as usize) {
            for max_dots in [0, 1, 4] {
                let lengths = PlayableLength::decompose(ticks, max_dots).unwrap();
                assert_eq!(total_ticks(&lengths), ticks, "ticks {ticks}, dots {max_dots}");
                assert!(lengths.iter().all(|l| l.dots <= max_dots));
                // Longest first
                assert!(lengths.windows(2).all(|w| w[0].ticks() >= w[1].ticks()));
            }
        }
    }

    #[test]
    fn test_unrepresentable() {
        assert_eq!(PlayableLength::decompose(0, 4), Err(UnrepresentableLength { ticks: 0 }));
        assert_eq!(PlayableLength::decompose(12, 4), Err(UnrepresentableLength { ticks: 12 }));
    }

    #[test]
    fn test_display() {
        assert_eq!(PlayableLength::new(Quarter, 2).to_string(), "4..");
        assert_eq!(PlayableLength::plain(Whole).to_string(), "1");
    }
}

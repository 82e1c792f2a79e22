//! Weekly meeting-time models.
//!
//! A section meets in one or more weekly blocks. Each block is a half-open
//! minute interval `[start_minute, end_minute)` on a single day of the week.
//!
//! # Time Model
//! Minutes are counted from midnight of the block's day. A well-formed block
//! satisfies `start_minute < end_minute <= 1440`; blocks never wrap past
//! midnight. Malformed blocks are rejected by catalog validation, never
//! here, so the types stay plain data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minutes in one day. A block may end exactly at midnight but not past it.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    /// All days, Monday first.
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    /// Parses a registrar day letter (`M T W R F S U`).
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'M' => Some(Day::Mon),
            'T' => Some(Day::Tue),
            'W' => Some(Day::Wed),
            'R' => Some(Day::Thu),
            'F' => Some(Day::Fri),
            'S' => Some(Day::Sat),
            'U' => Some(Day::Sun),
            _ => None,
        }
    }

    /// Registrar day letter.
    pub fn letter(self) -> char {
        match self {
            Day::Mon => 'M',
            Day::Tue => 'T',
            Day::Wed => 'W',
            Day::Thu => 'R',
            Day::Fri => 'F',
            Day::Sat => 'S',
            Day::Sun => 'U',
        }
    }
}

/// One weekly meeting: a day plus a half-open minute interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeetingBlock {
    /// Day of the week.
    pub day: Day,
    /// Start minute after midnight (inclusive).
    pub start_minute: u16,
    /// End minute after midnight (exclusive).
    pub end_minute: u16,
}

impl MeetingBlock {
    /// Creates a block from minutes after midnight.
    pub fn new(day: Day, start_minute: u16, end_minute: u16) -> Self {
        Self {
            day,
            start_minute,
            end_minute,
        }
    }

    /// Creates a block from wall-clock hours and minutes.
    ///
    /// ```
    /// use u_courseplan::models::{Day, MeetingBlock};
    ///
    /// let b = MeetingBlock::at(Day::Tue, (10, 0), (11, 15));
    /// assert_eq!(b.start_minute, 600);
    /// assert_eq!(b.duration_minutes(), 75);
    /// ```
    pub fn at(day: Day, start: (u16, u16), end: (u16, u16)) -> Self {
        Self::new(day, start.0 * 60 + start.1, end.0 * 60 + end.1)
    }

    /// Length of the block in minutes (zero for malformed blocks).
    #[inline]
    pub fn duration_minutes(&self) -> u16 {
        self.end_minute.saturating_sub(self.start_minute)
    }

    /// Whether the block is non-empty and stays within its day.
    pub fn is_well_formed(&self) -> bool {
        self.start_minute < self.end_minute && self.end_minute <= MINUTES_PER_DAY
    }

    /// Whether two blocks share a day and overlap in time.
    ///
    /// Touching endpoints (one ends exactly when the other starts) do not
    /// overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day == other.day
            && self.start_minute < other.end_minute
            && other.start_minute < self.end_minute
    }
}

impl fmt::Display for MeetingBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}-{:02}:{:02}",
            self.day.letter(),
            self.start_minute / 60,
            self.start_minute % 60,
            self.end_minute / 60,
            self.end_minute % 60
        )
    }
}

//! Section (offered instance) model.
//!
//! A section is one scheduled offering of a course: a set of weekly
//! meeting blocks, a unit value, seat availability, and general-education
//! tags. A section may override its course's prerequisite expression.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Day, MeetingBlock, PrereqExpr, Units};

/// An offered section of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Course this section belongs to.
    pub course_code: String,
    /// Identifier unique within the term (e.g. a CRN).
    pub section_id: String,
    /// Credit units.
    pub units: Units,
    /// Weekly meeting blocks, ordered by day then start.
    #[serde(default)]
    pub meeting_blocks: Vec<MeetingBlock>,
    /// Open seats. Zero means waitlist-only.
    #[serde(default)]
    pub seats_available: u32,
    /// Enrolment capacity, when known.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Primary instructor, when known.
    #[serde(default)]
    pub instructor: Option<String>,
    /// General-education category labels.
    #[serde(default)]
    pub ge_tags: BTreeSet<String>,
    /// Section-specific prerequisite. `None` inherits the course's.
    #[serde(default)]
    pub prerequisite_override: Option<PrereqExpr>,
}

impl Section {
    /// Creates a section with no meetings and no open seats.
    pub fn new(course_code: impl Into<String>, section_id: impl Into<String>, units: Units) -> Self {
        Self {
            course_code: course_code.into(),
            section_id: section_id.into(),
            units,
            meeting_blocks: Vec::new(),
            seats_available: 0,
            capacity: None,
            instructor: None,
            ge_tags: BTreeSet::new(),
            prerequisite_override: None,
        }
    }

    /// Adds a meeting block, keeping blocks ordered.
    pub fn with_block(mut self, block: MeetingBlock) -> Self {
        self.meeting_blocks.push(block);
        self.meeting_blocks.sort();
        self
    }

    /// Adds the same time slot on each of `days`.
    ///
    /// ```
    /// use u_courseplan::models::{Day, Section, Units};
    ///
    /// let s = Section::new("CS010", "001", Units::whole(4))
    ///     .meeting_on(&[Day::Mon, Day::Wed, Day::Fri], (8, 0), (8, 50));
    /// assert_eq!(s.meeting_blocks.len(), 3);
    /// assert_eq!(s.earliest_start(), Some(480));
    /// ```
    pub fn meeting_on(mut self, days: &[Day], start: (u16, u16), end: (u16, u16)) -> Self {
        for &day in days {
            self.meeting_blocks.push(MeetingBlock::at(day, start, end));
        }
        self.meeting_blocks.sort();
        self
    }

    /// Sets open seats.
    pub fn with_seats(mut self, seats: u32) -> Self {
        self.seats_available = seats;
        self
    }

    /// Sets enrolment capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the instructor.
    pub fn with_instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = Some(instructor.into());
        self
    }

    /// Adds a general-education tag.
    pub fn with_ge_tag(mut self, tag: impl Into<String>) -> Self {
        self.ge_tags.insert(tag.into());
        self
    }

    /// Overrides the course prerequisite for this section.
    pub fn with_prerequisite_override(mut self, expr: PrereqExpr) -> Self {
        self.prerequisite_override = Some(expr);
        self
    }

    /// Earliest start minute across all blocks (`None` if no meetings).
    pub fn earliest_start(&self) -> Option<u16> {
        self.meeting_blocks.iter().map(|b| b.start_minute).min()
    }

    /// Whether any block falls on `day`.
    pub fn meets_on(&self, day: Day) -> bool {
        self.meeting_blocks.iter().any(|b| b.day == day)
    }

    /// Whether the section has no open seats.
    pub fn is_waitlist_only(&self) -> bool {
        self.seats_available == 0
    }

    /// Weekly contact minutes.
    pub fn weekly_minutes(&self) -> u32 {
        self.meeting_blocks
            .iter()
            .map(|b| b.duration_minutes() as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_builder() {
        let s = Section::new("CS011", "21001", Units::whole(4))
            .meeting_on(&[Day::Thu, Day::Tue], (10, 0), (11, 15))
            .with_seats(12)
            .with_capacity(40)
            .with_instructor("Ada Lovelace")
            .with_ge_tag("Area C");

        assert_eq!(s.meeting_blocks[0].day, Day::Tue); // sorted
        assert_eq!(s.earliest_start(), Some(600));
        assert_eq!(s.weekly_minutes(), 150);
        assert!(s.meets_on(Day::Thu));
        assert!(!s.meets_on(Day::Mon));
        assert!(!s.is_waitlist_only());
        assert!(s.ge_tags.contains("Area C"));
        assert_eq!(s.capacity, Some(40));
    }

    #[test]
    fn test_no_meetings() {
        let s = Section::new("CS199", "1", Units::from_tenths(10));
        assert_eq!(s.earliest_start(), None);
        assert!(s.is_waitlist_only());
        assert_eq!(s.weekly_minutes(), 0);
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{
            "course_code": "CS010",
            "section_id": "001",
            "units": 4,
            "meeting_blocks": [{"day": "Mon", "start_minute": 480, "end_minute": 530}],
            "seats_available": 3,
            "ge_tags": ["Area C"]
        }"#;
        let s: Section = serde_json::from_str(json).unwrap();
        assert_eq!(s.units, Units::whole(4));
        assert_eq!(s.meeting_blocks.len(), 1);
        assert!(s.prerequisite_override.is_none());
    }
}

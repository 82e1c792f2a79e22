//! Candidate schedule (solution) model.
//!
//! A candidate schedule is a set of sections, at most one per course, with
//! no pairwise time conflicts. Schedules are immutable value objects: the
//! section list is fixed at construction and only read afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Section, Units};
use crate::scoring::ScoreBreakdown;

/// An immutable set of sections, ordered by course code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSchedule {
    sections: Vec<Section>,
    total_units: Units,
}

impl CandidateSchedule {
    /// Builds a schedule, ordering sections by course code then section id.
    ///
    /// No constraint checking happens here; see
    /// [`audit_schedule`](crate::search::audit_schedule).
    pub fn new(mut sections: Vec<Section>) -> Self {
        sections.sort_by(|a, b| {
            a.course_code
                .cmp(&b.course_code)
                .then_with(|| a.section_id.cmp(&b.section_id))
        });
        let total_units = sections.iter().map(|s| s.units).sum();
        Self {
            sections,
            total_units,
        }
    }

    /// Sections, ordered by course code.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sum of section units.
    #[inline]
    pub fn total_units(&self) -> Units {
        self.total_units
    }

    /// Course codes in order.
    pub fn course_codes(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.course_code.as_str()).collect()
    }

    /// Section ids in course-code order.
    pub fn section_ids(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.section_id.as_str()).collect()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Whether a section of `course_code` is included.
    pub fn contains_course(&self, course_code: &str) -> bool {
        self.sections.iter().any(|s| s.course_code == course_code)
    }

    /// Finds the section chosen for a course.
    pub fn section_for_course(&self, course_code: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.course_code == course_code)
    }

    /// Union of GE tags across sections.
    pub fn ge_tags(&self) -> BTreeSet<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.ge_tags.iter().map(String::as_str))
            .collect()
    }

    /// Total weekly contact minutes.
    pub fn weekly_minutes(&self) -> u32 {
        self.sections.iter().map(Section::weekly_minutes).sum()
    }
}

/// A scored schedule as returned by the planner, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSchedule {
    /// The schedule.
    pub schedule: CandidateSchedule,
    /// Total score (higher is better).
    pub score: f64,
    /// Per-component score values.
    pub breakdown: ScoreBreakdown,
}

/// A hard-constraint violation found when auditing a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related course code or section id.
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Two sections meet at overlapping times.
    TimeConflict,
    /// A course appears more than once.
    DuplicateCourse,
    /// Total units exceed `max_units`.
    UnitsAboveMax,
    /// Total units fall short of `min_units`.
    UnitsBelowMin,
    /// A course's prerequisite is not satisfied.
    IneligibleCourse,
    /// A required GE tag is not covered.
    MissingGeTag,
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }

    /// Creates a time conflict violation between two sections.
    pub fn time_conflict(a: &Section, b: &Section) -> Self {
        Self::new(
            ViolationType::TimeConflict,
            a.section_id.clone(),
            format!(
                "{} ({}) overlaps {} ({})",
                a.course_code, a.section_id, b.course_code, b.section_id
            ),
        )
    }

    /// Creates a duplicate course violation.
    pub fn duplicate_course(course_code: impl Into<String>) -> Self {
        let code = course_code.into();
        let message = format!("{code} is scheduled more than once");
        Self::new(ViolationType::DuplicateCourse, code, message)
    }
}

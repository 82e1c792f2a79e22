//! Prerequisite eligibility.
//!
//! [`PrerequisiteResolver`] answers "may this student take this course"
//! for one planning request. Course-level eligibility is evaluated once per
//! course when the resolver is created and memoized; section overrides are
//! evaluated on demand.
//!
//! # Semantics
//! - `And` requires every child, `Or` at least one
//! - A `Course` leaf holds when the code is in `taken_courses`
//! - An empty expression always holds
//! - Codes not defined in the catalog are never eligible
//!
//! Cycles are rejected when the [`CatalogIndex`] is built, so evaluation
//! here never recurses through the catalog.

use std::collections::BTreeSet;
use tracing::debug;

use crate::catalog::CatalogIndex;
use crate::models::{Section, StudentState};

/// Eligibility view over a catalog for one student.
#[derive(Debug, Clone)]
pub struct PrerequisiteResolver<'a> {
    index: &'a CatalogIndex,
    student: &'a StudentState,
    eligible: BTreeSet<&'a str>,
}

impl<'a> PrerequisiteResolver<'a> {
    /// Evaluates every course's canonical prerequisite against `student`.
    pub fn new(index: &'a CatalogIndex, student: &'a StudentState) -> Self {
        let has = |code: &str| student.has_taken(code);
        let eligible = index
            .courses()
            .iter()
            .filter(|c| c.prerequisites.is_satisfied_by(has))
            .map(|c| c.course_code.as_str())
            .collect();
        Self {
            index,
            student,
            eligible,
        }
    }

    /// Whether the course's canonical prerequisite is satisfied.
    ///
    /// Unknown course codes are ineligible.
    pub fn is_eligible(&self, course_code: &str) -> bool {
        if !self.index.contains_course(course_code) {
            debug!(course = course_code, "eligibility query for unknown course");
            return false;
        }
        self.eligible.contains(course_code)
    }

    /// Whether a section may be taken: its override if present, else the
    /// course's canonical prerequisite.
    pub fn is_section_eligible(&self, section: &Section) -> bool {
        match &section.prerequisite_override {
            Some(expr) => {
                self.index.contains_course(&section.course_code)
                    && expr.is_satisfied_by(|code| self.student.has_taken(code))
            }
            None => self.is_eligible(&section.course_code),
        }
    }

    /// Eligible course codes, sorted.
    pub fn eligible_courses(&self) -> &BTreeSet<&'a str> {
        &self.eligible
    }

    /// Leaf codes blocking the course's canonical prerequisite.
    ///
    /// Returns `None` for unknown courses and an empty list when eligible.
    pub fn missing_prerequisites(&self, course_code: &str) -> Option<Vec<String>> {
        let course = self.index.course(course_code)?;
        Some(
            course
                .prerequisites
                .missing(|code| self.student.has_taken(code)),
        )
    }

    /// Courses that are not yet eligible but would be once `course_code`
    /// is completed, sorted.
    ///
    /// Courses already taken are left out.
    pub fn unlocked_by(&self, course_code: &str) -> Vec<&'a str> {
        let with_code = |code: &str| code == course_code || self.student.has_taken(code);
        self.index
            .dependents_of(course_code)
            .filter(|dep| !self.eligible.contains(dep) && !self.student.has_taken(dep))
            .filter_map(|dep| self.index.course(dep))
            .filter(|course| course.prerequisites.is_satisfied_by(with_code))
            .map(|course| course.course_code.as_str())
            .collect()
    }
}

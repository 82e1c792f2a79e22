//! Student state and scheduling preferences.
//!
//! `StudentState` is the set of completed courses; `Preferences` holds the
//! structured constraints a preference translator produces. Both deserialize
//! with defaults so partial objects are accepted.
//!
//! # Hard vs. soft
//!
//! | Field | Kind |
//! |-------|------|
//! | `max_units`, `min_units` | hard bounds on total units |
//! | `required_ge_tags` | hard: union of section tags must cover |
//! | `excluded_days`, `earliest_start_minute` | hard section filters |
//! | `allow_waitlisted`, `excluded_instructors` | hard section filters |
//! | `preferred_subjects` | soft: ranked bonus |
//! | `desired_course_count` | soft target, caps search depth |

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Day, Units};

/// Courses a student has completed.
///
/// Membership is all-or-nothing: there is no partial credit and no
/// retake modeling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentState {
    /// Completed course codes.
    #[serde(default)]
    pub taken_courses: BTreeSet<String>,
}

impl StudentState {
    /// A student with no completed courses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from completed course codes.
    pub fn with_taken<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken_courses: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Marks a course completed.
    pub fn complete(mut self, code: impl Into<String>) -> Self {
        self.taken_courses.insert(code.into());
        self
    }

    /// Whether a course is completed.
    #[inline]
    pub fn has_taken(&self, code: &str) -> bool {
        self.taken_courses.contains(code)
    }
}

/// Structured scheduling preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Subjects in priority order (earlier = higher priority).
    pub preferred_subjects: Vec<String>,
    /// GE tags that must all appear somewhere in the schedule.
    pub required_ge_tags: BTreeSet<String>,
    /// Inclusive upper bound on total units.
    pub max_units: Units,
    /// Optional inclusive lower bound on total units.
    pub min_units: Option<Units>,
    /// Sections starting before this minute are excluded unless exempt.
    pub earliest_start_minute: Option<u16>,
    /// Courses allowed to start before `earliest_start_minute`.
    pub early_start_exempt: BTreeSet<String>,
    /// Days the student wants free.
    pub excluded_days: BTreeSet<Day>,
    /// Target number of distinct courses.
    pub desired_course_count: Option<usize>,
    /// Whether waitlist-only sections may be scheduled.
    pub allow_waitlisted: bool,
    /// Instructors to avoid (case-insensitive).
    pub excluded_instructors: BTreeSet<String>,
    /// Interest keywords matched against course titles (case-insensitive).
    pub interests: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_subjects: Vec::new(),
            required_ge_tags: BTreeSet::new(),
            max_units: Units::whole(20),
            min_units: None,
            earliest_start_minute: None,
            early_start_exempt: BTreeSet::new(),
            excluded_days: BTreeSet::new(),
            desired_course_count: None,
            allow_waitlisted: false,
            excluded_instructors: BTreeSet::new(),
            interests: Vec::new(),
        }
    }
}

impl Preferences {
    /// Preferences with the given unit cap and nothing else.
    pub fn new(max_units: Units) -> Self {
        Self {
            max_units,
            ..Self::default()
        }
    }

    /// Appends a preferred subject (lower priority than those already added).
    pub fn prefer_subject(mut self, subject: impl Into<String>) -> Self {
        self.preferred_subjects.push(subject.into());
        self
    }

    /// Requires a GE tag.
    pub fn require_ge_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_ge_tags.insert(tag.into());
        self
    }

    /// Sets the lower unit bound.
    pub fn with_min_units(mut self, min: Units) -> Self {
        self.min_units = Some(min);
        self
    }

    /// Sets the earliest allowed start (minutes after midnight).
    pub fn with_earliest_start(mut self, minute: u16) -> Self {
        self.earliest_start_minute = Some(minute);
        self
    }

    /// Allows a course to start early despite `earliest_start_minute`.
    pub fn exempt_early_start(mut self, course_code: impl Into<String>) -> Self {
        self.early_start_exempt.insert(course_code.into());
        self
    }

    /// Keeps a day free.
    pub fn exclude_day(mut self, day: Day) -> Self {
        self.excluded_days.insert(day);
        self
    }

    /// Sets the target course count.
    pub fn with_desired_course_count(mut self, count: usize) -> Self {
        self.desired_course_count = Some(count);
        self
    }

    /// Allows waitlist-only sections.
    pub fn allow_waitlisted(mut self) -> Self {
        self.allow_waitlisted = true;
        self
    }

    /// Avoids an instructor.
    pub fn exclude_instructor(mut self, name: impl Into<String>) -> Self {
        self.excluded_instructors.insert(name.into().to_lowercase());
        self
    }

    /// Adds an interest keyword.
    pub fn with_interest(mut self, keyword: impl Into<String>) -> Self {
        self.interests.push(keyword.into());
        self
    }

    /// Interest keywords found in `title`, each counted once.
    pub fn interest_matches(&self, title: &str) -> usize {
        let title = title.to_lowercase();
        self.interests
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && title.contains(k.as_str()))
            .count()
    }

    /// Effective lower bound (zero when unset).
    pub fn min_units_or_zero(&self) -> Units {
        self.min_units.unwrap_or(Units::ZERO)
    }

    /// Rank of `subject` in `preferred_subjects` (0 = highest).
    pub fn subject_rank(&self, subject: &str) -> Option<usize> {
        self.preferred_subjects
            .iter()
            .position(|s| s.eq_ignore_ascii_case(subject))
    }

    /// Whether `instructor` is on the avoid list.
    pub fn avoids_instructor(&self, instructor: &str) -> bool {
        let lower = instructor.trim().to_lowercase();
        !lower.is_empty()
            && self
                .excluded_instructors
                .iter()
                .any(|name| name.trim().to_lowercase() == lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_state() {
        let s = StudentState::with_taken(["CS010", "MATH009A"]).complete("CS011");
        assert!(s.has_taken("CS011"));
        assert!(s.has_taken("MATH009A"));
        assert!(!s.has_taken("CS100"));
    }

    #[test]
    fn test_preferences_builder() {
        let p = Preferences::new(Units::whole(16))
            .prefer_subject("CS")
            .prefer_subject("MATH")
            .require_ge_tag("Area C")
            .with_min_units(Units::whole(12))
            .with_earliest_start(600)
            .exclude_day(Day::Fri)
            .with_desired_course_count(4)
            .exclude_instructor("Dr. Slow");

        assert_eq!(p.subject_rank("math"), Some(1));
        assert_eq!(p.subject_rank("PHYS"), None);
        assert_eq!(p.min_units_or_zero(), Units::whole(12));
        assert!(p.excluded_days.contains(&Day::Fri));
        assert!(p.avoids_instructor("DR. SLOW"));
        assert!(!p.avoids_instructor(""));
        assert!(!p.allow_waitlisted);
    }

    #[test]
    fn test_partial_json() {
        let p: Preferences = serde_json::from_str(
            r#"{"max_units": 12, "preferred_subjects": ["CS"], "excluded_days": ["Fri"]}"#,
        )
        .unwrap();
        assert_eq!(p.max_units, Units::whole(12));
        assert_eq!(p.min_units, None);
        assert_eq!(p.subject_rank("CS"), Some(0));
        assert!(p.excluded_days.contains(&Day::Fri));

        let student: StudentState = serde_json::from_str("{}").unwrap();
        assert!(student.taken_courses.is_empty());
    }

    #[test]
    fn test_interest_matches() {
        let p = Preferences::default()
            .with_interest("Machine Learning")
            .with_interest("data")
            .with_interest("  ");
        assert_eq!(p.interest_matches("Introduction to Machine Learning and Data Mining"), 2);
        assert_eq!(p.interest_matches("DATA STRUCTURES"), 1);
        assert_eq!(p.interest_matches("Organic Chemistry"), 0);
        assert_eq!(Preferences::default().interest_matches("Data"), 0);
    }
}

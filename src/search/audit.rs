//! Hard-constraint audit of a schedule.
//!
//! Re-checks a finished schedule from scratch, independent of how it was
//! built. Every schedule the engine returns audits clean; the audit exists
//! for callers that assemble or edit schedules themselves.

use std::collections::BTreeSet;

use crate::catalog::CatalogIndex;
use crate::conflict::conflicts;
use crate::models::{CandidateSchedule, Preferences, StudentState, Violation, ViolationType};
use crate::resolver::PrerequisiteResolver;

/// Lists every hard-constraint violation of `schedule`.
///
/// Checks:
/// 1. No two sections meet at overlapping times
/// 2. At most one section per course
/// 3. Total units within `[min_units, max_units]`
/// 4. Every section is prerequisite-eligible for `student`
/// 5. Section GE tags cover `required_ge_tags`
pub fn audit_schedule(
    schedule: &CandidateSchedule,
    index: &CatalogIndex,
    student: &StudentState,
    prefs: &Preferences,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let sections = schedule.sections();

    for (i, a) in sections.iter().enumerate() {
        for b in &sections[i + 1..] {
            if conflicts(a, b) {
                violations.push(Violation::time_conflict(a, b));
            }
        }
    }

    let mut seen = BTreeSet::new();
    for section in sections {
        if !seen.insert(section.course_code.as_str()) {
            violations.push(Violation::duplicate_course(section.course_code.as_str()));
        }
    }

    let units = schedule.total_units();
    if units > prefs.max_units {
        violations.push(Violation::new(
            ViolationType::UnitsAboveMax,
            "",
            format!("{units} units exceeds maximum {}", prefs.max_units),
        ));
    }
    if let Some(min) = prefs.min_units {
        if units < min {
            violations.push(Violation::new(
                ViolationType::UnitsBelowMin,
                "",
                format!("{units} units is below minimum {min}"),
            ));
        }
    }

    let resolver = PrerequisiteResolver::new(index, student);
    for section in sections {
        if !resolver.is_section_eligible(section) {
            violations.push(Violation::new(
                ViolationType::IneligibleCourse,
                section.course_code.clone(),
                format!(
                    "{} ({}) prerequisites not met",
                    section.course_code, section.section_id
                ),
            ));
        }
    }

    let tags = schedule.ge_tags();
    for tag in &prefs.required_ge_tags {
        if !tags.contains(tag.as_str()) {
            violations.push(Violation::new(
                ViolationType::MissingGeTag,
                tag.clone(),
                format!("required GE tag '{tag}' is not covered"),
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use crate::models::{Course, Day, PrereqExpr, Section, Units};

    fn sample_index() -> CatalogIndex {
        let snapshot = CatalogSnapshot::new()
            .with_course(Course::new("CS010"))
            .with_course(Course::new("CS011").with_prerequisites(PrereqExpr::course("CS010")))
            .with_course(Course::new("MATH009A"));
        CatalogIndex::build(&snapshot).unwrap()
    }

    fn cs010(id: &str, start: (u16, u16), end: (u16, u16)) -> Section {
        Section::new("CS010", id, Units::whole(4)).meeting_on(&[Day::Mon], start, end)
    }

    #[test]
    fn test_clean_schedule() {
        let index = sample_index();
        let schedule = CandidateSchedule::new(vec![
            cs010("1", (8, 0), (9, 0)),
            Section::new("MATH009A", "2", Units::whole(4)).with_ge_tag("Area B"),
        ]);
        let prefs = Preferences::new(Units::whole(8)).require_ge_tag("Area B");
        assert!(audit_schedule(&schedule, &index, &StudentState::new(), &prefs).is_empty());
    }

    #[test]
    fn test_reports_every_violation() {
        let index = sample_index();
        let schedule = CandidateSchedule::new(vec![
            cs010("1", (8, 0), (9, 0)),
            cs010("2", (8, 30), (9, 30)),
            Section::new("CS011", "3", Units::whole(4)),
        ]);
        let prefs = Preferences::new(Units::whole(8))
            .with_min_units(Units::whole(16))
            .require_ge_tag("Area C");

        let violations = audit_schedule(&schedule, &index, &StudentState::new(), &prefs);
        let kinds: Vec<&ViolationType> = violations.iter().map(|v| &v.violation_type).collect();
        assert!(kinds.contains(&&ViolationType::TimeConflict));
        assert!(kinds.contains(&&ViolationType::DuplicateCourse));
        assert!(kinds.contains(&&ViolationType::UnitsAboveMax));
        assert!(kinds.contains(&&ViolationType::UnitsBelowMin));
        assert!(kinds.contains(&&ViolationType::IneligibleCourse));
        assert!(kinds.contains(&&ViolationType::MissingGeTag));
    }
}

//! Candidate pool: the sections the search may choose from.
//!
//! A section enters the pool only if it passes every per-section hard
//! filter, so the search never has to re-check them:
//!
//! 1. Its course is not already completed
//! 2. It is prerequisite-eligible (section override or course expression)
//! 3. Its units alone fit within `max_units`
//! 4. It does not meet on an excluded day
//! 5. It does not start before `earliest_start_minute`, unless its course
//!    is exempt
//! 6. It has open seats, unless waitlisting is allowed
//! 7. Its instructor is not on the avoid list
//!
//! Surviving sections are grouped by course. Groups are ordered the way a
//! dispatcher orders its queue: preferred subjects first by rank, then by
//! enrollment scarcity (fewest total open seats first), then by course
//! code as the final tie-breaker.

use tracing::debug;

use crate::catalog::CatalogIndex;
use crate::models::{Preferences, Section, StudentState, Units};
use crate::resolver::PrerequisiteResolver;

/// Sections of one course that survived filtering.
#[derive(Debug, Clone)]
pub struct CourseGroup {
    /// Course code.
    pub course_code: String,
    /// Indices into [`CandidatePool::sections`], ordered by section id.
    pub sections: Vec<usize>,
    /// Rank of the course's subject in `preferred_subjects`.
    pub preference_rank: Option<usize>,
    /// Open seats summed over the group's sections.
    pub total_seats: u64,
}

impl CourseGroup {
    /// Ordering key: preferred rank, scarcity, code.
    fn priority_key(&self) -> (usize, u64, &str) {
        (
            self.preference_rank.unwrap_or(usize::MAX),
            self.total_seats,
            self.course_code.as_str(),
        )
    }
}

/// Why sections were left out of the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCounts {
    /// Sections of courses the student already completed.
    pub already_taken: usize,
    /// Sections whose prerequisites are not met.
    pub ineligible: usize,
    /// Sections carrying more units than `max_units` on their own.
    pub too_many_units: usize,
    /// Sections meeting on a day the student keeps free.
    pub excluded_day: usize,
    /// Sections starting before the earliest allowed start.
    pub too_early: usize,
    /// Waitlist-only sections, when waitlisting is not allowed.
    pub waitlisted: usize,
    /// Sections taught by an avoided instructor.
    pub excluded_instructor: usize,
}

impl FilterCounts {
    /// Total sections filtered out.
    pub fn total(&self) -> usize {
        self.already_taken
            + self.ineligible
            + self.too_many_units
            + self.excluded_day
            + self.too_early
            + self.waitlisted
            + self.excluded_instructor
    }
}

/// Filtered, grouped, and ordered sections for one request.
#[derive(Debug, Clone)]
pub struct CandidatePool<'a> {
    sections: Vec<&'a Section>,
    groups: Vec<CourseGroup>,
    filtered: FilterCounts,
}

impl<'a> CandidatePool<'a> {
    /// Filters the catalog's sections and groups the survivors.
    pub fn build(
        index: &'a CatalogIndex,
        resolver: &PrerequisiteResolver<'_>,
        student: &StudentState,
        prefs: &Preferences,
    ) -> Self {
        let mut filtered = FilterCounts::default();
        let mut sections: Vec<&'a Section> = Vec::new();
        let mut groups: Vec<CourseGroup> = Vec::new();

        // Index sections are ordered by course code then section id, so
        // each course's survivors arrive contiguously.
        for section in index.sections() {
            if let Some(reason) = rejection(section, resolver, student, prefs) {
                reason.count(&mut filtered);
                continue;
            }

            let idx = sections.len();
            sections.push(section);
            match groups.last_mut() {
                Some(group) if group.course_code == section.course_code => {
                    group.sections.push(idx);
                    group.total_seats += u64::from(section.seats_available);
                }
                _ => {
                    let subject = index
                        .course(&section.course_code)
                        .map(|c| c.subject.as_str())
                        .unwrap_or_default();
                    groups.push(CourseGroup {
                        course_code: section.course_code.clone(),
                        sections: vec![idx],
                        preference_rank: prefs.subject_rank(subject),
                        total_seats: u64::from(section.seats_available),
                    });
                }
            }
        }

        groups.sort_by(|a, b| a.priority_key().cmp(&b.priority_key()));

        debug!(
            kept = sections.len(),
            courses = groups.len(),
            filtered = filtered.total(),
            ineligible = filtered.ineligible,
            "candidate pool built"
        );

        Self {
            sections,
            groups,
            filtered,
        }
    }

    /// Pool sections, addressed by the indices in each group.
    pub fn sections(&self) -> &[&'a Section] {
        &self.sections
    }

    /// Course groups in search order.
    pub fn groups(&self) -> &[CourseGroup] {
        &self.groups
    }

    /// Sections of a group.
    pub fn group_sections(&self, group: usize) -> impl Iterator<Item = &'a Section> + '_ {
        self.groups[group].sections.iter().map(|&i| self.sections[i])
    }

    /// Filter statistics.
    pub fn filtered(&self) -> &FilterCounts {
        &self.filtered
    }

    /// Whether no section survived filtering.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Largest section units in a group.
    pub fn group_max_units(&self, group: usize) -> Units {
        self.group_sections(group)
            .map(|s| s.units)
            .max()
            .unwrap_or(Units::ZERO)
    }

    /// Course codes in search order.
    pub fn course_order(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.course_code.as_str()).collect()
    }

}

#[derive(Debug, Clone, Copy)]
enum Rejection {
    AlreadyTaken,
    Ineligible,
    TooManyUnits,
    ExcludedDay,
    TooEarly,
    Waitlisted,
    ExcludedInstructor,
}

impl Rejection {
    fn count(self, counts: &mut FilterCounts) {
        let slot = match self {
            Rejection::AlreadyTaken => &mut counts.already_taken,
            Rejection::Ineligible => &mut counts.ineligible,
            Rejection::TooManyUnits => &mut counts.too_many_units,
            Rejection::ExcludedDay => &mut counts.excluded_day,
            Rejection::TooEarly => &mut counts.too_early,
            Rejection::Waitlisted => &mut counts.waitlisted,
            Rejection::ExcludedInstructor => &mut counts.excluded_instructor,
        };
        *slot += 1;
    }
}

fn rejection(
    section: &Section,
    resolver: &PrerequisiteResolver<'_>,
    student: &StudentState,
    prefs: &Preferences,
) -> Option<Rejection> {
    if student.has_taken(&section.course_code) {
        return Some(Rejection::AlreadyTaken);
    }
    if !resolver.is_section_eligible(section) {
        return Some(Rejection::Ineligible);
    }
    if section.units > prefs.max_units {
        return Some(Rejection::TooManyUnits);
    }
    if prefs.excluded_days.iter().any(|&d| section.meets_on(d)) {
        return Some(Rejection::ExcludedDay);
    }
    if let (Some(limit), Some(start)) = (prefs.earliest_start_minute, section.earliest_start()) {
        if start < limit && !prefs.early_start_exempt.contains(&section.course_code) {
            return Some(Rejection::TooEarly);
        }
    }
    if section.is_waitlist_only() && !prefs.allow_waitlisted {
        return Some(Rejection::Waitlisted);
    }
    if let Some(instructor) = &section.instructor {
        if prefs.avoids_instructor(instructor) {
            return Some(Rejection::ExcludedInstructor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use crate::models::{Course, Day, PrereqExpr};

    fn sample_index() -> CatalogIndex {
        let snapshot = CatalogSnapshot::new()
            .with_course(Course::new("CS010"))
            .with_course(Course::new("CS011").with_prerequisites(PrereqExpr::course("CS010")))
            .with_course(Course::new("MATH009A"))
            .with_course(Course::new("ENGL001A"))
            .with_course(Course::new("PHYS040A"))
            .with_section(
                Section::new("CS010", "001", Units::whole(4))
                    .meeting_on(&[Day::Mon, Day::Wed], (8, 0), (9, 0))
                    .with_seats(30),
            )
            .with_section(
                Section::new("CS010", "002", Units::whole(4))
                    .meeting_on(&[Day::Tue], (13, 0), (15, 0))
                    .with_seats(5),
            )
            .with_section(Section::new("CS011", "010", Units::whole(4)).with_seats(5))
            .with_section(
                Section::new("MATH009A", "020", Units::whole(4))
                    .meeting_on(&[Day::Fri], (10, 0), (11, 0))
                    .with_seats(2),
            )
            .with_section(Section::new("ENGL001A", "030", Units::whole(4)).with_seats(1))
            .with_section(
                Section::new("ENGL001A", "031", Units::whole(4))
                    .with_seats(9)
                    .with_instructor("Dr. Slow"),
            )
            .with_section(Section::new("PHYS040A", "040", Units::whole(5)))
            .with_section(Section::new("PHYS040A", "041", Units::whole(5)).with_seats(3));
        CatalogIndex::build(&snapshot).unwrap()
    }

    fn build<'a>(
        index: &'a CatalogIndex,
        student: &StudentState,
        prefs: &Preferences,
    ) -> CandidatePool<'a> {
        let resolver = PrerequisiteResolver::new(index, student);
        CandidatePool::build(index, &resolver, student, prefs)
    }

    #[test]
    fn test_group_order() {
        let index = sample_index();
        let student = StudentState::new();
        let prefs = Preferences::new(Units::whole(16)).prefer_subject("MATH");
        let pool = build(&index, &student, &prefs);

        // MATH preferred; then by seats: ENGL 10, PHYS 3, CS010 35.
        assert_eq!(pool.course_order(), vec!["MATH009A", "PHYS040A", "ENGL001A", "CS010"]);
        assert_eq!(pool.filtered().ineligible, 1); // CS011
        assert_eq!(pool.filtered().waitlisted, 1); // PHYS 040
    }

    #[test]
    fn test_sections_within_group_sorted() {
        let index = sample_index();
        let student = StudentState::new();
        let prefs = Preferences::new(Units::whole(16));
        let pool = build(&index, &student, &prefs);
        let g = pool
            .groups()
            .iter()
            .position(|g| g.course_code == "CS010")
            .unwrap();
        let ids: Vec<&str> = pool.group_sections(g).map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["001", "002"]);
        assert_eq!(pool.group_max_units(g), Units::whole(4));
    }

    #[test]
    fn test_taken_courses_excluded() {
        let index = sample_index();
        let student = StudentState::with_taken(["CS010"]);
        let prefs = Preferences::new(Units::whole(16));
        let pool = build(&index, &student, &prefs);
        assert!(!pool.course_order().contains(&"CS010"));
        assert!(pool.course_order().contains(&"CS011"));
        assert_eq!(pool.filtered().already_taken, 2);
    }

    #[test]
    fn test_hard_filters() {
        let index = sample_index();
        let student = StudentState::new();
        let prefs = Preferences::new(Units::whole(4))
            .exclude_day(Day::Fri)
            .with_earliest_start(9 * 60)
            .exclude_instructor("dr. slow");
        let pool = build(&index, &student, &prefs);

        let ids: Vec<&str> = pool.sections().iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["002", "030"]);
        let f = pool.filtered();
        assert_eq!(f.too_many_units, 2);
        assert_eq!(f.excluded_day, 1);
        assert_eq!(f.too_early, 1);
        assert_eq!(f.excluded_instructor, 1);
    }

    #[test]
    fn test_early_start_exemption_and_waitlist() {
        let index = sample_index();
        let student = StudentState::new();
        let prefs = Preferences::new(Units::whole(16))
            .with_earliest_start(9 * 60)
            .exempt_early_start("CS010")
            .allow_waitlisted();
        let pool = build(&index, &student, &prefs);
        let ids: Vec<&str> = pool.sections().iter().map(|s| s.section_id.as_str()).collect();
        assert!(ids.contains(&"001"));
        assert!(ids.contains(&"040"));
    }
}

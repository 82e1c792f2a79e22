//! Catalog snapshot and index.
//!
//! A [`CatalogSnapshot`] is the raw input for one planning request: the
//! term's course definitions and offered sections. [`CatalogIndex::build`]
//! validates it and builds the lookup structures every other component
//! reads from:
//!
//! | Lookup | Structure |
//! |--------|-----------|
//! | code → course | arena `Vec<Course>` + `HashMap<String, usize>` |
//! | code → sections | `Vec<Vec<usize>>` parallel to the course arena |
//! | subject → codes | `BTreeMap<String, Vec<usize>>` |
//! | prerequisite code → dependents | `BTreeMap<String, BTreeSet<String>>` |
//!
//! The index is immutable after construction and safe to share across
//! threads. Building the same snapshot twice yields equal indexes.

pub mod banner;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::models::{Course, PrereqExpr, Section};
use crate::validation::{detect_prerequisite_cycle, validate_catalog};

/// Course definitions and sections for one term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Course definitions.
    #[serde(default)]
    pub courses: Vec<Course>,
    /// Offered sections.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl CatalogSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a course definition.
    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    /// Adds a section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Decodes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Validated, read-only lookup structures over a catalog snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogIndex {
    courses: Vec<Course>,
    sections: Vec<Section>,
    course_index: HashMap<String, usize>,
    sections_by_course: Vec<Vec<usize>>,
    by_subject: BTreeMap<String, Vec<usize>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl CatalogIndex {
    /// Validates a snapshot and builds the index.
    ///
    /// # Errors
    /// - [`PlanError::MalformedCatalog`] with every structural issue found
    /// - [`PlanError::CyclicPrerequisite`] if prerequisites chain into a cycle
    pub fn build(snapshot: &CatalogSnapshot) -> Result<Self> {
        validate_catalog(&snapshot.courses, &snapshot.sections)
            .map_err(PlanError::MalformedCatalog)?;
        if let Some(cycle) = detect_prerequisite_cycle(&snapshot.courses, &snapshot.sections) {
            return Err(PlanError::CyclicPrerequisite { cycle });
        }

        let courses = snapshot.courses.clone();
        let course_index: HashMap<String, usize> = courses
            .iter()
            .enumerate()
            .map(|(i, c)| (c.course_code.clone(), i))
            .collect();

        // Sections ordered by id within each course.
        let mut sections = snapshot.sections.clone();
        sections.sort_by(|a, b| {
            a.course_code
                .cmp(&b.course_code)
                .then_with(|| a.section_id.cmp(&b.section_id))
        });
        let mut sections_by_course = vec![Vec::new(); courses.len()];
        for (i, section) in sections.iter().enumerate() {
            if let Some(&c) = course_index.get(&section.course_code) {
                sections_by_course[c].push(i);
            }
        }

        let mut by_subject: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, course) in courses.iter().enumerate() {
            by_subject
                .entry(course.subject.to_uppercase())
                .or_default()
                .push(i);
        }
        for idxs in by_subject.values_mut() {
            idxs.sort_by(|&a, &b| courses[a].course_code.cmp(&courses[b].course_code));
        }

        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut link = |expr: &PrereqExpr, dependent: &str| {
            for code in expr.course_codes() {
                dependents
                    .entry(code.to_string())
                    .or_default()
                    .insert(dependent.to_string());
            }
        };
        for course in &courses {
            link(&course.prerequisites, &course.course_code);
        }
        for section in &sections {
            if let Some(expr) = &section.prerequisite_override {
                link(expr, &section.course_code);
            }
        }

        debug!(
            courses = courses.len(),
            sections = sections.len(),
            subjects = by_subject.len(),
            "catalog index built"
        );

        Ok(Self {
            courses,
            sections,
            course_index,
            sections_by_course,
            by_subject,
            dependents,
        })
    }

    /// Looks up a course by code.
    pub fn course(&self, code: &str) -> Option<&Course> {
        self.course_index.get(code).map(|&i| &self.courses[i])
    }

    /// Whether a course code is defined.
    pub fn contains_course(&self, code: &str) -> bool {
        self.course_index.contains_key(code)
    }

    /// All courses in snapshot order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// All sections, ordered by course code then section id.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sections of a course, ordered by section id. Empty for unknown codes.
    pub fn sections_of<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a Section> + 'a {
        let idxs: &[usize] = self
            .course_index
            .get(code)
            .map(|&i| self.sections_by_course[i].as_slice())
            .unwrap_or(&[]);
        idxs.iter().map(move |&i| &self.sections[i])
    }

    /// Looks up a section by id.
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    /// Courses of a subject (case-insensitive), ordered by code.
    pub fn courses_in_subject<'a>(&'a self, subject: &str) -> impl Iterator<Item = &'a Course> + 'a {
        let idxs: &[usize] = self
            .by_subject
            .get(&subject.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        idxs.iter().map(move |&i| &self.courses[i])
    }

    /// Subject codes present in the catalog.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.by_subject.keys().map(String::as_str)
    }

    /// Courses whose prerequisite (canonical or any section override)
    /// mentions `code`.
    pub fn dependents_of(&self, code: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(code)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Number of courses.
    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, MeetingBlock, Units};

    fn sample_snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new()
            .with_course(Course::new("CS010"))
            .with_course(Course::new("CS011").with_prerequisites(PrereqExpr::course("CS010")))
            .with_course(
                Course::new("CS014").with_prerequisites("CS010 and MATH009A".parse().unwrap()),
            )
            .with_course(Course::new("MATH009A"))
            .with_section(Section::new("CS010", "002", Units::whole(4)))
            .with_section(
                Section::new("CS010", "001", Units::whole(4))
                    .meeting_on(&[Day::Mon, Day::Wed, Day::Fri], (8, 0), (8, 50)),
            )
            .with_section(Section::new("CS011", "010", Units::whole(4)))
            .with_section(
                Section::new("MATH009A", "020", Units::whole(4))
                    .with_prerequisite_override(PrereqExpr::course("CS011")),
            )
    }

    #[test]
    fn test_build_lookups() {
        let index = CatalogIndex::build(&sample_snapshot()).unwrap();
        assert_eq!(index.course_count(), 4);
        assert_eq!(index.section_count(), 4);
        assert_eq!(index.course("CS011").unwrap().subject, "CS");
        assert!(index.course("CS999").is_none());

        let ids: Vec<&str> = index.sections_of("CS010").map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["001", "002"]);
        assert_eq!(index.sections_of("CS999").count(), 0);
        assert_eq!(index.section("020").unwrap().course_code, "MATH009A");
    }

    #[test]
    fn test_by_subject() {
        let index = CatalogIndex::build(&sample_snapshot()).unwrap();
        let cs: Vec<&str> = index
            .courses_in_subject("cs")
            .map(|c| c.course_code.as_str())
            .collect();
        assert_eq!(cs, vec!["CS010", "CS011", "CS014"]);
        let subjects: Vec<&str> = index.subjects().collect();
        assert_eq!(subjects, vec!["CS", "MATH"]);
    }

    #[test]
    fn test_reverse_prerequisite_map() {
        let index = CatalogIndex::build(&sample_snapshot()).unwrap();
        let deps: Vec<&str> = index.dependents_of("CS010").collect();
        assert_eq!(deps, vec!["CS011", "CS014"]);
        // Section overrides count too.
        let deps: Vec<&str> = index.dependents_of("CS011").collect();
        assert_eq!(deps, vec!["MATH009A"]);
        assert_eq!(index.dependents_of("PHYS040A").count(), 0);
    }

    #[test]
    fn test_malformed_catalog() {
        let snapshot = sample_snapshot()
            .with_section(Section::new("CS999", "900", Units::whole(4)))
            .with_section(
                Section::new("CS011", "011", Units::whole(4))
                    .with_block(MeetingBlock::new(Day::Tue, 700, 650)),
            );
        match CatalogIndex::build(&snapshot) {
            Err(PlanError::MalformedCatalog(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected MalformedCatalog, got {other:?}"),
        }
    }

    #[test]
    fn test_cyclic_catalog() {
        let snapshot = CatalogSnapshot::new()
            .with_course(Course::new("A").with_prerequisites(PrereqExpr::course("B")))
            .with_course(Course::new("B").with_prerequisites(PrereqExpr::course("A")));
        match CatalogIndex::build(&snapshot) {
            Err(PlanError::CyclicPrerequisite { cycle }) => assert_eq!(cycle, vec!["A", "B", "A"]),
            other => panic!("expected CyclicPrerequisite, got {other:?}"),
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let snapshot = sample_snapshot();
        assert_eq!(
            CatalogIndex::build(&snapshot).unwrap(),
            CatalogIndex::build(&snapshot).unwrap()
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "courses": [{"course_code": "CS010", "subject": "CS"}],
            "sections": [{"course_code": "CS010", "section_id": "001", "units": 4}]
        }"#;
        let snapshot = CatalogSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.sections.len(), 1);
        assert!(CatalogIndex::build(&snapshot).is_ok());

        assert!(matches!(
            CatalogSnapshot::from_json("{\"courses\": 3}"),
            Err(PlanError::Snapshot(_))
        ));
    }

    #[test]
    fn test_index_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CatalogIndex>();
    }
}

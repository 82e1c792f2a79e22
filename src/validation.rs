//! Input validation for catalog snapshots.
//!
//! Checks structural integrity of courses and sections before the index
//! is built. Detects:
//! - Duplicate course codes and section ids
//! - Sections referencing undefined courses
//! - Malformed meeting blocks (empty, reversed, or crossing midnight)
//! - Meeting blocks of one section overlapping each other
//! - Sections carrying zero units
//! - Circular prerequisite chains (DAG validation)
//!
//! Prerequisite leaves may name courses outside the catalog (transfer
//! credit, retired courses); those are not errors and take no part in
//! cycle detection.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::models::{Course, Section};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two courses share a code.
    DuplicateCourse,
    /// Two sections share an id.
    DuplicateSection,
    /// A section references a course that doesn't exist.
    UnknownCourse,
    /// A meeting block has `start >= end` or ends past midnight.
    InvalidMeetingBlock,
    /// Two blocks of the same section overlap.
    OverlappingBlocks,
    /// A section has zero units.
    InvalidUnits,
}

impl ValidationError {
    /// Creates an error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the structure of a catalog snapshot.
///
/// Checks:
/// 1. No duplicate course codes
/// 2. No duplicate section ids
/// 3. Every section references a defined course
/// 4. Every meeting block is well formed
/// 5. No two blocks of one section overlap
/// 6. Every section carries positive units
///
/// Cycle detection is separate, see [`detect_prerequisite_cycle`].
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_catalog(courses: &[Course], sections: &[Section]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut course_codes = HashSet::new();
    for course in courses {
        if !course_codes.insert(course.course_code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateCourse,
                format!("Duplicate course code: {}", course.course_code),
            ));
        }
    }

    let mut section_ids = HashSet::new();
    for section in sections {
        if !section_ids.insert(section.section_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateSection,
                format!("Duplicate section ID: {}", section.section_id),
            ));
        }

        if !course_codes.contains(section.course_code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownCourse,
                format!(
                    "Section '{}' references unknown course '{}'",
                    section.section_id, section.course_code
                ),
            ));
        }

        if section.units.is_zero() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidUnits,
                format!("Section '{}' has zero units", section.section_id),
            ));
        }

        for block in &section.meeting_blocks {
            if !block.is_well_formed() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidMeetingBlock,
                    format!(
                        "Section '{}' has malformed meeting block {}",
                        section.section_id, block
                    ),
                ));
            }
        }

        for (i, a) in section.meeting_blocks.iter().enumerate() {
            for b in &section.meeting_blocks[i + 1..] {
                if a.overlaps(b) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::OverlappingBlocks,
                        format!(
                            "Section '{}' has overlapping blocks {} and {}",
                            section.section_id, a, b
                        ),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects a cycle in the prerequisite graph using DFS.
///
/// Nodes are course indices; an edge `a → b` means `a` requires `b`,
/// either through the course's canonical expression or through a section
/// override. Returns the course codes along the first cycle found, with the
/// starting code repeated at the end (`["A", "B", "A"]`). A course that
/// requires itself is a cycle of length one.
///
/// # Algorithm
/// Depth-first search with a "currently visiting" marker set. Visiting a
/// node already on the recursion stack is a back edge, hence a cycle.
/// Courses and neighbours are visited in a fixed order, so the reported
/// cycle is deterministic.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
pub fn detect_prerequisite_cycle(courses: &[Course], sections: &[Section]) -> Option<Vec<String>> {
    let index: HashMap<&str, usize> = courses
        .iter()
        .enumerate()
        .map(|(i, c)| (c.course_code.as_str(), i))
        .collect();

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); courses.len()];
    for (i, course) in courses.iter().enumerate() {
        for code in course.prerequisites.course_codes() {
            if let Some(&j) = index.get(code) {
                adj[i].push(j);
            }
        }
    }
    for section in sections {
        let (Some(&i), Some(expr)) = (
            index.get(section.course_code.as_str()),
            section.prerequisite_override.as_ref(),
        ) else {
            continue;
        };
        for code in expr.course_codes() {
            if let Some(&j) = index.get(code) {
                adj[i].push(j);
            }
        }
    }
    for edges in &mut adj {
        edges.sort_unstable();
        edges.dedup();
    }

    let mut visited = vec![false; courses.len()];
    let mut in_stack = vec![false; courses.len()];
    let mut path = Vec::new();

    for start in 0..courses.len() {
        if visited[start] {
            continue;
        }
        if let Some(cycle) = cycle_dfs(start, &adj, &mut visited, &mut in_stack, &mut path) {
            return Some(
                cycle
                    .into_iter()
                    .map(|i| courses[i].course_code.clone())
                    .collect(),
            );
        }
    }

    None
}

fn cycle_dfs(
    node: usize,
    adj: &[Vec<usize>],
    visited: &mut [bool],
    in_stack: &mut [bool],
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    visited[node] = true;
    in_stack[node] = true;
    path.push(node);

    for &next in &adj[node] {
        if in_stack[next] {
            // Back edge: the cycle is the path suffix starting at `next`.
            let from = path.iter().position(|&n| n == next).unwrap_or(0);
            let mut cycle = path[from..].to_vec();
            cycle.push(next);
            return Some(cycle);
        }
        if !visited[next] {
            if let Some(cycle) = cycle_dfs(next, adj, visited, in_stack, path) {
                return Some(cycle);
            }
        }
    }

    path.pop();
    in_stack[node] = false;
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, MeetingBlock, PrereqExpr, Units};

    fn sample_courses() -> Vec<Course> {
        vec![
            Course::new("CS010"),
            Course::new("CS011").with_prerequisites(PrereqExpr::course("CS010")),
            Course::new("CS014").with_prerequisites(
                "CS010 and (MATH009A or TRANSFER101)".parse().unwrap(),
            ),
            Course::new("MATH009A"),
        ]
    }

    fn sample_sections() -> Vec<Section> {
        vec![
            Section::new("CS010", "001", Units::whole(4))
                .meeting_on(&[Day::Mon, Day::Wed, Day::Fri], (8, 0), (8, 50)),
            Section::new("CS011", "002", Units::whole(4))
                .meeting_on(&[Day::Tue, Day::Thu], (10, 0), (11, 15)),
            Section::new("MATH009A", "003", Units::whole(4)),
        ]
    }

    #[test]
    fn test_valid_catalog() {
        assert!(validate_catalog(&sample_courses(), &sample_sections()).is_ok());
        assert_eq!(detect_prerequisite_cycle(&sample_courses(), &sample_sections()), None);
    }

    #[test]
    fn test_duplicate_course_code() {
        let mut courses = sample_courses();
        courses.push(Course::new("CS010"));

        let errors = validate_catalog(&courses, &sample_sections()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateCourse));
    }

    #[test]
    fn test_duplicate_section_id() {
        let mut sections = sample_sections();
        sections.push(Section::new("CS011", "001", Units::whole(4)));

        let errors = validate_catalog(&sample_courses(), &sections).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateSection && e.message.contains("001")));
    }

    #[test]
    fn test_unknown_course() {
        let sections = vec![Section::new("CS999", "900", Units::whole(4))];

        let errors = validate_catalog(&sample_courses(), &sections).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownCourse));
    }

    #[test]
    fn test_malformed_blocks() {
        let sections = vec![
            Section::new("CS010", "r", Units::whole(4)).with_block(MeetingBlock::new(Day::Mon, 600, 600)),
            Section::new("CS011", "m", Units::whole(4)).with_block(MeetingBlock::new(Day::Tue, 1400, 1500)),
        ];

        let errors = validate_catalog(&sample_courses(), &sections).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidMeetingBlock)
                .count(),
            2
        );
    }

    #[test]
    fn test_overlapping_blocks_within_section() {
        let sections = vec![Section::new("CS010", "001", Units::whole(4))
            .with_block(MeetingBlock::at(Day::Mon, (8, 0), (9, 0)))
            .with_block(MeetingBlock::at(Day::Mon, (8, 30), (9, 30)))];

        let errors = validate_catalog(&sample_courses(), &sections).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::OverlappingBlocks));
    }

    #[test]
    fn test_zero_units() {
        let sections = vec![Section::new("CS010", "001", Units::ZERO)];

        let errors = validate_catalog(&sample_courses(), &sections).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidUnits));
    }

    #[test]
    fn test_multiple_errors() {
        let courses = vec![Course::new("A"), Course::new("A")];
        let sections = vec![
            Section::new("B", "1", Units::ZERO),
            Section::new("A", "1", Units::whole(3)),
        ];

        let errors = validate_catalog(&courses, &sections).unwrap_err();
        assert!(errors.len() >= 4);
    }

    #[test]
    fn test_prerequisite_cycle() {
        // A → B → C → A
        let courses = vec![
            Course::new("A").with_prerequisites(PrereqExpr::course("B")),
            Course::new("B").with_prerequisites(PrereqExpr::course("C")),
            Course::new("C").with_prerequisites("A or X".parse().unwrap()),
        ];
        let cycle = detect_prerequisite_cycle(&courses, &[]).unwrap();
        assert_eq!(cycle, vec!["A", "B", "C", "A"]);
    }

    #[test]
    fn test_self_prerequisite() {
        let courses = vec![Course::new("A").with_prerequisites(PrereqExpr::course("A"))];
        assert_eq!(
            detect_prerequisite_cycle(&courses, &[]),
            Some(vec!["A".to_string(), "A".to_string()])
        );
    }

    #[test]
    fn test_cycle_through_section_override() {
        let courses = vec![
            Course::new("A").with_prerequisites(PrereqExpr::course("B")),
            Course::new("B"),
        ];
        let sections = vec![Section::new("B", "1", Units::whole(4))
            .with_prerequisite_override(PrereqExpr::course("A"))];
        assert!(detect_prerequisite_cycle(&courses, &sections).is_some());
    }

    #[test]
    fn test_diamond_is_not_cycle() {
        // D requires B and C, both require A.
        let courses = vec![
            Course::new("A"),
            Course::new("B").with_prerequisites(PrereqExpr::course("A")),
            Course::new("C").with_prerequisites(PrereqExpr::course("A")),
            Course::new("D").with_prerequisites("B and C".parse().unwrap()),
        ];
        assert_eq!(detect_prerequisite_cycle(&courses, &[]), None);
    }
}

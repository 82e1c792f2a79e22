//! Course (catalog definition) model.
//!
//! A course is the catalog-level definition that sections belong to. It
//! carries the canonical prerequisite expression, which sections inherit
//! unless they override it.

use serde::{Deserialize, Serialize};

use super::PrereqExpr;

/// A catalog course definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Subject plus number, e.g. `"CS010"`.
    pub course_code: String,
    /// Subject code, e.g. `"CS"`.
    pub subject: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Canonical prerequisite expression.
    #[serde(default)]
    pub prerequisites: PrereqExpr,
}

impl Course {
    /// Creates a course with no prerequisites.
    ///
    /// The subject is the leading alphabetic prefix of the code.
    pub fn new(course_code: impl Into<String>) -> Self {
        let course_code = course_code.into();
        let subject = subject_of(&course_code);
        Self {
            course_code,
            subject,
            title: String::new(),
            prerequisites: PrereqExpr::None,
        }
    }

    /// Overrides the subject code.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the canonical prerequisite expression.
    pub fn with_prerequisites(mut self, expr: PrereqExpr) -> Self {
        self.prerequisites = expr;
        self
    }

    /// Whether the course has any prerequisite.
    pub fn has_prerequisites(&self) -> bool {
        !self.prerequisites.is_empty()
    }
}

/// Leading alphabetic run of a course code (`"MATH009A"` → `"MATH"`).
pub fn subject_of(course_code: &str) -> String {
    course_code
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_builder() {
        let course = Course::new("CS011")
            .with_title("Intro to Discrete Structures")
            .with_prerequisites(PrereqExpr::course("CS010"));

        assert_eq!(course.course_code, "CS011");
        assert_eq!(course.subject, "CS");
        assert_eq!(course.title, "Intro to Discrete Structures");
        assert!(course.has_prerequisites());
    }

    #[test]
    fn test_subject_of() {
        assert_eq!(subject_of("MATH009A"), "MATH");
        assert_eq!(subject_of("cs10c"), "CS");
        assert_eq!(subject_of("101"), "");
    }

    #[test]
    fn test_deserialize_defaults() {
        let course: Course =
            serde_json::from_str(r#"{"course_code":"CS010","subject":"CS"}"#).unwrap();
        assert!(!course.has_prerequisites());
        assert!(course.title.is_empty());
    }
}

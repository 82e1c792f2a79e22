//! Crate error type.
//!
//! Only catalog problems are errors. An infeasible request (no schedule
//! satisfies the hard constraints) is an empty result, never a `PlanError`.

use thiserror::Error;

use crate::validation::ValidationError;

/// Fatal planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The catalog failed structural validation. Carries every issue found.
    #[error("malformed catalog: {} issue(s){}", .0.len(), first_issue(.0))]
    MalformedCatalog(Vec<ValidationError>),

    /// Prerequisite expressions chained through the catalog form a cycle.
    #[error("cyclic prerequisite: {}", .cycle.join(" -> "))]
    CyclicPrerequisite {
        /// Course codes along the cycle, first code repeated at the end.
        cycle: Vec<String>,
    },

    /// A catalog snapshot or configuration could not be decoded.
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

fn first_issue(errors: &[ValidationError]) -> String {
    errors
        .first()
        .map(|e| format!(", first: {e}"))
        .unwrap_or_default()
}

/// Result alias for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_display_cycle() {
        let err = PlanError::CyclicPrerequisite {
            cycle: vec!["CS010".into(), "CS011".into(), "CS010".into()],
        };
        assert_eq!(err.to_string(), "cyclic prerequisite: CS010 -> CS011 -> CS010");
    }

    #[test]
    fn test_display_malformed() {
        let err = PlanError::MalformedCatalog(vec![ValidationError::new(
            ValidationErrorKind::UnknownCourse,
            "Section '001' references unknown course 'CS999'",
        )]);
        let text = err.to_string();
        assert!(text.starts_with("malformed catalog: 1 issue(s)"));
        assert!(text.contains("CS999"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: PlanError = json_err.into();
        assert!(matches!(err, PlanError::Snapshot(_)));
    }
}

//! Score weights.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Relative weights of the score components.
///
/// # Defaults
///
/// | Component | Weight | Unit |
/// |-----------|--------|------|
/// | `preferred_subject` | 10.0 | per preferred course, scaled by rank |
/// | `ge_tag` | 5.0 | per required GE tag covered |
/// | `unit_balance` | 2.0 | at the midpoint of the unit range |
/// | `per_course` | 1.0 | per scheduled course |
/// | `early_start_penalty` | 1.0 | per section starting too early |
/// | `interest` | 3.0 | per interest keyword found in a course title |
///
/// Weights must be non-negative for the search bounds to stay valid; use
/// [`sanitized`](Self::sanitized) on untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of a preferred-subject course, scaled by the subject's rank.
    pub preferred_subject: f64,
    /// Weight of each required GE tag the schedule covers.
    pub ge_tag: f64,
    /// Weight of the unit-balance term (full weight at the range midpoint).
    pub unit_balance: f64,
    /// Weight of each scheduled course.
    pub per_course: f64,
    /// Penalty for each section starting before the preferred earliest start.
    pub early_start_penalty: f64,
    /// Weight of each interest keyword matched by a course title.
    pub interest: f64,
}

impl ScoreWeights {
    /// Default weights.
    pub fn new() -> Self {
        Self {
            preferred_subject: 10.0,
            ge_tag: 5.0,
            unit_balance: 2.0,
            per_course: 1.0,
            early_start_penalty: 1.0,
            interest: 3.0,
        }
    }

    /// Sets the preferred-subject weight.
    pub fn with_preferred_subject(mut self, w: f64) -> Self {
        self.preferred_subject = w;
        self
    }

    /// Sets the GE-tag weight.
    pub fn with_ge_tag(mut self, w: f64) -> Self {
        self.ge_tag = w;
        self
    }

    /// Sets the unit-balance weight.
    pub fn with_unit_balance(mut self, w: f64) -> Self {
        self.unit_balance = w;
        self
    }

    /// Sets the per-course weight.
    pub fn with_per_course(mut self, w: f64) -> Self {
        self.per_course = w;
        self
    }

    /// Sets the early-start penalty.
    pub fn with_early_start_penalty(mut self, w: f64) -> Self {
        self.early_start_penalty = w;
        self
    }

    /// Sets the interest-keyword weight.
    pub fn with_interest(mut self, w: f64) -> Self {
        self.interest = w;
        self
    }

    /// Replaces negative or non-finite weights with zero.
    pub fn sanitized(self) -> Self {
        Self {
            preferred_subject: clamp("preferred_subject", self.preferred_subject),
            ge_tag: clamp("ge_tag", self.ge_tag),
            unit_balance: clamp("unit_balance", self.unit_balance),
            per_course: clamp("per_course", self.per_course),
            early_start_penalty: clamp("early_start_penalty", self.early_start_penalty),
            interest: clamp("interest", self.interest),
        }
    }
}

fn clamp(name: &str, value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!(weight = name, value, "score weight clamped to zero");
        0.0
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::new()
    }
}

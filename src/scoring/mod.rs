//! Schedule scoring.
//!
//! A schedule's score is a weighted sum of independent components:
//!
//! | Component | Value |
//! |-----------|-------|
//! | Preferred subject | Σ over courses of `(n − rank) / n` for a subject at `rank` of `n` preferred, else 0 |
//! | GE coverage | number of required GE tags carried by some section |
//! | Unit balance | `1 − |units − mid| / half` over `[min_units, max_units]`, clamped to `[0, 1]` |
//! | Course count | number of scheduled courses |
//! | Early starts | sections starting before `earliest_start_minute` (subtracted) |
//! | Interests | Σ over courses of interest keywords found in the course title |
//!
//! ```text
//! score = w_pref·pref + w_ge·ge + w_bal·balance + w_course·count
//!       + w_int·interest − w_early·early
//! ```
//!
//! Only maximal schedules are ranked (see [`crate::search`]), so the
//! balance term compares complete schedules with each other and never
//! favours dropping a course. With courses of 5, 5 and 10 units and a
//! 20-unit cap, `{5, 5}` would sit at the midpoint and outscore
//! `{5, 5, 10}`, but only the latter is returned.
//!
//! Scores are rounded to a 1e-6 grid so that equal schedules compare equal
//! regardless of summation order.
//!
//! # Upper Bounds
//! The search needs an optimistic estimate of what a course can still add.
//! Adding a section never increases `early` and raises `ge` by at most the
//! required tags it carries, so
//! `w_pref·pref(s) + w_ge·|required ∩ tags(s)| + w_course + w_int·interest(s)`
//! bounds the gain of section `s` on every component except balance. Balance
//! is bounded by [`Scorer::max_unit_balance`] over the units a completed
//! schedule can still reach.

mod weights;

pub use weights::ScoreWeights;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::CatalogIndex;
use crate::models::{subject_of, CandidateSchedule, Preferences, Section, Units};

/// Resolution of reported scores.
pub const SCORE_EPSILON: f64 = 1e-6;

const SCORE_SCALE: f64 = 1e6;

/// Rounds a raw score to the reporting grid.
#[inline]
pub fn round_score(value: f64) -> f64 {
    (value * SCORE_SCALE).round() / SCORE_SCALE
}

/// Per-component values behind a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Sum of rank-scaled preference values (0..=course count).
    pub preferred_subject: f64,
    /// Required GE tags covered.
    pub ge_tags_covered: usize,
    /// Closeness of total units to the range midpoint (0.0..1.0).
    pub unit_balance: f64,
    /// Scheduled courses.
    pub course_count: usize,
    /// Sections starting before the preferred earliest start.
    pub early_starts: usize,
    /// Interest keywords matched, summed over courses.
    pub interest_matches: usize,
    /// Weighted total, rounded.
    pub total: f64,
}

/// Scores schedules against one student's preferences.
#[derive(Debug, Clone)]
pub struct Scorer<'a> {
    index: &'a CatalogIndex,
    prefs: &'a Preferences,
    weights: ScoreWeights,
}

impl<'a> Scorer<'a> {
    /// Creates a scorer. Negative weights are clamped to zero.
    pub fn new(index: &'a CatalogIndex, prefs: &'a Preferences, weights: ScoreWeights) -> Self {
        Self {
            index,
            prefs,
            weights: weights.sanitized(),
        }
    }

    /// Effective weights.
    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Rank-scaled preference of a course's subject, in `[0, 1]`.
    pub fn preference(&self, course_code: &str) -> f64 {
        let n = self.prefs.preferred_subjects.len();
        let rank = match self.index.course(course_code) {
            Some(course) => self.prefs.subject_rank(&course.subject),
            None => self.prefs.subject_rank(&subject_of(course_code)),
        };
        match rank {
            Some(r) if n > 0 => (n - r) as f64 / n as f64,
            _ => 0.0,
        }
    }

    /// Interest keywords matched by a course's title.
    pub fn interest(&self, course_code: &str) -> usize {
        if self.prefs.interests.is_empty() {
            return 0;
        }
        self.index
            .course(course_code)
            .map_or(0, |c| self.prefs.interest_matches(&c.title))
    }

    /// Required GE tags carried by a section.
    pub fn required_tags(&self, section: &Section) -> usize {
        self.prefs
            .required_ge_tags
            .iter()
            .filter(|t| section.ge_tags.contains(*t))
            .count()
    }

    /// Whether a section starts before the preferred earliest start.
    pub fn is_early(&self, section: &Section) -> bool {
        match (self.prefs.earliest_start_minute, section.earliest_start()) {
            (Some(limit), Some(start)) => start < limit,
            _ => false,
        }
    }

    /// Closeness of `total` to the midpoint of `[min_units, max_units]`.
    ///
    /// 1.0 at the midpoint, falling linearly to 0.0 at either bound. A
    /// degenerate range scores 1.0 only for the exact value.
    pub fn unit_balance(&self, total: Units) -> f64 {
        let lo = self.prefs.min_units_or_zero().tenths() as f64;
        let hi = self.prefs.max_units.tenths() as f64;
        let units = total.tenths() as f64;
        let half = (hi - lo) / 2.0;
        let mid = (hi + lo) / 2.0;
        if half <= 0.0 {
            return if units == mid { 1.0 } else { 0.0 };
        }
        (1.0 - (units - mid).abs() / half).clamp(0.0, 1.0)
    }

    /// Component values and total for a set of sections.
    pub fn breakdown<'s, I>(&self, sections: I) -> ScoreBreakdown
    where
        I: IntoIterator<Item = &'s Section>,
    {
        let mut preferred = 0.0;
        let mut tags: BTreeSet<&str> = BTreeSet::new();
        let mut course_count = 0;
        let mut early_starts = 0;
        let mut interest_matches = 0;
        let mut units = Units::ZERO;

        for section in sections {
            preferred += self.preference(&section.course_code);
            tags.extend(section.ge_tags.iter().map(String::as_str));
            course_count += 1;
            if self.is_early(section) {
                early_starts += 1;
            }
            interest_matches += self.interest(&section.course_code);
            units = units + section.units;
        }

        let ge_tags_covered = self
            .prefs
            .required_ge_tags
            .iter()
            .filter(|t| tags.contains(t.as_str()))
            .count();
        let unit_balance = self.unit_balance(units);

        let w = &self.weights;
        let total = round_score(
            w.preferred_subject * preferred
                + w.ge_tag * ge_tags_covered as f64
                + w.unit_balance * unit_balance
                + w.per_course * course_count as f64
                + w.interest * interest_matches as f64
                - w.early_start_penalty * early_starts as f64,
        );

        ScoreBreakdown {
            preferred_subject: preferred,
            ge_tags_covered,
            unit_balance,
            course_count,
            early_starts,
            interest_matches,
            total,
        }
    }

    /// Score of a schedule (higher is better).
    pub fn score(&self, schedule: &CandidateSchedule) -> f64 {
        self.breakdown(schedule.sections()).total
    }

    /// Score of a partial selection, excluding the balance term.
    pub fn partial_value<'s, I>(&self, sections: I) -> f64
    where
        I: IntoIterator<Item = &'s Section>,
    {
        let b = self.breakdown(sections);
        let w = &self.weights;
        w.preferred_subject * b.preferred_subject
            + w.ge_tag * b.ge_tags_covered as f64
            + w.per_course * b.course_count as f64
            + w.interest * b.interest_matches as f64
            - w.early_start_penalty * b.early_starts as f64
    }

    /// Most a single section can add to the non-balance components.
    pub fn section_upper_bound(&self, section: &Section) -> f64 {
        let w = &self.weights;
        w.preferred_subject * self.preference(&section.course_code)
            + w.ge_tag * self.required_tags(section) as f64
            + w.per_course
            + w.interest * self.interest(&section.course_code) as f64
    }

    /// Most any one section of a course can add (0.0 with no sections).
    pub fn course_upper_bound<'s, I>(&self, sections: I) -> f64
    where
        I: IntoIterator<Item = &'s Section>,
    {
        sections
            .into_iter()
            .map(|s| self.section_upper_bound(s))
            .fold(0.0, f64::max)
    }

    /// Largest unweighted balance for a total anywhere in `[lo, hi]`.
    ///
    /// Returns 0.0 for an empty range.
    pub fn max_unit_balance(&self, lo: Units, hi: Units) -> f64 {
        if lo > hi {
            return 0.0;
        }
        let min = self.prefs.min_units_or_zero().tenths() as f64;
        let max = self.prefs.max_units.tenths() as f64;
        let (lo, hi) = (lo.tenths() as f64, hi.tenths() as f64);
        let half = (max - min) / 2.0;
        let mid = (max + min) / 2.0;
        if half <= 0.0 {
            return if lo <= mid && mid <= hi { 1.0 } else { 0.0 };
        }
        let nearest = mid.clamp(lo, hi);
        (1.0 - (nearest - mid).abs() / half).clamp(0.0, 1.0)
    }
}

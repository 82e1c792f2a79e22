//! Schedule search.
//!
//! The search runs in three stages:
//!
//! 1. [`CandidatePool`] filters the catalog down to sections that pass
//!    every per-section hard constraint and orders them into course groups.
//! 2. [`SearchEngine`] explores include/skip decisions per group with
//!    depth-first branch-and-bound, keeping the best K schedules in a
//!    [`BestK`] accumulator.
//! 3. [`audit_schedule`] independently re-checks any schedule against the
//!    hard constraints.
//!
//! # Hard Constraints
//!
//! | Constraint | Enforced by |
//! |-----------|-------------|
//! | No time conflicts | engine (conflict matrix) |
//! | ≤ 1 section per course | engine (one branch per group) |
//! | Units ≤ `max_units` | pool (per section) and engine (cumulative) |
//! | Units ≥ `min_units` | engine (leaf filter, feasibility prune) |
//! | Prerequisites met | pool |
//! | Required GE tags covered | engine (leaf filter, feasibility prune) |

mod audit;
mod engine;
mod pool;
mod ranking;

pub use audit::audit_schedule;
pub use engine::SearchEngine;
pub use pool::{CandidatePool, CourseGroup, FilterCounts};
pub use ranking::{BestK, RankedEntry};

use serde::{Deserialize, Serialize};

/// Counters from one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes visited, including the root.
    pub nodes_explored: u64,
    /// Subtrees cut because their bound could not reach the K-th best.
    pub pruned_by_bound: u64,
    /// Subtrees cut because no completion could satisfy the hard constraints.
    pub pruned_by_feasibility: u64,
    /// Valid leaves offered to the best-K accumulator.
    pub leaves_recorded: u64,
    /// Whether the node budget stopped the search early.
    pub budget_exhausted: bool,
}

impl SearchStats {
    /// Adds another branch's prune and leaf counters.
    pub fn absorb(&mut self, other: &SearchStats) {
        self.pruned_by_bound += other.pruned_by_bound;
        self.pruned_by_feasibility += other.pruned_by_feasibility;
        self.leaves_recorded += other.leaves_recorded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb() {
        let mut total = SearchStats::default();
        total.absorb(&SearchStats {
            nodes_explored: 9,
            pruned_by_bound: 2,
            pruned_by_feasibility: 1,
            leaves_recorded: 3,
            budget_exhausted: true,
        });
        total.absorb(&SearchStats {
            pruned_by_bound: 1,
            ..SearchStats::default()
        });
        assert_eq!(total.pruned_by_bound, 3);
        assert_eq!(total.pruned_by_feasibility, 1);
        assert_eq!(total.leaves_recorded, 3);
        // Node counts and the budget flag are owned by the engine.
        assert_eq!(total.nodes_explored, 0);
        assert!(!total.budget_exhausted);
    }
}

//! Best-K accumulator.
//!
//! Keeps the K best schedules seen so far under a strict total order:
//!
//! 1. Higher score
//! 2. Fewer total units
//! 3. Lexicographically smaller course-code sequence
//! 4. Lexicographically smaller section-id sequence
//!
//! Because section ids are unique the order never ties, so the retained
//! set depends only on which schedules were offered, not on the order
//! they arrived in.

use std::cmp::Ordering;

use crate::models::Units;
use crate::scoring::ScoreBreakdown;

/// A recorded leaf of the search.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// Rounded score.
    pub score: f64,
    /// Total units.
    pub units: Units,
    /// Course codes, sorted.
    pub course_codes: Vec<String>,
    /// Section ids in course-code order.
    pub section_ids: Vec<String>,
    /// Pool indices of the chosen sections.
    pub sections: Vec<usize>,
    /// Score components.
    pub breakdown: ScoreBreakdown,
}

impl RankedEntry {
    /// Compares two entries; `Less` means `self` ranks first.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.units.cmp(&other.units))
            .then_with(|| self.course_codes.cmp(&other.course_codes))
            .then_with(|| self.section_ids.cmp(&other.section_ids))
    }
}

/// The K best entries, best first.
#[derive(Debug, Clone)]
pub struct BestK {
    k: usize,
    entries: Vec<RankedEntry>,
}

impl BestK {
    /// Creates an empty accumulator keeping at most `k` entries.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            entries: Vec::with_capacity(k.min(64)),
        }
    }

    /// Whether `k` entries are held.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.k
    }

    /// Score of the K-th best entry, once full.
    pub fn threshold(&self) -> Option<f64> {
        if self.is_full() {
            self.entries.last().map(|e| e.score)
        } else {
            None
        }
    }

    /// The K-th best entry, once full.
    pub fn kth(&self) -> Option<&RankedEntry> {
        if self.is_full() {
            self.entries.last()
        } else {
            None
        }
    }

    /// Offers an entry. Returns whether it was kept.
    pub fn offer(&mut self, entry: RankedEntry) -> bool {
        if self.k == 0 {
            return false;
        }
        if self.is_full() {
            match self.entries.last() {
                Some(worst) if entry.rank_cmp(worst) == Ordering::Less => {}
                _ => return false,
            }
        }
        let pos = self
            .entries
            .partition_point(|e| e.rank_cmp(&entry) == Ordering::Less);
        if self.entries.get(pos).is_some_and(|e| e == &entry) {
            return false;
        }
        self.entries.insert(pos, entry);
        self.entries.truncate(self.k);
        true
    }

    /// Entries, best first.
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    /// Entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the accumulator, best first.
    pub fn into_entries(self) -> Vec<RankedEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: f64, units: u32, codes: &[&str]) -> RankedEntry {
        RankedEntry {
            score,
            units: Units::whole(units),
            course_codes: codes.iter().map(|c| c.to_string()).collect(),
            section_ids: codes.iter().map(|c| format!("{c}-1")).collect(),
            sections: Vec::new(),
            breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn test_keeps_best_k() {
        let mut best = BestK::new(2);
        assert!(best.offer(entry(5.0, 4, &["A"])));
        assert!(best.offer(entry(7.0, 4, &["B"])));
        assert_eq!(best.threshold(), Some(5.0));
        assert_eq!(best.kth().map(|e| e.course_codes.clone()), Some(vec!["A".to_string()]));
        assert!(best.offer(entry(6.0, 4, &["C"])));
        assert!(!best.offer(entry(1.0, 4, &["D"])));

        let scores: Vec<f64> = best.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![7.0, 6.0]);
    }

    #[test]
    fn test_tie_breaks() {
        let mut best = BestK::new(3);
        best.offer(entry(5.0, 8, &["A", "B"]));
        best.offer(entry(5.0, 4, &["C"]));
        best.offer(entry(5.0, 8, &["A", "A2"]));

        let codes: Vec<Vec<String>> = best
            .entries()
            .iter()
            .map(|e| e.course_codes.clone())
            .collect();
        assert_eq!(
            codes,
            vec![
                vec!["C".to_string()],
                vec!["A".to_string(), "A2".to_string()],
                vec!["A".to_string(), "B".to_string()],
            ]
        );
    }

    #[test]
    fn test_order_independent() {
        let entries = vec![
            entry(3.0, 4, &["A"]),
            entry(9.0, 8, &["B", "C"]),
            entry(9.0, 4, &["D"]),
            entry(1.0, 4, &["E"]),
            entry(3.0, 4, &["F"]),
        ];
        let mut forward = BestK::new(3);
        let mut backward = BestK::new(3);
        for e in entries.iter().cloned() {
            forward.offer(e);
        }
        for e in entries.into_iter().rev() {
            backward.offer(e);
        }
        assert_eq!(forward.entries(), backward.entries());
    }

    #[test]
    fn test_zero_k_and_duplicates() {
        let mut none = BestK::new(0);
        assert!(!none.offer(entry(1.0, 4, &["A"])));
        assert!(none.is_empty());

        let mut best = BestK::new(3);
        assert!(best.offer(entry(1.0, 4, &["A"])));
        assert!(!best.offer(entry(1.0, 4, &["A"])));
        assert_eq!(best.len(), 1);
        assert_eq!(best.threshold(), None);
        assert!(best.kth().is_none());
    }
}

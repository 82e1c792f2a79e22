//! Time-conflict detection.
//!
//! Two sections conflict when some block of one shares a day with some
//! block of the other and their half-open intervals intersect:
//! `start_a < end_b && start_b < end_a`. Touching endpoints do not
//! conflict. All functions here are pure and total.
//!
//! [`ConflictMatrix`] precomputes pairwise answers for a fixed list of
//! sections so the search can test compatibility by index.

use crate::models::{MeetingBlock, Section};

/// Whether any block of `a` overlaps any block of `b`.
pub fn blocks_overlap(a: &[MeetingBlock], b: &[MeetingBlock]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.overlaps(y)))
}

/// Whether two sections meet at overlapping times.
///
/// ```
/// use u_courseplan::conflict::conflicts;
/// use u_courseplan::models::{Day, Section, Units};
///
/// let a = Section::new("CS010", "1", Units::whole(4)).meeting_on(&[Day::Mon], (8, 0), (9, 0));
/// let b = Section::new("CS011", "2", Units::whole(4)).meeting_on(&[Day::Mon], (9, 0), (10, 0));
/// assert!(!conflicts(&a, &b));
/// ```
#[inline]
pub fn conflicts(a: &Section, b: &Section) -> bool {
    blocks_overlap(&a.meeting_blocks, &b.meeting_blocks)
}

/// Whether `section` conflicts with any member of `schedule`.
pub fn conflicts_with_set<'a, I>(section: &Section, schedule: I) -> bool
where
    I: IntoIterator<Item = &'a Section>,
{
    schedule.into_iter().any(|other| conflicts(section, other))
}

/// Every conflicting pair in `sections`, as index pairs `(i, j)` with `i < j`.
pub fn conflicting_pairs(sections: &[Section]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..sections.len() {
        for j in i + 1..sections.len() {
            if conflicts(&sections[i], &sections[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Pairwise conflict table over a fixed list of sections.
#[derive(Debug, Clone)]
pub struct ConflictMatrix {
    n: usize,
    cells: Vec<bool>,
}

impl ConflictMatrix {
    /// Computes all pairs. O(n² · b²) for `b` blocks per section.
    pub fn new<'a, I>(sections: I) -> Self
    where
        I: IntoIterator<Item = &'a Section>,
    {
        let sections: Vec<&Section> = sections.into_iter().collect();
        let n = sections.len();
        let mut cells = vec![false; n * n];
        for i in 0..n {
            for j in i + 1..n {
                if conflicts(sections[i], sections[j]) {
                    cells[i * n + j] = true;
                    cells[j * n + i] = true;
                }
            }
        }
        Self { n, cells }
    }

    /// Whether sections `i` and `j` conflict.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.n + j]
    }

    /// Whether section `i` conflicts with any of `chosen`.
    #[inline]
    pub fn any(&self, i: usize, chosen: &[usize]) -> bool {
        chosen.iter().any(|&j| self.get(i, j))
    }

    /// Number of sections covered.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, Units};

    fn section(id: &str, days: &[Day], start: (u16, u16), end: (u16, u16)) -> Section {
        Section::new(format!("C{id}"), id, Units::whole(4)).meeting_on(days, start, end)
    }

    #[test]
    fn test_disjoint_days_never_conflict() {
        let a = section("1", &[Day::Mon, Day::Wed], (8, 0), (10, 0));
        let b = section("2", &[Day::Tue, Day::Thu], (8, 0), (10, 0));
        assert!(!conflicts(&a, &b));
    }

    #[test]
    fn test_shared_day_overlap() {
        let a = section("1", &[Day::Mon], (8, 0), (9, 30));
        let b = section("2", &[Day::Mon], (9, 0), (10, 0));
        assert!(conflicts(&a, &b));
        assert!(conflicts(&b, &a));
    }

    #[test]
    fn test_touching_endpoints() {
        let a = section("1", &[Day::Fri], (8, 0), (9, 0));
        let b = section("2", &[Day::Fri], (9, 0), (10, 0));
        assert!(!conflicts(&a, &b));
    }

    #[test]
    fn test_containment() {
        let outer = section("1", &[Day::Thu], (8, 0), (12, 0));
        let inner = section("2", &[Day::Thu], (9, 0), (9, 50));
        assert!(conflicts(&outer, &inner));
    }

    #[test]
    fn test_no_meetings_never_conflict() {
        let online = Section::new("CS005", "W1", Units::whole(4));
        let a = section("1", &[Day::Mon], (8, 0), (9, 0));
        assert!(!conflicts(&online, &a));
    }

    #[test]
    fn test_overlap_formula_matches_brute_force() {
        // Shared day: conflict iff max(start) < min(end).
        for s1 in (0..6).map(|h| h * 30) {
            for e1 in (1..7).map(|h| h * 30).filter(|&e| e > s1) {
                for s2 in (0..6).map(|h| h * 30) {
                    for e2 in (1..7).map(|h| h * 30).filter(|&e| e > s2) {
                        let a = MeetingBlock::new(Day::Mon, s1, e1);
                        let b = MeetingBlock::new(Day::Mon, s2, e2);
                        assert_eq!(a.overlaps(&b), s1.max(s2) < e1.min(e2));
                    }
                }
            }
        }
    }

    #[test]
    fn test_conflicts_with_set() {
        let a = section("1", &[Day::Mon], (8, 0), (9, 0));
        let b = section("2", &[Day::Tue], (8, 0), (9, 0));
        let c = section("3", &[Day::Tue], (8, 30), (9, 30));
        assert!(!conflicts_with_set(&c, [&a]));
        assert!(conflicts_with_set(&c, [&a, &b]));
        assert!(!conflicts_with_set(&a, std::iter::empty()));
        assert!(conflicts_with_set(&c, &vec![a.clone(), b.clone()]));
    }

    #[test]
    fn test_conflict_matrix() {
        let sections = vec![
            section("1", &[Day::Mon], (8, 0), (9, 0)),
            section("2", &[Day::Mon], (8, 30), (9, 30)),
            section("3", &[Day::Mon], (9, 0), (10, 0)),
        ];
        let m = ConflictMatrix::new(&sections);
        assert_eq!(m.len(), 3);
        assert!(m.get(0, 1) && m.get(1, 0));
        assert!(m.get(1, 2));
        assert!(!m.get(0, 2));
        assert!(!m.any(2, &[0]));
        assert!(m.any(2, &[0, 1]));
        assert_eq!(conflicting_pairs(&sections), vec![(0, 1), (1, 2)]);
    }
}

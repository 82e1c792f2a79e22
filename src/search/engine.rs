//! Depth-first branch-and-bound over course groups.
//!
//! # Algorithm
//!
//! Groups are visited in pool order. At group `g` the search either
//! includes one section of the group (one branch per section that fits the
//! unit cap and conflicts with nothing chosen so far) or skips the group.
//! A node is a leaf once `desired_course_count` courses are chosen or every
//! group has been considered.
//!
//! A leaf is recorded when it is non-empty, meets `min_units`, covers the
//! required GE tags, and is maximal: either it reached the desired count
//! or no skipped group has a section that would still fit. Non-maximal
//! leaves are strict subsets of a schedule the search also visits.
//!
//! # Pruning
//!
//! For every count `j` of further courses the subtree could add, the
//! completed schedule's units lie in `[lo_j, hi_j]` and its score is at
//! most
//!
//! ```text
//! value(P) + w_ge·covered(P) + Σ top-j group bounds + w_bal·max balance on [lo_j, hi_j]
//! ```
//!
//! `lo_j` adds the `j` smallest remaining course loads, respects
//! `min_units`, and, for schedules short of `desired_course_count`, must
//! exceed `max_units − u` for every skipped course whose section of `u`
//! units conflicts with nothing in the pool (otherwise that section would
//! still fit and the leaf would not be maximal).
//!
//! | Rule | Test |
//! |------|------|
//! | Bound | every `j` bounds below the K-th best score |
//! | Tie | bound equals the K-th score, and `lo_j` or the smallest reachable course-code sequence already loses the tie-break |
//! | GE feasibility | an uncovered required tag is offered by no remaining group |
//! | Unit feasibility | `units(P) + Σ top-m remaining max units < min_units` |
//!
//! A subtree is cut only when none of its leaves could displace the K-th
//! entry under the ranking order, so the retained top-K is the exact
//! top-K of all recordable leaves. Catalogs where many schedules score the
//! same collapse to the lexicographically first K once the tie rule fires.
//!
//! # Parallelism
//!
//! With parallel execution the first group's branches run on the rayon
//! pool. Branches share one best-K behind a mutex, an atomic copy of its
//! threshold for lock-free bound checks, and an atomic node counter for
//! the budget.
//!
//! # Reference
//! Land & Doig (1960), "An Automatic Method of Solving Discrete Programming Problems"

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;
use tracing::{debug, trace, warn};

use super::pool::CandidatePool;
use super::ranking::{BestK, RankedEntry};
use super::SearchStats;
use crate::conflict::ConflictMatrix;
use crate::models::{CandidateSchedule, Preferences, RankedSchedule, Section, Units};
use crate::scoring::{Scorer, SCORE_EPSILON};

/// Top-K schedule search over a candidate pool.
#[derive(Debug)]
pub struct SearchEngine<'a> {
    pool: &'a CandidatePool<'a>,
    scorer: &'a Scorer<'a>,
    k: usize,
    node_budget: Option<u64>,
    parallel: bool,

    max_units: Units,
    min_units: Units,
    target: usize,
    conflicts: ConflictMatrix,
    /// Non-balance score contribution of each pool section.
    section_value: Vec<f64>,
    /// Required-tag ids carried by each pool section.
    section_tags: Vec<Vec<usize>>,
    tag_count: usize,
    /// `[g][t]`: required tag `t` is offered by some group at or after `g`.
    suffix_tags: Vec<Vec<bool>>,
    /// `[g][m]`: sum of the `m` largest group bounds at or after `g`.
    suffix_bound: Vec<Vec<f64>>,
    /// `[g][m]`: sum of the `m` largest group max-units at or after `g`.
    suffix_units: Vec<Vec<u32>>,
    /// `[g][m]`: sum of the `m` smallest group min-units at or after `g`.
    suffix_min_units: Vec<Vec<u32>>,
    /// Group of each pool section.
    section_group: Vec<usize>,
    /// Position of each group's course code in sorted code order.
    code_rank: Vec<u32>,
    /// `[g]`: code ranks of groups at or after `g`, ascending.
    suffix_ranks: Vec<Vec<u32>>,
    /// Smallest units among a group's sections that conflict with no
    /// section of another group.
    free_units: Vec<Option<u32>>,
}

impl<'a> SearchEngine<'a> {
    /// Prepares the search tables for a pool.
    pub fn new(pool: &'a CandidatePool<'a>, scorer: &'a Scorer<'a>, prefs: &Preferences) -> Self {
        let sections = pool.sections();
        let w = scorer.weights();

        let required: Vec<&str> = prefs.required_ge_tags.iter().map(String::as_str).collect();
        let section_tags: Vec<Vec<usize>> = sections
            .iter()
            .map(|s| {
                required
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| s.ge_tags.contains(**t))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        let section_value: Vec<f64> = sections
            .iter()
            .map(|s| {
                let early = if scorer.is_early(s) { w.early_start_penalty } else { 0.0 };
                w.preferred_subject * scorer.preference(&s.course_code)
                    + w.per_course
                    + w.interest * scorer.interest(&s.course_code) as f64
                    - early
            })
            .collect();

        let group_count = pool.groups().len();
        let group_bounds: Vec<f64> = (0..group_count)
            .map(|g| scorer.course_upper_bound(pool.group_sections(g)))
            .collect();
        let group_units: Vec<u32> = (0..group_count)
            .map(|g| pool.group_max_units(g).tenths())
            .collect();

        let mut suffix_tags = vec![vec![false; required.len()]; group_count + 1];
        for g in (0..group_count).rev() {
            let mut offered = suffix_tags[g + 1].clone();
            for &s in &pool.groups()[g].sections {
                for &t in &section_tags[s] {
                    offered[t] = true;
                }
            }
            suffix_tags[g] = offered;
        }

        let suffix_bound = (0..=group_count)
            .map(|g| top_prefix(&group_bounds[g..], 0.0))
            .collect();
        let suffix_units = (0..=group_count)
            .map(|g| top_prefix(&group_units[g..], 0))
            .collect();
        let group_min_units: Vec<u32> = (0..group_count)
            .map(|g| {
                pool.group_sections(g)
                    .map(|s| s.units.tenths())
                    .min()
                    .unwrap_or(0)
            })
            .collect();
        let suffix_min_units = (0..=group_count)
            .map(|g| low_prefix(&group_min_units[g..]))
            .collect();

        let mut section_group = vec![0; sections.len()];
        for (g, group) in pool.groups().iter().enumerate() {
            for &s in &group.sections {
                section_group[s] = g;
            }
        }

        let mut by_code: Vec<usize> = (0..group_count).collect();
        by_code.sort_by(|&a, &b| pool.groups()[a].course_code.cmp(&pool.groups()[b].course_code));
        let mut code_rank = vec![0u32; group_count];
        for (rank, &g) in by_code.iter().enumerate() {
            code_rank[g] = rank as u32;
        }
        let suffix_ranks = (0..=group_count)
            .map(|g| {
                let mut ranks = code_rank[g..].to_vec();
                ranks.sort_unstable();
                ranks
            })
            .collect();

        let conflicts = ConflictMatrix::new(sections.iter().copied());
        let free_units = (0..group_count)
            .map(|g| {
                pool.groups()[g]
                    .sections
                    .iter()
                    .copied()
                    .filter(|&s| {
                        (0..sections.len()).all(|o| section_group[o] == g || !conflicts.get(s, o))
                    })
                    .map(|s| sections[s].units.tenths())
                    .min()
            })
            .collect();

        Self {
            pool,
            scorer,
            k: 10,
            node_budget: None,
            parallel: false,
            max_units: prefs.max_units,
            min_units: prefs.min_units_or_zero(),
            target: prefs.desired_course_count.unwrap_or(usize::MAX),
            conflicts,
            section_value,
            section_tags,
            tag_count: required.len(),
            suffix_tags,
            suffix_bound,
            suffix_units,
            suffix_min_units,
            section_group,
            code_rank,
            suffix_ranks,
            free_units,
        }
    }

    /// Number of schedules to keep.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Stops after visiting `budget` nodes.
    pub fn with_node_budget(mut self, budget: Option<u64>) -> Self {
        self.node_budget = budget;
        self
    }

    /// Fans the first group's branches out over rayon.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Runs the search. Returns schedules best first.
    pub fn run(&self) -> (Vec<RankedSchedule>, SearchStats) {
        let shared = Shared::new(self.k);
        let mut stats = SearchStats::default();

        if self.k == 0 || self.target == 0 || self.pool.groups().is_empty() {
            return (Vec::new(), stats);
        }

        debug!(
            order = ?self.pool.course_order(),
            k = self.k,
            parallel = self.parallel,
            "starting branch-and-bound"
        );

        let mut root = DfsState::new(self.tag_count);
        if shared.enter_node(self.node_budget) {
            if self.feasible(0, &root) {
                let mut choices: Vec<Option<usize>> = self.pool.groups()[0]
                    .sections
                    .iter()
                    .copied()
                    .filter(|&s| self.fits(s, &root))
                    .map(Some)
                    .collect();
                choices.push(None);

                let branch_stats: Vec<SearchStats> = if self.parallel {
                    choices
                        .par_iter()
                        .map(|&choice| self.run_branch(choice, &shared))
                        .collect()
                } else {
                    choices
                        .iter()
                        .map(|&choice| self.run_branch(choice, &shared))
                        .collect()
                };
                for s in branch_stats {
                    stats.absorb(&s);
                }
            } else {
                root.stats.pruned_by_feasibility += 1;
                stats.absorb(&root.stats);
            }
        }

        let visited = shared.nodes.load(AtomicOrdering::Relaxed);
        stats.nodes_explored = match self.node_budget {
            Some(budget) => visited.min(budget),
            None => visited,
        };
        stats.budget_exhausted = shared.exhausted.load(AtomicOrdering::Relaxed);
        if stats.budget_exhausted {
            warn!(
                budget = ?self.node_budget,
                "node budget exhausted; returning best schedules found so far"
            );
        }

        let entries = shared.into_entries();
        let schedules = entries.into_iter().map(|e| self.to_ranked(e)).collect();
        (schedules, stats)
    }

    fn run_branch(&self, choice: Option<usize>, shared: &Shared) -> SearchStats {
        let mut state = DfsState::new(self.tag_count);
        match choice {
            Some(s) => self.push(s, &mut state),
            None => state.skipped.push(0),
        }
        self.visit(1, &mut state, shared);
        state.stats
    }

    fn visit(&self, g: usize, state: &mut DfsState, shared: &Shared) {
        if !shared.enter_node(self.node_budget) {
            return;
        }

        let groups = self.pool.groups();
        if state.chosen.len() >= self.target || g == groups.len() {
            self.record_leaf(state, shared);
            return;
        }

        if !self.feasible(g, state) {
            state.stats.pruned_by_feasibility += 1;
            trace!(group = g, depth = state.chosen.len(), "pruned: infeasible");
            return;
        }

        if !self.may_improve(g, state, shared) {
            state.stats.pruned_by_bound += 1;
            trace!(group = g, depth = state.chosen.len(), "pruned: bound");
            return;
        }

        for &s in &groups[g].sections {
            if self.fits(s, state) {
                self.push(s, state);
                self.visit(g + 1, state, shared);
                self.pop(s, state);
            }
        }

        state.skipped.push(g);
        self.visit(g + 1, state, shared);
        state.skipped.pop();
    }

    fn remaining_slots(&self, state: &DfsState, g: usize) -> usize {
        let left = self.pool.groups().len() - g;
        self.target.saturating_sub(state.chosen.len()).min(left)
    }

    fn feasible(&self, g: usize, state: &DfsState) -> bool {
        let offered = &self.suffix_tags[g];
        if (0..self.tag_count).any(|t| state.covered[t] == 0 && !offered[t]) {
            return false;
        }
        let m = self.remaining_slots(state, g);
        state.units.tenths() + self.suffix_units[g][m] >= self.min_units.tenths()
    }

    /// Units a leaf short of the desired count must exceed to be maximal.
    fn maximal_floor(&self, state: &DfsState) -> Option<u32> {
        let max = self.max_units.tenths();
        state
            .skipped
            .iter()
            .filter_map(|&h| self.free_units[h])
            .map(|u| max.saturating_sub(u) + 1)
            .max()
    }

    /// Units reachable by leaves with exactly `j` more courses.
    fn unit_range(
        &self,
        g: usize,
        state: &DfsState,
        j: usize,
        floor: Option<u32>,
    ) -> Option<(Units, Units)> {
        let units = state.units.tenths();
        let mut lo = (units + self.suffix_min_units[g][j]).max(self.min_units.tenths());
        if state.chosen.len() + j < self.target {
            if let Some(floor) = floor {
                lo = lo.max(floor);
            }
        }
        let hi = (units + self.suffix_units[g][j]).min(self.max_units.tenths());
        (lo <= hi).then(|| (Units::from_tenths(lo), Units::from_tenths(hi)))
    }

    /// Whether some leaf below this node could displace the K-th entry.
    fn may_improve(&self, g: usize, state: &DfsState, shared: &Shared) -> bool {
        let threshold = shared.threshold();
        let w = self.scorer.weights();
        let base = state.value + w.ge_tag * state.covered_count as f64;
        let floor = self.maximal_floor(state);
        let mut kth_cache: Option<Option<KthEntry>> = None;

        for j in 0..=self.remaining_slots(state, g) {
            if state.units.tenths() + self.suffix_min_units[g][j] > self.max_units.tenths() {
                break;
            }
            let Some((lo, hi)) = self.unit_range(g, state, j, floor) else {
                continue;
            };
            let bound = base
                + self.suffix_bound[g][j]
                + w.unit_balance * self.scorer.max_unit_balance(lo, hi);
            if bound + SCORE_EPSILON < threshold {
                continue;
            }
            if bound >= threshold + SCORE_EPSILON / 2.0 {
                return true;
            }

            let Some(kth) = kth_cache.get_or_insert_with(|| shared.kth()) else {
                return true;
            };
            if bound + SCORE_EPSILON < kth.score {
                continue;
            }
            if bound >= kth.score + SCORE_EPSILON / 2.0 || lo < kth.units {
                return true;
            }
            if lo == kth.units && self.codes_may_precede(g, state, j, &kth.sections) {
                return true;
            }
        }
        false
    }

    /// Whether a leaf adding `j` courses from groups at or after `g` could
    /// have a course-code sequence at or before the K-th entry's.
    fn codes_may_precede(
        &self,
        g: usize,
        state: &DfsState,
        j: usize,
        kth_sections: &[usize],
    ) -> bool {
        let rank = |s: usize| self.code_rank[self.section_group[s]];
        let mut required: Vec<u32> = state.chosen.iter().map(|&s| rank(s)).collect();
        required.sort_unstable();
        let mut target: Vec<u32> = kth_sections.iter().map(|&s| rank(s)).collect();
        target.sort_unstable();
        codes_may_precede(&required, &self.suffix_ranks[g], j, &target)
    }

    fn fits(&self, s: usize, state: &DfsState) -> bool {
        state.units + self.pool.sections()[s].units <= self.max_units
            && !self.conflicts.any(s, &state.chosen)
    }

    fn push(&self, s: usize, state: &mut DfsState) {
        state.chosen.push(s);
        state.units = state.units + self.pool.sections()[s].units;
        state.value += self.section_value[s];
        for &t in &self.section_tags[s] {
            if state.covered[t] == 0 {
                state.covered_count += 1;
            }
            state.covered[t] += 1;
        }
    }

    fn pop(&self, s: usize, state: &mut DfsState) {
        state.chosen.pop();
        state.units = state.units - self.pool.sections()[s].units;
        state.value -= self.section_value[s];
        for &t in &self.section_tags[s] {
            state.covered[t] -= 1;
            if state.covered[t] == 0 {
                state.covered_count -= 1;
            }
        }
    }

    fn is_maximal(&self, state: &DfsState) -> bool {
        if state.chosen.len() >= self.target {
            return true;
        }
        !state
            .skipped
            .iter()
            .any(|&g| self.pool.groups()[g].sections.iter().any(|&s| self.fits(s, state)))
    }

    fn record_leaf(&self, state: &mut DfsState, shared: &Shared) {
        if state.chosen.is_empty()
            || state.units < self.min_units
            || state.covered_count < self.tag_count
            || !self.is_maximal(state)
        {
            return;
        }

        let sections = self.pool.sections();
        let mut chosen = state.chosen.clone();
        chosen.sort_by(|&a, &b| {
            sections[a]
                .course_code
                .cmp(&sections[b].course_code)
                .then_with(|| sections[a].section_id.cmp(&sections[b].section_id))
        });

        let breakdown = self.scorer.breakdown(chosen.iter().map(|&s| sections[s]));
        let entry = RankedEntry {
            score: breakdown.total,
            units: state.units,
            course_codes: chosen.iter().map(|&s| sections[s].course_code.clone()).collect(),
            section_ids: chosen.iter().map(|&s| sections[s].section_id.clone()).collect(),
            sections: chosen,
            breakdown,
        };
        state.stats.leaves_recorded += 1;
        shared.offer(entry);
    }

    fn to_ranked(&self, entry: RankedEntry) -> RankedSchedule {
        let sections: Vec<Section> = entry
            .sections
            .iter()
            .map(|&s| self.pool.sections()[s].clone())
            .collect();
        RankedSchedule {
            schedule: CandidateSchedule::new(sections),
            score: entry.score,
            breakdown: entry.breakdown,
        }
    }
}

/// Prefix sums of `values` sorted descending, starting at `zero`.
fn top_prefix<T>(values: &[T], zero: T) -> Vec<T>
where
    T: Copy + PartialOrd + std::ops::Add<Output = T>,
{
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let mut out = Vec::with_capacity(sorted.len() + 1);
    let mut acc = zero;
    out.push(acc);
    for v in sorted {
        acc = acc + v;
        out.push(acc);
    }
    out
}

/// Prefix sums of `values` sorted ascending, starting at zero.
fn low_prefix(values: &[u32]) -> Vec<u32> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mut out = Vec::with_capacity(sorted.len() + 1);
    let mut acc = 0;
    out.push(acc);
    for v in sorted {
        acc += v;
        out.push(acc);
    }
    out
}

/// Whether `required` plus exactly `j` codes drawn from `optional` can
/// sort lexicographically at or before `target`.
///
/// All slices are ascending and `required` is disjoint from `optional`.
/// Greedy: at each position take the smallest code that still leaves
/// enough optional codes to place.
fn codes_may_precede(required: &[u32], optional: &[u32], j: usize, target: &[u32]) -> bool {
    let above = |x: u32| optional.len() - optional.partition_point(|&a| a <= x);
    let mut next = 0;
    let mut left = j;
    let mut prev: Option<u32> = None;

    for &t in target {
        let pending = required.get(next).copied();
        if pending.is_none() && left == 0 {
            // A proper prefix of the target.
            return true;
        }
        let start = prev.map_or(0, |p| optional.partition_point(|&a| a <= p));
        let optional_pick = if left > 0 {
            optional[start..]
                .iter()
                .copied()
                .take_while(|&a| pending.map_or(true, |q| a < q))
                .find(|&a| above(a) + 1 >= left)
        } else {
            None
        };
        let required_pick = pending.filter(|&q| above(q) >= left);
        let smallest = match (optional_pick, required_pick) {
            (Some(a), Some(q)) => Some(a.min(q)),
            (a, q) => a.or(q),
        };
        match smallest {
            Some(x) if x == t => {
                if required_pick == Some(t) {
                    next += 1;
                } else {
                    left -= 1;
                }
                prev = Some(t);
            }
            Some(x) => return x < t,
            None => return false,
        }
    }
    next == required.len() && left == 0
}

/// The K-th entry's rank keys.
#[derive(Debug, Clone)]
struct KthEntry {
    score: f64,
    units: Units,
    sections: Vec<usize>,
}

/// Per-branch mutable search state.
#[derive(Debug)]
struct DfsState {
    chosen: Vec<usize>,
    skipped: Vec<usize>,
    units: Units,
    value: f64,
    covered: Vec<u32>,
    covered_count: usize,
    stats: SearchStats,
}

impl DfsState {
    fn new(tag_count: usize) -> Self {
        Self {
            chosen: Vec::new(),
            skipped: Vec::new(),
            units: Units::ZERO,
            value: 0.0,
            covered: vec![0; tag_count],
            covered_count: 0,
            stats: SearchStats::default(),
        }
    }
}

/// State shared by all branches of one search.
#[derive(Debug)]
struct Shared {
    best: Mutex<BestK>,
    threshold: AtomicU64,
    nodes: AtomicU64,
    exhausted: AtomicBool,
}

impl Shared {
    fn new(k: usize) -> Self {
        Self {
            best: Mutex::new(BestK::new(k)),
            threshold: AtomicU64::new(f64::NEG_INFINITY.to_bits()),
            nodes: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Counts a node. Returns false once the budget is spent.
    fn enter_node(&self, budget: Option<u64>) -> bool {
        if self.exhausted.load(AtomicOrdering::Relaxed) {
            return false;
        }
        let n = self.nodes.fetch_add(1, AtomicOrdering::Relaxed) + 1;
        if let Some(limit) = budget {
            if n > limit {
                self.exhausted.store(true, AtomicOrdering::Relaxed);
                return false;
            }
        }
        true
    }

    /// K-th best score, or negative infinity until K schedules are held.
    fn threshold(&self) -> f64 {
        f64::from_bits(self.threshold.load(AtomicOrdering::Acquire))
    }

    /// Snapshot of the K-th entry, once K are held.
    fn kth(&self) -> Option<KthEntry> {
        let best = match self.best.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        best.kth().map(|e| KthEntry {
            score: e.score,
            units: e.units,
            sections: e.sections.clone(),
        })
    }

    fn offer(&self, entry: RankedEntry) {
        let mut best = match self.best.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if best.offer(entry) {
            if let Some(t) = best.threshold() {
                self.threshold.store(t.to_bits(), AtomicOrdering::Release);
            }
        }
    }

    fn into_entries(self) -> Vec<RankedEntry> {
        match self.best.into_inner() {
            Ok(best) => best.into_entries(),
            Err(poisoned) => poisoned.into_inner().into_entries(),
        }
    }
}

//! Planning entry points.
//!
//! # Pipeline
//!
//! 1. Build and validate a [`CatalogIndex`] from the snapshot.
//! 2. Resolve prerequisite eligibility for the student.
//! 3. Filter and group sections into a [`CandidatePool`].
//! 4. Run branch-and-bound for the top-K schedules.
//!
//! Steps 2–4 never fail: an infeasible request is an empty result. Callers
//! serving many students from one term can build the index once and call
//! [`Planner::plan_indexed`] concurrently.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{CatalogIndex, CatalogSnapshot};
use crate::error::Result;
use crate::models::{Preferences, RankedSchedule, StudentState};
use crate::resolver::PrerequisiteResolver;
use crate::scoring::{ScoreWeights, Scorer};
use crate::search::{CandidatePool, SearchEngine, SearchStats};

/// Search nodes a request may visit unless configured otherwise.
pub const DEFAULT_NODE_BUDGET: u64 = 1_000_000;

/// Planner configuration.
///
/// Every field has a default, so `{}` is a valid JSON configuration. The
/// node budget defaults to [`DEFAULT_NODE_BUDGET`]; `"node_budget": null`
/// asks for an exhaustive search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Score weights.
    pub weights: ScoreWeights,
    /// Maximum search nodes per request (`None` = exhaustive).
    pub node_budget: Option<u64>,
    /// Fan the first search level out over the rayon thread pool.
    pub parallel: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            node_budget: Some(DEFAULT_NODE_BUDGET),
            parallel: false,
        }
    }
}

impl PlannerConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of a planning request with search statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    /// Schedules, best first.
    pub schedules: Vec<RankedSchedule>,
    /// Search counters.
    pub stats: SearchStats,
}

/// Course schedule planner.
///
/// # Example
///
/// ```
/// use u_courseplan::catalog::CatalogSnapshot;
/// use u_courseplan::models::{Course, Day, Preferences, PrereqExpr, Section, StudentState, Units};
/// use u_courseplan::Planner;
///
/// let snapshot = CatalogSnapshot::new()
///     .with_course(Course::new("CS010"))
///     .with_course(Course::new("CS011").with_prerequisites(PrereqExpr::course("CS010")))
///     .with_section(
///         Section::new("CS010", "001", Units::whole(4))
///             .meeting_on(&[Day::Mon, Day::Wed, Day::Fri], (8, 0), (8, 50))
///             .with_seats(20),
///     )
///     .with_section(
///         Section::new("CS011", "002", Units::whole(4))
///             .meeting_on(&[Day::Tue, Day::Thu], (10, 0), (11, 15))
///             .with_seats(20),
///     );
///
/// let schedules = Planner::new()
///     .plan(&snapshot, &StudentState::new(), &Preferences::new(Units::whole(8)), 3)
///     .unwrap();
/// assert_eq!(schedules[0].schedule.course_codes(), vec!["CS010"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    /// Creates a planner with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets score weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.config.weights = weights;
        self
    }

    /// Limits the number of search nodes per request.
    pub fn with_node_budget(mut self, budget: u64) -> Self {
        self.config.node_budget = Some(budget);
        self
    }

    /// Removes the node budget. The search then always returns the exact
    /// top-K, however long it takes.
    pub fn exhaustive(mut self) -> Self {
        self.config.node_budget = None;
        self
    }

    /// Enables or disables parallel search.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Returns up to `k` schedules, best first.
    ///
    /// # Errors
    /// [`PlanError::MalformedCatalog`](crate::PlanError::MalformedCatalog) or
    /// [`PlanError::CyclicPrerequisite`](crate::PlanError::CyclicPrerequisite).
    /// Infeasible preferences give `Ok(vec![])`.
    pub fn plan(
        &self,
        snapshot: &CatalogSnapshot,
        student: &StudentState,
        prefs: &Preferences,
        k: usize,
    ) -> Result<Vec<RankedSchedule>> {
        Ok(self.plan_with_stats(snapshot, student, prefs, k)?.schedules)
    }

    /// Like [`plan`](Self::plan), also returning search statistics.
    pub fn plan_with_stats(
        &self,
        snapshot: &CatalogSnapshot,
        student: &StudentState,
        prefs: &Preferences,
        k: usize,
    ) -> Result<PlanOutcome> {
        let index = CatalogIndex::build(snapshot)?;
        Ok(self.plan_indexed(&index, student, prefs, k))
    }

    /// Plans against a prebuilt index.
    pub fn plan_indexed(
        &self,
        index: &CatalogIndex,
        student: &StudentState,
        prefs: &Preferences,
        k: usize,
    ) -> PlanOutcome {
        info!(
            courses = index.course_count(),
            sections = index.section_count(),
            taken = student.taken_courses.len(),
            k,
            "planning request"
        );
        if let Some(min) = prefs.min_units {
            if min > prefs.max_units {
                warn!(%min, max = %prefs.max_units, "min_units exceeds max_units; no schedule can qualify");
            }
        }

        let resolver = PrerequisiteResolver::new(index, student);
        let pool = CandidatePool::build(index, &resolver, student, prefs);
        let scorer = Scorer::new(index, prefs, self.config.weights);
        let (schedules, stats) = SearchEngine::new(&pool, &scorer, prefs)
            .with_k(k)
            .with_node_budget(self.config.node_budget)
            .with_parallel(self.config.parallel)
            .run();

        info!(
            returned = schedules.len(),
            nodes = stats.nodes_explored,
            pruned_by_bound = stats.pruned_by_bound,
            pruned_by_feasibility = stats.pruned_by_feasibility,
            budget_exhausted = stats.budget_exhausted,
            "planning finished"
        );

        PlanOutcome { schedules, stats }
    }
}

/// Returns up to `k` schedules for `student`, best first, with the default
/// configuration (including [`DEFAULT_NODE_BUDGET`]).
pub fn plan(
    snapshot: &CatalogSnapshot,
    student: &StudentState,
    prefs: &Preferences,
    k: usize,
) -> Result<Vec<RankedSchedule>> {
    Planner::new().plan(snapshot, student, prefs, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::models::{Course, Day, PrereqExpr, Section, Units};

    fn cs_snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new()
            .with_course(Course::new("CS010"))
            .with_course(Course::new("CS011").with_prerequisites(PrereqExpr::course("CS010")))
            .with_section(
                Section::new("CS010", "001", Units::whole(4))
                    .meeting_on(&[Day::Mon, Day::Wed, Day::Fri], (8, 0), (8, 50))
                    .with_seats(20),
            )
            .with_section(
                Section::new("CS011", "002", Units::whole(4))
                    .meeting_on(&[Day::Tue, Day::Thu], (10, 0), (11, 15))
                    .with_seats(20),
            )
    }

    #[test]
    fn test_plan_prerequisite_gate() {
        let schedules = plan(
            &cs_snapshot(),
            &StudentState::new(),
            &Preferences::new(Units::whole(8)),
            5,
        )
        .unwrap();
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].schedule.course_codes(), vec!["CS010"]);
    }

    #[test]
    fn test_plan_after_completion() {
        let student = StudentState::with_taken(["CS010"]);
        let schedules = plan(&cs_snapshot(), &student, &Preferences::new(Units::whole(8)), 5).unwrap();
        assert_eq!(schedules[0].schedule.course_codes(), vec!["CS011"]);
    }

    #[test]
    fn test_plan_errors() {
        let bad = cs_snapshot().with_section(Section::new("CS404", "404", Units::whole(4)));
        assert!(matches!(
            plan(&bad, &StudentState::new(), &Preferences::default(), 1),
            Err(PlanError::MalformedCatalog(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config = PlannerConfig::from_json(r#"{"node_budget": 500, "weights": {"ge_tag": 7}}"#).unwrap();
        assert_eq!(config.node_budget, Some(500));
        assert_eq!(config.weights.ge_tag, 7.0);
        assert_eq!(config.weights.preferred_subject, 10.0);
        assert!(!config.parallel);
        assert_eq!(PlannerConfig::from_json("{}").unwrap(), PlannerConfig::new());
    }

    #[test]
    fn test_default_node_budget() {
        assert_eq!(PlannerConfig::default().node_budget, Some(DEFAULT_NODE_BUDGET));
        assert_eq!(Planner::new().config().node_budget, Some(DEFAULT_NODE_BUDGET));
        assert_eq!(Planner::new().exhaustive().config().node_budget, None);

        let unbounded = PlannerConfig::from_json(r#"{"node_budget": null}"#).unwrap();
        assert_eq!(unbounded.node_budget, None);
    }

    #[test]
    fn test_plan_with_stats() {
        let planner = Planner::new().with_node_budget(1_000).with_parallel(true);
        let outcome = planner
            .plan_with_stats(&cs_snapshot(), &StudentState::new(), &Preferences::new(Units::whole(8)), 2)
            .unwrap();
        assert_eq!(outcome.schedules.len(), 1);
        assert!(outcome.stats.nodes_explored > 0);
        assert!(!outcome.stats.budget_exhausted);
        assert_eq!(planner.config().node_budget, Some(1_000));
    }
}

//! Course schedule resolution engine.
//!
//! Given a term's catalog, a student's completed courses, and structured
//! preferences, finds the best conflict-free sets of course sections.
//! The engine is a pure function of its inputs: nothing is cached or
//! persisted between requests.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Course`, `Section`, `MeetingBlock`,
//!   `PrereqExpr`, `StudentState`, `Preferences`, `CandidateSchedule`
//! - **`validation`**: Catalog integrity checks (duplicate ids, malformed
//!   blocks, unknown courses, prerequisite cycles)
//! - **`catalog`**: Snapshot input, the validated `CatalogIndex`, and
//!   registrar text helpers
//! - **`resolver`**: Prerequisite eligibility for one student
//! - **`conflict`**: Meeting-time overlap detection
//! - **`scoring`**: Weighted schedule scores and search upper bounds
//! - **`search`**: Candidate pool, branch-and-bound top-K search, audit
//! - **`planner`**: The `plan` entry point and `Planner` configuration
//!
//! # Data Flow
//!
//! ```text
//! CatalogSnapshot ─▶ CatalogIndex ─▶ PrerequisiteResolver ─▶ CandidatePool
//!                                                              │
//!                          Scorer ◀── SearchEngine ◀───────────┘
//!                                         │
//!                                         ▼
//!                               Vec<RankedSchedule>
//! ```
//!
//! # References
//!
//! - Land & Doig (1960), "An Automatic Method of Solving Discrete Programming Problems"
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4

pub mod catalog;
pub mod conflict;
pub mod error;
pub mod models;
pub mod planner;
pub mod resolver;
pub mod scoring;
pub mod search;
pub mod validation;

pub use error::{PlanError, Result};
pub use planner::{plan, PlanOutcome, Planner, PlannerConfig, DEFAULT_NODE_BUDGET};

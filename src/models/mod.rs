//! Course planning domain models.
//!
//! Provides the data types for describing a term's catalog, a student's
//! record and preferences, and the candidate schedules the planner
//! produces. All types are plain data with serde support; invariants that
//! span several values (unique ids, well-formed blocks, acyclic
//! prerequisites) are checked by [`crate::validation`].
//!
//! # Domain Mappings
//!
//! | u-courseplan | Registrar | Generic scheduling |
//! |--------------|-----------|--------------------|
//! | Course | Catalog entry | Task |
//! | Section | CRN / offering | Activity alternative |
//! | MeetingBlock | Meeting time | Time window |
//! | CandidateSchedule | Enrollment plan | Schedule |

mod course;
mod meeting;
mod prerequisite;
mod schedule;
mod section;
mod student;
mod units;

pub use course::{subject_of, Course};
pub use meeting::{Day, MeetingBlock, MINUTES_PER_DAY};
pub use prerequisite::{PrereqExpr, PrereqParseError};
pub use schedule::{CandidateSchedule, RankedSchedule, Violation, ViolationType};
pub use section::Section;
pub use student::{Preferences, StudentState};
pub use units::Units;

//! Election calendar and progress
//!
//! - [`calendar`]: milestone dates derived from the previous inauguration date
//! - [`progress`]: per-term completion state and percentage

pub mod calendar;
pub mod progress;

pub use calendar::{generate, ElectionCalendar, Milestone, MilestoneId, MilestoneRule, MILESTONE_RULES};
pub use progress::{ElectionProgress, MilestoneStatus, ProgressView};

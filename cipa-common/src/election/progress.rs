//! Election progress tracking
//!
//! Completion state is owned by one [`ElectionProgress`] per term. The server
//! persists the completed set, so progress survives reloads.

use super::calendar::{ElectionCalendar, Milestone, MilestoneId, MILESTONE_RULES};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Completed milestones of one term's election
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElectionProgress {
    completed: BTreeMap<MilestoneId, DateTime<Utc>>,
}

impl ElectionProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored completion rows
    pub fn from_completions<I>(completions: I) -> Self
    where
        I: IntoIterator<Item = (MilestoneId, DateTime<Utc>)>,
    {
        Self {
            completed: completions.into_iter().collect(),
        }
    }

    /// Mark or unmark a milestone; returns whether anything changed
    pub fn set_completed(&mut self, id: MilestoneId, completed: bool, at: DateTime<Utc>) -> bool {
        if completed {
            if self.completed.contains_key(&id) {
                return false;
            }
            self.completed.insert(id, at);
            true
        } else {
            self.completed.remove(&id).is_some()
        }
    }

    pub fn is_completed(&self, id: MilestoneId) -> bool {
        self.completed.contains_key(&id)
    }

    pub fn completed_at(&self, id: MilestoneId) -> Option<DateTime<Utc>> {
        self.completed.get(&id).copied()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// `completed / total * 100`, rounded to the nearest integer
    pub fn percentage(&self) -> u8 {
        let total = MILESTONE_RULES.len() as f64;
        ((self.completed.len() as f64 / total) * 100.0).round() as u8
    }

    /// Calendar entries joined with completion state
    pub fn view(&self, calendar: &ElectionCalendar) -> ProgressView {
        let milestones = calendar
            .milestones
            .iter()
            .map(|m| MilestoneStatus {
                milestone: m.clone(),
                completed: self.is_completed(m.id),
                completed_at: self.completed_at(m.id),
            })
            .collect();

        ProgressView {
            anchor: calendar.anchor,
            term_end: calendar.term_end,
            milestones,
            completed: self.completed_count(),
            total: MILESTONE_RULES.len(),
            percentage: self.percentage(),
        }
    }
}

/// Milestone with its completion flag
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneStatus {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Progress indicator payload
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub anchor: chrono::NaiveDate,
    pub term_end: chrono::NaiveDate,
    pub milestones: Vec<MilestoneStatus>,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

//! Election calendar generation
//!
//! The whole calendar derives from one anchor: the inauguration (posse) date of
//! the previous committee. The new mandate starts one year later and every
//! milestone sits a fixed number of days before it. Dates landing on a weekend
//! are moved back to the preceding Friday, each milestone independently.

use crate::time::{add_years, shift_weekend_to_friday, weekday_name_pt};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Electoral milestone identifiers, in chronological order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneId {
    UnionNotification,
    Convocation,
    ElectoralCommission,
    RegistrationOpen,
    RegistrationClose,
    CandidateList,
    VotingDay,
    Inauguration,
}

/// Static definition of one milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneRule {
    pub id: MilestoneId,
    pub label: &'static str,
    pub regulatory_reference: &'static str,
    /// Days before the new term's start
    pub days_before: i64,
}

pub const MILESTONE_RULES: &[MilestoneRule] = &[
    MilestoneRule {
        id: MilestoneId::UnionNotification,
        label: "Comunicação do início do processo eleitoral ao sindicato",
        regulatory_reference: "NR-5, item 5.5.1",
        days_before: 65,
    },
    MilestoneRule {
        id: MilestoneId::Convocation,
        label: "Publicação do edital de convocação da eleição",
        regulatory_reference: "NR-5, item 5.5.1",
        days_before: 60,
    },
    MilestoneRule {
        id: MilestoneId::ElectoralCommission,
        label: "Constituição da comissão eleitoral",
        regulatory_reference: "NR-5, item 5.5.1.1",
        days_before: 55,
    },
    MilestoneRule {
        id: MilestoneId::RegistrationOpen,
        label: "Abertura das inscrições de candidatos",
        regulatory_reference: "NR-5, item 5.5.3, alínea b",
        days_before: 50,
    },
    MilestoneRule {
        id: MilestoneId::RegistrationClose,
        label: "Encerramento das inscrições de candidatos",
        regulatory_reference: "NR-5, item 5.5.3, alínea c",
        days_before: 35,
    },
    MilestoneRule {
        id: MilestoneId::CandidateList,
        label: "Divulgação da relação de candidatos inscritos",
        regulatory_reference: "NR-5, item 5.5.3, alínea d",
        days_before: 34,
    },
    MilestoneRule {
        id: MilestoneId::VotingDay,
        label: "Realização da eleição",
        regulatory_reference: "NR-5, item 5.5.3, alínea e",
        days_before: 30,
    },
    MilestoneRule {
        id: MilestoneId::Inauguration,
        label: "Posse dos membros da CIPA",
        regulatory_reference: "NR-5, item 5.4.6",
        days_before: 0,
    },
];

impl MilestoneId {
    /// Stable identifier used in URLs and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneId::UnionNotification => "union_notification",
            MilestoneId::Convocation => "convocation",
            MilestoneId::ElectoralCommission => "electoral_commission",
            MilestoneId::RegistrationOpen => "registration_open",
            MilestoneId::RegistrationClose => "registration_close",
            MilestoneId::CandidateList => "candidate_list",
            MilestoneId::VotingDay => "voting_day",
            MilestoneId::Inauguration => "inauguration",
        }
    }

    pub fn rule(&self) -> &'static MilestoneRule {
        MILESTONE_RULES
            .iter()
            .find(|r| r.id == *self)
            .unwrap_or(&MILESTONE_RULES[0])
    }
}

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MILESTONE_RULES
            .iter()
            .map(|r| r.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown milestone: {}", s)))
    }
}

/// One computed calendar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub label: &'static str,
    pub regulatory_reference: &'static str,
    pub days_before: i64,
    pub date: NaiveDate,
    pub weekday: &'static str,
}

/// Full calendar for one election
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionCalendar {
    pub anchor: NaiveDate,
    pub term_end: NaiveDate,
    pub milestones: Vec<Milestone>,
}

impl ElectionCalendar {
    pub fn milestone(&self, id: MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }
}

/// Derive the calendar from the previous term's inauguration date
pub fn generate(anchor: NaiveDate) -> ElectionCalendar {
    let term_end = add_years(anchor, 1);

    let milestones = MILESTONE_RULES
        .iter()
        .map(|rule| {
            let date = shift_weekend_to_friday(term_end - Duration::days(rule.days_before));
            Milestone {
                id: rule.id,
                label: rule.label,
                regulatory_reference: rule.regulatory_reference,
                days_before: rule.days_before,
                date,
                weekday: weekday_name_pt(date.weekday()),
            }
        })
        .collect();

    ElectionCalendar {
        anchor,
        term_end,
        milestones,
    }
}

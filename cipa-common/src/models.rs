//! Domain models
//!
//! All CIPA records are scoped by [`Term`]; terms are scoped by [`Branch`].
//! Enumerations serialize with the upper-case codes stored in the database.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Declares `as_str`, `Display` and `FromStr` for an enum stored as TEXT
macro_rules! stored_enum {
    ($name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $name {
            /// Code stored in the database and used on the wire
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Every variant in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(crate::Error::InvalidInput(format!(
                        "Unknown {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

// ========================================
// External read models
// ========================================

/// Organizational branch (filial) owning CIPA terms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    pub id: Uuid,
    pub company_name: String,
    pub branch_name: String,
    pub cnpj: String,
    /// CNAE classification, e.g. "4711-3/02"
    pub cnae: String,
    pub city: String,
    pub logo_url: Option<String>,
}

/// Employee record as far as the CIPA core needs it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collaborator {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

// ========================================
// Term
// ========================================

/// Term (gestão) lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TermStatus {
    /// Electoral process running
    Election,
    /// Committee seated and governing
    Active,
    /// Mandate ended
    Finished,
}

stored_enum!(TermStatus {
    Election => "ELECTION",
    Active => "ACTIVE",
    Finished => "FINISHED",
});

/// Rejected term status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid term status transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: TermStatus,
    pub to: TermStatus,
}

impl TermStatus {
    /// Guarded transition: ELECTION → ACTIVE → FINISHED, same-state is a no-op
    pub fn transition(self, to: TermStatus) -> Result<TermStatus, TransitionError> {
        use TermStatus::*;
        match (self, to) {
            (from, to) if from == to => Ok(to),
            (Election, Active) | (Active, Finished) => Ok(to),
            (from, to) => Err(TransitionError { from, to }),
        }
    }
}

/// CIPA mandate for one branch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Term {
    pub id: Uuid,
    pub branch_id: Uuid,
    /// Free text, e.g. "2024/2025"
    pub year_label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TermStatus,
    /// Inauguration date of the previous committee; anchors the election calendar
    pub previous_posse_date: Option<NaiveDate>,
    pub employer_representative_id: Option<Uuid>,
    pub president_id: Option<Uuid>,
    pub election_location: Option<String>,
    pub election_start_time: Option<NaiveTime>,
    pub election_end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Term {
    /// Year label safe for file names ("2024/2025" → "2024-2025")
    pub fn file_year(&self) -> String {
        self.year_label
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ' ' => '-',
                c => c,
            })
            .collect()
    }
}

// ========================================
// Committee members
// ========================================

/// Seat held inside the committee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitteeRole {
    Presidente,
    VicePresidente,
    Secretario,
    Titular,
    Suplente,
}

stored_enum!(CommitteeRole {
    Presidente => "PRESIDENTE",
    VicePresidente => "VICE_PRESIDENTE",
    Secretario => "SECRETARIO",
    Titular => "TITULAR",
    Suplente => "SUPLENTE",
});

impl CommitteeRole {
    /// Label printed on minutes
    pub fn label_pt(&self) -> &'static str {
        match self {
            CommitteeRole::Presidente => "Presidente",
            CommitteeRole::VicePresidente => "Vice-Presidente",
            CommitteeRole::Secretario => "Secretário(a)",
            CommitteeRole::Titular => "Titular",
            CommitteeRole::Suplente => "Suplente",
        }
    }
}

/// Who put the member on the committee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberOrigin {
    /// Appointed by the employer
    Empregador,
    /// Elected by the employees
    Empregado,
}

stored_enum!(MemberOrigin {
    Empregador => "EMPREGADOR",
    Empregado => "EMPREGADO",
});

/// Cipeiro: one seat-holder in a term
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: Uuid,
    pub term_id: Uuid,
    pub collaborator_id: Uuid,
    pub role: CommitteeRole,
    pub origin: MemberOrigin,
    /// Only meaningful for elected members
    pub votes: Option<i64>,
}

impl Member {
    /// Vote counts belong to elected members only and cannot be negative
    pub fn validate(&self) -> crate::Result<()> {
        match (self.origin, self.votes) {
            (MemberOrigin::Empregador, Some(_)) => Err(crate::Error::InvalidInput(
                "Employer-appointed members do not carry a vote count".to_string(),
            )),
            (_, Some(v)) if v < 0 => Err(crate::Error::InvalidInput(
                "Vote count cannot be negative".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

// ========================================
// Candidates
// ========================================

/// Candidacy status; a missing record is the implicit "unregistered" state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    PendingSignature,
    Approved,
}

stored_enum!(CandidateStatus {
    PendingSignature => "PENDING_SIGNATURE",
    Approved => "APPROVED",
});

/// Registered candidacy of a collaborator for one term's election
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: Uuid,
    pub term_id: Uuid,
    pub collaborator_id: Uuid,
    pub registered_at: DateTime<Utc>,
    pub signature_url: Option<String>,
    pub status: CandidateStatus,
}

/// Remote-signature hand-off session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HandoffStatus {
    Open,
    Completed,
    Expired,
}

stored_enum!(HandoffStatus {
    Open => "OPEN",
    Completed => "COMPLETED",
    Expired => "EXPIRED",
});

/// Short-lived session letting a secondary device sign for a candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandoffSession {
    pub token: Uuid,
    pub candidate_id: Uuid,
    pub status: HandoffStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl HandoffSession {
    /// Open session that has not yet expired at `now`
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == HandoffStatus::Open && now < self.expires_at
    }
}

// ========================================
// Meetings and action plans
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeetingKind {
    Ordinary,
    Extraordinary,
}

stored_enum!(MeetingKind {
    Ordinary => "ORDINARY",
    Extraordinary => "EXTRAORDINARY",
});

impl MeetingKind {
    pub fn label_pt(&self) -> &'static str {
        match self {
            MeetingKind::Ordinary => "Ordinária",
            MeetingKind::Extraordinary => "Extraordinária",
        }
    }
}

/// Committee session within a term
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: Uuid,
    pub term_id: Uuid,
    pub kind: MeetingKind,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPlanStatus {
    Pending,
    InProgress,
    Done,
    Delayed,
}

stored_enum!(ActionPlanStatus {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    Done => "DONE",
    Delayed => "DELAYED",
});

impl ActionPlanStatus {
    pub fn label_pt(&self) -> &'static str {
        match self {
            ActionPlanStatus::Pending => "Pendente",
            ActionPlanStatus::InProgress => "Em andamento",
            ActionPlanStatus::Done => "Concluído",
            ActionPlanStatus::Delayed => "Atrasado",
        }
    }
}

/// Remediation item produced by a meeting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionPlan {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub description: String,
    pub deadline: NaiveDate,
    pub responsible_id: Option<Uuid>,
    pub status: ActionPlanStatus,
}

// ========================================
// Medical certificates
// ========================================

/// Atestado médico
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalCertificate {
    pub id: Uuid,
    pub collaborator_id: Uuid,
    pub start_date: NaiveDate,
    pub days: i64,
    /// Diagnosis code; first character is the family used for accumulation
    pub cid: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_status_guarded_transitions() {
        use TermStatus::*;
        assert_eq!(Election.transition(Active), Ok(Active));
        assert_eq!(Active.transition(Finished), Ok(Finished));
        assert_eq!(Active.transition(Active), Ok(Active));

        let err = Finished.transition(Election).unwrap_err();
        assert_eq!(err.from, Finished);
        assert_eq!(err.to, Election);
        assert!(Election.transition(Finished).is_err());
        assert!(Active.transition(Election).is_err());
    }

    #[test]
    fn test_stored_enum_codes_match_serde() {
        for role in CommitteeRole::ALL {
            let json = serde_json::to_string(role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<CommitteeRole>().unwrap(), *role);
        }
        for status in ActionPlanStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&CandidateStatus::PendingSignature).unwrap(),
            "\"PENDING_SIGNATURE\""
        );
    }

    #[test]
    fn test_unknown_code_is_invalid_input() {
        let err = "SOMETHING".parse::<TermStatus>().unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }

    #[test]
    fn test_member_vote_validation() {
        let mut member = Member {
            id: Uuid::new_v4(),
            term_id: Uuid::new_v4(),
            collaborator_id: Uuid::new_v4(),
            role: CommitteeRole::Titular,
            origin: MemberOrigin::Empregado,
            votes: Some(42),
        };
        assert!(member.validate().is_ok());

        member.votes = Some(-1);
        assert!(member.validate().is_err());

        member.origin = MemberOrigin::Empregador;
        member.votes = Some(3);
        assert!(member.validate().is_err());

        member.votes = None;
        assert!(member.validate().is_ok());
    }

    #[test]
    fn test_file_year_sanitizes_separators() {
        let now = Utc::now();
        let term = Term {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            year_label: "2024/2025".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            status: TermStatus::Election,
            previous_posse_date: None,
            employer_representative_id: None,
            president_id: None,
            election_location: None,
            election_start_time: None,
            election_end_time: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(term.file_year(), "2024-2025");
    }

    #[test]
    fn test_handoff_usable_window() {
        let now = Utc::now();
        let mut session = HandoffSession {
            token: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            status: HandoffStatus::Open,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(10),
        };
        assert!(session.is_usable(now));
        assert!(!session.is_usable(now + chrono::Duration::minutes(11)));
        session.status = HandoffStatus::Completed;
        assert!(!session.is_usable(now));
    }
}

//! Office document generation
//!
//! Renders a term's electoral state into `.docx` files. Each kind declares the
//! fields it needs and the milestone that unlocks it; rendering validates both
//! before producing any bytes, so a failure never yields a partial artifact.

pub mod docx;
mod templates;

pub use docx::{DocxBuilder, ImageFormat, Logo};

use crate::election::{ElectionCalendar, ElectionProgress, MilestoneId};
use crate::models::{ActionPlan, Branch, CandidateStatus, CommitteeRole, Meeting, MemberOrigin, Term};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// MIME type of generated files
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Election documents generated per term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ElectionNotice,
    ElectoralCommissionMinutes,
    CandidacyForm,
    CandidateListNotice,
    VoterAttendanceSheet,
    InaugurationMinutes,
}

impl DocumentKind {
    pub const ALL: &'static [DocumentKind] = &[
        DocumentKind::ElectionNotice,
        DocumentKind::ElectoralCommissionMinutes,
        DocumentKind::CandidacyForm,
        DocumentKind::CandidateListNotice,
        DocumentKind::VoterAttendanceSheet,
        DocumentKind::InaugurationMinutes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::ElectionNotice => "election_notice",
            DocumentKind::ElectoralCommissionMinutes => "electoral_commission_minutes",
            DocumentKind::CandidacyForm => "candidacy_form",
            DocumentKind::CandidateListNotice => "candidate_list_notice",
            DocumentKind::VoterAttendanceSheet => "voter_attendance_sheet",
            DocumentKind::InaugurationMinutes => "inauguration_minutes",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::ElectionNotice => "Edital de Convocação",
            DocumentKind::ElectoralCommissionMinutes => "Ata de Constituição da Comissão Eleitoral",
            DocumentKind::CandidacyForm => "Ficha de Inscrição de Candidato",
            DocumentKind::CandidateListNotice => "Edital de Divulgação dos Candidatos",
            DocumentKind::VoterAttendanceSheet => "Lista de Presença de Votação",
            DocumentKind::InaugurationMinutes => "Ata de Posse",
        }
    }

    fn file_stem(&self) -> &'static str {
        match self {
            DocumentKind::ElectionNotice => "Edital_Convocacao",
            DocumentKind::ElectoralCommissionMinutes => "Ata_Comissao_Eleitoral",
            DocumentKind::CandidacyForm => "Ficha_Inscricao",
            DocumentKind::CandidateListNotice => "Edital_Candidatos",
            DocumentKind::VoterAttendanceSheet => "Lista_Presenca",
            DocumentKind::InaugurationMinutes => "Ata_Posse",
        }
    }

    /// Milestone that must be completed before the document is offered
    pub fn required_milestone(&self) -> Option<MilestoneId> {
        match self {
            DocumentKind::ElectionNotice => None,
            DocumentKind::ElectoralCommissionMinutes => Some(MilestoneId::Convocation),
            DocumentKind::CandidacyForm => Some(MilestoneId::RegistrationOpen),
            DocumentKind::CandidateListNotice => Some(MilestoneId::RegistrationClose),
            DocumentKind::VoterAttendanceSheet => Some(MilestoneId::CandidateList),
            DocumentKind::InaugurationMinutes => Some(MilestoneId::VotingDay),
        }
    }

    /// `<Stem>_<year>.docx`
    pub fn file_name(&self, term: &Term) -> String {
        format!("{}_{}.docx", self.file_stem(), term.file_year())
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown document kind: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Missing required field for {document}: {field}")]
    MissingField {
        document: &'static str,
        field: &'static str,
    },

    #[error("{document} is available after the milestone \"{milestone}\" is completed")]
    Locked {
        document: &'static str,
        milestone: &'static str,
    },

    #[error("Failed to write document package: {0}")]
    Package(String),
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(e: zip::result::ZipError) -> Self {
        DocumentError::Package(e.to_string())
    }
}

/// Committee member with the collaborator data documents print
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub job_title: Option<String>,
    pub role: CommitteeRole,
    pub origin: MemberOrigin,
    pub votes: Option<i64>,
}

/// Candidate with the collaborator data documents print
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateEntry {
    pub name: String,
    pub job_title: Option<String>,
    pub status: CandidateStatus,
    pub registered_at: DateTime<Utc>,
}

/// Action plan with the responsible collaborator's name
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlanEntry {
    pub plan: ActionPlan,
    pub responsible_name: Option<String>,
}

/// Everything a term document can draw from
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub branch: Branch,
    pub term: Term,
    pub members: Vec<RosterEntry>,
    pub candidates: Vec<CandidateEntry>,
    pub employer_representative: Option<String>,
    pub president: Option<String>,
    pub logo: Option<Logo>,
}

impl DocumentContext {
    /// Calendar derived from the term's anchor, if set
    pub fn calendar(&self) -> Option<ElectionCalendar> {
        self.term.previous_posse_date.map(crate::election::generate)
    }

    /// Term president: explicit signatory first, then the seated PRESIDENTE
    pub fn president_name(&self) -> Option<&str> {
        self.president
            .as_deref()
            .or_else(|| self.member_named(CommitteeRole::Presidente))
    }

    pub fn vice_president_name(&self) -> Option<&str> {
        self.member_named(CommitteeRole::VicePresidente)
    }

    fn member_named(&self, role: CommitteeRole) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.name.as_str())
    }

    /// Election start/end times
    pub fn election_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((self.term.election_start_time?, self.term.election_end_time?))
    }

    pub fn election_location(&self) -> Option<&str> {
        self.term
            .election_location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Availability of one kind for a term
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAvailability {
    pub kind: DocumentKind,
    pub title: &'static str,
    pub file_name: String,
    pub available: bool,
    pub requires_milestone: Option<MilestoneId>,
}

/// Whether `kind` is unlocked by the current progress
pub fn is_available(kind: DocumentKind, progress: &ElectionProgress) -> bool {
    kind.required_milestone()
        .map_or(true, |m| progress.is_completed(m))
}

/// Availability of every kind for a term
pub fn availability(term: &Term, progress: &ElectionProgress) -> Vec<DocumentAvailability> {
    DocumentKind::ALL
        .iter()
        .map(|kind| DocumentAvailability {
            kind: *kind,
            title: kind.title(),
            file_name: kind.file_name(term),
            available: is_available(*kind, progress),
            requires_milestone: kind.required_milestone(),
        })
        .collect()
}

/// Render a term document after checking its gate and required fields
pub fn render(
    kind: DocumentKind,
    ctx: &DocumentContext,
    progress: &ElectionProgress,
) -> Result<RenderedDocument, DocumentError> {
    if let Some(milestone) = kind.required_milestone() {
        if !progress.is_completed(milestone) {
            return Err(DocumentError::Locked {
                document: kind.title(),
                milestone: milestone.rule().label,
            });
        }
    }

    let builder = match kind {
        DocumentKind::ElectionNotice => templates::election_notice(ctx)?,
        DocumentKind::ElectoralCommissionMinutes => templates::electoral_commission_minutes(ctx)?,
        DocumentKind::CandidacyForm => templates::candidacy_form(ctx)?,
        DocumentKind::CandidateListNotice => templates::candidate_list_notice(ctx)?,
        DocumentKind::VoterAttendanceSheet => templates::voter_attendance_sheet(ctx)?,
        DocumentKind::InaugurationMinutes => templates::inauguration_minutes(ctx)?,
    };

    Ok(RenderedDocument {
        file_name: kind.file_name(&ctx.term),
        bytes: builder.finish()?,
    })
}

/// `Ata_Reuniao_<yyyy-mm-dd>.docx`
pub fn meeting_minutes_file_name(meeting: &Meeting) -> String {
    format!("Ata_Reuniao_{}.docx", meeting.date.format("%Y-%m-%d"))
}

/// Render minutes of a committee meeting with its action plans
pub fn render_meeting_minutes(
    ctx: &DocumentContext,
    meeting: &Meeting,
    plans: &[ActionPlanEntry],
) -> Result<RenderedDocument, DocumentError> {
    let builder = templates::meeting_minutes(ctx, meeting, plans)?;
    Ok(RenderedDocument {
        file_name: meeting_minutes_file_name(meeting),
        bytes: builder.finish()?,
    })
}

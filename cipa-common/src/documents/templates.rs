//! Portuguese content of each document kind

use super::docx::{Align, DocxBuilder};
use super::{ActionPlanEntry, DocumentContext, DocumentError, DocumentKind};
use crate::election::{ElectionCalendar, MilestoneId};
use crate::models::{CandidateStatus, Meeting, MemberOrigin};
use crate::time::{format_br, format_long_pt};
use chrono::NaiveTime;

fn require<T>(value: Option<T>, kind: DocumentKind, field: &'static str) -> Result<T, DocumentError> {
    value.ok_or(DocumentError::MissingField {
        document: kind.title(),
        field,
    })
}

fn start(ctx: &DocumentContext) -> DocxBuilder {
    let mut doc = DocxBuilder::new();
    if let Some(logo) = &ctx.logo {
        doc.logo(logo.clone());
    }
    doc
}

fn date_of(calendar: &ElectionCalendar, id: MilestoneId) -> String {
    calendar
        .milestone(id)
        .map(|m| format_br(m.date))
        .unwrap_or_default()
}

fn hm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn company_line(ctx: &DocumentContext) -> String {
    format!(
        "{} - {} (CNPJ {})",
        ctx.branch.company_name, ctx.branch.branch_name, ctx.branch.cnpj
    )
}

fn place_and_date(ctx: &DocumentContext, date: chrono::NaiveDate) -> String {
    if ctx.branch.city.trim().is_empty() {
        format_long_pt(date)
    } else {
        format!("{}, {}.", ctx.branch.city, format_long_pt(date))
    }
}

pub(super) fn election_notice(ctx: &DocumentContext) -> Result<DocxBuilder, DocumentError> {
    let kind = DocumentKind::ElectionNotice;
    let calendar = require(ctx.calendar(), kind, "data de posse anterior")?;
    let location = require(ctx.election_location(), kind, "local da eleição")?;
    let (opens, closes) = require(ctx.election_window(), kind, "horário da eleição")?;

    let mut doc = start(ctx);
    doc.title("EDITAL DE CONVOCAÇÃO PARA ELEIÇÃO DA CIPA")
        .aligned(&format!("Gestão {}", ctx.term.year_label), Align::Center)
        .blank()
        .paragraph(&format!(
            "A empresa {}, em cumprimento ao disposto na Norma Regulamentadora nº 5 (NR-5), \
             convoca todos os empregados para a eleição dos representantes dos empregados na \
             Comissão Interna de Prevenção de Acidentes e de Assédio (CIPA).",
            company_line(ctx)
        ))
        .blank()
        .heading("Cronograma")
        .field(
            "Período de inscrições",
            &format!(
                "de {} a {}",
                date_of(&calendar, MilestoneId::RegistrationOpen),
                date_of(&calendar, MilestoneId::RegistrationClose)
            ),
        )
        .field("Divulgação dos candidatos", &date_of(&calendar, MilestoneId::CandidateList))
        .field("Data da eleição", &date_of(&calendar, MilestoneId::VotingDay))
        .field("Horário", &format!("das {} às {}", hm(opens), hm(closes)))
        .field("Local", location)
        .field("Posse", &date_of(&calendar, MilestoneId::Inauguration))
        .blank()
        .paragraph(
            "Poderão se candidatar todos os empregados, independentemente de setor ou local de \
             trabalho. A inscrição será feita mediante ficha própria, garantido o recibo ao candidato.",
        )
        .blank()
        .aligned(&place_and_date(ctx, date_from(&calendar, MilestoneId::Convocation)), Align::Right);

    let signer = ctx.employer_representative.as_deref().unwrap_or("Representante do empregador");
    doc.signature_line(signer, "Pela empresa");
    Ok(doc)
}

fn date_from(calendar: &ElectionCalendar, id: MilestoneId) -> chrono::NaiveDate {
    calendar.milestone(id).map_or(calendar.term_end, |m| m.date)
}

pub(super) fn electoral_commission_minutes(ctx: &DocumentContext) -> Result<DocxBuilder, DocumentError> {
    let kind = DocumentKind::ElectoralCommissionMinutes;
    let calendar = require(ctx.calendar(), kind, "data de posse anterior")?;
    let representative = require(
        ctx.employer_representative.as_deref(),
        kind,
        "representante do empregador",
    )?;
    let held_on = date_from(&calendar, MilestoneId::ElectoralCommission);

    let mut doc = start(ctx);
    doc.title("ATA DE CONSTITUIÇÃO DA COMISSÃO ELEITORAL")
        .aligned(&format!("CIPA - Gestão {}", ctx.term.year_label), Align::Center)
        .blank()
        .paragraph(&format!(
            "Aos {}, nas dependências da empresa {}, foi constituída a Comissão Eleitoral \
             responsável pela organização e acompanhamento do processo eleitoral da CIPA, \
             conforme item 5.5.3 da NR-5.",
            format_long_pt(held_on),
            company_line(ctx)
        ))
        .blank()
        .field("Representante do empregador", representative)
        .field("Início das inscrições", &date_of(&calendar, MilestoneId::RegistrationOpen))
        .field("Data da eleição", &date_of(&calendar, MilestoneId::VotingDay))
        .blank()
        .paragraph(
            "Nada mais havendo a tratar, lavrou-se a presente ata, que vai assinada pelos \
             membros da comissão.",
        )
        .signature_line(representative, "Representante do empregador");

    if let Some(president) = ctx.president_name() {
        doc.signature_line(president, "Presidente da CIPA");
    }
    Ok(doc)
}

pub(super) fn candidacy_form(ctx: &DocumentContext) -> Result<DocxBuilder, DocumentError> {
    let kind = DocumentKind::CandidacyForm;
    let calendar = require(ctx.calendar(), kind, "data de posse anterior")?;

    let mut doc = start(ctx);
    doc.title("FICHA DE INSCRIÇÃO DE CANDIDATO")
        .aligned(&format!("Eleição CIPA - Gestão {}", ctx.term.year_label), Align::Center)
        .blank()
        .field("Empresa", &company_line(ctx))
        .field(
            "Período de inscrição",
            &format!(
                "{} a {}",
                date_of(&calendar, MilestoneId::RegistrationOpen),
                date_of(&calendar, MilestoneId::RegistrationClose)
            ),
        )
        .blank()
        .field("Nome", "______________________________________________")
        .field("Cargo / Função", "____________________________________")
        .field("Setor", "______________________________________________")
        .blank()
        .paragraph(
            "Declaro minha candidatura à representação dos empregados na CIPA e estou ciente \
             das atribuições previstas na NR-5.",
        )
        .signature_line("Assinatura do candidato", "Data: ____/____/______")
        .blank()
        .heading("Recibo de inscrição")
        .paragraph("Recebemos a inscrição do(a) candidato(a) acima identificado(a).")
        .signature_line("Comissão Eleitoral", "Data: ____/____/______");
    Ok(doc)
}

pub(super) fn candidate_list_notice(ctx: &DocumentContext) -> Result<DocxBuilder, DocumentError> {
    let kind = DocumentKind::CandidateListNotice;
    let first = ctx.candidates.first();
    require(first, kind, "candidatos inscritos")?;

    let mut candidates: Vec<_> = ctx.candidates.iter().collect();
    candidates.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let rows: Vec<Vec<String>> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            vec![
                (i + 1).to_string(),
                c.name.clone(),
                c.job_title.clone().unwrap_or_default(),
                match c.status {
                    CandidateStatus::Approved => "Deferida".to_string(),
                    CandidateStatus::PendingSignature => "Aguardando assinatura".to_string(),
                },
            ]
        })
        .collect();

    let mut doc = start(ctx);
    doc.title("EDITAL DE DIVULGAÇÃO DOS CANDIDATOS")
        .aligned(&format!("Eleição CIPA - Gestão {}", ctx.term.year_label), Align::Center)
        .blank()
        .paragraph(&format!(
            "A Comissão Eleitoral da empresa {} torna pública a relação dos empregados \
             inscritos como candidatos à eleição da CIPA:",
            company_line(ctx)
        ))
        .blank()
        .table(&["Nº", "Nome", "Cargo", "Inscrição"], &rows);

    if let Some(calendar) = ctx.calendar() {
        doc.field("Data da eleição", &date_of(&calendar, MilestoneId::VotingDay));
    }
    if let Some(location) = ctx.election_location() {
        doc.field("Local", location);
    }
    doc.signature_line("Comissão Eleitoral", "");
    Ok(doc)
}

pub(super) fn voter_attendance_sheet(ctx: &DocumentContext) -> Result<DocxBuilder, DocumentError> {
    let kind = DocumentKind::VoterAttendanceSheet;
    let location = require(ctx.election_location(), kind, "local da eleição")?;
    let (opens, closes) = require(ctx.election_window(), kind, "horário da eleição")?;

    let rows: Vec<Vec<String>> = (1..=40)
        .map(|i| vec![i.to_string(), String::new(), String::new(), String::new()])
        .collect();

    let mut doc = start(ctx);
    doc.title("LISTA DE PRESENÇA - ELEIÇÃO DA CIPA")
        .aligned(&format!("Gestão {}", ctx.term.year_label), Align::Center)
        .blank()
        .field("Empresa", &company_line(ctx))
        .field("Local", location)
        .field("Horário", &format!("das {} às {}", hm(opens), hm(closes)));
    if let Some(calendar) = ctx.calendar() {
        doc.field("Data", &date_of(&calendar, MilestoneId::VotingDay));
    }
    doc.blank()
        .table(&["Nº", "Nome do eleitor", "Setor", "Assinatura"], &rows);
    Ok(doc)
}

pub(super) fn inauguration_minutes(ctx: &DocumentContext) -> Result<DocxBuilder, DocumentError> {
    let kind = DocumentKind::InaugurationMinutes;
    let president = require(ctx.president_name(), kind, "presidente")?;
    let vice = require(ctx.vice_president_name(), kind, "vice-presidente")?;

    let mut members: Vec<_> = ctx.members.iter().collect();
    members.sort_by_key(|m| (m.role as u8, m.name.to_lowercase()));

    let rows: Vec<Vec<String>> = members
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.role.label_pt().to_string(),
                match m.origin {
                    MemberOrigin::Empregador => "Indicado pelo empregador".to_string(),
                    MemberOrigin::Empregado => "Eleito pelos empregados".to_string(),
                },
                m.votes.map(|v| v.to_string()).unwrap_or_default(),
            ]
        })
        .collect();

    let held_on = ctx
        .calendar()
        .map(|c| date_from(&c, MilestoneId::Inauguration))
        .unwrap_or(ctx.term.start_date);

    let mut doc = start(ctx);
    doc.title("ATA DE INSTALAÇÃO E POSSE DA CIPA")
        .aligned(&format!("Gestão {}", ctx.term.year_label), Align::Center)
        .blank()
        .paragraph(&format!(
            "Aos {}, na empresa {}, realizou-se a reunião de instalação e posse dos membros da \
             Comissão Interna de Prevenção de Acidentes e de Assédio (CIPA), gestão {}, com \
             mandato de {} a {}, nos termos da NR-5.",
            format_long_pt(held_on),
            company_line(ctx),
            ctx.term.year_label,
            format_br(ctx.term.start_date),
            format_br(ctx.term.end_date)
        ))
        .blank()
        .field("Presidente", president)
        .field("Vice-Presidente", vice)
        .blank()
        .table(&["Nome", "Função", "Representação", "Votos"], &rows)
        .paragraph("Os membros empossados assinam a presente ata.")
        .signature_line(president, "Presidente")
        .signature_line(vice, "Vice-Presidente");
    Ok(doc)
}

pub(super) fn meeting_minutes(
    ctx: &DocumentContext,
    meeting: &Meeting,
    plans: &[ActionPlanEntry],
) -> Result<DocxBuilder, DocumentError> {
    let mut doc = start(ctx);
    doc.title(&format!("ATA DE REUNIÃO {}", meeting.kind.label_pt().to_uppercase()))
        .aligned(&format!("CIPA - Gestão {}", ctx.term.year_label), Align::Center)
        .blank()
        .field("Empresa", &company_line(ctx))
        .field("Data", &format_br(meeting.date))
        .field("Assunto", &meeting.title)
        .blank();

    if !meeting.description.trim().is_empty() {
        doc.heading("Registro").paragraph(&meeting.description).blank();
    }

    if !ctx.members.is_empty() {
        let rows: Vec<Vec<String>> = ctx
            .members
            .iter()
            .map(|m| vec![m.name.clone(), m.role.label_pt().to_string(), String::new()])
            .collect();
        doc.heading("Presentes")
            .table(&["Nome", "Função", "Assinatura"], &rows);
    }

    if !plans.is_empty() {
        let rows: Vec<Vec<String>> = plans
            .iter()
            .map(|p| {
                vec![
                    p.plan.description.clone(),
                    p.responsible_name.clone().unwrap_or_else(|| "-".to_string()),
                    format_br(p.plan.deadline),
                    p.plan.status.label_pt().to_string(),
                ]
            })
            .collect();
        doc.heading("Plano de ação")
            .table(&["Ação", "Responsável", "Prazo", "Situação"], &rows);
    }

    doc.aligned(&place_and_date(ctx, meeting.date), Align::Right);
    if let Some(president) = ctx.president_name() {
        doc.signature_line(president, "Presidente da CIPA");
    }
    Ok(doc)
}

//! Timestamp and calendar-day utilities
//!
//! Regulatory rules compare dates at day granularity. Everything here works on
//! [`NaiveDate`] so that time-of-day and timezone offsets never shift a result.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc, Weekday};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current calendar day in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Whole days from `earlier` to `later` (negative when `later` precedes `earlier`)
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Add whole years, clamping Feb 29 to Feb 28 on non-leap targets
pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_add_months(Months::new(years * 12))
        .unwrap_or(NaiveDate::MAX)
}

/// Move a Saturday back to Friday and a Sunday back to Friday
pub fn shift_weekend_to_friday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - chrono::Duration::days(1),
        Weekday::Sun => date - chrono::Duration::days(2),
        _ => date,
    }
}

/// Portuguese weekday name as printed on notices ("segunda-feira", "sábado")
pub fn weekday_name_pt(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// Portuguese month name ("janeiro" … "dezembro")
pub fn month_name_pt(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "janeiro", "fevereiro", "março", "abril", "maio", "junho",
        "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
    ];
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// `dd/mm/yyyy`
pub fn format_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Long form used in minutes: "15 de junho de 2024"
pub fn format_long_pt(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        month_name_pt(date.month()),
        date.year()
    )
}

use chrono::{DateTime, NaiveDate};

use crate::errors::AppError;

/// Parses a 24-hour `H:MM` or `HH:MM` time and returns it as `HH:MM`.
pub fn normalize_time(raw: &str) -> Result<String, AppError> {
    parse_time(raw)
        .map(|(hour, minute)| format!("{hour:02}:{minute:02}"))
        .ok_or_else(|| {
            AppError::Validation(format!("Invalid time '{raw}', expected HH:MM (24-hour)"))
        })
}

fn parse_time(raw: &str) -> Option<(u32, u32)> {
    let (h, m) = raw.trim().split_once(':')?;
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
        return None;
    }

    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its calendar date is kept).
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

/// `25 Feb 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// `15:00` becomes `3:00 PM`. Unparseable input is returned unchanged.
pub fn format_time(time: &str) -> String {
    match parse_time(time) {
        Some((hour, minute)) => {
            let suffix = if hour >= 12 { "PM" } else { "AM" };
            let display = match hour % 12 {
                0 => 12,
                h => h,
            };
            format!("{display}:{minute:02} {suffix}")
        }
        None => time.to_string(),
    }
}

//! Temporal expression normalization
//!
//! Converts relative and absolute date expressions to canonical
//! `YYYY-MM-DD` dates. Ambiguous or unparseable input yields `None`, never
//! an error.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use mandi_config::constants::scrape::EXTERNAL_DATE_FORMAT;

static IN_DAYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"in\s+(\d{1,4})\s+days?").unwrap());
static IN_WEEKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"in\s+(\d{1,4})\s+weeks?").unwrap());
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap());
static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").unwrap());

/// Normalize a date expression relative to `reference`.
///
/// Recognizes exact keywords (`today`, `tomorrow`, ...), relative offsets
/// (`in N days`, `next week`), ISO dates, and day-first `D/M/Y` dates with
/// 2- or 4-digit years (2-digit years are taken as 2000s).
pub fn normalize_time(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return None;
    }

    match t.as_str() {
        "today" | "tod" | "now" => return Some(reference),
        "yesterday" | "yest" => return shift_days(reference, -1),
        "tomorrow" | "tmw" => return shift_days(reference, 1),
        _ => {}
    }

    if t.contains("day after tomorrow") {
        return shift_days(reference, 2);
    }
    if t.contains("day before yesterday") {
        return shift_days(reference, -2);
    }

    if let Some(caps) = IN_DAYS.captures(&t) {
        let days: i64 = caps[1].parse().ok()?;
        return shift_days(reference, days);
    }
    if let Some(caps) = IN_WEEKS.captures(&t) {
        let weeks: i64 = caps[1].parse().ok()?;
        return shift_days(reference, weeks * 7);
    }

    if t.contains("next week") {
        return shift_days(reference, 7);
    }
    if t.contains("last week") {
        return shift_days(reference, -7);
    }
    if t.contains("this week") {
        return Some(reference);
    }

    // Absolute dates: ISO first so `2024-05-02` is not misread as D-M-Y.
    if let Some(caps) = ISO_DATE.captures(&t) {
        return NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
    }
    if let Some(caps) = NUMERIC_DATE.captures(&t) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if caps[3].len() == 2 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// Reformat a canonical `YYYY-MM-DD` string into the `DD-Mon-YYYY` form the
/// external listing site expects. Invalid input yields `None`, never a
/// default.
pub fn to_external_date_format(canonical: &str) -> Option<String> {
    NaiveDate::parse_from_str(canonical.trim(), "%Y-%m-%d")
        .ok()
        .map(|date| date.format(EXTERNAL_DATE_FORMAT).to_string())
}

fn shift_days(reference: NaiveDate, days: i64) -> Option<NaiveDate> {
    reference.checked_add_signed(Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_keywords_are_reference_relative() {
        let r = reference();
        assert_eq!(normalize_time("today", r), Some(r));
        assert_eq!(normalize_time("now", r), Some(r));
        assert_eq!(
            normalize_time("tomorrow", r),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
        assert_eq!(
            normalize_time("yesterday", r),
            NaiveDate::from_ymd_opt(2024, 4, 30)
        );
        assert_eq!(
            normalize_time("day after tomorrow", r),
            NaiveDate::from_ymd_opt(2024, 5, 3)
        );
        assert_eq!(
            normalize_time("day before yesterday", r),
            NaiveDate::from_ymd_opt(2024, 4, 29)
        );
    }

    #[test]
    fn test_relative_offsets() {
        let r = reference();
        assert_eq!(
            normalize_time("in 3 days", r),
            NaiveDate::from_ymd_opt(2024, 5, 4)
        );
        assert_eq!(
            normalize_time("in 2 weeks", r),
            NaiveDate::from_ymd_opt(2024, 5, 15)
        );
        assert_eq!(
            normalize_time("next week", r),
            NaiveDate::from_ymd_opt(2024, 5, 8)
        );
        assert_eq!(
            normalize_time("last week", r),
            NaiveDate::from_ymd_opt(2024, 4, 24)
        );
        assert_eq!(normalize_time("this week", r), Some(r));
    }

    #[test]
    fn test_absolute_dates() {
        let r = reference();
        assert_eq!(
            normalize_time("2024-08-25", r),
            NaiveDate::from_ymd_opt(2024, 8, 25)
        );
        assert_eq!(
            normalize_time("25/08/2025", r),
            NaiveDate::from_ymd_opt(2025, 8, 25)
        );
        assert_eq!(
            normalize_time("25-08-25", r),
            NaiveDate::from_ymd_opt(2025, 8, 25)
        );
        // Day-first: 5 June, not 6 May.
        assert_eq!(
            normalize_time("5/6/2024", r),
            NaiveDate::from_ymd_opt(2024, 6, 5)
        );
    }

    #[test]
    fn test_unparseable_input_is_absent() {
        let r = reference();
        assert_eq!(normalize_time("", r), None);
        assert_eq!(normalize_time("whenever", r), None);
        assert_eq!(normalize_time("31/02/2024", r), None);
        assert_eq!(normalize_time("next month", r), None);
    }

    #[test]
    fn test_external_format_round_trip() {
        let r = reference();
        let normalized = normalize_time("tomorrow", r).unwrap();
        assert_eq!(normalized.to_string(), "2024-05-02");
        assert_eq!(
            to_external_date_format("2024-05-02").as_deref(),
            Some("02-May-2024")
        );
    }

    #[test]
    fn test_external_format_rejects_invalid() {
        assert_eq!(to_external_date_format("02-May-2024"), None);
        assert_eq!(to_external_date_format("2024-13-40"), None);
        assert_eq!(to_external_date_format(""), None);
    }
}

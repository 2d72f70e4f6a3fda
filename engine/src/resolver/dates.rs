//! Date resolution
//!
//! Pulls a calendar date out of free text. Three stages are tried in order:
//! explicit format patterns (ISO, slash-separated, "D Month YYYY" in several
//! orderings), a fixed vocabulary of relative terms computed from the current
//! date, and a permissive month-day fallback. Explicit formats run before the
//! permissive fallback so an ambiguous numeric string is never guessed at
//! when an exact form is present.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;
use sdk::errors::EngineError;
use tracing::debug;

const MONTHS_LONG: &str =
    "january|february|march|april|may|june|july|august|september|october|november|december";
const MONTHS_ABBR: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";

/// Formats tried against an extracted candidate span, in order.
/// Day-first slash dates out-rank month-first, so 18/07/2025 is July 18.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Compiled date extraction rules.
pub struct DateRules {
    explicit: Vec<Regex>,
    relative: Regex,
    month_day: Regex,
    day_month: Regex,
}

impl DateRules {
    pub fn new() -> Result<Self, EngineError> {
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| EngineError::Pattern(e.to_string()))
        };

        let explicit = vec![
            compile(r"(\d{4}-\d{2}-\d{2})".to_string())?,
            compile(r"(\d{1,2}/\d{1,2}/\d{4})".to_string())?,
            compile(r"(\d{1,2}-\d{1,2}-\d{4})".to_string())?,
            compile(r"(\d{4}/\d{1,2}/\d{1,2})".to_string())?,
            compile(format!(r"(?i)(\d{{1,2}}\s+(?:{MONTHS_LONG}),?\s+\d{{4}})"))?,
            compile(format!(r"(?i)(\d{{1,2}}\s+(?:{MONTHS_ABBR})[a-z]*,?\s+\d{{4}})"))?,
            compile(format!(r"(?i)((?:{MONTHS_LONG})\s+\d{{1,2}},?\s+\d{{4}})"))?,
            compile(format!(r"(?i)((?:{MONTHS_ABBR})[a-z]*\s+\d{{1,2}},?\s+\d{{4}})"))?,
        ];

        let relative = compile(
            r"(?i)\b(today|tomorrow|yesterday|next\s+week|next\s+monday|next\s+friday)\b"
                .to_string(),
        )?;

        let month_day = compile(format!(r"(?i)\b((?:{MONTHS_LONG})\s+\d{{1,2}})\b"))?;
        let day_month = compile(format!(r"(?i)\b(\d{{1,2}}\s+(?:{MONTHS_LONG}))\b"))?;

        Ok(Self {
            explicit,
            relative,
            month_day,
            day_month,
        })
    }

    /// Resolve a date anywhere in `text`, relative terms computed from `today`.
    pub fn resolve(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        // Stage 1: explicit formats
        for pattern in &self.explicit {
            if let Some(m) = pattern.find(text) {
                if let Some(date) = parse_candidate(m.as_str()) {
                    debug!("Date matched explicitly: {} -> {}", m.as_str(), date);
                    return Some(date);
                }
            }
        }

        // Stage 2: relative vocabulary
        if let Some(m) = self.relative.find(text) {
            if let Some(date) = self.resolve_relative(m.as_str(), today) {
                debug!("Relative date matched: {} -> {}", m.as_str(), date);
                return Some(date);
            }
        }

        // Stage 3: permissive fallback, month-day without a year
        self.fallback(text, today)
    }

    /// Resolve one of the fixed relative terms. Unknown terms yield `None`.
    pub fn resolve_relative(&self, keyword: &str, today: NaiveDate) -> Option<NaiveDate> {
        let normalized = keyword.to_lowercase();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        match normalized.as_str() {
            "today" => Some(today),
            "tomorrow" => Some(today + Duration::days(1)),
            "yesterday" => Some(today - Duration::days(1)),
            "next week" => Some(next_working_day(today)),
            "next monday" => Some(next_weekday(today, Weekday::Mon)),
            "next friday" => Some(next_weekday(today, Weekday::Fri)),
            _ => None,
        }
    }

    /// "August 10" or "10 August" without a year resolves into the current
    /// year. An out-of-range day (February 30) yields `None`.
    fn fallback(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        for (pattern, month_first) in [(&self.month_day, true), (&self.day_month, false)] {
            if let Some(m) = pattern.find(text) {
                let mut parts = m.as_str().split_whitespace();
                let (first, second) = (parts.next()?, parts.next()?);
                let (month_name, day_str) = if month_first {
                    (first, second)
                } else {
                    (second, first)
                };
                let month = month_number(month_name)?;
                let day: u32 = day_str.parse().ok()?;
                if let Some(date) = NaiveDate::from_ymd_opt(today.year(), month, day) {
                    debug!("Fallback date matched: {} -> {}", m.as_str(), date);
                    return Some(date);
                }
            }
        }
        None
    }
}

/// Try every supported format against a candidate span.
fn parse_candidate(candidate: &str) -> Option<NaiveDate> {
    // Collapse runs of whitespace so the fixed formats line up
    let normalized = candidate.split_whitespace().collect::<Vec<_>>().join(" ");

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            return Some(date);
        }
    }
    None
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let months = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    months
        .iter()
        .position(|m| *m == name)
        .map(|i| (i + 1) as u32)
}

/// The next weekday after `today`, skipping weekends.
fn next_working_day(today: NaiveDate) -> NaiveDate {
    let mut date = today + Duration::days(1);
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}

/// The next occurrence of `target` strictly after `today`.
fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let mut days = (target.num_days_from_monday() as i64)
        - (today.weekday().num_days_from_monday() as i64);
    if days <= 0 {
        days += 7;
    }
    today + Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DateRules {
        DateRules::new().unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_date_resolves_idempotently() {
        let today = day(2025, 8, 1);
        assert_eq!(rules().resolve("2025-08-10", today), Some(day(2025, 8, 10)));
        // Resolving the resolved form again gives the same date
        assert_eq!(rules().resolve("2025-08-10", today), Some(day(2025, 8, 10)));
    }

    #[test]
    fn test_month_name_forms() {
        let today = day(2025, 8, 1);
        let r = rules();
        assert_eq!(
            r.resolve("meet on August 10, 2025 please", today),
            Some(day(2025, 8, 10))
        );
        assert_eq!(r.resolve("on 10 August 2025", today), Some(day(2025, 8, 10)));
        assert_eq!(r.resolve("by 18 Jul 2025", today), Some(day(2025, 7, 18)));
    }

    #[test]
    fn test_slash_dates_day_first() {
        let today = day(2025, 8, 1);
        assert_eq!(
            rules().resolve("deadline 18/07/2025", today),
            Some(day(2025, 7, 18))
        );
        // Month-first only when day-first cannot parse
        assert_eq!(
            rules().resolve("deadline 07/18/2025", today),
            Some(day(2025, 7, 18))
        );
    }

    #[test]
    fn test_relative_terms() {
        let r = rules();
        // 2025-08-01 is a Friday
        let today = day(2025, 8, 1);
        assert_eq!(r.resolve("let's sync today", today), Some(today));
        assert_eq!(r.resolve("tomorrow works", today), Some(day(2025, 8, 2)));
        assert_eq!(r.resolve("same as yesterday", today), Some(day(2025, 7, 31)));
        // Next working day after a Friday is Monday
        assert_eq!(r.resolve("sometime next week", today), Some(day(2025, 8, 4)));
        assert_eq!(r.resolve("next monday", today), Some(day(2025, 8, 4)));
        assert_eq!(r.resolve("next friday", today), Some(day(2025, 8, 8)));
    }

    #[test]
    fn test_next_weekday_never_today() {
        // Asking for "next monday" on a Monday jumps a full week
        let monday = day(2025, 8, 4);
        assert_eq!(next_weekday(monday, Weekday::Mon), day(2025, 8, 11));
    }

    #[test]
    fn test_fallback_without_year() {
        let today = day(2025, 8, 1);
        assert_eq!(
            rules().resolve("dinner on August 10", today),
            Some(day(2025, 8, 10))
        );
        assert_eq!(
            rules().resolve("dinner on 10 august", today),
            Some(day(2025, 8, 10))
        );
    }

    #[test]
    fn test_explicit_beats_fallback() {
        let today = day(2025, 8, 1);
        // A full date and a bare month-day in the same text: the explicit
        // form wins.
        assert_eq!(
            rules().resolve("move March 5 to 2025-09-01", today),
            Some(day(2025, 9, 1))
        );
    }

    #[test]
    fn test_unmatched_text_is_none() {
        let today = day(2025, 8, 1);
        assert_eq!(rules().resolve("no date here", today), None);
        assert_eq!(rules().resolve_relative("next month", today), None);
    }

    #[test]
    fn test_invalid_calendar_day_is_none() {
        let today = day(2025, 2, 1);
        assert_eq!(rules().resolve("February 30", today), None);
    }
}

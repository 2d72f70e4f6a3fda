//! Time-of-day resolution
//!
//! Clock-time regexes (12-hour with am/pm, 24-hour, with or without minutes)
//! are tried before a fuzzy fallback over day-part words (morning, noon,
//! midnight, ...). Whatever the input form, the output is a 24-hour
//! `NaiveTime`.

use chrono::NaiveTime;
use regex::Regex;
use sdk::errors::EngineError;
use tracing::debug;

use super::fuzzy;

/// Day-part vocabulary and the clock time each maps to.
const DAY_PARTS: &[(&str, (u32, u32))] = &[
    ("morning", (9, 0)),
    ("afternoon", (14, 0)),
    ("evening", (18, 0)),
    ("night", (20, 0)),
    ("noon", (12, 0)),
    ("midnight", (0, 0)),
];

/// Compiled time extraction rules.
pub struct TimeRules {
    clock: Vec<Regex>,
    normalize: Regex,
    time_guard: Regex,
}

impl TimeRules {
    pub fn new() -> Result<Self, EngineError> {
        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|e| EngineError::Pattern(e.to_string()));

        // Ordered: am/pm forms before bare 24-hour forms, so "5:30 pm" is
        // consumed whole rather than as "5:30".
        let clock = vec![
            compile(r"(?i)\b(\d{1,2}:\d{2}\s*(?:am|pm|a\.m\.|p\.m\.))")?,
            compile(r"(?i)\b(\d{1,2}\s*(?:am|pm|a\.m\.|p\.m\.))")?,
            compile(r"(?i)\bat\s+(\d{1,2}:\d{2})\b")?,
            compile(r"\b(\d{1,2}:\d{2})\b")?,
        ];

        let normalize = compile(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?$")?;

        let time_guard = compile(
            r"(?i)\b\d{1,2}:\d{2}(?:\s*(?:am|pm))?\b|\b\d{1,2}\s*(?:am|pm)\b|\bnoon\b|\bmidnight\b|\bmorning\b|\bevening\b|\bafternoon\b|\bnight\b",
        )?;

        Ok(Self {
            clock,
            normalize,
            time_guard,
        })
    }

    /// Resolve a time of day anywhere in `text`.
    pub fn resolve(&self, text: &str) -> Option<NaiveTime> {
        for pattern in &self.clock {
            if let Some(caps) = pattern.captures(text) {
                let raw = caps.get(1)?.as_str();
                if let Some(time) = self.normalize_clock(raw) {
                    debug!("Time matched: {} -> {}", raw, time.format("%H:%M"));
                    return Some(time);
                }
            }
        }

        // Fuzzy fallback over day-part words
        for word in text.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if word.len() < 4 {
                continue;
            }
            if let Some((part, _)) =
                fuzzy::best_match(word, DAY_PARTS.iter().map(|(name, _)| *name), 80)
            {
                let (h, m) = DAY_PARTS
                    .iter()
                    .find(|(name, _)| *name == part)
                    .map(|(_, hm)| *hm)?;
                debug!("Day-part matched: {} -> {:02}:{:02}", word, h, m);
                return NaiveTime::from_hms_opt(h, m, 0);
            }
        }

        None
    }

    /// Normalize a captured clock string to a 24-hour `NaiveTime`.
    ///
    /// "5 pm" becomes 17:00, "12 am" becomes 00:00, "12 pm" stays 12:00.
    fn normalize_clock(&self, raw: &str) -> Option<NaiveTime> {
        let caps = self.normalize.captures(raw.trim())?;

        let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        let meridiem = caps
            .get(3)
            .map(|m| m.as_str().to_lowercase().replace('.', ""));

        match meridiem.as_deref() {
            Some("pm") if hour != 12 => hour += 12,
            Some("am") if hour == 12 => hour = 0,
            _ => {}
        }

        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    /// True when the span reads as a time expression. Used to keep
    /// "meeting at 5pm" from parsing "5pm" as a location.
    pub fn looks_like_time(&self, text: &str) -> bool {
        self.time_guard.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TimeRules {
        TimeRules::new().unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_twelve_hour_forms() {
        let r = rules();
        assert_eq!(r.resolve("meet at 5 pm"), Some(t(17, 0)));
        assert_eq!(r.resolve("meet at 5:30pm"), Some(t(17, 30)));
        assert_eq!(r.resolve("around 11 AM"), Some(t(11, 0)));
        assert_eq!(r.resolve("at 12 pm sharp"), Some(t(12, 0)));
        assert_eq!(r.resolve("at 12 am"), Some(t(0, 0)));
        assert_eq!(r.resolve("by 9 a.m."), Some(t(9, 0)));
    }

    #[test]
    fn test_twenty_four_hour_forms() {
        let r = rules();
        assert_eq!(r.resolve("meet at 14:30"), Some(t(14, 30)));
        assert_eq!(r.resolve("17:00 works"), Some(t(17, 0)));
    }

    #[test]
    fn test_day_part_words() {
        let r = rules();
        assert_eq!(r.resolve("sometime in the morning"), Some(t(9, 0)));
        assert_eq!(r.resolve("afternoon please"), Some(t(14, 0)));
        assert_eq!(r.resolve("dinner in the evening"), Some(t(18, 0)));
        assert_eq!(r.resolve("at noon"), Some(t(12, 0)));
        assert_eq!(r.resolve("midnight deploy"), Some(t(0, 0)));
    }

    #[test]
    fn test_fuzzy_day_part_typo() {
        assert_eq!(rules().resolve("see you in the evenin"), Some(t(18, 0)));
    }

    #[test]
    fn test_bare_number_is_not_a_time() {
        let r = rules();
        assert_eq!(r.resolve("meet with 5 people"), None);
        assert_eq!(r.resolve("room 12"), None);
    }

    #[test]
    fn test_out_of_range_clock_is_none() {
        assert_eq!(rules().resolve("at 27:00"), None);
    }

    #[test]
    fn test_looks_like_time_guard() {
        let r = rules();
        assert!(r.looks_like_time("5pm"));
        assert!(r.looks_like_time("14:30"));
        assert!(r.looks_like_time("noon"));
        assert!(!r.looks_like_time("Hyderabad"));
        assert!(!r.looks_like_time("Conference Room 4"));
    }
}

//! Entity resolution
//!
//! Resolves the fuzzy, human side of a query against hard data: name-like
//! tokens against the directory snapshot, date fragments against calendar
//! grammars, time fragments against clock grammars. Resolution never fails
//! loudly; unmatched input degrades to `None`, an empty set, or an explicit
//! ask-the-user marker so the orchestrator can decide between silent
//! omission, default substitution, and clarification.

pub mod dates;
pub mod fuzzy;
pub mod times;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use sdk::errors::EngineError;
use sdk::types::Person;
use tracing::debug;

use dates::DateRules;
use times::TimeRules;

/// Fuzzy threshold for tokens longer than two characters
const FUZZY_CUTOFF: u32 = 80;

/// Fuzzy threshold for two-character-or-shorter tokens, where edit distance
/// is too coarse for the higher bar
const FUZZY_CUTOFF_SHORT: u32 = 60;

/// Phrases that mean "the whole directory"
const EVERYONE_KEYWORDS: &[&str] = &[
    "everyone",
    "all employees",
    "everybody",
    "all team",
    "entire team",
];

/// Words that regex-based name extraction keeps producing but that are never
/// names: articles, pronouns, group nouns.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "also", "some", "any", "none", "all", "each", "other", "others", "another", "such", "one",
    "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "group", "team",
    "member", "members", "person", "people", "attendees", "participant", "participants", "guest",
    "guests", "user", "users", "employee", "employees", "colleague", "colleagues", "friend",
    "friends", "boss", "manager", "lead", "staff", "crew", "everyone", "everybody", "anyone",
    "nobody", "somebody", "anybody", "someone", "who", "whom", "whose", "which", "that", "this",
    "these", "those", "me", "you", "us", "we", "i", "he", "she", "they", "it", "him", "her",
    "them", "my", "your", "our", "their", "his", "hers", "its", "theirs", "myself", "yourself",
    "ourselves", "himself", "herself", "itself", "themselves",
];

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "mon",
    "tue",
    "wed",
    "thu",
    "fri",
    "sat",
    "sun",
];

const MONTHS: &[&str] = &[
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
    "jan",
    "feb",
    "mar",
    "apr",
    "jun",
    "jul",
    "aug",
    "sep",
    "oct",
    "nov",
    "dec",
];

/// Outcome of resolving one name-like fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum PersonResolution {
    /// Matched a directory entry
    Resolved(Person),
    /// A fragment that looked like a name but matched nobody
    Unresolved(String),
    /// Nothing name-like resolved at all; the user must be asked
    AskUser,
}

/// Result of `filter_ambiguous`: surviving names, already-valid emails, and
/// one human-readable warning per rejected token.
#[derive(Debug, Default, Clone)]
pub struct FilterOutcome {
    pub accepted: Vec<String>,
    pub emails: Vec<String>,
    pub warnings: Vec<String>,
}

/// Resolves names, dates, and times against a loaded directory snapshot.
///
/// Owns no mutable state: the snapshot is fixed at construction, and every
/// resolve call is a pure function of its inputs.
pub struct EntityResolver {
    people: Vec<Person>,
    date_rules: DateRules,
    time_rules: TimeRules,
    email_shape: Regex,
}

impl EntityResolver {
    pub fn new(people: Vec<Person>) -> Result<Self, EngineError> {
        Ok(Self {
            people,
            date_rules: DateRules::new()?,
            time_rules: TimeRules::new()?,
            email_shape: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .map_err(|e| EngineError::Pattern(e.to_string()))?,
        })
    }

    /// The directory snapshot this resolver works against.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Scan `text` for people, in three passes of decreasing confidence:
    ///
    /// 1. exact multi-word name containment, longest match wins
    /// 2. exact single-token match against first names and name segments
    /// 3. fuzzy token-sort similarity above the threshold
    ///
    /// An "everyone" keyword short-circuits to the full directory. If nothing
    /// resolves, the result is a single `AskUser` marker, never a silently
    /// empty list.
    pub fn resolve_people(&self, text: &str) -> Vec<PersonResolution> {
        let lower = text.to_lowercase();

        if EVERYONE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            debug!("Everyone keyword present, resolving to full directory");
            return self
                .people
                .iter()
                .cloned()
                .map(PersonResolution::Resolved)
                .collect();
        }

        let mut found: Vec<Person> = Vec::new();
        let mut consumed: Vec<(usize, usize)> = Vec::new();

        // Pass 1: multi-word names, longest first so "Om Patel" beats "Om"
        let mut multi_word: Vec<&Person> =
            self.people.iter().filter(|p| p.name.contains(' ')).collect();
        multi_word.sort_by_key(|p| std::cmp::Reverse(p.name.len()));

        for person in multi_word {
            let needle = person.name.to_lowercase();
            if let Some(span) = find_word_span(&lower, &needle) {
                if overlaps_any(&consumed, span) {
                    continue;
                }
                consumed.push(span);
                push_unique(&mut found, person.clone());
            }
        }

        // Pass 2: single tokens against first names and one-word names.
        // If two directory entries share a first name, directory order
        // decides.
        for (start, token) in tokenize(&lower) {
            let span = (start, start + token.len());
            if overlaps_any(&consumed, span) {
                continue;
            }
            if let Some(person) = self
                .people
                .iter()
                .find(|p| p.first_name().to_lowercase() == token || p.name.to_lowercase() == token)
            {
                consumed.push(span);
                push_unique(&mut found, person.clone());
            }
        }

        // Pass 3: fuzzy over the comma/"and" segments that still resolved
        // nothing
        for segment in split_segments(text) {
            let segment_lower = segment.to_lowercase();
            let segment_lower = segment_lower.trim();
            if segment_lower.is_empty() {
                continue;
            }
            if found
                .iter()
                .any(|p| segment_lower.contains(&p.name.to_lowercase()))
            {
                continue;
            }
            let cutoff = if segment_lower.chars().count() > 2 {
                FUZZY_CUTOFF
            } else {
                FUZZY_CUTOFF_SHORT
            };
            let names: Vec<String> = self.people.iter().map(|p| p.name.to_lowercase()).collect();
            if let Some((name, score)) =
                fuzzy::best_match(segment_lower, names.iter().map(String::as_str), cutoff)
            {
                debug!("Fuzzy name match: '{}' -> '{}' ({})", segment_lower, name, score);
                if let Some(person) = self
                    .people
                    .iter()
                    .find(|p| p.name.to_lowercase() == name)
                    .cloned()
                {
                    push_unique(&mut found, person);
                }
            }
        }

        // Pass 4: capitalized unknown tokens become explicit unresolved
        // markers instead of disappearing. Sentence-initial capitalization
        // says nothing, and byte offsets only line up with the lowercased
        // text when lowercasing kept lengths.
        let mut unresolved: Vec<String> = Vec::new();
        if text.len() == lower.len() {
            for (start, token) in tokenize(text) {
                if start == 0 {
                    continue;
                }
                let span = (start, start + token.len());
                if overlaps_any(&consumed, span) {
                    continue;
                }
                if !token.chars().next().is_some_and(|c| c.is_uppercase())
                    || token.chars().count() <= 2
                {
                    continue;
                }
                let token_lower = token.to_lowercase();
                if STOPWORDS.contains(&token_lower.as_str())
                    || WEEKDAYS.contains(&token_lower.as_str())
                    || MONTHS.contains(&token_lower.as_str())
                {
                    continue;
                }
                if found.iter().any(|p| {
                    let name = p.name.to_lowercase();
                    name.contains(&token_lower) || token_lower.contains(&name)
                }) {
                    continue;
                }
                unresolved.push(token);
            }
        }

        let mut out: Vec<PersonResolution> = found
            .into_iter()
            .map(PersonResolution::Resolved)
            .collect();
        out.extend(unresolved.into_iter().map(PersonResolution::Unresolved));

        if out.is_empty() {
            return vec![PersonResolution::AskUser];
        }
        out
    }

    /// Map a name or email-shaped string to a canonical email.
    ///
    /// Directory matches (exact name, exact email, first name, then fuzzy)
    /// are preferred; only when the directory has no answer does an
    /// email-shaped input pass through verbatim.
    pub fn resolve_email(&self, name_or_email: &str) -> Option<String> {
        let key = name_or_email.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        // Exact name
        if let Some(p) = self.people.iter().find(|p| p.name.to_lowercase() == key) {
            return Some(p.email.clone());
        }
        // Exact email
        if let Some(p) = self.people.iter().find(|p| p.email.to_lowercase() == key) {
            return Some(p.email.clone());
        }
        // First name
        if let Some(p) = self
            .people
            .iter()
            .find(|p| p.first_name().to_lowercase() == key)
        {
            return Some(p.email.clone());
        }

        // Fuzzy against names, lower bar for very short keys
        let cutoff = if key.chars().count() > 2 {
            FUZZY_CUTOFF
        } else {
            FUZZY_CUTOFF_SHORT
        };
        let names: Vec<String> = self.people.iter().map(|p| p.name.to_lowercase()).collect();
        if let Some((name, _)) = fuzzy::best_match(&key, names.iter().map(String::as_str), cutoff) {
            if let Some(p) = self.people.iter().find(|p| p.name.to_lowercase() == name) {
                return Some(p.email.clone());
            }
        }

        // Email-shaped strings pass through even when unknown to the
        // directory
        if self.is_valid_email(name_or_email.trim()) {
            return Some(name_or_email.trim().to_string());
        }

        None
    }

    /// Strip non-name tokens out of raw candidates, with a warning per
    /// rejected token instead of a silent drop.
    pub fn filter_ambiguous(&self, candidates: &[String]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for candidate in candidates {
            let token = candidate.trim();
            if token.is_empty() {
                continue;
            }
            let lower = token.to_lowercase();

            if STOPWORDS.contains(&lower.as_str()) || WEEKDAYS.contains(&lower.as_str()) {
                outcome
                    .warnings
                    .push(format!("Ignored ambiguous or non-name: '{}'", token));
                continue;
            }
            if self.is_valid_email(token) {
                outcome.emails.push(token.to_string());
                continue;
            }
            if self.resolve_email(token).is_none() {
                outcome
                    .warnings
                    .push(format!("Unrecognized name or email: '{}'", token));
                continue;
            }
            outcome.accepted.push(token.to_string());
        }

        outcome
    }

    /// Resolve a date anywhere in `text`, relative terms anchored at `today`.
    pub fn resolve_date(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        self.date_rules.resolve(text, today)
    }

    /// Resolve one of the fixed relative-date keywords.
    pub fn resolve_relative_date(&self, keyword: &str, today: NaiveDate) -> Option<NaiveDate> {
        self.date_rules.resolve_relative(keyword, today)
    }

    /// Resolve a time of day anywhere in `text`.
    pub fn resolve_time(&self, text: &str) -> Option<NaiveTime> {
        self.time_rules.resolve(text)
    }

    /// True when the span reads as a time expression.
    pub fn looks_like_time(&self, text: &str) -> bool {
        self.time_rules.looks_like_time(text)
    }

    /// Strict email shape check.
    pub fn is_valid_email(&self, candidate: &str) -> bool {
        self.email_shape.is_match(candidate)
    }
}

/// Byte span of `needle` in `haystack` at word boundaries.
fn find_word_span(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let mut search_from = 0;
    while let Some(rel) = haystack[search_from..].find(needle) {
        let start = search_from + rel;
        let end = start + needle.len();
        let boundary_before = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let boundary_after = end == haystack.len()
            || !haystack[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if boundary_before && boundary_after {
            return Some((start, end));
        }
        search_from = end;
    }
    None
}

fn overlaps_any(spans: &[(usize, usize)], candidate: (usize, usize)) -> bool {
    spans
        .iter()
        .any(|&(start, end)| candidate.0 < end && start < candidate.1)
}

/// Alphanumeric word tokens with their byte offsets.
fn tokenize(text: &str) -> Vec<(usize, String)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            tokens.push((s, text[s..i].to_string()));
        }
    }
    if let Some(s) = start {
        tokens.push((s, text[s..].to_string()));
    }
    tokens
}

/// Split on the separators people use between names: commas, "and", "&".
fn split_segments(text: &str) -> Vec<String> {
    let mut segments = vec![text.to_string()];
    for separator in [",", " and ", " & "] {
        segments = segments
            .iter()
            .flat_map(|s| s.split(separator))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    segments
}

fn push_unique(found: &mut Vec<Person>, person: Person) {
    if !found
        .iter()
        .any(|p| p.email.to_lowercase() == person.email.to_lowercase())
    {
        found.push(person);
    }
}

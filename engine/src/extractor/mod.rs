//! Intent classification and field extraction
//!
//! Turns a raw query into a typed `Goal`: one intent from a closed set plus
//! whatever structured fields the query surrendered. Classification is a
//! first-match-wins walk over an ordered rule table; there is no scoring, so
//! the table order is part of the contract. Specific intents come before
//! generic ones: "email the team about the meeting notes" must classify as
//! Email even though it mentions a meeting.

pub mod goal;

use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use sdk::errors::EngineError;
use tracing::debug;

use crate::resolver::{fuzzy, EntityResolver, PersonResolution};
pub use goal::{Goal, Intent, RecipientResolution, Validation};

/// Meeting-type phrases tried by fuzzy title matching before the default.
const COMMON_MEETING_TYPES: &[&str] = &[
    "project planning",
    "status update",
    "review",
    "discussion",
    "brainstorming",
    "planning",
    "sync",
    "catch up",
    "check-in",
    "weekly review",
    "monthly review",
    "quarterly review",
    "team meeting",
    "client meeting",
    "stakeholder meeting",
];

/// Ordered cuisine keyword table, first match wins. Specific labels sit
/// above the generic ones they overlap with, so "Hyderabadi biryani" is
/// Hyderabadi while bare "biryani" is Indian.
const CUISINE_KEYWORDS: &[(&str, &str)] = &[
    ("hyderabadi", "Hyderabadi"),
    ("haleem", "Hyderabadi"),
    ("indian", "Indian"),
    ("curry", "Indian"),
    ("biryani", "Indian"),
    ("tandoori", "Indian"),
    ("chinese", "Chinese"),
    ("szechuan", "Chinese"),
    ("cantonese", "Chinese"),
    ("italian", "Italian"),
    ("pizza", "Italian"),
    ("pasta", "Italian"),
    ("mexican", "Mexican"),
    ("taco", "Mexican"),
    ("burrito", "Mexican"),
    ("japanese", "Japanese"),
    ("sushi", "Japanese"),
    ("ramen", "Japanese"),
    ("pad thai", "Thai"),
    ("thai", "Thai"),
    ("mediterranean", "Mediterranean"),
    ("greek", "Mediterranean"),
    ("lebanese", "Mediterranean"),
    ("american", "American"),
    ("burger", "American"),
    ("steak", "American"),
];

/// Stop words stripped out of captured meeting titles.
const TITLE_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// One intent with its ordered trigger patterns.
struct IntentRule {
    intent: Intent,
    patterns: Vec<Regex>,
}

/// Classifies queries and extracts intent-specific fields.
pub struct IntentExtractor {
    resolver: Arc<EntityResolver>,
    rules: Vec<IntentRule>,
    title_patterns: Vec<Regex>,
    location_patterns: Vec<Regex>,
    duration_combined: Regex,
    duration_hours: Regex,
    duration_minutes: Regex,
    team_size_patterns: Vec<Regex>,
    subject_patterns: Vec<Regex>,
    message_patterns: Vec<Regex>,
    default_duration_minutes: u32,
}

impl IntentExtractor {
    pub fn new(
        resolver: Arc<EntityResolver>,
        default_duration_minutes: u32,
    ) -> Result<Self, EngineError> {
        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|e| EngineError::Pattern(e.to_string()));
        let compile_all = |patterns: &[&str]| -> Result<Vec<Regex>, EngineError> {
            patterns.iter().map(|p| compile(p)).collect()
        };

        // The intent table. Order matters and is pinned by tests: Email
        // before Availability before Dinner before Meeting, so verb-led
        // phrasings beat the catch-all "meeting" / "call" mentions.
        let rules = vec![
            IntentRule {
                intent: Intent::Email,
                patterns: compile_all(&[
                    r"^email\s",
                    r"^mail\s",
                    r"\bsend\b.*\bemail\b",
                    r"\bemail\s+\w+.*\b(?:about|regarding)\b",
                    r"\bwrite to\b",
                    r"\bgreet(?:ing)?\b",
                    r"\bcongratulate\b",
                    r"\bconvey\b",
                    r"\bnotify\b",
                    r"\binform\b.*\babout\b",
                    r"\btell\b.*\babout\b",
                    r"\blet\b.*\bknow\b",
                    r"\bupdate\b.*\babout\b",
                    r"\bannounce\b",
                    r"\bmessage\s",
                ])?,
            },
            IntentRule {
                intent: Intent::Availability,
                patterns: compile_all(&[
                    r"check\s+availability",
                    r"check\s+calendar",
                    r"check\s+schedule",
                    r"when\s+is\b.*\bfree",
                    r"when is.*available",
                    r"when can we meet",
                    r"find\s+free\s+time",
                    r"available\s+time",
                    r"find.*\bslots?\b",
                    r"find.*availability",
                    r"see\s+when.*free",
                    r"find\s+open\s+time",
                ])?,
            },
            IntentRule {
                intent: Intent::Dinner,
                patterns: compile_all(&[
                    r"organize\s+a\s+dinner",
                    r"book\s+a\s+restaurant",
                    r"find\s+a\s+restaurant",
                    r"find\s+restaurants?",
                    r"look for restaurants?",
                    r"search for restaurants?",
                    r"team\s+dinner",
                    r"celebratory\s+dinner",
                    r"dinner\s+for",
                    r"find.*cuisine",
                    r"find.*food",
                    r"book\s+a\s+table",
                    r"reserve\s+a\s+table",
                    r"team\s+lunch",
                    r"lunch\s+for",
                    r"team\s+meal",
                    r"show\s+(?:me\s+)?.*(?:food|restaurants?|places)",
                ])?,
            },
            IntentRule {
                intent: Intent::Meeting,
                patterns: compile_all(&[
                    r"setup\s+a\s+meeting",
                    r"schedule\s+a\s+meeting",
                    r"organize\s+a\s+meeting",
                    r"book\s+a\s+meeting",
                    r"arrange\s+a\s+meeting",
                    r"plan\s+a\s+meeting",
                    r"create\s+a\s+meeting",
                    r"set\s+(?:up\s+)?a\s+(?:meeting|call)",
                    r"arrange\s+a\s+call",
                    r"meeting\s+with",
                    r"meeting\s+for",
                    r"\bmeeting\b",
                    r"\bcall\b",
                    r"catch up",
                    r"1:1",
                    r"one on one",
                    r"let'?s\s+meet",
                    r"can we meet",
                    r"find time to meet",
                ])?,
            },
        ];

        let title_patterns = compile_all(&[
            r"(?:setup|schedule|organize|plan|create)\s+a\s+meeting\s+(?:about|for|on|regarding)\s+([^,\.]+)",
            r"meeting\s+with\s+.*?\s+(?:about|for|on|regarding)\s+([^,\.]+)",
            r"meeting\s+(?:about|for|on|regarding)\s+([^,\.]+)",
            r"call\s+(?:about|for|on|regarding)\s+([^,\.]+)",
            r"1:1\s+(?:about|for|on|regarding)\s+([^,\.]+)",
            r"one\s+on\s+one\s+(?:about|for|on|regarding)\s+([^,\.]+)",
        ])?;

        // Case-insensitive but run against the original query, so captured
        // locations keep their casing
        let location_patterns = compile_all(&[
            r"(?i)\bin\s+([^,]+)",
            r"(?i)\bat\s+([^,]+)",
            r"(?i)\bnear\s+([^,]+)",
            r"(?i)\baround\s+([^,]+)",
            r"(?i)location[:\s]+([^,]+)",
            r"(?i)venue[:\s]+([^,]+)",
        ])?;

        // Combined hour+minute phrasing first, or the shorter forms win and
        // drop the minutes
        let duration_combined =
            compile(r"(\d+)\s*(?:hour|hr)s?\s*(?:and\s+)?(\d+)\s*(?:minute|min)s?")?;
        let duration_hours = compile(r"(\d+)\s*(?:hour|hr)s?")?;
        let duration_minutes = compile(r"(\d+)\s*(?:minute|min)s?")?;

        let team_size_patterns = compile_all(&[
            r"(\d+)\s*person\s*team",
            r"(\d+)\s*people",
            r"team\s+of\s+(\d+)",
            r"(\d+)\s*attendees",
            r"(\d+)\s*members",
        ])?;

        // The colon, if any, starts the message body; keep it out of the
        // subject capture
        let subject_patterns = compile_all(&[r"about ([^\.:]+)", r"regarding ([^\.:]+)"])?;

        let message_patterns = compile_all(&[
            r"\bgreet(?:ing)?(?:\s+them|\s+\S+)?(?:\s+and\s+\S+)?[,\s]+(.+)",
            r"\binform(?:\s+them|\s+\S+)?(?:\s+and\s+\S+)?[,\s]+(.+)",
            r"\btell(?:\s+them|\s+\S+)?(?:\s+and\s+\S+)?[,\s]+(.+)",
            r"\bconvey(?:\s+to\s+\S+)?[,\s]+(.+)",
            r"\bsend an email(?:\s+to\s+\S+)?[,\s]+(.+)",
            r"\bemail(?:\s+to\s+\S+)?[,\s]+(.+)",
        ])?;

        Ok(Self {
            resolver,
            rules,
            title_patterns,
            location_patterns,
            duration_combined,
            duration_hours,
            duration_minutes,
            team_size_patterns,
            subject_patterns,
            message_patterns,
            default_duration_minutes,
        })
    }

    /// Classify and extract in one shot. `None` means the query matched no
    /// intent at all; that is terminal for the turn and the caller should
    /// ask the user to rephrase.
    pub fn classify_and_extract(&self, query: &str, today: NaiveDate) -> Option<Goal> {
        let lower = query.to_lowercase();
        let lower = lower.trim();

        let intent = self.classify(lower)?;
        debug!("Detected intent: {:?}", intent);

        let goal = match intent {
            Intent::Meeting => self.extract_meeting(query, lower, today),
            Intent::Dinner => self.extract_dinner(query, lower, today),
            Intent::Availability => self.extract_availability(query, lower, today),
            Intent::Email => self.extract_email(query, lower),
        };
        Some(goal)
    }

    /// First intent whose pattern list matches anywhere in the query.
    pub fn classify(&self, query_lower: &str) -> Option<Intent> {
        for rule in &self.rules {
            for pattern in &rule.patterns {
                if pattern.is_match(query_lower) {
                    return Some(rule.intent);
                }
            }
        }
        None
    }

    fn extract_meeting(&self, query: &str, lower: &str, today: NaiveDate) -> Goal {
        let mut goal = Goal::new(Intent::Meeting);

        goal.title = Some(self.extract_meeting_title(lower, today));
        goal.date = self.resolver.resolve_date(lower, today);
        goal.time = self.resolver.resolve_time(lower);
        goal.duration_minutes = Some(self.extract_duration(lower));
        goal.location = self.extract_location(query);
        self.fill_employees(&mut goal, query);

        goal
    }

    fn extract_dinner(&self, query: &str, lower: &str, today: NaiveDate) -> Goal {
        let mut goal = Goal::new(Intent::Dinner);

        goal.location = self.extract_location(query);
        goal.cuisine = self.extract_cuisine(lower);
        goal.date = self.resolver.resolve_date(lower, today);
        goal.time = self.resolver.resolve_time(lower);
        goal.team_size = self.extract_team_size(lower);
        self.fill_employees(&mut goal, query);

        goal
    }

    fn extract_availability(&self, query: &str, lower: &str, today: NaiveDate) -> Goal {
        let mut goal = Goal::new(Intent::Availability);

        goal.date = self.resolver.resolve_date(lower, today);
        self.fill_employees(&mut goal, query);

        goal
    }

    fn extract_email(&self, query: &str, lower: &str) -> Goal {
        let mut goal = Goal::new(Intent::Email);

        // Recipients: names through the resolver, plus raw email-shaped
        // tokens passed through directory-first resolution
        let resolutions = self.resolver.resolve_people(query);
        let mut emails: Vec<String> = Vec::new();
        for resolution in &resolutions {
            match resolution {
                PersonResolution::Resolved(person) => {
                    if !emails.contains(&person.email) {
                        emails.push(person.email.clone());
                    }
                }
                PersonResolution::Unresolved(token) => {
                    goal.warnings
                        .push(format!("Unrecognized recipient: '{}'", token));
                }
                PersonResolution::AskUser => {}
            }
        }
        for token in query.split_whitespace() {
            let token = token.trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ')' | '('));
            if self.resolver.is_valid_email(token) {
                if let Some(email) = self.resolver.resolve_email(token) {
                    if !emails.contains(&email) {
                        emails.push(email);
                    }
                }
            }
        }

        goal.recipients = if emails.is_empty() {
            goal.warnings
                .push("No recipient found. Please specify who to email.".to_string());
            RecipientResolution::AskUser
        } else {
            RecipientResolution::Resolved(emails)
        };

        // Subject from "about X" / "regarding X" phrasing
        for pattern in &self.subject_patterns {
            if let Some(caps) = pattern.captures(lower) {
                if let Some(m) = caps.get(1) {
                    goal.subject = Some(m.as_str().trim().to_string());
                    break;
                }
            }
        }

        // Message body: everything after the first colon wins, then the
        // verb-led patterns, then the whole query. The field is never empty.
        goal.message = if let Some((_, rest)) = query.split_once(':') {
            let rest = rest.trim();
            if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            }
        } else {
            None
        };
        if goal.message.is_none() {
            for pattern in &self.message_patterns {
                if let Some(caps) = pattern.captures(lower) {
                    if let Some(m) = caps.get(1) {
                        let captured = m.as_str().trim();
                        if !captured.is_empty() {
                            goal.message = Some(captured.to_string());
                            break;
                        }
                    }
                }
            }
        }
        if goal.message.is_none() {
            goal.message = Some(query.trim().to_string());
        }

        goal
    }

    /// Resolve employees out of the query and clean the result: candidates
    /// are re-intersected against the directory by case-insensitive
    /// containment in both directions, keeping overlapping matches, and
    /// already-valid emails from the raw list are appended directly.
    fn fill_employees(&self, goal: &mut Goal, query: &str) {
        let resolutions = self.resolver.resolve_people(query);

        let mut raw: Vec<String> = Vec::new();
        for resolution in &resolutions {
            match resolution {
                PersonResolution::Resolved(person) => raw.push(person.name.clone()),
                PersonResolution::Unresolved(token) => raw.push(token.clone()),
                PersonResolution::AskUser => {
                    goal.employees_ask_user = true;
                    return;
                }
            }
        }

        let (people, emails) = self.clean_employee_names(&raw);
        goal.employees = people;
        goal.employee_emails = emails;
    }

    /// Bidirectional containment against the directory. "om" pulls in
    /// "Om Patel" and "Om Patel" pulls in "Om"; overlapping matches are kept
    /// deliberately rather than deduplicated by naive string equality.
    fn clean_employee_names(&self, raw: &[String]) -> (Vec<sdk::types::Person>, Vec<String>) {
        let filtered = self.resolver.filter_ambiguous(raw);

        let mut people: Vec<sdk::types::Person> = Vec::new();
        for candidate in raw {
            let candidate_lower = candidate.to_lowercase();
            for person in self.resolver.people() {
                let name_lower = person.name.to_lowercase();
                if name_lower.contains(&candidate_lower) || candidate_lower.contains(&name_lower) {
                    if !people.iter().any(|p| p.email == person.email) {
                        people.push(person.clone());
                    }
                }
            }
        }

        let mut emails: Vec<String> = people.iter().map(|p| p.email.clone()).collect();
        for email in filtered.emails {
            if !emails.contains(&email) {
                emails.push(email);
            }
        }

        (people, emails)
    }

    /// Title from phrase patterns, then fuzzy common meeting types, then the
    /// "Team Meeting" default. Captures that are really attendee lists or
    /// dates fall through instead of becoming garbage titles.
    fn extract_meeting_title(&self, lower: &str, today: NaiveDate) -> String {
        for pattern in &self.title_patterns {
            if let Some(caps) = pattern.captures(lower) {
                if let Some(m) = caps.get(1) {
                    let candidate = m.as_str().trim();
                    if candidate.len() <= 3 {
                        continue;
                    }
                    if self.resolver.resolve_date(candidate, today).is_some() {
                        continue;
                    }
                    let contains_person = self.resolver.people().iter().any(|p| {
                        candidate.contains(&p.name.to_lowercase())
                            || candidate
                                .split_whitespace()
                                .any(|w| w == p.first_name().to_lowercase())
                    });
                    if contains_person {
                        continue;
                    }
                    return clean_title(candidate);
                }
            }
        }

        if let Some((phrase, _)) = fuzzy::best_match(lower, COMMON_MEETING_TYPES.iter().copied(), 70)
        {
            return title_case(phrase);
        }

        "Team Meeting".to_string()
    }

    /// Duration in minutes. Combined "N hours M minutes" phrasing is tried
    /// before hours-only and minutes-only; absent phrasing gets the default.
    fn extract_duration(&self, lower: &str) -> u32 {
        if let Some(caps) = self.duration_combined.captures(lower) {
            let hours: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            let minutes: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            return hours * 60 + minutes;
        }
        if let Some(caps) = self.duration_hours.captures(lower) {
            if let Some(hours) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                return hours * 60;
            }
        }
        if let Some(caps) = self.duration_minutes.captures(lower) {
            if let Some(minutes) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                return minutes;
            }
        }
        self.default_duration_minutes
    }

    /// Location from "in/at/near/around X" phrasing. A captured span that is
    /// itself a time expression is rejected, so "meeting at 5pm" never turns
    /// "5pm" into a location.
    fn extract_location(&self, query: &str) -> Option<String> {
        for pattern in &self.location_patterns {
            if let Some(caps) = pattern.captures(query) {
                if let Some(m) = caps.get(1) {
                    let candidate = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
                    if self.resolver.looks_like_time(&candidate) {
                        continue;
                    }
                    if candidate.len() > 2 {
                        debug!("Matched location: {}", candidate);
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    /// Cuisine from the ordered keyword table.
    fn extract_cuisine(&self, lower: &str) -> Option<String> {
        for (keyword, cuisine) in CUISINE_KEYWORDS {
            if lower.contains(keyword) {
                return Some((*cuisine).to_string());
            }
        }
        None
    }

    /// Team size from numeric phrasing, accepted only within 1..=50.
    fn extract_team_size(&self, lower: &str) -> Option<u32> {
        for pattern in &self.team_size_patterns {
            if let Some(caps) = pattern.captures(lower) {
                if let Some(size) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                    if (1..=50).contains(&size) {
                        return Some(size);
                    }
                }
            }
        }
        None
    }

    /// Required-field check, independent of extraction. Missing required
    /// fields are errors; missing advisory fields are warnings.
    pub fn validate_goal(&self, goal: &Goal) -> Validation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        match goal.intent {
            Intent::Meeting => {
                if goal.date.is_none() {
                    errors.push("Meeting date is required".to_string());
                }
                if goal.employees.is_empty() {
                    warnings.push("No specific employees mentioned".to_string());
                }
            }
            Intent::Dinner => {
                if goal.location.is_none() {
                    errors.push("Restaurant location is required".to_string());
                }
                if goal.team_size.is_none() && goal.employees.is_empty() {
                    warnings.push("Team size or specific employees not mentioned".to_string());
                }
            }
            Intent::Availability => {
                if goal.date.is_none() {
                    errors.push("Date is required for availability check".to_string());
                }
                if goal.employees.is_empty() {
                    errors.push("Employees are required for availability check".to_string());
                }
            }
            Intent::Email => {
                // Recipients and message are always populated as values;
                // the ask-user variant is handled by the orchestrator.
            }
        }

        Validation {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Fill defaults that extraction leaves open.
    pub fn enhance(&self, goal: &mut Goal) {
        match goal.intent {
            Intent::Meeting => {
                if goal.title.is_none() {
                    goal.title = Some("Team Meeting".to_string());
                }
                if goal.duration_minutes.is_none() {
                    goal.duration_minutes = Some(self.default_duration_minutes);
                }
                if goal.location.is_none() {
                    goal.location = Some("Conference Room".to_string());
                }
            }
            Intent::Dinner => {
                if goal.cuisine.is_none() {
                    goal.cuisine = Some("Any".to_string());
                }
                if goal.team_size.is_none() && !goal.employees.is_empty() {
                    goal.team_size = Some(goal.employees.len() as u32);
                }
            }
            _ => {}
        }
    }
}

/// Strip stop words and title-case what remains.
fn clean_title(raw: &str) -> String {
    let kept: Vec<&str> = raw
        .split_whitespace()
        .filter(|w| !TITLE_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    if kept.is_empty() {
        title_case(raw)
    } else {
        title_case(&kept.join(" "))
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

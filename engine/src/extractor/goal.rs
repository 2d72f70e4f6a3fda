//! Goal types
//!
//! The structured, intent-tagged result of extraction. Absent optional
//! fields stay `None` rather than holding placeholder values, so downstream
//! code can use presence checks uniformly.

use chrono::{NaiveDate, NaiveTime};
use sdk::types::{Person, Place};
use serde::Serialize;

/// The closed set of things the engine knows how to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Meeting,
    Dinner,
    Availability,
    Email,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Meeting => write!(f, "meeting"),
            Intent::Dinner => write!(f, "dinner"),
            Intent::Availability => write!(f, "availability"),
            Intent::Email => write!(f, "email"),
        }
    }
}

/// Recipient resolution outcome for email goals.
///
/// A tagged value rather than a sentinel string: the orchestrator needs to
/// tell "recipients resolved", "nobody found, ask the user", and "not an
/// email goal" apart without magic values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientResolution {
    /// Not an email goal
    NotApplicable,
    /// Nothing resolved; the user must say who to write to
    AskUser,
    /// Canonical recipient emails
    Resolved(Vec<String>),
}

/// Structured extraction result for one query.
#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub intent: Intent,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_size: Option<u32>,

    /// Resolved attendees
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub employees: Vec<Person>,

    /// Canonical attendee emails (resolved people plus raw addresses)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub employee_emails: Vec<String>,

    /// True when the query named nobody at all and attendees must be asked
    /// for explicitly
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub employees_ask_user: bool,

    pub recipients: RecipientResolution,

    /// The place the user picked from presented options. Set by the
    /// orchestrator when a selection comes back, never by extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_place: Option<Place>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Human-readable resolution warnings, surfaced rather than swallowed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Goal {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            title: None,
            date: None,
            time: None,
            duration_minutes: None,
            location: None,
            cuisine: None,
            team_size: None,
            employees: Vec::new(),
            employee_emails: Vec::new(),
            employees_ask_user: false,
            recipients: RecipientResolution::NotApplicable,
            selected_place: None,
            subject: None,
            message: None,
            warnings: Vec::new(),
        }
    }
}

/// Outcome of the required-field check on a goal.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

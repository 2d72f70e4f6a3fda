//! Boundary data types
//!
//! Types that cross the capability boundary: directory entries, time slots,
//! places, event drafts, and schedules. All of them serialize, because they
//! are also part of the engine's wire-level `Response` payloads.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A directory entry: one person the engine can schedule with or write to.
///
/// The email is the uniquely identifying key. Names are not unique and may
/// need disambiguation upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Display name (e.g. "Om Patel")
    pub name: String,

    /// Canonical email address, unique within a directory
    pub email: String,

    /// Optional role (e.g. "Engineer")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Optional department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Person {
    /// Create a new person with just a name and email
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: None,
            department: None,
        }
    }

    /// First whitespace-separated segment of the name
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// A free time slot offered for selection.
///
/// Slots are ephemeral: generated fresh per request and never cached across
/// turns beyond the current response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot start (time of day, 24-hour)
    pub start: NaiveTime,

    /// Slot end (time of day, 24-hour)
    pub end: NaiveTime,

    /// Slot duration in minutes
    pub duration_minutes: u32,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime, duration_minutes: u32) -> Self {
        Self {
            start,
            end,
            duration_minutes,
        }
    }

    /// Human-readable "HH:MM - HH:MM" label
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// A restaurant or venue returned by place search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Venue name
    pub name: String,

    /// Street address
    pub address: String,

    /// Rating on a 0.0-5.0 scale
    pub rating: f64,

    /// Cuisine label, if the backend knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,

    /// Contact phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Opening hours lines, backend-formatted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hours: Vec<String>,

    /// Which backend produced this result (e.g. "local", "places-api")
    pub source: String,
}

/// One busy interval on somebody's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusySpan {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Conflict detail for one attendee whose calendar blocks a requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// The attendee whose calendar is busy
    pub email: String,

    /// Their busy intervals overlapping the requested window
    pub busy: Vec<BusySpan>,
}

/// Result of a point availability check for a set of attendees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityCheck {
    /// True only if every requested attendee is free
    pub available: bool,

    /// Attendees with no conflicting events
    pub available_users: Vec<String>,

    /// Attendees with conflicts, with detail
    pub conflicts: Vec<Conflict>,
}

impl AvailabilityCheck {
    /// An all-clear check result for the given attendees
    pub fn all_free(emails: &[String]) -> Self {
        Self {
            available: true,
            available_users: emails.to_vec(),
            conflicts: Vec::new(),
        }
    }
}

/// One person's schedule for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub email: String,
    pub date: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
}

/// One calendar entry within a day schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub title: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Everything a calendar backend needs to create an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
    pub location: String,
    pub attendees: Vec<String>,
    pub organizer: String,
    pub timezone: String,
}

impl EventDraft {
    /// Event end time
    pub fn end(&self) -> NaiveTime {
        self.start + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// A drafted email: subject plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

impl Draft {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

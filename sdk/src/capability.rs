//! Capability traits
//!
//! The contract between the Valet engine and its external collaborators.
//! The engine only ever sees these traits; whether an implementation talks
//! HTTP, OAuth, SQL, or an in-memory store is its own business. Every method
//! returns `Result<_, CapabilityError>` so recoverable faults (timeouts,
//! no results) stay distinguishable from should-never-happen internal errors.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::errors::CapabilityError;
use crate::types::{AvailabilityCheck, Draft, EventDraft, Person, Place, Schedule, TimeSlot};

/// Result type for capability operations
pub type Result<T> = std::result::Result<T, CapabilityError>;

/// Read-only people directory.
///
/// Directory data is read-only within a request; the engine loads a snapshot
/// at construction and resolves names against it.
pub trait Directory: Send + Sync {
    /// All known people. Order is preserved and used for tie-breaking.
    fn list_people(&self) -> Result<Vec<Person>>;
}

/// Calendar free-busy queries.
#[async_trait]
pub trait Availability: Send + Sync {
    /// Find open slots on `date` for all of `emails`, each `duration_minutes`
    /// long. Backends honor their own working-hours, buffer, and stepping
    /// policy; an empty result is a valid answer, not an error.
    async fn find_slots(
        &self,
        date: NaiveDate,
        emails: &[String],
        duration_minutes: u32,
    ) -> Result<Vec<TimeSlot>>;

    /// Check one exact window for all of `emails`.
    async fn check(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        emails: &[String],
    ) -> Result<AvailabilityCheck>;

    /// One person's schedule for a single day.
    async fn day_schedule(&self, email: &str, date: NaiveDate) -> Result<Schedule>;
}

/// Calendar writes.
#[async_trait]
pub trait CalendarWriter: Send + Sync {
    /// Create an event and return its backend id.
    async fn create_event(&self, draft: &EventDraft) -> Result<String>;

    /// Delete an event by backend id.
    async fn delete_event(&self, event_id: &str) -> Result<()>;
}

/// Outbound notifications (email or equivalent).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, body: &str, from: &str) -> Result<()>;
}

/// Restaurant / venue search.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Search near `location`, optionally constrained by cuisine, keeping
    /// only results rated at least `min_rating`.
    async fn search(
        &self,
        location: &str,
        cuisine: Option<&str>,
        min_rating: f64,
    ) -> Result<Vec<Place>>;
}

/// Free-text drafting of email subjects and bodies from a short instruction.
///
/// Optional: the engine carries a template-based fallback and uses it
/// whenever no generator is configured or the generator fails.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn draft(&self, prompt: &str) -> Result<Draft>;
}

//! In-memory calendar
//!
//! Implements both the free-busy side (`Availability`) and the write side
//! (`CalendarWriter`) over a shared in-memory event store. Slot finding
//! honors the configured working hours, keeps the configured buffer free
//! around existing events, and steps candidate start times by the
//! configured granularity.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use tokio::sync::Mutex;
use tracing::debug;

use sdk::capability::{Availability, CalendarWriter};
use sdk::errors::CapabilityError;
use sdk::types::{
    AvailabilityCheck, BusySpan, Conflict, EventDraft, Schedule, ScheduleEntry, TimeSlot,
};

use crate::config::SchedulingConfig;

/// One stored event.
#[derive(Debug, Clone)]
struct StoredEvent {
    id: String,
    title: String,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    attendees: Vec<String>,
}

/// Event store shared by the availability and writer sides.
struct EventStore {
    events: Vec<StoredEvent>,
    next_id: u64,
}

/// In-memory calendar backend.
pub struct LocalCalendar {
    scheduling: SchedulingConfig,
    store: Mutex<EventStore>,
}

impl LocalCalendar {
    pub fn new(scheduling: SchedulingConfig) -> Self {
        Self {
            scheduling,
            store: Mutex::new(EventStore {
                events: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Seed an event directly, bypassing the draft flow. Used to set up
    /// busy calendars in tests and demos.
    pub async fn seed_event(
        &self,
        title: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        attendees: &[String],
    ) -> String {
        let mut store = self.store.lock().await;
        store.next_id += 1;
        let id = format!("evt_{}", store.next_id);
        store.events.push(StoredEvent {
            id: id.clone(),
            title: title.to_string(),
            date,
            start,
            end,
            attendees: attendees.to_vec(),
        });
        id
    }

    /// Number of stored events.
    pub async fn event_count(&self) -> usize {
        self.store.lock().await.events.len()
    }

    /// Busy spans for one attendee overlapping a window on a date.
    fn busy_spans(
        events: &[StoredEvent],
        email: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Vec<BusySpan> {
        events
            .iter()
            .filter(|event| {
                event.date == date
                    && event.start < end
                    && start < event.end
                    && event
                        .attendees
                        .iter()
                        .any(|a| a.eq_ignore_ascii_case(email))
            })
            .map(|event| BusySpan {
                start: event.start,
                end: event.end,
            })
            .collect()
    }
}

#[async_trait]
impl Availability for LocalCalendar {
    /// Walk the working-hours window in slot steps. Each candidate slot is
    /// widened by the buffer on both sides before checking, so back-to-back
    /// bookings keep breathing room.
    async fn find_slots(
        &self,
        date: NaiveDate,
        emails: &[String],
        duration_minutes: u32,
    ) -> Result<Vec<TimeSlot>, CapabilityError> {
        let store = self.store.lock().await;
        let work_start = self.scheduling.working_start();
        let work_end = self.scheduling.working_end();
        let buffer = Duration::minutes(i64::from(self.scheduling.buffer_minutes));
        let step = Duration::minutes(i64::from(self.scheduling.slot_step_minutes));
        let duration = Duration::minutes(i64::from(duration_minutes));

        let mut slots = Vec::new();
        let mut current = work_start;

        loop {
            let slot_end = current + duration;
            if slot_end + buffer > work_end || slot_end < current {
                break;
            }

            let padded_start = if current - buffer > current {
                // Buffer underflowed past midnight; clamp at the window edge
                work_start
            } else {
                current - buffer
            };
            let padded_end = slot_end + buffer;

            let free = emails.iter().all(|email| {
                Self::busy_spans(&store.events, email, date, padded_start, padded_end).is_empty()
            });
            if free {
                slots.push(TimeSlot::new(current, slot_end, duration_minutes));
            }

            let next = current + step;
            if next <= current {
                break;
            }
            current = next;
        }

        debug!(
            "Found {} free slots on {} for {} attendees",
            slots.len(),
            date,
            emails.len()
        );
        Ok(slots)
    }

    async fn check(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        emails: &[String],
    ) -> Result<AvailabilityCheck, CapabilityError> {
        let store = self.store.lock().await;

        let mut available_users = Vec::new();
        let mut conflicts = Vec::new();
        for email in emails {
            let busy = Self::busy_spans(&store.events, email, date, start, end);
            if busy.is_empty() {
                available_users.push(email.clone());
            } else {
                conflicts.push(Conflict {
                    email: email.clone(),
                    busy,
                });
            }
        }

        Ok(AvailabilityCheck {
            available: conflicts.is_empty(),
            available_users,
            conflicts,
        })
    }

    async fn day_schedule(
        &self,
        email: &str,
        date: NaiveDate,
    ) -> Result<Schedule, CapabilityError> {
        let store = self.store.lock().await;

        let mut entries: Vec<ScheduleEntry> = store
            .events
            .iter()
            .filter(|event| {
                event.date == date
                    && event
                        .attendees
                        .iter()
                        .any(|a| a.eq_ignore_ascii_case(email))
            })
            .map(|event| ScheduleEntry {
                title: event.title.clone(),
                start: event.start,
                end: event.end,
            })
            .collect();
        entries.sort_by_key(|e| e.start);

        Ok(Schedule {
            email: email.to_string(),
            date,
            entries,
        })
    }
}

#[async_trait]
impl CalendarWriter for LocalCalendar {
    async fn create_event(&self, draft: &EventDraft) -> Result<String, CapabilityError> {
        let mut store = self.store.lock().await;
        store.next_id += 1;
        let id = format!("evt_{}", store.next_id);

        store.events.push(StoredEvent {
            id: id.clone(),
            title: draft.title.clone(),
            date: draft.date,
            start: draft.start,
            end: draft.end(),
            attendees: draft.attendees.clone(),
        });
        debug!("Created event {} on {}", id, draft.date);
        Ok(id)
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CapabilityError> {
        let mut store = self.store.lock().await;
        let before = store.events.len();
        store.events.retain(|event| event.id != event_id);

        if store.events.len() == before {
            return Err(CapabilityError::NotFound(event_id.to_string()));
        }
        debug!("Deleted event {}", event_id);
        Ok(())
    }
}

//! Confirmation ledger
//!
//! Tracks outstanding confirmation requests between "the user picked an
//! option" and "the side effect ran". Ids increase monotonically and an
//! entry moves Pending to Confirmed or Cancelled exactly once; that single
//! transition is what keeps one confirmation from ever triggering two
//! writes. Storage is in memory only, one ledger per requester session.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::extractor::Goal;
use crate::planner::ActionType;

/// Affirmative replies, compared case-insensitively.
const AFFIRMATIVE: &[&str] = &["yes", "confirm", "ok", "proceed", "sure"];

/// Negative replies, compared case-insensitively.
const NEGATIVE: &[&str] = &["no", "cancel", "abort", "stop"];

/// Lifecycle of a confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// One pending or settled confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationRequest {
    pub id: String,
    pub action: ActionType,
    pub payload: Goal,
    pub requester: String,
    pub status: ConfirmationStatus,
    pub created_at: DateTime<Utc>,
}

/// What `process` decided.
#[derive(Debug, Clone)]
pub enum ConfirmationOutcome {
    /// The user confirmed; the caller now executes exactly once
    Confirmed { action: ActionType, payload: Goal },
    /// The user cancelled
    Cancelled,
    /// Reply was neither affirmative nor negative; re-prompt
    StillPending,
    /// Unknown id
    NotFound,
    /// The entry already left Pending; no second execution
    AlreadySettled(ConfirmationStatus),
}

/// In-memory confirmation store with monotonically increasing ids.
pub struct ConfirmationLedger {
    entries: HashMap<String, ConfirmationRequest>,
    next_id: u64,
}

impl ConfirmationLedger {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 0,
        }
    }

    /// Open a new pending confirmation and return its id.
    pub fn create(&mut self, action: ActionType, payload: Goal, requester: &str) -> String {
        self.next_id += 1;
        let id = format!("conf_{}", self.next_id);

        let request = ConfirmationRequest {
            id: id.clone(),
            action,
            payload,
            requester: requester.to_string(),
            status: ConfirmationStatus::Pending,
            created_at: Utc::now(),
        };
        debug!("Created confirmation {} for {}", id, requester);
        self.entries.insert(id.clone(), request);
        id
    }

    /// Apply a user reply to a pending confirmation.
    ///
    /// Only the fixed affirmative/negative vocabularies settle the entry;
    /// anything else leaves it pending so the caller re-prompts.
    pub fn process(&mut self, id: &str, response: &str) -> ConfirmationOutcome {
        let Some(entry) = self.entries.get_mut(id) else {
            return ConfirmationOutcome::NotFound;
        };

        if entry.status != ConfirmationStatus::Pending {
            return ConfirmationOutcome::AlreadySettled(entry.status);
        }

        let reply = response.trim().to_lowercase();
        if AFFIRMATIVE.contains(&reply.as_str()) {
            entry.status = ConfirmationStatus::Confirmed;
            debug!("Confirmation {} confirmed", id);
            ConfirmationOutcome::Confirmed {
                action: entry.action,
                payload: entry.payload.clone(),
            }
        } else if NEGATIVE.contains(&reply.as_str()) {
            entry.status = ConfirmationStatus::Cancelled;
            debug!("Confirmation {} cancelled", id);
            ConfirmationOutcome::Cancelled
        } else {
            ConfirmationOutcome::StillPending
        }
    }

    /// Reclaim settled entries older than `max_age`. Pending entries are
    /// kept until processed or superseded.
    pub fn expire(&mut self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.status == ConfirmationStatus::Pending || entry.created_at > cutoff
        });
        before - self.entries.len()
    }

    /// Status lookup by id.
    pub fn status(&self, id: &str) -> Option<ConfirmationStatus> {
        self.entries.get(id).map(|e| e.status)
    }

    /// All entries still awaiting a reply.
    pub fn pending(&self) -> Vec<&ConfirmationRequest> {
        self.entries
            .values()
            .filter(|e| e.status == ConfirmationStatus::Pending)
            .collect()
    }
}

impl Default for ConfirmationLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Intent;

    fn ledger_with_entry() -> (ConfirmationLedger, String) {
        let mut ledger = ConfirmationLedger::new();
        let id = ledger.create(
            ActionType::MeetingScheduling,
            Goal::new(Intent::Meeting),
            "lead@company.com",
        );
        (ledger, id)
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut ledger = ConfirmationLedger::new();
        let a = ledger.create(
            ActionType::MeetingScheduling,
            Goal::new(Intent::Meeting),
            "a@company.com",
        );
        let b = ledger.create(
            ActionType::RestaurantBooking,
            Goal::new(Intent::Dinner),
            "a@company.com",
        );
        assert_eq!(a, "conf_1");
        assert_eq!(b, "conf_2");
    }

    #[test]
    fn test_affirmative_vocabulary() {
        for word in ["yes", "Confirm", "OK", "proceed", "SURE"] {
            let (mut ledger, id) = ledger_with_entry();
            let outcome = ledger.process(&id, word);
            assert!(
                matches!(outcome, ConfirmationOutcome::Confirmed { .. }),
                "{} should confirm",
                word
            );
            assert_eq!(ledger.status(&id), Some(ConfirmationStatus::Confirmed));
        }
    }

    #[test]
    fn test_negative_vocabulary() {
        for word in ["no", "cancel", "Abort", "stop"] {
            let (mut ledger, id) = ledger_with_entry();
            assert!(matches!(
                ledger.process(&id, word),
                ConfirmationOutcome::Cancelled
            ));
        }
    }

    #[test]
    fn test_unknown_reply_stays_pending() {
        let (mut ledger, id) = ledger_with_entry();
        assert!(matches!(
            ledger.process(&id, "maybe later"),
            ConfirmationOutcome::StillPending
        ));
        assert_eq!(ledger.status(&id), Some(ConfirmationStatus::Pending));

        // A follow-up affirmative still works
        assert!(matches!(
            ledger.process(&id, "yes"),
            ConfirmationOutcome::Confirmed { .. }
        ));
    }

    #[test]
    fn test_confirmed_entry_cannot_confirm_twice() {
        let (mut ledger, id) = ledger_with_entry();
        assert!(matches!(
            ledger.process(&id, "yes"),
            ConfirmationOutcome::Confirmed { .. }
        ));
        assert!(matches!(
            ledger.process(&id, "yes"),
            ConfirmationOutcome::AlreadySettled(ConfirmationStatus::Confirmed)
        ));
    }

    #[test]
    fn test_unknown_id() {
        let mut ledger = ConfirmationLedger::new();
        assert!(matches!(
            ledger.process("conf_99", "yes"),
            ConfirmationOutcome::NotFound
        ));
    }

    #[test]
    fn test_expire_reclaims_settled_only() {
        let (mut ledger, confirmed) = ledger_with_entry();
        let pending = ledger.create(
            ActionType::RestaurantBooking,
            Goal::new(Intent::Dinner),
            "lead@company.com",
        );
        ledger.process(&confirmed, "yes");

        // Zero max age: anything settled is past the cutoff
        let reclaimed = ledger.expire(Duration::zero());
        assert_eq!(reclaimed, 1);
        assert_eq!(ledger.status(&confirmed), None);
        assert_eq!(ledger.status(&pending), Some(ConfirmationStatus::Pending));
    }
}

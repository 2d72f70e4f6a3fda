//! Per-requester sessions
//!
//! Every requester gets an isolated session holding their confirmation
//! ledger, any pending option selection, the one-shot missing-fields guard,
//! and an in-memory conversation log. Sessions are created on first contact
//! and reaped after inactivity; nothing in here is shared between
//! requesters, so one user's pending selection can never leak into
//! another's confirmation call.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sdk::types::{Place, TimeSlot};
use tracing::debug;

use crate::ledger::ConfirmationLedger;
use crate::planner::TaskPlan;

/// Session key for callers that did not identify themselves.
pub const ANONYMOUS: &str = "anonymous";

/// Options presented to a requester and not yet acted on.
#[derive(Debug, Clone)]
pub enum PendingSelection {
    Slots {
        plan: TaskPlan,
        slots: Vec<TimeSlot>,
        attendee_emails: Vec<String>,
    },
    Places {
        plan: TaskPlan,
        places: Vec<Place>,
        attendee_emails: Vec<String>,
    },
}

/// One requester's conversation state.
pub struct Session {
    pub requester: String,
    pub ledger: ConfirmationLedger,
    pub pending: Option<PendingSelection>,
    /// Set once the requester has been asked for missing email content;
    /// a second ask in the same logical task fails instead of looping
    pub asked_missing_fields: bool,
    pub history: Vec<(DateTime<Utc>, String)>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn new(requester: &str) -> Self {
        Self {
            requester: requester.to_string(),
            ledger: ConfirmationLedger::new(),
            pending: None,
            asked_missing_fields: false,
            history: Vec::new(),
            last_seen: Utc::now(),
        }
    }

    /// Record a query in the conversation log and refresh the idle clock.
    pub fn record_query(&mut self, query: &str) {
        self.history.push((Utc::now(), query.to_string()));
        self.last_seen = Utc::now();
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// All live sessions, keyed by lowercased requester email.
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Normalize an optional requester identity into a session key.
    pub fn key_for(requester: Option<&str>) -> String {
        requester
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_string())
    }

    /// The session for a requester, created on first contact.
    pub fn session(&mut self, key: &str) -> &mut Session {
        self.sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!("Creating session for {}", key);
                Session::new(key)
            })
    }

    /// Drop sessions idle longer than `max_idle`.
    pub fn reap_idle(&mut self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_seen > cutoff);
        before - self.sessions.len()
    }

    /// Mutable iteration over all live sessions.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_are_isolated_by_requester() {
        let mut store = SessionStore::new();

        store.session("a@company.com").asked_missing_fields = true;
        assert!(!store.session("b@company.com").asked_missing_fields);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(
            SessionStore::key_for(Some("  Lead@Company.COM ")),
            "lead@company.com"
        );
        assert_eq!(SessionStore::key_for(None), ANONYMOUS);
        assert_eq!(SessionStore::key_for(Some("  ")), ANONYMOUS);
    }

    #[test]
    fn test_reap_idle_keeps_active_sessions() {
        let mut store = SessionStore::new();
        store.session("a@company.com");

        // Nothing is older than an hour yet
        assert_eq!(store.reap_idle(Duration::hours(1)), 0);
        assert_eq!(store.len(), 1);

        // Zero tolerance reaps everything not touched this instant
        assert_eq!(store.reap_idle(Duration::zero()), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_history_records_queries() {
        let mut store = SessionStore::new();
        let session = store.session("a@company.com");
        session.record_query("setup a meeting");
        session.record_query("yes");
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].1, "setup a meeting");
    }
}

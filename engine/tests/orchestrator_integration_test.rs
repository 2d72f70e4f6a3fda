//! End-to-end pipeline tests over the local capability implementations:
//! query in, options out, selection, confirmation, side effect.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use sdk::capability::Availability;
use sdk::errors::CapabilityError;
use sdk::types::{AvailabilityCheck, Person, Schedule, TimeSlot};

use valet_engine::capabilities::{LocalCalendar, LogNotifier, StaticPlaceSearch};
use valet_engine::config::Config;
use valet_engine::directory::JsonDirectory;
use valet_engine::orchestrator::{NextAction, Orchestrator};

const LEAD: &str = "lead@company.com";

fn people() -> Vec<Person> {
    vec![
        Person::new("Arnav Sharma", "arnav@company.com"),
        Person::new("Yash Verma", "yash@company.com"),
        Person::new("Om", "om.short@company.com"),
        Person::new("Om Patel", "om.patel@company.com"),
        Person::new("Nidhi Rao", "nidhi@company.com"),
    ]
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

struct Fixture {
    orchestrator: Orchestrator,
    calendar: Arc<LocalCalendar>,
    notifier: Arc<LogNotifier>,
}

fn fixture() -> Fixture {
    let config = Config::default();
    let directory = JsonDirectory::from_people(people());
    let calendar = Arc::new(LocalCalendar::new(config.scheduling.clone()));
    let notifier = Arc::new(LogNotifier::new());
    let places = Arc::new(StaticPlaceSearch::sample());

    let orchestrator = Orchestrator::new(
        &directory,
        calendar.clone(),
        calendar.clone(),
        notifier.clone(),
        places,
        None,
        &config,
    )
    .unwrap();

    Fixture {
        orchestrator,
        calendar,
        notifier,
    }
}

#[tokio::test]
async fn test_meeting_flow_end_to_end() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at(
            "Setup a meeting for Arnav and Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;

    assert!(response.success);
    assert_eq!(response.next_action, NextAction::SelectTimeSlot);
    assert!(!response.options.is_empty());

    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    let confirmation_id = selection.confirmation_id.clone().expect("confirmation id");
    assert_eq!(selection.next_action, NextAction::Clarify);

    let confirmed = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "yes")
        .await;

    assert!(confirmed.success, "{}", confirmed.message);
    assert_eq!(confirmed.next_action, NextAction::Complete);
    assert_eq!(fx.calendar.event_count().await, 1);

    // Invite mail went out to the attendees
    let sent = fx.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].to.contains(&"arnav@company.com".to_string()));
    assert!(sent[0].to.contains(&"yash@company.com".to_string()));
    assert!(sent[0].to.contains(&LEAD.to_string()));
}

#[tokio::test]
async fn test_meeting_with_no_free_slots_suggests_alternatives() {
    let fx = fixture();
    let mut orchestrator = fx.orchestrator;

    // Arnav is busy for the entire working day
    fx.calendar
        .seed_event(
            "Offsite",
            NaiveDate::from_ymd_opt(2025, 8, 10).unwrap(),
            t(9, 0),
            t(18, 0),
            &["arnav@company.com".to_string()],
        )
        .await;

    let response = orchestrator
        .submit_query_at(
            "Setup a meeting for Arnav on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;

    assert!(!response.success);
    assert_eq!(response.next_action, NextAction::SuggestAlternatives);
    assert!(response.options.is_empty());
}

#[tokio::test]
async fn test_stale_slot_reroutes_to_selection_without_writing() {
    let mut fx = fixture();
    let date = NaiveDate::from_ymd_opt(2025, 8, 10).unwrap();

    fx.orchestrator
        .submit_query_at(
            "Setup a meeting for Arnav and Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;
    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    let confirmation_id = selection.confirmation_id.clone().unwrap();

    // A conflicting event appears between listing and confirming
    fx.calendar
        .seed_event(
            "Interview",
            date,
            t(9, 0),
            t(10, 0),
            &["arnav@company.com".to_string()],
        )
        .await;

    let rerouted = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "yes")
        .await;

    assert!(!rerouted.success);
    assert_eq!(rerouted.next_action, NextAction::SelectTimeSlot);
    assert!(!rerouted.conflicts.is_empty());
    assert_eq!(rerouted.conflicts[0].email, "arnav@company.com");
    assert!(!rerouted.options.is_empty());
    // Only the seeded event exists; nothing was double-booked
    assert_eq!(fx.calendar.event_count().await, 1);

    // Picking a fresh slot completes the flow
    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    let new_id = selection.confirmation_id.clone().unwrap();
    let confirmed = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &new_id, "confirm")
        .await;

    assert!(confirmed.success, "{}", confirmed.message);
    assert_eq!(fx.calendar.event_count().await, 2);
}

#[tokio::test]
async fn test_confirmed_id_cannot_trigger_two_writes() {
    let mut fx = fixture();

    fx.orchestrator
        .submit_query_at(
            "Setup a meeting for Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;
    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    let confirmation_id = selection.confirmation_id.clone().unwrap();

    fx.orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "yes")
        .await;
    assert_eq!(fx.calendar.event_count().await, 1);

    let replay = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "yes")
        .await;

    assert!(!replay.success);
    assert_eq!(replay.next_action, NextAction::Error);
    assert_eq!(fx.calendar.event_count().await, 1);
}

#[tokio::test]
async fn test_unknown_reply_reprompts_and_cancel_cancels() {
    let mut fx = fixture();

    fx.orchestrator
        .submit_query_at(
            "Setup a meeting for Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;
    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    let confirmation_id = selection.confirmation_id.clone().unwrap();

    let reprompt = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "hmm maybe")
        .await;
    assert_eq!(reprompt.next_action, NextAction::Clarify);
    assert_eq!(reprompt.confirmation_id.as_deref(), Some(confirmation_id.as_str()));

    let cancelled = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "no")
        .await;
    assert!(cancelled.success);
    assert_eq!(cancelled.next_action, NextAction::Complete);
    assert_eq!(fx.calendar.event_count().await, 0);
}

#[tokio::test]
async fn test_missing_date_fails_with_field_error() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at("Setup a meeting with Yash", Some(LEAD), today())
        .await;

    assert!(!response.success);
    assert_eq!(response.next_action, NextAction::Clarify);
    assert!(response.message.contains("Missing required field: date"));
}

#[tokio::test]
async fn test_unparseable_query_asks_to_rephrase() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at("what a lovely day", Some(LEAD), today())
        .await;

    assert!(!response.success);
    assert_eq!(response.next_action, NextAction::Clarify);
    assert!(response.message.contains("rephrase"));
}

#[tokio::test]
async fn test_dinner_flow_zero_attendees_still_books() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at(
            "Find restaurants with Hyderabadi biryani in Hyderabad",
            Some(LEAD),
            today(),
        )
        .await;

    assert!(response.success, "{}", response.message);
    assert_eq!(response.next_action, NextAction::SelectRestaurant);
    assert!(!response.options.is_empty());

    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    let confirmation_id = selection.confirmation_id.clone().unwrap();
    assert!(selection.message.contains("Paradise Biryani"));

    let confirmed = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "yes")
        .await;

    // Booking succeeds, and the zero-invite outcome is reported as such
    assert!(confirmed.success);
    assert_eq!(confirmed.next_action, NextAction::Complete);
    assert!(confirmed.message.contains("no invites were sent"));
    assert_eq!(fx.notifier.sent_count().await, 0);
}

#[tokio::test]
async fn test_dinner_with_attendees_sends_invites() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at(
            "Organize a dinner for Arnav and Yash in Hyderabad",
            Some(LEAD),
            today(),
        )
        .await;
    assert_eq!(response.next_action, NextAction::SelectRestaurant);

    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    let confirmation_id = selection.confirmation_id.clone().unwrap();

    let confirmed = fx
        .orchestrator
        .respond_confirmation(Some(LEAD), &confirmation_id, "yes")
        .await;

    assert!(confirmed.success);
    assert!(confirmed.message.contains("Invites sent to 2 attendees"));
    let sent = fx.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Team Dinner"));
}

#[tokio::test]
async fn test_dinner_unknown_location_suggests_alternatives() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at("find a restaurant in Atlantis", Some(LEAD), today())
        .await;

    assert!(!response.success);
    assert_eq!(response.next_action, NextAction::SuggestAlternatives);
}

#[tokio::test]
async fn test_availability_is_a_pure_read() {
    let mut fx = fixture();
    let date = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();

    fx.calendar
        .seed_event(
            "Standup",
            date,
            t(9, 30),
            t(10, 0),
            &["arnav@company.com".to_string()],
        )
        .await;

    let response = fx
        .orchestrator
        .submit_query_at(
            "Check availability for Arnav and Yash tomorrow",
            Some(LEAD),
            today(),
        )
        .await;

    assert!(response.success, "{}", response.message);
    assert_eq!(response.next_action, NextAction::DisplaySchedules);
    assert_eq!(response.schedules.len(), 2);

    let arnav = response
        .schedules
        .iter()
        .find(|s| s.email == "arnav@company.com")
        .unwrap();
    assert_eq!(arnav.entries.len(), 1);
    assert_eq!(arnav.entries[0].title, "Standup");

    // No confirmation was opened and nothing was written
    assert_eq!(fx.calendar.event_count().await, 1);
    assert_eq!(fx.notifier.sent_count().await, 0);
}

#[tokio::test]
async fn test_email_unknown_recipient_clarifies() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at("Send a hi email to Bhavya", Some(LEAD), today())
        .await;

    assert!(!response.success);
    assert_eq!(response.next_action, NextAction::Clarify);
    assert_eq!(response.missing_fields, vec!["recipient"]);
    assert!(response
        .warnings
        .iter()
        .any(|w| w.contains("Bhavya") || w.contains("No recipient")));
    assert_eq!(fx.notifier.sent_count().await, 0);
}

#[tokio::test]
async fn test_email_sends_immediately_with_content() {
    let mut fx = fixture();

    let response = fx
        .orchestrator
        .submit_query_at(
            "Email Yash about the demo: the build is green, ship it",
            Some("nidhi@company.com"),
            today(),
        )
        .await;

    assert!(response.success, "{}", response.message);
    assert_eq!(response.next_action, NextAction::Complete);

    let sent = fx.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["yash@company.com"]);
    assert_eq!(sent[0].subject, "the demo");
    assert!(sent[0].body.contains("the build is green"));
    // Requester resolved to their directory identity
    assert_eq!(sent[0].from, "nidhi@company.com");
}

#[tokio::test]
async fn test_email_missing_content_asks_exactly_once() {
    let mut fx = fixture();

    let first = fx
        .orchestrator
        .submit_query_at("congratulate Yash", Some(LEAD), today())
        .await;
    assert_eq!(first.next_action, NextAction::InputMissingFields);
    assert!(!first.missing_fields.is_empty());

    // The user never supplied content; a second content-free round fails
    // instead of re-prompting forever
    let second = fx
        .orchestrator
        .submit_query_at("congratulate Yash", Some(LEAD), today())
        .await;
    assert_eq!(second.next_action, NextAction::Error);
    assert_eq!(fx.notifier.sent_count().await, 0);

    // Resubmitting with actual content goes through
    let third = fx
        .orchestrator
        .submit_query_at(
            "congratulate Yash: amazing work on the release",
            Some(LEAD),
            today(),
        )
        .await;
    assert!(third.success, "{}", third.message);
    assert_eq!(fx.notifier.sent_count().await, 1);
}

#[tokio::test]
async fn test_new_query_supersedes_pending_selection() {
    let mut fx = fixture();

    let meeting = fx
        .orchestrator
        .submit_query_at(
            "Setup a meeting for Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;
    assert_eq!(meeting.next_action, NextAction::SelectTimeSlot);

    // The requester changes their mind before selecting
    let dinner = fx
        .orchestrator
        .submit_query_at(
            "Find restaurants with biryani in Hyderabad",
            Some(LEAD),
            today(),
        )
        .await;
    assert_eq!(dinner.next_action, NextAction::SelectRestaurant);

    // The selection now applies to the dinner options, not the stale slots
    let selection = fx.orchestrator.select_option(Some(LEAD), 1).await;
    assert!(selection.message.contains("Book dinner at"));
}

#[tokio::test]
async fn test_selection_without_pending_state_errors() {
    let mut fx = fixture();

    let response = fx.orchestrator.select_option(Some(LEAD), 1).await;
    assert!(!response.success);
    assert_eq!(response.next_action, NextAction::Error);
}

#[tokio::test]
async fn test_sessions_are_isolated_between_requesters() {
    let mut fx = fixture();

    fx.orchestrator
        .submit_query_at(
            "Setup a meeting for Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;

    // A different requester has no pending selection to act on
    let other = fx
        .orchestrator
        .select_option(Some("nidhi@company.com"), 1)
        .await;
    assert!(!other.success);
    assert_eq!(other.next_action, NextAction::Error);
}

#[tokio::test]
async fn test_invalid_option_number_reprompts_and_keeps_pending() {
    let mut fx = fixture();

    fx.orchestrator
        .submit_query_at(
            "Setup a meeting for Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;

    let bad = fx.orchestrator.select_option(Some(LEAD), 99).await;
    assert_eq!(bad.next_action, NextAction::Clarify);

    // The options survive the bad pick
    let good = fx.orchestrator.select_option(Some(LEAD), 1).await;
    assert!(good.confirmation_id.is_some());
}

/// An availability backend that never answers in time.
struct SlowAvailability;

#[async_trait]
impl Availability for SlowAvailability {
    async fn find_slots(
        &self,
        _date: NaiveDate,
        _emails: &[String],
        _duration_minutes: u32,
    ) -> Result<Vec<TimeSlot>, CapabilityError> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(Vec::new())
    }

    async fn check(
        &self,
        _date: NaiveDate,
        _start: NaiveTime,
        _end: NaiveTime,
        _emails: &[String],
    ) -> Result<AvailabilityCheck, CapabilityError> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(AvailabilityCheck::all_free(&[]))
    }

    async fn day_schedule(
        &self,
        email: &str,
        date: NaiveDate,
    ) -> Result<Schedule, CapabilityError> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(Schedule {
            email: email.to_string(),
            date,
            entries: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_capability_timeout_becomes_error_response() {
    let mut config = Config::default();
    config.scheduling.capability_timeout_secs = 1;

    let directory = JsonDirectory::from_people(people());
    let calendar = Arc::new(LocalCalendar::new(config.scheduling.clone()));
    let notifier = Arc::new(LogNotifier::new());
    let places = Arc::new(StaticPlaceSearch::sample());

    let mut orchestrator = Orchestrator::new(
        &directory,
        Arc::new(SlowAvailability),
        calendar,
        notifier,
        places,
        None,
        &config,
    )
    .unwrap();

    let response = orchestrator
        .submit_query_at(
            "Setup a meeting for Yash on August 10, 2025",
            Some(LEAD),
            today(),
        )
        .await;

    assert!(!response.success);
    assert_eq!(response.next_action, NextAction::Error);
    assert!(response.message.contains("timed out"));
}

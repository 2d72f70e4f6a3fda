//! Conversation orchestration
//!
//! The top-level driver between "user typed something" and "an external
//! action executes". A query flows through the extractor and planner, then
//! into an intent handler that calls external capabilities to produce
//! options or direct results. A second call path re-enters with a selected
//! option, opening a confirmation; only a confirmed id triggers the actual
//! write, and a meeting slot is re-checked immediately before writing
//! because time has passed since the options were listed.
//!
//! One logical request is processed synchronously end to end. Capability
//! calls are bounded by a timeout and every fault is converted into a
//! failed `Response`; callers never see an unhandled error.

pub mod response;
pub mod session;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use sdk::capability::{
    Availability, CalendarWriter, ContentGenerator, Directory, Notifier, PlaceSearch,
};
use sdk::errors::{CapabilityError, EngineError};
use sdk::types::{Draft, EventDraft, Person, Schedule};

use crate::capabilities::TemplateGenerator;
use crate::config::{Config, EmailConfig, SchedulingConfig, SearchConfig};
use crate::extractor::{Goal, IntentExtractor, RecipientResolution};
use crate::formatters::join_list;
use crate::ledger::ConfirmationOutcome;
use crate::planner::{ActionType, PlanBuilder, TaskPlan};
use crate::resolver::EntityResolver;

pub use response::{NextAction, OptionItem, PlaceOption, Response, SlotOption};
pub use session::{PendingSelection, Session, SessionStore, ANONYMOUS};

/// Engine status summary for the CLI.
#[derive(Debug, serde::Serialize)]
pub struct EngineStatus {
    pub directory_size: usize,
    pub active_sessions: usize,
    pub capabilities: Vec<&'static str>,
}

/// The conversation driver.
pub struct Orchestrator {
    resolver: Arc<EntityResolver>,
    extractor: IntentExtractor,
    planner: PlanBuilder,
    sessions: SessionStore,
    availability: Arc<dyn Availability>,
    calendar: Arc<dyn CalendarWriter>,
    notifier: Arc<dyn Notifier>,
    places: Arc<dyn PlaceSearch>,
    generator: Option<Arc<dyn ContentGenerator>>,
    templates: TemplateGenerator,
    scheduling: SchedulingConfig,
    search: SearchConfig,
    email: EmailConfig,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: &dyn Directory,
        availability: Arc<dyn Availability>,
        calendar: Arc<dyn CalendarWriter>,
        notifier: Arc<dyn Notifier>,
        places: Arc<dyn PlaceSearch>,
        generator: Option<Arc<dyn ContentGenerator>>,
        config: &Config,
    ) -> Result<Self, EngineError> {
        let people = directory.list_people()?;
        info!("Orchestrator starting with {} directory entries", people.len());

        let resolver = Arc::new(EntityResolver::new(people)?);
        let extractor = IntentExtractor::new(
            Arc::clone(&resolver),
            config.scheduling.default_duration_minutes,
        )?;

        Ok(Self {
            resolver,
            extractor,
            planner: PlanBuilder::new(),
            sessions: SessionStore::new(),
            availability,
            calendar,
            notifier,
            places,
            generator,
            templates: TemplateGenerator::new(),
            scheduling: config.scheduling.clone(),
            search: config.search.clone(),
            email: config.email.clone(),
        })
    }

    /// Process one user query, relative dates anchored at the current date.
    pub async fn submit_query(&mut self, query: &str, requester: Option<&str>) -> Response {
        let today = chrono::Local::now().date_naive();
        self.submit_query_at(query, requester, today).await
    }

    /// Process one user query with an explicit "today" anchor.
    ///
    /// A new query supersedes the requester's previous turn: stale pending
    /// selections are discarded rather than rejected.
    pub async fn submit_query_at(
        &mut self,
        query: &str,
        requester: Option<&str>,
        today: NaiveDate,
    ) -> Response {
        let key = SessionStore::key_for(requester);
        info!("Processing query from {}: {}", key, query);

        {
            let session = self.sessions.session(&key);
            session.record_query(query);
            if session.pending.take().is_some() {
                debug!("Discarding superseded pending selection for {}", key);
            }
        }

        let Some(mut goal) = self.extractor.classify_and_extract(query, today) else {
            return Response::clarify(
                "I couldn't understand your request. Could you please rephrase it?",
            );
        };

        let validation = self.extractor.validate_goal(&goal);
        goal.warnings.extend(validation.warnings);
        self.extractor.enhance(&mut goal);

        let plan = self.planner.build(&goal);
        if !plan.is_valid() {
            return Response::clarify(plan.errors.join("; ")).with_warnings(goal.warnings);
        }

        match plan.action {
            ActionType::MeetingScheduling => self.handle_meeting(plan, &key, requester).await,
            ActionType::RestaurantBooking => self.handle_dinner(plan, &key).await,
            ActionType::AvailabilityCheck => self.handle_availability(plan).await,
            ActionType::SendEmail => self.handle_email(plan, &key, requester, query).await,
        }
    }

    /// Meeting: fetch free slots for the date and attendees, present them,
    /// and wait for a selection. No write happens here.
    async fn handle_meeting(
        &mut self,
        plan: TaskPlan,
        key: &str,
        requester: Option<&str>,
    ) -> Response {
        let goal = &plan.goal;
        let date = match goal.date {
            Some(date) => date,
            None => return Response::clarify("Please specify a date for the meeting."),
        };
        let duration = goal
            .duration_minutes
            .unwrap_or(self.scheduling.default_duration_minutes);

        let mut attendees = goal.employee_emails.clone();
        if let Some(email) = requester {
            let email = email.trim().to_string();
            if !email.is_empty() && !attendees.iter().any(|a| a.eq_ignore_ascii_case(&email)) {
                attendees.push(email);
            }
        }

        let slots = match self
            .bounded(self.availability.find_slots(date, &attendees, duration))
            .await
        {
            Ok(slots) => slots,
            Err(e) => return capability_failure("checking availability", &e),
        };

        if slots.is_empty() {
            return Response::suggest_alternatives(
                "No available time slots found for the specified date and attendees.",
            )
            .with_warnings(goal.warnings.clone());
        }

        let message = format!(
            "I found {} available time slots for your meeting.",
            slots.len()
        );
        let response =
            Response::select_time_slot(message, &slots).with_warnings(goal.warnings.clone());

        self.sessions.session(key).pending = Some(PendingSelection::Slots {
            plan,
            slots,
            attendee_emails: attendees,
        });
        response
    }

    /// Dinner: search for restaurants matching the criteria and present the
    /// top results. No booking happens here.
    async fn handle_dinner(&mut self, plan: TaskPlan, key: &str) -> Response {
        let goal = &plan.goal;
        let location = match goal.location.as_deref() {
            Some(location) => location,
            None => {
                return Response::clarify(
                    "Please specify an area or location for the restaurant search.",
                )
                .with_missing_fields(vec!["location".to_string()])
            }
        };

        let cuisine = goal
            .cuisine
            .as_deref()
            .filter(|c| !c.eq_ignore_ascii_case("any"));

        let mut places = match self
            .bounded(
                self.places
                    .search(location, cuisine, self.search.min_rating),
            )
            .await
        {
            Ok(places) => places,
            Err(e) => return capability_failure("searching restaurants", &e),
        };

        if places.is_empty() {
            return Response::suggest_alternatives(format!(
                "No restaurants found in {} matching your criteria. Try a different location or cuisine.",
                location
            ));
        }
        places.truncate(self.search.max_results);

        if goal.employees_ask_user {
            return Response::clarify(
                "No employees specified for the dinner. Please specify who to invite.",
            )
            .with_missing_fields(vec!["employees".to_string()]);
        }

        let message = format!(
            "I found {} restaurants in {} matching your criteria. Here are the top options:",
            places.len(),
            location
        );
        let attendees = goal.employee_emails.clone();
        let response =
            Response::select_restaurant(message, &places).with_warnings(goal.warnings.clone());

        self.sessions.session(key).pending = Some(PendingSelection::Places {
            plan,
            places,
            attendee_emails: attendees,
        });
        response
    }

    /// Availability: a pure read with no confirmation step. Querying
    /// schedules has no side effect requiring consent.
    async fn handle_availability(&mut self, plan: TaskPlan) -> Response {
        let goal = &plan.goal;
        let date = match goal.date {
            Some(date) => date,
            None => return Response::clarify("Please specify a date to check availability."),
        };

        let mut schedules: Vec<Schedule> = Vec::new();
        for email in &goal.employee_emails {
            match self.bounded(self.availability.day_schedule(email, date)).await {
                Ok(schedule) => schedules.push(schedule),
                Err(e) => return capability_failure("reading schedules", &e),
            }
        }

        Response::display_schedules(
            format!(
                "Availability checked for {} team members.",
                schedules.len()
            ),
            schedules,
        )
        .with_warnings(goal.warnings.clone())
    }

    /// Email: resolve recipients and sender, draft per recipient, and send
    /// immediately. The only intent that completes without a confirmation,
    /// guarded by the one-round missing-fields loop.
    async fn handle_email(
        &mut self,
        plan: TaskPlan,
        key: &str,
        requester: Option<&str>,
        query: &str,
    ) -> Response {
        let goal = &plan.goal;

        let recipient_emails = match &goal.recipients {
            RecipientResolution::Resolved(emails) => emails.clone(),
            RecipientResolution::AskUser | RecipientResolution::NotApplicable => {
                return Response::clarify("No recipient found. Please specify who to email.")
                    .with_missing_fields(vec!["recipient".to_string()])
                    .with_warnings(goal.warnings.clone());
            }
        };

        // Sender identity: the requester's directory entry, else the first
        // directory entry, else the configured fallback address
        let sender = requester
            .and_then(|email| self.find_person(email))
            .or_else(|| self.resolver.people().first().cloned());
        let (sender_name, sender_email) = match sender {
            Some(person) => (person.name, person.email),
            None => (
                self.email.fallback_sender.clone(),
                self.email.fallback_sender.clone(),
            ),
        };

        // The last-resort extraction (message == the whole query) means the
        // user gave no actual content. Ask once; fail the second time
        // rather than loop forever.
        let message = goal.message.clone().unwrap_or_default();
        if message.trim().is_empty() || message.trim() == query.trim() {
            let session = self.sessions.session(key);
            if session.asked_missing_fields {
                return Response::error(
                    "Could not generate the email. Please provide more details.",
                );
            }
            session.asked_missing_fields = true;
            return Response::input_missing_fields(
                "Please provide some keywords, bullet points, or a brief description so I can draft the email.",
                vec!["Message content (keywords, bullet points, or a brief description)".to_string()],
            );
        }

        let mut failed: Vec<String> = Vec::new();
        for recipient in &recipient_emails {
            let recipient_name = self
                .find_person(recipient)
                .map(|p| p.name)
                .unwrap_or_else(|| recipient.clone());

            let draft = self
                .draft_personal_mail(&recipient_name, &sender_name, &message)
                .await;
            let subject = goal.subject.clone().unwrap_or(draft.subject);

            if let Err(e) = self
                .bounded(self.notifier.send(
                    std::slice::from_ref(recipient),
                    &subject,
                    &draft.body,
                    &sender_email,
                ))
                .await
            {
                warn!("Email to {} failed: {}", recipient, e);
                failed.push(recipient.clone());
            }
        }

        let session = self.sessions.session(key);
        if failed.is_empty() {
            session.asked_missing_fields = false;
            Response::complete(format!(
                "Personalized email(s) sent to {}.",
                join_list(&recipient_emails)
            ))
            .with_warnings(goal.warnings.clone())
        } else if failed.len() < recipient_emails.len() {
            Response::error(format!(
                "Email sent to {} recipient(s), but failed for: {}.",
                recipient_emails.len() - failed.len(),
                join_list(&failed)
            ))
        } else {
            Response::error(format!(
                "Failed to send email(s) to: {}.",
                join_list(&failed)
            ))
        }
    }

    /// Apply a user's option selection, opening a confirmation request.
    /// Still no write: the side effect waits for an affirmative reply.
    pub async fn select_option(&mut self, requester: Option<&str>, option_id: usize) -> Response {
        let key = SessionStore::key_for(requester);
        let session = self.sessions.session(&key);
        session.touch();

        let Some(pending) = session.pending.take() else {
            return Response::error(
                "There is nothing to select right now. Start with a new request.",
            );
        };

        match pending {
            PendingSelection::Slots {
                plan,
                slots,
                attendee_emails,
            } => {
                let Some(slot) = slots.get(option_id.wrapping_sub(1)).copied() else {
                    let response = Response::clarify(format!(
                        "Option {} is not on the list. Please pick a listed slot number.",
                        option_id
                    ));
                    self.sessions.session(&key).pending = Some(PendingSelection::Slots {
                        plan,
                        slots,
                        attendee_emails,
                    });
                    return response;
                };

                let mut payload = plan.goal.clone();
                payload.time = Some(slot.start);
                payload.employee_emails = attendee_emails;

                let summary = format!(
                    "Schedule '{}' on {} at {} for {} attendee(s)? (yes/no)",
                    payload.title.as_deref().unwrap_or("Team Meeting"),
                    payload.date.map(|d| d.to_string()).unwrap_or_default(),
                    slot.start.format("%H:%M"),
                    payload.employee_emails.len()
                );
                let id = self.sessions.session(&key).ledger.create(
                    ActionType::MeetingScheduling,
                    payload,
                    &key,
                );
                Response::clarify(summary).with_confirmation_id(id)
            }
            PendingSelection::Places {
                plan,
                places,
                attendee_emails,
            } => {
                let Some(place) = places.get(option_id.wrapping_sub(1)).cloned() else {
                    let response = Response::clarify(format!(
                        "Option {} is not on the list. Please pick a listed restaurant number.",
                        option_id
                    ));
                    self.sessions.session(&key).pending = Some(PendingSelection::Places {
                        plan,
                        places,
                        attendee_emails,
                    });
                    return response;
                };

                let mut payload = plan.goal.clone();
                payload.selected_place = Some(place.clone());
                payload.employee_emails = attendee_emails;

                let summary = format!(
                    "Book dinner at {} and invite {} attendee(s)? (yes/no)",
                    place.name,
                    payload.employee_emails.len()
                );
                let id = self.sessions.session(&key).ledger.create(
                    ActionType::RestaurantBooking,
                    payload,
                    &key,
                );
                Response::clarify(summary).with_confirmation_id(id)
            }
        }
    }

    /// Apply a confirmation reply. Affirmative executes the side effect at
    /// most once; the ledger refuses settled ids so the same confirmation
    /// can never trigger two writes.
    pub async fn respond_confirmation(
        &mut self,
        requester: Option<&str>,
        confirmation_id: &str,
        reply: &str,
    ) -> Response {
        let key = SessionStore::key_for(requester);
        let outcome = {
            let session = self.sessions.session(&key);
            session.touch();
            session.ledger.process(confirmation_id, reply)
        };

        match outcome {
            ConfirmationOutcome::NotFound => Response::error("Confirmation not found."),
            ConfirmationOutcome::AlreadySettled(status) => {
                let label = match status {
                    crate::ledger::ConfirmationStatus::Confirmed => "confirmed",
                    crate::ledger::ConfirmationStatus::Cancelled => "cancelled",
                    crate::ledger::ConfirmationStatus::Pending => "pending",
                };
                Response::error(format!(
                    "This confirmation was already {} and cannot run again.",
                    label
                ))
            }
            ConfirmationOutcome::StillPending => Response::clarify(
                "Please respond with \"yes\" to confirm or \"no\" to cancel.",
            )
            .with_confirmation_id(confirmation_id),
            ConfirmationOutcome::Cancelled => Response::complete("Action cancelled by user."),
            ConfirmationOutcome::Confirmed { action, payload } => {
                self.execute_confirmed(action, payload, &key).await
            }
        }
    }

    /// Execute an already-consented action. Re-validates whatever may have
    /// changed since options were listed (the slot re-check for meetings)
    /// before performing the external write.
    ///
    /// `respond_confirmation` routes here after an affirmative reply; direct
    /// callers bypass the ledger and take on at-most-once themselves.
    pub async fn confirm_action(
        &mut self,
        action: ActionType,
        payload: Goal,
        requester: Option<&str>,
    ) -> Response {
        let key = SessionStore::key_for(requester);
        self.execute_confirmed(action, payload, &key).await
    }

    async fn execute_confirmed(
        &mut self,
        action: ActionType,
        payload: Goal,
        key: &str,
    ) -> Response {
        match action {
            ActionType::MeetingScheduling => self.confirm_meeting(payload, key).await,
            ActionType::RestaurantBooking => self.confirm_dinner(payload, key).await,
            ActionType::AvailabilityCheck | ActionType::SendEmail => {
                Response::error(format!("Unsupported action type for confirmation: {}", action))
            }
        }
    }

    /// Execute a confirmed meeting. The chosen slot is re-checked for every
    /// attendee immediately before writing; a conflict that appeared since
    /// the options were listed reroutes back to slot selection instead of
    /// double-booking.
    async fn confirm_meeting(&mut self, payload: Goal, key: &str) -> Response {
        let (Some(date), Some(start)) = (payload.date, payload.time) else {
            return Response::clarify(
                "No time slot selected. Please select a time slot for the meeting.",
            );
        };
        let duration = payload
            .duration_minutes
            .unwrap_or(self.scheduling.default_duration_minutes);
        let end = start + chrono::Duration::minutes(i64::from(duration));
        let attendees = payload.employee_emails.clone();

        let check = match self
            .bounded(self.availability.check(date, start, end, &attendees))
            .await
        {
            Ok(check) => check,
            Err(e) => return capability_failure("re-checking availability", &e),
        };

        if !check.available {
            warn!(
                "Slot {} {} went stale for {} attendee(s), rerouting to selection",
                date,
                start.format("%H:%M"),
                check.conflicts.len()
            );
            let fresh = self
                .bounded(self.availability.find_slots(date, &attendees, duration))
                .await
                .unwrap_or_default();

            if fresh.is_empty() {
                return Response::suggest_alternatives(
                    "The selected time slot is no longer available, and no other slots remain on that date.",
                )
                .with_conflicts(check.conflicts);
            }

            let response = Response::reselect_time_slot(
                "The selected time slot is no longer available for all attendees. Please choose another slot.",
                &fresh,
            )
            .with_conflicts(check.conflicts);

            let plan = self.planner.build(&payload);
            self.sessions.session(key).pending = Some(PendingSelection::Slots {
                plan,
                slots: fresh,
                attendee_emails: attendees,
            });
            return response;
        }

        let organizer = if key == ANONYMOUS {
            self.email.fallback_sender.clone()
        } else {
            key.to_string()
        };
        let draft = EventDraft {
            title: payload
                .title
                .clone()
                .unwrap_or_else(|| "Team Meeting".to_string()),
            date,
            start,
            duration_minutes: duration,
            location: payload
                .location
                .clone()
                .unwrap_or_else(|| "Conference Room".to_string()),
            attendees: attendees.clone(),
            organizer: organizer.clone(),
            timezone: self.scheduling.timezone.clone(),
        };

        let created = self.bounded(self.calendar.create_event(&draft)).await;

        let invite = self.templates.meeting_invite(&draft);
        let sent = if attendees.is_empty() {
            Ok(())
        } else {
            self.bounded(
                self.notifier
                    .send(&attendees, &invite.subject, &invite.body, &organizer),
            )
            .await
        };

        match (created, sent) {
            (Ok(event_id), Ok(())) => {
                info!("Created event {} and notified {} attendees", event_id, attendees.len());
                Response::complete(
                    "Meeting scheduled, calendar event created, and notification email sent to all attendees.",
                )
            }
            (Ok(_), Err(e)) => Response::complete(format!(
                "Meeting scheduled and calendar event created, but failed to send notification email ({}).",
                e
            )),
            (Err(e), Ok(())) => Response::complete(format!(
                "Meeting notification email sent, but failed to create calendar event ({}).",
                e
            )),
            (Err(create_err), Err(send_err)) => Response::error(format!(
                "Failed to schedule meeting: could not create calendar event ({}) or send notification email ({}).",
                create_err, send_err
            )),
        }
    }

    /// Execute a confirmed dinner booking. Zero attendee emails is still a
    /// confirmed booking, reported with zero invites sent rather than as a
    /// failure.
    async fn confirm_dinner(&mut self, payload: Goal, key: &str) -> Response {
        let Some(place) = payload.selected_place.clone() else {
            return Response::clarify(
                "No restaurant selected. Please pick one of the listed options.",
            );
        };
        let attendees = payload.employee_emails.clone();

        if attendees.is_empty() {
            return Response::complete(format!(
                "Dinner booking confirmed at {}! No attendee emails were available, so no invites were sent.",
                place.name
            ));
        }

        let date_label = payload
            .date
            .map(|d| d.format("%B %d, %Y").to_string())
            .unwrap_or_else(|| "a date to be decided".to_string());
        let organizer = if key == ANONYMOUS {
            self.email.fallback_sender.clone()
        } else {
            key.to_string()
        };
        let invite = self.templates.dinner_invite(&place, &date_label, &organizer);

        match self
            .bounded(
                self.notifier
                    .send(&attendees, &invite.subject, &invite.body, &organizer),
            )
            .await
        {
            Ok(()) => Response::complete(format!(
                "Dinner booking confirmed at {}! Invites sent to {} attendees.",
                place.name,
                attendees.len()
            )),
            Err(e) => Response::complete(format!(
                "Dinner booking confirmed at {}! However, there was an issue sending invites ({}).",
                place.name, e
            )),
        }
    }

    /// Delete an event and notify its attendees.
    pub async fn cancel_event(
        &mut self,
        event_id: &str,
        details: &EventDraft,
        requester: Option<&str>,
    ) -> Response {
        if let Err(e) = self.bounded(self.calendar.delete_event(event_id)).await {
            return Response::error(format!("Failed to delete event {} ({}).", event_id, e));
        }

        if details.attendees.is_empty() {
            return Response::complete("Event deleted. There were no attendees to notify.");
        }

        let from = requester
            .map(str::to_string)
            .unwrap_or_else(|| self.email.fallback_sender.clone());
        let subject = format!(
            "Event Cancelled: {} on {}",
            details.title,
            details.date.format("%B %d, %Y")
        );
        let body = format!(
            "Hi all,\n\n\
             The following event has been cancelled:\n\
             - Title: {}\n\
             - Date: {}\n\
             - Time: {}\n\
             - Location: {}\n\n\
             We apologize for any inconvenience.\n\n\
             Best regards,\n\
             {}\n",
            details.title,
            details.date.format("%B %d, %Y"),
            details.start.format("%H:%M"),
            details.location,
            from,
        );

        match self
            .bounded(
                self.notifier
                    .send(&details.attendees, &subject, &body, &from),
            )
            .await
        {
            Ok(()) => Response::complete("Event deleted and attendees notified."),
            Err(e) => Response::complete(format!(
                "Event deleted, but attendee notification failed ({}).",
                e
            )),
        }
    }

    /// Capability summary for the status command.
    pub fn status(&self) -> EngineStatus {
        let mut capabilities = vec!["directory", "availability", "calendar", "notifier", "places"];
        if self.generator.is_some() {
            capabilities.push("content-generator");
        }
        EngineStatus {
            directory_size: self.resolver.people().len(),
            active_sessions: self.sessions.len(),
            capabilities,
        }
    }

    /// Reap sessions idle longer than `max_idle`.
    pub fn reap_idle_sessions(&mut self, max_idle: chrono::Duration) -> usize {
        self.sessions.reap_idle(max_idle)
    }

    /// Reclaim settled confirmations older than `max_age` in every session.
    pub fn expire_confirmations(&mut self, max_age: chrono::Duration) -> usize {
        self.sessions
            .iter_mut()
            .map(|session| session.ledger.expire(max_age))
            .sum()
    }

    fn find_person(&self, email: &str) -> Option<Person> {
        let email = email.trim();
        self.resolver
            .people()
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Draft one personalized mail, going through the configured generator
    /// with the template fallback behind it.
    async fn draft_personal_mail(
        &self,
        recipient_name: &str,
        sender_name: &str,
        purpose: &str,
    ) -> Draft {
        if let Some(generator) = &self.generator {
            let prompt = format!(
                "Write a short, clear, {} email to {} from {}. The purpose of the email is: {}",
                self.email.tone, recipient_name, sender_name, purpose
            );
            match self.bounded(generator.draft(&prompt)).await {
                Ok(draft) => return draft,
                Err(e) => {
                    warn!("Content generator failed, using template fallback: {}", e);
                }
            }
        }
        self.templates
            .personal_mail(recipient_name, sender_name, purpose)
    }

    /// Bound a capability call by the configured timeout.
    async fn bounded<T, F>(&self, call: F) -> Result<T, CapabilityError>
    where
        F: Future<Output = Result<T, CapabilityError>>,
    {
        let limit = Duration::from_secs(self.scheduling.capability_timeout_secs);
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout),
        }
    }
}

/// Convert a capability fault into a failed response with the reason
/// surfaced, never swallowed.
fn capability_failure(context: &str, error: &CapabilityError) -> Response {
    warn!("Capability failure while {}: {}", context, error);
    Response::error(format!("An error occurred while {}: {}.", context, error))
}

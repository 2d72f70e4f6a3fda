//! Template drafting
//!
//! The fallback content generator. Real deployments may plug an LLM-backed
//! `ContentGenerator` in; this one expands fixed templates, and the
//! orchestrator falls back to it whenever no generator is configured or the
//! configured one fails. Also carries the meeting and dinner invite
//! templates used for notification mail.

use async_trait::async_trait;

use sdk::capability::ContentGenerator;
use sdk::errors::CapabilityError;
use sdk::types::{Draft, EventDraft, Place};

use crate::formatters::format_duration;

/// Template-based drafting backend.
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Meeting invite mail for an event draft.
    pub fn meeting_invite(&self, event: &EventDraft) -> Draft {
        let subject = format!(
            "Meeting: {} - {} at {}",
            event.title,
            event.date.format("%B %d, %Y"),
            event.start.format("%H:%M")
        );
        let body = format!(
            "Hi all,\n\n\
             I've scheduled a meeting for {date} at {time}.\n\n\
             Meeting Details:\n\
             - Title: {title}\n\
             - Date: {date}\n\
             - Time: {time}\n\
             - Duration: {duration}\n\
             - Location: {location}\n\n\
             Please let me know if you need to reschedule.\n\n\
             Best regards,\n\
             {organizer}\n",
            date = event.date.format("%B %d, %Y"),
            time = event.start.format("%H:%M"),
            title = event.title,
            duration = format_duration(event.duration_minutes),
            location = event.location,
            organizer = event.organizer,
        );
        Draft::new(subject, body)
    }

    /// Dinner invite mail for a booked place.
    pub fn dinner_invite(&self, place: &Place, date_label: &str, organizer: &str) -> Draft {
        let subject = format!("Team Dinner: {} on {}", place.name, date_label);
        let body = format!(
            "Hi all,\n\n\
             I've organized a team dinner on {date_label}.\n\n\
             Restaurant Details:\n\
             - Name: {name}\n\
             - Address: {address}\n\
             - Cuisine: {cuisine}\n\
             - Rating: {rating:.1}\n\n\
             Please confirm your attendance.\n\n\
             Best regards,\n\
             {organizer}\n",
            name = place.name,
            address = place.address,
            cuisine = place.cuisine.as_deref().unwrap_or("Various"),
            rating = place.rating,
        );
        Draft::new(subject, body)
    }

    /// Personal mail expanded from a short instruction.
    pub fn personal_mail(&self, recipient_name: &str, sender_name: &str, purpose: &str) -> Draft {
        let subject = format!("Message from {}", sender_name);
        let body = format!(
            "Hi {recipient_name},\n\n\
             {purpose}\n\n\
             Best regards,\n\
             {sender_name}\n",
        );
        Draft::new(subject, body)
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentGenerator for TemplateGenerator {
    async fn draft(&self, prompt: &str) -> Result<Draft, CapabilityError> {
        // The prompt is the purpose line; without a model there is nothing
        // smarter to do than wrap it politely.
        Ok(Draft::new(
            "A note from your assistant".to_string(),
            format!("Hi,\n\n{}\n\nBest regards\n", prompt.trim()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_meeting_invite_fields_present() {
        let event = EventDraft {
            title: "Quarterly Review".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 10).unwrap(),
            start: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            duration_minutes: 90,
            location: "Conference Room".to_string(),
            attendees: vec!["om@company.com".to_string()],
            organizer: "lead@company.com".to_string(),
            timezone: "UTC".to_string(),
        };

        let draft = TemplateGenerator::new().meeting_invite(&event);
        assert!(draft.subject.contains("Quarterly Review"));
        assert!(draft.body.contains("August 10, 2025"));
        assert!(draft.body.contains("14:00"));
        assert!(draft.body.contains("1 hour 30 minutes"));
    }

    #[test]
    fn test_personal_mail_uses_names() {
        let draft = TemplateGenerator::new().personal_mail("Om", "Nidhi", "the demo went well");
        assert!(draft.body.starts_with("Hi Om,"));
        assert!(draft.body.contains("the demo went well"));
        assert!(draft.body.contains("Nidhi"));
    }
}

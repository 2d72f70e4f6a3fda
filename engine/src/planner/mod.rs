//! Task plan construction
//!
//! Maps an extracted goal onto a task plan: a concrete action type, an
//! ordered descriptive step list, and the declared required/optional field
//! sets for the intent. Steps are traceability metadata; the orchestrator
//! branches on the action type, it never iterates steps mechanically.

use serde::Serialize;
use tracing::debug;

use crate::extractor::{Goal, Intent};

/// Concrete action a plan resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    MeetingScheduling,
    RestaurantBooking,
    AvailabilityCheck,
    SendEmail,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::MeetingScheduling => write!(f, "meeting_scheduling"),
            ActionType::RestaurantBooking => write!(f, "restaurant_booking"),
            ActionType::AvailabilityCheck => write!(f, "availability_check"),
            ActionType::SendEmail => write!(f, "send_email"),
        }
    }
}

/// Fields a plan template can require or suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Date,
    Time,
    Duration,
    Location,
    Title,
    Cuisine,
    TeamSize,
    Employees,
    Recipients,
    Message,
    Subject,
}

impl GoalField {
    fn name(&self) -> &'static str {
        match self {
            GoalField::Date => "date",
            GoalField::Time => "time",
            GoalField::Duration => "duration",
            GoalField::Location => "location",
            GoalField::Title => "title",
            GoalField::Cuisine => "cuisine",
            GoalField::TeamSize => "team_size",
            GoalField::Employees => "employees",
            GoalField::Recipients => "recipients",
            GoalField::Message => "message",
            GoalField::Subject => "subject",
        }
    }

    /// Presence check against a goal. The ask-user recipient variant counts
    /// as present: it needs clarification, not re-extraction.
    fn present_in(&self, goal: &Goal) -> bool {
        use crate::extractor::RecipientResolution;
        match self {
            GoalField::Date => goal.date.is_some(),
            GoalField::Time => goal.time.is_some(),
            GoalField::Duration => goal.duration_minutes.is_some(),
            GoalField::Location => goal.location.is_some(),
            GoalField::Title => goal.title.is_some(),
            GoalField::Cuisine => goal.cuisine.is_some(),
            GoalField::TeamSize => goal.team_size.is_some(),
            GoalField::Employees => !goal.employees.is_empty(),
            GoalField::Recipients => goal.recipients != RecipientResolution::NotApplicable,
            GoalField::Message => goal.message.is_some(),
            GoalField::Subject => goal.subject.is_some(),
        }
    }
}

/// Static plan template for one intent.
struct PlanTemplate {
    action: ActionType,
    steps: &'static [&'static str],
    required: &'static [GoalField],
    optional: &'static [GoalField],
}

/// Intent to template lookup, the fixed table the planner works from.
fn template_for(intent: Intent) -> &'static PlanTemplate {
    match intent {
        Intent::Meeting => &PlanTemplate {
            action: ActionType::MeetingScheduling,
            steps: &[
                "extract_meeting_details",
                "check_availability",
                "find_available_slots",
                "present_options",
                "get_confirmation",
                "schedule_meeting",
                "send_invites",
            ],
            required: &[GoalField::Date],
            optional: &[
                GoalField::Time,
                GoalField::Duration,
                GoalField::Location,
                GoalField::Title,
                GoalField::Employees,
            ],
        },
        Intent::Dinner => &PlanTemplate {
            action: ActionType::RestaurantBooking,
            steps: &[
                "extract_restaurant_details",
                "search_restaurants",
                "filter_by_criteria",
                "present_options",
                "get_confirmation",
                "book_restaurant",
                "send_invites",
            ],
            required: &[GoalField::Location],
            optional: &[
                GoalField::Cuisine,
                GoalField::Date,
                GoalField::Time,
                GoalField::TeamSize,
                GoalField::Employees,
            ],
        },
        Intent::Availability => &PlanTemplate {
            action: ActionType::AvailabilityCheck,
            steps: &[
                "extract_availability_details",
                "check_calendars",
                "find_common_slots",
                "present_results",
            ],
            required: &[GoalField::Date, GoalField::Employees],
            optional: &[GoalField::Time],
        },
        Intent::Email => &PlanTemplate {
            action: ActionType::SendEmail,
            steps: &["extract_email_details", "compose_email", "send_email"],
            required: &[GoalField::Recipients, GoalField::Message],
            optional: &[GoalField::Subject],
        },
    }
}

/// Plan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Invalid,
}

/// Goal plus execution metadata.
#[derive(Debug, Clone, Serialize)]
pub struct TaskPlan {
    pub action: ActionType,
    pub steps: Vec<String>,
    pub goal: Goal,
    pub status: PlanStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl TaskPlan {
    pub fn is_valid(&self) -> bool {
        self.status == PlanStatus::Pending
    }
}

/// Builds task plans from goals using the fixed template table.
pub struct PlanBuilder;

impl PlanBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Copy the goal into a plan for its intent. Missing required fields
    /// mark the plan invalid, with one verbatim error per field.
    pub fn build(&self, goal: &Goal) -> TaskPlan {
        let template = template_for(goal.intent);

        let mut errors = Vec::new();
        for field in template.required {
            if !field.present_in(goal) {
                errors.push(format!("Missing required field: {}", field.name()));
            }
        }

        let status = if errors.is_empty() {
            PlanStatus::Pending
        } else {
            PlanStatus::Invalid
        };
        debug!(
            "Built {} plan with status {:?} ({} errors)",
            template.action,
            status,
            errors.len()
        );

        TaskPlan {
            action: template.action,
            steps: template.steps.iter().map(|s| s.to_string()).collect(),
            goal: goal.clone(),
            status,
            errors,
        }
    }

    /// Declared optional fields for an intent, exposed for diagnostics.
    pub fn optional_fields(&self, intent: Intent) -> Vec<&'static str> {
        template_for(intent)
            .optional
            .iter()
            .map(|f| f.name())
            .collect()
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::RecipientResolution;
    use chrono::NaiveDate;

    #[test]
    fn test_meeting_plan_requires_date() {
        let builder = PlanBuilder::new();

        let goal = Goal::new(Intent::Meeting);
        let plan = builder.build(&goal);
        assert_eq!(plan.status, PlanStatus::Invalid);
        assert_eq!(plan.errors, vec!["Missing required field: date"]);

        let mut goal = Goal::new(Intent::Meeting);
        goal.date = NaiveDate::from_ymd_opt(2025, 8, 10);
        let plan = builder.build(&goal);
        assert!(plan.is_valid());
        assert_eq!(plan.action, ActionType::MeetingScheduling);
    }

    #[test]
    fn test_dinner_plan_requires_location() {
        let builder = PlanBuilder::new();
        let goal = Goal::new(Intent::Dinner);
        let plan = builder.build(&goal);

        assert_eq!(plan.status, PlanStatus::Invalid);
        assert_eq!(plan.errors, vec!["Missing required field: location"]);
    }

    #[test]
    fn test_availability_plan_requires_date_and_employees() {
        let builder = PlanBuilder::new();
        let goal = Goal::new(Intent::Availability);
        let plan = builder.build(&goal);

        assert_eq!(plan.errors.len(), 2);
        assert!(plan.errors.iter().any(|e| e.contains("date")));
        assert!(plan.errors.iter().any(|e| e.contains("employees")));
    }

    #[test]
    fn test_email_ask_user_counts_as_present() {
        let builder = PlanBuilder::new();
        let mut goal = Goal::new(Intent::Email);
        goal.recipients = RecipientResolution::AskUser;
        goal.message = Some("hi".to_string());

        // Needs clarification, not re-extraction: the plan itself is valid
        let plan = builder.build(&goal);
        assert!(plan.is_valid());
    }

    #[test]
    fn test_steps_are_descriptive_metadata() {
        let builder = PlanBuilder::new();
        let mut goal = Goal::new(Intent::Meeting);
        goal.date = NaiveDate::from_ymd_opt(2025, 8, 10);

        let plan = builder.build(&goal);
        assert_eq!(plan.steps.first().map(String::as_str), Some("extract_meeting_details"));
        assert_eq!(plan.steps.last().map(String::as_str), Some("send_invites"));
    }
}

//! Response contract
//!
//! The one shape every caller (CLI, API, UI) programs against. The
//! `next_action` vocabulary and the payload field names are the wire
//! contract; changing them breaks compatibility, so they are pinned by
//! tests.

use sdk::types::{Conflict, Place, Schedule, TimeSlot};
use serde::Serialize;

/// What the caller must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Ask the user a question and resubmit
    Clarify,
    /// Collect the listed missing fields and resubmit
    InputMissingFields,
    /// Present slot options; call back with a selection
    SelectTimeSlot,
    /// Present restaurant options; call back with a selection
    SelectRestaurant,
    /// Render the returned schedules
    DisplaySchedules,
    /// Nothing further to do
    Complete,
    /// Terminal failure for this turn
    Error,
    /// No options matched; retry with different parameters
    SuggestAlternatives,
}

/// A numbered time-slot option.
#[derive(Debug, Clone, Serialize)]
pub struct SlotOption {
    pub id: usize,
    /// "HH:MM - HH:MM" label
    pub time: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: u32,
}

impl SlotOption {
    pub fn from_slot(id: usize, slot: &TimeSlot) -> Self {
        Self {
            id,
            time: slot.label(),
            start_time: slot.start.format("%H:%M").to_string(),
            end_time: slot.end.format("%H:%M").to_string(),
            duration: slot.duration_minutes,
        }
    }
}

/// A numbered restaurant option.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOption {
    pub id: usize,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hours: Vec<String>,
    pub source: String,
}

impl PlaceOption {
    pub fn from_place(id: usize, place: &Place) -> Self {
        Self {
            id,
            name: place.name.clone(),
            address: place.address.clone(),
            cuisine: place.cuisine.clone(),
            rating: place.rating,
            phone: place.phone.clone(),
            hours: place.hours.clone(),
            source: place.source.clone(),
        }
    }
}

/// Either kind of presentable option.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OptionItem {
    Slot(SlotOption),
    Place(PlaceOption),
}

/// The uniform reply for every orchestrator call.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
    pub next_action: NextAction,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionItem>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<Schedule>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_id: Option<String>,
}

impl Response {
    fn base(success: bool, message: impl Into<String>, next_action: NextAction) -> Self {
        Self {
            success,
            message: message.into(),
            next_action,
            options: Vec::new(),
            missing_fields: Vec::new(),
            warnings: Vec::new(),
            schedules: Vec::new(),
            conflicts: Vec::new(),
            confirmation_id: None,
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::base(true, message, NextAction::Complete)
    }

    pub fn clarify(message: impl Into<String>) -> Self {
        Self::base(false, message, NextAction::Clarify)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::base(false, message, NextAction::Error)
    }

    pub fn suggest_alternatives(message: impl Into<String>) -> Self {
        Self::base(false, message, NextAction::SuggestAlternatives)
    }

    pub fn input_missing_fields(message: impl Into<String>, fields: Vec<String>) -> Self {
        let mut response = Self::base(false, message, NextAction::InputMissingFields);
        response.missing_fields = fields;
        response
    }

    pub fn select_time_slot(message: impl Into<String>, slots: &[TimeSlot]) -> Self {
        let mut response = Self::base(true, message, NextAction::SelectTimeSlot);
        response.options = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| OptionItem::Slot(SlotOption::from_slot(i + 1, slot)))
            .collect();
        response
    }

    pub fn select_restaurant(message: impl Into<String>, places: &[Place]) -> Self {
        let mut response = Self::base(true, message, NextAction::SelectRestaurant);
        response.options = places
            .iter()
            .enumerate()
            .map(|(i, place)| OptionItem::Place(PlaceOption::from_place(i + 1, place)))
            .collect();
        response
    }

    pub fn display_schedules(message: impl Into<String>, schedules: Vec<Schedule>) -> Self {
        let mut response = Self::base(true, message, NextAction::DisplaySchedules);
        response.schedules = schedules;
        response
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_missing_fields(mut self, fields: Vec<String>) -> Self {
        self.missing_fields = fields;
        self
    }

    pub fn with_conflicts(mut self, conflicts: Vec<Conflict>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn with_confirmation_id(mut self, id: impl Into<String>) -> Self {
        self.confirmation_id = Some(id.into());
        self
    }

    /// Failure with the slot-selection action, used when a confirmed slot
    /// went stale and fresh options are being re-presented.
    pub fn reselect_time_slot(message: impl Into<String>, slots: &[TimeSlot]) -> Self {
        let mut response = Self::base(false, message, NextAction::SelectTimeSlot);
        response.options = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| OptionItem::Slot(SlotOption::from_slot(i + 1, slot)))
            .collect();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_next_action_wire_names() {
        let names: Vec<String> = [
            NextAction::Clarify,
            NextAction::InputMissingFields,
            NextAction::SelectTimeSlot,
            NextAction::SelectRestaurant,
            NextAction::DisplaySchedules,
            NextAction::Complete,
            NextAction::Error,
            NextAction::SuggestAlternatives,
        ]
        .iter()
        .map(|a| serde_json::to_string(a).unwrap())
        .collect();

        assert_eq!(
            names,
            vec![
                "\"clarify\"",
                "\"input_missing_fields\"",
                "\"select_time_slot\"",
                "\"select_restaurant\"",
                "\"display_schedules\"",
                "\"complete\"",
                "\"error\"",
                "\"suggest_alternatives\"",
            ]
        );
    }

    #[test]
    fn test_slot_options_are_numbered_from_one() {
        let slots = vec![
            TimeSlot::new(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                60,
            ),
            TimeSlot::new(
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                60,
            ),
        ];
        let response = Response::select_time_slot("pick one", &slots);

        assert!(response.success);
        assert_eq!(response.options.len(), 2);
        match &response.options[0] {
            OptionItem::Slot(slot) => {
                assert_eq!(slot.id, 1);
                assert_eq!(slot.time, "09:00 - 10:00");
            }
            _ => panic!("expected slot option"),
        }
    }

    #[test]
    fn test_empty_payloads_not_serialized() {
        let response = Response::complete("done");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("options"));
        assert!(!json.contains("missing_fields"));
        assert!(!json.contains("conflicts"));
        assert!(json.contains("\"next_action\":\"complete\""));
    }
}

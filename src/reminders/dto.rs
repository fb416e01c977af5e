use serde::{Deserialize, Serialize};

use crate::store::Medication;

#[derive(Debug, Default, Deserialize)]
pub struct AddReminderForm {
    #[serde(default)]
    pub reminder_time: String,
    #[serde(default)]
    pub frequency: String,
    /// Comma-separated weekday indices, 0=Monday.
    pub days_of_week: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddReminderPage {
    pub medication: Medication,
    pub frequencies: [&'static str; 3],
}

/// One entry of the dashboard's upcoming list and of `/api/upcoming-reminders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingReminder {
    pub id: i64,
    pub medication_name: String,
    pub dosage: String,
    pub time: String,
    pub medication_id: i64,
}

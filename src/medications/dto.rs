use serde::{Deserialize, Serialize};

use crate::store::{Dose, Medication, Reminder};

#[derive(Debug, Default, Deserialize)]
pub struct AddMedicationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MedicationDetails {
    #[serde(flatten)]
    pub medication: Medication,
    pub reminders: Vec<Reminder>,
    pub doses: Vec<Dose>, // newest first
}

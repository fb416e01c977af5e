use serde::{Deserialize, Serialize};

use crate::store::Dose;

#[derive(Debug, Default, Deserialize)]
pub struct LogDoseForm {
    pub notes: Option<String>,
}

/// Kept as text so a malformed `page` falls back to the first page instead of
/// failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<String>,
}

/// A dose with the name of its medication attached.
#[derive(Debug, Clone, Serialize)]
pub struct DoseEntry {
    #[serde(flatten)]
    pub dose: Dose,
    pub medication_name: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub items: Vec<DoseEntry>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Debug, Serialize)]
pub struct LogDoseResponse {
    pub success: bool,
    pub message: String,
}

use std::collections::HashMap;

use tracing::info;

use super::dto::{DoseEntry, HistoryPage};
use crate::error::{AppError, AppResult};
use crate::medications::services::{non_blank, owned_medication};
use crate::store::{Dose, Medication, NewDose, Store};

pub const RECENT_DOSES_LIMIT: i64 = 10;
pub const HISTORY_PAGE_SIZE: i64 = 20;

/// Records a dose taken now.
pub async fn log_dose(
    store: &dyn Store,
    user_id: i64,
    medication_id: i64,
    notes: Option<String>,
) -> AppResult<(Dose, Medication)> {
    let medication = owned_medication(store, user_id, medication_id).await?;
    let dose = store
        .create_dose(NewDose {
            medication_id: medication.id,
            notes: non_blank(notes),
        })
        .await?;
    info!(user_id, medication_id, dose_id = dose.id, "dose logged");
    Ok((dose, medication))
}

async fn attach_names(
    store: &dyn Store,
    user_id: i64,
    doses: Vec<Dose>,
) -> AppResult<Vec<DoseEntry>> {
    let names: HashMap<i64, String> = store
        .list_medications(user_id)
        .await?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();
    Ok(doses
        .into_iter()
        .map(|dose| DoseEntry {
            medication_name: names.get(&dose.medication_id).cloned().unwrap_or_default(),
            dose,
        })
        .collect())
}

/// The user's latest doses, newest first.
pub async fn recent_doses(store: &dyn Store, user_id: i64, limit: i64) -> AppResult<Vec<DoseEntry>> {
    let doses = store.list_doses_for_user(user_id, Some(limit), 0).await?;
    attach_names(store, user_id, doses).await
}

/// Missing or unparsable pages mean the first one.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// One page of the user's doses, newest first. Pages are 1-based; asking for
/// a page below 1 or past the end (other than an empty first page) is
/// `NotFound`.
pub async fn history(
    store: &dyn Store,
    user_id: i64,
    page: i64,
    per_page: i64,
) -> AppResult<HistoryPage> {
    if page < 1 || per_page < 1 {
        return Err(AppError::not_found("Page not found"));
    }
    let total = store.count_doses_for_user(user_id).await?;
    let pages = (total + per_page - 1) / per_page;
    // Checked before the offset so huge page numbers cannot overflow it.
    if page > pages.max(1) {
        return Err(AppError::not_found("Page not found"));
    }
    let doses = store
        .list_doses_for_user(user_id, Some(per_page), (page - 1) * per_page)
        .await?;

    Ok(HistoryPage {
        items: attach_names(store, user_id, doses).await?,
        page,
        per_page,
        total,
        pages,
        has_prev: page > 1,
        has_next: page < pages,
    })
}

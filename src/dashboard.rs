use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{
    auth::CurrentUser,
    doses::{dto::DoseEntry, services::recent_doses, services::RECENT_DOSES_LIMIT},
    error::AppResult,
    reminders::{dto::UpcomingReminder, services::upcoming_reminders},
    state::AppState,
    store::Medication,
};

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub medications: Vec<Medication>,
    pub upcoming_reminders: Vec<UpcomingReminder>,
    pub recent_doses: Vec<DoseEntry>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<DashboardView>> {
    let store = state.store.as_ref();
    Ok(Json(DashboardView {
        medications: store.list_medications(user.id).await?,
        upcoming_reminders: upcoming_reminders(store, user.id).await?,
        recent_doses: recent_doses(store, user.id, RECENT_DOSES_LIMIT).await?,
    }))
}

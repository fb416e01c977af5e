use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::Redirect,
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AddReminderForm, AddReminderPage, UpcomingReminder},
    services::{self, Frequency},
};
use crate::{
    auth::CurrentUser, error::AppResult, medications::services::owned_medication,
    state::AppState,
};

pub fn reminder_routes() -> Router<AppState> {
    Router::new()
        .route("/reminder/add/:med_id", get(add_reminder_page).post(add_reminder))
        .route("/api/upcoming-reminders", get(api_upcoming_reminders))
}

#[instrument(skip(state))]
pub async fn add_reminder_page(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<AddReminderPage>> {
    let Path(med_id) = path?;
    let medication = owned_medication(state.store.as_ref(), user.id, med_id).await?;
    Ok(Json(AddReminderPage {
        medication,
        frequencies: Frequency::ALL.map(Frequency::as_str),
    }))
}

#[instrument(skip(state, form))]
pub async fn add_reminder(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    Form(form): Form<AddReminderForm>,
) -> AppResult<Redirect> {
    let Path(med_id) = path?;
    services::add_reminder(state.store.as_ref(), user.id, med_id, form).await?;
    Ok(Redirect::to("/"))
}

#[instrument(skip(state))]
pub async fn api_upcoming_reminders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<UpcomingReminder>>> {
    Ok(Json(services::upcoming_reminders(state.store.as_ref(), user.id).await?))
}

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::instrument;

use super::{
    dto::{HistoryPage, HistoryQuery, LogDoseForm, LogDoseResponse},
    services::{self, HISTORY_PAGE_SIZE},
};
use crate::{auth::CurrentUser, error::AppResult, state::AppState};

pub fn dose_routes() -> Router<AppState> {
    Router::new()
        .route("/dose/log/:med_id", post(log_dose))
        .route("/api/dose/:med_id", post(api_log_dose))
        .route("/history", get(history))
}

#[instrument(skip(state, form))]
pub async fn log_dose(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    Form(form): Form<LogDoseForm>,
) -> AppResult<Redirect> {
    let Path(med_id) = path?;
    services::log_dose(state.store.as_ref(), user.id, med_id, form.notes).await?;
    Ok(Redirect::to("/"))
}

#[instrument(skip(state))]
pub async fn api_log_dose(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<LogDoseResponse>> {
    let Path(med_id) = path?;
    let (_, medication) = services::log_dose(state.store.as_ref(), user.id, med_id, None).await?;
    Ok(Json(LogDoseResponse {
        success: true,
        message: format!("Dose logged for {}", medication.name),
    }))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<HistoryQuery>,
) -> AppResult<Json<HistoryPage>> {
    let page = services::parse_page(q.page.as_deref());
    Ok(Json(
        services::history(state.store.as_ref(), user.id, page, HISTORY_PAGE_SIZE).await?,
    ))
}

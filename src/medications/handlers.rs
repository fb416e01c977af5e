use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AddMedicationForm, MedicationDetails},
    services,
};
use crate::{
    auth::{dto::FormDescriptor, CurrentUser},
    error::AppResult,
    state::AppState,
    store::Medication,
};

pub fn medication_routes() -> Router<AppState> {
    Router::new()
        .route("/medication/add", get(add_medication_page).post(add_medication))
        .route("/medications", get(list_medications))
        .route("/medication/:id", get(get_medication))
        .route("/medication/:id/delete", post(delete_medication))
}

pub async fn add_medication_page(_user: CurrentUser) -> Json<FormDescriptor> {
    Json(FormDescriptor {
        action: "/medication/add",
        fields: &["name", "dosage", "description"],
    })
}

/// Continues straight to the reminder form of the new medication.
#[instrument(skip(state, form))]
pub async fn add_medication(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<AddMedicationForm>,
) -> AppResult<Redirect> {
    let medication = services::add_medication(state.store.as_ref(), user.id, form).await?;
    Ok(Redirect::to(&format!("/reminder/add/{}", medication.id)))
}

#[instrument(skip(state))]
pub async fn list_medications(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Medication>>> {
    Ok(Json(services::list_medications(state.store.as_ref(), user.id).await?))
}

#[instrument(skip(state))]
pub async fn get_medication(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MedicationDetails>> {
    let Path(id) = path?;
    Ok(Json(services::medication_details(state.store.as_ref(), user.id, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_medication(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Redirect> {
    let Path(id) = path?;
    services::delete_medication(state.store.as_ref(), user.id, id).await?;
    Ok(Redirect::to("/medications"))
}

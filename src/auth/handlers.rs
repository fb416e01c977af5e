use axum::{
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::{
    dto::{ChangePasswordForm, FormDescriptor, LoginForm, ProfileView, RegisterForm, UpdateProfileForm},
    extractors::CurrentUser,
    services,
    session::SessionKeys,
};
use crate::{error::AppResult, state::AppState, store::User};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/update", post(update_profile))
        .route("/profile/change-password", post(change_password))
        .route("/profile/delete", post(delete_account))
}

/// Redirect to the dashboard with a fresh session cookie for `user`.
fn start_session(state: &AppState, user: &User) -> AppResult<Response> {
    let keys = SessionKeys::from_ref(state);
    let token = keys.sign(user.id, &user.username)?;
    Ok((
        [(header::SET_COOKIE, keys.session_cookie(&token))],
        Redirect::to("/"),
    )
        .into_response())
}

fn end_session(state: &AppState) -> Response {
    let keys = SessionKeys::from_ref(state);
    (
        [(header::SET_COOKIE, keys.clear_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

pub async fn register_page(current: Option<CurrentUser>) -> Response {
    if current.is_some() {
        return Redirect::to("/").into_response();
    }
    Json(FormDescriptor {
        action: "/register",
        fields: &["username", "email", "password", "confirm_password"],
    })
    .into_response()
}

#[instrument(skip(state, current, form))]
pub async fn register(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let user = services::register(state.store.as_ref(), form).await?;
    start_session(&state, &user)
}

pub async fn login_page(current: Option<CurrentUser>) -> Response {
    if current.is_some() {
        return Redirect::to("/").into_response();
    }
    Json(FormDescriptor {
        action: "/login",
        fields: &["username", "password"],
    })
    .into_response()
}

#[instrument(skip(state, current, form))]
pub async fn login(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let user = services::login(state.store.as_ref(), form).await?;
    start_session(&state, &user)
}

pub async fn logout(State(state): State<AppState>) -> Response {
    end_session(&state)
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileView>> {
    let view = services::profile(
        state.store.as_ref(),
        user.id,
        OffsetDateTime::now_utc(),
        state.config.utc_offset(),
    )
    .await?;
    Ok(Json(view))
}

#[instrument(skip(state, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<UpdateProfileForm>,
) -> AppResult<Redirect> {
    services::update_email(state.store.as_ref(), user.id, &form.email).await?;
    Ok(Redirect::to("/profile"))
}

#[instrument(skip(state, form))]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ChangePasswordForm>,
) -> AppResult<Redirect> {
    services::change_password(state.store.as_ref(), user.id, form).await?;
    Ok(Redirect::to("/profile"))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    services::delete_account(state.store.as_ref(), user.id).await?;
    info!(username = %user.username, "session closed after account deletion");
    Ok(end_session(&state))
}

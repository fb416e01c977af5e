use lazy_static::lazy_static;
use regex::Regex;
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};

use super::dto::{ChangePasswordForm, LoginForm, ProfileStats, ProfileView, RegisterForm};
use super::password::{check_new_password, hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::store::{Dose, NewUser, Store, User};

pub const MIN_USERNAME_LEN: usize = 3;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(store: &dyn Store, form: RegisterForm) -> AppResult<User> {
    let username = form.username.trim().to_string();
    let email = normalize_email(&form.email);

    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(AppError::validation("All fields are required!"));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters!"
        )));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    check_new_password(&form.password, &form.confirm_password)?;

    if store.find_user_by_username(&username).await?.is_some() {
        warn!(%username, "username already exists");
        return Err(AppError::Conflict("Username already exists!".into()));
    }
    if store.find_user_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered!".into()));
    }

    let password_hash = hash_password(&form.password)?;
    let user = store
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn login(store: &dyn Store, form: LoginForm) -> AppResult<User> {
    let identifier = form.username.trim();
    if identifier.is_empty() || form.password.is_empty() {
        return Err(AppError::validation("Username and password are required!"));
    }

    let invalid = || AppError::Auth("Invalid username/email or password!".into());
    let Some(user) = store.find_user_by_login(identifier).await? else {
        warn!(%identifier, "login unknown user");
        return Err(invalid());
    };
    if !verify_password(&form.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = user.id, "user logged in");
    Ok(user)
}

pub async fn update_email(store: &dyn Store, user_id: i64, email: &str) -> AppResult<()> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::validation("Email is required!"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    if let Some(existing) = store.find_user_by_email(&email).await? {
        if existing.id != user_id {
            return Err(AppError::Conflict(
                "Email already registered by another account!".into(),
            ));
        }
    }
    store.update_user_email(user_id, &email).await?;
    info!(user_id, "email updated");
    Ok(())
}

pub async fn change_password(
    store: &dyn Store,
    user_id: i64,
    form: ChangePasswordForm,
) -> AppResult<()> {
    if form.current_password.is_empty()
        || form.new_password.is_empty()
        || form.confirm_password.is_empty()
    {
        return Err(AppError::validation("All fields are required!"));
    }
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    if !verify_password(&form.current_password, &user.password_hash)? {
        warn!(user_id, "change password: wrong current password");
        return Err(AppError::Auth("Current password is incorrect!".into()));
    }
    check_new_password(&form.new_password, &form.confirm_password)?;

    let hash = hash_password(&form.new_password)?;
    store.update_user_password(user_id, &hash).await?;
    info!(user_id, "password changed");
    Ok(())
}

pub async fn delete_account(store: &dyn Store, user_id: i64) -> AppResult<()> {
    if !store.delete_user(user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id, "account deleted");
    Ok(())
}

pub async fn profile(
    store: &dyn Store,
    user_id: i64,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> AppResult<ProfileView> {
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let medications = store.list_medications(user_id).await?;
    let reminders = store.list_reminders_for_user(user_id).await?;
    let doses = store.list_doses_for_user(user_id, None, 0).await?;

    Ok(ProfileView {
        user: user.into(),
        stats: compute_stats(medications.len(), reminders.len(), &doses, now, offset),
    })
}

/// `doses_today` counts doses whose local calendar date equals `now`'s.
pub fn compute_stats(
    medications_count: usize,
    reminders_count: usize,
    doses: &[Dose],
    now: OffsetDateTime,
    offset: UtcOffset,
) -> ProfileStats {
    let today = now.to_offset(offset).date();
    let doses_today = doses
        .iter()
        .filter(|d| d.taken_at.to_offset(offset).date() == today)
        .count();
    ProfileStats {
        medications_count,
        reminders_count,
        doses_today,
        total_doses: doses.len(),
    }
}

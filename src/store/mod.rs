//! Persistence boundary.
//!
//! Handlers never touch SQL directly; they go through [`Store`], which the
//! Postgres adapter implements in production and an in-memory map implements
//! in tests. Ownership is not checked here except where a query is scoped by
//! `user_id`.

use async_trait::async_trait;

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod repo_types;

pub use repo_types::{Dose, Medication, NewDose, NewMedication, NewReminder, NewUser, Reminder, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the offending field.
    #[error("unique constraint violated on {0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let field = match db.constraint() {
                    Some(c) if c.contains("username") => "username",
                    Some(c) if c.contains("email") => "email",
                    _ => "record",
                };
                return StoreError::Conflict(field.into());
            }
        }
        StoreError::Backend(e.into())
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // --- users ---
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, user_id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Matches either the username or the (lower-cased) email.
    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>>;
    async fn update_user_email(&self, user_id: i64, email: &str) -> StoreResult<()>;
    async fn update_user_password(&self, user_id: i64, password_hash: &str) -> StoreResult<()>;
    /// Deletes the user and everything it owns. Returns false if no such user.
    async fn delete_user(&self, user_id: i64) -> StoreResult<bool>;

    // --- medications ---
    async fn create_medication(&self, new: NewMedication) -> StoreResult<Medication>;
    /// Insertion order.
    async fn list_medications(&self, user_id: i64) -> StoreResult<Vec<Medication>>;
    async fn find_medication(
        &self,
        user_id: i64,
        medication_id: i64,
    ) -> StoreResult<Option<Medication>>;
    /// Deletes the medication with its reminders and doses. Returns false if
    /// `user_id` owns no such medication.
    async fn delete_medication(&self, user_id: i64, medication_id: i64) -> StoreResult<bool>;

    // --- reminders ---
    async fn create_reminder(&self, new: NewReminder) -> StoreResult<Reminder>;
    async fn list_reminders_for_medication(&self, medication_id: i64) -> StoreResult<Vec<Reminder>>;
    /// Ordered by medication id, then reminder id.
    async fn list_reminders_for_user(&self, user_id: i64) -> StoreResult<Vec<Reminder>>;

    // --- doses ---
    async fn create_dose(&self, new: NewDose) -> StoreResult<Dose>;
    /// Newest first.
    async fn list_doses_for_medication(&self, medication_id: i64) -> StoreResult<Vec<Dose>>;
    /// Newest first. `limit: None` returns everything from `offset` on.
    async fn list_doses_for_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<Dose>>;
    async fn count_doses_for_user(&self, user_id: i64) -> StoreResult<i64>;
}

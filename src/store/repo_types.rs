use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Medication {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub dosage: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Reminder {
    pub id: i64,
    pub medication_id: i64,
    pub reminder_time: String, // "HH:MM"
    pub frequency: String,     // daily | weekly | custom
    pub days_of_week: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Dose {
    pub id: i64,
    pub medication_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub taken_at: OffsetDateTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewMedication {
    pub user_id: i64,
    pub name: String,
    pub dosage: String,
    pub description: Option<String>,
}

/// Already validated by the reminders service.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub medication_id: i64,
    pub reminder_time: String,
    pub frequency: String,
    pub days_of_week: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDose {
    pub medication_id: i64,
    pub notes: Option<String>,
}

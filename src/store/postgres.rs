use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{
    Dose, Medication, NewDose, NewMedication, NewReminder, NewUser, Reminder, Store, StoreResult,
    User,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";
const MEDICATION_COLUMNS: &str = "id, user_id, name, dosage, description, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = lower($1)
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user_email(&self, user_id: i64, email: &str) -> StoreResult<()> {
        sqlx::query("UPDATE users SET email = $2 WHERE id = $1")
            .bind(user_id)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_user_password(&self, user_id: i64, password_hash: &str) -> StoreResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        sqlx::query(
            r#"
            DELETE FROM doses
             WHERE medication_id IN (SELECT id FROM medications WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM reminders
             WHERE medication_id IN (SELECT id FROM medications WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM medications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await.context("commit tx")?;
        Ok(deleted > 0)
    }

    async fn create_medication(&self, new: NewMedication) -> StoreResult<Medication> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            r#"
            INSERT INTO medications (user_id, name, dosage, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.dosage)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(medication)
    }

    async fn list_medications(&self, user_id: i64) -> StoreResult<Vec<Medication>> {
        let rows = sqlx::query_as::<_, Medication>(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications WHERE user_id = $1 ORDER BY id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_medication(
        &self,
        user_id: i64,
        medication_id: i64,
    ) -> StoreResult<Option<Medication>> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = $1 AND user_id = $2"
        ))
        .bind(medication_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(medication)
    }

    async fn delete_medication(&self, user_id: i64, medication_id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        // Lock the row so a concurrent insert of a child cannot slip in.
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM medications WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(medication_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if owned.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM doses WHERE medication_id = $1")
            .bind(medication_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM reminders WHERE medication_id = $1")
            .bind(medication_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM medications WHERE id = $1")
            .bind(medication_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.context("commit tx")?;
        Ok(true)
    }

    async fn create_reminder(&self, new: NewReminder) -> StoreResult<Reminder> {
        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (medication_id, reminder_time, frequency, days_of_week)
            VALUES ($1, $2, $3, $4)
            RETURNING id, medication_id, reminder_time, frequency, days_of_week, is_active, created_at
            "#,
        )
        .bind(new.medication_id)
        .bind(&new.reminder_time)
        .bind(&new.frequency)
        .bind(&new.days_of_week)
        .fetch_one(&self.pool)
        .await?;
        Ok(reminder)
    }

    async fn list_reminders_for_medication(&self, medication_id: i64) -> StoreResult<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT id, medication_id, reminder_time, frequency, days_of_week, is_active, created_at
              FROM reminders
             WHERE medication_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(medication_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_reminders_for_user(&self, user_id: i64) -> StoreResult<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT r.id, r.medication_id, r.reminder_time, r.frequency, r.days_of_week,
                   r.is_active, r.created_at
              FROM reminders r
              JOIN medications m ON m.id = r.medication_id
             WHERE m.user_id = $1
             ORDER BY m.id ASC, r.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_dose(&self, new: NewDose) -> StoreResult<Dose> {
        let dose = sqlx::query_as::<_, Dose>(
            r#"
            INSERT INTO doses (medication_id, notes)
            VALUES ($1, $2)
            RETURNING id, medication_id, taken_at, notes
            "#,
        )
        .bind(new.medication_id)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(dose)
    }

    async fn list_doses_for_medication(&self, medication_id: i64) -> StoreResult<Vec<Dose>> {
        let rows = sqlx::query_as::<_, Dose>(
            r#"
            SELECT id, medication_id, taken_at, notes
              FROM doses
             WHERE medication_id = $1
             ORDER BY taken_at DESC, id DESC
            "#,
        )
        .bind(medication_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_doses_for_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<Dose>> {
        // LIMIT NULL means no limit in Postgres.
        let rows = sqlx::query_as::<_, Dose>(
            r#"
            SELECT d.id, d.medication_id, d.taken_at, d.notes
              FROM doses d
              JOIN medications m ON m.id = d.medication_id
             WHERE m.user_id = $1
             ORDER BY d.taken_at DESC, d.id DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_doses_for_user(&self, user_id: i64) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
              FROM doses d
              JOIN medications m ON m.id = d.medication_id
             WHERE m.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

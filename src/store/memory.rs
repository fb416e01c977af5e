//! In-memory [`Store`] used by the unit and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{
    Dose, Medication, NewDose, NewMedication, NewReminder, NewUser, Reminder, Store, StoreError,
    StoreResult, User,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    medications: Vec<Medication>,
    reminders: Vec<Reminder>,
    doses: Vec<Dose>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn medication_ids_of(&self, user_id: i64) -> Vec<i64> {
        self.medications
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.id)
            .collect()
    }

    fn newest_first(doses: &mut [Dose]) {
        doses.sort_by(|a, b| b.taken_at.cmp(&a.taken_at).then(b.id.cmp(&a.id)));
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    /// Backdates a dose, for tests that need doses on other days.
    pub fn set_taken_at(&self, dose_id: i64, taken_at: OffsetDateTime) {
        let mut t = self.lock();
        if let Some(d) = t.doses.iter_mut().find(|d| d.id == dose_id) {
            d.taken_at = taken_at;
        }
    }

    pub fn reminder_exists(&self, reminder_id: i64) -> bool {
        self.lock().reminders.iter().any(|r| r.id == reminder_id)
    }

    pub fn dose_exists(&self, dose_id: i64) -> bool {
        self.lock().doses.iter().any(|d| d.id == dose_id)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict("username".into()));
        }
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("email".into()));
        }
        let user = User {
            id: t.next_id(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>> {
        let email = identifier.to_lowercase();
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == identifier || u.email == email)
            .cloned())
    }

    async fn update_user_email(&self, user_id: i64, email: &str) -> StoreResult<()> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == email && u.id != user_id) {
            return Err(StoreError::Conflict("email".into()));
        }
        if let Some(u) = t.users.iter_mut().find(|u| u.id == user_id) {
            u.email = email.to_string();
        }
        Ok(())
    }

    async fn update_user_password(&self, user_id: i64, password_hash: &str) -> StoreResult<()> {
        if let Some(u) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            u.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: i64) -> StoreResult<bool> {
        let mut t = self.lock();
        let med_ids = t.medication_ids_of(user_id);
        t.doses.retain(|d| !med_ids.contains(&d.medication_id));
        t.reminders.retain(|r| !med_ids.contains(&r.medication_id));
        t.medications.retain(|m| m.user_id != user_id);
        let before = t.users.len();
        t.users.retain(|u| u.id != user_id);
        Ok(t.users.len() < before)
    }

    async fn create_medication(&self, new: NewMedication) -> StoreResult<Medication> {
        let mut t = self.lock();
        let medication = Medication {
            id: t.next_id(),
            user_id: new.user_id,
            name: new.name,
            dosage: new.dosage,
            description: new.description,
            created_at: OffsetDateTime::now_utc(),
        };
        t.medications.push(medication.clone());
        Ok(medication)
    }

    async fn list_medications(&self, user_id: i64) -> StoreResult<Vec<Medication>> {
        Ok(self
            .lock()
            .medications
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_medication(
        &self,
        user_id: i64,
        medication_id: i64,
    ) -> StoreResult<Option<Medication>> {
        Ok(self
            .lock()
            .medications
            .iter()
            .find(|m| m.id == medication_id && m.user_id == user_id)
            .cloned())
    }

    async fn delete_medication(&self, user_id: i64, medication_id: i64) -> StoreResult<bool> {
        let mut t = self.lock();
        if !t
            .medications
            .iter()
            .any(|m| m.id == medication_id && m.user_id == user_id)
        {
            return Ok(false);
        }
        t.doses.retain(|d| d.medication_id != medication_id);
        t.reminders.retain(|r| r.medication_id != medication_id);
        t.medications.retain(|m| m.id != medication_id);
        Ok(true)
    }

    async fn create_reminder(&self, new: NewReminder) -> StoreResult<Reminder> {
        let mut t = self.lock();
        let reminder = Reminder {
            id: t.next_id(),
            medication_id: new.medication_id,
            reminder_time: new.reminder_time,
            frequency: new.frequency,
            days_of_week: new.days_of_week,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        t.reminders.push(reminder.clone());
        Ok(reminder)
    }

    async fn list_reminders_for_medication(&self, medication_id: i64) -> StoreResult<Vec<Reminder>> {
        Ok(self
            .lock()
            .reminders
            .iter()
            .filter(|r| r.medication_id == medication_id)
            .cloned()
            .collect())
    }

    async fn list_reminders_for_user(&self, user_id: i64) -> StoreResult<Vec<Reminder>> {
        let t = self.lock();
        let mut med_ids = t.medication_ids_of(user_id);
        med_ids.sort_unstable();
        let mut out = Vec::new();
        for med_id in med_ids {
            out.extend(t.reminders.iter().filter(|r| r.medication_id == med_id).cloned());
        }
        Ok(out)
    }

    async fn create_dose(&self, new: NewDose) -> StoreResult<Dose> {
        let mut t = self.lock();
        let dose = Dose {
            id: t.next_id(),
            medication_id: new.medication_id,
            taken_at: OffsetDateTime::now_utc(),
            notes: new.notes,
        };
        t.doses.push(dose.clone());
        Ok(dose)
    }

    async fn list_doses_for_medication(&self, medication_id: i64) -> StoreResult<Vec<Dose>> {
        let mut doses: Vec<Dose> = self
            .lock()
            .doses
            .iter()
            .filter(|d| d.medication_id == medication_id)
            .cloned()
            .collect();
        Tables::newest_first(&mut doses);
        Ok(doses)
    }

    async fn list_doses_for_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<Dose>> {
        let t = self.lock();
        let med_ids = t.medication_ids_of(user_id);
        let mut doses: Vec<Dose> = t
            .doses
            .iter()
            .filter(|d| med_ids.contains(&d.medication_id))
            .cloned()
            .collect();
        Tables::newest_first(&mut doses);
        let limit = limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(doses
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit)
            .collect())
    }

    async fn count_doses_for_user(&self, user_id: i64) -> StoreResult<i64> {
        let t = self.lock();
        let med_ids = t.medication_ids_of(user_id);
        Ok(t.doses
            .iter()
            .filter(|d| med_ids.contains(&d.medication_id))
            .count() as i64)
    }
}

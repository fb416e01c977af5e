use tracing::info;

use super::dto::{AddMedicationForm, MedicationDetails};
use crate::error::{AppError, AppResult};
use crate::store::{Medication, NewMedication, Store};

/// Trims optional free text, treating blank as absent.
pub(crate) fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// The medication if `user_id` owns it. Absent and foreign medications are
/// the same error.
pub async fn owned_medication(
    store: &dyn Store,
    user_id: i64,
    medication_id: i64,
) -> AppResult<Medication> {
    store
        .find_medication(user_id, medication_id)
        .await?
        .ok_or_else(|| AppError::not_found("Medication not found"))
}

pub async fn add_medication(
    store: &dyn Store,
    user_id: i64,
    form: AddMedicationForm,
) -> AppResult<Medication> {
    let name = form.name.trim();
    let dosage = form.dosage.trim();
    if name.is_empty() || dosage.is_empty() {
        return Err(AppError::validation(
            "Medication name and dosage are required!",
        ));
    }
    let medication = store
        .create_medication(NewMedication {
            user_id,
            name: name.to_string(),
            dosage: dosage.to_string(),
            description: non_blank(form.description),
        })
        .await?;
    info!(user_id, medication_id = medication.id, name = %medication.name, "medication added");
    Ok(medication)
}

pub async fn list_medications(store: &dyn Store, user_id: i64) -> AppResult<Vec<Medication>> {
    Ok(store.list_medications(user_id).await?)
}

pub async fn medication_details(
    store: &dyn Store,
    user_id: i64,
    medication_id: i64,
) -> AppResult<MedicationDetails> {
    let medication = owned_medication(store, user_id, medication_id).await?;
    let reminders = store.list_reminders_for_medication(medication.id).await?;
    let doses = store.list_doses_for_medication(medication.id).await?;
    Ok(MedicationDetails {
        medication,
        reminders,
        doses,
    })
}

pub async fn delete_medication(
    store: &dyn Store,
    user_id: i64,
    medication_id: i64,
) -> AppResult<Medication> {
    let medication = owned_medication(store, user_id, medication_id).await?;
    if !store.delete_medication(user_id, medication_id).await? {
        return Err(AppError::not_found("Medication not found"));
    }
    info!(user_id, medication_id, name = %medication.name, "medication deleted");
    Ok(medication)
}

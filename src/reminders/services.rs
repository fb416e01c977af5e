use std::{collections::HashMap, fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use super::dto::{AddReminderForm, UpcomingReminder};
use crate::error::{AppError, AppResult};
use crate::medications::services::owned_medication;
use crate::store::{NewReminder, Reminder, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Custom,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Daily, Frequency::Weekly, Frequency::Custom];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Custom => "custom",
        }
    }

    fn uses_days(self) -> bool {
        !matches!(self, Frequency::Daily)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown frequency \"{s}\"")))
    }
}

/// Strict zero-padded 24-hour "HH:MM".
pub fn is_valid_time(time: &str) -> bool {
    lazy_static! {
        static ref TIME_RE: Regex = Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap();
    }
    TIME_RE.is_match(time)
}

/// Parses "0,2,4" into ascending, de-duplicated weekday indices.
pub fn parse_days(days: &str) -> AppResult<Vec<u8>> {
    let mut out = Vec::new();
    for part in days.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<u8>() {
            Ok(d) if d <= 6 => out.push(d),
            _ => {
                return Err(AppError::validation(format!(
                    "Invalid day of week \"{part}\" (expected 0=Monday to 6=Sunday)"
                )))
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

fn validate(medication_id: i64, form: AddReminderForm) -> AppResult<NewReminder> {
    let time = form.reminder_time.trim();
    let frequency = form.frequency.trim();
    if time.is_empty() || frequency.is_empty() {
        return Err(AppError::validation(
            "Reminder time and frequency are required!",
        ));
    }
    if !is_valid_time(time) {
        return Err(AppError::validation(format!(
            "Invalid reminder time \"{time}\" (expected HH:MM)"
        )));
    }
    let frequency: Frequency = frequency.parse()?;

    let days = match form.days_of_week.as_deref() {
        Some(raw) if frequency.uses_days() => parse_days(raw)?,
        _ => Vec::new(),
    };
    if frequency == Frequency::Custom && days.is_empty() {
        return Err(AppError::validation(
            "Custom reminders need at least one day of the week!",
        ));
    }
    let days_of_week = (!days.is_empty()).then(|| {
        days.iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",")
    });

    Ok(NewReminder {
        medication_id,
        reminder_time: time.to_string(),
        frequency: frequency.as_str().to_string(),
        days_of_week,
    })
}

pub async fn add_reminder(
    store: &dyn Store,
    user_id: i64,
    medication_id: i64,
    form: AddReminderForm,
) -> AppResult<Reminder> {
    let medication = owned_medication(store, user_id, medication_id).await?;
    let new = validate(medication.id, form)?;
    let reminder = store.create_reminder(new).await?;
    info!(
        user_id,
        medication_id,
        reminder_id = reminder.id,
        time = %reminder.reminder_time,
        "reminder set"
    );
    Ok(reminder)
}

/// Stable sort by time; fixed-width "HH:MM" orders correctly as text.
pub fn sort_by_time(entries: &mut [UpcomingReminder]) {
    entries.sort_by(|a, b| a.time.cmp(&b.time));
}

/// Active reminders across all of the user's medications, earliest first.
pub async fn upcoming_reminders(
    store: &dyn Store,
    user_id: i64,
) -> AppResult<Vec<UpcomingReminder>> {
    let medications: HashMap<i64, _> = store
        .list_medications(user_id)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut entries: Vec<UpcomingReminder> = store
        .list_reminders_for_user(user_id)
        .await?
        .into_iter()
        .filter(|r| r.is_active)
        .filter_map(|r| {
            let med = medications.get(&r.medication_id)?;
            Some(UpcomingReminder {
                id: r.id,
                medication_name: med.name.clone(),
                dosage: med.dosage.clone(),
                time: r.reminder_time,
                medication_id: med.id,
            })
        })
        .collect();
    sort_by_time(&mut entries);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{memory::MemoryStore, NewMedication, NewUser};

    fn form(time: &str, frequency: &str, days: Option<&str>) -> AddReminderForm {
        AddReminderForm {
            reminder_time: time.into(),
            frequency: frequency.into(),
            days_of_week: days.map(Into::into),
        }
    }

    fn entry(id: i64, time: &str) -> UpcomingReminder {
        UpcomingReminder {
            id,
            medication_name: "Aspirin".into(),
            dosage: "100mg".into(),
            time: time.into(),
            medication_id: 1,
        }
    }

    #[test]
    fn time_format() {
        for ok in ["00:00", "08:30", "23:59", "12:05"] {
            assert!(is_valid_time(ok), "{ok}");
        }
        for bad in ["8:30", "24:00", "12:60", "0830", "08:30 ", "ab:cd", ""] {
            assert!(!is_valid_time(bad), "{bad}");
        }
    }

    #[test]
    fn frequency_parse() {
        assert_eq!("weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("hourly".parse::<Frequency>().is_err());
        assert_eq!(Frequency::Custom.to_string(), "custom");
    }

    #[test]
    fn days_are_normalized() {
        assert_eq!(parse_days("4, 0,2,4").unwrap(), vec![0, 2, 4]);
        assert_eq!(parse_days("").unwrap(), Vec::<u8>::new());
        assert!(parse_days("7").is_err());
        assert!(parse_days("mon").is_err());
        assert!(parse_days("-1").is_err());
    }

    #[test]
    fn validate_rules() {
        assert!(matches!(validate(1, form("", "daily", None)), Err(AppError::Validation(_))));
        assert!(matches!(validate(1, form("08:00", "", None)), Err(AppError::Validation(_))));
        assert!(matches!(validate(1, form("8am", "daily", None)), Err(AppError::Validation(_))));
        assert!(matches!(validate(1, form("08:00", "often", None)), Err(AppError::Validation(_))));
        assert!(matches!(validate(1, form("08:00", "custom", Some(""))), Err(AppError::Validation(_))));

        let daily = validate(1, form("08:00", "daily", Some("1,2"))).unwrap();
        assert_eq!(daily.days_of_week, None);

        let custom = validate(1, form(" 21:15 ", "custom", Some("6,1,1"))).unwrap();
        assert_eq!(custom.reminder_time, "21:15");
        assert_eq!(custom.frequency, "custom");
        assert_eq!(custom.days_of_week.as_deref(), Some("1,6"));
    }

    #[test]
    fn sort_is_stable_for_equal_times() {
        let mut entries = vec![entry(1, "09:00"), entry(2, "08:30"), entry(3, "08:30")];
        sort_by_time(&mut entries);
        let ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, [2, 3, 1]);
    }

    #[tokio::test]
    async fn upcoming_collects_active_reminders_of_the_user_only() {
        let store = MemoryStore::new();
        let mut users = Vec::new();
        for name in ["alice", "bob"] {
            let u = store
                .create_user(NewUser {
                    username: name.into(),
                    email: format!("{name}@x.com"),
                    password_hash: "x".into(),
                })
                .await
                .unwrap();
            users.push(u.id);
        }
        let (alice, bob) = (users[0], users[1]);
        let med = |user_id, name: &str| NewMedication {
            user_id,
            name: name.into(),
            dosage: "1 pill".into(),
            description: None,
        };
        let aspirin = store.create_medication(med(alice, "Aspirin")).await.unwrap();
        let vitamin = store.create_medication(med(alice, "Vitamin D")).await.unwrap();
        let foreign = store.create_medication(med(bob, "Other")).await.unwrap();

        add_reminder(&store, alice, aspirin.id, form("09:00", "daily", None)).await.unwrap();
        add_reminder(&store, alice, vitamin.id, form("07:45", "weekly", Some("0"))).await.unwrap();
        add_reminder(&store, alice, aspirin.id, form("21:00", "daily", None)).await.unwrap();
        add_reminder(&store, bob, foreign.id, form("06:00", "daily", None)).await.unwrap();

        let upcoming = upcoming_reminders(&store, alice).await.unwrap();
        let view: Vec<_> = upcoming
            .iter()
            .map(|u| (u.time.as_str(), u.medication_name.as_str()))
            .collect();
        assert_eq!(
            view,
            [("07:45", "Vitamin D"), ("09:00", "Aspirin"), ("21:00", "Aspirin")]
        );
    }

    #[tokio::test]
    async fn add_reminder_checks_ownership() {
        let store = MemoryStore::new();
        let alice = store
            .create_user(NewUser {
                username: "alice".into(),
                email: "a@x.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        assert!(matches!(
            add_reminder(&store, alice.id, 999, form("08:00", "daily", None)).await,
            Err(AppError::NotFound(_))
        ));
    }
}

use crate::domain::models::{ExerciseLog, Reminder, UserProfile, WellnessLog};
use crate::domain::time::{NANOS_PER_DAY, Timestamp};
use crate::infrastructure::error::SyncError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_profile(&self) -> Result<Option<UserProfile>, SyncError>;
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), SyncError>;

    async fn list_reminders(&self) -> Result<Vec<Reminder>, SyncError>;
    async fn add_reminder(&self, reminder: &Reminder) -> Result<(), SyncError>;
    async fn update_reminder(&self, reminder_id: &str, reminder: &Reminder) -> Result<(), SyncError>;
    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), SyncError>;

    async fn list_wellness_logs_for_day(&self, day: Timestamp) -> Result<Vec<WellnessLog>, SyncError>;
    async fn add_wellness_log(&self, log: &WellnessLog) -> Result<(), SyncError>;
    async fn update_wellness_log(&self, log_id: &str, log: &WellnessLog) -> Result<(), SyncError>;
    async fn delete_wellness_log(&self, log_id: &str) -> Result<(), SyncError>;

    async fn list_exercise_logs_in_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ExerciseLog>, SyncError>;
    async fn add_exercise_log(&self, log: &ExerciseLog) -> Result<(), SyncError>;
    async fn update_exercise_log(&self, log_id: &str, log: &ExerciseLog) -> Result<(), SyncError>;
    async fn delete_exercise_log(&self, log_id: &str) -> Result<(), SyncError>;
}

#[derive(Debug, Default)]
struct StoredRecords {
    profile: Option<UserProfile>,
    reminders: HashMap<String, Reminder>,
    wellness_logs: HashMap<String, WellnessLog>,
    exercise_logs: HashMap<String, ExerciseLog>,
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<StoredRecords>,
}

impl InMemoryRecordStore {
    fn normalized_id(record_id: &str) -> Result<String, SyncError> {
        let normalized = record_id.trim();
        if normalized.is_empty() {
            return Err(SyncError::RemoteRejected("record id must not be empty".to_string()));
        }
        Ok(normalized.to_string())
    }

    fn lock_records(&self) -> Result<MutexGuard<'_, StoredRecords>, SyncError> {
        self.records
            .lock()
            .map_err(|error| SyncError::Internal(format!("record store lock poisoned: {error}")))
    }

    fn insert_new<T: Clone>(
        records: &mut HashMap<String, T>,
        record_id: &str,
        record: &T,
    ) -> Result<(), SyncError> {
        let record_id = Self::normalized_id(record_id)?;
        if records.contains_key(&record_id) {
            return Err(SyncError::RemoteRejected(format!("record {record_id} already exists")));
        }
        records.insert(record_id, record.clone());
        Ok(())
    }

    fn replace_existing<T: Clone>(
        records: &mut HashMap<String, T>,
        record_id: &str,
        record: &T,
    ) -> Result<(), SyncError> {
        let record_id = Self::normalized_id(record_id)?;
        let Some(existing) = records.get_mut(&record_id) else {
            return Err(SyncError::RemoteRejected(format!("record {record_id} not found")));
        };
        *existing = record.clone();
        Ok(())
    }

    fn remove_existing<T>(records: &mut HashMap<String, T>, record_id: &str) -> Result<(), SyncError> {
        let record_id = Self::normalized_id(record_id)?;
        records
            .remove(&record_id)
            .map(|_| ())
            .ok_or_else(|| SyncError::RemoteRejected(format!("record {record_id} not found")))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_profile(&self) -> Result<Option<UserProfile>, SyncError> {
        Ok(self.lock_records()?.profile.clone())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), SyncError> {
        self.lock_records()?.profile = Some(profile.clone());
        Ok(())
    }

    async fn list_reminders(&self) -> Result<Vec<Reminder>, SyncError> {
        let records = self.lock_records()?;
        let mut reminders: Vec<Reminder> = records.reminders.values().cloned().collect();
        reminders.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(reminders)
    }

    async fn add_reminder(&self, reminder: &Reminder) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::insert_new(&mut records.reminders, &reminder.id, reminder)
    }

    async fn update_reminder(&self, reminder_id: &str, reminder: &Reminder) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::replace_existing(&mut records.reminders, reminder_id, reminder)
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::remove_existing(&mut records.reminders, reminder_id)
    }

    async fn list_wellness_logs_for_day(&self, day: Timestamp) -> Result<Vec<WellnessLog>, SyncError> {
        let end = day.saturating_add_nanos(NANOS_PER_DAY);
        let records = self.lock_records()?;
        let mut logs: Vec<WellnessLog> = records
            .wellness_logs
            .values()
            .filter(|log| log.date >= day && log.date < end)
            .cloned()
            .collect();
        logs.sort_by(|left, right| left.date.cmp(&right.date).then_with(|| left.id.cmp(&right.id)));
        Ok(logs)
    }

    async fn add_wellness_log(&self, log: &WellnessLog) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::insert_new(&mut records.wellness_logs, &log.id, log)
    }

    async fn update_wellness_log(&self, log_id: &str, log: &WellnessLog) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::replace_existing(&mut records.wellness_logs, log_id, log)
    }

    async fn delete_wellness_log(&self, log_id: &str) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::remove_existing(&mut records.wellness_logs, log_id)
    }

    async fn list_exercise_logs_in_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ExerciseLog>, SyncError> {
        let records = self.lock_records()?;
        let mut logs: Vec<ExerciseLog> = records
            .exercise_logs
            .values()
            .filter(|log| log.date >= start && log.date <= end)
            .cloned()
            .collect();
        logs.sort_by(|left, right| left.date.cmp(&right.date).then_with(|| left.id.cmp(&right.id)));
        Ok(logs)
    }

    async fn add_exercise_log(&self, log: &ExerciseLog) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::insert_new(&mut records.exercise_logs, &log.id, log)
    }

    async fn update_exercise_log(&self, log_id: &str, log: &ExerciseLog) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::replace_existing(&mut records.exercise_logs, log_id, log)
    }

    async fn delete_exercise_log(&self, log_id: &str) -> Result<(), SyncError> {
        let mut records = self.lock_records()?;
        Self::remove_existing(&mut records.exercise_logs, log_id)
    }
}

use crate::application::query_cache::{EntityKind, QueryCache, QueryKey};
use crate::domain::models::{ExerciseLog, Reminder, UserProfile, WellnessLog};
use crate::domain::time::Timestamp;
use crate::infrastructure::error::SyncError;
use crate::infrastructure::record_store::RecordStore;
use std::sync::Arc;
use tracing::{info, warn};

// Exercise writes also touch wellness reads because dashboard views combine both.
pub fn dependents(written: EntityKind) -> &'static [EntityKind] {
    match written {
        EntityKind::ExerciseLogs => &[EntityKind::ExerciseLogs, EntityKind::WellnessLogs],
        EntityKind::WellnessLogs => &[EntityKind::WellnessLogs],
        EntityKind::Reminders => &[EntityKind::Reminders],
        EntityKind::Profile => &[EntityKind::Profile],
    }
}

pub fn profile_key() -> QueryKey {
    QueryKey::singleton(EntityKind::Profile)
}

pub fn reminders_key() -> QueryKey {
    QueryKey::singleton(EntityKind::Reminders)
}

pub fn wellness_logs_key(day: Timestamp) -> QueryKey {
    QueryKey::new(EntityKind::WellnessLogs, day.to_string())
}

pub fn exercise_logs_key(start: Timestamp, end: Timestamp) -> QueryKey {
    QueryKey::new(EntityKind::ExerciseLogs, format!("{start}:{end}"))
}

pub struct WellnessSync<S>
where
    S: RecordStore + ?Sized + 'static,
{
    store: Arc<S>,
    cache: QueryCache,
}

impl<S> WellnessSync<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, cache: QueryCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn profile(&self) -> Result<Arc<Option<UserProfile>>, SyncError> {
        let store = Arc::clone(&self.store);
        self.cache
            .fetch(profile_key(), move || async move { store.get_profile().await })
            .await
    }

    pub async fn reminders(&self) -> Result<Arc<Vec<Reminder>>, SyncError> {
        let store = Arc::clone(&self.store);
        self.cache
            .fetch(reminders_key(), move || async move { store.list_reminders().await })
            .await
    }

    pub async fn wellness_logs_for_day(&self, day: Timestamp) -> Result<Arc<Vec<WellnessLog>>, SyncError> {
        let store = Arc::clone(&self.store);
        self.cache
            .fetch(wellness_logs_key(day), move || async move {
                store.list_wellness_logs_for_day(day).await
            })
            .await
    }

    pub async fn exercise_logs_in_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Arc<Vec<ExerciseLog>>, SyncError> {
        let store = Arc::clone(&self.store);
        self.cache
            .fetch(exercise_logs_key(start, end), move || async move {
                store.list_exercise_logs_in_range(start, end).await
            })
            .await
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), SyncError> {
        profile.validate().map_err(SyncError::LocalValidation)?;
        let result = self.store.save_profile(profile).await;
        self.finish_write("save_profile", EntityKind::Profile, result)
    }

    pub async fn add_reminder(&self, reminder: &Reminder) -> Result<(), SyncError> {
        reminder.validate().map_err(SyncError::LocalValidation)?;
        let result = self.store.add_reminder(reminder).await;
        self.finish_write("add_reminder", EntityKind::Reminders, result)
    }

    pub async fn update_reminder(&self, reminder_id: &str, reminder: &Reminder) -> Result<(), SyncError> {
        require_id(reminder_id, "reminder_id")?;
        reminder.validate().map_err(SyncError::LocalValidation)?;
        let result = self.store.update_reminder(reminder_id, reminder).await;
        self.finish_write("update_reminder", EntityKind::Reminders, result)
    }

    pub async fn delete_reminder(&self, reminder_id: &str) -> Result<(), SyncError> {
        require_id(reminder_id, "reminder_id")?;
        let result = self.store.delete_reminder(reminder_id).await;
        self.finish_write("delete_reminder", EntityKind::Reminders, result)
    }

    pub async fn add_wellness_log(&self, log: &WellnessLog) -> Result<(), SyncError> {
        log.validate().map_err(SyncError::LocalValidation)?;
        let result = self.store.add_wellness_log(log).await;
        self.finish_write("add_wellness_log", EntityKind::WellnessLogs, result)
    }

    pub async fn update_wellness_log(&self, log_id: &str, log: &WellnessLog) -> Result<(), SyncError> {
        require_id(log_id, "log_id")?;
        log.validate().map_err(SyncError::LocalValidation)?;
        let result = self.store.update_wellness_log(log_id, log).await;
        self.finish_write("update_wellness_log", EntityKind::WellnessLogs, result)
    }

    pub async fn delete_wellness_log(&self, log_id: &str) -> Result<(), SyncError> {
        require_id(log_id, "log_id")?;
        let result = self.store.delete_wellness_log(log_id).await;
        self.finish_write("delete_wellness_log", EntityKind::WellnessLogs, result)
    }

    pub async fn add_exercise_log(&self, log: &ExerciseLog) -> Result<(), SyncError> {
        log.validate().map_err(SyncError::LocalValidation)?;
        let result = self.store.add_exercise_log(log).await;
        self.finish_write("add_exercise_log", EntityKind::ExerciseLogs, result)
    }

    pub async fn update_exercise_log(&self, log_id: &str, log: &ExerciseLog) -> Result<(), SyncError> {
        require_id(log_id, "log_id")?;
        log.validate().map_err(SyncError::LocalValidation)?;
        let result = self.store.update_exercise_log(log_id, log).await;
        self.finish_write("update_exercise_log", EntityKind::ExerciseLogs, result)
    }

    pub async fn delete_exercise_log(&self, log_id: &str) -> Result<(), SyncError> {
        require_id(log_id, "log_id")?;
        let result = self.store.delete_exercise_log(log_id).await;
        self.finish_write("delete_exercise_log", EntityKind::ExerciseLogs, result)
    }

    fn finish_write(
        &self,
        operation: &str,
        written: EntityKind,
        result: Result<(), SyncError>,
    ) -> Result<(), SyncError> {
        match result {
            Ok(()) => {
                let invalidated: usize = dependents(written)
                    .iter()
                    .map(|entity| self.cache.invalidate(*entity))
                    .sum();
                info!(operation, invalidated, "write accepted");
                Ok(())
            }
            Err(error) => {
                warn!(operation, error = %error, "write failed");
                Err(error)
            }
        }
    }
}

fn require_id(value: &str, field_name: &str) -> Result<(), SyncError> {
    if value.trim().is_empty() {
        return Err(SyncError::LocalValidation(format!("{field_name} must not be empty")));
    }
    Ok(())
}

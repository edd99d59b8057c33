use crate::domain::models::{ExerciseLog, Reminder, UserProfile, WellnessLog};
use crate::domain::time::Timestamp;
use crate::infrastructure::error::SyncError;
use crate::infrastructure::record_store::{InMemoryRecordStore, RecordStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryRecordStore,
    pub profile_reads: AtomicUsize,
    pub reminder_reads: AtomicUsize,
    pub wellness_reads: AtomicUsize,
    pub exercise_reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub reject_writes: AtomicBool,
    // While set, list reads take their snapshot and then wait for `release_reads`.
    pub hold_reads: AtomicBool,
    pub release_reads: Notify,
}

impl CountingStore {
    pub fn reads(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn hold(&self) {
        if self.hold_reads.load(Ordering::SeqCst) {
            self.release_reads.notified().await;
        }
    }

    fn check_write(&self) -> Result<(), SyncError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteRejected("store refused write".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn get_profile(&self) -> Result<Option<UserProfile>, SyncError> {
        self.profile_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_profile().await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.save_profile(profile).await
    }

    async fn list_reminders(&self) -> Result<Vec<Reminder>, SyncError> {
        self.reminder_reads.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.inner.list_reminders().await;
        self.hold().await;
        snapshot
    }

    async fn add_reminder(&self, reminder: &Reminder) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.add_reminder(reminder).await
    }

    async fn update_reminder(&self, reminder_id: &str, reminder: &Reminder) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.update_reminder(reminder_id, reminder).await
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.delete_reminder(reminder_id).await
    }

    async fn list_wellness_logs_for_day(&self, day: Timestamp) -> Result<Vec<WellnessLog>, SyncError> {
        self.wellness_reads.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.inner.list_wellness_logs_for_day(day).await;
        self.hold().await;
        snapshot
    }

    async fn add_wellness_log(&self, log: &WellnessLog) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.add_wellness_log(log).await
    }

    async fn update_wellness_log(&self, log_id: &str, log: &WellnessLog) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.update_wellness_log(log_id, log).await
    }

    async fn delete_wellness_log(&self, log_id: &str) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.delete_wellness_log(log_id).await
    }

    async fn list_exercise_logs_in_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ExerciseLog>, SyncError> {
        self.exercise_reads.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.inner.list_exercise_logs_in_range(start, end).await;
        self.hold().await;
        snapshot
    }

    async fn add_exercise_log(&self, log: &ExerciseLog) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.add_exercise_log(log).await
    }

    async fn update_exercise_log(&self, log_id: &str, log: &ExerciseLog) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.update_exercise_log(log_id, log).await
    }

    async fn delete_exercise_log(&self, log_id: &str) -> Result<(), SyncError> {
        self.check_write()?;
        self.inner.delete_exercise_log(log_id).await
    }
}

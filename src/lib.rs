pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::AppState;
pub use application::query_cache::{CacheEvent, CachePolicy, EntityKind, QueryCache, QueryKey, QueryStatus};
pub use application::session::{
    DailyLogs, Dashboard, DueReminderWatcher, Principal, ProfileStatus, Progress, ProgressRange,
    Session, SessionSettings, spawn_due_reminder_watcher,
};
pub use application::wellness_sync::WellnessSync;
pub use domain::metrics::{ExerciseMetrics, IntensityLevel};
pub use domain::models::{
    ExerciseLog, Intensity, Reminder, ReminderCategory, UserProfile, WellnessCategory, WellnessLog,
};
pub use domain::time::{Timestamp, Zone};
pub use infrastructure::config::{SyncConfig, load_sync_config};
pub use infrastructure::error::{InfraError, SyncError};
pub use infrastructure::record_store::{InMemoryRecordStore, RecordStore};

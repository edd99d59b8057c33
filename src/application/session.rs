use crate::application::query_cache::{CacheEvent, EntityKind, QueryCache};
use crate::application::wellness_sync::WellnessSync;
use crate::domain::metrics::{
    DailyMinutes, ExerciseMetrics, calculate_exercise_metrics, daily_exercise_minutes,
    group_wellness_by_category, logs_in_day, recent_logs,
};
use crate::domain::models::{
    ExerciseLog, Reminder, UserProfile, WellnessCategory, WellnessLog,
};
use crate::domain::reminders::{Dismissals, DueWindow, due_reminders};
use crate::domain::time::{
    NowProvider, Timestamp, Zone, ceil_to_minute, day_window, instant_from_calendar_date,
    today_start, trailing_window,
};
use crate::infrastructure::error::SyncError;
use crate::infrastructure::record_store::RecordStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_DISMISSAL_RESET: Duration = Duration::from_secs(60);
pub const DEFAULT_DASHBOARD_DAYS: u32 = 7;
pub const RECENT_WORKOUT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Principal {
    id: String,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() { None } else { Some(Self { id }) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub zone: Zone,
    pub due_window: DueWindow,
    pub dashboard_days: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            zone: Zone::System,
            due_window: DueWindow::default(),
            dashboard_days: DEFAULT_DASHBOARD_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "profile", rename_all = "snake_case")]
pub enum ProfileStatus {
    SetupRequired,
    Ready(UserProfile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressRange {
    Week,
    Month,
}

impl ProgressRange {
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Week),
            30 => Some(Self::Month),
            _ => None,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyLogs {
    pub date: NaiveDate,
    pub exercise_logs: Vec<ExerciseLog>,
    pub wellness_logs: BTreeMap<WellnessCategory, Vec<WellnessLog>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub metrics: ExerciseMetrics,
    pub todays_workouts: Vec<ExerciseLog>,
    pub recent_workouts: Vec<ExerciseLog>,
    pub todays_wellness: BTreeMap<WellnessCategory, Vec<WellnessLog>>,
    pub due_reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub days: u32,
    pub metrics: ExerciseMetrics,
    pub daily_minutes: Vec<DailyMinutes>,
}

pub struct Session<S>
where
    S: RecordStore + ?Sized + 'static,
{
    sync: WellnessSync<S>,
    principal: Mutex<Option<Principal>>,
    dismissals: Mutex<Dismissals>,
    dismissals_changed: Notify,
    settings: SessionSettings,
    now_provider: NowProvider,
}

impl<S> Session<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, cache: QueryCache, settings: SessionSettings) -> Self {
        Self {
            sync: WellnessSync::new(store, cache),
            principal: Mutex::new(None),
            dismissals: Mutex::new(Dismissals::default()),
            dismissals_changed: Notify::new(),
            settings,
            now_provider: Timestamp::system_clock(),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn sync(&self) -> &WellnessSync<S> {
        &self.sync
    }

    pub fn now(&self) -> Timestamp {
        (self.now_provider)()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.lock_principal().ok().and_then(|principal| principal.clone())
    }

    pub fn login(&self, principal: Principal) -> Result<(), SyncError> {
        let previous = self.lock_principal()?.replace(principal.clone());
        match previous {
            Some(previous) if previous == principal => {
                debug!(principal = principal.id(), "principal already signed in");
            }
            Some(previous) => {
                info!(from = previous.id(), to = principal.id(), "principal switched");
                self.clear_session_state()?;
            }
            None => info!(principal = principal.id(), "signed in"),
        }
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SyncError> {
        let previous = self.lock_principal()?.take();
        self.clear_session_state()?;
        if let Some(previous) = previous {
            info!(principal = previous.id(), "signed out");
        }
        Ok(())
    }

    fn clear_session_state(&self) -> Result<(), SyncError> {
        self.sync.cache().flush();
        self.lock_dismissals()?.reset();
        self.dismissals_changed.notify_one();
        Ok(())
    }

    fn lock_principal(&self) -> Result<MutexGuard<'_, Option<Principal>>, SyncError> {
        self.principal
            .lock()
            .map_err(|error| SyncError::Internal(format!("session principal lock poisoned: {error}")))
    }

    fn lock_dismissals(&self) -> Result<MutexGuard<'_, Dismissals>, SyncError> {
        self.dismissals
            .lock()
            .map_err(|error| SyncError::Internal(format!("dismissal lock poisoned: {error}")))
    }

    fn require_principal(&self) -> Result<Principal, SyncError> {
        self.principal()
            .ok_or_else(|| SyncError::Unavailable("not signed in".to_string()))
    }

    // Reads resolve after an await, so the principal may have changed meanwhile.
    fn still_signed_in_as(&self, principal: &Principal) -> bool {
        let current = self.principal();
        if current.as_ref() == Some(principal) {
            return true;
        }
        debug!(principal = principal.id(), "discarding read of a finished session");
        false
    }

    fn scoped_records<T: Clone>(&self, principal: &Principal, records: &[T]) -> Vec<T> {
        if self.still_signed_in_as(principal) {
            records.to_vec()
        } else {
            Vec::new()
        }
    }

    pub async fn profile_status(&self) -> Result<ProfileStatus, SyncError> {
        let principal = self.require_principal()?;
        let profile = self.sync.profile().await?;
        if !self.still_signed_in_as(&principal) {
            return Err(SyncError::Unavailable("session changed during read".to_string()));
        }
        Ok(match profile.as_ref() {
            Some(profile) => ProfileStatus::Ready(profile.clone()),
            None => ProfileStatus::SetupRequired,
        })
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.save_profile(profile).await
    }

    pub async fn reminders(&self) -> Result<Vec<Reminder>, SyncError> {
        let Some(principal) = self.principal() else {
            return Ok(Vec::new());
        };
        let reminders = self.sync.reminders().await?;
        Ok(self.scoped_records(&principal, &reminders))
    }

    pub async fn add_reminder(&self, reminder: &Reminder) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.add_reminder(reminder).await
    }

    pub async fn update_reminder(&self, reminder_id: &str, reminder: &Reminder) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.update_reminder(reminder_id, reminder).await
    }

    pub async fn delete_reminder(&self, reminder_id: &str) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.delete_reminder(reminder_id).await
    }

    pub async fn add_wellness_log(&self, log: &WellnessLog) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.add_wellness_log(log).await
    }

    pub async fn update_wellness_log(&self, log_id: &str, log: &WellnessLog) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.update_wellness_log(log_id, log).await
    }

    pub async fn delete_wellness_log(&self, log_id: &str) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.delete_wellness_log(log_id).await
    }

    pub async fn add_exercise_log(&self, log: &ExerciseLog) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.add_exercise_log(log).await
    }

    pub async fn update_exercise_log(&self, log_id: &str, log: &ExerciseLog) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.update_exercise_log(log_id, log).await
    }

    pub async fn delete_exercise_log(&self, log_id: &str) -> Result<(), SyncError> {
        self.require_principal()?;
        self.sync.delete_exercise_log(log_id).await
    }

    pub async fn wellness_logs_for_day(&self, day: Timestamp) -> Result<Vec<WellnessLog>, SyncError> {
        let Some(principal) = self.principal() else {
            return Ok(Vec::new());
        };
        let logs = self.sync.wellness_logs_for_day(day).await?;
        Ok(self.scoped_records(&principal, &logs))
    }

    pub async fn exercise_logs_in_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ExerciseLog>, SyncError> {
        let Some(principal) = self.principal() else {
            return Ok(Vec::new());
        };
        let logs = self.sync.exercise_logs_in_range(start, end).await?;
        Ok(self.scoped_records(&principal, &logs))
    }

    pub async fn daily_logs(&self, date: NaiveDate) -> Result<DailyLogs, SyncError> {
        let zone = self.settings.zone;
        let day = instant_from_calendar_date(date, &zone);
        let (start, end) = day_window(day, &zone);
        // Range listing is inclusive, so stop one nanosecond short of the next day.
        let exercise_logs = self
            .exercise_logs_in_range(start, end.saturating_sub_nanos(1))
            .await?;
        let wellness_logs = self.wellness_logs_for_day(start).await?;
        Ok(DailyLogs {
            date,
            exercise_logs,
            wellness_logs: group_wellness_by_category(&wellness_logs),
        })
    }

    pub async fn due_reminders(&self) -> Result<Vec<Reminder>, SyncError> {
        let reminders = self.reminders().await?;
        let now = self.now();
        let dismissals = self.lock_dismissals()?;
        Ok(due_reminders(
            &reminders,
            now,
            &self.settings.zone,
            self.settings.due_window,
            &dismissals,
        ))
    }

    pub fn dismiss_reminder(&self, reminder_id: &str) -> Result<(), SyncError> {
        let reminder_id = reminder_id.trim();
        if reminder_id.is_empty() {
            return Err(SyncError::LocalValidation("reminder_id must not be empty".to_string()));
        }
        let today = self.settings.zone.local_date(self.now());
        self.lock_dismissals()?.dismiss(reminder_id, today);
        self.dismissals_changed.notify_one();
        Ok(())
    }

    pub fn reset_dismissals(&self) -> Result<(), SyncError> {
        self.lock_dismissals()?.reset();
        self.dismissals_changed.notify_one();
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<Dashboard, SyncError> {
        let now = self.now();
        let zone = self.settings.zone;
        let (start, end) = trailing_window(self.settings.dashboard_days, ceil_to_minute(now));
        let logs = self.exercise_logs_in_range(start, end).await?;
        let todays_wellness = self.wellness_logs_for_day(today_start(now, &zone)).await?;
        let due = self.due_reminders().await?;

        Ok(Dashboard {
            metrics: calculate_exercise_metrics(&logs, &zone),
            todays_workouts: logs_in_day(&logs, now, &zone).into_iter().cloned().collect(),
            recent_workouts: recent_logs(&logs, RECENT_WORKOUT_LIMIT),
            todays_wellness: group_wellness_by_category(&todays_wellness),
            due_reminders: due,
        })
    }

    pub async fn progress(&self, range: ProgressRange) -> Result<Progress, SyncError> {
        let now = self.now();
        let zone = self.settings.zone;
        let days = range.days();
        let (start, end) = trailing_window(days, ceil_to_minute(now));
        let logs = self.exercise_logs_in_range(start, end).await?;
        Ok(Progress {
            days,
            metrics: calculate_exercise_metrics(&logs, &zone),
            daily_minutes: daily_exercise_minutes(&logs, days, now, &zone),
        })
    }
}

pub struct DueReminderWatcher {
    receiver: watch::Receiver<Vec<Reminder>>,
    handle: JoinHandle<()>,
}

impl DueReminderWatcher {
    pub fn subscribe(&self) -> watch::Receiver<Vec<Reminder>> {
        self.receiver.clone()
    }

    pub fn current(&self) -> Vec<Reminder> {
        self.receiver.borrow().clone()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for DueReminderWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// Each tick also clears the session's dismissals.
pub fn spawn_due_reminder_watcher<S>(session: Arc<Session<S>>, reset_period: Duration) -> DueReminderWatcher
where
    S: RecordStore + ?Sized + 'static,
{
    let (sender, receiver) = watch::channel(Vec::new());
    let handle = tokio::spawn(async move {
        let mut events = session.sync.cache().subscribe();
        let mut ticker = tokio::time::interval(reset_period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;
        publish_due(&session, &sender).await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = session.reset_dismissals() {
                        warn!(error = %error, "failed to reset dismissals");
                    }
                }
                _ = session.dismissals_changed.notified() => {}
                event = events.recv() => match event {
                    Ok(CacheEvent::Updated(key) | CacheEvent::Invalidated(key))
                        if key.entity() == EntityKind::Reminders => {}
                    Ok(CacheEvent::Flushed) => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "due reminder watcher lagged behind cache events");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = sender.closed() => break,
            }
            publish_due(&session, &sender).await;
        }
    });

    DueReminderWatcher { receiver, handle }
}

async fn publish_due<S>(session: &Session<S>, sender: &watch::Sender<Vec<Reminder>>)
where
    S: RecordStore + ?Sized + 'static,
{
    match session.due_reminders().await {
        Ok(due) => {
            sender.send_if_modified(|current| {
                if *current == due {
                    false
                } else {
                    *current = due;
                    true
                }
            });
        }
        Err(error) => warn!(error = %error, "failed to evaluate due reminders"),
    }
}

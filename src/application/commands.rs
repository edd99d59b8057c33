use crate::application::bootstrap::bootstrap_workspace;
use crate::application::query_cache::{CachePolicy, QueryCache};
use crate::application::session::{
    DailyLogs, Dashboard, DueReminderWatcher, Principal, ProfileStatus, Progress, ProgressRange,
    Session, SessionSettings, spawn_due_reminder_watcher,
};
use crate::domain::models::{
    ExerciseLog, Intensity, Reminder, ReminderCategory, UserProfile, WellnessCategory, WellnessLog,
};
use crate::domain::reminders::DueWindow;
use crate::domain::time::{NANOS_PER_MILLI, Timestamp, instant_from_calendar_date, parse_date, parse_hhmm};
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::error::{InfraError, SyncError};
use crate::infrastructure::record_store::{InMemoryRecordStore, RecordStore};
use chrono::{NaiveDate, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub type SharedSession = Arc<Session<dyn RecordStore>>;

fn next_id(state: &AppState, prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let millis = state.session.now().as_nanos().div_euclid(NANOS_PER_MILLI);
    format!("{prefix}-{millis}-{sequence}")
}

pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    config: SyncConfig,
    session: SharedSession,
    watcher: Mutex<Option<DueReminderWatcher>>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        Self::with_store(workspace_root, Arc::new(InMemoryRecordStore::default()))
    }

    pub fn with_store(workspace_root: PathBuf, store: Arc<dyn RecordStore>) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config = bootstrap.config;
        let cache = QueryCache::new(CachePolicy {
            stale_time: config.stale_time,
            fetch_timeout: config.fetch_timeout,
            gc_time: config.gc_time,
        });
        let settings = SessionSettings {
            zone: config.zone,
            due_window: DueWindow::minutes(config.due_window_minutes),
            dashboard_days: config.dashboard_days,
        };
        let session: SharedSession = Arc::new(Session::new(store, cache, settings));

        Ok(Self {
            config_dir: bootstrap.config_dir,
            logs_dir: bootstrap.logs_dir,
            config,
            session,
            watcher: Mutex::new(None),
            log_guard: Mutex::new(()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn due_reminder_updates(&self) -> Option<watch::Receiver<Vec<Reminder>>> {
        let watcher = self.watcher.lock().ok()?;
        watcher.as_ref().map(DueReminderWatcher::subscribe)
    }

    // Every command failure is written to the command log before it is returned.
    fn command_result<T>(&self, command: &str, result: Result<T, InfraError>) -> Result<T, InfraError> {
        if let Err(error) = &result {
            self.log_error(command, &error.to_string());
        }
        result
    }

    fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    fn start_watcher(&self) -> Result<(), InfraError> {
        let mut watcher = self.lock_watcher()?;
        if watcher.is_none() {
            *watcher = Some(spawn_due_reminder_watcher(
                Arc::clone(&self.session),
                self.config.dismissal_reset,
            ));
        }
        Ok(())
    }

    fn stop_watcher(&self) -> Result<(), InfraError> {
        if let Some(watcher) = self.lock_watcher()?.take() {
            watcher.stop();
        }
        Ok(())
    }

    fn lock_watcher(&self) -> Result<MutexGuard<'_, Option<DueReminderWatcher>>, InfraError> {
        self.watcher
            .lock()
            .map_err(|error| InfraError::Sync(SyncError::Internal(format!("watcher lock poisoned: {error}"))))
    }
}

fn invalid_input(message: impl Into<String>) -> InfraError {
    InfraError::Sync(SyncError::LocalValidation(message.into()))
}

fn required_text(value: &str, field_name: &str) -> Result<String, InfraError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid_input(format!("{field_name} must not be empty")));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn parse_date_input(value: &str, field_name: &str) -> Result<NaiveDate, InfraError> {
    parse_date(value).ok_or_else(|| invalid_input(format!("{field_name} must be YYYY-MM-DD: {value}")))
}

fn parse_intensity(value: &str) -> Result<Intensity, InfraError> {
    let intensity = Intensity::parse(value);
    if !intensity.is_known() {
        return Err(invalid_input(format!(
            "intensity must be light, moderate or intense: {value}"
        )));
    }
    Ok(intensity)
}

fn parse_wellness_category(value: &str) -> Result<WellnessCategory, InfraError> {
    let category = WellnessCategory::parse(value);
    if !category.is_known() {
        return Err(invalid_input(format!(
            "category must be meals, hydration, sleep or activities: {value}"
        )));
    }
    Ok(category)
}

fn parse_reminder_category(value: &str) -> Result<ReminderCategory, InfraError> {
    let category = ReminderCategory::parse(value);
    if !category.is_known() {
        return Err(invalid_input(format!(
            "category must be exercise, meals, hydration, sleep or activities: {value}"
        )));
    }
    Ok(category)
}

fn schedule_time_today(state: &AppState, time: &str) -> Result<Timestamp, InfraError> {
    let time = parse_hhmm(time).ok_or_else(|| invalid_input(format!("time must be HH:MM: {time}")))?;
    let zone = state.session.settings().zone;
    let today = zone.local_date(state.session.now());
    Ok(zone.resolve(today.and_time(time)))
}

fn log_day(state: &AppState, date: &str) -> Result<Timestamp, InfraError> {
    let date = parse_date_input(date, "date")?;
    Ok(instant_from_calendar_date(date, &state.session.settings().zone))
}

pub async fn login_impl(state: &AppState, principal_id: String) -> Result<ProfileStatus, InfraError> {
    let result: Result<ProfileStatus, InfraError> = async {
        let principal = Principal::new(principal_id)
            .ok_or_else(|| invalid_input("principal_id must not be empty"))?;
        state.session.login(principal.clone())?;
        state.start_watcher()?;
        let status = state.session.profile_status().await?;
        state.log_info("login", &format!("signed in principal={}", principal.id()));
        Ok(status)
    }
    .await;
    state.command_result("login", result)
}

pub fn logout_impl(state: &AppState) -> Result<(), InfraError> {
    let result: Result<(), InfraError> = (|| {
        state.stop_watcher()?;
        state.session.logout()?;
        state.log_info("logout", "signed out");
        Ok(())
    })();
    state.command_result("logout", result)
}

pub async fn get_profile_status_impl(state: &AppState) -> Result<ProfileStatus, InfraError> {
    let result: Result<ProfileStatus, InfraError> = async {
        Ok(state.session.profile_status().await?)
    }
    .await;
    state.command_result("get_profile_status", result)
}

pub async fn save_profile_impl(
    state: &AppState,
    name: String,
    preferences: Option<String>,
    goals: Option<String>,
) -> Result<UserProfile, InfraError> {
    let result: Result<UserProfile, InfraError> = async {
        let profile = UserProfile {
            name: required_text(&name, "name")?,
            preferences: optional_text(preferences),
            goals: optional_text(goals),
        };
        state.session.save_profile(&profile).await?;
        state.log_info("save_profile", "saved profile");
        Ok(profile)
    }
    .await;
    state.command_result("save_profile", result)
}

pub async fn log_exercise_impl(
    state: &AppState,
    date: String,
    duration_minutes: u64,
    workout_type: String,
    intensity: String,
    notes: Option<String>,
) -> Result<ExerciseLog, InfraError> {
    let result: Result<ExerciseLog, InfraError> = async {
        let log = ExerciseLog {
            id: next_id(state, "exercise"),
            date: log_day(state, &date)?,
            duration_minutes,
            workout_type: required_text(&workout_type, "workout_type")?,
            intensity: parse_intensity(&intensity)?,
            notes: optional_text(notes),
        };
        state.session.add_exercise_log(&log).await?;
        state.log_info("log_exercise", &format!("created exercise_log_id={}", log.id));
        Ok(log)
    }
    .await;
    state.command_result("log_exercise", result)
}

pub async fn update_exercise_log_impl(
    state: &AppState,
    log_id: String,
    date: String,
    duration_minutes: u64,
    workout_type: String,
    intensity: String,
    notes: Option<String>,
) -> Result<ExerciseLog, InfraError> {
    let result: Result<ExerciseLog, InfraError> = async {
        let log_id = required_text(&log_id, "log_id")?;
        let log = ExerciseLog {
            id: log_id.clone(),
            date: log_day(state, &date)?,
            duration_minutes,
            workout_type: required_text(&workout_type, "workout_type")?,
            intensity: parse_intensity(&intensity)?,
            notes: optional_text(notes),
        };
        state.session.update_exercise_log(&log_id, &log).await?;
        state.log_info("update_exercise_log", &format!("updated exercise_log_id={log_id}"));
        Ok(log)
    }
    .await;
    state.command_result("update_exercise_log", result)
}

pub async fn delete_exercise_log_impl(state: &AppState, log_id: String) -> Result<(), InfraError> {
    let result: Result<(), InfraError> = async {
        let log_id = required_text(&log_id, "log_id")?;
        state.session.delete_exercise_log(&log_id).await?;
        state.log_info("delete_exercise_log", &format!("deleted exercise_log_id={log_id}"));
        Ok(())
    }
    .await;
    state.command_result("delete_exercise_log", result)
}

pub async fn log_wellness_impl(
    state: &AppState,
    date: String,
    category: String,
    details: String,
) -> Result<WellnessLog, InfraError> {
    let result: Result<WellnessLog, InfraError> = async {
        let log = WellnessLog {
            id: next_id(state, "wellness"),
            date: log_day(state, &date)?,
            category: parse_wellness_category(&category)?,
            details: required_text(&details, "details")?,
        };
        state.session.add_wellness_log(&log).await?;
        state.log_info("log_wellness", &format!("created wellness_log_id={}", log.id));
        Ok(log)
    }
    .await;
    state.command_result("log_wellness", result)
}

pub async fn update_wellness_log_impl(
    state: &AppState,
    log_id: String,
    date: String,
    category: String,
    details: String,
) -> Result<WellnessLog, InfraError> {
    let result: Result<WellnessLog, InfraError> = async {
        let log_id = required_text(&log_id, "log_id")?;
        let log = WellnessLog {
            id: log_id.clone(),
            date: log_day(state, &date)?,
            category: parse_wellness_category(&category)?,
            details: required_text(&details, "details")?,
        };
        state.session.update_wellness_log(&log_id, &log).await?;
        state.log_info("update_wellness_log", &format!("updated wellness_log_id={log_id}"));
        Ok(log)
    }
    .await;
    state.command_result("update_wellness_log", result)
}

pub async fn delete_wellness_log_impl(state: &AppState, log_id: String) -> Result<(), InfraError> {
    let result: Result<(), InfraError> = async {
        let log_id = required_text(&log_id, "log_id")?;
        state.session.delete_wellness_log(&log_id).await?;
        state.log_info("delete_wellness_log", &format!("deleted wellness_log_id={log_id}"));
        Ok(())
    }
    .await;
    state.command_result("delete_wellness_log", result)
}

pub async fn list_daily_logs_impl(state: &AppState, date: Option<String>) -> Result<DailyLogs, InfraError> {
    let result: Result<DailyLogs, InfraError> = async {
        let date = match date.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => parse_date_input(value, "date")?,
            None => state.session.settings().zone.local_date(state.session.now()),
        };
        Ok(state.session.daily_logs(date).await?)
    }
    .await;
    state.command_result("list_daily_logs", result)
}

pub async fn create_reminder_impl(
    state: &AppState,
    title: String,
    category: String,
    time: String,
    is_active: Option<bool>,
) -> Result<Reminder, InfraError> {
    let result: Result<Reminder, InfraError> = async {
        let reminder = Reminder {
            id: next_id(state, "reminder"),
            title: required_text(&title, "title")?,
            category: parse_reminder_category(&category)?,
            schedule_time: schedule_time_today(state, &time)?,
            is_active: is_active.unwrap_or(true),
        };
        state.session.add_reminder(&reminder).await?;
        state.log_info("create_reminder", &format!("created reminder_id={}", reminder.id));
        Ok(reminder)
    }
    .await;
    state.command_result("create_reminder", result)
}

pub async fn update_reminder_impl(
    state: &AppState,
    reminder_id: String,
    title: String,
    category: String,
    time: String,
    is_active: bool,
) -> Result<Reminder, InfraError> {
    let result: Result<Reminder, InfraError> = async {
        let reminder_id = required_text(&reminder_id, "reminder_id")?;
        let reminder = Reminder {
            id: reminder_id.clone(),
            title: required_text(&title, "title")?,
            category: parse_reminder_category(&category)?,
            schedule_time: schedule_time_today(state, &time)?,
            is_active,
        };
        state.session.update_reminder(&reminder_id, &reminder).await?;
        state.log_info("update_reminder", &format!("updated reminder_id={reminder_id}"));
        Ok(reminder)
    }
    .await;
    state.command_result("update_reminder", result)
}

pub async fn delete_reminder_impl(state: &AppState, reminder_id: String) -> Result<(), InfraError> {
    let result: Result<(), InfraError> = async {
        let reminder_id = required_text(&reminder_id, "reminder_id")?;
        state.session.delete_reminder(&reminder_id).await?;
        state.log_info("delete_reminder", &format!("deleted reminder_id={reminder_id}"));
        Ok(())
    }
    .await;
    state.command_result("delete_reminder", result)
}

pub async fn toggle_reminder_impl(state: &AppState, reminder_id: String) -> Result<Reminder, InfraError> {
    let result: Result<Reminder, InfraError> = async {
        let reminder_id = required_text(&reminder_id, "reminder_id")?;
        let reminders = state.session.reminders().await?;
        let Some(mut reminder) = reminders.into_iter().find(|candidate| candidate.id == reminder_id) else {
            return Err(invalid_input(format!("reminder not found: {reminder_id}")));
        };
        reminder.is_active = !reminder.is_active;
        state.session.update_reminder(&reminder_id, &reminder).await?;
        state.log_info(
            "toggle_reminder",
            &format!("reminder_id={reminder_id} is_active={}", reminder.is_active),
        );
        Ok(reminder)
    }
    .await;
    state.command_result("toggle_reminder", result)
}

pub async fn list_reminders_impl(state: &AppState) -> Result<Vec<Reminder>, InfraError> {
    let result: Result<Vec<Reminder>, InfraError> = async {
        Ok(state.session.reminders().await?)
    }
    .await;
    state.command_result("list_reminders", result)
}

pub async fn due_reminders_impl(state: &AppState) -> Result<Vec<Reminder>, InfraError> {
    let result: Result<Vec<Reminder>, InfraError> = async {
        Ok(state.session.due_reminders().await?)
    }
    .await;
    state.command_result("due_reminders", result)
}

pub async fn dismiss_reminder_impl(state: &AppState, reminder_id: String) -> Result<Vec<Reminder>, InfraError> {
    let result: Result<Vec<Reminder>, InfraError> = async {
        let reminder_id = required_text(&reminder_id, "reminder_id")?;
        state.session.dismiss_reminder(&reminder_id)?;
        state.log_info("dismiss_reminder", &format!("dismissed reminder_id={reminder_id}"));
        Ok(state.session.due_reminders().await?)
    }
    .await;
    state.command_result("dismiss_reminder", result)
}

pub async fn get_dashboard_impl(state: &AppState) -> Result<Dashboard, InfraError> {
    let result: Result<Dashboard, InfraError> = async {
        Ok(state.session.dashboard().await?)
    }
    .await;
    state.command_result("get_dashboard", result)
}

pub async fn get_progress_impl(state: &AppState, days: u32) -> Result<Progress, InfraError> {
    let result: Result<Progress, InfraError> = async {
        let range = ProgressRange::from_days(days)
            .ok_or_else(|| invalid_input(format!("days must be 7 or 30: {days}")))?;
        Ok(state.session.progress(range).await?)
    }
    .await;
    state.command_result("get_progress", result)
}

use crate::domain::models::Reminder;
use crate::domain::time::{NANOS_PER_MINUTE, Timestamp, Zone, time_of_day_on};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const DEFAULT_DUE_WINDOW_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    minutes: u32,
}

impl DueWindow {
    pub const fn minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    fn as_nanos(self) -> i64 {
        i64::from(self.minutes).saturating_mul(NANOS_PER_MINUTE)
    }
}

impl Default for DueWindow {
    fn default() -> Self {
        Self::minutes(DEFAULT_DUE_WINDOW_MINUTES)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dismissals {
    dismissed: HashMap<String, NaiveDate>,
}

impl Dismissals {
    pub fn dismiss(&mut self, reminder_id: &str, today: NaiveDate) {
        self.dismissed.insert(reminder_id.to_string(), today);
    }

    // A dismissal only counts on the local day it was made.
    pub fn is_dismissed(&self, reminder_id: &str, today: NaiveDate) -> bool {
        self.dismissed
            .get(reminder_id)
            .is_some_and(|dismissed_on| *dismissed_on == today)
    }

    pub fn reset(&mut self) {
        self.dismissed.clear();
    }

    pub fn len(&self) -> usize {
        self.dismissed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dismissed.is_empty()
    }
}

pub fn is_due(reminder: &Reminder, now: Timestamp, zone: &Zone, window: DueWindow) -> bool {
    if !reminder.is_active {
        return false;
    }
    let today = zone.local_date(now);
    let scheduled = time_of_day_on(reminder.schedule_time, today, zone);
    let elapsed = now.nanos_since(scheduled);
    (0..=window.as_nanos()).contains(&elapsed)
}

pub fn due_reminders(
    reminders: &[Reminder],
    now: Timestamp,
    zone: &Zone,
    window: DueWindow,
    dismissals: &Dismissals,
) -> Vec<Reminder> {
    let today = zone.local_date(now);
    reminders
        .iter()
        .filter(|reminder| is_due(reminder, now, zone, window))
        .filter(|reminder| !dismissals.is_dismissed(&reminder.id, today))
        .cloned()
        .collect()
}

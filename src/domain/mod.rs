pub mod metrics;
pub mod models;
pub mod reminders;
pub mod time;

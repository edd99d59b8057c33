use crate::domain::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

// Workout intensity. Values the store returns that this client does not know
// are kept verbatim in `Other` so that reads never fail on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intensity {
    Light,
    Moderate,
    Intense,
    Other(String),
}

impl Intensity {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Self::Light,
            "moderate" => Self::Moderate,
            "intense" => Self::Intense,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Intense => "intense",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Intensity {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Intensity> for String {
    fn from(value: Intensity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WellnessCategory {
    Meals,
    Hydration,
    Sleep,
    Activities,
    Other(String),
}

impl WellnessCategory {
    pub const ALL: [WellnessCategory; 4] = [
        WellnessCategory::Meals,
        WellnessCategory::Hydration,
        WellnessCategory::Sleep,
        WellnessCategory::Activities,
    ];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "meals" => Self::Meals,
            "hydration" => Self::Hydration,
            "sleep" => Self::Sleep,
            "activities" => Self::Activities,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Meals => "meals",
            Self::Hydration => "hydration",
            Self::Sleep => "sleep",
            Self::Activities => "activities",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for WellnessCategory {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<WellnessCategory> for String {
    fn from(value: WellnessCategory) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReminderCategory {
    Exercise,
    Wellness(WellnessCategory),
}

impl ReminderCategory {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("exercise") {
            return Self::Exercise;
        }
        Self::Wellness(WellnessCategory::parse(value))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exercise => "exercise",
            Self::Wellness(category) => category.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        match self {
            Self::Exercise => true,
            Self::Wellness(category) => category.is_known(),
        }
    }
}

impl From<String> for ReminderCategory {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ReminderCategory> for String {
    fn from(value: ReminderCategory) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub preferences: String,
    pub goals: String,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "profile.name")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub id: String,
    pub date: Timestamp,
    pub duration_minutes: u64,
    pub workout_type: String,
    pub intensity: Intensity,
    pub notes: String,
}

impl ExerciseLog {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "exercise.id")?;
        validate_non_empty(&self.workout_type, "exercise.workout_type")?;
        if self.duration_minutes == 0 {
            return Err("exercise.duration_minutes must be > 0".to_string());
        }
        if !self.intensity.is_known() {
            return Err(format!(
                "exercise.intensity must be light, moderate or intense (got '{}')",
                self.intensity
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WellnessLog {
    pub id: String,
    pub date: Timestamp,
    pub category: WellnessCategory,
    pub details: String,
}

impl WellnessLog {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "wellness.id")?;
        validate_non_empty(&self.details, "wellness.details")?;
        if !self.category.is_known() {
            return Err(format!(
                "wellness.category must be meals, hydration, sleep or activities (got '{}')",
                self.category.as_str()
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub category: ReminderCategory,
    pub schedule_time: Timestamp,
    pub is_active: bool,
}

impl Reminder {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "reminder.id")?;
        validate_non_empty(&self.title, "reminder.title")?;
        if !self.category.is_known() {
            return Err(format!(
                "reminder.category is not supported: '{}'",
                self.category.as_str()
            ));
        }
        Ok(())
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

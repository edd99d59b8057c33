use crate::domain::models::{ExerciseLog, Intensity, WellnessCategory, WellnessLog};
use crate::domain::time::{Timestamp, Zone, day_window};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    None,
    Light,
    Moderate,
    Intense,
}

impl IntensityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Intense => "intense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExerciseMetrics {
    pub total_minutes: u64,
    pub workout_count: usize,
    pub active_days: usize,
    pub avg_intensity: IntensityLevel,
}

impl ExerciseMetrics {
    pub const EMPTY: ExerciseMetrics = ExerciseMetrics {
        total_minutes: 0,
        workout_count: 0,
        active_days: 0,
        avg_intensity: IntensityLevel::None,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyMinutes {
    pub date: NaiveDate,
    pub minutes: u64,
}

// Unrecognized intensities weigh the same as moderate.
fn intensity_weight(intensity: &Intensity) -> u64 {
    match intensity {
        Intensity::Light => 1,
        Intensity::Moderate => 2,
        Intensity::Intense => 3,
        Intensity::Other(_) => 2,
    }
}

// mean < 1.5 => light, mean > 2.5 => intense; compared as 2*sum vs 3n / 5n.
fn classify_intensity(weight_sum: u64, count: u64) -> IntensityLevel {
    if count == 0 {
        return IntensityLevel::None;
    }
    let doubled = weight_sum.saturating_mul(2);
    if doubled < count.saturating_mul(3) {
        IntensityLevel::Light
    } else if doubled > count.saturating_mul(5) {
        IntensityLevel::Intense
    } else {
        IntensityLevel::Moderate
    }
}

pub fn calculate_exercise_metrics(logs: &[ExerciseLog], zone: &Zone) -> ExerciseMetrics {
    if logs.is_empty() {
        return ExerciseMetrics::EMPTY;
    }

    let total_minutes = logs
        .iter()
        .fold(0u64, |sum, log| sum.saturating_add(log.duration_minutes));
    let active_days = logs
        .iter()
        .map(|log| zone.local_date(log.date))
        .collect::<HashSet<_>>()
        .len();
    let weight_sum = logs
        .iter()
        .map(|log| intensity_weight(&log.intensity))
        .sum::<u64>();

    ExerciseMetrics {
        total_minutes,
        workout_count: logs.len(),
        active_days,
        avg_intensity: classify_intensity(weight_sum, logs.len() as u64),
    }
}

pub fn logs_in_day<'a>(logs: &'a [ExerciseLog], day: Timestamp, zone: &Zone) -> Vec<&'a ExerciseLog> {
    let (start, end) = day_window(day, zone);
    logs.iter()
        .filter(|log| log.date >= start && log.date < end)
        .collect()
}

pub fn daily_exercise_minutes(
    logs: &[ExerciseLog],
    days: u32,
    now: Timestamp,
    zone: &Zone,
) -> Vec<DailyMinutes> {
    let today = zone.local_date(now);
    let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for offset in (0..days).rev() {
        if let Some(date) = today.checked_sub_days(Days::new(u64::from(offset))) {
            totals.insert(date, 0);
        }
    }

    for log in logs {
        if let Some(minutes) = totals.get_mut(&zone.local_date(log.date)) {
            *minutes = minutes.saturating_add(log.duration_minutes);
        }
    }

    totals
        .into_iter()
        .map(|(date, minutes)| DailyMinutes { date, minutes })
        .collect()
}

pub fn recent_logs(logs: &[ExerciseLog], limit: usize) -> Vec<ExerciseLog> {
    let mut sorted = logs.to_vec();
    sorted.sort_by(|left, right| right.date.cmp(&left.date).then_with(|| left.id.cmp(&right.id)));
    sorted.truncate(limit);
    sorted
}

pub fn group_wellness_by_category(
    logs: &[WellnessLog],
) -> BTreeMap<WellnessCategory, Vec<WellnessLog>> {
    let mut grouped: BTreeMap<WellnessCategory, Vec<WellnessLog>> = BTreeMap::new();
    for log in logs {
        grouped.entry(log.category.clone()).or_default().push(log.clone());
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time::{NANOS_PER_MINUTE, instant_from_calendar_date, parse_date};
    use proptest::prelude::*;

    fn zone() -> Zone {
        Zone::Named(chrono_tz::Europe::Berlin)
    }

    fn midnight(date: &str) -> Timestamp {
        instant_from_calendar_date(parse_date(date).expect("valid date"), &zone())
    }

    fn log(id: &str, date: Timestamp, minutes: u64, intensity: &str) -> ExerciseLog {
        ExerciseLog {
            id: id.to_string(),
            date,
            duration_minutes: minutes,
            workout_type: "Cycling".to_string(),
            intensity: Intensity::parse(intensity),
            notes: String::new(),
        }
    }

    fn with_intensities(intensities: &[&str]) -> Vec<ExerciseLog> {
        let day = midnight("2026-02-16");
        intensities
            .iter()
            .enumerate()
            .map(|(index, intensity)| log(&format!("e-{index}"), day, 10, intensity))
            .collect()
    }

    #[test]
    fn empty_input_yields_zeroed_metrics() {
        let metrics = calculate_exercise_metrics(&[], &zone());
        assert_eq!(metrics, ExerciseMetrics::EMPTY);
        assert_eq!(metrics.avg_intensity.as_str(), "none");
    }

    #[test]
    fn light_light_intense_averages_to_moderate() {
        let metrics = calculate_exercise_metrics(&with_intensities(&["light", "light", "intense"]), &zone());
        assert_eq!(metrics.avg_intensity, IntensityLevel::Moderate);
        assert_eq!(metrics.workout_count, 3);
        assert_eq!(metrics.total_minutes, 30);
    }

    #[test]
    fn thresholds_are_inclusive_toward_moderate() {
        // mean exactly 1.5
        let low = calculate_exercise_metrics(&with_intensities(&["light", "moderate"]), &zone());
        assert_eq!(low.avg_intensity, IntensityLevel::Moderate);
        // mean exactly 2.5
        let high = calculate_exercise_metrics(&with_intensities(&["moderate", "intense"]), &zone());
        assert_eq!(high.avg_intensity, IntensityLevel::Moderate);

        let light = calculate_exercise_metrics(&with_intensities(&["light", "light", "moderate"]), &zone());
        assert_eq!(light.avg_intensity, IntensityLevel::Light);
        let intense = calculate_exercise_metrics(&with_intensities(&["intense", "intense", "moderate"]), &zone());
        assert_eq!(intense.avg_intensity, IntensityLevel::Intense);
    }

    #[test]
    fn unknown_intensity_counts_as_moderate() {
        let metrics = calculate_exercise_metrics(&with_intensities(&["hyper", "hyper"]), &zone());
        assert_eq!(metrics.avg_intensity, IntensityLevel::Moderate);
    }

    #[test]
    fn active_days_counts_distinct_local_dates() {
        let day = midnight("2026-02-16");
        let same_day = vec![
            log("a", day.saturating_add_nanos(8 * 60 * NANOS_PER_MINUTE), 20, "light"),
            log("b", day.saturating_add_nanos(20 * 60 * NANOS_PER_MINUTE), 20, "light"),
        ];
        assert_eq!(calculate_exercise_metrics(&same_day, &zone()).active_days, 1);

        let straddling = vec![
            log("a", day.saturating_sub_nanos(NANOS_PER_MINUTE), 20, "light"),
            log("b", day.saturating_add_nanos(NANOS_PER_MINUTE), 20, "light"),
        ];
        assert_eq!(calculate_exercise_metrics(&straddling, &zone()).active_days, 2);
    }

    #[test]
    fn logs_in_day_filters_half_open_window() {
        let day = midnight("2026-02-16");
        let next = midnight("2026-02-17");
        let logs = vec![
            log("start", day, 10, "light"),
            log("late", next.saturating_sub_nanos(1), 10, "light"),
            log("next", next, 10, "light"),
        ];
        let ids: Vec<_> = logs_in_day(&logs, day, &zone()).into_iter().map(|log| log.id.as_str()).collect();
        assert_eq!(ids, vec!["start", "late"]);
    }

    #[test]
    fn daily_minutes_buckets_each_day_oldest_first() {
        let now = midnight("2026-02-16").saturating_add_nanos(12 * 60 * NANOS_PER_MINUTE);
        let logs = vec![
            log("today", midnight("2026-02-16"), 30, "light"),
            log("today-2", midnight("2026-02-16").saturating_add_nanos(NANOS_PER_MINUTE), 15, "light"),
            log("two-days-ago", midnight("2026-02-14"), 20, "light"),
            log("too-old", midnight("2026-02-01"), 99, "light"),
        ];
        let buckets = daily_exercise_minutes(&logs, 3, now, &zone());
        let minutes: Vec<u64> = buckets.iter().map(|bucket| bucket.minutes).collect();
        assert_eq!(minutes, vec![20, 0, 45]);
        assert_eq!(buckets[2].date, parse_date("2026-02-16").expect("date"));
    }

    #[test]
    fn recent_logs_are_newest_first_and_truncated() {
        let day = midnight("2026-02-16");
        let logs = vec![
            log("old", day, 10, "light"),
            log("new", day.saturating_add_nanos(NANOS_PER_MINUTE), 10, "light"),
            log("mid", day.saturating_add_nanos(1), 10, "light"),
        ];
        let ids: Vec<_> = recent_logs(&logs, 2).into_iter().map(|log| log.id).collect();
        assert_eq!(ids, vec!["new".to_string(), "mid".to_string()]);
    }

    #[test]
    fn wellness_logs_group_by_category() {
        let day = midnight("2026-02-16");
        let entry = |id: &str, category: WellnessCategory| WellnessLog {
            id: id.to_string(),
            date: day,
            category,
            details: "noted".to_string(),
        };
        let grouped = group_wellness_by_category(&[
            entry("w1", WellnessCategory::Sleep),
            entry("w2", WellnessCategory::Meals),
            entry("w3", WellnessCategory::Sleep),
        ]);
        assert_eq!(grouped[&WellnessCategory::Sleep].len(), 2);
        assert_eq!(grouped[&WellnessCategory::Meals].len(), 1);
        assert!(!grouped.contains_key(&WellnessCategory::Hydration));
    }

    fn intensity_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("light"), Just("moderate"), Just("intense"), Just("unknown")]
    }

    proptest! {
        #[test]
        fn metrics_are_order_independent_and_sum_exactly(
            entries in prop::collection::vec((0u64..600, 0i64..(30 * 24 * 60), intensity_strategy()), 1..40)
        ) {
            let base = midnight("2026-01-01");
            let logs: Vec<ExerciseLog> = entries
                .iter()
                .enumerate()
                .map(|(index, (minutes, offset, intensity))| {
                    log(&format!("e-{index}"), base.saturating_add_nanos(offset * NANOS_PER_MINUTE), *minutes, intensity)
                })
                .collect();
            let mut reversed = logs.clone();
            reversed.reverse();

            let forward = calculate_exercise_metrics(&logs, &zone());
            let backward = calculate_exercise_metrics(&reversed, &zone());

            prop_assert_eq!(forward, backward);
            prop_assert_eq!(forward.total_minutes, entries.iter().map(|entry| entry.0).sum::<u64>());
            prop_assert_eq!(forward.workout_count, entries.len());
            prop_assert!(forward.active_days >= 1 && forward.active_days <= entries.len());
        }
    }
}

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub type NowProvider = Arc<dyn Fn() -> Timestamp + Send + Sync>;

pub const NANOS_PER_MILLI: i64 = 1_000_000;
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
pub const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    pub fn system_clock() -> NowProvider {
        Arc::new(Self::now)
    }

    pub fn from_datetime<T: TimeZone>(value: &DateTime<T>) -> Self {
        let utc = value.with_timezone(&Utc);
        match utc.timestamp_nanos_opt() {
            Some(nanos) => Self(nanos),
            None if utc.timestamp() < 0 => Self(i64::MIN),
            None => Self(i64::MAX),
        }
    }

    pub fn to_utc(self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.0)
    }

    pub fn saturating_add_nanos(self, nanos: i64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    pub fn saturating_sub_nanos(self, nanos: i64) -> Self {
        Self(self.0.saturating_sub(nanos))
    }

    pub fn nanos_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Zone {
    #[default]
    System,
    Named(Tz),
}

impl Zone {
    pub fn parse(name: &str) -> Option<Self> {
        name.trim().parse::<Tz>().ok().map(Self::Named)
    }

    pub fn local_datetime(&self, timestamp: Timestamp) -> NaiveDateTime {
        let utc = timestamp.to_utc();
        match self {
            Self::System => utc.with_timezone(&Local).naive_local(),
            Self::Named(tz) => utc.with_timezone(tz).naive_local(),
        }
    }

    pub fn local_date(&self, timestamp: Timestamp) -> NaiveDate {
        self.local_datetime(timestamp).date()
    }

    pub fn resolve(&self, local: NaiveDateTime) -> Timestamp {
        let utc = match self {
            Self::System => resolve_local(&Local, local),
            Self::Named(tz) => resolve_local(tz, local),
        };
        Timestamp::from_datetime(&utc)
    }

    pub fn midnight(&self, date: NaiveDate) -> Timestamp {
        self.resolve(date.and_time(NaiveTime::MIN))
    }
}

// Ambiguous local times take the earlier instant; local times inside a DST gap
// move forward to the first valid quarter hour.
fn resolve_local<T: TimeZone>(tz: &T, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(value) => value.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let mut probe = local;
            for _ in 0..12 {
                probe = probe + Duration::minutes(15);
                if let Some(value) = tz.from_local_datetime(&probe).earliest() {
                    return value.with_timezone(&Utc);
                }
            }
            tz.from_utc_datetime(&local).with_timezone(&Utc)
        }
    }
}

pub fn instant_from_calendar_date(date: NaiveDate, zone: &Zone) -> Timestamp {
    zone.midnight(date)
}

pub fn calendar_date_from_instant(timestamp: Timestamp, zone: &Zone) -> NaiveDateTime {
    let truncated = Timestamp::from_nanos(
        timestamp
            .as_nanos()
            .div_euclid(NANOS_PER_MILLI)
            .saturating_mul(NANOS_PER_MILLI),
    );
    zone.local_datetime(truncated)
}

pub fn day_window(timestamp: Timestamp, zone: &Zone) -> (Timestamp, Timestamp) {
    let start = zone.midnight(zone.local_date(timestamp));
    (start, start.saturating_add_nanos(NANOS_PER_DAY))
}

pub fn trailing_window(days: u32, now: Timestamp) -> (Timestamp, Timestamp) {
    let span = i64::from(days).saturating_mul(NANOS_PER_DAY);
    (now.saturating_sub_nanos(span), now)
}

// Rounds up to the next whole minute so that repeated rolling-window reads
// within one minute produce the same range.
pub fn ceil_to_minute(timestamp: Timestamp) -> Timestamp {
    let nanos = timestamp.as_nanos();
    let remainder = nanos.rem_euclid(NANOS_PER_MINUTE);
    if remainder == 0 {
        timestamp
    } else {
        timestamp.saturating_add_nanos(NANOS_PER_MINUTE - remainder)
    }
}

pub fn today_start(now: Timestamp, zone: &Zone) -> Timestamp {
    day_window(now, zone).0
}

pub fn time_of_day_on(timestamp: Timestamp, date: NaiveDate, zone: &Zone) -> Timestamp {
    let local = zone.local_datetime(timestamp);
    let time = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(NaiveTime::MIN);
    zone.resolve(date.and_time(time))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

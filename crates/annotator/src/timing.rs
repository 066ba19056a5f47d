//! ISO-8601 timestamps and response-time deltas.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};
use std::fmt::{self, Display};

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// A parsed creation time. Offset-aware and naive stamps cannot be compared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl Timestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Timestamp::Aware(dt));
        }
        if let Some(dt) = AWARE_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        {
            return Some(Timestamp::Aware(dt));
        }
        if let Some(dt) = NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        {
            return Some(Timestamp::Naive(dt));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Timestamp::Naive)
    }

    /// `self - earlier`, or `None` when the two are not comparable.
    pub fn since(&self, earlier: &Timestamp) -> Option<TimeDelta> {
        match (self, earlier) {
            (Timestamp::Aware(a), Timestamp::Aware(b)) => Some(a.signed_duration_since(*b)),
            (Timestamp::Naive(a), Timestamp::Naive(b)) => Some(a.signed_duration_since(*b)),
            _ => None,
        }
    }
}

/// Elapsed time between a message and the one before it.
///
/// Renders as `[D day[s], ]H:MM:SS[.ffffff]` with days floor-normalized, so
/// a five-minute backwards step reads `-1 day, 23:55:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResponseTime(TimeDelta);

impl ResponseTime {
    pub fn new(delta: TimeDelta) -> Self {
        Self(delta)
    }

    pub fn between(previous: &str, current: &str) -> Option<Self> {
        let previous = Timestamp::parse(previous)?;
        let current = Timestamp::parse(current)?;
        current.since(&previous).map(Self)
    }

    pub fn delta(&self) -> TimeDelta {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < TimeDelta::zero()
    }

    pub fn exceeds_hours(&self, hours: u64) -> bool {
        let limit = i64::try_from(hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .unwrap_or(TimeDelta::MAX);
        self.0 > limit
    }
}

impl Display for ResponseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self
            .0
            .num_microseconds()
            .unwrap_or_else(|| self.0.num_seconds().saturating_mul(1_000_000));
        let days = total.div_euclid(MICROS_PER_DAY);
        let remainder = total.rem_euclid(MICROS_PER_DAY);
        let seconds = remainder / 1_000_000;
        let micros = remainder % 1_000_000;

        if days != 0 {
            let plural = if days.abs() == 1 { "" } else { "s" };
            write!(f, "{} day{}, ", days, plural)?;
        }
        write!(
            f,
            "{}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )?;
        if micros != 0 {
            write!(f, ".{:06}", micros)?;
        }
        Ok(())
    }
}

impl Serialize for ResponseTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

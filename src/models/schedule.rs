use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A schedule timestamp as a client sent it, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTime {
    Zoned(DateTime<FixedOffset>),
    /// No offset given; treated as already being UTC.
    Unzoned(NaiveDateTime),
}

impl ScheduleTime {
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            ScheduleTime::Zoned(value) => value.with_timezone(&Utc),
            ScheduleTime::Unzoned(value) => value.and_utc(),
        }
    }
}

impl From<DateTime<Utc>> for ScheduleTime {
    fn from(value: DateTime<Utc>) -> Self {
        ScheduleTime::Zoned(value.fixed_offset())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid timestamp")]
pub struct InvalidTimestamp(String);

impl FromStr for ScheduleTime {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = DateTime::parse_from_rfc3339(s) {
            return Ok(ScheduleTime::Zoned(value));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
            .map(ScheduleTime::Unzoned)
            .ok_or_else(|| InvalidTimestamp(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ScheduleTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Start and end must both be provided.")]
    Incomplete,
    #[error("End must be on or after start.")]
    EndBeforeStart,
}

/// A validated start/end pair, both in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schedule {
    pub start_at_utc: Option<DateTime<Utc>>,
    pub end_at_utc: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn parse(
        start: Option<ScheduleTime>,
        end: Option<ScheduleTime>,
    ) -> Result<Self, ScheduleError> {
        let (start_at_utc, end_at_utc) = normalize(start, end);
        validate(start_at_utc, end_at_utc)?;
        Ok(Self {
            start_at_utc,
            end_at_utc,
        })
    }
}

pub fn normalize(
    start: Option<ScheduleTime>,
    end: Option<ScheduleTime>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    (start.map(ScheduleTime::to_utc), end.map(ScheduleTime::to_utc))
}

pub fn validate(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ScheduleError> {
    match (start, end) {
        (None, None) => Ok(()),
        (Some(start), Some(end)) if end < start => Err(ScheduleError::EndBeforeStart),
        (Some(_), Some(_)) => Ok(()),
        _ => Err(ScheduleError::Incomplete),
    }
}

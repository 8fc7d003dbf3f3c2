use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Milliseconds since the Unix epoch, UTC.
///
/// Every timestamp that crosses the system boundary (remote event records,
/// configuration, database rows) is normalized to this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EpochMillis(i64);

impl EpochMillis {
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    pub fn saturating_sub_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_sub(millis))
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// RFC 3339 with millisecond precision and a `Z` suffix.
    pub fn to_rfc3339(self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.0.to_string(),
        }
    }
}

impl From<i64> for EpochMillis {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts either a decimal epoch-millisecond count or an RFC 3339 timestamp.
impl FromStr for EpochMillis {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(millis) = trimmed.parse::<i64>() {
            return Ok(Self(millis));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .map_err(|e| format!("invalid timestamp {trimmed:?}: {e}"))
    }
}

impl<'de> Deserialize<'de> for EpochMillis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Millis(millis) => Ok(Self(millis)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Explicit `[start, end]` fetch range used for bounded backfills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventsRange {
    pub start: EpochMillis,
    pub end: EpochMillis,
}

impl EventsRange {
    pub fn new(start: EpochMillis, end: EpochMillis) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "range start ({start}) must be before range end ({end})"
            ));
        }
        Ok(Self { start, end })
    }
}

/// What the pipeline does with an event whose mutation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record a checkpoint for the failed event, then stop the page. The
    /// event is never retried automatically.
    #[default]
    CheckpointAndHalt,
    /// Stop the page without recording the failed event, so the next cycle
    /// fetches it again.
    HaltWithoutCheckpoint,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckpointAndHalt => "checkpoint_and_halt",
            Self::HaltWithoutCheckpoint => "halt_without_checkpoint",
        }
    }

    pub fn checkpoints_failures(&self) -> bool {
        matches!(self, Self::CheckpointAndHalt)
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "checkpoint_and_halt" => Ok(Self::CheckpointAndHalt),
            "halt_without_checkpoint" => Ok(Self::HaltWithoutCheckpoint),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}

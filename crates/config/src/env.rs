use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_common::types::{EpochMillis, EventsRange, FailurePolicy};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub service_name: String,
    pub environment: String,
    /// Seconds between scheduled cycles. `None` runs a single cycle.
    pub sync_interval_secs: Option<u64>,
    #[serde(skip)]
    pub events_range: Option<EventsRange>,
    pub failure_policy: FailurePolicy,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads required vars.
    pub fn from_env() -> OrgsyncResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let sync_interval_secs = match env::var("SYNC_INTERVAL_SECS").ok() {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| OrgsyncError::Config(format!("invalid SYNC_INTERVAL_SECS: {e}")))?;
                if secs == 0 {
                    return Err(OrgsyncError::Config(
                        "SYNC_INTERVAL_SECS must be greater than zero".to_owned(),
                    ));
                }
                Some(secs)
            }
            None => None,
        };

        Ok(Self {
            database_url: get_var("DATABASE_URL")?,
            log_level: get_var_or("LOG_LEVEL", "info"),
            service_name: get_var_or("SERVICE_NAME", "orgsync-consumer"),
            environment: get_var_or("ENVIRONMENT", "dev"),
            sync_interval_secs,
            events_range: parse_events_range("EVENTS_RANGE_START", "EVENTS_RANGE_END")?,
            failure_policy: get_var_or("EVENTS_FAILURE_POLICY", "checkpoint_and_halt")
                .parse()
                .map_err(|e| OrgsyncError::Config(format!("invalid EVENTS_FAILURE_POLICY: {e}")))?,
        })
    }
}

/// Read an explicit override window. Both bounds or neither must be set.
pub fn parse_events_range(start_key: &str, end_key: &str) -> OrgsyncResult<Option<EventsRange>> {
    let start = env::var(start_key).ok().filter(|v| !v.trim().is_empty());
    let end = env::var(end_key).ok().filter(|v| !v.trim().is_empty());

    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = parse_timestamp(start_key, &start)?;
            let end = parse_timestamp(end_key, &end)?;
            EventsRange::new(start, end)
                .map(Some)
                .map_err(OrgsyncError::Config)
        }
        (Some(_), None) => Err(OrgsyncError::Config(format!(
            "{start_key} is set but {end_key} is not; set both or neither"
        ))),
        (None, Some(_)) => Err(OrgsyncError::Config(format!(
            "{end_key} is set but {start_key} is not; set both or neither"
        ))),
    }
}

fn parse_timestamp(key: &str, raw: &str) -> OrgsyncResult<EpochMillis> {
    raw.parse()
        .map_err(|e| OrgsyncError::Config(format!("invalid {key}: {e}")))
}

pub fn get_var(key: &str) -> OrgsyncResult<String> {
    env::var(key).map_err(|_| OrgsyncError::Config(format!("{key} is required but not set")))
}

pub fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

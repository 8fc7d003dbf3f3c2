use orgsync_common::types::{EpochMillis, EventsRange};

/// Length of the fallback window used when there is no checkpoint yet.
pub const TRAILING_WINDOW_MILLIS: i64 = 60_000;

/// The range of events requested from the source on one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchWindow {
    /// Events created within `[start, end]`.
    Range { start: EpochMillis, end: EpochMillis },
    /// Events strictly after the given event id.
    After { event_id: String },
}

impl FetchWindow {
    /// Query parameters understood by the Events API.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Range { start, end } => vec![
                ("range_start", start.to_rfc3339()),
                ("range_end", end.to_rfc3339()),
            ],
            Self::After { event_id } => vec![("after", event_id.clone())],
        }
    }
}

/// Pick the next window. An explicit range wins over the checkpoint, which in
/// turn wins over the trailing window ending at `now`.
pub fn plan_window(
    checkpoint: Option<&str>,
    events_range: Option<&EventsRange>,
    now: EpochMillis,
) -> FetchWindow {
    if let Some(range) = events_range {
        return FetchWindow::Range {
            start: range.start,
            end: range.end,
        };
    }

    if let Some(event_id) = checkpoint {
        return FetchWindow::After {
            event_id: event_id.to_string(),
        };
    }

    FetchWindow::Range {
        start: now.saturating_sub_millis(TRAILING_WINDOW_MILLIS),
        end: now,
    }
}

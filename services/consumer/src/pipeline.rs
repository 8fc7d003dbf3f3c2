use tracing::Instrument;

use orgsync_common::error::OrgsyncError;
use orgsync_common::types::{EpochMillis, EventsRange, FailurePolicy};
use orgsync_db::cursor::models::NewCheckpoint;
use orgsync_db::cursor::repositories::CheckpointRepository;
use orgsync_db::membership::repositories::MembershipRepository;
use orgsync_db::organization::repositories::OrganizationRepository;
use orgsync_db::user::repositories::UserRepository;

use crate::dispatch::{Dispatcher, MutationOutcome};
use crate::telemetry::CycleContext;
use crate::window::{plan_window, FetchWindow};
use crate::workos::client::EventSource;
use crate::workos::models::SourceEvent;

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub events_range: Option<EventsRange>,
    pub failure_policy: FailurePolicy,
}

/// Errors that end a cycle without a safe record of progress.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("failed to read checkpoint: {0}")]
    CheckpointRead(#[source] OrgsyncError),

    #[error("failed to persist checkpoint for {event_id}: {source}")]
    Persist {
        event_id: String,
        #[source]
        source: OrgsyncError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The source could not be read; nothing was consumed.
    FetchFailed(String),
    /// The page was empty.
    Idle,
    /// Every event in the page was handled.
    Completed,
    /// A mutation failed and the rest of the page was left for later.
    Halted { event_id: String, error: String },
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub window: FetchWindow,
    pub fetched: usize,
    pub applied: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub checkpoints_written: usize,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    fn new(window: FetchWindow) -> Self {
        Self {
            window,
            fetched: 0,
            applied: 0,
            not_found: 0,
            skipped: 0,
            checkpoints_written: 0,
            outcome: CycleOutcome::Idle,
        }
    }

    fn record(&mut self, outcome: MutationOutcome) {
        match outcome {
            MutationOutcome::Applied => self.applied += 1,
            MutationOutcome::NotFound => self.not_found += 1,
            MutationOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Drives one fetch / dispatch / checkpoint cycle.
///
/// Assumes it is the only writer of the checkpoint store; overlapping cycles
/// against the same store can interleave checkpoint rows.
pub struct EventsConsumer<E, C, O, M, U> {
    source: E,
    checkpoints: C,
    dispatcher: Dispatcher<O, M, U>,
    settings: PipelineSettings,
}

impl<E, C, O, M, U> EventsConsumer<E, C, O, M, U>
where
    E: EventSource,
    C: CheckpointRepository,
    O: OrganizationRepository,
    M: MembershipRepository,
    U: UserRepository,
{
    pub fn new(
        source: E,
        checkpoints: C,
        dispatcher: Dispatcher<O, M, U>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            checkpoints,
            dispatcher,
            settings,
        }
    }

    /// Entry point for the scheduler. Never fails; problems are logged.
    pub async fn run_scheduled(&self, ctx: &CycleContext) -> Option<CycleReport> {
        match self.run_cycle(ctx).await {
            Ok(report) => {
                tracing::info!(
                    parent: ctx.span(),
                    window = ?report.window,
                    fetched = report.fetched,
                    applied = report.applied,
                    not_found = report.not_found,
                    skipped = report.skipped,
                    checkpoints = report.checkpoints_written,
                    outcome = ?report.outcome,
                    "sync cycle finished"
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(
                    parent: ctx.span(),
                    cycle_id = %ctx.cycle_id,
                    error = %e,
                    "sync cycle aborted"
                );
                None
            }
        }
    }

    pub async fn run_cycle(&self, ctx: &CycleContext) -> Result<CycleReport, CycleError> {
        self.cycle(ctx).instrument(ctx.span().clone()).await
    }

    async fn cycle(&self, ctx: &CycleContext) -> Result<CycleReport, CycleError> {
        let checkpoint = self
            .checkpoints
            .fetch_latest()
            .await
            .map_err(CycleError::CheckpointRead)?;

        let window = plan_window(
            checkpoint.as_deref(),
            self.settings.events_range.as_ref(),
            EpochMillis::now(),
        );
        tracing::info!(?window, checkpoint = ?checkpoint, "fetching events");

        let mut report = CycleReport::new(window.clone());

        let page = match self.source.fetch(&window).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, "unable to fetch events");
                report.outcome = CycleOutcome::FetchFailed(e.to_string());
                return Ok(report);
            }
        };

        report.fetched = page.len();
        if page.is_empty() {
            tracing::info!("no events to process, waiting until next scheduled invocation");
            return Ok(report);
        }

        tracing::info!(
            events = page.len(),
            next_after = ?page.list_metadata.after,
            "processing events"
        );

        for event in &page.data {
            let span = ctx.event_span(event);
            let halted = self
                .handle_event(event, &mut report)
                .instrument(span)
                .await?;
            if halted {
                return Ok(report);
            }
        }

        report.outcome = CycleOutcome::Completed;
        Ok(report)
    }

    /// Dispatch one event and checkpoint it. Returns `true` if the page must stop.
    async fn handle_event(
        &self,
        event: &SourceEvent,
        report: &mut CycleReport,
    ) -> Result<bool, CycleError> {
        match self.dispatcher.dispatch(event).await {
            Ok(outcome) => {
                tracing::debug!(?outcome, "event handled");
                report.record(outcome);
                self.persist(event, report).await?;
                Ok(false)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    policy = self.settings.failure_policy.as_str(),
                    "unable to process event, pausing event processing"
                );
                if self.settings.failure_policy.checkpoints_failures() {
                    self.persist(event, report).await?;
                }
                report.outcome = CycleOutcome::Halted {
                    event_id: event.id.clone(),
                    error: e.to_string(),
                };
                Ok(true)
            }
        }
    }

    async fn persist(&self, event: &SourceEvent, report: &mut CycleReport) -> Result<(), CycleError> {
        let checkpoint = NewCheckpoint {
            event_id: event.id.clone(),
            event_payload: event.payload_json(),
            created_at: event.created_at,
        };

        let event_id = self
            .checkpoints
            .persist(&checkpoint)
            .await
            .map_err(|source| {
                tracing::error!(error = %source, "error persisting events cursor");
                CycleError::Persist {
                    event_id: event.id.clone(),
                    source,
                }
            })?;

        report.checkpoints_written += 1;
        tracing::debug!(%event_id, "events cursor updated");
        Ok(())
    }
}

use tracing::Span;
use uuid::Uuid;

use crate::workos::models::SourceEvent;

/// Request-scoped trace handle for one sync cycle.
///
/// Created by the trigger and passed down explicitly; everything logged while
/// handling the cycle is recorded under `span`.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle_id: Uuid,
    span: Span,
}

impl CycleContext {
    pub fn new(service_name: &str, environment: &str) -> Self {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "sync_cycle",
            %cycle_id,
            service = service_name,
            environment = environment,
        );
        Self { cycle_id, span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Child span covering the dispatch and checkpoint of a single event.
    pub fn event_span(&self, event: &SourceEvent) -> Span {
        tracing::info_span!(
            parent: &self.span,
            "handle_event",
            event_id = %event.id,
            event_type = %event.event,
        )
    }
}

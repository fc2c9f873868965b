use domain::alert::entity::{AlertState, StateEvent};
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;
use ports::secondary::state_appender::StateAppender;
use uuid::Uuid;

/// State appender that emits structured log lines via `tracing`.
///
/// Each transition is logged at INFO level with `event_type = "alert_state"`,
/// so the audit trail can be filtered out of a log aggregation pipeline.
/// Nothing is buffered: `flush` and `close` are no-ops.
pub struct LogStateAppender;

impl LogStateAppender {
    fn emit(event: &StateEvent) {
        tracing::info!(
            event_type = "alert_state",
            id = %event.id,
            created_at_ns = event.created_at_ns,
            fingerprint = %event.fingerprint,
            state = event.state.as_str(),
            suppressed_by = event.suppressed_by.as_deref(),
            suppressed_reason = event.suppressed_reason.map(|r| r.as_str()),
            "alert state"
        );
    }
}

impl StateAppender for LogStateAppender {
    fn append(&self, fingerprint: Fingerprint, state: AlertState) {
        Self::emit(&StateEvent::transition(Uuid::now_v7(), fingerprint, state));
    }

    fn append_inhibited(&self, fingerprint: Fingerprint, inhibited_by: &[String]) {
        Self::emit(&StateEvent::inhibited(
            Uuid::now_v7(),
            fingerprint,
            inhibited_by,
        ));
    }

    fn flush(&self) -> Result<(), StateLogError> {
        Ok(())
    }

    fn close(&self) -> Result<(), StateLogError> {
        Ok(())
    }
}

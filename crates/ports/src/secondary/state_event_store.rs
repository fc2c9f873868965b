use domain::alert::entity::StateEvent;
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;
use domain::alert::query::StateEventQuery;

/// Read side of the persisted state-event log.
///
/// Only rows made durable by `StateAppender::flush` are visible.
pub trait StateEventStore: Send + Sync {
    /// Query persisted events matching the given filters, oldest first.
    fn query_events(&self, query: &StateEventQuery) -> Result<Vec<StateEvent>, StateLogError>;

    /// Audit trail of one alert, oldest first, at most `limit` events.
    fn history(
        &self,
        fingerprint: Fingerprint,
        limit: usize,
    ) -> Result<Vec<StateEvent>, StateLogError> {
        self.query_events(&StateEventQuery::for_fingerprint(fingerprint, limit))
    }

    /// Total number of persisted events.
    fn event_count(&self) -> Result<usize, StateLogError>;
}

use domain::alert::entity::AlertState;
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;

/// Append-only sink for alert state transitions.
///
/// Every call to `append`/`append_inhibited` writes a row: the sink never
/// deduplicates, callers must not call it redundantly. Both are
/// fire-and-forget; implementations log write failures instead of
/// returning them. Rows may be buffered until `flush`.
///
/// The trait is object-safe for use behind `Arc<dyn StateAppender>`.
pub trait StateAppender: Send + Sync {
    /// Append a state event for `fingerprint`.
    ///
    /// `Suppressed` is recorded with reason `silenced`.
    fn append(&self, fingerprint: Fingerprint, state: AlertState);

    /// Append a `suppressed` event with reason `inhibited`.
    ///
    /// Only the first element of `inhibited_by` is persisted.
    fn append_inhibited(&self, fingerprint: Fingerprint, inhibited_by: &[String]);

    /// Make every buffered row durable and visible to readers.
    ///
    /// Callers must flush before reading persisted state.
    fn flush(&self) -> Result<(), StateLogError>;

    /// Release the underlying storage handle. May be a no-op.
    fn close(&self) -> Result<(), StateLogError>;
}

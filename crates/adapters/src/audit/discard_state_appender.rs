use domain::alert::entity::AlertState;
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;
use ports::secondary::state_appender::StateAppender;

/// State appender used when the state log is disabled.
///
/// Transitions are still detected upstream; the rows are dropped here.
pub struct DiscardStateAppender;

impl StateAppender for DiscardStateAppender {
    fn append(&self, fingerprint: Fingerprint, state: AlertState) {
        tracing::trace!(
            fingerprint = %fingerprint,
            state = state.as_str(),
            "state log disabled, discarding"
        );
    }

    fn append_inhibited(&self, fingerprint: Fingerprint, _inhibited_by: &[String]) {
        tracing::trace!(fingerprint = %fingerprint, "state log disabled, discarding inhibition");
    }

    fn flush(&self) -> Result<(), StateLogError> {
        Ok(())
    }

    fn close(&self) -> Result<(), StateLogError> {
        Ok(())
    }
}

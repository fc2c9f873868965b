use std::collections::BTreeMap;

use domain::alert::error::StateLogError;
use domain::alert::operation::MarkerOperation;
use ports::secondary::alert_marker::{AlertMarker, FlushableMarker, GroupMarker};

/// Outcome of replaying a stream of marker operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Total operations applied.
    pub operations: usize,
    /// Operations applied, per operation name.
    pub by_operation: BTreeMap<&'static str, usize>,
}

/// Drive one recorded operation against a marker.
pub fn apply_operation<M>(marker: &M, op: &MarkerOperation)
where
    M: AlertMarker + GroupMarker + ?Sized,
{
    match op {
        MarkerOperation::SetActiveOrSilenced {
            alert,
            version,
            active_silences,
            pending_silences,
        } => marker.set_active_or_silenced(
            alert.fingerprint(),
            *version,
            active_silences,
            pending_silences,
        ),
        MarkerOperation::SetInhibited {
            alert,
            inhibited_by,
        } => marker.set_inhibited(alert.fingerprint(), inhibited_by),
        MarkerOperation::Delete { alert } => marker.delete(alert.fingerprint()),
        MarkerOperation::SetMuted {
            route_id,
            group_key,
            time_intervals,
        } => marker.set_muted(route_id, group_key, time_intervals),
        MarkerOperation::DeleteByGroupKey {
            route_id,
            group_key,
        } => marker.delete_by_group_key(route_id, group_key),
    }
}

/// Apply every operation in order, then flush the marker.
///
/// A flush failure is returned; the in-memory state stays as replayed.
pub fn replay<M, I>(marker: &M, operations: I) -> Result<ReplaySummary, StateLogError>
where
    M: FlushableMarker + ?Sized,
    I: IntoIterator<Item = MarkerOperation>,
{
    let mut summary = ReplaySummary::default();

    for op in operations {
        tracing::trace!(op = op.as_str(), fingerprint = ?op.fingerprint(), "replaying operation");
        apply_operation(marker, &op);
        summary.operations += 1;
        *summary.by_operation.entry(op.as_str()).or_default() += 1;
    }

    marker.flush()?;
    Ok(summary)
}

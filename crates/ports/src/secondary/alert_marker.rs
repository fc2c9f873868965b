use domain::alert::entity::{AlertState, AlertStatus};
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;
use domain::alert::marker::MemMarker;

/// Per-alert status authority: silencing and inhibition.
///
/// Implementations must be safe for concurrent calls on different
/// fingerprints.
pub trait AlertMarker: Send + Sync {
    /// Record the active and pending silences matching `alert`.
    fn set_active_or_silenced(
        &self,
        alert: Fingerprint,
        version: u64,
        active_silence_ids: &[String],
        pending_silence_ids: &[String],
    );

    /// Record the alerts inhibiting `alert`. An empty list clears inhibition.
    fn set_inhibited(&self, alert: Fingerprint, inhibited_by: &[String]);

    /// Number of alerts in any of `states`; all alerts when empty.
    fn count(&self, states: &[AlertState]) -> usize;

    /// Current status; `Unprocessed` for unknown alerts.
    fn status(&self, alert: Fingerprint) -> AlertStatus;

    fn delete(&self, alert: Fingerprint);

    fn unprocessed(&self, alert: Fingerprint) -> bool;

    fn active(&self, alert: Fingerprint) -> bool;

    /// Returns `(active silence IDs, pending silence IDs, version, silenced)`.
    fn silenced(&self, alert: Fingerprint) -> (Vec<String>, Vec<String>, u64, bool);

    /// Returns the inhibitors and whether the alert is inhibited.
    fn inhibited(&self, alert: Fingerprint) -> (Vec<String>, bool);
}

/// Per-group muting by active time intervals.
pub trait GroupMarker: Send + Sync {
    /// Returns the time intervals muting the group and whether it is muted.
    fn muted(&self, route_id: &str, group_key: &str) -> (Vec<String>, bool);

    fn set_muted(&self, route_id: &str, group_key: &str, time_interval_names: &[String]);

    fn delete_by_group_key(&self, route_id: &str, group_key: &str);
}

/// A marker whose side effects may be buffered.
///
/// Call `flush` before reading any state it persisted.
pub trait FlushableMarker: AlertMarker + GroupMarker {
    fn flush(&self) -> Result<(), StateLogError>;
}

impl AlertMarker for MemMarker {
    fn set_active_or_silenced(
        &self,
        alert: Fingerprint,
        version: u64,
        active_silence_ids: &[String],
        pending_silence_ids: &[String],
    ) {
        MemMarker::set_active_or_silenced(
            self,
            alert,
            version,
            active_silence_ids,
            pending_silence_ids,
        );
    }

    fn set_inhibited(&self, alert: Fingerprint, inhibited_by: &[String]) {
        MemMarker::set_inhibited(self, alert, inhibited_by);
    }

    fn count(&self, states: &[AlertState]) -> usize {
        MemMarker::count(self, states)
    }

    fn status(&self, alert: Fingerprint) -> AlertStatus {
        MemMarker::status(self, alert)
    }

    fn delete(&self, alert: Fingerprint) {
        MemMarker::delete(self, alert);
    }

    fn unprocessed(&self, alert: Fingerprint) -> bool {
        MemMarker::unprocessed(self, alert)
    }

    fn active(&self, alert: Fingerprint) -> bool {
        MemMarker::active(self, alert)
    }

    fn silenced(&self, alert: Fingerprint) -> (Vec<String>, Vec<String>, u64, bool) {
        MemMarker::silenced(self, alert)
    }

    fn inhibited(&self, alert: Fingerprint) -> (Vec<String>, bool) {
        MemMarker::inhibited(self, alert)
    }
}

impl GroupMarker for MemMarker {
    fn muted(&self, route_id: &str, group_key: &str) -> (Vec<String>, bool) {
        MemMarker::muted(self, route_id, group_key)
    }

    fn set_muted(&self, route_id: &str, group_key: &str, time_interval_names: &[String]) {
        MemMarker::set_muted(self, route_id, group_key, time_interval_names);
    }

    fn delete_by_group_key(&self, route_id: &str, group_key: &str) {
        MemMarker::delete_by_group_key(self, route_id, group_key);
    }
}

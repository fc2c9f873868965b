use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::entity::{AlertState, AlertStatus};
use super::fingerprint::Fingerprint;

/// Identifies one aggregation group of one route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    route_id: String,
    group_key: String,
}

impl GroupKey {
    fn new(route_id: &str, group_key: &str) -> Self {
        Self {
            route_id: route_id.to_string(),
            group_key: group_key.to_string(),
        }
    }
}

/// In-memory status authority: tracks silencing, inhibition and muting.
///
/// Every status it returns is a copy. An alert it has never seen (or has
/// deleted) reports the `Unprocessed` default status.
#[derive(Debug, Default)]
pub struct MemMarker {
    alerts: RwLock<HashMap<Fingerprint, AlertStatus>>,
    groups: RwLock<HashMap<GroupKey, Vec<String>>>,
}

impl MemMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the silences matching an alert.
    ///
    /// The alert becomes `Active` when it has neither active silences nor
    /// inhibitors, `Suppressed` otherwise. Pending silences never suppress.
    pub fn set_active_or_silenced(
        &self,
        alert: Fingerprint,
        version: u64,
        active_silence_ids: &[String],
        pending_silence_ids: &[String],
    ) {
        let mut alerts = self.alerts.write().unwrap_or_else(PoisonError::into_inner);
        let status = alerts.entry(alert).or_default();
        status.silenced_by = active_silence_ids.to_vec();
        status.pending_silences = pending_silence_ids.to_vec();
        status.silences_version = version;

        status.state = if active_silence_ids.is_empty() && status.inhibited_by.is_empty() {
            AlertState::Active
        } else {
            AlertState::Suppressed
        };
    }

    /// Record the alerts inhibiting `alert`. An empty list clears inhibition.
    pub fn set_inhibited(&self, alert: Fingerprint, inhibited_by: &[String]) {
        let mut alerts = self.alerts.write().unwrap_or_else(PoisonError::into_inner);
        let status = alerts.entry(alert).or_default();
        status.inhibited_by = inhibited_by.to_vec();

        status.state = if inhibited_by.is_empty() && status.silenced_by.is_empty() {
            AlertState::Active
        } else {
            AlertState::Suppressed
        };
    }

    pub fn status(&self, alert: Fingerprint) -> AlertStatus {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&alert)
            .cloned()
            .unwrap_or_default()
    }

    pub fn delete(&self, alert: Fingerprint) {
        self.alerts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&alert);
    }

    /// Number of tracked alerts in any of `states`; all tracked alerts when
    /// `states` is empty.
    pub fn count(&self, states: &[AlertState]) -> usize {
        let alerts = self.alerts.read().unwrap_or_else(PoisonError::into_inner);
        if states.is_empty() {
            return alerts.len();
        }
        alerts
            .values()
            .filter(|s| states.contains(&s.state))
            .count()
    }

    pub fn unprocessed(&self, alert: Fingerprint) -> bool {
        self.status(alert).state == AlertState::Unprocessed
    }

    pub fn active(&self, alert: Fingerprint) -> bool {
        self.status(alert).state == AlertState::Active
    }

    /// Returns `(active IDs, pending IDs, version, silenced)`.
    pub fn silenced(&self, alert: Fingerprint) -> (Vec<String>, Vec<String>, u64, bool) {
        let status = self.status(alert);
        let silenced = status.is_silenced();
        (
            status.silenced_by,
            status.pending_silences,
            status.silences_version,
            silenced,
        )
    }

    /// Returns the inhibitors and whether the alert is currently inhibited.
    pub fn inhibited(&self, alert: Fingerprint) -> (Vec<String>, bool) {
        let status = self.status(alert);
        let inhibited = status.is_inhibited();
        (status.inhibited_by, inhibited)
    }

    /// Returns the time intervals muting the group and whether it is muted.
    pub fn muted(&self, route_id: &str, group_key: &str) -> (Vec<String>, bool) {
        let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
        match groups.get(&GroupKey::new(route_id, group_key)) {
            Some(names) => (names.clone(), !names.is_empty()),
            None => (Vec::new(), false),
        }
    }

    pub fn set_muted(&self, route_id: &str, group_key: &str, time_interval_names: &[String]) {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                GroupKey::new(route_id, group_key),
                time_interval_names.to_vec(),
            );
    }

    pub fn delete_by_group_key(&self, route_id: &str, group_key: &str) {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&GroupKey::new(route_id, group_key));
    }
}

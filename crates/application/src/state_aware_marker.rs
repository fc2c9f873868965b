use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use domain::alert::entity::{AlertState, AlertStatus};
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;
use domain::alert::marker::MemMarker;
use domain::alert::transition::{self, Transition};
use ports::secondary::alert_marker::{AlertMarker, FlushableMarker, GroupMarker};
use ports::secondary::metrics_port::MarkerMetrics;
use ports::secondary::state_appender::StateAppender;

/// Number of mutexes serializing mutations per fingerprint.
const FINGERPRINT_STRIPES: usize = 64;

/// States reported through `set_marked_alerts`.
const MARKED_STATES: [AlertState; 3] = [
    AlertState::Active,
    AlertState::Suppressed,
    AlertState::Unprocessed,
];

/// Marker decorator that persists every observed state transition once.
///
/// All calls are forwarded to the wrapped marker. Mutating calls
/// additionally snapshot the status before the mutation, re-query the
/// marker's derived predicates afterwards, and hand at most one event to
/// the appender (see [`domain::alert::transition`]). The wrapped marker may
/// silently pick a default or no-op outcome, so the decision is taken from
/// what it reports, not from the call arguments.
///
/// The snapshot → mutate → re-check → append sequence runs under a
/// per-fingerprint stripe lock, so concurrent calls on the same alert
/// cannot both observe the same stale snapshot. Read-only calls and group
/// calls are plain passthroughs.
pub struct StateAwareMarker<M = MemMarker> {
    marker: M,
    appender: Arc<dyn StateAppender>,
    metrics: Option<Arc<dyn MarkerMetrics>>,
    stripes: Box<[Mutex<()>]>,
}

impl StateAwareMarker<MemMarker> {
    /// Decorate a fresh in-memory marker.
    pub fn in_memory(appender: Arc<dyn StateAppender>) -> Self {
        Self::new(MemMarker::new(), appender)
    }
}

impl<M: AlertMarker + GroupMarker> StateAwareMarker<M> {
    pub fn new(marker: M, appender: Arc<dyn StateAppender>) -> Self {
        Self {
            marker,
            appender,
            metrics: None,
            stripes: (0..FINGERPRINT_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Attach metrics for appended transitions and marked-alert gauges.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MarkerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Publish the current per-state alert counts to the metrics port.
    pub fn refresh_marked_alerts(&self) {
        let Some(ref metrics) = self.metrics else {
            return;
        };
        for state in MARKED_STATES {
            metrics.set_marked_alerts(state.as_str(), self.marker.count(&[state]) as u64);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn lock(&self, alert: Fingerprint) -> MutexGuard<'_, ()> {
        let stripe = (alert.as_u64() % FINGERPRINT_STRIPES as u64) as usize;
        self.stripes[stripe]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, alert: Fingerprint, decision: Option<Transition>) {
        let Some(decision) = decision else {
            return;
        };

        match decision {
            Transition::Append(state) => {
                tracing::debug!(
                    fingerprint = %alert,
                    state = state.as_str(),
                    "appending alert state"
                );
                self.appender.append(alert, state);
                self.record_transition(state);
            }
            Transition::AppendInhibited(inhibited_by) => {
                tracing::debug!(
                    fingerprint = %alert,
                    inhibited_by = ?inhibited_by,
                    "appending inhibited alert state"
                );
                self.appender.append_inhibited(alert, &inhibited_by);
                self.record_transition(AlertState::Suppressed);
            }
        }
    }

    fn record_transition(&self, state: AlertState) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_state_transition(state.as_str());
        }
    }
}

impl<M: AlertMarker + GroupMarker> AlertMarker for StateAwareMarker<M> {
    fn set_active_or_silenced(
        &self,
        alert: Fingerprint,
        version: u64,
        active_silence_ids: &[String],
        pending_silence_ids: &[String],
    ) {
        let _guard = self.lock(alert);
        let curr_status = self.marker.status(alert);

        self.marker
            .set_active_or_silenced(alert, version, active_silence_ids, pending_silence_ids);

        // The marker may have marked it active regardless of the silences passed in.
        let (_, _, _, is_silenced) = self.marker.silenced(alert);
        self.apply(
            alert,
            transition::after_set_active_or_silenced(&curr_status, is_silenced),
        );
    }

    fn set_inhibited(&self, alert: Fingerprint, inhibited_by: &[String]) {
        let _guard = self.lock(alert);
        let curr_status = self.marker.status(alert);

        self.marker.set_inhibited(alert, inhibited_by);

        let (by, is_inhibited) = self.marker.inhibited(alert);
        self.apply(
            alert,
            transition::after_set_inhibited(&curr_status, by, is_inhibited),
        );
    }

    fn count(&self, states: &[AlertState]) -> usize {
        self.marker.count(states)
    }

    fn status(&self, alert: Fingerprint) -> AlertStatus {
        self.marker.status(alert)
    }

    fn delete(&self, alert: Fingerprint) {
        let _guard = self.lock(alert);
        let curr_status = self.marker.status(alert);

        self.marker.delete(alert);

        self.apply(alert, transition::after_delete(&curr_status));
    }

    fn unprocessed(&self, alert: Fingerprint) -> bool {
        self.marker.unprocessed(alert)
    }

    fn active(&self, alert: Fingerprint) -> bool {
        self.marker.active(alert)
    }

    fn silenced(&self, alert: Fingerprint) -> (Vec<String>, Vec<String>, u64, bool) {
        self.marker.silenced(alert)
    }

    fn inhibited(&self, alert: Fingerprint) -> (Vec<String>, bool) {
        self.marker.inhibited(alert)
    }
}

impl<M: AlertMarker + GroupMarker> GroupMarker for StateAwareMarker<M> {
    fn muted(&self, route_id: &str, group_key: &str) -> (Vec<String>, bool) {
        self.marker.muted(route_id, group_key)
    }

    fn set_muted(&self, route_id: &str, group_key: &str, time_interval_names: &[String]) {
        self.marker.set_muted(route_id, group_key, time_interval_names);
    }

    fn delete_by_group_key(&self, route_id: &str, group_key: &str) {
        self.marker.delete_by_group_key(route_id, group_key);
    }
}

impl<M: AlertMarker + GroupMarker> FlushableMarker for StateAwareMarker<M> {
    fn flush(&self) -> Result<(), StateLogError> {
        self.appender.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::thread;

    use domain::alert::fingerprint::LabelSet;
    use ports::test_utils::{AppendCall, RecordingAppender};

    fn setup() -> (StateAwareMarker, Arc<RecordingAppender>) {
        let appender = Arc::new(RecordingAppender::new());
        let marker =
            StateAwareMarker::in_memory(Arc::clone(&appender) as Arc<dyn StateAppender>);
        (marker, appender)
    }

    fn fp(value: &str) -> Fingerprint {
        LabelSet::new().with("test", value).fingerprint()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[derive(Default)]
    struct CountingMetrics {
        transitions: Mutex<HashMap<String, u64>>,
        marked: Mutex<HashMap<String, u64>>,
    }

    impl MarkerMetrics for CountingMetrics {
        fn record_state_transition(&self, state: &str) {
            *self
                .transitions
                .lock()
                .unwrap()
                .entry(state.to_string())
                .or_default() += 1;
        }

        fn set_marked_alerts(&self, state: &str, count: u64) {
            self.marked.lock().unwrap().insert(state.to_string(), count);
        }
    }

    // ── Passthroughs ───────────────────────────────────────────────

    #[test]
    fn muted_is_a_passthrough() {
        let (marker, appender) = setup();

        let (names, is_muted) = marker.muted("route1", "group1");
        assert!(!is_muted);
        assert!(names.is_empty());

        marker.set_muted("route1", "group1", &ids(&["weekends"]));
        assert_eq!(marker.muted("route1", "group1"), (ids(&["weekends"]), true));
        assert!(!marker.muted("route1", "group2").1);
        assert!(!marker.muted("route2", "group1").1);

        marker.set_muted("route1", "group1", &[]);
        assert_eq!(marker.muted("route1", "group1"), (Vec::new(), false));

        assert!(appender.calls().is_empty());
    }

    #[test]
    fn delete_by_group_key_is_a_passthrough() {
        let (marker, appender) = setup();

        marker.set_muted("route1", "group1", &ids(&["weekends"]));
        marker.delete_by_group_key("route1", "group2");
        assert!(marker.muted("route1", "group1").1);

        marker.delete_by_group_key("route1", "group1");
        assert_eq!(marker.muted("route1", "group1"), (Vec::new(), false));

        assert!(appender.calls().is_empty());
    }

    #[test]
    fn read_only_calls_never_append() {
        let (marker, appender) = setup();
        let a1 = fp("active");

        let _ = marker.status(a1);
        let _ = marker.unprocessed(a1);
        let _ = marker.active(a1);
        let _ = marker.silenced(a1);
        let _ = marker.inhibited(a1);
        let _ = marker.count(&[]);

        assert!(appender.calls().is_empty());
    }

    // ── Counting ───────────────────────────────────────────────────

    #[test]
    fn count_tracks_states_and_appends_each_transition_once() {
        let (marker, appender) = setup();
        let (a1, a2, a3) = (fp("active"), fp("suppressed"), fp("resolved"));
        let total = |m: &StateAwareMarker| {
            m.count(&[
                AlertState::Suppressed,
                AlertState::Active,
                AlertState::Unprocessed,
            ])
        };

        assert_eq!(total(&marker), 0);

        marker.set_active_or_silenced(a1, 1, &[], &[]);
        assert_eq!(marker.count(&[AlertState::Active]), 1);
        assert_eq!(total(&marker), 1);

        marker.set_active_or_silenced(a2, 1, &ids(&["1"]), &[]);
        assert_eq!(marker.count(&[AlertState::Suppressed]), 1);
        assert_eq!(total(&marker), 2);

        // A resolved alert that is still silenced counts as suppressed.
        marker.set_active_or_silenced(a3, 1, &ids(&["2"]), &[]);
        assert_eq!(marker.count(&[AlertState::Suppressed]), 2);
        assert_eq!(total(&marker), 3);

        // Once unsilenced it counts as active.
        marker.set_active_or_silenced(a3, 1, &[], &[]);
        assert_eq!(marker.count(&[AlertState::Active]), 2);
        assert_eq!(total(&marker), 3);

        assert_eq!(
            appender.calls_for(a1),
            vec![AppendCall::Append(a1, AlertState::Active)]
        );
        assert_eq!(
            appender.calls_for(a2),
            vec![AppendCall::Append(a2, AlertState::Suppressed)]
        );
        assert_eq!(
            appender.calls_for(a3),
            vec![
                AppendCall::Append(a3, AlertState::Suppressed),
                AppendCall::Append(a3, AlertState::Active),
            ]
        );
    }

    // ── Deduplication ──────────────────────────────────────────────

    #[test]
    fn repeated_calls_append_each_state_once() {
        let (marker, appender) = setup();
        let (a1, a2) = (fp("active"), fp("active2"));
        let by_a2 = vec![a2.to_string()];

        for _ in 0..2 {
            marker.set_active_or_silenced(a1, 1, &[], &[]);
            marker.set_active_or_silenced(a1, 1, &[], &[]);
            marker.set_inhibited(a1, &by_a2);
            marker.set_inhibited(a1, &by_a2);
        }
        marker.delete(a1);
        marker.delete(a1);

        assert_eq!(
            appender.calls(),
            vec![
                AppendCall::Append(a1, AlertState::Active),
                AppendCall::AppendInhibited(a1, by_a2.clone()),
                AppendCall::Append(a1, AlertState::Deleted),
            ]
        );
    }

    #[test]
    fn repeated_silencing_appends_once() {
        let (marker, appender) = setup();
        let a1 = fp("silenced");

        marker.set_active_or_silenced(a1, 1, &ids(&["s1"]), &[]);
        marker.set_active_or_silenced(a1, 1, &ids(&["s1"]), &[]);

        assert_eq!(
            appender.calls(),
            vec![AppendCall::Append(a1, AlertState::Suppressed)]
        );
    }

    #[test]
    fn deleting_unseen_alert_appends_nothing() {
        let (marker, appender) = setup();
        marker.delete(fp("never-seen"));
        assert!(appender.calls().is_empty());
    }

    #[test]
    fn deleted_alert_that_reappears_is_active_again() {
        let (marker, appender) = setup();
        let a1 = fp("flapping");

        marker.set_active_or_silenced(a1, 1, &[], &[]);
        marker.delete(a1);
        marker.set_active_or_silenced(a1, 1, &[], &[]);

        assert_eq!(
            appender.calls(),
            vec![
                AppendCall::Append(a1, AlertState::Active),
                AppendCall::Append(a1, AlertState::Deleted),
                AppendCall::Append(a1, AlertState::Active),
            ]
        );
    }

    // ── Inhibition ─────────────────────────────────────────────────

    #[test]
    fn changing_inhibitor_appends_again() {
        let (marker, appender) = setup();
        let (a1, a2, a3) = (fp("active"), fp("suppressed"), fp("resolved"));

        marker.set_inhibited(a1, &[a2.to_string()]);
        marker.set_inhibited(a1, &[a3.to_string()]);
        marker.set_inhibited(a1, &[a3.to_string()]);

        assert_eq!(
            appender.calls(),
            vec![
                AppendCall::AppendInhibited(a1, vec![a2.to_string()]),
                AppendCall::AppendInhibited(a1, vec![a3.to_string()]),
            ]
        );
    }

    #[test]
    fn clearing_inhibition_on_silenced_alert_appends_nothing() {
        let (marker, appender) = setup();
        let (a1, a2) = (fp("active"), fp("active2"));

        marker.set_active_or_silenced(a1, 1, &ids(&["1"]), &[]);
        marker.set_inhibited(a1, &[]);
        marker.set_inhibited(a2, &[]);

        assert_eq!(
            appender.calls(),
            vec![
                AppendCall::Append(a1, AlertState::Suppressed),
                AppendCall::Append(a2, AlertState::Active),
            ]
        );
    }

    #[test]
    fn unsilencing_an_inhibited_alert_appends_nothing() {
        let (marker, appender) = setup();
        let (a1, a2) = (fp("active"), fp("inhibitor"));

        marker.set_inhibited(a1, &[a2.to_string()]);
        marker.set_active_or_silenced(a1, 2, &[], &[]);

        assert_eq!(marker.status(a1).state, AlertState::Suppressed);
        assert_eq!(
            appender.calls(),
            vec![AppendCall::AppendInhibited(a1, vec![a2.to_string()])]
        );
    }

    #[test]
    fn silenced_then_inhibited_records_the_inhibition() {
        let (marker, appender) = setup();
        let (a1, a2) = (fp("active"), fp("inhibitor"));

        marker.set_active_or_silenced(a1, 1, &ids(&["s1"]), &[]);
        marker.set_inhibited(a1, &[a2.to_string()]);

        assert_eq!(
            appender.calls(),
            vec![
                AppendCall::Append(a1, AlertState::Suppressed),
                AppendCall::AppendInhibited(a1, vec![a2.to_string()]),
            ]
        );
    }

    // ── End-to-end lifecycle ───────────────────────────────────────

    #[test]
    fn lifecycle_appends_one_event_per_step() {
        let (marker, appender) = setup();
        let (a1, a2) = (fp("a1"), fp("a2"));

        marker.set_active_or_silenced(a1, 1, &[], &[]);
        marker.set_active_or_silenced(a1, 1, &[], &[]);
        assert_eq!(appender.calls().len(), 1);

        marker.set_inhibited(a1, &[a2.to_string()]);
        marker.set_inhibited(a1, &[a2.to_string()]);
        assert_eq!(appender.calls().len(), 2);

        marker.delete(a1);
        marker.delete(a1);
        assert_eq!(
            appender.calls(),
            vec![
                AppendCall::Append(a1, AlertState::Active),
                AppendCall::AppendInhibited(a1, vec![a2.to_string()]),
                AppendCall::Append(a1, AlertState::Deleted),
            ]
        );
    }

    #[test]
    fn flush_forwards_to_appender() {
        let (marker, appender) = setup();
        assert!(marker.flush().is_ok());
        assert!(marker.flush().is_ok());
        assert_eq!(appender.flush_calls.load(Ordering::Relaxed), 2);
        assert_eq!(appender.close_calls.load(Ordering::Relaxed), 0);
    }

    // ── Concurrency ────────────────────────────────────────────────

    #[test]
    fn concurrent_calls_on_one_alert_append_once() {
        let (marker, appender) = setup();
        let marker = Arc::new(marker);
        let a1 = fp("contended");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let marker = Arc::clone(&marker);
                thread::spawn(move || {
                    for _ in 0..100 {
                        marker.set_active_or_silenced(a1, 1, &[], &[]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            appender.calls(),
            vec![AppendCall::Append(a1, AlertState::Active)]
        );
    }

    #[test]
    fn concurrent_calls_on_distinct_alerts_each_append() {
        let (marker, appender) = setup();
        let marker = Arc::new(marker);

        let handles: Vec<_> = (0..16u64)
            .map(|i| {
                let marker = Arc::clone(&marker);
                thread::spawn(move || {
                    let alert = Fingerprint(i);
                    marker.set_active_or_silenced(alert, 1, &[], &[]);
                    marker.delete(alert);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(appender.calls().len(), 32);
        assert_eq!(marker.count(&[]), 0);
    }

    // ── Metrics ────────────────────────────────────────────────────

    #[test]
    fn metrics_count_transitions_and_marked_alerts() {
        let appender = Arc::new(RecordingAppender::new());
        let metrics = Arc::new(CountingMetrics::default());
        let marker = StateAwareMarker::in_memory(appender as Arc<dyn StateAppender>)
            .with_metrics(Arc::clone(&metrics) as Arc<dyn MarkerMetrics>);

        marker.set_active_or_silenced(fp("a"), 1, &[], &[]);
        marker.set_active_or_silenced(fp("b"), 1, &ids(&["s1"]), &[]);
        marker.set_inhibited(fp("c"), &[fp("a").to_string()]);
        marker.refresh_marked_alerts();

        let transitions = metrics.transitions.lock().unwrap();
        assert_eq!(transitions.get("active"), Some(&1));
        assert_eq!(transitions.get("suppressed"), Some(&2));

        let marked = metrics.marked.lock().unwrap();
        assert_eq!(marked.get("active"), Some(&1));
        assert_eq!(marked.get("suppressed"), Some(&2));
        assert_eq!(marked.get("unprocessed"), Some(&0));
    }
}

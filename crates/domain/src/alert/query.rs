use super::entity::{AlertState, StateEvent, SuppressedReason};
use super::fingerprint::Fingerprint;

/// Filter parameters for querying persisted state events.
///
/// Matching events are returned oldest first (ascending id), which is the
/// audit-trail order of a fingerprint's history.
#[derive(Debug, Clone, Default)]
pub struct StateEventQuery {
    /// Only events of this alert.
    pub fingerprint: Option<Fingerprint>,
    /// Only events recording this state.
    pub state: Option<AlertState>,
    /// Only suppressions with this cause.
    pub reason: Option<SuppressedReason>,
    /// Start of time range (inclusive, nanoseconds since epoch).
    pub from_ns: Option<u64>,
    /// End of time range (inclusive, nanoseconds since epoch).
    pub to_ns: Option<u64>,
    /// Maximum number of events to return; `0` means no cap.
    pub limit: usize,
    /// Number of events to skip.
    pub offset: usize,
}

impl StateEventQuery {
    /// History of one alert, capped at `limit` events.
    pub fn for_fingerprint(fingerprint: Fingerprint, limit: usize) -> Self {
        Self {
            fingerprint: Some(fingerprint),
            limit,
            ..Self::default()
        }
    }

    /// Check whether an event matches all active filters.
    pub fn matches(&self, event: &StateEvent) -> bool {
        if let Some(fp) = self.fingerprint
            && event.fingerprint != fp
        {
            return false;
        }
        if let Some(state) = self.state
            && event.state != state
        {
            return false;
        }
        if let Some(reason) = self.reason
            && event.suppressed_reason != Some(reason)
        {
            return false;
        }
        if let Some(from) = self.from_ns
            && event.created_at_ns < from
        {
            return false;
        }
        if let Some(to) = self.to_ns
            && event.created_at_ns > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(fp: u64, state: AlertState, ts: u64) -> StateEvent {
        let mut e = StateEvent::transition(Uuid::now_v7(), Fingerprint(fp), state);
        e.created_at_ns = ts;
        e
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = StateEventQuery::default();
        assert!(q.matches(&event(1, AlertState::Active, 10)));
        assert!(q.matches(&event(2, AlertState::Deleted, 20)));
    }

    #[test]
    fn filters_by_fingerprint() {
        let q = StateEventQuery::for_fingerprint(Fingerprint(1), 10);
        assert!(q.matches(&event(1, AlertState::Active, 10)));
        assert!(!q.matches(&event(2, AlertState::Active, 10)));
    }

    #[test]
    fn filters_by_state() {
        let q = StateEventQuery {
            state: Some(AlertState::Suppressed),
            ..Default::default()
        };
        assert!(q.matches(&event(1, AlertState::Suppressed, 10)));
        assert!(!q.matches(&event(1, AlertState::Active, 10)));
    }

    #[test]
    fn filters_by_reason() {
        let q = StateEventQuery {
            reason: Some(SuppressedReason::Inhibited),
            ..Default::default()
        };
        let silenced = event(1, AlertState::Suppressed, 10);
        let inhibited = StateEvent::inhibited(Uuid::now_v7(), Fingerprint(1), &["x".into()]);
        assert!(!q.matches(&silenced));
        assert!(q.matches(&inhibited));
        assert!(!q.matches(&event(1, AlertState::Active, 10)));
    }

    #[test]
    fn time_range_is_inclusive() {
        let q = StateEventQuery {
            from_ns: Some(100),
            to_ns: Some(200),
            ..Default::default()
        };
        assert!(!q.matches(&event(1, AlertState::Active, 99)));
        assert!(q.matches(&event(1, AlertState::Active, 100)));
        assert!(q.matches(&event(1, AlertState::Active, 200)));
        assert!(!q.matches(&event(1, AlertState::Active, 201)));
    }
}

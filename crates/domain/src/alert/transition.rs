//! Decision rules turning a status change into at most one persisted event.
//!
//! Each rule compares the status snapshot taken *before* a mutation with
//! what the status authority reports *after* it. The rules only look at
//! derived predicates (silenced / inhibited), never at the raw state alone:
//! `Suppressed` covers two independent causes that change separately.

use super::entity::{AlertState, AlertStatus};

/// An event the decorator must append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Append a plain state event. `Suppressed` here means silenced.
    Append(AlertState),
    /// Append an inhibition with the authority's resolved inhibitor list.
    AppendInhibited(Vec<String>),
}

/// Rule for `set_active_or_silenced`.
///
/// Any earlier `Suppressed` state blocks a new silenced event, whatever its
/// cause. Clearing silences on an inhibited alert records nothing because
/// the alert stays suppressed by inhibition.
pub fn after_set_active_or_silenced(
    prev: &AlertStatus,
    now_silenced: bool,
) -> Option<Transition> {
    if now_silenced {
        return (prev.state != AlertState::Suppressed)
            .then_some(Transition::Append(AlertState::Suppressed));
    }

    if prev.state == AlertState::Suppressed && !prev.inhibited_by.is_empty() {
        return None;
    }

    if prev.state == AlertState::Active {
        return None;
    }

    Some(Transition::Append(AlertState::Active))
}

/// Rule for `set_inhibited`.
///
/// An already suppressed alert records a new inhibition only when the
/// inhibitor list changed, element for element and in order.
pub fn after_set_inhibited(
    prev: &AlertStatus,
    inhibited_by: Vec<String>,
    now_inhibited: bool,
) -> Option<Transition> {
    if now_inhibited {
        if prev.state != AlertState::Suppressed || prev.inhibited_by != inhibited_by {
            return Some(Transition::AppendInhibited(inhibited_by));
        }
        return None;
    }

    match prev.state {
        AlertState::Suppressed | AlertState::Active => None,
        AlertState::Unprocessed | AlertState::Deleted => {
            Some(Transition::Append(AlertState::Active))
        }
    }
}

/// Rule for `delete`: an alert never observed leaves no trace.
pub fn after_delete(prev: &AlertStatus) -> Option<Transition> {
    (prev.state != AlertState::Unprocessed).then_some(Transition::Append(AlertState::Deleted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: AlertState, silenced_by: &[&str], inhibited_by: &[&str]) -> AlertStatus {
        AlertStatus {
            state,
            silenced_by: silenced_by.iter().map(ToString::to_string).collect(),
            inhibited_by: inhibited_by.iter().map(ToString::to_string).collect(),
            ..AlertStatus::default()
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    // ── set_active_or_silenced ─────────────────────────────────────

    #[test]
    fn newly_silenced_appends_suppressed() {
        for prev in [AlertState::Unprocessed, AlertState::Active, AlertState::Deleted] {
            assert_eq!(
                after_set_active_or_silenced(&status(prev, &[], &[]), true),
                Some(Transition::Append(AlertState::Suppressed))
            );
        }
    }

    #[test]
    fn already_suppressed_blocks_silenced_event() {
        let silenced = status(AlertState::Suppressed, &["s1"], &[]);
        let inhibited = status(AlertState::Suppressed, &[], &["a2"]);
        assert_eq!(after_set_active_or_silenced(&silenced, true), None);
        assert_eq!(after_set_active_or_silenced(&inhibited, true), None);
    }

    #[test]
    fn unsilenced_but_inhibited_records_nothing() {
        let prev = status(AlertState::Suppressed, &[], &["a2"]);
        assert_eq!(after_set_active_or_silenced(&prev, false), None);
    }

    #[test]
    fn active_stays_active_without_event() {
        let prev = status(AlertState::Active, &[], &[]);
        assert_eq!(after_set_active_or_silenced(&prev, false), None);
    }

    #[test]
    fn unsilencing_appends_active() {
        let prev = status(AlertState::Suppressed, &["s1"], &[]);
        assert_eq!(
            after_set_active_or_silenced(&prev, false),
            Some(Transition::Append(AlertState::Active))
        );
    }

    #[test]
    fn first_sighting_appends_active() {
        let prev = AlertStatus::default();
        assert_eq!(
            after_set_active_or_silenced(&prev, false),
            Some(Transition::Append(AlertState::Active))
        );
    }

    // ── set_inhibited ──────────────────────────────────────────────

    #[test]
    fn newly_inhibited_appends_inhibition() {
        let prev = status(AlertState::Active, &[], &[]);
        assert_eq!(
            after_set_inhibited(&prev, ids(&["a2"]), true),
            Some(Transition::AppendInhibited(ids(&["a2"])))
        );
    }

    #[test]
    fn same_inhibitors_record_nothing() {
        let prev = status(AlertState::Suppressed, &[], &["a2"]);
        assert_eq!(after_set_inhibited(&prev, ids(&["a2"]), true), None);
    }

    #[test]
    fn changed_inhibitors_append_again() {
        let prev = status(AlertState::Suppressed, &[], &["a2"]);
        assert_eq!(
            after_set_inhibited(&prev, ids(&["a3"]), true),
            Some(Transition::AppendInhibited(ids(&["a3"])))
        );
    }

    #[test]
    fn inhibitor_order_matters() {
        let prev = status(AlertState::Suppressed, &[], &["a2", "a3"]);
        assert!(after_set_inhibited(&prev, ids(&["a3", "a2"]), true).is_some());
    }

    #[test]
    fn silenced_alert_becoming_inhibited_appends_inhibition() {
        let prev = status(AlertState::Suppressed, &["s1"], &[]);
        assert_eq!(
            after_set_inhibited(&prev, ids(&["a2"]), true),
            Some(Transition::AppendInhibited(ids(&["a2"])))
        );
    }

    #[test]
    fn not_inhibited_and_previously_known_records_nothing() {
        let suppressed = status(AlertState::Suppressed, &["s1"], &[]);
        let active = status(AlertState::Active, &[], &[]);
        assert_eq!(after_set_inhibited(&suppressed, Vec::new(), false), None);
        assert_eq!(after_set_inhibited(&active, Vec::new(), false), None);
    }

    #[test]
    fn not_inhibited_and_unseen_appends_active() {
        assert_eq!(
            after_set_inhibited(&AlertStatus::default(), Vec::new(), false),
            Some(Transition::Append(AlertState::Active))
        );
    }

    // ── delete ─────────────────────────────────────────────────────

    #[test]
    fn deleting_unseen_alert_records_nothing() {
        assert_eq!(after_delete(&AlertStatus::default()), None);
    }

    #[test]
    fn deleting_known_alert_appends_deleted() {
        for prev in [AlertState::Active, AlertState::Suppressed] {
            assert_eq!(
                after_delete(&status(prev, &[], &[])),
                Some(Transition::Append(AlertState::Deleted))
            );
        }
    }
}

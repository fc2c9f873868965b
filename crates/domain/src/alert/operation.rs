use serde::{Deserialize, Serialize};

use super::fingerprint::{Fingerprint, LabelSet};

/// Reference to an alert, either by fingerprint or by its full label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertRef {
    Fingerprint(Fingerprint),
    Labels(LabelSet),
}

impl AlertRef {
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Fingerprint(fp) => *fp,
            Self::Labels(labels) => labels.fingerprint(),
        }
    }
}

/// One mutating call on the status authority, as recorded for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MarkerOperation {
    SetActiveOrSilenced {
        alert: AlertRef,
        #[serde(default)]
        version: u64,
        #[serde(default)]
        active_silences: Vec<String>,
        #[serde(default)]
        pending_silences: Vec<String>,
    },
    SetInhibited {
        alert: AlertRef,
        #[serde(default)]
        inhibited_by: Vec<String>,
    },
    Delete {
        alert: AlertRef,
    },
    SetMuted {
        route_id: String,
        group_key: String,
        #[serde(default)]
        time_intervals: Vec<String>,
    },
    DeleteByGroupKey {
        route_id: String,
        group_key: String,
    },
}

impl MarkerOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetActiveOrSilenced { .. } => "set_active_or_silenced",
            Self::SetInhibited { .. } => "set_inhibited",
            Self::Delete { .. } => "delete",
            Self::SetMuted { .. } => "set_muted",
            Self::DeleteByGroupKey { .. } => "delete_by_group_key",
        }
    }

    /// The alert this operation targets; `None` for group operations.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        match self {
            Self::SetActiveOrSilenced { alert, .. }
            | Self::SetInhibited { alert, .. }
            | Self::Delete { alert } => Some(alert.fingerprint()),
            Self::SetMuted { .. } | Self::DeleteByGroupKey { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fingerprint_reference() {
        let op: MarkerOperation =
            serde_json::from_str(r#"{"op":"delete","alert":"00000000000000ff"}"#).unwrap();
        assert_eq!(op.as_str(), "delete");
        assert_eq!(op.fingerprint(), Some(Fingerprint(0xff)));
    }

    #[test]
    fn parses_label_reference() {
        let op: MarkerOperation = serde_json::from_str(
            r#"{"op":"set_inhibited","alert":{"test":"active"},"inhibited_by":["0000000000000002"]}"#,
        )
        .unwrap();
        let expected = LabelSet::new().with("test", "active").fingerprint();
        assert_eq!(op.fingerprint(), Some(expected));
    }

    #[test]
    fn silence_lists_default_to_empty() {
        let op: MarkerOperation = serde_json::from_str(
            r#"{"op":"set_active_or_silenced","alert":"0000000000000001"}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            MarkerOperation::SetActiveOrSilenced {
                alert: AlertRef::Fingerprint(Fingerprint(1)),
                version: 0,
                active_silences: Vec::new(),
                pending_silences: Vec::new(),
            }
        );
    }

    #[test]
    fn group_operations_have_no_fingerprint() {
        let op: MarkerOperation = serde_json::from_str(
            r#"{"op":"set_muted","route_id":"r1","group_key":"g1","time_intervals":["weekends"]}"#,
        )
        .unwrap();
        assert_eq!(op.fingerprint(), None);
    }

    #[test]
    fn rejects_unknown_operation() {
        assert!(serde_json::from_str::<MarkerOperation>(r#"{"op":"explode"}"#).is_err());
    }
}

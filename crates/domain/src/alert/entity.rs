use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StateLogError;
use super::fingerprint::Fingerprint;

/// Lifecycle state of an alert as tracked by the status authority.
///
/// `Suppressed` covers both silencing and inhibition; the cause is carried
/// separately as a [`SuppressedReason`] on persisted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    #[default]
    Unprocessed,
    Active,
    Suppressed,
    Deleted,
}

impl AlertState {
    pub const ALL: [Self; 4] = [
        Self::Unprocessed,
        Self::Active,
        Self::Suppressed,
        Self::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unprocessed => "unprocessed",
            Self::Active => "active",
            Self::Suppressed => "suppressed",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertState {
    type Err = StateLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unprocessed" => Ok(Self::Unprocessed),
            "active" => Ok(Self::Active),
            "suppressed" => Ok(Self::Suppressed),
            "deleted" => Ok(Self::Deleted),
            _ => Err(StateLogError::InvalidState(s.to_string())),
        }
    }
}

/// Why a persisted `suppressed` event was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressedReason {
    Silenced,
    Inhibited,
}

impl SuppressedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Silenced => "silenced",
            Self::Inhibited => "inhibited",
        }
    }
}

impl std::fmt::Display for SuppressedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SuppressedReason {
    type Err = StateLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silenced" => Ok(Self::Silenced),
            "inhibited" => Ok(Self::Inhibited),
            _ => Err(StateLogError::InvalidState(s.to_string())),
        }
    }
}

/// In-memory status snapshot of one alert, owned by the status authority.
///
/// Never persisted itself; only transitions between snapshots are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatus {
    pub state: AlertState,
    /// IDs of active silences muting the alert.
    #[serde(default)]
    pub silenced_by: Vec<String>,
    /// Fingerprints (as strings) of the alerts inhibiting this one, in order.
    #[serde(default)]
    pub inhibited_by: Vec<String>,
    /// IDs of matching silences that are not active yet.
    #[serde(default)]
    pub pending_silences: Vec<String>,
    /// Version of the silence set the silence IDs were computed against.
    #[serde(default)]
    pub silences_version: u64,
}

impl AlertStatus {
    pub fn is_silenced(&self) -> bool {
        self.state == AlertState::Suppressed && !self.silenced_by.is_empty()
    }

    pub fn is_inhibited(&self) -> bool {
        self.state == AlertState::Suppressed && !self.inhibited_by.is_empty()
    }
}

/// One persisted row of the `alert_states` audit trail.
///
/// Rows are append-only. `id` is a UUIDv7, so ordering by id orders by
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEvent {
    pub id: Uuid,
    /// Wall-clock creation time in nanoseconds since the UNIX epoch.
    pub created_at_ns: u64,
    pub fingerprint: Fingerprint,
    pub state: AlertState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressed_reason: Option<SuppressedReason>,
}

impl StateEvent {
    /// Build the row for a plain state transition.
    ///
    /// A `Suppressed` transition recorded this way is always a silencing.
    pub fn transition(id: Uuid, fingerprint: Fingerprint, state: AlertState) -> Self {
        let suppressed_reason =
            (state == AlertState::Suppressed).then_some(SuppressedReason::Silenced);
        Self {
            id,
            created_at_ns: current_timestamp_ns(),
            fingerprint,
            state,
            suppressed_by: None,
            suppressed_reason,
        }
    }

    /// Build the row for an inhibition.
    ///
    /// Only the first inhibitor is kept in `suppressed_by`.
    pub fn inhibited(id: Uuid, fingerprint: Fingerprint, inhibited_by: &[String]) -> Self {
        Self {
            id,
            created_at_ns: current_timestamp_ns(),
            fingerprint,
            state: AlertState::Suppressed,
            suppressed_by: inhibited_by.first().cloned(),
            suppressed_reason: Some(SuppressedReason::Inhibited),
        }
    }
}

/// Returns current wall-clock time as nanoseconds since UNIX epoch.
#[allow(clippy::cast_possible_truncation)]
pub fn current_timestamp_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// ── Paths ──────────────────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "/etc/alerttrail/config.yaml";
pub const DEFAULT_STATE_DB_PATH: &str = "data/alert_states.redb";

// ── State log ──────────────────────────────────────────────────────

/// Rows buffered before an append triggers an automatic flush.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2048;
pub const MAX_BUFFER_CAPACITY: usize = 1_000_000;

/// Default row cap for `history` and `events` queries.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

// ── Metrics ────────────────────────────────────────────────────────

pub const METRICS_PREFIX: &str = "alerttrail";

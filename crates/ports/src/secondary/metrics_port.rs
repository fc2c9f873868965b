// Focused sub-traits for recording Prometheus metrics.
//
// All methods take `&self` because the underlying implementation uses
// atomic operations (interior mutability via `prometheus-client`).
//
// Default implementations are no-ops, allowing test mocks to implement
// only the sub-traits relevant to the service under test.

// ── Marker metrics ─────────────────────────────────────────────────

pub trait MarkerMetrics: Send + Sync {
    /// Record a state transition handed to the appender.
    fn record_state_transition(&self, _state: &str) {}

    /// Set the number of alerts currently tracked in a given state.
    fn set_marked_alerts(&self, _state: &str, _count: u64) {}
}

// ── State log metrics ──────────────────────────────────────────────

pub trait StateLogMetrics: Send + Sync {
    /// Record rows discarded without reaching storage (failed flush, closed
    /// appender).
    fn record_rows_dropped(&self, _reason: &str, _rows: u64) {}

    /// Record rows made durable by a flush.
    fn record_rows_flushed(&self, _rows: u64) {}

    /// Observe a flush duration in seconds.
    fn observe_flush_duration(&self, _duration_seconds: f64) {}
}

// ── Composite super-trait ──────────────────────────────────────────

/// Unified metrics port composing all sub-traits.
pub trait MetricsPort: MarkerMetrics + StateLogMetrics {}

impl<T: MarkerMetrics + StateLogMetrics> MetricsPort for T {}

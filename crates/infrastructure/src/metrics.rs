use ports::secondary::metrics_port::{MarkerMetrics, StateLogMetrics};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets_range};
use prometheus_client::registry::Registry;

use crate::constants::METRICS_PREFIX;

// ── Label types ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StateLabels {
    pub state: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReasonLabels {
    pub reason: String,
}

// ── Agent metrics registry ──────────────────────────────────────────

/// Prometheus metrics registry for the alert state trail.
///
/// All metric families use interior mutability (atomics), so recording
/// metrics only requires `&self`. The registry itself is NOT Clone;
/// wrap in `Arc` to share it between the marker and the appender.
pub struct AgentMetrics {
    registry: Registry,
    pub marked_alerts: Family<StateLabels, Gauge>,
    pub state_transitions_total: Family<StateLabels, Counter>,
    pub state_rows_dropped_total: Family<ReasonLabels, Counter>,
    pub state_rows_flushed_total: Counter,
    pub state_flush_duration: Histogram,
}

impl AgentMetrics {
    /// Create a new metrics registry with all metrics registered under
    /// the `alerttrail` prefix.
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix(METRICS_PREFIX);

        let marked_alerts = Family::<StateLabels, Gauge>::default();
        registry.register(
            "marked_alerts",
            "Alerts currently tracked by the marker, per state",
            marked_alerts.clone(),
        );

        let state_transitions_total = Family::<StateLabels, Counter>::default();
        registry.register(
            "state_transitions",
            "State transitions handed to the state appender",
            state_transitions_total.clone(),
        );

        let state_rows_dropped_total = Family::<ReasonLabels, Counter>::default();
        registry.register(
            "state_rows_dropped",
            "State rows discarded before reaching storage, per reason",
            state_rows_dropped_total.clone(),
        );

        let state_rows_flushed_total = Counter::default();
        registry.register(
            "state_rows_flushed",
            "State rows made durable by a flush",
            state_rows_flushed_total.clone(),
        );

        // Exponential buckets from 100μs to 10s (12 buckets)
        let state_flush_duration = Histogram::new(exponential_buckets_range(0.000_1, 10.0, 12));
        registry.register(
            "state_flush_duration_seconds",
            "State log flush latency in seconds",
            state_flush_duration.clone(),
        );

        Self {
            registry,
            marked_alerts,
            state_transitions_total,
            state_rows_dropped_total,
            state_rows_flushed_total,
            state_flush_duration,
        }
    }

    /// Encode all registered metrics to `OpenMetrics` text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = prometheus_client::encoding::text::encode(&mut buffer, &self.registry) {
            tracing::warn!(error = %e, "metrics encoding failed");
        }
        buffer
    }
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sub-trait implementations ──────────────────────────────────────

impl MarkerMetrics for AgentMetrics {
    fn record_state_transition(&self, state: &str) {
        self.state_transitions_total
            .get_or_create(&StateLabels {
                state: state.to_string(),
            })
            .inc();
    }

    fn set_marked_alerts(&self, state: &str, count: u64) {
        self.marked_alerts
            .get_or_create(&StateLabels {
                state: state.to_string(),
            })
            .set(count.try_into().unwrap_or(i64::MAX));
    }
}

impl StateLogMetrics for AgentMetrics {
    fn record_rows_dropped(&self, reason: &str, rows: u64) {
        self.state_rows_dropped_total
            .get_or_create(&ReasonLabels {
                reason: reason.to_string(),
            })
            .inc_by(rows);
    }

    fn record_rows_flushed(&self, rows: u64) {
        self.state_rows_flushed_total.inc_by(rows);
    }

    fn observe_flush_duration(&self, duration_seconds: f64) {
        self.state_flush_duration.observe(duration_seconds);
    }
}

// MetricsPort is automatically implemented via the blanket impl
// since AgentMetrics implements all sub-traits.

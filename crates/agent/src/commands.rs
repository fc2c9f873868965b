use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use application::replay::{ReplaySummary, replay};
use application::state_aware_marker::StateAwareMarker;
use domain::alert::entity::{AlertState, StateEvent};
use domain::alert::fingerprint::{Fingerprint, LabelSet};
use domain::alert::operation::MarkerOperation;
use domain::alert::query::StateEventQuery;
use infrastructure::config::AgentConfig;
use infrastructure::metrics::AgentMetrics;
use ports::secondary::alert_marker::AlertMarker;
use ports::secondary::metrics_port::{MarkerMetrics, StateLogMetrics};
use ports::secondary::state_event_store::StateEventStore;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::startup;

// ── Version ─────────────────────────────────────────────────────────────

pub fn cmd_version(output: OutputFormat) -> Result<()> {
    if output == OutputFormat::Json {
        let info = serde_json::json!({
            "name": "alerttrail",
            "version": env!("CARGO_PKG_VERSION"),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("alerttrail {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

// ── Fingerprint ─────────────────────────────────────────────────────────

pub fn cmd_fingerprint(pairs: &[String], output: OutputFormat) -> Result<()> {
    let labels = parse_labels(pairs)?;
    let fingerprint = labels.fingerprint();

    if output == OutputFormat::Json {
        let body = serde_json::json!({
            "fingerprint": fingerprint,
            "labels": labels,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{fingerprint}");
    Ok(())
}

fn parse_labels(pairs: &[String]) -> Result<LabelSet> {
    let mut labels = LabelSet::new();
    for pair in pairs {
        let (name, value) = LabelSet::parse_pair(pair)?;
        labels.insert(name, value);
    }
    Ok(labels)
}

// ── Replay ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ReplayReport {
    operations: usize,
    by_operation: BTreeMap<&'static str, usize>,
    marked_alerts: BTreeMap<&'static str, usize>,
}

pub fn cmd_replay(
    config: &AgentConfig,
    file: &Path,
    show_metrics: bool,
    output: OutputFormat,
) -> Result<()> {
    let operations = read_operations(file)?;

    let metrics = Arc::new(AgentMetrics::new());
    let appender = startup::build_appender(
        config,
        Arc::clone(&metrics) as Arc<dyn StateLogMetrics>,
    )?;
    let marker = StateAwareMarker::in_memory(Arc::clone(&appender))
        .with_metrics(Arc::clone(&metrics) as Arc<dyn MarkerMetrics>);

    let summary = replay(&marker, operations).context("failed to flush replayed states")?;
    marker.refresh_marked_alerts();
    appender.close().context("failed to close state log")?;

    tracing::info!(operations = summary.operations, "replay complete");
    print_replay(&marker, summary, output)?;

    if show_metrics {
        print!("{}", metrics.encode());
    }
    Ok(())
}

/// Parse one `MarkerOperation` per line. Blank lines and `#` comments are
/// skipped.
fn read_operations(file: &Path) -> Result<Vec<MarkerOperation>> {
    let handle = std::fs::File::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?;
    parse_operations(std::io::BufReader::new(handle))
        .with_context(|| format!("failed to read operations from {}", file.display()))
}

fn parse_operations(reader: impl BufRead) -> Result<Vec<MarkerOperation>> {
    let mut operations = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let op: MarkerOperation = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: invalid operation", idx + 1))?;
        operations.push(op);
    }
    Ok(operations)
}

fn print_replay<M: AlertMarker>(
    marker: &M,
    summary: ReplaySummary,
    output: OutputFormat,
) -> Result<()> {
    let marked_alerts = AlertState::ALL
        .iter()
        .filter(|s| **s != AlertState::Unprocessed)
        .map(|s| (s.as_str(), marker.count(&[*s])))
        .collect();
    let report = ReplayReport {
        operations: summary.operations,
        by_operation: summary.by_operation,
        marked_alerts,
    };

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Replayed {} operation(s).", report.operations);
    println!("{:<24}  {:>8}", "OPERATION", "COUNT");
    for (op, count) in &report.by_operation {
        println!("{op:<24}  {count:>8}");
    }
    println!();
    println!("{:<24}  {:>8}", "STATE", "ALERTS");
    for (state, count) in &report.marked_alerts {
        println!("{state:<24}  {count:>8}");
    }
    Ok(())
}

// ── History / Events ────────────────────────────────────────────────────

pub fn cmd_history(
    config: &AgentConfig,
    fingerprint: &str,
    limit: usize,
    output: OutputFormat,
) -> Result<()> {
    let fingerprint: Fingerprint = fingerprint.parse()?;
    let store = startup::open_store(config)?;
    let events = store.history(fingerprint, limit)?;

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No state history for {fingerprint}.");
        return Ok(());
    }

    print_events(&events);
    println!("\n{} event(s) for {fingerprint}.", events.len());
    Ok(())
}

pub fn cmd_events(
    config: &AgentConfig,
    query: &StateEventQuery,
    output: OutputFormat,
) -> Result<()> {
    let store = startup::open_store(config)?;
    let events = store.query_events(query)?;

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No state events found.");
        return Ok(());
    }

    print_events(&events);
    println!(
        "\nShowing {} event(s) (offset={}).",
        events.len(),
        query.offset
    );
    Ok(())
}

fn print_events(events: &[StateEvent]) {
    println!(
        "{:<36}  {:<20}  {:<16}  {:<10}  {:<10}  {:<20}",
        "ID", "CREATED AT (NS)", "FINGERPRINT", "STATE", "REASON", "SUPPRESSED BY"
    );
    for event in events {
        println!(
            "{:<36}  {:<20}  {:<16}  {:<10}  {:<10}  {:<20}",
            event.id,
            event.created_at_ns,
            event.fingerprint,
            event.state.as_str(),
            event.suppressed_reason.map_or("-", |r| r.as_str()),
            event.suppressed_by.as_deref().unwrap_or("-"),
        );
    }
}

// ── Stats ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct StateStats {
    total: usize,
    by_state: BTreeMap<&'static str, usize>,
    by_reason: BTreeMap<&'static str, usize>,
}

fn tally(events: &[StateEvent]) -> StateStats {
    let mut stats = StateStats {
        total: events.len(),
        ..StateStats::default()
    };
    for event in events {
        *stats.by_state.entry(event.state.as_str()).or_default() += 1;
        if let Some(reason) = event.suppressed_reason {
            *stats.by_reason.entry(reason.as_str()).or_default() += 1;
        }
    }
    stats
}

pub fn cmd_stats(config: &AgentConfig, output: OutputFormat) -> Result<()> {
    let store = startup::open_store(config)?;
    let events = store.query_events(&StateEventQuery::default())?;
    let stats = tally(&events);

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("State store: {}", config.state_log.storage_path);
    println!("  Total events: {}", stats.total);
    for (state, count) in &stats.by_state {
        println!("  {state:<12} {count:>10}");
    }
    for (reason, count) in &stats.by_reason {
        println!("    {reason:<10} {count:>10}");
    }
    Ok(())
}

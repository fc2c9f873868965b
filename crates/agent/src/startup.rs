use std::path::Path;
use std::sync::Arc;

use adapters::audit::discard_state_appender::DiscardStateAppender;
use adapters::audit::log_state_appender::LogStateAppender;
use adapters::storage::redb_state_appender::RedbStateAppender;
use anyhow::{Context, bail};
use infrastructure::config::{AgentConfig, StateLogBackend};
use infrastructure::constants::DEFAULT_CONFIG_PATH;
use infrastructure::logging::init_logging;
use ports::secondary::metrics_port::StateLogMetrics;
use ports::secondary::state_appender::StateAppender;
use tracing::info;

use crate::cli::Cli;

/// Load the config and install logging.
///
/// An explicit `--config` must exist; the default path is optional.
pub fn init(cli: &Cli) -> anyhow::Result<AgentConfig> {
    let config = match &cli.config {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AgentConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))
            .with_context(|| format!("failed to load config {DEFAULT_CONFIG_PATH}"))?,
    };

    // CLI flags take precedence over config file
    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format)?;

    tracing::debug!(
        log_level = log_level.as_str(),
        log_format = log_format.as_str(),
        backend = config.state_log.backend.as_str(),
        "alerttrail starting"
    );

    Ok(config)
}

/// Build the state appender selected by the config.
pub fn build_appender(
    config: &AgentConfig,
    metrics: Arc<dyn StateLogMetrics>,
) -> anyhow::Result<Arc<dyn StateAppender>> {
    let state_log = &config.state_log;
    if !state_log.enabled {
        info!("state log disabled, transitions will not be persisted");
        return Ok(Arc::new(DiscardStateAppender));
    }

    match state_log.backend {
        StateLogBackend::Redb => {
            let appender = open_redb(config)?.with_metrics(metrics);
            info!(
                path = %state_log.storage_path,
                buffer_capacity = state_log.buffer_capacity,
                "state log initialized (redb)"
            );
            Ok(Arc::new(appender))
        }
        StateLogBackend::Log => {
            info!("state log initialized (log)");
            Ok(Arc::new(LogStateAppender))
        }
    }
}

/// Open the redb state store for queries.
pub fn open_store(config: &AgentConfig) -> anyhow::Result<RedbStateAppender> {
    if config.state_log.backend != StateLogBackend::Redb {
        bail!(
            "state log backend '{}' cannot be queried, only 'redb' can",
            config.state_log.backend
        );
    }
    open_redb(config)
}

fn open_redb(config: &AgentConfig) -> anyhow::Result<RedbStateAppender> {
    let path = Path::new(&config.state_log.storage_path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    RedbStateAppender::open(path, config.state_log.buffer_capacity)
        .with_context(|| format!("failed to open state store {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::alert::entity::AlertState;
    use domain::alert::fingerprint::Fingerprint;
    use ports::secondary::state_event_store::StateEventStore;
    use ports::test_utils::NoopMetrics;

    fn config_with(yaml: &str) -> AgentConfig {
        AgentConfig::from_yaml(yaml).unwrap()
    }

    #[test]
    fn redb_backend_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/states.redb");
        let config = config_with(&format!(
            "state_log:\n  storage_path: {}\n",
            path.display()
        ));

        let appender = build_appender(&config, Arc::new(NoopMetrics)).unwrap();
        appender.append(Fingerprint(1), AlertState::Active);
        appender.close().unwrap();
        assert!(path.exists());

        let store = open_store(&config).unwrap();
        assert_eq!(store.event_count().unwrap(), 1);
    }

    #[test]
    fn log_backend_cannot_be_queried() {
        let config = config_with("state_log:\n  backend: log\n");
        assert!(build_appender(&config, Arc::new(NoopMetrics)).is_ok());
        assert!(open_store(&config).is_err());
    }

    #[test]
    fn disabled_state_log_discards() {
        let config = config_with("state_log:\n  enabled: false\n");
        let appender = build_appender(&config, Arc::new(NoopMetrics)).unwrap();
        appender.append(Fingerprint(1), AlertState::Active);
        assert!(appender.flush().is_ok());
    }
}

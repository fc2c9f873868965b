pub mod alert_marker;
pub mod metrics_port;
pub mod state_appender;
pub mod state_event_store;

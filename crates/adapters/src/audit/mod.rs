pub mod discard_state_appender;
pub mod log_state_appender;

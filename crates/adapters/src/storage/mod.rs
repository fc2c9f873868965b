pub mod redb_state_appender;

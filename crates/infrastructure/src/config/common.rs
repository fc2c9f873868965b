//! Shared helpers and error types used across config modules.

// ── Config errors ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

// ── Shared serde defaults ──────────────────────────────────────────

pub(super) fn default_true() -> bool {
    true
}

// ── Validation helpers ─────────────────────────────────────────────

/// Enforce an inclusive range on a numeric config value.
pub(super) fn check_range(
    field: &str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            message: format!("value {value} outside allowed range {min}..={max}"),
        });
    }
    Ok(())
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{min_field} ({min}) exceeds {max_field} ({max})")]
    MinExceedsMax {
        min_field: &'static str,
        min: f64,
        max_field: &'static str,
        max: f64,
    },

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("unstable magnetism spring: omega {omega} * dt {dt} must stay below {limit}")]
    UnstableSpring { omega: f64, dt: f64, limit: f64 },

    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

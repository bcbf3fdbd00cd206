//! Error types
//!
//! The simulation itself has no recoverable failure modes; `SimError` only
//! reports broken invariants. Tuning and leaderboard files are the two places
//! real I/O happens.

/// Simulation invariant failures (programming defects, never player-facing)
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Internal state broke one of the engine's invariants
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Errors loading, saving or validating a [`crate::Tuning`] file
#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field is outside the range the simulation can work with
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors reading or writing the leaderboard
#[derive(thiserror::Error, Debug)]
pub enum HighScoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

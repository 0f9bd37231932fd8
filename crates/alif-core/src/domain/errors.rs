use thiserror::Error;

/// Error taxonomy at the scheduler boundary (spec §7).
///
/// `Consistency` cases (unknown lemma, function-word target) are handled
/// internally as silent skips and are not expected to surface through this
/// type in normal operation; it exists so callers that do reach an
/// inconsistent state get a named variant instead of a bare string.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("inconsistent request: {0}")]
    Consistency(String),

    #[error("memory store contention exhausted after {attempts} attempts")]
    Contention { attempts: u32 },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

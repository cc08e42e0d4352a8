//! Error types for the Bombe attack engine.

use thiserror::Error;

/// Errors surfaced at configuration/construction time.
///
/// These never occur mid-search: an [`crate::search::AttackConfig`] is
/// validated once before any worker is spawned, so every per-task
/// evaluation can assume its inputs are well-formed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnigmaError {
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("plugboard capacity error: {0}")]
    PlugboardCapacity(String),
}

/// Crate-wide result alias.
pub type EnigmaResult<T> = Result<T, EnigmaError>;

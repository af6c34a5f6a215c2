//! Error types for the shiftcal engine.

use thiserror::Error;

/// Errors that can occur in shiftcal operations.
#[derive(Error, Debug)]
pub enum ShiftcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar gateway error: {0}")]
    Gateway(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Migration failed during {stage}: {message}")]
    Migration { stage: MigrationStage, message: String },
}

/// Stage of a calendar migration, reported when one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStage {
    Purge,
    Reset,
    Resync,
}

impl std::fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationStage::Purge => write!(f, "purge"),
            MigrationStage::Reset => write!(f, "link reset"),
            MigrationStage::Resync => write!(f, "resync"),
        }
    }
}

/// Result type alias for shiftcal operations.
pub type ShiftcalResult<T> = Result<T, ShiftcalError>;

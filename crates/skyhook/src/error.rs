use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Target process exited")]
    ProcessLost,

    #[error("Module not loaded in target: {0}")]
    ModuleNotFound(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Invalid offset text: {0:?}")]
    OffsetParse(String),

    #[error("Invalid config value: {0}")]
    InvalidConfig(String),

    #[error("Waypoint file missing or unreadable: {0}")]
    WaypointsNotFound(String),

    #[error("Waypoint file has unexpected shape: {0}")]
    WaypointFormat(String),

    #[error("{} waypoint row(s) failed validation", .0.len())]
    WaypointValidation(Vec<RowError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error means the remote read touched unmapped or
    /// protected memory (an intermediate chain pointer went stale).
    pub fn is_access_violation(&self) -> bool {
        matches!(self, Error::MemoryReadFailed { .. })
    }
}

/// A single validation failure for one field of one waypoint row.
///
/// Collected across the whole list so a failed save can report every bad
/// cell at once instead of stopping at the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// Zero-based row index in display order.
    pub row: usize,
    /// Field name: "x", "y" or "z".
    pub field: &'static str,
    /// The offending text.
    pub value: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {} is not a finite float value: {:?}",
            self.row + 1,
            self.field,
            self.value
        )
    }
}

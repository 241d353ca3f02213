//! Error types for the slot monitor

/// Errors that can occur in the slot monitor
#[derive(Debug, thiserror::Error)]
pub enum SlotWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Page unreachable: {0}")]
    Communication(String),

    #[error("Target page lost: {0}")]
    TargetLost(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Monitor loop is not running")]
    EngineStopped,
}

/// Result type alias for slot monitor operations
pub type Result<T> = std::result::Result<T, SlotWatchError>;

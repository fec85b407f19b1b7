//! Error types for kiosk-browser

use thiserror::Error;

/// Fatal session pipeline errors. Observational page events (console
/// output, in-page errors, failed sub-resource requests) are logged and
/// never surface here.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("target acquisition failed: {0}")]
    TargetAcquisition(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser control error: {0}")]
    Control(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;

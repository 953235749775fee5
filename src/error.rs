//! Unified error types.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum MeterError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// WebSocket errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Workspace store errors.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Unknown display: {0}")]
    UnknownDisplay(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors raised inside the render boundary.
///
/// Never escape [`crate::render::render_frame`]; they are turned into an
/// on-canvas placeholder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),

    #[error("Degenerate price range [{low}, {high}]")]
    DegenerateRange { low: f64, high: f64 },

    #[error("Canvas too small: {width}x{height}")]
    CanvasTooSmall { width: f64, height: f64 },

    #[error("No drawable height: {height}px with {padding}px padding")]
    NoDrawableArea { height: f64, padding: f64 },

    #[error("Day range is {ratio}x ADR")]
    RangeExceedsAdr { ratio: f64 },
}

impl RenderError {
    /// Data errors show "No data available"; everything else is a system error.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            RenderError::MissingField(_)
                | RenderError::NonFinite(_)
                | RenderError::DegenerateRange { .. }
                | RenderError::RangeExceedsAdr { .. }
        )
    }
}

//! # fxmeter
//!
//! Client-side real-time market-data pipeline for FX day-range displays.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Symbols, pip metadata, price formatting, display records, workspace store
//! 2. **Render**: Pure `(record, config, canvas size) → draw commands` pipeline
//! 3. **WebSocket**: Connection state machine, transport-agnostic manager, `tokio-tungstenite` driver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fxmeter::prelude::*;
//! use futures_util::StreamExt;
//!
//! let mut client = WsClient::new(WsConfig::default());
//! client.subscribe("eurusd")?;
//! client.connect().await?;
//!
//! let mut renderer = DisplayRenderer::new(RenderConfig::default());
//! let size = CanvasSize::new(220.0, 120.0, 2.0);
//! let mut events = client.events();
//! while let Some(event) = events.next().await {
//!     if let WsEvent::Display { record, .. } = event {
//!         let frame = renderer.render(Some(&record), size, VisualizationType::DayRange);
//!         // replay frame.commands onto a 2D context
//!     }
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes and formatting used across all domains.
pub mod shared;

/// Domain modules: display records, workspace layout.
pub mod domain;

/// Unified error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Render ──────────────────────────────────────────────────────────

/// Draw-command renderer for the day range meter and market profile.
pub mod render;

// ── Layer 3: WebSocket ───────────────────────────────────────────────────────

/// WebSocket client: messages, subscriptions, connection state.
pub mod ws;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes + formatting
    pub use crate::shared::fmt::price::{format_price, format_price_parts, PriceParts};
    pub use crate::shared::{PipMetadata, Symbol};

    // Domain types: display
    pub use crate::domain::display::{
        DisplayDataProcessor, DisplayUpdate, SymbolDisplayRecord, TickUpdate, VolumeLevel,
    };

    // Domain types: workspace
    pub use crate::domain::workspace::{
        DisplayId, FileStorage, MemoryStorage, Position, Size, Storage, VisualizationType,
        Workspace, WorkspaceLayoutEntry,
    };

    // Render
    pub use crate::render::{
        render_frame, CanvasSize, DisplayRenderer, DrawCommand, Frame, PriceScale, RenderConfig,
    };

    // Errors
    pub use crate::error::{MeterError, RenderError, WorkspaceError, WsError};

    // Network
    pub use crate::network::DEFAULT_WS_URL;

    // WebSocket types
    pub use crate::ws::manager::{ConnectionManager, Directive, Transport, TransportEvent};
    pub use crate::ws::{ConnectionStatus, Kind, MessageOut, SubscriptionRegistry, WsConfig, WsEvent};

    #[cfg(feature = "ws-native")]
    pub use crate::ws::native::WsClient;
}

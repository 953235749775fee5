//! WebSocket layer: messages, subscriptions, connection state, events.
//!
//! [`manager::ConnectionManager`] holds all connection logic and is driven by
//! [`manager::TransportEvent`]s, so it runs the same against a real socket or
//! a test double. The `ws-native` feature adds [`native::WsClient`], which
//! drives a manager over `tokio-tungstenite` from a background task.

pub mod manager;
pub mod state;
pub mod subscriptions;

#[cfg(feature = "ws-native")]
pub mod native;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::display::wire::{SymbolDataPackage, TickData};
use crate::domain::display::{DisplayUpdate, SymbolDisplayRecord};
use crate::error::WsError;
use crate::shared::Symbol;

pub use state::{CloseOutcome, ConnectionState};
pub use subscriptions::{DisplayHandler, SubscriptionRegistry};

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum MessageOut {
    #[serde(rename = "get_symbol_data_package")]
    GetSymbolDataPackage {
        symbol: Symbol,
        #[serde(rename = "adrLookbackDays")]
        adr_lookback_days: u32,
    },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { symbol: Symbol },
}

impl MessageOut {
    pub fn to_json(&self) -> Result<String, WsError> {
        serde_json::to_string(self).map_err(|e| WsError::SendFailed(e.to_string()))
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// The type of inbound WebSocket message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Kind {
    #[serde(rename = "symbolDataPackage")]
    SymbolDataPackage(SymbolDataPackage),
    #[serde(rename = "tick")]
    Tick(TickData),
    #[serde(rename = "error")]
    Error(WsErrorPayload),
    /// Any message type this client does not consume.
    #[serde(other)]
    Unknown,
}

impl Kind {
    pub fn parse(text: &str) -> Result<Self, WsError> {
        serde_json::from_str(text).map_err(|e| WsError::DeserializationError(e.to_string()))
    }

    /// Symbol the message is about, for display messages.
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Kind::SymbolDataPackage(pkg) => Some(&pkg.symbol),
            Kind::Tick(tick) => Some(&tick.symbol),
            Kind::Error(_) | Kind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WsErrorPayload {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Connection status as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ConnectionStatus {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    /// Reconnection exhausted; only an explicit connect or restart leaves it.
    Error = 3,
}

impl From<u8> for ConnectionStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => ConnectionStatus::Connecting,
            2 => ConnectionStatus::Connected,
            3 => ConnectionStatus::Error,
            _ => ConnectionStatus::Disconnected,
        }
    }
}

impl From<ConnectionStatus> for u8 {
    fn from(status: ConnectionStatus) -> Self {
        status as u8
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// High-level events emitted to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    StatusChanged(ConnectionStatus),
    /// A reconnect is scheduled; `attempt` counts from 1.
    Reconnecting { attempt: u32, delay: Duration },
    /// Retries exhausted. Status is now [`ConnectionStatus::Error`].
    MaxReconnectReached,
    /// A display record changed. `record` is the state after `update`.
    Display {
        record: SymbolDisplayRecord,
        update: DisplayUpdate,
    },
    /// A protocol, server, or transport error. Never fatal on its own.
    Error(String),
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Configuration for the WS connection.
#[derive(Debug, Clone, PartialEq)]
pub struct WsConfig {
    pub url: String,
    /// Reconnect automatically after an unexpected close.
    pub reconnect: bool,
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay_ms: u64,
    /// Sent with every `get_symbol_data_package` request.
    pub adr_lookback_days: u32,
}

impl WsConfig {
    /// Backoff before the reconnect that follows `attempts` earlier ones:
    /// `base * 2^attempts`.
    pub fn reconnect_delay(&self, attempts: u32) -> Duration {
        state::backoff_delay(self.base_reconnect_delay_ms, attempts)
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            reconnect: true,
            max_reconnect_attempts: 5,
            base_reconnect_delay_ms: 1000,
            adr_lookback_days: crate::network::DEFAULT_ADR_LOOKBACK_DAYS,
        }
    }
}

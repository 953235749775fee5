/// Default market-data gateway WebSocket URL (local backend).
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws";

/// Default ADR lookback requested with every symbol data package.
pub const DEFAULT_ADR_LOOKBACK_DAYS: u32 = 14;

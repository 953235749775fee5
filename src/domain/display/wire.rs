//! Wire types for symbol data packages and ticks (WS).

use crate::shared::Symbol;
use serde::{Deserialize, Serialize};

/// Initial snapshot for one symbol, sent in reply to `get_symbol_data_package`.
///
/// Every numeric field is optional: a partial package still produces a record,
/// and the renderer decides whether there is enough to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolDataPackage {
    pub symbol: Symbol,
    #[serde(default)]
    pub digits: Option<u32>,
    #[serde(default)]
    pub adr: Option<f64>,
    #[serde(default)]
    pub todays_open: Option<f64>,
    #[serde(default)]
    pub todays_high: Option<f64>,
    #[serde(default)]
    pub todays_low: Option<f64>,
    #[serde(default)]
    pub projected_adr_high: Option<f64>,
    #[serde(default)]
    pub projected_adr_low: Option<f64>,
    #[serde(default)]
    pub initial_price: Option<f64>,
    #[serde(default)]
    pub pip_position: Option<i64>,
    #[serde(default)]
    pub pip_size: Option<f64>,
    #[serde(default)]
    pub pipette_size: Option<f64>,
    #[serde(default)]
    pub market_profile: Vec<WireVolumeLevel>,
}

/// One price level of an initial market profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVolumeLevel {
    pub price: f64,
    #[serde(default)]
    pub buy_volume: f64,
    #[serde(default)]
    pub sell_volume: f64,
}

/// Incremental price update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    pub symbol: Symbol,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    /// Unix timestamp in milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl TickData {
    /// Display price: bid, falling back to ask. Non-finite quotes are ignored.
    pub fn price(&self) -> Option<f64> {
        self.bid
            .filter(|p| p.is_finite())
            .or_else(|| self.ask.filter(|p| p.is_finite()))
    }
}

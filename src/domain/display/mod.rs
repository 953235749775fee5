//! Display domain: per-symbol OHLC, ADR bounds, pip metadata, volume profile.

pub mod convert;
pub mod state;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{PipMetadata, Symbol};

pub use state::DisplayDataProcessor;

/// Session prices in instrument units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub current: Option<f64>,
}

/// Projected average-daily-range bounds for the session.
///
/// Soft bounds: the day can and does trade beyond them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdrBounds {
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Raw ADR value as reported by the feed.
    pub value: Option<f64>,
}

impl AdrBounds {
    /// Full ADR in price units: the reported value, else the projected span.
    pub fn range(&self) -> Option<f64> {
        self.value
            .filter(|v| v.is_finite() && *v > 0.0)
            .or_else(|| match (self.high, self.low) {
                (Some(h), Some(l)) if h > l => Some(h - l),
                _ => None,
            })
    }
}

/// One price level of the volume profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeLevel {
    pub price: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
}

impl VolumeLevel {
    pub fn total(&self) -> f64 {
        self.buy_volume + self.sell_volume
    }
}

/// Normalized state for one open chart of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDisplayRecord {
    pub symbol: Symbol,
    pub pip: PipMetadata,
    /// Broker digits, informational only; formatting follows `pip`.
    pub digits: Option<u32>,
    pub ohlc: Ohlc,
    pub adr: AdrBounds,
    /// Sorted ascending by price.
    pub volume_profile: Vec<VolumeLevel>,
    pub last_tick: Option<DateTime<Utc>>,
}

impl SymbolDisplayRecord {
    pub fn new(symbol: Symbol, pip: PipMetadata) -> Self {
        Self {
            symbol,
            pip,
            digits: None,
            ohlc: Ohlc::default(),
            adr: AdrBounds::default(),
            volume_profile: Vec::new(),
            last_tick: None,
        }
    }

    /// Day's high-low spread, if both are known.
    pub fn day_range(&self) -> Option<f64> {
        match (self.ohlc.high, self.ohlc.low) {
            (Some(h), Some(l)) if h >= l => Some(h - l),
            _ => None,
        }
    }

    /// Day range as a multiple of ADR (`1.6` = the day has covered 160 % of ADR).
    pub fn day_range_ratio(&self) -> Option<f64> {
        let range = self.day_range()?;
        let adr = self.adr.range()?;
        Some(range / adr)
    }

    /// Highest-volume level of the profile.
    pub fn point_of_control(&self) -> Option<&VolumeLevel> {
        self.volume_profile
            .iter()
            .filter(|l| l.total() > 0.0)
            .fold(None, |best: Option<&VolumeLevel>, level| match best {
                Some(b) if b.total() >= level.total() => Some(b),
                _ => Some(level),
            })
    }

    pub fn max_volume(&self) -> f64 {
        self.point_of_control().map(VolumeLevel::total).unwrap_or(0.0)
    }

    /// Merge a tick price into the session, returning `(new_high, new_low)`.
    pub(crate) fn apply_price(&mut self, price: f64) -> (bool, bool) {
        let previous = self.ohlc.current;
        self.ohlc.current = Some(price);

        let new_high = self.ohlc.high.map_or(true, |h| price > h);
        if new_high {
            self.ohlc.high = Some(price);
        }
        let new_low = self.ohlc.low.map_or(true, |l| price < l);
        if new_low {
            self.ohlc.low = Some(price);
        }

        let is_buy = previous.map_or(true, |p| price >= p);
        self.add_tick_volume(price, is_buy);

        (new_high, new_low)
    }

    /// Add one unit of tick volume at `price`, bucketed to the pip size.
    fn add_tick_volume(&mut self, price: f64, is_buy: bool) {
        let step = self.pip.pip_size;
        let bucket = (price / step).round() * step;
        let half = step / 2.0;

        let idx = self
            .volume_profile
            .partition_point(|l| l.price < bucket - half);

        let exists = self
            .volume_profile
            .get(idx)
            .is_some_and(|l| (l.price - bucket).abs() < half);
        if !exists {
            self.volume_profile.insert(
                idx,
                VolumeLevel {
                    price: bucket,
                    buy_volume: 0.0,
                    sell_volume: 0.0,
                },
            );
        }

        let level = &mut self.volume_profile[idx];
        if is_buy {
            level.buy_volume += 1.0;
        } else {
            level.sell_volume += 1.0;
        }
    }
}

/// Result of merging a tick into an existing record.
#[derive(Debug, Clone, PartialEq)]
pub struct TickUpdate {
    pub symbol: Symbol,
    pub price: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub new_high: bool,
    pub new_low: bool,
}

/// What the processor produced for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUpdate {
    Snapshot(SymbolDisplayRecord),
    Tick(TickUpdate),
}

impl DisplayUpdate {
    pub fn symbol(&self) -> &Symbol {
        match self {
            DisplayUpdate::Snapshot(record) => &record.symbol,
            DisplayUpdate::Tick(tick) => &tick.symbol,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, DisplayUpdate::Snapshot(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SymbolDisplayRecord {
        let mut r = SymbolDisplayRecord::new(Symbol::from("EURUSD"), PipMetadata::new(4));
        r.ohlc = Ohlc {
            open: Some(1.0840),
            high: Some(1.0870),
            low: Some(1.0820),
            current: Some(1.0850),
        };
        r.adr = AdrBounds {
            high: Some(1.0880),
            low: Some(1.0800),
            value: None,
        };
        r
    }

    #[test]
    fn test_adr_range_prefers_reported_value() {
        let bounds = AdrBounds {
            high: Some(1.2),
            low: Some(1.0),
            value: Some(0.1),
        };
        assert_eq!(bounds.range(), Some(0.1));

        let bounds = AdrBounds { value: None, ..bounds };
        assert!((bounds.range().unwrap() - 0.2).abs() < 1e-12);

        assert_eq!(AdrBounds::default().range(), None);
    }

    #[test]
    fn test_day_range_ratio() {
        let r = record();
        let ratio = r.day_range_ratio().unwrap();
        assert!((ratio - 0.625).abs() < 1e-9);
    }

    #[test]
    fn test_apply_price_extends_high_and_low() {
        let mut r = record();
        assert_eq!(r.apply_price(1.0875), (true, false));
        assert_eq!(r.ohlc.high, Some(1.0875));
        assert_eq!(r.apply_price(1.0860), (false, false));
        assert_eq!(r.ohlc.high, Some(1.0875));
        assert_eq!(r.apply_price(1.0810), (false, true));
        assert_eq!(r.ohlc.low, Some(1.0810));
        assert_eq!(r.ohlc.current, Some(1.0810));
    }

    #[test]
    fn test_apply_price_initializes_missing_extremes() {
        let mut r = SymbolDisplayRecord::new(Symbol::from("EURUSD"), PipMetadata::new(4));
        assert_eq!(r.apply_price(1.1), (true, true));
        assert_eq!(r.ohlc.high, Some(1.1));
        assert_eq!(r.ohlc.low, Some(1.1));
    }

    #[test]
    fn test_tick_volume_buckets_by_pip() {
        let mut r = record();
        r.apply_price(1.08512);
        r.apply_price(1.08508);
        r.apply_price(1.08601);

        assert_eq!(r.volume_profile.len(), 2);
        let first = r.volume_profile[0];
        assert!((first.price - 1.0851).abs() < 1e-9);
        // 1.08512 is an uptick from 1.0850, 1.08508 a downtick.
        assert_eq!(first.buy_volume, 1.0);
        assert_eq!(first.sell_volume, 1.0);
        assert!(r.volume_profile[0].price < r.volume_profile[1].price);
    }

    #[test]
    fn test_point_of_control() {
        let mut r = record();
        assert!(r.point_of_control().is_none());
        r.volume_profile = vec![
            VolumeLevel { price: 1.0840, buy_volume: 3.0, sell_volume: 1.0 },
            VolumeLevel { price: 1.0841, buy_volume: 5.0, sell_volume: 4.0 },
            VolumeLevel { price: 1.0842, buy_volume: 1.0, sell_volume: 0.0 },
        ];
        let poc = r.point_of_control().unwrap();
        assert_eq!(poc.price, 1.0841);
        assert_eq!(r.max_volume(), 9.0);
    }
}

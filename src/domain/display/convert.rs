//! Wire → domain conversion for symbol data packages.

use super::wire::{SymbolDataPackage, WireVolumeLevel};
use super::{AdrBounds, Ohlc, SymbolDisplayRecord, VolumeLevel};
use crate::shared::PipMetadata;

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl From<&SymbolDataPackage> for SymbolDisplayRecord {
    fn from(pkg: &SymbolDataPackage) -> Self {
        let pip = PipMetadata::resolve(pkg.pip_position, pkg.pip_size, pkg.pipette_size);

        let open = finite(pkg.todays_open);
        let current = finite(pkg.initial_price);
        let mut high = finite(pkg.todays_high);
        let mut low = finite(pkg.todays_low);

        // The session extremes must contain the last traded price.
        if let Some(price) = current {
            high = Some(high.map_or(price, |h| h.max(price)));
            low = Some(low.map_or(price, |l| l.min(price)));
        }
        if let (Some(h), Some(l)) = (high, low) {
            if h < l {
                tracing::warn!("{}: todaysHigh {} below todaysLow {}, swapping", pkg.symbol, h, l);
                high = Some(l);
                low = Some(h);
            }
        }

        let value = finite(pkg.adr).filter(|v| *v > 0.0);
        let mut adr_high = finite(pkg.projected_adr_high);
        let mut adr_low = finite(pkg.projected_adr_low);
        if let (Some(v), Some(o)) = (value, open) {
            adr_high = adr_high.or(Some(o + v / 2.0));
            adr_low = adr_low.or(Some(o - v / 2.0));
        }

        let mut volume_profile: Vec<VolumeLevel> = pkg
            .market_profile
            .iter()
            .filter_map(VolumeLevel::from_wire)
            .collect();
        volume_profile.sort_by(|a, b| a.price.total_cmp(&b.price));

        Self {
            symbol: pkg.symbol.clone(),
            pip,
            digits: pkg.digits,
            ohlc: Ohlc {
                open,
                high,
                low,
                current,
            },
            adr: AdrBounds {
                high: adr_high,
                low: adr_low,
                value,
            },
            volume_profile,
            last_tick: None,
        }
    }
}

impl VolumeLevel {
    fn from_wire(level: &WireVolumeLevel) -> Option<Self> {
        let volume = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        level.price.is_finite().then(|| Self {
            price: level.price,
            buy_volume: volume(level.buy_volume),
            sell_volume: volume(level.sell_volume),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Symbol;

    fn package() -> SymbolDataPackage {
        SymbolDataPackage {
            symbol: Symbol::from("XAUUSD"),
            digits: Some(2),
            adr: Some(30.0),
            todays_open: Some(2450.0),
            todays_high: Some(2460.0),
            todays_low: Some(2440.0),
            projected_adr_high: None,
            projected_adr_low: None,
            initial_price: Some(2456.781),
            pip_position: Some(1),
            pip_size: Some(0.1),
            pipette_size: None,
            market_profile: Vec::new(),
        }
    }

    #[test]
    fn test_snapshot_preserves_pip_metadata() {
        let record = SymbolDisplayRecord::from(&package());
        assert_eq!(record.pip.pip_position, 1);
        assert_eq!(record.pip.pip_size, 0.1);
        assert!((record.pip.pipette_size - 0.01).abs() < 1e-12);
        assert_eq!(record.digits, Some(2));
    }

    #[test]
    fn test_snapshot_derives_adr_bounds_from_open() {
        let record = SymbolDisplayRecord::from(&package());
        assert_eq!(record.adr.high, Some(2465.0));
        assert_eq!(record.adr.low, Some(2435.0));
        assert_eq!(record.adr.value, Some(30.0));
    }

    #[test]
    fn test_snapshot_keeps_projected_bounds_when_present() {
        let pkg = SymbolDataPackage {
            projected_adr_high: Some(2470.0),
            projected_adr_low: Some(2430.0),
            ..package()
        };
        let record = SymbolDisplayRecord::from(&pkg);
        assert_eq!(record.adr.high, Some(2470.0));
        assert_eq!(record.adr.low, Some(2430.0));
    }

    #[test]
    fn test_snapshot_extends_extremes_to_initial_price() {
        let pkg = SymbolDataPackage {
            initial_price: Some(2462.5),
            ..package()
        };
        let record = SymbolDisplayRecord::from(&pkg);
        assert_eq!(record.ohlc.high, Some(2462.5));
        assert_eq!(record.ohlc.low, Some(2440.0));
    }

    #[test]
    fn test_snapshot_drops_non_finite_fields() {
        let pkg = SymbolDataPackage {
            todays_open: Some(f64::NAN),
            adr: Some(f64::INFINITY),
            initial_price: None,
            ..package()
        };
        let record = SymbolDisplayRecord::from(&pkg);
        assert_eq!(record.ohlc.open, None);
        assert_eq!(record.adr.value, None);
        assert_eq!(record.adr.high, None);
    }

    #[test]
    fn test_snapshot_sorts_profile_and_skips_bad_levels() {
        let pkg = SymbolDataPackage {
            market_profile: vec![
                WireVolumeLevel { price: 2452.0, buy_volume: 4.0, sell_volume: 1.0 },
                WireVolumeLevel { price: f64::NAN, buy_volume: 9.0, sell_volume: 9.0 },
                WireVolumeLevel { price: 2448.0, buy_volume: -2.0, sell_volume: 3.0 },
            ],
            ..package()
        };
        let record = SymbolDisplayRecord::from(&pkg);
        assert_eq!(record.volume_profile.len(), 2);
        assert_eq!(record.volume_profile[0].price, 2448.0);
        assert_eq!(record.volume_profile[0].buy_volume, 0.0);
        assert_eq!(record.volume_profile[1].price, 2452.0);
    }
}

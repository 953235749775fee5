//! Display state container: one record per subscribed symbol.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::wire::{SymbolDataPackage, TickData};
use super::{DisplayUpdate, SymbolDisplayRecord, TickUpdate};
use crate::shared::Symbol;
use crate::ws::Kind;

/// Normalizes inbound messages into per-symbol display records.
///
/// Snapshots replace the record for their symbol; ticks merge into an
/// existing record and are dropped when no snapshot has been seen.
#[derive(Debug, Clone, Default)]
pub struct DisplayDataProcessor {
    records: HashMap<Symbol, SymbolDisplayRecord>,
}

impl DisplayDataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound message. Returns `None` for messages that carry no
    /// display data or that target a symbol without a record.
    pub fn process(&mut self, kind: &Kind) -> Option<DisplayUpdate> {
        match kind {
            Kind::SymbolDataPackage(pkg) => Some(DisplayUpdate::Snapshot(self.apply_snapshot(pkg))),
            Kind::Tick(tick) => self.apply_tick(tick).map(DisplayUpdate::Tick),
            Kind::Error(_) | Kind::Unknown => None,
        }
    }

    /// Replace the record for the package's symbol.
    pub fn apply_snapshot(&mut self, pkg: &SymbolDataPackage) -> SymbolDisplayRecord {
        let record = SymbolDisplayRecord::from(pkg);
        tracing::debug!(
            "Snapshot {} (pip position {}, adr {:?})",
            record.symbol,
            record.pip.pip_position,
            record.adr.value
        );
        self.records.insert(record.symbol.clone(), record.clone());
        record
    }

    /// Merge a tick into the existing record for its symbol.
    pub fn apply_tick(&mut self, tick: &TickData) -> Option<TickUpdate> {
        let Some(record) = self.records.get_mut(&tick.symbol) else {
            tracing::trace!("Ignoring tick for {} (no display)", tick.symbol);
            return None;
        };
        let Some(price) = tick.price() else {
            tracing::debug!("Ignoring tick for {} without a usable quote", tick.symbol);
            return None;
        };

        let (new_high, new_low) = record.apply_price(price);
        let timestamp = tick.timestamp.and_then(DateTime::<Utc>::from_timestamp_millis);
        if timestamp.is_some() {
            record.last_tick = timestamp;
        }

        Some(TickUpdate {
            symbol: tick.symbol.clone(),
            price,
            timestamp,
            new_high,
            new_low,
        })
    }

    pub fn record(&self, symbol: &Symbol) -> Option<&SymbolDisplayRecord> {
        self.records.get(symbol)
    }

    pub fn remove(&mut self, symbol: &Symbol) -> Option<SymbolDisplayRecord> {
        self.records.remove(symbol)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.records.keys()
    }
}

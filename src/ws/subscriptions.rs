//! Subscription tracking, independent of any socket.

use std::collections::{btree_map, BTreeMap};

use crate::domain::display::{DisplayUpdate, SymbolDisplayRecord};
use crate::shared::Symbol;

use super::MessageOut;

/// Callback invoked with the updated record whenever a symbol's display changes.
pub type DisplayHandler = Box<dyn FnMut(&SymbolDisplayRecord, &DisplayUpdate) + Send>;

struct Entry {
    adr_lookback_days: u32,
    handler: Option<DisplayHandler>,
}

/// Active subscriptions, keyed by normalized symbol.
///
/// Survives reconnects: the full set is replayed on every open.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: BTreeMap<Symbol, Entry>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription, or update an existing one. A `None` handler
    /// keeps whatever handler the symbol already has. Returns `true` when the
    /// symbol was new.
    pub fn insert(
        &mut self,
        symbol: Symbol,
        adr_lookback_days: u32,
        handler: Option<DisplayHandler>,
    ) -> bool {
        match self.entries.entry(symbol) {
            btree_map::Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.adr_lookback_days = adr_lookback_days;
                if handler.is_some() {
                    entry.handler = handler;
                }
                false
            }
            btree_map::Entry::Vacant(vacant) => {
                vacant.insert(Entry {
                    adr_lookback_days,
                    handler,
                });
                true
            }
        }
    }

    pub fn remove(&mut self, symbol: &Symbol) -> bool {
        self.entries.remove(symbol).is_some()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribed symbols in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.keys()
    }

    /// Request message for one symbol, if subscribed.
    pub fn subscribe_message(&self, symbol: &Symbol) -> Option<MessageOut> {
        self.entries
            .get(symbol)
            .map(|entry| MessageOut::GetSymbolDataPackage {
                symbol: symbol.clone(),
                adr_lookback_days: entry.adr_lookback_days,
            })
    }

    /// Request messages for the whole set, as replayed on open.
    pub fn subscribe_messages(&self) -> Vec<MessageOut> {
        self.entries
            .iter()
            .map(|(symbol, entry)| MessageOut::GetSymbolDataPackage {
                symbol: symbol.clone(),
                adr_lookback_days: entry.adr_lookback_days,
            })
            .collect()
    }

    /// Invoke the symbol's handler, if it has one.
    pub fn notify(&mut self, record: &SymbolDisplayRecord, update: &DisplayUpdate) {
        if let Some(handler) = self
            .entries
            .get_mut(&record.symbol)
            .and_then(|entry| entry.handler.as_mut())
        {
            handler(record, update);
        }
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("symbols", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

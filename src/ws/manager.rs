//! Transport-agnostic connection manager.
//!
//! The manager owns the connection state machine, the subscription registry
//! and the display processor. It never blocks and never sleeps: a driver
//! feeds it [`TransportEvent`]s, honours the returned [`Directive`]s, and
//! drains the [`WsEvent`]s it queues.

use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::display::{DisplayDataProcessor, SymbolDisplayRecord};
use crate::error::WsError;
use crate::shared::Symbol;

use super::state::{CloseOutcome, ConnectionState};
use super::subscriptions::{DisplayHandler, SubscriptionRegistry};
use super::{ConnectionStatus, Kind, MessageOut, WsConfig, WsEvent};

/// The socket a manager drives.
pub trait Transport {
    /// Begin opening a connection. Completion is reported as
    /// [`TransportEvent::Opened`] or [`TransportEvent::Closed`].
    fn open(&mut self, url: &str) -> Result<(), WsError>;

    fn send(&mut self, text: String) -> Result<(), WsError>;

    /// Close the current connection, if any.
    fn close(&mut self);
}

/// What happened on the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    Closed { code: Option<u16>, reason: String },
    Error(String),
}

/// What the driver must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    None,
    /// Call [`ConnectionManager::reconnect`] once `delay` has elapsed.
    ReconnectAfter(Duration),
}

pub struct ConnectionManager<T: Transport> {
    config: WsConfig,
    transport: T,
    state: ConnectionState,
    subscriptions: SubscriptionRegistry,
    processor: DisplayDataProcessor,
    events: VecDeque<WsEvent>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(config: WsConfig, transport: T) -> Self {
        let state = ConnectionState::new(&config);
        Self {
            config,
            transport,
            state,
            subscriptions: SubscriptionRegistry::new(),
            processor: DisplayDataProcessor::new(),
            events: VecDeque::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.status()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.state.reconnect_attempts()
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    pub fn record(&self, symbol: &Symbol) -> Option<&SymbolDisplayRecord> {
        self.processor.record(symbol)
    }

    pub fn processor(&self) -> &DisplayDataProcessor {
        &self.processor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Take every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = WsEvent> + '_ {
        self.events.drain(..)
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Open the connection. No-op while connecting or connected.
    pub fn connect(&mut self) -> Directive {
        let before = self.status();
        if !self.state.begin_connect() {
            tracing::debug!("connect() ignored, already {}", before);
            return Directive::None;
        }
        self.emit_status_change(before);

        tracing::info!("Connecting to {}", self.config.url);
        match self.transport.open(&self.config.url) {
            Ok(()) => Directive::None,
            Err(e) => {
                tracing::warn!("Failed to open transport: {}", e);
                self.emit(WsEvent::Error(e.to_string()));
                self.handle_closed(None, e.to_string())
            }
        }
    }

    /// Scheduled reconnect. Skipped if the user disconnected or another
    /// connection started meanwhile.
    pub fn reconnect(&mut self) -> Directive {
        if !self.state.reconnect_pending() {
            tracing::debug!("Scheduled reconnect skipped ({})", self.status());
            return Directive::None;
        }
        tracing::info!(
            "Reconnect attempt {}/{}",
            self.state.reconnect_attempts(),
            self.config.max_reconnect_attempts
        );
        self.connect()
    }

    /// Close without reconnecting. Subscriptions are kept for the next connect.
    pub fn disconnect(&mut self) {
        let before = self.status();
        tracing::info!("Disconnect requested");
        self.state.request_disconnect();
        self.transport.close();
        self.emit_status_change(before);
    }

    /// Manual reconnect: drop the current connection, reset the retry budget
    /// and connect again.
    pub fn restart(&mut self) -> Directive {
        tracing::info!("Manual reconnection requested");
        let before = self.status();
        self.transport.close();
        self.state.reset();
        self.emit_status_change(before);
        self.connect()
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    /// Register interest in a symbol. The request goes out now if connected,
    /// otherwise on the next open.
    pub fn subscribe(&mut self, symbol: Symbol, handler: Option<DisplayHandler>) {
        if self
            .subscriptions
            .insert(symbol.clone(), self.config.adr_lookback_days, handler)
        {
            tracing::debug!("Subscribed {}", symbol);
        }
        if self.is_connected() {
            if let Some(msg) = self.subscriptions.subscribe_message(&symbol) {
                self.send_logged(&msg);
            }
        }
    }

    /// Drop a subscription and its record.
    pub fn unsubscribe(&mut self, symbol: &Symbol) -> bool {
        let removed = self.subscriptions.remove(symbol);
        self.processor.remove(symbol);
        if removed && self.is_connected() {
            let msg = MessageOut::Unsubscribe {
                symbol: symbol.clone(),
            };
            self.send_logged(&msg);
        }
        removed
    }

    /// Send a message on the open connection.
    pub fn send(&mut self, msg: &MessageOut) -> Result<(), WsError> {
        if !self.is_connected() {
            return Err(WsError::NotConnected);
        }
        let json = msg.to_json()?;
        self.transport.send(json)
    }

    // ─── Transport events ────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: TransportEvent) -> Directive {
        match event {
            TransportEvent::Opened => {
                self.handle_opened();
                Directive::None
            }
            TransportEvent::Text(text) => {
                self.handle_text(&text);
                Directive::None
            }
            TransportEvent::Closed { code, reason } => self.handle_closed(code, reason),
            TransportEvent::Error(message) => {
                tracing::warn!("WebSocket error: {}", message);
                self.emit(WsEvent::Error(message));
                Directive::None
            }
        }
    }

    fn handle_opened(&mut self) {
        let before = self.status();
        self.state.on_open();
        self.emit_status_change(before);
        tracing::info!("Connected to {}", self.config.url);

        let messages = self.subscriptions.subscribe_messages();
        if !messages.is_empty() {
            tracing::info!("Resubscribing to {} symbol(s)", messages.len());
        }
        for msg in &messages {
            self.send_logged(msg);
        }
    }

    fn handle_text(&mut self, text: &str) {
        let kind = match Kind::parse(text) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("{}, raw: {}", e, text);
                self.emit(WsEvent::Error(e.to_string()));
                return;
            }
        };

        match &kind {
            Kind::Error(payload) => {
                let err = WsError::Server(payload.message.clone());
                tracing::warn!("{}", err);
                self.emit(WsEvent::Error(err.to_string()));
                return;
            }
            Kind::Unknown => {
                tracing::debug!("Ignoring message: {}", text);
                return;
            }
            Kind::SymbolDataPackage(_) | Kind::Tick(_) => {}
        }

        let Some(symbol) = kind.symbol().cloned() else {
            return;
        };
        if !self.subscriptions.contains(&symbol) {
            tracing::trace!("Ignoring {} update without subscription", symbol);
            return;
        }

        let Some(update) = self.processor.process(&kind) else {
            return;
        };
        let Some(record) = self.processor.record(&symbol).cloned() else {
            return;
        };
        self.subscriptions.notify(&record, &update);
        self.emit(WsEvent::Display { record, update });
    }

    fn handle_closed(&mut self, code: Option<u16>, reason: String) -> Directive {
        let before = self.status();
        tracing::info!("Connection closed (code {:?}): {}", code, reason);

        let outcome = self.state.on_close();
        self.emit_status_change(before);

        match outcome {
            CloseOutcome::Stopped => Directive::None,
            CloseOutcome::Retry { attempt, delay } => {
                tracing::info!(
                    "Reconnect {}/{} in {}ms",
                    attempt,
                    self.config.max_reconnect_attempts,
                    delay.as_millis()
                );
                self.emit(WsEvent::Reconnecting { attempt, delay });
                Directive::ReconnectAfter(delay)
            }
            CloseOutcome::Exhausted => {
                tracing::warn!(
                    "Giving up after {} reconnect attempts",
                    self.config.max_reconnect_attempts
                );
                self.processor.clear();
                self.emit(WsEvent::MaxReconnectReached);
                Directive::None
            }
        }
    }

    // ─── Helpers ─────────────────────────────────────────────────────────

    fn send_logged(&mut self, msg: &MessageOut) {
        if let Err(e) = self.send(msg) {
            tracing::warn!("Send failed: {}", e);
        }
    }

    fn emit(&mut self, event: WsEvent) {
        self.events.push_back(event);
    }

    fn emit_status_change(&mut self, before: ConnectionStatus) {
        let now = self.status();
        if now != before {
            self.emit(WsEvent::StatusChanged(now));
        }
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("status", &self.status())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .field("subscriptions", &self.subscriptions)
            .field("transport", &self.transport)
            .finish()
    }
}

//! Native WebSocket client: `tokio-tungstenite`.
//!
//! A background tokio task owns a [`ConnectionManager`] and the socket. The
//! public [`WsClient`] talks to it over mpsc channels:
//! - commands flow in (connect, subscribe, disconnect, restart, shutdown)
//! - [`WsEvent`]s flow out, read through [`WsClient::events`]
//! - the current [`ConnectionStatus`] is mirrored into an atomic
//!
//! All reconnect and resubscribe decisions are the manager's; this module only
//! moves bytes and honours its [`Directive`]s.

use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::shared::Symbol;
use crate::ws::manager::{ConnectionManager, Directive, Transport, TransportEvent};
use crate::ws::{ConnectionStatus, DisplayHandler, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Transport handed to the manager ─────────────────────────────────────────

/// Records what the manager asked for; the task loop carries it out.
#[derive(Debug, Default)]
struct SocketTransport {
    pending_open: Option<String>,
    outbox: Vec<String>,
    close_requested: bool,
}

impl Transport for SocketTransport {
    fn open(&mut self, url: &str) -> Result<(), WsError> {
        self.outbox.clear();
        self.pending_open = Some(url.to_string());
        Ok(())
    }

    fn send(&mut self, text: String) -> Result<(), WsError> {
        self.outbox.push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.close_requested = true;
        self.pending_open = None;
        self.outbox.clear();
    }
}

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Connect,
    Subscribe(Symbol, Option<DisplayHandler>),
    Unsubscribe(Symbol),
    Disconnect,
    Restart,
    Shutdown,
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    manager: ConnectionManager<SocketTransport>,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    status: Arc<AtomicU8>,
    reconnect_at: Option<Instant>,
}

impl TaskState {
    /// Mirror the status and forward queued events. Drops events if the
    /// consumer falls `EVENT_CAPACITY` behind.
    fn publish(&mut self) {
        self.status
            .store(u8::from(self.manager.status()), Ordering::SeqCst);
        for event in self.manager.drain_events() {
            if let Err(mpsc::error::TrySendError::Full(event)) = self.event_tx.try_send(event) {
                tracing::debug!("Event channel full, dropping {:?}", event);
            }
        }
    }

    fn follow(&mut self, directive: Directive) {
        if let Directive::ReconnectAfter(delay) = directive {
            self.reconnect_at = Some(Instant::now() + delay);
        }
    }

    fn handle(&mut self, event: TransportEvent) {
        let directive = self.manager.handle_event(event);
        self.follow(directive);
    }

    /// Apply one command. Returns `false` when the task should exit.
    fn apply(&mut self, cmd: Option<Command>) -> bool {
        match cmd {
            Some(Command::Connect) => {
                self.reconnect_at = None;
                let directive = self.manager.connect();
                self.follow(directive);
            }
            Some(Command::Subscribe(symbol, handler)) => {
                self.manager.subscribe(symbol, handler);
            }
            Some(Command::Unsubscribe(symbol)) => {
                self.manager.unsubscribe(&symbol);
            }
            Some(Command::Disconnect) => {
                self.reconnect_at = None;
                self.manager.disconnect();
            }
            Some(Command::Restart) => {
                self.reconnect_at = None;
                let directive = self.manager.restart();
                self.follow(directive);
            }
            Some(Command::Shutdown) | None => {
                self.reconnect_at = None;
                self.manager.disconnect();
                return false;
            }
        }
        true
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// Native WebSocket client using `tokio-tungstenite`.
///
/// Commands issued before [`connect`](Self::connect) are buffered and applied
/// in order once the background task starts, so subscribing first and
/// connecting later is fine.
pub struct WsClient {
    config: WsConfig,
    cmd_tx: mpsc::Sender<Command>,
    cmd_rx: Option<mpsc::Receiver<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    event_tx: mpsc::Sender<WsEvent>,
    task_handle: Option<JoinHandle<()>>,
    status: Arc<AtomicU8>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        Self {
            config,
            cmd_tx,
            cmd_rx: Some(cmd_rx),
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            status: Arc::new(AtomicU8::new(ConnectionStatus::Disconnected.into())),
        }
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Connect to the server, spawning the background task on first use.
    ///
    /// Returns once the request is queued; watch [`events`](Self::events) for
    /// [`WsEvent::StatusChanged`].
    pub async fn connect(&mut self) -> Result<(), WsError> {
        self.spawn_task();
        self.command(Command::Connect).await
    }

    /// Close the connection without reconnecting. Subscriptions are kept and
    /// replayed on the next [`connect`](Self::connect).
    pub async fn disconnect(&self) -> Result<(), WsError> {
        self.command(Command::Disconnect).await
    }

    /// Force a fresh connection with a reset retry budget.
    pub async fn restart_connection(&mut self) -> Result<(), WsError> {
        if self.task_handle.is_none() {
            return self.connect().await;
        }
        self.command(Command::Restart).await
    }

    /// Stop the background task. Subscriptions and records are dropped; the
    /// client can be connected again afterwards.
    pub async fn shutdown(&mut self) -> Result<(), WsError> {
        let Some(handle) = self.task_handle.take() else {
            return Ok(());
        };
        let _ = self.cmd_tx.send(Command::Shutdown).await;
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
            tracing::warn!("WebSocket task did not stop within {:?}", SHUTDOWN_TIMEOUT);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        self.cmd_tx = cmd_tx;
        self.cmd_rx = Some(cmd_rx);
        self.status
            .store(ConnectionStatus::Disconnected.into(), Ordering::SeqCst);
        Ok(())
    }

    /// Subscribe to a symbol. Input is trimmed and uppercased; the normalized
    /// symbol is returned.
    pub fn subscribe(&self, symbol: &str) -> Result<Symbol, WsError> {
        let symbol = Symbol::parse(symbol)?;
        self.try_command(Command::Subscribe(symbol.clone(), None))?;
        Ok(symbol)
    }

    /// Subscribe and invoke `handler` on the task for every display update.
    pub fn subscribe_with_handler(
        &self,
        symbol: &str,
        handler: DisplayHandler,
    ) -> Result<Symbol, WsError> {
        let symbol = Symbol::parse(symbol)?;
        self.try_command(Command::Subscribe(symbol.clone(), Some(handler)))?;
        Ok(symbol)
    }

    pub fn unsubscribe(&self, symbol: &str) -> Result<(), WsError> {
        let symbol = Symbol::parse(symbol)?;
        self.try_command(Command::Unsubscribe(symbol))
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from(self.status.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Get a stream of events from the WebSocket connection.
    ///
    /// The returned stream borrows `self`, so it must be dropped
    /// before calling `connect()`, `restart_connection()` or `shutdown()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }

    fn spawn_task(&mut self) {
        if self.task_handle.is_some() {
            return;
        }
        let Some(cmd_rx) = self.cmd_rx.take() else {
            return;
        };

        let state = TaskState {
            manager: ConnectionManager::new(self.config.clone(), SocketTransport::default()),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            status: Arc::clone(&self.status),
            reconnect_at: None,
        };
        self.task_handle = Some(tokio::spawn(run_task(state)));
    }

    async fn command(&self, cmd: Command) -> Result<(), WsError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| WsError::NotConnected)
    }

    fn try_command(&self, cmd: Command) -> Result<(), WsError> {
        self.cmd_tx.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                WsError::SendFailed("Command channel full".into())
            }
            mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
        })
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for WsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsClient")
            .field("url", &self.config.url)
            .field("status", &self.status())
            .field("running", &self.task_handle.is_some())
            .finish()
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        state.publish();

        // No socket is open here, so any close request is already satisfied.
        let transport = state.manager.transport_mut();
        transport.close_requested = false;
        let pending = transport.pending_open.take();

        // ── 1. Open a requested connection ───────────────────────────────
        if let Some(url) = pending {
            match attempt_connect(&url).await {
                Ok(ws) => {
                    let (mut sink, stream) = ws.split();
                    state.handle(TransportEvent::Opened);
                    flush_outbox(&mut state, &mut sink).await;
                    state.publish();

                    if !run_connected(&mut state, sink, stream).await {
                        state.publish();
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!("WebSocket connection failed: {}", e);
                    state.handle(TransportEvent::Error(format!("Connection failed: {}", e)));
                    state.handle(TransportEvent::Closed {
                        code: None,
                        reason: e,
                    });
                }
            }
            continue;
        }

        // ── 2. Idle: wait for the reconnect deadline or a command ────────
        let cmd = match state.reconnect_at {
            Some(at) => {
                tokio::select! {
                    () = tokio::time::sleep_until(at) => {
                        state.reconnect_at = None;
                        let directive = state.manager.reconnect();
                        state.follow(directive);
                        continue;
                    }
                    cmd = state.cmd_rx.recv() => cmd,
                }
            }
            None => state.cmd_rx.recv().await,
        };

        if !state.apply(cmd) {
            state.publish();
            return;
        }
    }
}

/// The inner connected loop. Returns `false` if the task should exit.
async fn run_connected(
    state: &mut TaskState,
    mut sink: WsSink,
    mut stream: SplitStream<WsStream>,
) -> bool {
    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        state.handle(TransportEvent::Text(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        state.handle(TransportEvent::Closed { code: Some(code), reason });
                        return true;
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("WebSocket error: {}", reason);
                        state.handle(TransportEvent::Error(reason.clone()));
                        state.handle(TransportEvent::Closed { code: None, reason });
                        return true;
                    }
                    None => {
                        state.handle(TransportEvent::Closed {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                        return true;
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                if !state.apply(cmd) {
                    send_close(&mut sink).await;
                    return false;
                }
            }
        }

        flush_outbox(state, &mut sink).await;

        let (close_requested, reopening) = {
            let transport = state.manager.transport();
            (transport.close_requested, transport.pending_open.is_some())
        };
        if close_requested {
            send_close(&mut sink).await;
            // A restart already moved the manager on to the next connection.
            if !reopening {
                state.handle(TransportEvent::Closed {
                    code: Some(CloseCode::Normal.into()),
                    reason: "Client disconnect".into(),
                });
            }
            return true;
        }

        state.publish();
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Attempt to establish a WebSocket connection with a 30-second timeout.
async fn attempt_connect(url: &str) -> Result<WsStream, String> {
    let (ws_stream, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;
    Ok(ws_stream)
}

async fn flush_outbox(state: &mut TaskState, sink: &mut WsSink) {
    let outbox = std::mem::take(&mut state.manager.transport_mut().outbox);
    for text in outbox {
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            tracing::warn!("Send failed: {}", e);
        }
    }
}

async fn send_close(sink: &mut WsSink) {
    let _ = sink
        .send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "Client disconnect".into(),
        })))
        .await;
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

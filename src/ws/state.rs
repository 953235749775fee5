//! Connection state machine.
//!
//! ```text
//!              connect            open
//! Disconnected ───────► Connecting ─────► Connected
//!      ▲  ▲                  │                │
//!      │  └──── retry ◄──────┴──── close ◄────┘
//!      │                     │
//!      │  connect / reset    ▼ retries exhausted
//!      └────────────────── Error
//! ```
//!
//! Every close of an unrequested connection either schedules a retry or, once
//! `max_reconnect_attempts` retries have failed in a row, ends in `Error`.

use std::time::Duration;

use super::{ConnectionStatus, WsConfig};

/// What the manager should do after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Closed on request, reconnect disabled, or already terminal.
    Stopped,
    /// Reconnect after `delay`. `attempt` counts from 1.
    Retry { attempt: u32, delay: Duration },
    /// Retries exhausted.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct ConnectionState {
    status: ConnectionStatus,
    reconnect_attempts: u32,
    user_closed: bool,
    reconnect: bool,
    max_reconnect_attempts: u32,
    base_reconnect_delay_ms: u64,
}

impl ConnectionState {
    pub fn new(config: &WsConfig) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            reconnect_attempts: 0,
            user_closed: false,
            reconnect: config.reconnect,
            max_reconnect_attempts: config.max_reconnect_attempts,
            base_reconnect_delay_ms: config.base_reconnect_delay_ms,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Start a connection attempt. Returns `false` when one is already live.
    ///
    /// Leaving `Error` this way is the external-intervention path and starts
    /// a fresh retry budget.
    pub fn begin_connect(&mut self) -> bool {
        match self.status {
            ConnectionStatus::Connecting | ConnectionStatus::Connected => return false,
            ConnectionStatus::Error => {
                tracing::info!("Leaving error state, retry budget reset");
                self.reconnect_attempts = 0;
            }
            ConnectionStatus::Disconnected => {}
        }
        self.user_closed = false;
        self.status = ConnectionStatus::Connecting;
        true
    }

    pub fn on_open(&mut self) {
        self.status = ConnectionStatus::Connected;
        self.reconnect_attempts = 0;
    }

    pub fn on_close(&mut self) -> CloseOutcome {
        match self.status {
            ConnectionStatus::Error => return CloseOutcome::Stopped,
            ConnectionStatus::Disconnected if self.user_closed => return CloseOutcome::Stopped,
            _ => {}
        }

        if !self.reconnect {
            self.status = ConnectionStatus::Disconnected;
            return CloseOutcome::Stopped;
        }

        if self.reconnect_attempts < self.max_reconnect_attempts {
            let delay = backoff_delay(self.base_reconnect_delay_ms, self.reconnect_attempts);
            self.reconnect_attempts += 1;
            self.status = ConnectionStatus::Disconnected;
            CloseOutcome::Retry {
                attempt: self.reconnect_attempts,
                delay,
            }
        } else {
            self.status = ConnectionStatus::Error;
            CloseOutcome::Exhausted
        }
    }

    /// User-requested close: no reconnect follows.
    pub fn request_disconnect(&mut self) {
        self.user_closed = true;
        if self.status != ConnectionStatus::Error {
            self.status = ConnectionStatus::Disconnected;
        }
    }

    /// Forget all history, as for a manual restart.
    pub fn reset(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.reconnect_attempts = 0;
        self.user_closed = false;
    }

    /// Whether a scheduled reconnect should still go ahead.
    pub fn reconnect_pending(&self) -> bool {
        self.status == ConnectionStatus::Disconnected && !self.user_closed && self.reconnect_attempts > 0
    }
}

/// `base * 2^attempts`, saturating.
pub(crate) fn backoff_delay(base_ms: u64, attempts: u32) -> Duration {
    let factor = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConnectionState {
        ConnectionState::new(&WsConfig::default())
    }

    #[test]
    fn test_connect_is_idempotent_while_live() {
        let mut s = state();
        assert!(s.begin_connect());
        assert!(!s.begin_connect());
        s.on_open();
        assert!(!s.begin_connect());
        assert_eq!(s.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_backoff_doubles_then_exhausts() {
        let mut s = state();
        s.begin_connect();

        let mut delays = Vec::new();
        loop {
            match s.on_close() {
                CloseOutcome::Retry { attempt, delay } => {
                    assert_eq!(attempt as usize, delays.len() + 1);
                    delays.push(delay.as_millis());
                    assert!(s.begin_connect());
                }
                CloseOutcome::Exhausted => break,
                CloseOutcome::Stopped => panic!("unexpected stop"),
            }
        }
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
        assert_eq!(s.status(), ConnectionStatus::Error);
        assert_eq!(s.on_close(), CloseOutcome::Stopped);
    }

    #[test]
    fn test_open_resets_backoff() {
        let mut s = state();
        s.begin_connect();
        for _ in 0..2 {
            assert!(matches!(s.on_close(), CloseOutcome::Retry { .. }));
            s.begin_connect();
            s.on_open();
        }
        assert_eq!(
            s.on_close(),
            CloseOutcome::Retry {
                attempt: 1,
                delay: Duration::from_millis(1000)
            }
        );
    }

    #[test]
    fn test_user_disconnect_stops_reconnect() {
        let mut s = state();
        s.begin_connect();
        s.on_open();
        s.request_disconnect();
        assert_eq!(s.on_close(), CloseOutcome::Stopped);
        assert_eq!(s.status(), ConnectionStatus::Disconnected);
        assert!(!s.reconnect_pending());
    }

    #[test]
    fn test_connect_from_error_resets_attempts() {
        let config = WsConfig {
            max_reconnect_attempts: 1,
            ..WsConfig::default()
        };
        let mut s = ConnectionState::new(&config);
        s.begin_connect();
        assert!(matches!(s.on_close(), CloseOutcome::Retry { .. }));
        s.begin_connect();
        assert_eq!(s.on_close(), CloseOutcome::Exhausted);

        assert!(s.begin_connect());
        assert_eq!(s.reconnect_attempts(), 0);
        assert!(matches!(s.on_close(), CloseOutcome::Retry { attempt: 1, .. }));
    }

    #[test]
    fn test_reconnect_disabled() {
        let config = WsConfig {
            reconnect: false,
            ..WsConfig::default()
        };
        let mut s = ConnectionState::new(&config);
        s.begin_connect();
        assert_eq!(s.on_close(), CloseOutcome::Stopped);
        assert_eq!(s.status(), ConnectionStatus::Disconnected);
    }
}

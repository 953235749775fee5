//! Shared newtypes and utilities used across all domain modules.
//!
//! These types are serialization-transparent: they serialize/deserialize identically
//! to the raw format the gateway sends, so they can be used directly in wire types
//! without conversion overhead.

pub mod fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::error::WsError;

// ─── Symbol ──────────────────────────────────────────────────────────────────

/// Instrument ticker (e.g. `"EURUSD"`, `"XAUUSD"`).
///
/// Symbols are case-sensitive uppercase on the wire; construction trims and
/// uppercases, so `"eurusd "` and `"EURUSD"` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize and validate user input.
    ///
    /// Accepts ASCII letters, digits and `.`, `_`, `-`, `/`.
    pub fn parse(s: &str) -> Result<Self, WsError> {
        let normalized = normalize(s);
        let valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'));
        if valid {
            Ok(Self(normalized))
        } else {
            Err(WsError::InvalidSymbol(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(normalize(s))
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(normalize(&s))
    }
}

impl FromStr for Symbol {
    type Err = WsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::parse(s)
    }
}

impl Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Symbol::from(s))
    }
}

// ─── PipMetadata ─────────────────────────────────────────────────────────────

/// Instrument precision: where the pip digit sits and the increment sizes.
///
/// `pip_position` counts the decimal digits before the pip digit, so EURUSD
/// (pip = 0.0001) has 4 and USDJPY (pip = 0.01) has 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipMetadata {
    pub pip_position: u32,
    pub pip_size: f64,
    pub pipette_size: f64,
}

impl PipMetadata {
    /// FX-style default used when the feed supplies no precision at all.
    pub const DEFAULT_PIP_POSITION: u32 = 4;
    /// Upper bound keeps formatted output inside `Decimal`'s 28-digit scale.
    pub const MAX_PIP_POSITION: u32 = 10;

    /// Metadata derived from the pip position alone.
    pub fn new(pip_position: u32) -> Self {
        let pip_position = pip_position.min(Self::MAX_PIP_POSITION);
        let pip_size = 10f64.powi(-(pip_position as i32));
        Self {
            pip_position,
            pip_size,
            pipette_size: pip_size / 10.0,
        }
    }

    /// Resolve metadata from whatever subset of fields the feed supplied.
    ///
    /// Precedence: explicit `pip_position`, then `pip_size`, then the FX default.
    /// Explicit sizes always override the derived ones.
    pub fn resolve(
        pip_position: Option<i64>,
        pip_size: Option<f64>,
        pipette_size: Option<f64>,
    ) -> Self {
        let valid_size = |v: Option<f64>| v.filter(|s| s.is_finite() && *s > 0.0);
        let pip_size = valid_size(pip_size);
        let pipette_size = valid_size(pipette_size);

        let position = match pip_position {
            Some(p) if p >= 0 => Some((p as u64).min(Self::MAX_PIP_POSITION as u64) as u32),
            Some(p) => {
                tracing::warn!("Ignoring negative pipPosition {}", p);
                None
            }
            None => None,
        };

        let position = position
            .or_else(|| pip_size.and_then(position_from_size))
            .unwrap_or(Self::DEFAULT_PIP_POSITION);

        let mut meta = Self::new(position);
        if let Some(size) = pip_size {
            meta.pip_size = size;
            meta.pipette_size = size / 10.0;
        }
        if let Some(size) = pipette_size {
            meta.pipette_size = size;
        }
        meta
    }

    /// Decimal digits shown for a price: one past the pip digit (the pipette).
    pub fn display_digits(&self) -> u32 {
        self.pip_position + 1
    }

    /// Convert a price distance into pips.
    pub fn to_pips(&self, delta: f64) -> f64 {
        delta / self.pip_size
    }
}

impl Default for PipMetadata {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PIP_POSITION)
    }
}

fn position_from_size(size: f64) -> Option<u32> {
    let p = (-size.log10()).round();
    if (0.0..=PipMetadata::MAX_PIP_POSITION as f64).contains(&p) {
        Some(p as u32)
    } else {
        None
    }
}

//! Workspace domain: floating display layout and its persistence.

pub mod state;
pub mod storage;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::render::CanvasSize;
use crate::shared::Symbol;

pub use state::Workspace;
pub use storage::{FileStorage, MemoryStorage, Storage};

// ─── DisplayId ───────────────────────────────────────────────────────────────

/// Stable identifier of one floating display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayId(Uuid);

impl DisplayId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DisplayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DisplayId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Serialize for DisplayId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DisplayId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Uuid::deserialize(deserializer).map(Self)
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────────

/// Top-left corner in CSS pixels, relative to the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Display size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const MIN: Size = Size {
        width: 120.0,
        height: 80.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp to [`Size::MIN`]; non-finite components fall back to the minimum.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64, min: f64| if v.is_finite() { v.max(min) } else { min };
        Self {
            width: clamp(self.width, Self::MIN.width),
            height: clamp(self.height, Self::MIN.height),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 220.0,
            height: 120.0,
        }
    }
}

// ─── Layout entry ────────────────────────────────────────────────────────────

/// What a display draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualizationType {
    #[default]
    DayRange,
    MarketProfile,
}

/// One persisted floating display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceLayoutEntry {
    pub id: DisplayId,
    pub position: Position,
    pub size: Size,
    pub symbol: Symbol,
    pub visualization: VisualizationType,
    pub z_index: u32,
}

impl WorkspaceLayoutEntry {
    /// Canvas dimensions for this display at the given device-pixel ratio.
    pub fn canvas_size(&self, dpr: f64) -> CanvasSize {
        CanvasSize::new(self.size.width, self.size.height, dpr)
    }
}

//! Render layer: `(record, config, canvas) → draw commands`.
//!
//! Rendering is a pure function of its inputs. A [`Frame`] is a complete
//! immediate-mode redraw: it always starts with `Setup` and `Clear`, and a
//! host replays the commands onto whatever 2D surface it owns.
//!
//! Draw order: background, axis and ADR boundaries, percentage markers,
//! price markers, then volume-profile bars.

pub mod canvas;
pub mod day_range;
pub mod market_profile;
pub mod scale;

use serde::{Deserialize, Serialize};

use crate::domain::display::SymbolDisplayRecord;
use crate::domain::workspace::VisualizationType;
use crate::error::RenderError;
use crate::shared::fmt::price::PriceParts;

pub use canvas::CanvasSize;
pub use scale::{
    disclosure_level, percentage_markers, PriceScale, ProgressiveDisclosure, MAX_ADR_MULTIPLE,
};

pub const NO_DATA_TEXT: &str = "No data available";
pub const SYSTEM_ERROR_TEXT: &str = "System error";

// ─── Draw commands ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One 2D-context operation, in CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    /// Size the backing store and scale the context by `scale`.
    Setup {
        backing_width: u32,
        backing_height: u32,
        scale: f64,
    },
    Clear {
        width: f64,
        height: f64,
    },
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: String,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: String,
        dashed: bool,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        color: String,
        align: TextAlign,
    },
    /// A price drawn in three runs, the middle one at `emphasis_size`.
    PriceText {
        x: f64,
        y: f64,
        parts: PriceParts,
        size: f64,
        emphasis_size: f64,
        color: String,
        align: TextAlign,
    },
}

impl DrawCommand {
    /// Every coordinate and extent the command carries.
    pub fn coordinates(&self) -> Vec<f64> {
        match self {
            DrawCommand::Setup { scale, .. } => vec![*scale],
            DrawCommand::Clear { width, height } => vec![*width, *height],
            DrawCommand::FillRect { x, y, width, height, .. } => vec![*x, *y, *width, *height],
            DrawCommand::Line { x1, y1, x2, y2, width, .. } => vec![*x1, *y1, *x2, *y2, *width],
            DrawCommand::Text { x, y, size, .. } => vec![*x, *y, *size],
            DrawCommand::PriceText { x, y, size, emphasis_size, .. } => {
                vec![*x, *y, *size, *emphasis_size]
            }
        }
    }
}

/// A full redraw of one display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    fn begin(size: &CanvasSize, config: &RenderConfig) -> Self {
        Self {
            commands: vec![
                DrawCommand::Setup {
                    backing_width: size.backing_width(),
                    backing_height: size.backing_height(),
                    scale: size.dpr,
                },
                DrawCommand::Clear {
                    width: size.width,
                    height: size.height,
                },
                DrawCommand::FillRect {
                    x: 0.0,
                    y: 0.0,
                    width: size.width,
                    height: size.height,
                    color: config.background.clone(),
                },
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    /// All plain text runs, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// The placeholder message, when the frame is one.
    pub fn placeholder(&self) -> Option<&str> {
        self.texts()
            .find(|t| *t == NO_DATA_TEXT || *t == SYSTEM_ERROR_TEXT)
    }

    /// Whether every coordinate in the frame is finite.
    pub fn is_finite(&self) -> bool {
        self.commands
            .iter()
            .all(|c| c.coordinates().iter().all(|v| v.is_finite()))
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Visual parameters shared by every display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Vertical padding above and below the price range, CSS px.
    pub padding: f64,
    /// Extra price range added on each side, as a fraction of the span.
    pub adr_buffer_ratio: f64,
    /// Price axis x position as a fraction of the canvas width.
    pub axis_position: f64,
    /// Progressive-disclosure increment, as a fraction of ADR.
    pub disclosure_step: f64,
    pub line_width: f64,
    pub font_size: f64,
    pub price_font_size: f64,
    pub emphasis_font_size: f64,
    pub background: String,
    pub axis_color: String,
    pub adr_color: String,
    pub marker_color: String,
    pub open_color: String,
    pub high_color: String,
    pub low_color: String,
    pub price_color: String,
    pub buy_color: String,
    pub sell_color: String,
    pub poc_color: String,
    pub text_color: String,
    pub show_stats: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            padding: 8.0,
            adr_buffer_ratio: 0.10,
            axis_position: 0.65,
            disclosure_step: 0.25,
            line_width: 1.0,
            font_size: 10.0,
            price_font_size: 11.0,
            emphasis_font_size: 14.0,
            background: "#0d1117".into(),
            axis_color: "#4b5563".into(),
            adr_color: "#3b82f6".into(),
            marker_color: "#374151".into(),
            open_color: "#9ca3af".into(),
            high_color: "#22c55e".into(),
            low_color: "#ef4444".into(),
            price_color: "#f3f4f6".into(),
            buy_color: "#1d4ed8".into(),
            sell_color: "#b91c1c".into(),
            poc_color: "#facc15".into(),
            text_color: "#9ca3af".into(),
            show_stats: true,
        }
    }
}

impl RenderConfig {
    /// Price axis x for a canvas, in CSS px.
    pub fn axis_x(&self, size: &CanvasSize) -> f64 {
        size.crisp(size.width * self.axis_position.clamp(0.0, 1.0))
    }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Render one display frame.
///
/// Never fails: missing or inconsistent data yields a "No data available"
/// frame and any other [`RenderError`] a "System error" frame.
pub fn render_frame(
    record: &SymbolDisplayRecord,
    config: &RenderConfig,
    size: CanvasSize,
    visualization: VisualizationType,
    disclosure_level: f64,
) -> Frame {
    let mut frame = Frame::begin(&size, config);

    match draw_body(record, config, &size, visualization, disclosure_level) {
        Ok(body) => frame.commands.extend(body),
        Err(e) => {
            let text = if e.is_data_error() {
                tracing::debug!("{}: {}", record.symbol, e);
                NO_DATA_TEXT
            } else {
                tracing::warn!("{}: render failed: {}", record.symbol, e);
                SYSTEM_ERROR_TEXT
            };
            frame.commands.push(placeholder(text, config, &size));
        }
    }

    frame
}

/// Frame for a display that has no record yet.
pub fn render_placeholder(config: &RenderConfig, size: CanvasSize) -> Frame {
    let mut frame = Frame::begin(&size, config);
    frame.commands.push(placeholder(NO_DATA_TEXT, config, &size));
    frame
}

fn placeholder(text: &str, config: &RenderConfig, size: &CanvasSize) -> DrawCommand {
    DrawCommand::Text {
        x: size.width / 2.0,
        y: size.height / 2.0,
        text: text.to_string(),
        size: config.font_size,
        color: config.text_color.clone(),
        align: TextAlign::Center,
    }
}

fn draw_body(
    record: &SymbolDisplayRecord,
    config: &RenderConfig,
    size: &CanvasSize,
    visualization: VisualizationType,
    disclosure_level: f64,
) -> Result<Vec<DrawCommand>, RenderError> {
    if size.width < 1.0 || size.height < 1.0 {
        return Err(RenderError::CanvasTooSmall {
            width: size.width,
            height: size.height,
        });
    }

    // Open may be absent: markers then anchor on the ADR midpoint.
    record.ohlc.current.ok_or(RenderError::MissingField("current"))?;
    record.ohlc.high.ok_or(RenderError::MissingField("todaysHigh"))?;
    record.ohlc.low.ok_or(RenderError::MissingField("todaysLow"))?;
    if let Some(ratio) = record.day_range_ratio().filter(|r| *r > MAX_ADR_MULTIPLE) {
        return Err(RenderError::RangeExceedsAdr { ratio });
    }

    let scale = PriceScale::for_record(record, config, size.height, disclosure_level)?;
    let axis_x = config.axis_x(size);

    let mut out = Vec::new();
    day_range::draw(&mut out, record, config, size, &scale, axis_x, disclosure_level)?;
    if visualization == VisualizationType::MarketProfile {
        market_profile::draw(&mut out, record, config, size, &scale, axis_x)?;
    }
    Ok(out)
}

// ─── DisplayRenderer ─────────────────────────────────────────────────────────

/// Renderer for one display. Owns the display's disclosure level, which only
/// grows while the display shows the same session.
#[derive(Debug, Clone)]
pub struct DisplayRenderer {
    config: RenderConfig,
    disclosure: ProgressiveDisclosure,
}

impl DisplayRenderer {
    pub fn new(config: RenderConfig) -> Self {
        let disclosure = ProgressiveDisclosure::new(config.disclosure_step);
        Self { config, disclosure }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn disclosure_level(&self) -> f64 {
        self.disclosure.level()
    }

    pub fn render(
        &mut self,
        record: Option<&SymbolDisplayRecord>,
        size: CanvasSize,
        visualization: VisualizationType,
    ) -> Frame {
        let Some(record) = record else {
            return render_placeholder(&self.config, size);
        };
        let level = self.disclosure.observe(record.day_range_ratio());
        render_frame(record, &self.config, size, visualization, level)
    }

    /// Forget the disclosure history, e.g. after a new snapshot or symbol change.
    pub fn reset(&mut self) {
        self.disclosure.reset();
    }
}

impl Default for DisplayRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

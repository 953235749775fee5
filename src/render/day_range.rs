//! Day-range meter: price axis, ADR boundaries, percentage markers and the
//! open/high/low/current price markers.

use crate::domain::display::SymbolDisplayRecord;
use crate::error::RenderError;
use crate::shared::fmt::num::pips_between;
use crate::shared::fmt::price::{format_price, format_price_parts};

use super::scale::{anchor_price, percentage_markers};
use super::{CanvasSize, DrawCommand, PriceScale, RenderConfig, TextAlign};

const MARKER_HALF_WIDTH: f64 = 6.0;
const PRICE_HALF_WIDTH: f64 = 14.0;
const CURRENT_HALF_WIDTH: f64 = 22.0;
const LABEL_GAP: f64 = 4.0;

pub(crate) fn draw(
    out: &mut Vec<DrawCommand>,
    record: &SymbolDisplayRecord,
    config: &RenderConfig,
    size: &CanvasSize,
    scale: &PriceScale,
    axis_x: f64,
    disclosure_level: f64,
) -> Result<(), RenderError> {
    let adr = record.adr.range().ok_or(RenderError::MissingField("adr"))?;
    let y_of = |price: f64| size.crisp(scale.price_to_y(price));

    // ── Axis ─────────────────────────────────────────────────────────────
    out.push(line(
        axis_x,
        config.padding,
        axis_x,
        size.height - config.padding,
        config.line_width,
        &config.axis_color,
        false,
    ));

    // ── ADR boundaries ───────────────────────────────────────────────────
    for price in [record.adr.high, record.adr.low].into_iter().flatten() {
        let y = y_of(price);
        out.push(line(0.0, y, size.width, y, config.line_width, &config.adr_color, true));
        out.push(DrawCommand::Text {
            x: LABEL_GAP,
            y: y - LABEL_GAP,
            text: format_price(price, &record.pip),
            size: config.font_size,
            color: config.adr_color.clone(),
            align: TextAlign::Left,
        });
    }

    // ── Percentage markers ───────────────────────────────────────────────
    if let Some(anchor) = anchor_price(record) {
        for pct in percentage_markers(disclosure_level, config.disclosure_step) {
            let offset = pct / 100.0 * adr / 2.0;
            for price in [anchor + offset, anchor - offset] {
                let y = y_of(price);
                out.push(line(
                    axis_x - MARKER_HALF_WIDTH,
                    y,
                    axis_x + MARKER_HALF_WIDTH,
                    y,
                    config.line_width,
                    &config.marker_color,
                    false,
                ));
                out.push(DrawCommand::Text {
                    x: axis_x + MARKER_HALF_WIDTH + LABEL_GAP,
                    y,
                    text: format!("{pct:.0}%"),
                    size: config.font_size,
                    color: config.text_color.clone(),
                    align: TextAlign::Left,
                });
            }
        }
    }

    // ── Price markers ────────────────────────────────────────────────────
    let markers = [
        (record.ohlc.open, &config.open_color),
        (record.ohlc.high, &config.high_color),
        (record.ohlc.low, &config.low_color),
    ];
    for (price, color) in markers {
        let Some(price) = price else { continue };
        let y = y_of(price);
        out.push(line(
            axis_x - PRICE_HALF_WIDTH,
            y,
            axis_x + PRICE_HALF_WIDTH,
            y,
            config.line_width,
            color,
            false,
        ));
        out.push(DrawCommand::Text {
            x: axis_x - PRICE_HALF_WIDTH - LABEL_GAP,
            y,
            text: format_price(price, &record.pip),
            size: config.font_size,
            color: color.clone(),
            align: TextAlign::Right,
        });
    }

    if let Some(current) = record.ohlc.current {
        let y = y_of(current);
        out.push(line(
            axis_x - CURRENT_HALF_WIDTH,
            y,
            axis_x + CURRENT_HALF_WIDTH,
            y,
            config.line_width * 2.0,
            &config.price_color,
            false,
        ));
        out.push(DrawCommand::PriceText {
            x: axis_x - CURRENT_HALF_WIDTH - LABEL_GAP,
            y,
            parts: format_price_parts(current, &record.pip),
            size: config.price_font_size,
            emphasis_size: config.emphasis_font_size,
            color: config.price_color.clone(),
            align: TextAlign::Right,
        });
    }

    // ── Stats ────────────────────────────────────────────────────────────
    if config.show_stats {
        let mut stats = record.symbol.to_string();
        if let (Some(high), Some(low)) = (record.ohlc.high, record.ohlc.low) {
            stats.push_str(&format!(" {}p", pips_between(high, low, &record.pip)));
        }
        if let Some(ratio) = record.day_range_ratio() {
            stats.push_str(&format!(" {:.0}% ADR", ratio * 100.0));
        }
        out.push(DrawCommand::Text {
            x: LABEL_GAP,
            y: config.padding + config.font_size,
            text: stats,
            size: config.font_size,
            color: config.text_color.clone(),
            align: TextAlign::Left,
        });
    }

    Ok(())
}

pub(crate) fn line(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    width: f64,
    color: &str,
    dashed: bool,
) -> DrawCommand {
    DrawCommand::Line {
        x1,
        y1,
        x2,
        y2,
        width,
        color: color.to_string(),
        dashed,
    }
}

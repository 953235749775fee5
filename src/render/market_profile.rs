//! Volume-profile overlay.
//!
//! Bars share the host display's axis and [`PriceScale`]: they start at the
//! host axis x and grow rightward, the widest bar ending on the canvas edge.

use crate::domain::display::SymbolDisplayRecord;
use crate::error::RenderError;
use crate::shared::fmt::num::abbr_volume;

use super::{CanvasSize, DrawCommand, PriceScale, RenderConfig, TextAlign};

pub(crate) fn draw(
    out: &mut Vec<DrawCommand>,
    record: &SymbolDisplayRecord,
    config: &RenderConfig,
    size: &CanvasSize,
    scale: &PriceScale,
    axis_x: f64,
) -> Result<(), RenderError> {
    let max_volume = record.max_volume();
    if record.volume_profile.is_empty() || max_volume <= 0.0 {
        return Ok(());
    }

    let available = size.width - axis_x;
    if available <= 0.0 {
        return Err(RenderError::CanvasTooSmall {
            width: size.width,
            height: size.height,
        });
    }

    let half_pip = record.pip.pip_size / 2.0;
    let poc_price = record.point_of_control().map(|l| l.price);

    for level in &record.volume_profile {
        let total = level.total();
        if total <= 0.0 || !scale.contains(level.price) {
            continue;
        }

        let top = scale.price_to_y(level.price + half_pip);
        let bottom = scale.price_to_y(level.price - half_pip);
        let height = (bottom - top).max(1.0);
        let y = (top + bottom) / 2.0 - height / 2.0;
        let width = total / max_volume * available;

        if poc_price == Some(level.price) {
            out.push(rect(axis_x, y, width, height, &config.poc_color));
            continue;
        }

        let buy_width = level.buy_volume / total * width;
        if buy_width > 0.0 {
            out.push(rect(axis_x, y, buy_width, height, &config.buy_color));
        }
        if width - buy_width > 0.0 {
            out.push(rect(axis_x + buy_width, y, width - buy_width, height, &config.sell_color));
        }
    }

    if let Some(poc) = record.point_of_control().filter(|l| scale.contains(l.price)) {
        out.push(DrawCommand::Text {
            x: size.width - 2.0,
            y: size.crisp(scale.price_to_y(poc.price)) - config.font_size / 2.0,
            text: format!("POC {}", abbr_volume(poc.total())),
            size: config.font_size,
            color: config.poc_color.clone(),
            align: TextAlign::Right,
        });
    }

    Ok(())
}

fn rect(x: f64, y: f64, width: f64, height: f64, color: &str) -> DrawCommand {
    DrawCommand::FillRect {
        x,
        y,
        width,
        height,
        color: color.to_string(),
    }
}

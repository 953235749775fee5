//! Price scale and progressive disclosure.
//!
//! Every visualization of a display maps prices through the same
//! [`PriceScale`]. Overlays receive the host's scale instead of building one.

use crate::domain::display::SymbolDisplayRecord;
use crate::error::RenderError;

use super::RenderConfig;

// ─── PriceScale ──────────────────────────────────────────────────────────────

/// Linear price → y transform. Higher prices map to smaller y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScale {
    min: f64,
    max: f64,
    padding: f64,
    height: f64,
}

impl PriceScale {
    pub fn new(min: f64, max: f64, height: f64, padding: f64) -> Result<Self, RenderError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(RenderError::NonFinite("price range"));
        }
        if max <= min {
            return Err(RenderError::DegenerateRange { low: min, high: max });
        }
        if !(height - 2.0 * padding > 0.0) {
            return Err(RenderError::NoDrawableArea { height, padding });
        }
        Ok(Self {
            min,
            max,
            padding,
            height,
        })
    }

    /// Scale covering the record's visible range at the given disclosure level.
    pub fn for_record(
        record: &SymbolDisplayRecord,
        config: &RenderConfig,
        height: f64,
        disclosure_level: f64,
    ) -> Result<Self, RenderError> {
        let (min, max) = visible_range(record, disclosure_level, config.adr_buffer_ratio)?;
        Self::new(min, max, height, config.padding)
    }

    pub fn price_to_y(&self, price: f64) -> f64 {
        self.padding + (self.max - price) / (self.max - self.min) * self.drawable_height()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, price: f64) -> bool {
        (self.min..=self.max).contains(&price)
    }

    fn drawable_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }
}

/// Largest day range, in multiples of ADR, the meter will draw. Anything wider
/// is treated as bad feed data.
pub const MAX_ADR_MULTIPLE: f64 = 10.0;

// ─── Visible range ───────────────────────────────────────────────────────────

/// Reference price the percentage markers are measured from.
pub(crate) fn anchor_price(record: &SymbolDisplayRecord) -> Option<f64> {
    record.ohlc.open.or_else(|| match (record.adr.high, record.adr.low) {
        (Some(h), Some(l)) => Some((h + l) / 2.0),
        _ => None,
    })
}

/// Price range shown for a record: the ADR bounds, widened to the disclosed
/// percentage markers and the day's extremes, plus `buffer_ratio` of the span
/// on each side.
pub fn visible_range(
    record: &SymbolDisplayRecord,
    disclosure_level: f64,
    buffer_ratio: f64,
) -> Result<(f64, f64), RenderError> {
    let adr_high = record.adr.high.ok_or(RenderError::MissingField("projectedAdrHigh"))?;
    let adr_low = record.adr.low.ok_or(RenderError::MissingField("projectedAdrLow"))?;
    let adr = record.adr.range().ok_or(RenderError::MissingField("adr"))?;

    let mut low = adr_low;
    let mut high = adr_high;
    let mut include = |name: &'static str, price: Option<f64>| -> Result<(), RenderError> {
        if let Some(p) = price {
            if !p.is_finite() {
                return Err(RenderError::NonFinite(name));
            }
            low = low.min(p);
            high = high.max(p);
        }
        Ok(())
    };

    include("projectedAdrHigh", Some(adr_high))?;
    include("projectedAdrLow", Some(adr_low))?;
    include("todaysOpen", record.ohlc.open)?;
    include("todaysHigh", record.ohlc.high)?;
    include("todaysLow", record.ohlc.low)?;
    include("current", record.ohlc.current)?;

    if let Some(anchor) = anchor_price(record) {
        let half = disclosure_level.max(0.0).min(MAX_ADR_MULTIPLE) * adr / 2.0;
        include("marker", Some(anchor + half))?;
        include("marker", Some(anchor - half))?;
    }

    let span = high - low;
    if !(span > 0.0) {
        return Err(RenderError::DegenerateRange { low, high });
    }
    let buffer = span * buffer_ratio.max(0.0);
    Ok((low - buffer, high + buffer))
}

// ─── Progressive disclosure ──────────────────────────────────────────────────

/// Disclosure level for a day range that is `ratio` times the ADR: `ratio`
/// rounded up to the next multiple of `step`, never below one step.
pub fn disclosure_level(ratio: f64, step: f64) -> f64 {
    if !(step > 0.0) || !ratio.is_finite() || ratio <= 0.0 {
        return step.max(0.0);
    }
    // Tolerance keeps exact multiples such as 1.5 from rounding up a step.
    let steps = (ratio / step - 1e-9).ceil().max(1.0);
    steps * step
}

/// Percentages (25, 50, …) of every marker up to `level`, capped at
/// [`MAX_ADR_MULTIPLE`].
pub fn percentage_markers(level: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !level.is_finite() {
        return Vec::new();
    }
    let count = (level.clamp(0.0, MAX_ADR_MULTIPLE) / step).round() as u32;
    (1..=count).map(|i| i as f64 * step * 100.0).collect()
}

/// Per-display disclosure state. The level only ever grows until reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressiveDisclosure {
    step: f64,
    level: f64,
}

impl ProgressiveDisclosure {
    pub fn new(step: f64) -> Self {
        Self { step, level: step }
    }

    /// Fold in the current day-range ratio and return the level to draw at.
    /// Ratios beyond [`MAX_ADR_MULTIPLE`] are not folded in.
    pub fn observe(&mut self, ratio: Option<f64>) -> f64 {
        if let Some(ratio) = ratio.filter(|r| *r <= MAX_ADR_MULTIPLE) {
            let level = disclosure_level(ratio, self.step);
            if level > self.level {
                tracing::debug!("Disclosure level {} -> {}", self.level, level);
                self.level = level;
            }
        }
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = self.step;
    }
}

//! Number formatting utilities for human-readable display.
//!
//! Handles f64 values for labels that are not prices: volumes and pip counts.
//! For price formatting, use the `price` sibling module.

use crate::shared::PipMetadata;

/// Trims trailing zeros after a decimal point, then a bare trailing `.`.
///
/// Strings without a decimal point are returned unchanged, so `"100"` stays
/// `"100"`. Applying it twice yields the same string.
pub fn trim_trailing_zeros(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted.to_string()
    }
}

/// Abbreviate a volume with K/M/B suffixes, one decimal place, zeros trimmed.
pub fn abbr_volume(volume: f64) -> String {
    if !volume.is_finite() {
        return "-".to_string();
    }

    let sign = if volume < 0.0 { "-" } else { "" };
    let abs = volume.abs();

    let (scaled, suffix) = if abs >= 1_000_000_000.0 {
        (abs / 1_000_000_000.0, "B")
    } else if abs >= 1_000_000.0 {
        (abs / 1_000_000.0, "M")
    } else if abs >= 1_000.0 {
        (abs / 1_000.0, "K")
    } else {
        (abs, "")
    };

    format!(
        "{}{}{}",
        sign,
        trim_trailing_zeros(&format!("{:.1}", scaled)),
        suffix
    )
}

/// Format a pip count with one decimal place, zeros trimmed (`85.0` → `"85"`).
pub fn display_pips(pips: f64) -> String {
    if !pips.is_finite() {
        return "-".to_string();
    }
    trim_trailing_zeros(&format!("{:.1}", pips))
}

/// Distance between two prices in pips, formatted with [`display_pips`].
pub fn pips_between(a: f64, b: f64, pip: &PipMetadata) -> String {
    display_pips(pip.to_pips((a - b).abs()))
}

//! Pip-aware price formatting.
//!
//! Prices are shown with `pip_position + 1` decimals (pip digit plus pipette),
//! rounded half away from zero, then trimmed of trailing zeros so an
//! instrument quoted to two decimals reads `155.47`, not `155.470`.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::num::trim_trailing_zeros;
use crate::shared::PipMetadata;

/// Format a price for display using instrument precision.
pub fn format_price(price: f64, pip: &PipMetadata) -> String {
    trim_trailing_zeros(&format_fixed(price, pip.display_digits()))
}

/// Fixed-point rendering with exactly `digits` decimals, round-half-away-from-zero.
///
/// Goes through `Decimal` parsed from the shortest float representation so
/// `1.005` rounds to `1.01` as written rather than as stored. Values outside
/// `Decimal` range fall back to float formatting; non-finite values never panic.
pub fn format_fixed(price: f64, digits: u32) -> String {
    if !price.is_finite() {
        return price.to_string();
    }

    match Decimal::from_str(&price.to_string()) {
        Ok(value) => {
            let mut rounded =
                value.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(digits);
            if rounded.is_zero() {
                rounded.set_sign_positive(true);
            }
            rounded.to_string()
        }
        Err(e) => {
            tracing::debug!("Price {} outside decimal range ({}), using float formatting", price, e);
            format!("{:.1$}", price, digits as usize)
        }
    }
}

/// A formatted price split around the emphasized pip digits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceParts {
    pub leading: String,
    pub emphasized: String,
    pub trailing: String,
}

impl PriceParts {
    pub fn joined(&self) -> String {
        format!("{}{}{}", self.leading, self.emphasized, self.trailing)
    }
}

/// Format a price and split it so the two digits ending at the pip digit can
/// be drawn larger.
///
/// Works on the untrimmed fixed string so the pipette digit keeps its place
/// while the price ticks. The split is computed on digit indices; the decimal
/// point stays inside whichever segment it falls in (`2456.78` with pip position
/// 1 emphasizes `6.7`).
pub fn format_price_parts(price: f64, pip: &PipMetadata) -> PriceParts {
    let fixed = format_fixed(price, pip.display_digits());
    split_at_pip(&fixed, pip.pip_position)
}

fn split_at_pip(fixed: &str, pip_position: u32) -> PriceParts {
    let digit_offsets: Vec<usize> = fixed
        .char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .collect();

    let integer_digits = fixed
        .split('.')
        .next()
        .map(|int| int.chars().filter(|c| c.is_ascii_digit()).count())
        .unwrap_or(0);

    if digit_offsets.is_empty() || integer_digits == 0 {
        return PriceParts {
            leading: fixed.to_string(),
            ..Default::default()
        };
    }

    let pip_index = (integer_digits + pip_position as usize - 1).min(digit_offsets.len() - 1);
    let start = digit_offsets[pip_index.saturating_sub(1)];
    let end = digit_offsets[pip_index] + 1;

    PriceParts {
        leading: fixed[..start].to_string(),
        emphasized: fixed[start..end].to_string(),
        trailing: fixed[end..].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pip(position: u32) -> PipMetadata {
        PipMetadata::new(position)
    }

    #[test]
    fn test_format_price_strips_padding() {
        assert_eq!(format_price(155.47, &pip(2)), "155.47");
        assert_eq!(format_price(155.4, &pip(2)), "155.4");
        assert_eq!(format_price(155.0, &pip(2)), "155");
    }

    #[test]
    fn test_format_price_fx_five_decimals() {
        assert_eq!(format_price(1.084567, &pip(4)), "1.08457");
        assert_eq!(format_price(1.08451, &pip(4)), "1.08451");
    }

    #[test]
    fn test_format_price_gold_pip_position_one() {
        assert_eq!(format_price(2456.781, &pip(1)), "2456.78");
        assert_eq!(format_price(2456.8, &pip(1)), "2456.8");
    }

    #[test]
    fn test_format_fixed_digit_count() {
        for p in 0..=8u32 {
            let s = format_fixed(1234.5678901, p + 1);
            let decimals = s.split('.').nth(1).map(str::len).unwrap_or(0);
            assert_eq!(decimals, (p + 1) as usize, "pip position {p}: {s}");
        }
    }

    #[test]
    fn test_format_fixed_half_away_from_zero() {
        assert_eq!(format_fixed(1.005, 2), "1.01");
        assert_eq!(format_fixed(-1.005, 2), "-1.01");
        assert_eq!(format_fixed(2.5, 0), "3");
        assert_eq!(format_fixed(0.125, 2), "0.13");
    }

    #[test]
    fn test_format_price_round_trips_within_precision() {
        let samples = [1.08457321, 155.4712, 2456.781, 0.6543219, 38_950.12, 0.00012345];
        for p in 0..=6u32 {
            let meta = pip(p);
            let tolerance = 10f64.powi(-((p + 1) as i32));
            for x in samples {
                let parsed: f64 = format_price(x, &meta).parse().unwrap();
                assert!(
                    (parsed - x).abs() <= tolerance,
                    "x={x} p={p} parsed={parsed}"
                );
            }
        }
    }

    #[test]
    fn test_format_price_negative_and_zero() {
        assert_eq!(format_price(-1.5, &pip(4)), "-1.5");
        assert_eq!(format_price(-0.000001, &pip(2)), "0");
        assert_eq!(format_price(0.0, &pip(4)), "0");
    }

    #[test]
    fn test_format_price_non_finite_does_not_panic() {
        assert_eq!(format_price(f64::NAN, &pip(4)), "NaN");
        assert_eq!(format_price(f64::INFINITY, &pip(4)), "inf");
    }

    #[test]
    fn test_format_price_huge_value_falls_back() {
        let s = format_price(1e30, &pip(2));
        assert!(s.starts_with("1000000000000000"));
    }

    #[test]
    fn test_parts_fx() {
        let parts = format_price_parts(1.08457, &pip(4));
        assert_eq!(parts.leading, "1.08");
        assert_eq!(parts.emphasized, "45");
        assert_eq!(parts.trailing, "7");
    }

    #[test]
    fn test_parts_jpy_keeps_padding() {
        let parts = format_price_parts(155.47, &pip(2));
        assert_eq!(parts.leading, "155.");
        assert_eq!(parts.emphasized, "47");
        assert_eq!(parts.trailing, "0");
    }

    #[test]
    fn test_parts_decimal_point_inside_emphasis() {
        let parts = format_price_parts(2456.781, &pip(1));
        assert_eq!(parts.leading, "245");
        assert_eq!(parts.emphasized, "6.7");
        assert_eq!(parts.trailing, "8");
    }

    #[test]
    fn test_parts_pip_position_zero() {
        let parts = format_price_parts(15234.5, &pip(0));
        assert_eq!(parts.leading, "152");
        assert_eq!(parts.emphasized, "34");
        assert_eq!(parts.trailing, ".5");
    }

    #[test]
    fn test_parts_negative_and_short_values() {
        let parts = format_price_parts(-1.08457, &pip(4));
        assert_eq!(parts.leading, "-1.08");
        assert_eq!(parts.joined(), "-1.08457");

        let parts = format_price_parts(0.5, &pip(0));
        assert_eq!(parts.emphasized, "0");
        assert_eq!(parts.joined(), "0.5");
    }

    #[test]
    fn test_parts_join_reproduces_fixed_string() {
        for (x, p) in [(1.23456, 4), (155.471, 2), (38950.5, 1), (0.65432, 4)] {
            let meta = pip(p);
            assert_eq!(
                format_price_parts(x, &meta).joined(),
                format_fixed(x, meta.display_digits())
            );
        }
    }

    #[test]
    fn test_parts_non_finite() {
        let parts = format_price_parts(f64::NAN, &pip(4));
        assert_eq!(parts.leading, "NaN");
        assert!(parts.emphasized.is_empty());
    }
}

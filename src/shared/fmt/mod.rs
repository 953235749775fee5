//! Formatting utilities for human-readable display.
//!
//! - `price`: pip-aware fixed-point price formatting and pip-digit emphasis
//! - `num`: trailing-zero trimming, volume abbreviations, pip counts

pub mod num;
pub mod price;

//! Domain modules (vertical slices): types, wire types, conversions, state.

/// Per-symbol display records and the data processor that maintains them.
pub mod display;

/// Floating display layout and its persisted store.
pub mod workspace;

//! Byte-level conversion helpers.
pub mod numeric;

//! Utility types shared across the crate.
//!
//! - [`b64`] - Base64 encoding/decoding helpers for the two alphabets this
//!   crate needs.

pub mod b64;

pub use b64::*;

//! Token record types
//!
//! The captured credential pair and its serialization contract.

pub mod record;

pub use record::{MIN_PLAUSIBLE_TOKEN_LENGTH, TokenRecord};

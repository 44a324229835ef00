//! Core types used across the LSAT Kit.

mod amount;
mod hashes;

pub use amount::*;
pub use hashes::*;

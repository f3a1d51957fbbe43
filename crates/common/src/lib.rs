//! Shared value types used across the explorer crates.

mod types;

pub use types::{ImageData, Transform};

//! Desktop input reduced to the per-frame queries the scene loop needs.
//!
//! # Invariants
//! - A key reports `pressed` on exactly one frame per physical press; OS key
//!   repeat never produces a second edge.
//! - `down` is level-triggered and stays true for every frame the key is held.
//! - Mouse motion accumulates between frames and is cleared at frame start.

pub mod state;

pub use state::{InputState, Key};

pub fn crate_info() -> &'static str {
    "explorer-input v0.1.0"
}

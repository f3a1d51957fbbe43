//! Scene composition and the per-frame loop.
//!
//! # Invariants
//! - All GPU resources are created in [`Game::new`] and released by
//!   [`Game::teardown`], newest first, exactly once. A failed load releases
//!   whatever it had already created.
//! - Collection is one-way and per box; one keypress collects every box in
//!   range.
//! - The game depends on a [`FrameHost`], never on a concrete window type.

pub mod config;
pub mod error;
pub mod game;
pub mod headless;
pub mod host;
pub mod scene;

pub use config::SceneConfig;
pub use error::SceneError;
pub use game::{Game, SceneAssets, TEXTURE_UNIT};
pub use headless::HeadlessHost;
pub use host::FrameHost;
pub use scene::{Light, PlacedBox, Scene};

pub fn crate_info() -> &'static str {
    "explorer-scene v0.1.0"
}

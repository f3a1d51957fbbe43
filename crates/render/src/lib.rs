//! Rendering core: renderer-agnostic camera, geometry and device interface.
//!
//! # Invariants
//! - Camera math and mesh generation never touch a GPU.
//! - The scene talks to a GPU only through [`RenderDevice`]; backends own
//!   the actual buffers, programs and images.
//! - Uniform names are a fixed contract with shader text (see [`uniforms`]).

pub mod camera;
pub mod device;
pub mod geometry;
pub mod recording;
pub mod resources;
pub mod uniforms;

pub use camera::{Camera, Direction};
pub use device::{
    MAX_TEXTURE_UNITS, MeshId, ProgramId, RenderDevice, ResourceId, ShaderError, ShaderStage,
    TextureId,
};
pub use geometry::{GeometryError, MeshData, Vertex};
pub use recording::{Command, DrawCall, RecordingDevice};
pub use resources::GpuResources;
pub use uniforms::{DrawUniforms, UniformLocation, UniformState, uniform_location};

pub fn crate_info() -> &'static str {
    "explorer-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}

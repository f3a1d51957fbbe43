//! wgpu backend for [`explorer_render::RenderDevice`].
//!
//! Meshes, shader programs and textures live on the GPU behind the ids the
//! render crate hands out. A frame's draws are recorded as they are issued
//! and encoded into one render pass by [`WgpuDevice::submit_frame`].
//!
//! # Invariants
//! - Every draw captures its full uniform block in its own buffer slot, so
//!   later uniform writes never affect earlier draws.
//! - A failed compile or link creates no program.

mod gpu;
mod mesh;
mod program;
mod texture;

pub use gpu::{WgpuDevice, align_to};
pub use mesh::{GpuMesh, vertex_layout};
pub use program::{DEPTH_FORMAT, GpuProgram};
pub use texture::{GpuTexture, TEXTURE_FORMAT};

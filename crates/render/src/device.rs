use crate::geometry::MeshData;
use explorer_common::ImageData;
use glam::{Mat4, Vec3};
use std::fmt;

/// Number of texture units a device exposes to [`RenderDevice::bind_texture`].
pub const MAX_TEXTURE_UNITS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Any GPU-owned object a device can release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    Program(ProgramId),
    Mesh(MeshId),
    Texture(TextureId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader program construction failures. No program handle exists after
/// either of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    Compilation {
        stage: ShaderStage,
        diagnostic: String,
    },
    #[error("shader program failed to link:\n{diagnostic}")]
    Link { diagnostic: String },
}

/// The GPU capability set the scene renders through.
///
/// Drawing follows immediate-mode semantics: each [`draw_mesh`] observes the
/// program, uniform values and texture-unit bindings current when it is
/// issued. Uniform setters act on the program selected by [`use_program`]
/// and are no-ops when none is selected.
///
/// [`draw_mesh`]: RenderDevice::draw_mesh
/// [`use_program`]: RenderDevice::use_program
pub trait RenderDevice {
    /// Compile both stages and link them. Nothing is created on failure.
    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError>;

    /// Upload vertex and index buffers with the fixed vertex layout.
    fn create_mesh(&mut self, mesh: &MeshData) -> MeshId;

    /// Upload RGBA8 pixels with a full mip chain, linear filtering and
    /// repeat wrapping.
    fn create_texture(&mut self, image: &ImageData) -> TextureId;

    /// Release a resource. Must not be called while a recorded draw still
    /// references it.
    fn destroy(&mut self, resource: ResourceId);

    /// Framebuffer size changed.
    fn resize(&mut self, width: u32, height: u32);

    /// Start a frame that clears color and depth.
    fn begin_frame(&mut self, clear_color: [f32; 4]);

    fn use_program(&mut self, program: ProgramId);

    fn set_matrix4(&mut self, name: &str, value: Mat4);

    fn set_vector3(&mut self, name: &str, value: Vec3);

    fn set_int(&mut self, name: &str, value: i32);

    /// Make `texture` the image sampled through `unit`.
    fn bind_texture(&mut self, texture: TextureId, unit: u32);

    /// Indexed triangle-list draw of `mesh` with the current state.
    fn draw_mesh(&mut self, mesh: MeshId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_error_carries_diagnostic() {
        let err = ShaderError::Compilation {
            stage: ShaderStage::Fragment,
            diagnostic: "expected `;`".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("fragment shader failed to compile"));
        assert!(text.contains("expected `;`"));
    }

    #[test]
    fn resource_ids_order_by_kind_then_index() {
        let mut ids = vec![
            ResourceId::Texture(TextureId(0)),
            ResourceId::Mesh(MeshId(1)),
            ResourceId::Program(ProgramId(3)),
            ResourceId::Mesh(MeshId(0)),
        ];
        ids.sort();
        assert_eq!(ids[0], ResourceId::Program(ProgramId(3)));
        assert_eq!(ids[1], ResourceId::Mesh(MeshId(0)));
    }
}

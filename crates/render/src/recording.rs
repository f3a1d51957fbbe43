//! A [`RenderDevice`] that records calls instead of touching a GPU.
//!
//! Draws are resolved the way a GPU would see them: the program, the full
//! uniform block and the texture on the sampled unit are captured at the
//! moment of the draw. Useful for CLI output, logging, and testing the
//! render pass.

use crate::device::{
    MAX_TEXTURE_UNITS, MeshId, ProgramId, RenderDevice, ResourceId, ShaderError, ShaderStage,
    TextureId,
};
use crate::geometry::MeshData;
use crate::uniforms::{DrawUniforms, UniformState};
use explorer_common::ImageData;
use glam::{Mat4, Vec3};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// A draw as the GPU would execute it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshId,
    pub program: ProgramId,
    pub texture: Option<TextureId>,
    pub index_count: u32,
    pub uniforms: DrawUniforms,
}

impl DrawCall {
    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.uniforms.model)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProgram(ProgramId),
    CreateMesh { id: MeshId, vertices: usize, indices: usize },
    CreateTexture { id: TextureId, width: u32, height: u32 },
    Destroy(ResourceId),
    Resize { width: u32, height: u32 },
    BeginFrame { clear_color: [f32; 4] },
    UseProgram(ProgramId),
    SetMatrix4 { name: String, value: Mat4 },
    SetVector3 { name: String, value: Vec3 },
    SetInt { name: String, value: i32 },
    BindTexture { texture: TextureId, unit: u32 },
    Draw(DrawCall),
}

impl Command {
    /// Resource lifecycle and framebuffer changes. These outlive the frame
    /// they were issued in; everything else is per-frame state.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::CreateProgram(_)
                | Self::CreateMesh { .. }
                | Self::CreateTexture { .. }
                | Self::Destroy(_)
                | Self::Resize { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Vec<Command>,
    next_id: u32,
    programs: BTreeMap<ProgramId, UniformState>,
    meshes: BTreeMap<MeshId, u32>,
    textures: BTreeSet<TextureId>,
    current_program: Option<ProgramId>,
    units: [Option<TextureId>; MAX_TEXTURE_UNITS as usize],
    frame_start: usize,
    shader_failure: Option<ShaderError>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_program` fail with `error`.
    pub fn with_shader_failure(mut self, error: ShaderError) -> Self {
        self.shader_failure = Some(error);
        self
    }

    /// Lifecycle commands since creation followed by the current frame's
    /// commands. Earlier frames' per-frame commands are dropped at
    /// `begin_frame`, so the log stays bounded over a long run.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Commands since the most recent `begin_frame` (inclusive).
    pub fn frame_commands(&self) -> &[Command] {
        &self.commands[self.frame_start..]
    }

    /// Draws recorded since the most recent `begin_frame`.
    pub fn frame_draws(&self) -> Vec<&DrawCall> {
        self.frame_commands()
            .iter()
            .filter_map(|c| match c {
                Command::Draw(draw) => Some(draw),
                _ => None,
            })
            .collect()
    }

    /// Destroyed resources in the order they were released.
    pub fn destroyed(&self) -> Vec<ResourceId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Destroy(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn live_resources(&self) -> BTreeSet<ResourceId> {
        self.programs
            .keys()
            .map(|&id| ResourceId::Program(id))
            .chain(self.meshes.keys().map(|&id| ResourceId::Mesh(id)))
            .chain(self.textures.iter().map(|&id| ResourceId::Texture(id)))
            .collect()
    }

    /// Human-readable summary of the current frame.
    pub fn describe_frame(&self) -> String {
        let draws = self.frame_draws();
        let mut out = format!("=== Frame ({} draws) ===\n", draws.len());
        for draw in draws {
            let t = draw.model().w_axis;
            let _ = writeln!(
                out,
                "  mesh={} texture={} indices={} at=({:.2}, {:.2}, {:.2}) light_on={}",
                draw.mesh.0,
                draw.texture.map_or_else(|| "-".to_string(), |tex| tex.0.to_string()),
                draw.index_count,
                t.x,
                t.y,
                t.z,
                draw.uniforms.light_on,
            );
        }
        out
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn current_uniforms(&mut self) -> Option<&mut UniformState> {
        let program = self.current_program?;
        self.programs.get_mut(&program)
    }
}

impl RenderDevice for RecordingDevice {
    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        if let Some(err) = &self.shader_failure {
            return Err(err.clone());
        }
        for (stage, source) in [
            (ShaderStage::Vertex, vertex_source),
            (ShaderStage::Fragment, fragment_source),
        ] {
            if source.trim().is_empty() {
                return Err(ShaderError::Compilation {
                    stage,
                    diagnostic: "empty shader source".into(),
                });
            }
        }
        let id = ProgramId(self.allocate());
        self.programs.insert(id, UniformState::default());
        self.commands.push(Command::CreateProgram(id));
        Ok(id)
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshId {
        let id = MeshId(self.allocate());
        self.meshes.insert(id, mesh.index_count() as u32);
        self.commands.push(Command::CreateMesh {
            id,
            vertices: mesh.vertex_count(),
            indices: mesh.index_count(),
        });
        id
    }

    fn create_texture(&mut self, image: &ImageData) -> TextureId {
        let id = TextureId(self.allocate());
        self.textures.insert(id);
        self.commands.push(Command::CreateTexture {
            id,
            width: image.width(),
            height: image.height(),
        });
        id
    }

    fn destroy(&mut self, resource: ResourceId) {
        let existed = match resource {
            ResourceId::Program(id) => {
                if self.current_program == Some(id) {
                    self.current_program = None;
                }
                self.programs.remove(&id).is_some()
            }
            ResourceId::Mesh(id) => self.meshes.remove(&id).is_some(),
            ResourceId::Texture(id) => {
                for unit in self.units.iter_mut().filter(|u| **u == Some(id)) {
                    *unit = None;
                }
                self.textures.remove(&id)
            }
        };
        if existed {
            self.commands.push(Command::Destroy(resource));
        } else {
            tracing::warn!(?resource, "destroy of unknown or already released resource");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.commands.push(Command::Resize { width, height });
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) {
        let previous = self.commands.split_off(self.frame_start);
        self.commands
            .extend(previous.into_iter().filter(Command::is_lifecycle));
        self.frame_start = self.commands.len();
        self.commands.push(Command::BeginFrame { clear_color });
    }

    fn use_program(&mut self, program: ProgramId) {
        if !self.programs.contains_key(&program) {
            tracing::warn!(?program, "use of unknown program");
            return;
        }
        self.current_program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn set_matrix4(&mut self, name: &str, value: Mat4) {
        if let Some(state) = self.current_uniforms() {
            state.set_matrix4(name, value);
        }
        self.commands.push(Command::SetMatrix4 {
            name: name.to_string(),
            value,
        });
    }

    fn set_vector3(&mut self, name: &str, value: Vec3) {
        if let Some(state) = self.current_uniforms() {
            state.set_vector3(name, value);
        }
        self.commands.push(Command::SetVector3 {
            name: name.to_string(),
            value,
        });
    }

    fn set_int(&mut self, name: &str, value: i32) {
        if let Some(state) = self.current_uniforms() {
            state.set_int(name, value);
        }
        self.commands.push(Command::SetInt {
            name: name.to_string(),
            value,
        });
    }

    fn bind_texture(&mut self, texture: TextureId, unit: u32) {
        let Some(slot) = self.units.get_mut(unit as usize) else {
            tracing::warn!(unit, "texture unit out of range");
            return;
        };
        *slot = Some(texture);
        self.commands.push(Command::BindTexture { texture, unit });
    }

    fn draw_mesh(&mut self, mesh: MeshId) {
        let Some(&index_count) = self.meshes.get(&mesh) else {
            tracing::warn!(?mesh, "draw of unknown mesh");
            return;
        };
        let Some(program) = self.current_program else {
            tracing::warn!(?mesh, "draw without a program in use");
            return;
        };
        let Some(state) = self.programs.get(&program).copied() else {
            return;
        };
        let texture = self
            .units
            .get(state.sampler_unit as usize)
            .copied()
            .flatten();
        self.commands.push(Command::Draw(DrawCall {
            mesh,
            program,
            texture,
            index_count,
            uniforms: state.block,
        }));
    }
}

//! Uniform names shared between shader text and the frame loop, and the
//! per-draw uniform block they resolve to.
//!
//! Lookups by unknown name yield `None`; setters treat that, and a value of
//! the wrong kind, as a silent no-op.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

pub const U_VIEW: &str = "uView";
pub const U_PROJ: &str = "uProj";
pub const U_MODEL: &str = "uModel";
pub const U_VIEW_POS: &str = "uViewPos";
pub const U_LIGHT_DIR: &str = "uLightDir";
pub const U_LIGHT_ON: &str = "uLightOn";
/// Texture unit the sampler reads from.
pub const U_TEX: &str = "uTex";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec3,
    Int,
}

/// Stable location of a named uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformLocation {
    View,
    Proj,
    Model,
    ViewPos,
    LightDir,
    LightOn,
    Sampler,
}

impl UniformLocation {
    pub const ALL: [UniformLocation; 7] = [
        Self::View,
        Self::Proj,
        Self::Model,
        Self::ViewPos,
        Self::LightDir,
        Self::LightOn,
        Self::Sampler,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::View => U_VIEW,
            Self::Proj => U_PROJ,
            Self::Model => U_MODEL,
            Self::ViewPos => U_VIEW_POS,
            Self::LightDir => U_LIGHT_DIR,
            Self::LightOn => U_LIGHT_ON,
            Self::Sampler => U_TEX,
        }
    }

    pub fn kind(self) -> UniformKind {
        match self {
            Self::View | Self::Proj | Self::Model => UniformKind::Mat4,
            Self::ViewPos | Self::LightDir => UniformKind::Vec3,
            Self::LightOn | Self::Sampler => UniformKind::Int,
        }
    }
}

pub fn uniform_location(name: &str) -> Option<UniformLocation> {
    UniformLocation::ALL.into_iter().find(|loc| loc.name() == name)
}

/// GPU layout of the uniform block (WGSL uniform address space rules:
/// mat4 at 0/64/128, vec3 at 192 and 208, i32 packed after the second vec3).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub _pad0: u32,
    pub light_dir: [f32; 3],
    pub light_on: i32,
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view_pos: [0.0; 3],
            _pad0: 0,
            light_dir: [0.0, -1.0, 0.0],
            light_on: 0,
        }
    }
}

/// Current uniform values of one program: the block plus the sampler unit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UniformState {
    pub block: DrawUniforms,
    pub sampler_unit: u32,
}

impl UniformState {
    /// Returns whether the value was applied.
    pub fn set_matrix4(&mut self, name: &str, value: Mat4) -> bool {
        let cols = value.to_cols_array_2d();
        match uniform_location(name) {
            Some(UniformLocation::View) => self.block.view = cols,
            Some(UniformLocation::Proj) => self.block.proj = cols,
            Some(UniformLocation::Model) => self.block.model = cols,
            other => return ignored(name, other, UniformKind::Mat4),
        }
        true
    }

    pub fn set_vector3(&mut self, name: &str, value: Vec3) -> bool {
        match uniform_location(name) {
            Some(UniformLocation::ViewPos) => self.block.view_pos = value.into(),
            Some(UniformLocation::LightDir) => self.block.light_dir = value.into(),
            other => return ignored(name, other, UniformKind::Vec3),
        }
        true
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> bool {
        match uniform_location(name) {
            Some(UniformLocation::LightOn) => self.block.light_on = value,
            Some(UniformLocation::Sampler) => match u32::try_from(value) {
                Ok(unit) => self.sampler_unit = unit,
                Err(_) => return ignored(name, Some(UniformLocation::Sampler), UniformKind::Int),
            },
            other => return ignored(name, other, UniformKind::Int),
        }
        true
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.block.model)
    }
}

fn ignored(name: &str, location: Option<UniformLocation>, kind: UniformKind) -> bool {
    match location {
        None => tracing::debug!(name, "uniform not present in program, ignoring"),
        Some(loc) => tracing::debug!(name, expected = ?loc.kind(), got = ?kind, "uniform kind mismatch, ignoring"),
    }
    false
}

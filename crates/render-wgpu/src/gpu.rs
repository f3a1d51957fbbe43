use crate::mesh::GpuMesh;
use crate::program::{DEPTH_FORMAT, GpuProgram};
use crate::texture::{self, GpuTexture};
use explorer_common::ImageData;
use explorer_render::{
    DrawUniforms, MAX_TEXTURE_UNITS, MeshData, MeshId, ProgramId, RenderDevice, ResourceId,
    ShaderError, TextureId,
};
use glam::{Mat4, Vec3};
use std::collections::BTreeMap;

const UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

/// Round `size` up to a multiple of `alignment` (a power of two).
pub fn align_to(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

struct PendingDraw {
    program: ProgramId,
    mesh: MeshId,
    texture: Option<TextureId>,
    uniforms: DrawUniforms,
}

/// Per-draw uniform storage: one aligned slot per draw, addressed by a
/// dynamic offset.
struct UniformSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u64,
}

impl UniformSlots {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, stride: u64, capacity: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniforms"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniforms_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UNIFORM_SIZE),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

/// [`RenderDevice`] backed by wgpu.
///
/// Draw calls are recorded during the frame and encoded into a single render
/// pass by [`WgpuDevice::submit_frame`].
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    depth_view: wgpu::TextureView,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    slots: UniformSlots,
    next_id: u32,
    programs: BTreeMap<ProgramId, GpuProgram>,
    meshes: BTreeMap<MeshId, GpuMesh>,
    textures: BTreeMap<TextureId, GpuTexture>,
    current_program: Option<ProgramId>,
    units: [Option<TextureId>; MAX_TEXTURE_UNITS as usize],
    clear_color: [f32; 4],
    draws: Vec<PendingDraw>,
}

impl WgpuDevice {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });
        let texture_layout = texture::bind_group_layout(&device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_to(UNIFORM_SIZE, alignment);
        let slots = UniformSlots::new(&device, &uniform_layout, stride, 16);
        let sampler = texture::create_sampler(&device);
        let depth_view = create_depth_texture(&device, width, height);

        Self {
            device,
            queue,
            surface_format,
            depth_view,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            slots,
            next_id: 0,
            programs: BTreeMap::new(),
            meshes: BTreeMap::new(),
            textures: BTreeMap::new(),
            current_program: None,
            units: [None; MAX_TEXTURE_UNITS as usize],
            clear_color: [0.0, 0.0, 0.0, 1.0],
            draws: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn current_uniforms(&mut self) -> Option<&mut GpuProgram> {
        let id = self.current_program?;
        self.programs.get_mut(&id)
    }

    fn ensure_slots(&mut self, count: u64) {
        if count <= self.slots.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        tracing::debug!(capacity, "growing draw uniform buffer");
        self.slots.buffer.destroy();
        self.slots = UniformSlots::new(&self.device, &self.uniform_layout, self.slots.stride, capacity);
    }

    /// Encode every draw recorded since `begin_frame` into one pass targeting
    /// `target`, then submit. The recorded draws are consumed.
    pub fn submit_frame(&mut self, target: &wgpu::TextureView) {
        let draws = std::mem::take(&mut self.draws);
        self.ensure_slots(draws.len() as u64);

        let stride = self.slots.stride as usize;
        if !draws.is_empty() {
            let mut staging = vec![0u8; stride * draws.len()];
            for (i, draw) in draws.iter().enumerate() {
                let start = i * stride;
                staging[start..start + UNIFORM_SIZE as usize]
                    .copy_from_slice(bytemuck::bytes_of(&draw.uniforms));
            }
            self.queue.write_buffer(&self.slots.buffer, 0, &staging);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let [r, g, b, a] = self.clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for (i, draw) in draws.iter().enumerate() {
                let (Some(program), Some(mesh)) =
                    (self.programs.get(&draw.program), self.meshes.get(&draw.mesh))
                else {
                    continue;
                };
                let Some(texture) = draw.texture.and_then(|id| self.textures.get(&id)) else {
                    tracing::warn!(mesh = draw.mesh.0, "draw skipped: no texture bound on sampled unit");
                    continue;
                };
                pass.set_pipeline(program.pipeline());
                pass.set_bind_group(0, &self.slots.bind_group, &[(i * stride) as u32]);
                pass.set_bind_group(1, texture.bind_group(), &[]);
                mesh.draw(&mut pass);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl RenderDevice for WgpuDevice {
    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        let program = GpuProgram::link(
            &self.device,
            &self.pipeline_layout,
            self.surface_format,
            vertex_source,
            fragment_source,
        )?;
        let id = ProgramId(self.allocate());
        self.programs.insert(id, program);
        tracing::debug!(program = id.0, "program linked");
        Ok(id)
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshId {
        let id = MeshId(self.allocate());
        let gpu = GpuMesh::upload(&self.device, mesh, &format!("mesh_{}", id.0));
        tracing::debug!(mesh = id.0, indices = gpu.index_count(), "mesh uploaded");
        self.meshes.insert(id, gpu);
        id
    }

    fn create_texture(&mut self, image: &ImageData) -> TextureId {
        let id = TextureId(self.allocate());
        let gpu = GpuTexture::upload(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            image,
        );
        tracing::debug!(texture = id.0, width = image.width(), height = image.height(), "texture uploaded");
        self.textures.insert(id, gpu);
        id
    }

    fn destroy(&mut self, resource: ResourceId) {
        let released = match resource {
            ResourceId::Program(id) => {
                if self.current_program == Some(id) {
                    self.current_program = None;
                }
                self.programs.remove(&id).is_some()
            }
            ResourceId::Mesh(id) => match self.meshes.remove(&id) {
                Some(mesh) => {
                    mesh.destroy();
                    true
                }
                None => false,
            },
            ResourceId::Texture(id) => {
                for unit in self.units.iter_mut().filter(|u| **u == Some(id)) {
                    *unit = None;
                }
                match self.textures.remove(&id) {
                    Some(texture) => {
                        texture.destroy();
                        true
                    }
                    None => false,
                }
            }
        };
        if !released {
            tracing::warn!(?resource, "destroy of unknown resource");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.depth_view = create_depth_texture(&self.device, width, height);
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) {
        self.clear_color = clear_color;
        self.draws.clear();
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.programs.contains_key(&program) {
            self.current_program = Some(program);
        } else {
            tracing::warn!(program = program.0, "use of unknown program");
        }
    }

    fn set_matrix4(&mut self, name: &str, value: Mat4) {
        if let Some(program) = self.current_uniforms() {
            program.uniforms.set_matrix4(name, value);
        }
    }

    fn set_vector3(&mut self, name: &str, value: Vec3) {
        if let Some(program) = self.current_uniforms() {
            program.uniforms.set_vector3(name, value);
        }
    }

    fn set_int(&mut self, name: &str, value: i32) {
        if let Some(program) = self.current_uniforms() {
            program.uniforms.set_int(name, value);
        }
    }

    fn bind_texture(&mut self, texture: TextureId, unit: u32) {
        match self.units.get_mut(unit as usize) {
            Some(slot) => *slot = Some(texture),
            None => tracing::warn!(unit, "texture unit out of range"),
        }
    }

    fn draw_mesh(&mut self, mesh: MeshId) {
        let Some(program) = self.current_program else {
            tracing::warn!(mesh = mesh.0, "draw without a program");
            return;
        };
        let Some(state) = self.programs.get(&program).map(|p| p.uniforms) else {
            return;
        };
        let texture = self.units.get(state.sampler_unit as usize).copied().flatten();
        self.draws.push(PendingDraw {
            program,
            mesh,
            texture,
            uniforms: state.block,
        });
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

use crate::device::{MeshId, ProgramId, RenderDevice, ResourceId, ShaderError, TextureId};
use crate::geometry::MeshData;
use explorer_common::ImageData;

/// Remembers every GPU resource created through it and releases them in
/// reverse creation order, exactly once.
#[derive(Debug, Default)]
pub struct GpuResources {
    created: Vec<ResourceId>,
}

impl GpuResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        let id = device.create_program(vertex_source, fragment_source)?;
        self.created.push(ResourceId::Program(id));
        Ok(id)
    }

    pub fn mesh<D: RenderDevice + ?Sized>(&mut self, device: &mut D, mesh: &MeshData) -> MeshId {
        let id = device.create_mesh(mesh);
        self.created.push(ResourceId::Mesh(id));
        id
    }

    pub fn texture<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        image: &ImageData,
    ) -> TextureId {
        let id = device.create_texture(image);
        self.created.push(ResourceId::Texture(id));
        id
    }

    /// Live resources in creation order.
    pub fn ids(&self) -> &[ResourceId] {
        &self.created
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Destroy everything, newest first. Calling again does nothing.
    pub fn teardown<D: RenderDevice + ?Sized>(&mut self, device: &mut D) {
        if !self.created.is_empty() {
            tracing::debug!(count = self.created.len(), "releasing GPU resources");
        }
        while let Some(id) = self.created.pop() {
            device.destroy(id);
        }
    }
}

impl Drop for GpuResources {
    fn drop(&mut self) {
        if !self.created.is_empty() {
            tracing::warn!(
                count = self.created.len(),
                "GPU resource registry dropped without teardown"
            );
        }
    }
}

//! Vertex format and procedural mesh generators.
//!
//! All meshes are indexed triangle lists of [`Vertex`] with 32-bit indices.
//! Triangles wind counter-clockwise when seen from the side their normal
//! points to.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex: position, normal, texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// One attribute of the fixed vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub offset: u64,
    pub components: u32,
}

impl Vertex {
    /// Floats per vertex.
    pub const FLOATS: usize = 8;
    /// Bytes per vertex.
    pub const STRIDE: u64 = (Self::FLOATS * std::mem::size_of::<f32>()) as u64;
    /// Slot 0 = position, 1 = normal, 2 = texcoord.
    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute {
            location: 0,
            offset: 0,
            components: 3,
        },
        VertexAttribute {
            location: 1,
            offset: 12,
            components: 3,
        },
        VertexAttribute {
            location: 2,
            offset: 24,
            components: 2,
        },
    ];

    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            tex_coords: tex_coords.into(),
        }
    }
}

/// Errors from building a mesh out of raw arrays.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("vertex data has {len} floats, not a multiple of the {stride}-float stride")]
    Stride { len: usize, stride: usize },
    #[error("index count {count} is not a multiple of 3")]
    NotTriangleList { count: usize },
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// CPU-side indexed triangle list. Every index is below the vertex count
/// and the index count is a multiple of three.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];
const QUAD_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, GeometryError> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::NotTriangleList {
                count: indices.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    /// Build from a flat interleaved float buffer (position, normal, texcoord).
    pub fn from_interleaved(floats: &[f32], indices: &[u32]) -> Result<Self, GeometryError> {
        if floats.len() % Vertex::FLOATS != 0 {
            return Err(GeometryError::Stride {
                len: floats.len(),
                stride: Vertex::FLOATS,
            });
        }
        let vertices = floats
            .chunks_exact(Vertex::FLOATS)
            .map(|v| Vertex {
                position: [v[0], v[1], v[2]],
                normal: [v[3], v[4], v[5]],
                tex_coords: [v[6], v[7]],
            })
            .collect();
        Self::new(vertices, indices.to_vec())
    }

    /// Horizontal quad of side `size` centred at the origin at height `y`,
    /// facing +Y, UV spanning the unit square.
    pub fn textured_quad_xz(size: f32, y: f32) -> Self {
        let h = size * 0.5;
        Self::quad(
            [
                Vec3::new(-h, y, h),
                Vec3::new(h, y, h),
                Vec3::new(h, y, -h),
                Vec3::new(-h, y, -h),
            ],
            Vec3::Y,
        )
    }

    /// Vertical quad of side `size` centred on the Z axis at depth `z`,
    /// facing +Z.
    pub fn quad_xy(size: f32, z: f32) -> Self {
        let h = size * 0.5;
        Self::quad(
            [
                Vec3::new(-h, -h, z),
                Vec3::new(h, -h, z),
                Vec3::new(h, h, z),
                Vec3::new(-h, h, z),
            ],
            Vec3::Z,
        )
    }

    /// Axis-aligned cube of edge `size` centred at the origin. Each face has
    /// its own four vertices so normals and UVs stay per-face.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let faces: [([Vec3; 4], Vec3); 6] = [
            (
                [
                    Vec3::new(-h, -h, h),
                    Vec3::new(h, -h, h),
                    Vec3::new(h, h, h),
                    Vec3::new(-h, h, h),
                ],
                Vec3::Z,
            ),
            (
                [
                    Vec3::new(h, -h, -h),
                    Vec3::new(-h, -h, -h),
                    Vec3::new(-h, h, -h),
                    Vec3::new(h, h, -h),
                ],
                Vec3::NEG_Z,
            ),
            (
                [
                    Vec3::new(-h, -h, -h),
                    Vec3::new(-h, -h, h),
                    Vec3::new(-h, h, h),
                    Vec3::new(-h, h, -h),
                ],
                Vec3::NEG_X,
            ),
            (
                [
                    Vec3::new(h, -h, h),
                    Vec3::new(h, -h, -h),
                    Vec3::new(h, h, -h),
                    Vec3::new(h, h, h),
                ],
                Vec3::X,
            ),
            (
                [
                    Vec3::new(-h, h, h),
                    Vec3::new(h, h, h),
                    Vec3::new(h, h, -h),
                    Vec3::new(-h, h, -h),
                ],
                Vec3::Y,
            ),
            (
                [
                    Vec3::new(-h, -h, -h),
                    Vec3::new(h, -h, -h),
                    Vec3::new(h, -h, h),
                    Vec3::new(-h, -h, h),
                ],
                Vec3::NEG_Y,
            ),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (corners, normal) in faces {
            let base = vertices.len() as u32;
            vertices.extend(
                corners
                    .iter()
                    .zip(QUAD_UVS)
                    .map(|(&p, uv)| Vertex::new(p, normal, uv)),
            );
            indices.extend(QUAD_INDICES.iter().map(|i| base + i));
        }
        Self { vertices, indices }
    }

    fn quad(corners: [Vec3; 4], normal: Vec3) -> Self {
        let vertices = corners
            .iter()
            .zip(QUAD_UVS)
            .map(|(&p, uv)| Vertex::new(p, normal, uv))
            .collect();
        Self {
            vertices,
            indices: QUAD_INDICES.to_vec(),
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Triangles as vertex triples in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }
}

/// Face normal implied by counter-clockwise winding of a triangle.
pub fn winding_normal(triangle: &[Vertex; 3]) -> Vec3 {
    let [a, b, c] = (*triangle).map(|v| Vec3::from(v.position));
    (b - a).cross(c - a).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_winding_matches_normals(mesh: &MeshData) {
        for tri in mesh.triangles() {
            let implied = winding_normal(&tri);
            for v in tri {
                let stored = Vec3::from(v.normal);
                assert!(
                    (implied - stored).length() < 1e-5,
                    "winding {implied:?} disagrees with stored normal {stored:?}"
                );
            }
        }
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>() as u64, Vertex::STRIDE);
        assert_eq!(Vertex::STRIDE, 32);
        let locations: Vec<_> = Vertex::ATTRIBUTES.iter().map(|a| a.location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn cube_counts_and_ranges() {
        let cube = MeshData::cube(1.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.indices().iter().all(|&i| i < 24));
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = MeshData::cube(2.0);
        assert_winding_matches_normals(&cube);
        for tri in cube.triangles() {
            let centre = tri
                .iter()
                .map(|v| Vec3::from(v.position))
                .sum::<Vec3>()
                / 3.0;
            assert!(centre.dot(winding_normal(&tri)) > 0.0);
        }
    }

    #[test]
    fn cube_face_triangles_share_an_edge() {
        let cube = MeshData::cube(1.0);
        for face in cube.indices().chunks_exact(6) {
            let (first, second) = face.split_at(3);
            let shared = first.iter().filter(|i| second.contains(i)).count();
            assert_eq!(shared, 2);
        }
    }

    #[test]
    fn cube_uvs_follow_corner_order() {
        let cube = MeshData::cube(1.0);
        for face in cube.vertices().chunks_exact(4) {
            let uvs: Vec<_> = face.iter().map(|v| v.tex_coords).collect();
            assert_eq!(uvs, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        }
    }

    #[test]
    fn quads_face_their_axis() {
        let floor = MeshData::textured_quad_xz(10.0, 0.5);
        assert_eq!(floor.vertex_count(), 4);
        assert!(floor.vertices().iter().all(|v| v.position[1] == 0.5));
        assert!(floor.vertices().iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert_winding_matches_normals(&floor);

        let wall = MeshData::quad_xy(10.0, -5.0);
        assert!(wall.vertices().iter().all(|v| v.position[2] == -5.0));
        assert!(wall.vertices().iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert_winding_matches_normals(&wall);
    }

    #[test]
    fn interleaved_round_trip() {
        let floats = [
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0,
        ];
        let mesh = MeshData::from_interleaved(&floats, &[0, 1, 2]).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices()[2].tex_coords, [0.0, 1.0]);
        assert_eq!(bytemuck::cast_slice::<Vertex, f32>(mesh.vertices()), &floats);
    }

    #[test]
    fn rejects_malformed_arrays() {
        assert_eq!(
            MeshData::from_interleaved(&[0.0; 7], &[]),
            Err(GeometryError::Stride { len: 7, stride: 8 })
        );
        assert_eq!(
            MeshData::from_interleaved(&[0.0; 16], &[0, 1]),
            Err(GeometryError::NotTriangleList { count: 2 })
        );
        assert_eq!(
            MeshData::from_interleaved(&[0.0; 16], &[0, 1, 2]),
            Err(GeometryError::IndexOutOfRange {
                index: 2,
                vertex_count: 2
            })
        );
    }
}

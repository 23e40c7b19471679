//! Mesh storage and factory shapes
//!
//! A mesh captures its vertex/index data at construction and uploads GPU
//! buffers exactly once via [`Mesh::upload`]. After upload the geometry is
//! immutable; many scene objects may reference the same mesh through its
//! pool handle.

use std::ops::Range;

use wgpu::util::DeviceExt;

use super::scene::vertex::Vertex;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some()
    }

    /// Creates the GPU vertex/index buffers. Idempotent; later calls are no-ops.
    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.vertex_buffer.is_some() {
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }

    // Factory shapes. Each face gets its own vertices so normals stay flat.

    /// Unit cube centered at the origin, 24 vertices / 12 triangles
    pub fn cube() -> Self {
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // (normal, corner positions)
            (
                [0.0, 0.0, 1.0],
                [
                    [-0.5, -0.5, 0.5],
                    [0.5, -0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                ],
            ),
            (
                [0.0, 0.0, -1.0],
                [
                    [0.5, -0.5, -0.5],
                    [-0.5, -0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                    [0.5, 0.5, -0.5],
                ],
            ),
            (
                [-1.0, 0.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [-0.5, -0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                    [-0.5, 0.5, -0.5],
                ],
            ),
            (
                [1.0, 0.0, 0.0],
                [
                    [0.5, -0.5, 0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [0.5, 0.5, 0.5],
                ],
            ),
            (
                [0.0, 1.0, 0.0],
                [
                    [-0.5, 0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [0.5, 0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                ],
            ),
            (
                [0.0, -1.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, -0.5, 0.5],
                    [-0.5, -0.5, 0.5],
                ],
            ),
        ];

        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (face, (normal, corners)) in faces.iter().enumerate() {
            let base = (face * 4) as u32;
            for (corner, position) in corners.iter().enumerate() {
                vertices.push(Vertex::new(*position, *normal, WHITE, uvs[corner]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// Square pyramid with a unit base on the XZ plane and apex at y = 0.8
    pub fn pyramid() -> Self {
        let apex = [0.0, 0.8, 0.0];

        // Side normals tilt outward by the slope of height over half-base
        let side_angle = (0.8f32).atan2(0.5);
        let ny = (std::f32::consts::FRAC_PI_2 - side_angle).sin();
        let nxz = (std::f32::consts::FRAC_PI_2 - side_angle).cos();

        let norm_front = [0.0, ny, nxz];
        let norm_back = [0.0, ny, -nxz];
        let norm_left = [-nxz, ny, 0.0];
        let norm_right = [nxz, ny, 0.0];
        let norm_down = [0.0, -1.0, 0.0];

        let vertices = vec![
            // Base, facing down
            Vertex::new([-0.5, 0.0, 0.5], norm_down, WHITE, [0.0, 0.0]),
            Vertex::new([-0.5, 0.0, -0.5], norm_down, WHITE, [0.0, 1.0]),
            Vertex::new([0.5, 0.0, -0.5], norm_down, WHITE, [1.0, 1.0]),
            Vertex::new([0.5, 0.0, 0.5], norm_down, WHITE, [1.0, 0.0]),
            // Front (+Z)
            Vertex::new([-0.5, 0.0, 0.5], norm_front, WHITE, [0.0, 0.0]),
            Vertex::new([0.5, 0.0, 0.5], norm_front, WHITE, [1.0, 0.0]),
            Vertex::new(apex, norm_front, WHITE, [0.5, 1.0]),
            // Right (+X)
            Vertex::new([0.5, 0.0, 0.5], norm_right, WHITE, [0.0, 0.0]),
            Vertex::new([0.5, 0.0, -0.5], norm_right, WHITE, [1.0, 0.0]),
            Vertex::new(apex, norm_right, WHITE, [0.5, 1.0]),
            // Back (-Z)
            Vertex::new([0.5, 0.0, -0.5], norm_back, WHITE, [0.0, 0.0]),
            Vertex::new([-0.5, 0.0, -0.5], norm_back, WHITE, [1.0, 0.0]),
            Vertex::new(apex, norm_back, WHITE, [0.5, 1.0]),
            // Left (-X)
            Vertex::new([-0.5, 0.0, -0.5], norm_left, WHITE, [0.0, 0.0]),
            Vertex::new([-0.5, 0.0, 0.5], norm_left, WHITE, [1.0, 0.0]),
            Vertex::new(apex, norm_left, WHITE, [0.5, 1.0]),
        ];

        let indices = vec![
            0, 2, 1, 0, 3, 2, // base
            4, 5, 6, // front
            7, 8, 9, // right
            10, 11, 12, // back
            13, 14, 15, // left
        ];

        Self::new(vertices, indices)
    }

    /// Flat plane on the XZ plane, normal pointing up
    pub fn plane(size: f32) -> Self {
        let half = size / 2.0;
        let up = [0.0, 1.0, 0.0];

        let vertices = vec![
            Vertex::new([-half, 0.0, -half], up, WHITE, [0.0, 0.0]),
            Vertex::new([half, 0.0, -half], up, WHITE, [1.0, 0.0]),
            Vertex::new([half, 0.0, half], up, WHITE, [1.0, 1.0]),
            Vertex::new([-half, 0.0, half], up, WHITE, [0.0, 1.0]),
        ];

        let indices = vec![0, 1, 2, 2, 3, 0];

        Self::new(vertices, indices)
    }
}

/// Draw-call helpers for meshes bound to a render pass
pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let vertex_buffer = match &mesh.vertex_buffer {
            Some(buffer) => buffer,
            None => return, // Skip drawing if not uploaded
        };
        let index_buffer = match &mesh.index_buffer {
            Some(buffer) => buffer,
            None => return,
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_one_face_worth_of_vertices_per_side() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn pyramid_counts() {
        let pyramid = Mesh::pyramid();
        assert_eq!(pyramid.vertex_count(), 16);
        assert_eq!(pyramid.index_count(), 18);
    }

    #[test]
    fn plane_counts_and_extent() {
        let plane = Mesh::plane(4.0);
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.index_count(), 6);
        for v in plane.vertices() {
            assert!(v.position[0].abs() <= 2.0);
            assert!(v.position[2].abs() <= 2.0);
            assert_eq!(v.position[1], 0.0);
        }
    }

    #[test]
    fn cube_indices_stay_in_bounds() {
        let cube = Mesh::cube();
        let count = cube.vertex_count();
        assert!(cube.indices().iter().all(|&i| i < count));
    }

    #[test]
    fn factory_normals_are_unit_length() {
        for mesh in [Mesh::cube(), Mesh::pyramid(), Mesh::plane(1.0)] {
            for v in mesh.vertices() {
                let len =
                    (v.normal[0].powi(2) + v.normal[1].powi(2) + v.normal[2].powi(2)).sqrt();
                assert!((len - 1.0).abs() < 1e-5);
            }
        }
    }
}

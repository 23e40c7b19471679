//! Skybox rendering from a pre-built cubemap
//!
//! The skybox draws a unit cube around the camera with a rotation-only view
//! matrix. Its pipeline bakes the relaxed depth state (no depth writes,
//! compare `LessEqual`) so the sky fills exactly the pixels no geometry
//! touched, and no depth state has to be saved or restored around the draw.

use cgmath::{Matrix4, Vector4};
use log::info;
use wgpu::util::DeviceExt;

use crate::gfx::camera::Camera;
use crate::gfx::texture::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
use super::RenderError;

/// Position-only vertex used by the skybox and cubemap capture cubes
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxVertex {
    pub position: [f32; 3],
}

impl SkyboxVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkyboxVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Unit cube, 36 vertices, drawn without an index buffer
#[rustfmt::skip]
pub(crate) const CUBE_POSITIONS: [[f32; 3]; 36] = [
    [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

    [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

    [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
];

pub(crate) fn cube_vertex_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    let vertices: Vec<SkyboxVertex> = CUBE_POSITIONS
        .iter()
        .map(|&position| SkyboxVertex { position })
        .collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyboxUniform {
    view_proj: [[f32; 4]; 4],
}

/// Draws a cubemap as the scene background
pub struct Skybox {
    cubemap: TextureResource,
    pipeline: wgpu::RenderPipeline,
    uniform: UniformBuffer<SkyboxUniform>,
    uniform_bind_group: wgpu::BindGroup,
    cubemap_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
}

impl Skybox {
    /// Fails if `cubemap` is not a cube texture. This is a caller contract
    /// check, not a recoverable data condition.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        cubemap: TextureResource,
    ) -> Result<Self, RenderError> {
        if !cubemap.is_cubemap() {
            return Err(RenderError::NotACubemap);
        }

        let uniform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Skybox Uniform Layout");

        let cubemap_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Skybox Cubemap Layout");

        let uniform = UniformBuffer::new_with_data(
            device,
            &SkyboxUniform {
                view_proj: Matrix4::from_scale(1.0).into(),
            },
        );

        let uniform_bind_group = BindGroupBuilder::new(&uniform_layout)
            .resource(uniform.binding_resource())
            .create(device, "Skybox Uniform Bind Group");

        let cubemap_bind_group = BindGroupBuilder::new(&cubemap_layout)
            .texture(&cubemap.view)
            .sampler(&cubemap.sampler)
            .create(device, "Skybox Cubemap Bind Group");

        let mut pipelines = PipelineManager::new(std::sync::Arc::new(device.clone()));
        pipelines.load_shader("skybox", include_str!("skybox.wgsl"));
        pipelines.register_pipeline(
            "skybox",
            PipelineConfig::default()
                .with_label("SKYBOX")
                .with_shader("skybox")
                .with_bind_group_layouts(vec![
                    uniform_layout.layout.clone(),
                    cubemap_layout.layout.clone(),
                ])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_cull_mode(None)
                .with_depth(depth_format)
                .with_depth_state(false, wgpu::CompareFunction::LessEqual)
                .with_vertex_layout(VertexLayout::PositionOnly),
        );
        let pipeline = pipelines
            .get_pipeline("skybox")
            .expect("skybox pipeline creation cannot fail with a valid device")
            .clone();

        let vertex_buffer = cube_vertex_buffer(device, "Skybox Cube");

        info!("skybox created");

        Ok(Self {
            cubemap,
            pipeline,
            uniform,
            uniform_bind_group,
            cubemap_bind_group,
            vertex_buffer,
        })
    }

    /// Uploads the rotation-only view-projection for this frame
    pub fn update(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        let mut view = camera.view_matrix();
        view.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
        let view_proj = camera.projection_matrix() * view;
        self.uniform.update_content(
            queue,
            SkyboxUniform {
                view_proj: view_proj.into(),
            },
        );
    }

    /// Draws the skybox into an open pass. Call after scene geometry so the
    /// depth test discards covered pixels.
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.cubemap_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..CUBE_POSITIONS.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_covers_all_six_directions() {
        // Every axis direction must appear as a face (6 faces x 2 triangles)
        assert_eq!(CUBE_POSITIONS.len(), 36);
        for axis in 0..3 {
            for sign in [-1.0f32, 1.0] {
                let on_face = CUBE_POSITIONS
                    .iter()
                    .filter(|p| p[axis] == sign)
                    .count();
                assert!(on_face >= 6, "axis {} sign {} underrepresented", axis, sign);
            }
        }
    }

    #[test]
    fn cube_vertices_are_unit_extent() {
        for p in CUBE_POSITIONS {
            assert!(p.iter().all(|c| c.abs() == 1.0));
        }
    }
}

//! Equirectangular-to-cubemap conversion
//!
//! Renders the six faces of a cubemap by drawing a unit cube through six
//! fixed look-at orientations sharing one 90-degree projection, sampling the
//! equirectangular source in the fragment stage. After the faces are
//! captured, the full mip chain is generated face by face with downsampling
//! blit passes.

use cgmath::{Deg, Matrix4, Point3, Vector3};
use log::{error, info};

use crate::gfx::camera::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::texture::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
use super::skybox::cube_vertex_buffer;
use super::RenderError;

const MAX_RESOLUTION: u32 = 8192;

/// Face size validation, checked before any GPU allocation happens
pub(crate) fn valid_resolution(resolution: u32) -> bool {
    (1..=MAX_RESOLUTION).contains(&resolution)
}

/// The six capture orientations, in cubemap face order (+X, -X, +Y, -Y, +Z, -Z)
pub(crate) fn face_views() -> [Matrix4<f32>; 6] {
    let origin = Point3::new(0.0f32, 0.0, 0.0);
    let look = |target: [f32; 3], up: [f32; 3]| {
        Matrix4::look_at_rh(
            origin,
            Point3::new(target[0], target[1], target[2]),
            Vector3::new(up[0], up[1], up[2]),
        )
    };
    [
        look([1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        look([-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        look([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        look([0.0, -1.0, 0.0], [0.0, 0.0, -1.0]),
        look([0.0, 0.0, 1.0], [0.0, -1.0, 0.0]),
        look([0.0, 0.0, -1.0], [0.0, -1.0, 0.0]),
    ]
}

/// 90-degree projection covering one face exactly
pub(crate) fn capture_projection() -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(90.0), 1.0, 0.1, 10.0)
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CaptureUniform {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
}

/// Converts an equirectangular map into a mipmapped cubemap.
///
/// Validates the requested resolution (1..=8192) and that the source is a
/// plain 2D texture before allocating anything. The whole operation is
/// submitted synchronously on the given queue.
pub fn equirectangular_to_cubemap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &TextureResource,
    resolution: u32,
) -> Result<TextureResource, RenderError> {
    if !valid_resolution(resolution) {
        error!(
            "cubemap conversion: invalid resolution {} (must be 1-{})",
            resolution, MAX_RESOLUTION
        );
        return Err(RenderError::InvalidResolution(resolution));
    }
    if source.texture.size().depth_or_array_layers != 1 {
        error!("cubemap conversion: source must be a 2D texture");
        return Err(RenderError::InvalidSource);
    }

    info!(
        "converting equirectangular map to cubemap ({0}x{0} per face)",
        resolution
    );

    let format = TextureResource::HDR_FORMAT;
    let mip_level_count = resolution.ilog2() + 1;

    let cubemap_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Cubemap"),
        size: wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 6,
        },
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });

    // Depth target shared by the six capture passes
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Cubemap Capture Depth"),
        size: wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TextureResource::DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

    // Layouts: group 0 = capture matrices, group 1 = equirect source
    let uniform_layout = BindGroupLayoutBuilder::new()
        .next_binding_vertex(binding_types::uniform())
        .create(device, "Capture Uniform Layout");
    let source_layout = BindGroupLayoutBuilder::new()
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
        .create(device, "Capture Source Layout");

    let source_bind_group = BindGroupBuilder::new(&source_layout)
        .texture(&source.view)
        .sampler(&source.sampler)
        .create(device, "Capture Source Bind Group");

    let projection = capture_projection();
    let face_uniforms: Vec<(UniformBuffer<CaptureUniform>, wgpu::BindGroup)> = face_views()
        .into_iter()
        .map(|view| {
            let uniform = UniformBuffer::new_with_data(
                device,
                &CaptureUniform {
                    view: view.into(),
                    proj: projection.into(),
                },
            );
            let bind_group = BindGroupBuilder::new(&uniform_layout)
                .resource(uniform.binding_resource())
                .create(device, "Capture Face Bind Group");
            (uniform, bind_group)
        })
        .collect();

    let mut pipelines = PipelineManager::new(std::sync::Arc::new(device.clone()));
    pipelines.load_shader("equirect_to_cube", include_str!("equirect_to_cube.wgsl"));
    pipelines.load_shader("blit", include_str!("blit.wgsl"));

    pipelines.register_pipeline(
        "capture",
        PipelineConfig::default()
            .with_label("CUBEMAP CAPTURE")
            .with_shader("equirect_to_cube")
            .with_bind_group_layouts(vec![
                uniform_layout.layout.clone(),
                source_layout.layout.clone(),
            ])
            .with_color_targets(vec![Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })])
            .with_cull_mode(None)
            .with_depth(TextureResource::DEPTH_FORMAT)
            .with_vertex_layout(VertexLayout::PositionOnly),
    );
    pipelines.register_pipeline(
        "blit",
        PipelineConfig::default()
            .with_label("CUBEMAP MIP BLIT")
            .with_shader("blit")
            .with_bind_group_layouts(vec![source_layout.layout.clone()])
            .with_color_targets(vec![Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })])
            .with_cull_mode(None)
            .with_vertex_layout(VertexLayout::None),
    );

    let capture_pipeline = pipelines
        .get_pipeline("capture")
        .expect("capture pipeline creation cannot fail with a valid device")
        .clone();
    let blit_pipeline = pipelines
        .get_pipeline("blit")
        .expect("blit pipeline creation cannot fail with a valid device")
        .clone();

    let cube_vertices = cube_vertex_buffer(device, "Capture Cube");

    let face_view = |face: u32, mip: u32| {
        cubemap_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Cubemap Face View"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: mip,
            mip_level_count: Some(1),
            base_array_layer: face,
            array_layer_count: Some(1),
            ..Default::default()
        })
    };

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Cubemap Conversion Encoder"),
    });

    // Capture each face at mip 0
    for (face, (_uniform, bind_group)) in face_uniforms.iter().enumerate() {
        let target = face_view(face as u32, 0);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Cubemap Face Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_pipeline(&capture_pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_bind_group(1, &source_bind_group, &[]);
        pass.set_vertex_buffer(0, cube_vertices.slice(..));
        pass.draw(0..36, 0..1);
    }

    // Downsample the mip chain, face by face
    let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Cubemap Blit Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    for mip in 1..mip_level_count {
        for face in 0..6 {
            let source_view = face_view(face, mip - 1);
            let target_view = face_view(face, mip);
            let blit_bind_group = BindGroupBuilder::new(&source_layout)
                .texture(&source_view)
                .sampler(&blit_sampler)
                .create(device, "Cubemap Blit Bind Group");

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cubemap Mip Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&blit_pipeline);
            pass.set_bind_group(0, &blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }

    queue.submit(std::iter::once(encoder.finish()));

    let cube_view = cubemap_texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Cubemap View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Cubemap Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    info!("cubemap conversion complete ({} mip levels)", mip_level_count);

    Ok(TextureResource {
        texture: cubemap_texture,
        view: cube_view,
        sampler,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, SquareMatrix, Vector4};

    #[test]
    fn resolution_bounds() {
        assert!(!valid_resolution(0));
        assert!(valid_resolution(1));
        assert!(valid_resolution(512));
        assert!(valid_resolution(8192));
        assert!(!valid_resolution(9000));
    }

    #[test]
    fn six_distinct_face_orientations() {
        let views = face_views();
        for (i, a) in views.iter().enumerate() {
            for b in views.iter().skip(i + 1) {
                let mut differs = false;
                for col in 0..4 {
                    for row in 0..4 {
                        if (a[col][row] - b[col][row]).abs() > 1e-6 {
                            differs = true;
                        }
                    }
                }
                assert!(differs);
            }
        }
    }

    #[test]
    fn face_views_are_pure_rotations() {
        // Capture views look from the origin, so the inverse-transpose equals
        // the matrix itself on the rotation block and translation stays zero.
        for view in face_views() {
            assert!((view.w.x).abs() < 1e-6);
            assert!((view.w.y).abs() < 1e-6);
            assert!((view.w.z).abs() < 1e-6);
            let det = view.determinant();
            assert!((det.abs() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn each_face_looks_down_its_axis() {
        let directions = [
            Vector4::new(1.0f32, 0.0, 0.0, 0.0),
            Vector4::new(-1.0, 0.0, 0.0, 0.0),
            Vector4::new(0.0, 1.0, 0.0, 0.0),
            Vector4::new(0.0, -1.0, 0.0, 0.0),
            Vector4::new(0.0, 0.0, 1.0, 0.0),
            Vector4::new(0.0, 0.0, -1.0, 0.0),
        ];
        for (view, direction) in face_views().iter().zip(directions) {
            // The face axis must map onto the view-space forward (-Z)
            let transformed = view * direction;
            let v = cgmath::Vector3::new(transformed.x, transformed.y, transformed.z).normalize();
            assert!((v.z + 1.0).abs() < 1e-5, "face axis not mapped to -Z: {:?}", v);
        }
    }
}

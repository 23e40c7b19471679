//! Scene objects: mesh + texture handles, transform, and per-object GPU state

use cgmath::Matrix4;

use crate::gfx::assets::{Assets, MeshHandle, TextureHandle};
use crate::gfx::camera::Camera;
use crate::gfx::transform::Transform;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Per-object uniform data uploaded before each frame.
///
/// Must match the `ObjectUniform` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub mvp: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x = roughness, y = metallic, z/w unused
    pub material: [f32; 4],
}

/// GPU-side state for one scene object
pub struct ObjectGpuResources {
    uniform: UniformBuffer<ObjectUniform>,
    pub uniform_bind_group: wgpu::BindGroup,
    pub texture_bind_group: Option<wgpu::BindGroup>,
    /// Texture the bind group was built from, so a swap gets picked up
    bound_texture: Option<TextureHandle>,
}

/// Everything needed to draw one object in the scene.
///
/// Meshes and textures are referenced by pool handle; many objects may share
/// the same geometry or texture. The transform, tint, and material scalars
/// are unique per object and freely mutable between frames.
pub struct SceneObject {
    pub mesh: MeshHandle,
    pub texture: Option<TextureHandle>,
    pub transform: Transform,
    /// Per-object tint, multiplied into the fragment color
    pub color: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
    pub active: bool,
    pub name: String,

    pub(crate) gpu: Option<ObjectGpuResources>,
}

impl SceneObject {
    pub fn new(mesh: MeshHandle, name: &str) -> Self {
        Self {
            mesh,
            texture: None,
            transform: Transform::default(),
            color: [1.0, 1.0, 1.0, 1.0],
            roughness: 0.5,
            metallic: 0.0,
            active: true,
            name: name.to_string(),
            gpu: None,
        }
    }

    /// Builds the uniform data for the current frame
    pub fn uniform(&self, camera: &Camera) -> ObjectUniform {
        let model = self.transform.model_matrix();
        let mvp: Matrix4<f32> = camera.view_projection_matrix() * model;
        ObjectUniform {
            mvp: mvp.into(),
            model: model.into(),
            color: self.color,
            material: [self.roughness, self.metallic, 0.0, 0.0],
        }
    }

    /// Creates missing GPU resources and refreshes the texture bind group
    /// if the object's texture handle changed since the last call.
    pub(crate) fn ensure_gpu_resources(&mut self, device: &wgpu::Device, assets: &Assets) {
        if self.gpu.is_none() {
            let uniform = UniformBuffer::<ObjectUniform>::new(device);

            let layout = object_bind_group_layout(device);
            let uniform_bind_group = BindGroupBuilder::new(&layout)
                .resource(uniform.binding_resource())
                .create(device, "Object Bind Group");

            self.gpu = Some(ObjectGpuResources {
                uniform,
                uniform_bind_group,
                texture_bind_group: None,
                bound_texture: None,
            });
        }

        let needs_texture_rebind = self
            .gpu
            .as_ref()
            .map(|gpu| gpu.bound_texture != self.texture)
            .unwrap_or(false);

        if needs_texture_rebind {
            let bind_group = self.texture.and_then(|handle| {
                let resource = assets.texture(handle)?.gpu()?;
                let layout = texture_bind_group_layout(device);
                Some(
                    BindGroupBuilder::new(&layout)
                        .texture(&resource.view)
                        .sampler(&resource.sampler)
                        .create(device, "Object Texture Bind Group"),
                )
            });

            // An unuploaded texture keeps the previous binding until it lands
            if bind_group.is_some() || self.texture.is_none() {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.texture_bind_group = bind_group;
                    gpu.bound_texture = self.texture;
                }
            }
        }
    }

    /// Writes this object's uniform for the frame
    pub(crate) fn update_uniform(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        let content = self.uniform(camera);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.uniform.update_content(queue, content);
        }
    }
}

/// Layout for the per-object texture bind group (texture + sampler)
pub fn texture_bind_group_layout(
    device: &wgpu::Device,
) -> crate::wgpu_utils::binding_builder::BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
        .create(device, "Texture Bind Group Layout")
}

/// Layout for the per-object uniform bind group
pub fn object_bind_group_layout(
    device: &wgpu::Device,
) -> crate::wgpu_utils::binding_builder::BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_rendering(binding_types::uniform())
        .create(device, "Object Bind Group Layout")
}

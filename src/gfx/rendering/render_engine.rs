//! WGPU-based rendering engine
//!
//! Owns the surface, device, and queue, renders the scene into an HDR
//! offscreen target, runs the bloom pipeline over it, and composites the
//! result (tonemapped) onto the swapchain, with an optional skybox pass and
//! UI overlay. All GPU binding state is shared mutable state; everything here
//! runs on the single render thread in strict call order.

use std::path::Path;
use std::sync::Arc;

use log::info;
use wgpu::TextureFormat;

use crate::gfx::assets::Assets;
use crate::gfx::camera::Camera;
use crate::gfx::scene::object::{object_bind_group_layout, texture_bind_group_layout};
use crate::gfx::scene::scene::Scene;
use crate::gfx::texture::{Texture, TextureResource};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::bloom::Bloom;
use super::cubemap::equirectangular_to_cubemap;
use super::global_bindings::{GlobalBindings, GlobalUbo};
use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
use super::skybox::Skybox;
use super::RenderError;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeUniform {
    /// x = bloom strength, y = exposure
    params: [f32; 4],
}

/// Core rendering engine managing GPU resources and draw submission
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,

    depth_texture: TextureResource,
    hdr_target: TextureResource,

    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUbo,
    global_bindings: GlobalBindings,

    // Fallback binding for objects without a texture
    _white_texture: Texture,
    white_bind_group: wgpu::BindGroup,

    bloom: Bloom,
    bloom_enabled: bool,
    bloom_strength: f32,
    exposure: f32,

    composite_source_layout: BindGroupLayoutWithDesc,
    composite_input_bind_group: wgpu::BindGroup,
    composite_uniform: UniformBuffer<CompositeUniform>,
    composite_uniform_bind_group: wgpu::BindGroup,

    skybox: Option<Skybox>,
    clear_color: wgpu::Color,
}

impl RenderEngine {
    /// Creates a render engine for the given window.
    ///
    /// # Panics
    /// Panics if no adapter or device can be created; the engine cannot
    /// produce valid output without a working GPU context.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        // Float32 filtering covers linear sampling of .hdr equirect sources;
        // requested only where the adapter offers it
        let features = adapter.features() & wgpu::Features::FLOAT32_FILTERABLE;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: features,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request a device!");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::Immediate
            },
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let hdr_target = TextureResource::create_render_target(
            &device,
            width,
            height,
            TextureResource::HDR_FORMAT,
            "HDR Target",
        );

        let global_ubo = GlobalUbo::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let object_layout = object_bind_group_layout(&device);
        let texture_layout = texture_bind_group_layout(&device);

        // Fallback white texture for untextured objects
        let mut white_texture = Texture::white();
        white_texture.upload(&device, &queue);
        let white_gpu = white_texture
            .gpu()
            .expect("white texture upload cannot fail");
        let white_bind_group = BindGroupBuilder::new(&texture_layout)
            .texture(&white_gpu.view)
            .sampler(&white_gpu.sampler)
            .create(&device, "White Texture Bind Group");

        // Composite bindings: scene color + bloom output, plus parameters
        let composite_source_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Composite Source Layout");
        let composite_uniform_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(&device, "Composite Uniform Layout");

        let composite_uniform = UniformBuffer::new_with_data(
            &device,
            &CompositeUniform {
                params: [0.6, 1.0, 0.0, 0.0],
            },
        );
        let composite_uniform_bind_group = BindGroupBuilder::new(&composite_uniform_layout)
            .resource(composite_uniform.binding_resource())
            .create(&device, "Composite Uniform Bind Group");

        let bloom = Bloom::new(&device, &hdr_target.view, width, height, 1.0, 0.5, 5);

        let composite_input_bind_group = BindGroupBuilder::new(&composite_source_layout)
            .texture(&hdr_target.view)
            .sampler(&hdr_target.sampler)
            .texture(bloom.output_view())
            .sampler(bloom.output_sampler())
            .create(&device, "Composite Input Bind Group");

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("pbr", include_str!("pbr.wgsl"));
        pipeline_manager.load_shader("composite", include_str!("composite.wgsl"));

        pipeline_manager.register_pipeline(
            "Scene",
            PipelineConfig::default()
                .with_label("SCENE")
                .with_shader("pbr")
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    object_layout.layout.clone(),
                    texture_layout.layout.clone(),
                ])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: TextureResource::HDR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_depth(TextureResource::DEPTH_FORMAT),
        );

        pipeline_manager.register_pipeline(
            "Composite",
            PipelineConfig::default()
                .with_label("COMPOSITE")
                .with_shader("composite")
                .with_bind_group_layouts(vec![
                    composite_source_layout.layout.clone(),
                    composite_uniform_layout.layout.clone(),
                ])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_cull_mode(None)
                .with_vertex_layout(VertexLayout::None),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }

        info!("render engine initialized ({}x{}, {:?})", width, height, format);

        RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            depth_texture,
            hdr_target,
            pipeline_manager,
            global_ubo,
            global_bindings,
            _white_texture: white_texture,
            white_bind_group,
            bloom,
            bloom_enabled: true,
            bloom_strength: 0.6,
            exposure: 1.0,
            composite_source_layout,
            composite_input_bind_group,
            composite_uniform,
            composite_uniform_bind_group,
            skybox: None,
            clear_color: wgpu::Color {
                r: 0.02,
                g: 0.02,
                b: 0.03,
                a: 1.0,
            },
        }
    }

    /// Uploads per-frame global uniforms for the camera and skybox
    pub fn update(&mut self, camera: &Camera) {
        self.global_ubo.update_content(&self.queue, camera.uniform());
        if let Some(skybox) = self.skybox.as_mut() {
            skybox.update(&self.queue, camera);
        }

        let strength = if self.bloom_enabled {
            self.bloom_strength
        } else {
            0.0
        };
        self.composite_uniform.update_content(
            &self.queue,
            CompositeUniform {
                params: [strength, self.exposure, 0.0, 0.0],
            },
        );
    }

    /// Renders one frame: scene + skybox into the HDR target, bloom, then
    /// composite to the swapchain and an optional UI overlay.
    pub fn render_frame<F>(&mut self, scene: &Scene, assets: &Assets, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = self
            .surface
            .get_current_texture()
            .expect("Failed to get surface texture!");

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Scene pass into the HDR target
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Scene") {
                render_pass.set_pipeline(pipeline);
                scene.render(&mut render_pass, assets, &self.white_bind_group);
            }

            // Sky fills whatever the geometry left untouched
            if let Some(skybox) = self.skybox.as_ref() {
                skybox.render(&mut render_pass);
            }
        }

        // Bloom over the HDR color
        if self.bloom_enabled {
            self.bloom.process(&mut encoder);
        }

        // Composite to the swapchain
        {
            let mut composite_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
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

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Composite") {
                composite_pass.set_pipeline(pipeline);
                composite_pass.set_bind_group(0, &self.composite_input_bind_group, &[]);
                composite_pass.set_bind_group(1, &self.composite_uniform_bind_group, &[]);
                composite_pass.draw(0..3, 0..1);
            }
        }

        // UI overlay
        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Convenience method for rendering without UI
    pub fn render_frame_simple(&mut self, scene: &Scene, assets: &Assets) {
        self.render_frame(
            scene,
            assets,
            None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        );
    }

    /// Resizes the surface and recreates all size-dependent targets
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
        self.hdr_target = TextureResource::create_render_target(
            &self.device,
            width,
            height,
            TextureResource::HDR_FORMAT,
            "HDR Target",
        );

        self.bloom = Bloom::new(
            &self.device,
            &self.hdr_target.view,
            width,
            height,
            self.bloom.threshold(),
            self.bloom.knee(),
            self.bloom.blur_passes(),
        );

        self.composite_input_bind_group = BindGroupBuilder::new(&self.composite_source_layout)
            .texture(&self.hdr_target.view)
            .sampler(&self.hdr_target.sampler)
            .texture(self.bloom.output_view())
            .sampler(self.bloom.output_sampler())
            .create(&self.device, "Composite Input Bind Group");
    }

    /// Loads an equirectangular image, converts it to a cubemap, and installs
    /// it as the scene skybox.
    pub fn set_skybox_from_equirect(
        &mut self,
        path: &Path,
        resolution: u32,
    ) -> Result<(), RenderError> {
        let mut equirect = Texture::from_file(path)?;
        equirect.upload(&self.device, &self.queue);
        let source = equirect
            .gpu()
            .ok_or(RenderError::InvalidSource)?;

        let cubemap = equirectangular_to_cubemap(&self.device, &self.queue, source, resolution)?;
        let skybox = Skybox::new(
            &self.device,
            TextureResource::HDR_FORMAT,
            TextureResource::DEPTH_FORMAT,
            cubemap,
        )?;
        self.skybox = Some(skybox);
        Ok(())
    }

    pub fn set_skybox(&mut self, skybox: Option<Skybox>) {
        self.skybox = skybox;
    }

    pub fn has_skybox(&self) -> bool {
        self.skybox.is_some()
    }

    // Bloom and composite controls

    pub fn set_bloom_enabled(&mut self, enabled: bool) {
        self.bloom_enabled = enabled;
    }

    pub fn bloom_enabled(&self) -> bool {
        self.bloom_enabled
    }

    pub fn set_bloom_params(&mut self, threshold: f32, knee: f32) {
        self.bloom.set_params(&self.queue, threshold, knee);
    }

    pub fn set_bloom_strength(&mut self, strength: f32) {
        self.bloom_strength = strength.max(0.0);
    }

    pub fn bloom_strength(&self) -> f32 {
        self.bloom_strength
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure.max(0.0);
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Switches between vsync (Fifo) and immediate presentation
    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = if enable {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::Immediate
        };
        self.surface.configure(&self.device, &self.config);
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

//! HDR bloom: bright-pass extraction followed by separable Gaussian blur
//!
//! Three fixed-size float targets are allocated up front: one for the
//! extracted bright regions and two that ping-pong through the blur passes.
//! The number of blur passes is pinned at construction, which makes the
//! output target a pure function of the configuration — `process` writes the
//! same sequence of passes every frame and always ends on the same texture.

use log::info;

use crate::gfx::texture::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};

/// Which internal target holds the final bloom result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloomSlot {
    Extract,
    Ping,
    Pong,
}

/// One blur sub-pass: sample `source`, write `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlurStep {
    pub source: BloomSlot,
    pub target: BloomSlot,
    pub horizontal: bool,
}

/// Sub-pass schedule for `blur_passes` blur iterations.
///
/// The first pass reads the extract target; after that, source and target
/// strictly alternate between the two ping-pong textures while the blur
/// direction alternates by pass parity.
pub(crate) fn blur_schedule(blur_passes: u32) -> Vec<BlurStep> {
    let mut steps = Vec::with_capacity(2 * blur_passes as usize);
    for k in 0..2 * blur_passes {
        let target = if k % 2 == 0 {
            BloomSlot::Ping
        } else {
            BloomSlot::Pong
        };
        let source = if k == 0 {
            BloomSlot::Extract
        } else if k % 2 == 1 {
            BloomSlot::Ping
        } else {
            BloomSlot::Pong
        };
        steps.push(BlurStep {
            source,
            target,
            horizontal: k % 2 == 0,
        });
    }
    steps
}

/// Final output target for a given pass count
pub fn output_slot(blur_passes: u32) -> BloomSlot {
    if blur_passes == 0 {
        BloomSlot::Extract
    } else {
        BloomSlot::Pong
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ExtractUniform {
    /// x = threshold, y = knee
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurUniform {
    /// xy = direction, zw = texel size
    params: [f32; 4],
}

/// Bloom post-processing pipeline at a fixed resolution
pub struct Bloom {
    width: u32,
    height: u32,
    threshold: f32,
    knee: f32,
    blur_passes: u32,

    extract_target: TextureResource,
    ping: TextureResource,
    pong: TextureResource,

    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,

    extract_input_bind_group: wgpu::BindGroup,
    extract_uniform: UniformBuffer<ExtractUniform>,
    extract_uniform_bind_group: wgpu::BindGroup,

    source_extract_bind_group: wgpu::BindGroup,
    source_ping_bind_group: wgpu::BindGroup,
    source_pong_bind_group: wgpu::BindGroup,
    horizontal_bind_group: wgpu::BindGroup,
    vertical_bind_group: wgpu::BindGroup,
}

impl Bloom {
    /// Creates the bloom pipeline.
    ///
    /// `hdr_view` is the scene color texture sampled by the bright pass;
    /// `blur_passes` is fixed for the lifetime of this instance.
    pub fn new(
        device: &wgpu::Device,
        hdr_view: &wgpu::TextureView,
        width: u32,
        height: u32,
        threshold: f32,
        knee: f32,
        blur_passes: u32,
    ) -> Self {
        let format = TextureResource::HDR_FORMAT;

        let extract_target =
            TextureResource::create_render_target(device, width, height, format, "Bloom Extract");
        let ping = TextureResource::create_render_target(device, width, height, format, "Bloom Ping");
        let pong = TextureResource::create_render_target(device, width, height, format, "Bloom Pong");

        // Layouts: group 0 = source texture + sampler, group 1 = pass uniform
        let source_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Bloom Source Layout");

        let uniform_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Bloom Uniform Layout");

        // Uniforms
        let extract_uniform = UniformBuffer::new_with_data(
            device,
            &ExtractUniform {
                params: [threshold, knee, 0.0, 0.0],
            },
        );
        let texel = [1.0 / width as f32, 1.0 / height as f32];
        let horizontal_uniform = UniformBuffer::new_with_data(
            device,
            &BlurUniform {
                params: [1.0, 0.0, texel[0], texel[1]],
            },
        );
        let vertical_uniform = UniformBuffer::new_with_data(
            device,
            &BlurUniform {
                params: [0.0, 1.0, texel[0], texel[1]],
            },
        );

        // Bind groups
        let extract_input_bind_group = BindGroupBuilder::new(&source_layout)
            .texture(hdr_view)
            .sampler(&extract_target.sampler)
            .create(device, "Bloom Extract Input");

        let extract_uniform_bind_group = BindGroupBuilder::new(&uniform_layout)
            .resource(extract_uniform.binding_resource())
            .create(device, "Bloom Extract Params");

        let source_extract_bind_group = BindGroupBuilder::new(&source_layout)
            .texture(&extract_target.view)
            .sampler(&extract_target.sampler)
            .create(device, "Bloom Source Extract");
        let source_ping_bind_group = BindGroupBuilder::new(&source_layout)
            .texture(&ping.view)
            .sampler(&ping.sampler)
            .create(device, "Bloom Source Ping");
        let source_pong_bind_group = BindGroupBuilder::new(&source_layout)
            .texture(&pong.view)
            .sampler(&pong.sampler)
            .create(device, "Bloom Source Pong");

        let horizontal_bind_group = BindGroupBuilder::new(&uniform_layout)
            .resource(horizontal_uniform.binding_resource())
            .create(device, "Bloom Horizontal");
        let vertical_bind_group = BindGroupBuilder::new(&uniform_layout)
            .resource(vertical_uniform.binding_resource())
            .create(device, "Bloom Vertical");

        // Pipelines (fullscreen triangle, no vertex buffers)
        let mut pipelines = PipelineManager::new(std::sync::Arc::new(device.clone()));
        pipelines.load_shader("bloom_extract", include_str!("bloom_extract.wgsl"));
        pipelines.load_shader("bloom_blur", include_str!("bloom_blur.wgsl"));

        let color_target = vec![Some(wgpu::ColorTargetState {
            format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        pipelines.register_pipeline(
            "extract",
            PipelineConfig::default()
                .with_label("BLOOM EXTRACT")
                .with_shader("bloom_extract")
                .with_bind_group_layouts(vec![
                    source_layout.layout.clone(),
                    uniform_layout.layout.clone(),
                ])
                .with_color_targets(color_target.clone())
                .with_cull_mode(None)
                .with_vertex_layout(VertexLayout::None),
        );
        pipelines.register_pipeline(
            "blur",
            PipelineConfig::default()
                .with_label("BLOOM BLUR")
                .with_shader("bloom_blur")
                .with_bind_group_layouts(vec![
                    source_layout.layout.clone(),
                    uniform_layout.layout.clone(),
                ])
                .with_color_targets(color_target)
                .with_cull_mode(None)
                .with_vertex_layout(VertexLayout::None),
        );

        let extract_pipeline = pipelines.get_pipeline("extract").unwrap().clone();
        let blur_pipeline = pipelines.get_pipeline("blur").unwrap().clone();

        info!(
            "bloom created: {}x{}, {} blur passes",
            width, height, blur_passes
        );

        Self {
            width,
            height,
            threshold,
            knee,
            blur_passes,
            extract_target,
            ping,
            pong,
            extract_pipeline,
            blur_pipeline,
            extract_input_bind_group,
            extract_uniform,
            extract_uniform_bind_group,
            source_extract_bind_group,
            source_ping_bind_group,
            source_pong_bind_group,
            horizontal_bind_group,
            vertical_bind_group,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn knee(&self) -> f32 {
        self.knee
    }

    pub fn blur_passes(&self) -> u32 {
        self.blur_passes
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Updates the bright-pass parameters for subsequent frames
    pub fn set_params(&mut self, queue: &wgpu::Queue, threshold: f32, knee: f32) {
        self.threshold = threshold;
        self.knee = knee.max(1e-4);
        self.extract_uniform.update_content(
            queue,
            ExtractUniform {
                params: [self.threshold, self.knee, 0.0, 0.0],
            },
        );
    }

    fn view_for(&self, slot: BloomSlot) -> &wgpu::TextureView {
        match slot {
            BloomSlot::Extract => &self.extract_target.view,
            BloomSlot::Ping => &self.ping.view,
            BloomSlot::Pong => &self.pong.view,
        }
    }

    fn source_bind_group_for(&self, slot: BloomSlot) -> &wgpu::BindGroup {
        match slot {
            BloomSlot::Extract => &self.source_extract_bind_group,
            BloomSlot::Ping => &self.source_ping_bind_group,
            BloomSlot::Pong => &self.source_pong_bind_group,
        }
    }

    /// Encodes the extract and blur passes, returning the view holding the
    /// final bloom texture. Deterministic for fixed inputs: the same pass
    /// sequence runs every call and ends on the same target.
    pub fn process(&self, encoder: &mut wgpu::CommandEncoder) -> &wgpu::TextureView {
        // Bright-pass extraction
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bloom Extract Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.extract_target.view,
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
            pass.set_pipeline(&self.extract_pipeline);
            pass.set_bind_group(0, &self.extract_input_bind_group, &[]);
            pass.set_bind_group(1, &self.extract_uniform_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        // Ping-pong blur
        for step in blur_schedule(self.blur_passes) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bloom Blur Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.view_for(step.target),
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
            pass.set_pipeline(&self.blur_pipeline);
            pass.set_bind_group(0, self.source_bind_group_for(step.source), &[]);
            pass.set_bind_group(
                1,
                if step.horizontal {
                    &self.horizontal_bind_group
                } else {
                    &self.vertical_bind_group
                },
                &[],
            );
            pass.draw(0..3, 0..1);
        }

        self.view_for(output_slot(self.blur_passes))
    }

    /// View of the final bloom target, for composite bind groups
    pub fn output_view(&self) -> &wgpu::TextureView {
        self.view_for(output_slot(self.blur_passes))
    }

    /// Sampler matching the output target
    pub fn output_sampler(&self) -> &wgpu::Sampler {
        match output_slot(self.blur_passes) {
            BloomSlot::Extract => &self.extract_target.sampler,
            BloomSlot::Ping => &self.ping.sampler,
            BloomSlot::Pong => &self.pong.sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_passes_output_is_the_extract_target() {
        assert_eq!(output_slot(0), BloomSlot::Extract);
        assert!(blur_schedule(0).is_empty());
    }

    #[test]
    fn schedule_has_two_steps_per_pass() {
        for passes in 1..8 {
            assert_eq!(blur_schedule(passes).len(), 2 * passes as usize);
        }
    }

    #[test]
    fn no_step_samples_its_own_target() {
        for passes in 1..8 {
            for step in blur_schedule(passes) {
                assert_ne!(step.source, step.target);
            }
        }
    }

    #[test]
    fn directions_alternate_starting_horizontal() {
        let schedule = blur_schedule(4);
        for (k, step) in schedule.iter().enumerate() {
            assert_eq!(step.horizontal, k % 2 == 0);
        }
    }

    #[test]
    fn final_target_is_parity_independent() {
        // The last write always lands on the same texture regardless of the
        // pass count, so callers can bind the output once and forget about it.
        for passes in 1..16 {
            let schedule = blur_schedule(passes);
            assert_eq!(schedule.last().unwrap().target, BloomSlot::Pong);
            assert_eq!(output_slot(passes), BloomSlot::Pong);
        }
    }

    #[test]
    fn first_step_reads_the_extract_target() {
        let schedule = blur_schedule(3);
        assert_eq!(schedule[0].source, BloomSlot::Extract);
        assert_eq!(schedule[0].target, BloomSlot::Ping);
    }
}

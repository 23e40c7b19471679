//! Texture storage and GPU texture resources
//!
//! [`Texture`] keeps decoded pixel data on the CPU until [`Texture::upload`]
//! creates the GPU side; [`TextureResource`] bundles the texture, view, and
//! sampler used by bind groups. Depth and render targets are created through
//! the dedicated constructors.

use std::path::Path;

use log::warn;

/// Pixel storage format of a [`Texture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, sRGB-encoded (color maps)
    Rgba8Srgb,
    /// 8-bit RGBA, linear (normal/roughness/occlusion data)
    Rgba8Unorm,
    /// 32-bit float RGBA (HDR sources such as equirectangular maps)
    Rgba32Float,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgba8Srgb | PixelFormat::Rgba8Unorm => 4,
            PixelFormat::Rgba32Float => 16,
        }
    }

    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::Rgba8Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }
}

/// A decoded image plus its (lazily created) GPU resources
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pixels: Vec<u8>,
    gpu: Option<TextureResource>,
}

impl Texture {
    /// Wraps raw pixel data. `pixels` length must equal
    /// `width * height * format.bytes_per_pixel()`.
    pub fn from_pixels(
        name: &str,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Self {
        debug_assert_eq!(
            pixels.len() as u32,
            width * height * format.bytes_per_pixel()
        );
        Self {
            name: name.to_string(),
            width,
            height,
            format,
            pixels,
            gpu: None,
        }
    }

    /// Decodes an image file. `.hdr` files decode to float pixels, everything
    /// else to sRGB 8-bit RGBA.
    pub fn from_file(path: &Path) -> Result<Self, image::ImageError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "texture".to_string());

        let is_hdr = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("hdr"))
            .unwrap_or(false);

        let decoded = image::open(path)?;
        Ok(if is_hdr {
            let img = decoded.to_rgba32f();
            let (width, height) = (img.width(), img.height());
            Self::from_pixels(
                &name,
                bytemuck::cast_slice(img.as_raw()).to_vec(),
                width,
                height,
                PixelFormat::Rgba32Float,
            )
        } else {
            let img = decoded.to_rgba8();
            let (width, height) = (img.width(), img.height());
            Self::from_pixels(&name, img.into_raw(), width, height, PixelFormat::Rgba8Srgb)
        })
    }

    /// Decodes an image from an in-memory byte blob (embedded glTF images)
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = (img.width(), img.height());
        Ok(Self::from_pixels(
            name,
            img.into_raw(),
            width,
            height,
            PixelFormat::Rgba8Srgb,
        ))
    }

    /// 1x1 opaque white texture, bound for objects without a texture of their
    /// own so stale bindings from a previous draw can never bleed through.
    pub fn white() -> Self {
        Self::from_pixels("white", vec![255, 255, 255, 255], 1, 1, PixelFormat::Rgba8Unorm)
    }

    pub fn is_hdr(&self) -> bool {
        self.format == PixelFormat::Rgba32Float
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Creates the GPU texture and writes the pixel data. Idempotent.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.gpu.is_some() {
            return;
        }
        if self.width == 0 || self.height == 0 {
            warn!("texture '{}' has zero extent, skipping upload", self.name);
            return;
        }
        self.gpu = Some(TextureResource::from_pixels(
            device,
            queue,
            &self.pixels,
            self.width,
            self.height,
            self.format,
            &self.name,
        ));
    }

    pub fn gpu(&self) -> Option<&TextureResource> {
        self.gpu.as_ref()
    }
}

/// GPU texture resource containing texture, view, and sampler
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Depth buffer format used throughout the engine
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// HDR color format for offscreen render targets
    pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    /// Whether this resource can be bound as a cube map
    pub fn is_cubemap(&self) -> bool {
        self.texture.size().depth_or_array_layers == 6
    }

    /// Creates a sampled 2D texture from raw pixel data
    pub fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: format.wgpu_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(format.bytes_per_pixel() * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates a depth texture matching the surface configuration
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates an HDR offscreen color target that can also be sampled
    pub fn create_render_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_texture_is_one_opaque_pixel() {
        let white = Texture::white();
        assert_eq!((white.width, white.height), (1, 1));
        assert_eq!(white.pixels, vec![255, 255, 255, 255]);
        assert!(!white.is_hdr());
    }

    #[test]
    fn pixel_format_sizes() {
        assert_eq!(PixelFormat::Rgba8Srgb.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Rgba32Float.bytes_per_pixel(), 16);
    }

    #[test]
    fn from_bytes_decodes_png() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let texture = Texture::from_bytes("decoded", &png).unwrap();
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(texture.format, PixelFormat::Rgba8Srgb);
        assert_eq!(&texture.pixels[0..4], &[10, 20, 30, 255]);
    }
}

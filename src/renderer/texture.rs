//! GPU textures and the pixel data that feeds them

use std::path::Path;
use std::rc::Rc;

use crate::error::InitError;

use super::batch::BatchTexture;

/// Renderer-assigned texture identity; batches break when it changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Shared handle passed to draw calls
pub type TextureHandle = Rc<Texture>;

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Pixels {
    /// Decode a PNG (or anything else the `image` features allow) from disk
    pub fn load(path: &Path) -> Result<Self, InitError> {
        let bytes = std::fs::read(path).map_err(|source| InitError::TextureIo {
            path: path.to_path_buf(),
            source,
        })?;
        let image = image::load_from_memory(&bytes).map_err(|source| InitError::TextureDecode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    /// White disc with a soft edge, used when no bullet texture is configured
    pub fn soft_disc(size: u32) -> Self {
        let mut rgba = Vec::with_capacity(Self::byte_len(size, size).unwrap_or(0));
        let centre = size as f32 * 0.5;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 + 0.5 - centre;
                let dy = y as f32 + 0.5 - centre;
                let d = (dx * dx + dy * dy).sqrt() / centre;
                // Solid core, linear falloff over the outer 30%
                let alpha = ((1.0 - d) / 0.3).clamp(0.0, 1.0);
                rgba.extend_from_slice(&[255, 255, 255, (alpha * 255.0) as u8]);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// RGBA8 byte count for the given dimensions, `None` if it does not fit in memory
    pub fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize).checked_mul(height as usize)?.checked_mul(4)
    }

    /// Buffer length matches the dimensions and neither is zero
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && Self::byte_len(self.width, self.height) == Some(self.rgba.len())
    }

    /// Fails when either side exceeds `max_dimension`, the device's 2D texture limit
    pub fn check_dimensions(&self, path: &Path, max_dimension: u32) -> Result<(), InitError> {
        if self.width > max_dimension || self.height > max_dimension {
            return Err(InitError::TextureTooLarge {
                path: path.to_path_buf(),
                width: self.width,
                height: self.height,
                max: max_dimension,
            });
        }
        Ok(())
    }
}

/// A sampled texture with its bind group
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    pub(crate) bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

impl Texture {
    /// Upload pixels. Invalid pixel data yields a 1x1 placeholder that
    /// reports zero size, so drawing with it is a no-op.
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        id: TextureId,
        label: &str,
        pixels: &Pixels,
    ) -> Self {
        let (width, height, data): (u32, u32, &[u8]) = if pixels.is_valid() {
            (pixels.width, pixels.height, pixels.rgba.as_slice())
        } else {
            log::warn!(
                "Texture '{}' has invalid pixel data ({}x{}, {} bytes), it will not be drawn",
                label,
                pixels.width,
                pixels.height,
                pixels.rgba.len()
            );
            (0, 0, &[0u8; 4][..])
        };

        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::debug!("Uploaded texture '{}' ({}x{}) as {:?}", label, width, height, id);

        Self {
            id,
            width,
            height,
            bind_group,
            _texture: texture,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl BatchTexture for TextureHandle {
    fn id(&self) -> TextureId {
        self.id
    }

    fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_disc_is_opaque_in_the_middle_and_clear_at_corners() {
        let disc = Pixels::soft_disc(32);
        assert!(disc.is_valid());
        let alpha = |x: u32, y: u32| disc.rgba[((y * 32 + x) * 4 + 3) as usize];
        assert_eq!(alpha(16, 16), 255);
        assert_eq!(alpha(0, 0), 0);
        assert_eq!(alpha(31, 31), 0);
    }

    #[test]
    fn test_pixel_validation() {
        assert!(!Pixels { width: 0, height: 4, rgba: vec![] }.is_valid());
        assert!(!Pixels { width: 2, height: 2, rgba: vec![0; 15] }.is_valid());
        assert!(Pixels { width: 2, height: 2, rgba: vec![0; 16] }.is_valid());
    }

    #[test]
    fn test_huge_dimensions_are_invalid_without_overflow() {
        let huge = Pixels {
            width: u32::MAX,
            height: u32::MAX,
            rgba: vec![],
        };
        assert!(!huge.is_valid());
        // 65536 * 65536 * 4 wraps to zero in u32
        let wraps = Pixels {
            width: 65_536,
            height: 65_536,
            rgba: vec![],
        };
        assert!(!wraps.is_valid());
        assert_eq!(Pixels::byte_len(3, 5), Some(60));
    }

    #[test]
    fn test_dimension_limit() {
        let path = Path::new("assets/centerpiece.png");
        let at_limit = Pixels {
            width: 2048,
            height: 16,
            rgba: vec![],
        };
        assert!(at_limit.check_dimensions(path, 2048).is_ok());

        let too_wide = Pixels {
            width: 4096,
            height: 4096,
            rgba: vec![],
        };
        match too_wide.check_dimensions(path, 2048) {
            Err(InitError::TextureTooLarge {
                path: p,
                width,
                height,
                max,
            }) => {
                assert_eq!(p, path);
                assert_eq!((width, height, max), (4096, 4096, 2048));
            }
            other => panic!("expected TextureTooLarge, got {:?}", other),
        }

        let too_tall = Pixels {
            width: 1,
            height: 2049,
            rgba: vec![],
        };
        assert!(too_tall.check_dimensions(path, 2048).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = Path::new("definitely/not/here.png");
        match Pixels::load(path) {
            Err(InitError::TextureIo { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected TextureIo, got {:?}", other.map(|p| p.width)),
        }
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let path = std::env::temp_dir().join(format!("danmaku-garbage-{}.png", std::process::id()));
        std::fs::write(&path, b"not a png").unwrap();
        let result = Pixels::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(InitError::TextureDecode { .. })));
    }
}

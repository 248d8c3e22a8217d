//! Instanced sprite pipeline
//!
//! Every sprite is the same unit quad scaled, rotated and translated per
//! instance. A frame is drawn through a [`SpritePass`]: begin it after the
//! device has cleared the frame, queue sprites and text, then end it (or drop
//! it) to flush the last batch.

use std::path::Path;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};
use wgpu::util::DeviceExt;

use crate::error::InitError;

use super::batch::{BatchPass, BatchStats, InstanceSink, SpriteBatch};
use super::device::GraphicsDevice;
use super::instance::{QUAD_INDICES, QUAD_VERTICES, QuadVertex, SpriteInstance, UvRect};
use super::text;
use super::texture::{Pixels, Texture, TextureHandle, TextureId};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    projection: [[f32; 4]; 4],
}

impl Globals {
    /// Pixels with the origin top-left and y down, straight to clip space
    fn screen(width: u32, height: u32) -> Self {
        let projection = Mat4::orthographic_rh(0.0, width as f32, height as f32, 0.0, -1.0, 1.0);
        Self {
            projection: projection.to_cols_array_2d(),
        }
    }
}

/// GPU objects shared by every flush
struct SpritePipeline {
    pipeline: wgpu::RenderPipeline,
    quad_vertices: wgpu::Buffer,
    quad_indices: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

pub struct SpriteRenderer {
    gpu: SpritePipeline,
    batch: SpriteBatch<TextureHandle>,
    next_texture_id: u32,
    last_stats: BatchStats,
}

impl SpriteRenderer {
    /// `max_instances` bounds a single flush and sizes the instance buffer.
    /// Fails if that buffer would exceed the device's buffer size limit.
    pub fn new(gfx: &GraphicsDevice, max_instances: usize) -> Result<Self, InitError> {
        let device = gfx.device();
        let max_instances = max_instances.max(1);
        let instance_bytes = instance_buffer_size(max_instances, gfx.limits().max_buffer_size)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sprite_shader.wgsl").into()),
        });

        let (width, height) = gfx.size();
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite_globals"),
            contents: bytemuck::bytes_of(&Globals::screen(width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite_globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::desc(), SpriteInstance::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gfx.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Mirrored sprites flip the winding
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let quad_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite_quad_vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite_quad_indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite_instances"),
            size: instance_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("Sprite renderer ready, {} instances per flush", max_instances);

        Ok(Self {
            gpu: SpritePipeline {
                pipeline,
                quad_vertices,
                quad_indices,
                instance_buffer,
                globals_buffer,
                globals_bind_group,
                texture_layout,
                sampler,
            },
            batch: SpriteBatch::new(max_instances),
            next_texture_id: 0,
            last_stats: BatchStats::default(),
        })
    }

    pub fn max_instances(&self) -> usize {
        self.batch.max_instances()
    }

    /// Counters of the most recently ended pass
    pub fn last_stats(&self) -> BatchStats {
        self.last_stats
    }

    /// Re-upload the pixel projection (after a resize)
    pub fn set_projection(&self, gfx: &GraphicsDevice, width: u32, height: u32) {
        gfx.queue().write_buffer(
            &self.gpu.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals::screen(width, height)),
        );
    }

    /// Upload pixels as a new texture. Sizes are not checked here; callers
    /// with untrusted images go through `load_texture`.
    pub fn create_texture(&mut self, gfx: &GraphicsDevice, label: &str, pixels: &Pixels) -> TextureHandle {
        let id = TextureId(self.next_texture_id);
        self.next_texture_id += 1;
        Rc::new(Texture::upload(
            gfx.device(),
            gfx.queue(),
            &self.gpu.texture_layout,
            &self.gpu.sampler,
            id,
            label,
            pixels,
        ))
    }

    pub fn load_texture(&mut self, gfx: &GraphicsDevice, path: &Path) -> Result<TextureHandle, InitError> {
        let pixels = Pixels::load(path)?;
        pixels.check_dimensions(path, gfx.limits().max_texture_dimension_2d)?;
        log::info!("Loaded texture {} ({}x{})", path.display(), pixels.width, pixels.height);
        Ok(self.create_texture(gfx, &path.display().to_string(), &pixels))
    }

    /// Start drawing into the frame `gfx` acquired in `clear`.
    /// Returns `None` when no frame is acquired.
    pub fn begin<'a>(&'a mut self, gfx: &'a GraphicsDevice) -> Option<SpritePass<'a>> {
        let view = gfx.frame_view()?;
        let SpriteRenderer {
            gpu,
            batch,
            last_stats,
            ..
        } = self;
        let sink = GpuSink {
            gpu,
            device: gfx.device(),
            queue: gfx.queue(),
            view,
        };
        Some(SpritePass {
            pass: BatchPass::begin(batch, last_stats, sink),
        })
    }
}

/// Byte size of a buffer holding `max_instances` sprites, if the device allows it
fn instance_buffer_size(max_instances: usize, max_buffer_size: u64) -> Result<u64, InitError> {
    std::mem::size_of::<SpriteInstance>()
        .checked_mul(max_instances)
        .and_then(|bytes| u64::try_from(bytes).ok())
        .filter(|&bytes| bytes <= max_buffer_size)
        .ok_or(InitError::InstanceBufferTooLarge {
            max_instances,
            max_bytes: max_buffer_size,
        })
}

/// Submits each flushed batch as its own instanced draw
struct GpuSink<'a> {
    gpu: &'a SpritePipeline,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    view: &'a wgpu::TextureView,
}

impl InstanceSink<TextureHandle> for GpuSink<'_> {
    fn draw_instanced(&mut self, texture: &TextureHandle, instances: &[SpriteInstance]) {
        let bytes: &[u8] = bytemuck::cast_slice(instances);
        // Queued writes land before the submit below, so each flush sees its own data
        self.queue.write_buffer(&self.gpu.instance_buffer, 0, bytes);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprite_encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.gpu.pipeline);
            render_pass.set_bind_group(0, &self.gpu.globals_bind_group, &[]);
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.gpu.quad_vertices.slice(..));
            render_pass.set_vertex_buffer(1, self.gpu.instance_buffer.slice(..bytes.len() as u64));
            render_pass.set_index_buffer(self.gpu.quad_indices.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..instances.len() as u32);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// One frame's drawing. Flushes the last batch once, on `end` or drop.
pub struct SpritePass<'a> {
    pass: BatchPass<'a, TextureHandle, GpuSink<'a>>,
}

impl SpritePass<'_> {
    /// Queue a fully specified instance
    pub fn draw(&mut self, texture: &TextureHandle, instance: SpriteInstance) {
        self.pass.push(texture, instance);
    }

    /// Queue a whole-texture, untinted sprite centred at `pos`.
    /// `size` is in pixels; a negative component mirrors the sprite.
    pub fn draw_sprite(&mut self, texture: &TextureHandle, pos: Vec2, angle: f32, size: Vec2) {
        self.draw(
            texture,
            SpriteInstance {
                position: pos.to_array(),
                scale: size.to_array(),
                rotation: angle,
                uv: UvRect::FULL,
                color: SpriteInstance::WHITE,
            },
        );
    }

    /// Queue one glyph sprite per character. `pos` is the top-left of the
    /// text; each glyph is one atlas cell times `scale`.
    pub fn draw_text(&mut self, font: &TextureHandle, text: &str, pos: Vec2, scale: f32, color: [f32; 4]) {
        let cell = Vec2::new(
            font.width() as f32 / text::GRID as f32,
            font.height() as f32 / text::GRID as f32,
        ) * scale;
        for glyph in text::layout(text, pos, cell, color) {
            self.pass.push(font, glyph);
        }
    }

    /// Flush what is pending and return the frame's batching counters
    pub fn end(self) -> BatchStats {
        self.pass.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_buffer_fits_device_limit() {
        // 256 MiB is the WebGPU default max_buffer_size
        let limit = 256 << 20;
        let stride = std::mem::size_of::<SpriteInstance>() as u64;
        assert_eq!(instance_buffer_size(65_536, limit).ok(), Some(65_536 * stride));

        let exact = (limit / stride) as usize;
        assert!(instance_buffer_size(exact, limit).is_ok());
        assert!(matches!(
            instance_buffer_size(exact + 1, limit),
            Err(InitError::InstanceBufferTooLarge { max_instances, max_bytes })
                if max_instances == exact + 1 && max_bytes == limit
        ));
    }

    #[test]
    fn test_instance_buffer_size_overflow_is_an_error() {
        assert!(matches!(
            instance_buffer_size(usize::MAX, u64::MAX),
            Err(InitError::InstanceBufferTooLarge { .. })
        ));
    }
}

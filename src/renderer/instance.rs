//! Vertex and instance layouts for the sprite pipeline

use bytemuck::{Pod, Zeroable};

/// Unit quad corner, shared by every sprite
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    /// Corner offset in sprite space, centred on the origin
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            uv: [u, v],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Unit quad, y down (top-left first)
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex::new(-0.5, -0.5, 0.0, 0.0),
    QuadVertex::new(0.5, -0.5, 1.0, 0.0),
    QuadVertex::new(0.5, 0.5, 1.0, 1.0),
    QuadVertex::new(-0.5, 0.5, 0.0, 1.0),
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Sub-rectangle of a texture in normalized coordinates
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct UvRect {
    pub u: f32,
    pub v: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRect {
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(u: f32, v: f32, width: f32, height: f32) -> Self {
        Self { u, v, width, height }
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Per-sprite record consumed by one instanced draw
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Centre in pixels (origin top-left, y down)
    pub position: [f32; 2],
    /// Size in pixels; a negative component mirrors the sprite
    pub scale: [f32; 2],
    pub rotation: f32,
    pub uv: UvRect,
    pub color: [f32; 4],
}

impl SpriteInstance {
    pub const WHITE: [f32; 4] = [1.0; 4];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            2 => Float32x2,
            3 => Float32x2,
            4 => Float32,
            5 => Float32x4,
            6 => Float32x4,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout_is_tightly_packed() {
        // position + scale + rotation + uv + color
        assert_eq!(std::mem::size_of::<SpriteInstance>(), (2 + 2 + 1 + 4 + 4) * 4);
        assert_eq!(
            SpriteInstance::desc().array_stride,
            std::mem::size_of::<SpriteInstance>() as u64
        );
    }

    #[test]
    fn test_quad_is_unit_sized_and_centred() {
        let min = QUAD_VERTICES.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        let max = QUAD_VERTICES.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert_eq!(max - min, 1.0);
        assert_eq!(min + max, 0.0);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn test_default_uv_is_full_texture() {
        assert_eq!(UvRect::default(), UvRect::new(0.0, 0.0, 1.0, 1.0));
    }
}

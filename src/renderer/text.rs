//! Fixed-grid bitmap text
//!
//! Font atlases are 16x16 grids of equally sized cells indexed by character
//! code (`col = code % 16`, `row = code / 16`). Only ASCII is addressable;
//! anything else renders as `?`.

use glam::Vec2;

use super::instance::{SpriteInstance, UvRect};
use super::texture::Pixels;

/// Cells per atlas row and column
pub const GRID: u32 = 16;

/// Cell size of the built-in atlas (pixels)
const BUILTIN_CELL: u32 = 16;
/// Each font pixel becomes a 2x2 block in the built-in atlas
const BUILTIN_PIXEL: u32 = 2;

/// Normalized atlas rectangle for `c`
pub fn glyph_uv(c: char) -> UvRect {
    let code = if c.is_ascii() { c as u32 } else { '?' as u32 };
    let cell = 1.0 / GRID as f32;
    UvRect::new(
        (code % GRID) as f32 * cell,
        (code / GRID) as f32 * cell,
        cell,
        cell,
    )
}

/// One sprite per visible glyph. `origin` is the top-left of the first line,
/// `cell` the on-screen size of one glyph. Whitespace only advances.
pub fn layout(text: &str, origin: Vec2, cell: Vec2, color: [f32; 4]) -> impl Iterator<Item = SpriteInstance> + '_ {
    let mut pen = origin;
    text.chars().filter_map(move |c| {
        if c == '\n' {
            pen = Vec2::new(origin.x, pen.y + cell.y);
            return None;
        }
        let centre = pen + cell * 0.5;
        pen.x += cell.x;
        if c.is_whitespace() {
            return None;
        }
        Some(SpriteInstance {
            position: centre.to_array(),
            scale: cell.to_array(),
            rotation: 0.0,
            uv: glyph_uv(c),
            color,
        })
    })
}

/// 5x7 bitmaps, one byte per row, bit 4 is the leftmost column
const GLYPHS: &[(char, [u8; 7])] = &[
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    (':', [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00]),
    ('?', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
];

/// Atlas covering the HUD glyphs, white on transparent
pub fn builtin_atlas() -> Pixels {
    let size = GRID * BUILTIN_CELL;
    let mut rgba = vec![0u8; (size * size * 4) as usize];
    // White everywhere so filtering never darkens glyph edges
    for px in rgba.chunks_exact_mut(4) {
        px[..3].fill(255);
    }

    let glyph_w = 5 * BUILTIN_PIXEL;
    let glyph_h = 7 * BUILTIN_PIXEL;
    let pad_x = (BUILTIN_CELL - glyph_w) / 2;
    let pad_y = (BUILTIN_CELL - glyph_h) / 2;

    for &(c, rows) in GLYPHS {
        let code = c as u32;
        let cell_x = (code % GRID) * BUILTIN_CELL + pad_x;
        let cell_y = (code / GRID) * BUILTIN_CELL + pad_y;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                for dy in 0..BUILTIN_PIXEL {
                    for dx in 0..BUILTIN_PIXEL {
                        let x = cell_x + col * BUILTIN_PIXEL + dx;
                        let y = cell_y + row as u32 * BUILTIN_PIXEL + dy;
                        rgba[((y * size + x) * 4 + 3) as usize] = 255;
                    }
                }
            }
        }
    }

    Pixels {
        width: size,
        height: size,
        rgba,
    }
}

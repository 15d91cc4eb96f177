//! Texture-region to UV mapping and quad vertex generation.

use quadbatch_core::geometry::Rect;

use crate::{Color, Vertex};

/// Vertices emitted per sprite: two triangles sharing the TR-BL diagonal.
pub const VERTICES_PER_SPRITE: usize = 6;

/// UV coordinates for a sprite (normalized, not clamped).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteUV {
    /// U coordinate of the left edge
    pub u_min: f32,
    /// V coordinate of the top edge
    pub v_min: f32,
    /// U coordinate of the right edge
    pub u_max: f32,
    /// V coordinate of the bottom edge
    pub v_max: f32,
}

impl SpriteUV {
    /// The whole texture.
    pub const FULL: SpriteUV = SpriteUV::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(u_min: f32, v_min: f32, u_max: f32, v_max: f32) -> Self {
        Self {
            u_min,
            v_min,
            u_max,
            v_max,
        }
    }

    /// Map a source rectangle in texel space onto a `width` x `height` texture.
    ///
    /// Rectangles reaching outside the texture produce UVs outside `0..=1`; sampling
    /// behavior for those is up to the texture's wrap mode.
    pub fn from_region(src: &Rect<f32>, width: u32, height: u32) -> Self {
        let width = width as f32;
        let height = height as f32;
        Self {
            u_min: src.x / width,
            v_min: src.y / height,
            u_max: src.max_x() / width,
            v_max: src.max_y() / height,
        }
    }

    /// Flip the sprite horizontally.
    pub fn flip_horizontal(&self) -> Self {
        Self::new(self.u_max, self.v_min, self.u_min, self.v_max)
    }

    /// Flip the sprite vertically.
    pub fn flip_vertical(&self) -> Self {
        Self::new(self.u_min, self.v_max, self.u_max, self.v_min)
    }
}

/// The six vertices of a quad covering `dst`, in the order
/// top-left, top-right, bottom-left, top-right, bottom-right, bottom-left.
pub fn quad_vertices(dst: &Rect<f32>, uv: SpriteUV, color: Color) -> [Vertex; VERTICES_PER_SPRITE] {
    let (x, y) = (dst.x, dst.y);
    let (x2, y2) = (dst.max_x(), dst.max_y());

    let top_left = Vertex::new(x, y, color, uv.u_min, uv.v_min);
    let top_right = Vertex::new(x2, y, color, uv.u_max, uv.v_min);
    let bottom_left = Vertex::new(x, y2, color, uv.u_min, uv.v_max);
    let bottom_right = Vertex::new(x2, y2, color, uv.u_max, uv.v_max);

    [
        top_left,
        top_right,
        bottom_left,
        top_right,
        bottom_right,
        bottom_left,
    ]
}

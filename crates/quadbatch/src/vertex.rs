//! The per-vertex record written into the batch buffer.

use bytemuck::{Pod, Zeroable};
use quadbatch_test_utils::{VERTEX_COMPONENTS, VertexAttrib};

use crate::Color;
use crate::shader::{ATTR_COLOR, ATTR_POSITION, ATTR_TEXCOORD};

/// Attribute table shared by the default shader and every vertex sink.
///
/// Custom shaders passed to `SpriteBatch::set_shader` must declare the same layout.
pub const ATTRIBUTES: [VertexAttrib; 3] = [
    VertexAttrib::new(0, ATTR_POSITION, 2),
    VertexAttrib::new(1, ATTR_COLOR, 4),
    VertexAttrib::new(2, ATTR_TEXCOORD, 2),
];

/// One sprite vertex: position, color and texture coordinate.
///
/// # Memory Layout
///
/// ```text
/// Offset | Field     | Size
/// -------|-----------|---------
/// 0      | position  | 8 bytes
/// 8      | color     | 16 bytes
/// 24     | tex_coord | 8 bytes
/// Total: 32 bytes (8 x f32)
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
}

static_assertions::const_assert_eq!(
    std::mem::size_of::<Vertex>(),
    VERTEX_COMPONENTS * std::mem::size_of::<f32>()
);

impl Vertex {
    pub const fn new(x: f32, y: f32, color: Color, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            color: color.to_array(),
            tex_coord: [u, v],
        }
    }

    /// Size of the vertex in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// The wgpu vertex buffer layout matching [`ATTRIBUTES`].
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            // Position
            0 => Float32x2,
            // Color
            1 => Float32x4,
            // TexCoord
            2 => Float32x2,
        ];

        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }

    /// The vertex as its 8 raw scalars.
    pub fn as_scalars(&self) -> &[f32] {
        bytemuck::cast_slice(std::slice::from_ref(self))
    }
}

//! Traits for the graphics collaborators the sprite batcher drives.
//!
//! Implementations are expected to forward to a real graphics API. Failures inside a
//! bind or draw are considered fatal by the batcher, so only uniform uploads and shader
//! compilation report errors.

use std::sync::Arc;

use glam::Mat4;
use quadbatch_core::geometry::Size;
use wgpu::PrimitiveTopology;

/// Number of `f32` components in one vertex: position (2), color (4), texcoord (2).
pub const VERTEX_COMPONENTS: usize = 8;

/// Stable identity of a texture. Two handles with the same id sample the same texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// A texture that can be bound for sampling.
pub trait TextureHandle: Send + Sync {
    fn id(&self) -> TextureId;

    /// Width in texels.
    fn width(&self) -> u32;

    /// Height in texels.
    fn height(&self) -> u32;

    /// Bind for sampling on texture unit 0.
    fn bind(&self);
}

/// Errors reported by shader programs and shader factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The program failed to compile or link.
    Compile(String),
    /// The program has no active uniform with this name.
    UniformNotFound(String),
    /// The driver rejected the call.
    Driver(String),
}

impl std::fmt::Display for ShaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compile(log) => write!(f, "Shader compilation failed: {}", log),
            Self::UniformNotFound(name) => write!(f, "No active uniform named '{}'", name),
            Self::Driver(msg) => write!(f, "Graphics driver error: {}", msg),
        }
    }
}

impl std::error::Error for ShaderError {}

/// An activatable shader program with named uniforms.
///
/// Programs used with the batcher must expose the `Position`, `Color` and `TexCoord`
/// attributes in that order.
pub trait ShaderBinding: Send + Sync {
    /// Make this the active program.
    fn use_program(&self);

    fn set_uniform_matrix(&self, name: &str, transpose: bool, matrix: &Mat4) -> Result<(), ShaderError>;

    fn set_uniform_i32(&self, name: &str, value: i32) -> Result<(), ShaderError>;

    /// Debug label, used in log output.
    fn label(&self) -> Option<&str> {
        None
    }
}

/// A vertex attribute as declared to the shader and the vertex sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttrib {
    /// Shader location.
    pub location: u32,
    pub name: &'static str,
    /// Number of `f32` components.
    pub components: u32,
}

impl VertexAttrib {
    pub const fn new(location: u32, name: &'static str, components: u32) -> Self {
        Self {
            location,
            name,
            components,
        }
    }
}

/// Compiles shader programs. Used to build the default sprite program on demand.
pub trait ShaderFactory {
    fn create_program(
        &self,
        source: &str,
        attributes: &[VertexAttrib],
    ) -> Result<Arc<dyn ShaderBinding>, ShaderError>;
}

/// The GPU-side vertex buffer.
///
/// The batcher drives it through one write-then-draw cycle per submission:
/// `clear`, `write`, `flip`, `bind`, `draw`, `unbind`, `clear`.
pub trait VertexSink {
    fn bind(&mut self);

    /// Write `scalars` starting at scalar `offset`.
    fn write(&mut self, scalars: &[f32], offset: usize);

    /// Issue one draw call over vertices `start..start + count`.
    fn draw(&mut self, topology: PrimitiveTopology, start: u32, count: u32);

    fn unbind(&mut self);

    /// Switch from writing to reading the staged data.
    fn flip(&mut self);

    /// Reset the write position for reuse.
    fn clear(&mut self);
}

impl<S: VertexSink + ?Sized> VertexSink for Box<S> {
    fn bind(&mut self) {
        (**self).bind();
    }

    fn write(&mut self, scalars: &[f32], offset: usize) {
        (**self).write(scalars, offset);
    }

    fn draw(&mut self, topology: PrimitiveTopology, start: u32, count: u32) {
        (**self).draw(topology, start, count);
    }

    fn unbind(&mut self) {
        (**self).unbind();
    }

    fn flip(&mut self) {
        (**self).flip();
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}

/// Source of the current viewport size.
pub trait DisplaySize {
    fn display_size(&self) -> Size<u32>;
}

impl DisplaySize for Size<u32> {
    fn display_size(&self) -> Size<u32> {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_id_roundtrip_and_display() {
        let id = TextureId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "texture#7");
    }

    #[test]
    fn test_shader_error_display() {
        let err = ShaderError::UniformNotFound("u_projView".into());
        assert!(err.to_string().contains("u_projView"));
    }

    #[test]
    fn test_size_is_a_display_size() {
        let size = Size::new(800_u32, 600);
        assert_eq!(size.display_size(), size);
    }
}

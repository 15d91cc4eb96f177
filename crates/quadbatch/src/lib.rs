//! quadbatch - texture-keyed 2D sprite batching
//!
//! This crate provides:
//! - A [`SpriteBatch`] that accumulates textured quads and submits them in as few draw
//!   calls as possible, flushing on texture change, full buffer, shader or uniform change
//! - Sprite UV mapping from texel regions, with flips
//! - The interleaved [`Vertex`] format and its wgpu vertex buffer layout
//! - A default sprite shader and a cache for sharing it between batches
//!
//! Textures, shaders and the GPU vertex buffer are reached through the collaborator
//! traits from `quadbatch-test-utils`, re-exported here.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use quadbatch::*;
//! use quadbatch_test_utils::MockGpu;
//!
//! let gpu = MockGpu::new();
//! let mut cache = DefaultShaderCache::new();
//! let atlas: Arc<dyn TextureHandle> = gpu.create_texture(256, 256);
//!
//! let mut batch = SpriteBatch::with_default_shader(
//!     gpu.create_sink(),
//!     &mut cache,
//!     &gpu,
//!     &Size::new(800_u32, 600),
//!     SpriteBatchDescriptor::default().with_label("hud"),
//! )?;
//!
//! batch.begin()?;
//! batch.draw_region(&atlas, Rect::new(0.0, 0.0, 16.0, 16.0), 100.0, 100.0)?;
//! batch.set_color(Color::RED);
//! batch.draw_region(&atlas, Rect::new(16.0, 0.0, 16.0, 16.0), 120.0, 100.0)?;
//! batch.end()?;
//!
//! assert_eq!(batch.draw_calls(), 1);
//! # Ok::<(), BatchError>(())
//! ```

// Vertex data
mod color;
mod sprite;
mod vertex;

// Batching
mod batch;
mod buffer;
pub mod flush;
mod uniforms;

mod error;
mod shader;

pub use batch::*;
pub use buffer::*;
pub use color::*;
pub use error::*;
pub use flush::FlushDecision;
pub use shader::*;
pub use sprite::*;
pub use uniforms::*;
pub use vertex::*;

pub use quadbatch_core::geometry::{Rect, Size};
pub use quadbatch_test_utils::{
    DisplaySize, ShaderBinding, ShaderError, ShaderFactory, TextureHandle, TextureId,
    VertexAttrib, VertexSink,
};

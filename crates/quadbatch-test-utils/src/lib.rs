//! Collaborator traits and test utilities for quadbatch.
//!
//! The sprite batcher never talks to a graphics API directly. Everything it needs from
//! the outside world goes through the traits in [`backend`]:
//!
//! - [`TextureHandle`] - a sampled texture with a stable identity
//! - [`ShaderBinding`] - an activatable program with named uniforms
//! - [`VertexSink`] - the GPU-side vertex buffer and draw-call issuer
//! - [`DisplaySize`] - the viewport size used for the default projection
//! - [`ShaderFactory`] - compiles the default program on request
//!
//! With the `mock` feature enabled, `MockGpu` provides implementations of all of them
//! that record every call into one ordered timeline.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use quadbatch_test_utils::{MockGpu, TextureHandle, VertexSink};
//!
//! let gpu = MockGpu::new();
//! let texture = gpu.create_texture(64, 32);
//! let mut sink = gpu.create_sink();
//!
//! texture.bind();
//! sink.write(&[0.0; 8], 0);
//! sink.bind();
//! sink.draw(wgpu::PrimitiveTopology::TriangleList, 0, 1);
//! sink.unbind();
//!
//! assert_eq!(gpu.count_draw_calls(), 1);
//! assert_eq!(gpu.draws()[0].texture, Some(texture.id()));
//! # }
//! ```
//!
//! # Design Notes
//!
//! ## Interior Mutability
//!
//! Textures and shaders are shared behind `Arc` and their trait methods take `&self`,
//! so the mocks record into a `parking_lot::Mutex<Vec<GpuCall>>`.
//!
//! ## Object Safety
//!
//! Every collaborator trait is object-safe; the batcher stores `Arc<dyn TextureHandle>`
//! and `Arc<dyn ShaderBinding>`.

pub mod backend;
#[cfg(feature = "mock")]
pub mod mock_gpu;

pub use backend::*;
#[cfg(feature = "mock")]
pub use mock_gpu::*;

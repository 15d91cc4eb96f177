//! Well-known uniform and attribute names, the default sprite shader and its cache.

use std::sync::Arc;

use quadbatch_test_utils::{ShaderBinding, ShaderError, ShaderFactory};

use crate::vertex::ATTRIBUTES;

/// Sampler uniform; always set to texture unit 0.
pub const U_TEXTURE: &str = "u_texture";
/// Combined projection-view matrix uniform.
pub const U_PROJ_VIEW: &str = "u_projView";

pub const ATTR_POSITION: &str = "Position";
pub const ATTR_COLOR: &str = "Color";
pub const ATTR_TEXCOORD: &str = "TexCoord";

/// Texture unit the sampler uniform points at.
pub const TEXTURE_UNIT: i32 = 0;

/// WGSL source of the default sprite shader.
///
/// Vertices are transformed by `u_projView` and the sampled texel is tinted by the
/// vertex color.
pub const DEFAULT_SHADER: &str = r#"
@group(0) @binding(0)
var<uniform> u_projView: mat4x4<f32>;

@group(1) @binding(0)
var u_texture: texture_2d<f32>;
@group(1) @binding(1)
var u_sampler: sampler;

struct VertexInput {
    @location(0) Position: vec2<f32>,
    @location(1) Color: vec4<f32>,
    @location(2) TexCoord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) tex_coord: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.position = u_projView * vec4<f32>(input.Position, 0.0, 1.0);
    output.color = input.Color;
    output.tex_coord = input.TexCoord;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return input.color * textureSample(u_texture, u_sampler, input.tex_coord);
}
"#;

/// Shader module descriptor for [`DEFAULT_SHADER`], for factories backed by wgpu.
pub fn default_shader_descriptor() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("Sprite Batch Default Shader"),
        source: wgpu::ShaderSource::Wgsl(DEFAULT_SHADER.into()),
    }
}

/// Lazily compiled default program, shared by every batch built from the same cache.
///
/// The cache is owned by the caller and passed explicitly, so there is no process-wide
/// shader state.
#[derive(Default)]
pub struct DefaultShaderCache {
    shader: Option<Arc<dyn ShaderBinding>>,
}

impl DefaultShaderCache {
    pub fn new() -> Self {
        Self { shader: None }
    }

    /// Returns the cached program, compiling it with `factory` on first use.
    ///
    /// A failed compile leaves the cache empty so a later call can retry.
    pub fn get_or_create(
        &mut self,
        factory: &dyn ShaderFactory,
    ) -> Result<Arc<dyn ShaderBinding>, ShaderError> {
        if let Some(shader) = &self.shader {
            return Ok(Arc::clone(shader));
        }

        let shader = factory.create_program(DEFAULT_SHADER, &ATTRIBUTES)?;
        tracing::debug!("Compiled default sprite shader");
        self.shader = Some(Arc::clone(&shader));
        Ok(shader)
    }

    pub fn is_initialized(&self) -> bool {
        self.shader.is_some()
    }

    /// Drop the cached program, e.g. after the graphics context was lost.
    pub fn clear(&mut self) {
        self.shader = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadbatch_test_utils::{GpuCall, MockGpu};

    #[test]
    fn test_default_shader_declares_well_known_names() {
        for name in [U_PROJ_VIEW, U_TEXTURE, ATTR_POSITION, ATTR_COLOR, ATTR_TEXCOORD] {
            assert!(DEFAULT_SHADER.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_descriptor_uses_wgsl_source() {
        let descriptor = default_shader_descriptor();
        assert_eq!(descriptor.label, Some("Sprite Batch Default Shader"));
        assert!(matches!(descriptor.source, wgpu::ShaderSource::Wgsl(_)));
    }

    #[test]
    fn test_cache_compiles_once() {
        let gpu = MockGpu::new();
        let mut cache = DefaultShaderCache::new();

        let first = cache.get_or_create(&gpu).unwrap();
        let second = cache.get_or_create(&gpu).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let compiles = gpu
            .calls()
            .iter()
            .filter(|call| matches!(call, GpuCall::CompileProgram { .. }))
            .count();
        assert_eq!(compiles, 1);
    }

    #[test]
    fn test_cache_stays_empty_after_failed_compile() {
        let gpu = MockGpu::new();
        let mut cache = DefaultShaderCache::new();

        gpu.fail_compiles(true);
        assert!(cache.get_or_create(&gpu).is_err());
        assert!(!cache.is_initialized());

        gpu.fail_compiles(false);
        assert!(cache.get_or_create(&gpu).is_ok());
        assert!(cache.is_initialized());
    }
}

//! The sprite batch session state machine.

use std::sync::Arc;

use glam::Mat4;
use quadbatch_core::geometry::Rect;
use quadbatch_core::profiling::profile_function;
use quadbatch_test_utils::{
    DisplaySize, ShaderBinding, ShaderFactory, TextureHandle, TextureId, VERTEX_COMPONENTS,
    VertexSink,
};

use crate::buffer::{BatchBuffer, BatchStats};
use crate::flush;
use crate::shader::DefaultShaderCache;
use crate::sprite::{SpriteUV, VERTICES_PER_SPRITE, quad_vertices};
use crate::uniforms::Transform;
use crate::{BatchError, Color, Vertex};

/// Scalars in one raw quad passed to [`SpriteBatch::draw_vertices`].
pub const QUAD_COMPONENTS: usize = VERTICES_PER_SPRITE * VERTEX_COMPONENTS;

/// Descriptor for creating a sprite batch.
#[derive(Debug, Clone)]
pub struct SpriteBatchDescriptor {
    /// Debug label used in log output
    pub label: Option<&'static str>,
    /// Sprites buffered before a submission is forced (default: 1000)
    pub max_sprites: usize,
    /// Initial tint color (default: white)
    pub color: Color,
}

impl Default for SpriteBatchDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            max_sprites: 1000,
            color: Color::WHITE,
        }
    }
}

impl SpriteBatchDescriptor {
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_max_sprites(mut self, max_sprites: usize) -> Self {
        self.max_sprites = max_sprites;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Batches textured quads into as few draw calls as possible.
///
/// Vertices accumulate in a fixed-size buffer and are submitted when the texture
/// changes, the buffer fills up, the shader or its uniforms change, or the session ends.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use quadbatch::{SpriteBatch, SpriteBatchDescriptor, TextureHandle};
/// use quadbatch_core::geometry::Size;
/// use quadbatch_test_utils::MockGpu;
///
/// let gpu = MockGpu::new();
/// let texture: Arc<dyn TextureHandle> = gpu.create_texture(32, 32);
/// let mut batch = SpriteBatch::new(
///     gpu.create_sink(),
///     gpu.create_shader(),
///     &Size::new(800_u32, 600),
///     SpriteBatchDescriptor::default(),
/// )?;
///
/// batch.begin()?;
/// batch.draw(&texture, 10.0, 10.0)?;
/// batch.draw(&texture, 50.0, 10.0)?;
/// batch.end()?;
///
/// assert_eq!(batch.draw_calls(), 1);
/// # Ok::<(), quadbatch::BatchError>(())
/// ```
pub struct SpriteBatch<S> {
    label: Option<&'static str>,
    max_sprites: usize,
    buffer: BatchBuffer<S>,
    transform: Transform,
    shader: Arc<dyn ShaderBinding>,
    texture: Option<Arc<dyn TextureHandle>>,
    color: Color,
    drawing: bool,
}

impl<S: VertexSink> SpriteBatch<S> {
    /// Create a batch drawing into `sink` with `shader`.
    ///
    /// The projection is a y-down orthographic projection over `display`; uniforms are
    /// synced before this returns.
    pub fn new(
        sink: S,
        shader: Arc<dyn ShaderBinding>,
        display: &dyn DisplaySize,
        descriptor: SpriteBatchDescriptor,
    ) -> Result<Self, BatchError> {
        let max_sprites = if descriptor.max_sprites == 0 {
            tracing::warn!("Sprite batch created with max_sprites = 0, using 1");
            1
        } else {
            descriptor.max_sprites
        };

        let mut batch = Self {
            label: descriptor.label,
            max_sprites,
            buffer: BatchBuffer::new(sink, max_sprites),
            transform: Transform::for_viewport(display.display_size()),
            shader,
            texture: None,
            color: descriptor.color,
            drawing: false,
        };
        batch.sync_uniforms()?;

        tracing::debug!(
            label = batch.label.unwrap_or("<unnamed>"),
            max_sprites,
            "Created sprite batch"
        );
        Ok(batch)
    }

    /// Create a batch using the default sprite shader from `cache`, compiling it with
    /// `factory` if the cache is empty.
    pub fn with_default_shader(
        sink: S,
        cache: &mut DefaultShaderCache,
        factory: &dyn ShaderFactory,
        display: &dyn DisplaySize,
        descriptor: SpriteBatchDescriptor,
    ) -> Result<Self, BatchError> {
        let shader = cache.get_or_create(factory)?;
        Self::new(sink, shader, display, descriptor)
    }

    /// Start a session.
    pub fn begin(&mut self) -> Result<(), BatchError> {
        if self.drawing {
            return Err(BatchError::InvalidState {
                operation: "begin",
                drawing: true,
            });
        }
        profile_function!();

        self.drawing = true;
        self.shader.use_program();
        self.buffer.reset();
        self.texture = None;
        Ok(())
    }

    /// End the session, submitting whatever is still buffered.
    pub fn end(&mut self) -> Result<(), BatchError> {
        if !self.drawing {
            return Err(BatchError::InvalidState {
                operation: "end",
                drawing: false,
            });
        }
        profile_function!();

        self.drawing = false;
        self.flush();
        self.texture = None;

        let stats = self.buffer.stats();
        tracing::debug!(
            label = self.label.unwrap_or("<unnamed>"),
            draw_calls = stats.draw_calls,
            vertices = stats.vertices_submitted,
            "Sprite batch session ended"
        );
        Ok(())
    }

    /// Submit the buffered vertices under the bound texture. Does nothing when empty.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Some(texture) = &self.texture {
            texture.bind();
        }
        self.buffer.submit();
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Draw the whole texture at its texel size.
    pub fn draw(&mut self, texture: &Arc<dyn TextureHandle>, x: f32, y: f32) -> Result<(), BatchError> {
        let (width, height) = (texture.width() as f32, texture.height() as f32);
        self.draw_quad(texture, Rect::new(x, y, width, height), SpriteUV::FULL)
    }

    /// Draw the whole texture stretched over `width` x `height`.
    pub fn draw_sized(
        &mut self,
        texture: &Arc<dyn TextureHandle>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), BatchError> {
        self.draw_quad(texture, Rect::new(x, y, width, height), SpriteUV::FULL)
    }

    /// Draw a `width` x `height` quad with explicit texture coordinates.
    pub fn draw_uv(
        &mut self,
        texture: &Arc<dyn TextureHandle>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        uv: SpriteUV,
    ) -> Result<(), BatchError> {
        self.draw_quad(texture, Rect::new(x, y, width, height), uv)
    }

    /// Draw the texel rectangle `src` at `(x, y)` without scaling.
    pub fn draw_region(
        &mut self,
        texture: &Arc<dyn TextureHandle>,
        src: Rect<f32>,
        x: f32,
        y: f32,
    ) -> Result<(), BatchError> {
        self.draw_region_scaled(texture, src, Rect::new(x, y, src.width, src.height))
    }

    /// Draw the texel rectangle `src` stretched over `dst`.
    pub fn draw_region_scaled(
        &mut self,
        texture: &Arc<dyn TextureHandle>,
        src: Rect<f32>,
        dst: Rect<f32>,
    ) -> Result<(), BatchError> {
        let uv = SpriteUV::from_region(&src, texture.width(), texture.height());
        self.draw_quad(texture, dst, uv)
    }

    /// Draw a quad over `dst` with explicit texture coordinates, tinted by the current
    /// color.
    pub fn draw_quad(
        &mut self,
        texture: &Arc<dyn TextureHandle>,
        dst: Rect<f32>,
        uv: SpriteUV,
    ) -> Result<(), BatchError> {
        self.ensure_drawing("draw")?;
        self.check_flush(texture);

        for vertex in quad_vertices(&dst, uv, self.color) {
            self.buffer.append(vertex)?;
        }
        Ok(())
    }

    /// Draw one quad from caller-supplied vertex data.
    ///
    /// `vertices[offset..offset + 48]` holds six vertices of 8 scalars each (position,
    /// color, texcoord), in the same triangle order as generated quads. The current
    /// color is ignored.
    pub fn draw_vertices(
        &mut self,
        texture: &Arc<dyn TextureHandle>,
        vertices: &[f32],
        offset: usize,
    ) -> Result<(), BatchError> {
        self.ensure_drawing("draw_vertices")?;

        let quad = offset
            .checked_add(QUAD_COMPONENTS)
            .and_then(|end| vertices.get(offset..end))
            .ok_or_else(|| {
                BatchError::InvalidVertexData(format!(
                    "need {} scalars at offset {}, got a slice of {}",
                    QUAD_COMPONENTS,
                    offset,
                    vertices.len()
                ))
            })?;

        self.check_flush(texture);
        self.buffer.append_raw(quad)
    }

    /// Set the tint applied to subsequently drawn quads.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_color_rgba(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.color = Color::rgba(r, g, b, a);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Swap the shader and sync uniforms into it.
    pub fn set_shader(&mut self, shader: Arc<dyn ShaderBinding>) -> Result<(), BatchError> {
        self.set_shader_with(shader, true)
    }

    /// Swap the shader, optionally skipping the uniform upload.
    ///
    /// Within a session, buffered vertices are submitted under the old shader first.
    pub fn set_shader_with(
        &mut self,
        shader: Arc<dyn ShaderBinding>,
        update_uniforms: bool,
    ) -> Result<(), BatchError> {
        if self.drawing {
            self.flush();
            shader.use_program();
        }
        self.shader = shader;

        if update_uniforms {
            self.sync_uniforms()?;
        }
        Ok(())
    }

    pub fn shader(&self) -> &Arc<dyn ShaderBinding> {
        &self.shader
    }

    /// Recompute the projection-view matrix and upload it, with the sampler unit, to the
    /// current shader.
    ///
    /// Within a session, buffered vertices are submitted first so they keep the uniform
    /// state they were generated under.
    pub fn sync_uniforms(&mut self) -> Result<(), BatchError> {
        if self.drawing {
            self.flush();
        }
        self.transform.sync(&*self.shader)?;
        Ok(())
    }

    /// Like [`sync_uniforms`](Self::sync_uniforms) but targets `shader` instead of the
    /// batch's own program, which is left untouched.
    pub fn sync_uniforms_for(&mut self, shader: &dyn ShaderBinding) -> Result<(), BatchError> {
        if self.drawing {
            self.flush();
        }
        self.transform.sync(shader)?;
        Ok(())
    }

    /// Rebuild the projection for a `width` x `height` viewport and sync uniforms.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), BatchError> {
        self.transform.resize(width, height);
        self.sync_uniforms()
    }

    /// [`resize`](Self::resize) to the current size reported by `display`.
    pub fn resize_to(&mut self, display: &dyn DisplaySize) -> Result<(), BatchError> {
        let size = display.display_size();
        self.resize(size.width, size.height)
    }

    /// Replace the projection. Takes effect on the next uniform sync.
    pub fn set_projection(&mut self, projection: Mat4) {
        self.transform.set_projection(projection);
    }

    /// Replace the view. Takes effect on the next uniform sync.
    pub fn set_view(&mut self, view: Mat4) {
        self.transform.set_view(view);
    }

    pub fn projection(&self) -> &Mat4 {
        self.transform.projection()
    }

    pub fn view(&self) -> &Mat4 {
        self.transform.view()
    }

    /// The projection-view matrix uploaded by the last sync.
    pub fn combined(&self) -> &Mat4 {
        self.transform.combined()
    }

    /// Draw calls issued since the last [`begin`](Self::begin).
    pub fn draw_calls(&self) -> u32 {
        self.buffer.stats().draw_calls
    }

    pub fn stats(&self) -> BatchStats {
        self.buffer.stats()
    }

    /// Draw calls issued over the lifetime of the batch.
    pub fn total_draw_calls(&self) -> u64 {
        self.buffer.total_draw_calls()
    }

    pub fn max_sprites(&self) -> usize {
        self.max_sprites
    }

    /// Vertices buffered but not yet submitted.
    pub fn buffered_vertices(&self) -> &[Vertex] {
        self.buffer.vertices()
    }

    /// Texture the buffered vertices belong to, while drawing.
    pub fn bound_texture(&self) -> Option<TextureId> {
        self.texture.as_ref().map(|texture| texture.id())
    }

    pub fn label(&self) -> Option<&'static str> {
        self.label
    }

    pub fn sink(&self) -> &S {
        self.buffer.sink()
    }

    fn ensure_drawing(&self, operation: &'static str) -> Result<(), BatchError> {
        if self.drawing {
            Ok(())
        } else {
            Err(BatchError::InvalidState {
                operation,
                drawing: false,
            })
        }
    }

    fn check_flush(&mut self, texture: &Arc<dyn TextureHandle>) {
        let decision = flush::decide(
            self.bound_texture(),
            texture.id(),
            self.buffer.remaining_capacity(),
        );

        if decision.needs_submit() {
            self.flush();
        }
        if decision.rebinds() {
            self.texture = Some(Arc::clone(texture));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadbatch_core::geometry::Size;
    use quadbatch_test_utils::{GpuCall, MockGpu, MockVertexSink, ShaderError};

    fn batch(gpu: &MockGpu, max_sprites: usize) -> SpriteBatch<MockVertexSink> {
        SpriteBatch::new(
            gpu.create_sink(),
            gpu.create_shader(),
            &Size::new(640_u32, 480),
            SpriteBatchDescriptor::default().with_max_sprites(max_sprites),
        )
        .unwrap()
    }

    fn texture(gpu: &MockGpu, width: u32, height: u32) -> Arc<dyn TextureHandle> {
        gpu.create_texture(width, height)
    }

    #[test]
    fn test_new_syncs_uniforms() {
        let gpu = MockGpu::new();
        let batch = batch(&gpu, 10);

        assert_eq!(gpu.last_uniform_matrix("u_projView"), Some(*batch.combined()));
        assert_eq!(gpu.last_uniform_int("u_texture"), Some(0));
        assert!(!batch.is_drawing());
    }

    #[test]
    fn test_zero_max_sprites_is_clamped() {
        let gpu = MockGpu::new();
        let batch = batch(&gpu, 0);
        assert_eq!(batch.max_sprites(), 1);
    }

    #[test]
    fn test_begin_activates_shader_and_clears_texture() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        gpu.clear_calls();

        batch.begin().unwrap();

        assert!(batch.is_drawing());
        assert_eq!(gpu.count_program_uses(), 1);
        assert_eq!(batch.bound_texture(), None);
    }

    #[test]
    fn test_draw_while_idle_fails() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);

        assert_eq!(
            batch.draw(&tex, 0.0, 0.0),
            Err(BatchError::InvalidState {
                operation: "draw",
                drawing: false
            })
        );
        assert!(batch.draw_vertices(&tex, &[0.0; QUAD_COMPONENTS], 0).is_err());
        assert!(batch.buffered_vertices().is_empty());
    }

    #[test]
    fn test_draw_uses_texture_size() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 32, 16);

        batch.begin().unwrap();
        batch.draw(&tex, 5.0, 5.0).unwrap();

        let vertices = batch.buffered_vertices();
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[4].position, [37.0, 21.0]);
        assert_eq!(vertices[4].tex_coord, [1.0, 1.0]);
    }

    #[test]
    fn test_first_draw_binds_without_submitting() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);

        batch.begin().unwrap();
        batch.draw(&tex, 0.0, 0.0).unwrap();

        assert_eq!(batch.bound_texture(), Some(tex.id()));
        assert_eq!(gpu.count_draw_calls(), 0);
    }

    #[test]
    fn test_flush_binds_texture_before_draw() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);

        batch.begin().unwrap();
        batch.draw(&tex, 0.0, 0.0).unwrap();
        gpu.clear_calls();
        batch.flush();

        let calls = gpu.calls();
        assert_eq!(calls[0], GpuCall::BindTexture { texture: tex.id() });
        assert_eq!(gpu.count_draw_calls(), 1);
        assert!(batch.is_drawing());
    }

    #[test]
    fn test_draw_vertices_bypasses_color() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);
        let mut raw = vec![9.0; 4];
        raw.extend((0..QUAD_COMPONENTS).map(|i| i as f32));

        batch.set_color(Color::RED);
        batch.begin().unwrap();
        batch.draw_vertices(&tex, &raw, 4).unwrap();

        let vertices = batch.buffered_vertices();
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[0].as_scalars(), &raw[4..12]);
        assert_ne!(vertices[0].color, Color::RED.to_array());
    }

    #[test]
    fn test_draw_vertices_rejects_short_input() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);

        batch.begin().unwrap();
        let result = batch.draw_vertices(&tex, &[0.0; QUAD_COMPONENTS], 1);

        assert!(matches!(result, Err(BatchError::InvalidVertexData(_))));
        assert_eq!(batch.bound_texture(), None);
    }

    #[test]
    fn test_set_shader_while_drawing_flushes_under_old_shader() {
        let gpu = MockGpu::new();
        let old = gpu.create_shader();
        let mut batch = SpriteBatch::new(
            gpu.create_sink(),
            old.clone(),
            &Size::new(100_u32, 100),
            SpriteBatchDescriptor::default(),
        )
        .unwrap();
        let tex = texture(&gpu, 8, 8);
        let new = gpu.create_shader();

        batch.begin().unwrap();
        batch.draw(&tex, 0.0, 0.0).unwrap();
        batch.set_shader(new.clone()).unwrap();
        batch.draw(&tex, 0.0, 0.0).unwrap();
        batch.end().unwrap();

        let draws = gpu.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].program, Some(old.id()));
        assert_eq!(draws[1].program, Some(new.id()));
        assert_eq!(gpu.last_uniform_matrix("u_projView"), Some(*batch.combined()));
    }

    #[test]
    fn test_set_shader_without_uniform_update() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        gpu.clear_calls();

        batch.set_shader_with(gpu.create_shader(), false).unwrap();

        // Not drawing and no sync requested: nothing reaches the GPU.
        assert_eq!(gpu.call_count(), 0);
    }

    #[test]
    fn test_failed_sync_keeps_buffered_data_submitted() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);

        batch.begin().unwrap();
        batch.draw(&tex, 0.0, 0.0).unwrap();
        let result = batch.set_shader(gpu.create_failing_shader());

        assert!(matches!(result, Err(BatchError::Shader(ShaderError::Driver(_)))));
        assert_eq!(gpu.count_draw_calls(), 1);
        assert_eq!(gpu.draws()[0].vertices.len(), QUAD_COMPONENTS);
        assert!(batch.is_drawing());
    }

    #[test]
    fn test_resize_while_drawing_flushes_first() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);

        batch.begin().unwrap();
        batch.draw(&tex, 0.0, 0.0).unwrap();
        batch.resize(1024, 768).unwrap();

        assert_eq!(gpu.count_draw_calls(), 1);
        assert!(batch.buffered_vertices().is_empty());
        assert_eq!(
            *batch.projection(),
            quadbatch_core::math::ortho_2d(0.0, 0.0, 1024.0, 768.0)
        );
    }

    #[test]
    fn test_set_view_waits_for_sync() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let before = *batch.combined();

        batch.set_view(Mat4::from_scale(glam::Vec3::splat(2.0)));
        assert_eq!(*batch.combined(), before);

        batch.sync_uniforms().unwrap();
        assert_ne!(*batch.combined(), before);
        assert_eq!(gpu.last_uniform_matrix("u_projView"), Some(*batch.combined()));
    }

    #[test]
    fn test_sync_uniforms_for_other_shader() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let other = gpu.create_shader();
        gpu.clear_calls();

        batch.sync_uniforms_for(&*other).unwrap();

        assert_eq!(gpu.calls()[0], GpuCall::UseProgram { program: other.id() });
        assert_eq!(gpu.last_uniform_int("u_texture"), Some(0));
    }

    #[test]
    fn test_with_default_shader_reuses_cache() {
        let gpu = MockGpu::new();
        let mut cache = DefaultShaderCache::new();
        let display = Size::new(320_u32, 240);

        let first = SpriteBatch::with_default_shader(
            gpu.create_sink(),
            &mut cache,
            &gpu,
            &display,
            SpriteBatchDescriptor::default().with_label("first"),
        )
        .unwrap();
        let second = SpriteBatch::with_default_shader(
            gpu.create_sink(),
            &mut cache,
            &gpu,
            &display,
            SpriteBatchDescriptor::default(),
        )
        .unwrap();

        assert!(Arc::ptr_eq(first.shader(), second.shader()));
        assert_eq!(first.label(), Some("first"));
    }

    #[test]
    fn test_total_draw_calls_survive_sessions() {
        let gpu = MockGpu::new();
        let mut batch = batch(&gpu, 10);
        let tex = texture(&gpu, 8, 8);

        for _ in 0..3 {
            batch.begin().unwrap();
            batch.draw(&tex, 0.0, 0.0).unwrap();
            batch.end().unwrap();
            assert_eq!(batch.draw_calls(), 1);
        }
        assert_eq!(batch.total_draw_calls(), 3);
    }
}

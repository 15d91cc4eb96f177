//! Projection/view state and the uniform upload step.
//!
//! The combined matrix is only recomputed by [`Transform::sync`]. Nothing here runs per
//! draw; callers sync after changing the projection, the view or the shader.

use glam::Mat4;
use quadbatch_core::geometry::Size;
use quadbatch_core::math::{combine, ortho_2d};
use quadbatch_core::profiling::profile_function;
use quadbatch_test_utils::{ShaderBinding, ShaderError};

use crate::shader::{TEXTURE_UNIT, U_PROJ_VIEW, U_TEXTURE};

/// Projection, view and their combination as uploaded to the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    projection: Mat4,
    view: Mat4,
    combined: Mat4,
}

impl Transform {
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self {
            projection,
            view,
            combined: combine(&projection, &view),
        }
    }

    /// Y-down orthographic projection over a `size` viewport with an identity view.
    pub fn for_viewport(size: Size<u32>) -> Self {
        Self::new(
            ortho_2d(0.0, 0.0, size.width as f32, size.height as f32),
            Mat4::IDENTITY,
        )
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// The matrix uploaded by the last [`sync`](Self::sync).
    pub fn combined(&self) -> &Mat4 {
        &self.combined
    }

    /// Replace the projection (row-vector layout, see [`ortho_2d`]).
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    /// Rebuild the projection for a `width` x `height` viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection = ortho_2d(0.0, 0.0, width as f32, height as f32);
    }

    /// Recompute the combined matrix, activate `shader` and upload the projection-view
    /// and sampler uniforms.
    ///
    /// Uniforms the program does not declare are skipped; any other failure is returned.
    pub fn sync(&mut self, shader: &dyn ShaderBinding) -> Result<(), ShaderError> {
        profile_function!();

        self.combined = combine(&self.projection, &self.view);

        shader.use_program();
        tolerate_missing(shader.set_uniform_matrix(U_PROJ_VIEW, false, &self.combined))?;
        tolerate_missing(shader.set_uniform_i32(U_TEXTURE, TEXTURE_UNIT))?;
        Ok(())
    }
}

fn tolerate_missing(result: Result<(), ShaderError>) -> Result<(), ShaderError> {
    match result {
        Err(ShaderError::UniformNotFound(name)) => {
            tracing::trace!("Shader has no '{}' uniform, skipping upload", name);
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use quadbatch_test_utils::{GpuCall, MockGpu};

    #[test]
    fn test_sync_uploads_combined_and_texture_unit() {
        let gpu = MockGpu::new();
        let shader = gpu.create_shader();
        let mut transform = Transform::for_viewport(Size::new(800, 600));

        transform.sync(&*shader).unwrap();

        let expected = transform.projection().transpose() * *transform.view();
        assert_eq!(gpu.last_uniform_matrix(U_PROJ_VIEW), Some(expected));
        assert_eq!(gpu.last_uniform_int(U_TEXTURE), Some(0));
        assert_eq!(
            gpu.calls()[0],
            GpuCall::UseProgram {
                program: shader.id()
            }
        );
    }

    #[test]
    fn test_matrix_is_uploaded_untransposed() {
        let gpu = MockGpu::new();
        let shader = gpu.create_shader();
        let mut transform = Transform::for_viewport(Size::new(10, 10));
        transform.sync(&*shader).unwrap();

        let transposed = gpu.calls().iter().find_map(|call| match call {
            GpuCall::SetUniformMatrix { transpose, .. } => Some(*transpose),
            _ => None,
        });
        assert_eq!(transposed, Some(false));
    }

    #[test]
    fn test_combined_only_changes_on_sync() {
        let gpu = MockGpu::new();
        let shader = gpu.create_shader();
        let mut transform = Transform::for_viewport(Size::new(100, 100));
        let before = *transform.combined();

        transform.set_view(Mat4::from_translation(Vec3::new(50.0, 0.0, 0.0)));
        assert_eq!(*transform.combined(), before);

        transform.sync(&*shader).unwrap();
        assert_ne!(*transform.combined(), before);
    }

    #[test]
    fn test_resize_changes_projection() {
        let mut transform = Transform::for_viewport(Size::new(100, 100));
        transform.resize(200, 50);
        assert_eq!(*transform.projection(), ortho_2d(0.0, 0.0, 200.0, 50.0));
    }

    #[test]
    fn test_missing_uniforms_are_tolerated() {
        let gpu = MockGpu::new();
        let shader = gpu.create_strict_shader(&[U_PROJ_VIEW]);
        let mut transform = Transform::for_viewport(Size::new(64, 64));

        assert!(transform.sync(&*shader).is_ok());
        assert!(gpu.last_uniform_matrix(U_PROJ_VIEW).is_some());
        assert_eq!(gpu.last_uniform_int(U_TEXTURE), None);
    }

    #[test]
    fn test_driver_errors_propagate() {
        let gpu = MockGpu::new();
        let shader = gpu.create_failing_shader();
        let mut transform = Transform::for_viewport(Size::new(64, 64));

        assert!(matches!(
            transform.sync(&*shader),
            Err(ShaderError::Driver(_))
        ));
    }
}

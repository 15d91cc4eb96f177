//! Matrix helpers on top of `glam`.
//!
//! The batcher follows a row-vector convention for projections: [`ortho_2d`] returns
//! the projection with its translation in the bottom row, and the uniform sync step
//! transposes it before multiplying with the view. [`combine`] is that step.
//!
//! ```
//! use quadbatch_core::math::{combine, ortho_2d, Mat4, Vec3};
//!
//! let projection = ortho_2d(0.0, 0.0, 800.0, 600.0);
//! let clip = combine(&projection, &Mat4::IDENTITY).project_point3(Vec3::ZERO);
//!
//! // Top-left of the viewport lands in the top-left of clip space.
//! assert!((clip.x + 1.0).abs() < 1e-6);
//! assert!((clip.y - 1.0).abs() < 1e-6);
//! ```

pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// Y-down orthographic projection covering `(x, y)`-`(x + width, y + height)`, in
/// row-vector layout.
pub fn ortho_2d(x: f32, y: f32, width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_rh_gl(x, x + width, y + height, y, -1.0, 1.0).transpose()
}

/// `transpose(projection) × view`, the matrix uploaded as the projection-view uniform.
#[inline]
pub fn combine(projection: &Mat4, view: &Mat4) -> Mat4 {
    projection.transpose() * *view
}

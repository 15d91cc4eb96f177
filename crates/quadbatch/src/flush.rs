//! When to submit the buffered vertices before accepting another sprite.
//!
//! Batches are keyed on texture identity only. A texture change always forces a
//! submission, even with room left in the buffer, because the buffered vertices are
//! drawn with whatever texture is bound at submission time.

use quadbatch_test_utils::TextureId;

use crate::sprite::VERTICES_PER_SPRITE;

/// What the batch must do before appending vertices for the requested texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    /// Nothing is bound yet: adopt the requested texture, nothing to submit.
    Bind,
    /// Submit the buffered vertices under the current texture, then adopt the new one.
    SubmitThenBind,
    /// Keep accumulating under the current texture.
    Continue,
}

impl FlushDecision {
    pub fn needs_submit(self) -> bool {
        matches!(self, Self::SubmitThenBind)
    }

    pub fn rebinds(self) -> bool {
        matches!(self, Self::Bind | Self::SubmitThenBind)
    }
}

/// Decide how to proceed given the bound texture, the requested texture and the
/// number of free vertex slots.
pub fn decide(bound: Option<TextureId>, requested: TextureId, remaining: usize) -> FlushDecision {
    match bound {
        None => FlushDecision::Bind,
        Some(current) if current != requested || remaining < VERTICES_PER_SPRITE => {
            FlushDecision::SubmitThenBind
        }
        Some(_) => FlushDecision::Continue,
    }
}

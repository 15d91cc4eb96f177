//! Bounded CPU-side vertex storage in front of a [`VertexSink`].

use quadbatch_core::profiling::profile_function;
use quadbatch_test_utils::{VERTEX_COMPONENTS, VertexSink};
use wgpu::PrimitiveTopology;

use crate::sprite::VERTICES_PER_SPRITE;
use crate::{BatchError, Vertex};

/// Submission statistics for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Number of draw calls issued.
    pub draw_calls: u32,
    /// Total vertices submitted.
    pub vertices_submitted: usize,
    /// Vertex count of the largest single submission.
    pub largest_batch: usize,
}

/// Append-only vertex storage with a fixed capacity.
///
/// Storage is allocated once and overwritten in place; each [`submit`](Self::submit)
/// issues one triangle-list draw over everything appended since the last one.
pub struct BatchBuffer<S> {
    sink: S,
    storage: Box<[Vertex]>,
    cursor: usize,
    stats: BatchStats,
    total_draw_calls: u64,
}

impl<S: VertexSink> BatchBuffer<S> {
    /// Create a buffer holding `max_sprites` sprites (`max_sprites * 6` vertices).
    pub fn new(sink: S, max_sprites: usize) -> Self {
        let capacity = max_sprites * VERTICES_PER_SPRITE;
        Self {
            sink,
            storage: vec![Vertex::default(); capacity].into_boxed_slice(),
            cursor: 0,
            stats: BatchStats::default(),
            total_draw_calls: 0,
        }
    }

    /// Capacity in vertices.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of buffered vertices.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Free vertex slots.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// The buffered, not yet submitted vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.storage[..self.cursor]
    }

    pub fn append(&mut self, vertex: Vertex) -> Result<(), BatchError> {
        debug_assert!(
            self.cursor < self.capacity(),
            "vertex appended to a full batch buffer"
        );
        let Some(slot) = self.storage.get_mut(self.cursor) else {
            return Err(BatchError::CapacityExceeded {
                capacity: self.capacity(),
            });
        };
        *slot = vertex;
        self.cursor += 1;
        Ok(())
    }

    /// Append pre-computed vertices given as raw scalars, 8 per vertex.
    pub fn append_raw(&mut self, components: &[f32]) -> Result<(), BatchError> {
        let vertices: &[Vertex] = bytemuck::try_cast_slice(components).map_err(|_| {
            BatchError::InvalidVertexData(format!(
                "{} scalars is not a whole number of {}-component vertices",
                components.len(),
                VERTEX_COMPONENTS
            ))
        })?;

        debug_assert!(
            vertices.len() <= self.remaining_capacity(),
            "raw vertices appended past the batch buffer capacity"
        );
        if vertices.len() > self.remaining_capacity() {
            return Err(BatchError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        let end = self.cursor + vertices.len();
        self.storage[self.cursor..end].copy_from_slice(vertices);
        self.cursor = end;
        Ok(())
    }

    /// Upload and draw the buffered vertices, then rewind.
    ///
    /// Returns `false` without touching the sink when nothing is buffered.
    pub fn submit(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        profile_function!();

        let count = self.cursor;
        let scalars: &[f32] = bytemuck::cast_slice(&self.storage[..count]);

        self.sink.clear();
        self.sink.write(scalars, 0);
        self.sink.flip();
        self.sink.bind();
        self.sink.draw(PrimitiveTopology::TriangleList, 0, count as u32);
        self.sink.unbind();
        self.sink.clear();

        self.cursor = 0;
        self.stats.draw_calls += 1;
        self.stats.vertices_submitted += count;
        self.stats.largest_batch = self.stats.largest_batch.max(count);
        self.total_draw_calls += 1;

        tracing::trace!(vertices = count, draw_call = self.stats.draw_calls, "Submitted sprite batch");
        true
    }

    /// Rewind without drawing and start a fresh statistics window.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.stats = BatchStats::default();
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Draw calls issued over the lifetime of the buffer.
    pub fn total_draw_calls(&self) -> u64 {
        self.total_draw_calls
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

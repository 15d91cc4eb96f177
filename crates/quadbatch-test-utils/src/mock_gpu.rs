//! Mock graphics collaborators for testing.
//!
//! Everything created from one [`MockGpu`] records into the same call timeline, so tests
//! can assert on ordering across textures, shaders and vertex sinks.

use std::sync::Arc;

use glam::Mat4;
use parking_lot::Mutex;
use wgpu::PrimitiveTopology;

use crate::backend::*;

/// Records a graphics call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    BindTexture {
        texture: TextureId,
    },
    CompileProgram {
        program: usize,
    },
    UseProgram {
        program: usize,
    },
    SetUniformMatrix {
        program: usize,
        name: String,
        transpose: bool,
        matrix: Mat4,
    },
    SetUniformInt {
        program: usize,
        name: String,
        value: i32,
    },
    SinkBind {
        sink: usize,
    },
    SinkWrite {
        sink: usize,
        offset: usize,
        data: Vec<f32>,
    },
    SinkFlip {
        sink: usize,
    },
    SinkDraw {
        sink: usize,
        topology: PrimitiveTopology,
        start: u32,
        count: u32,
    },
    SinkUnbind {
        sink: usize,
    },
    SinkClear {
        sink: usize,
    },
}

/// A draw call reconstructed from the timeline, with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub sink: usize,
    /// Last texture bound before the draw.
    pub texture: Option<TextureId>,
    /// Last program activated before the draw.
    pub program: Option<usize>,
    pub topology: PrimitiveTopology,
    pub start: u32,
    pub count: u32,
    /// The staged scalars covering `start..start + count`.
    pub vertices: Vec<f32>,
}

impl RecordedDraw {
    /// The scalars of vertex `index` within this draw.
    pub fn vertex(&self, index: usize) -> &[f32] {
        &self.vertices[index * VERTEX_COMPONENTS..(index + 1) * VERTEX_COMPONENTS]
    }
}

type CallLog = Arc<Mutex<Vec<GpuCall>>>;

/// Mock graphics device handing out textures, shaders and vertex sinks.
///
/// # Example
///
/// ```rust
/// use quadbatch_test_utils::{MockGpu, ShaderBinding};
///
/// let gpu = MockGpu::new();
/// let shader = gpu.create_shader();
/// shader.use_program();
///
/// assert_eq!(gpu.call_count(), 1);
/// ```
pub struct MockGpu {
    calls: CallLog,
    next_texture_id: Mutex<u64>,
    next_program_id: Mutex<usize>,
    next_sink_id: Mutex<usize>,
    fail_compiles: Mutex<bool>,
}

impl MockGpu {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            next_texture_id: Mutex::new(1),
            next_program_id: Mutex::new(0),
            next_sink_id: Mutex::new(0),
            fail_compiles: Mutex::new(false),
        }
    }

    pub fn create_texture(&self, width: u32, height: u32) -> Arc<MockTexture> {
        let mut next = self.next_texture_id.lock();
        let id = TextureId::new(*next);
        *next += 1;

        Arc::new(MockTexture {
            id,
            width,
            height,
            calls: Arc::clone(&self.calls),
        })
    }

    /// A shader that accepts any uniform name.
    pub fn create_shader(&self) -> Arc<MockShader> {
        self.shader_with_mode(UniformMode::Lenient)
    }

    /// A shader that only knows the given uniforms and reports the rest as missing.
    pub fn create_strict_shader(&self, uniforms: &[&str]) -> Arc<MockShader> {
        self.shader_with_mode(UniformMode::Strict(
            uniforms.iter().map(|name| name.to_string()).collect(),
        ))
    }

    /// A shader whose uniform uploads always fail with a driver error.
    pub fn create_failing_shader(&self) -> Arc<MockShader> {
        self.shader_with_mode(UniformMode::Failing)
    }

    pub fn create_sink(&self) -> MockVertexSink {
        let mut next = self.next_sink_id.lock();
        let id = *next;
        *next += 1;

        MockVertexSink {
            id,
            bound: false,
            calls: Arc::clone(&self.calls),
        }
    }

    /// Make subsequent [`ShaderFactory::create_program`] calls fail.
    pub fn fail_compiles(&self, fail: bool) {
        *self.fail_compiles.lock() = fail;
    }

    fn shader_with_mode(&self, mode: UniformMode) -> Arc<MockShader> {
        let mut next = self.next_program_id.lock();
        let id = *next;
        *next += 1;

        Arc::new(MockShader {
            id,
            mode,
            calls: Arc::clone(&self.calls),
        })
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn count_draw_calls(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::SinkDraw { .. }))
    }

    pub fn count_texture_binds(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::BindTexture { .. }))
    }

    pub fn count_program_uses(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::UseProgram { .. }))
    }

    pub fn count_sink_calls(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                GpuCall::SinkBind { .. }
                    | GpuCall::SinkWrite { .. }
                    | GpuCall::SinkFlip { .. }
                    | GpuCall::SinkDraw { .. }
                    | GpuCall::SinkUnbind { .. }
                    | GpuCall::SinkClear { .. }
            )
        })
    }

    fn count(&self, predicate: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    /// The most recent matrix uploaded under `name`.
    pub fn last_uniform_matrix(&self, name: &str) -> Option<Mat4> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            GpuCall::SetUniformMatrix {
                name: uniform,
                matrix,
                ..
            } if uniform == name => Some(*matrix),
            _ => None,
        })
    }

    /// The most recent integer uploaded under `name`.
    pub fn last_uniform_int(&self, name: &str) -> Option<i32> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            GpuCall::SetUniformInt {
                name: uniform,
                value,
                ..
            } if uniform == name => Some(*value),
            _ => None,
        })
    }

    /// Replay the timeline and return every draw call with its texture, program and
    /// vertex data.
    pub fn draws(&self) -> Vec<RecordedDraw> {
        let calls = self.calls.lock();
        let mut texture = None;
        let mut program = None;
        let mut staged: Vec<(usize, Vec<f32>)> = Vec::new();
        let mut draws = Vec::new();

        for call in calls.iter() {
            match call {
                GpuCall::BindTexture { texture: id } => texture = Some(*id),
                GpuCall::UseProgram { program: id } => program = Some(*id),
                GpuCall::SinkWrite { sink, offset, data } => {
                    let buffer = staging_for(&mut staged, *sink);
                    if buffer.len() < offset + data.len() {
                        buffer.resize(offset + data.len(), 0.0);
                    }
                    buffer[*offset..offset + data.len()].copy_from_slice(data);
                }
                GpuCall::SinkClear { sink } => staging_for(&mut staged, *sink).clear(),
                GpuCall::SinkDraw {
                    sink,
                    topology,
                    start,
                    count,
                } => {
                    let buffer = staging_for(&mut staged, *sink);
                    let from = (*start as usize * VERTEX_COMPONENTS).min(buffer.len());
                    let to = ((*start + *count) as usize * VERTEX_COMPONENTS).min(buffer.len());
                    draws.push(RecordedDraw {
                        sink: *sink,
                        texture,
                        program,
                        topology: *topology,
                        start: *start,
                        count: *count,
                        vertices: buffer[from..to].to_vec(),
                    });
                }
                _ => {}
            }
        }

        draws
    }
}

fn staging_for(staged: &mut Vec<(usize, Vec<f32>)>, sink: usize) -> &mut Vec<f32> {
    let index = match staged.iter().position(|(id, _)| *id == sink) {
        Some(index) => index,
        None => {
            staged.push((sink, Vec::new()));
            staged.len() - 1
        }
    };
    &mut staged[index].1
}

impl Default for MockGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderFactory for MockGpu {
    fn create_program(
        &self,
        _source: &str,
        attributes: &[VertexAttrib],
    ) -> Result<Arc<dyn ShaderBinding>, ShaderError> {
        if *self.fail_compiles.lock() {
            return Err(ShaderError::Compile("mock compile failure".into()));
        }
        if attributes.is_empty() {
            return Err(ShaderError::Compile("no vertex attributes declared".into()));
        }

        let shader = self.create_shader();
        self.calls
            .lock()
            .push(GpuCall::CompileProgram { program: shader.id });
        Ok(shader as Arc<dyn ShaderBinding>)
    }
}

/// Mock texture. Binding records [`GpuCall::BindTexture`].
#[derive(Debug)]
pub struct MockTexture {
    id: TextureId,
    width: u32,
    height: u32,
    calls: CallLog,
}

impl TextureHandle for MockTexture {
    fn id(&self) -> TextureId {
        self.id
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bind(&self) {
        self.calls.lock().push(GpuCall::BindTexture { texture: self.id });
    }
}

#[derive(Debug, Clone)]
enum UniformMode {
    Lenient,
    Strict(Vec<String>),
    Failing,
}

/// Mock shader program.
#[derive(Debug)]
pub struct MockShader {
    id: usize,
    mode: UniformMode,
    calls: CallLog,
}

impl MockShader {
    pub fn id(&self) -> usize {
        self.id
    }

    fn check_uniform(&self, name: &str) -> Result<(), ShaderError> {
        match &self.mode {
            UniformMode::Lenient => Ok(()),
            UniformMode::Strict(known) if known.iter().any(|uniform| uniform == name) => Ok(()),
            UniformMode::Strict(_) => Err(ShaderError::UniformNotFound(name.to_string())),
            UniformMode::Failing => Err(ShaderError::Driver(format!("cannot set '{}'", name))),
        }
    }
}

impl ShaderBinding for MockShader {
    fn use_program(&self) {
        self.calls.lock().push(GpuCall::UseProgram { program: self.id });
    }

    fn set_uniform_matrix(&self, name: &str, transpose: bool, matrix: &Mat4) -> Result<(), ShaderError> {
        self.check_uniform(name)?;
        self.calls.lock().push(GpuCall::SetUniformMatrix {
            program: self.id,
            name: name.to_string(),
            transpose,
            matrix: *matrix,
        });
        Ok(())
    }

    fn set_uniform_i32(&self, name: &str, value: i32) -> Result<(), ShaderError> {
        self.check_uniform(name)?;
        self.calls.lock().push(GpuCall::SetUniformInt {
            program: self.id,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn label(&self) -> Option<&str> {
        Some("mock shader")
    }
}

/// Mock vertex sink.
///
/// # Panics
/// `draw` panics if the sink is not bound, mirroring a driver that would reject the
/// call; tests should never hit this.
#[derive(Debug)]
pub struct MockVertexSink {
    id: usize,
    bound: bool,
    calls: CallLog,
}

impl MockVertexSink {
    pub fn id(&self) -> usize {
        self.id
    }

    fn record(&self, call: GpuCall) {
        self.calls.lock().push(call);
    }
}

impl VertexSink for MockVertexSink {
    fn bind(&mut self) {
        self.bound = true;
        self.record(GpuCall::SinkBind { sink: self.id });
    }

    fn write(&mut self, scalars: &[f32], offset: usize) {
        self.record(GpuCall::SinkWrite {
            sink: self.id,
            offset,
            data: scalars.to_vec(),
        });
    }

    fn draw(&mut self, topology: PrimitiveTopology, start: u32, count: u32) {
        assert!(self.bound, "draw issued on an unbound mock vertex sink");
        self.record(GpuCall::SinkDraw {
            sink: self.id,
            topology,
            start,
            count,
        });
    }

    fn unbind(&mut self) {
        self.bound = false;
        self.record(GpuCall::SinkUnbind { sink: self.id });
    }

    fn flip(&mut self) {
        self.record(GpuCall::SinkFlip { sink: self.id });
    }

    fn clear(&mut self) {
        self.record(GpuCall::SinkClear { sink: self.id });
    }
}

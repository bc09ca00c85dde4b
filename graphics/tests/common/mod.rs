//! Shared setup for the graphics integration tests.
//!
//! Tests are parameterized over [`Backend`] with `rstest`; a backend that is
//! not compiled in, or has no adapter on this machine, is skipped.

#![allow(dead_code)]

use std::sync::Arc;

use squared_ecs::Core;
use squared_graphics::{
    BackendSelection, BindGroup, BindGroupAsset, BindGroupContainer, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, BufferUsage, Color, ColorOutput, DepthOutput, DummyBackend,
    GpuBuffer, GpuBufferContainer, GraphicContext, GraphicPlugin, GraphicSettings, GraphicsError,
    RecordedCommand, RenderPass, RenderPassBase, RenderPassEncoder, Shader, ShaderContainer,
    ShaderDescriptor, StaticBuffer, Texture, TextureContainer, TextureFormat,
};

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Available GPU backends for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Recording backend, no GPU involved.
    Dummy,
    /// wgpu on whatever adapter the host offers.
    Wgpu,
}

impl Backend {
    /// Whether the backend is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Dummy => true,
            Backend::Wgpu => squared_graphics::has_gpu_backend(),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A core with the graphic plugin installed and a context already created.
pub struct TestContext {
    pub core: Core,
    /// Set for the dummy backend, to inspect the recorded commands.
    pub recorder: Option<Arc<DummyBackend>>,
}

impl TestContext {
    pub fn new(backend: Backend) -> Option<Self> {
        if !backend.is_available() {
            return None;
        }
        squared_core::init_test_logging();

        let mut core = Core::new();
        let recorder = match backend {
            Backend::Dummy => {
                let recorder = Arc::new(DummyBackend::new());
                core.register_resource(GraphicContext::with_backend(recorder.clone()))
                    .ok()?;
                Some(recorder)
            }
            Backend::Wgpu => {
                let settings = GraphicSettings::default().with_backend(BackendSelection::Wgpu);
                let context = match GraphicContext::new(&settings) {
                    Ok(context) => context,
                    Err(e) => {
                        eprintln!("wgpu backend unavailable: {e}");
                        return None;
                    }
                };
                core.register_resource(context).ok()?;
                None
            }
        };
        core.add_plugins::<(GraphicPlugin,)>().ok()?;
        Some(Self { core, recorder })
    }

    /// Recorded commands since the last call (dummy backend only).
    pub fn take_recorded(&self) -> Vec<RecordedCommand> {
        self.recorder
            .as_ref()
            .map(|recorder| recorder.take_recorded())
            .unwrap_or_default()
    }
}

// ============================================================================
// Scene Resources
// ============================================================================

pub const COLOR_TARGET: &str = "COLOR_TARGET";
pub const DEPTH_TARGET: &str = "DEPTH_TARGET";
pub const TRIANGLE_SHADER: &str = "TRIANGLE_SHADER";
pub const TINT_BUFFER: &str = "TINT_BUFFER";
pub const TINT_BIND_GROUP: &str = "TINT_BIND_GROUP";

pub const TRIANGLE_WGSL: &str = r#"
struct Tint {
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> tint: Tint;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(index) - 1);
    let y = f32(i32(index & 1u) * 2 - 1);
    return vec4<f32>(x, y, 0.5, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint.color;
}
"#;

pub fn triangle_shader() -> ShaderDescriptor {
    ShaderDescriptor::new(TRIANGLE_SHADER, TRIANGLE_WGSL)
        .with_bind_group_layout(BindGroupLayoutDescriptor::new([BindGroupLayoutEntry::new(
            0,
            BindingType::UniformBuffer,
        )]))
        .with_color_target(TextureFormat::Rgba8Unorm)
        .with_depth_format(TextureFormat::Depth32Float)
}

/// Registers the targets, the triangle shader and its tint bind group.
pub fn setup_scene(core: &mut Core) -> Result<(), GraphicsError> {
    let context = core.resource::<GraphicContext>()?.clone();

    let color = Texture::render_target(&context, COLOR_TARGET, 16, 16, TextureFormat::Rgba8Unorm)?;
    let depth =
        Texture::render_target(&context, DEPTH_TARGET, 16, 16, TextureFormat::Depth32Float)?;
    {
        let textures = core.get_resource::<TextureContainer>()?;
        textures.add(COLOR_TARGET, color);
        textures.add(DEPTH_TARGET, depth);
    }

    let shader = Shader::create(&context, triangle_shader())?;
    core.get_resource::<ShaderContainer>()?
        .add(TRIANGLE_SHADER, shader);

    let mut tint = StaticBuffer::from_pod(TINT_BUFFER, BufferUsage::UNIFORM, &[1.0f32, 0.0, 0.0, 1.0]);
    tint.create(core)?;
    core.get_resource::<GpuBufferContainer>()?
        .add(TINT_BUFFER, Box::new(tint));

    let group = BindGroup::new(core, TINT_BIND_GROUP, TRIANGLE_SHADER, 0, vec![
        BindGroupAsset::buffer(0, TINT_BUFFER, 16),
    ])?;
    core.get_resource::<BindGroupContainer>()?
        .add(TINT_BIND_GROUP, group);
    Ok(())
}

// ============================================================================
// Passes
// ============================================================================

/// Draws one triangle per execution.
pub struct TrianglePass {
    base: RenderPassBase,
    pub draws: u32,
}

impl TrianglePass {
    /// Clears the color and depth targets and reads the tint at group 0.
    pub fn new(name: &str) -> Self {
        let mut base = RenderPassBase::new(name);
        base.bind_shader(TRIANGLE_SHADER)
            .add_output(0, ColorOutput::new(COLOR_TARGET).cleared_to(Color::BLACK))
            .add_depth_output(DepthOutput::new(DEPTH_TARGET).cleared_to(1.0))
            .add_input(0, TINT_BIND_GROUP);
        Self { base, draws: 0 }
    }
}

impl RenderPass for TrianglePass {
    fn base(&self) -> &RenderPassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderPassBase {
        &mut self.base
    }

    fn unique_render_callback(
        &mut self,
        render_pass: &mut RenderPassEncoder<'_>,
        _core: &mut Core,
    ) -> Result<(), GraphicsError> {
        render_pass.draw(0..3, 0..1);
        self.draws += 1;
        Ok(())
    }
}

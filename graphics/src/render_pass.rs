//! Render passes: shared configuration plus single and multiple execution.
//!
//! A pass type owns a [`RenderPassBase`] (name, shader, outputs, inputs)
//! and implements [`RenderPass::unique_render_callback`] to issue its own
//! draws. The base takes care of everything around the callback:
//!
//! 1. resolve the output views and run the clear callbacks
//! 2. create a command encoder labelled with the pass name
//! 3. begin the pass, set the shader pipeline and every input bind group
//! 4. call the pass's callback
//! 5. end the pass, finish the encoder and submit
//!
//! The encoder guards end the pass and release the encoder on every early
//! return, so a failing callback never leaves recording half open.

use std::collections::BTreeMap;
use std::fmt;

use squared_core::HashedStr;
use squared_ecs::Core;

use crate::backend::{
    BindGroupHandle, ColorAttachment, DepthAttachment, PipelineHandle, RenderPassDescriptor,
    TextureViewHandle,
};
use crate::bind_group::BindGroupContainer;
use crate::context::GraphicContext;
use crate::encoder::RenderPassEncoder;
use crate::error::GraphicsError;
use crate::shader::{ShaderContainer, ValidationError};
use crate::texture::TextureContainer;
use crate::types::{Color, LoadOp, StoreOp};

/// Decides whether a color output is cleared this frame, and to what.
pub type ClearColorFn = Box<dyn FnMut(&mut Core, &mut Color) -> bool>;

/// Decides whether the depth output is cleared this frame, and to what.
pub type ClearDepthFn = Box<dyn FnMut(&mut Core, &mut f32) -> bool>;

/// A color attachment, named by its texture id.
pub struct ColorOutput {
    pub texture_id: HashedStr,
    /// Multisample resolve target.
    pub resolve_target_id: Option<HashedStr>,
    pub store_op: StoreOp,
    /// Without a callback the previous contents are loaded.
    pub clear_color: Option<ClearColorFn>,
}

impl ColorOutput {
    pub fn new(texture_id: impl Into<HashedStr>) -> Self {
        Self {
            texture_id: texture_id.into(),
            resolve_target_id: None,
            store_op: StoreOp::Store,
            clear_color: None,
        }
    }

    pub fn with_resolve_target(mut self, texture_id: impl Into<HashedStr>) -> Self {
        self.resolve_target_id = Some(texture_id.into());
        self
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    pub fn with_clear_color(
        mut self,
        callback: impl FnMut(&mut Core, &mut Color) -> bool + 'static,
    ) -> Self {
        self.clear_color = Some(Box::new(callback));
        self
    }

    /// Clears to `color` every frame.
    pub fn cleared_to(self, color: Color) -> Self {
        self.with_clear_color(move |_, clear| {
            *clear = color;
            true
        })
    }
}

impl fmt::Debug for ColorOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorOutput")
            .field("texture_id", &self.texture_id)
            .field("resolve_target_id", &self.resolve_target_id)
            .field("store_op", &self.store_op)
            .field("clear_color", &self.clear_color.is_some())
            .finish()
    }
}

/// Where the depth attachment comes from.
#[derive(Debug, Clone)]
pub enum DepthTarget {
    /// A texture of the [`TextureContainer`].
    Texture(HashedStr),
    /// An explicit view, e.g. one layer of a shadow map array.
    View(TextureViewHandle),
}

pub struct DepthOutput {
    pub target: DepthTarget,
    pub store_op: StoreOp,
    pub clear_depth: Option<ClearDepthFn>,
}

impl DepthOutput {
    pub fn new(texture_id: impl Into<HashedStr>) -> Self {
        Self::with_target(DepthTarget::Texture(texture_id.into()))
    }

    pub fn with_target(target: DepthTarget) -> Self {
        Self {
            target,
            store_op: StoreOp::Store,
            clear_depth: None,
        }
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    pub fn with_clear_depth(
        mut self,
        callback: impl FnMut(&mut Core, &mut f32) -> bool + 'static,
    ) -> Self {
        self.clear_depth = Some(Box::new(callback));
        self
    }

    /// Clears to `depth` every frame.
    pub fn cleared_to(self, depth: f32) -> Self {
        self.with_clear_depth(move |_, clear| {
            *clear = depth;
            true
        })
    }
}

impl fmt::Debug for DepthOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepthOutput")
            .field("target", &self.target)
            .field("store_op", &self.store_op)
            .field("clear_depth", &self.clear_depth.is_some())
            .finish()
    }
}

/// Name, shader, outputs and inputs shared by every render pass.
#[derive(Debug)]
pub struct RenderPassBase {
    name: String,
    id: HashedStr,
    shader: Option<HashedStr>,
    outputs: BTreeMap<u32, ColorOutput>,
    depth_output: Option<DepthOutput>,
    inputs: BTreeMap<u32, HashedStr>,
}

impl RenderPassBase {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: HashedStr::owned(name.clone()),
            name,
            shader: None,
            outputs: BTreeMap::new(),
            depth_output: None,
            inputs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &HashedStr {
        &self.id
    }

    /// Sets the shader looked up in the [`ShaderContainer`] at execution.
    pub fn bind_shader(&mut self, shader_id: impl Into<HashedStr>) -> &mut Self {
        self.shader = Some(shader_id.into());
        self
    }

    pub fn shader(&self) -> Option<&HashedStr> {
        self.shader.as_ref()
    }

    /// Sets color output `index`, replacing (with a warning) a previous one.
    pub fn add_output(&mut self, index: u32, output: ColorOutput) -> &mut Self {
        if self.outputs.insert(index, output).is_some() {
            log::warn!(
                "Render pass `{}`: output {index} already set, overwriting",
                self.name
            );
        }
        self
    }

    pub fn add_depth_output(&mut self, output: DepthOutput) -> &mut Self {
        if self.depth_output.replace(output).is_some() {
            log::warn!(
                "Render pass `{}`: depth output already set, overwriting",
                self.name
            );
        }
        self
    }

    /// Binds the bind group `bind_group_id` at `group_index` before the
    /// pass callback runs.
    pub fn add_input(&mut self, group_index: u32, bind_group_id: impl Into<HashedStr>) -> &mut Self {
        if self.inputs.insert(group_index, bind_group_id.into()).is_some() {
            log::warn!(
                "Render pass `{}`: input {group_index} already set, overwriting",
                self.name
            );
        }
        self
    }

    pub fn outputs(&self) -> &BTreeMap<u32, ColorOutput> {
        &self.outputs
    }

    pub fn depth_output(&self) -> Option<&DepthOutput> {
        self.depth_output.as_ref()
    }

    pub fn inputs(&self) -> &BTreeMap<u32, HashedStr> {
        &self.inputs
    }

    fn has_outputs(&self) -> bool {
        !self.outputs.is_empty() || self.depth_output.is_some()
    }

    /// Reports what would make the pass fail, or behave unexpectedly, if it
    /// were executed now.
    pub fn validate(&self, core: &Core) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let location = |part: String| format!("render pass `{}` {part}", self.name);

        if !self.has_outputs() {
            errors.push(ValidationError::error(
                location("outputs".into()),
                "no output set",
            ));
        }

        match (&self.shader, core.resource::<ShaderContainer>()) {
            (None, _) => errors.push(ValidationError::error(
                location("shader".into()),
                "no shader bound",
            )),
            (Some(id), Ok(shaders)) if !shaders.contains(id) => {
                errors.push(ValidationError::error(
                    location("shader".into()),
                    format!("shader `{id}` not found"),
                ));
            }
            (Some(_), Err(e)) => errors.push(ValidationError::error(
                location("shader".into()),
                e.to_string(),
            )),
            _ => {}
        }

        let textures = core.resource::<TextureContainer>().ok();
        let mut check_texture = |part: String, id: &HashedStr| {
            if !textures.as_ref().is_some_and(|textures| textures.contains(id)) {
                errors.push(ValidationError::error(
                    location(part),
                    format!("texture `{id}` not found"),
                ));
            }
        };
        for (index, output) in &self.outputs {
            check_texture(format!("output {index}"), &output.texture_id);
            if let Some(resolve) = &output.resolve_target_id {
                check_texture(format!("output {index} resolve target"), resolve);
            }
        }
        if let Some(DepthOutput {
            target: DepthTarget::Texture(id),
            ..
        }) = &self.depth_output
        {
            check_texture("depth output".into(), id);
        }

        for (index, output) in &self.outputs {
            if output.clear_color.is_none() {
                errors.push(ValidationError::warning(
                    location(format!("output {index}")),
                    "no clear color callback, previous contents are loaded",
                ));
            }
        }
        if let Some(depth) = &self.depth_output
            && depth.clear_depth.is_none()
        {
            errors.push(ValidationError::warning(
                location("depth output".into()),
                "no clear depth callback, previous contents are loaded",
            ));
        }

        let bind_groups = core.resource::<BindGroupContainer>().ok();
        for (index, id) in &self.inputs {
            if !bind_groups.as_ref().is_some_and(|groups| groups.contains(id)) {
                errors.push(ValidationError::warning(
                    location(format!("input {index}")),
                    format!("bind group `{id}` not found yet"),
                ));
            }
        }

        errors
    }
}

/// A node of the render graph.
///
/// Passes executed once per frame only implement the required methods.
/// Passes executed several times per frame also implement
/// [`MultipleExecution`] and override [`execute`](Self::execute) with
/// [`execute_multiple`].
pub trait RenderPass: 'static {
    fn base(&self) -> &RenderPassBase;

    fn base_mut(&mut self) -> &mut RenderPassBase;

    /// Issues the pass's own commands: per-draw bind groups, vertex and
    /// index buffers, draws. The pipeline and the input bind groups are
    /// already set.
    fn unique_render_callback(
        &mut self,
        render_pass: &mut RenderPassEncoder<'_>,
        core: &mut Core,
    ) -> Result<(), GraphicsError>;

    fn execute(&mut self, core: &mut Core) -> Result<(), GraphicsError> {
        execute_single(self, core)
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn validate(&self, core: &Core) -> Vec<ValidationError> {
        self.base().validate(core)
    }
}

/// Hooks of a pass that runs [`number_of_passes`](Self::number_of_passes)
/// times per frame, e.g. once per shadow casting light.
pub trait MultipleExecution: RenderPass {
    fn number_of_passes(&mut self, core: &mut Core) -> u16;

    fn pre_multiple_pass(&mut self, _core: &mut Core) -> Result<(), GraphicsError> {
        Ok(())
    }

    /// Runs before pass `index` is encoded; typically retargets the outputs.
    fn per_pass(&mut self, _index: u16, _core: &mut Core) -> Result<(), GraphicsError> {
        Ok(())
    }

    fn post_pass(&mut self, _index: u16, _core: &mut Core) -> Result<(), GraphicsError> {
        Ok(())
    }

    fn post_multiple_pass(&mut self, _core: &mut Core) -> Result<(), GraphicsError> {
        Ok(())
    }
}

/// Encodes and submits `pass` once.
pub fn execute_single<P: RenderPass + ?Sized>(
    pass: &mut P,
    core: &mut Core,
) -> Result<(), GraphicsError> {
    let context = core.resource::<GraphicContext>()?.clone();
    encode(pass, core, &context)
        .inspect_err(|e| log::error!("Render pass `{}` failed: {e}", pass.name()))
}

/// Runs the [`MultipleExecution`] hooks around one encoding per index.
pub fn execute_multiple<P: MultipleExecution + ?Sized>(
    pass: &mut P,
    core: &mut Core,
) -> Result<(), GraphicsError> {
    let context = core.resource::<GraphicContext>()?.clone();
    pass.pre_multiple_pass(core)?;
    let count = pass.number_of_passes(core);
    log::trace!("Render pass `{}`: {count} executions", pass.name());
    for index in 0..count {
        pass.per_pass(index, core)?;
        encode(pass, core, &context).inspect_err(|e| {
            log::error!("Render pass `{}` failed at execution {index}: {e}", pass.name())
        })?;
        pass.post_pass(index, core)?;
    }
    pass.post_multiple_pass(core)
}

fn encode<P: RenderPass + ?Sized>(
    pass: &mut P,
    core: &mut Core,
    context: &GraphicContext,
) -> Result<(), GraphicsError> {
    let base = pass.base();
    let name = base.name().to_owned();
    if !base.has_outputs() {
        return Err(GraphicsError::MissingOutputs(name));
    }
    let shader_id = base
        .shader
        .clone()
        .ok_or_else(|| GraphicsError::MissingShader(name.clone()))?;
    let pipeline = pipeline(core, &shader_id)?;
    let inputs = input_bind_groups(core, base)?;
    let descriptor = pass_descriptor(pass.base_mut(), core)?;

    let mut encoder = context.create_command_encoder(&name)?;
    {
        let mut render_pass = encoder.begin_render_pass(&descriptor)?;
        render_pass.set_pipeline(&pipeline)?;
        for (index, bind_group) in &inputs {
            render_pass.set_bind_group(*index, bind_group)?;
        }
        pass.unique_render_callback(&mut render_pass, core)?;
        render_pass.end();
    }
    let command_buffer = encoder.finish()?;
    context.submit([command_buffer])
}

fn pipeline(core: &Core, shader_id: &HashedStr) -> Result<PipelineHandle, GraphicsError> {
    let shaders = core.resource::<ShaderContainer>()?;
    let shader = shaders
        .get(shader_id)
        .map_err(|e| GraphicsError::not_found("shader", e))?;
    Ok(shader.pipeline().clone())
}

fn input_bind_groups(
    core: &Core,
    base: &RenderPassBase,
) -> Result<Vec<(u32, BindGroupHandle)>, GraphicsError> {
    if base.inputs.is_empty() {
        return Ok(Vec::new());
    }
    let bind_groups = core.resource::<BindGroupContainer>()?;
    base.inputs
        .iter()
        .map(|(index, id)| -> Result<_, GraphicsError> {
            let group = bind_groups
                .get(id)
                .map_err(|e| GraphicsError::not_found("bind group", e))?;
            Ok((*index, group.handle().clone()))
        })
        .collect()
}

fn pass_descriptor(
    base: &mut RenderPassBase,
    core: &mut Core,
) -> Result<RenderPassDescriptor, GraphicsError> {
    let (color_views, depth_view) = {
        let textures = core.resource::<TextureContainer>()?;
        let view = |id: &HashedStr| {
            textures
                .get(id)
                .map(|texture| texture.view().clone())
                .map_err(|e| GraphicsError::not_found("texture", e))
        };
        let color_views = base
            .outputs
            .values()
            .map(|output| -> Result<_, GraphicsError> {
                let resolve = output.resolve_target_id.as_ref().map(&view).transpose()?;
                Ok((view(&output.texture_id)?, resolve))
            })
            .collect::<Result<Vec<_>, GraphicsError>>()?;
        let depth_view = match base.depth_output.as_ref().map(|depth| &depth.target) {
            Some(DepthTarget::Texture(id)) => Some(view(id)?),
            Some(DepthTarget::View(view)) => Some(view.clone()),
            None => None,
        };
        (color_views, depth_view)
    };

    let mut color_attachments = Vec::with_capacity(color_views.len());
    for (output, (view, resolve_target)) in base.outputs.values_mut().zip(color_views) {
        let mut clear = Color::BLACK;
        let load = if output
            .clear_color
            .as_mut()
            .is_some_and(|callback| callback(core, &mut clear))
        {
            LoadOp::Clear(clear)
        } else {
            LoadOp::Load
        };
        color_attachments.push(ColorAttachment {
            view,
            resolve_target,
            load,
            store: output.store_op,
        });
    }

    let depth_attachment = match (base.depth_output.as_mut(), depth_view) {
        (Some(output), Some(view)) => {
            let mut clear = 1.0;
            let load = if output
                .clear_depth
                .as_mut()
                .is_some_and(|callback| callback(core, &mut clear))
            {
                LoadOp::Clear(clear)
            } else {
                LoadOp::Load
            };
            Some(DepthAttachment {
                view,
                load,
                store: output.store_op,
            })
        }
        _ => None,
    };

    Ok(RenderPassDescriptor {
        label: base.name.clone(),
        color_attachments,
        depth_attachment,
    })
}

//! Shaders: descriptor validation, compiled pipelines and their container.

use std::collections::HashSet;
use std::fmt;

use squared_core::ResourceManager;

use crate::backend::{BindGroupLayoutHandle, PipelineHandle};
use crate::context::GraphicContext;
use crate::error::GraphicsError;
use crate::types::{
    BindGroupLayoutDescriptor, PrimitiveTopology, TextureFormat, VertexBufferLayout,
};

/// Every compiled shader by name.
pub type ShaderContainer = ResourceManager<Shader>;

/// How serious a [`ValidationError`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Works, but probably not as intended.
    Warning,
    /// Cannot be used as is.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One problem found while validating a shader descriptor or a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    /// Which object (and part of it) the problem is about.
    pub location: String,
    pub severity: Severity,
}

impl ValidationError {
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Logs the problem at the level matching its severity.
    pub fn log(&self) {
        match self.severity {
            Severity::Warning => log::warn!("{self}"),
            Severity::Error => log::error!("{self}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.location, self.message)
    }
}

/// Everything needed to compile a WGSL shader into a render pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    pub label: String,
    /// WGSL source holding both entry points.
    pub source: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Layouts in bind group index order.
    pub bind_group_layouts: Vec<BindGroupLayoutDescriptor>,
    pub vertex_buffers: Vec<VertexBufferLayout>,
    pub color_targets: Vec<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
    pub topology: PrimitiveTopology,
}

impl ShaderDescriptor {
    /// A descriptor with `vs_main` / `fs_main` entry points and nothing else.
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            vertex_entry: "vs_main".into(),
            fragment_entry: "fs_main".into(),
            bind_group_layouts: Vec::new(),
            vertex_buffers: Vec::new(),
            color_targets: Vec::new(),
            depth_format: None,
            topology: PrimitiveTopology::TriangleList,
        }
    }

    pub fn with_entry_points(
        mut self,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        self.vertex_entry = vertex.into();
        self.fragment_entry = fragment.into();
        self
    }

    /// Appends the layout of the next bind group index.
    pub fn with_bind_group_layout(mut self, layout: BindGroupLayoutDescriptor) -> Self {
        self.bind_group_layouts.push(layout);
        self
    }

    pub fn with_vertex_buffer(mut self, layout: VertexBufferLayout) -> Self {
        self.vertex_buffers.push(layout);
        self
    }

    pub fn with_color_target(mut self, format: TextureFormat) -> Self {
        self.color_targets.push(format);
        self
    }

    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Checks the descriptor without touching the GPU.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let location = |part: &str| format!("shader `{}` {part}", self.label);

        if self.source.trim().is_empty() {
            errors.push(ValidationError::error(location("source"), "source is empty"));
        } else {
            for (stage, entry) in [("vertex", &self.vertex_entry), ("fragment", &self.fragment_entry)]
            {
                if entry.is_empty() {
                    errors.push(ValidationError::error(
                        location("entry points"),
                        format!("missing {stage} entry point"),
                    ));
                } else if !self.source.contains(entry.as_str()) {
                    errors.push(ValidationError::error(
                        location("entry points"),
                        format!("{stage} entry point `{entry}` not found in source"),
                    ));
                }
            }
        }

        if self.color_targets.is_empty() {
            errors.push(ValidationError::error(
                location("color targets"),
                "no color output declared",
            ));
        }
        if let Some(format) = self.depth_format
            && !format.is_depth()
        {
            errors.push(ValidationError::error(
                location("depth format"),
                format!("{format:?} is not a depth format"),
            ));
        }
        for (i, format) in self.color_targets.iter().enumerate() {
            if format.is_depth() {
                errors.push(ValidationError::error(
                    location(&format!("color target {i}")),
                    format!("{format:?} is a depth format"),
                ));
            }
        }

        for (group, layout) in self.bind_group_layouts.iter().enumerate() {
            let mut seen = HashSet::new();
            for entry in &layout.entries {
                if !seen.insert(entry.binding) {
                    errors.push(ValidationError::error(
                        location(&format!("bind group {group}")),
                        format!("binding {} declared more than once", entry.binding),
                    ));
                }
            }
            if layout.entries.is_empty() {
                errors.push(ValidationError::warning(
                    location(&format!("bind group {group}")),
                    "layout has no entries",
                ));
            }
        }

        let mut locations = HashSet::new();
        for buffer in &self.vertex_buffers {
            for attribute in &buffer.attributes {
                if !locations.insert(attribute.shader_location) {
                    errors.push(ValidationError::error(
                        location("vertex buffers"),
                        format!(
                            "shader location {} used more than once",
                            attribute.shader_location
                        ),
                    ));
                }
            }
        }

        errors
    }
}

/// A compiled shader: its pipeline and one layout per bind group index.
#[derive(Debug)]
pub struct Shader {
    descriptor: ShaderDescriptor,
    pipeline: PipelineHandle,
    layouts: Vec<BindGroupLayoutHandle>,
}

impl Shader {
    /// Validates and compiles `descriptor`.
    ///
    /// Warnings are logged; any error-level problem aborts compilation.
    pub fn create(
        context: &GraphicContext,
        descriptor: ShaderDescriptor,
    ) -> Result<Self, GraphicsError> {
        let problems = descriptor.validate();
        for problem in &problems {
            problem.log();
        }
        if let Some(first) = problems.iter().find(|problem| problem.is_error()) {
            return Err(GraphicsError::InvalidParameter(first.to_string()));
        }

        let layouts = descriptor
            .bind_group_layouts
            .iter()
            .map(|layout| context.create_bind_group_layout(layout))
            .collect::<Result<Vec<_>, _>>()?;
        let pipeline = context.create_render_pipeline(&descriptor, &layouts)?;
        log::debug!("Shader `{}` compiled", descriptor.label);

        Ok(Self {
            descriptor,
            pipeline,
            layouts,
        })
    }

    pub fn descriptor(&self) -> &ShaderDescriptor {
        &self.descriptor
    }

    pub fn pipeline(&self) -> &PipelineHandle {
        &self.pipeline
    }

    /// The layout handle and description of bind group `index`.
    pub fn bind_group_layout(
        &self,
        index: u32,
    ) -> Option<(&BindGroupLayoutHandle, &BindGroupLayoutDescriptor)> {
        let index = index as usize;
        Some((
            self.layouts.get(index)?,
            self.descriptor.bind_group_layouts.get(index)?,
        ))
    }
}

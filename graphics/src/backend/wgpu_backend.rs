//! wgpu GPU backend implementation.
//!
//! Headless: the device is created without a surface and every frame
//! renders into textures owned by the texture container.

use std::ops::Range;
use std::sync::Arc;

use crate::context::{GraphicSettings, PowerPreference};
use crate::error::GraphicsError;
use crate::shader::ShaderDescriptor;
use crate::types::{
    AddressMode, BindGroupLayoutDescriptor, BindingType, BufferDescriptor, BufferUsage,
    CompareFunction, FilterMode, IndexFormat, LoadOp, PrimitiveTopology, SamplerDescriptor,
    ShaderStages, StoreOp, TextureDescriptor, TextureFormat, TextureUsage, VertexFormat,
    VertexStepMode,
};

use super::{
    BindGroupEntry, BindGroupHandle, BindGroupLayoutHandle, BindingResource, BufferHandle,
    CommandBuffer, EncoderBackend, GpuBackend, PassBackend, PipelineHandle, RenderPassDescriptor,
    SamplerHandle, TextureHandle, TextureViewHandle,
};

pub(crate) const BACKEND_NAME: &str = "wgpu Backend";

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}

impl WgpuBackend {
    /// Create a new wgpu backend from the graphic settings.
    pub fn new(settings: &GraphicSettings) -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: convert_power_preference(settings.power_preference),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("No compatible GPU adapter: {e}"))
        })?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let required_features = required_features(&settings.required_features);
        if !adapter.features().contains(required_features) {
            return Err(GraphicsError::InitializationFailed(format!(
                "adapter does not support the required features {:?}",
                required_features
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Squared Device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("Device creation failed: {e}"))
        })?;

        Ok(Self {
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: convert_buffer_usage(descriptor.usage),
            mapped_at_creation: false,
        });
        Ok(BufferHandle::Wgpu(Arc::new(buffer)))
    }

    fn write_buffer(
        &self,
        buffer: &BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let buffer = buffer.wgpu()?;
        if offset + data.len() as u64 > buffer.size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {offset} overflows a buffer of {} bytes",
                data.len(),
                buffer.size()
            )));
        }
        self.queue.write_buffer(buffer, offset, data);
        Ok(())
    }

    fn write_texture(
        &self,
        texture: &TextureHandle,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let texture = texture.wgpu()?;
        let size = descriptor.size;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &**texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size.width * descriptor.format.block_size()),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: size.depth,
            },
        );
        Ok(())
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<(TextureHandle, TextureViewHandle), GraphicsError> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: descriptor.size.depth,
            },
            mip_level_count: 1,
            sample_count: descriptor.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: convert_texture_format(descriptor.format),
            usage: convert_texture_usage(descriptor.usage),
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok((
            TextureHandle::Wgpu(Arc::new(texture)),
            TextureViewHandle::Wgpu(Arc::new(view)),
        ))
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<SamplerHandle, GraphicsError> {
        let address_mode = convert_address_mode(descriptor.address_mode);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: convert_filter_mode(descriptor.mag_filter),
            min_filter: convert_filter_mode(descriptor.min_filter),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: descriptor.compare.map(convert_compare_function),
            anisotropy_clamp: 1,
            border_color: None,
        });
        Ok(SamplerHandle::Wgpu(Arc::new(sampler)))
    }

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutHandle, GraphicsError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: convert_shader_stages(entry.visibility),
                ty: convert_binding_type(entry.ty),
                count: None,
            })
            .collect();
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: descriptor.label.as_deref(),
                entries: &entries,
            });
        Ok(BindGroupLayoutHandle::Wgpu(Arc::new(layout)))
    }

    fn create_render_pipeline(
        &self,
        descriptor: &ShaderDescriptor,
        layouts: &[BindGroupLayoutHandle],
    ) -> Result<PipelineHandle, GraphicsError> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(descriptor.label.as_str()),
                source: wgpu::ShaderSource::Wgsl(descriptor.source.as_str().into()),
            });

        let layout_refs = layouts
            .iter()
            .map(|layout| layout.wgpu().map(|layout| layout.as_ref()))
            .collect::<Result<Vec<&wgpu::BindGroupLayout>, _>>()?;
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(descriptor.label.as_str()),
                bind_group_layouts: &layout_refs,
                immediate_size: 0,
            });

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex_buffers
            .iter()
            .map(|buffer| {
                buffer
                    .attributes
                    .iter()
                    .map(|attribute| wgpu::VertexAttribute {
                        format: convert_vertex_format(attribute.format),
                        offset: attribute.offset,
                        shader_location: attribute.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = descriptor
            .vertex_buffers
            .iter()
            .zip(&attributes)
            .map(|(buffer, attributes)| wgpu::VertexBufferLayout {
                array_stride: buffer.array_stride,
                step_mode: match buffer.step_mode {
                    VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
                    VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
                },
                attributes,
            })
            .collect();

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_targets
            .iter()
            .map(|format| {
                Some(wgpu::ColorTargetState {
                    format: convert_texture_format(*format),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(descriptor.label.as_str()),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(descriptor.vertex_entry.as_str()),
                    buffers: &vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(descriptor.fragment_entry.as_str()),
                    targets: &color_targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: convert_topology(descriptor.topology),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: descriptor.depth_format.map(|format| wgpu::DepthStencilState {
                    format: convert_texture_format(format),
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        Ok(PipelineHandle::Wgpu(Arc::new(pipeline)))
    }

    fn create_bind_group(
        &self,
        label: &str,
        layout: &BindGroupLayoutHandle,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupHandle, GraphicsError> {
        let mut wgpu_entries = Vec::with_capacity(entries.len());
        for entry in entries {
            let resource = match &entry.resource {
                BindingResource::Buffer {
                    buffer,
                    offset,
                    size,
                } => wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: buffer.wgpu()?,
                    offset: *offset,
                    size: size.and_then(wgpu::BufferSize::new),
                }),
                BindingResource::TextureView(view) => {
                    wgpu::BindingResource::TextureView(view.wgpu()?)
                }
                BindingResource::Sampler(sampler) => {
                    wgpu::BindingResource::Sampler(sampler.wgpu()?)
                }
            };
            wgpu_entries.push(wgpu::BindGroupEntry {
                binding: entry.binding,
                resource,
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: layout.wgpu()?,
            entries: &wgpu_entries,
        });
        Ok(BindGroupHandle::Wgpu(Arc::new(bind_group)))
    }

    fn create_command_encoder(
        &self,
        label: &str,
    ) -> Result<Box<dyn EncoderBackend>, GraphicsError> {
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        Ok(Box::new(WgpuEncoder { encoder }))
    }

    fn submit(&self, command_buffers: Vec<CommandBuffer>) -> Result<(), GraphicsError> {
        let mut buffers = Vec::with_capacity(command_buffers.len());
        for buffer in command_buffers {
            match buffer {
                CommandBuffer::Wgpu(buffer) => buffers.push(buffer),
                CommandBuffer::Dummy { .. } => {
                    return Err(GraphicsError::BackendMismatch {
                        expected: BACKEND_NAME,
                        found: super::dummy::BACKEND_NAME,
                    });
                }
            }
        }
        self.queue.submit(buffers);
        Ok(())
    }
}

struct WgpuEncoder {
    encoder: wgpu::CommandEncoder,
}

impl EncoderBackend for WgpuEncoder {
    fn begin_render_pass<'e>(
        &'e mut self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<Box<dyn PassBackend + 'e>, GraphicsError> {
        let mut color_attachments = Vec::with_capacity(descriptor.color_attachments.len());
        for attachment in &descriptor.color_attachments {
            color_attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: attachment.view.wgpu()?,
                resolve_target: match &attachment.resolve_target {
                    Some(target) => Some(target.wgpu()?.as_ref()),
                    None => None,
                },
                ops: wgpu::Operations {
                    load: match attachment.load {
                        LoadOp::Clear(color) => wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r,
                            g: color.g,
                            b: color.b,
                            a: color.a,
                        }),
                        LoadOp::Load => wgpu::LoadOp::Load,
                    },
                    store: convert_store_op(attachment.store),
                },
                depth_slice: None,
            }));
        }

        let depth_stencil_attachment = match &descriptor.depth_attachment {
            Some(depth) => Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth.view.wgpu()?,
                depth_ops: Some(wgpu::Operations {
                    load: match depth.load {
                        LoadOp::Clear(value) => wgpu::LoadOp::Clear(value),
                        LoadOp::Load => wgpu::LoadOp::Load,
                    },
                    store: convert_store_op(depth.store),
                }),
                stencil_ops: None,
            }),
            None => None,
        };

        let pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(descriptor.label.as_str()),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(Box::new(WgpuPass { pass }))
    }

    fn finish(self: Box<Self>, label: &str) -> Result<CommandBuffer, GraphicsError> {
        log::trace!("wgpu: finishing command buffer {label}");
        Ok(CommandBuffer::Wgpu(self.encoder.finish()))
    }

    fn release(self: Box<Self>) {
        log::trace!("wgpu: dropping unfinished command encoder");
    }
}

struct WgpuPass<'e> {
    pass: wgpu::RenderPass<'e>,
}

impl PassBackend for WgpuPass<'_> {
    fn set_pipeline(&mut self, pipeline: &PipelineHandle) -> Result<(), GraphicsError> {
        self.pass.set_pipeline(pipeline.wgpu()?);
        Ok(())
    }

    fn set_bind_group(
        &mut self,
        index: u32,
        bind_group: &BindGroupHandle,
    ) -> Result<(), GraphicsError> {
        self.pass
            .set_bind_group(index, bind_group.wgpu()?.as_ref(), &[]);
        Ok(())
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferHandle) -> Result<(), GraphicsError> {
        self.pass.set_vertex_buffer(slot, buffer.wgpu()?.slice(..));
        Ok(())
    }

    fn set_index_buffer(
        &mut self,
        buffer: &BufferHandle,
        format: IndexFormat,
    ) -> Result<(), GraphicsError> {
        let format = match format {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        };
        self.pass.set_index_buffer(buffer.wgpu()?.slice(..), format);
        Ok(())
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.pass.draw(vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.pass.draw_indexed(indices, base_vertex, instances);
    }

    fn end(&mut self) {
        // wgpu closes the pass when `self.pass` is dropped.
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn required_features(names: &[String]) -> wgpu::Features {
    let mut features = wgpu::Features::empty();
    for name in names {
        match name.as_str() {
            "DEPTH_CLIP_CONTROL" => features |= wgpu::Features::DEPTH_CLIP_CONTROL,
            "TIMESTAMP_QUERY" => features |= wgpu::Features::TIMESTAMP_QUERY,
            "TEXTURE_COMPRESSION_BC" => features |= wgpu::Features::TEXTURE_COMPRESSION_BC,
            "POLYGON_MODE_LINE" => features |= wgpu::Features::POLYGON_MODE_LINE,
            other => log::warn!("Unknown GPU feature `{other}` ignored"),
        }
    }
    features
}

fn convert_power_preference(preference: PowerPreference) -> wgpu::PowerPreference {
    match preference {
        PowerPreference::None => wgpu::PowerPreference::None,
        PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
    }
}

fn convert_buffer_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    let mut result = wgpu::BufferUsages::empty();

    if usage.contains(BufferUsage::VERTEX) {
        result |= wgpu::BufferUsages::VERTEX;
    }
    if usage.contains(BufferUsage::INDEX) {
        result |= wgpu::BufferUsages::INDEX;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        result |= wgpu::BufferUsages::UNIFORM;
    }
    if usage.contains(BufferUsage::STORAGE) {
        result |= wgpu::BufferUsages::STORAGE;
    }
    if usage.contains(BufferUsage::COPY_SRC) {
        result |= wgpu::BufferUsages::COPY_SRC;
    }
    if usage.contains(BufferUsage::COPY_DST) {
        result |= wgpu::BufferUsages::COPY_DST;
    }

    result
}

fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut result = wgpu::TextureUsages::empty();

    if usage.contains(TextureUsage::COPY_SRC) {
        result |= wgpu::TextureUsages::COPY_SRC;
    }
    if usage.contains(TextureUsage::COPY_DST) {
        result |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        result |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
        result |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }

    result
}

fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        TextureFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
    }
}

fn convert_address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn convert_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn convert_compare_function(compare: CompareFunction) -> wgpu::CompareFunction {
    match compare {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

fn convert_shader_stages(stages: ShaderStages) -> wgpu::ShaderStages {
    let mut result = wgpu::ShaderStages::empty();

    if stages.contains(ShaderStages::VERTEX) {
        result |= wgpu::ShaderStages::VERTEX;
    }
    if stages.contains(ShaderStages::FRAGMENT) {
        result |= wgpu::ShaderStages::FRAGMENT;
    }

    result
}

fn convert_binding_type(ty: BindingType) -> wgpu::BindingType {
    match ty {
        BindingType::UniformBuffer => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        BindingType::StorageBuffer => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        BindingType::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        BindingType::DepthTexture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        BindingType::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        BindingType::ComparisonSampler => {
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison)
        }
    }
}

fn convert_vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        VertexFormat::Uint32 => wgpu::VertexFormat::Uint32,
    }
}

fn convert_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => wgpu::PrimitiveTopology::PointList,
        PrimitiveTopology::LineList => wgpu::PrimitiveTopology::LineList,
        PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

fn convert_store_op(store: StoreOp) -> wgpu::StoreOp {
    match store {
        StoreOp::Store => wgpu::StoreOp::Store,
        StoreOp::Discard => wgpu::StoreOp::Discard,
    }
}

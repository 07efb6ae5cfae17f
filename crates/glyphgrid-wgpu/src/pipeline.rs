#![forbid(unsafe_code)]

//! Render pipeline for the glyph compositor.

use bytemuck::{Pod, Zeroable};
use glyphgrid_core::CompositorConfig;
use glyphgrid_core::compositor::VertexInput;
use tracing::{debug, warn};

use crate::error::CompositorError;
use crate::shader::{FRAGMENT_ENTRY, VERTEX_ENTRY, create_shader_module};
use crate::textures::{
    AttributeMapKind, BINDING_ATLAS, BINDING_SAMPLER, GpuTextures, validate_textures,
};

/// Vertex of the compositor quad: clip-space position and grid UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    #[must_use]
    pub const fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }

    /// Position at location 0, UV at location 1.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<Vertex> for VertexInput {
    fn from(v: Vertex) -> Self {
        Self {
            position: v.position,
            uv: v.uv,
        }
    }
}

/// Two triangles covering clip space; UV `(0, 0)` is the top-left corner.
pub const FULLSCREEN_QUAD: [Vertex; 6] = [
    Vertex::new([-1.0, 1.0, 0.0], [0.0, 0.0]),
    Vertex::new([-1.0, -1.0, 0.0], [0.0, 1.0]),
    Vertex::new([1.0, -1.0, 0.0], [1.0, 1.0]),
    Vertex::new([-1.0, 1.0, 0.0], [0.0, 0.0]),
    Vertex::new([1.0, -1.0, 0.0], [1.0, 1.0]),
    Vertex::new([1.0, 1.0, 0.0], [1.0, 0.0]),
];

/// Render-target side of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub format: wgpu::TextureFormat,
    /// `None` writes the compositor output unblended.
    pub blend: Option<wgpu::BlendState>,
}

impl PipelineOptions {
    #[must_use]
    pub fn new(format: wgpu::TextureFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_blend(mut self, blend: Option<wgpu::BlendState>) -> Self {
        self.blend = blend;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        }
    }
}

/// Bind group layout for the six compositor bindings at group 0.
pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let float_texture = |binding, view_dimension| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    };
    let map = |kind: AttributeMapKind| float_texture(kind.binding(), wgpu::TextureViewDimension::D2);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("glyph_compositor_bgl"),
        entries: &[
            float_texture(BINDING_ATLAS, wgpu::TextureViewDimension::D2Array),
            wgpu::BindGroupLayoutEntry {
                binding: BINDING_SAMPLER,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            map(AttributeMapKind::Index),
            map(AttributeMapKind::Foreground),
            map(AttributeMapKind::Background),
            map(AttributeMapKind::Set),
        ],
    })
}

/// Compiled compositor for one [`CompositorConfig`] and target format.
#[derive(Debug)]
pub struct GlyphCompositorPipeline {
    config: CompositorConfig,
    options: PipelineOptions,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
}

impl GlyphCompositorPipeline {
    pub fn new(
        device: &wgpu::Device,
        config: &CompositorConfig,
        options: &PipelineOptions,
    ) -> Result<Self, CompositorError> {
        if options.format.is_depth_stencil_format() || options.format.is_compressed() {
            warn!(format = ?options.format, "rejected compositor render target");
            return Err(CompositorError::UnsupportedTarget(options.format));
        }

        let shader = create_shader_module(device, config);
        let bind_group_layout = create_bind_group_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glyph_compositor_pl"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("glyph_compositor_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: options.format,
                    blend: options.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        debug!(
            format = ?options.format,
            blended = options.blend.is_some(),
            "glyph compositor pipeline created"
        );

        Ok(Self {
            config: *config,
            options: *options,
            bind_group_layout,
            pipeline,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    #[must_use]
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    #[must_use]
    pub fn render_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Bind `textures` in slot order after checking them against the grid
    /// baked into this pipeline.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        textures: &GpuTextures,
    ) -> Result<wgpu::BindGroup, CompositorError> {
        let maps = AttributeMapKind::ALL.map(|kind| textures.map_texture(kind));
        if let Err(err) = validate_textures(self.config.grid, textures.atlas_texture(), maps) {
            warn!(%err, "compositor textures rejected");
            return Err(err);
        }

        let map_entry = |kind: AttributeMapKind| wgpu::BindGroupEntry {
            binding: kind.binding(),
            resource: wgpu::BindingResource::TextureView(textures.map_view(kind)),
        };
        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph_compositor_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: BINDING_ATLAS,
                    resource: wgpu::BindingResource::TextureView(textures.atlas_view()),
                },
                wgpu::BindGroupEntry {
                    binding: BINDING_SAMPLER,
                    resource: wgpu::BindingResource::Sampler(textures.sampler()),
                },
                map_entry(AttributeMapKind::Index),
                map_entry(AttributeMapKind::Foreground),
                map_entry(AttributeMapKind::Background),
                map_entry(AttributeMapKind::Set),
            ],
        }))
    }

    /// Vertex buffer holding [`FULLSCREEN_QUAD`].
    pub fn create_quad_buffer(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Buffer {
        let bytes: &[u8] = bytemuck::cast_slice(FULLSCREEN_QUAD.as_slice());
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glyph_compositor_quad"),
            size: bytes.len() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&buffer, 0, bytes);
        buffer
    }

    /// Record the draw for `vertex_count` vertices from `vertices`.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        bind_group: &wgpu::BindGroup,
        vertices: &wgpu::Buffer,
        vertex_count: u32,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.draw(0..vertex_count, 0..1);
    }
}

use crate::device::DEPTH_FORMAT;

use super::batch::LineTopology;
use super::vertex::LineVertex;

/// Handle to a pipeline registered with [`LineRenderer::make_pipeline`].
///
/// [`PipelineId::DEFAULT`] is always valid and is what [`LineBatch::defaults`]
/// selects.
///
/// [`LineRenderer::make_pipeline`]: super::LineRenderer::make_pipeline
/// [`LineBatch::defaults`]: super::LineBatch::defaults
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct PipelineId(pub(crate) u32);

impl PipelineId {
    pub const DEFAULT: PipelineId = PipelineId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fixed-function state for a line pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LinePipelineDesc {
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
}

impl Default for LinePipelineDesc {
    /// Draws on top of everything without touching depth.
    fn default() -> Self {
        Self {
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
        }
    }
}

impl LinePipelineDesc {
    /// Depth-tested lines (write enabled, less-equal compare).
    pub fn depth_tested() -> Self {
        Self {
            depth_write: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
        }
    }
}

impl LineTopology {
    fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            LineTopology::Lines => wgpu::PrimitiveTopology::LineList,
            LineTopology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        }
    }
}

pub(super) struct PipelineTarget {
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
}

pub(super) fn build_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    desc: &LinePipelineDesc,
    topology: LineTopology,
    target: &PipelineTarget,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("lineart line pipeline"),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[LineVertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: topology.to_wgpu(),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        // The frame always carries a depth attachment, so every pipeline declares one.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: desc.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: target.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },

        multiview_mask: None,
        cache: None,
    })
}

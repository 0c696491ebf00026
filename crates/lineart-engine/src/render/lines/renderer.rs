use std::collections::HashMap;

use crate::render::{RenderCtx, RenderTarget};

use super::batch::{LineBatch, LineError, LineTopology};
use super::pipeline::{build_pipeline, LinePipelineDesc, PipelineId, PipelineTarget};
use super::vertex::LineVertex;

const MIN_VERTEX_CAPACITY: usize = 1024;

/// GPU backend for [`LineBatch`].
///
/// Pipelines are described up front with [`make_pipeline`](Self::make_pipeline)
/// and built lazily per (pipeline, topology) the first time a command uses
/// them. Everything is rebuilt if the surface format or sample count changes.
pub struct LineRenderer {
    descs: Vec<LinePipelineDesc>,

    target_key: Option<(wgpu::TextureFormat, u32)>,
    shader: Option<wgpu::ShaderModule>,
    layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<(PipelineId, LineTopology), wgpu::RenderPipeline>,

    vertex_vbo: Option<wgpu::Buffer>,
    vertex_capacity: usize,

    reported: Option<LineError>,
}

impl Default for LineRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineRenderer {
    pub fn new() -> Self {
        Self {
            descs: vec![LinePipelineDesc::default()],
            target_key: None,
            shader: None,
            layout: None,
            pipelines: HashMap::new(),
            vertex_vbo: None,
            vertex_capacity: 0,
            reported: None,
        }
    }

    /// Registers a pipeline description and returns its handle.
    ///
    /// Identical descriptions share a handle.
    pub fn make_pipeline(&mut self, desc: LinePipelineDesc) -> PipelineId {
        if let Some(i) = self.descs.iter().position(|d| *d == desc) {
            return PipelineId(i as u32);
        }
        self.descs.push(desc);
        PipelineId((self.descs.len() - 1) as u32)
    }

    pub fn pipeline_desc(&self, id: PipelineId) -> Option<&LinePipelineDesc> {
        self.descs.get(id.index())
    }

    /// Draws everything recorded in `batch` into `target`, then clears the batch.
    ///
    /// Commands referring to unknown pipelines are skipped.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        batch: &mut LineBatch,
    ) {
        self.report(batch.error());

        if batch.is_empty() {
            batch.clear();
            return;
        }

        self.ensure_target(ctx);
        for cmd in batch.commands() {
            self.ensure_pipeline(ctx, cmd.pipeline, cmd.topology);
        }
        self.ensure_vertex_capacity(ctx, batch.vertices().len());

        let Some(vbo) = self.vertex_vbo.as_ref() else {
            batch.clear();
            return;
        };
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(batch.vertices()));

        let color = target.load_color_attachment();
        let depth = target.load_depth_attachment();
        {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lineart lines pass"),
                color_attachments: &[Some(color)],
                depth_stencil_attachment: Some(depth),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_vertex_buffer(0, vbo.slice(..));

            let mut bound = None;
            for cmd in batch.commands() {
                let key = (cmd.pipeline, cmd.topology);
                if bound != Some(key) {
                    let Some(pipeline) = self.pipelines.get(&key) else { continue };
                    rpass.set_pipeline(pipeline);
                    bound = Some(key);
                }
                rpass.draw(cmd.first_vertex..cmd.first_vertex + cmd.vertex_count, 0..1);
            }
        }

        batch.clear();
    }

    /// Logs a recording error once, when it first shows up.
    fn report(&mut self, err: Option<LineError>) {
        if let Some(e) = err {
            if self.reported != Some(e) {
                log::warn!("line batch error: {e}");
            }
        }
        self.reported = err;
    }

    fn ensure_target(&mut self, ctx: &RenderCtx<'_>) {
        let key = (ctx.surface_format, ctx.sample_count);
        if self.target_key == Some(key) && self.shader.is_some() {
            return;
        }

        let shader_src = include_str!("shaders/lines.wgsl");
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lineart line shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("lineart line pipeline layout"),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

        log::debug!("line renderer targeting {:?} @ {}x", key.0, key.1);

        self.target_key = Some(key);
        self.shader = Some(shader);
        self.layout = Some(layout);
        self.pipelines.clear();
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, id: PipelineId, topology: LineTopology) {
        if self.pipelines.contains_key(&(id, topology)) {
            return;
        }
        let Some(desc) = self.descs.get(id.index()) else {
            log::debug!("unknown line pipeline {id:?}; commands skipped");
            return;
        };
        let (Some(shader), Some(layout)) = (self.shader.as_ref(), self.layout.as_ref()) else {
            return;
        };

        let target = PipelineTarget {
            format: ctx.surface_format,
            sample_count: ctx.sample_count,
        };
        let pipeline = build_pipeline(ctx.device, shader, layout, desc, topology, &target);
        log::debug!("built line pipeline {id:?} {topology:?}");
        self.pipelines.insert((id, topology), pipeline);
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vertex_capacity && self.vertex_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(MIN_VERTEX_CAPACITY);
        let new_size = (new_cap * std::mem::size_of::<LineVertex>()) as u64;

        self.vertex_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lineart line vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vertex_capacity = new_cap;
        log::debug!("line vertex buffer grown to {new_cap} vertices");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipeline_is_preregistered() {
        let r = LineRenderer::new();
        assert_eq!(r.pipeline_desc(PipelineId::DEFAULT), Some(&LinePipelineDesc::default()));
    }

    #[test]
    fn make_pipeline_dedups_descriptions() {
        let mut r = LineRenderer::new();
        let a = r.make_pipeline(LinePipelineDesc::depth_tested());
        let b = r.make_pipeline(LinePipelineDesc::depth_tested());
        assert_eq!(a, b);
        assert_ne!(a, PipelineId::DEFAULT);
        assert_eq!(r.make_pipeline(LinePipelineDesc::default()), PipelineId::DEFAULT);
    }

    #[test]
    fn unknown_pipeline_has_no_desc() {
        let r = LineRenderer::new();
        assert!(r.pipeline_desc(PipelineId(7)).is_none());
    }
}

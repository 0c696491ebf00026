/// Renderer-facing context (device/queue + attachment formats).
///
/// Renderers build pipelines against `surface_format`, `DEPTH_FORMAT` and
/// `sample_count`; all three are stable for the lifetime of a window unless
/// the surface is recreated.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            sample_count,
        }
    }
}

/// Target for drawing (encoder + attachments).
///
/// With MSAA, `color_view` is the multisampled texture and `resolve_target`
/// is the surface view; passes must load, store and resolve so that the last
/// pass of the frame leaves the final image in the surface.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub resolve_target: Option<&'a wgpu::TextureView>,
    pub depth_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        resolve_target: Option<&'a wgpu::TextureView>,
        depth_view: &'a wgpu::TextureView,
    ) -> Self {
        Self { encoder, color_view, resolve_target, depth_view }
    }

    /// Color attachment that keeps previous contents of this frame.
    pub fn load_color_attachment(&self) -> wgpu::RenderPassColorAttachment<'a> {
        wgpu::RenderPassColorAttachment {
            view: self.color_view,
            resolve_target: self.resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }

    /// Depth attachment that keeps previous contents of this frame.
    pub fn load_depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'a> {
        wgpu::RenderPassDepthStencilAttachment {
            view: self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use lineart_engine::core::{App, AppControl, FrameCtx};
use lineart_engine::render::lines::{LineBatch, LinePipelineDesc, LineRenderer, PipelineId};

use crate::config::DemoConfig;
use crate::error::ConfigError;
use crate::patterns::{floaty_thingy, grid, hairball};
use crate::rng::XorShift32;
use crate::trail::TrailBuffer;

const FOV_Y_DEG: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

/// Frame driver: records the whole scene into a [`LineBatch`] each frame and
/// hands it to the [`LineRenderer`].
pub struct LinesDemo {
    renderer: LineRenderer,
    batch: LineBatch,
    depth_test: PipelineId,

    trail: TrailBuffer,
    rng: XorShift32,
}

impl LinesDemo {
    pub fn new(config: &DemoConfig) -> Result<Self, ConfigError> {
        let mut renderer = LineRenderer::new();
        let depth_test = renderer.make_pipeline(LinePipelineDesc::depth_tested());

        Ok(Self {
            renderer,
            batch: LineBatch::default(),
            depth_test,
            trail: TrailBuffer::new(config.trail_capacity)?,
            rng: XorShift32::with_seed(config.seed)?,
        })
    }

    pub fn batch(&self) -> &LineBatch {
        &self.batch
    }

    /// Replaces the batch contents with one frame of the scene for `frame_count`.
    ///
    /// Advances the hairball trail, so call exactly once per presented frame.
    /// Geometry left over from a frame that never reached the renderer is dropped.
    pub fn record_frame(&mut self, frame_count: u32, aspect: f32) {
        let f = frame_count as f32;
        let gl = &mut self.batch;

        gl.clear();
        gl.defaults();
        gl.push_pipeline();
        gl.load_pipeline(self.depth_test);

        gl.matrix_mode_projection();
        gl.perspective(FOV_Y_DEG.to_radians(), aspect, Z_NEAR, Z_FAR);
        gl.matrix_mode_modelview();
        gl.translate((f * 0.02).sin() * 16.0, (f * 0.01).sin() * 4.0, 0.0);

        gl.c3f(1.0, 0.0, 1.0);
        grid(gl, -7.0, frame_count);
        grid(gl, 7.0, frame_count);

        gl.push_matrix();
        gl.translate(0.0, 0.0, -30.0);
        gl.rotate(f * 0.05, 0.0, 1.0, 1.0);
        gl.c3f(1.0, 1.0, 0.0);
        floaty_thingy(gl, frame_count);
        gl.pop_matrix();

        gl.push_matrix();
        gl.translate(-(f * 0.02).sin() * 32.0, 0.0, -70.0 + (f * 0.01).cos() * 50.0);
        gl.rotate(f * 0.05, 0.0, -1.0, 1.0);
        gl.c3f(0.0, 1.0, 0.0);
        floaty_thingy(gl, frame_count.wrapping_add(32));
        gl.pop_matrix();

        gl.push_matrix();
        gl.translate(-(f * 0.02).sin() * 16.0, 0.0, -30.0);
        gl.rotate(f * 0.01, (f * 0.005).sin(), 0.0, 1.0);
        gl.c3f(0.5, 1.0, 0.0);
        hairball(gl, &mut self.trail, &mut self.rng);
        gl.pop_matrix();

        gl.pop_pipeline();
    }
}

impl App for LinesDemo {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && event.logical_key == Key::Named(NamedKey::Escape)
            {
                log::info!("escape pressed, exiting");
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.record_frame(ctx.time.frame_count(), ctx.aspect());

        let renderer = &mut self.renderer;
        let batch = &mut self.batch;
        ctx.render(wgpu::Color::BLACK, |rctx, target| {
            renderer.render(rctx, target, batch);
        })
    }

    fn on_shutdown(&mut self) {
        log::info!("lineart demo shutting down");
    }
}

use std::fmt;

use glam::{Mat4, Vec3, Vec4};

use super::pipeline::PipelineId;
use super::vertex::LineVertex;

/// Maximum depth of each matrix stack and of the pipeline stack.
const STACK_DEPTH: usize = 32;

/// Per-frame recording budgets.
#[derive(Debug, Clone)]
pub struct LineBatchConfig {
    pub max_vertices: usize,
    pub max_commands: usize,
}

impl Default for LineBatchConfig {
    fn default() -> Self {
        Self {
            max_vertices: 1 << 16,
            max_commands: 1 << 14,
        }
    }
}

/// Primitive type of a recorded command.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LineTopology {
    /// Independent segments, two vertices each.
    Lines,
    /// One connected polyline.
    LineStrip,
}

/// Which matrix stack transform calls apply to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MatrixMode {
    Projection,
    ModelView,
}

/// A contiguous run of vertices drawn with one pipeline and topology.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LineCommand {
    pub pipeline: PipelineId,
    pub topology: LineTopology,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// Recording misuse detected by [`LineBatch`].
///
/// Errors are sticky: the first one is kept until [`LineBatch::clear`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LineError {
    VerticesFull,
    CommandsFull,
    StackOverflow,
    StackUnderflow,
    /// `v*f` or `end` called outside `begin_*` / `end`.
    NoActivePrimitive,
    /// `begin_*` called while a primitive was still open.
    NestedPrimitive,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            LineError::VerticesFull => "vertex budget exhausted",
            LineError::CommandsFull => "command budget exhausted",
            LineError::StackOverflow => "matrix or pipeline stack overflow",
            LineError::StackUnderflow => "matrix or pipeline stack underflow",
            LineError::NoActivePrimitive => "vertex or end outside begin/end",
            LineError::NestedPrimitive => "begin called inside an open primitive",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for LineError {}

/// Fixed-depth stack whose top is always present.
#[derive(Debug, Clone)]
struct Stack<T> {
    top: T,
    saved: Vec<T>,
}

impl<T: Copy> Stack<T> {
    fn new(top: T) -> Self {
        Self { top, saved: Vec::with_capacity(STACK_DEPTH) }
    }

    fn push(&mut self) -> Result<(), LineError> {
        if self.saved.len() + 1 >= STACK_DEPTH {
            return Err(LineError::StackOverflow);
        }
        self.saved.push(self.top);
        Ok(())
    }

    fn pop(&mut self) -> Result<(), LineError> {
        let top = self.saved.pop().ok_or(LineError::StackUnderflow)?;
        self.top = top;
        Ok(())
    }

    fn reset(&mut self, top: T) {
        self.saved.clear();
        self.top = top;
    }
}

#[derive(Debug, Copy, Clone)]
struct OpenPrimitive {
    topology: LineTopology,
    pipeline: PipelineId,
    first_vertex: usize,
}

/// Immediate-mode line recorder.
///
/// Vertices are transformed by `projection * modelview` as they are recorded,
/// so later matrix changes never affect already-recorded geometry. Nothing here
/// touches the GPU; see [`LineRenderer`](super::LineRenderer).
///
/// Misuse never panics. The call is dropped and a [`LineError`] is recorded.
#[derive(Debug)]
pub struct LineBatch {
    config: LineBatchConfig,

    vertices: Vec<LineVertex>,
    commands: Vec<LineCommand>,

    color: [f32; 4],
    mode: MatrixMode,
    projection: Stack<Mat4>,
    modelview: Stack<Mat4>,
    mvp: Option<Mat4>, // cached; `None` when a matrix changed
    pipelines: Stack<PipelineId>,

    open: Option<OpenPrimitive>,
    error: Option<LineError>,
}

impl Default for LineBatch {
    fn default() -> Self {
        Self::new(LineBatchConfig::default())
    }
}

impl LineBatch {
    pub fn new(config: LineBatchConfig) -> Self {
        Self {
            vertices: Vec::with_capacity(config.max_vertices.min(4096)),
            commands: Vec::new(),
            config,
            color: [1.0; 4],
            mode: MatrixMode::ModelView,
            projection: Stack::new(Mat4::IDENTITY),
            modelview: Stack::new(Mat4::IDENTITY),
            mvp: None,
            pipelines: Stack::new(PipelineId::DEFAULT),
            open: None,
            error: None,
        }
    }

    // ── frame state ───────────────────────────────────────────────────────

    /// Drops recorded geometry and the sticky error. Keeps allocated capacity.
    ///
    /// Matrix, color and pipeline state are left alone; call [`defaults`](Self::defaults)
    /// at the start of each frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.commands.clear();
        self.open = None;
        self.error = None;
    }

    /// Resets matrices to identity, color to white, the matrix mode to
    /// model-view and the pipeline to [`PipelineId::DEFAULT`].
    pub fn defaults(&mut self) {
        self.color = [1.0; 4];
        self.mode = MatrixMode::ModelView;
        self.projection.reset(Mat4::IDENTITY);
        self.modelview.reset(Mat4::IDENTITY);
        self.mvp = None;
        self.pipelines.reset(PipelineId::DEFAULT);
    }

    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    pub fn commands(&self) -> &[LineCommand] {
        &self.commands
    }

    /// First misuse recorded since the last [`clear`](Self::clear).
    pub fn error(&self) -> Option<LineError> {
        self.error
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    // ── pipelines ─────────────────────────────────────────────────────────

    pub fn load_pipeline(&mut self, id: PipelineId) {
        self.pipelines.top = id;
    }

    pub fn load_default_pipeline(&mut self) {
        self.pipelines.top = PipelineId::DEFAULT;
    }

    pub fn push_pipeline(&mut self) {
        if let Err(e) = self.pipelines.push() {
            self.fail(e);
        }
    }

    pub fn pop_pipeline(&mut self) {
        if let Err(e) = self.pipelines.pop() {
            self.fail(e);
        }
    }

    pub fn current_pipeline(&self) -> PipelineId {
        self.pipelines.top
    }

    // ── matrices ──────────────────────────────────────────────────────────

    pub fn matrix_mode_projection(&mut self) {
        self.mode = MatrixMode::Projection;
    }

    pub fn matrix_mode_modelview(&mut self) {
        self.mode = MatrixMode::ModelView;
    }

    pub fn matrix_mode(&self) -> MatrixMode {
        self.mode
    }

    /// Top of the current mode's stack.
    pub fn current_matrix(&self) -> Mat4 {
        match self.mode {
            MatrixMode::Projection => self.projection.top,
            MatrixMode::ModelView => self.modelview.top,
        }
    }

    pub fn load_identity(&mut self) {
        self.load_matrix(Mat4::IDENTITY);
    }

    pub fn load_matrix(&mut self, m: Mat4) {
        *self.current_mut() = m;
    }

    /// Post-multiplies the current matrix: `current = current * m`.
    pub fn mult_matrix(&mut self, m: Mat4) {
        let cur = self.current_mut();
        *cur = *cur * m;
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.mult_matrix(Mat4::from_translation(Vec3::new(x, y, z)));
    }

    /// Rotates by `angle` radians around `(x, y, z)`.
    ///
    /// The axis is normalized; a zero-length axis leaves the matrix unchanged.
    pub fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        if let Some(axis) = Vec3::new(x, y, z).try_normalize() {
            self.mult_matrix(Mat4::from_axis_angle(axis, angle));
        }
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.mult_matrix(Mat4::from_scale(Vec3::new(x, y, z)));
    }

    /// Multiplies in a right-handed perspective projection with a 0..1 depth range.
    pub fn perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.mult_matrix(Mat4::perspective_rh(fov_y, aspect, near, far));
    }

    pub fn push_matrix(&mut self) {
        let res = match self.mode {
            MatrixMode::Projection => self.projection.push(),
            MatrixMode::ModelView => self.modelview.push(),
        };
        if let Err(e) = res {
            self.fail(e);
        }
    }

    pub fn pop_matrix(&mut self) {
        let res = match self.mode {
            MatrixMode::Projection => self.projection.pop(),
            MatrixMode::ModelView => self.modelview.pop(),
        };
        match res {
            Ok(()) => self.mvp = None,
            Err(e) => self.fail(e),
        }
    }

    // ── color ─────────────────────────────────────────────────────────────

    pub fn c3f(&mut self, r: f32, g: f32, b: f32) {
        self.color = [r, g, b, 1.0];
    }

    pub fn c4f(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.color = [r, g, b, a];
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn begin_lines(&mut self) {
        self.begin(LineTopology::Lines);
    }

    pub fn begin_line_strip(&mut self) {
        self.begin(LineTopology::LineStrip);
    }

    pub fn v2f(&mut self, x: f32, y: f32) {
        self.vertex(x, y, 0.0);
    }

    pub fn v3f(&mut self, x: f32, y: f32, z: f32) {
        self.vertex(x, y, z);
    }

    /// Closes the open primitive and records it as a command.
    ///
    /// A trailing unpaired vertex of a line list is dropped; a strip with fewer
    /// than two vertices records nothing. Consecutive line lists sharing a
    /// pipeline are merged into one command.
    pub fn end(&mut self) {
        let Some(prim) = self.open.take() else {
            self.fail(LineError::NoActivePrimitive);
            return;
        };

        let mut count = self.vertices.len() - prim.first_vertex;
        match prim.topology {
            LineTopology::Lines if count % 2 == 1 => {
                self.vertices.pop();
                count -= 1;
            }
            LineTopology::LineStrip if count < 2 => {
                self.vertices.truncate(prim.first_vertex);
                count = 0;
            }
            _ => {}
        }

        if count == 0 {
            return;
        }

        let first = prim.first_vertex as u32;
        if prim.topology == LineTopology::Lines {
            if let Some(last) = self.commands.last_mut() {
                if last.topology == LineTopology::Lines
                    && last.pipeline == prim.pipeline
                    && last.first_vertex + last.vertex_count == first
                {
                    last.vertex_count += count as u32;
                    return;
                }
            }
        }

        if self.commands.len() >= self.config.max_commands {
            self.vertices.truncate(prim.first_vertex);
            self.fail(LineError::CommandsFull);
            return;
        }

        self.commands.push(LineCommand {
            pipeline: prim.pipeline,
            topology: prim.topology,
            first_vertex: first,
            vertex_count: count as u32,
        });
    }

    fn begin(&mut self, topology: LineTopology) {
        if self.open.is_some() {
            self.fail(LineError::NestedPrimitive);
            self.end();
        }
        self.open = Some(OpenPrimitive {
            topology,
            pipeline: self.pipelines.top,
            first_vertex: self.vertices.len(),
        });
    }

    fn vertex(&mut self, x: f32, y: f32, z: f32) {
        if self.open.is_none() {
            self.fail(LineError::NoActivePrimitive);
            return;
        }
        if self.vertices.len() >= self.config.max_vertices {
            self.fail(LineError::VerticesFull);
            return;
        }

        let clip = self.mvp() * Vec4::new(x, y, z, 1.0);
        self.vertices.push(LineVertex {
            clip: clip.to_array(),
            color: self.color,
        });
    }

    fn mvp(&mut self) -> Mat4 {
        *self
            .mvp
            .get_or_insert_with(|| self.projection.top * self.modelview.top)
    }

    fn current_mut(&mut self) -> &mut Mat4 {
        self.mvp = None;
        match self.mode {
            MatrixMode::Projection => &mut self.projection.top,
            MatrixMode::ModelView => &mut self.modelview.top,
        }
    }

    fn fail(&mut self, err: LineError) {
        if self.error.is_none() {
            log::debug!("line batch: {err}");
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> LineBatch {
        LineBatch::default()
    }

    fn clip(b: &LineBatch, i: usize) -> Vec4 {
        Vec4::from_array(b.vertices()[i].clip)
    }

    fn approx(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    // ── primitives ────────────────────────────────────────────────────────

    #[test]
    fn lines_record_one_command() {
        let mut b = batch();
        b.begin_lines();
        b.v3f(0.0, 0.0, 0.0);
        b.v3f(1.0, 0.0, 0.0);
        b.v3f(0.0, 1.0, 0.0);
        b.v3f(1.0, 1.0, 0.0);
        b.end();

        assert_eq!(
            b.commands(),
            &[LineCommand {
                pipeline: PipelineId::DEFAULT,
                topology: LineTopology::Lines,
                first_vertex: 0,
                vertex_count: 4,
            }]
        );
        assert!(b.error().is_none());
    }

    #[test]
    fn lines_drop_unpaired_vertex() {
        let mut b = batch();
        b.begin_lines();
        b.v2f(0.0, 0.0);
        b.v2f(1.0, 0.0);
        b.v2f(2.0, 0.0);
        b.end();
        assert_eq!(b.vertices().len(), 2);
        assert_eq!(b.commands()[0].vertex_count, 2);
    }

    #[test]
    fn short_strip_records_nothing() {
        let mut b = batch();
        b.begin_line_strip();
        b.v2f(0.0, 0.0);
        b.end();
        assert!(b.is_empty());
        assert!(b.vertices().is_empty());
    }

    #[test]
    fn empty_primitive_records_nothing() {
        let mut b = batch();
        b.begin_lines();
        b.end();
        assert!(b.is_empty());
        assert!(b.error().is_none());
    }

    #[test]
    fn consecutive_line_lists_merge() {
        let mut b = batch();
        for _ in 0..3 {
            b.begin_lines();
            b.v2f(0.0, 0.0);
            b.v2f(1.0, 1.0);
            b.end();
        }
        assert_eq!(b.commands().len(), 1);
        assert_eq!(b.commands()[0].vertex_count, 6);
    }

    #[test]
    fn strips_never_merge() {
        let mut b = batch();
        for _ in 0..2 {
            b.begin_line_strip();
            b.v2f(0.0, 0.0);
            b.v2f(1.0, 1.0);
            b.v2f(2.0, 0.0);
            b.end();
        }
        assert_eq!(b.commands().len(), 2);
        assert_eq!(b.commands()[1].first_vertex, 3);
    }

    #[test]
    fn pipeline_change_splits_line_lists() {
        let mut b = batch();
        b.begin_lines();
        b.v2f(0.0, 0.0);
        b.v2f(1.0, 1.0);
        b.end();
        b.load_pipeline(PipelineId(1));
        b.begin_lines();
        b.v2f(0.0, 0.0);
        b.v2f(1.0, 1.0);
        b.end();

        assert_eq!(b.commands().len(), 2);
        assert_eq!(b.commands()[1].pipeline, PipelineId(1));
    }

    #[test]
    fn vertex_outside_primitive_is_an_error() {
        let mut b = batch();
        b.v3f(1.0, 2.0, 3.0);
        assert!(b.vertices().is_empty());
        assert_eq!(b.error(), Some(LineError::NoActivePrimitive));
    }

    #[test]
    fn nested_begin_closes_previous() {
        let mut b = batch();
        b.begin_lines();
        b.v2f(0.0, 0.0);
        b.v2f(1.0, 0.0);
        b.begin_line_strip();
        b.v2f(0.0, 0.0);
        b.v2f(0.0, 1.0);
        b.end();

        assert_eq!(b.error(), Some(LineError::NestedPrimitive));
        assert_eq!(b.commands().len(), 2);
        assert_eq!(b.commands()[1].topology, LineTopology::LineStrip);
    }

    // ── budgets ───────────────────────────────────────────────────────────

    #[test]
    fn vertex_budget_is_enforced() {
        let mut b = LineBatch::new(LineBatchConfig { max_vertices: 3, max_commands: 8 });
        b.begin_line_strip();
        for i in 0..5 {
            b.v2f(i as f32, 0.0);
        }
        b.end();
        assert_eq!(b.vertices().len(), 3);
        assert_eq!(b.error(), Some(LineError::VerticesFull));
    }

    #[test]
    fn command_budget_is_enforced() {
        let mut b = LineBatch::new(LineBatchConfig { max_vertices: 64, max_commands: 1 });
        for _ in 0..2 {
            b.begin_line_strip();
            b.v2f(0.0, 0.0);
            b.v2f(1.0, 0.0);
            b.end();
        }
        assert_eq!(b.commands().len(), 1);
        assert_eq!(b.vertices().len(), 2);
        assert_eq!(b.error(), Some(LineError::CommandsFull));
    }

    #[test]
    fn clear_resets_geometry_and_error() {
        let mut b = batch();
        b.end();
        b.begin_lines();
        b.v2f(0.0, 0.0);
        b.v2f(1.0, 0.0);
        b.end();
        b.clear();
        assert!(b.vertices().is_empty());
        assert!(b.is_empty());
        assert!(b.error().is_none());
    }

    // ── matrices ──────────────────────────────────────────────────────────

    #[test]
    fn identity_passes_positions_through() {
        let mut b = batch();
        b.begin_lines();
        b.v3f(1.0, 2.0, 3.0);
        b.v2f(4.0, 5.0);
        b.end();
        assert_eq!(clip(&b, 0), Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(clip(&b, 1), Vec4::new(4.0, 5.0, 0.0, 1.0));
    }

    #[test]
    fn translate_applies_to_later_vertices_only() {
        let mut b = batch();
        b.begin_lines();
        b.v3f(0.0, 0.0, 0.0);
        b.translate(10.0, 0.0, 0.0);
        b.v3f(0.0, 0.0, 0.0);
        b.end();
        assert_eq!(clip(&b, 0).x, 0.0);
        assert_eq!(clip(&b, 1).x, 10.0);
    }

    #[test]
    fn transforms_post_multiply() {
        // translate then rotate: the rotation happens in the translated frame.
        let mut b = batch();
        b.translate(5.0, 0.0, 0.0);
        b.rotate(std::f32::consts::FRAC_PI_2, 0.0, 0.0, 1.0);
        b.begin_lines();
        b.v3f(1.0, 0.0, 0.0);
        b.v3f(0.0, 0.0, 0.0);
        b.end();
        assert!(approx(clip(&b, 0), Vec4::new(5.0, 1.0, 0.0, 1.0)));
        assert!(approx(clip(&b, 1), Vec4::new(5.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn rotate_normalizes_axis_and_ignores_zero_axis() {
        let mut a = batch();
        a.rotate(0.7, 0.0, 1.0, 1.0);
        let mut b = batch();
        b.rotate(0.7, 0.0, 3.0, 3.0);
        assert!(a.current_matrix().abs_diff_eq(b.current_matrix(), 1e-6));

        let mut c = batch();
        c.rotate(1.0, 0.0, 0.0, 0.0);
        assert_eq!(c.current_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn projection_and_modelview_combine() {
        let mut b = batch();
        b.matrix_mode_projection();
        b.scale(2.0, 2.0, 1.0);
        b.matrix_mode_modelview();
        b.translate(1.0, 0.0, 0.0);
        b.begin_lines();
        b.v2f(1.0, 1.0);
        b.v2f(0.0, 0.0);
        b.end();
        // projection * modelview * p = scale(translate(p))
        assert_eq!(clip(&b, 0), Vec4::new(4.0, 2.0, 0.0, 1.0));
        assert_eq!(clip(&b, 1), Vec4::new(2.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn perspective_puts_near_plane_at_zero_depth() {
        let mut b = batch();
        b.matrix_mode_projection();
        b.perspective(45f32.to_radians(), 1.0, 0.1, 1000.0);
        b.matrix_mode_modelview();
        b.begin_lines();
        b.v3f(0.0, 0.0, -0.1);
        b.v3f(0.0, 0.0, -1000.0);
        b.end();

        let near = clip(&b, 0);
        let far = clip(&b, 1);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn push_pop_matrix_restores() {
        let mut b = batch();
        b.translate(1.0, 2.0, 3.0);
        let saved = b.current_matrix();
        b.push_matrix();
        b.rotate(1.0, 0.0, 1.0, 0.0);
        b.pop_matrix();
        assert_eq!(b.current_matrix(), saved);
        assert!(b.error().is_none());
    }

    #[test]
    fn matrix_stacks_are_per_mode() {
        let mut b = batch();
        b.matrix_mode_projection();
        b.push_matrix();
        b.matrix_mode_modelview();
        b.pop_matrix();
        assert_eq!(b.error(), Some(LineError::StackUnderflow));
    }

    #[test]
    fn matrix_stack_overflow() {
        let mut b = batch();
        for _ in 0..STACK_DEPTH - 1 {
            b.push_matrix();
        }
        assert!(b.error().is_none());
        b.push_matrix();
        assert_eq!(b.error(), Some(LineError::StackOverflow));
    }

    #[test]
    fn defaults_resets_state() {
        let mut b = batch();
        b.matrix_mode_projection();
        b.translate(1.0, 1.0, 1.0);
        b.push_matrix();
        b.c3f(0.0, 1.0, 0.0);
        b.load_pipeline(PipelineId(3));
        b.defaults();

        assert_eq!(b.matrix_mode(), MatrixMode::ModelView);
        assert_eq!(b.current_matrix(), Mat4::IDENTITY);
        assert_eq!(b.current_pipeline(), PipelineId::DEFAULT);
        b.matrix_mode_projection();
        assert_eq!(b.current_matrix(), Mat4::IDENTITY);
        b.pop_matrix();
        assert_eq!(b.error(), Some(LineError::StackUnderflow));
    }

    // ── pipelines / color ─────────────────────────────────────────────────

    #[test]
    fn pipeline_stack_restores() {
        let mut b = batch();
        b.push_pipeline();
        b.load_pipeline(PipelineId(2));
        assert_eq!(b.current_pipeline(), PipelineId(2));
        b.pop_pipeline();
        assert_eq!(b.current_pipeline(), PipelineId::DEFAULT);
        b.pop_pipeline();
        assert_eq!(b.error(), Some(LineError::StackUnderflow));
    }

    #[test]
    fn primitive_keeps_pipeline_from_begin() {
        let mut b = batch();
        b.load_pipeline(PipelineId(1));
        b.begin_line_strip();
        b.v2f(0.0, 0.0);
        b.load_default_pipeline();
        b.v2f(1.0, 0.0);
        b.end();
        assert_eq!(b.commands()[0].pipeline, PipelineId(1));
    }

    #[test]
    fn color_is_attached_per_vertex() {
        let mut b = batch();
        b.begin_line_strip();
        b.v2f(0.0, 0.0);
        b.c3f(1.0, 0.0, 1.0);
        b.v2f(1.0, 0.0);
        b.c4f(0.0, 0.5, 0.0, 0.25);
        b.v2f(2.0, 0.0);
        b.end();

        let colors: Vec<[f32; 4]> = b.vertices().iter().map(|v| v.color).collect();
        assert_eq!(colors, vec![[1.0; 4], [1.0, 0.0, 1.0, 1.0], [0.0, 0.5, 0.0, 0.25]]);
    }
}

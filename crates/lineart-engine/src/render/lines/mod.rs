//! Immediate-mode line drawing.
//!
//! [`LineBatch`] is a GPU-free recorder with a classic fixed-function style API
//! (`begin_lines` / `v3f` / `end`, matrix stacks, pipeline stack). Each frame the
//! application records into a batch and hands it to [`LineRenderer`], which
//! uploads the vertices and issues one draw per recorded command.
//!
//! ```rust,ignore
//! gl.defaults();
//! gl.matrix_mode_projection();
//! gl.perspective(45f32.to_radians(), aspect, 0.1, 1000.0);
//! gl.matrix_mode_modelview();
//! gl.c3f(1.0, 0.0, 1.0);
//! gl.begin_lines();
//! gl.v3f(-1.0, 0.0, -5.0);
//! gl.v3f(1.0, 0.0, -5.0);
//! gl.end();
//! ```

mod batch;
mod pipeline;
mod renderer;
mod vertex;

pub use batch::{LineBatch, LineBatchConfig, LineCommand, LineError, LineTopology, MatrixMode};
pub use pipeline::{LinePipelineDesc, PipelineId};
pub use renderer::LineRenderer;
pub use vertex::LineVertex;

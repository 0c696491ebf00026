//! Procedural line generators.
//!
//! Everything here is a pure function of the frame counter (plus the trail for
//! [`hairball`]) and records into the caller's current matrix, color and
//! pipeline state.

use lineart_engine::render::lines::LineBatch;

use crate::rng::UnitRandom;
use crate::trail::TrailBuffer;

const GRID_LINES: u32 = 64;
const GRID_SPACING: f32 = 4.0;

const FLOATY_SEGMENTS: u32 = 32;
const FLOATY_STEP: f32 = 0.25;

/// Two sets of 64 parallel lines on the plane at height `y`.
///
/// Lines along Z span `z` in `[-256, 0]`; lines along X span `x` in
/// `[-128, 128]` and scroll toward the viewer, repeating every 8 frames.
pub fn grid(gl: &mut LineBatch, y: f32, frame_count: u32) {
    let n = GRID_LINES as f32;
    let half_width = n * GRID_SPACING * 0.5;
    let depth = n * GRID_SPACING;
    let z_offset = (GRID_SPACING / 8.0) * (frame_count & 7) as f32;

    gl.begin_lines();
    for i in 0..GRID_LINES {
        let x = i as f32 * GRID_SPACING - half_width;
        gl.v3f(x, y, -depth);
        gl.v3f(x, y, 0.0);
    }
    for i in 0..GRID_LINES {
        let z = z_offset + i as f32 * GRID_SPACING - depth;
        gl.v3f(-half_width, y, z);
        gl.v3f(half_width, y, z);
    }
    gl.end();
}

/// Visible step range `[start, end)` of the floaty pattern for a frame.
///
/// Over a 64-frame cycle the range first grows from empty to all 32 steps,
/// then shrinks from the front back to empty.
pub fn floaty_window(frame_count: u32) -> (u32, u32) {
    let t = frame_count % (FLOATY_SEGMENTS * 2);
    let start = t.saturating_sub(FLOATY_SEGMENTS);
    let end = t.min(FLOATY_SEGMENTS);
    (start, end)
}

/// Four families of segments sweeping in from the corners of an 8x8 square
/// on the z = 0 plane.
pub fn floaty_thingy(gl: &mut LineBatch, frame_count: u32) {
    let (start, end) = floaty_window(frame_count);

    let half = FLOATY_SEGMENTS as f32 * FLOATY_STEP * 0.5;
    let (x0, x1) = (-half, half);
    let (y0, y1) = (-half, half);

    gl.begin_lines();
    for i in start..end {
        let d = i as f32 * FLOATY_STEP;
        gl.v2f(x0 + d, y0);
        gl.v2f(x1, y0 + d);
        gl.v2f(x1 - d, y1);
        gl.v2f(x0, y1 - d);
        gl.v2f(x0 + d, y1);
        gl.v2f(x1, y1 - d);
        gl.v2f(x1 - d, y0);
        gl.v2f(x0, y0 + d);
    }
    gl.end();
}

/// Advances `trail` by one particle and records it as a single colored strip.
pub fn hairball<R>(gl: &mut LineBatch, trail: &mut TrailBuffer, rng: &mut R)
where
    R: UnitRandom + ?Sized,
{
    trail.advance(rng);

    gl.begin_line_strip();
    trail.emit_strip(|pos, color| {
        gl.c3f(color.x, color.y, color.z);
        gl.v3f(pos.x, pos.y, pos.z);
    });
    gl.end();
}

#[cfg(test)]
mod tests {
    use glam::Vec4;
    use lineart_engine::render::lines::{LineCommand, LineTopology};

    use super::*;
    use crate::rng::XorShift32;

    fn clip(gl: &LineBatch, i: usize) -> Vec4 {
        Vec4::from_array(gl.vertices()[i].clip)
    }

    fn single_command(gl: &LineBatch) -> LineCommand {
        assert_eq!(gl.commands().len(), 1, "expected one command");
        gl.commands()[0]
    }

    // ── grid ──────────────────────────────────────────────────────────────

    #[test]
    fn grid_emits_256_vertices() {
        let mut gl = LineBatch::default();
        grid(&mut gl, -7.0, 1);

        let cmd = single_command(&gl);
        assert_eq!(cmd.topology, LineTopology::Lines);
        assert_eq!(cmd.vertex_count, 256);
        assert!(gl.error().is_none());
    }

    #[test]
    fn grid_layout() {
        let mut gl = LineBatch::default();
        grid(&mut gl, 7.0, 0);

        // first line along Z
        assert_eq!(clip(&gl, 0), Vec4::new(-128.0, 7.0, -256.0, 1.0));
        assert_eq!(clip(&gl, 1), Vec4::new(-128.0, 7.0, 0.0, 1.0));
        // last line along Z
        assert_eq!(clip(&gl, 127).x, 124.0);
        // first line along X
        assert_eq!(clip(&gl, 128), Vec4::new(-128.0, 7.0, -256.0, 1.0));
        assert_eq!(clip(&gl, 129), Vec4::new(128.0, 7.0, -256.0, 1.0));
        // last line along X
        assert_eq!(clip(&gl, 255).z, -4.0);
        assert!(gl.vertices().iter().all(|v| v.clip[1] == 7.0));
    }

    #[test]
    fn grid_scrolls_with_period_eight() {
        let x_line_z = |frame| {
            let mut gl = LineBatch::default();
            grid(&mut gl, 0.0, frame);
            clip(&gl, 128).z
        };
        assert_eq!(x_line_z(0), -256.0);
        assert_eq!(x_line_z(1), -255.5);
        assert_eq!(x_line_z(7), -252.5);
        assert_eq!(x_line_z(8), x_line_z(0));
        assert_eq!(x_line_z(13), x_line_z(5));
    }

    // ── floaty ────────────────────────────────────────────────────────────

    #[test]
    fn floaty_window_cycle() {
        assert_eq!(floaty_window(0), (0, 0));
        assert_eq!(floaty_window(1), (0, 1));
        assert_eq!(floaty_window(31), (0, 31));
        assert_eq!(floaty_window(32), (0, 32));
        assert_eq!(floaty_window(33), (1, 32));
        assert_eq!(floaty_window(63), (31, 32));
        assert_eq!(floaty_window(64), (0, 0));
        assert_eq!(floaty_window(u32::MAX), (31, 32));
    }

    #[test]
    fn floaty_emits_eight_vertices_per_step() {
        for frame in [1u32, 10, 32, 40, 63] {
            let mut gl = LineBatch::default();
            floaty_thingy(&mut gl, frame);
            let (start, end) = floaty_window(frame);
            assert_eq!(gl.vertices().len() as u32, (end - start) * 8);
        }
    }

    #[test]
    fn floaty_empty_window_records_nothing() {
        let mut gl = LineBatch::default();
        floaty_thingy(&mut gl, 64);
        assert!(gl.is_empty());
        assert!(gl.error().is_none());
    }

    #[test]
    fn floaty_first_step_sits_on_corners() {
        let mut gl = LineBatch::default();
        floaty_thingy(&mut gl, 1);
        let got: Vec<(f32, f32)> = (0..8).map(|i| (clip(&gl, i).x, clip(&gl, i).y)).collect();
        assert_eq!(
            got,
            vec![
                (-4.0, -4.0),
                (4.0, -4.0),
                (4.0, 4.0),
                (-4.0, 4.0),
                (-4.0, 4.0),
                (4.0, 4.0),
                (4.0, -4.0),
                (-4.0, -4.0),
            ]
        );
        assert!(gl.vertices().iter().all(|v| v.clip[2] == 0.0));
    }

    #[test]
    fn floaty_steps_move_by_quarter() {
        let mut gl = LineBatch::default();
        floaty_thingy(&mut gl, 34); // steps 2..32
        assert_eq!(clip(&gl, 0).x, -4.0 + 0.5);
        assert_eq!(clip(&gl, 1).y, -4.0 + 0.5);
    }

    // ── hairball ──────────────────────────────────────────────────────────

    #[test]
    fn hairball_advances_then_emits_strip() {
        let mut gl = LineBatch::default();
        let mut trail = TrailBuffer::new(16).unwrap();
        let mut rng = XorShift32::default();

        hairball(&mut gl, &mut trail, &mut rng);

        assert_eq!(trail.head(), 1);
        let cmd = single_command(&gl);
        assert_eq!(cmd.topology, LineTopology::LineStrip);
        assert_eq!(cmd.vertex_count, 15);

        for (v, p) in gl.vertices().iter().zip(trail.strip()) {
            assert_eq!(v.clip, [p.position.x, p.position.y, p.position.z, 1.0]);
            assert_eq!(v.color, [p.color.x, p.color.y, p.color.z, 1.0]);
        }
    }

    #[test]
    fn hairball_overrides_current_color() {
        let mut gl = LineBatch::default();
        let mut trail = TrailBuffer::new(4).unwrap();
        gl.c3f(0.5, 1.0, 0.0);
        hairball(&mut gl, &mut trail, &mut XorShift32::default());
        // never-written slots carry zero color
        assert!(gl.vertices().iter().all(|v| v.color == [0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn hairball_strip_ends_just_before_newest() {
        let mut gl = LineBatch::default();
        let mut trail = TrailBuffer::new(4).unwrap();
        let mut rng = XorShift32::default();
        for _ in 0..3 {
            gl.clear();
            hairball(&mut gl, &mut trail, &mut rng);
        }
        assert_eq!(trail.head(), 3);
        let last = gl.vertices().last().unwrap().clip;
        let expected = trail.slot(2).unwrap().position;
        assert_eq!(last, [expected.x, expected.y, expected.z, 1.0]);
    }

    #[test]
    fn capacity_two_strip_is_dropped() {
        let mut gl = LineBatch::default();
        let mut trail = TrailBuffer::new(2).unwrap();
        hairball(&mut gl, &mut trail, &mut XorShift32::default());
        assert!(gl.is_empty());
        assert!(gl.error().is_none());
    }
}

// stuck.rs — moving a box that ended up inside solid geometry back out
//
// Each face of the box is probed in a fixed order. A face that is clear is
// swept across the box to the opposite face; wherever it stops, the box is
// placed just past that point and checked once more at full size.

use tracing::debug;

use crate::q_shared::{vector_add, vector_ma, vector_subtract, Vec3};
use crate::trace::TraceResult;

/// Clearance left between the recovered box and the surface it was moved to.
pub const STUCK_NUDGE: f32 = 0.125;

struct SideCheck {
    normal: [i8; 3],
    /// -1 picks the box mins on that axis, 1 the maxs, 0 flattens it
    mins: [i8; 3],
    maxs: [i8; 3],
}

/// Probe order. Entries `i` and `i ^ 1` are opposite faces.
const SIDE_CHECKS: [SideCheck; 6] = [
    SideCheck { normal: [0, 0, 1], mins: [-1, -1, 0], maxs: [1, 1, 0] },
    SideCheck { normal: [0, 0, -1], mins: [-1, -1, 0], maxs: [1, 1, 0] },
    SideCheck { normal: [1, 0, 0], mins: [0, -1, -1], maxs: [0, 1, 1] },
    SideCheck { normal: [-1, 0, 0], mins: [0, -1, -1], maxs: [0, 1, 1] },
    SideCheck { normal: [0, 1, 0], mins: [-1, 0, -1], maxs: [1, 0, 1] },
    SideCheck { normal: [0, -1, 0], mins: [-1, 0, -1], maxs: [1, 0, 1] },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StuckResult {
    /// the box was not stuck
    GoodPosition,
    Fixed,
    /// every probe failed; the origin is returned unchanged
    NoGoodPosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StuckOutcome {
    pub result: StuckResult,
    pub origin: Vec3,
}

/// Trace callback used by [`fix_stuck_object_generic`]. Arguments are
/// `start, mins, maxs, end`, the same order the movement code traces with.
pub trait StuckTrace {
    fn trace(&mut self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3) -> TraceResult;
}

impl<F> StuckTrace for F
where
    F: FnMut(&Vec3, &Vec3, &Vec3, &Vec3) -> TraceResult,
{
    fn trace(&mut self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3) -> TraceResult {
        self(start, mins, maxs, end)
    }
}

/// Centre of the face of `mins..maxs` (placed at `origin`) that `side` faces.
fn face_point(origin: &Vec3, side: &SideCheck, mins: &Vec3, maxs: &Vec3) -> Vec3 {
    let mut p = *origin;
    for i in 0..3 {
        if side.normal[i] < 0 {
            p[i] += mins[i];
        } else if side.normal[i] > 0 {
            p[i] += maxs[i];
        }
    }
    p
}

/// The face itself as a box with no thickness along the normal.
fn face_bounds(side: &SideCheck, mins: &Vec3, maxs: &Vec3) -> (Vec3, Vec3) {
    let pick = |code: i8, i: usize| match code {
        -1 => mins[i],
        1 => maxs[i],
        _ => 0.0,
    };
    let mut fmins = [0.0; 3];
    let mut fmaxs = [0.0; 3];
    for i in 0..3 {
        fmins[i] = pick(side.mins[i], i);
        fmaxs[i] = pick(side.maxs[i], i);
    }
    (fmins, fmaxs)
}

/// Try to move the box `mins..maxs` at `origin` out of solid.
///
/// Faces are tried top, bottom, +x, -x, +y, -y. A face that starts inside
/// something may slide one unit along either of its own axes first. The
/// first face whose sweep yields a box position that is itself clear wins,
/// so the same stuck configuration always resolves the same way.
pub fn fix_stuck_object_generic<T: StuckTrace>(origin: &Vec3, mins: &Vec3, maxs: &Vec3, mut tracer: T) -> StuckOutcome {
    if !tracer.trace(origin, mins, maxs, origin).startsolid {
        return StuckOutcome {
            result: StuckResult::GoodPosition,
            origin: *origin,
        };
    }

    for (i, side) in SIDE_CHECKS.iter().enumerate() {
        let (face_mins, face_maxs) = face_bounds(side, mins, maxs);
        let mut start = face_point(origin, side, mins, maxs);
        let mut slide: Option<(usize, f32)> = None;

        let mut solid = tracer.trace(&start, &face_mins, &face_maxs, &start).startsolid;
        if solid {
            'axes: for axis in 0..3 {
                if side.normal[axis] != 0 {
                    continue;
                }
                for dir in [1.0, -1.0] {
                    let mut moved = start;
                    moved[axis] += dir;
                    if !tracer.trace(&moved, &face_mins, &face_maxs, &moved).startsolid {
                        start = moved;
                        slide = Some((axis, dir));
                        solid = false;
                        break 'axes;
                    }
                }
            }
        }
        if solid {
            continue;
        }

        let mut opposite = face_point(origin, &SIDE_CHECKS[i ^ 1], mins, maxs);
        if let Some((axis, dir)) = slide {
            opposite[axis] += dir;
        }

        let tr = tracer.trace(&start, &face_mins, &face_maxs, &opposite);
        if tr.startsolid {
            continue;
        }

        let normal = [side.normal[0] as f32, side.normal[1] as f32, side.normal[2] as f32];
        let end = vector_ma(&tr.endpos, STUCK_NUDGE, &normal);
        let delta = vector_subtract(&end, &opposite);
        let mut fixed = vector_add(origin, &delta);
        if let Some((axis, dir)) = slide {
            fixed[axis] += dir;
        }

        if tracer.trace(&fixed, mins, maxs, &fixed).startsolid {
            continue;
        }

        debug!(?origin, ?fixed, side = i, "unstuck");
        return StuckOutcome {
            result: StuckResult::Fixed,
            origin: fixed,
        };
    }

    debug!(?origin, ?mins, ?maxs, "no good position to unstick to");
    StuckOutcome {
        result: StuckResult::NoGoodPosition,
        origin: *origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmodel::CollisionModel;
    use crate::flags::MASK_ALL;
    use crate::test_util::*;
    use crate::trace::trace_box;

    const MINS: Vec3 = [-16.0, -16.0, -24.0];
    const MAXS: Vec3 = [16.0, 16.0, 32.0];

    fn unstick(model: &CollisionModel, origin: &Vec3) -> StuckOutcome {
        let head = model.world_headnode();
        fix_stuck_object_generic(origin, &MINS, &MAXS, |start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3| {
            trace_box(model, start, end, Some(mins), Some(maxs), head, MASK_ALL)
        })
    }

    #[test]
    fn test_free_origin_is_good() {
        let model = leaf_model(vec![brush_from_bounds(&[100.0; 3], &[120.0; 3])]);
        let out = unstick(&model, &[0.0; 3]);
        assert_eq!(out.result, StuckResult::GoodPosition);
        assert_eq!(out.origin, [0.0; 3]);
    }

    #[test]
    fn test_three_obstacles_lifted_by_first_probe() {
        // three separate blocks poking into the bottom of the box
        let model = leaf_model(vec![
            brush_from_bounds(&[-12.0, -12.0, -30.0], &[-8.0, -8.0, -20.0]),
            brush_from_bounds(&[8.0, 8.0, -30.0], &[12.0, 12.0, -20.0]),
            brush_from_bounds(&[-12.0, 8.0, -30.0], &[-8.0, 12.0, -20.0]),
        ]);
        let out = unstick(&model, &[0.0; 3]);
        assert_eq!(out.result, StuckResult::Fixed);
        assert_eq!(out.origin[0], 0.0);
        assert_eq!(out.origin[1], 0.0);
        // bottom of the box rests just above the blocks
        let expected = 4.0 + 0.03125 + STUCK_NUDGE;
        assert!((out.origin[2] - expected).abs() < 1e-3, "origin {:?}", out.origin);
    }

    #[test]
    fn test_blocked_top_falls_through_to_bottom_probe() {
        let model = leaf_model(vec![brush_from_bounds(&[-64.0, -64.0, 24.0], &[64.0, 64.0, 40.0])]);
        let out = unstick(&model, &[0.0; 3]);
        assert_eq!(out.result, StuckResult::Fixed);
        assert_eq!(out.origin[0], 0.0);
        assert_eq!(out.origin[1], 0.0);
        let expected = -8.0 - 0.03125 - STUCK_NUDGE;
        assert!((out.origin[2] - expected).abs() < 1e-3, "origin {:?}", out.origin);
    }

    #[test]
    fn test_enclosed_origin_is_left_alone() {
        let model = leaf_model(vec![axis_brush(512.0)]);
        let origin = [3.0, -2.0, 1.0];
        let out = unstick(&model, &origin);
        assert_eq!(out.result, StuckResult::NoGoodPosition);
        assert_eq!(out.origin, origin);
    }

    #[test]
    fn test_same_input_same_result() {
        let model = leaf_model(vec![
            brush_from_bounds(&[-20.0, -4.0, -30.0], &[20.0, 4.0, -16.0]),
            brush_from_bounds(&[10.0, -20.0, 20.0], &[30.0, 20.0, 50.0]),
        ]);
        let a = unstick(&model, &[1.0, 2.0, 3.0]);
        let b = unstick(&model, &[1.0, 2.0, 3.0]);
        assert_eq!(a, b);
        assert_ne!(a.result, StuckResult::GoodPosition);
    }

    struct CountingTrace<'a> {
        model: &'a CollisionModel,
        calls: &'a mut usize,
    }

    impl StuckTrace for CountingTrace<'_> {
        fn trace(&mut self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3) -> TraceResult {
            *self.calls += 1;
            trace_box(self.model, start, end, Some(mins), Some(maxs), self.model.world_headnode(), MASK_ALL)
        }
    }

    #[test]
    fn test_custom_tracer_not_stuck_traces_once() {
        let model = leaf_model(vec![axis_brush(8.0)]);
        let mut calls = 0;
        let tracer = CountingTrace { model: &model, calls: &mut calls };
        let out = fix_stuck_object_generic(&[200.0, 0.0, 0.0], &MINS, &MAXS, tracer);
        assert_eq!(out.result, StuckResult::GoodPosition);
        assert_eq!(calls, 1);
    }
}

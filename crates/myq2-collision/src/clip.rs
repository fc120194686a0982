// clip.rs — single-brush tests: swept box clip, static overlap, point inside
//
// A box against a plane is reduced to a point against the plane pushed out by
// the box corner that reaches furthest behind it.

use crate::cmodel::Brush;
use crate::flags::Contents;
use crate::plane::{plane_distance_to_point, Plane};
use crate::q_shared::{dot_product, Vec3};
use crate::trace::TraceResult;

/// Distance a clipped trace stops short of the surface it hit.
pub const DIST_EPSILON: f32 = 0.03125;

/// Plane distance shifted by the box corner furthest behind the plane.
#[inline]
fn expanded_dist(plane: &Plane, mins: &Vec3, maxs: &Vec3) -> f32 {
    let mut ofs = [0.0f32; 3];
    for j in 0..3 {
        ofs[j] = if plane.normal[j] < 0.0 { maxs[j] } else { mins[j] };
    }
    plane.dist - dot_product(&ofs, &plane.normal)
}

/// Clip the sweep `p1 -> p2` of a `mins`/`maxs` box against one brush and
/// fold the result into `trace`.
///
/// The entry plane is the side with the largest entry fraction; on equal
/// fractions the earlier side wins. `trace` only changes when this brush is
/// hit closer than anything recorded so far, or when the sweep starts inside
/// it.
pub fn clip_box_to_brush(mins: &Vec3, maxs: &Vec3, p1: &Vec3, p2: &Vec3, trace: &mut TraceResult, brush: &Brush) {
    if brush.sides.is_empty() {
        return;
    }

    let mut enterfrac: f32 = -1.0;
    let mut leavefrac: f32 = 1.0;
    let mut leadside = None;

    let mut getout = false;
    let mut startout = false;

    for side in &brush.sides {
        let plane = &side.plane;
        let dist = expanded_dist(plane, mins, maxs);

        let d1 = dot_product(p1, &plane.normal) - dist;
        let d2 = dot_product(p2, &plane.normal) - dist;

        if d2 > 0.0 {
            getout = true; // endpoint is not in solid
        }
        if d1 > 0.0 {
            startout = true;
        }

        // completely in front of face, no intersection
        if d1 > 0.0 && d2 >= d1 {
            return;
        }
        if d1 <= 0.0 && d2 <= 0.0 {
            continue;
        }

        if d1 > d2 {
            // enter
            let f = (d1 - DIST_EPSILON) / (d1 - d2);
            if f > enterfrac {
                enterfrac = f;
                leadside = Some(side);
            }
        } else {
            // leave
            let f = (d1 + DIST_EPSILON) / (d1 - d2);
            if f < leavefrac {
                leavefrac = f;
            }
        }
    }

    if !startout {
        // original point was inside brush
        trace.startsolid = true;
        if !getout {
            trace.allsolid = true;
            trace.fraction = 0.0;
            trace.contents = brush.contents;
        }
        return;
    }

    if enterfrac < leavefrac && enterfrac > -1.0 && enterfrac < trace.fraction {
        if let Some(side) = leadside {
            trace.fraction = enterfrac.max(0.0);
            trace.plane = Some(side.plane);
            trace.surface_flags = side.surface_flags;
            trace.contents = brush.contents;
        }
    }
}

/// Whether a box at `origin` overlaps `brush`. A brush with no sides never
/// overlaps anything.
#[inline]
pub(crate) fn box_in_brush(origin: &Vec3, mins: &Vec3, maxs: &Vec3, brush: &Brush) -> bool {
    if brush.sides.is_empty() {
        return false;
    }
    brush.sides.iter().all(|side| {
        let dist = expanded_dist(&side.plane, mins, maxs);
        dot_product(origin, &side.plane.normal) - dist <= 0.0
    })
}

/// Result of a static box-in-brush test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxBrushTest {
    pub startsolid: bool,
    pub allsolid: bool,
    /// The brush's contents when the box overlaps it, empty otherwise.
    pub contents: Contents,
}

/// Static variant of [`clip_box_to_brush`]: does a box resting at `origin`
/// already overlap `brush`. Overlap reports both `startsolid` and
/// `allsolid`, since a box that does not move cannot get out.
pub fn test_box_in_brush(origin: &Vec3, mins: &Vec3, maxs: &Vec3, brush: &Brush) -> BoxBrushTest {
    if box_in_brush(origin, mins, maxs, brush) {
        BoxBrushTest {
            startsolid: true,
            allsolid: true,
            contents: brush.contents,
        }
    } else {
        BoxBrushTest::default()
    }
}

/// Fold a position test against one brush into `trace`.
pub(crate) fn test_box_in_brush_trace(mins: &Vec3, maxs: &Vec3, p1: &Vec3, trace: &mut TraceResult, brush: &Brush) {
    if box_in_brush(p1, mins, maxs, brush) {
        trace.startsolid = true;
        trace.allsolid = true;
        trace.fraction = 0.0;
        trace.contents = brush.contents;
    }
}

/// Whether `point` is behind or within `epsilon` of every side of `brush`.
pub fn point_inside_brush(point: &Vec3, brush: &Brush, epsilon: f32) -> bool {
    brush
        .sides
        .iter()
        .all(|side| plane_distance_to_point(&side.plane, point) <= epsilon)
}

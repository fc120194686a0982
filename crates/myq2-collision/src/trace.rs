// trace.rs — swept box traces through the BSP tree
//
// A trace walks the tree from the head node, splitting the segment at each
// plane it crosses, and clips against every brush in the leaves it reaches.
// Brushes reachable from several leaves are clipped once per trace.

use crate::clip::{clip_box_to_brush, test_box_in_brush_trace, DIST_EPSILON};
use crate::cmodel::{Child, CollisionModel};
use crate::flags::{Contents, SurfaceFlags};
use crate::plane::Plane;
use crate::q_shared::{
    angle_vectors, dot_product, rotate_into, vector_compare, vector_lerp, vector_subtract, Vec3,
    VEC3_ORIGIN,
};

/// Margin added around node bounds before a sweep is rejected by them.
const NODE_BOUNDS_MARGIN: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceResult {
    /// 1.0 = didn't hit anything
    pub fraction: f32,
    /// final position
    pub endpos: Vec3,
    /// surface normal at impact
    pub plane: Option<Plane>,
    /// contents of the brush that was hit
    pub contents: Contents,
    pub surface_flags: SurfaceFlags,
    /// if true, the initial point was in a solid area
    pub startsolid: bool,
    /// if true, plane is not valid
    pub allsolid: bool,
}

impl Default for TraceResult {
    fn default() -> Self {
        Self {
            fraction: 1.0,
            endpos: VEC3_ORIGIN,
            plane: None,
            contents: Contents::empty(),
            surface_flags: SurfaceFlags::empty(),
            startsolid: false,
            allsolid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub traces: u64,
    /// traces with `start == end`
    pub position_tests: u64,
    /// brushes clipped or tested
    pub brush_traces: u64,
}

/// Per-caller scratch for traces: the "already clipped" stamps and counters.
/// One per thread; the model itself is never written.
#[derive(Debug, Clone, Default)]
pub struct TraceScratch {
    checked: Vec<u32>,
    generation: u32,
    stats: TraceStats,
}

impl TraceScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = TraceStats::default();
    }

    /// Start a new trace over a model with `num_brushes` brushes.
    fn begin(&mut self, num_brushes: usize) {
        if self.checked.len() < num_brushes {
            self.checked.resize(num_brushes, 0);
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.checked.fill(0);
            self.generation = 1;
        }
    }

    /// True the first time `brush` is seen in the current trace.
    #[inline]
    fn first_visit(&mut self, brush: usize) -> bool {
        if self.checked[brush] == self.generation {
            return false;
        }
        self.checked[brush] = self.generation;
        true
    }
}

/// State shared by every step of one trace.
struct TraceWork<'a> {
    model: &'a CollisionModel,
    scratch: &'a mut TraceScratch,
    contents: Contents,
    start: Vec3,
    end: Vec3,
    mins: Vec3,
    maxs: Vec3,
    extents: Vec3,
    trace: TraceResult,
}

impl TraceWork<'_> {
    fn trace_to_leaf(&mut self, leafnum: usize) {
        let model = self.model;
        for &brushnum in model.leaf_brush_indices(leafnum) {
            let brushnum = brushnum as usize;
            if !self.scratch.first_visit(brushnum) {
                continue; // already checked this brush in another leaf
            }
            let brush = &model.brushes[brushnum];
            if !brush.contents.intersects(self.contents) {
                continue;
            }
            self.scratch.stats.brush_traces += 1;
            clip_box_to_brush(&self.mins, &self.maxs, &self.start, &self.end, &mut self.trace, brush);
            if self.trace.fraction == 0.0 {
                return;
            }
        }
    }

    fn test_in_leaf(&mut self, leafnum: usize) {
        let model = self.model;
        for &brushnum in model.leaf_brush_indices(leafnum) {
            let brushnum = brushnum as usize;
            if !self.scratch.first_visit(brushnum) {
                continue;
            }
            let brush = &model.brushes[brushnum];
            if !brush.contents.intersects(self.contents) {
                continue;
            }
            self.scratch.stats.brush_traces += 1;
            test_box_in_brush_trace(&self.mins, &self.maxs, &self.start, &mut self.trace, brush);
            if self.trace.fraction == 0.0 {
                return;
            }
        }
    }

    /// Whether the swept box `p1 -> p2` can reach anything inside `bounds`.
    #[inline]
    fn sweep_touches(&self, bounds: &[Vec3; 2], p1: &Vec3, p2: &Vec3) -> bool {
        for i in 0..3 {
            let lo = p1[i].min(p2[i]) + self.mins[i] - NODE_BOUNDS_MARGIN;
            let hi = p1[i].max(p2[i]) + self.maxs[i] + NODE_BOUNDS_MARGIN;
            if hi < bounds[0][i] || lo > bounds[1][i] {
                return false;
            }
        }
        true
    }

    /// Descend from `child` with the part of the sweep between fractions
    /// `p1f` and `p2f`. The side of the plane holding `p1` is visited first;
    /// results merge by smallest fraction, so the order only affects how
    /// early the remaining work is pruned.
    fn recursive_hull_check(&mut self, child: Child, p1f: f32, p2f: f32, p1: &Vec3, p2: &Vec3) {
        if self.trace.fraction <= p1f {
            return; // already hit something nearer
        }

        let num = match child {
            Child::Leaf(l) => {
                self.trace_to_leaf(l as usize);
                return;
            }
            Child::Node(n) => n as usize,
        };

        let model = self.model;
        let node = &model.nodes[num];
        if let Some(bounds) = &node.bounds {
            if !self.sweep_touches(bounds, p1, p2) {
                return;
            }
        }
        let children = node.children;
        let plane = &model.planes[node.plane as usize];

        // find the point distances to the separating plane
        // and the offset for the size of the box
        let (t1, t2, offset) = if plane.is_axial() {
            let pt = plane.plane_type as usize;
            (p1[pt] - plane.dist, p2[pt] - plane.dist, self.extents[pt])
        } else {
            let e = &self.extents;
            (
                dot_product(&plane.normal, p1) - plane.dist,
                dot_product(&plane.normal, p2) - plane.dist,
                (e[0] * plane.normal[0]).abs() + (e[1] * plane.normal[1]).abs() + (e[2] * plane.normal[2]).abs(),
            )
        };

        // see which sides we need to consider
        if t1 >= offset && t2 >= offset {
            self.recursive_hull_check(children[0], p1f, p2f, p1, p2);
            return;
        }
        if t1 < -offset && t2 < -offset {
            self.recursive_hull_check(children[1], p1f, p2f, p1, p2);
            return;
        }

        // put the crosspoint DIST_EPSILON pixels on the near side
        let (side, frac, frac2) = if t1 < t2 {
            let idist = 1.0 / (t1 - t2);
            (
                1usize,
                ((t1 - offset + DIST_EPSILON) * idist).clamp(0.0, 1.0),
                ((t1 + offset + DIST_EPSILON) * idist).clamp(0.0, 1.0),
            )
        } else if t1 > t2 {
            let idist = 1.0 / (t1 - t2);
            (
                0usize,
                ((t1 + offset + DIST_EPSILON) * idist).clamp(0.0, 1.0),
                ((t1 - offset - DIST_EPSILON) * idist).clamp(0.0, 1.0),
            )
        } else {
            (0usize, 1.0, 0.0)
        };

        // move up to the node
        let midf = p1f + (p2f - p1f) * frac;
        let mid = vector_lerp(p1, p2, frac);
        self.recursive_hull_check(children[side], p1f, midf, p1, &mid);

        // go past the node
        let midf2 = p1f + (p2f - p1f) * frac2;
        let mid2 = vector_lerp(p1, p2, frac2);
        self.recursive_hull_check(children[side ^ 1], midf2, p2f, &mid2, p2);
    }
}

// ============================================================
// Box traces
// ============================================================

impl CollisionModel {
    /// Sweep a `mins`/`maxs` box from `start` to `end` through the tree under
    /// `headnode`, clipping against brushes whose contents intersect
    /// `brushmask`.
    ///
    /// `start == end` is a position test: the result is `startsolid`,
    /// `allsolid` and fraction 0 when the box overlaps a brush, otherwise
    /// fraction 1. A zero-size box goes through the same code as any other.
    #[allow(clippy::too_many_arguments)]
    pub fn box_trace(
        &self,
        scratch: &mut TraceScratch,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        headnode: Child,
        brushmask: Contents,
    ) -> TraceResult {
        scratch.begin(self.brushes.len());
        scratch.stats.traces += 1;

        let mut work = TraceWork {
            model: self,
            scratch,
            contents: brushmask,
            start: *start,
            end: *end,
            mins: *mins,
            maxs: *maxs,
            extents: [
                (-mins[0]).max(maxs[0]),
                (-mins[1]).max(maxs[1]),
                (-mins[2]).max(maxs[2]),
            ],
            trace: TraceResult::default(),
        };

        // check for position test special case
        if vector_compare(start, end) {
            work.scratch.stats.position_tests += 1;
            let c1 = [
                start[0] + mins[0] - 1.0,
                start[1] + mins[1] - 1.0,
                start[2] + mins[2] - 1.0,
            ];
            let c2 = [
                start[0] + maxs[0] + 1.0,
                start[1] + maxs[1] + 1.0,
                start[2] + maxs[2] + 1.0,
            ];

            let (leafs, _) = self.box_leafnums(&c1, &c2, headnode, self.config.max_position_leafs);
            for leafnum in leafs {
                work.test_in_leaf(leafnum);
                if work.trace.allsolid {
                    break;
                }
            }
            work.trace.endpos = *start;
            return work.trace;
        }

        work.recursive_hull_check(headnode, 0.0, 1.0, start, end);

        let mut trace = work.trace;
        if trace.fraction == 1.0 {
            trace.endpos = *end;
        } else {
            trace.endpos = vector_lerp(start, end, trace.fraction);
        }
        trace
    }

    /// [`CollisionModel::box_trace`] against an inline model placed at
    /// `origin` and rotated by `angles`. The segment is moved into the
    /// model's frame and the contact normal rotated back out.
    #[allow(clippy::too_many_arguments)]
    pub fn transformed_box_trace(
        &self,
        scratch: &mut TraceScratch,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        headnode: Child,
        brushmask: Contents,
        origin: &Vec3,
        angles: &Vec3,
    ) -> TraceResult {
        // subtract origin offset
        let mut start_l = vector_subtract(start, origin);
        let mut end_l = vector_subtract(end, origin);

        // rotate start and end into the model's frame of reference
        let rotated = !self.box_hull && (angles[0] != 0.0 || angles[1] != 0.0 || angles[2] != 0.0);

        if rotated {
            let (forward, right, up) = angle_vectors(angles);
            start_l = rotate_into(&start_l, &forward, &right, &up);
            end_l = rotate_into(&end_l, &forward, &right, &up);
        }

        let mut trace = self.box_trace(scratch, &start_l, &end_l, mins, maxs, headnode, brushmask);

        if rotated && trace.fraction != 1.0 {
            if let Some(plane) = trace.plane.as_mut() {
                let back = [-angles[0], -angles[1], -angles[2]];
                let (forward, right, up) = angle_vectors(&back);
                *plane = Plane::new(rotate_into(&plane.normal, &forward, &right, &up), plane.dist);
            }
        }

        trace.endpos = vector_lerp(start, end, trace.fraction);
        trace
    }
}

/// One-shot trace with its own scratch. Missing `mins`/`maxs` mean a point.
pub fn trace_box(
    model: &CollisionModel,
    start: &Vec3,
    end: &Vec3,
    mins: Option<&Vec3>,
    maxs: Option<&Vec3>,
    headnode: Child,
    brushmask: Contents,
) -> TraceResult {
    let mut scratch = TraceScratch::new();
    model.box_trace(
        &mut scratch,
        start,
        end,
        mins.unwrap_or(&VEC3_ORIGIN),
        maxs.unwrap_or(&VEC3_ORIGIN),
        headnode,
        brushmask,
    )
}

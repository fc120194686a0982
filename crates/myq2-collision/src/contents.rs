// contents.rs — leaf lookup and contents classification without motion

use rayon::prelude::*;

use crate::clip::box_in_brush;
use crate::cmodel::{Child, CollisionModel};
use crate::flags::Contents;
use crate::plane::{box_on_plane_side, PlaneSide};
use crate::q_shared::{angle_vectors, dot_product, rotate_into, vector_subtract, Vec3, VEC3_ORIGIN};

impl CollisionModel {
    // ============================================================
    // Leaf lookup
    // ============================================================

    /// Leaf containing `p`. Points exactly on a plane go to the front.
    pub fn point_leafnum(&self, p: &Vec3, headnode: Child) -> usize {
        let mut num = headnode;
        loop {
            match num {
                Child::Leaf(l) => return l as usize,
                Child::Node(n) => {
                    let node = &self.nodes[n as usize];
                    let plane = &self.planes[node.plane as usize];
                    let d = if plane.is_axial() {
                        p[plane.plane_type as usize] - plane.dist
                    } else {
                        dot_product(&plane.normal, p) - plane.dist
                    };
                    num = if d < 0.0 { node.children[1] } else { node.children[0] };
                }
            }
        }
    }

    fn box_leafnums_r(
        &self,
        mut num: Child,
        mins: &Vec3,
        maxs: &Vec3,
        max_count: usize,
        list: &mut Vec<usize>,
        topnode: &mut Option<u32>,
    ) {
        loop {
            let n = match num {
                Child::Leaf(l) => {
                    if list.len() < max_count {
                        list.push(l as usize);
                    }
                    return;
                }
                Child::Node(n) => n,
            };

            let node = &self.nodes[n as usize];
            let plane = &self.planes[node.plane as usize];
            match box_on_plane_side(mins, maxs, plane) {
                PlaneSide::Front => num = node.children[0],
                PlaneSide::Back => num = node.children[1],
                PlaneSide::Cross => {
                    // go down both
                    if topnode.is_none() {
                        *topnode = Some(n);
                    }
                    self.box_leafnums_r(node.children[0], mins, maxs, max_count, list, topnode);
                    num = node.children[1];
                }
            }
        }
    }

    /// Leaves touched by the box `mins..maxs` (at most `max_count`, front
    /// before back) and the first node the box straddled, if any.
    pub fn box_leafnums(&self, mins: &Vec3, maxs: &Vec3, headnode: Child, max_count: usize) -> (Vec<usize>, Option<u32>) {
        let mut list = Vec::new();
        let mut topnode = None;
        self.box_leafnums_r(headnode, mins, maxs, max_count, &mut list, &mut topnode);
        (list, topnode)
    }

    // ============================================================
    // Contents
    // ============================================================

    /// Contents at a point: the leaf's own contents plus those of any of its
    /// brushes the point is inside of.
    pub fn point_contents(&self, p: &Vec3, headnode: Child) -> Contents {
        let leafnum = self.point_leafnum(p, headnode);
        let mut contents = self.leaves[leafnum].contents;
        for &b in self.leaf_brush_indices(leafnum) {
            let brush = &self.brushes[b as usize];
            if box_in_brush(p, &VEC3_ORIGIN, &VEC3_ORIGIN, brush) {
                contents |= brush.contents;
            }
        }
        contents
    }

    /// Union of the contents of every leaf the absolute box `mins..maxs`
    /// touches and of every brush in those leaves it overlaps.
    pub fn box_contents(&self, mins: &Vec3, maxs: &Vec3, headnode: Child) -> Contents {
        let (leafs, _) = self.box_leafnums(mins, maxs, headnode, self.config.max_position_leafs);
        let mut contents = Contents::empty();
        for leafnum in leafs {
            contents |= self.leaves[leafnum].contents;
            for &b in self.leaf_brush_indices(leafnum) {
                let brush = &self.brushes[b as usize];
                if box_in_brush(&VEC3_ORIGIN, mins, maxs, brush) {
                    contents |= brush.contents;
                }
            }
        }
        contents
    }

    /// [`CollisionModel::point_contents`] for many points, in input order.
    /// Large batches are split across the rayon pool.
    pub fn point_contents_many(&self, points: &[Vec3], headnode: Child) -> Vec<Contents> {
        if self.config.use_parallel(points.len()) {
            points.par_iter().map(|p| self.point_contents(p, headnode)).collect()
        } else {
            points.iter().map(|p| self.point_contents(p, headnode)).collect()
        }
    }

    /// Point contents against an inline model placed at `origin` and rotated
    /// by `angles`.
    pub fn transformed_point_contents(&self, p: &Vec3, headnode: Child, origin: &Vec3, angles: &Vec3) -> Contents {
        // subtract origin offset
        let mut p_l = vector_subtract(p, origin);

        // rotate start and end into the model's frame of reference
        if !self.box_hull && (angles[0] != 0.0 || angles[1] != 0.0 || angles[2] != 0.0) {
            let (forward, right, up) = angle_vectors(angles);
            p_l = rotate_into(&p_l, &forward, &right, &up);
        }

        self.point_contents(&p_l, headnode)
    }
}

// box_hull.rs — a one-brush model standing in for an axis-aligned box
//
// Entities without brush geometry (monsters, items, players) are clipped
// against as if they were a single brush. The hull is a chain of six nodes,
// one per face, ending in the leaf that holds the brush.

use tracing::trace;

use crate::cmodel::{BModel, Brush, BrushSide, Child, CollisionModel, Leaf, Node};
use crate::config::CollisionConfig;
use crate::flags::{Contents, SurfaceFlags};
use crate::plane::Plane;
use crate::q_shared::Vec3;

impl CollisionModel {
    /// Model for the box `mins..maxs` filled with `contents`. Transformed
    /// queries against it ignore angles: the box is always axis-aligned.
    pub fn from_box(mins: &Vec3, maxs: &Vec3, contents: Contents) -> Self {
        Self::from_box_with_config(mins, maxs, contents, CollisionConfig::default())
    }

    pub fn from_box_with_config(mins: &Vec3, maxs: &Vec3, contents: Contents, config: CollisionConfig) -> Self {
        let mut planes = Vec::with_capacity(12);
        let mut nodes = Vec::with_capacity(6);
        let mut sides = Vec::with_capacity(6);

        for i in 0..6 {
            let axis = i >> 1;
            let side = i & 1;
            // plane pairs: +axis then -axis, at maxs for even i, mins for odd
            let dist = if side == 0 { maxs[axis] } else { mins[axis] };
            let mut normal = [0.0; 3];
            normal[axis] = 1.0;
            let front = Plane::new(normal, dist);
            planes.push(front);
            planes.push(front.flipped());

            let plane_num = (i * 2 + side) as u32;
            sides.push(BrushSide {
                plane: planes[plane_num as usize],
                plane_num,
                surface_flags: SurfaceFlags::empty(),
            });

            let mut children = [Child::Leaf(0); 2];
            children[side ^ 1] = if i == 5 {
                Child::Leaf(1)
            } else {
                Child::Node(i as u32 + 1)
            };
            nodes.push(Node {
                plane: (i * 2) as u32,
                children,
                bounds: None,
            });
        }

        let leaves = vec![
            Leaf {
                contents: Contents::empty(),
                cluster: -1,
                area: 0,
                first_leaf_brush: 0,
                num_leaf_brushes: 0,
            },
            Leaf {
                contents,
                cluster: -1,
                area: 0,
                first_leaf_brush: 0,
                num_leaf_brushes: 1,
            },
        ];

        trace!(?mins, ?maxs, contents = contents.bits(), "box hull");

        Self {
            planes,
            nodes,
            leaves,
            brushes: vec![Brush::new(contents, sides)],
            leaf_brushes: vec![0],
            bmodels: vec![BModel {
                mins: *mins,
                maxs: *maxs,
                origin: [0.0; 3],
                headnode: Child::Node(0),
            }],
            vis: None,
            areas: Vec::new(),
            area_portals: Vec::new(),
            config,
            box_hull: true,
        }
    }

    /// True for models built by [`CollisionModel::from_box`].
    pub fn is_box_hull(&self) -> bool {
        self.box_hull
    }
}

// test_util.rs — small hand-built maps shared by the unit tests

use crate::area::{Area, AreaPortal};
use crate::cmodel::{Brush, BrushLump, BrushSideLump, CollisionLumps, CollisionModel, LeafLump, NodeLump, PlaneLump};
use crate::flags::Contents;
use crate::plane::PLANE_X;
use crate::q_shared::Vec3;
use crate::vis::VisTable;

impl CollisionLumps {
    pub fn into_model(self) -> CollisionModel {
        CollisionModel::from_lumps(self).expect("test lumps must assemble")
    }
}

/// Solid cube of edge `size` centred on the origin.
pub fn axis_brush(size: f32) -> Brush {
    axis_brush_with(size, Contents::SOLID)
}

pub fn axis_brush_with(size: f32, contents: Contents) -> Brush {
    let half = size / 2.0;
    Brush::from_bounds(&[-half; 3], &[half; 3], contents)
}

pub fn brush_from_bounds(mins: &Vec3, maxs: &Vec3) -> Brush {
    Brush::from_bounds(mins, maxs, Contents::SOLID)
}

/// Append every side of `brushes` to the plane and side tables, starting at
/// `lumps.planes.len()`.
fn push_brushes(lumps: &mut CollisionLumps, brushes: &[Brush]) {
    for b in brushes {
        lumps.brushes.push(BrushLump {
            first_side: lumps.brush_sides.len() as u32,
            num_sides: b.sides.len() as u32,
            contents: b.contents.bits(),
        });
        for s in &b.sides {
            lumps.brush_sides.push(BrushSideLump {
                planenum: lumps.planes.len() as u32,
                surface_flags: s.surface_flags.bits(),
            });
            lumps.planes.push(PlaneLump {
                normal: s.plane.normal,
                dist: s.plane.dist,
                plane_type: s.plane.plane_type,
            });
        }
    }
}

fn push_leaf(lumps: &mut CollisionLumps, brushes: &[u32], cluster: i32) {
    lumps.leaves.push(LeafLump {
        contents: 0,
        cluster,
        area: 0,
        first_leaf_brush: lumps.leaf_brushes.len() as u32,
        num_leaf_brushes: brushes.len() as u32,
    });
    lumps.leaf_brushes.extend_from_slice(brushes);
}

/// No nodes: one empty leaf holding every brush.
pub fn leaf_model(brushes: Vec<Brush>) -> CollisionModel {
    let mut lumps = CollisionLumps::default();
    push_brushes(&mut lumps, &brushes);
    let all: Vec<u32> = (0..brushes.len() as u32).collect();
    push_leaf(&mut lumps, &all, -1);
    lumps.into_model()
}

/// One node on the plane x = 0 (plane 0). Leaf 0 is in front, leaf 1 behind;
/// `front` and `back` list the brushes filed in each.
pub fn split_x_lumps(brushes: &[Brush], front: &[u32], back: &[u32]) -> CollisionLumps {
    let mut lumps = CollisionLumps::default();
    lumps.planes.push(PlaneLump {
        normal: [1.0, 0.0, 0.0],
        dist: 0.0,
        plane_type: PLANE_X,
    });
    push_brushes(&mut lumps, brushes);
    lumps.nodes.push(NodeLump {
        planenum: 0,
        children: [-1, -2],
        bounds: None,
    });
    push_leaf(&mut lumps, front, -1);
    push_leaf(&mut lumps, back, -1);
    lumps
}

/// Split at x = 0 with a solid slab from x -64 to -16 behind the plane.
pub fn split_model_lumps() -> CollisionLumps {
    let brush = brush_from_bounds(&[-64.0, -32.0, -32.0], &[-16.0, 32.0, 32.0]);
    split_x_lumps(&[brush], &[], &[0])
}

/// Split at x = 0, leaf 0 in cluster 0 and leaf 1 in cluster 1. Cluster 0
/// only sees itself, cluster 1 sees both; both hear both.
pub fn vis_model() -> CollisionModel {
    let mut lumps = split_x_lumps(&[], &[], &[]);
    lumps.leaves[0].cluster = 0;
    lumps.leaves[1].cluster = 1;
    lumps.visibility = Some(
        VisTable::new(2, &[vec![0x01], vec![0x03]], &[vec![0x03], vec![0x03]]).expect("rows are one byte"),
    );
    lumps.into_model()
}

/// Four areas in a chain. Area 0 is the void; portal 0 joins areas 1 and 2,
/// portal 1 joins areas 2 and 3.
pub fn area_chain_model() -> CollisionModel {
    let mut lumps = split_x_lumps(&[], &[], &[]);
    lumps.areas = vec![
        Area { num_area_portals: 0, first_area_portal: 0 },
        Area { num_area_portals: 1, first_area_portal: 0 },
        Area { num_area_portals: 2, first_area_portal: 1 },
        Area { num_area_portals: 1, first_area_portal: 3 },
    ];
    lumps.area_portals = vec![
        AreaPortal { portal_num: 0, other_area: 2 },
        AreaPortal { portal_num: 0, other_area: 1 },
        AreaPortal { portal_num: 1, other_area: 3 },
        AreaPortal { portal_num: 1, other_area: 2 },
    ];
    lumps.leaves[0].area = 1;
    lumps.leaves[1].area = 2;
    lumps.into_model()
}

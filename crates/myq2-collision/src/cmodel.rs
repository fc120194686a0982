// cmodel.rs — immutable collision model assembled from compiled map tables

use md4::{Digest, Md4};
use rayon::prelude::*;
use tracing::debug;

use crate::area::{Area, AreaPortal};
use crate::config::CollisionConfig;
use crate::error::ModelError;
use crate::flags::{Contents, SurfaceFlags};
use crate::plane::Plane;
use crate::q_shared::Vec3;
use crate::vis::VisTable;

// ============================================================
// Tree structures
// ============================================================

/// Child link of a node. Compiled maps pack this into one integer
/// (non-negative = node, `-(leaf) - 1` = leaf); [`Child::from_raw`] decodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Child {
    Node(u32),
    Leaf(u32),
}

impl Child {
    #[inline]
    pub fn from_raw(raw: i32) -> Self {
        if raw < 0 {
            Child::Leaf((-1 - raw) as u32)
        } else {
            Child::Node(raw as u32)
        }
    }

    #[inline]
    pub fn to_raw(self) -> i32 {
        match self {
            Child::Node(n) => n as i32,
            Child::Leaf(l) => -1 - l as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub plane: u32,
    /// `children[0]` is in front of the plane, `children[1]` behind it.
    pub children: [Child; 2],
    /// Bounds of everything under this node, used only to skip sweeps that
    /// cannot touch it.
    pub bounds: Option<[Vec3; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Leaf {
    pub contents: Contents,
    /// -1 when the leaf belongs to no cluster
    pub cluster: i32,
    pub area: i32,
    pub first_leaf_brush: u32,
    pub num_leaf_brushes: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrushSide {
    pub plane: Plane,
    /// Index of `plane` in the model's plane table.
    pub plane_num: u32,
    pub surface_flags: SurfaceFlags,
}

/// Convex volume: the intersection of the back half-spaces of its sides.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Brush {
    pub contents: Contents,
    pub sides: Vec<BrushSide>,
}

impl Brush {
    pub fn new(contents: Contents, sides: Vec<BrushSide>) -> Self {
        Self { contents, sides }
    }

    /// Six-sided axis-aligned brush. Side order is +X, -X, +Y, -Y, +Z, -Z.
    pub fn from_bounds(mins: &Vec3, maxs: &Vec3, contents: Contents) -> Self {
        let mut sides = Vec::with_capacity(6);
        for axis in 0..3 {
            let mut normal = [0.0; 3];
            normal[axis] = 1.0;
            sides.push(BrushSide {
                plane: Plane::new(normal, maxs[axis]),
                plane_num: (axis * 2) as u32,
                surface_flags: SurfaceFlags::empty(),
            });
            normal[axis] = -1.0;
            sides.push(BrushSide {
                plane: Plane::new(normal, -mins[axis]),
                plane_num: (axis * 2 + 1) as u32,
                surface_flags: SurfaceFlags::empty(),
            });
        }
        Self { contents, sides }
    }
}

/// Inline model. Model 0 is the world; the rest are brush entities that move
/// independently of the static tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BModel {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub origin: Vec3,
    pub headnode: Child,
}

// ============================================================
// Compiler tables
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneLump {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeLump {
    pub planenum: u32,
    /// Legacy encoding: negative values are `-(leaf) - 1`.
    pub children: [i32; 2],
    pub bounds: Option<[Vec3; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafLump {
    pub contents: u32,
    pub cluster: i32,
    pub area: i32,
    pub first_leaf_brush: u32,
    pub num_leaf_brushes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushLump {
    pub first_side: u32,
    pub num_sides: u32,
    pub contents: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushSideLump {
    pub planenum: u32,
    pub surface_flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BModelLump {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub origin: Vec3,
    pub headnode: i32,
}

/// Everything the map compiler hands over, already split into tables.
#[derive(Debug, Clone, Default)]
pub struct CollisionLumps {
    pub planes: Vec<PlaneLump>,
    pub nodes: Vec<NodeLump>,
    pub leaves: Vec<LeafLump>,
    pub brushes: Vec<BrushLump>,
    pub brush_sides: Vec<BrushSideLump>,
    pub leaf_brushes: Vec<u32>,
    pub bmodels: Vec<BModelLump>,
    pub visibility: Option<VisTable>,
    pub areas: Vec<Area>,
    pub area_portals: Vec<AreaPortal>,
}

// ============================================================
// Collision model
// ============================================================

/// Read-only collision geometry for one level. Safe to share between
/// threads; every query takes `&self`.
#[derive(Debug, Clone)]
pub struct CollisionModel {
    pub(crate) planes: Vec<Plane>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) leaves: Vec<Leaf>,
    pub(crate) brushes: Vec<Brush>,
    pub(crate) leaf_brushes: Vec<u32>,
    pub(crate) bmodels: Vec<BModel>,
    pub(crate) vis: Option<VisTable>,
    pub(crate) areas: Vec<Area>,
    pub(crate) area_portals: Vec<AreaPortal>,
    pub(crate) config: CollisionConfig,
    /// Set for models built by `from_box`; those are never rotated.
    pub(crate) box_hull: bool,
}

/// Map `items` through `f`, in parallel when the table is large enough.
fn build_table<T, U, F>(config: &CollisionConfig, items: &[T], f: F) -> Result<Vec<U>, ModelError>
where
    T: Sync,
    U: Send,
    F: Fn(usize, &T) -> Result<U, ModelError> + Sync + Send,
{
    if config.use_parallel(items.len()) {
        items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect()
    } else {
        items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
    }
}

fn check_child(raw: i32, node: usize, child: usize, num_nodes: usize, num_leaves: usize) -> Result<Child, ModelError> {
    match Child::from_raw(raw) {
        Child::Node(n) if n as usize >= num_nodes => Err(ModelError::NodeChild {
            node,
            child,
            target: n as usize,
            count: num_nodes,
        }),
        Child::Leaf(l) if l as usize >= num_leaves => Err(ModelError::NodeLeaf {
            node,
            child,
            target: l as usize,
            count: num_leaves,
        }),
        c => Ok(c),
    }
}

impl CollisionModel {
    /// Assemble a model from compiler tables with the default configuration.
    pub fn from_lumps(lumps: CollisionLumps) -> Result<Self, ModelError> {
        Self::from_lumps_with_config(lumps, CollisionConfig::default())
    }

    pub fn from_lumps_with_config(lumps: CollisionLumps, config: CollisionConfig) -> Result<Self, ModelError> {
        if lumps.leaves.is_empty() {
            return Err(ModelError::NoLeafs);
        }

        let planes = build_table(&config, &lumps.planes, |_, p| {
            Ok(Plane::with_type(p.normal, p.dist, p.plane_type))
        })?;

        let num_nodes = lumps.nodes.len();
        let num_leaves = lumps.leaves.len();
        let nodes = build_table(&config, &lumps.nodes, |i, n| {
            if n.planenum as usize >= planes.len() {
                return Err(ModelError::NodePlane {
                    node: i,
                    plane: n.planenum as usize,
                    count: planes.len(),
                });
            }
            Ok(Node {
                plane: n.planenum,
                children: [
                    check_child(n.children[0], i, 0, num_nodes, num_leaves)?,
                    check_child(n.children[1], i, 1, num_nodes, num_leaves)?,
                ],
                bounds: n.bounds,
            })
        })?;

        let sides = build_table(&config, &lumps.brush_sides, |i, s| {
            let plane = planes.get(s.planenum as usize).ok_or(ModelError::SidePlane {
                side: i,
                plane: s.planenum as usize,
                count: planes.len(),
            })?;
            Ok(BrushSide {
                plane: *plane,
                plane_num: s.planenum,
                surface_flags: SurfaceFlags::from_bits_retain(s.surface_flags),
            })
        })?;

        let brushes = build_table(&config, &lumps.brushes, |i, b| {
            let first = b.first_side as usize;
            let end = first + b.num_sides as usize;
            if end > sides.len() {
                return Err(ModelError::BrushSides {
                    brush: i,
                    first,
                    end,
                    count: sides.len(),
                });
            }
            Ok(Brush {
                contents: Contents::from_bits_retain(b.contents),
                sides: sides[first..end].to_vec(),
            })
        })?;

        for (i, &b) in lumps.leaf_brushes.iter().enumerate() {
            if b as usize >= brushes.len() {
                return Err(ModelError::LeafBrush {
                    index: i,
                    brush: b as usize,
                    count: brushes.len(),
                });
            }
        }

        let num_clusters = lumps.visibility.as_ref().map_or(0, VisTable::num_clusters);
        let num_areas = lumps.areas.len();
        let leaves = build_table(&config, &lumps.leaves, |i, l| {
            let first = l.first_leaf_brush as usize;
            let end = first + l.num_leaf_brushes as usize;
            if end > lumps.leaf_brushes.len() {
                return Err(ModelError::LeafBrushes {
                    leaf: i,
                    first,
                    end,
                    count: lumps.leaf_brushes.len(),
                });
            }
            if l.cluster < -1 || (lumps.visibility.is_some() && l.cluster >= num_clusters as i32) {
                return Err(ModelError::LeafCluster {
                    leaf: i,
                    cluster: l.cluster,
                    count: num_clusters,
                });
            }
            if l.area < 0 || (num_areas > 0 && l.area as usize >= num_areas) {
                return Err(ModelError::LeafArea {
                    leaf: i,
                    area: l.area,
                    count: num_areas,
                });
            }
            Ok(Leaf {
                contents: Contents::from_bits_retain(l.contents),
                cluster: l.cluster,
                area: l.area,
                first_leaf_brush: l.first_leaf_brush,
                num_leaf_brushes: l.num_leaf_brushes,
            })
        })?;

        let mut bmodels = lumps
            .bmodels
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let bad = ModelError::ModelHeadnode {
                    model: i,
                    headnode: m.headnode,
                };
                let headnode = check_child(m.headnode, i, 0, num_nodes, num_leaves).map_err(|_| bad)?;
                Ok(BModel {
                    mins: m.mins,
                    maxs: m.maxs,
                    origin: m.origin,
                    headnode,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        if bmodels.is_empty() {
            // no submodel table, the world is the whole tree
            bmodels.push(BModel {
                mins: [0.0; 3],
                maxs: [0.0; 3],
                origin: [0.0; 3],
                headnode: if num_nodes > 0 { Child::Node(0) } else { Child::Leaf(0) },
            });
        }

        crate::area::validate(&lumps.areas, &lumps.area_portals)?;

        let model = Self {
            planes,
            nodes,
            leaves,
            brushes,
            leaf_brushes: lumps.leaf_brushes,
            bmodels,
            vis: lumps.visibility,
            areas: lumps.areas,
            area_portals: lumps.area_portals,
            config,
            box_hull: false,
        };

        debug!(
            planes = model.planes.len(),
            nodes = model.nodes.len(),
            leafs = model.leaves.len(),
            brushes = model.brushes.len(),
            clusters = model.num_clusters(),
            areas = model.areas.len(),
            "collision model assembled"
        );

        Ok(model)
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn brushes(&self) -> &[Brush] {
        &self.brushes
    }

    pub fn leaf_brushes(&self) -> &[u32] {
        &self.leaf_brushes
    }

    pub fn bmodels(&self) -> &[BModel] {
        &self.bmodels
    }

    pub fn vis(&self) -> Option<&VisTable> {
        self.vis.as_ref()
    }

    pub fn num_leafs(&self) -> usize {
        self.leaves.len()
    }

    pub fn num_clusters(&self) -> usize {
        self.vis.as_ref().map_or(0, VisTable::num_clusters)
    }

    pub fn num_inline_models(&self) -> usize {
        self.bmodels.len()
    }

    /// Headnode of the world (inline model 0).
    pub fn world_headnode(&self) -> Child {
        self.bmodels[0].headnode
    }

    pub fn inline_model(&self, index: usize) -> &BModel {
        match self.bmodels.get(index) {
            Some(m) => m,
            None => panic!("inline_model: bad number {}", index),
        }
    }

    #[inline]
    pub(crate) fn leaf(&self, leafnum: usize) -> &Leaf {
        match self.leaves.get(leafnum) {
            Some(l) => l,
            None => panic!("leaf: bad number {} (have {})", leafnum, self.leaves.len()),
        }
    }

    pub fn leaf_contents(&self, leafnum: usize) -> Contents {
        self.leaf(leafnum).contents
    }

    pub fn leaf_cluster(&self, leafnum: usize) -> i32 {
        self.leaf(leafnum).cluster
    }

    pub fn leaf_area(&self, leafnum: usize) -> i32 {
        self.leaf(leafnum).area
    }

    /// Brush indices touching a leaf, in compiler order.
    #[inline]
    pub fn leaf_brush_indices(&self, leafnum: usize) -> &[u32] {
        let leaf = self.leaf(leafnum);
        let first = leaf.first_leaf_brush as usize;
        &self.leaf_brushes[first..first + leaf.num_leaf_brushes as usize]
    }

    // ============================================================
    // Checksum
    // ============================================================

    /// MD4 block checksum over the collision tables, so two peers can confirm
    /// they loaded identical geometry. Visibility and areas are not included.
    pub fn checksum(&self) -> u32 {
        let mut hasher = Md4::new();

        for p in &self.planes {
            for n in p.normal {
                hasher.update(n.to_le_bytes());
            }
            hasher.update(p.dist.to_le_bytes());
            hasher.update([p.plane_type]);
        }
        for n in &self.nodes {
            hasher.update(n.plane.to_le_bytes());
            hasher.update(n.children[0].to_raw().to_le_bytes());
            hasher.update(n.children[1].to_raw().to_le_bytes());
        }
        for l in &self.leaves {
            hasher.update(l.contents.bits().to_le_bytes());
            hasher.update(l.cluster.to_le_bytes());
            hasher.update(l.area.to_le_bytes());
            hasher.update(l.first_leaf_brush.to_le_bytes());
            hasher.update(l.num_leaf_brushes.to_le_bytes());
        }
        for b in &self.brushes {
            hasher.update(b.contents.bits().to_le_bytes());
            hasher.update((b.sides.len() as u32).to_le_bytes());
            for s in &b.sides {
                hasher.update(s.plane_num.to_le_bytes());
                hasher.update(s.surface_flags.bits().to_le_bytes());
            }
        }
        for lb in &self.leaf_brushes {
            hasher.update(lb.to_le_bytes());
        }
        for m in &self.bmodels {
            for v in [m.mins, m.maxs, m.origin] {
                for c in v {
                    hasher.update(c.to_le_bytes());
                }
            }
            hasher.update(m.headnode.to_raw().to_le_bytes());
        }

        let digest = hasher.finalize();
        digest
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .fold(0, |acc, w| acc ^ w)
    }
}

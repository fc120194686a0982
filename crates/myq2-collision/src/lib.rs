#![allow(clippy::float_cmp, clippy::needless_range_loop, clippy::manual_range_contains,
         clippy::comparison_chain)]

//! Brush collision for a compiled BSP map: swept box traces, contents
//! queries, PVS/PHS lookups, area portals and stuck-box recovery.
//!
//! A [`CollisionModel`] is assembled once per level and never changes; every
//! query takes `&self`. Traces write only to a caller-owned [`TraceScratch`].

pub mod q_shared;
pub mod flags;
pub mod config;
pub mod error;
pub mod plane;
pub mod cmodel;
pub mod box_hull;
pub mod clip;
pub mod trace;
pub mod contents;
pub mod vis;
pub mod area;
pub mod stuck;

#[cfg(test)]
mod test_util;

pub use area::{Area, AreaPortal, PortalState};
pub use clip::{clip_box_to_brush, point_inside_brush, test_box_in_brush, BoxBrushTest, DIST_EPSILON};
pub use cmodel::{
    BModel, BModelLump, Brush, BrushLump, BrushSide, BrushSideLump, Child, CollisionLumps, CollisionModel, Leaf,
    LeafLump, Node, NodeLump, PlaneLump,
};
pub use config::CollisionConfig;
pub use error::ModelError;
pub use flags::{Contents, SurfaceFlags};
pub use plane::{Plane, PlaneSide};
pub use q_shared::Vec3;
pub use stuck::{fix_stuck_object_generic, StuckOutcome, StuckResult, StuckTrace};
pub use trace::{trace_box, TraceResult, TraceScratch, TraceStats};
pub use vis::VisTable;

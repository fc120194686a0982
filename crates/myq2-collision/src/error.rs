// error.rs — failures while assembling a collision model from compiler output

use thiserror::Error;

/// Raised by `CollisionModel::from_lumps` when the compiler tables are not
/// internally consistent. Queries against an assembled model never fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("map has no leafs")]
    NoLeafs,
    #[error("node {node} references plane {plane} (have {count})")]
    NodePlane { node: usize, plane: usize, count: usize },
    #[error("node {node} child {child} references node {target} (have {count})")]
    NodeChild { node: usize, child: usize, target: usize, count: usize },
    #[error("node {node} child {child} references leaf {target} (have {count})")]
    NodeLeaf { node: usize, child: usize, target: usize, count: usize },
    #[error("brush {brush} sides {first}..{end} out of range (have {count} brushsides)")]
    BrushSides { brush: usize, first: usize, end: usize, count: usize },
    #[error("brushside {side} references plane {plane} (have {count})")]
    SidePlane { side: usize, plane: usize, count: usize },
    #[error("leaf {leaf} leafbrushes {first}..{end} out of range (have {count})")]
    LeafBrushes { leaf: usize, first: usize, end: usize, count: usize },
    #[error("leafbrush {index} references brush {brush} (have {count})")]
    LeafBrush { index: usize, brush: usize, count: usize },
    #[error("leaf {leaf} has cluster {cluster} (have {count} clusters)")]
    LeafCluster { leaf: usize, cluster: i32, count: usize },
    #[error("leaf {leaf} has area {area} (have {count} areas)")]
    LeafArea { leaf: usize, area: i32, count: usize },
    #[error("bmodel {model} headnode {headnode} is not a valid node or leaf")]
    ModelHeadnode { model: usize, headnode: i32 },
    #[error("visibility lump is {len} bytes, too short for its header")]
    VisHeader { len: usize },
    #[error("cluster {cluster} {kind} row is {len} bytes, expected {expected}")]
    VisRow { cluster: usize, kind: &'static str, len: usize, expected: usize },
    #[error("cluster {cluster} {kind} offset {offset} past end of visibility data ({len} bytes)")]
    VisOffset { cluster: usize, kind: &'static str, offset: usize, len: usize },
    #[error("area {area} portals {first}..{end} out of range (have {count})")]
    AreaPortals { area: usize, first: usize, end: usize, count: usize },
    #[error("area portal {index} leads to area {other} (have {count} areas)")]
    PortalArea { index: usize, other: usize, count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_bad_index() {
        let e = ModelError::NodePlane { node: 3, plane: 99, count: 10 };
        assert_eq!(e.to_string(), "node 3 references plane 99 (have 10)");

        let e = ModelError::VisRow { cluster: 1, kind: "pvs", len: 1, expected: 2 };
        assert!(e.to_string().contains("pvs row is 1 bytes"));
    }
}

// vis.rs — potentially visible / hearable cluster sets
//
// Rows are expanded once when the table is built, so a query is a single bit
// test.

use tracing::warn;

use crate::area::PortalState;
use crate::cmodel::{Child, CollisionModel};
use crate::error::ModelError;
use crate::q_shared::Vec3;

pub const DVIS_PVS: usize = 0;
pub const DVIS_PHS: usize = 1;

/// Expanded PVS and PHS rows, one bit per cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisTable {
    num_clusters: usize,
    row_bytes: usize,
    /// `num_clusters * row_bytes`, row-major
    pvs: Vec<u8>,
    phs: Vec<u8>,
    /// returned for the "no cluster" sentinel
    empty_row: Vec<u8>,
}

#[inline]
fn row_bytes_for(num_clusters: usize) -> usize {
    (num_clusters + 7) >> 3
}

#[inline]
fn test_bit(row: &[u8], cluster: usize) -> bool {
    row[cluster >> 3] & (1 << (cluster & 7)) != 0
}

/// Expand one run-length compressed row starting at `offset`. Zero bytes are
/// followed by a count of zero bytes to emit. Returns false when the data
/// ran past the row or the end of the input.
fn decompress_vis(data: &[u8], offset: usize, out: &mut [u8]) -> bool {
    let row = out.len();
    let mut out_p = 0;
    let mut inp = offset;

    while out_p < row {
        let Some(&b) = data.get(inp) else {
            return false;
        };
        if b != 0 {
            out[out_p] = b;
            out_p += 1;
            inp += 1;
            continue;
        }

        let Some(&count) = data.get(inp + 1) else {
            return false;
        };
        inp += 2;
        let c = count as usize;
        if out_p + c > row {
            // out is pre-zeroed
            return false;
        }
        out_p += c;
    }
    true
}

impl VisTable {
    /// Table from already expanded rows, one per cluster for each set.
    pub fn new(num_clusters: usize, pvs_rows: &[Vec<u8>], phs_rows: &[Vec<u8>]) -> Result<Self, ModelError> {
        let row_bytes = row_bytes_for(num_clusters);
        let mut pvs = Vec::with_capacity(num_clusters * row_bytes);
        let mut phs = Vec::with_capacity(num_clusters * row_bytes);

        for (kind, rows, out) in [("pvs", pvs_rows, &mut pvs), ("phs", phs_rows, &mut phs)] {
            if rows.len() != num_clusters {
                return Err(ModelError::VisRow {
                    cluster: rows.len(),
                    kind,
                    len: 0,
                    expected: row_bytes,
                });
            }
            for (cluster, row) in rows.iter().enumerate() {
                if row.len() != row_bytes {
                    return Err(ModelError::VisRow {
                        cluster,
                        kind,
                        len: row.len(),
                        expected: row_bytes,
                    });
                }
                out.extend_from_slice(row);
            }
        }

        Ok(Self {
            num_clusters,
            row_bytes,
            pvs,
            phs,
            empty_row: vec![0; row_bytes],
        })
    }

    /// Every cluster sees and hears every other cluster.
    pub fn all_visible(num_clusters: usize) -> Self {
        let row_bytes = row_bytes_for(num_clusters);
        Self {
            num_clusters,
            row_bytes,
            pvs: vec![0xff; num_clusters * row_bytes],
            phs: vec![0xff; num_clusters * row_bytes],
            empty_row: vec![0; row_bytes],
        }
    }

    /// Expand compressed rows. `bitofs[cluster]` holds the PVS and PHS byte
    /// offsets into `data`; an offset of 0 means the row is all visible.
    pub fn from_compressed(bitofs: &[[u32; 2]], data: &[u8]) -> Result<Self, ModelError> {
        let num_clusters = bitofs.len();
        let row_bytes = row_bytes_for(num_clusters);
        let mut pvs = vec![0u8; num_clusters * row_bytes];
        let mut phs = vec![0u8; num_clusters * row_bytes];

        for (cluster, ofs) in bitofs.iter().enumerate() {
            for (set, kind) in [(DVIS_PVS, "pvs"), (DVIS_PHS, "phs")] {
                let offset = ofs[set] as usize;
                let out = match set {
                    DVIS_PVS => &mut pvs[cluster * row_bytes..(cluster + 1) * row_bytes],
                    _ => &mut phs[cluster * row_bytes..(cluster + 1) * row_bytes],
                };
                if offset == 0 {
                    out.fill(0xff);
                    continue;
                }
                if offset >= data.len() {
                    return Err(ModelError::VisOffset {
                        cluster,
                        kind,
                        offset,
                        len: data.len(),
                    });
                }
                if !decompress_vis(data, offset, out) {
                    warn!(cluster, kind, "vis decompression overrun");
                }
            }
        }

        Ok(Self {
            num_clusters,
            row_bytes,
            pvs,
            phs,
            empty_row: vec![0; row_bytes],
        })
    }

    /// Parse a compiled visibility lump: cluster count, then a PVS/PHS offset
    /// pair per cluster (all little-endian `i32`), then the compressed rows.
    pub fn from_lump(data: &[u8]) -> Result<Self, ModelError> {
        let read = |at: usize| -> Option<u32> {
            let b = data.get(at..at + 4)?;
            Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        };
        let header_err = ModelError::VisHeader { len: data.len() };

        let num_clusters = read(0).ok_or(header_err.clone())? as usize;
        let mut bitofs = Vec::with_capacity(num_clusters.min(data.len() / 8));
        for i in 0..num_clusters {
            let base = 4 + i * 8;
            let pvs = read(base).ok_or(header_err.clone())?;
            let phs = read(base + 4).ok_or(header_err.clone())?;
            bitofs.push([pvs, phs]);
        }
        Self::from_compressed(&bitofs, data)
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    fn row<'a>(&'a self, rows: &'a [u8], cluster: i32) -> &'a [u8] {
        if cluster == -1 {
            return &self.empty_row;
        }
        if cluster < 0 || cluster as usize >= self.num_clusters {
            panic!("cluster_row: bad cluster {} (have {})", cluster, self.num_clusters);
        }
        let c = cluster as usize;
        &rows[c * self.row_bytes..(c + 1) * self.row_bytes]
    }

    /// PVS row of `cluster`. The "no cluster" value -1 yields an empty row.
    pub fn cluster_pvs(&self, cluster: i32) -> &[u8] {
        self.row(&self.pvs, cluster)
    }

    pub fn cluster_phs(&self, cluster: i32) -> &[u8] {
        self.row(&self.phs, cluster)
    }

    /// Whether cluster `b` is set in `a`'s PVS row. Either cluster being -1
    /// counts as visible.
    pub fn can_see(&self, a: i32, b: i32) -> bool {
        if a == -1 || b == -1 {
            return true;
        }
        let row = self.cluster_pvs(a);
        test_bit(row, self.checked(b))
    }

    pub fn can_hear(&self, a: i32, b: i32) -> bool {
        if a == -1 || b == -1 {
            return true;
        }
        let row = self.cluster_phs(a);
        test_bit(row, self.checked(b))
    }

    #[inline]
    fn checked(&self, cluster: i32) -> usize {
        if cluster < 0 || cluster as usize >= self.num_clusters {
            panic!("cluster_row: bad cluster {} (have {})", cluster, self.num_clusters);
        }
        cluster as usize
    }
}

// ============================================================
// Model queries
// ============================================================

impl CollisionModel {
    /// PVS row for `cluster`, or `None` when the map carries no visibility.
    pub fn cluster_pvs(&self, cluster: i32) -> Option<&[u8]> {
        self.vis.as_ref().map(|v| v.cluster_pvs(cluster))
    }

    pub fn cluster_phs(&self, cluster: i32) -> Option<&[u8]> {
        self.vis.as_ref().map(|v| v.cluster_phs(cluster))
    }

    /// Whether leaf `b` is potentially visible from leaf `a`. Leaves without a
    /// cluster, and maps without visibility, are visible from everywhere.
    pub fn in_pvs(&self, leaf_a: usize, leaf_b: usize) -> bool {
        let ca = self.leaf_cluster(leaf_a);
        let cb = self.leaf_cluster(leaf_b);
        match &self.vis {
            Some(vis) => vis.can_see(ca, cb),
            None => true,
        }
    }

    pub fn in_phs(&self, leaf_a: usize, leaf_b: usize) -> bool {
        let ca = self.leaf_cluster(leaf_a);
        let cb = self.leaf_cluster(leaf_b);
        match &self.vis {
            Some(vis) => vis.can_hear(ca, cb),
            None => true,
        }
    }

    /// World-space PVS test. When `portals` is given, the two points must
    /// also be in connected areas (a closed door blocks sight).
    pub fn in_pvs_points(&self, p1: &Vec3, p2: &Vec3, portals: Option<&PortalState>) -> bool {
        let headnode = self.world_headnode();
        let l1 = self.point_leafnum(p1, headnode);
        let l2 = self.point_leafnum(p2, headnode);
        if !self.in_pvs(l1, l2) {
            return false;
        }
        self.points_areas_connected(l1, l2, portals)
    }

    pub fn in_phs_points(&self, p1: &Vec3, p2: &Vec3, portals: Option<&PortalState>) -> bool {
        let headnode = self.world_headnode();
        let l1 = self.point_leafnum(p1, headnode);
        let l2 = self.point_leafnum(p2, headnode);
        if !self.in_phs(l1, l2) {
            return false;
        }
        self.points_areas_connected(l1, l2, portals)
    }

    fn points_areas_connected(&self, l1: usize, l2: usize, portals: Option<&PortalState>) -> bool {
        match portals {
            Some(state) => state.areas_connected(self.leaf_area(l1) as usize, self.leaf_area(l2) as usize),
            None => true,
        }
    }

    /// Whether any leaf under `node` has its cluster set in `visbits`.
    /// Leaves without a cluster never match.
    pub fn headnode_visible(&self, node: Child, visbits: &[u8]) -> bool {
        match node {
            Child::Leaf(l) => {
                let cluster = self.leaf_cluster(l as usize);
                if cluster == -1 {
                    return false;
                }
                let byte_idx = (cluster >> 3) as usize;
                byte_idx < visbits.len() && visbits[byte_idx] & (1 << (cluster & 7)) != 0
            }
            Child::Node(n) => {
                let children = self.nodes[n as usize].children;
                self.headnode_visible(children[0], visbits) || self.headnode_visible(children[1], visbits)
            }
        }
    }
}

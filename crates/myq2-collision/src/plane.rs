// plane.rs — split/side planes and the point/box side tests built on them

use crate::q_shared::{dot_product, Vec3};

// plane_t structure types
// 0-2 are axial planes with a positive unit normal
pub const PLANE_X: u8 = 0;
pub const PLANE_Y: u8 = 1;
pub const PLANE_Z: u8 = 2;

// 3-5 are non-axial planes snapped to the nearest axis
pub const PLANE_ANYX: u8 = 3;
pub const PLANE_ANYY: u8 = 4;
pub const PLANE_ANYZ: u8 = 5;

/// A plane `dot(normal, p) == dist`. `signbits` has bit i set when
/// `normal[i] < 0` and is computed once when the plane is built.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8,
}

impl Plane {
    pub fn new(normal: Vec3, dist: f32) -> Self {
        Self {
            normal,
            dist,
            plane_type: plane_type_for_normal(&normal),
            signbits: signbits_for_normal(&normal),
        }
    }

    /// Plane with a type tag supplied by the map compiler. An axial tag on a
    /// normal that is not the positive unit axis is demoted to the matching
    /// non-axial tag, since the axial fast paths read `p[type] - dist`.
    pub fn with_type(normal: Vec3, dist: f32, plane_type: u8) -> Self {
        let plane_type = if plane_type < 3 && normal[plane_type as usize] != 1.0 {
            plane_type + 3
        } else if plane_type > PLANE_ANYZ {
            plane_type_for_normal(&normal)
        } else {
            plane_type
        };
        Self {
            normal,
            dist,
            plane_type,
            signbits: signbits_for_normal(&normal),
        }
    }

    #[inline]
    pub fn is_axial(&self) -> bool {
        self.plane_type < 3
    }

    /// Plane facing the other way: same surface, negated normal and distance.
    pub fn flipped(&self) -> Self {
        Self::new(
            [-self.normal[0], -self.normal[1], -self.normal[2]],
            -self.dist,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlaneSide {
    Front = 1,
    Back = 2,
    Cross = 3,
}

impl PlaneSide {
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    #[inline]
    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => PlaneSide::Front,
            2 => PlaneSide::Back,
            _ => PlaneSide::Cross,
        }
    }
}

// ============================================================
// Plane classification
// ============================================================

pub fn signbits_for_normal(normal: &Vec3) -> u8 {
    let mut bits = 0;
    for (j, n) in normal.iter().enumerate() {
        if *n < 0.0 {
            bits |= 1 << j;
        }
    }
    bits
}

pub fn plane_type_for_normal(normal: &Vec3) -> u8 {
    if normal[0] == 1.0 {
        return PLANE_X;
    }
    if normal[1] == 1.0 {
        return PLANE_Y;
    }
    if normal[2] == 1.0 {
        return PLANE_Z;
    }

    let ax = normal[0].abs();
    let ay = normal[1].abs();
    let az = normal[2].abs();
    if ax >= ay && ax >= az {
        PLANE_ANYX
    } else if ay >= ax && ay >= az {
        PLANE_ANYY
    } else {
        PLANE_ANYZ
    }
}

#[inline]
pub fn plane_distance_to_point(plane: &Plane, point: &Vec3) -> f32 {
    dot_product(&plane.normal, point) - plane.dist
}

/// Side of `plane` that `point` is on. Points within `epsilon` of the plane
/// are reported as `Cross`.
pub fn point_on_plane_side(plane: &Plane, point: &Vec3, epsilon: f32) -> PlaneSide {
    let d = plane_distance_to_point(plane, point);
    if d > epsilon {
        PlaneSide::Front
    } else if d < -epsilon {
        PlaneSide::Back
    } else {
        PlaneSide::Cross
    }
}

/// Classify an axis-aligned box against a plane.
///
/// The sign bits pick, per axis, the bound that is furthest along the normal
/// (`dist1`) and the one furthest against it (`dist2`), so only the two
/// extreme corners are ever evaluated.
pub fn box_on_plane_side(emins: &Vec3, emaxs: &Vec3, p: &Plane) -> PlaneSide {
    // fast axial cases
    if p.is_axial() {
        let t = p.plane_type as usize;
        if p.dist <= emins[t] {
            return PlaneSide::Front;
        }
        if p.dist >= emaxs[t] {
            return PlaneSide::Back;
        }
        return PlaneSide::Cross;
    }

    // general case
    let bounds = [emaxs, emins];
    let s = p.signbits as usize;
    let (x, y, z) = (s & 1, (s >> 1) & 1, (s >> 2) & 1);
    let dist1 = p.normal[0] * bounds[x][0] + p.normal[1] * bounds[y][1] + p.normal[2] * bounds[z][2];
    let dist2 = p.normal[0] * bounds[x ^ 1][0]
        + p.normal[1] * bounds[y ^ 1][1]
        + p.normal[2] * bounds[z ^ 1][2];

    let mut sides = 0;
    if dist1 >= p.dist {
        sides = 1;
    }
    if dist2 < p.dist {
        sides |= 2;
    }
    PlaneSide::from_bits(sides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signbits_match_negative_components() {
        for bits in 0u8..8 {
            let normal = [
                if bits & 1 != 0 { -0.5 } else { 0.5 },
                if bits & 2 != 0 { -0.5 } else { 0.5 },
                if bits & 4 != 0 { -0.70710677 } else { 0.70710677 },
            ];
            assert_eq!(signbits_for_normal(&normal), bits);
        }
        // negative zero is not negative
        assert_eq!(signbits_for_normal(&[-0.0, 0.0, 1.0]), 0);
    }

    #[test]
    fn test_plane_type() {
        assert_eq!(plane_type_for_normal(&[1.0, 0.0, 0.0]), PLANE_X);
        assert_eq!(plane_type_for_normal(&[0.0, 1.0, 0.0]), PLANE_Y);
        assert_eq!(plane_type_for_normal(&[0.0, 0.0, 1.0]), PLANE_Z);
        assert_eq!(plane_type_for_normal(&[-1.0, 0.0, 0.0]), PLANE_ANYX);
        assert_eq!(plane_type_for_normal(&[0.0, 0.0, -1.0]), PLANE_ANYZ);
        assert_eq!(plane_type_for_normal(&[0.6, 0.8, 0.0]), PLANE_ANYY);
    }

    #[test]
    fn test_with_type_demotes_negative_axial() {
        let p = Plane::with_type([-1.0, 0.0, 0.0], 8.0, PLANE_X);
        assert_eq!(p.plane_type, PLANE_ANYX);
        assert_eq!(p.signbits, 1);

        let p = Plane::with_type([0.0, 1.0, 0.0], 8.0, PLANE_Y);
        assert!(p.is_axial());
    }

    #[test]
    fn test_point_on_plane_side_epsilon() {
        let plane = Plane::new([1.0, 0.0, 0.0], 0.0);
        assert_eq!(point_on_plane_side(&plane, &[1.0, 0.0, 0.0], 0.01), PlaneSide::Front);
        assert_eq!(point_on_plane_side(&plane, &[-2.0, 0.0, 0.0], 0.01), PlaneSide::Back);
        assert_eq!(point_on_plane_side(&plane, &[0.005, 0.0, 0.0], 0.01), PlaneSide::Cross);
        assert_eq!(plane_distance_to_point(&plane, &[3.0, 9.0, 9.0]), 3.0);
    }

    // ============================================================
    // box_on_plane_side
    // ============================================================

    #[test]
    fn test_box_axial() {
        let plane = Plane::new([1.0, 0.0, 0.0], 0.0);
        let side = |lo: f32, hi: f32| {
            box_on_plane_side(&[lo, -1.0, -1.0], &[hi, 1.0, 1.0], &plane)
        };
        assert_eq!(side(1.0, 2.0), PlaneSide::Front);
        assert_eq!(side(-2.0, -1.0), PlaneSide::Back);
        assert_eq!(side(-1.0, 1.0), PlaneSide::Cross);
        // touching counts as front on the low side, back on the high side
        assert_eq!(side(0.0, 1.0), PlaneSide::Front);
        assert_eq!(side(-1.0, 0.0), PlaneSide::Back);
    }

    #[test]
    fn test_box_general_agrees_with_all_corners() {
        let normals: [Vec3; 4] = [
            [0.6, 0.8, 0.0],
            [-0.6, 0.0, 0.8],
            [0.0, -0.8, -0.6],
            [-0.57735026, -0.57735026, -0.57735026],
        ];
        let boxes: [(Vec3, Vec3); 3] = [
            ([-4.0, -4.0, -4.0], [4.0, 4.0, 4.0]),
            ([10.0, 10.0, 10.0], [12.0, 14.0, 16.0]),
            ([-30.0, -20.0, -10.0], [-25.0, -15.0, -5.0]),
        ];
        for n in normals {
            let plane = Plane::new(n, 1.0);
            assert!(!plane.is_axial());
            for (mins, maxs) in boxes {
                let mut front = false;
                let mut back = false;
                for c in 0..8 {
                    let corner = [
                        if c & 1 != 0 { maxs[0] } else { mins[0] },
                        if c & 2 != 0 { maxs[1] } else { mins[1] },
                        if c & 4 != 0 { maxs[2] } else { mins[2] },
                    ];
                    let d = plane_distance_to_point(&plane, &corner);
                    front |= d >= 0.0;
                    back |= d < 0.0;
                }
                let expected = (front as u8) | ((back as u8) << 1);
                assert_eq!(
                    box_on_plane_side(&mins, &maxs, &plane).bits(),
                    expected,
                    "normal {:?} box {:?}..{:?}",
                    n,
                    mins,
                    maxs
                );
            }
        }
    }

    #[test]
    fn test_flipped() {
        let p = Plane::new([0.0, 0.0, 1.0], 16.0);
        let f = p.flipped();
        assert_eq!(f.normal, [0.0, 0.0, -1.0]);
        assert_eq!(f.dist, -16.0);
        assert_eq!(f.signbits, 4);
        assert_eq!(f.plane_type, PLANE_ANYZ);
    }
}

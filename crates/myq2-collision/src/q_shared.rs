// q_shared.rs — vector math shared by every collision query

pub type Vec3 = [f32; 3];

pub const VEC3_ORIGIN: Vec3 = [0.0, 0.0, 0.0];

pub const PITCH: usize = 0;
pub const YAW: usize = 1;
pub const ROLL: usize = 2;

// ============================================================
// Vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

/// veca + scale * vecb
#[inline]
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

/// Point at `frac` along the segment `p1 -> p2`, computed per axis as
/// `p1 + frac * (p2 - p1)` so every caller rounds identically.
#[inline]
pub fn vector_lerp(p1: &Vec3, p2: &Vec3, frac: f32) -> Vec3 {
    [
        p1[0] + frac * (p2[0] - p1[0]),
        p1[1] + frac * (p2[1] - p1[1]),
        p1[2] + frac * (p2[2] - p1[2]),
    ]
}

#[inline]
pub fn vector_compare(v1: &Vec3, v2: &Vec3) -> bool {
    v1[0] == v2[0] && v1[1] == v2[1] && v1[2] == v2[2]
}

#[inline]
pub fn vector_is_zero(v: &Vec3) -> bool {
    v[0] == 0.0 && v[1] == 0.0 && v[2] == 0.0
}

pub fn vector_length_squared(v: &Vec3) -> f32 {
    v[0] * v[0] + v[1] * v[1] + v[2] * v[2]
}

pub fn vector_length(v: &Vec3) -> f32 {
    vector_length_squared(v).sqrt()
}

// ============================================================
// Angle functions
// ============================================================

/// Forward, right and up vectors for a pitch/yaw/roll triple in degrees.
pub fn angle_vectors(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let angle_yaw = angles[YAW].to_radians();
    let sy = angle_yaw.sin();
    let cy = angle_yaw.cos();

    let angle_pitch = angles[PITCH].to_radians();
    let sp = angle_pitch.sin();
    let cp = angle_pitch.cos();

    let angle_roll = angles[ROLL].to_radians();
    let sr = angle_roll.sin();
    let cr = angle_roll.cos();

    let forward = [cp * cy, cp * sy, -sp];
    let right = [
        -sr * sp * cy + -cr * -sy,
        -sr * sp * sy + -cr * cy,
        -sr * cp,
    ];
    let up = [
        cr * sp * cy + -sr * -sy,
        cr * sp * sy + -sr * cy,
        cr * cp,
    ];
    (forward, right, up)
}

/// Express `v` in the basis produced by [`angle_vectors`]. Used to move world
/// points into a rotated brush model's local frame (and back, with negated
/// angles).
pub fn rotate_into(v: &Vec3, forward: &Vec3, right: &Vec3, up: &Vec3) -> Vec3 {
    [
        dot_product(v, forward),
        -dot_product(v, right),
        dot_product(v, up),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let a = [1.0, 2.0, 3.0];
        let b = [5.0, -2.0, 7.0];
        assert_eq!(vector_lerp(&a, &b, 0.0), a);
        assert_eq!(vector_lerp(&a, &b, 1.0), b);
        assert_eq!(vector_lerp(&a, &b, 0.5), [3.0, 0.0, 5.0]);
    }

    #[test]
    fn test_angle_vectors_identity() {
        let (f, r, u) = angle_vectors(&VEC3_ORIGIN);
        assert_eq!(f, [1.0, 0.0, 0.0]);
        assert!((r[1] + 1.0).abs() < 1e-6);
        assert_eq!(u, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rotate_into_identity_is_noop() {
        let (f, r, u) = angle_vectors(&VEC3_ORIGIN);
        let p = [12.0, -7.0, 3.5];
        let q = rotate_into(&p, &f, &r, &u);
        for i in 0..3 {
            assert!((p[i] - q[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rotate_round_trip_yaw() {
        let angles = [0.0, 90.0, 0.0];
        let (f, r, u) = angle_vectors(&angles);
        let p = [10.0, 0.0, 0.0];
        let local = rotate_into(&p, &f, &r, &u);
        assert!((local[0]).abs() < 1e-4);
        assert!((local[1] + 10.0).abs() < 1e-4);

        let back_angles = [-angles[0], -angles[1], -angles[2]];
        let (bf, br, bu) = angle_vectors(&back_angles);
        let world = rotate_into(&local, &bf, &br, &bu);
        for i in 0..3 {
            assert!((world[i] - p[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_length_squared() {
        assert_eq!(vector_length_squared(&[3.0, 4.0, 0.0]), 25.0);
        assert_eq!(vector_length(&[3.0, 4.0, 0.0]), 5.0);
    }
}

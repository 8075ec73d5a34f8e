//! Geometric utilities for mesh assembly

use nalgebra::Vector3;

pub type Vec3 = Vector3<f64>;

/// Vectors shorter than this are treated as zero length
pub const ZERO_LENGTH: f64 = 1.0e-12;

/// Convert a serialized `[x, y, z]` triple to a vector
pub fn vec3(p: [f64; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

/// Area of the triangle (a, b, c)
pub fn tri_area(a: &Vec3, b: &Vec3, c: &Vec3) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Area of the quad (a, b, c, d) split along the a-c diagonal
pub fn quad_area(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> f64 {
    tri_area(a, b, c) + tri_area(a, c, d)
}

/// Unsigned angle between two vectors in radians
///
/// # Returns
/// Angle in [0, PI]; zero when either vector has zero length
pub fn angle_between(a: &Vec3, b: &Vec3) -> f64 {
    let la = a.norm();
    let lb = b.norm();
    if la < ZERO_LENGTH || lb < ZERO_LENGTH {
        return 0.0;
    }
    (a.dot(b) / (la * lb)).clamp(-1.0, 1.0).acos()
}

/// Angle from `a` to `b` in radians, negative when `a x b` points away from `reference`
///
/// # Arguments
/// * `a` - Start direction
/// * `b` - End direction
/// * `reference` - Direction that defines the positive rotation sense
pub fn signed_angle(a: &Vec3, b: &Vec3, reference: &Vec3) -> f64 {
    let angle = angle_between(a, b);
    if a.cross(b).dot(reference) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Project `v` into the plane with normal `normal` and normalize the result
///
/// # Returns
/// `None` when the normal is degenerate or `v` is (nearly) parallel to it
pub fn project_onto_plane(v: &Vec3, normal: &Vec3) -> Option<Vec3> {
    let n = normal.try_normalize(ZERO_LENGTH)?;
    let in_plane = v - n * v.dot(&n);
    in_plane.try_normalize(ZERO_LENGTH)
}

/// Unit normal of the triangle (a, b, c), `None` when degenerate
pub fn tri_normal(a: &Vec3, b: &Vec3, c: &Vec3) -> Option<Vec3> {
    (b - a).cross(&(c - a)).try_normalize(ZERO_LENGTH)
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// An empty box that any point will expand
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f64::INFINITY),
            max: Vec3::repeat(f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut bbox = Self::empty();
        for p in points {
            bbox.add(p);
        }
        bbox
    }

    pub fn add(&mut self, p: &Vec3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::zeros();
        }
        (self.min + self.max) * 0.5
    }

    /// Length of the box diagonal; zero for an empty box
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.max - self.min).norm()
    }

    /// Largest edge length of the box
    pub fn largest_dimension(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.max - self.min).max()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

//! Input produced by the surface intersection / triangulation engine
//!
//! Every geometric surface contributes a triangle/quad soup. Intersection
//! curves between surfaces arrive as tessellated chains. Surfaces also answer
//! the two local-frame queries assembly needs (U tangent and normal) through
//! [`SurfaceQuery`]; the soup itself implements it by interpolating the
//! per-point samples the engine exported.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FeaMeshError, FeaMeshResult};
use crate::math::{tri_normal, vec3, Vec3, ZERO_LENGTH};

/// Role of a surface in cap generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceRole {
    /// Outer mould line surface
    #[default]
    Skin,
    /// Internal structural part surface (rib, spar, bulkhead...)
    Part,
}

/// One triangle or quad of a soup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoupFace {
    /// 3 or 4 indices into the surface's point list
    pub nodes: Vec<usize>,
    /// Sub-surfaces the face lies inside; the lowest index wins
    #[serde(default)]
    pub subsurfaces: Vec<usize>,
}

/// Triangle/quad soup of one geometric surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceSoup {
    /// Owning part index
    pub part: usize,
    /// Surface number within the owning part
    #[serde(default)]
    pub surf_num: usize,
    #[serde(default)]
    pub role: SurfaceRole,
    /// Reverse the surface normal
    #[serde(default)]
    pub flip_normal: bool,
    pub points: Vec<[f64; 3]>,
    pub faces: Vec<SoupFace>,
    /// U tangent sampled at each point (optional)
    #[serde(default)]
    pub u_tangents: Vec<[f64; 3]>,
    /// Surface normal sampled at each point (optional)
    #[serde(default)]
    pub normals: Vec<[f64; 3]>,
}

/// Tessellated intersection curve between two surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionChain {
    /// Indices of the two adjoining surfaces in `MeshInput::surfaces`
    pub surfaces: [usize; 2],
    pub points: Vec<[f64; 3]>,
    /// Chain lies on a surface border rather than on an interior intersection
    #[serde(default)]
    pub border: bool,
    /// Sub-surface whose own boundary this chain traces
    #[serde(default)]
    pub subsurface: Option<usize>,
}

/// Everything the intersection engine hands over
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshInput {
    #[serde(default)]
    pub surfaces: Vec<SurfaceSoup>,
    #[serde(default)]
    pub chains: Vec<IntersectionChain>,
}

impl MeshInput {
    pub fn from_json_str(json: &str) -> FeaMeshResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FeaMeshResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check all indices against the structure sizes
    pub fn validate(&self, part_count: usize, subsurface_count: usize) -> FeaMeshResult<()> {
        for (s, surf) in self.surfaces.iter().enumerate() {
            if surf.part >= part_count {
                return Err(FeaMeshError::InvalidInput(format!(
                    "surface {s} references part {} of {part_count}",
                    surf.part
                )));
            }
            for (f, face) in surf.faces.iter().enumerate() {
                if face.nodes.len() != 3 && face.nodes.len() != 4 {
                    return Err(FeaMeshError::InvalidInput(format!(
                        "surface {s} face {f} has {} nodes",
                        face.nodes.len()
                    )));
                }
                if let Some(bad) = face.nodes.iter().find(|&&n| n >= surf.points.len()) {
                    return Err(FeaMeshError::InvalidInput(format!(
                        "surface {s} face {f} references point {bad} of {}",
                        surf.points.len()
                    )));
                }
                if let Some(bad) = face.subsurfaces.iter().find(|&&ss| ss >= subsurface_count) {
                    return Err(FeaMeshError::InvalidInput(format!(
                        "surface {s} face {f} references sub-surface {bad}"
                    )));
                }
            }
        }
        for (c, chain) in self.chains.iter().enumerate() {
            if chain.surfaces.iter().any(|&s| s >= self.surfaces.len()) {
                return Err(FeaMeshError::InvalidInput(format!(
                    "chain {c} references surfaces {:?}",
                    chain.surfaces
                )));
            }
        }
        Ok(())
    }

    /// All soup and chain points
    pub fn all_points(&self) -> impl Iterator<Item = Vec3> + '_ {
        let soup = self.surfaces.iter().flat_map(|s| s.points.iter().copied().map(vec3));
        let chains = self.chains.iter().flat_map(|c| c.points.iter().copied().map(vec3));
        soup.chain(chains)
    }
}

/// Local surface frame at a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFrame {
    /// U tangent, zero when the surface carries no tangent samples
    pub u_tangent: Vec3,
    /// Unit normal, already flipped for surfaces with `flip_normal`
    pub normal: Vec3,
}

/// Local-frame queries on a parametric surface
pub trait SurfaceQuery {
    /// Frame at the surface point closest to `p`
    ///
    /// `hint` names a face the point is expected to lie on. Returns `None`
    /// when the point cannot be projected onto the surface.
    fn frame_at(&self, p: &Vec3, hint: Option<usize>) -> Option<SurfaceFrame>;
}

/// Closest point to `p` on triangle (a, b, c) as barycentric weights
fn closest_barycentric(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> [f64; 3] {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return [1.0, 0.0, 0.0];
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return [0.0, 1.0, 0.0];
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return [1.0 - v, v, 0.0];
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return [0.0, 0.0, 1.0];
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return [1.0 - w, 0.0, w];
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return [0.0, 1.0 - w, w];
    }

    let denom = va + vb + vc;
    if denom.abs() < f64::MIN_POSITIVE {
        return [1.0, 0.0, 0.0];
    }
    let v = vb / denom;
    let w = vc / denom;
    [1.0 - v - w, v, w]
}

impl SurfaceSoup {
    pub fn point(&self, i: usize) -> Vec3 {
        vec3(self.points[i])
    }

    /// Face split into triangles of point indices
    fn face_triangles(face: &SoupFace) -> Vec<[usize; 3]> {
        let n = &face.nodes;
        if n.len() == 4 {
            vec![[n[0], n[1], n[2]], [n[0], n[2], n[3]]]
        } else {
            vec![[n[0], n[1], n[2]]]
        }
    }

    fn interpolate(samples: &[[f64; 3]], tri: &[usize; 3], w: &[f64; 3]) -> Option<Vec3> {
        if samples.is_empty() {
            return None;
        }
        let v = tri
            .iter()
            .zip(w.iter())
            .map(|(&i, &wi)| samples.get(i).map(|s| vec3(*s) * wi))
            .sum::<Option<Vec3>>()?;
        Some(v)
    }

    /// Closest point on one face: (distance, triangle, barycentric weights)
    fn closest_on_face(&self, p: &Vec3, face: &SoupFace) -> Option<(f64, [usize; 3], [f64; 3])> {
        Self::face_triangles(face)
            .into_iter()
            .map(|tri| {
                let (a, b, c) = (self.point(tri[0]), self.point(tri[1]), self.point(tri[2]));
                let w = closest_barycentric(p, &a, &b, &c);
                let q = a * w[0] + b * w[1] + c * w[2];
                ((q - p).norm(), tri, w)
            })
            .min_by(|x, y| x.0.total_cmp(&y.0))
    }

    fn frame_on_triangle(&self, tri: &[usize; 3], w: &[f64; 3]) -> Option<SurfaceFrame> {
        let sampled = Self::interpolate(&self.normals, tri, w).and_then(|n| n.try_normalize(ZERO_LENGTH));
        let normal = match sampled {
            Some(n) => n,
            None => tri_normal(&self.point(tri[0]), &self.point(tri[1]), &self.point(tri[2]))?,
        };
        let normal = if self.flip_normal { -normal } else { normal };
        let u_tangent = Self::interpolate(&self.u_tangents, tri, w).unwrap_or_else(Vec3::zeros);
        Some(SurfaceFrame { u_tangent, normal })
    }
}

impl SurfaceQuery for SurfaceSoup {
    fn frame_at(&self, p: &Vec3, hint: Option<usize>) -> Option<SurfaceFrame> {
        let best = match hint.and_then(|f| self.faces.get(f)) {
            Some(face) => self.closest_on_face(p, face),
            None => self
                .faces
                .iter()
                .filter_map(|face| self.closest_on_face(p, face))
                .min_by(|x, y| x.0.total_cmp(&y.0)),
        }?;
        let (_, tri, w) = best;
        self.frame_on_triangle(&tri, &w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plate() -> SurfaceSoup {
        SurfaceSoup {
            part: 0,
            surf_num: 0,
            role: SurfaceRole::Skin,
            flip_normal: false,
            points: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![SoupFace { nodes: vec![0, 1, 2, 3], subsurfaces: vec![] }],
            u_tangents: vec![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![],
        }
    }

    #[test]
    fn test_closest_barycentric_inside_and_outside() {
        let a = Vec3::zeros();
        let b = Vec3::x();
        let c = Vec3::y();
        let w = closest_barycentric(&Vec3::new(0.25, 0.25, 1.0), &a, &b, &c);
        assert_relative_eq!(w[1], 0.25);
        assert_relative_eq!(w[2], 0.25);
        assert_eq!(closest_barycentric(&Vec3::new(-1.0, -1.0, 0.0), &a, &b, &c), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_frame_falls_back_to_face_normal() {
        let mut soup = plate();
        let frame = soup.frame_at(&Vec3::new(0.5, 0.2, 0.3), None).unwrap();
        assert_relative_eq!(frame.normal, Vec3::z());
        assert_relative_eq!(frame.u_tangent, Vec3::new(0.8, 0.2, 0.0), epsilon = 1e-12);

        soup.flip_normal = true;
        let frame = soup.frame_at(&Vec3::new(0.5, 0.2, 0.3), Some(0)).unwrap();
        assert_relative_eq!(frame.normal, -Vec3::z());
    }

    #[test]
    fn test_validate_indices() {
        let input = MeshInput { surfaces: vec![plate()], chains: vec![] };
        input.validate(1, 0).unwrap();
        assert!(input.validate(0, 0).is_err());

        let mut bad = input.clone();
        bad.surfaces[0].faces[0].nodes = vec![0, 1, 9];
        assert!(matches!(bad.validate(1, 0), Err(FeaMeshError::InvalidInput(_))));
    }
}

//! Finite elements as a closed sum type over the supported shapes

use super::node::FeaNode;
use crate::math::{signed_angle, Vec3, ZERO_LENGTH};

/// Handle of a node in the mesh node arena (0-based)
pub type NodeId = usize;

/// Element kind, including node order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Tri3,
    Tri6,
    Quad4,
    Quad8,
    Beam,
    PointMass,
}

impl ElementKind {
    pub fn is_shell(self) -> bool {
        matches!(
            self,
            ElementKind::Tri3 | ElementKind::Tri6 | ElementKind::Quad4 | ElementKind::Quad8
        )
    }
}

/// Node references and shape-specific data of an element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementShape {
    Tri {
        corners: [NodeId; 3],
        mids: Option<[NodeId; 3]>,
        /// In-plane material reference direction, zero when unavailable
        orientation: Vec3,
    },
    Quad {
        corners: [NodeId; 4],
        mids: Option<[NodeId; 4]>,
        orientation: Vec3,
    },
    Beam {
        ends: [NodeId; 2],
        mid: NodeId,
        /// Cap normal at the start and end of the segment
        normals: [Vec3; 2],
    },
    PointMass {
        node: NodeId,
        mass: f64,
    },
}

/// A finite element with its ownership metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FeaElement {
    /// Owning part; fixed point pseudo-parts own their point masses
    pub part_index: usize,
    pub subsurface_index: Option<usize>,
    /// Intersection chain a beam was generated from
    pub chain_index: Option<usize>,
    /// Which surface of a multi-surface part the element lies on
    pub surf_num: usize,
    pub shape: ElementShape,
}

impl FeaElement {
    pub fn new(part_index: usize, surf_num: usize, shape: ElementShape) -> Self {
        Self {
            part_index,
            subsurface_index: None,
            chain_index: None,
            surf_num,
            shape,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match &self.shape {
            ElementShape::Tri { mids: None, .. } => ElementKind::Tri3,
            ElementShape::Tri { mids: Some(_), .. } => ElementKind::Tri6,
            ElementShape::Quad { mids: None, .. } => ElementKind::Quad4,
            ElementShape::Quad { mids: Some(_), .. } => ElementKind::Quad8,
            ElementShape::Beam { .. } => ElementKind::Beam,
            ElementShape::PointMass { .. } => ElementKind::PointMass,
        }
    }

    pub fn is_shell(&self) -> bool {
        self.kind().is_shell()
    }

    pub fn corner_nodes(&self) -> Vec<NodeId> {
        match &self.shape {
            ElementShape::Tri { corners, .. } => corners.to_vec(),
            ElementShape::Quad { corners, .. } => corners.to_vec(),
            ElementShape::Beam { ends, .. } => ends.to_vec(),
            ElementShape::PointMass { node, .. } => vec![*node],
        }
    }

    pub fn mid_nodes(&self) -> Vec<NodeId> {
        match &self.shape {
            ElementShape::Tri { mids, .. } => mids.map(|m| m.to_vec()).unwrap_or_default(),
            ElementShape::Quad { mids, .. } => mids.map(|m| m.to_vec()).unwrap_or_default(),
            ElementShape::Beam { mid, .. } => vec![*mid],
            ElementShape::PointMass { .. } => Vec::new(),
        }
    }

    /// Corner nodes followed by mid nodes
    pub fn all_nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.corner_nodes();
        nodes.extend(self.mid_nodes());
        nodes
    }

    /// Rewrite every node reference through `map`
    pub fn remap_nodes<F: Fn(NodeId) -> NodeId>(&mut self, map: F) {
        fn remap_all<const N: usize>(ids: &mut [NodeId; N], map: &dyn Fn(NodeId) -> NodeId) {
            for id in ids.iter_mut() {
                *id = map(*id);
            }
        }
        match &mut self.shape {
            ElementShape::Tri { corners, mids, .. } => {
                remap_all(corners, &map);
                if let Some(m) = mids {
                    remap_all(m, &map);
                }
            }
            ElementShape::Quad { corners, mids, .. } => {
                remap_all(corners, &map);
                if let Some(m) = mids {
                    remap_all(m, &map);
                }
            }
            ElementShape::Beam { ends, mid, .. } => {
                remap_all(ends, &map);
                *mid = map(*mid);
            }
            ElementShape::PointMass { node, .. } => *node = map(*node),
        }
    }

    /// Shell orientation vector, `None` for beams and point masses
    pub fn orientation(&self) -> Option<Vec3> {
        match &self.shape {
            ElementShape::Tri { orientation, .. } | ElementShape::Quad { orientation, .. } => {
                Some(*orientation)
            }
            _ => None,
        }
    }

    /// Material angle in degrees between the element x-edge and its orientation vector
    ///
    /// The element x-edge runs from corner 0 to corner 1 and the angle is signed
    /// about the element normal (corner 0-1-2), folded into [0, 180). Returns 0 for
    /// non-shell elements, a zero orientation vector or a degenerate element.
    pub fn theta_material(&self, nodes: &[FeaNode]) -> f64 {
        let (c, orientation) = match &self.shape {
            ElementShape::Tri { corners, orientation, .. } => ([corners[0], corners[1], corners[2]], orientation),
            ElementShape::Quad { corners, orientation, .. } => ([corners[0], corners[1], corners[2]], orientation),
            _ => return 0.0,
        };
        if orientation.norm() < ZERO_LENGTH {
            return 0.0;
        }
        let p0 = nodes[c[0]].position;
        let p1 = nodes[c[1]].position;
        let p2 = nodes[c[2]].position;

        let (Some(v01), Some(v12)) = ((p1 - p0).try_normalize(ZERO_LENGTH), (p2 - p1).try_normalize(ZERO_LENGTH)) else {
            return 0.0;
        };
        let Some(norm) = v01.cross(&v12).try_normalize(ZERO_LENGTH) else {
            return 0.0;
        };

        let theta = signed_angle(&v01, orientation, &norm).to_degrees();
        if theta < 0.0 {
            theta + 180.0
        } else {
            theta
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_nodes() -> Vec<FeaNode> {
        [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .iter()
            .enumerate()
            .map(|(i, p)| FeaNode::new(i + 1, Vec3::new(p[0], p[1], 0.0)))
            .collect()
    }

    fn tri(orientation: Vec3) -> FeaElement {
        FeaElement::new(
            0,
            0,
            ElementShape::Tri { corners: [0, 1, 2], mids: None, orientation },
        )
    }

    #[test]
    fn test_element_kinds_and_nodes() {
        let quad = FeaElement::new(
            0,
            0,
            ElementShape::Quad { corners: [0, 1, 2, 3], mids: Some([4, 5, 6, 7]), orientation: Vec3::x() },
        );
        assert_eq!(quad.kind(), ElementKind::Quad8);
        assert_eq!(quad.all_nodes(), vec![0, 1, 2, 3, 4, 5, 6, 7]);

        let beam = FeaElement::new(
            1,
            0,
            ElementShape::Beam { ends: [3, 4], mid: 5, normals: [Vec3::z(); 2] },
        );
        assert_eq!(beam.kind(), ElementKind::Beam);
        assert_eq!(beam.all_nodes(), vec![3, 4, 5]);
        assert!(beam.orientation().is_none());
        assert!(!beam.is_shell());
    }

    #[test]
    fn test_remap_nodes() {
        let mut e = tri(Vec3::x());
        e.remap_nodes(|id| id * 10);
        assert_eq!(e.corner_nodes(), vec![0, 10, 20]);
    }

    #[test]
    fn test_theta_material() {
        let nodes = square_nodes();
        assert_relative_eq!(tri(Vec3::x()).theta_material(&nodes), 0.0);
        assert_relative_eq!(tri(Vec3::y()).theta_material(&nodes), 90.0, epsilon = 1e-9);
        assert_relative_eq!(tri(Vec3::new(1.0, 1.0, 0.0)).theta_material(&nodes), 45.0, epsilon = 1e-9);
        // clockwise from the x-edge folds back into [0, 180)
        assert_relative_eq!(tri(Vec3::new(1.0, -1.0, 0.0)).theta_material(&nodes), 135.0, epsilon = 1e-9);
        assert_eq!(tri(Vec3::zeros()).theta_material(&nodes), 0.0);
    }
}

//! Fixed points that must coincide with a mesh node

use serde::{Deserialize, Serialize};

use super::element::NodeId;
use crate::math::Vec3;

/// Where on the structure a fixed point was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixPointPlacement {
    #[default]
    Surface,
    Border,
    Intersection,
}

/// A fixed point and its resolution into the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct FixPoint {
    pub name: String,
    /// Index of the fixed point's own pseudo-part in the part list
    pub part_index: usize,
    /// Part the point was placed on
    pub parent_part: usize,
    /// One position per instance (symmetric copies, adjoining surfaces)
    pub positions: Vec<Vec3>,
    pub placement: FixPointPlacement,
    pub mass: Option<f64>,
    /// Node matched for each position, filled in by tagging
    pub resolved: Vec<Option<NodeId>>,
}

impl FixPoint {
    pub fn new(name: impl Into<String>, part_index: usize, parent_part: usize, positions: Vec<Vec3>) -> Self {
        let resolved = vec![None; positions.len()];
        Self {
            name: name.into(),
            part_index,
            parent_part,
            positions,
            placement: FixPointPlacement::Surface,
            mass: None,
            resolved,
        }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Mass to attach, if any; zero masses attach nothing
    pub fn point_mass(&self) -> Option<f64> {
        self.mass.filter(|m| *m != 0.0)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.iter().any(Option::is_some)
    }
}

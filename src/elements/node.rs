//! Mesh node - a canonical, deduplicated point of the FE mesh

use std::collections::BTreeSet;

use super::boundary::ConstraintSet;
use crate::math::Vec3;

/// A canonical mesh node
///
/// Tags hold part indices (`0..part_count`) and sub-surface indices offset by
/// the part count, so the two ranges never collide.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaNode {
    /// Dense 1-based index, without any export offset
    pub index: usize,
    pub position: Vec3,
    pub tags: BTreeSet<usize>,
    pub constraints: ConstraintSet,
    pub fixed_point: bool,
}

impl FeaNode {
    pub fn new(index: usize, position: Vec3) -> Self {
        Self {
            index,
            position,
            tags: BTreeSet::new(),
            constraints: ConstraintSet::empty(),
            fixed_point: false,
        }
    }

    pub fn has_tag(&self, tag: usize) -> bool {
        self.tags.contains(&tag)
    }

    pub fn add_tag(&mut self, tag: usize) {
        self.tags.insert(tag);
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Distance to a point in model space
    pub fn distance_to(&self, p: &Vec3) -> f64 {
        (self.position - p).norm()
    }
}

//! Boundary condition rules and degree-of-freedom constraint sets

use serde::{Deserialize, Serialize};

use super::node::FeaNode;

/// A nodal degree of freedom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dof {
    Tx,
    Ty,
    Tz,
    Rx,
    Ry,
    Rz,
}

impl Dof {
    pub const ALL: [Dof; 6] = [Dof::Tx, Dof::Ty, Dof::Tz, Dof::Rx, Dof::Ry, Dof::Rz];

    /// Solver component number (1..=6)
    pub fn component(self) -> u8 {
        self as u8 + 1
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of constrained degrees of freedom, stored as a 6-bit mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConstraintSet {
    bits: u8,
}

impl ConstraintSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// All six DOFs restrained
    pub const fn fixed() -> Self {
        Self { bits: 0b11_1111 }
    }

    /// Translations restrained, rotations free
    pub const fn pinned() -> Self {
        Self { bits: 0b00_0111 }
    }

    pub fn from_dofs<I: IntoIterator<Item = Dof>>(dofs: I) -> Self {
        let mut set = Self::empty();
        for dof in dofs {
            set.insert(dof);
        }
        set
    }

    pub fn insert(&mut self, dof: Dof) {
        self.bits |= dof.bit();
    }

    pub fn contains(&self, dof: Dof) -> bool {
        self.bits & dof.bit() != 0
    }

    pub fn union(self, other: ConstraintSet) -> ConstraintSet {
        ConstraintSet {
            bits: self.bits | other.bits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Dof> + '_ {
        Dof::ALL.into_iter().filter(|d| self.contains(*d))
    }

    /// Component digits as used by NASTRAN SPC cards, e.g. "123456"
    pub fn as_nastran_digits(&self) -> String {
        self.iter().map(|d| char::from(b'0' + d.component())).collect()
    }
}

impl FromIterator<Dof> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Dof>>(iter: I) -> Self {
        Self::from_dofs(iter)
    }
}

/// What a boundary condition rule selects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimpleBcKind {
    /// Nodes with `y` strictly below the threshold
    YLessThan(f64),
    /// Nodes tagged with the part index
    Part(usize),
    /// Nodes tagged with the sub-surface index
    SubSurface(usize),
}

/// Flattened boundary condition rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleBc {
    pub kind: SimpleBcKind,
    pub constraints: ConstraintSet,
}

impl SimpleBc {
    pub fn y_less_than(threshold: f64, constraints: ConstraintSet) -> Self {
        Self {
            kind: SimpleBcKind::YLessThan(threshold),
            constraints,
        }
    }

    pub fn part(part_index: usize, constraints: ConstraintSet) -> Self {
        Self {
            kind: SimpleBcKind::Part(part_index),
            constraints,
        }
    }

    pub fn subsurface(subsurface_index: usize, constraints: ConstraintSet) -> Self {
        Self {
            kind: SimpleBcKind::SubSurface(subsurface_index),
            constraints,
        }
    }

    /// Whether the rule selects `node`; sub-surface tags are offset by `part_count`
    pub fn matches(&self, node: &FeaNode, part_count: usize) -> bool {
        match self.kind {
            SimpleBcKind::YLessThan(threshold) => node.position.y < threshold,
            SimpleBcKind::Part(part) => node.has_tag(part),
            SimpleBcKind::SubSurface(ss) => node.has_tag(part_count + ss),
        }
    }

    /// OR the rule's constraints into the node when it matches
    pub fn apply(&self, node: &mut FeaNode, part_count: usize) {
        if self.matches(node, part_count) {
            node.constraints = node.constraints.union(self.constraints);
        }
    }
}

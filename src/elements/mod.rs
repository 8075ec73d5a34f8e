//! Mesh entities: nodes, elements, properties, materials and boundary conditions

mod boundary;
mod element;
mod fix_point;
mod material;
mod node;
mod property;

pub use boundary::{ConstraintSet, Dof, SimpleBc, SimpleBcKind};
pub use element::{ElementKind, ElementShape, FeaElement, NodeId};
pub use fix_point::{FixPoint, FixPointPlacement};
pub use material::{MaterialModel, OrthotropicConstants, SimpleFeaMaterial};
pub use node::FeaNode;
pub use property::{CrossSection, PropertyType, SectionConstants, SimpleFeaProperty};

//! FEA Mesh - structural finite element mesh assembly and export
//!
//! This library takes the triangle/quad soup and intersection chains produced
//! by an external surface-intersection engine, together with a structural
//! definition, and turns them into a solver-ready FE model:
//! - Shell (tri/quad, linear or quadratic) and beam cap element assembly
//! - Coincident node merging with a model-scale-relative tolerance
//! - Part / sub-surface / fixed point tagging and point masses
//! - Boundary condition rules
//! - Mass accounting
//! - NASTRAN, Calculix, Gmsh, STL and mass report writers sharing one numbering
//!
//! ## Example
//! ```rust
//! use fea_mesh::prelude::*;
//!
//! let structure = StructureDefinition::from_json_str(r#"{
//!     "name": "Panel",
//!     "parts": [ { "name": "Skin", "kind": "skin", "property": 0 } ],
//!     "properties": [ { "name": "Shell", "kind": "shell", "thickness": 0.002, "material": "Alu" } ],
//!     "materials": [ { "name": "Alu", "density": 2700.0, "elastic_modulus": 70e9, "poisson_ratio": 0.33 } ]
//! }"#).unwrap();
//!
//! let input = MeshInput::from_json_str(r#"{
//!     "surfaces": [ {
//!         "part": 0,
//!         "role": "skin",
//!         "points": [[0,0,0],[5,0,0],[5,2,0],[0,2,0]],
//!         "faces": [ { "nodes": [0,1,2] }, { "nodes": [0,2,3] } ]
//!     } ]
//! }"#).unwrap();
//!
//! let mesh = generate_fea_mesh(&structure, &input).unwrap();
//! assert_eq!(mesh.nodes.len(), 4);
//! assert!((mesh.mass.total - 54.0).abs() < 1e-9);
//! ```

pub mod assembly;
pub mod dedup;
pub mod elements;
pub mod error;
pub mod export;
pub mod mass;
pub mod math;
pub mod mesh;
pub mod pipeline;
pub mod structure;
pub mod surface;

// Re-export common types
pub mod prelude {
    pub use crate::elements::{
        ConstraintSet, CrossSection, Dof, ElementKind, ElementShape, FeaElement, FeaNode,
        FixPoint, FixPointPlacement, PropertyType, SimpleBc, SimpleBcKind, SimpleFeaMaterial,
        SimpleFeaProperty,
    };
    pub use crate::error::{FeaMeshError, FeaMeshResult};
    pub use crate::export::{export_all, ExportFormat, ExportReport};
    pub use crate::mass::MassSummary;
    pub use crate::math::{BoundingBox, Vec3};
    pub use crate::mesh::{ElementGroup, FeaMesh, NodeBucket};
    pub use crate::pipeline::{generate_fea_mesh, MeshAssemblyContext};
    pub use crate::structure::{
        BcDef, ExportSettings, FixPointDef, IncludedElements, MassUnit, MaterialDef,
        OrientationMode, PartDef, PartKind, PropertyDef, StructSettings, StructureDefinition,
        SubSurfaceDef, TrimGroup, TrimPlane,
    };
    pub use crate::surface::{IntersectionChain, MeshInput, SoupFace, SurfaceRole, SurfaceSoup};
}

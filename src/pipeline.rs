//! End-to-end mesh generation for one structure
//!
//! The run is a fixed sequence of phases over a [`FeaMesh`]:
//! assemble, merge nodes, tag, resolve fixed points, apply boundary
//! conditions, suppress beam-only shells, number, then account mass.
//! Writers in [`crate::export`] only read the finished mesh.

use log::{info, warn};

use crate::assembly::assemble;
use crate::dedup::merge_tolerance;
use crate::elements::{ElementKind, SimpleBc};
use crate::error::{FeaMeshError, FeaMeshResult};
use crate::mass::MassSummary;
use crate::math::{BoundingBox, Vec3};
use crate::mesh::FeaMesh;
use crate::structure::StructureDefinition;
use crate::surface::MeshInput;

/// Inputs and derived tolerances of one mesh generation run
pub struct MeshAssemblyContext<'a> {
    pub structure: &'a StructureDefinition,
    pub input: &'a MeshInput,
    pub bbox: BoundingBox,
    /// Node merge tolerance
    pub merge_tolerance: f64,
    /// Tolerance for trimming, chain matching and fixed point lookup
    pub geometry_tolerance: f64,
    pub bcs: Vec<SimpleBc>,
    pub diagnostics: Vec<FeaMeshError>,
}

impl<'a> MeshAssemblyContext<'a> {
    /// Validate the inputs and derive the tolerances from the model extent
    pub fn new(structure: &'a StructureDefinition, input: &'a MeshInput) -> FeaMeshResult<Self> {
        structure.validate()?;
        input.validate(structure.parts.len(), structure.subsurfaces.len())?;

        let points: Vec<Vec3> = input.all_points().collect();
        let bbox = BoundingBox::from_points(points.iter());
        if bbox.is_empty() {
            return Err(FeaMeshError::EmptyMesh);
        }
        let settings = &structure.settings;

        Ok(Self {
            structure,
            input,
            merge_tolerance: merge_tolerance(&bbox, settings.merge_tolerance_factor),
            geometry_tolerance: merge_tolerance(&bbox, settings.fix_point_tolerance_factor),
            bbox,
            bcs: structure.snapshot_boundary_conditions(),
            diagnostics: Vec::new(),
        })
    }

    /// Run every phase and return the numbered mesh with its mass summary
    pub fn run(mut self) -> FeaMeshResult<FeaMesh> {
        info!("Generating FEA mesh for '{}'", self.structure.name);

        let assembly = assemble(self.structure, self.input, self.geometry_tolerance, &mut self.diagnostics);

        let mut mesh = FeaMesh::new(self.structure);
        mesh.load_assembly(assembly, self.merge_tolerance)?;
        mesh.tag_nodes();
        mesh.tag_fix_points(self.geometry_tolerance);
        mesh.apply_boundary_conditions(&self.bcs);
        mesh.remove_suppressed_elements();
        mesh.finalize_numbering();

        let (mass, mass_diagnostics) = MassSummary::compute(&mesh);
        mesh.mass = mass;
        mesh.diagnostics.append(&mut self.diagnostics);
        mesh.diagnostics.extend(mass_diagnostics);

        info!(
            "Mesh '{}': {} nodes, {} elements ({} tri3, {} tri6, {} quad4, {} quad8, {} beam, {} point mass)",
            mesh.name,
            mesh.nodes.len(),
            mesh.elements.len(),
            mesh.count_kind(ElementKind::Tri3),
            mesh.count_kind(ElementKind::Tri6),
            mesh.count_kind(ElementKind::Quad4),
            mesh.count_kind(ElementKind::Quad8),
            mesh.count_kind(ElementKind::Beam),
            mesh.count_kind(ElementKind::PointMass),
        );
        if !mesh.diagnostics.is_empty() {
            warn!("{} diagnostics recorded", mesh.diagnostics.len());
        }
        Ok(mesh)
    }
}

/// Build the FE mesh of `structure` from the intersected surface data
pub fn generate_fea_mesh(structure: &StructureDefinition, input: &MeshInput) -> FeaMeshResult<FeaMesh> {
    MeshAssemblyContext::new(structure, input)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tolerances_scale_with_model() {
        let structure = StructureDefinition::from_json_str(r#"{ "name": "S", "parts": [ { "name": "P" } ] }"#).unwrap();
        let input = MeshInput::from_json_str(
            r#"{ "surfaces": [ { "part": 0, "points": [[0,0,0],[3,0,0],[3,4,0]], "faces": [ { "nodes": [0,1,2] } ] } ] }"#,
        )
        .unwrap();
        let ctx = MeshAssemblyContext::new(&structure, &input).unwrap();
        assert_relative_eq!(ctx.merge_tolerance, 5.0e-9, max_relative = 1e-12);
        assert_relative_eq!(ctx.geometry_tolerance, 5.0e-6, max_relative = 1e-12);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let structure = StructureDefinition::from_json_str(r#"{ "name": "S" }"#).unwrap();
        let input = MeshInput::default();
        assert!(matches!(generate_fea_mesh(&structure, &input), Err(FeaMeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_part_reference_is_rejected() {
        let structure = StructureDefinition::from_json_str(r#"{ "name": "S" }"#).unwrap();
        let input = MeshInput::from_json_str(
            r#"{ "surfaces": [ { "part": 2, "points": [[0,0,0]], "faces": [] } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            MeshAssemblyContext::new(&structure, &input),
            Err(FeaMeshError::InvalidInput(_))
        ));
    }
}

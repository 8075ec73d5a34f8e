//! Mass accounting and the used property/material sets
//!
//! Mass is computed once per run, before any writer runs. The same pass
//! records which properties and materials are referenced so the writers only
//! emit those.

use std::collections::BTreeSet;

use log::{info, warn};

use crate::elements::{ElementShape, FeaElement};
use crate::error::FeaMeshError;
use crate::math::{quad_area, tri_area};
use crate::mesh::{ElementGroup, FeaMesh};

/// Shell and beam mass of one part or sub-surface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupMass {
    pub shell: f64,
    pub beam: f64,
}

impl GroupMass {
    pub fn total(&self) -> f64 {
        self.shell + self.beam
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassSummary {
    /// Per structural part
    pub parts: Vec<GroupMass>,
    /// Per sub-surface
    pub subsurfaces: Vec<GroupMass>,
    /// Point mass total per fixed point
    pub fix_points: Vec<f64>,
    pub total: f64,
    pub used_properties: BTreeSet<usize>,
    pub used_materials: BTreeSet<usize>,
}

/// Mass of one element; unresolved properties or materials contribute zero
pub fn element_mass(mesh: &FeaMesh, element: &FeaElement) -> f64 {
    let pos = |id: usize| mesh.nodes[id].position;
    if let ElementShape::PointMass { mass, .. } = element.shape {
        return mass;
    }
    let Some(property) = mesh.property_of(element) else {
        return 0.0;
    };
    let density = mesh.material_of(property).map_or(0.0, |m| m.density);

    match &element.shape {
        ElementShape::Tri { corners: c, .. } => {
            tri_area(&pos(c[0]), &pos(c[1]), &pos(c[2])) * property.thickness * density
        }
        ElementShape::Quad { corners: c, .. } => {
            quad_area(&pos(c[0]), &pos(c[1]), &pos(c[2]), &pos(c[3])) * property.thickness * density
        }
        ElementShape::Beam { ends, .. } => {
            (pos(ends[1]) - pos(ends[0])).norm() * property.section.area * density
        }
        ElementShape::PointMass { mass, .. } => *mass,
    }
}

impl MassSummary {
    /// Accumulate per-group and total mass over the mesh's elements
    ///
    /// Out-of-range property indices are returned as diagnostics, once per
    /// owner and index.
    pub fn compute(mesh: &FeaMesh) -> (MassSummary, Vec<FeaMeshError>) {
        let mut summary = MassSummary {
            parts: vec![GroupMass::default(); mesh.parts.len()],
            subsurfaces: vec![GroupMass::default(); mesh.subsurfaces.len()],
            fix_points: vec![0.0; mesh.fix_points.len()],
            ..Default::default()
        };
        let mut missing: BTreeSet<(ElementGroup, usize)> = BTreeSet::new();

        for element in &mesh.elements {
            let group = mesh.element_group(element);
            if let Some(index) = mesh.property_index(element) {
                match mesh.properties.get(index) {
                    Some(property) => {
                        summary.used_properties.insert(index);
                        if let Some(m) = property.material_index.filter(|m| *m < mesh.materials.len()) {
                            summary.used_materials.insert(m);
                        }
                    }
                    None => {
                        missing.insert((group, index));
                    }
                }
            }

            let mass = element_mass(mesh, element);
            summary.total += mass;
            let slot = match group {
                ElementGroup::Part(p) => summary.parts.get_mut(p),
                ElementGroup::SubSurface(ss) => summary.subsurfaces.get_mut(ss),
                ElementGroup::FixPoint(f) => {
                    if let Some(m) = summary.fix_points.get_mut(f) {
                        *m += mass;
                    }
                    continue;
                }
            };
            if let Some(slot) = slot {
                if element.is_shell() {
                    slot.shell += mass;
                } else {
                    slot.beam += mass;
                }
            }
        }

        let diagnostics = missing
            .into_iter()
            .map(|(group, index)| {
                let owner = mesh.group_name(group).to_string();
                warn!("{owner} references property index {index}, which does not exist");
                FeaMeshError::MissingPropertyIndex { owner, index }
            })
            .collect();

        info!("Total Mass = {:.6} {}", summary.total, mesh.settings.mass_unit.label());
        (summary, diagnostics)
    }

    /// Sum of every part, sub-surface and fixed point entry
    pub fn group_sum(&self) -> f64 {
        self.parts.iter().map(GroupMass::total).sum::<f64>()
            + self.subsurfaces.iter().map(GroupMass::total).sum::<f64>()
            + self.fix_points.iter().sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{FeaNode, NodeId};
    use crate::math::Vec3;
    use crate::structure::StructureDefinition;
    use approx::assert_relative_eq;

    fn mesh(json_props: &str) -> FeaMesh {
        let json = format!(
            r#"{{
            "name": "M",
            "parts": [ {{ "name": "Skin", "property": 0, "cap_property": 1 }} ],
            "subsurfaces": [ {{ "name": "Pad", "parent_part": 0, "property": 0 }} ],
            "properties": {json_props},
            "materials": [ {{ "name": "Al", "density": 2700.0 }} ],
            "fix_points": [ {{ "name": "Battery", "parent_part": 0, "positions": [[0, 0, 0]], "mass": 3.5 }} ]
        }}"#
        );
        let structure = StructureDefinition::from_json_str(&json).unwrap();
        let mut mesh = FeaMesh::new(&structure);
        mesh.nodes = [[0.0, 0.0], [5.0, 0.0], [5.0, 2.0], [0.0, 2.0]]
            .iter()
            .enumerate()
            .map(|(i, p)| FeaNode::new(i + 1, Vec3::new(p[0], p[1], 0.0)))
            .collect();
        mesh
    }

    fn shell(corners: Vec<NodeId>, ss: Option<usize>) -> FeaElement {
        let shape = if corners.len() == 4 {
            ElementShape::Quad { corners: [corners[0], corners[1], corners[2], corners[3]], mids: None, orientation: Vec3::zeros() }
        } else {
            ElementShape::Tri { corners: [corners[0], corners[1], corners[2]], mids: None, orientation: Vec3::zeros() }
        };
        let mut e = FeaElement::new(0, 0, shape);
        e.subsurface_index = ss;
        e
    }

    const PROPS: &str = r#"[
        { "name": "Shell", "kind": "shell", "thickness": 0.002, "material": "Al" },
        { "name": "Cap", "kind": "beam", "area": 0.0001, "material": "Al" }
    ]"#;

    #[test]
    fn test_flat_panel_mass() {
        let mut mesh = mesh(PROPS);
        mesh.elements = vec![shell(vec![0, 1, 2], None), shell(vec![0, 2, 3], None)];
        let (summary, diagnostics) = MassSummary::compute(&mesh);
        assert_relative_eq!(summary.total, 54.0, max_relative = 1e-12);
        assert_relative_eq!(summary.parts[0].shell, 54.0, max_relative = 1e-12);
        assert!(diagnostics.is_empty());
        assert_eq!(summary.used_properties.iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(summary.used_materials.len(), 1);
    }

    #[test]
    fn test_quad_beam_point_mass_and_conservation() {
        let mut mesh = mesh(PROPS);
        let beam = FeaElement::new(0, 0, ElementShape::Beam { ends: [0, 1], mid: 1, normals: [Vec3::z(); 2] });
        let point = FeaElement::new(1, 0, ElementShape::PointMass { node: 0, mass: 3.5 });
        mesh.elements = vec![shell(vec![0, 1, 2, 3], Some(0)), beam, point];

        let (summary, _) = MassSummary::compute(&mesh);
        assert_relative_eq!(summary.subsurfaces[0].shell, 54.0, max_relative = 1e-12);
        assert_relative_eq!(summary.parts[0].beam, 5.0 * 0.0001 * 2700.0, max_relative = 1e-12);
        assert_relative_eq!(summary.fix_points[0], 3.5);
        assert_relative_eq!(summary.group_sum(), summary.total, max_relative = 1e-12);
        assert_eq!(summary.used_properties.len(), 2);
    }

    #[test]
    fn test_missing_property_contributes_zero() {
        let mut mesh = mesh("[]");
        mesh.elements = vec![shell(vec![0, 1, 2], None), shell(vec![0, 2, 3], None)];
        let (summary, diagnostics) = MassSummary::compute(&mesh);
        assert_eq!(summary.total, 0.0);
        assert!(summary.used_properties.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(&diagnostics[0], FeaMeshError::MissingPropertyIndex { owner, index: 0 } if owner == "Skin"));
    }
}

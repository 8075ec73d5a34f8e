//! Structural configuration: parts, sub-surfaces, properties, materials,
//! fixed points, boundary conditions and export settings
//!
//! These are the editable, serializable definitions. A pipeline run snapshots
//! them into the flattened `Simple*` types once and never reads them again
//! for physical data.

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::elements::{
    ConstraintSet, CrossSection, Dof, FixPoint, FixPointPlacement, OrthotropicConstants,
    PropertyType, SectionConstants, SimpleBc, SimpleFeaMaterial, SimpleFeaProperty,
};
use crate::error::{FeaMeshError, FeaMeshResult};
use crate::math::{vec3, Vec3};

/// Complete structural definition of one FEA structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureDefinition {
    pub name: String,
    #[serde(default)]
    pub parts: Vec<PartDef>,
    #[serde(default)]
    pub subsurfaces: Vec<SubSurfaceDef>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub materials: Vec<MaterialDef>,
    #[serde(default)]
    pub fix_points: Vec<FixPointDef>,
    #[serde(default)]
    pub boundary_conditions: Vec<BcDef>,
    #[serde(default)]
    pub trim_groups: Vec<TrimGroup>,
    #[serde(default)]
    pub settings: StructSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    #[default]
    Skin,
    Rib,
    Spar,
    Bulkhead,
    Slice,
    Dome,
    Stiffener,
    Other,
}

/// Which element families a part or sub-surface contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludedElements {
    #[default]
    Shell,
    Beam,
    ShellAndBeam,
}

impl IncludedElements {
    /// Shell elements are kept in the exported mesh
    pub fn keeps_shells(self) -> bool {
        matches!(self, IncludedElements::Shell | IncludedElements::ShellAndBeam)
    }

    /// Beam caps are generated along the part's intersections
    pub fn creates_beams(self) -> bool {
        matches!(self, IncludedElements::Beam | IncludedElements::ShellAndBeam)
    }
}

/// Source of the in-plane material direction of shell elements
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    /// U tangent of the parent surface at the element centroid
    #[default]
    SurfaceU,
    /// Fixed global vector, projected into each element's plane
    Global([f64; 3]),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDef {
    pub name: String,
    #[serde(default)]
    pub kind: PartKind,
    /// Shell property index
    #[serde(default)]
    pub property: usize,
    /// Beam cap property index
    #[serde(default)]
    pub cap_property: usize,
    #[serde(default)]
    pub included_elements: IncludedElements,
    #[serde(default)]
    pub orientation: OrientationMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubSurfaceDef {
    pub name: String,
    pub parent_part: usize,
    #[serde(default)]
    pub property: usize,
    #[serde(default)]
    pub cap_property: usize,
    #[serde(default)]
    pub included_elements: IncludedElements,
    #[serde(default)]
    pub orientation: OrientationMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyType,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub cross_section: CrossSection,
    #[serde(default)]
    pub dims: [f64; 6],
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub izz: f64,
    #[serde(default)]
    pub iyy: f64,
    #[serde(default)]
    pub izy: f64,
    #[serde(default)]
    pub ixx: f64,
    /// Material name
    pub material: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDef {
    pub name: String,
    pub density: f64,
    #[serde(default)]
    pub elastic_modulus: f64,
    #[serde(default)]
    pub poisson_ratio: f64,
    #[serde(default)]
    pub thermal_expansion: f64,
    /// Engineering constants; when present the material is orthotropic
    #[serde(default)]
    pub orthotropic: Option<OrthotropicConstants>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixPointDef {
    pub name: String,
    pub parent_part: usize,
    pub positions: Vec<[f64; 3]>,
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub placement: FixPointPlacement,
}

/// Node selector of a boundary condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BcSelector {
    YLessThan(f64),
    Part(usize),
    Subsurface(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BcDef {
    pub selector: BcSelector,
    pub constraints: Vec<Dof>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrimPlane {
    pub point: [f64; 3],
    pub normal: [f64; 3],
}

/// Planes that together bound a trimmed-away region
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrimGroup {
    pub planes: Vec<TrimPlane>,
}

/// Unit system of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    /// m, kg, s
    #[default]
    Si,
    /// cm, g, s
    Cgs,
    /// mm, tonne, s
    Mpa,
    /// ft, slug, s
    Bft,
    /// in, lbf*s^2/in, s
    Bin,
}

impl MassUnit {
    pub fn label(self) -> &'static str {
        match self {
            MassUnit::Si => "kg",
            MassUnit::Cgs => "g",
            MassUnit::Mpa => "tonne",
            MassUnit::Bft => "slug",
            MassUnit::Bin => "lbf*sec^2/in",
        }
    }
}

/// Output path per format; `None` disables the format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default)]
    pub nastran: Option<PathBuf>,
    #[serde(default)]
    pub nastran_key: Option<PathBuf>,
    #[serde(default)]
    pub calculix: Option<PathBuf>,
    #[serde(default)]
    pub stl: Option<PathBuf>,
    #[serde(default)]
    pub gmsh: Option<PathBuf>,
    #[serde(default)]
    pub mass: Option<PathBuf>,
}

impl ExportSettings {
    /// Re-root every relative path onto `dir`
    pub fn rebased(&self, dir: &Path) -> Self {
        let rebase = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| if p.is_relative() { dir.join(p) } else { p.clone() })
        };
        Self {
            nastran: rebase(&self.nastran),
            nastran_key: rebase(&self.nastran_key),
            calculix: rebase(&self.calculix),
            stl: rebase(&self.stl),
            gmsh: rebase(&self.gmsh),
            mass: rebase(&self.mass),
        }
    }
}

fn default_merge_tolerance_factor() -> f64 {
    1.0e-9
}

fn default_fix_point_tolerance_factor() -> f64 {
    1.0e-6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructSettings {
    /// Generate 6-node triangles and 8-node quads
    #[serde(default)]
    pub high_order: bool,
    #[serde(default)]
    pub node_offset: usize,
    #[serde(default)]
    pub element_offset: usize,
    #[serde(default)]
    pub mass_unit: MassUnit,
    /// Node merge tolerance as a fraction of the model bounding-box diagonal
    #[serde(default = "default_merge_tolerance_factor")]
    pub merge_tolerance_factor: f64,
    /// Fixed point match tolerance as a fraction of the model bounding-box diagonal
    #[serde(default = "default_fix_point_tolerance_factor")]
    pub fix_point_tolerance_factor: f64,
    /// Write one Calculix *NORMAL line per beam element instead of one per cap group
    #[serde(default)]
    pub beam_normals_per_element: bool,
    #[serde(default)]
    pub export: ExportSettings,
}

impl Default for StructSettings {
    fn default() -> Self {
        Self {
            high_order: false,
            node_offset: 0,
            element_offset: 0,
            mass_unit: MassUnit::Si,
            merge_tolerance_factor: default_merge_tolerance_factor(),
            fix_point_tolerance_factor: default_fix_point_tolerance_factor(),
            beam_normals_per_element: false,
            export: ExportSettings::default(),
        }
    }
}

impl StructureDefinition {
    pub fn from_json_str(json: &str) -> FeaMeshResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FeaMeshResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Structural parts plus one pseudo-part per fixed point
    pub fn part_count(&self) -> usize {
        self.parts.len() + self.fix_points.len()
    }

    /// Check cross references that would otherwise index out of bounds
    pub fn validate(&self) -> FeaMeshResult<()> {
        for ss in &self.subsurfaces {
            if ss.parent_part >= self.parts.len() {
                return Err(FeaMeshError::InvalidInput(format!(
                    "sub-surface '{}' references part {} of {}",
                    ss.name,
                    ss.parent_part,
                    self.parts.len()
                )));
            }
        }
        for fp in &self.fix_points {
            if fp.parent_part >= self.parts.len() {
                return Err(FeaMeshError::InvalidInput(format!(
                    "fixed point '{}' references part {} of {}",
                    fp.name,
                    fp.parent_part,
                    self.parts.len()
                )));
            }
        }
        Ok(())
    }

    pub fn snapshot_materials(&self) -> Vec<SimpleFeaMaterial> {
        self.materials
            .iter()
            .map(|m| match m.orthotropic {
                Some(constants) => SimpleFeaMaterial::orthotropic(&m.name, m.density, constants),
                None => SimpleFeaMaterial::isotropic(
                    &m.name,
                    m.elastic_modulus,
                    m.poisson_ratio,
                    m.density,
                    m.thermal_expansion,
                ),
            })
            .collect()
    }

    /// Flatten property definitions, resolving material names to indices
    ///
    /// Unknown materials leave `material_index` unset and are reported in
    /// `diagnostics`.
    pub fn snapshot_properties(&self, diagnostics: &mut Vec<FeaMeshError>) -> Vec<SimpleFeaProperty> {
        self.properties
            .iter()
            .map(|p| {
                let material_index = self.materials.iter().position(|m| m.name == p.material);
                if material_index.is_none() {
                    warn!("Property '{}' references unknown material '{}'", p.name, p.material);
                    diagnostics.push(FeaMeshError::MissingMaterialIndex {
                        property: p.name.clone(),
                        material: p.material.clone(),
                    });
                }
                let prop = match p.kind {
                    PropertyType::Shell => SimpleFeaProperty::shell(&p.name, p.thickness, material_index),
                    PropertyType::Beam => SimpleFeaProperty::beam(
                        &p.name,
                        p.cross_section,
                        SectionConstants {
                            area: p.area,
                            izz: p.izz,
                            iyy: p.iyy,
                            izy: p.izy,
                            ixx: p.ixx,
                        },
                        p.dims,
                        material_index,
                    ),
                };
                prop.with_material_name(&p.material)
            })
            .collect()
    }

    /// Fixed points; pseudo-part indices follow the structural parts
    pub fn snapshot_fix_points(&self) -> Vec<FixPoint> {
        self.fix_points
            .iter()
            .enumerate()
            .map(|(i, fp)| {
                let mut fix_point = FixPoint::new(
                    &fp.name,
                    self.parts.len() + i,
                    fp.parent_part,
                    fp.positions.iter().copied().map(vec3).collect(),
                );
                fix_point.placement = fp.placement;
                fix_point.mass = fp.mass;
                fix_point
            })
            .collect()
    }

    pub fn snapshot_boundary_conditions(&self) -> Vec<SimpleBc> {
        self.boundary_conditions
            .iter()
            .map(|bc| {
                let constraints = ConstraintSet::from_dofs(bc.constraints.iter().copied());
                match bc.selector {
                    BcSelector::YLessThan(y) => SimpleBc::y_less_than(y, constraints),
                    BcSelector::Part(p) => SimpleBc::part(p, constraints),
                    BcSelector::Subsurface(s) => SimpleBc::subsurface(s, constraints),
                }
            })
            .collect()
    }

    /// Orientation vector of a part or sub-surface; `None` means use the surface U tangent
    pub fn global_orientation(&self, part: Option<usize>, subsurface: Option<usize>) -> Option<Vec3> {
        let mode = match (subsurface, part) {
            (Some(ss), _) => self.subsurfaces.get(ss).map(|s| s.orientation),
            (None, Some(p)) => self.parts.get(p).map(|p| p.orientation),
            (None, None) => None,
        }?;
        match mode {
            OrientationMode::SurfaceU => None,
            OrientationMode::Global(v) => Some(vec3(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "name": "Wing",
        "parts": [
            { "name": "Skin", "kind": "skin", "property": 0, "cap_property": 1 },
            { "name": "Rib 1", "kind": "rib", "property": 0, "cap_property": 1,
              "included_elements": "shell_and_beam", "orientation": { "global": [0, 1, 0] } }
        ],
        "subsurfaces": [ { "name": "Door", "parent_part": 0, "property": 0 } ],
        "properties": [
            { "name": "Skin Shell", "kind": "shell", "thickness": 0.002, "material": "Al" },
            { "name": "Cap", "kind": "beam", "cross_section": "rect", "dims": [0.02, 0.01, 0, 0, 0, 0], "material": "Ti" }
        ],
        "materials": [ { "name": "Al", "density": 2700.0, "elastic_modulus": 70e9, "poisson_ratio": 0.33 } ],
        "fix_points": [ { "name": "Engine", "parent_part": 1, "positions": [[1, 2, 3]], "mass": 10.0 } ],
        "boundary_conditions": [ { "selector": { "y_less_than": 0.1 }, "constraints": ["tx", "ty", "tz"] } ],
        "settings": { "high_order": true, "mass_unit": "mpa" }
    }"#;

    #[test]
    fn test_parse_structure() {
        let s = StructureDefinition::from_json_str(JSON).unwrap();
        assert_eq!(s.parts.len(), 2);
        assert_eq!(s.part_count(), 3);
        assert_eq!(s.parts[1].included_elements, IncludedElements::ShellAndBeam);
        assert!(s.settings.high_order);
        assert_eq!(s.settings.mass_unit.label(), "tonne");
        assert_eq!(s.settings.merge_tolerance_factor, 1.0e-9);
        s.validate().unwrap();
    }

    #[test]
    fn test_snapshot_properties_reports_missing_material() {
        let s = StructureDefinition::from_json_str(JSON).unwrap();
        let mut diagnostics = Vec::new();
        let props = s.snapshot_properties(&mut diagnostics);
        assert_eq!(props[0].material_index, Some(0));
        assert_eq!(props[1].material_index, None);
        assert!((props[1].section.area - 2.0e-4).abs() < 1e-12);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], FeaMeshError::MissingMaterialIndex { .. }));
    }

    #[test]
    fn test_snapshot_fix_points_and_bcs() {
        let s = StructureDefinition::from_json_str(JSON).unwrap();
        let fps = s.snapshot_fix_points();
        assert_eq!(fps[0].part_index, 2);
        assert_eq!(fps[0].positions[0], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(fps[0].point_mass(), Some(10.0));

        let bcs = s.snapshot_boundary_conditions();
        assert_eq!(bcs[0].constraints.as_nastran_digits(), "123");
    }

    #[test]
    fn test_global_orientation_lookup() {
        let s = StructureDefinition::from_json_str(JSON).unwrap();
        assert_eq!(s.global_orientation(Some(1), None), Some(Vec3::y()));
        assert_eq!(s.global_orientation(Some(0), None), None);
        assert_eq!(s.global_orientation(Some(1), Some(0)), None);
    }

    #[test]
    fn test_validate_rejects_bad_parent() {
        let mut s = StructureDefinition::from_json_str(JSON).unwrap();
        s.subsurfaces[0].parent_part = 7;
        assert!(matches!(s.validate(), Err(FeaMeshError::InvalidInput(_))));
    }

    #[test]
    fn test_rebased_export_paths() {
        let settings = ExportSettings {
            nastran: Some(PathBuf::from("wing.dat")),
            mass: Some(PathBuf::from("/tmp/mass.txt")),
            ..Default::default()
        };
        let rebased = settings.rebased(Path::new("/out"));
        assert_eq!(rebased.nastran, Some(PathBuf::from("/out/wing.dat")));
        assert_eq!(rebased.mass, Some(PathBuf::from("/tmp/mass.txt")));
        assert!(rebased.calculix.is_none());
    }
}

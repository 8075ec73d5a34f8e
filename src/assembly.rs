//! Element assembly from triangle soups and intersection chains
//!
//! Every element creates its own corner and mid points here; coincident
//! points are merged later by [`dedup`](crate::dedup). Beam caps come first in
//! chain order, followed by shells in surface and face order.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::elements::{ElementShape, FeaElement, NodeId};
use crate::error::FeaMeshError;
use crate::math::{project_onto_plane, signed_angle, tri_normal, vec3, BoundingBox, Vec3};
use crate::structure::{StructureDefinition, TrimGroup};
use crate::surface::{IntersectionChain, MeshInput, SurfaceQuery, SurfaceRole, SurfaceSoup};

/// Raw points and the elements that reference them
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub points: Vec<Vec3>,
    pub elements: Vec<FeaElement>,
}

impl Assembly {
    fn add_point(&mut self, p: Vec3) -> NodeId {
        self.points.push(p);
        self.points.len() - 1
    }

    fn add_points<const N: usize>(&mut self, pts: [Vec3; N]) -> [NodeId; N] {
        pts.map(|p| self.add_point(p))
    }
}

fn chain_endpoints(chain: &IntersectionChain) -> Option<(Vec3, Vec3)> {
    Some((vec3(*chain.points.first()?), vec3(*chain.points.last()?)))
}

/// Drop the sub-surface index of chains that duplicate another sub-surface's chain
///
/// Two non-border chains with sub-surface indices, the same tessellation
/// length, different indices and matching endpoints (in either direction)
/// trace the same curve; the higher sub-surface index loses.
///
/// # Returns
/// Effective sub-surface index per chain
pub fn remove_duplicate_subsurface_chains(chains: &[IntersectionChain], tolerance: f64) -> Vec<Option<usize>> {
    let mut ss: Vec<Option<usize>> = chains.iter().map(|c| c.subsurface).collect();
    let same = |a: &Vec3, b: &Vec3| (a - b).norm() <= tolerance;

    for i in 0..chains.len() {
        for j in (i + 1)..chains.len() {
            let (ci, cj) = (&chains[i], &chains[j]);
            if ci.border || cj.border || ci.points.len() != cj.points.len() {
                continue;
            }
            let (Some(si), Some(sj)) = (ss[i], ss[j]) else {
                continue;
            };
            if si == sj {
                continue;
            }
            let (Some((a0, a1)), Some((b0, b1))) = (chain_endpoints(ci), chain_endpoints(cj)) else {
                continue;
            };
            if (same(&a0, &b0) && same(&a1, &b1)) || (same(&a0, &b1) && same(&a1, &b0)) {
                debug!("Chains {i} and {j} duplicate sub-surfaces {si} and {sj}");
                if si > sj {
                    ss[i] = None;
                } else {
                    ss[j] = None;
                }
            }
        }
    }
    ss
}

/// True when `p` lies beyond every plane of the group
fn trimmed_by_group(p: &Vec3, group: &TrimGroup, tolerance: f64) -> bool {
    !group.planes.is_empty()
        && group
            .planes
            .iter()
            .all(|plane| (p - vec3(plane.point)).dot(&vec3(plane.normal)) >= tolerance)
}

fn face_centroid(surf: &SurfaceSoup, nodes: &[usize]) -> Vec3 {
    let sum: Vec3 = nodes.iter().map(|&n| surf.point(n)).sum();
    sum / nodes.len() as f64
}

/// Keep flag per face of `surf`; faces whose centroid is cut away by any trim group are dropped
pub fn cull_trimmed_faces(surf: &SurfaceSoup, trim_groups: &[TrimGroup], tolerance: f64) -> Vec<bool> {
    surf.faces
        .iter()
        .map(|face| {
            let c = face_centroid(surf, &face.nodes);
            !trim_groups.iter().any(|g| trimmed_by_group(&c, g, tolerance))
        })
        .collect()
}

/// Shell elements of one surface
pub fn build_shell_elements(
    structure: &StructureDefinition,
    surf: &SurfaceSoup,
    keep: &[bool],
    high_order: bool,
    assembly: &mut Assembly,
) {
    for (f, face) in surf.faces.iter().enumerate() {
        if !keep.get(f).copied().unwrap_or(true) {
            continue;
        }
        let subsurface = face.subsurfaces.iter().min().copied();
        let corners: Vec<Vec3> = face.nodes.iter().map(|&n| surf.point(n)).collect();
        let centroid = face_centroid(surf, &face.nodes);

        let reference = structure
            .global_orientation(Some(surf.part), subsurface)
            .or_else(|| surf.frame_at(&centroid, Some(f)).map(|frame| frame.u_tangent));
        let orientation = tri_normal(&corners[0], &corners[1], &corners[2])
            .zip(reference)
            .and_then(|(normal, v)| project_onto_plane(&v, &normal))
            .unwrap_or_else(Vec3::zeros);

        let mid = |a: usize, b: usize| (corners[a] + corners[b]) * 0.5;
        let shape = if corners.len() == 4 {
            let c = assembly.add_points([corners[0], corners[1], corners[2], corners[3]]);
            let mids = high_order.then(|| assembly.add_points([mid(0, 1), mid(1, 2), mid(2, 3), mid(3, 0)]));
            ElementShape::Quad { corners: c, mids, orientation }
        } else {
            let c = assembly.add_points([corners[0], corners[1], corners[2]]);
            let mids = high_order.then(|| assembly.add_points([mid(0, 1), mid(1, 2), mid(2, 0)]));
            ElementShape::Tri { corners: c, mids, orientation }
        };

        let mut element = FeaElement::new(surf.part, surf.surf_num, shape);
        element.subsurface_index = subsurface;
        assembly.elements.push(element);
    }
}

/// How a chain qualifies for beam caps
struct CapSource {
    part: usize,
    subsurface: Option<usize>,
    /// Surface whose normal orients the caps
    normal_surface: usize,
}

fn cap_source(
    structure: &StructureDefinition,
    input: &MeshInput,
    chain: &IntersectionChain,
    subsurface: Option<usize>,
) -> Option<CapSource> {
    if chain.border {
        return None;
    }
    let [a, b] = chain.surfaces;
    let (sa, sb) = (&input.surfaces[a], &input.surfaces[b]);
    let creates_beams = |part: usize| {
        structure
            .parts
            .get(part)
            .is_some_and(|p| p.included_elements.creates_beams())
    };

    let roles = (sa.role, sb.role);
    if let (SurfaceRole::Part, SurfaceRole::Skin) | (SurfaceRole::Skin, SurfaceRole::Part) = roles {
        let (part_side, skin_side) = if sa.role == SurfaceRole::Part { (a, b) } else { (b, a) };
        let structural = input.surfaces[part_side].part;
        let skin = input.surfaces[skin_side].part;
        let part = if creates_beams(structural) {
            structural
        } else if creates_beams(skin) {
            skin
        } else {
            return None;
        };
        return Some(CapSource { part, subsurface: None, normal_surface: skin_side });
    }

    let ss = subsurface?;
    let ss_creates_beams = structure
        .subsurfaces
        .get(ss)
        .is_some_and(|s| s.included_elements.creates_beams());
    if sa.part == sb.part && ss_creates_beams {
        return Some(CapSource { part: sa.part, subsurface: Some(ss), normal_surface: a });
    }
    None
}

/// Per-part box whose center sets the walk direction of cap chains
///
/// Only structural (`SurfaceRole::Part`) surfaces count; a part without any
/// falls back to all of its surfaces.
pub fn cap_reference_boxes(input: &MeshInput) -> HashMap<usize, BoundingBox> {
    let mut structural: HashMap<usize, BoundingBox> = HashMap::new();
    let mut all: HashMap<usize, BoundingBox> = HashMap::new();
    for surf in &input.surfaces {
        let target = if surf.role == SurfaceRole::Part { &mut structural } else { &mut all };
        let bbox = target.entry(surf.part).or_default();
        for p in &surf.points {
            bbox.add(&vec3(*p));
        }
    }
    for (part, bbox) in all {
        structural.entry(part).or_insert(bbox);
    }
    structural
}

/// Beam caps along eligible intersection chains
pub fn build_cap_elements(
    structure: &StructureDefinition,
    input: &MeshInput,
    chain_subsurfaces: &[Option<usize>],
    tolerance: f64,
    assembly: &mut Assembly,
    diagnostics: &mut Vec<FeaMeshError>,
) {
    let part_boxes = cap_reference_boxes(input);

    for (c, chain) in input.chains.iter().enumerate() {
        let subsurface = chain_subsurfaces.get(c).copied().flatten();
        let Some(source) = cap_source(structure, input, chain, subsurface) else {
            continue;
        };
        if chain.points.len() < 2 {
            continue;
        }
        let normal_surf = &input.surfaces[source.normal_surface];
        let center = part_boxes.get(&source.part).map(|b| b.center()).unwrap_or_else(Vec3::zeros);

        let mut points: Vec<Vec3> = chain.points.iter().copied().map(vec3).collect();
        let mut normals: Vec<Vec3> = points
            .iter()
            .map(|p| normal_surf.frame_at(p, None).map(|f| f.normal).unwrap_or_else(Vec3::zeros))
            .collect();

        let first = points[0] - center;
        let last = points[points.len() - 1] - center;
        if signed_angle(&first, &last, &center) < 0.0 {
            points.reverse();
            normals.reverse();
        }

        let mut count = 0;
        for j in 1..points.len() {
            let (p0, p1) = (points[j - 1], points[j]);
            if (p1 - p0).norm() <= tolerance {
                warn!("Degenerate beam segment {} on chain {c} skipped", j - 1);
                diagnostics.push(FeaMeshError::DegenerateElement { chain: c, segment: j - 1 });
                continue;
            }
            let ends = assembly.add_points([p0, p1]);
            let mid = assembly.add_point((p0 + p1) * 0.5);
            let shape = ElementShape::Beam { ends, mid, normals: [normals[j - 1], normals[j]] };
            let mut element = FeaElement::new(source.part, normal_surf.surf_num, shape);
            element.subsurface_index = source.subsurface;
            element.chain_index = Some(c);
            assembly.elements.push(element);
            count += 1;
        }
        debug!("Chain {c}: {count} cap elements for part {}", source.part);
    }
}

/// Assemble beam caps and shells for the whole input
///
/// `tolerance` is the geometric tolerance used for trimming, duplicate
/// chain detection and degenerate segments.
pub fn assemble(
    structure: &StructureDefinition,
    input: &MeshInput,
    tolerance: f64,
    diagnostics: &mut Vec<FeaMeshError>,
) -> Assembly {
    let mut assembly = Assembly::default();

    let chain_subsurfaces = remove_duplicate_subsurface_chains(&input.chains, tolerance);
    build_cap_elements(structure, input, &chain_subsurfaces, tolerance, &mut assembly, diagnostics);
    let beam_count = assembly.elements.len();

    let mut culled = 0;
    for surf in &input.surfaces {
        let keep = cull_trimmed_faces(surf, &structure.trim_groups, tolerance);
        culled += keep.iter().filter(|k| !**k).count();
        build_shell_elements(structure, surf, &keep, structure.settings.high_order, &mut assembly);
    }

    info!(
        "Assembled {} beam and {} shell elements ({} faces trimmed)",
        beam_count,
        assembly.elements.len() - beam_count,
        culled
    );
    assembly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementKind;
    use crate::structure::{IncludedElements, PartDef, SubSurfaceDef, TrimPlane};
    use crate::surface::SoupFace;
    use approx::assert_relative_eq;

    fn part(name: &str, included: IncludedElements) -> PartDef {
        PartDef {
            name: name.into(),
            kind: Default::default(),
            property: 0,
            cap_property: 0,
            included_elements: included,
            orientation: Default::default(),
        }
    }

    fn soup(part: usize, role: SurfaceRole, points: Vec<[f64; 3]>, faces: Vec<Vec<usize>>) -> SurfaceSoup {
        SurfaceSoup {
            part,
            surf_num: 0,
            role,
            flip_normal: false,
            points,
            faces: faces.into_iter().map(|nodes| SoupFace { nodes, subsurfaces: vec![] }).collect(),
            u_tangents: vec![],
            normals: vec![],
        }
    }

    fn chain(surfaces: [usize; 2], points: Vec<[f64; 3]>, subsurface: Option<usize>) -> IntersectionChain {
        IntersectionChain { surfaces, points, border: false, subsurface }
    }

    /// Skin plate in z = 0 and a rib standing on it along y = 0.5
    fn skin_and_rib(rib: IncludedElements) -> (StructureDefinition, MeshInput) {
        let structure = StructureDefinition {
            name: "T".into(),
            parts: vec![part("Skin", IncludedElements::Shell), part("Rib", rib)],
            ..Default::default()
        };
        let input = MeshInput {
            surfaces: vec![
                soup(0, SurfaceRole::Skin, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]], vec![vec![0, 1, 2, 3]]),
                soup(1, SurfaceRole::Part, vec![[0.0, 0.5, 0.0], [1.0, 0.5, 0.0], [1.0, 0.5, 1.0], [0.0, 0.5, 1.0]], vec![vec![0, 1, 2, 3]]),
            ],
            chains: vec![chain([1, 0], vec![[0.0, 0.5, 0.0], [0.5, 0.5, 0.0], [1.0, 0.5, 0.0]], None)],
        };
        (structure, input)
    }

    #[test]
    fn test_caps_on_part_skin_intersection() {
        let (structure, input) = skin_and_rib(IncludedElements::ShellAndBeam);
        let mut diagnostics = Vec::new();
        let assembly = assemble(&structure, &input, 1e-9, &mut diagnostics);

        let beams: Vec<_> = assembly.elements.iter().filter(|e| e.kind() == ElementKind::Beam).collect();
        assert_eq!(beams.len(), 2);
        assert!(beams.iter().all(|b| b.part_index == 1 && b.chain_index == Some(0)));
        // caps are oriented by the skin normal
        if let ElementShape::Beam { normals, .. } = &beams[0].shape {
            assert_relative_eq!(normals[0], Vec3::z());
        }
        assert_eq!(assembly.elements.len(), 4);
        assert!(assembly.elements[0].kind() == ElementKind::Beam);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_no_caps_for_shell_only_parts() {
        let (structure, input) = skin_and_rib(IncludedElements::Shell);
        let assembly = assemble(&structure, &input, 1e-9, &mut Vec::new());
        assert!(assembly.elements.iter().all(|e| e.is_shell()));
    }

    #[test]
    fn test_degenerate_segment_skipped() {
        let (structure, mut input) = skin_and_rib(IncludedElements::Beam);
        input.chains[0].points.insert(1, [0.0, 0.5, 0.0]);
        let mut diagnostics = Vec::new();
        let assembly = assemble(&structure, &input, 1e-9, &mut diagnostics);
        let beams = assembly.elements.iter().filter(|e| e.kind() == ElementKind::Beam).count();
        assert_eq!(beams, 2);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], FeaMeshError::DegenerateElement { chain: 0, .. }));
    }

    #[test]
    fn test_high_order_shells_get_midpoints() {
        let (mut structure, input) = skin_and_rib(IncludedElements::Shell);
        structure.settings.high_order = true;
        let assembly = assemble(&structure, &input, 1e-9, &mut Vec::new());
        let quad = &assembly.elements[0];
        assert_eq!(quad.kind(), ElementKind::Quad8);
        let mids = quad.mid_nodes();
        assert_relative_eq!(assembly.points[mids[0]], Vec3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(assembly.points[mids[3]], Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_global_orientation_projected_into_plane() {
        let (mut structure, input) = skin_and_rib(IncludedElements::Shell);
        structure.parts[1].orientation = crate::structure::OrientationMode::Global([1.0, 1.0, 0.0]);
        let assembly = assemble(&structure, &input, 1e-9, &mut Vec::new());
        // rib lies in the plane y = 0.5, so (1, 1, 0) projects onto x
        assert_relative_eq!(assembly.elements[1].orientation().unwrap(), Vec3::x(), epsilon = 1e-12);
        // skin has no tangent samples
        assert_eq!(assembly.elements[0].orientation().unwrap(), Vec3::zeros());
    }

    #[test]
    fn test_lowest_subsurface_tag_wins() {
        let (mut structure, mut input) = skin_and_rib(IncludedElements::Shell);
        structure.subsurfaces = (0..3)
            .map(|i| SubSurfaceDef {
                name: format!("SS{i}"),
                parent_part: 0,
                property: 0,
                cap_property: 0,
                included_elements: IncludedElements::Shell,
                orientation: Default::default(),
            })
            .collect();
        input.surfaces[0].faces[0].subsurfaces = vec![2, 1];
        let assembly = assemble(&structure, &input, 1e-9, &mut Vec::new());
        assert_eq!(assembly.elements[0].subsurface_index, Some(1));
        assert_eq!(assembly.elements[1].subsurface_index, None);
    }

    #[test]
    fn test_trim_group_culls_faces() {
        let (mut structure, input) = skin_and_rib(IncludedElements::Shell);
        structure.trim_groups = vec![TrimGroup {
            planes: vec![TrimPlane { point: [0.0, 0.0, 0.25], normal: [0.0, 0.0, 1.0] }],
        }];
        let assembly = assemble(&structure, &input, 1e-9, &mut Vec::new());
        // the rib centroid sits at z = 0.5, the skin at z = 0
        assert_eq!(assembly.elements.len(), 1);
        assert_eq!(assembly.elements[0].part_index, 0);
    }

    #[test]
    fn test_duplicate_subsurface_chains_lower_index_wins() {
        let pts = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let rev = vec![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let chains = vec![
            chain([0, 0], pts.clone(), Some(3)),
            chain([0, 0], rev, Some(1)),
            chain([0, 0], pts.clone(), None),
            chain([0, 0], vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [1.0, 0.0, 0.0]], Some(2)),
        ];
        let ss = remove_duplicate_subsurface_chains(&chains, 1e-9);
        assert_eq!(ss, vec![None, Some(1), None, Some(2)]);
    }

    #[test]
    fn test_walk_reference_uses_structural_surfaces() {
        let (_, mut input) = skin_and_rib(IncludedElements::Beam);
        // a far-away skin-role surface of the rib must not move its reference box
        input.surfaces.push(soup(1, SurfaceRole::Skin, vec![[10.0, 10.0, 10.0], [11.0, 10.0, 10.0], [11.0, 11.0, 10.0]], vec![vec![0, 1, 2]]));
        let boxes = cap_reference_boxes(&input);
        assert_relative_eq!(boxes[&1].center(), Vec3::new(0.5, 0.5, 0.5));
        // the skin part has no structural surface and keeps its own box
        assert_relative_eq!(boxes[&0].center(), Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_walk_direction_is_normalized() {
        let (structure, mut input) = skin_and_rib(IncludedElements::Beam);
        let mut forward = assemble(&structure, &input, 1e-9, &mut Vec::new());
        input.chains[0].points.reverse();
        let mut backward = assemble(&structure, &input, 1e-9, &mut Vec::new());
        forward.elements.truncate(2);
        backward.elements.truncate(2);
        let start = |a: &Assembly| a.points[a.elements[0].corner_nodes()[0]];
        assert_relative_eq!(start(&forward), start(&backward));
    }
}

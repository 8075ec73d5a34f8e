//! Per-structure mesh container: canonical nodes, numbered elements and the
//! tagging, boundary condition and suppression phases that run on them

use std::ops::Range;

use log::{debug, info, warn};

use crate::assembly::Assembly;
use crate::dedup::dedup_points;
use crate::elements::{
    ElementKind, ElementShape, FeaElement, FeaNode, FixPoint, NodeId, SimpleBc, SimpleFeaMaterial,
    SimpleFeaProperty,
};
use crate::error::{FeaMeshError, FeaMeshResult};
use crate::mass::MassSummary;
use crate::structure::{PartDef, StructSettings, StructureDefinition, SubSurfaceDef};

/// Export bucket of a node, derived from its tags and fixed point flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeBucket {
    /// Tagged by exactly one part or sub-surface (the tag)
    Owned(usize),
    /// Matched to a fixed point (the fixed point's part index)
    FixedPoint(usize),
    /// Shared by two or more parts/sub-surfaces
    Intersection,
    /// Not tagged by anything
    Remaining,
}

/// Contiguous block of elements written together by every exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementGroup {
    Part(usize),
    SubSurface(usize),
    /// Point masses of a fixed point (index into `fix_points`)
    FixPoint(usize),
}

/// One named block of output: a node bucket, an element group, or both
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSection {
    pub name: String,
    pub nodes: Option<NodeBucket>,
    pub elements: Option<ElementGroup>,
}

#[derive(Debug)]
pub struct FeaMesh {
    pub name: String,
    pub nodes: Vec<FeaNode>,
    pub elements: Vec<FeaElement>,
    pub parts: Vec<PartDef>,
    pub subsurfaces: Vec<SubSurfaceDef>,
    pub fix_points: Vec<FixPoint>,
    pub properties: Vec<SimpleFeaProperty>,
    pub materials: Vec<SimpleFeaMaterial>,
    pub settings: StructSettings,
    pub merge_tolerance: f64,
    pub mass: MassSummary,
    /// Recoverable problems met while building the mesh
    pub diagnostics: Vec<FeaMeshError>,
}

impl FeaMesh {
    /// Empty mesh carrying the structure's flattened metadata
    pub fn new(structure: &StructureDefinition) -> Self {
        let mut diagnostics = Vec::new();
        let properties = structure.snapshot_properties(&mut diagnostics);
        Self {
            name: structure.name.clone(),
            nodes: Vec::new(),
            elements: Vec::new(),
            parts: structure.parts.clone(),
            subsurfaces: structure.subsurfaces.clone(),
            fix_points: structure.snapshot_fix_points(),
            properties,
            materials: structure.snapshot_materials(),
            settings: structure.settings.clone(),
            merge_tolerance: 0.0,
            mass: MassSummary::default(),
            diagnostics,
        }
    }

    /// Number of parts including fixed point pseudo-parts
    pub fn part_count(&self) -> usize {
        self.parts.len() + self.fix_points.len()
    }

    /// Name of a part or fixed point pseudo-part
    pub fn part_name(&self, part: usize) -> &str {
        if let Some(p) = self.parts.get(part) {
            &p.name
        } else {
            self.fix_points
                .get(part - self.parts.len())
                .map(|f| f.name.as_str())
                .unwrap_or("")
        }
    }

    /// Name of whatever a node tag refers to
    pub fn tag_name(&self, tag: usize) -> &str {
        match tag.checked_sub(self.part_count()) {
            Some(ss) => self.subsurfaces.get(ss).map(|s| s.name.as_str()).unwrap_or(""),
            None => self.part_name(tag),
        }
    }

    /// Merge coincident points of the assembly into canonical nodes
    pub fn load_assembly(&mut self, assembly: Assembly, tolerance: f64) -> FeaMeshResult<()> {
        let map = dedup_points(&assembly.points, tolerance);
        if map.canonical_count() == 0 {
            return Err(FeaMeshError::EmptyMesh);
        }
        info!(
            "Merged {} points into {} nodes (tolerance {:e})",
            assembly.points.len(),
            map.canonical_count(),
            tolerance
        );

        self.merge_tolerance = tolerance;
        self.nodes = map
            .used_points(&assembly.points)
            .into_iter()
            .enumerate()
            .map(|(i, p)| FeaNode::new(i + 1, p))
            .collect();
        self.elements = assembly.elements;
        for element in &mut self.elements {
            element.remap_nodes(|raw| map.canonical[raw]);
        }
        Ok(())
    }

    /// Tag nodes with the parts and sub-surfaces of the elements using them
    ///
    /// Shells of beam-only sub-surfaces contribute no tags.
    pub fn tag_nodes(&mut self) {
        let part_count = self.part_count();
        for element in &self.elements {
            let tag = match element.subsurface_index {
                Some(ss) => {
                    let beam_only = self
                        .subsurfaces
                        .get(ss)
                        .is_some_and(|s| !s.included_elements.keeps_shells());
                    if beam_only && element.is_shell() {
                        continue;
                    }
                    part_count + ss
                }
                None if element.part_index < self.parts.len() => element.part_index,
                None => continue,
            };
            for id in element.all_nodes() {
                self.nodes[id].add_tag(tag);
            }
        }
    }

    /// Match fixed points to tagged nodes and attach point masses
    ///
    /// Each position resolves to the first tagged node within `tolerance`.
    /// Unmatched positions are reported and left unresolved.
    pub fn tag_fix_points(&mut self, tolerance: f64) {
        for f in 0..self.fix_points.len() {
            let fix_point = &self.fix_points[f];
            let part = fix_point.part_index;
            let mass = fix_point.point_mass();
            let instances = fix_point.positions.len();

            for k in 0..instances {
                let target = self.fix_points[f].positions[k];
                let found = self
                    .nodes
                    .iter()
                    .position(|n| n.tag_count() > 0 && n.distance_to(&target) <= tolerance);

                let Some(id) = found else {
                    let name = if instances > 1 {
                        format!("{} (instance {})", self.fix_points[f].name, k + 1)
                    } else {
                        self.fix_points[f].name.clone()
                    };
                    warn!("No node found for {name}; adjust mesh density");
                    self.diagnostics.push(FeaMeshError::UnresolvedFixPoint(name));
                    continue;
                };

                let node = &mut self.nodes[id];
                node.add_tag(part);
                node.fixed_point = true;
                self.fix_points[f].resolved[k] = Some(id);
                debug!("Fixed point {} instance {} -> node {}", self.fix_points[f].name, k + 1, id + 1);

                if let Some(mass) = mass {
                    self.elements
                        .push(FeaElement::new(part, 0, ElementShape::PointMass { node: id, mass }));
                }
            }
        }
    }

    /// OR every rule's constraints into the nodes it selects, in rule order
    pub fn apply_boundary_conditions(&mut self, bcs: &[SimpleBc]) {
        let part_count = self.part_count();
        for bc in bcs {
            for node in &mut self.nodes {
                bc.apply(node, part_count);
            }
        }
        let constrained = self.nodes.iter().filter(|n| !n.constraints.is_empty()).count();
        debug!("{} boundary conditions constrain {} nodes", bcs.len(), constrained);
    }

    /// Drop shells of beam-only parts and sub-surfaces
    pub fn remove_suppressed_elements(&mut self) {
        let before = self.elements.len();
        let parts = &self.parts;
        let subsurfaces = &self.subsurfaces;
        self.elements.retain(|e| {
            if !e.is_shell() {
                return true;
            }
            let included = match e.subsurface_index {
                Some(ss) => subsurfaces.get(ss).map(|s| s.included_elements),
                None => parts.get(e.part_index).map(|p| p.included_elements),
            };
            included.map_or(true, |inc| inc.keeps_shells())
        });
        let removed = before - self.elements.len();
        if removed > 0 {
            info!("Removed {removed} suppressed shell elements");
        }
    }

    /// Export group of an element
    pub fn element_group(&self, element: &FeaElement) -> ElementGroup {
        if let ElementShape::PointMass { .. } = element.shape {
            if let Some(f) = element.part_index.checked_sub(self.parts.len()) {
                return ElementGroup::FixPoint(f);
            }
        }
        match element.subsurface_index {
            Some(ss) => ElementGroup::SubSurface(ss),
            None => ElementGroup::Part(element.part_index),
        }
    }

    /// Sort elements into export order so element ids are shared by every writer
    ///
    /// Order is parts, then sub-surfaces, then fixed points; inside a group
    /// shells (by surface number) precede beams precede point masses. The
    /// sort is stable, so creation order breaks ties.
    pub fn finalize_numbering(&mut self) {
        let mut keyed: Vec<_> = std::mem::take(&mut self.elements)
            .into_iter()
            .map(|e| {
                let rank = match e.kind() {
                    ElementKind::Beam => (1, 0),
                    ElementKind::PointMass => (2, 0),
                    _ => (0, e.surf_num),
                };
                ((self.element_group(&e), rank), e)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        self.elements = keyed.into_iter().map(|(_, e)| e).collect();
    }

    /// Element id as written, including the configured offset
    pub fn element_id(&self, position: usize) -> usize {
        position + 1 + self.settings.element_offset
    }

    /// Node id as written, including the configured offset
    pub fn node_id(&self, node: NodeId) -> usize {
        self.nodes[node].index + self.settings.node_offset
    }

    /// Contiguous element ranges per group, in export order
    ///
    /// Only meaningful after [`finalize_numbering`](Self::finalize_numbering).
    pub fn group_ranges(&self) -> Vec<(ElementGroup, Range<usize>)> {
        let mut ranges: Vec<(ElementGroup, Range<usize>)> = Vec::new();
        for (i, e) in self.elements.iter().enumerate() {
            let group = self.element_group(e);
            match ranges.last_mut() {
                Some((g, r)) if *g == group => r.end = i + 1,
                _ => ranges.push((group, i..i + 1)),
            }
        }
        ranges
    }

    pub fn node_bucket(&self, node: &FeaNode) -> NodeBucket {
        match node.tag_count() {
            0 => NodeBucket::Remaining,
            1 => node.tags.iter().next().map_or(NodeBucket::Remaining, |&t| NodeBucket::Owned(t)),
            _ if node.fixed_point => node
                .tags
                .iter()
                .find(|&&t| t >= self.parts.len() && t < self.part_count())
                .map_or(NodeBucket::Intersection, |&t| NodeBucket::FixedPoint(t)),
            _ => NodeBucket::Intersection,
        }
    }

    /// Nodes of one bucket in index order
    pub fn nodes_in_bucket(&self, bucket: NodeBucket) -> impl Iterator<Item = &FeaNode> + '_ {
        self.nodes.iter().filter(move |n| self.node_bucket(n) == bucket)
    }

    /// Every bucket that holds nodes, in export order
    ///
    /// Parts, sub-surfaces, fixed points, intersections, remaining nodes.
    pub fn node_buckets(&self) -> Vec<NodeBucket> {
        let part_count = self.part_count();
        let mut buckets: Vec<NodeBucket> = (0..self.parts.len())
            .chain(part_count..part_count + self.subsurfaces.len())
            .map(NodeBucket::Owned)
            .collect();
        buckets.extend((self.parts.len()..part_count).map(NodeBucket::FixedPoint));
        buckets.push(NodeBucket::Intersection);
        buckets.push(NodeBucket::Remaining);
        buckets
            .into_iter()
            .filter(|b| self.nodes_in_bucket(*b).next().is_some())
            .collect()
    }

    /// Output blocks in the order every writer emits them
    ///
    /// Parts, sub-surfaces and fixed points carry both their node bucket and
    /// element group; intersection and remaining nodes follow. Every node and
    /// element belongs to exactly one section.
    pub fn sections(&self) -> Vec<ExportSection> {
        let part_count = self.part_count();
        let mut sections = Vec::new();
        for (p, part) in self.parts.iter().enumerate() {
            sections.push(ExportSection {
                name: part.name.clone(),
                nodes: Some(NodeBucket::Owned(p)),
                elements: Some(ElementGroup::Part(p)),
            });
        }
        for (ss, sub) in self.subsurfaces.iter().enumerate() {
            sections.push(ExportSection {
                name: sub.name.clone(),
                nodes: Some(NodeBucket::Owned(part_count + ss)),
                elements: Some(ElementGroup::SubSurface(ss)),
            });
        }
        for (f, fix_point) in self.fix_points.iter().enumerate() {
            sections.push(ExportSection {
                name: fix_point.name.clone(),
                nodes: Some(NodeBucket::FixedPoint(fix_point.part_index)),
                elements: Some(ElementGroup::FixPoint(f)),
            });
        }
        for bucket in [NodeBucket::Intersection, NodeBucket::Remaining] {
            sections.push(ExportSection {
                name: self.bucket_name(bucket),
                nodes: Some(bucket),
                elements: None,
            });
        }
        sections
    }

    /// Element range of a group, empty when the group has no elements
    pub fn group_range(&self, ranges: &[(ElementGroup, Range<usize>)], group: ElementGroup) -> Range<usize> {
        ranges
            .iter()
            .find(|(g, _)| *g == group)
            .map_or(0..0, |(_, r)| r.clone())
    }

    /// Human-readable name of a bucket
    pub fn bucket_name(&self, bucket: NodeBucket) -> String {
        match bucket {
            NodeBucket::Owned(tag) | NodeBucket::FixedPoint(tag) => self.tag_name(tag).to_string(),
            NodeBucket::Intersection => "Intersections".to_string(),
            NodeBucket::Remaining => "Remaining".to_string(),
        }
    }

    pub fn group_name(&self, group: ElementGroup) -> &str {
        match group {
            ElementGroup::Part(p) => self.part_name(p),
            ElementGroup::SubSurface(ss) => self.subsurfaces.get(ss).map(|s| s.name.as_str()).unwrap_or(""),
            ElementGroup::FixPoint(f) => self.fix_points.get(f).map(|f| f.name.as_str()).unwrap_or(""),
        }
    }

    /// Shell or cap property index used by an element, `None` for point masses
    pub fn property_index(&self, element: &FeaElement) -> Option<usize> {
        let beam = match element.kind() {
            ElementKind::PointMass => return None,
            ElementKind::Beam => true,
            _ => false,
        };
        match element.subsurface_index {
            Some(ss) => self
                .subsurfaces
                .get(ss)
                .map(|s| if beam { s.cap_property } else { s.property }),
            None => self
                .parts
                .get(element.part_index)
                .map(|p| if beam { p.cap_property } else { p.property }),
        }
    }

    /// Resolved property of an element, if its index is in range
    pub fn property_of(&self, element: &FeaElement) -> Option<&SimpleFeaProperty> {
        self.property_index(element).and_then(|i| self.properties.get(i))
    }

    pub fn material_of(&self, property: &SimpleFeaProperty) -> Option<&SimpleFeaMaterial> {
        property.material_index.and_then(|m| self.materials.get(m))
    }

    /// Count of elements per kind
    pub fn count_kind(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ConstraintSet;
    use crate::math::Vec3;
    use crate::structure::IncludedElements;

    fn structure() -> StructureDefinition {
        StructureDefinition::from_json_str(
            r#"{
            "name": "Box",
            "parts": [ { "name": "Skin" }, { "name": "Rib", "property": 1 } ],
            "subsurfaces": [ { "name": "Hatch", "parent_part": 0 } ],
            "properties": [
                { "name": "P0", "kind": "shell", "thickness": 0.001, "material": "Al" },
                { "name": "P1", "kind": "shell", "thickness": 0.002, "material": "Al" }
            ],
            "materials": [ { "name": "Al", "density": 2700.0 } ],
            "fix_points": [ { "name": "Mount", "parent_part": 0, "positions": [[1, 0, 0]], "mass": 5.0 } ]
        }"#,
        )
        .unwrap()
    }

    fn tri(part: usize, ss: Option<usize>, corners: [NodeId; 3]) -> FeaElement {
        let mut e = FeaElement::new(part, 0, ElementShape::Tri { corners, mids: None, orientation: Vec3::zeros() });
        e.subsurface_index = ss;
        e
    }

    /// Two triangles per part sharing the edge (1,0,0)-(0,1,0)
    fn mesh() -> FeaMesh {
        let mut mesh = FeaMesh::new(&structure());
        let pts = [
            Vec3::zeros(),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ];
        mesh.nodes = pts.iter().enumerate().map(|(i, p)| FeaNode::new(i + 1, *p)).collect();
        mesh.elements = vec![tri(0, None, [0, 1, 2]), tri(1, None, [1, 3, 2]), tri(0, Some(0), [1, 4, 3])];
        mesh
    }

    #[test]
    fn test_tagging_and_buckets() {
        let mut mesh = mesh();
        mesh.tag_nodes();
        assert_eq!(mesh.node_bucket(&mesh.nodes[0]), NodeBucket::Owned(0));
        assert_eq!(mesh.node_bucket(&mesh.nodes[1]), NodeBucket::Intersection);
        assert_eq!(mesh.node_bucket(&mesh.nodes[4]), NodeBucket::Owned(3));
        assert_eq!(mesh.tag_name(3), "Hatch");

        let mut total = 0;
        for bucket in mesh.node_buckets() {
            total += mesh.nodes_in_bucket(bucket).count();
        }
        assert_eq!(total, mesh.nodes.len());
    }

    #[test]
    fn test_fix_point_resolution_and_point_mass() {
        let mut mesh = mesh();
        mesh.tag_nodes();
        mesh.tag_fix_points(1e-6);
        let node = &mesh.nodes[1];
        assert!(node.fixed_point);
        assert!(node.has_tag(2));
        assert_eq!(mesh.node_bucket(node), NodeBucket::FixedPoint(2));
        assert_eq!(mesh.fix_points[0].resolved, vec![Some(1)]);
        assert_eq!(mesh.count_kind(ElementKind::PointMass), 1);
        assert!(mesh.diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_fix_point_warns() {
        let mut mesh = mesh();
        mesh.fix_points[0].positions[0] = Vec3::new(9.0, 9.0, 9.0);
        mesh.tag_nodes();
        mesh.tag_fix_points(1e-6);
        assert_eq!(mesh.count_kind(ElementKind::PointMass), 0);
        assert!(matches!(&mesh.diagnostics[0], FeaMeshError::UnresolvedFixPoint(name) if name == "Mount"));
    }

    #[test]
    fn test_fix_point_ignores_untagged_nodes() {
        let mut mesh = mesh();
        mesh.tag_fix_points(1e-6);
        assert!(!mesh.nodes[1].fixed_point);
        assert_eq!(mesh.diagnostics.len(), 1);
    }

    #[test]
    fn test_boundary_conditions_are_order_independent() {
        let bcs = [
            SimpleBc::part(1, ConstraintSet::pinned()),
            SimpleBc::y_less_than(0.5, ConstraintSet::from_dofs([crate::elements::Dof::Rz])),
            SimpleBc::subsurface(0, ConstraintSet::fixed()),
        ];
        let mut forward = mesh();
        forward.tag_nodes();
        forward.apply_boundary_conditions(&bcs);

        let mut reversed = mesh();
        reversed.tag_nodes();
        let rev: Vec<_> = bcs.iter().rev().copied().collect();
        reversed.apply_boundary_conditions(&rev);

        let masks = |m: &FeaMesh| m.nodes.iter().map(|n| n.constraints).collect::<Vec<_>>();
        assert_eq!(masks(&forward), masks(&reversed));
        assert_eq!(forward.nodes[0].constraints.as_nastran_digits(), "6");
        assert_eq!(forward.nodes[1].constraints.as_nastran_digits(), "123456");
        assert_eq!(forward.nodes[2].constraints.as_nastran_digits(), "123");
    }

    #[test]
    fn test_suppression_of_beam_only_shells() {
        let mut mesh = mesh();
        mesh.subsurfaces[0].included_elements = IncludedElements::Beam;
        mesh.tag_nodes();
        // node 4 is only used by the suppressed sub-surface shell
        assert_eq!(mesh.node_bucket(&mesh.nodes[4]), NodeBucket::Remaining);
        mesh.remove_suppressed_elements();
        assert_eq!(mesh.elements.len(), 2);
    }

    #[test]
    fn test_numbering_groups_are_contiguous() {
        let mut mesh = mesh();
        mesh.elements.push(tri(0, None, [0, 2, 3]));
        mesh.tag_nodes();
        mesh.tag_fix_points(1e-6);
        mesh.finalize_numbering();

        let groups: Vec<_> = mesh.group_ranges().into_iter().map(|(g, r)| (g, r.len())).collect();
        assert_eq!(
            groups,
            vec![
                (ElementGroup::Part(0), 2),
                (ElementGroup::Part(1), 1),
                (ElementGroup::SubSurface(0), 1),
                (ElementGroup::FixPoint(0), 1),
            ]
        );
        mesh.settings.element_offset = 100;
        assert_eq!(mesh.element_id(0), 101);
    }

    #[test]
    fn test_shells_grouped_by_surface_number() {
        let mut mesh = mesh();
        let mut second = tri(0, None, [0, 2, 3]);
        second.surf_num = 1;
        mesh.elements.insert(1, second);
        mesh.elements.push(tri(0, None, [0, 3, 4]));
        mesh.finalize_numbering();

        let skin: Vec<_> = mesh
            .elements
            .iter()
            .filter(|e| e.part_index == 0 && e.subsurface_index.is_none())
            .map(|e| e.surf_num)
            .collect();
        assert_eq!(skin, vec![0, 0, 1]);
    }

    #[test]
    fn test_sections_cover_every_node_and_element_once() {
        let mut mesh = mesh();
        mesh.tag_nodes();
        mesh.tag_fix_points(1e-6);
        mesh.finalize_numbering();
        let ranges = mesh.group_ranges();

        let sections = mesh.sections();
        let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Skin", "Rib", "Hatch", "Mount", "Intersections", "Remaining"]);

        let nodes: usize = sections
            .iter()
            .filter_map(|s| s.nodes)
            .map(|b| mesh.nodes_in_bucket(b).count())
            .sum();
        let elements: usize = sections
            .iter()
            .filter_map(|s| s.elements)
            .map(|g| mesh.group_range(&ranges, g).len())
            .sum();
        assert_eq!(nodes, mesh.nodes.len());
        assert_eq!(elements, mesh.elements.len());
    }

    #[test]
    fn test_property_lookup() {
        let mesh = mesh();
        assert_eq!(mesh.property_index(&mesh.elements[1]), Some(1));
        assert_eq!(mesh.property_of(&mesh.elements[1]).unwrap().thickness, 0.002);
        let pm = FeaElement::new(2, 0, ElementShape::PointMass { node: 0, mass: 1.0 });
        assert_eq!(mesh.property_index(&pm), None);
        assert_eq!(mesh.element_group(&pm), ElementGroup::FixPoint(0));
    }
}

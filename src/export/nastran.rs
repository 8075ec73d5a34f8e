//! NASTRAN bulk data deck and its set key file

use crate::elements::{CrossSection, ElementShape, FeaElement, MaterialModel, SimpleFeaMaterial, SimpleFeaProperty};
use crate::mesh::FeaMesh;

use super::format::{nas_fmt, nas_int};

const BLANK: &str = "        ";
const SET_IDS_PER_LINE: usize = 10;

/// A numbered node or element set
#[derive(Debug, Clone, PartialEq)]
pub struct NastranSet {
    pub id: usize,
    pub name: String,
    pub ids: Vec<usize>,
}

/// Node and element sets, numbered from 1 in section order
///
/// Empty sets are skipped and do not consume a number.
pub fn nastran_sets(mesh: &FeaMesh) -> Vec<NastranSet> {
    let ranges = mesh.group_ranges();
    let mut sets = Vec::new();
    let mut push = |name: String, ids: Vec<usize>| {
        if !ids.is_empty() {
            sets.push(NastranSet { id: sets.len() + 1, name, ids });
        }
    };

    for section in mesh.sections() {
        if let Some(bucket) = section.nodes {
            let ids = mesh
                .nodes_in_bucket(bucket)
                .map(|n| n.index + mesh.settings.node_offset)
                .collect();
            push(format!("{} Gridpoints", section.name), ids);
        }
        if let Some(group) = section.elements {
            let ids = mesh.group_range(&ranges, group).map(|i| mesh.element_id(i)).collect();
            push(format!("{} Elements", section.name), ids);
        }
    }
    sets
}

fn set_card(set: &NastranSet) -> String {
    let mut card = format!("SET {} =", set.id);
    for (i, chunk) in set.ids.chunks(SET_IDS_PER_LINE).enumerate() {
        let line = chunk.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        if i > 0 {
            card.push_str(",\n       ");
        }
        card.push(' ');
        card.push_str(&line);
    }
    card.push('\n');
    card
}

/// GRID card; constraints go on SPC1 cards, so the PS field stays blank
fn grid_card(mesh: &FeaMesh, node: usize) -> String {
    let n = &mesh.nodes[node];
    format!(
        "GRID    ,{},{BLANK},{},{},{},{BLANK},{BLANK}\n",
        nas_int(mesh.node_id(node)),
        nas_fmt(n.position.x),
        nas_fmt(n.position.y),
        nas_fmt(n.position.z)
    )
}

fn element_card(mesh: &FeaMesh, position: usize, element: &FeaElement) -> String {
    let id = nas_int(mesh.element_id(position));
    let pid = nas_int(mesh.property_index(element).map_or(0, |p| p + 1));
    let nid = |n: usize| nas_int(mesh.node_id(n));
    let theta = || nas_fmt(element.theta_material(&mesh.nodes));

    match &element.shape {
        ElementShape::Tri { corners: c, mids: None, .. } => {
            format!("CTRIA3  ,{id},{pid},{},{},{},{}\n", nid(c[0]), nid(c[1]), nid(c[2]), theta())
        }
        ElementShape::Tri { corners: c, mids: Some(m), .. } => format!(
            "CTRIA6  ,{id},{pid},{},{},{},{},{},{},\n{BLANK},{}\n",
            nid(c[0]),
            nid(c[1]),
            nid(c[2]),
            nid(m[0]),
            nid(m[1]),
            nid(m[2]),
            theta()
        ),
        ElementShape::Quad { corners: c, mids: None, .. } => format!(
            "CQUAD4  ,{id},{pid},{},{},{},{},{}\n",
            nid(c[0]),
            nid(c[1]),
            nid(c[2]),
            nid(c[3]),
            theta()
        ),
        ElementShape::Quad { corners: c, mids: Some(m), .. } => format!(
            "CQUAD8  ,{id},{pid},{},{},{},{},{},{},\n{BLANK},{},{},{BLANK},{BLANK},{BLANK},{BLANK},{}\n",
            nid(c[0]),
            nid(c[1]),
            nid(c[2]),
            nid(c[3]),
            nid(m[0]),
            nid(m[1]),
            nid(m[2]),
            nid(m[3]),
            theta()
        ),
        ElementShape::Beam { ends, normals, .. } => format!(
            "CBAR    ,{id},{pid},{},{},{},{},{}\n",
            nid(ends[0]),
            nid(ends[1]),
            nas_fmt(normals[0].x),
            nas_fmt(normals[0].y),
            nas_fmt(normals[0].z)
        ),
        ElementShape::PointMass { node, mass } => {
            format!("CONM2   ,{id},{},{BLANK},{}\n", nid(*node), nas_fmt(*mass))
        }
    }
}

fn pbarl(pid: &str, mid: &str, kind: &str, dims: &[f64]) -> String {
    let dims = dims.iter().map(|d| nas_fmt(*d)).collect::<Vec<_>>().join(",");
    format!("PBARL   ,{pid},{mid},{BLANK},{kind:>8},\n{BLANK},{dims}\n")
}

/// Property card, preceded by a comment naming it
pub fn property_card(index: usize, property: &SimpleFeaProperty) -> String {
    let pid = nas_int(index + 1);
    let mid = nas_int(property.material_index.map_or(0, |m| m + 1));
    let mut card = format!("$ {} using {}\n", property.name, property.material_name);

    if property.is_shell() {
        card.push_str(&format!(
            "PSHELL  ,{pid},{mid},{},{mid},{BLANK},{mid},{BLANK},{BLANK},\n{BLANK},{BLANK},{BLANK},{BLANK}\n",
            nas_fmt(property.thickness)
        ));
        return card;
    }

    let d = &property.dims;
    let s = &property.section;
    let body = match property.cross_section {
        CrossSection::General => format!(
            "PBAR    ,{pid},{mid},{},{},{},{},{BLANK},{BLANK},\n{BLANK},{},\n{BLANK},{BLANK},{BLANK},{}\n",
            nas_fmt(s.area),
            nas_fmt(s.izz),
            nas_fmt(s.iyy),
            nas_fmt(s.ixx),
            [BLANK; 8].join(","),
            nas_fmt(s.izy)
        ),
        CrossSection::Circle => pbarl(&pid, &mid, "ROD", &d[..1]),
        CrossSection::Pipe => pbarl(&pid, &mid, "TUBE", &d[..2]),
        CrossSection::I => pbarl(&pid, &mid, "I", &d[..6]),
        CrossSection::Rect => pbarl(&pid, &mid, "BAR", &d[..2]),
        CrossSection::Box => pbarl(&pid, &mid, "BOX", &d[..4]),
    };
    card.push_str(&body);
    card
}

/// MAT1 or MAT8 card, preceded by a comment naming the material
pub fn material_card(index: usize, material: &SimpleFeaMaterial) -> String {
    let mid = nas_int(index + 1);
    let mut card = format!("$ {}\n", material.name);
    match material.model {
        MaterialModel::Isotropic { e, nu, alpha } => {
            let g = material.shear_modulus().unwrap_or_default();
            card.push_str(&format!(
                "MAT1    ,{mid},{},{},{},{},{}\n",
                nas_fmt(e),
                nas_fmt(g),
                nas_fmt(nu),
                nas_fmt(material.density),
                nas_fmt(alpha)
            ));
        }
        MaterialModel::Orthotropic(o) => {
            card.push_str(&format!(
                "MAT8    ,{mid},{},{},{},{},{},{},{},\n{BLANK},{},{}\n",
                nas_fmt(o.e1),
                nas_fmt(o.e2),
                nas_fmt(o.nu12),
                nas_fmt(o.g12),
                nas_fmt(o.g13),
                nas_fmt(o.g23),
                nas_fmt(material.density),
                nas_fmt(o.a1),
                nas_fmt(o.a2)
            ));
        }
    }
    card
}

/// Complete NASTRAN deck: header, sets, bulk data, properties, materials
pub fn nastran_deck(mesh: &FeaMesh) -> String {
    let ranges = mesh.group_ranges();
    let mut out = String::new();

    out.push_str("$NASTRAN data file generated by fea-mesh\n");
    out.push_str("$\n");
    out.push_str(&format!("$ Structure: {}\n", mesh.name));
    out.push_str(&format!("$ Num_Nodes: {}\n", mesh.nodes.len()));
    out.push_str(&format!("$ Num_Elements: {}\n", mesh.elements.len()));
    out.push_str(&format!("$ Mass_Unit: {}\n", mesh.settings.mass_unit.label()));
    out.push_str("$\n");

    for set in nastran_sets(mesh) {
        out.push_str(&set_card(&set));
    }
    out.push_str("\nBEGIN BULK\n");

    for section in mesh.sections() {
        if let Some(bucket) = section.nodes {
            let nodes: Vec<usize> = mesh.nodes_in_bucket(bucket).map(|n| n.index - 1).collect();
            if !nodes.is_empty() {
                out.push_str(&format!("\n$ {} Gridpoints\n", section.name));
                for id in nodes {
                    out.push_str(&grid_card(mesh, id));
                }
            }
        }
        if let Some(group) = section.elements {
            let range = mesh.group_range(&ranges, group);
            if !range.is_empty() {
                out.push_str(&format!("\n$ {} Elements\n", section.name));
                for i in range {
                    out.push_str(&element_card(mesh, i, &mesh.elements[i]));
                }
            }
        }
    }

    let constrained: Vec<_> = mesh.nodes.iter().filter(|n| !n.constraints.is_empty()).collect();
    if !constrained.is_empty() {
        out.push_str("\n$ Constraints\n");
        for n in constrained {
            out.push_str(&format!(
                "SPC1    ,       1,{:>8},{}\n",
                n.constraints.as_nastran_digits(),
                nas_int(n.index + mesh.settings.node_offset)
            ));
        }
    }

    if !mesh.mass.used_properties.is_empty() {
        out.push_str("\n$ Properties\n");
        for &p in &mesh.mass.used_properties {
            out.push_str(&property_card(p, &mesh.properties[p]));
        }
    }
    if !mesh.mass.used_materials.is_empty() {
        out.push_str("\n$ Materials\n");
        for &m in &mesh.mass.used_materials {
            out.push_str(&material_card(m, &mesh.materials[m]));
        }
    }

    out.push_str("\nENDDATA\n");
    out
}

/// Key file mapping set numbers to names
pub fn nastran_key(mesh: &FeaMesh) -> String {
    let mut out = String::from("$ NASTRAN set key\n$ Set,Name\n");
    for set in nastran_sets(mesh) {
        out.push_str(&format!("{},{}\n", set.id, set.name));
    }
    out
}

//! ASCII STL of the shell elements, one solid per part surface

use std::collections::BTreeMap;

use crate::elements::ElementShape;
use crate::math::{tri_normal, Vec3};
use crate::mesh::FeaMesh;

use super::format::c_fmt_e;

fn stl_vec(v: &Vec3) -> String {
    format!("{} {} {}", c_fmt_e(v.x, 10), c_fmt_e(v.y, 10), c_fmt_e(v.z, 10))
}

fn write_facet(stl: &mut String, a: &Vec3, b: &Vec3, c: &Vec3) {
    let normal = tri_normal(a, b, c).unwrap_or_else(Vec3::zeros);
    stl.push_str(&format!(" facet normal  {}\n", stl_vec(&normal)));
    stl.push_str("   outer loop\n");
    for v in [a, b, c] {
        stl.push_str(&format!("     vertex {}\n", stl_vec(v)));
    }
    stl.push_str("   endloop\n");
    stl.push_str(" endfacet\n");
}

/// Shells of parts that keep shells, grouped into one solid per (part, surface)
pub fn stl_mesh(mesh: &FeaMesh) -> String {
    let mut solids: BTreeMap<(usize, usize), Vec<[Vec3; 3]>> = BTreeMap::new();
    let pos = |id: usize| mesh.nodes[id].position;

    for element in &mesh.elements {
        let keeps = mesh
            .parts
            .get(element.part_index)
            .is_some_and(|p| p.included_elements.keeps_shells());
        if !keeps || !element.is_shell() {
            continue;
        }
        let facets = solids.entry((element.part_index, element.surf_num)).or_default();
        match &element.shape {
            ElementShape::Tri { corners: c, .. } => facets.push([pos(c[0]), pos(c[1]), pos(c[2])]),
            ElementShape::Quad { corners: c, .. } => {
                facets.push([pos(c[0]), pos(c[1]), pos(c[2])]);
                facets.push([pos(c[0]), pos(c[2]), pos(c[3])]);
            }
            _ => {}
        }
    }

    let mut stl = String::new();
    for ((part, surf), facets) in solids {
        let name = format!("{}_{}", mesh.part_name(part).replace(' ', "_"), surf);
        stl.push_str(&format!("solid {name}\n"));
        for [a, b, c] in &facets {
            write_facet(&mut stl, a, b, c);
        }
        stl.push_str(&format!("endsolid {name}\n"));
    }
    stl
}

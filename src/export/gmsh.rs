//! Gmsh 2.2 ASCII mesh

use crate::elements::{ElementKind, ElementShape};
use crate::mesh::FeaMesh;

use super::format::c_fmt_f;

/// Gmsh element type number
fn gmsh_type(kind: ElementKind) -> u8 {
    match kind {
        ElementKind::Tri3 => 2,
        ElementKind::Tri6 => 9,
        ElementKind::Quad4 => 3,
        ElementKind::Quad8 => 16,
        ElementKind::Beam => 1,
        ElementKind::PointMass => 15,
    }
}

pub fn gmsh_mesh(mesh: &FeaMesh) -> String {
    let mut msh = String::new();
    msh.push_str("$MeshFormat\n2.2 0 8\n$EndMeshFormat\n");

    // surfaces for parts, points for fixed point masses; tag = part index + 1
    msh.push_str("$PhysicalNames\n");
    msh.push_str(&format!("{}\n", mesh.part_count()));
    for (p, part) in mesh.parts.iter().enumerate() {
        msh.push_str(&format!("2 {} \"{}\"\n", p + 1, part.name));
    }
    for fix_point in &mesh.fix_points {
        msh.push_str(&format!("0 {} \"{}\"\n", fix_point.part_index + 1, fix_point.name));
    }
    msh.push_str("$EndPhysicalNames\n");

    msh.push_str("$Nodes\n");
    msh.push_str(&format!("{}\n", mesh.nodes.len()));
    for node in &mesh.nodes {
        msh.push_str(&format!(
            "{} {} {} {}\n",
            node.index + mesh.settings.node_offset,
            c_fmt_f(node.position.x),
            c_fmt_f(node.position.y),
            c_fmt_f(node.position.z)
        ));
    }
    msh.push_str("$EndNodes\n");

    msh.push_str("$Elements\n");
    msh.push_str(&format!("{}\n", mesh.elements.len()));
    for (i, element) in mesh.elements.iter().enumerate() {
        let nodes = match &element.shape {
            ElementShape::Beam { ends, .. } => ends.to_vec(),
            _ => element.all_nodes(),
        };
        let physical = element.part_index + 1;
        let mut line = format!(
            "{} {} 2 {} {}",
            mesh.element_id(i),
            gmsh_type(element.kind()),
            physical,
            physical
        );
        for n in nodes {
            line.push_str(&format!(" {}", mesh.node_id(n)));
        }
        line.push('\n');
        msh.push_str(&line);
    }
    msh.push_str("$EndElements\n");
    msh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_numbers() {
        assert_eq!(gmsh_type(ElementKind::Tri3), 2);
        assert_eq!(gmsh_type(ElementKind::Quad8), 16);
        assert_eq!(gmsh_type(ElementKind::PointMass), 15);
    }
}

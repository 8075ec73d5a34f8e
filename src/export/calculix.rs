//! Calculix input deck (.inp)

use std::ops::Range;

use crate::elements::{CrossSection, ElementKind, ElementShape, FeaElement, MaterialModel, SimpleFeaMaterial, SimpleFeaProperty};
use crate::math::{tri_normal, Vec3};
use crate::mesh::{ElementGroup, FeaMesh};

use super::format::{c_fmt_f, c_fmt_g};

/// Name safe to use in a keyword value
fn keyword(name: &str) -> String {
    name.replace(' ', "_")
}

fn element_type(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Tri3 => "S3",
        ElementKind::Tri6 => "S6",
        ElementKind::Quad4 => "S4",
        ElementKind::Quad8 => "S8",
        ElementKind::Beam => "B32R",
        ElementKind::PointMass => "MASS",
    }
}

/// Split a range into runs of consecutive elements sharing a key
fn runs<K: PartialEq>(range: Range<usize>, key: impl Fn(usize) -> K) -> Vec<Range<usize>> {
    let mut out: Vec<Range<usize>> = Vec::new();
    for i in range {
        match out.last_mut() {
            Some(r) if key(r.start) == key(i) => r.end = i + 1,
            _ => out.push(i..i + 1),
        }
    }
    out
}

fn element_line(mesh: &FeaMesh, position: usize, element: &FeaElement) -> String {
    let nodes: Vec<usize> = match &element.shape {
        ElementShape::Beam { ends, mid, .. } => vec![ends[0], *mid, ends[1]],
        _ => element.all_nodes(),
    };
    let mut line = mesh.element_id(position).to_string();
    for n in nodes {
        line.push_str(&format!(",{}", mesh.node_id(n)));
    }
    line.push('\n');
    line
}

fn write_element_block(inp: &mut String, mesh: &FeaMesh, range: Range<usize>, elset: &str) {
    for run in runs(range, |i| mesh.elements[i].kind()) {
        let kind = mesh.elements[run.start].kind();
        inp.push_str(&format!("*ELEMENT, TYPE={}, ELSET={}\n", element_type(kind), elset));
        for i in run {
            inp.push_str(&element_line(mesh, i, &mesh.elements[i]));
        }
    }
}

/// Local axes of a shell set from its first element: x along the orientation
/// vector, y in the element plane
fn shell_axes(mesh: &FeaMesh, element: &FeaElement) -> Option<(Vec3, Vec3)> {
    let a = element.orientation()?.try_normalize(1e-12)?;
    let c = element.corner_nodes();
    let p = |i: usize| mesh.nodes[c[i]].position;
    let normal = tri_normal(&p(0), &p(1), &p(2))?;
    let b = normal.cross(&a).try_normalize(1e-12)?;
    Some((a, b))
}

fn write_shell_section(inp: &mut String, mesh: &FeaMesh, run: &Range<usize>, elset: &str, suffix: &str) {
    let element = &mesh.elements[run.start];
    let Some(property) = mesh.property_of(element) else {
        return;
    };
    let material = keyword(&property.material_name);

    match shell_axes(mesh, element) {
        Some((a, b)) => {
            let orientation = format!("O{suffix}");
            inp.push_str(&format!("*ORIENTATION, NAME={orientation}, SYSTEM=RECTANGULAR\n"));
            inp.push_str(&format!(
                "{},{},{},{},{},{}\n",
                c_fmt_g(a.x),
                c_fmt_g(a.y),
                c_fmt_g(a.z),
                c_fmt_g(b.x),
                c_fmt_g(b.y),
                c_fmt_g(b.z)
            ));
            inp.push_str(&format!(
                "*SHELL SECTION, ELSET={elset}, MATERIAL={material}, ORIENTATION={orientation}\n"
            ));
        }
        None => inp.push_str(&format!("*SHELL SECTION, ELSET={elset}, MATERIAL={material}\n")),
    }
    inp.push_str(&format!("{}\n", c_fmt_g(property.thickness)));
}

/// Section name and data line of a beam property
fn beam_section_data(property: &SimpleFeaProperty) -> (&'static str, Vec<f64>) {
    let d = &property.dims;
    let s = &property.section;
    match property.cross_section {
        CrossSection::General => ("GENERAL", vec![s.area, s.izz, s.izy, s.iyy, s.ixx]),
        CrossSection::Circle => ("CIRC", vec![d[0]]),
        CrossSection::Pipe => ("PIPE", vec![d[0], d[0] - d[1]]),
        CrossSection::I => ("I", vec![d[0] / 2.0, d[0], d[1], d[2], d[4], d[5], d[3]]),
        CrossSection::Rect => ("RECT", vec![d[0], d[1]]),
        CrossSection::Box => ("BOX", vec![d[0], d[1], d[3], d[2], d[3], d[2]]),
    }
}

fn join_g(values: &[f64]) -> String {
    values.iter().map(|v| c_fmt_g(*v)).collect::<Vec<_>>().join(",")
}

fn write_beam_section(inp: &mut String, mesh: &FeaMesh, run: &Range<usize>, elset: &str) {
    let element = &mesh.elements[run.start];
    let Some(property) = mesh.property_of(element) else {
        return;
    };
    let (section, data) = beam_section_data(property);
    inp.push_str(&format!(
        "*BEAM SECTION, SECTION={section}, ELSET={elset}, MATERIAL={}\n",
        keyword(&property.material_name)
    ));
    inp.push_str(&format!("{}\n", join_g(&data)));
    if let ElementShape::Beam { normals, .. } = &element.shape {
        inp.push_str(&format!("{}\n", join_g(normals[0].as_slice())));
    }

    if mesh.settings.beam_normals_per_element {
        inp.push_str("*NORMAL\n");
        for i in run.clone() {
            let ElementShape::Beam { ends, mid, normals } = &mesh.elements[i].shape else {
                continue;
            };
            let average = (normals[0] + normals[1]).try_normalize(1e-12).unwrap_or(normals[0]);
            let id = mesh.element_id(i);
            for (node, n) in [(ends[0], normals[0]), (*mid, average), (ends[1], normals[1])] {
                inp.push_str(&format!("{},{},{}\n", id, mesh.node_id(node), join_g(n.as_slice())));
            }
        }
    }
}

fn write_group(inp: &mut String, mesh: &FeaMesh, group: ElementGroup, range: Range<usize>) {
    let name = keyword(mesh.group_name(group));

    if let ElementGroup::FixPoint(_) = group {
        let elset = format!("E{name}_MASS");
        write_element_block(inp, mesh, range.clone(), &elset);
        for i in range {
            if let ElementShape::PointMass { mass, .. } = mesh.elements[i].shape {
                inp.push_str(&format!("*MASS, ELSET={elset}\n{}\n", c_fmt_g(mass)));
                break;
            }
        }
        return;
    }

    let elements = &mesh.elements;
    let shells = runs(range.clone(), |i| (elements[i].is_shell(), elements[i].surf_num));
    for run in shells.into_iter().filter(|r| elements[r.start].is_shell()) {
        let suffix = format!("{name}_{}", elements[run.start].surf_num);
        let elset = format!("E{suffix}");
        write_element_block(inp, mesh, run.clone(), &elset);
        write_shell_section(inp, mesh, &run, &elset, &suffix);
    }

    let caps = runs(range, |i| (elements[i].kind(), elements[i].chain_index));
    for run in caps.into_iter().filter(|r| elements[r.start].kind() == ElementKind::Beam) {
        let chain = elements[run.start].chain_index.unwrap_or(0);
        let elset = format!("E{name}_CAP_{chain}");
        write_element_block(inp, mesh, run.clone(), &elset);
        write_beam_section(inp, mesh, &run, &elset);
    }
}

fn write_material(inp: &mut String, material: &SimpleFeaMaterial) {
    inp.push_str(&format!("*MATERIAL, NAME={}\n", material.keyword_name()));
    inp.push_str(&format!("*DENSITY\n{}\n", c_fmt_g(material.density)));
    match material.model {
        MaterialModel::Isotropic { e, nu, alpha } => {
            inp.push_str(&format!("*ELASTIC, TYPE=ISO\n{}, {}\n", c_fmt_g(e), c_fmt_g(nu)));
            inp.push_str(&format!("*EXPANSION, TYPE=ISO\n{}\n", c_fmt_g(alpha)));
        }
        MaterialModel::Orthotropic(o) => {
            let first = [o.e1, o.e2, o.e3, o.nu12, o.nu13, o.nu23, o.g12, o.g13];
            inp.push_str("*ELASTIC, TYPE=ENGINEERING CONSTANTS\n");
            inp.push_str(&format!(
                "{}\n{}\n",
                first.iter().map(|v| c_fmt_g(*v)).collect::<Vec<_>>().join(", "),
                c_fmt_g(o.g23)
            ));
            inp.push_str(&format!(
                "*EXPANSION, TYPE=ORTHO\n{}, {}, {}\n",
                c_fmt_g(o.a1),
                c_fmt_g(o.a2),
                c_fmt_g(o.a3)
            ));
        }
    }
}

/// Complete Calculix deck: nodes, elements with sections, constraints, materials
pub fn calculix_deck(mesh: &FeaMesh) -> String {
    let ranges = mesh.group_ranges();
    let mut inp = String::new();

    inp.push_str("**Calculix data file generated by fea-mesh\n");
    inp.push_str(&format!("**Structure: {}\n", mesh.name));
    inp.push_str(&format!("**Mass_Unit: {}\n", mesh.settings.mass_unit.label()));
    inp.push_str("*HEADING\n");
    inp.push_str(&format!("{}\n", mesh.name));

    for section in mesh.sections() {
        if let Some(bucket) = section.nodes {
            let mut nodes = mesh.nodes_in_bucket(bucket).peekable();
            if nodes.peek().is_some() {
                inp.push_str(&format!("*NODE, NSET=N{}\n", keyword(&section.name)));
                for n in nodes {
                    inp.push_str(&format!(
                        "{},{},{},{}\n",
                        n.index + mesh.settings.node_offset,
                        c_fmt_f(n.position.x),
                        c_fmt_f(n.position.y),
                        c_fmt_f(n.position.z)
                    ));
                }
            }
        }
    }

    for (group, range) in ranges {
        write_group(&mut inp, mesh, group, range);
    }

    let constrained: Vec<_> = mesh.nodes.iter().filter(|n| !n.constraints.is_empty()).collect();
    if !constrained.is_empty() {
        inp.push_str("*BOUNDARY\n");
        for n in constrained {
            for dof in n.constraints.iter() {
                inp.push_str(&format!("{},{}\n", n.index + mesh.settings.node_offset, dof.component()));
            }
        }
    }

    for &m in &mesh.mass.used_materials {
        write_material(&mut inp, &mesh.materials[m]);
    }
    inp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{OrthotropicConstants, SectionConstants};

    #[test]
    fn test_beam_section_lines() {
        let dims = [0.2, 0.1, 0.01, 0.02, 0.0, 0.0];
        let bx = SimpleFeaProperty::beam("Box", CrossSection::Box, SectionConstants::default(), dims, Some(0));
        let (name, data) = beam_section_data(&bx);
        assert_eq!(name, "BOX");
        assert_eq!(join_g(&data), "0.2,0.1,0.02,0.01,0.02,0.01");

        let pipe = SimpleFeaProperty::beam("Tube", CrossSection::Pipe, SectionConstants::default(), [0.05, 0.04, 0.0, 0.0, 0.0, 0.0], None);
        let (name, data) = beam_section_data(&pipe);
        assert_eq!(name, "PIPE");
        assert_eq!(data.len(), 2);
        assert!((data[1] - 0.01).abs() < 1e-12);

        let general = SectionConstants { area: 1.0, izz: 2.0, iyy: 3.0, izy: 0.0, ixx: 4.0 };
        let bar = SimpleFeaProperty::beam("Cap", CrossSection::General, general, [0.0; 6], None);
        assert_eq!(join_g(&beam_section_data(&bar).1), "1,2,0,3,4");
    }

    #[test]
    fn test_material_blocks() {
        let mut inp = String::new();
        write_material(&mut inp, &SimpleFeaMaterial::isotropic("Al 2024", 7.0e10, 0.33, 2700.0, 2.3e-5));
        assert_eq!(
            inp,
            "*MATERIAL, NAME=Al_2024\n*DENSITY\n2700\n*ELASTIC, TYPE=ISO\n7e+10, 0.33\n*EXPANSION, TYPE=ISO\n2.3e-05\n"
        );

        let mut inp = String::new();
        let ortho = OrthotropicConstants { e1: 1.0, e2: 2.0, e3: 3.0, g23: 9.0, ..Default::default() };
        write_material(&mut inp, &SimpleFeaMaterial::orthotropic("Ply", 1.5, ortho));
        assert!(inp.contains("*ELASTIC, TYPE=ENGINEERING CONSTANTS\n1, 2, 3, 0, 0, 0, 0, 0\n9\n"));
        assert!(inp.contains("*EXPANSION, TYPE=ORTHO\n0, 0, 0\n"));
    }

    #[test]
    fn test_runs_split_on_key_change() {
        let keys = [1, 1, 2, 2, 2, 1];
        assert_eq!(runs(0..6, |i| keys[i]), vec![0..2, 2..5, 5..6]);
        assert!(runs(3..3, |i| keys[i]).is_empty());
    }
}

//! Plain-text mass breakdown

use crate::mass::GroupMass;
use crate::mesh::FeaMesh;

use super::format::c_fmt_e;

fn group_line(name: &str, mass: &GroupMass) -> String {
    format!(
        "{:<24} {:>14} {:>14} {:>14}\n",
        name,
        c_fmt_e(mass.shell, 6),
        c_fmt_e(mass.beam, 6),
        c_fmt_e(mass.total(), 6)
    )
}

pub fn mass_report(mesh: &FeaMesh) -> String {
    let unit = mesh.settings.mass_unit.label();
    let summary = &mesh.mass;
    let mut out = String::new();

    out.push_str(&format!("...{}...\n", mesh.name));
    out.push_str(&format!("Mass unit: {unit}\n\n"));

    out.push_str(&format!("{:<24} {:>14} {:>14} {:>14}\n", "Name", "Shell Mass", "Beam Mass", "Total Mass"));
    for (part, mass) in mesh.parts.iter().zip(&summary.parts) {
        out.push_str(&group_line(&part.name, mass));
    }
    for (sub, mass) in mesh.subsurfaces.iter().zip(&summary.subsurfaces) {
        out.push_str(&group_line(&sub.name, mass));
    }

    if !mesh.fix_points.is_empty() {
        out.push_str(&format!(
            "\n{:<24} {:>14} {:>14} {:>14} {:>14}\n",
            "Fixed Point", "Mass", "x", "y", "z"
        ));
        for (fix_point, mass) in mesh.fix_points.iter().zip(&summary.fix_points) {
            for (k, node) in fix_point.resolved.iter().enumerate() {
                let p = match node {
                    Some(id) => mesh.nodes[*id].position,
                    None => fix_point.positions[k],
                };
                let each = if node.is_some() { fix_point.point_mass().unwrap_or(0.0) } else { 0.0 };
                out.push_str(&format!(
                    "{:<24} {:>14} {:>14.6} {:>14.6} {:>14.6}\n",
                    fix_point.name,
                    c_fmt_e(each, 6),
                    p.x,
                    p.y,
                    p.z
                ));
            }
            if fix_point.resolved.len() > 1 {
                out.push_str(&format!("{:<24} {:>14}\n", format!("{} total", fix_point.name), c_fmt_e(*mass, 6)));
            }
        }
    }

    out.push_str(&format!("\nTotal Mass = {:.6} {unit}\n", summary.total));
    out
}

//! Flattened shell and beam property snapshots

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Shell or beam property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Shell,
    Beam,
}

/// Beam cross-section shape
///
/// Dimension layout (`dims[0]` is DIM1):
/// - `Circle`: radius
/// - `Pipe`: outer radius, inner radius
/// - `I`: height, bottom flange width, top flange width, web thickness,
///   bottom flange thickness, top flange thickness
/// - `Rect`: width, height
/// - `Box`: width, height, side wall thickness, top/bottom wall thickness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossSection {
    #[default]
    General,
    Circle,
    Pipe,
    I,
    Rect,
    Box,
}

/// Section constants of a beam cross-section
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectionConstants {
    /// Cross-sectional area
    pub area: f64,
    pub izz: f64,
    pub iyy: f64,
    pub izy: f64,
    /// Torsional constant
    pub ixx: f64,
}

impl SectionConstants {
    /// Section constants of a shaped cross-section from its dimensions
    ///
    /// # Returns
    /// `None` for `CrossSection::General`, which has no dimensions
    pub fn from_dims(shape: CrossSection, dims: &[f64; 6]) -> Option<Self> {
        let c = match shape {
            CrossSection::General => return None,
            CrossSection::Circle => {
                let r = dims[0];
                Self {
                    area: PI * r.powi(2),
                    izz: PI * r.powi(4) / 4.0,
                    iyy: PI * r.powi(4) / 4.0,
                    izy: 0.0,
                    ixx: PI * r.powi(4) / 2.0,
                }
            }
            CrossSection::Pipe => {
                let (ro, ri) = (dims[0], dims[1]);
                let i = PI * (ro.powi(4) - ri.powi(4)) / 4.0;
                Self {
                    area: PI * (ro.powi(2) - ri.powi(2)),
                    izz: i,
                    iyy: i,
                    izy: 0.0,
                    ixx: 2.0 * i,
                }
            }
            CrossSection::I => {
                let [h, b_bot, b_top, tw, t_bot, t_top] = *dims;
                let hw = h - t_bot - t_top;
                // (area, centroid height, own inertia about horizontal axis)
                let parts = [
                    (b_bot * t_bot, t_bot / 2.0, b_bot * t_bot.powi(3) / 12.0),
                    (tw * hw, t_bot + hw / 2.0, tw * hw.powi(3) / 12.0),
                    (b_top * t_top, h - t_top / 2.0, b_top * t_top.powi(3) / 12.0),
                ];
                let area: f64 = parts.iter().map(|p| p.0).sum();
                let ybar = if area > 0.0 {
                    parts.iter().map(|p| p.0 * p.1).sum::<f64>() / area
                } else {
                    0.0
                };
                let izz = parts.iter().map(|p| p.2 + p.0 * (p.1 - ybar).powi(2)).sum();
                Self {
                    area,
                    izz,
                    iyy: (t_bot * b_bot.powi(3) + hw * tw.powi(3) + t_top * b_top.powi(3)) / 12.0,
                    izy: 0.0,
                    ixx: (b_bot * t_bot.powi(3) + b_top * t_top.powi(3) + hw * tw.powi(3)) / 3.0,
                }
            }
            CrossSection::Rect => {
                let (w, h) = (dims[0], dims[1]);
                let (a_dim, b_dim) = if w > h { (w, h) } else { (h, w) };
                let ixx = if a_dim > 0.0 {
                    a_dim * b_dim.powi(3) / 3.0 * (1.0 - 0.63 * b_dim / a_dim)
                } else {
                    0.0
                };
                Self {
                    area: w * h,
                    izz: w * h.powi(3) / 12.0,
                    iyy: h * w.powi(3) / 12.0,
                    izy: 0.0,
                    ixx,
                }
            }
            CrossSection::Box => {
                let [w, h, t_side, t_cap, ..] = *dims;
                let wi = w - 2.0 * t_side;
                let hi = h - 2.0 * t_cap;
                let denom = w * t_side + h * t_cap - t_side.powi(2) - t_cap.powi(2);
                let ixx = if denom > 0.0 {
                    2.0 * t_side * t_cap * (w - t_side).powi(2) * (h - t_cap).powi(2) / denom
                } else {
                    0.0
                };
                Self {
                    area: w * h - wi * hi,
                    izz: (w * h.powi(3) - wi * hi.powi(3)) / 12.0,
                    iyy: (h * w.powi(3) - hi * wi.powi(3)) / 12.0,
                    izy: 0.0,
                    ixx,
                }
            }
        };
        Some(c)
    }
}

/// Export-ready copy of a property definition
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFeaProperty {
    pub name: String,
    pub property_type: PropertyType,
    /// Shell thickness
    pub thickness: f64,
    pub section: SectionConstants,
    pub dims: [f64; 6],
    pub cross_section: CrossSection,
    /// Index into the material table, `None` when the material could not be resolved
    pub material_index: Option<usize>,
    pub material_name: String,
}

impl SimpleFeaProperty {
    pub fn shell(name: impl Into<String>, thickness: f64, material_index: Option<usize>) -> Self {
        Self {
            name: name.into(),
            property_type: PropertyType::Shell,
            thickness,
            section: SectionConstants::default(),
            dims: [0.0; 6],
            cross_section: CrossSection::General,
            material_index,
            material_name: String::new(),
        }
    }

    /// Beam property; a zero area is filled in from the cross-section dimensions
    pub fn beam(
        name: impl Into<String>,
        cross_section: CrossSection,
        section: SectionConstants,
        dims: [f64; 6],
        material_index: Option<usize>,
    ) -> Self {
        let section = if section.area > 0.0 {
            section
        } else {
            SectionConstants::from_dims(cross_section, &dims).unwrap_or(section)
        };
        Self {
            name: name.into(),
            property_type: PropertyType::Beam,
            thickness: 0.0,
            section,
            dims,
            cross_section,
            material_index,
            material_name: String::new(),
        }
    }

    pub fn with_material_name(mut self, name: impl Into<String>) -> Self {
        self.material_name = name.into();
        self
    }

    pub fn is_shell(&self) -> bool {
        self.property_type == PropertyType::Shell
    }
}

//! Text writers for the finished mesh
//!
//! Every writer renders a `String` from the same numbered [`FeaMesh`]; only
//! [`export_all`] touches the filesystem.

pub mod calculix;
pub mod format;
pub mod gmsh;
pub mod mass_report;
pub mod nastran;
pub mod stl;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::FeaMeshError;
use crate::mesh::FeaMesh;
use crate::structure::ExportSettings;

pub use calculix::calculix_deck;
pub use gmsh::gmsh_mesh;
pub use mass_report::mass_report;
pub use nastran::{nastran_deck, nastran_key};
pub use stl::stl_mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Nastran,
    NastranKey,
    Calculix,
    Stl,
    Gmsh,
    Mass,
}

impl ExportFormat {
    /// Every format, in the order files are written
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Nastran,
        ExportFormat::NastranKey,
        ExportFormat::Calculix,
        ExportFormat::Stl,
        ExportFormat::Gmsh,
        ExportFormat::Mass,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Nastran => "NASTRAN",
            ExportFormat::NastranKey => "NASTRAN key",
            ExportFormat::Calculix => "Calculix",
            ExportFormat::Stl => "STL",
            ExportFormat::Gmsh => "Gmsh",
            ExportFormat::Mass => "mass report",
        }
    }

    /// Configured output path of this format
    pub fn path(self, settings: &ExportSettings) -> Option<&Path> {
        let path = match self {
            ExportFormat::Nastran => &settings.nastran,
            ExportFormat::NastranKey => &settings.nastran_key,
            ExportFormat::Calculix => &settings.calculix,
            ExportFormat::Stl => &settings.stl,
            ExportFormat::Gmsh => &settings.gmsh,
            ExportFormat::Mass => &settings.mass,
        };
        path.as_deref()
    }

    /// Render the file contents of this format
    pub fn render(self, mesh: &FeaMesh) -> String {
        match self {
            ExportFormat::Nastran => nastran_deck(mesh),
            ExportFormat::NastranKey => nastran_key(mesh),
            ExportFormat::Calculix => calculix_deck(mesh),
            ExportFormat::Stl => stl_mesh(mesh),
            ExportFormat::Gmsh => gmsh_mesh(mesh),
            ExportFormat::Mass => mass_report(mesh),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one export run
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<(ExportFormat, PathBuf)>,
    /// One `ExportIo` entry per file that could not be written
    pub failures: Vec<FeaMeshError>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Write every enabled format; a failed file never stops the others
pub fn export_all(mesh: &FeaMesh, settings: &ExportSettings) -> ExportReport {
    let mut report = ExportReport::default();

    for format in ExportFormat::ALL {
        let Some(path) = format.path(settings) else {
            continue;
        };
        match fs::write(path, format.render(mesh)) {
            Ok(()) => {
                info!("Wrote {} file {}", format, path.display());
                report.written.push((format, path.to_path_buf()));
            }
            Err(source) => {
                warn!("Could not write {} file {}: {}", format, path.display(), source);
                report.failures.push(FeaMeshError::ExportIo {
                    format: format.label().to_string(),
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
    report
}

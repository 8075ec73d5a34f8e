//! Command-line mesh export
//!
//! Usage: `fea-export <structure.json> <mesh.json>`
//!
//! Output paths come from the structure's export settings. Relative paths are
//! placed under `FEA_MESH_OUTPUT_DIR` when it is set.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use fea_mesh::prelude::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <structure.json> <mesh.json>", args[0]);
    }

    let structure = StructureDefinition::from_path(&args[1])
        .with_context(|| format!("reading structure definition {}", args[1]))?;
    let input = MeshInput::from_path(&args[2]).with_context(|| format!("reading mesh input {}", args[2]))?;

    let mesh = generate_fea_mesh(&structure, &input).context("mesh generation failed")?;
    for diagnostic in &mesh.diagnostics {
        warn!("{diagnostic}");
    }

    let settings = match std::env::var("FEA_MESH_OUTPUT_DIR") {
        Ok(dir) => structure.settings.export.rebased(&PathBuf::from(dir)),
        Err(_) => structure.settings.export.clone(),
    };

    let report = export_all(&mesh, &settings);
    for (format, path) in &report.written {
        info!("{format}: {}", path.display());
    }
    if !report.is_complete() {
        for failure in &report.failures {
            warn!("{failure}");
        }
        bail!("{} export file(s) could not be written", report.failures.len());
    }
    Ok(())
}

//! Error types for FEA mesh assembly and export

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mesh assembly and export.
///
/// Most variants describe recoverable conditions: the pipeline records them in
/// [`FeaMesh::diagnostics`](crate::mesh::FeaMesh) and carries on. Only
/// `EmptyMesh`, `InvalidInput` and the I/O wrappers abort a run.
#[derive(Error, Debug)]
pub enum FeaMeshError {
    #[error("{owner} references property index {index}, which does not exist")]
    MissingPropertyIndex { owner: String, index: usize },

    #[error("Property '{property}' references unknown material '{material}'")]
    MissingMaterialIndex { property: String, material: String },

    #[error("Degenerate beam segment {segment} on chain {chain} skipped")]
    DegenerateElement { chain: usize, segment: usize },

    #[error("No node found for {0}; adjust mesh density")]
    UnresolvedFixPoint(String),

    #[error("Could not write {format} file '{}': {source}", path.display())]
    ExportIo {
        format: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Mesh has no nodes")]
    EmptyMesh,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl FeaMeshError {
    /// True for conditions that are logged and recorded but never abort a run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FeaMeshError::MissingPropertyIndex { .. }
                | FeaMeshError::MissingMaterialIndex { .. }
                | FeaMeshError::DegenerateElement { .. }
                | FeaMeshError::UnresolvedFixPoint(_)
                | FeaMeshError::ExportIo { .. }
        )
    }
}

/// Result type for mesh operations
pub type FeaMeshResult<T> = Result<T, FeaMeshError>;

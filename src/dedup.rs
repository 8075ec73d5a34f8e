//! Coincident node merging and canonical indexing
//!
//! Points closer than a tolerance collapse onto the earliest point of their
//! cluster. Candidates are found through a uniform spatial hash with a cell
//! size of twice the tolerance, so only the 3x3x3 neighbouring cells need to
//! be searched.

use std::collections::HashMap;

use crate::math::{BoundingBox, Vec3};

/// Smallest tolerance ever used, so a zero-extent model still hashes
const MIN_TOLERANCE: f64 = f64::EPSILON;

/// Mapping from raw (per-element) points to canonical nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIndexMap {
    /// Raw index of every canonical node, in canonical order
    pub used: Vec<usize>,
    /// Canonical position (0-based) of every raw point
    pub canonical: Vec<usize>,
}

impl NodeIndexMap {
    pub fn canonical_count(&self) -> usize {
        self.used.len()
    }

    /// Dense 1-based index of the canonical node a raw point maps to
    pub fn index_of(&self, raw: usize) -> usize {
        self.canonical[raw] + 1
    }

    /// Canonical positions in index order
    pub fn used_points(&self, points: &[Vec3]) -> Vec<Vec3> {
        self.used.iter().map(|&r| points[r]).collect()
    }
}

/// Merge tolerance for a model: bounding-box diagonal scaled by `factor`
pub fn merge_tolerance(bbox: &BoundingBox, factor: f64) -> f64 {
    (bbox.diagonal() * factor).max(MIN_TOLERANCE)
}

fn pos_to_cell(p: &Vec3, cell_size: f64) -> (i64, i64, i64) {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

/// Cluster `points` within `tolerance` and assign canonical indices
///
/// The first point of each cluster in input order is its representative, and
/// representatives are numbered in input order, so the result depends only on
/// the input sequence.
pub fn dedup_points(points: &[Vec3], tolerance: f64) -> NodeIndexMap {
    let tolerance = tolerance.max(MIN_TOLERANCE);
    let cell_size = tolerance * 2.0;

    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (idx, p) in points.iter().enumerate() {
        spatial_hash.entry(pos_to_cell(p, cell_size)).or_default().push(idx);
    }

    let mut remap: Vec<usize> = (0..points.len()).collect();
    for (idx, p) in points.iter().enumerate() {
        if remap[idx] != idx {
            continue;
        }
        let cell = pos_to_cell(p, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = spatial_hash.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz)) else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || remap[other] != other {
                            continue;
                        }
                        if (points[other] - p).norm() <= tolerance {
                            remap[other] = idx;
                        }
                    }
                }
            }
        }
    }

    // Representatives always precede their members, so one forward pass
    // resolves chains and assigns dense numbers.
    let mut used = Vec::new();
    let mut canonical = vec![0; points.len()];
    for i in 0..points.len() {
        let root = remap[i];
        if root == i {
            canonical[i] = used.len();
            used.push(i);
        } else {
            remap[i] = remap[root];
            canonical[i] = canonical[remap[i]];
        }
    }

    NodeIndexMap { used, canonical }
}

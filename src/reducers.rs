//! Scalar metrics over a single snapshot.
//!
//! All functions are pure over the snapshot (plus optional chunk
//! filter). Divisions guard their denominators; empty inputs produce 0
//! — except [`tree_shakable_percent`], which is vacuously 1.

use crate::compare::node_modules;
use crate::snapshot::{ChunkId, Snapshot};

/// Sum of all chunk sizes.
pub fn total_chunk_size(snapshot: &Snapshot) -> u64 {
    snapshot.chunks().iter().map(|c| c.size).sum()
}

/// Sum of the sizes of chunks flagged as entry chunks.
pub fn entry_chunk_size(snapshot: &Snapshot) -> u64 {
    snapshot
        .chunks()
        .iter()
        .filter(|c| c.entry)
        .map(|c| c.size)
        .sum()
}

/// Mean chunk size; 0 for a snapshot with no chunks.
pub fn average_chunk_size(snapshot: &Snapshot) -> f64 {
    let count = snapshot.chunks().len();
    if count == 0 {
        return 0.0;
    }
    total_chunk_size(snapshot) as f64 / count as f64
}

/// Total bytes attributed to external dependencies.
pub fn node_module_size(snapshot: &Snapshot, chunk: Option<ChunkId>) -> u64 {
    node_modules(snapshot, chunk)
        .values()
        .map(|m| m.total_size)
        .sum()
}

/// Number of distinct external dependency packages.
pub fn node_module_count(snapshot: &Snapshot, chunk: Option<ChunkId>) -> usize {
    node_modules(snapshot, chunk).len()
}

/// Fraction of dependency packages imported exclusively as ES modules.
///
/// Returns 1 when there are no dependencies at all — vacuously true, and
/// it keeps percentage math downstream free of NaN.
pub fn tree_shakable_percent(snapshot: &Snapshot, chunk: Option<ChunkId>) -> f64 {
    let aggregates = node_modules(snapshot, chunk);
    if aggregates.is_empty() {
        return 1.0;
    }
    let shakable = aggregates
        .values()
        .filter(|m| m.import_type.is_tree_shakable())
        .count();
    shakable as f64 / aggregates.len() as f64
}

/// Number of flattened modules under the filter.
pub fn total_module_count(snapshot: &Snapshot, chunk: Option<ChunkId>) -> usize {
    snapshot.module_indices(chunk).len()
}

//! Session: owns a loaded pair of snapshots and memoizes derived data.
//!
//! A [`Session`] is the primary interface for consumers comparing two
//! builds. Snapshots are immutable once loaded, so per-(side, chunk)
//! aggregation results are cached here instead of in module-level
//! globals; dropping the session drops the caches with it. Population
//! is idempotent — recomputing the same key produces the same value.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::compare::{
    self, ModuleComparison, NodeModule, NodeModuleComparison, join_node_modules,
};
use crate::error::Error;
use crate::graph::{self, ComparisonGraph, ExpandOptions};
use crate::ingest;
use crate::snapshot::{ChunkId, Snapshot};

/// Which snapshot of the pair a cached value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    From,
    To,
}

/// An open comparison session over two snapshots.
#[derive(Debug)]
pub struct Session {
    from: Snapshot,
    to: Snapshot,
    node_modules: HashMap<(Side, Option<ChunkId>), BTreeMap<String, NodeModule>>,
}

impl Session {
    pub fn new(from: Snapshot, to: Snapshot) -> Self {
        Self {
            from,
            to,
            node_modules: HashMap::new(),
        }
    }

    /// Load both snapshots from disk.
    pub fn open(old_path: &Path, new_path: &Path) -> Result<Self, Error> {
        let from = ingest::load_snapshot(old_path)?;
        let to = ingest::load_snapshot(new_path)?;
        Ok(Self::new(from, to))
    }

    pub fn snapshot(&self, side: Side) -> &Snapshot {
        match side {
            Side::From => &self.from,
            Side::To => &self.to,
        }
    }

    /// Validate a `--chunk` argument against both snapshots; the id must
    /// exist in at least one of them.
    pub fn validate_chunk(&self, chunk: Option<ChunkId>) -> Result<(), Error> {
        match chunk {
            Some(id) if !self.from.has_chunk(id) && !self.to.has_chunk(id) => {
                Err(Error::ChunkNotFound(id))
            }
            _ => Ok(()),
        }
    }

    /// Package aggregates for one side, memoized per (side, chunk).
    pub fn node_modules(
        &mut self,
        side: Side,
        chunk: Option<ChunkId>,
    ) -> &BTreeMap<String, NodeModule> {
        let key = (side, chunk);
        if !self.node_modules.contains_key(&key) {
            let computed = compare::node_modules(self.snapshot(side), chunk);
            self.node_modules.insert(key, computed);
        }
        &self.node_modules[&key]
    }

    /// Full outer module join between the two snapshots.
    pub fn compare_modules(&self, chunk: Option<ChunkId>) -> BTreeMap<String, ModuleComparison> {
        compare::compare_all_modules(&self.from, &self.to, chunk)
    }

    /// Full outer package join, reusing the memoized aggregates.
    pub fn compare_node_modules(&mut self, chunk: Option<ChunkId>) -> Vec<NodeModuleComparison> {
        let old = self.node_modules(Side::From, chunk).clone();
        let new = self.node_modules(Side::To, chunk).clone();
        join_node_modules(old, new)
    }

    /// Reverse-reachability graph of everything importing `package`.
    pub fn dependent_graph(
        &self,
        package: &str,
        chunk: Option<ChunkId>,
        opts: &ExpandOptions,
    ) -> Result<ComparisonGraph, Error> {
        graph::dependent_graph(&self.from, &self.to, package, chunk, opts)
    }

    /// Chunk-level bubble graph of the new snapshot against the old.
    pub fn chunk_graph(&self) -> ComparisonGraph {
        graph::chunk_graph(&self.from, &self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{RawModule, RawStats};

    fn module(identifier: &str, size: u64, chunks: &[ChunkId]) -> RawModule {
        RawModule {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            size,
            chunks: chunks.to_vec(),
            ..RawModule::default()
        }
    }

    fn session() -> Session {
        let old = Snapshot::new(RawStats {
            modules: vec![
                module("/p/node_modules/foo/index.js", 50, &[0]),
                module("./app.js", 100, &[0]),
            ],
            ..RawStats::default()
        });
        let new = Snapshot::new(RawStats {
            modules: vec![
                module("/p/node_modules/foo/index.js", 60, &[0]),
                module("./app.js", 100, &[0]),
            ],
            ..RawStats::default()
        });
        Session::new(old, new)
    }

    #[test]
    fn node_modules_memoized_per_side_and_chunk() {
        let mut s = session();
        assert_eq!(s.node_modules(Side::From, None)["foo"].total_size, 50);
        assert_eq!(s.node_modules(Side::To, None)["foo"].total_size, 60);
        // Second call hits the cache and agrees with the first.
        assert_eq!(s.node_modules(Side::From, None)["foo"].total_size, 50);
        assert_eq!(s.node_modules.len(), 2);
    }

    #[test]
    fn compare_node_modules_uses_both_sides() {
        let mut s = session();
        let output = s.compare_node_modules(None);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].from_size(), 50);
        assert_eq!(output[0].to_size(), 60);
    }

    #[test]
    fn validate_chunk_accepts_known_and_rejects_unknown() {
        let s = session();
        assert!(s.validate_chunk(None).is_ok());
        // Fixture has no chunk entries at all, so any id is unknown.
        assert!(matches!(
            s.validate_chunk(Some(9)),
            Err(Error::ChunkNotFound(9))
        ));
    }

    #[test]
    fn open_missing_file_errors() {
        let err = Session::open(
            Path::new("/no/such/old.json"),
            Path::new("/no/such/new.json"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::StatsRead(..)));
    }
}

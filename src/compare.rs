//! Comparison engine: symmetric diffs of two snapshots.
//!
//! Both comparisons are full outer joins — modules join on their
//! normalized identifier, node modules on their package name. An entry
//! present on only one side keeps a zero size for the other side, so
//! additions and deletions fall out of the same structure as changes.

use std::collections::BTreeMap;

use crate::identifier::{ImportType, ModuleKind, human_readable_identifier};
use crate::snapshot::{ChunkId, ModuleIndex, Snapshot};

/// One module's presence across the two snapshots, keyed by normalized
/// identifier in [`compare_all_modules`]' output.
#[derive(Debug, Clone)]
pub struct ModuleComparison {
    /// Normalized identifier (the join key).
    pub identifier: String,
    /// Loader-stripped identifier for display.
    pub readable_id: String,
    pub name: String,
    pub kind: ModuleKind,
    /// Owning npm package, when under `node_modules`.
    pub package: Option<String>,
    /// 0 when the module is new in this comparison.
    pub from_size: u64,
    /// 0 when the module was removed.
    pub to_size: u64,
    /// Arena index in the old snapshot, when present there.
    pub old: Option<ModuleIndex>,
    /// Arena index in the new snapshot, when present there.
    pub new: Option<ModuleIndex>,
}

impl ModuleComparison {
    pub fn delta(&self) -> i64 {
        self.to_size as i64 - self.from_size as i64
    }
}

/// Full outer join of the two snapshots' flattened modules, keyed by
/// normalized identifier. `BTreeMap` keeps output ordering deterministic.
pub fn compare_all_modules(
    old: &Snapshot,
    new: &Snapshot,
    chunk: Option<ChunkId>,
) -> BTreeMap<String, ModuleComparison> {
    let mut output: BTreeMap<String, ModuleComparison> = BTreeMap::new();

    for index in old.module_indices(chunk) {
        let m = old.module(index);
        output.insert(
            m.normalized.clone(),
            ModuleComparison {
                identifier: m.normalized.clone(),
                readable_id: human_readable_identifier(&m.identifier),
                name: m.name.clone(),
                kind: m.kind,
                package: m.package.clone(),
                from_size: m.size,
                to_size: 0,
                old: Some(index),
                new: None,
            },
        );
    }

    for index in new.module_indices(chunk) {
        let m = new.module(index);
        if let Some(existing) = output.get_mut(&m.normalized) {
            existing.new = Some(index);
            existing.to_size = m.size;
        } else {
            output.insert(
                m.normalized.clone(),
                ModuleComparison {
                    identifier: m.normalized.clone(),
                    readable_id: human_readable_identifier(&m.identifier),
                    name: m.name.clone(),
                    kind: m.kind,
                    package: m.package.clone(),
                    from_size: 0,
                    to_size: m.size,
                    old: None,
                    new: Some(index),
                },
            );
        }
    }

    output
}

/// Aggregate of every module belonging to one npm package.
#[derive(Debug, Clone)]
pub struct NodeModule {
    pub name: String,
    pub total_size: u64,
    /// Arena indices of the contributing modules.
    pub modules: Vec<ModuleIndex>,
    /// OR-combined import styles of all constituents.
    pub import_type: ImportType,
}

/// Groups a snapshot's flattened modules by owning package.
pub fn node_modules(snapshot: &Snapshot, chunk: Option<ChunkId>) -> BTreeMap<String, NodeModule> {
    let mut output: BTreeMap<String, NodeModule> = BTreeMap::new();

    for index in snapshot.module_indices(chunk) {
        let m = snapshot.module(index);
        let Some(package) = &m.package else {
            continue;
        };
        match output.get_mut(package) {
            Some(existing) => {
                existing.total_size += m.size;
                existing.import_type |= m.import_type;
                existing.modules.push(index);
            }
            None => {
                output.insert(
                    package.clone(),
                    NodeModule {
                        name: package.clone(),
                        total_size: m.size,
                        modules: vec![index],
                        import_type: m.import_type,
                    },
                );
            }
        }
    }

    output
}

/// One package's presence across the two snapshots.
#[derive(Debug, Clone)]
pub struct NodeModuleComparison {
    pub name: String,
    pub old: Option<NodeModule>,
    pub new: Option<NodeModule>,
}

impl NodeModuleComparison {
    pub fn from_size(&self) -> u64 {
        self.old.as_ref().map_or(0, |m| m.total_size)
    }

    pub fn to_size(&self) -> u64 {
        self.new.as_ref().map_or(0, |m| m.total_size)
    }

    pub fn delta(&self) -> i64 {
        self.to_size() as i64 - self.from_size() as i64
    }
}

/// Full outer join of the two snapshots' package aggregates, sorted by
/// package name.
pub fn compare_node_modules(
    old: &Snapshot,
    new: &Snapshot,
    chunk: Option<ChunkId>,
) -> Vec<NodeModuleComparison> {
    join_node_modules(node_modules(old, chunk), node_modules(new, chunk))
}

/// The join itself, split out so callers holding memoized aggregates
/// (see [`crate::session::Session`]) can reuse them.
pub fn join_node_modules(
    old_modules: BTreeMap<String, NodeModule>,
    mut new_modules: BTreeMap<String, NodeModule>,
) -> Vec<NodeModuleComparison> {
    let mut output: Vec<NodeModuleComparison> = Vec::with_capacity(old_modules.len());
    for (name, aggregate) in old_modules {
        let new_side = new_modules.remove(&name);
        output.push(NodeModuleComparison {
            name,
            old: Some(aggregate),
            new: new_side,
        });
    }
    // Whatever is left in the new map was added since the old snapshot.
    for (name, aggregate) in new_modules {
        output.push(NodeModuleComparison {
            name,
            old: None,
            new: Some(aggregate),
        });
    }

    output.sort_by(|a, b| a.name.cmp(&b.name));
    output
}

//! Build-stats snapshot model.
//!
//! [`RawStats`] mirrors the webpack stats JSON shape with tolerant
//! defaults: a snapshot missing `modules` or `chunks` deserializes to
//! empty collections instead of failing. [`Snapshot`] wraps the raw
//! document plus a flattened module arena built once at construction —
//! concatenated (scope-hoisted) parents are expanded into their children
//! so per-file accounting is accurate across builds.

use std::collections::HashMap;

use serde::Deserialize;

use crate::identifier::{
    self, ImportType, ModuleKind, identify_module_kind, normalize_identifier,
};

/// Webpack chunk ids are numeric in the stats documents we consume.
pub type ChunkId = u32;

/// Index of a flattened module within its snapshot's arena.
pub type ModuleIndex = usize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStats {
    #[serde(default)]
    pub chunks: Vec<RawChunk>,
    #[serde(default)]
    pub modules: Vec<RawModule>,
    /// Unix timestamp (ms) of the build, when the emitter recorded one.
    #[serde(default)]
    pub built_at: Option<u64>,
    /// Build duration in milliseconds.
    #[serde(default)]
    pub time: Option<u64>,
    /// Only the lengths of these are meaningful here; elements are
    /// free-form webpack diagnostics.
    #[serde(default)]
    pub warnings: Vec<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChunk {
    pub id: ChunkId,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub entry: bool,
    #[serde(default)]
    pub parents: Vec<ChunkId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModule {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub chunks: Vec<ChunkId>,
    #[serde(default)]
    pub reasons: Vec<RawReason>,
    /// Present only on concatenation roots.
    #[serde(default)]
    pub modules: Option<Vec<RawModule>>,
}

/// A recorded edge explaining why a module was included.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReason {
    #[serde(default)]
    pub module_identifier: Option<String>,
    /// Reason tag, e.g. `harmony side effect evaluation`, `cjs require`,
    /// `single entry`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub user_request: Option<String>,
}

impl RawReason {
    /// Whether this reason marks the module as an entry point.
    pub fn is_entry(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.contains("entry"))
    }
}

/// One flattened module: either a top-level stats module or a child
/// lifted out of a concatenation root. Derived fields (normalized key,
/// package attribution, classification, import type) are computed once
/// here so downstream passes never re-parse identifiers.
#[derive(Debug, Clone)]
pub struct FlatModule {
    pub identifier: String,
    /// Loader- and hash-stripped join key.
    pub normalized: String,
    /// Loader-stripped display label.
    pub name: String,
    pub size: u64,
    /// Chunk membership used for filtering. Concatenation children
    /// inherit the parent's chunk list — their own is usually empty.
    pub chunks: Vec<ChunkId>,
    pub reasons: Vec<RawReason>,
    pub kind: ModuleKind,
    /// Owning npm package, when the module lives under `node_modules`.
    pub package: Option<String>,
    pub import_type: ImportType,
    /// Normalized identifier of the concatenation root this module was
    /// lifted out of, if any.
    pub concat_parent: Option<String>,
}

impl FlatModule {
    fn from_raw(raw: &RawModule, parent: Option<&RawModule>) -> Self {
        let mut import_type = ImportType::UNKNOWN;
        for reason in &raw.reasons {
            if let Some(kind) = &reason.kind {
                import_type |= ImportType::from_reason_kind(kind);
            }
        }
        let chunks = match parent {
            Some(p) => p.chunks.clone(),
            None => raw.chunks.clone(),
        };
        Self {
            normalized: normalize_identifier(&raw.identifier),
            name: identifier::strip_loader(&raw.name).to_string(),
            size: raw.size,
            chunks,
            reasons: raw.reasons.clone(),
            kind: identify_module_kind(&raw.identifier),
            package: identifier::node_module_from_identifier(&raw.identifier),
            import_type,
            concat_parent: parent.map(|p| normalize_identifier(&p.identifier)),
            identifier: raw.identifier.clone(),
        }
    }

    pub fn in_chunk(&self, chunk: ChunkId) -> bool {
        self.chunks.contains(&chunk)
    }
}

/// One build's stats document plus its flattened module arena.
///
/// Immutable after construction; everything derived from it is a pure
/// function of the arena, so results may be cached by the caller.
#[derive(Debug, Default)]
pub struct Snapshot {
    raw: RawStats,
    arena: Vec<FlatModule>,
    by_normalized: HashMap<String, ModuleIndex>,
}

impl Snapshot {
    pub fn new(raw: RawStats) -> Self {
        let mut arena = Vec::with_capacity(raw.modules.len());
        for parent in &raw.modules {
            // A module with nested modules is a concatenation root:
            // unflatten it and emit only the children.
            match &parent.modules {
                Some(children) => {
                    for child in children {
                        arena.push(FlatModule::from_raw(child, Some(parent)));
                    }
                }
                None => arena.push(FlatModule::from_raw(parent, None)),
            }
        }
        // Last write wins on duplicate keys, matching source iteration
        // order.
        let by_normalized = arena
            .iter()
            .enumerate()
            .map(|(i, m)| (m.normalized.clone(), i))
            .collect();
        Self {
            raw,
            arena,
            by_normalized,
        }
    }

    pub fn chunks(&self) -> &[RawChunk] {
        &self.raw.chunks
    }

    pub fn built_at(&self) -> Option<u64> {
        self.raw.built_at
    }

    pub fn build_time_ms(&self) -> Option<u64> {
        self.raw.time
    }

    pub fn warning_count(&self) -> usize {
        self.raw.warnings.len()
    }

    pub fn error_count(&self) -> usize {
        self.raw.errors.len()
    }

    /// All flattened modules, in source insertion order.
    pub fn modules(&self) -> &[FlatModule] {
        &self.arena
    }

    pub fn module(&self, index: ModuleIndex) -> &FlatModule {
        &self.arena[index]
    }

    /// Flattened modules, optionally filtered to one chunk. Indices are
    /// stable arena positions, so results from different filters can be
    /// compared.
    pub fn module_indices(&self, chunk: Option<ChunkId>) -> Vec<ModuleIndex> {
        self.arena
            .iter()
            .enumerate()
            .filter(|(_, m)| chunk.is_none_or(|c| m.in_chunk(c)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Looks up a module by normalized identifier.
    pub fn module_by_normalized(&self, normalized: &str) -> Option<&FlatModule> {
        self.by_normalized.get(normalized).map(|&i| &self.arena[i])
    }

    /// Whether a chunk id exists in this snapshot.
    pub fn has_chunk(&self, chunk: ChunkId) -> bool {
        self.raw.chunks.iter().any(|c| c.id == chunk)
    }

    /// Modules that import the module with the given identifier,
    /// resolved through reason back-references.
    pub fn importers_of(&self, identifier: &str) -> Vec<&FlatModule> {
        let Some(root) = self.module_by_normalized(&normalize_identifier(identifier)) else {
            return Vec::new();
        };
        root.reasons
            .iter()
            .filter_map(|r| r.module_identifier.as_deref())
            .filter_map(|id| self.module_by_normalized(&normalize_identifier(id)))
            .collect()
    }

    /// Modules directly attributed to the named package. These seed the
    /// dependent graph for that package.
    pub fn direct_imports_of_package(&self, package: &str) -> Vec<ModuleIndex> {
        self.arena
            .iter()
            .enumerate()
            .filter(|(_, m)| m.package.as_deref() == Some(package))
            .map(|(i, _)| i)
            .collect()
    }
}

//! Bounded reverse-reachability graphs over import reasons.
//!
//! [`expand_node`] walks "who imports this" edges breadth-first from a
//! root set, producing a renderable node/edge list. Reason graphs are
//! not guaranteed acyclic after concatenation, so traversal keeps a
//! visited set; edges to already-visited nodes are still recorded, only
//! re-traversal is skipped. When the node budget or depth bound is hit
//! the walk stops and dangling edges are filtered out.
//!
//! Node ids are base64url-encoded identifiers: raw webpack identifiers
//! contain `!`, spaces, and path separators that are unsafe for graph
//! renderers and URL routing, and the encoding is injective.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet, VecDeque};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;

use crate::compare::{ModuleComparison, compare_all_modules};
use crate::error::Error;
use crate::report::{format_percentage_difference, format_size};
use crate::snapshot::{ChunkId, Snapshot};

const MAX_BUBBLE_AREA: f64 = 150.0;
const MIN_BUBBLE_AREA: f64 = 30.0;

/// Encodes an arbitrary identifier as a token safe to embed in node ids.
pub fn encode_id(identifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(identifier)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub font_color: String,
    pub bg_color: String,
    /// Bubble diameter in pixels; equal width and height.
    pub width: u32,
    pub height: u32,
    /// BFS distance from the root set.
    pub depth: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    pub max_depth: u32,
    /// Maximum number of nodes to expand before truncating.
    pub limit: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_depth: u32::MAX,
            limit: 1000,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Expansion {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// True when the depth bound or node budget cut the walk short.
    pub truncated: bool,
}

/// Breadth-first expansion from `roots` along `importers` edges.
///
/// BFS order makes truncation depth-fair: every root expands before any
/// depth-1 node does, so no root's island is starved out of a truncated
/// graph by queue position.
pub fn expand_node<'a, T>(
    roots: &[&'a T],
    opts: &ExpandOptions,
    identify: impl Fn(&T) -> &str,
    importers: impl Fn(&'a T) -> Vec<&'a T>,
    create: impl Fn(&'a T, &str) -> GraphNode,
) -> Expansion {
    let mut queue: VecDeque<(&'a T, u32)> = roots.iter().map(|&r| (r, 0)).collect();
    let mut visited: HashSet<String> =
        roots.iter().map(|&r| identify(r).to_string()).collect();
    let mut seen_edges: HashSet<String> = HashSet::new();

    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut budget = opts.limit;
    let mut truncated = false;

    while let Some((node, depth)) = queue.pop_front() {
        // Everything still queued is at this depth or deeper, so a
        // plain break loses nothing reachable within bounds.
        if depth > opts.max_depth {
            truncated = true;
            break;
        }
        if budget == 0 {
            truncated = true;
            break;
        }
        budget -= 1;

        let source = encode_id(identify(node));
        for found in importers(node) {
            let found_identifier = identify(found);
            let target = encode_id(found_identifier);

            if visited.insert(found_identifier.to_string()) {
                queue.push_back((found, depth + 1));
            }

            // Record the edge even when the target was already visited;
            // only re-traversal is skipped.
            let id = format!("edge{source}to{target}");
            if seen_edges.insert(id.clone()) {
                edges.push(GraphEdge {
                    id,
                    source: source.clone(),
                    target,
                });
            }
        }

        let mut graph_node = create(node, &source);
        graph_node.depth = depth;
        nodes.push(graph_node);
    }

    // Root-first ordering: renderers draw closer nodes first / on top.
    nodes.sort_by_key(|n| n.depth);

    let edges = if truncated {
        filter_unattached_edges(&nodes, edges)
    } else {
        edges
    };

    Expansion {
        nodes,
        edges,
        truncated,
    }
}

/// Drops edges whose source or target is missing from the node set.
/// Needed after truncation, which can leave edges pointing at nodes
/// that never got emitted.
pub fn filter_unattached_edges(nodes: &[GraphNode], edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    edges
        .into_iter()
        .filter(|e| node_ids.contains(e.source.as_str()) && node_ids.contains(e.target.as_str()))
        .collect()
}

/// Builds a bubble node whose area encodes size and whose color encodes
/// the direction and magnitude of the size change: red hue for growth,
/// green for shrinkage, neutral when unchanged.
pub fn file_size_node(
    id: String,
    label: &str,
    from_size: u64,
    to_size: u64,
    area: f64,
) -> GraphNode {
    let hue = if from_size < to_size {
        0
    } else if from_size > to_size {
        110
    } else {
        55
    };
    // Saturation scales with the relative change, capped. The divisor
    // floors at 1 so brand-new modules don't divide by zero.
    let magnitude = from_size.abs_diff(to_size) as f64 / to_size.max(1) as f64 * 100.0;
    let saturation = 40.0 + magnitude.min(60.0);

    let changed = from_size != to_size;
    let diameter = (2.0 * (area / std::f64::consts::PI).sqrt()).round() as u32;

    GraphNode {
        id,
        label: format!(
            "{label} ({}), {}",
            format_size(to_size),
            format_percentage_difference(from_size, to_size)
        ),
        font_color: if changed { "#fff" } else { "#666" }.to_string(),
        bg_color: if changed {
            format!("hsl({hue}, {saturation:.0}%, 50%)")
        } else {
            "#666".to_string()
        },
        width: diameter,
        height: diameter,
        depth: 0,
    }
}

/// A node/edge set plus graph roots, ready to serialize for a renderer.
#[derive(Debug, Default, Serialize)]
pub struct ComparisonGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Node ids that renderers should treat as layout roots.
    pub entries: Vec<String>,
    pub truncated: bool,
}

/// Expands a comparison map from the given root comparisons, walking
/// importer reasons on both the old and new side of each module.
pub fn expand_module_comparison(
    comparisons: &BTreeMap<String, ModuleComparison>,
    roots: &[&ModuleComparison],
    old: &Snapshot,
    new: &Snapshot,
    opts: &ExpandOptions,
) -> ComparisonGraph {
    let max_size = comparisons.values().map(|c| c.to_size).max().unwrap_or(0);
    let entries: RefCell<Vec<String>> = RefCell::new(Vec::new());

    let expansion = expand_node(
        roots,
        opts,
        |node: &ModuleComparison| node.identifier.as_str(),
        |node| {
            let mut output: Vec<&ModuleComparison> = Vec::new();
            let sides = [
                node.old.map(|i| old.module(i)),
                node.new.map(|i| new.module(i)),
            ];
            for module in sides.into_iter().flatten() {
                for reason in &module.reasons {
                    if let Some(importer) = reason
                        .module_identifier
                        .as_deref()
                        .and_then(|id| comparisons.get(&crate::identifier::normalize_identifier(id)))
                    {
                        output.push(importer);
                    }
                    if reason.is_entry() {
                        entries.borrow_mut().push(encode_id(&node.identifier));
                    }
                }
            }
            output
        },
        |node, id| {
            let weight = if max_size == 0 {
                0.0
            } else {
                node.to_size as f64 / max_size as f64
            };
            let area = (MAX_BUBBLE_AREA * weight).max(MIN_BUBBLE_AREA);
            file_size_node(id.to_string(), &node.name, node.from_size, node.to_size, area)
        },
    );

    let mut entries = entries.into_inner();
    entries.sort_unstable();
    entries.dedup();

    ComparisonGraph {
        nodes: expansion.nodes,
        edges: expansion.edges,
        entries,
        truncated: expansion.truncated,
    }
}

/// Graph of everything that (transitively) imports the named package.
///
/// Roots are the comparison entries for modules attributed to the
/// package; expansion walks importers, then edges are reversed so
/// arrows point importer → package, converging on a synthetic hub node.
pub fn dependent_graph(
    old: &Snapshot,
    new: &Snapshot,
    package: &str,
    chunk: Option<ChunkId>,
    opts: &ExpandOptions,
) -> Result<ComparisonGraph, Error> {
    let direct = old.direct_imports_of_package(package);
    if direct.is_empty() {
        return Err(Error::PackageNotFound(package.to_string()));
    }

    let comparisons = compare_all_modules(old, new, chunk);
    let roots: Vec<&ModuleComparison> = direct
        .iter()
        .filter_map(|&i| comparisons.get(&old.module(i).normalized))
        .collect();

    let mut graph = expand_module_comparison(&comparisons, &roots, old, new, opts);

    for edge in &mut graph.edges {
        std::mem::swap(&mut edge.source, &mut edge.target);
    }

    const HUB_ID: &str = "index";
    graph.nodes.push(GraphNode {
        id: HUB_ID.to_string(),
        label: package.to_string(),
        font_color: "#fff".to_string(),
        bg_color: "#4a9fd8".to_string(),
        width: 20,
        height: 20,
        depth: 0,
    });
    for root in &roots {
        let source = encode_id(&root.identifier);
        graph.edges.push(GraphEdge {
            id: format!("edge{source}to{HUB_ID}"),
            source,
            target: HUB_ID.to_string(),
        });
    }
    graph.entries = vec![HUB_ID.to_string()];

    Ok(graph)
}

/// Chunk-level graph: one bubble per chunk in the new snapshot, sized
/// by chunk size and colored against the same-id chunk in the old
/// snapshot; edges follow chunk parent links.
pub fn chunk_graph(old: &Snapshot, new: &Snapshot) -> ComparisonGraph {
    let max_size = new.chunks().iter().map(|c| c.size).max().unwrap_or(0);
    let mut entries = Vec::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for chunk in new.chunks() {
        if chunk.entry {
            entries.push(chunk.id.to_string());
        }
        let from_size = old
            .chunks()
            .iter()
            .find(|c| c.id == chunk.id)
            .map_or(0, |c| c.size);
        let weight = if max_size == 0 {
            0.0
        } else {
            chunk.size as f64 / max_size as f64
        };
        let area = (MAX_BUBBLE_AREA * weight).max(MIN_BUBBLE_AREA);
        nodes.push(file_size_node(
            chunk.id.to_string(),
            &format!("Chunk {}", chunk.id),
            from_size,
            chunk.size,
            area,
        ));

        for parent in &chunk.parents {
            edges.push(GraphEdge {
                id: format!("edge{}to{parent}", chunk.id),
                source: chunk.id.to_string(),
                target: parent.to_string(),
            });
        }
    }

    ComparisonGraph {
        nodes,
        edges,
        entries,
        truncated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{RawChunk, RawModule, RawReason, RawStats};

    fn module(
        identifier: &str,
        size: u64,
        chunks: &[ChunkId],
        importers: &[&str],
    ) -> RawModule {
        RawModule {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            size,
            chunks: chunks.to_vec(),
            reasons: importers
                .iter()
                .map(|&id| RawReason {
                    module_identifier: Some(id.to_string()),
                    kind: Some("harmony import".to_string()),
                    user_request: None,
                })
                .collect(),
            ..RawModule::default()
        }
    }

    fn snapshot(modules: Vec<RawModule>) -> Snapshot {
        Snapshot::new(RawStats {
            modules,
            ..RawStats::default()
        })
    }

    /// entry -> mid -> leaf import chain; reasons point from importee
    /// back to importer, which is the direction we traverse.
    fn chain_snapshot() -> Snapshot {
        snapshot(vec![
            module("./entry.js", 10, &[0], &[]),
            module("./mid.js", 20, &[0], &["./entry.js"]),
            module("./leaf.js", 30, &[0], &["./mid.js"]),
        ])
    }

    #[test]
    fn expand_walks_importers_to_roots() {
        let old = chain_snapshot();
        let new = chain_snapshot();
        let comparisons = compare_all_modules(&old, &new, None);
        let roots = vec![&comparisons["./leaf.js"]];

        let graph = expand_module_comparison(
            &comparisons,
            &roots,
            &old,
            &new,
            &ExpandOptions::default(),
        );
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert!(!graph.truncated);

        // Depth bookkeeping: leaf at 0, mid at 1, entry at 2.
        assert_eq!(graph.nodes[0].depth, 0);
        assert_eq!(graph.nodes[2].depth, 2);
    }

    #[test]
    fn expand_is_cycle_safe() {
        // a imports b, b imports a.
        let snap = || {
            snapshot(vec![
                module("./a.js", 10, &[0], &["./b.js"]),
                module("./b.js", 20, &[0], &["./a.js"]),
            ])
        };
        let (old, new) = (snap(), snap());
        let comparisons = compare_all_modules(&old, &new, None);
        let roots = vec![&comparisons["./a.js"]];

        let graph = expand_module_comparison(
            &comparisons,
            &roots,
            &old,
            &new,
            &ExpandOptions::default(),
        );
        assert_eq!(graph.nodes.len(), 2);
        // Both directions recorded even though traversal visits each
        // node once.
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn truncated_expansion_has_no_dangling_edges() {
        let old = chain_snapshot();
        let new = chain_snapshot();
        let comparisons = compare_all_modules(&old, &new, None);
        let roots = vec![&comparisons["./leaf.js"]];

        let graph = expand_module_comparison(
            &comparisons,
            &roots,
            &old,
            &new,
            &ExpandOptions {
                max_depth: u32::MAX,
                limit: 2,
            },
        );
        assert!(graph.truncated);
        assert!(graph.nodes.len() < 3);

        let ids: std::collections::HashSet<&str> =
            graph.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &graph.edges {
            assert!(ids.contains(edge.source.as_str()));
            assert!(ids.contains(edge.target.as_str()));
        }
    }

    #[test]
    fn max_depth_truncates() {
        let old = chain_snapshot();
        let new = chain_snapshot();
        let comparisons = compare_all_modules(&old, &new, None);
        let roots = vec![&comparisons["./leaf.js"]];

        let graph = expand_module_comparison(
            &comparisons,
            &roots,
            &old,
            &new,
            &ExpandOptions {
                max_depth: 1,
                limit: 1000,
            },
        );
        assert!(graph.truncated);
        assert!(graph.nodes.iter().all(|n| n.depth <= 1));
    }

    #[test]
    fn nodes_sorted_root_first() {
        let old = chain_snapshot();
        let new = chain_snapshot();
        let comparisons = compare_all_modules(&old, &new, None);
        let roots = vec![&comparisons["./leaf.js"]];

        let graph = expand_module_comparison(
            &comparisons,
            &roots,
            &old,
            &new,
            &ExpandOptions::default(),
        );
        let depths: Vec<u32> = graph.nodes.iter().map(|n| n.depth).collect();
        let mut sorted = depths.clone();
        sorted.sort_unstable();
        assert_eq!(depths, sorted);
    }

    #[test]
    fn file_size_node_colors_by_direction() {
        let grown = file_size_node("a".into(), "a", 100, 150, 100.0);
        assert!(grown.bg_color.starts_with("hsl(0,"));
        assert_eq!(grown.font_color, "#fff");

        let shrunk = file_size_node("b".into(), "b", 150, 100, 100.0);
        assert!(shrunk.bg_color.starts_with("hsl(110,"));

        let flat = file_size_node("c".into(), "c", 100, 100, 100.0);
        assert_eq!(flat.bg_color, "#666");
        assert_eq!(flat.font_color, "#666");
    }

    #[test]
    fn file_size_node_new_module_has_finite_saturation() {
        // from_size 0: divisor floors at 1, saturation capped at 100%.
        let node = file_size_node("n".into(), "n", 0, 500, 100.0);
        assert!(node.bg_color.starts_with("hsl(0, 100%"));
    }

    #[test]
    fn encode_id_is_token_safe() {
        let encoded = encode_id("loader!/path/to/module.js abc");
        assert!(encoded.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        assert_ne!(encode_id("./a.js"), encode_id("./b.js"));
    }

    #[test]
    fn dependent_graph_converges_on_hub() {
        let snap = || {
            snapshot(vec![
                module("./app.js", 10, &[0], &[]),
                module(
                    "/p/node_modules/foo/index.js",
                    50,
                    &[0],
                    &["./app.js"],
                ),
            ])
        };
        let (old, new) = (snap(), snap());
        let graph =
            dependent_graph(&old, &new, "foo", None, &ExpandOptions::default()).unwrap();

        assert!(graph.nodes.iter().any(|n| n.id == "index"));
        assert_eq!(graph.entries, vec!["index".to_string()]);
        // The direct import has an edge into the hub.
        assert!(graph.edges.iter().any(|e| e.target == "index"));
    }

    #[test]
    fn dependent_graph_unknown_package_errors() {
        let old = chain_snapshot();
        let new = chain_snapshot();
        let err = dependent_graph(&old, &new, "nope", None, &ExpandOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::PackageNotFound(_)));
    }

    #[test]
    fn chunk_graph_builds_parent_edges() {
        let chunks = vec![
            RawChunk {
                id: 0,
                size: 100,
                entry: true,
                parents: vec![],
            },
            RawChunk {
                id: 1,
                size: 50,
                entry: false,
                parents: vec![0],
            },
        ];
        let old = Snapshot::new(RawStats {
            chunks: chunks.clone(),
            ..RawStats::default()
        });
        let new = Snapshot::new(RawStats {
            chunks,
            ..RawStats::default()
        });

        let graph = chunk_graph(&old, &new);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source, "1");
        assert_eq!(graph.edges[0].target, "0");
        assert_eq!(graph.entries, vec!["0".to_string()]);

        // Every edge endpoint names a real chunk node.
        let ids: std::collections::HashSet<&str> =
            graph.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &graph.edges {
            assert!(ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()));
        }
    }
}

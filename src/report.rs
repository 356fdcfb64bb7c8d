//! Text and JSON rendering of comparison results.

use serde::Serialize;

use crate::compare::{ModuleComparison, NodeModuleComparison};
use crate::graph::ComparisonGraph;
use crate::reducers;
use crate::snapshot::{ChunkId, Snapshot};

pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.0} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{bytes} B")
    }
}

/// Signed size delta, e.g. `+1.2 KB` / `-300 B`.
pub fn format_size_difference(from: u64, to: u64) -> String {
    let sign = if to < from { '-' } else { '+' };
    format!("{sign}{}", format_size(from.abs_diff(to)))
}

/// Signed relative change, e.g. `+25.0%`. The divisor floors at 1 so a
/// module that did not exist before reads as +100% rather than NaN.
pub fn format_percentage_difference(from: u64, to: u64) -> String {
    let delta = (to as f64 / from.max(1) as f64 - 1.0) * 100.0;
    let sign = if delta < 0.0 { '-' } else { '+' };
    format!("{sign}{:.1}%", delta.abs())
}

// --- overview ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOverview {
    total_chunk_size_bytes: u64,
    entry_chunk_size_bytes: u64,
    average_chunk_size_bytes: f64,
    chunk_count: usize,
    module_count: usize,
    node_module_count: usize,
    node_module_size_bytes: u64,
    tree_shakable_percent: f64,
    built_at: Option<u64>,
    build_time_ms: Option<u64>,
    warning_count: usize,
    error_count: usize,
}

fn overview_data(snapshot: &Snapshot, chunk: Option<ChunkId>) -> JsonOverview {
    JsonOverview {
        total_chunk_size_bytes: reducers::total_chunk_size(snapshot),
        entry_chunk_size_bytes: reducers::entry_chunk_size(snapshot),
        average_chunk_size_bytes: reducers::average_chunk_size(snapshot),
        chunk_count: snapshot.chunks().len(),
        module_count: reducers::total_module_count(snapshot, chunk),
        node_module_count: reducers::node_module_count(snapshot, chunk),
        node_module_size_bytes: reducers::node_module_size(snapshot, chunk),
        tree_shakable_percent: reducers::tree_shakable_percent(snapshot, chunk),
        built_at: snapshot.built_at(),
        build_time_ms: snapshot.build_time_ms(),
        warning_count: snapshot.warning_count(),
        error_count: snapshot.error_count(),
    }
}

pub fn print_overview(snapshot: &Snapshot, chunk: Option<ChunkId>) {
    let data = overview_data(snapshot, chunk);
    if let Some(c) = chunk {
        println!("Overview (chunk {c}):");
    } else {
        println!("Overview:");
    }
    println!(
        "  {:<28} {}",
        "Total chunk size",
        format_size(data.total_chunk_size_bytes)
    );
    println!(
        "  {:<28} {}",
        "Entry chunk size",
        format_size(data.entry_chunk_size_bytes)
    );
    println!(
        "  {:<28} {} across {} chunks",
        "Average chunk size",
        format_size(data.average_chunk_size_bytes.round() as u64),
        data.chunk_count
    );
    println!("  {:<28} {}", "Modules", data.module_count);
    println!(
        "  {:<28} {} ({})",
        "Dependencies",
        data.node_module_count,
        format_size(data.node_module_size_bytes)
    );
    println!(
        "  {:<28} {:.0}%",
        "Tree-shakable dependencies",
        data.tree_shakable_percent * 100.0
    );
    if let Some(ms) = data.build_time_ms {
        println!("  {:<28} {:.1}s", "Build time", ms as f64 / 1000.0);
    }
    if data.warning_count > 0 || data.error_count > 0 {
        println!(
            "  {:<28} {} warnings, {} errors",
            "Diagnostics", data.warning_count, data.error_count
        );
    }
}

pub fn print_overview_json(snapshot: &Snapshot, chunk: Option<ChunkId>) {
    let data = overview_data(snapshot, chunk);
    println!("{}", serde_json::to_string_pretty(&data).unwrap());
}

// --- packages ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonPackage {
    name: String,
    total_size_bytes: u64,
    module_count: usize,
    import_type: &'static str,
}

pub fn print_packages(snapshot: &Snapshot, chunk: Option<ChunkId>, top: usize) {
    let mut packages: Vec<_> = crate::compare::node_modules(snapshot, chunk)
        .into_values()
        .collect();
    if packages.is_empty() {
        println!("No third-party dependencies found in the snapshot.");
        return;
    }
    packages.sort_by(|a, b| b.total_size.cmp(&a.total_size));
    packages.truncate(top);

    println!(
        "{} package{}:\n",
        packages.len(),
        if packages.len() == 1 { "" } else { "s" }
    );
    for pkg in &packages {
        println!(
            "  {:<40} {:>9}  {:>3} modules  {}",
            pkg.name,
            format_size(pkg.total_size),
            pkg.modules.len(),
            pkg.import_type.label()
        );
    }
}

pub fn print_packages_json(snapshot: &Snapshot, chunk: Option<ChunkId>, top: usize) {
    let mut packages: Vec<_> = crate::compare::node_modules(snapshot, chunk)
        .into_values()
        .collect();
    packages.sort_by(|a, b| b.total_size.cmp(&a.total_size));
    packages.truncate(top);

    let json: Vec<JsonPackage> = packages
        .into_iter()
        .map(|pkg| JsonPackage {
            name: pkg.name,
            total_size_bytes: pkg.total_size,
            module_count: pkg.modules.len(),
            import_type: pkg.import_type.label(),
        })
        .collect();
    let output = serde_json::json!({
        "packageCount": json.len(),
        "packages": json,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

// --- compare ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonModuleDelta {
    identifier: String,
    name: String,
    kind: crate::identifier::ModuleKind,
    node_module: Option<String>,
    from_size_bytes: u64,
    to_size_bytes: u64,
    delta_bytes: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonPackageDelta {
    name: String,
    from_size_bytes: u64,
    to_size_bytes: u64,
    delta_bytes: i64,
    added: bool,
    removed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonComparison {
    from_total_bytes: u64,
    to_total_bytes: u64,
    delta_bytes: i64,
    module_count: usize,
    changed_module_count: usize,
    modules: Vec<JsonModuleDelta>,
    packages: Vec<JsonPackageDelta>,
}

fn comparison_data(
    modules: &std::collections::BTreeMap<String, ModuleComparison>,
    packages: &[NodeModuleComparison],
    top: usize,
) -> JsonComparison {
    let from_total: u64 = modules.values().map(|m| m.from_size).sum();
    let to_total: u64 = modules.values().map(|m| m.to_size).sum();

    let mut changed: Vec<&ModuleComparison> =
        modules.values().filter(|m| m.delta() != 0).collect();
    changed.sort_by_key(|m| std::cmp::Reverse(m.delta().unsigned_abs()));
    let changed_module_count = changed.len();
    changed.truncate(top);

    let mut package_deltas: Vec<&NodeModuleComparison> =
        packages.iter().filter(|p| p.delta() != 0).collect();
    package_deltas.sort_by_key(|p| std::cmp::Reverse(p.delta().unsigned_abs()));
    package_deltas.truncate(top);

    JsonComparison {
        from_total_bytes: from_total,
        to_total_bytes: to_total,
        delta_bytes: to_total as i64 - from_total as i64,
        module_count: modules.len(),
        changed_module_count,
        modules: changed
            .into_iter()
            .map(|m| JsonModuleDelta {
                identifier: m.identifier.clone(),
                name: m.name.clone(),
                kind: m.kind,
                node_module: m.package.clone(),
                from_size_bytes: m.from_size,
                to_size_bytes: m.to_size,
                delta_bytes: m.delta(),
            })
            .collect(),
        packages: package_deltas
            .into_iter()
            .map(|p| JsonPackageDelta {
                name: p.name.clone(),
                from_size_bytes: p.from_size(),
                to_size_bytes: p.to_size(),
                delta_bytes: p.delta(),
                added: p.old.is_none(),
                removed: p.new.is_none(),
            })
            .collect(),
    }
}

pub fn print_compare(
    modules: &std::collections::BTreeMap<String, ModuleComparison>,
    packages: &[NodeModuleComparison],
    label_old: &str,
    label_new: &str,
    top: usize,
) {
    let data = comparison_data(modules, packages, top);

    println!("Diff: {label_old} vs {label_new}");
    println!();
    println!("  {:<40} {}", label_old, format_size(data.from_total_bytes));
    println!("  {:<40} {}", label_new, format_size(data.to_total_bytes));
    println!(
        "  {:<40} {} ({})",
        "Delta",
        format_size_difference(data.from_total_bytes, data.to_total_bytes),
        format_percentage_difference(data.from_total_bytes, data.to_total_bytes)
    );
    println!();

    if data.modules.is_empty() {
        println!("No module size changes.");
        return;
    }

    println!(
        "Changed modules ({} of {}):",
        data.modules.len(),
        data.changed_module_count
    );
    for m in &data.modules {
        let marker = if m.from_size_bytes == 0 {
            "+"
        } else if m.to_size_bytes == 0 {
            "-"
        } else {
            " "
        };
        println!(
            "  {marker} {:<52} {:>10}",
            m.name,
            format_size_difference(m.from_size_bytes, m.to_size_bytes)
        );
    }

    if !data.packages.is_empty() {
        println!();
        println!("Changed dependencies:");
        for p in &data.packages {
            let marker = if p.added {
                "+"
            } else if p.removed {
                "-"
            } else {
                " "
            };
            println!(
                "  {marker} {:<52} {:>10}",
                p.name,
                format_size_difference(p.from_size_bytes, p.to_size_bytes)
            );
        }
    }
}

pub fn print_compare_json(
    modules: &std::collections::BTreeMap<String, ModuleComparison>,
    packages: &[NodeModuleComparison],
    top: usize,
) {
    let data = comparison_data(modules, packages, top);
    println!("{}", serde_json::to_string_pretty(&data).unwrap());
}

// --- graph ---

/// Graphs are renderer input; they only exist as JSON.
pub fn print_graph_json(graph: &ComparisonGraph) {
    println!("{}", serde_json::to_string_pretty(graph).unwrap());
}

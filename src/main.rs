use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sizeup::error::Error;
use sizeup::graph::ExpandOptions;
use sizeup::ingest;
use sizeup::report;
use sizeup::session::{Session, Side};
use sizeup::snapshot::ChunkId;

#[derive(Parser)]
#[command(
    name = "sizeup",
    version,
    about = "Compare webpack build-stats snapshots: module diffs, dependency weight, import graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one snapshot: sizes, counts, tree-shakability
    Overview {
        /// Stats file (JSON, gzipped JSON, or MessagePack)
        stats: PathBuf,

        /// Restrict module metrics to one chunk
        #[arg(long)]
        chunk: Option<ChunkId>,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// List third-party dependencies in one snapshot by size
    Packages {
        /// Stats file (JSON, gzipped JSON, or MessagePack)
        stats: PathBuf,

        /// Restrict to one chunk
        #[arg(long)]
        chunk: Option<ChunkId>,

        /// Show top N packages by size
        #[arg(long, default_value_t = 20)]
        top: usize,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Diff two snapshots: changed modules and dependencies
    Compare {
        /// The "before" stats file
        old: PathBuf,

        /// The "after" stats file
        new: PathBuf,

        /// Restrict the diff to one chunk
        #[arg(long)]
        chunk: Option<ChunkId>,

        /// Show top N changes by absolute delta
        #[arg(long, default_value_t = 20)]
        top: usize,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Emit a renderable import graph as JSON
    Graph {
        #[command(subcommand)]
        kind: GraphCommands,
    },
}

#[derive(Subcommand)]
enum GraphCommands {
    /// Graph of modules importing a dependency package
    Modules {
        /// The "before" stats file
        old: PathBuf,

        /// The "after" stats file
        new: PathBuf,

        /// Dependency package name (e.g. lodash, @scope/pkg)
        #[arg(long)]
        package: String,

        /// Restrict to one chunk
        #[arg(long)]
        chunk: Option<ChunkId>,

        /// Stop expanding past this depth
        #[arg(long)]
        max_depth: Option<u32>,

        /// Stop after expanding this many nodes
        #[arg(long, default_value_t = 1000)]
        limit: usize,
    },

    /// Chunk-level graph following chunk parent links
    Chunks {
        /// The "before" stats file
        old: PathBuf,

        /// The "after" stats file
        new: PathBuf,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Commands::Overview { stats, chunk, json } => {
            let snapshot = ingest::load_snapshot(&stats)?;
            if let Some(id) = chunk
                && !snapshot.has_chunk(id)
            {
                return Err(Error::ChunkNotFound(id));
            }
            if json {
                report::print_overview_json(&snapshot, chunk);
            } else {
                report::print_overview(&snapshot, chunk);
            }
        }

        Commands::Packages {
            stats,
            chunk,
            top,
            json,
        } => {
            let snapshot = ingest::load_snapshot(&stats)?;
            if let Some(id) = chunk
                && !snapshot.has_chunk(id)
            {
                return Err(Error::ChunkNotFound(id));
            }
            if json {
                report::print_packages_json(&snapshot, chunk, top);
            } else {
                report::print_packages(&snapshot, chunk, top);
            }
        }

        Commands::Compare {
            old,
            new,
            chunk,
            top,
            json,
        } => {
            let mut session = Session::open(&old, &new)?;
            session.validate_chunk(chunk)?;

            let modules = session.compare_modules(chunk);
            let packages = session.compare_node_modules(chunk);

            if json {
                report::print_compare_json(&modules, &packages, top);
            } else {
                let label_old = file_label(&old);
                let label_new = file_label(&new);
                report::print_compare(&modules, &packages, &label_old, &label_new, top);
                let to = session.snapshot(Side::To);
                if to.warning_count() > 0 || to.error_count() > 0 {
                    eprintln!(
                        "note: new build reported {} warnings, {} errors",
                        to.warning_count(),
                        to.error_count()
                    );
                }
            }
        }

        Commands::Graph { kind } => match kind {
            GraphCommands::Modules {
                old,
                new,
                package,
                chunk,
                max_depth,
                limit,
            } => {
                let session = Session::open(&old, &new)?;
                session.validate_chunk(chunk)?;
                let opts = ExpandOptions {
                    max_depth: max_depth.unwrap_or(u32::MAX),
                    limit,
                };
                let graph = session.dependent_graph(&package, chunk, &opts)?;
                if graph.truncated {
                    eprintln!(
                        "note: graph truncated at {limit} nodes; edges to missing nodes were dropped"
                    );
                }
                report::print_graph_json(&graph);
            }

            GraphCommands::Chunks { old, new } => {
                let session = Session::open(&old, &new)?;
                report::print_graph_json(&session.chunk_graph());
            }
        },
    }

    Ok(())
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

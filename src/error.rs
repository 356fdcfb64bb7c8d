//! Error types for the sizeup CLI.

use std::path::PathBuf;

use crate::snapshot::ChunkId;

/// Errors from snapshot ingestion and target resolution.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Cannot read a stats file from disk.
    StatsRead(PathBuf, std::io::Error),
    /// Stats file contains invalid JSON.
    StatsParseJson(PathBuf, serde_json::Error),
    /// Stats file contains invalid MessagePack.
    StatsParseMsgpack(PathBuf, rmp_serde::decode::Error),
    /// Gzip stream could not be decompressed.
    Decompress(PathBuf, std::io::Error),
    /// Stats file is empty.
    EmptyStats(PathBuf),
    /// --chunk id not present in the snapshot(s).
    ChunkNotFound(ChunkId),
    /// --package name not found in the snapshot.
    PackageNotFound(String),
}

impl Error {
    /// User-facing hint to accompany the error message.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::StatsParseJson(..) | Self::StatsParseMsgpack(..) => Some(
                "sizeup reads webpack stats as JSON, gzipped JSON, or MessagePack \
                 (e.g. the output of `webpack --json`)",
            ),
            Self::ChunkNotFound(_) => Some("run `sizeup overview <stats>` to list the chunk ids"),
            Self::PackageNotFound(_) => {
                Some("run `sizeup packages <stats>` to list dependency names")
            }
            _ => None,
        }
    }
}

// Display: lowercase, no trailing punctuation, so it composes into
// larger error messages.
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatsRead(path, source) => {
                write!(f, "cannot read stats file '{}': {source}", path.display())
            }
            Self::StatsParseJson(path, source) => {
                write!(f, "invalid stats JSON in '{}': {source}", path.display())
            }
            Self::StatsParseMsgpack(path, source) => {
                write!(
                    f,
                    "invalid MessagePack stats in '{}': {source}",
                    path.display()
                )
            }
            Self::Decompress(path, source) => {
                write!(f, "cannot decompress '{}': {source}", path.display())
            }
            Self::EmptyStats(path) => {
                write!(f, "stats file '{}' is empty", path.display())
            }
            Self::ChunkNotFound(id) => write!(f, "chunk {id} not found in snapshot"),
            Self::PackageNotFound(name) => {
                write!(f, "package '{name}' not found in snapshot")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StatsRead(_, e) | Self::Decompress(_, e) => Some(e),
            Self::StatsParseJson(_, e) => Some(e),
            Self::StatsParseMsgpack(_, e) => Some(e),
            _ => None,
        }
    }
}

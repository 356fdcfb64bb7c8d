//! Snapshot ingestion: byte-format detection and decoding.
//!
//! Stats files arrive in three encodings, distinguished by magic bytes:
//! gzip (`1f 8b`, always wrapping JSON), plain JSON (first byte `{`),
//! or MessagePack (anything else). After decoding, top-level modules
//! with an empty chunk list are dropped — they are orphaned entries the
//! bundler tracked but never emitted into any output chunk.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::Error;
use crate::snapshot::{RawStats, Snapshot};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Load a snapshot from disk, decoding whichever format the file holds.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, Error> {
    let bytes = fs::read(path).map_err(|e| Error::StatsRead(path.to_path_buf(), e))?;
    let raw = decode_stats(path, &bytes)?;
    Ok(Snapshot::new(prune_chunkless(raw)))
}

/// Decode raw snapshot bytes into [`RawStats`], sniffing the format.
pub fn decode_stats(path: &Path, bytes: &[u8]) -> Result<RawStats, Error> {
    if bytes.is_empty() {
        return Err(Error::EmptyStats(path.to_path_buf()));
    }

    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decoded)
            .map_err(|e| Error::Decompress(path.to_path_buf(), e))?;
        return serde_json::from_slice(&decoded)
            .map_err(|e| Error::StatsParseJson(path.to_path_buf(), e));
    }

    if bytes[0] == b'{' {
        return serde_json::from_slice(bytes)
            .map_err(|e| Error::StatsParseJson(path.to_path_buf(), e));
    }

    rmp_serde::from_slice(bytes).map_err(|e| Error::StatsParseMsgpack(path.to_path_buf(), e))
}

/// Drop top-level modules that contribute to no chunk. Concatenation
/// children keep their (often empty) chunk lists — membership for them
/// comes from the parent during flattening.
fn prune_chunkless(mut raw: RawStats) -> RawStats {
    raw.modules.retain(|m| !m.chunks.is_empty());
    raw
}

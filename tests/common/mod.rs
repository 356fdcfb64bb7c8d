use std::path::{Path, PathBuf};

use serde_json::json;

/// A pair of webpack stats files for integration tests.
///
/// Old build:
///   chunk 0 (entry, 1000 B) <- chunk 1 (400 B)
///   ./src/index.js  60 B, entry module
///   ./src/app.js    80 B, imported by index, identifier hash `abc123`
///   ./src/gone.js   40 B, chunk 1, removed in the new build
///   lodash          500 B, required (cjs) by app
///
/// New build:
///   ./src/app.js grew to 120 B, identifier hash `def456`
///   ./src/gone.js removed, ./src/fresh.js (30 B) added
///   lodash grew to 550 B; one build warning recorded
///
/// Properties:
///   - app.js joins across builds only via identifier normalization
///   - one added, one removed, two changed modules
///   - import chain lodash <- app <- index for dependent graphs
pub struct StatsPair {
    pub dir: tempfile::TempDir,
    pub old: PathBuf,
    pub new: PathBuf,
}

impl StatsPair {
    /// Create the fixture. Caller must keep the returned value alive
    /// (dropping `TempDir` deletes the files).
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.json");
        let new = dir.path().join("new.json");
        std::fs::write(&old, serde_json::to_vec_pretty(&old_stats()).unwrap()).unwrap();
        std::fs::write(&new, serde_json::to_vec_pretty(&new_stats()).unwrap()).unwrap();
        Self { dir, old, new }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn old_stats() -> serde_json::Value {
    json!({
        "builtAt": 1_700_000_000_000u64,
        "time": 4200,
        "warnings": [],
        "errors": [],
        "chunks": [
            {"id": 0, "size": 1000, "entry": true, "parents": []},
            {"id": 1, "size": 400, "entry": false, "parents": [0]}
        ],
        "modules": [
            {
                "identifier": "./src/index.js",
                "name": "./src/index.js",
                "size": 60,
                "chunks": [0],
                "reasons": [{"type": "single entry", "userRequest": "./src/index.js"}]
            },
            {
                "identifier": "./src/app.js abc123",
                "name": "./src/app.js",
                "size": 80,
                "chunks": [0],
                "reasons": [{
                    "moduleIdentifier": "./src/index.js",
                    "type": "harmony side effect evaluation"
                }]
            },
            {
                "identifier": "./src/gone.js",
                "name": "./src/gone.js",
                "size": 40,
                "chunks": [1],
                "reasons": [{
                    "moduleIdentifier": "./src/index.js",
                    "type": "harmony import specifier"
                }]
            },
            {
                "identifier": "/proj/node_modules/lodash/index.js",
                "name": "./node_modules/lodash/index.js",
                "size": 500,
                "chunks": [0],
                "reasons": [{
                    "moduleIdentifier": "./src/app.js abc123",
                    "type": "cjs require"
                }]
            }
        ]
    })
}

fn new_stats() -> serde_json::Value {
    json!({
        "builtAt": 1_700_000_100_000u64,
        "time": 3900,
        "warnings": ["asset size limit"],
        "errors": [],
        "chunks": [
            {"id": 0, "size": 1100, "entry": true, "parents": []},
            {"id": 1, "size": 350, "entry": false, "parents": [0]}
        ],
        "modules": [
            {
                "identifier": "./src/index.js",
                "name": "./src/index.js",
                "size": 60,
                "chunks": [0],
                "reasons": [{"type": "single entry", "userRequest": "./src/index.js"}]
            },
            {
                "identifier": "./src/app.js def456",
                "name": "./src/app.js",
                "size": 120,
                "chunks": [0],
                "reasons": [{
                    "moduleIdentifier": "./src/index.js",
                    "type": "harmony side effect evaluation"
                }]
            },
            {
                "identifier": "./src/fresh.js",
                "name": "./src/fresh.js",
                "size": 30,
                "chunks": [0],
                "reasons": [{
                    "moduleIdentifier": "./src/index.js",
                    "type": "harmony import specifier"
                }]
            },
            {
                "identifier": "/proj/node_modules/lodash/index.js",
                "name": "./node_modules/lodash/index.js",
                "size": 550,
                "chunks": [0],
                "reasons": [{
                    "moduleIdentifier": "./src/app.js def456",
                    "type": "cjs require"
                }]
            }
        ]
    })
}

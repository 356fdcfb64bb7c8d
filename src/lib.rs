#![warn(clippy::pedantic)]
// Binary crate with internal library — all callers are us.
// These doc lints are for public API documentation, not applicable here.
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
// Sizes fit comfortably in the lossy ranges these lints guard.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod compare;
pub mod error;
pub mod graph;
pub mod identifier;
pub mod ingest;
pub mod reducers;
pub mod report;
pub mod session;
pub mod snapshot;

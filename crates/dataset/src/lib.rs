//! Read-only digest lookups against an NSRL reference dataset.
//!
//! This crate answers "is a file with this digest in the reference corpus,
//! and if so, which software package shipped it?" against a pre-built SQLite
//! dataset. The dataset is never written to; it is assumed to be static for
//! the lifetime of the process.
//!
//! # Architecture
//! - **Digest**: MD5, SHA-1 or SHA-256, told apart purely by length.
//! - **Schema**: the physical table and column names are discovered once,
//!   when connecting, and every query is rendered from them.
//! - **Repository**: the existence query (against the `DISTINCT_HASH` view)
//!   and the detail query (FILE outer-joined through PKG, OS and MFG).
//! - **Details**: raw joined rows become nested provenance records where
//!   every relationship is optional.
//! - **Summary**: detail records collapsed per package name for display.

mod db;
pub mod details;
pub mod digest;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod lookup;
mod models;
mod repo;
pub mod schema;
pub mod summary;

pub use crate::db::{Database, MAX_CONNECTIONS};
pub use crate::details::FileDetails;
pub use crate::digest::{Algorithm, Digest, classify};
pub use crate::lookup::Lookup;
pub use crate::models::{DistinctHash, RawFileRow};
pub use crate::repo::Repository;
pub use crate::summary::{DEFAULT_MAX_RESULTS, FlatDetail, Summary, SummaryCounters, summarize};

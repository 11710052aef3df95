//! Dataset Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A dataset error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The digest length does not match MD5, SHA-1 or SHA-256.
    #[display("invalid digest type specified: '{_0}'")]
    InvalidDigestFormat(#[error(not(source))] String),
    /// The digest was well-formed but the dataset has no record of it.
    #[display("file not in dataset: {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("database error")]
    Database,
    /// The mounted dataset does not have the layout needed to answer lookups.
    #[display("dataset schema mismatch: {_0}")]
    Schema(#[error(not(source))] String),
    /// A stored value could not be converted into its model type.
    #[display("invalid dataset value: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Every lookup is a pure function of the (static) dataset and the
        // digest; asking again gives the same answer.
        false
    }

    /// Returns `true` if the error is the caller's to fix (bad input or an
    /// unknown digest) rather than a fault in the dataset or its storage.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidDigestFormat(_) | Self::NotFound(_))
    }
}

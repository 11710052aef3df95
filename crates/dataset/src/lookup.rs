//! Client-facing lookups.
//!
//! [`Lookup`] is what a transport layer builds its endpoints on: every
//! operation either answers, reports a malformed digest, or reports that the
//! digest isn't in the dataset.

use std::num::NonZeroUsize;
use tracing::{debug, instrument};

use crate::Database;
use crate::details::FileDetails;
use crate::error::{ErrorKind, Result};
use crate::models::DistinctHash;
use crate::repo::Repository;
use crate::summary::{self, DEFAULT_MAX_RESULTS, Summary};

const DEFAULT_BOUND: NonZeroUsize = match NonZeroUsize::new(DEFAULT_MAX_RESULTS) {
    Some(bound) => bound,
    None => NonZeroUsize::MIN,
};

#[derive(Debug, Clone)]
pub struct Lookup {
    repository: Repository,
    max_results: NonZeroUsize,
}
impl From<&Database> for Lookup {
    fn from(db: &Database) -> Self {
        Self::new(Repository::from(db), DEFAULT_BOUND)
    }
}
impl Lookup {
    pub fn new(repository: Repository, max_results: NonZeroUsize) -> Self {
        Self { repository, max_results }
    }

    /// Bound the number of package detail rows a summary reports.
    pub fn with_max_results(mut self, max_results: NonZeroUsize) -> Self {
        self.max_results = max_results;
        self
    }

    /// The hash triple of the file, if the dataset knows about it.
    #[instrument(skip(self))]
    pub async fn existence(&self, digest: &str) -> Result<DistinctHash> {
        match self.repository.find_distinct(digest).await? {
            Some(hash) => Ok(hash),
            None => exn::bail!(ErrorKind::NotFound(digest.to_string())),
        }
    }

    /// Every file record (and its provenance) for the digest.
    #[instrument(skip(self))]
    pub async fn details(&self, digest: &str) -> Result<Vec<FileDetails>> {
        let rows = self.repository.find_details(digest).await?;
        if rows.is_empty() {
            exn::bail!(ErrorKind::NotFound(digest.to_string()));
        }
        rows.into_iter().map(FileDetails::try_from).collect()
    }

    /// A package-centric summary of the detail records for the digest.
    #[instrument(skip(self))]
    pub async fn summarize(&self, digest: &str) -> Result<Summary> {
        let details = self.details(digest).await?;
        let summary = summary::summarize(&details, self.max_results.get());
        debug!(
            details = summary.details.len(),
            uniq_packages = summary.counters.uniq_packages,
            num_packages = summary.counters.num_packages,
            "summarized detail records"
        );
        Ok(summary)
    }
}

//! Lookup queries against the bound dataset.
//!
//! Both queries are read-only and idempotent. Each call checks a connection
//! out of the pool for its own duration; the guard hands it back on every
//! exit path, including errors.

use exn::ResultExt;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::Database;
use crate::digest::Digest;
use crate::error::{ErrorKind, Result};
use crate::models::{DistinctHash, RawFileRow};
use crate::schema::Schema;

/// Repository for digest lookups in the reference dataset.
///
/// # Relationships
///
/// - A hash triple may appear in many FILE rows (one per packaging)
/// - A FILE row references at most one package
/// - A package references at most one operating system and at most one
///   manufacturer; an operating system references at most one manufacturer
/// - Any of those references may be missing
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    schema: Arc<Schema>,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            schema: Arc::clone(db.schema()),
        }
    }
}
impl Repository {
    /// Find the distinct hash triple for a digest.
    ///
    /// At most one row is expected. Should the dataset contain duplicates the
    /// first one is returned, as-is.
    #[instrument(skip(self))]
    pub async fn find_distinct(&self, digest: &str) -> Result<Option<DistinctHash>> {
        let digest: Digest = digest.parse()?;
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        let rows: Vec<DistinctHash> = sqlx::query_as(self.schema.existence_sql(digest.algorithm()))
            .bind(digest.as_str())
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if rows.len() > 1 {
            warn!(%digest, algorithm = %digest.algorithm(), "dataset holds duplicate distinct hashes, using the first");
        }
        Ok(rows.into_iter().next())
    }

    /// Find every file record for a digest, outer-joined through its
    /// package, operating system and manufacturers.
    ///
    /// Rows are ordered by package reference, file name and file size.
    #[instrument(skip(self))]
    pub async fn find_details(&self, digest: &str) -> Result<Vec<RawFileRow>> {
        let digest: Digest = digest.parse()?;
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        let rows: Vec<RawFileRow> = sqlx::query_as(self.schema.details_sql(digest.algorithm()))
            .bind(digest.as_str())
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        debug!(algorithm = %digest.algorithm(), rows = rows.len(), "fetched detail rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Dataset, sample};
    use rstest::rstest;

    async fn repository() -> (Dataset, Repository) {
        let dataset = Dataset::sample().await;
        let db = Database::connect(dataset.path(), None).await.unwrap();
        (dataset, Repository::from(&db))
    }

    #[rstest]
    #[case(sample::WORD_MD5)]
    #[case(sample::WORD_SHA1)]
    #[case(sample::WORD_SHA256)]
    #[tokio::test]
    async fn test_find_distinct_by_any_digest(#[case] digest: &str) {
        let (_dataset, repo) = repository().await;
        let expected = DistinctHash {
            sha256: sample::WORD_SHA256.to_string(),
            sha1: sample::WORD_SHA1.to_string(),
            md5: sample::WORD_MD5.to_string(),
        };
        assert_eq!(repo.find_distinct(digest).await.unwrap(), Some(expected.clone()));
        assert_eq!(repo.find_distinct(&digest.to_lowercase()).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_find_distinct_not_found() {
        let (_dataset, repo) = repository().await;
        assert_eq!(repo.find_distinct(&"a".repeat(32)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_distinct_returns_first_of_duplicates() {
        let dataset = Dataset::create(&format!(
            "{}\n{}",
            crate::fixtures::RDSV3_SCHEMA,
            r#"
                DROP VIEW DISTINCT_HASH;
                CREATE VIEW DISTINCT_HASH AS SELECT sha256, sha1, md5 FROM FILE;
                INSERT INTO FILE VALUES ('S1', 'H1', 'DUPLICATEDDUPLICATEDDUPLICATED00', 'A.EXE', 1, NULL);
                INSERT INTO FILE VALUES ('S2', 'H2', 'DUPLICATEDDUPLICATEDDUPLICATED00', 'B.EXE', 1, NULL);
            "#
        ))
        .await;
        let db = Database::connect(dataset.path(), None).await.unwrap();
        let repo = Repository::from(&db);
        let found = repo.find_distinct("duplicatedduplicatedduplicated00").await.unwrap().unwrap();
        assert!(found.sha256 == "S1" || found.sha256 == "S2");
    }

    #[tokio::test]
    async fn test_find_details_returns_every_packaging() {
        let (_dataset, repo) = repository().await;
        let rows = repo.find_details(sample::WORD_MD5).await.unwrap();
        let names = rows.iter().map(|r| r.package_name.as_deref()).collect::<Vec<_>>();
        assert_eq!(names, [Some("Microsoft Word"), Some("Word")]);
    }

    #[tokio::test]
    async fn test_find_details_dangling_package_reads_as_absent() {
        let (_dataset, repo) = repository().await;
        let rows = repo.find_details(sample::DANGLING_SHA1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].package_id, None);
        assert_eq!(rows[0].package_name, None);
    }

    #[rstest]
    #[case("notadigest")]
    #[case("")]
    #[tokio::test]
    async fn test_invalid_digest_is_rejected(#[case] digest: &str) {
        let (_dataset, repo) = repository().await;
        let err = repo.find_distinct(digest).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidDigestFormat(digest.to_string()));
        let err = repo.find_details(digest).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidDigestFormat(digest.to_string()));
    }
}

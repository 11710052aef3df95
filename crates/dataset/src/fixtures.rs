//! Throwaway NSRL-shaped datasets for tests.
//!
//! The lookup side of this crate only ever opens datasets read-only, so
//! fixtures are written through a separate, writable connection into a
//! temporary directory and then handed to [`Database::connect`] like any
//! externally built dataset.
//!
//! Do NOT apply `#[cfg(test)]` alone so that other crates can also use this
//! in their tests (enable the `fixtures` feature).

use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::Database;

/// Minimal RDSv3 layout, including tables the lookups never touch.
pub const RDSV3_SCHEMA: &str = r#"
    CREATE TABLE VERSION (
        version TEXT PRIMARY KEY,
        build_set TEXT NOT NULL,
        build_date TIMESTAMP NOT NULL,
        release_date TIMESTAMP NOT NULL,
        description TEXT NOT NULL
    );
    CREATE TABLE MFG (
        manufacturer_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE OS (
        operating_system_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        version TEXT NOT NULL,
        manufacturer_id INTEGER
    );
    CREATE TABLE PKG (
        package_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        version TEXT NOT NULL,
        operating_system_id INTEGER,
        manufacturer_id INTEGER,
        language TEXT NOT NULL,
        application_type TEXT NOT NULL
    );
    CREATE TABLE FILE (
        sha256 VARCHAR NOT NULL,
        sha1 VARCHAR NOT NULL,
        md5 VARCHAR NOT NULL,
        file_name TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        package_id INTEGER
    );
    CREATE INDEX FILE_SHA256_IDX ON FILE (sha256);
    CREATE INDEX FILE_SHA1_IDX ON FILE (sha1);
    CREATE INDEX FILE_MD5_IDX ON FILE (md5);
    CREATE VIEW DISTINCT_HASH AS SELECT DISTINCT sha256, sha1, md5 FROM FILE;
"#;

/// Digests and rows of the [`Dataset::sample`] dataset.
pub mod sample {
    /// `WORD.EXE`, packaged by both "Microsoft Word" and "Word".
    pub const WORD_SHA256: &str = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";
    pub const WORD_SHA1: &str = "AC91EF00F33F12DD491CC91EF00F33F12DD491CA";
    pub const WORD_MD5: &str = "DC2311FFDC0015FCCC12130FF145DE78";

    /// Every relationship present.
    pub const FULL_SHA256: &str = "50B2C6C05BBDEF754ABA71FFB1A88A03A48D63CA7426049435A568093825E541";
    pub const FULL_SHA1: &str = "6A3AD39E5EAC4B7A4D2DC7DCBB6E40A204932131";
    pub const FULL_MD5: &str = "1B6A3B720DEC5E60FDA2ECB0EE713661";

    /// Package has a manufacturer but no operating system.
    pub const NO_OS_SHA256: &str = "50B2C6C05BBDEF754ABA71FFB1A88A03A48D63CA7426049435A568093825E542";
    pub const NO_OS_SHA1: &str = "6A3AD39E5EAC4B7A4D2DC7DCBB6E40A204932132";
    pub const NO_OS_MD5: &str = "1B6A3B720DEC5E60FDA2ECB0EE713662";

    /// Package has an operating system (itself without a manufacturer) and
    /// no manufacturer of its own.
    pub const BARE_OS_SHA256: &str = "50B2C6C05BBDEF754ABA71FFB1A88A03A48D63CA7426049435A568093825E543";
    pub const BARE_OS_SHA1: &str = "6A3AD39E5EAC4B7A4D2DC7DCBB6E40A204932133";
    pub const BARE_OS_MD5: &str = "1B6A3B720DEC5E60FDA2ECB0EE713663";

    /// Package and operating system made by different manufacturers.
    pub const MIXED_SHA256: &str = "50B2C6C05BBDEF754ABA71FFB1A88A03A48D63CA7426049435A568093825E544";
    pub const MIXED_SHA1: &str = "6A3AD39E5EAC4B7A4D2DC7DCBB6E40A204932134";
    pub const MIXED_MD5: &str = "1B6A3B720DEC5E60FDA2ECB0EE713664";

    /// File row without a package reference.
    pub const ORPHAN_SHA256: &str = "50B2C6C05BBDEF754ABA71FFB1A88A03A48D63CA7426049435A568093825E545";
    pub const ORPHAN_SHA1: &str = "6A3AD39E5EAC4B7A4D2DC7DCBB6E40A204932135";
    pub const ORPHAN_MD5: &str = "1B6A3B720DEC5E60FDA2ECB0EE713665";

    /// File row referencing a package that doesn't exist.
    pub const DANGLING_SHA256: &str = "50B2C6C05BBDEF754ABA71FFB1A88A03A48D63CA7426049435A568093825E546";
    pub const DANGLING_SHA1: &str = "6A3AD39E5EAC4B7A4D2DC7DCBB6E40A204932136";
    pub const DANGLING_MD5: &str = "1B6A3B720DEC5E60FDA2ECB0EE713666";

    /// `SETUP.EXE`, shipped in several versions of a suite, an unnamed
    /// package and a second product.
    pub const SETUP_SHA256: &str = "9F86D081884C7D659A2FEAA0C55AD015A3BF4F1B2B0B822CD15D6C15B0F00A08";
    pub const SETUP_SHA1: &str = "A94A8FE5CCB19BA61C4C0873D391E987982FBBD3";
    pub const SETUP_MD5: &str = "098F6BCD4621D373CADE4E832627B4F6";

    pub(super) fn script() -> String {
        format!(
            r#"
                INSERT INTO VERSION VALUES ('2024.12.1', 'modern', '2024-12-01 00:00:00', '2024-12-01 00:00:00', 'minimal');
                INSERT INTO MFG VALUES (1, 'Microsoft Corporation');
                INSERT INTO MFG VALUES (2, 'Rand Corporation');
                INSERT INTO OS VALUES (1, 'Windows NT', '4.0', 1);
                INSERT INTO OS VALUES (2, 'Custom OS', '1.0', 2);
                INSERT INTO OS VALUES (3, 'Bare OS', '2.1', NULL);
                INSERT INTO PKG VALUES (1, 'Microsoft Word', '2000', 1, 1, 'English', 'Operating System');
                INSERT INTO PKG VALUES (2, 'Word', '2000', 1, 1, 'English', 'Operating System');
                INSERT INTO PKG VALUES (3, 'PKG1', '2007', 2, 2, 'English', 'Operating System');
                INSERT INTO PKG VALUES (4, 'PKG1', '2007', NULL, 2, 'English', 'Operating System');
                INSERT INTO PKG VALUES (5, 'PKG1', '2007', 3, NULL, 'English', 'Operating System');
                INSERT INTO PKG VALUES (6, 'PKG2', '2009', 2, 1, 'English', 'Application');
                INSERT INTO PKG VALUES (7, 'Rand Suite', ' 3.0 ', 2, 2, 'English', 'Application');
                INSERT INTO PKG VALUES (8, '', '1.0', NULL, NULL, 'English', 'Application');
                INSERT INTO PKG VALUES (9, 'Rand Suite', '3.1', 2, 2, 'English', 'Application');
                INSERT INTO PKG VALUES (10, 'Rand Tools', '1.0', NULL, 2, 'English', 'Application');
                INSERT INTO FILE VALUES ('{WORD_SHA256}', '{WORD_SHA1}', '{WORD_MD5}', 'WORD.EXE', 1217645, 1);
                INSERT INTO FILE VALUES ('{WORD_SHA256}', '{WORD_SHA1}', '{WORD_MD5}', 'WORD.EXE', 1217645, 2);
                INSERT INTO FILE VALUES ('{FULL_SHA256}', '{FULL_SHA1}', '{FULL_MD5}', 'FILEa.EXE', 123456, 3);
                INSERT INTO FILE VALUES ('{NO_OS_SHA256}', '{NO_OS_SHA1}', '{NO_OS_MD5}', 'FILEb.EXE', 123456, 4);
                INSERT INTO FILE VALUES ('{BARE_OS_SHA256}', '{BARE_OS_SHA1}', '{BARE_OS_MD5}', 'FILEc.EXE', 123456, 5);
                INSERT INTO FILE VALUES ('{MIXED_SHA256}', '{MIXED_SHA1}', '{MIXED_MD5}', 'FILEd.EXE', 2048, 6);
                INSERT INTO FILE VALUES ('{ORPHAN_SHA256}', '{ORPHAN_SHA1}', '{ORPHAN_MD5}', 'README.TXT', 64, NULL);
                INSERT INTO FILE VALUES ('{DANGLING_SHA256}', '{DANGLING_SHA1}', '{DANGLING_MD5}', 'LOST.DLL', 512, 99);
                INSERT INTO FILE VALUES ('{SETUP_SHA256}', '{SETUP_SHA1}', '{SETUP_MD5}', 'SETUP.EXE', 4096, 10);
                INSERT INTO FILE VALUES ('{SETUP_SHA256}', '{SETUP_SHA1}', '{SETUP_MD5}', 'SETUP.EXE', 4096, 9);
                INSERT INTO FILE VALUES ('{SETUP_SHA256}', '{SETUP_SHA1}', '{SETUP_MD5}', 'SETUP.EXE', 4096, 8);
                INSERT INTO FILE VALUES ('{SETUP_SHA256}', '{SETUP_SHA1}', '{SETUP_MD5}', 'SETUP.EXE', 4096, 7);
            "#
        )
    }
}

/// A dataset file living in its own temporary directory.
///
/// The directory (and the dataset) is removed when this is dropped, so keep
/// it alive for as long as any [`Database`] connected to it.
pub struct Dataset {
    _dir: TempDir,
    path: PathBuf,
}
impl Dataset {
    /// Create a dataset by running `script` against an empty database.
    ///
    /// Panics if the script fails. If test setup is wrong, then the test
    /// should not pass.
    pub async fn create(script: &str) -> Self {
        let dir = tempfile::tempdir().expect("temporary directory for dataset fixture");
        let path = dir.path().join("rdsv3_minimal.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(false);
        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .expect("writable connection to dataset fixture");
        sqlx::raw_sql(script)
            .execute(&mut conn)
            .await
            .expect("dataset fixture script");
        conn.close().await.expect("closing dataset fixture");
        Self { _dir: dir, path }
    }

    /// The RDSv3 layout populated with the rows described in [`sample`].
    pub async fn sample() -> Self {
        Self::create(&format!("{RDSV3_SCHEMA}\n{}", sample::script())).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Connect to the dataset the same way a server process would.
    pub async fn connect(&self) -> Database {
        Database::connect(&self.path, None)
            .await
            .expect("read-only connection to dataset fixture")
    }
}

//! Schema binding.
//!
//! The reference dataset is built elsewhere, so its physical layout is
//! discovered rather than declared: [`Schema::bind`] reads `sqlite_master`
//! and `pragma_table_info` once per connection pool, resolves each logical
//! entity (and every column the lookups need) case-insensitively, and
//! renders the lookup SQL from those descriptors. Nothing else in the crate
//! refers to a physical table or column name.

use exn::ResultExt;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::{debug, instrument};

use crate::digest::Algorithm;
use crate::error::{ErrorKind, Result};

/// A physical identifier discovered in the dataset, rendered quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);
impl Ident {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "\"{}\"", self.0.replace('"', "\"\""))
    }
}

/// Columns of a single table or view, keyed by lowercased name.
struct Discovered {
    table: Ident,
    columns: HashMap<String, Ident>,
}
impl Discovered {
    fn column(&self, logical: &str) -> Result<Ident> {
        match self.columns.get(&logical.to_ascii_lowercase()) {
            Some(column) => Ok(column.clone()),
            None => exn::bail!(ErrorKind::Schema(format!(
                "{} has no column '{logical}'",
                self.table.as_str()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileEntity {
    pub table: Ident,
    pub sha256: Ident,
    pub sha1: Ident,
    pub md5: Ident,
    pub file_name: Ident,
    pub file_size: Ident,
    pub package_id: Ident,
}
impl FileEntity {
    pub fn digest(&self, algorithm: Algorithm) -> &Ident {
        match algorithm {
            Algorithm::Md5 => &self.md5,
            Algorithm::Sha1 => &self.sha1,
            Algorithm::Sha256 => &self.sha256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistinctHashEntity {
    pub table: Ident,
    pub sha256: Ident,
    pub sha1: Ident,
    pub md5: Ident,
}
impl DistinctHashEntity {
    pub fn digest(&self, algorithm: Algorithm) -> &Ident {
        match algorithm {
            Algorithm::Md5 => &self.md5,
            Algorithm::Sha1 => &self.sha1,
            Algorithm::Sha256 => &self.sha256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageEntity {
    pub table: Ident,
    pub package_id: Ident,
    pub name: Ident,
    pub version: Ident,
    pub language: Ident,
    pub application_type: Ident,
    pub operating_system_id: Ident,
    pub manufacturer_id: Ident,
}

#[derive(Debug, Clone)]
pub struct OperatingSystemEntity {
    pub table: Ident,
    pub operating_system_id: Ident,
    pub name: Ident,
    pub version: Ident,
    pub manufacturer_id: Ident,
}

#[derive(Debug, Clone)]
pub struct ManufacturerEntity {
    pub table: Ident,
    pub manufacturer_id: Ident,
    pub name: Ident,
}

/// Lookup SQL rendered once per algorithm at bind time.
#[derive(Debug, Clone)]
struct Queries {
    existence: [String; 3],
    details: [String; 3],
}

/// The bound entity layout of the mounted dataset.
#[derive(Debug, Clone)]
pub struct Schema {
    pub file: FileEntity,
    pub distinct_hash: DistinctHashEntity,
    pub package: PackageEntity,
    pub operating_system: OperatingSystemEntity,
    pub manufacturer: ManufacturerEntity,
    queries: Queries,
}

fn slot(algorithm: Algorithm) -> usize {
    match algorithm {
        Algorithm::Md5 => 0,
        Algorithm::Sha1 => 1,
        Algorithm::Sha256 => 2,
    }
}

impl Schema {
    pub const FILE: &'static str = "FILE";
    pub const PACKAGE: &'static str = "PKG";
    pub const OPERATING_SYSTEM: &'static str = "OS";
    pub const MANUFACTURER: &'static str = "MFG";
    pub const DISTINCT_HASH: &'static str = "DISTINCT_HASH";

    /// Discover the entity layout of the dataset behind `conn`.
    ///
    /// Fails with [`ErrorKind::Schema`] if any entity, or any column a lookup
    /// depends on, cannot be found. Tables, views and columns that aren't
    /// needed (e.g. NSRL's `VERSION` table) are ignored.
    #[instrument("binding dataset schema", skip_all)]
    pub(crate) async fn bind(conn: &mut SqliteConnection) -> Result<Self> {
        let objects: Vec<String> = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type IN ('table', 'view')")
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let objects: HashMap<String, String> =
            objects.into_iter().map(|name| (name.to_ascii_lowercase(), name)).collect();

        let file = Self::discover(conn, &objects, Self::FILE).await?;
        let distinct = Self::discover(conn, &objects, Self::DISTINCT_HASH).await?;
        let package = Self::discover(conn, &objects, Self::PACKAGE).await?;
        let os = Self::discover(conn, &objects, Self::OPERATING_SYSTEM).await?;
        let manufacturer = Self::discover(conn, &objects, Self::MANUFACTURER).await?;

        let file = FileEntity {
            sha256: file.column("sha256")?,
            sha1: file.column("sha1")?,
            md5: file.column("md5")?,
            file_name: file.column("file_name")?,
            file_size: file.column("file_size")?,
            package_id: file.column("package_id")?,
            table: file.table,
        };
        let distinct_hash = DistinctHashEntity {
            sha256: distinct.column("sha256")?,
            sha1: distinct.column("sha1")?,
            md5: distinct.column("md5")?,
            table: distinct.table,
        };
        let package = PackageEntity {
            package_id: package.column("package_id")?,
            name: package.column("name")?,
            version: package.column("version")?,
            language: package.column("language")?,
            application_type: package.column("application_type")?,
            operating_system_id: package.column("operating_system_id")?,
            manufacturer_id: package.column("manufacturer_id")?,
            table: package.table,
        };
        let operating_system = OperatingSystemEntity {
            operating_system_id: os.column("operating_system_id")?,
            name: os.column("name")?,
            version: os.column("version")?,
            manufacturer_id: os.column("manufacturer_id")?,
            table: os.table,
        };
        let manufacturer = ManufacturerEntity {
            manufacturer_id: manufacturer.column("manufacturer_id")?,
            name: manufacturer.column("name")?,
            table: manufacturer.table,
        };

        let mut schema = Self {
            file,
            distinct_hash,
            package,
            operating_system,
            manufacturer,
            queries: Queries {
                existence: Default::default(),
                details: Default::default(),
            },
        };
        for algorithm in Algorithm::ALL {
            schema.queries.existence[slot(algorithm)] = schema.render_existence(algorithm);
            schema.queries.details[slot(algorithm)] = schema.render_details(algorithm);
        }
        debug!(
            file = schema.file.table.as_str(),
            distinct_hash = schema.distinct_hash.table.as_str(),
            package = schema.package.table.as_str(),
            operating_system = schema.operating_system.table.as_str(),
            manufacturer = schema.manufacturer.table.as_str(),
            "dataset schema bound"
        );
        Ok(schema)
    }

    async fn discover(
        conn: &mut SqliteConnection,
        objects: &HashMap<String, String>,
        logical: &'static str,
    ) -> Result<Discovered> {
        let Some(name) = objects.get(&logical.to_ascii_lowercase()) else {
            exn::bail!(ErrorKind::Schema(format!("missing table or view '{logical}'")));
        };
        let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
            .bind(name)
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Discovered {
            table: Ident(name.clone()),
            columns: columns.into_iter().map(|c| (c.to_ascii_lowercase(), Ident(c))).collect(),
        })
    }

    /// SQL selecting the distinct hash triple matching a single digest.
    ///
    /// At most two rows are returned: one is expected, a second only tells
    /// the repository that the dataset holds duplicates.
    pub fn existence_sql(&self, algorithm: Algorithm) -> &str {
        &self.queries.existence[slot(algorithm)]
    }

    /// SQL selecting every file row (and its optional provenance) matching a
    /// single digest.
    pub fn details_sql(&self, algorithm: Algorithm) -> &str {
        &self.queries.details[slot(algorithm)]
    }

    fn render_existence(&self, algorithm: Algorithm) -> String {
        let d = &self.distinct_hash;
        format!(
            "SELECT {sha256} AS sha256, {sha1} AS sha1, {md5} AS md5 FROM {table} WHERE {column} = ?1 LIMIT 2",
            sha256 = d.sha256,
            sha1 = d.sha1,
            md5 = d.md5,
            table = d.table,
            column = d.digest(algorithm),
        )
    }

    fn render_details(&self, algorithm: Algorithm) -> String {
        let (f, p, o, m) = (&self.file, &self.package, &self.operating_system, &self.manufacturer);
        // Every relationship is optional, hence LEFT JOIN all the way down.
        // The ORDER BY keeps row order (and therefore summaries) reproducible.
        format!(
            r#"
                SELECT
                    f.{f_sha256} AS sha256,
                    f.{f_sha1} AS sha1,
                    f.{f_md5} AS md5,
                    f.{f_name} AS file_name,
                    f.{f_size} AS file_size,
                    p.{p_id} AS package_id,
                    p.{p_name} AS package_name,
                    p.{p_version} AS package_version,
                    p.{p_language} AS package_language,
                    p.{p_type} AS package_application_type,
                    pm.{m_id} AS package_manufacturer_id,
                    pm.{m_name} AS package_manufacturer_name,
                    o.{o_id} AS os_id,
                    o.{o_name} AS os_name,
                    o.{o_version} AS os_version,
                    om.{m_id} AS os_manufacturer_id,
                    om.{m_name} AS os_manufacturer_name
                FROM {f_table} AS f
                LEFT JOIN {p_table} AS p ON p.{p_id} = f.{f_package}
                LEFT JOIN {m_table} AS pm ON pm.{m_id} = p.{p_manufacturer}
                LEFT JOIN {o_table} AS o ON o.{o_id} = p.{p_os}
                LEFT JOIN {m_table} AS om ON om.{m_id} = o.{o_manufacturer}
                WHERE f.{f_digest} = ?1
                ORDER BY f.{f_package}, f.{f_name}, f.{f_size}
            "#,
            f_sha256 = f.sha256,
            f_sha1 = f.sha1,
            f_md5 = f.md5,
            f_name = f.file_name,
            f_size = f.file_size,
            f_package = f.package_id,
            f_digest = f.digest(algorithm),
            f_table = f.table,
            p_id = p.package_id,
            p_name = p.name,
            p_version = p.version,
            p_language = p.language,
            p_type = p.application_type,
            p_manufacturer = p.manufacturer_id,
            p_os = p.operating_system_id,
            p_table = p.table,
            o_id = o.operating_system_id,
            o_name = o.name,
            o_version = o.version,
            o_manufacturer = o.manufacturer_id,
            o_table = o.table,
            m_id = m.manufacturer_id,
            m_name = m.name,
            m_table = m.table,
        )
    }
}

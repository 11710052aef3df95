/// A single FILE row outer-joined through its optional provenance chain.
///
/// Every column past `file_size` comes from a LEFT JOIN and is therefore
/// nullable. The `*_id` columns are read from the *joined* table rather than
/// the referencing foreign key, so a dangling reference looks exactly like an
/// absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct RawFileRow {
    pub sha256: String,
    pub sha1: String,
    pub md5: String,
    pub file_name: String,
    pub file_size: i64,
    pub package_id: Option<i64>,
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub package_language: Option<String>,
    pub package_application_type: Option<String>,
    pub package_manufacturer_id: Option<i64>,
    pub package_manufacturer_name: Option<String>,
    pub os_id: Option<i64>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub os_manufacturer_id: Option<i64>,
    pub os_manufacturer_name: Option<String>,
}

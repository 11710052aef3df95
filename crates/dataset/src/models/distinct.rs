use serde::Serialize;

/// Existence-only projection of a hash identity.
///
/// Independent of how many packages reference the file, the dataset holds one
/// of these per hash triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, sqlx::FromRow)]
pub struct DistinctHash {
    pub sha256: String,
    pub sha1: String,
    pub md5: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_triple() {
        let hash = DistinctHash {
            sha256: "S".to_string(),
            sha1: "H".to_string(),
            md5: "M".to_string(),
        };
        let json = serde_json::to_value(&hash).unwrap();
        assert_eq!(json, serde_json::json!({"sha256": "S", "sha1": "H", "md5": "M"}));
    }
}

//! Package-centric summaries of detail lookups.
//!
//! A popular file can be shipped by hundreds of packages. For presentation,
//! the detail rows are collapsed so that each package name is reported once
//! (with every version it was seen at), and only the first `max_results`
//! package names get a flattened detail row.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::details::{FileDetails, Package};

/// Default bound on the number of flattened detail rows.
pub const DEFAULT_MAX_RESULTS: usize = 25;

/// A single file record and its provenance, flattened for display.
///
/// Absent relationships become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatDetail {
    pub sha256: String,
    pub sha1: String,
    pub md5: String,
    pub file_name: String,
    pub file_size: u64,
    pub package_name: String,
    pub package_app_type: String,
    pub package_language: String,
    pub package_version: String,
    pub package_manufacturer: String,
    pub operating_system_name: String,
    pub operating_system_version: String,
    pub operating_system_manufacturer: String,
}
impl FlatDetail {
    fn new(file: &FileDetails, package: &Package) -> Self {
        let os = package.operating_system.as_ref();
        Self {
            sha256: file.sha256.clone(),
            sha1: file.sha1.clone(),
            md5: file.md5.clone(),
            file_name: file.file_name.clone(),
            file_size: file.file_size,
            package_name: package.name.trim().to_string(),
            package_app_type: package.application_type.trim().to_string(),
            package_language: package.language.trim().to_string(),
            package_version: package.version.trim().to_string(),
            package_manufacturer: package
                .manufacturer
                .as_ref()
                .map(|m| m.name.trim().to_string())
                .unwrap_or_default(),
            operating_system_name: os.map(|os| os.name.trim().to_string()).unwrap_or_default(),
            operating_system_version: os.map(|os| os.version.trim().to_string()).unwrap_or_default(),
            operating_system_manufacturer: os
                .and_then(|os| os.manufacturer.as_ref())
                .map(|m| m.name.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Every version a package name was observed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageVersions {
    pub name: String,
    pub app_type: String,
    pub versions: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounters {
    /// Distinct package names observed, including those past the bound.
    pub uniq_packages: usize,
    /// Detail rows considered, including those that were skipped.
    pub num_packages: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub details: Vec<FlatDetail>,
    /// Package accumulators in the order their names were first seen.
    pub packages: Vec<PackageVersions>,
    pub counters: SummaryCounters,
}

/// Collapse detail rows into a package-centric summary.
///
/// Rows are processed in the order given; the first row seen for a package
/// name becomes that package's detail row, so the same input order always
/// yields the same summary. Rows without a package, or whose package has no
/// name or application type, can't be attributed to anything and are only
/// counted.
pub fn summarize(rows: &[FileDetails], max_results: usize) -> Summary {
    let mut details = Vec::new();
    let mut packages: Vec<PackageVersions> = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let Some(package) = &row.package else {
            continue;
        };
        let name = package.name.trim();
        let app_type = package.application_type.trim();
        if name.is_empty() || app_type.is_empty() {
            continue;
        }
        let version = package.version.trim().to_string();
        if let Some(&index) = seen.get(name) {
            packages[index].versions.insert(version);
            continue;
        }
        seen.insert(name, packages.len());
        packages.push(PackageVersions {
            name: name.to_string(),
            app_type: app_type.to_string(),
            versions: BTreeSet::from([version]),
        });
        if details.len() < max_results {
            details.push(FlatDetail::new(row, package));
        }
    }
    Summary {
        details,
        counters: SummaryCounters {
            uniq_packages: packages.len(),
            num_packages: rows.len(),
        },
        packages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::{Manufacturer, OperatingSystem};
    use rstest::rstest;

    fn file(package: Option<Package>) -> FileDetails {
        FileDetails {
            sha256: "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855".to_string(),
            sha1: "AC91EF00F33F12DD491CC91EF00F33F12DD491CA".to_string(),
            md5: "DC2311FFDC0015FCCC12130FF145DE78".to_string(),
            file_name: "WORD.EXE".to_string(),
            file_size: 1217645,
            package,
        }
    }

    fn package(name: &str, version: &str) -> Package {
        Package {
            name: name.to_string(),
            version: version.to_string(),
            language: "English".to_string(),
            application_type: "Operating System".to_string(),
            manufacturer: Some(Manufacturer { name: "Microsoft Corporation".to_string() }),
            operating_system: Some(OperatingSystem {
                name: "Windows NT".to_string(),
                version: "4.0".to_string(),
                manufacturer: Some(Manufacturer { name: "Microsoft Corporation".to_string() }),
            }),
        }
    }

    #[test]
    fn test_distinct_names_get_separate_details() {
        let rows = vec![
            file(Some(package("Microsoft Word", "2000"))),
            file(Some(package("Word", "2000"))),
        ];
        let summary = summarize(&rows, DEFAULT_MAX_RESULTS);
        assert_eq!(summary.details.len(), 2);
        assert_eq!(summary.details[0].package_name, "Microsoft Word");
        assert_eq!(summary.details[1].package_name, "Word");
        assert_eq!(summary.counters, SummaryCounters { uniq_packages: 2, num_packages: 2 });
    }

    #[test]
    fn test_repeated_name_only_adds_versions() {
        let rows = vec![
            file(Some(package("Office", " 2000 "))),
            file(Some(package("Office", "2003"))),
            file(Some(package("Office", "2000"))),
        ];
        let summary = summarize(&rows, DEFAULT_MAX_RESULTS);
        assert_eq!(summary.details.len(), 1);
        assert_eq!(summary.details[0].package_version, "2000");
        assert_eq!(summary.packages.len(), 1);
        assert_eq!(
            summary.packages[0].versions,
            BTreeSet::from(["2000".to_string(), "2003".to_string()])
        );
        assert_eq!(summary.counters, SummaryCounters { uniq_packages: 1, num_packages: 3 });
    }

    #[test]
    fn test_bound_limits_details_not_version_tracking() {
        let rows = vec![
            file(Some(package("A", "1"))),
            file(Some(package("B", "1"))),
            file(Some(package("C", "1"))),
            file(Some(package("B", "2"))),
            file(Some(package("C", "2"))),
        ];
        let summary = summarize(&rows, 1);
        assert_eq!(summary.details.len(), 1);
        assert_eq!(summary.details[0].package_name, "A");
        let names = summary.packages.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(summary.packages[2].versions.len(), 2);
        assert_eq!(summary.counters, SummaryCounters { uniq_packages: 3, num_packages: 5 });
    }

    #[rstest]
    #[case::no_package(None)]
    #[case::empty_name(Some(package("", "1")))]
    #[case::blank_name(Some(package("   ", "1")))]
    #[case::empty_app_type(Some(Package { application_type: String::new(), ..package("A", "1") }))]
    fn test_unattributable_rows_are_only_counted(#[case] package: Option<Package>) {
        let summary = summarize(&[file(package)], DEFAULT_MAX_RESULTS);
        assert!(summary.details.is_empty());
        assert!(summary.packages.is_empty());
        assert_eq!(summary.counters, SummaryCounters { uniq_packages: 0, num_packages: 1 });
    }

    #[test]
    fn test_missing_relationships_flatten_to_empty_strings() {
        let bare = Package {
            manufacturer: None,
            operating_system: Some(OperatingSystem {
                name: " Custom OS ".to_string(),
                version: "1.0".to_string(),
                manufacturer: None,
            }),
            ..package(" PKG1 ", "2007")
        };
        let summary = summarize(&[file(Some(bare))], DEFAULT_MAX_RESULTS);
        let detail = &summary.details[0];
        assert_eq!(detail.package_name, "PKG1");
        assert_eq!(detail.package_manufacturer, "");
        assert_eq!(detail.operating_system_name, "Custom OS");
        assert_eq!(detail.operating_system_version, "1.0");
        assert_eq!(detail.operating_system_manufacturer, "");
        assert_eq!(detail.file_name, "WORD.EXE");
        assert_eq!(detail.file_size, 1217645);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(25)]
    fn test_counter_invariants(#[case] max_results: usize) {
        let rows = vec![
            file(None),
            file(Some(package("A", "1"))),
            file(Some(package("B", "1"))),
            file(Some(package("A", "2"))),
            file(Some(package("", "3"))),
        ];
        let summary = summarize(&rows, max_results);
        assert_eq!(summary.counters.num_packages, rows.len());
        assert!(summary.counters.uniq_packages <= summary.counters.num_packages);
        assert!(summary.details.len() <= max_results.min(summary.counters.uniq_packages));
        assert_eq!(summary.counters.uniq_packages, 2);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(summarize(&[], DEFAULT_MAX_RESULTS), Summary::default());
    }
}

//! Provenance records.
//!
//! Turns a flat [`RawFileRow`] into the nested [`FileDetails`] returned by
//! detail lookups. Each of the four optional slots (package, package
//! manufacturer, operating system, operating system manufacturer) is built on
//! its own from the bottom up, so the absence of one never implies the
//! absence of another.

use exn::ResultExt;
use serde::Serialize;

use crate::error::{Error, ErrorKind};
use crate::models::RawFileRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manufacturer {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatingSystem {
    pub name: String,
    pub version: String,
    pub manufacturer: Option<Manufacturer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub language: String,
    pub application_type: String,
    pub manufacturer: Option<Manufacturer>,
    pub operating_system: Option<OperatingSystem>,
}

/// Everything known about a single file record in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDetails {
    pub sha256: String,
    pub sha1: String,
    pub md5: String,
    pub file_name: String,
    pub file_size: u64,
    pub package: Option<Package>,
}

fn manufacturer(id: Option<i64>, name: Option<String>) -> Option<Manufacturer> {
    id.map(|_| Manufacturer { name: name.unwrap_or_default() })
}

fn operating_system(
    id: Option<i64>,
    name: Option<String>,
    version: Option<String>,
    manufacturer: Option<Manufacturer>,
) -> Option<OperatingSystem> {
    id.map(|_| OperatingSystem {
        name: name.unwrap_or_default(),
        version: version.unwrap_or_default(),
        manufacturer,
    })
}

impl TryFrom<RawFileRow> for FileDetails {
    type Error = Error;
    fn try_from(row: RawFileRow) -> Result<Self, Self::Error> {
        let package_manufacturer = manufacturer(row.package_manufacturer_id, row.package_manufacturer_name);
        let os_manufacturer = manufacturer(row.os_manufacturer_id, row.os_manufacturer_name);
        let operating_system = operating_system(row.os_id, row.os_name, row.os_version, os_manufacturer);
        let package = row.package_id.map(|_| Package {
            name: row.package_name.unwrap_or_default(),
            version: row.package_version.unwrap_or_default(),
            language: row.package_language.unwrap_or_default(),
            application_type: row.package_application_type.unwrap_or_default(),
            manufacturer: package_manufacturer,
            operating_system,
        });
        Ok(Self {
            sha256: row.sha256,
            sha1: row.sha1,
            md5: row.md5,
            file_name: row.file_name,
            file_size: u64::try_from(row.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            package,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row() -> RawFileRow {
        RawFileRow {
            sha256: "50B2C6C05BBDEF754ABA71FFB1A88A03A48D63CA7426049435A568093825E541".to_string(),
            sha1: "6A3AD39E5EAC4B7A4D2DC7DCBB6E40A204932131".to_string(),
            md5: "1B6A3B720DEC5E60FDA2ECB0EE713661".to_string(),
            file_name: "FILEa.EXE".to_string(),
            file_size: 123456,
            package_id: Some(3),
            package_name: Some("PKG1".to_string()),
            package_version: Some("2007".to_string()),
            package_language: Some("English".to_string()),
            package_application_type: Some("Operating System".to_string()),
            package_manufacturer_id: Some(2),
            package_manufacturer_name: Some("Rand Corporation".to_string()),
            os_id: Some(2),
            os_name: Some("Custom OS".to_string()),
            os_version: Some("1.0".to_string()),
            os_manufacturer_id: Some(1),
            os_manufacturer_name: Some("Microsoft Corporation".to_string()),
        }
    }

    #[test]
    fn test_fully_populated_row() {
        let details = FileDetails::try_from(row()).unwrap();
        assert_eq!(details.file_size, 123456);
        let package = details.package.unwrap();
        assert_eq!(package.name, "PKG1");
        assert_eq!(package.manufacturer, Some(Manufacturer { name: "Rand Corporation".to_string() }));
        let os = package.operating_system.unwrap();
        assert_eq!(os.name, "Custom OS");
        assert_eq!(os.version, "1.0");
        // The operating system carries its own manufacturer, not the package's.
        assert_eq!(os.manufacturer, Some(Manufacturer { name: "Microsoft Corporation".to_string() }));
    }

    #[test]
    fn test_missing_package_hides_everything_below_it() {
        let row = RawFileRow {
            package_id: None,
            package_name: None,
            package_version: None,
            package_language: None,
            package_application_type: None,
            package_manufacturer_id: None,
            package_manufacturer_name: None,
            os_id: None,
            os_name: None,
            os_version: None,
            os_manufacturer_id: None,
            os_manufacturer_name: None,
            ..row()
        };
        let details = FileDetails::try_from(row).unwrap();
        assert_eq!(details.package, None);
        assert_eq!(details.file_name, "FILEa.EXE");
    }

    #[rstest]
    #[case(true, true, true)]
    #[case(true, true, false)]
    #[case(true, false, true)]
    #[case(false, true, true)]
    #[case(true, false, false)]
    #[case(false, true, false)]
    #[case(false, false, true)]
    #[case(false, false, false)]
    fn test_optional_slots_are_independent(
        #[case] package_manufacturer: bool,
        #[case] os: bool,
        #[case] os_manufacturer: bool,
    ) {
        let mut row = row();
        if !package_manufacturer {
            row.package_manufacturer_id = None;
            row.package_manufacturer_name = None;
        }
        if !os {
            row.os_id = None;
            row.os_name = None;
            row.os_version = None;
            // Without an OS row, the OS manufacturer join has nothing to join on.
            row.os_manufacturer_id = None;
            row.os_manufacturer_name = None;
        }
        if !os_manufacturer {
            row.os_manufacturer_id = None;
            row.os_manufacturer_name = None;
        }
        let package = FileDetails::try_from(row).unwrap().package.unwrap();
        assert_eq!(package.manufacturer.is_some(), package_manufacturer);
        assert_eq!(package.operating_system.is_some(), os);
        assert_eq!(
            package.operating_system.and_then(|os| os.manufacturer).is_some(),
            os && os_manufacturer
        );
    }

    #[test]
    fn test_negative_file_size_is_invalid() {
        let row = RawFileRow { file_size: -1, ..row() };
        let err = FileDetails::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("file size"));
    }

    #[test]
    fn test_absent_relationships_serialize_as_null() {
        let row = RawFileRow {
            package_manufacturer_id: None,
            package_manufacturer_name: None,
            os_manufacturer_id: None,
            os_manufacturer_name: None,
            ..row()
        };
        let json = serde_json::to_value(FileDetails::try_from(row).unwrap()).unwrap();
        assert_eq!(json["package"]["manufacturer"], serde_json::Value::Null);
        assert_eq!(json["package"]["operating_system"]["name"], "Custom OS");
        assert_eq!(json["package"]["operating_system"]["manufacturer"], serde_json::Value::Null);
    }
}

//! Unit source discovery and name parsing

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::EngineError;

/// Source file suffix for change units
pub const UNIT_FILE_SUFFIX: &str = ".rs";

// Identifier pattern: `<date_prefix>_<snake_case_descriptor>`, where the date
// prefix (`YYYY_MM_DD_HHMMSS`) is lexicographically sortable so that file
// order equals application order.
static UNIT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}_\d{2}_\d{2}_\d{6})_([a-z][a-z0-9_]*)$")
        .unwrap_or_else(|e| unreachable!("unit name pattern is valid: {e}"))
});

/// A discovered change-unit source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSource {
    /// Canonical identifier (file basename with the suffix stripped)
    pub identifier: String,
    /// Path to the source file
    pub path: PathBuf,
}

/// Parse a unit file name into its canonical identifier
///
/// # Errors
///
/// Returns `EngineError::InvalidUnitName` if the name does not follow the
/// `<date_prefix>_<descriptor>.rs` convention.
pub fn parse_identifier(filename: &str) -> Result<String, EngineError> {
    let stem = filename
        .strip_suffix(UNIT_FILE_SUFFIX)
        .ok_or_else(|| {
            EngineError::InvalidUnitName(format!(
                "'{filename}' does not end in '{UNIT_FILE_SUFFIX}'"
            ))
        })?;

    if UNIT_NAME.is_match(stem) {
        Ok(stem.to_string())
    } else {
        Err(EngineError::InvalidUnitName(format!(
            "'{filename}' does not match <YYYY_MM_DD_HHMMSS>_<descriptor>{UNIT_FILE_SUFFIX}"
        )))
    }
}

/// The descriptor part of a canonical identifier, if well-formed
pub fn unit_descriptor(identifier: &str) -> Option<&str> {
    UNIT_NAME
        .captures(identifier)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
}

/// Discover change-unit sources across one or more locations
///
/// A location ending in the unit file suffix is a direct reference to one
/// unit; a directory expands non-recursively to all files matching the naming
/// convention (callers pass subdirectories explicitly when they want them).
/// Non-matching files inside a scanned directory are skipped; a direct file
/// reference with a bad name is an error.
///
/// Duplicate identifiers across locations collapse to one entry, last-seen
/// path winning. The result is ordered lexicographically ascending by
/// identifier; this total order is the only applied-before relationship the
/// engine guarantees.
///
/// # Errors
///
/// Returns `EngineError::SourceUnreadable` if a location does not exist or
/// cannot be read, or `EngineError::InvalidUnitName` for a malformed direct
/// file reference.
pub fn discover_units<P: AsRef<Path>>(locations: &[P]) -> Result<Vec<UnitSource>, EngineError> {
    let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

    for location in locations {
        let location = location.as_ref();

        if location
            .to_string_lossy()
            .ends_with(UNIT_FILE_SUFFIX)
        {
            collect_file(location, &mut sources)?;
        } else {
            collect_directory(location, &mut sources)?;
        }
    }

    // BTreeMap iteration gives the ascending identifier order
    Ok(sources
        .into_iter()
        .map(|(identifier, path)| UnitSource { identifier, path })
        .collect())
}

fn collect_file(path: &Path, sources: &mut BTreeMap<String, PathBuf>) -> Result<(), EngineError> {
    if !path.is_file() {
        return Err(EngineError::SourceUnreadable(format!(
            "unit file not found: {}",
            path.display()
        )));
    }

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            EngineError::SourceUnreadable(format!("invalid file name: {}", path.display()))
        })?;

    let identifier = parse_identifier(filename)?;
    sources.insert(identifier, path.to_path_buf());
    Ok(())
}

fn collect_directory(
    dir: &Path,
    sources: &mut BTreeMap<String, PathBuf>,
) -> Result<(), EngineError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        EngineError::SourceUnreadable(format!("failed to read {}: {e}", dir.display()))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            EngineError::SourceUnreadable(format!("failed to read entry in {}: {e}", dir.display()))
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        match parse_identifier(filename) {
            Ok(identifier) => {
                sources.insert(identifier, path);
            }
            Err(_) => {
                log::debug!("skipping non-unit file {}", path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    #[test]
    fn test_parse_identifier_valid() {
        let identifier = parse_identifier("2024_01_01_000000_create_x.rs").unwrap();
        assert_eq!(identifier, "2024_01_01_000000_create_x");
    }

    #[test]
    fn test_parse_identifier_rejects_missing_prefix() {
        assert!(parse_identifier("create_x.rs").is_err());
        assert!(parse_identifier("2024_create_x.rs").is_err());
    }

    #[test]
    fn test_parse_identifier_rejects_wrong_suffix() {
        assert!(parse_identifier("2024_01_01_000000_create_x.sql").is_err());
    }

    #[test]
    fn test_unit_descriptor() {
        assert_eq!(
            unit_descriptor("2024_01_01_000000_create_x"),
            Some("create_x")
        );
        assert_eq!(unit_descriptor("create_x"), None);
    }

    #[test]
    fn test_directory_scan_sorts_and_skips() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "2024_01_02_000000_create_y.rs");
        touch(tmp.path(), "2024_01_01_000000_create_x.rs");
        touch(tmp.path(), "README.md");
        touch(tmp.path(), "helpers.rs");

        let sources = discover_units(&[tmp.path()]).unwrap();
        let identifiers: Vec<&str> = sources.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(
            identifiers,
            vec!["2024_01_01_000000_create_x", "2024_01_02_000000_create_y"]
        );
    }

    #[test]
    fn test_direct_file_reference() {
        let tmp = TempDir::new().unwrap();
        let path = touch(tmp.path(), "2024_01_01_000000_create_x.rs");

        let sources = discover_units(&[&path]).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].identifier, "2024_01_01_000000_create_x");
        assert_eq!(sources[0].path, path);
    }

    #[test]
    fn test_direct_file_with_bad_name_errors() {
        let tmp = TempDir::new().unwrap();
        let path = touch(tmp.path(), "helpers.rs");

        match discover_units(&[&path]) {
            Err(EngineError::InvalidUnitName(_)) => {}
            other => panic!("Expected InvalidUnitName, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_location_errors() {
        match discover_units(&[Path::new("/no/such/dir")]) {
            Err(EngineError::SourceUnreadable(_)) => {}
            other => panic!("Expected SourceUnreadable, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_collapse_last_seen_wins() {
        let tmp_a = TempDir::new().unwrap();
        let tmp_b = TempDir::new().unwrap();
        touch(tmp_a.path(), "2024_01_01_000000_create_x.rs");
        let later = touch(tmp_b.path(), "2024_01_01_000000_create_x.rs");

        let sources = discover_units(&[tmp_a.path(), tmp_b.path()]).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].path, later);
    }

    #[test]
    fn test_order_independent_of_location_order() {
        let tmp_a = TempDir::new().unwrap();
        let tmp_b = TempDir::new().unwrap();
        touch(tmp_a.path(), "2024_01_02_000000_create_y.rs");
        touch(tmp_b.path(), "2024_01_01_000000_create_x.rs");

        let forward = discover_units(&[tmp_a.path(), tmp_b.path()]).unwrap();
        let reverse = discover_units(&[tmp_b.path(), tmp_a.path()]).unwrap();
        let ids = |v: &[UnitSource]| {
            v.iter().map(|s| s.identifier.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&forward), ids(&reverse));
        assert_eq!(
            ids(&forward),
            vec!["2024_01_01_000000_create_x", "2024_01_02_000000_create_y"]
        );
    }
}

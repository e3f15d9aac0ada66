//! Scaffolding: write a new change-unit source stub

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::discovery::{discover_units, unit_descriptor, UNIT_FILE_SUFFIX};
use crate::error::EngineError;

static DESCRIPTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*$")
        .unwrap_or_else(|e| unreachable!("descriptor pattern is valid: {e}"))
});

/// Create a new change-unit stub in `dir`
///
/// The file is named `<now>_<name>.rs` with a `YYYY_MM_DD_HHMMSS` prefix so
/// it sorts after every existing unit. The directory is created when missing.
/// A descriptor already used by a unit in `dir` is rejected, so two stubs
/// cannot silently describe the same change.
///
/// Returns the path of the written file.
///
/// # Errors
///
/// Returns `EngineError::InvalidUnitName` for a malformed or duplicate name,
/// or `EngineError::SourceUnreadable` if the directory or file cannot be
/// written.
pub fn scaffold_unit(name: &str, dir: &Path) -> Result<PathBuf, EngineError> {
    if !DESCRIPTOR.is_match(name) {
        return Err(EngineError::InvalidUnitName(format!(
            "'{name}' is not a snake_case descriptor"
        )));
    }

    fs::create_dir_all(dir).map_err(|e| {
        EngineError::SourceUnreadable(format!("failed to create {}: {e}", dir.display()))
    })?;

    let existing = discover_units(&[dir])?;
    if let Some(source) = existing
        .iter()
        .find(|s| unit_descriptor(&s.identifier) == Some(name))
    {
        return Err(EngineError::InvalidUnitName(format!(
            "a unit named '{name}' already exists: {}",
            source.path.display()
        )));
    }

    let prefix = Utc::now().format("%Y_%m_%d_%H%M%S").to_string();
    let identifier = format!("{prefix}_{name}");
    let path = dir.join(format!("{identifier}{UNIT_FILE_SUFFIX}"));

    fs::write(&path, stub(&identifier, name)).map_err(|e| {
        EngineError::SourceUnreadable(format!("failed to write {}: {e}", path.display()))
    })?;

    log::info!("scaffolded change unit {}", path.display());
    Ok(path)
}

fn stub(identifier: &str, name: &str) -> String {
    let type_name = studly_case(name);
    format!(
        r#"use seawall::{{ChangeUnit, SchemaManager, StoreError}};

#[derive(Default)]
pub struct {type_name};

impl ChangeUnit for {type_name} {{
    fn identifier(&self) -> &str {{
        "{identifier}"
    }}

    fn apply(&self, schema: &SchemaManager<'_>) -> Result<(), StoreError> {{
        // TODO: implement this change
        // Example:
        // let table = Table::create()
        //     .table("example")
        //     .col(ColumnDef::new("id").integer().not_null().primary_key())
        //     .to_owned();
        // schema.create_table(table)?;
        let _ = schema;
        Ok(())
    }}
}}
"#
    )
}

fn studly_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

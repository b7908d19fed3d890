//! Versioned JSON data assets: test definitions and normative tables.
//!
//! Weighted-formula tables and conversion arrays run to hundreds of
//! entries per instrument, so they ship as data rather than code. Every
//! asset carries an `asset_version`; older shapes are migrated before
//! deserializing.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::definition::TestDefinition;
use crate::error::AssetError;
use crate::norms::NormativeTable;

/// Current asset version. Bump this when changing the shape of an asset.
/// Each bump requires a corresponding entry in [`migrate`].
pub const CURRENT_ASSET_VERSION: u32 = 1;

pub fn load_definition(contents: &str) -> Result<TestDefinition, AssetError> {
    let definition: TestDefinition = load(contents)?;
    definition.validate()?;
    Ok(definition)
}

pub fn load_normative_table(contents: &str) -> Result<NormativeTable, AssetError> {
    let table: NormativeTable = load(contents)?;
    table.validate()?;
    Ok(table)
}

pub fn load_definition_file(path: &Path) -> Result<TestDefinition, AssetError> {
    load_definition(&read(path)?)
}

pub fn load_normative_table_file(path: &Path) -> Result<NormativeTable, AssetError> {
    load_normative_table(&read(path)?)
}

/// Serialize an asset stamped with the current version.
pub fn to_asset_json<T: serde::Serialize>(asset: &T) -> Result<String, AssetError> {
    let mut json = serde_json::to_value(asset)?;
    let obj = json
        .as_object_mut()
        .ok_or_else(|| AssetError::Malformed("asset is not a JSON object".to_string()))?;
    obj.insert(
        "asset_version".to_string(),
        serde_json::Value::Number(CURRENT_ASSET_VERSION.into()),
    );
    Ok(serde_json::to_string_pretty(&json)?)
}

fn read(path: &Path) -> Result<String, AssetError> {
    let contents = std::fs::read_to_string(path)?;
    info!(path = %path.display(), "asset loaded");
    Ok(contents)
}

fn load<T: DeserializeOwned>(contents: &str) -> Result<T, AssetError> {
    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let on_disk_version = match json.get("asset_version") {
        None => 0,
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| AssetError::Malformed(format!("invalid asset_version {v}")))?,
    };

    let mut migrated = migrate(json, on_disk_version)?;
    if let Some(obj) = migrated.as_object_mut() {
        obj.remove("asset_version");
    }
    Ok(serde_json::from_value(migrated)?)
}

/// Run sequential migrations from `from_version` up to
/// [`CURRENT_ASSET_VERSION`]. Each migration is a pure transform on the raw
/// JSON value.
fn migrate(
    mut json: serde_json::Value,
    from_version: u32,
) -> Result<serde_json::Value, AssetError> {
    if from_version > CURRENT_ASSET_VERSION {
        return Err(AssetError::UnsupportedVersion {
            found: from_version,
            supported: CURRENT_ASSET_VERSION,
        });
    }

    let obj = json
        .as_object_mut()
        .ok_or_else(|| AssetError::Malformed("asset is not a JSON object".to_string()))?;

    // v0 -> v1: `ranges` renamed to `classification_ranges`
    if from_version < 1 {
        if let Some(ranges) = obj.remove("ranges") {
            obj.entry("classification_ranges").or_insert(ranges);
        }
        obj.insert(
            "asset_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        info!("migrated asset v0 -> v1 (renamed ranges)");
    }

    Ok(json)
}

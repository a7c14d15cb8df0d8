//! JSON wire format for datasource structures
//!
//! Keys on the wire are flat objects tagged with a `type` discriminator.
//! Decoding hands every raw key to a `KeyResolver`, so callers without a
//! per-variant strategy still get a usable structure with placeholder keys.

use crate::error::StructureError;
use crate::structure::key::{DiscriminatorResolver, Key, KeyResolver};
use crate::structure::model::DatasourceStructure;
use serde_json::Value;

pub fn to_json(structure: &DatasourceStructure) -> Result<String, StructureError> {
    Ok(serde_json::to_string(structure)?)
}

pub fn to_json_pretty(structure: &DatasourceStructure) -> Result<String, StructureError> {
    Ok(serde_json::to_string_pretty(structure)?)
}

/// Decode, resolving keys by their discriminator
pub fn from_json(json: &str) -> Result<DatasourceStructure, StructureError> {
    from_json_with(json, &DiscriminatorResolver)
}

/// Decode with an explicit key resolution strategy
pub fn from_json_with(
    json: &str,
    resolver: &dyn KeyResolver,
) -> Result<DatasourceStructure, StructureError> {
    let mut root: Value = serde_json::from_str(json)?;

    // Pull raw keys out so the structure itself decodes without them
    let mut raw_keys: Vec<Vec<Value>> = Vec::new();
    if let Some(tables) = root.get_mut("tables").and_then(Value::as_array_mut) {
        for table in tables.iter_mut() {
            let keys = match table.get_mut("keys").map(Value::take) {
                Some(Value::Array(keys)) => keys,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(StructureError::KeyResolution(format!(
                        "table keys must be a list, got {}",
                        other
                    )))
                }
            };
            if let Some(slot) = table.get_mut("keys") {
                *slot = Value::Array(Vec::new());
            }
            raw_keys.push(keys);
        }
    }

    let mut structure: DatasourceStructure = serde_json::from_value(root)?;

    let mut placeholders = 0usize;
    for (table, keys) in structure.tables.iter_mut().zip(raw_keys) {
        table.keys = keys
            .into_iter()
            .map(|raw| resolver.resolve(raw))
            .collect::<Result<Vec<Key>, _>>()?;
        placeholders += table.keys.iter().filter(|k| k.is_placeholder()).count();
    }

    if placeholders > 0 {
        log::warn!("{} keys decoded as placeholders", placeholders);
    }
    log::debug!("decoded datasource structure with {} tables", structure.tables.len());

    Ok(structure)
}

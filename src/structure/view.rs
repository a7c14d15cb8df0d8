//! Field visibility policy applied when a structure leaves the crate
//!
//! Every field is tagged with the view it belongs to and `project` keeps
//! only the fields the requested view may see. Fields missing from the
//! allow-list are never emitted.

use crate::error::StructureError;
use crate::structure::model::DatasourceStructure;
use serde_json::Value;

/// Audience a serialized structure is produced for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Public,
    Internal,
}

impl View {
    /// Internal callers see everything public callers see
    fn can_see(self, field_view: View) -> bool {
        match self {
            View::Internal => true,
            View::Public => field_view == View::Public,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Entity {
    Structure,
    Table,
    Column,
    Key,
    Template,
    Error,
}

const STRUCTURE_FIELDS: &[(&str, View)] = &[("tables", View::Public), ("error", View::Public)];

const TABLE_FIELDS: &[(&str, View)] = &[
    ("type", View::Public),
    ("schema", View::Public),
    ("name", View::Public),
    ("columns", View::Public),
    ("keys", View::Public),
    ("templates", View::Public),
];

const COLUMN_FIELDS: &[(&str, View)] = &[
    ("name", View::Public),
    ("type", View::Public),
    ("defaultValue", View::Public),
    ("isAutogenerated", View::Public),
];

const KEY_FIELDS: &[(&str, View)] = &[
    ("type", View::Public),
    ("name", View::Public),
    ("columnNames", View::Public),
    ("fromColumns", View::Public),
    ("toColumns", View::Public),
];

const TEMPLATE_FIELDS: &[(&str, View)] = &[
    ("title", View::Public),
    ("body", View::Public),
    ("configuration", View::Public),
];

const ERROR_FIELDS: &[(&str, View)] = &[("code", View::Public), ("message", View::Public)];

fn fields(entity: Entity) -> &'static [(&'static str, View)] {
    match entity {
        Entity::Structure => STRUCTURE_FIELDS,
        Entity::Table => TABLE_FIELDS,
        Entity::Column => COLUMN_FIELDS,
        Entity::Key => KEY_FIELDS,
        Entity::Template => TEMPLATE_FIELDS,
        Entity::Error => ERROR_FIELDS,
    }
}

fn is_visible(entity: Entity, field: &str, view: View) -> bool {
    fields(entity)
        .iter()
        .any(|(name, field_view)| *name == field && view.can_see(*field_view))
}

fn retain(value: &mut Value, entity: Entity, view: View) {
    if let Value::Object(map) = value {
        map.retain(|field, _| is_visible(entity, field, view));
    }
}

fn retain_each(value: Option<&mut Value>, entity: Entity, view: View) {
    if let Some(Value::Array(items)) = value {
        for item in items.iter_mut() {
            retain(item, entity, view);
        }
    }
}

/// Serialize a structure keeping only the fields `view` may see
pub fn project(structure: &DatasourceStructure, view: View) -> Result<Value, StructureError> {
    let mut root = serde_json::to_value(structure)?;
    retain(&mut root, Entity::Structure, view);

    if let Some(error) = root.get_mut("error") {
        retain(error, Entity::Error, view);
    }

    if let Some(Value::Array(tables)) = root.get_mut("tables") {
        for table in tables.iter_mut() {
            retain(table, Entity::Table, view);
            retain_each(table.get_mut("columns"), Entity::Column, view);
            retain_each(table.get_mut("keys"), Entity::Key, view);
            retain_each(table.get_mut("templates"), Entity::Template, view);
        }
    }

    Ok(root)
}

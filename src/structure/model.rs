//! Structure model types: the description of a datasource schema

use crate::error::{ErrorDto, StructureError};
use crate::structure::field::Field;
use crate::structure::key::Key;
use crate::structure::ordering::{sort_columns, sort_keys};
use crate::structure::template::Template;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Kind of schema object a table entry describes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableType {
    Table,
    View,
    Alias,
    Collection,
    Bucket,
}

impl std::fmt::Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableType::Table => write!(f, "TABLE"),
            TableType::View => write!(f, "VIEW"),
            TableType::Alias => write!(f, "ALIAS"),
            TableType::Collection => write!(f, "COLLECTION"),
            TableType::Bucket => write!(f, "BUCKET"),
        }
    }
}

/// Column definition
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub name: Field<String>,
    /// Store-specific type name
    #[serde(rename = "type", default, skip_serializing_if = "Field::is_absent")]
    pub column_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub default_value: Field<String>,
    /// True for identity, auto-increment and sequence-backed columns
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub is_autogenerated: Field<bool>,
}

impl Column {
    pub fn new(name: &str, column_type: &str, default_value: Option<&str>, is_autogenerated: bool) -> Self {
        Self {
            name: Field::Value(name.to_string()),
            column_type: Field::Value(column_type.to_string()),
            default_value: Field::from_option(default_value.map(str::to_string)),
            is_autogenerated: Field::Value(is_autogenerated),
        }
    }

    /// Compare by name, case-sensitive.
    ///
    /// A missing partner, or a partner without a name, always compares
    /// `Greater`. A subject without a name cannot be compared.
    pub fn compare(&self, other: Option<&Column>) -> Result<Ordering, StructureError> {
        let Some(other_name) = other.and_then(|c| c.name.as_deref()) else {
            return Ok(Ordering::Greater);
        };

        match self.name.as_deref() {
            Some(name) => Ok(name.cmp(other_name)),
            None => Err(StructureError::InvalidState(format!(
                "cannot compare unnamed column against column '{}'",
                other_name
            ))),
        }
    }
}

/// Table, view or other schema object
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Table {
    #[serde(rename = "type")]
    pub table_type: TableType,
    /// Namespace; empty or null for schema-less stores
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub schema: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub name: Field<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl Table {
    pub fn new(table_type: TableType, schema: &str, name: &str) -> Self {
        Self {
            table_type,
            schema: Field::Value(schema.to_string()),
            name: Field::Value(name.to_string()),
            columns: Vec::new(),
            keys: Vec::new(),
            templates: Vec::new(),
        }
    }

    /// Schema-qualified name, or the bare name for schema-less stores
    pub fn qualified_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or_default();
        match self.schema.as_deref() {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, name),
            _ => name.to_string(),
        }
    }

    /// Sort columns and keys for display
    pub fn sort(&mut self) -> Result<(), StructureError> {
        sort_columns(&mut self.columns)?;
        sort_keys(&mut self.keys);
        Ok(())
    }
}

/// Description of an external datasource's schema.
///
/// `error` is set when introspection failed. `tables` may still hold a
/// partial result in that case, so check `has_error` before trusting it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DatasourceStructure {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub error: Field<ErrorDto>,
}

impl DatasourceStructure {
    /// Wrap tables as given; no validation or deduplication
    pub fn new(tables: Vec<Table>) -> Self {
        Self {
            tables,
            error: Field::Absent,
        }
    }

    /// Record a fault, replacing any previous error. Tables are kept.
    pub fn set_error_info(&mut self, fault: &anyhow::Error) {
        let error = ErrorDto::from_fault(fault);
        log::warn!(
            "datasource structure marked failed ({} tables kept): {}",
            self.tables.len(),
            fault
        );
        self.error = Field::Value(error);
    }

    pub fn has_error(&self) -> bool {
        self.error.value().is_some()
    }

    /// Find by schema and name; a null schema matches `""`
    pub fn find_table(&self, schema: &str, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| {
            t.schema.as_deref().unwrap_or_default() == schema && t.name.as_deref() == Some(name)
        })
    }

    /// Sort every table's columns and keys. Table order is left as is.
    pub fn sort(&mut self) -> Result<(), StructureError> {
        for table in &mut self.tables {
            table.sort()?;
        }
        Ok(())
    }
}

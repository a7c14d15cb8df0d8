//! SQLite introspector implementation using rusqlite
//!
//! Uses `spawn_blocking` to bridge rusqlite's synchronous open into the async
//! world expected by StructureIntrospector.

use crate::error::PluginError;
use crate::introspect::driver::{DatasourceBackend, StructureIntrospector};
use crate::structure::{Column, DatasourceStructure, Key, Table, TableType, Template};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = "main";

/// SQLite introspector
pub struct SqliteIntrospector {
    conn: Arc<Mutex<Connection>>,
    pub path: PathBuf,
}

impl SqliteIntrospector {
    /// Open an existing SQLite database file read-only
    pub async fn new(path: PathBuf) -> Result<Self> {
        if path.is_dir() {
            return Err(PluginError::DatasourceArgument(format!(
                "{} is a directory, not a SQLite file",
                path.display()
            ))
            .into());
        }

        let p = path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            Connection::open_with_flags(&p, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| {
                PluginError::Connection(format!("{}: {}", p.display(), e))
            })
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }
}

#[async_trait]
impl StructureIntrospector for SqliteIntrospector {
    fn backend(&self) -> DatasourceBackend {
        DatasourceBackend::Sqlite
    }

    async fn test_connection(&self) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(conn.execute_batch("SELECT 1").is_ok())
    }

    async fn describe_structure(&self) -> Result<DatasourceStructure> {
        let conn = self.conn.lock().await;
        log::debug!("describing SQLite structure of {}", self.path.display());
        describe(&conn)
    }
}

/// List tables and views, then describe each one. A failure on a single
/// object is recorded on the structure and the remaining objects are still
/// described.
fn describe(conn: &Connection) -> Result<DatasourceStructure> {
    let objects = list_objects(conn)
        .map_err(|e| PluginError::GetStructure(format!("cannot list tables: {}", e)))?;

    let mut structure = DatasourceStructure::new(Vec::with_capacity(objects.len()));
    for (name, table_type) in objects {
        match describe_table(conn, &name, table_type) {
            Ok(table) => structure.tables.push(table),
            Err(e) => {
                let fault = PluginError::GetStructure(format!("{}: {:#}", name, e));
                structure.set_error_info(&fault.into());
            }
        }
    }
    Ok(structure)
}

fn list_objects(conn: &Connection) -> Result<Vec<(String, TableType)>> {
    let mut stmt = conn.prepare(
        "SELECT name, type FROM sqlite_master \
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
         ORDER BY type, name",
    )?;
    let mut objects = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let obj_type: String = row.get(1)?;
        let table_type = if obj_type == "view" {
            TableType::View
        } else {
            TableType::Table
        };
        objects.push((name, table_type));
    }
    Ok(objects)
}

fn describe_table(conn: &Connection, name: &str, table_type: TableType) -> Result<Table> {
    let mut table = Table::new(table_type, SCHEMA, name);
    let info = table_info(conn, name).with_context(|| format!("reading columns of {}", name))?;

    let pk_columns = primary_key_columns(&info);
    // a lone INTEGER PRIMARY KEY aliases the rowid
    let rowid_alias = match pk_columns.as_slice() {
        [only] => info
            .iter()
            .find(|c| &c.name == only)
            .is_some_and(|c| c.data_type.eq_ignore_ascii_case("INTEGER")),
        _ => false,
    };

    table.columns = info
        .iter()
        .map(|c| {
            let autogenerated = rowid_alias && c.pk > 0;
            Column::new(&c.name, &c.data_type, c.default_value.as_deref(), autogenerated)
        })
        .collect();

    if table_type == TableType::Table {
        if !pk_columns.is_empty() {
            let columns: Vec<&str> = pk_columns.iter().map(String::as_str).collect();
            table.keys.push(Key::primary(None, &columns));
        }
        table.keys.extend(
            foreign_keys(conn, name).with_context(|| format!("reading foreign keys of {}", name))?,
        );
    }

    table.templates = templates(name, table_type, &info);
    Ok(table)
}

struct ColumnInfo {
    name: String,
    data_type: String,
    default_value: Option<String>,
    pk: i32,
}

fn table_info(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let query = format!("PRAGMA table_info({})", quote_identifier(table));
    let mut stmt = conn.prepare(&query)?;
    let mut columns = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        columns.push(ColumnInfo {
            name: row.get(1)?,
            data_type: row.get(2)?,
            default_value: row.get(4)?,
            pk: row.get(5)?,
        });
    }
    Ok(columns)
}

/// Primary key columns in key order
fn primary_key_columns(info: &[ColumnInfo]) -> Vec<String> {
    let mut pk: Vec<&ColumnInfo> = info.iter().filter(|c| c.pk > 0).collect();
    pk.sort_by_key(|c| c.pk);
    pk.into_iter().map(|c| c.name.clone()).collect()
}

fn foreign_keys(conn: &Connection, table: &str) -> Result<Vec<Key>> {
    let query = format!("PRAGMA foreign_key_list({})", quote_identifier(table));
    let mut stmt = conn.prepare(&query)?;

    // constraint id -> (parent table, from columns, to columns)
    let mut grouped: BTreeMap<i64, (String, Vec<String>, Vec<Option<String>>)> = BTreeMap::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        let parent: String = row.get(2)?;
        let from: String = row.get(3)?;
        let to: Option<String> = row.get(4)?;

        let entry = grouped
            .entry(id)
            .or_insert_with(|| (parent, Vec::new(), Vec::new()));
        entry.1.push(from);
        entry.2.push(to);
    }

    let mut keys = Vec::with_capacity(grouped.len());
    for (parent, from_columns, to_columns) in grouped.into_values() {
        // a missing target means the parent's primary key
        let implicit = if to_columns.iter().any(Option::is_none) {
            primary_key_columns(&table_info(conn, &parent)?)
        } else {
            Vec::new()
        };

        let to_columns: Vec<String> = to_columns
            .into_iter()
            .enumerate()
            .map(|(i, to)| {
                let column = to.or_else(|| implicit.get(i).cloned()).unwrap_or_default();
                format!("{}.{}", parent, column)
            })
            .collect();

        let from: Vec<&str> = from_columns.iter().map(String::as_str).collect();
        let to: Vec<&str> = to_columns.iter().map(String::as_str).collect();
        keys.push(Key::foreign(None, &from, &to));
    }
    Ok(keys)
}

fn templates(name: &str, table_type: TableType, info: &[ColumnInfo]) -> Vec<Template> {
    let table = quote_identifier(name);
    let mut templates = vec![Template::new(
        "SELECT",
        &format!("SELECT * FROM {} LIMIT 10;", table),
    )];

    if table_type != TableType::Table || info.is_empty() {
        return templates;
    }

    let columns: Vec<String> = info.iter().map(|c| quote_identifier(&c.name)).collect();
    let values: Vec<&str> = info.iter().map(|c| sample_value(&c.data_type)).collect();
    let assignments: Vec<String> = columns
        .iter()
        .zip(&values)
        .map(|(c, v)| format!("{} = {}", c, v))
        .collect();

    templates.push(Template::new(
        "INSERT",
        &format!(
            "INSERT INTO {} ({})\n  VALUES ({});",
            table,
            columns.join(", "),
            values.join(", ")
        ),
    ));
    templates.push(Template::new(
        "UPDATE",
        &format!(
            "UPDATE {} SET\n    {}\n  WHERE 1 = 0; -- Specify a valid condition here. Removing the condition may update every row in the table!",
            table,
            assignments.join(",\n    ")
        ),
    ));
    templates.push(Template::new(
        "DELETE",
        &format!(
            "DELETE FROM {}\n  WHERE 1 = 0; -- Specify a valid condition here. Removing the condition may delete everything in the table!",
            table
        ),
    ));
    templates
}

/// Placeholder literal for a declared column type, following SQLite type affinity
fn sample_value(data_type: &str) -> &'static str {
    let upper = data_type.to_ascii_uppercase();
    if upper.contains("INT") {
        "1"
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        "''"
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "1.0"
    } else if upper.contains("BLOB") || upper.is_empty() {
        "NULL"
    } else {
        "1"
    }
}

/// Quote an identifier unless it is a plain word
fn quote_identifier(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::describe_or_capture;
    use crate::structure::{codec, Field};
    use tempfile::TempDir;

    fn fixture(sql: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(sql).unwrap();
        (dir, path)
    }

    const SHOP: &str = "
        CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL DEFAULT '');
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            user_id INTEGER REFERENCES users,
            total REAL,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );
        CREATE TABLE order_items (
            order_id INTEGER,
            line INTEGER,
            sku TEXT,
            PRIMARY KEY (order_id, line)
        );
        CREATE VIEW big_orders AS SELECT * FROM orders WHERE total > 100;
    ";

    #[tokio::test]
    async fn test_describe_tables_and_views() {
        let (_dir, path) = fixture(SHOP);
        let introspector = SqliteIntrospector::new(path).await.unwrap();
        assert!(introspector.test_connection().await.unwrap());

        let structure = introspector.describe_structure().await.unwrap();
        assert!(!structure.has_error());

        let names: Vec<(&str, TableType)> = structure
            .tables
            .iter()
            .map(|t| (t.name.as_deref().unwrap_or_default(), t.table_type))
            .collect();
        assert_eq!(
            names,
            vec![
                ("order_items", TableType::Table),
                ("orders", TableType::Table),
                ("users", TableType::Table),
                ("big_orders", TableType::View),
            ]
        );

        let users = structure.find_table("main", "users").unwrap();
        assert_eq!(users.columns[0], Column::new("id", "INTEGER", None, true));
        assert_eq!(users.columns[1], Column::new("email", "TEXT", Some("''"), false));
        assert_eq!(users.keys, vec![Key::primary(None, &["id"])]);
        assert_eq!(users.templates.len(), 4);
        assert_eq!(
            users.templates[0].body.as_deref(),
            Some("SELECT * FROM users LIMIT 10;")
        );

        let view = structure.find_table("main", "big_orders").unwrap();
        assert!(view.keys.is_empty());
        assert_eq!(view.templates.len(), 1);
    }

    #[tokio::test]
    async fn test_composite_primary_key_not_autogenerated() {
        let (_dir, path) = fixture(SHOP);
        let introspector = SqliteIntrospector::new(path).await.unwrap();
        let structure = introspector.describe_structure().await.unwrap();

        let items = structure.find_table("main", "order_items").unwrap();
        assert_eq!(items.keys, vec![Key::primary(None, &["order_id", "line"])]);
        assert!(items.columns.iter().all(|c| c.is_autogenerated == Field::Value(false)));
    }

    #[tokio::test]
    async fn test_foreign_keys_resolve_implicit_target() {
        let (_dir, path) = fixture(SHOP);
        let introspector = SqliteIntrospector::new(path).await.unwrap();
        let structure = introspector.describe_structure().await.unwrap();

        let orders = structure.find_table("main", "orders").unwrap();
        let foreign: Vec<&Key> = orders
            .keys
            .iter()
            .filter(|k| k.key_type() == "foreign key")
            .collect();
        assert_eq!(foreign.len(), 2);
        for key in foreign {
            assert_eq!(key, &Key::foreign(None, &["user_id"], &["users.id"]));
        }
    }

    #[tokio::test]
    async fn test_broken_view_is_partial_success() {
        let (_dir, path) = fixture(
            "CREATE TABLE a (x INTEGER);
             CREATE TABLE b (y TEXT);
             CREATE VIEW v AS SELECT x FROM a;
             DROP TABLE a;",
        );
        let introspector = SqliteIntrospector::new(path).await.unwrap();
        let structure = introspector.describe_structure().await.unwrap();

        assert!(structure.has_error());
        assert_eq!(structure.error.value().unwrap().code.as_deref(), Some("PE-DSS-5000"));
        assert!(structure.find_table("main", "b").is_some());
        assert!(structure.find_table("main", "v").is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_connection_fault() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteIntrospector::new(dir.path().join("absent.db")).await;
        let fault = result.err().unwrap();
        assert!(fault.downcast_ref::<PluginError>().is_some());
    }

    #[tokio::test]
    async fn test_directory_is_argument_fault() {
        let dir = tempfile::tempdir().unwrap();
        let fault = SqliteIntrospector::new(dir.path().to_path_buf()).await.err().unwrap();
        let plugin = fault.downcast_ref::<PluginError>().unwrap();
        assert!(matches!(plugin, PluginError::DatasourceArgument(_)));
        assert_eq!(plugin.app_error_code(), "PE-DSS-4000");
    }

    #[tokio::test]
    async fn test_described_structure_round_trips() {
        let (_dir, path) = fixture(SHOP);
        let introspector = SqliteIntrospector::new(path).await.unwrap();
        let mut structure = describe_or_capture(&introspector).await;
        structure.sort().unwrap();

        let json = codec::to_json(&structure).unwrap();
        assert_eq!(codec::from_json(&json).unwrap(), structure);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "users");
        assert_eq!(quote_identifier("order items"), "\"order items\"");
        assert_eq!(quote_identifier("1st"), "\"1st\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_sample_value_affinity() {
        assert_eq!(sample_value("BIGINT"), "1");
        assert_eq!(sample_value("varchar(20)"), "''");
        assert_eq!(sample_value("DOUBLE"), "1.0");
        assert_eq!(sample_value(""), "NULL");
    }
}

//! Introspection driver abstraction
//!
//! Defines the interface every datasource backend implements to describe its
//! schema, and the boundary that turns faults into structure data.

use crate::structure::DatasourceStructure;
use anyhow::Result;
use async_trait::async_trait;

/// Which datasource backend a driver talks to
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DatasourceBackend {
    Sqlite,
}

impl std::fmt::Display for DatasourceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasourceBackend::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Trait that all structure introspectors must implement.
///
/// Synchronous drivers (like rusqlite) should use `spawn_blocking` internally.
#[async_trait]
pub trait StructureIntrospector: Send + Sync {
    /// Which backend this driver represents
    fn backend(&self) -> DatasourceBackend;

    /// Test that the connection is alive
    async fn test_connection(&self) -> Result<bool>;

    /// Describe every table and view the datasource exposes
    async fn describe_structure(&self) -> Result<DatasourceStructure>;
}

/// Describe a datasource, capturing any fault into the structure's error.
///
/// Never fails: a failed introspection yields an empty structure with
/// `error` set.
pub async fn describe_or_capture(introspector: &dyn StructureIntrospector) -> DatasourceStructure {
    match introspector.describe_structure().await {
        Ok(structure) => {
            log::info!(
                "{} structure described: {} tables",
                introspector.backend(),
                structure.tables.len()
            );
            structure
        }
        Err(fault) => {
            let mut structure = DatasourceStructure::default();
            structure.set_error_info(&fault);
            structure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use crate::structure::{Table, TableType};

    struct Failing;

    #[async_trait]
    impl StructureIntrospector for Failing {
        fn backend(&self) -> DatasourceBackend {
            DatasourceBackend::Sqlite
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(false)
        }

        async fn describe_structure(&self) -> Result<DatasourceStructure> {
            Err(PluginError::GetStructure("locked".to_string()).into())
        }
    }

    struct Fixed;

    #[async_trait]
    impl StructureIntrospector for Fixed {
        fn backend(&self) -> DatasourceBackend {
            DatasourceBackend::Sqlite
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(true)
        }

        async fn describe_structure(&self) -> Result<DatasourceStructure> {
            Ok(DatasourceStructure::new(vec![Table::new(TableType::Table, "main", "t")]))
        }
    }

    #[tokio::test]
    async fn test_fault_becomes_error_data() {
        let structure = describe_or_capture(&Failing).await;
        assert!(structure.tables.is_empty());
        let error = structure.error.into_value().unwrap();
        assert_eq!(error.code.as_deref(), Some("PE-DSS-5000"));
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let structure = describe_or_capture(&Fixed).await;
        assert!(!structure.has_error());
        assert_eq!(structure.tables.len(), 1);
    }
}

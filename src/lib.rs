//! Datasource structure - Library
//! Store-agnostic schema description for external datasources, with
//! introspection drivers and access-control group lookups

pub mod acl;
pub mod config;
pub mod dtos;
pub mod error;
pub mod introspect;
pub mod structure;

pub use error::{ErrorDto, PluginError, StructureError};
pub use structure::{DatasourceStructure, Key, Table};

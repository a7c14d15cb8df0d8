//! Error types shared across the crate
//!
//! `StructureError` covers failures inside the structure model itself.
//! `PluginError` is the application fault family raised by introspection
//! routines; only faults of this family carry an app error code into the
//! `ErrorDto` attached to a structure.

use crate::structure::Field;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the structure model and its wire codec
#[derive(Debug, Error)]
pub enum StructureError {
    /// A comparison or sort was attempted on an entity missing a required field
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("malformed structure json: {0}")]
    Json(#[from] serde_json::Error),

    /// A key carried a known discriminator but its fields did not match the variant
    #[error("cannot resolve key: {0}")]
    KeyResolution(String),
}

/// Faults raised by datasource plugins while talking to an external store
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Failed to get datasource structure: {0}")]
    GetStructure(String),

    #[error("Failed to connect to datasource: {0}")]
    Connection(String),

    #[error("Invalid datasource configuration: {0}")]
    DatasourceArgument(String),

    #[error("Query execution failed: {0}")]
    Query(String),
}

impl PluginError {
    /// Application-specific error code surfaced to the UI
    pub fn app_error_code(&self) -> &'static str {
        match self {
            PluginError::GetStructure(_) => "PE-DSS-5000",
            PluginError::Connection(_) => "PE-DSS-5001",
            PluginError::DatasourceArgument(_) => "PE-DSS-4000",
            PluginError::Query(_) => "PE-DSS-5002",
        }
    }
}

/// Error payload attached to a structure when introspection fails
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorDto {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub code: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub message: Field<String>,
}

impl ErrorDto {
    /// Capture a fault. The code is copied only for `PluginError` faults.
    pub fn from_fault(fault: &anyhow::Error) -> Self {
        let code = match fault.downcast_ref::<PluginError>() {
            Some(e) => Field::Value(e.app_error_code().to_string()),
            None => Field::Absent,
        };

        Self {
            code,
            message: Field::Value(fault.to_string()),
        }
    }
}

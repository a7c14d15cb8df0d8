//! Describe a SQLite database as datasource structure JSON
//!
//! Run with: cargo run --bin describe_structure -- path/to/file.db
//!
//! The path falls back to `sqlite_path` from the config file or DS_SQLITE_PATH.

use anyhow::{Context, Result};
use datasource_structure::config::AppConfig;
use datasource_structure::introspect::{describe_or_capture, sqlite::SqliteIntrospector};
use datasource_structure::structure::{codec, view};
use env_logger::Env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, warnings) = AppConfig::load();
    env_logger::init_from_env(Env::default().default_filter_or(config.log_filter.as_str()));
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.sqlite_path.clone())
        .context("No database given: pass a path or set sqlite_path / DS_SQLITE_PATH")?;

    let mut structure = match SqliteIntrospector::new(path).await {
        Ok(introspector) => describe_or_capture(&introspector).await,
        Err(fault) => {
            let mut structure = datasource_structure::DatasourceStructure::default();
            structure.set_error_info(&fault);
            structure
        }
    };

    if config.sort_structure {
        if let Err(e) = structure.sort() {
            log::warn!("structure left unsorted: {}", e);
        }
    }

    // re-read through the configured resolver so output matches what consumers decode
    let resolver = config.key_resolution.resolver();
    let structure = codec::from_json_with(&codec::to_json(&structure)?, resolver.as_ref())?;

    let projected = view::project(&structure, config.view)?;
    let output = if config.pretty {
        serde_json::to_string_pretty(&projected)?
    } else {
        serde_json::to_string(&projected)?
    };
    println!("{}", output);
    Ok(())
}

//! Access-control groups — domain types + read-only repository surface

mod permission_group;
mod repository;

pub use permission_group::*;
pub use repository::*;

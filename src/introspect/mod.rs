//! Structure introspection — driver abstraction + SQLite backend

mod driver;
pub mod sqlite;

pub use driver::*;

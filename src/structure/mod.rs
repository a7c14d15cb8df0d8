//! Datasource structure model: tables, columns, keys and templates
//! plus display ordering, wire codec and visibility policy

pub mod codec;
mod field;
mod key;
mod model;
mod ordering;
mod template;
pub mod view;

pub use field::*;
pub use key::*;
pub use model::*;
pub use ordering::*;
pub use template::*;

//! Value and schema model shared across the rewrite pipeline

pub mod data_type;
pub mod schema;
pub mod value;

pub use data_type::DataType;
pub use schema::{Catalog, Column, Table};
pub use value::{Row, Value};

//! Warehouse loader: validates staged flat files against the declared entity
//! schemas and bulk-inserts them into PostgreSQL or SQLite.

pub mod adapter;
pub mod errors;
pub mod loader;
pub mod postgres;
pub mod reader;
pub mod report;
pub mod sql;
pub mod sqlite;
pub mod value;

pub use adapter::{TableState, Warehouse, connect};
pub use errors::LoadError;
pub use loader::{LoadOptions, Loader};
pub use postgres::PostgresWarehouse;
pub use report::{FileReport, FileStatus, LoadReport, RejectedRow};
pub use sqlite::SqliteWarehouse;
pub use value::CellValue;

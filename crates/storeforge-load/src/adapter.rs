use std::collections::HashSet;

use async_trait::async_trait;

use storeforge_core::{ConflictPolicy, EntitySchema};

use crate::errors::LoadError;
use crate::postgres::PostgresWarehouse;
use crate::sqlite::SqliteWarehouse;
use crate::sql::Dialect;
use crate::value::CellValue;

/// What `ensure_table` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Created,
    Existing,
}

/// Trait implemented by warehouse backends the loader can write to.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    fn dialect(&self) -> Dialect;

    /// Column names of `table` in declared order, or `None` when absent.
    async fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, LoadError>;

    /// Run DDL statements in order.
    async fn execute_ddl(&self, statements: &[String]) -> Result<(), LoadError>;

    /// Primary keys currently stored for `schema`.
    async fn existing_keys(&self, schema: &EntitySchema) -> Result<HashSet<String>, LoadError>;

    /// Insert `rows` in chunks inside one transaction and return the number
    /// of rows the database reported as written.
    async fn insert_rows(
        &self,
        schema: &EntitySchema,
        rows: &[Vec<CellValue>],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<u64, LoadError>;

    async fn count_rows(&self, table: &str) -> Result<u64, LoadError>;

    /// Create the table and its indexes, or check that an existing table
    /// has the declared columns.
    async fn ensure_table(&self, schema: &EntitySchema) -> Result<TableState, LoadError> {
        match self.table_columns(schema.name).await? {
            Some(columns) => {
                let expected = schema.column_names();
                let actual: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
                if actual != expected {
                    return Err(LoadError::mismatch(
                        schema.name,
                        format!(
                            "table has columns [{}], expected [{}]",
                            actual.join(","),
                            expected.join(",")
                        ),
                    ));
                }
                Ok(TableState::Existing)
            }
            None => {
                let mut statements = vec![crate::sql::create_table(self.dialect(), schema)];
                statements.extend(crate::sql::create_indexes(schema));
                self.execute_ddl(&statements).await?;
                Ok(TableState::Created)
            }
        }
    }
}

/// Open a warehouse for `url`, choosing the backend from its scheme.
pub async fn connect(url: &str) -> Result<Box<dyn Warehouse>, LoadError> {
    let scheme = url.split(':').next().unwrap_or_default();
    match scheme {
        "postgres" | "postgresql" => Ok(Box::new(PostgresWarehouse::connect(url).await?)),
        "sqlite" => Ok(Box::new(SqliteWarehouse::connect(url).await?)),
        other => Err(LoadError::UnsupportedEngine(other.to_string())),
    }
}

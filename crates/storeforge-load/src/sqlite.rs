use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use storeforge_core::{ConflictPolicy, EntitySchema};

use crate::adapter::Warehouse;
use crate::errors::LoadError;
use crate::sql::{self, Dialect};
use crate::value::CellValue;

/// Warehouse backed by a SQLite file or in-memory database.
#[derive(Debug, Clone)]
pub struct SqliteWarehouse {
    pool: SqlitePool,
}

impl SqliteWarehouse {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open `url` on a single long-lived connection so that `sqlite::memory:`
    /// keeps its contents for the lifetime of the warehouse.
    pub async fn connect(url: &str) -> Result<Self, LoadError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|err| LoadError::Connection(err.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|err| LoadError::Connection(err.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, LoadError> {
        let columns =
            sqlx::query_scalar::<_, String>("select name from pragma_table_info(?1) order by cid")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;
        Ok((!columns.is_empty()).then_some(columns))
    }

    async fn execute_ddl(&self, statements: &[String]) -> Result<(), LoadError> {
        let mut tx = self.pool.begin().await?;
        for statement in statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn existing_keys(&self, schema: &EntitySchema) -> Result<HashSet<String>, LoadError> {
        let statement = sql::select_keys(schema);
        let keys = sqlx::query_scalar::<_, String>(&statement)
            .fetch_all(&self.pool)
            .await?;
        Ok(keys.into_iter().collect())
    }

    async fn insert_rows(
        &self,
        schema: &EntitySchema,
        rows: &[Vec<CellValue>],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<u64, LoadError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let chunk_rows = self.dialect().chunk_rows(schema, batch_size);
        let prefix = sql::insert_prefix(schema);
        let conflict = sql::conflict_clause(schema, policy);

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for chunk in rows.chunks(chunk_rows) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(prefix.as_str());
            builder.push_values(chunk, |mut row_values, row| {
                for value in row {
                    match value {
                        CellValue::Text(v) => row_values.push_bind(v.clone()),
                        CellValue::Integer(v) => row_values.push_bind(*v),
                        CellValue::Decimal(v) => row_values.push_bind(*v),
                        CellValue::Date(v) => row_values.push_bind(*v),
                        CellValue::Timestamp(v) => row_values.push_bind(*v),
                    };
                }
            });
            builder.push(conflict.as_str());
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }

    async fn count_rows(&self, table: &str) -> Result<u64, LoadError> {
        let statement = sql::count_rows(table);
        let count = sqlx::query_scalar::<_, i64>(&statement)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use storeforge_core::{ConflictPolicy, EntitySchema};

use crate::adapter::Warehouse;
use crate::errors::LoadError;
use crate::sql::{self, Dialect};
use crate::value::CellValue;

mod queries;

/// Warehouse backed by a PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PostgresWarehouse {
    pool: PgPool,
}

impl PostgresWarehouse {
    /// Create a new warehouse using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, LoadError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|err| LoadError::Connection(err.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Warehouse for PostgresWarehouse {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, LoadError> {
        let columns = queries::list_columns(&self.pool, table).await?;
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
        queries::list_keys(&self.pool, schema).await
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
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(prefix.as_str());
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
        queries::count_rows(&self.pool, table).await
    }
}

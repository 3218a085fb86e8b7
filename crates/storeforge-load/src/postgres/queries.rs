use std::collections::HashSet;

use sqlx::PgPool;

use storeforge_core::EntitySchema;

use crate::errors::LoadError;
use crate::sql;

pub async fn list_columns(pool: &PgPool, table: &str) -> Result<Vec<String>, LoadError> {
    let columns = sqlx::query_scalar::<_, String>(
        r#"
        select column_name::text
        from information_schema.columns
        where table_schema = current_schema()
          and table_name = $1
        order by ordinal_position
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(columns)
}

pub async fn list_keys(pool: &PgPool, schema: &EntitySchema) -> Result<HashSet<String>, LoadError> {
    let statement = sql::select_keys(schema);
    let keys = sqlx::query_scalar::<_, String>(&statement)
        .fetch_all(pool)
        .await?;
    Ok(keys.into_iter().collect())
}

pub async fn count_rows(pool: &PgPool, table: &str) -> Result<u64, LoadError> {
    let statement = sql::count_rows(table);
    let count = sqlx::query_scalar::<_, i64>(&statement)
        .fetch_one(pool)
        .await?;
    Ok(count.max(0) as u64)
}

//! DDL and statement text for the supported dialects.

use storeforge_core::{ColumnKind, ConflictPolicy, EntitySchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn column_type(&self, kind: ColumnKind) -> String {
        match (self, kind) {
            (_, ColumnKind::Text) => "TEXT".to_string(),
            (Dialect::Postgres, ColumnKind::Integer) => "BIGINT".to_string(),
            (Dialect::Postgres, ColumnKind::Decimal { scale }) => format!("NUMERIC(14,{scale})"),
            (Dialect::Postgres, ColumnKind::Date) => "DATE".to_string(),
            (Dialect::Postgres, ColumnKind::Timestamp) => "TIMESTAMP".to_string(),
            (Dialect::Sqlite, ColumnKind::Integer) => "INTEGER".to_string(),
            (Dialect::Sqlite, ColumnKind::Decimal { .. }) => "REAL".to_string(),
            (Dialect::Sqlite, ColumnKind::Date | ColumnKind::Timestamp) => "TEXT".to_string(),
        }
    }

    /// Largest number of bind parameters one statement may carry.
    pub fn max_binds(&self) -> usize {
        match self {
            Dialect::Postgres => 65_535,
            Dialect::Sqlite => 32_766,
        }
    }

    /// Rows per insert statement for `schema`, capped by the bind limit.
    pub fn chunk_rows(&self, schema: &EntitySchema, batch_size: usize) -> usize {
        let per_row = schema.columns.len().max(1);
        batch_size.clamp(1, (self.max_binds() / per_row).max(1))
    }
}

pub fn create_table(dialect: Dialect, schema: &EntitySchema) -> String {
    let mut parts: Vec<String> = schema
        .columns
        .iter()
        .map(|column| {
            let mut part = format!("{} {}", column.name, dialect.column_type(column.kind));
            if !column.nullable {
                part.push_str(" NOT NULL");
            }
            part
        })
        .collect();

    parts.push(format!(
        "CONSTRAINT {}_pkey PRIMARY KEY ({})",
        schema.name, schema.primary_key
    ));
    for column in schema.columns {
        for check in column.check_expressions() {
            parts.push(format!("CHECK ({check})"));
        }
    }
    for fk in schema.foreign_keys {
        parts.push(format!(
            "CONSTRAINT {}_{}_fkey FOREIGN KEY ({}) REFERENCES {} ({})",
            schema.name, fk.column, fk.column, fk.references, fk.referenced_column
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        schema.name,
        parts.join(",\n  ")
    )
}

pub fn create_indexes(schema: &EntitySchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                index.name,
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}

/// `INSERT INTO t (a, b) ` prefix; values are appended by the caller.
pub fn insert_prefix(schema: &EntitySchema) -> String {
    format!(
        "INSERT INTO {} ({}) ",
        schema.name,
        schema.column_names().join(", ")
    )
}

/// Conflict clause appended after the values list.
pub fn conflict_clause(schema: &EntitySchema, policy: ConflictPolicy) -> String {
    let updates: Vec<String> = schema
        .columns
        .iter()
        .filter(|column| column.name != schema.primary_key)
        .map(|column| format!("{0} = excluded.{0}", column.name))
        .collect();

    match policy {
        ConflictPolicy::Upsert if !updates.is_empty() => format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            schema.primary_key,
            updates.join(", ")
        ),
        _ => format!(" ON CONFLICT ({}) DO NOTHING", schema.primary_key),
    }
}

pub fn select_keys(schema: &EntitySchema) -> String {
    format!(
        "SELECT CAST({} AS TEXT) FROM {}",
        schema.primary_key, schema.name
    )
}

pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {table}")
}

#[cfg(test)]
mod tests {
    use storeforge_core::{PRODUCTS, TRANSACTIONS};

    use super::*;

    #[test]
    fn postgres_ddl_declares_keys_and_checks() {
        let ddl = create_table(Dialect::Postgres, &TRANSACTIONS);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS transactions ("));
        assert!(ddl.contains("unit_price NUMERIC(14,2) NOT NULL"));
        assert!(ddl.contains("transaction_date TIMESTAMP NOT NULL"));
        assert!(ddl.contains("PRIMARY KEY (transaction_id)"));
        assert!(ddl.contains("CHECK (quantity > 0)"));
        assert!(ddl.contains("CHECK (channel IN ('Website', 'Mobile App', 'In-Store', 'Phone'))"));
        assert!(ddl.contains("FOREIGN KEY (customer_id) REFERENCES customers (customer_id)"));
    }

    #[test]
    fn sqlite_ddl_uses_affinity_types() {
        let ddl = create_table(Dialect::Sqlite, &PRODUCTS);
        assert!(ddl.contains("price REAL NOT NULL"));
        assert!(ddl.contains("rating REAL,"));
        assert!(ddl.contains("CHECK (rating BETWEEN 1 AND 5)"));
        assert!(ddl.contains(
            "CHECK (category IN ('Electronics', 'Clothing', 'Books', 'Home & Garden', 'Sports', 'Beauty'))"
        ));
        assert!(ddl.contains("date_added TEXT NOT NULL"));
    }

    #[test]
    fn upsert_updates_every_non_key_column() {
        let clause = conflict_clause(&PRODUCTS, ConflictPolicy::Upsert);
        assert!(clause.starts_with(" ON CONFLICT (product_id) DO UPDATE SET name = excluded.name"));
        assert!(!clause.contains("product_id = excluded.product_id"));
        assert_eq!(
            conflict_clause(&PRODUCTS, ConflictPolicy::Skip),
            " ON CONFLICT (product_id) DO NOTHING"
        );
    }

    #[test]
    fn chunks_respect_bind_limit() {
        assert_eq!(Dialect::Postgres.chunk_rows(&TRANSACTIONS, 500), 500);
        assert_eq!(Dialect::Sqlite.chunk_rows(&TRANSACTIONS, 100_000), 32_766 / 13);
        assert_eq!(Dialect::Sqlite.chunk_rows(&TRANSACTIONS, 0), 1);
    }
}

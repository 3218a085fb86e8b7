//! Explicit per-entity declarations.
//!
//! Every flat file and every warehouse table is described by one
//! [`EntitySchema`]. The generator and the enricher write columns in the
//! declared order, and the loader refuses files that do not match.

use crate::records::{CHANNELS, Category, ORDER_STATUSES, PAYMENT_METHODS, Segment};

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    /// Fixed-point value with the given number of fractional digits.
    Decimal { scale: u8 },
    Date,
    Timestamp,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Decimal { .. } => "decimal",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp => "timestamp",
        }
    }
}

/// Numeric bound enforced on load and declared as a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    None,
    NonNegative,
    Positive,
    Range { min: f64, max: f64 },
}

impl Bound {
    pub fn admits(&self, value: f64) -> bool {
        match self {
            Bound::None => true,
            Bound::NonNegative => value >= 0.0,
            Bound::Positive => value > 0.0,
            Bound::Range { min, max } => value >= *min && value <= *max,
        }
    }

    /// SQL predicate for a CHECK constraint on `column`.
    pub fn check_expression(&self, column: &str) -> Option<String> {
        match self {
            Bound::None => None,
            Bound::NonNegative => Some(format!("{column} >= 0")),
            Bound::Positive => Some(format!("{column} > 0")),
            Bound::Range { min, max } => Some(format!("{column} BETWEEN {min} AND {max}")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub bound: Bound,
    /// Closed set of text values, when the column holds an enumeration.
    pub allowed: Option<&'static [&'static str]>,
}

impl ColumnSpec {
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            bound: Bound::None,
            allowed: None,
        }
    }

    pub const fn nullable(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            bound: Bound::None,
            allowed: None,
        }
    }

    pub const fn bounded(mut self, bound: Bound) -> Self {
        self.bound = bound;
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }

    pub fn admits_text(&self, value: &str) -> bool {
        self.allowed.is_none_or(|allowed| allowed.contains(&value))
    }

    /// SQL predicates for this column's CHECK constraints.
    pub fn check_expressions(&self) -> Vec<String> {
        let mut checks: Vec<String> = self.bound.check_expression(self.name).into_iter().collect();
        if let Some(allowed) = self.allowed {
            let values: Vec<String> = allowed
                .iter()
                .map(|value| format!("'{}'", value.replace('\'', "''")))
                .collect();
            checks.push(format!("{} IN ({})", self.name, values.join(", ")));
        }
        checks
    }
}

/// Single-column foreign key into another entity's primary key.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeySpec {
    pub column: &'static str,
    pub references: &'static str,
    pub referenced_column: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Sub-directory of the staging tree an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingArea {
    /// Generated records.
    Internal,
    /// Records fetched from external sources.
    External,
}

#[derive(Debug)]
pub struct EntitySchema {
    /// Table name, also used as the entity identifier.
    pub name: &'static str,
    pub file_name: &'static str,
    pub area: StagingArea,
    pub columns: &'static [ColumnSpec],
    pub primary_key: &'static str,
    pub foreign_keys: &'static [ForeignKeySpec],
    pub indexes: &'static [IndexSpec],
}

impl EntitySchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn primary_key_position(&self) -> Option<usize> {
        self.position(self.primary_key)
    }
}

const TEXT: ColumnKind = ColumnKind::Text;
const INTEGER: ColumnKind = ColumnKind::Integer;
const MONEY: ColumnKind = ColumnKind::Decimal { scale: 2 };
const DATE: ColumnKind = ColumnKind::Date;
const TIMESTAMP: ColumnKind = ColumnKind::Timestamp;

// =============================================================================
// Core entities
// =============================================================================

pub static CUSTOMERS: EntitySchema = EntitySchema {
    name: "customers",
    file_name: "customers.csv",
    area: StagingArea::Internal,
    columns: &[
        ColumnSpec::required("customer_id", TEXT),
        ColumnSpec::required("first_name", TEXT),
        ColumnSpec::required("last_name", TEXT),
        ColumnSpec::required("email", TEXT),
        ColumnSpec::nullable("phone", TEXT),
        ColumnSpec::nullable("address", TEXT),
        ColumnSpec::nullable("city", TEXT),
        ColumnSpec::nullable("state", TEXT),
        ColumnSpec::nullable("zip_code", TEXT),
        ColumnSpec::required("country", TEXT),
        ColumnSpec::required("date_joined", DATE),
        ColumnSpec::required("segment", TEXT).one_of(&Segment::NAMES),
        ColumnSpec::required("lifetime_value", MONEY).bounded(Bound::NonNegative),
    ],
    primary_key: "customer_id",
    foreign_keys: &[],
    indexes: &[IndexSpec {
        name: "idx_customers_segment",
        columns: &["segment"],
    }],
};

pub static PRODUCTS: EntitySchema = EntitySchema {
    name: "products",
    file_name: "products.csv",
    area: StagingArea::Internal,
    columns: &[
        ColumnSpec::required("product_id", TEXT),
        ColumnSpec::required("name", TEXT),
        ColumnSpec::nullable("description", TEXT),
        ColumnSpec::required("category", TEXT).one_of(&Category::NAMES),
        ColumnSpec::nullable("brand", TEXT),
        ColumnSpec::required("price", MONEY).bounded(Bound::Positive),
        ColumnSpec::required("cost", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::nullable("weight_kg", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::nullable("dimensions", TEXT),
        ColumnSpec::required("stock_quantity", INTEGER).bounded(Bound::NonNegative),
        ColumnSpec::nullable("rating", ColumnKind::Decimal { scale: 1 })
            .bounded(Bound::Range { min: 1.0, max: 5.0 }),
        ColumnSpec::required("reviews_count", INTEGER).bounded(Bound::NonNegative),
        ColumnSpec::required("date_added", DATE),
    ],
    primary_key: "product_id",
    foreign_keys: &[],
    indexes: &[IndexSpec {
        name: "idx_products_category",
        columns: &["category"],
    }],
};

pub static TRANSACTIONS: EntitySchema = EntitySchema {
    name: "transactions",
    file_name: "transactions.csv",
    area: StagingArea::Internal,
    columns: &[
        ColumnSpec::required("transaction_id", TEXT),
        ColumnSpec::required("customer_id", TEXT),
        ColumnSpec::required("product_id", TEXT),
        ColumnSpec::required("quantity", INTEGER).bounded(Bound::Positive),
        ColumnSpec::required("unit_price", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::required("total_amount", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::required("discount_amount", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::required("tax_amount", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::required("shipping_cost", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::required("payment_method", TEXT).one_of(&PAYMENT_METHODS),
        ColumnSpec::required("transaction_date", TIMESTAMP),
        ColumnSpec::required("order_status", TEXT).one_of(&ORDER_STATUSES),
        ColumnSpec::required("channel", TEXT).one_of(&CHANNELS),
    ],
    primary_key: "transaction_id",
    foreign_keys: &[
        ForeignKeySpec {
            column: "customer_id",
            references: "customers",
            referenced_column: "customer_id",
        },
        ForeignKeySpec {
            column: "product_id",
            references: "products",
            referenced_column: "product_id",
        },
    ],
    indexes: &[
        IndexSpec {
            name: "idx_transactions_date",
            columns: &["transaction_date"],
        },
        IndexSpec {
            name: "idx_transactions_customer",
            columns: &["customer_id"],
        },
        IndexSpec {
            name: "idx_transactions_product",
            columns: &["product_id"],
        },
    ],
};

// =============================================================================
// Auxiliary entities (joined at query time, no foreign keys)
// =============================================================================

pub static WEATHER_OBSERVATIONS: EntitySchema = EntitySchema {
    name: "weather_observations",
    file_name: "weather_observations.csv",
    area: StagingArea::External,
    columns: &[
        ColumnSpec::required("observation_id", TEXT),
        ColumnSpec::required("city", TEXT),
        ColumnSpec::required("observed_at", TIMESTAMP),
        ColumnSpec::required("temperature_c", ColumnKind::Decimal { scale: 1 }),
        ColumnSpec::required("humidity", INTEGER).bounded(Bound::Range {
            min: 0.0,
            max: 100.0,
        }),
        ColumnSpec::required("condition", TEXT),
        ColumnSpec::required("source", TEXT),
    ],
    primary_key: "observation_id",
    foreign_keys: &[],
    indexes: &[IndexSpec {
        name: "idx_weather_observed_at",
        columns: &["observed_at"],
    }],
};

pub static ECONOMIC_INDICATORS: EntitySchema = EntitySchema {
    name: "economic_indicators",
    file_name: "economic_indicators.csv",
    area: StagingArea::External,
    columns: &[
        ColumnSpec::required("indicator_id", TEXT),
        ColumnSpec::required("series_id", TEXT),
        ColumnSpec::required("observation_date", DATE),
        ColumnSpec::required("value", ColumnKind::Decimal { scale: 3 }),
        ColumnSpec::required("source", TEXT),
    ],
    primary_key: "indicator_id",
    foreign_keys: &[],
    indexes: &[IndexSpec {
        name: "idx_economic_date",
        columns: &["observation_date"],
    }],
};

pub static SOCIAL_MENTIONS: EntitySchema = EntitySchema {
    name: "social_mentions",
    file_name: "social_mentions.csv",
    area: StagingArea::External,
    columns: &[
        ColumnSpec::required("mention_id", TEXT),
        ColumnSpec::required("platform", TEXT),
        ColumnSpec::required("keyword", TEXT),
        ColumnSpec::required("title", TEXT),
        ColumnSpec::required("score", INTEGER),
        ColumnSpec::required("comments", INTEGER).bounded(Bound::NonNegative),
        ColumnSpec::nullable("community", TEXT),
        ColumnSpec::nullable("author", TEXT),
        ColumnSpec::nullable("url", TEXT),
        ColumnSpec::required("created_at", TIMESTAMP),
        ColumnSpec::required("scraped_at", TIMESTAMP),
    ],
    primary_key: "mention_id",
    foreign_keys: &[],
    indexes: &[IndexSpec {
        name: "idx_social_created_at",
        columns: &["created_at"],
    }],
};

pub static COMPETITOR_LISTINGS: EntitySchema = EntitySchema {
    name: "competitor_listings",
    file_name: "competitor_listings.csv",
    area: StagingArea::External,
    columns: &[
        ColumnSpec::required("listing_id", TEXT),
        ColumnSpec::required("category", TEXT),
        ColumnSpec::required("name", TEXT),
        ColumnSpec::required("price", MONEY).bounded(Bound::NonNegative),
        ColumnSpec::nullable("rating", ColumnKind::Decimal { scale: 1 }),
        ColumnSpec::required("page", INTEGER).bounded(Bound::Positive),
        ColumnSpec::required("position", INTEGER).bounded(Bound::Positive),
        ColumnSpec::required("source", TEXT),
        ColumnSpec::required("scraped_at", TIMESTAMP),
    ],
    primary_key: "listing_id",
    foreign_keys: &[],
    indexes: &[IndexSpec {
        name: "idx_competitor_category",
        columns: &["category"],
    }],
};

/// Every declared entity, parents before children.
pub static ALL_ENTITIES: &[&EntitySchema] = &[
    &CUSTOMERS,
    &PRODUCTS,
    &TRANSACTIONS,
    &WEATHER_OBSERVATIONS,
    &ECONOMIC_INDICATORS,
    &SOCIAL_MENTIONS,
    &COMPETITOR_LISTINGS,
];

/// Look up a declared entity by table name.
pub fn entity(name: &str) -> Option<&'static EntitySchema> {
    ALL_ENTITIES.iter().copied().find(|schema| schema.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entity_declares_its_primary_key_column() {
        for schema in ALL_ENTITIES {
            let pk = schema
                .column(schema.primary_key)
                .unwrap_or_else(|| panic!("{} has no pk column", schema.name));
            assert!(!pk.nullable, "{} pk must be required", schema.name);
        }
    }

    #[test]
    fn bounds_admit_and_render() {
        assert!(Bound::Positive.admits(0.01));
        assert!(!Bound::Positive.admits(0.0));
        assert!(Bound::NonNegative.admits(0.0));
        let rating = Bound::Range { min: 1.0, max: 5.0 };
        assert!(rating.admits(5.0));
        assert!(!rating.admits(5.1));
        assert_eq!(
            rating.check_expression("rating").as_deref(),
            Some("rating BETWEEN 1 AND 5")
        );
        assert_eq!(Bound::None.check_expression("x"), None);
    }

    #[test]
    fn enumerated_columns_render_in_lists() {
        let segment = CUSTOMERS.column("segment").expect("segment column");
        assert!(segment.admits_text("Budget"));
        assert!(!segment.admits_text("Gold"));
        assert_eq!(
            segment.check_expressions(),
            vec!["segment IN ('Premium', 'Regular', 'Budget')".to_string()]
        );

        let quoted = ColumnSpec::required("label", TEXT).one_of(&["O'Brien"]);
        assert_eq!(quoted.check_expressions(), vec!["label IN ('O''Brien')".to_string()]);

        let rating = PRODUCTS.column("rating").expect("rating column");
        assert!(rating.admits_text("anything"));
        assert_eq!(rating.check_expressions(), vec!["rating BETWEEN 1 AND 5".to_string()]);
    }

    #[test]
    fn entity_lookup_by_table_name() {
        assert_eq!(entity("transactions").map(|s| s.primary_key), Some("transaction_id"));
        assert!(entity("orders").is_none());
    }
}

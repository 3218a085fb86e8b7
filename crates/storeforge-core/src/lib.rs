//! Core contracts and helpers for storeforge.
//!
//! This crate declares the entity schemas shared by the generator, the
//! enricher and the warehouse loader, the record types that populate them,
//! and the pipeline configuration every stage receives by reference.

pub mod config;
pub mod error;
pub mod graph;
pub mod output;
pub mod records;
pub mod redaction;
pub mod schema;
pub mod staging;
pub mod validation;
pub mod values;

pub use config::{
    CompetitorSourceConfig, ConfigError, ConflictPolicy, DatabaseConfig, EconomicSourceConfig,
    EnrichConfig, GenerateConfig, LoadConfig, LoggingConfig, PathsConfig, PipelineConfig,
    PriceRange, RequestPolicy, SocialSourceConfig, WeatherSourceConfig,
};
pub use error::{Error, Result};
pub use graph::load_order;
pub use output::write_records_csv;
pub use records::{
    CHANNELS, Category, CompetitorListing, Customer, EconomicIndicator, ORDER_STATUSES,
    PAYMENT_METHODS, Product, Record, Segment, SocialMention, Transaction, WeatherObservation,
};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use schema::{
    ALL_ENTITIES, Bound, COMPETITOR_LISTINGS, CUSTOMERS, ColumnKind, ColumnSpec,
    ECONOMIC_INDICATORS, EntitySchema, ForeignKeySpec, IndexSpec, PRODUCTS, SOCIAL_MENTIONS,
    StagingArea, TRANSACTIONS, WEATHER_OBSERVATIONS, entity,
};
pub use staging::StagingPaths;
pub use validation::validate_entity_schemas;

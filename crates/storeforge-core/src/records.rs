//! Typed records for every declared entity.
//!
//! Field order matches the column order of the entity's [`EntitySchema`], so a
//! record serialized with `csv` lines up with the declared header.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schema::{
    COMPETITOR_LISTINGS, CUSTOMERS, ECONOMIC_INDICATORS, EntitySchema, PRODUCTS,
    SOCIAL_MENTIONS, TRANSACTIONS, WEATHER_OBSERVATIONS,
};

/// A record that can be staged as a row of its entity's flat file.
pub trait Record: Serialize {
    fn schema() -> &'static EntitySchema
    where
        Self: Sized;

    /// Primary key value.
    fn key(&self) -> &str;
}

pub const PAYMENT_METHODS: [&str; 4] = ["Credit Card", "Debit Card", "PayPal", "Bank Transfer"];
pub const ORDER_STATUSES: [&str; 4] = ["Completed", "Pending", "Cancelled", "Refunded"];
pub const CHANNELS: [&str; 4] = ["Website", "Mobile App", "In-Store", "Phone"];

/// Customer classification used for analytics grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Premium,
    Regular,
    Budget,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Premium, Segment::Regular, Segment::Budget];
    /// Display names, in the order of [`Segment::ALL`].
    pub const NAMES: [&'static str; 3] = ["Premium", "Regular", "Budget"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Premium => "Premium",
            Segment::Regular => "Regular",
            Segment::Budget => "Budget",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Clothing,
    Books,
    #[serde(rename = "Home & Garden")]
    HomeAndGarden,
    Sports,
    Beauty,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::Clothing,
        Category::Books,
        Category::HomeAndGarden,
        Category::Sports,
        Category::Beauty,
    ];
    pub const NAMES: [&'static str; 6] = [
        "Electronics",
        "Clothing",
        "Books",
        "Home & Garden",
        "Sports",
        "Beauty",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Books => "Books",
            Category::HomeAndGarden => "Home & Garden",
            Category::Sports => "Sports",
            Category::Beauty => "Beauty",
        }
    }

    /// Lowercase, dash-separated form used in URLs.
    pub fn slug(&self) -> String {
        self.as_str()
            .to_lowercase()
            .replace(" & ", "-")
            .replace(' ', "-")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: String,
    pub date_joined: NaiveDate,
    pub segment: Segment,
    pub lifetime_value: f64,
}

impl Record for Customer {
    fn schema() -> &'static EntitySchema {
        &CUSTOMERS
    }

    fn key(&self) -> &str {
        &self.customer_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub brand: Option<String>,
    pub price: f64,
    pub cost: f64,
    pub weight_kg: Option<f64>,
    pub dimensions: Option<String>,
    pub stock_quantity: i64,
    pub rating: Option<f64>,
    pub reviews_count: i64,
    pub date_added: NaiveDate,
}

impl Record for Product {
    fn schema() -> &'static EntitySchema {
        &PRODUCTS
    }

    fn key(&self) -> &str {
        &self.product_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub shipping_cost: f64,
    pub payment_method: String,
    pub transaction_date: NaiveDateTime,
    pub order_status: String,
    pub channel: String,
}

impl Record for Transaction {
    fn schema() -> &'static EntitySchema {
        &TRANSACTIONS
    }

    fn key(&self) -> &str {
        &self.transaction_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub observation_id: String,
    pub city: String,
    pub observed_at: NaiveDateTime,
    pub temperature_c: f64,
    pub humidity: i64,
    pub condition: String,
    pub source: String,
}

impl Record for WeatherObservation {
    fn schema() -> &'static EntitySchema {
        &WEATHER_OBSERVATIONS
    }

    fn key(&self) -> &str {
        &self.observation_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicIndicator {
    pub indicator_id: String,
    pub series_id: String,
    pub observation_date: NaiveDate,
    pub value: f64,
    pub source: String,
}

impl Record for EconomicIndicator {
    fn schema() -> &'static EntitySchema {
        &ECONOMIC_INDICATORS
    }

    fn key(&self) -> &str {
        &self.indicator_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialMention {
    pub mention_id: String,
    pub platform: String,
    pub keyword: String,
    pub title: String,
    pub score: i64,
    pub comments: i64,
    pub community: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub created_at: NaiveDateTime,
    pub scraped_at: NaiveDateTime,
}

impl Record for SocialMention {
    fn schema() -> &'static EntitySchema {
        &SOCIAL_MENTIONS
    }

    fn key(&self) -> &str {
        &self.mention_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorListing {
    pub listing_id: String,
    pub category: String,
    pub name: String,
    pub price: f64,
    pub rating: Option<f64>,
    pub page: i64,
    pub position: i64,
    pub source: String,
    pub scraped_at: NaiveDateTime,
}

impl Record for CompetitorListing {
    fn schema() -> &'static EntitySchema {
        &COMPETITOR_LISTINGS
    }

    fn key(&self) -> &str {
        &self.listing_id
    }
}

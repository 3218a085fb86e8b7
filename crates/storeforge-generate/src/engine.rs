use std::path::PathBuf;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use storeforge_core::values::{round_currency, round_to};
use storeforge_core::{
    CHANNELS, Category, Customer, GenerateConfig, ORDER_STATUSES, PAYMENT_METHODS, Product, Record,
    Segment, StagingPaths, Transaction, write_records_csv,
};

use crate::errors::GenerationError;
use crate::faker;
use crate::foreign::{ForeignContext, InMemoryForeignContext};
use crate::model::{GenerateOptions, GenerationReport, TableReport};
use crate::weights::WeightedTable;

const COUNTRY: &str = "USA";
const BRANDS: [&str; 5] = ["BrandA", "BrandB", "BrandC", "BrandD", "BrandE"];

/// Share of the list price a product costs us.
const COST_RATIO: f64 = 0.6;
const CUSTOMER_HISTORY_DAYS: i64 = 730;
const CATALOG_HISTORY_DAYS: i64 = 365;
const TRANSACTION_WINDOW_DAYS: i64 = 182;

/// Records produced by one generation pass, before they are staged.
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    pub seed: u64,
    pub reference_date: NaiveDate,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub transactions: Vec<Transaction>,
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub files: Vec<PathBuf>,
    pub report: GenerationReport,
    pub report_path: Option<PathBuf>,
}

/// Entry point for generating the baseline datasets.
#[derive(Debug, Clone)]
pub struct GenerationEngine<'a> {
    config: &'a GenerateConfig,
    options: GenerateOptions,
}

impl<'a> GenerationEngine<'a> {
    pub fn new(config: &'a GenerateConfig, options: GenerateOptions) -> Self {
        Self { config, options }
    }

    /// Configured seed, or a fresh one drawn from entropy.
    pub fn resolve_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(rand::random)
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.config
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Generate every entity in memory.
    pub fn generate(
        &self,
        seed: u64,
        reference_date: NaiveDate,
    ) -> Result<GeneratedDataset, GenerationError> {
        let config = self.config;
        if config.transactions > 0 && (config.customers == 0 || config.products == 0) {
            return Err(GenerationError::InvalidConfig(
                "transactions require at least one customer and one product".to_string(),
            ));
        }

        let segments = WeightedTable::new("segment", &config.segment_weights)?;
        let categories = WeightedTable::new("category", &config.category_weights)?;

        let customers = generate_customers(
            &segments,
            hash_seed(seed, Customer::schema().name),
            reference_date,
            config.customers,
        );
        let products = generate_products(
            config,
            &categories,
            hash_seed(seed, Product::schema().name),
            reference_date,
            config.products,
        )?;

        let mut foreign = InMemoryForeignContext::new();
        foreign.ingest_customers(&customers);
        foreign.ingest_products(&products);
        let transactions = generate_transactions(
            config,
            &foreign,
            hash_seed(seed, Transaction::schema().name),
            reference_date,
            config.transactions,
        )?;

        Ok(GeneratedDataset {
            seed,
            reference_date,
            customers,
            products,
            transactions,
        })
    }

    /// Generate, stage the CSV files and write the run report.
    pub fn run(&self) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = self.resolve_seed();
        let reference_date = self.reference_date();

        info!(
            run_id = %run_id,
            seed,
            reference_date = %reference_date,
            customers = self.config.customers,
            products = self.config.products,
            transactions = self.config.transactions,
            "generation started"
        );

        let dataset = match self.generate(seed, reference_date) {
            Ok(dataset) => dataset,
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "generation failed");
                return Err(err);
            }
        };

        let staging = StagingPaths::new(&self.options.staging_root);
        staging.ensure()?;

        let mut report = GenerationReport::new(run_id.clone(), seed, reference_date);
        for customer in &dataset.customers {
            report.record_segment(customer.segment.as_str());
        }
        for product in &dataset.products {
            report.record_category(product.category.as_str());
        }

        let mut files = Vec::with_capacity(3);
        files.push(stage(&staging, &dataset.customers, self.config.customers, &mut report)?);
        files.push(stage(&staging, &dataset.products, self.config.products, &mut report)?);
        files.push(stage(
            &staging,
            &dataset.transactions,
            self.config.transactions,
            &mut report,
        )?);

        report.duration_ms = start.elapsed().as_millis() as u64;

        let report_path = match &self.options.report_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path = dir.join("generation_report.json");
                std::fs::write(&path, serde_json::to_vec_pretty(&report)?)?;
                Some(path)
            }
            None => None,
        };

        info!(
            run_id = %run_id,
            tables = report.tables.len(),
            bytes_written = report.bytes_written,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            files,
            report,
            report_path,
        })
    }
}

fn stage<R: Record>(
    staging: &StagingPaths,
    records: &[R],
    requested: u64,
    report: &mut GenerationReport,
) -> Result<PathBuf, GenerationError> {
    let schema = R::schema();
    let path = staging.entity_file(schema);
    let table_start = Instant::now();
    let bytes_written = write_records_csv(&path, records)?;

    info!(
        entity = schema.name,
        rows_generated = records.len() as u64,
        bytes_written,
        path = %path.display(),
        duration_ms = table_start.elapsed().as_millis() as u64,
        "entity staged"
    );

    report.record_table(TableReport {
        entity: schema.name.to_string(),
        path: path.clone(),
        rows_requested: requested,
        rows_generated: records.len() as u64,
        bytes_written,
    });
    Ok(path)
}

fn generate_customers(
    segments: &WeightedTable<Segment>,
    table_seed: u64,
    reference_date: NaiveDate,
    count: u64,
) -> Vec<Customer> {
    (0..count)
        .map(|index| {
            let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(table_seed, index));
            let number = index + 1;
            let first_name = faker::first_name(&mut rng);
            let last_name = faker::last_name(&mut rng);
            let email = faker::email(&mut rng, &first_name, &last_name, number);

            Customer {
                customer_id: format!("CUST_{number:06}"),
                email,
                phone: Some(faker::phone(&mut rng)),
                address: Some(faker::street_address(&mut rng)),
                city: Some(faker::city(&mut rng)),
                state: Some(faker::state(&mut rng)),
                zip_code: Some(faker::zip_code(&mut rng)),
                country: COUNTRY.to_string(),
                date_joined: days_before(&mut rng, reference_date, CUSTOMER_HISTORY_DAYS),
                segment: segments.pick(&mut rng),
                lifetime_value: round_currency(rng.random_range(100.0..=5000.0)),
                first_name,
                last_name,
            }
        })
        .collect()
}

fn generate_products(
    config: &GenerateConfig,
    categories: &WeightedTable<Category>,
    table_seed: u64,
    reference_date: NaiveDate,
    count: u64,
) -> Result<Vec<Product>, GenerationError> {
    (0..count)
        .map(|index| {
            let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(table_seed, index));
            let category = categories.pick(&mut rng);
            let range = config.price_ranges.get(&category).ok_or_else(|| {
                GenerationError::InvalidConfig(format!("no price range for {category}"))
            })?;
            if !(range.min > 0.0 && range.min <= range.max) {
                return Err(GenerationError::InvalidConfig(format!(
                    "price range for {category} must satisfy 0 < min <= max"
                )));
            }
            let price = round_currency(rng.random_range(range.min..=range.max));
            let family = category.as_str().split_whitespace().next().unwrap_or("Item");

            Ok(Product {
                product_id: format!("PROD_{:06}", index + 1),
                name: format!("{} {family}", faker::catch_phrase(&mut rng)),
                description: Some(faker::description(&mut rng)),
                category,
                brand: Some(pick(&mut rng, &BRANDS).to_string()),
                price,
                cost: round_currency(price * COST_RATIO),
                weight_kg: Some(round_currency(rng.random_range(0.1..=5.0))),
                dimensions: Some(format!(
                    "{}x{}x{}",
                    rng.random_range(5..=30),
                    rng.random_range(5..=30),
                    rng.random_range(5..=30)
                )),
                stock_quantity: rng.random_range(0..=1000),
                rating: Some(round_to(rng.random_range(1.0..=5.0), 1)),
                reviews_count: rng.random_range(0..=500),
                date_added: days_before(&mut rng, reference_date, CATALOG_HISTORY_DAYS),
            })
        })
        .collect()
}

fn generate_transactions(
    config: &GenerateConfig,
    foreign: &dyn ForeignContext,
    table_seed: u64,
    reference_date: NaiveDate,
    count: u64,
) -> Result<Vec<Transaction>, GenerationError> {
    let window_end = reference_date.and_hms_opt(23, 59, 59).unwrap_or_default();
    let window_start = window_end - TimeDelta::days(TRANSACTION_WINDOW_DAYS);

    (0..count)
        .map(|index| {
            let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(table_seed, index));
            let customer = foreign.pick_customer(&mut rng)?;
            let product = foreign.pick_product(&mut rng)?;
            let quantity: i64 = rng.random_range(1..=5);

            let discount_rate = config
                .segment_discounts
                .get(&customer.segment)
                .copied()
                .unwrap_or(0.0);
            let unit_price = round_currency(product.price * (1.0 - discount_rate));
            let total_amount = round_currency(unit_price * quantity as f64);
            let discount_amount = round_currency(product.price * quantity as f64 * discount_rate);
            let tax_amount = round_currency(total_amount * config.tax_rate);
            let shipping_cost = round_currency(rng.random_range(0.0..=config.max_shipping_cost));

            Ok(Transaction {
                transaction_id: format!("TXN_{:08}", index + 1),
                customer_id: customer.customer_id.clone(),
                product_id: product.product_id.clone(),
                quantity,
                unit_price,
                total_amount,
                discount_amount,
                tax_amount,
                shipping_cost,
                payment_method: pick(&mut rng, &PAYMENT_METHODS).to_string(),
                transaction_date: within_window(&mut rng, window_start, window_end),
                order_status: pick(&mut rng, &ORDER_STATUSES).to_string(),
                channel: pick(&mut rng, &CHANNELS).to_string(),
            })
        })
        .collect()
}

fn pick<'v, R: Rng>(rng: &mut R, values: &'v [&'static str]) -> &'v str {
    values[rng.random_range(0..values.len())]
}

fn days_before<R: Rng>(rng: &mut R, reference_date: NaiveDate, max_days: i64) -> NaiveDate {
    reference_date - TimeDelta::days(rng.random_range(0..=max_days))
}

fn within_window<R: Rng>(rng: &mut R, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime {
    let span = (end - start).num_seconds().max(0);
    start + TimeDelta::seconds(rng.random_range(0..=span))
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_row_seed(table_seed: u64, row_index: u64) -> u64 {
    let hash = table_seed ^ row_index.wrapping_mul(0x9e3779b97f4a7c15);
    hash.wrapping_mul(0x100000001b3)
}

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use storeforge_core::{CUSTOMERS, GenerateConfig, PRODUCTS, Segment, StagingPaths, TRANSACTIONS};
use storeforge_generate::{GenerateOptions, GenerationEngine, GenerationError};

fn seeded_config(customers: u64, products: u64, transactions: u64) -> GenerateConfig {
    GenerateConfig {
        customers,
        products,
        transactions,
        seed: Some(42),
        reference_date: NaiveDate::from_ymd_opt(2024, 6, 30),
        ..GenerateConfig::default()
    }
}

fn options(label: &str) -> GenerateOptions {
    let root = temp_out_dir(label);
    GenerateOptions {
        report_dir: Some(root.join("run")),
        staging_root: root,
    }
}

fn read_column(path: &Path, column: &str) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).expect("open csv");
    let position = reader
        .headers()
        .expect("headers")
        .iter()
        .position(|name| name == column)
        .unwrap_or_else(|| panic!("missing column {column}"));
    reader
        .records()
        .map(|record| record.expect("record")[position].to_string())
        .collect()
}

#[test]
fn generate_is_deterministic() {
    let config = seeded_config(50, 20, 120);
    let a = GenerationEngine::new(&config, options("det_a"))
        .run()
        .expect("run A");
    let b = GenerationEngine::new(&config, options("det_b"))
        .run()
        .expect("run B");

    assert_eq!(a.files.len(), 3);
    for (file_a, file_b) in a.files.iter().zip(b.files.iter()) {
        let bytes_a = fs::read(file_a).expect("read A");
        let bytes_b = fs::read(file_b).expect("read B");
        assert_eq!(bytes_a, bytes_b, "{} should be deterministic", file_a.display());
    }
    assert_eq!(a.report.seed, 42);
}

#[test]
fn generate_respects_row_counts() {
    let config = seeded_config(100, 50, 200);
    let options = options("rows");
    let staging = StagingPaths::new(&options.staging_root);
    let result = GenerationEngine::new(&config, options).run().expect("run");

    assert_eq!(read_column(&staging.entity_file(&CUSTOMERS), "customer_id").len(), 100);
    assert_eq!(read_column(&staging.entity_file(&PRODUCTS), "product_id").len(), 50);
    assert_eq!(
        read_column(&staging.entity_file(&TRANSACTIONS), "transaction_id").len(),
        200
    );

    let report_path = result.report_path.expect("report path");
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_path).expect("read report"))
            .expect("parse report");
    let tables = report
        .get("tables")
        .and_then(|value| value.as_array())
        .expect("tables array");
    let transactions = tables
        .iter()
        .find(|table| table.get("entity") == Some(&serde_json::json!("transactions")))
        .expect("transactions report");
    assert_eq!(
        transactions.get("rows_generated").and_then(|v| v.as_u64()),
        Some(200)
    );
    assert_eq!(report.get("seed").and_then(|v| v.as_u64()), Some(42));
}

#[test]
fn transactions_reference_generated_parents() {
    let config = seeded_config(30, 10, 500);
    let options = options("fk");
    let staging = StagingPaths::new(&options.staging_root);
    GenerationEngine::new(&config, options).run().expect("run");

    let customers: HashSet<String> = read_column(&staging.entity_file(&CUSTOMERS), "customer_id")
        .into_iter()
        .collect();
    let products: HashSet<String> = read_column(&staging.entity_file(&PRODUCTS), "product_id")
        .into_iter()
        .collect();
    let transactions = staging.entity_file(&TRANSACTIONS);

    let dangling_customers = read_column(&transactions, "customer_id")
        .into_iter()
        .filter(|id| !customers.contains(id))
        .count();
    let dangling_products = read_column(&transactions, "product_id")
        .into_iter()
        .filter(|id| !products.contains(id))
        .count();
    assert_eq!(dangling_customers, 0);
    assert_eq!(dangling_products, 0);
}

#[test]
fn segment_proportions_follow_weights() {
    let config = seeded_config(5000, 0, 0);
    let engine = GenerationEngine::new(&config, GenerateOptions::default());
    let data = engine
        .generate(engine.resolve_seed(), engine.reference_date())
        .expect("generate");

    let total: f64 = config.segment_weights.values().sum();
    for segment in Segment::ALL {
        let observed = data
            .customers
            .iter()
            .filter(|customer| customer.segment == segment)
            .count() as f64
            / data.customers.len() as f64;
        let expected = config.segment_weights[&segment] / total;
        assert!(
            (observed - expected).abs() <= 0.03,
            "{segment}: observed {observed:.3}, expected {expected:.3}"
        );
    }
}

#[test]
fn zero_counts_stage_header_only_files() {
    let config = seeded_config(0, 0, 0);
    let options = options("empty");
    let staging = StagingPaths::new(&options.staging_root);
    let result = GenerationEngine::new(&config, options).run().expect("run");

    assert_eq!(result.files.len(), 3);
    let content = fs::read_to_string(staging.entity_file(&CUSTOMERS)).expect("read");
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn unwritable_output_is_an_io_error() {
    let blocker = temp_out_dir("blocked").join("file");
    fs::write(&blocker, b"not a directory").expect("write blocker");
    let config = seeded_config(1, 1, 1);
    let options = GenerateOptions {
        staging_root: blocker,
        report_dir: None,
    };
    let err = GenerationEngine::new(&config, options)
        .run()
        .expect_err("staging root is a file");
    assert!(matches!(err, GenerationError::Io(_)));
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "storeforge_generate_{label}_{}",
        uuid::Uuid::new_v4()
    ));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

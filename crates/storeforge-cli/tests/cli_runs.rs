use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, ensure};

fn temp_root(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("storeforge_cli_{label}_{}", uuid::Uuid::new_v4()))
}

fn run(binary: &str, args: &[&str]) -> Result<Output> {
    Command::new(binary)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .with_context(|| format!("running {binary}"))
}

fn generate(output_dir: &Path, run_dir: &Path) -> Result<Output> {
    run(
        env!("CARGO_BIN_EXE_storeforge-generate"),
        &[
            "--customers",
            "20",
            "--products",
            "10",
            "--transactions",
            "40",
            "--seed",
            "42",
            "--skip-enrich",
            "--output-dir",
            &output_dir.display().to_string(),
            "--run-dir",
            &run_dir.display().to_string(),
        ],
    )
}

fn single_run_dir(run_dir: &Path, kind: &str) -> Result<PathBuf> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(run_dir)? {
        let path = entry?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        if name.contains(&format!("__{kind}_")) {
            dirs.push(path);
        }
    }
    ensure!(dirs.len() == 1, "expected one {kind} run, found {}", dirs.len());
    Ok(dirs.remove(0))
}

#[test]
fn generate_then_load_into_sqlite() -> Result<()> {
    let root = temp_root("pipeline");
    let output_dir = root.join("data");
    let run_dir = root.join("runs");

    let generated = generate(&output_dir, &run_dir)?;
    ensure!(
        generated.status.success(),
        "generate failed: {}",
        String::from_utf8_lossy(&generated.stderr)
    );
    let stdout = String::from_utf8_lossy(&generated.stdout);
    assert!(stdout.contains("seed 42"));
    assert!(output_dir.join("raw/internal/transactions.csv").exists());
    assert!(output_dir.join("pipeline_summary.json").exists());

    let generate_run = single_run_dir(&run_dir, "generate")?;
    assert!(generate_run.join("config.json").exists());
    assert!(generate_run.join("logs.ndjson").exists());
    assert!(generate_run.join("generation_report.json").exists());

    let database_url = format!("sqlite://{}", root.join("warehouse.db").display());
    let loaded = run(
        env!("CARGO_BIN_EXE_storeforge-load"),
        &[
            "--database-url",
            &database_url,
            "--input-dir",
            &output_dir.display().to_string(),
            "--run-dir",
            &run_dir.display().to_string(),
            "--strict",
        ],
    )?;
    ensure!(
        loaded.status.success(),
        "load failed: {}",
        String::from_utf8_lossy(&loaded.stderr)
    );
    let stdout = String::from_utf8_lossy(&loaded.stdout);
    assert!(stdout.contains("load into sqlite"));

    let load_run = single_run_dir(&run_dir, "load")?;
    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(load_run.join("load_report.json"))?)?;
    assert_eq!(report["table_counts"]["transactions"], 40);
    Ok(())
}

#[test]
fn strict_load_fails_on_rejected_rows() -> Result<()> {
    let root = temp_root("strict");
    let output_dir = root.join("data");
    let run_dir = root.join("runs");
    let generated = generate(&output_dir, &run_dir)?;
    ensure!(generated.status.success(), "generate failed");

    // Orphan every transaction by emptying the customer file.
    let customers = output_dir.join("raw/internal/customers.csv");
    let header = fs::read_to_string(&customers)?
        .lines()
        .next()
        .map(|line| format!("{line}\n"))
        .context("customers header")?;
    fs::write(&customers, header)?;

    let database_url = format!("sqlite://{}", root.join("warehouse.db").display());
    let input_dir = output_dir.display().to_string();
    let run_dir = run_dir.display().to_string();
    let args = [
        "--database-url",
        database_url.as_str(),
        "--input-dir",
        input_dir.as_str(),
        "--run-dir",
        run_dir.as_str(),
    ];
    let lenient = run(env!("CARGO_BIN_EXE_storeforge-load"), &args)?;
    assert!(lenient.status.success());

    let mut strict_args = args.to_vec();
    strict_args.push("--strict");
    let strict = run(env!("CARGO_BIN_EXE_storeforge-load"), &strict_args)?;
    assert!(!strict.status.success());
    Ok(())
}

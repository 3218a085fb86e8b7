use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use storeforge_cli::CliError;
use storeforge_cli::registry::{RunContext, RunKind, init_run_logging, start_run, write_json};
use storeforge_cli::summary::{PIPELINE_SUMMARY_FILE, PipelineSummary};
use storeforge_core::{PipelineConfig, StagingPaths};
use storeforge_enrich::Enricher;
use storeforge_generate::{GenerateOptions, GenerationEngine};

#[derive(Parser, Debug)]
#[command(
    name = "storeforge-generate",
    version,
    about = "Generate synthetic e-commerce data and fetch external datasets"
)]
struct Args {
    /// Path to a TOML config file (defaults to ./storeforge.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of customers to generate.
    #[arg(long)]
    customers: Option<u64>,
    /// Number of products to generate.
    #[arg(long)]
    products: Option<u64>,
    /// Number of transactions to generate.
    #[arg(long)]
    transactions: Option<u64>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Root of the staging tree.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Only generate; do not contact external sources.
    #[arg(long, default_value_t = false)]
    skip_enrich: bool,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(customers) = self.customers {
            config.generate.customers = customers;
        }
        if let Some(products) = self.products {
            config.generate.products = products;
        }
        if let Some(transactions) = self.transactions {
            config.generate.transactions = transactions;
        }
        if let Some(seed) = self.seed {
            config.generate.seed = Some(seed);
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir = dir.clone();
        }
        if let Some(dir) = &self.run_dir {
            config.paths.run_dir = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = Args::parse();

    let mut config = PipelineConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let run_ctx = RunContext::new(RunKind::Generate, &config);
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path, &config.logging.level)?;

    tracing::info!(event = "run_started", run_id = %run_ctx.run_id, kind = "generate");
    let timer = Instant::now();

    let generation = GenerationEngine::new(
        &config.generate,
        GenerateOptions {
            staging_root: config.paths.output_dir.clone(),
            report_dir: Some(run_paths.root.clone()),
        },
    )
    .run()?;
    tracing::info!(
        event = "generation_finished",
        seed = generation.report.seed,
        files = generation.files.len()
    );

    let enrichment = if args.skip_enrich {
        tracing::info!(event = "enrichment_skipped");
        None
    } else {
        let staging = StagingPaths::new(&config.paths.output_dir);
        let report = Enricher::new(&config.enrich).run(&staging.raw_external()).await?;
        write_json(&run_paths.artifact("enrich_report.json"), &report)?;
        tracing::info!(
            event = "enrichment_finished",
            records = report.records_written(),
            failed_sources = report.failed()
        );
        Some(report)
    };

    let duration_ms = timer.elapsed().as_millis() as u64;
    let summary = PipelineSummary::new(
        &run_ctx.run_id,
        &generation.report,
        enrichment.as_ref(),
        duration_ms,
    );
    write_json(&config.paths.output_dir.join(PIPELINE_SUMMARY_FILE), &summary)?;
    write_json(&run_paths.artifact(PIPELINE_SUMMARY_FILE), &summary)?;
    print!("{}", summary.render());

    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

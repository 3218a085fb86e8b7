use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use storeforge_cli::CliError;
use storeforge_cli::registry::{RunContext, RunKind, init_run_logging, start_run};
use storeforge_cli::summary::render_load;
use storeforge_core::{ConflictPolicy, PipelineConfig, StagingPaths, redact_connection_string};
use storeforge_load::{LoadOptions, Loader, connect};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnConflict {
    Skip,
    Upsert,
}

impl From<OnConflict> for ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Skip => ConflictPolicy::Skip,
            OnConflict::Upsert => ConflictPolicy::Upsert,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "storeforge-load",
    version,
    about = "Load staged files into the warehouse"
)]
struct Args {
    /// Path to a TOML config file (defaults to ./storeforge.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Database connection string; overrides the --db-* flags.
    #[arg(long, value_name = "CONNECTION_STRING")]
    database_url: Option<String>,
    #[arg(long, conflicts_with = "database_url")]
    db_host: Option<String>,
    #[arg(long, conflicts_with = "database_url")]
    db_port: Option<u16>,
    #[arg(long, conflicts_with = "database_url")]
    db_name: Option<String>,
    #[arg(long, conflicts_with = "database_url")]
    db_user: Option<String>,
    /// Root of the staging tree to load from.
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// What to do with rows whose primary key is already stored.
    #[arg(long, value_enum)]
    on_conflict: Option<OnConflict>,
    /// Rows per insert statement.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Exit non-zero when any file fails or any row is rejected.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        let individual = self.db_host.is_some()
            || self.db_port.is_some()
            || self.db_name.is_some()
            || self.db_user.is_some();
        if individual {
            // Explicit parts win over a URL picked up from file or environment.
            config.database.url = None;
        }
        if let Some(host) = &self.db_host {
            config.database.host = host.clone();
        }
        if let Some(port) = self.db_port {
            config.database.port = port;
        }
        if let Some(name) = &self.db_name {
            config.database.name = name.clone();
        }
        if let Some(user) = &self.db_user {
            config.database.user = user.clone();
        }
        if let Some(dir) = &self.input_dir {
            config.paths.output_dir = dir.clone();
        }
        if let Some(policy) = self.on_conflict {
            config.load.on_conflict = policy.into();
        }
        if let Some(batch_size) = self.batch_size {
            config.load.batch_size = batch_size;
        }
        if self.strict {
            config.load.strict = true;
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

    let url = config.database.connection_url();
    let connection = redact_connection_string(&url);
    let mut run_ctx = RunContext::new(RunKind::Load, &config);
    run_ctx.connection = Some(connection.clone());
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path, &config.logging.level)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_ctx.run_id,
        kind = "load",
        connection = %connection.redacted
    );
    let timer = Instant::now();

    let warehouse = match connect(&url).await {
        Ok(warehouse) => warehouse,
        Err(err) => {
            tracing::error!(event = "connection_failed", error = %err);
            return Err(err.into());
        }
    };
    tracing::info!(event = "engine_detected", engine = warehouse.engine());

    let options = LoadOptions {
        report_dir: Some(run_paths.root.clone()),
        ..LoadOptions::from_config(&config.load)
    };
    let staging = StagingPaths::new(&config.paths.output_dir);
    let report = Loader::new(warehouse.as_ref(), options).run(&staging).await?;
    print!("{}", render_load(&report));

    let duration_ms = timer.elapsed().as_millis();
    if !report.is_success(config.load.strict) {
        tracing::warn!(
            event = "run_finished",
            status = "failed",
            failed_files = report.failed_files(),
            rejected_rows = report.rejected_rows(),
            duration_ms = duration_ms
        );
        return Err(CliError::Strict(format!(
            "{} failed file(s), {} rejected row(s)",
            report.failed_files(),
            report.rejected_rows()
        )));
    }

    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

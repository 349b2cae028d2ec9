mod config;
mod dry_run;
mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use config::{ConfigError, SyncConfig, load_config};
use dry_run::DryRunExecutor;
use registry::{RunContext, RunOptions, init_run_logging, init_stderr_logging, start_run, write_report};
use schemerge_core::{
    AppliedStatement, DdlApplier, DiffResult, Error as CoreError, MergeMode, MergeReport,
    SNAPSHOT_VERSION, SchemaExecutor, TableDiffResult, redact_connection_string,
};
use schemerge_introspect::{IntrospectOptions, MySqlExecutor, load_schema};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemerge", version, about = "Compare and synchronize MySQL schemas")]
struct Cli {
    /// Path to the TOML config file (default: ./schemerge.toml if present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the structure of one database.
    Show(ShowArgs),
    /// Diff two databases without changing either.
    Compare(CompareArgs),
    /// Merge the mirror database into the base database.
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Database connection string; defaults to the configured base.
    #[arg(long, value_name = "CONNECTION_STRING", env = "SCHEMERGE_BASE_URL")]
    conn: Option<String>,
    /// Print the full snapshot instead of the structure summary.
    #[arg(long, default_value_t = false)]
    full: bool,
    #[command(flatten)]
    load: LoadArgs,
}

#[derive(Args, Debug)]
struct EndpointArgs {
    /// Base database (the one merged into).
    #[arg(long, value_name = "CONNECTION_STRING", env = "SCHEMERGE_BASE_URL")]
    base: Option<String>,
    /// Mirror database (the one merged from).
    #[arg(long, value_name = "CONNECTION_STRING", env = "SCHEMERGE_MIRROR_URL")]
    mirror: Option<String>,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Table to leave out of the snapshot (repeatable).
    #[arg(long = "exclude-table", value_name = "TABLE")]
    exclude_tables: Vec<String>,
    /// Load tables whose foreign keys cannot be scanned without relations.
    #[arg(long, default_value_t = false)]
    skip_unparsed_relations: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[command(flatten)]
    endpoints: EndpointArgs,
    #[command(flatten)]
    load: LoadArgs,
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[command(flatten)]
    endpoints: EndpointArgs,
    #[command(flatten)]
    load: LoadArgs,
    /// Drop from the base what the mirror lacks instead of copying it across.
    #[arg(long, default_value_t = false)]
    one_way: bool,
    /// Record the DDL without executing it.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Serialize)]
struct CompareReport {
    tables: DiffResult,
    /// Column diffs of the updated tables.
    columns: BTreeMap<String, TableDiffResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Serialize)]
struct MergeRunReport {
    run_id: String,
    status: RunStatus,
    mode: MergeMode,
    dry_run: bool,
    report: Option<MergeReport>,
    error: Option<String>,
    /// Statements applied before a failure.
    applied: Vec<AppliedStatement>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Show(args) => run_show(args, &config).await,
        Command::Compare(args) => run_compare(args, &config).await,
        Command::Merge(args) => run_merge(args, &config).await,
    }
}

async fn run_show(args: ShowArgs, config: &SyncConfig) -> Result<(), CliError> {
    init_stderr_logging()?;

    let conn = args
        .conn
        .or_else(|| config.base_url().map(str::to_string))
        .ok_or_else(|| CliError::InvalidConfig("connection string is required".to_string()))?;
    detect_engine(&conn)?;

    let executor = MySqlExecutor::connect(&conn, &config.pool.connect_options()).await?;
    let schema = load_schema(&executor, &introspect_options(&args.load, config)).await?;

    let output = if args.full {
        serde_json::to_string_pretty(&schema)?
    } else {
        serde_json::to_string_pretty(&schema.summary())?
    };
    println!("{output}");
    Ok(())
}

async fn run_compare(args: CompareArgs, config: &SyncConfig) -> Result<(), CliError> {
    let (base_url, mirror_url) = resolve_endpoints(&args.endpoints, config)?;
    let engine = detect_engine(&base_url)?;
    detect_engine(&mirror_url)?;

    let options = RunOptions {
        mode: config.merge.mode,
        dry_run: true,
        exclude_tables: excluded_tables(&args.load, config),
        skip_unparsed_relations: args.load.skip_unparsed_relations,
    };
    let run_ctx = run_context("compare", engine, &args.endpoints, config, options, &base_url, &mirror_url);
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_ctx.run_id,
        command = "compare",
        engine = %engine,
        run_dir = %run_paths.root.display()
    );
    let timer = Instant::now();

    let connect = config.pool.connect_options();
    let base_exec = MySqlExecutor::connect(&base_url, &connect).await?;
    let mirror_exec = MySqlExecutor::connect(&mirror_url, &connect).await?;

    let load = introspect_options(&args.load, config);
    let base = load_schema(&base_exec, &load).await?;
    let mirror = load_schema(&mirror_exec, &load).await?;

    let tables = base.compare(&mirror);
    let columns = tables
        .updated
        .iter()
        .filter_map(|name| {
            let base_table = base.table(name)?;
            let mirror_table = mirror.table(name)?;
            Some((name.clone(), base_table.compare(mirror_table)))
        })
        .collect();
    let report = CompareReport { tables, columns };

    tracing::info!(
        event = "diff_computed",
        added = report.tables.added.len(),
        updated = report.tables.updated.len(),
        removed = report.tables.removed.len()
    );

    write_report(&run_paths, &report)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis()
    );
    Ok(())
}

async fn run_merge(args: MergeArgs, config: &SyncConfig) -> Result<(), CliError> {
    let (base_url, mirror_url) = resolve_endpoints(&args.endpoints, config)?;
    let engine = detect_engine(&base_url)?;
    detect_engine(&mirror_url)?;

    let mode = if args.one_way {
        MergeMode::OneWay
    } else {
        config.merge.mode
    };
    let options = RunOptions {
        mode,
        dry_run: args.dry_run,
        exclude_tables: excluded_tables(&args.load, config),
        skip_unparsed_relations: args.load.skip_unparsed_relations,
    };
    let run_ctx = run_context("merge", engine, &args.endpoints, config, options, &base_url, &mirror_url);
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_ctx.run_id,
        command = "merge",
        engine = %engine,
        run_dir = %run_paths.root.display(),
        mode = ?mode,
        dry_run = args.dry_run
    );
    let timer = Instant::now();

    let connect = config.pool.connect_options();
    let base_live = MySqlExecutor::connect(&base_url, &connect).await?;
    let mirror_live = MySqlExecutor::connect(&mirror_url, &connect).await?;

    let base_dry = DryRunExecutor::new(&base_live);
    let mirror_dry = DryRunExecutor::new(&mirror_live);
    let (base_exec, mirror_exec): (&dyn SchemaExecutor, &dyn SchemaExecutor) = if args.dry_run {
        (&base_dry, &mirror_dry)
    } else {
        (&base_live, &mirror_live)
    };

    let load = introspect_options(&args.load, config);
    let mut base = load_schema(base_exec, &load).await?;
    let mut mirror = load_schema(mirror_exec, &load).await?;

    let mut ddl = DdlApplier::new(base_exec, mirror_exec);
    let outcome = base.merge(&mut mirror, &mut ddl, mode).await;

    if args.dry_run {
        tracing::info!(
            event = "dry_run_planned",
            base = base_dry.planned().len(),
            mirror = mirror_dry.planned().len()
        );
    }

    let mut run_report = MergeRunReport {
        run_id: run_ctx.run_id.clone(),
        status: RunStatus::Success,
        mode,
        dry_run: args.dry_run,
        report: None,
        error: None,
        applied: Vec::new(),
    };

    let result = match outcome {
        Ok(report) => {
            run_report.report = Some(report);
            Ok(())
        }
        Err(err) => {
            if let CoreError::Ddl { applied, .. } = &err {
                run_report.applied = applied.clone();
            }
            run_report.status = RunStatus::Failed;
            run_report.error = Some(err.to_string());
            Err(CliError::from(err))
        }
    };

    write_report(&run_paths, &run_report)?;
    println!("{}", serde_json::to_string_pretty(&run_report)?);

    match &result {
        Ok(()) => tracing::info!(
            event = "run_finished",
            status = "success",
            statements = ddl.ledger().len(),
            duration_ms = timer.elapsed().as_millis()
        ),
        Err(err) => tracing::error!(
            event = "run_finished",
            status = "failed",
            statements = run_report.applied.len(),
            error = %err,
            duration_ms = timer.elapsed().as_millis()
        ),
    }
    result
}

fn resolve_endpoints(
    endpoints: &EndpointArgs,
    config: &SyncConfig,
) -> Result<(String, String), CliError> {
    let base = endpoints
        .base
        .clone()
        .or_else(|| config.base_url().map(str::to_string))
        .ok_or_else(|| CliError::InvalidConfig("base connection string is required".to_string()))?;
    let mirror = endpoints
        .mirror
        .clone()
        .or_else(|| config.mirror_url().map(str::to_string))
        .ok_or_else(|| {
            CliError::InvalidConfig("mirror connection string is required".to_string())
        })?;
    Ok((base, mirror))
}

fn excluded_tables(load: &LoadArgs, config: &SyncConfig) -> Vec<String> {
    let mut tables = config.merge.exclude_tables.clone();
    tables.extend(load.exclude_tables.iter().cloned());
    tables
}

fn introspect_options(load: &LoadArgs, config: &SyncConfig) -> IntrospectOptions {
    IntrospectOptions {
        exclude_tables: excluded_tables(load, config),
        skip_unparsed_relations: load.skip_unparsed_relations,
        ..IntrospectOptions::default()
    }
}

fn run_context(
    command: &str,
    engine: &str,
    endpoints: &EndpointArgs,
    config: &SyncConfig,
    options: RunOptions,
    base_url: &str,
    mirror_url: &str,
) -> RunContext {
    RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        engine: engine.to_string(),
        snapshot_version: SNAPSHOT_VERSION.to_string(),
        run_dir: endpoints
            .run_dir
            .clone()
            .unwrap_or_else(|| config.run_dir.clone()),
        options,
        base: redact_connection_string(base_url),
        mirror: redact_connection_string(mirror_url),
    }
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("mysql://") {
        Ok("mysql")
    } else {
        Err(CliError::UnsupportedEngine(
            redact_connection_string(conn).redacted,
        ))
    }
}

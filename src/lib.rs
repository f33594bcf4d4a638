pub mod attach;
pub mod cli;
pub mod coerce;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod store;
pub mod table;

use std::{env, fs, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, ColumnsArgs, Commands, ImportArgs},
    pipeline::PipelineRegistry,
    reconcile::ImportOptions,
    schema::{MemoryCatalog, TableSchema},
    store::MemoryStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_reconcile", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => handle_import(&args),
        Commands::Columns(args) => handle_columns(&args),
    }
}

fn handle_import(args: &ImportArgs) -> Result<()> {
    let schema = TableSchema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    let csv_text = fs::read_to_string(&args.input)
        .with_context(|| format!("Reading CSV input {:?}", args.input))?;

    if args.pipeline.is_empty() {
        info!("Importing '{}' into '{}'", args.input.display(), schema.name);
    } else {
        info!(
            "Importing '{}' into '{}' with pipeline [{}]",
            args.input.display(),
            schema.name,
            args.pipeline.iter().join(", ")
        );
    }

    let registry = PipelineRegistry::with_builtins();
    let options = ImportOptions {
        pipeline: args.pipeline.clone(),
        max_errors: args.max_errors,
    };
    let mut store = MemoryStore::new();
    let catalog = MemoryCatalog::new();
    let report = reconcile::import(&csv_text, &schema, &registry, &options, &mut store, &catalog)?;

    if report.is_clean() {
        info!(
            "Import is clean: {} created, {} updated",
            report.created, report.updated
        );
        return Ok(());
    }

    for entry in &report.errors {
        println!(
            "row {}: {}",
            entry.row_id.as_deref().unwrap_or("?"),
            entry.message
        );
    }
    if report.suppressed_errors > 0 {
        println!("...and {} more error(s) suppressed", report.suppressed_errors);
    }
    bail!(
        "{} of {} row(s) failed to import",
        report.total_errors(),
        report.created + report.updated + report.total_errors()
    );
}

fn handle_columns(args: &ColumnsArgs) -> Result<()> {
    let schema = TableSchema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    if schema.columns.is_empty() {
        info!("Schema {:?} does not define any columns", args.schema);
        return Ok(());
    }

    let rows = schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.name.clone(),
                column
                    .datatype
                    .map(|ty| ty.to_string())
                    .unwrap_or_default(),
                schema
                    .header_for_field(&column.name)
                    .unwrap_or_default()
                    .to_string(),
            ]
        })
        .collect::<Vec<_>>();

    let headers = vec![
        "#".to_string(),
        "name".to_string(),
        "type".to_string(),
        "csv header".to_string(),
    ];
    table::print_table(&headers, &rows);
    info!(
        "Listed {} column(s) from {:?}",
        schema.columns.len(),
        args.schema
    );
    Ok(())
}

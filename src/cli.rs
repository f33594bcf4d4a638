use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Reconcile CSV exports into typed record stores", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dry-run an import of a CSV file against a schema and report row errors
    Import(ImportArgs),
    /// List the columns a schema declares
    Columns(ColumnsArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input CSV file to import
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Schema YAML file describing the target entity
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Pipeline step to run on each row; repeatable, applied in order
    #[arg(long = "pipeline", action = clap::ArgAction::Append)]
    pub pipeline: Vec<String>,
    /// Cap the number of reported row errors (the rest are summarized)
    #[arg(long = "max-errors")]
    pub max_errors: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Schema YAML file to list
    #[arg(short, long)]
    pub schema: PathBuf,
}

use thiserror::Error;

/// Faults that abort an entire import run.
///
/// Per-row data problems are never represented here; those are collected as
/// [`crate::reconcile::ErrorEntry`] values and returned with the report.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to parse CSV input: {0}")]
    Csv(#[from] csv::Error),
    /// A configured pipeline step name did not resolve in the registry.
    /// This indicates a misconfigured run, not bad data, so it is fatal.
    #[error("unknown pipeline step '{0}'")]
    UnknownPipelineStep(String),
}

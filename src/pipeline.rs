//! Per-row transformation pipeline.
//!
//! Steps are externally configured by name and resolved against a
//! [`PipelineRegistry`] at run start; an unknown name is a configuration
//! fault for the whole run, not a per-row error. Each resolved step runs
//! once per row, in configured order, and may add, remove, or alter fields.

use std::collections::BTreeMap;

use crate::{error::ImportError, normalize::Row, schema::ColumnSpec};

/// One externally supplied row transformation.
pub trait PipelineStep {
    fn run(&self, row: &mut Row, columns: &[ColumnSpec]);
}

impl std::fmt::Debug for dyn PipelineStep + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PipelineStep")
    }
}

/// Name-to-step registry populated at process start.
#[derive(Default)]
pub struct PipelineRegistry {
    steps: BTreeMap<String, Box<dyn PipelineStep>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in steps.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("trim", TrimWhitespace);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, step: impl PipelineStep + 'static) {
        self.steps.insert(name.into(), Box::new(step));
    }

    /// Resolves configured step names, in order. Fails on the first unknown
    /// name.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<&dyn PipelineStep>, ImportError> {
        names
            .iter()
            .map(|name| {
                self.steps
                    .get(name)
                    .map(Box::as_ref)
                    .ok_or_else(|| ImportError::UnknownPipelineStep(name.clone()))
            })
            .collect()
    }
}

/// Built-in step: trims leading/trailing whitespace from every present value.
pub struct TrimWhitespace;

impl PipelineStep for TrimWhitespace {
    fn run(&self, row: &mut Row, _columns: &[ColumnSpec]) {
        for value in row.values_mut() {
            if let Some(text) = value.as_mut()
                && text.trim().len() != text.len()
            {
                *text = text.trim().to_string();
            }
        }
    }
}

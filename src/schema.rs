//! Table schema model: column descriptors, declared types, header
//! translation, source kinds, and YAML persistence.
//!
//! A [`TableSchema`] describes one dynamically typed entity: its ordered
//! column descriptors (each with an optional declared [`FieldType`]), a
//! translation map from CSV headers to field names, and a [`SourceKind`]
//! flag that decides whether row identity must be synthesized.
//!
//! The schema is read-only input to the import core; the [`SchemaCatalog`]
//! trait is the lookup seam the metadata attacher uses to discover
//! companion schemas.

use std::{collections::BTreeMap, fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Logical type a column may declare. Columns without one pass values
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    DateTime,
    Date,
    Number,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
            FieldType::Number => "number",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["datetime", "date", "number"]
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "datetime" | "date-time" | "timestamp" => Ok(FieldType::DateTime),
            "date" => Ok(FieldType::Date),
            "number" | "numeric" => Ok(FieldType::Number),
            _ => Err(anyhow!(
                "Unknown field type '{value}'. Supported types: {}",
                FieldType::variants().join(", ")
            )),
        }
    }
}

/// One column descriptor: field identifier plus optional declared type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<FieldType>,
}

/// Where the rows come from. File- and URL-backed sources carry no stable
/// natural key, so the normalizer synthesizes a positional `id` for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    CsvFile,
    CsvUrl,
    /// The source already guarantees stable row identity via an `id` column.
    Native,
}

impl SourceKind {
    pub fn needs_synthetic_id(&self) -> bool {
        matches!(self, SourceKind::CsvFile | SourceKind::CsvUrl)
    }
}

/// Schema description for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Entity name; records imported through this schema belong to it.
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// Translation from CSV header to schema field name. Headers without an
    /// entry pass through unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub header_map: BTreeMap<String, String>,
    #[serde(default)]
    pub source: SourceKind,
}

impl TableSchema {
    /// Translates a CSV header into its schema field name.
    pub fn field_for_header<'a>(&'a self, header: &'a str) -> &'a str {
        self.header_map
            .get(header)
            .map(String::as_str)
            .unwrap_or(header)
    }

    /// Reverse of [`Self::field_for_header`]: the CSV header a field is read
    /// from, when a translation exists.
    pub fn header_for_field(&self, field: &str) -> Option<&str> {
        self.header_map
            .iter()
            .find(|(_, mapped)| mapped.as_str() == field)
            .map(|(header, _)| header.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema = serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }
}

/// Lookup seam for schema descriptions by name.
///
/// `Ok(None)` means "no such schema is defined", which callers treat as an
/// expected condition; `Err` means the backing catalog itself failed.
pub trait SchemaCatalog {
    fn lookup(&self, name: &str) -> Result<Option<TableSchema>, StoreError>;
}

/// Map-backed catalog used by tests and the CLI dry run.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    schemas: BTreeMap<String, TableSchema>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: TableSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }
}

impl SchemaCatalog for MemoryCatalog {
    fn lookup(&self, name: &str) -> Result<Option<TableSchema>, StoreError> {
        Ok(self.schemas.get(name).cloned())
    }
}

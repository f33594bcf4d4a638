//! Tabular normalization: raw CSV text plus a schema in, normalized rows out.
//!
//! Each output [`Row`] maps schema field names to normalized values. Rows
//! keep exact CSV order; the synthesized positional identity depends on it.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    coerce::coerce,
    error::ImportError,
    schema::{FieldType, TableSchema},
};

/// Normalized row: field name to value, `None` marking absence.
pub type Row = BTreeMap<String, Option<String>>;

/// The identity field every normalized row carries.
pub const ID_FIELD: &str = "id";

/// Parses comma-delimited CSV text (header row required) into normalized
/// rows.
///
/// Headers run through the schema's translation map after an `id` column is
/// synthesized for file/URL-backed sources. Cells under a schema column with
/// a declared type are coerced; everything else passes through raw, so extra
/// CSV columns stay visible to pipeline steps. Schema columns missing from
/// the input are skipped, which permits schemas describing future or
/// optional columns.
pub fn normalize(csv_text: &str, schema: &TableSchema) -> Result<Vec<Row>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_text.as_bytes());

    let synthesize_id = schema.source.needs_synthetic_id();
    let mut headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if synthesize_id {
        headers.insert(0, ID_FIELD.to_string());
    }
    for header in &mut headers {
        let mapped = schema.field_for_header(header);
        if mapped != header {
            *header = mapped.to_string();
        }
    }

    let typed_columns = resolve_typed_columns(schema, &headers);

    let mut rows = Vec::new();
    for (row_ix, record) in reader.records().enumerate() {
        let record = record?;
        let mut row = Row::new();
        if synthesize_id {
            // 1-based position, stable for the lifetime of this run.
            row.insert(ID_FIELD.to_string(), Some((row_ix + 1).to_string()));
        }
        let offset = usize::from(synthesize_id);
        for (cell_ix, raw) in record.iter().enumerate() {
            let Some(field) = headers.get(cell_ix + offset) else {
                continue;
            };
            let value = match typed_columns
                .iter()
                .find(|(typed_ix, _)| *typed_ix == cell_ix + offset)
            {
                Some((_, ty)) => coerce(raw, *ty),
                None => Some(raw.to_string()),
            };
            row.insert(field.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Resolves each declared-typed schema column to its index in the mapped
/// header row. Unresolved columns are skipped silently.
fn resolve_typed_columns(schema: &TableSchema, headers: &[String]) -> Vec<(usize, FieldType)> {
    let mut typed = Vec::new();
    for column in &schema.columns {
        let Some(ty) = column.datatype else {
            continue;
        };
        match headers.iter().position(|header| *header == column.name) {
            Some(ix) => typed.push((ix, ty)),
            None => debug!(
                "Typed column '{}' not present in input headers; skipping",
                column.name
            ),
        }
    }
    typed
}

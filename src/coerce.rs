//! Cell-level type coercion.
//!
//! Converts a raw CSV cell into the normalized string representation of its
//! declared [`FieldType`]. Pure except for the non-fatal diagnostics logged
//! on parse failure: a temporal cell that cannot be parsed becomes `None`
//! rather than failing the row.

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;

use crate::schema::FieldType;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
];

pub fn parse_loose_date(value: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    // Datetime inputs in date columns keep their date part.
    parse_strict_datetime(value).map(|dt| dt.date())
}

fn parse_strict_datetime(value: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    None
}

pub fn parse_loose_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Some(parsed) = parse_strict_datetime(value) {
        return Some(parsed);
    }
    // Date-only inputs in datetime columns are read as midnight.
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Normalizes a raw cell for its declared type.
///
/// Datetime and date cells render as `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`;
/// empty or unparseable input yields `None`. Number cells have literal `$`
/// and `,` characters stripped with no empty-string short-circuit, since
/// decimal parsing is deferred to the storage layer.
pub fn coerce(raw: &str, ty: FieldType) -> Option<String> {
    match ty {
        FieldType::DateTime => {
            if raw.trim().is_empty() {
                return None;
            }
            match parse_loose_datetime(raw.trim()) {
                Some(parsed) => Some(parsed.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => {
                    warn!("Failed to parse '{raw}' as datetime; storing null");
                    None
                }
            }
        }
        FieldType::Date => {
            if raw.trim().is_empty() {
                return None;
            }
            match parse_loose_date(raw.trim()) {
                Some(parsed) => Some(parsed.format("%Y-%m-%d").to_string()),
                None => {
                    warn!("Failed to parse '{raw}' as date; storing null");
                    None
                }
            }
        }
        FieldType::Number => Some(raw.replace(['$', ','], "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_coercion_normalizes_supported_formats() {
        assert_eq!(
            coerce("2019-08-30 23:05:11", FieldType::DateTime).unwrap(),
            "2019-08-30 23:05:11"
        );
        assert_eq!(
            coerce("2019-08-30T23:05:11", FieldType::DateTime).unwrap(),
            "2019-08-30 23:05:11"
        );
        assert_eq!(
            coerce("08/30/2019 23:05:11", FieldType::DateTime).unwrap(),
            "2019-08-30 23:05:11"
        );
    }

    #[test]
    fn datetime_coercion_accepts_date_only_input_at_midnight() {
        assert_eq!(
            coerce("2019-08-30", FieldType::DateTime).unwrap(),
            "2019-08-30 00:00:00"
        );
    }

    #[test]
    fn datetime_coercion_is_null_on_failure_and_empty_input() {
        assert_eq!(coerce("not a date", FieldType::DateTime), None);
        assert_eq!(coerce("", FieldType::DateTime), None);
        assert_eq!(coerce("   ", FieldType::DateTime), None);
    }

    #[test]
    fn date_coercion_normalizes_and_truncates_datetimes() {
        assert_eq!(coerce("08/30/2019", FieldType::Date).unwrap(), "2019-08-30");
        assert_eq!(
            coerce("2019-08-30 23:05:11", FieldType::Date).unwrap(),
            "2019-08-30"
        );
        assert_eq!(coerce("yesterday", FieldType::Date), None);
    }

    #[test]
    fn number_coercion_strips_currency_punctuation_only() {
        assert_eq!(coerce("$1,234.50", FieldType::Number).unwrap(), "1234.50");
        assert_eq!(coerce("$250", FieldType::Number).unwrap(), "250");
        assert_eq!(coerce("-42", FieldType::Number).unwrap(), "-42");
    }

    #[test]
    fn number_coercion_passes_empty_and_junk_through() {
        // No short-circuit: the storage layer owns decimal validation.
        assert_eq!(coerce("", FieldType::Number).unwrap(), "");
        assert_eq!(coerce("n/a", FieldType::Number).unwrap(), "n/a");
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Auto-assigned row identifier (`BIGSERIAL` in PostgreSQL).
pub type Id = i64;

/// One parsed CSV data row, keyed by header name.
pub type CsvRow = HashMap<String, String>;

/// Body of every `{message}` response: client errors, server errors and
/// deletion confirmations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A required field was absent or empty.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Why a CSV row was not submitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowRejection {
    #[error("missing required field(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value '{value}' in column '{column}'")]
    Invalid { column: &'static str, value: String },
}

/// True when a string field carries a value. Empty strings count as absent.
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Collapse empty optional strings to `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Unwrap a required value, failing with `message` when it is absent.
pub fn require<T>(value: Option<T>, message: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(message))
}

/// Same as [`require`] for strings, where the empty string is also absent.
pub fn require_text(value: Option<String>, message: &str) -> Result<String, ValidationError> {
    require(non_empty(value), message)
}

/// Parse a date sent as `YYYY-MM-DD` or as a full timestamp whose date part
/// comes first (`2024-05-01T00:00:00.000Z`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Accessors over a CSV row that apply the import coercion rules.
pub struct RowReader<'a> {
    row: &'a CsvRow,
    missing: Vec<&'static str>,
}

impl<'a> RowReader<'a> {
    pub fn new(row: &'a CsvRow) -> Self {
        Self {
            row,
            missing: Vec::new(),
        }
    }

    fn raw(&self, column: &str) -> Option<&'a str> {
        self.row
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn optional(&self, column: &str) -> Option<String> {
        self.raw(column).map(str::to_string)
    }

    pub fn required(&mut self, column: &'static str) -> Option<String> {
        let value = self.optional(column);
        if value.is_none() {
            self.missing.push(column);
        }
        value
    }

    pub fn optional_number<T: std::str::FromStr>(
        &self,
        column: &'static str,
    ) -> Result<Option<T>, RowRejection> {
        match self.raw(column) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| RowRejection::Invalid {
                column,
                value: raw.to_string(),
            }),
        }
    }

    pub fn required_number<T: std::str::FromStr>(
        &mut self,
        column: &'static str,
    ) -> Result<Option<T>, RowRejection> {
        let value = self.optional_number(column)?;
        if value.is_none() {
            self.missing.push(column);
        }
        Ok(value)
    }

    pub fn required_date(&mut self, column: &'static str) -> Result<Option<NaiveDate>, RowRejection> {
        match self.raw(column) {
            None => {
                self.missing.push(column);
                Ok(None)
            }
            Some(raw) => parse_date(raw).map(Some).ok_or_else(|| RowRejection::Invalid {
                column,
                value: raw.to_string(),
            }),
        }
    }

    /// Fail with every missing column collected so far.
    pub fn finish(self) -> Result<(), RowRejection> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(RowRejection::Missing(self.missing))
        }
    }
}

/// Serde helpers that accept numbers and dates either as JSON scalars or as
/// strings, since form inputs and CSV cells are always text.
pub mod lenient {
    use super::parse_date;
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    fn number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        match Option::<NumberOrText<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(value)) => Ok(Some(value)),
            Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(NumberOrText::Text(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid number '{}': {}", text, e))),
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        number(deserializer)
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        number(deserializer)
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        number(deserializer)
    }

    pub fn date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => parse_date(&text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date '{}'", text))),
        }
    }
}

/// Render an optional cell for CSV export.
pub fn cell<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct LooseFields {
        #[serde(default, deserialize_with = "lenient::id")]
        id: Option<Id>,
        #[serde(default, deserialize_with = "lenient::float")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "lenient::date")]
        day: Option<NaiveDate>,
    }

    #[test]
    fn test_lenient_numbers_accept_strings_and_numbers() {
        let fields: LooseFields = serde_json::from_str(r#"{"id": "7", "price": 19.5}"#).unwrap();
        assert_eq!(fields.id, Some(7));
        assert_eq!(fields.price, Some(19.5));
        assert_eq!(fields.day, None);

        let fields: LooseFields = serde_json::from_str(r#"{"id": 3, "price": "2.25", "day": ""}"#).unwrap();
        assert_eq!(fields.id, Some(3));
        assert_eq!(fields.price, Some(2.25));
        assert_eq!(fields.day, None);

        assert!(serde_json::from_str::<LooseFields>(r#"{"price": "cheap"}"#).is_err());
    }

    #[test]
    fn test_parse_date_takes_leading_date_part() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(parse_date("2024-05-01"), expected);
        assert_eq!(parse_date("2024-05-01T00:00:00.000Z"), expected);
        assert_eq!(parse_date("01/05/2024"), None);
    }

    #[test]
    fn test_row_reader_collects_all_missing_columns() {
        let row: CsvRow = [("name".to_string(), "  ".to_string())].into_iter().collect();
        let mut reader = RowReader::new(&row);
        assert_eq!(reader.required("name"), None);
        assert_eq!(reader.required_number::<f64>("price"), Ok(None));
        assert_eq!(
            reader.finish(),
            Err(RowRejection::Missing(vec!["name", "price"]))
        );
    }

    #[test]
    fn test_row_reader_rejects_bad_numbers() {
        let row: CsvRow = [("stock".to_string(), "lots".to_string())].into_iter().collect();
        let reader = RowReader::new(&row);
        let err = reader.optional_number::<i32>("stock").unwrap_err();
        assert_eq!(err.to_string(), "invalid value 'lots' in column 'stock'");
    }
}

//! CLI support for sift-ql
//!
//! Provides programmatic access to the `siftql` binary's functionality for
//! embedding in other tools: record loading, schema inference, query
//! execution, and parse-only syntax checking.

use std::fs;
use std::io::{self, Read as _};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::error::QueryError;
use crate::schema::{FieldKind, FieldValue, FlatRecord, Schema};
use crate::{Lexer, Parser, execute, output};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Query parse or evaluation error
    #[error("{0}")]
    Query(#[from] QueryError),

    /// JSON parsing error
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No record input provided
    #[error("no input provided; use --data or pipe a JSON array to stdin")]
    NoInput,

    /// Record input is not a flat array of scalar-valued objects
    #[error("bad record input: {0}")]
    BadRecord(String),

    /// Schema file is malformed
    #[error("bad schema file: {0}")]
    BadSchema(String),
}

/// Options for a full query run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub query: String,
    /// Path to a JSON array of flat records; stdin when omitted
    pub data: Option<String>,
    /// Optional schema file; inferred from the data when omitted
    pub schema: Option<String>,
    pub pretty: bool,
}

/// Load records, resolve the schema, execute the query, and render JSON.
pub fn execute_run(options: &RunOptions) -> Result<String, CliError> {
    let records = load_records(options.data.as_deref())?;
    let schema = match &options.schema {
        Some(path) => schema_from_json(&serde_json::from_str(&fs::read_to_string(path)?)?)?,
        None => infer_schema(&records),
    };

    let result = execute(&options.query, &records, &schema)?;
    if options.pretty {
        Ok(output::to_json_pretty(&result))
    } else {
        Ok(output::to_json(&result))
    }
}

/// Parse-only syntax validation. Ok means the query is well-formed.
pub fn execute_check(query: &str) -> Result<(), CliError> {
    let tokens = Lexer::new(query).tokenize();
    Parser::new(tokens)
        .parse()
        .map_err(QueryError::from)
        .map_err(CliError::from)?;
    Ok(())
}

fn load_records(path: Option<&str>) -> Result<Vec<FlatRecord>, CliError> {
    let text = match path {
        Some(path) => fs::read_to_string(path)?,
        None => {
            if atty::is(atty::Stream::Stdin) {
                return Err(CliError::NoInput);
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    records_from_json(&serde_json::from_str(&text)?)
}

fn records_from_json(value: &Value) -> Result<Vec<FlatRecord>, CliError> {
    let Value::Array(items) = value else {
        return Err(CliError::BadRecord("expected a JSON array".to_string()));
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(fields) = item else {
            return Err(CliError::BadRecord("expected an array of objects".to_string()));
        };
        let mut record = FlatRecord::new();
        for (name, field) in fields {
            match field {
                Value::String(s) => record.insert(name, FieldValue::Text(s.clone())),
                Value::Number(n) => {
                    let value = match n.as_i64() {
                        Some(i) => FieldValue::Integer(i),
                        None => Decimal::from_str(&n.to_string())
                            .map(FieldValue::Decimal)
                            .map_err(|_| {
                                CliError::BadRecord(format!("unrepresentable number in '{name}'"))
                            })?,
                    };
                    record.insert(name, value);
                }
                Value::Bool(b) => record.insert(name, FieldValue::Text(b.to_string())),
                Value::Null => {} // absent attribute
                _ => {
                    return Err(CliError::BadRecord(format!(
                        "field '{name}' is not a scalar; records must be flat"
                    )));
                }
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Build a schema from the records themselves: every attribute seen, kind
/// taken from the first value observed for it.
fn infer_schema(records: &[FlatRecord]) -> Schema {
    let mut seen = Vec::new();
    for record in records {
        for (name, value) in record.iter() {
            if seen.iter().any(|(n, _)| n == name) {
                continue;
            }
            let kind = match value {
                FieldValue::Text(_) => FieldKind::Text,
                FieldValue::Integer(_) => FieldKind::Integer,
                FieldValue::Decimal(_) => FieldKind::Decimal,
            };
            seen.push((name.clone(), kind));
        }
    }

    let mut builder = Schema::builder();
    for (name, kind) in seen {
        builder = builder.field(&name, kind);
    }
    builder.build()
}

/// Schema file shape:
///
/// ```json
/// {
///   "fields": [
///     {"name": "credit_limit", "kind": "decimal", "aliases": ["limit"]},
///     {"name": "risk", "kind": "text", "labels": {"Basso": "Low", "Alto": "High"}}
///   ]
/// }
/// ```
fn schema_from_json(value: &Value) -> Result<Schema, CliError> {
    let fields = value
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| CliError::BadSchema("missing 'fields' array".to_string()))?;

    let mut builder = Schema::builder();
    for field in fields {
        let name = field
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CliError::BadSchema("field without 'name'".to_string()))?;
        let kind = match field.get("kind").and_then(Value::as_str) {
            Some(kind) => match kind.to_lowercase().as_str() {
                "text" => FieldKind::Text,
                "integer" => FieldKind::Integer,
                "decimal" => FieldKind::Decimal,
                other => {
                    return Err(CliError::BadSchema(format!(
                        "unknown kind '{other}' for field '{name}'"
                    )));
                }
            },
            None => FieldKind::Text,
        };
        builder = builder.field(name, kind);

        if let Some(aliases) = field.get("aliases").and_then(Value::as_array) {
            for alias in aliases {
                if let Some(alias) = alias.as_str() {
                    builder = builder.alias(alias);
                }
            }
        }
        if let Some(labels) = field.get("labels").and_then(Value::as_object) {
            let pairs: Vec<(&str, &str)> = labels
                .iter()
                .filter_map(|(label, target)| target.as_str().map(|t| (label.as_str(), t)))
                .collect();
            builder = builder.labels(pairs);
        }
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_from_json_maps_scalars() {
        let value = serde_json::json!([
            {"name": "Acme", "credit_limit": 125000, "score": 4.5, "note": null}
        ]);
        let records = records_from_json(&value).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let fields: Vec<_> = record.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(fields, vec!["credit_limit", "name", "score"]);
    }

    #[test]
    fn records_from_json_rejects_nested() {
        let value = serde_json::json!([{"name": "Acme", "tags": ["a"]}]);
        assert!(matches!(
            records_from_json(&value),
            Err(CliError::BadRecord(_))
        ));
    }

    #[test]
    fn schema_from_json_with_labels() {
        let value = serde_json::json!({
            "fields": [
                {"name": "risk", "kind": "text", "labels": {"Basso": "Low"}},
                {"name": "credit_limit", "kind": "decimal", "aliases": ["limit"]}
            ]
        });
        let schema = schema_from_json(&value).unwrap();
        let risk = schema.resolve("risk").unwrap();
        assert_eq!(risk.labels().unwrap().normalize("basso"), "Low");
        assert_eq!(
            schema.resolve("limit").map(|f| f.name.as_str()),
            Some("credit_limit")
        );
    }
}

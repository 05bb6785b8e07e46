//! JSON rendering for query results.
//!
//! Provides compact and pretty-printed output of a [`QueryResult`] over
//! [`FlatRecord`]s. Output is deterministic: record attributes and
//! aggregation names are emitted in sorted key order.
//!
//! # Examples
//!
//! ```
//! use sift_ql::{execute, to_json};
//! use sift_ql::schema::{FieldKind, FieldValue, FlatRecord, Schema};
//!
//! let schema = Schema::builder()
//!     .field("region", FieldKind::Text)
//!     .build();
//! let records = vec![FlatRecord::new().with("region", FieldValue::Text("EMEA".into()))];
//!
//! let result = execute("WHERE region.equals(EMEA)", &records, &schema).unwrap();
//! assert!(to_json(&result).contains("\"total\":1"));
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};

use crate::evaluator::{AggResult, BucketResult, QueryResult};
use crate::schema::{FieldValue, FlatRecord};

fn decimal_to_value(d: Decimal) -> Value {
    // Falls back to the exact string form when f64 cannot represent it
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

fn field_to_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Integer(n) => json!(n),
        FieldValue::Decimal(d) => decimal_to_value(*d),
    }
}

fn record_to_value(record: &FlatRecord) -> Value {
    let mut map = Map::new();
    for (name, value) in record.iter() {
        map.insert(name.clone(), field_to_value(value));
    }
    Value::Object(map)
}

fn bucket_to_value(bucket: &BucketResult) -> Value {
    let mut map = Map::new();
    map.insert("key".to_string(), Value::String(bucket.key.clone()));
    map.insert("count".to_string(), json!(bucket.count));
    if !bucket.nested.is_empty() {
        let mut nested = Map::new();
        for (name, agg) in &bucket.nested {
            nested.insert(name.clone(), agg_to_value(agg));
        }
        map.insert("aggregations".to_string(), Value::Object(nested));
    }
    Value::Object(map)
}

fn agg_to_value(agg: &AggResult) -> Value {
    match agg {
        AggResult::Count(n) => json!(n),
        AggResult::Buckets(buckets) => Value::Array(buckets.iter().map(bucket_to_value).collect()),
        AggResult::Stats(stats) => {
            let mut map = Map::new();
            map.insert("count".to_string(), json!(stats.count));
            map.insert(
                "min".to_string(),
                stats.min.map_or(Value::Null, decimal_to_value),
            );
            map.insert(
                "max".to_string(),
                stats.max.map_or(Value::Null, decimal_to_value),
            );
            map.insert(
                "avg".to_string(),
                stats.avg.map_or(Value::Null, decimal_to_value),
            );
            map.insert("sum".to_string(), decimal_to_value(stats.sum));
            Value::Object(map)
        }
        AggResult::Percentiles(entries) => {
            let mut map = Map::new();
            for entry in entries {
                map.insert(entry.percentile.to_string(), decimal_to_value(entry.value));
            }
            Value::Object(map)
        }
    }
}

/// Convert a full query result into a JSON value.
pub fn result_to_value(result: &QueryResult<'_, FlatRecord>) -> Value {
    let mut aggregations = Map::new();
    for (name, agg) in &result.aggregations {
        aggregations.insert(name.clone(), agg_to_value(agg));
    }

    let mut map = Map::new();
    map.insert("total".to_string(), json!(result.total));
    map.insert(
        "records".to_string(),
        Value::Array(result.records.iter().map(|r| record_to_value(r)).collect()),
    );
    map.insert("aggregations".to_string(), Value::Object(aggregations));
    Value::Object(map)
}

/// Compact JSON output.
pub fn to_json(result: &QueryResult<'_, FlatRecord>) -> String {
    result_to_value(result).to_string()
}

/// Pretty-printed JSON output with 2-space indentation.
pub fn to_json_pretty(result: &QueryResult<'_, FlatRecord>) -> String {
    let value = result_to_value(result);
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

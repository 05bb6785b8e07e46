use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::ast::{Aggregation, BoolOp, Expr, Query, RangeBucket, Sort};
use crate::error::EvalError;
use crate::schema::{FieldDef, FieldValue, Record, Schema};

/// Result of one evaluation call.
///
/// Constructed once per call and discarded after the caller reads it; it
/// borrows the input record sequence and owns nothing else.
#[derive(Debug)]
pub struct QueryResult<'a, R> {
    /// Matching records after sorting and pagination
    pub records: Vec<&'a R>,
    /// Size of the full filtered set, captured before pagination
    pub total: usize,
    /// Aggregation name to computed value; always contains a `count` entry
    /// equal to `total`, whether or not the query had an AGGREGATE clause
    pub aggregations: BTreeMap<String, AggResult>,
}

/// Computed value of one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum AggResult {
    /// Plain count (the always-present `count` entry)
    Count(usize),
    /// Range or term buckets, in partition order
    Buckets(Vec<BucketResult>),
    Stats(StatsResult),
    /// Requested percentile to selected value, in request order
    Percentiles(Vec<PercentileEntry>),
}

/// One bucket of a range aggregation or one group of a term aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketResult {
    pub key: String,
    pub count: usize,
    /// Nested aggregations evaluated over just this bucket's members
    pub nested: BTreeMap<String, AggResult>,
}

/// count/min/max/average/sum over the numeric values of a field.
/// Non-numeric and absent values are excluded from the computation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsResult {
    pub count: usize,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub avg: Option<Decimal>,
    pub sum: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentileEntry {
    pub percentile: Decimal,
    pub value: Decimal,
}

/// Tree-walking evaluator over an immutable schema.
///
/// Stateless across calls: each [`evaluate`](Evaluator::evaluate) is a pure
/// function of the query, the record sequence, and the schema. Multiple
/// calls may run concurrently against the same records with no
/// coordination.
///
/// Nested aggregation recursion is bounded only by the nesting depth in the
/// query text; a host worried about pathological inputs should bound tree
/// depth before calling.
pub struct Evaluator<'s> {
    schema: &'s Schema,
}

impl<'s> Evaluator<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Evaluator { schema }
    }

    /// Evaluate a parsed query against a record sequence.
    ///
    /// Clause order in the source text is irrelevant; evaluation always
    /// runs filter, sort, count, paginate, aggregate - with aggregations
    /// computed over the full filtered set, never the returned page.
    pub fn evaluate<'a, R: Record>(
        &self,
        query: &Query,
        records: &'a [R],
    ) -> Result<QueryResult<'a, R>, EvalError> {
        let mut matched: Vec<&'a R> = Vec::new();
        for record in records {
            let keep = match &query.filter {
                Some(expr) => self.eval_expr(expr, record)?,
                None => true,
            };
            if keep {
                matched.push(record);
            }
        }
        debug!(input = records.len(), matched = matched.len(), "filter complete");

        if let Some(sort) = &query.sort {
            matched = self.sort_records(matched, sort)?;
        }

        let total = matched.len();

        let mut aggregations = BTreeMap::new();
        if let Some(aggs) = &query.aggregate {
            for agg in aggs {
                let result = self.eval_aggregation(agg, &matched)?;
                aggregations.insert(agg.result_key(), result);
            }
        }
        aggregations.insert("count".to_string(), AggResult::Count(total));

        let records = match &query.limit {
            Some(limit) => matched
                .into_iter()
                .skip(limit.offset)
                .take(limit.size)
                .collect(),
            None => matched,
        };

        Ok(QueryResult {
            records,
            total,
            aggregations,
        })
    }

    // ========================================
    // Filtering
    // ========================================

    fn eval_expr<R: Record>(&self, expr: &Expr, record: &R) -> Result<bool, EvalError> {
        match expr {
            Expr::Binary { left, op, right } => {
                // Both sides are pure; no short-circuiting required
                let lhs = self.eval_expr(left, record)?;
                let rhs = self.eval_expr(right, record)?;
                Ok(match op {
                    BoolOp::And => lhs && rhs,
                    BoolOp::Or => lhs || rhs,
                })
            }
            Expr::MethodCall {
                field,
                method,
                args,
            } => self.eval_method(field, method, args, record),
        }
    }

    /// Dispatch one `field.method(args)` predicate.
    ///
    /// A recognized method with a missing or empty argument is vacuously
    /// true: an incomplete filter clause is ignored rather than rejecting
    /// every record, so callers can build partial filters. An unrecognized
    /// method fails closed to false.
    fn eval_method<R: Record>(
        &self,
        field: &str,
        method: &str,
        args: &[String],
        record: &R,
    ) -> Result<bool, EvalError> {
        let def = self.schema.resolve(field);
        let value = self.field_value(def, record)?;

        match method {
            "equals" => {
                let Some(arg) = first_arg(args) else {
                    return Ok(true);
                };
                Ok(self.values_equal(def, value.as_ref(), arg))
            }
            "notEquals" => {
                let Some(arg) = first_arg(args) else {
                    return Ok(true);
                };
                Ok(!self.values_equal(def, value.as_ref(), arg))
            }
            "greaterThan" => {
                let Some(arg) = first_arg(args) else {
                    return Ok(true);
                };
                Ok(numeric_cmp(value.as_ref(), arg) == Some(Ordering::Greater))
            }
            "lessThan" => {
                let Some(arg) = first_arg(args) else {
                    return Ok(true);
                };
                Ok(numeric_cmp(value.as_ref(), arg) == Some(Ordering::Less))
            }
            "contains" => {
                let Some(arg) = first_arg(args) else {
                    return Ok(true);
                };
                Ok(string_form(value.as_ref())
                    .is_some_and(|s| s.to_lowercase().contains(&arg.to_lowercase())))
            }
            "startsWith" => {
                let Some(arg) = first_arg(args) else {
                    return Ok(true);
                };
                Ok(string_form(value.as_ref())
                    .is_some_and(|s| s.to_lowercase().starts_with(&arg.to_lowercase())))
            }
            "endsWith" => {
                let Some(arg) = first_arg(args) else {
                    return Ok(true);
                };
                Ok(string_form(value.as_ref())
                    .is_some_and(|s| s.to_lowercase().ends_with(&arg.to_lowercase())))
            }
            "in" => {
                if args.is_empty() || args.iter().any(|a| a.is_empty()) {
                    return Ok(true);
                }
                Ok(args
                    .iter()
                    .any(|arg| self.values_equal(def, value.as_ref(), arg)))
            }
            _ => Ok(false),
        }
    }

    /// Equality after the field's normalization step.
    ///
    /// Fields with a label table compare canonical labels, so `Basso`
    /// equals `Low` when the table maps both to `Low`. Numeric fields
    /// bypass the table and compare as numbers when both sides parse;
    /// everything else compares as exact strings. An absent value equals
    /// nothing.
    fn values_equal(&self, def: Option<&FieldDef>, value: Option<&FieldValue>, arg: &str) -> bool {
        let Some(value) = value else {
            return false;
        };

        if let Some(labels) = def.and_then(FieldDef::labels) {
            return labels.normalize(&value.as_string()) == labels.normalize(arg);
        }

        if let (Some(lhs), Ok(rhs)) = (value.as_decimal(), Decimal::from_str(arg)) {
            return lhs == rhs;
        }

        value.as_string() == arg
    }

    fn field_value<R: Record>(
        &self,
        def: Option<&FieldDef>,
        record: &R,
    ) -> Result<Option<FieldValue>, EvalError> {
        match def {
            Some(def) => record.field(&def.name).map_err(|source| EvalError::Resolver {
                attribute: def.name.clone(),
                source,
            }),
            // Unknown field names resolve to "absent", never an error
            None => Ok(None),
        }
    }

    // ========================================
    // Sorting
    // ========================================

    /// Stable multi-key sort. Per key: numeric comparison when both sides
    /// parse as numbers, else case-insensitive string comparison; absent
    /// values sort before present ones. DESC reverses the key's ordering.
    fn sort_records<'a, R: Record>(
        &self,
        matched: Vec<&'a R>,
        sort: &Sort,
    ) -> Result<Vec<&'a R>, EvalError> {
        let mut keyed: Vec<(Vec<Option<FieldValue>>, &'a R)> = Vec::with_capacity(matched.len());
        for record in matched {
            let mut keys = Vec::with_capacity(sort.fields.len());
            for sort_field in &sort.fields {
                let def = self.schema.resolve(&sort_field.field);
                keys.push(self.field_value(def, record)?);
            }
            keyed.push((keys, record));
        }

        // Vec::sort_by is stable, preserving input order for equal keys
        keyed.sort_by(|(a, _), (b, _)| {
            for (idx, sort_field) in sort.fields.iter().enumerate() {
                let mut ord = compare_keys(a[idx].as_ref(), b[idx].as_ref());
                if !sort_field.ascending {
                    ord = ord.reverse();
                }
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }

    // ========================================
    // Aggregation
    // ========================================

    fn eval_aggregation<'a, R: Record>(
        &self,
        agg: &Aggregation,
        rows: &[&'a R],
    ) -> Result<AggResult, EvalError> {
        match agg {
            Aggregation::Range {
                field,
                buckets,
                nested,
            } => self.agg_range(field, buckets, nested, rows),
            Aggregation::Term {
                field,
                size,
                nested,
            } => self.agg_term(field, *size, nested, rows),
            Aggregation::Stats { field } => self.agg_stats(field, rows),
            Aggregation::Percentiles { field, percentiles } => {
                self.agg_percentiles(field, percentiles, rows)
            }
        }
    }

    fn nested_results<'a, R: Record>(
        &self,
        nested: &[Aggregation],
        members: &[&'a R],
    ) -> Result<BTreeMap<String, AggResult>, EvalError> {
        let mut results = BTreeMap::new();
        for agg in nested {
            results.insert(agg.result_key(), self.eval_aggregation(agg, members)?);
        }
        Ok(results)
    }

    /// Partition into `[from, to)` buckets. Values that do not parse
    /// numerically fall into no bucket.
    fn agg_range<'a, R: Record>(
        &self,
        field: &str,
        buckets: &[RangeBucket],
        nested: &[Aggregation],
        rows: &[&'a R],
    ) -> Result<AggResult, EvalError> {
        let def = self.schema.resolve(field);
        let mut values: Vec<(Option<Decimal>, &'a R)> = Vec::with_capacity(rows.len());
        for &row in rows {
            let value = self.field_value(def, row)?.and_then(|v| v.as_decimal());
            values.push((value, row));
        }

        let mut results = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let members: Vec<&'a R> = values
                .iter()
                .filter(|(value, _)| {
                    value.is_some_and(|v| {
                        bucket.from.is_none_or(|from| v >= from)
                            && bucket.to.is_none_or(|to| v < to)
                    })
                })
                .map(|(_, row)| *row)
                .collect();

            results.push(BucketResult {
                key: bucket_key(bucket),
                count: members.len(),
                nested: self.nested_results(nested, &members)?,
            });
        }
        Ok(AggResult::Buckets(results))
    }

    /// Group by the string form of the field, descending member count,
    /// first-seen order breaking ties, top `size` groups kept.
    fn agg_term<'a, R: Record>(
        &self,
        field: &str,
        size: usize,
        nested: &[Aggregation],
        rows: &[&'a R],
    ) -> Result<AggResult, EvalError> {
        let def = self.schema.resolve(field);
        let mut groups: Vec<(String, Vec<&'a R>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for &row in rows {
            let Some(value) = self.field_value(def, row)? else {
                continue;
            };
            let key = value.as_string();
            match index.get(&key) {
                Some(&idx) => groups[idx].1.push(row),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![row]));
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts
        groups.sort_by(|(_, a), (_, b)| b.len().cmp(&a.len()));
        groups.truncate(size);

        let mut results = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            results.push(BucketResult {
                count: members.len(),
                nested: self.nested_results(nested, &members)?,
                key,
            });
        }
        Ok(AggResult::Buckets(results))
    }

    fn agg_stats<R: Record>(&self, field: &str, rows: &[&R]) -> Result<AggResult, EvalError> {
        let values = self.numeric_values(field, rows)?;

        let count = values.len();
        let sum: Decimal = values.iter().sum();
        let min = values.iter().min().copied();
        let max = values.iter().max().copied();
        let avg = if count > 0 {
            Some(sum / Decimal::from(count as u64))
        } else {
            None
        };

        Ok(AggResult::Stats(StatsResult {
            count,
            min,
            max,
            avg,
            sum,
        }))
    }

    /// Nearest-rank percentile selection: values sorted ascending, index
    /// `ceil(p/100 * n) - 1` clamped into `[0, n-1]`.
    fn agg_percentiles<R: Record>(
        &self,
        field: &str,
        percentiles: &[Decimal],
        rows: &[&R],
    ) -> Result<AggResult, EvalError> {
        let mut values = self.numeric_values(field, rows)?;
        values.sort();

        let n = values.len();
        if n == 0 {
            return Ok(AggResult::Percentiles(Vec::new()));
        }

        let mut entries = Vec::with_capacity(percentiles.len());
        for p in percentiles {
            let rank = (*p * Decimal::from(n as u64)) / Decimal::from(100u32);
            let idx = rank
                .ceil()
                .to_usize()
                .unwrap_or(n)
                .saturating_sub(1)
                .min(n - 1);
            entries.push(PercentileEntry {
                percentile: *p,
                value: values[idx],
            });
        }
        Ok(AggResult::Percentiles(entries))
    }

    /// Field values that parse numerically; others are excluded.
    fn numeric_values<R: Record>(
        &self,
        field: &str,
        rows: &[&R],
    ) -> Result<Vec<Decimal>, EvalError> {
        let def = self.schema.resolve(field);
        let mut values = Vec::new();
        for row in rows {
            if let Some(value) = self.field_value(def, *row)?.and_then(|v| v.as_decimal()) {
                values.push(value);
            }
        }
        Ok(values)
    }
}

/// First argument if present and non-empty; `None` triggers the
/// vacuous-true policy.
fn first_arg(args: &[String]) -> Option<&str> {
    match args.first() {
        Some(arg) if !arg.is_empty() => Some(arg),
        _ => None,
    }
}

fn string_form(value: Option<&FieldValue>) -> Option<String> {
    value.map(FieldValue::as_string)
}

/// Numeric comparison ladder for greaterThan/lessThan: decimal first, then
/// integer, then fail closed to "no match".
fn numeric_cmp(value: Option<&FieldValue>, arg: &str) -> Option<Ordering> {
    let value = value?;
    let lhs_text = value.as_string();

    if let (Some(lhs), Ok(rhs)) = (value.as_decimal(), Decimal::from_str(arg)) {
        return Some(lhs.cmp(&rhs));
    }
    if let (Ok(lhs), Ok(rhs)) = (lhs_text.parse::<i64>(), arg.parse::<i64>()) {
        return Some(lhs.cmp(&rhs));
    }
    None
}

/// Sort-key comparison: absent before present, numeric when both sides
/// parse, else case-insensitive string order.
fn compare_keys(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.as_decimal(), b.as_decimal()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.as_string().to_lowercase().cmp(&b.as_string().to_lowercase()),
        },
    }
}

fn bucket_key(bucket: &RangeBucket) -> String {
    let from = bucket
        .from
        .map_or_else(|| "*".to_string(), |d| d.to_string());
    let to = bucket.to.map_or_else(|| "*".to_string(), |d| d.to_string());
    format!("{from}-{to}")
}

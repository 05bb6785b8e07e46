//! sift-ql: a small query language for flat business records.
//!
//! A single text string expresses filtering, sorting, pagination, and nested
//! aggregation over an in-memory record sequence:
//!
//! ```text
//! WHERE credit_limit.greaterThan(100000) AND risk.equals(Low)
//! SORT credit_limit DESC
//! LIMIT 10
//! ```
//!
//! The pipeline is lexer -> recursive-descent parser -> syntax tree ->
//! tree-walking evaluator. The engine always does a full linear scan; there
//! are no indexes and nothing is persisted. Each [`execute`] call is a pure
//! function of its inputs, so concurrent calls over the same immutable
//! record slice need no coordination.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod schema;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Aggregation, BoolOp, Expr, Limit, Query, Select, Sort, SortField, Token, TokenKind};
pub use error::{EvalError, QueryError, ResolveError, SyntaxError};
pub use evaluator::{AggResult, BucketResult, Evaluator, PercentileEntry, QueryResult, StatsResult};
pub use lexer::Lexer;
pub use output::{to_json, to_json_pretty};
pub use parser::Parser;
pub use schema::{FieldKind, FieldValue, FlatRecord, Record, Schema};

/// Run a raw query string against a record sequence.
///
/// This is the single entry point hosts call: tokenize, parse, evaluate.
/// Fails with [`QueryError::Syntax`] for any token-shape mismatch (fatal,
/// carries the offending token position) or [`QueryError::Eval`] when the
/// host's record resolver itself fails.
///
/// # Examples
///
/// ```
/// use sift_ql::execute;
/// use sift_ql::schema::{FieldKind, FieldValue, FlatRecord, Schema};
///
/// let schema = Schema::builder()
///     .field("credit_limit", FieldKind::Integer)
///     .build();
/// let records = vec![
///     FlatRecord::new().with("credit_limit", FieldValue::Integer(50_000)),
///     FlatRecord::new().with("credit_limit", FieldValue::Integer(200_000)),
/// ];
///
/// let result = execute("WHERE credit_limit.greaterThan(100000)", &records, &schema).unwrap();
/// assert_eq!(result.total, 1);
/// ```
pub fn execute<'a, R: Record>(
    query: &str,
    records: &'a [R],
    schema: &Schema,
) -> Result<QueryResult<'a, R>, QueryError> {
    let tokens = Lexer::new(query).tokenize();
    let parsed = Parser::new(tokens).parse()?;
    let result = Evaluator::new(schema).evaluate(&parsed, records)?;
    Ok(result)
}

//! # sift-ql - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for sift-ql, a small
//! query language for filtering, sorting, paginating, and aggregating flat
//! business records.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - `WHERE` expression nodes (boolean tree over predicates)
//! - **[aggregations]** - Aggregation expressions (range, term, stats, percentiles)
//! - **[query]** - Complete query structure with all five clauses
//!
//! Every node is a plain value type with no behavior beyond identification;
//! the evaluator walks the tree via exhaustive pattern matching, so the
//! compiler enforces that every node kind is handled everywhere.
//!
//! ## Quick Start
//!
//! ```text
//! WHERE credit_limit.greaterThan(100000) AND risk.equals(Low)
//! SORT credit_limit DESC
//! LIMIT 10
//! ```
//!
//! This query keeps high-limit, low-risk records, orders them by limit, and
//! returns the first page of ten.
//!
//! ## Core Concepts
//!
//! ### Clauses
//!
//! A query is any combination of five optional clauses, in any source order:
//!
//! - **WHERE** - boolean tree of `field.method(args)` predicates
//! - **SELECT** - requested projection (documentation only)
//! - **AGGREGATE** - bucket/group/stats/percentile summaries, recursively nestable
//! - **SORT** - stable multi-key ordering
//! - **LIMIT** - offset/size pagination
//!
//! ### Evaluation order
//!
//! Evaluation order is fixed regardless of clause order in the source text:
//! filter, sort, count, paginate, aggregate - with aggregations computed over
//! the full matching set, not the returned page.
//!
//! ### Field names
//!
//! Field names inside predicates and aggregations are free text at parse
//! time. Validity is resolved at evaluation time against the record schema;
//! an unknown field resolves to "absent" rather than a parse error.
pub mod aggregations;
pub mod expressions;
pub mod query;
pub mod tokens;

pub use aggregations::{Aggregation, RangeBucket};
pub use expressions::{BoolOp, Expr};
pub use query::{Limit, Query, Select, Sort, SortField};
pub use tokens::{Token, TokenKind};

use crate::ast::{Aggregation, Expr};

/// Requested projection.
///
/// Cosmetic only: it documents which fields the caller asked for but does
/// not restrict evaluation or the returned records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Select {
    pub fields: Vec<String>,
}

/// One key of a `SORT` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    /// Direction; ascending when no ASC/DESC is given
    pub ascending: bool,
}

/// Multi-key ordering. Keys compose lexicographically in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    pub fields: Vec<SortField>,
}

/// Pagination window applied after filtering and sorting.
///
/// `LIMIT n` means `size = n`, `LIMIT m,n` means `offset = m, size = n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: usize,
    pub size: usize,
}

/// The root of a parsed query. Every clause is optional.
///
/// A query with no clauses is legal and is a no-op: it returns the full
/// input set unfiltered and unsorted, with only the total count reported
/// as an aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub select: Option<Select>,
    pub filter: Option<Expr>,
    pub aggregate: Option<Vec<Aggregation>>,
    pub sort: Option<Sort>,
    pub limit: Option<Limit>,
}

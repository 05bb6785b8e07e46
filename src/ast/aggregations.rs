use rust_decimal::Decimal;

/// One `{from:, to:}` bucket of a range aggregation.
///
/// A missing `from` means unbounded below, a missing `to` unbounded above.
/// Membership is half-open: `from <= value < to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBucket {
    pub from: Option<Decimal>,
    pub to: Option<Decimal>,
}

/// A single aggregation expression from the `AGGREGATE` clause.
///
/// `nested` lists are themselves aggregation expressions, evaluated scoped
/// to the members of each bucket/group, enabling arbitrary-depth recursion.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Partition the matching set into numeric buckets
    ///
    /// # Example
    /// ```text
    /// range(credit_limit, [{from: 0, to: 50000}, {from: 50000}])
    /// ```
    Range {
        field: String,
        buckets: Vec<RangeBucket>,
        nested: Vec<Aggregation>,
    },

    /// Group by the string form of a field, keeping the top `size` groups
    /// by descending member count
    ///
    /// # Example
    /// ```text
    /// term(region, 3)
    /// ```
    Term {
        field: String,
        size: usize,
        nested: Vec<Aggregation>,
    },

    /// count/min/max/average/sum over the numeric values of a field
    ///
    /// # Example
    /// ```text
    /// stats(credit_limit)
    /// ```
    Stats { field: String },

    /// Nearest-rank percentiles over the numeric values of a field
    ///
    /// # Example
    /// ```text
    /// percentiles(credit_limit, [50, 95, 99])
    /// ```
    Percentiles {
        field: String,
        percentiles: Vec<Decimal>,
    },
}

impl Aggregation {
    /// Key under which this aggregation's result is reported,
    /// e.g. `term_region`
    pub fn result_key(&self) -> String {
        match self {
            Aggregation::Range { field, .. } => format!("range_{field}"),
            Aggregation::Term { field, .. } => format!("term_{field}"),
            Aggregation::Stats { field } => format!("stats_{field}"),
            Aggregation::Percentiles { field, .. } => format!("percentiles_{field}"),
        }
    }
}

/// Boolean connective in a `WHERE` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// Logical AND (binds tighter than OR)
    And,
    /// Logical OR
    Or,
}

/// A filter expression inside a `WHERE` clause.
///
/// Expressions form a binary tree of [`BoolOp`] nodes over `field.method(args)`
/// predicates at the leaves. The tree is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Two sub-expressions joined by AND/OR
    ///
    /// # Example
    /// ```text
    /// credit_limit.greaterThan(100000) AND risk.equals(Low)
    /// ```
    Binary {
        left: Box<Expr>,
        op: BoolOp,
        right: Box<Expr>,
    },

    /// A single `field.method(args)` predicate
    ///
    /// The field name is free text at parse time; it resolves against the
    /// record schema at evaluation time, and an unknown field resolves to
    /// "absent" rather than failing the parse. Arguments are bare words or
    /// numbers; the grammar has no string-literal token.
    ///
    /// # Examples
    /// ```text
    /// risk.equals(Low)
    /// region.in(EMEA, APAC)
    /// name.startsWith(Ac)
    /// ```
    MethodCall {
        field: String,
        method: String,
        args: Vec<String>,
    },
}

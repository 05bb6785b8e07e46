use thiserror::Error;

use crate::ast::Token;

/// Fatal parse failure.
///
/// Raised for any structural mismatch (a specific token or token type was
/// required and something else was found). Carries the offending token text
/// and its source location. This is the only error class the parser
/// produces; there is no partial-result recovery. Lexing never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at line {line}, column {column}: expected {expected}, found {found}")]
pub struct SyntaxError {
    /// The construct the parser was looking for, e.g. "field name"
    pub expected: String,
    /// Human-readable form of the offending token
    pub found: String,
    /// Character offset of the offending token
    pub position: usize,
    pub line: u32,
    pub column: u32,
}

impl SyntaxError {
    pub fn new(expected: impl Into<String>, token: &Token) -> Self {
        SyntaxError {
            expected: expected.into(),
            found: token.describe(),
            position: token.position,
            line: token.line,
            column: token.column,
        }
    }
}

/// Failure reported by a host-supplied field resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ResolveError(pub String);

/// Evaluation failure.
///
/// Reserved for malformed host state: the only way evaluation of a
/// well-formed tree over valid records can fail is the schema resolver
/// itself failing. Predicates over bad or missing data do not error; they
/// resolve to false or "ignore this clause" per the filter policies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The host's [`Record`](crate::schema::Record) implementation failed
    /// while resolving an attribute
    #[error("field resolver failed for '{attribute}': {source}")]
    Resolver {
        attribute: String,
        #[source]
        source: ResolveError,
    },
}

/// Either of the two error kinds a full query run can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

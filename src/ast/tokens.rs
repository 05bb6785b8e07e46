/// Classification of a lexed token.
///
/// Keywords are matched case-insensitively by the lexer; an identifier that
/// does not match any keyword stays [`TokenKind::Identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Clause keywords
    /// `WHERE` - filter clause
    Where,

    /// `SELECT` - projection clause (cosmetic, does not restrict evaluation)
    Select,

    /// `AGGREGATE` - aggregation clause
    Aggregate,

    /// `SORT` - ordering clause
    Sort,

    /// `LIMIT` - pagination clause
    Limit,

    // Expression keywords
    /// Logical AND (binds tighter than OR)
    And,

    /// Logical OR
    Or,

    /// Ascending sort direction (the default)
    Asc,

    /// Descending sort direction
    Desc,

    // Value-carrying tokens
    /// Field name, method name, or bare-word argument
    ///
    /// Must start with a letter or underscore, followed by letters, digits,
    /// or underscores.
    ///
    /// # Examples
    /// ```text
    /// credit_limit
    /// equals
    /// EMEA
    /// ```
    Identifier,

    /// Numeric literal
    ///
    /// A digit run that may contain embedded dots. The lexer does not
    /// validate numeric shape; `1.2.3` lexes as a single number token and
    /// is rejected later by the parser where a number is required.
    Number,

    // Punctuation
    /// `(`
    LParen,

    /// `)`
    RParen,

    /// `{` - opens a bucket object or nested aggregation list
    LBrace,

    /// `}`
    RBrace,

    /// `[` - opens a bucket or percentile list
    LBracket,

    /// `]`
    RBracket,

    /// `,`
    Comma,

    /// `.` - separates field and method in a predicate
    Dot,

    /// `:` - separates bucket bound name and value
    Colon,

    /// End of input; always the final token
    Eof,

    /// Any character the lexer does not recognize
    ///
    /// The lexer never fails; unrecognized characters become one-character
    /// unknown tokens and error reporting is deferred to the parser.
    Unknown,
}

/// A single lexed token with its source location.
///
/// Tokens are produced once by the lexer, consumed left-to-right by the
/// parser, and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token (empty for [`TokenKind::Eof`])
    pub text: String,
    /// Character offset from the start of the input
    pub position: usize,
    /// 1-based source line
    pub line: u32,
    /// 1-based source column
    pub column: u32,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        position: usize,
        line: u32,
        column: u32,
    ) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
            line,
            column,
        }
    }

    /// Human-readable form for diagnostics
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::ast::{
    Aggregation, BoolOp, Expr, Limit, Query, RangeBucket, Select, Sort, SortField, Token,
    TokenKind,
};
use crate::error::SyntaxError;

/// Recursive-descent parser over a lexed token sequence.
///
/// Grammar, precedence low to high:
///
/// ```text
/// Query     := (Select | Where | Aggregate | Sort | Limit)*
/// OrExpr    := AndExpr (OR AndExpr)*
/// AndExpr   := Primary (AND Primary)*
/// Primary   := '(' OrExpr ')' | Ident '.' Ident '(' ArgList? ')'
/// ArgList   := (Ident | Number) (',' (Ident | Number))*
/// Select    := SELECT Ident (',' Ident)*
/// Sort      := SORT Ident (ASC|DESC)? (',' Ident (ASC|DESC)?)*
/// Limit     := LIMIT Number (',' Number)?
/// Aggregate := AGGREGATE AggExpr (',' AggExpr)*
/// ```
///
/// Any structural mismatch is a fatal [`SyntaxError`] carrying the offending
/// token and its position; there is no partial-result recovery.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // Guard against a caller-built sequence missing the terminator
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let position = tokens.len();
            tokens.push(Token::new(TokenKind::Eof, "", position, 1, 1));
        }
        Parser {
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> &Token {
        // tokenize() always terminates with Eof
        self.tokens
            .get(self.position)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        if self.current().kind != kind {
            return Err(SyntaxError::new(expected, self.current()));
        }
        let token = self.current().clone();
        self.advance();
        Ok(token)
    }

    /// Parse the whole token sequence into a query.
    ///
    /// Unknown tokens outside a recognized clause keyword are silently
    /// skipped - a documented leniency, not a crash path. A repeated clause
    /// keyword overwrites the earlier clause (last one wins).
    pub fn parse(&mut self) -> Result<Query, SyntaxError> {
        let mut query = Query::default();

        while !self.check(TokenKind::Eof) {
            match self.current().kind {
                TokenKind::Select => query.select = Some(self.parse_select()?),
                TokenKind::Where => query.filter = Some(self.parse_where()?),
                TokenKind::Aggregate => query.aggregate = Some(self.parse_aggregate()?),
                TokenKind::Sort => query.sort = Some(self.parse_sort()?),
                TokenKind::Limit => query.limit = Some(self.parse_limit()?),
                _ => self.advance(),
            }
        }

        debug!(
            select = query.select.is_some(),
            filter = query.filter.is_some(),
            aggregate = query.aggregate.is_some(),
            sort = query.sort.is_some(),
            limit = query.limit.is_some(),
            "parsed query"
        );
        Ok(query)
    }

    fn parse_select(&mut self) -> Result<Select, SyntaxError> {
        self.advance(); // consume SELECT

        let mut fields = vec![self.expect(TokenKind::Identifier, "field name")?.text];
        while self.check(TokenKind::Comma) {
            self.advance();
            fields.push(self.expect(TokenKind::Identifier, "field name")?.text);
        }
        Ok(Select { fields })
    }

    fn parse_where(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume WHERE
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;

        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BoolOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_primary()?;

        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_primary()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BoolOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(TokenKind::LParen) {
            self.advance();
            let expr = self.parse_or()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(expr);
        }

        let field = self
            .expect(TokenKind::Identifier, "field name or '('")?
            .text;
        self.expect(TokenKind::Dot, "'.'")?;
        let method = self.expect(TokenKind::Identifier, "method name")?.text;
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            match self.current().kind {
                TokenKind::Identifier | TokenKind::Number => {
                    args.push(self.current().text.clone());
                    self.advance();
                }
                _ => return Err(SyntaxError::new("argument (identifier or number)", self.current())),
            }
            if !self.check(TokenKind::RParen) {
                self.expect(TokenKind::Comma, "',' or ')'")?;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        Ok(Expr::MethodCall {
            field,
            method,
            args,
        })
    }

    fn parse_sort(&mut self) -> Result<Sort, SyntaxError> {
        self.advance(); // consume SORT

        let mut fields = vec![self.parse_sort_field()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            fields.push(self.parse_sort_field()?);
        }
        Ok(Sort { fields })
    }

    fn parse_sort_field(&mut self) -> Result<SortField, SyntaxError> {
        let field = self.expect(TokenKind::Identifier, "sort field name")?.text;

        // Direction defaults to ascending
        let ascending = if self.check(TokenKind::Asc) {
            self.advance();
            true
        } else if self.check(TokenKind::Desc) {
            self.advance();
            false
        } else {
            true
        };

        Ok(SortField { field, ascending })
    }

    fn parse_limit(&mut self) -> Result<Limit, SyntaxError> {
        self.advance(); // consume LIMIT

        let first = self.expect_usize("page size")?;
        if self.check(TokenKind::Comma) {
            self.advance();
            let second = self.expect_usize("page size")?;
            Ok(Limit {
                offset: first,
                size: second,
            })
        } else {
            Ok(Limit {
                offset: 0,
                size: first,
            })
        }
    }

    fn parse_aggregate(&mut self) -> Result<Vec<Aggregation>, SyntaxError> {
        self.advance(); // consume AGGREGATE

        let mut aggregations = vec![self.parse_agg_expr()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            aggregations.push(self.parse_agg_expr()?);
        }
        Ok(aggregations)
    }

    /// One aggregation expression, dispatched by its leading identifier.
    /// Kind names match case-insensitively. Every kind accepts an optional
    /// brace-delimited nested list for a regular grammar; `stats` and
    /// `percentiles` parse it but have nothing to scope it to, so it is
    /// dropped.
    fn parse_agg_expr(&mut self) -> Result<Aggregation, SyntaxError> {
        let kind = self.expect(
            TokenKind::Identifier,
            "aggregation kind (range, term, stats, percentiles)",
        )?;

        match kind.text.to_lowercase().as_str() {
            "range" => {
                self.expect(TokenKind::LParen, "'('")?;
                let field = self.expect(TokenKind::Identifier, "field name")?.text;
                self.expect(TokenKind::Comma, "','")?;
                let buckets = self.parse_buckets()?;
                self.expect(TokenKind::RParen, "')'")?;
                let nested = self.parse_nested()?;
                Ok(Aggregation::Range {
                    field,
                    buckets,
                    nested,
                })
            }
            "term" => {
                self.expect(TokenKind::LParen, "'('")?;
                let field = self.expect(TokenKind::Identifier, "field name")?.text;
                self.expect(TokenKind::Comma, "','")?;
                let size = self.expect_usize("group count")?;
                self.expect(TokenKind::RParen, "')'")?;
                let nested = self.parse_nested()?;
                Ok(Aggregation::Term {
                    field,
                    size,
                    nested,
                })
            }
            "stats" => {
                self.expect(TokenKind::LParen, "'('")?;
                let field = self.expect(TokenKind::Identifier, "field name")?.text;
                self.expect(TokenKind::RParen, "')'")?;
                let _ = self.parse_nested()?;
                Ok(Aggregation::Stats { field })
            }
            "percentiles" => {
                self.expect(TokenKind::LParen, "'('")?;
                let field = self.expect(TokenKind::Identifier, "field name")?.text;
                self.expect(TokenKind::Comma, "','")?;
                let percentiles = self.parse_number_list()?;
                self.expect(TokenKind::RParen, "')'")?;
                let _ = self.parse_nested()?;
                Ok(Aggregation::Percentiles { field, percentiles })
            }
            _ => Err(SyntaxError::new(
                "aggregation kind (range, term, stats, percentiles)",
                &kind,
            )),
        }
    }

    fn parse_buckets(&mut self) -> Result<Vec<RangeBucket>, SyntaxError> {
        self.expect(TokenKind::LBracket, "'['")?;

        let mut buckets = vec![self.parse_bucket()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            buckets.push(self.parse_bucket()?);
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(buckets)
    }

    fn parse_bucket(&mut self) -> Result<RangeBucket, SyntaxError> {
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut bucket = RangeBucket {
            from: None,
            to: None,
        };
        while !self.check(TokenKind::RBrace) {
            let bound = self.expect(TokenKind::Identifier, "'from' or 'to'")?;
            self.expect(TokenKind::Colon, "':'")?;
            let value = self.expect_decimal("bucket bound")?;
            match bound.text.to_lowercase().as_str() {
                "from" => bucket.from = Some(value),
                "to" => bucket.to = Some(value),
                _ => return Err(SyntaxError::new("'from' or 'to'", &bound)),
            }
            if !self.check(TokenKind::RBrace) {
                self.expect(TokenKind::Comma, "',' or '}'")?;
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(bucket)
    }

    fn parse_number_list(&mut self) -> Result<Vec<Decimal>, SyntaxError> {
        self.expect(TokenKind::LBracket, "'['")?;

        let mut numbers = vec![self.expect_decimal("percentile")?];
        while self.check(TokenKind::Comma) {
            self.advance();
            numbers.push(self.expect_decimal("percentile")?);
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(numbers)
    }

    /// Optional `{ AggExpr (',' AggExpr)* }` nested aggregation list.
    fn parse_nested(&mut self) -> Result<Vec<Aggregation>, SyntaxError> {
        if !self.check(TokenKind::LBrace) {
            return Ok(Vec::new());
        }
        self.advance();

        let mut nested = vec![self.parse_agg_expr()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            nested.push(self.parse_agg_expr()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(nested)
    }

    /// A Number token whose text is a well-formed non-negative integer.
    /// Malformed literals like `1.2.3` lex as one token and are rejected
    /// here.
    fn expect_usize(&mut self, expected: &str) -> Result<usize, SyntaxError> {
        let token = self.expect(TokenKind::Number, expected)?;
        token
            .text
            .parse::<usize>()
            .map_err(|_| SyntaxError::new(format!("{expected} (integer)"), &token))
    }

    fn expect_decimal(&mut self, expected: &str) -> Result<Decimal, SyntaxError> {
        let token = self.expect(TokenKind::Number, expected)?;
        Decimal::from_str(&token.text)
            .map_err(|_| SyntaxError::new(format!("{expected} (number)"), &token))
    }
}

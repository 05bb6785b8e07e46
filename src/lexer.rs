use tracing::trace;

use crate::ast::{Token, TokenKind};

/// Streaming lexer over a query string.
///
/// Lexing never fails: unrecognized characters become [`TokenKind::Unknown`]
/// tokens and all error reporting is deferred to the parser. The produced
/// sequence is always terminated by an [`TokenKind::Eof`] token.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Consume the whole input into a token sequence ending with Eof.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        trace!(count = tokens.len(), "tokenized query");
        tokens
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Read a digit run, absorbing embedded dots that are followed by a
    /// digit. Malformed shapes like `1.2.3` come out as one token; numeric
    /// validity is the parser's concern.
    fn read_number(&mut self) -> String {
        let mut number = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        number
    }

    fn keyword_kind(ident: &str) -> Option<TokenKind> {
        match ident.to_lowercase().as_str() {
            "where" => Some(TokenKind::Where),
            "select" => Some(TokenKind::Select),
            "aggregate" => Some(TokenKind::Aggregate),
            "sort" => Some(TokenKind::Sort),
            "limit" => Some(TokenKind::Limit),
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "asc" => Some(TokenKind::Asc),
            "desc" => Some(TokenKind::Desc),
            _ => None,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let (position, line, column) = (self.position, self.line, self.column);
        let token = |kind, text: String| Token::new(kind, text, position, line, column);

        match self.current_char() {
            None => token(TokenKind::Eof, String::new()),
            Some('(') => {
                self.advance();
                token(TokenKind::LParen, "(".into())
            }
            Some(')') => {
                self.advance();
                token(TokenKind::RParen, ")".into())
            }
            Some('{') => {
                self.advance();
                token(TokenKind::LBrace, "{".into())
            }
            Some('}') => {
                self.advance();
                token(TokenKind::RBrace, "}".into())
            }
            Some('[') => {
                self.advance();
                token(TokenKind::LBracket, "[".into())
            }
            Some(']') => {
                self.advance();
                token(TokenKind::RBracket, "]".into())
            }
            Some(',') => {
                self.advance();
                token(TokenKind::Comma, ",".into())
            }
            Some('.') => {
                self.advance();
                token(TokenKind::Dot, ".".into())
            }
            Some(':') => {
                self.advance();
                token(TokenKind::Colon, ":".into())
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                match Self::keyword_kind(&ident) {
                    Some(kind) => token(kind, ident),
                    None => token(TokenKind::Identifier, ident),
                }
            }
            Some(ch) if ch.is_ascii_digit() => {
                let number = self.read_number();
                token(TokenKind::Number, number)
            }
            Some(ch) => {
                self.advance();
                token(TokenKind::Unknown, ch.to_string())
            }
        }
    }
}

#[test]
fn test_keywords_case_insensitive() {
    let mut lexer = Lexer::new("WHERE where Sort aNd");
    assert_eq!(lexer.next_token().kind, TokenKind::Where);
    assert_eq!(lexer.next_token().kind, TokenKind::Where);
    assert_eq!(lexer.next_token().kind, TokenKind::Sort);
    assert_eq!(lexer.next_token().kind, TokenKind::And);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn test_predicate_shape() {
    let tokens = Lexer::new("credit_limit.greaterThan(100000)").tokenize();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::Number,
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[0].text, "credit_limit");
    assert_eq!(tokens[4].text, "100000");
}

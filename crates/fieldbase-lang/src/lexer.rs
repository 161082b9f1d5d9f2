//! Lexer for the filter language using logos.
//!
//! The logos scanner recognises raw lexemes; [`Lexer`] classifies words
//! into connectives, keywords, booleans and field references and turns
//! malformed input into [`ParseError`]s.

use std::fmt;

use logos::Logos;

use crate::ast::Operator;
use crate::error::ParseError;
use crate::span::Span;

/// Raw lexemes produced by logos.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"\s+")]
enum RawToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[token("=")]
    Eq,
    #[token("!=")]
    Ne,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token(">=")]
    Gte,
    #[token("<=")]
    Lte,
    // Operator spellings that look valid but are not.
    #[token("!")]
    #[token("==")]
    BadOperator,

    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    #[regex(r#"'([^'\\]|\\(.|\n))*'"#)]
    String,

    #[regex(r#""([^"\\]|\\(.|\n))*\\?"#)]
    #[regex(r#"'([^'\\]|\\(.|\n))*\\?"#)]
    UnterminatedString,

    #[regex(r"-?[0-9]+(\.[0-9]*)?")]
    Number,

    #[regex(r"[\p{L}_][\p{L}\p{N}_.-]*")]
    Word,
}

/// Comparison-adjacent keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Contains,
    StartsWith,
    EndsWith,
    Is,
    Not,
    Empty,
    Null,
}

impl Keyword {
    fn from_lowercase(word: &str) -> Option<Self> {
        Some(match word {
            "contains" => Keyword::Contains,
            "startswith" => Keyword::StartsWith,
            "endswith" => Keyword::EndsWith,
            "is" => Keyword::Is,
            "not" => Keyword::Not,
            "empty" => Keyword::Empty,
            "null" => Keyword::Null,
            _ => return None,
        })
    }

    /// The keyword as written, lower-cased.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Contains => "contains",
            Keyword::StartsWith => "startswith",
            Keyword::EndsWith => "endswith",
            Keyword::Is => "is",
            Keyword::Not => "not",
            Keyword::Empty => "empty",
            Keyword::Null => "null",
        }
    }
}

/// Token types for the filter language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Field reference, original casing preserved.
    Field(String),
    /// Quoted string, escapes resolved.
    String(String),
    /// Numeric literal.
    Number(f64),
    /// `true` or `false`.
    Bool(bool),
    /// One of `= != > < >= <=`.
    Compare(Operator),
    /// `AND`, any casing.
    And,
    /// `OR`, any casing.
    Or,
    LParen,
    RParen,
    Keyword(Keyword),
    /// End of input. Always the last token.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Field(name) => write!(f, "field '{}'", name),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Bool(b) => write!(f, "boolean {}", b),
            Token::Compare(op) => write!(f, "operator '{}'", op.symbol()),
            Token::And => write!(f, "'and'"),
            Token::Or => write!(f, "'or'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Keyword(k) => write!(f, "keyword '{}'", k.as_str()),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Resolve backslash escapes: the escaped character is kept literally.
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer that produces spanned tokens, ending with [`Token::Eof`].
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, RawToken>,
    finished: bool,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: RawToken::lexer(source),
            finished: false,
        }
    }

    /// Get the next token. Once input is exhausted this keeps returning
    /// [`Token::Eof`].
    pub fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        if self.finished {
            return Ok(self.eof());
        }

        let raw = match self.inner.next() {
            Some(raw) => raw,
            None => {
                self.finished = true;
                return Ok(self.eof());
            }
        };

        let span: Span = self.inner.span().into();
        let slice = self.inner.slice();

        let token = match raw {
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::Eq) => Token::Compare(Operator::Eq),
            Ok(RawToken::Ne) => Token::Compare(Operator::Ne),
            Ok(RawToken::Gt) => Token::Compare(Operator::Gt),
            Ok(RawToken::Lt) => Token::Compare(Operator::Lt),
            Ok(RawToken::Gte) => Token::Compare(Operator::Gte),
            Ok(RawToken::Lte) => Token::Compare(Operator::Lte),
            Ok(RawToken::BadOperator) => {
                return Err(ParseError::new(format!("unknown operator: {}", slice), span)
                    .with_hint("use one of = != > < >= <="));
            }
            Ok(RawToken::String) => Token::String(unescape_string(&slice[1..slice.len() - 1])),
            Ok(RawToken::UnterminatedString) => {
                return Err(ParseError::new("unterminated string", span)
                    .with_hint(format!("add a closing {}", &slice[..1])));
            }
            Ok(RawToken::Number) => match slice.parse::<f64>() {
                Ok(n) => Token::Number(n),
                Err(_) => {
                    return Err(ParseError::new(format!("invalid number: {}", slice), span));
                }
            },
            Ok(RawToken::Word) => classify_word(slice),
            Err(()) => {
                let bad = self
                    .inner
                    .source()
                    .get(span.start..)
                    .and_then(|rest| rest.chars().next())
                    .unwrap_or('?');
                return Err(ParseError::new(format!("unexpected character: {}", bad), span));
            }
        };

        tracing::trace!(token = %token, start = span.start, end = span.end, "lexed token");
        Ok(SpannedToken { token, span })
    }

    fn eof(&self) -> SpannedToken {
        SpannedToken {
            token: Token::Eof,
            span: Span::point(self.inner.source().len()),
        }
    }
}

fn classify_word(word: &str) -> Token {
    let lower = word.to_lowercase();
    match lower.as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        other => match Keyword::from_lowercase(other) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Field(word.to_string()),
        },
    }
}

/// Tokenize a source string into spanned tokens.
///
/// The result always ends with exactly one [`Token::Eof`]; blank input
/// yields only that terminator.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        let done = tok.token == Token::Eof;
        tokens.push(tok);
        if done {
            return Ok(tokens);
        }
    }
}

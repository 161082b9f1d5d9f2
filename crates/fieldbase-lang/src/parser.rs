//! Recursive descent parser for filter expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or         := and ( OR and )*
//! and        := primary ( AND primary )*
//! primary    := '(' or ')' | FIELD comparison
//! comparison := OP value
//!             | (contains | startswith | endswith) value
//!             | is null | is empty | is not null | is not empty
//! value      := STRING | NUMBER | BOOLEAN
//! ```

use serde::Deserialize;

use crate::ast::{Literal, Node, Operator};
use crate::error::ParseError;
use crate::lexer::{tokenize, Keyword, SpannedToken, Token};
use crate::span::Span;

/// Default limit on parenthesis nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit on the number of conditions in one expression.
///
/// `AND`/`OR` chains build a left-deep tree, so this also bounds its height.
pub const DEFAULT_MAX_TERMS: usize = 512;

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum number of simultaneously open parentheses.
    pub max_depth: usize,
    /// Maximum number of field conditions.
    pub max_terms: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }
}

/// Parser for the filter language.
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
    terms: usize,
    config: ParserConfig,
}

impl Parser {
    /// Create a parser over the given source, lexing it up front.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Self::from_tokens(tokenize(source)?))
    }

    /// Create a parser over a pre-lexed token stream.
    ///
    /// A stream missing its [`Token::Eof`] terminator is treated as if it
    /// had one.
    pub fn from_tokens(mut tokens: Vec<SpannedToken>) -> Self {
        if tokens.last().map(|t| &t.token) != Some(&Token::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(SpannedToken {
                token: Token::Eof,
                span: Span::point(end),
            });
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            terms: 0,
            config: ParserConfig::default(),
        }
    }

    /// Parse a pre-lexed token stream with default settings.
    pub fn parse_tokens(tokens: Vec<SpannedToken>) -> Result<Node, ParseError> {
        Self::from_tokens(tokens).parse_expression()
    }

    /// Set the parser configuration.
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse the whole token stream into an expression.
    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        if self.peek().token == Token::Eof {
            return Ok(Node::Empty);
        }

        let node = self.parse_or()?;

        let trailing = self.peek();
        if trailing.token != Token::Eof {
            return Err(ParseError::new(
                format!("unexpected token {}", trailing.token),
                trailing.span,
            )
            .with_hint("join conditions with AND or OR"));
        }

        Ok(node)
    }

    /// Parse OR chains.
    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_and()?;

        while self.peek().token == Token::Or {
            self.next_token(); // consume OR
            let right = self.parse_and()?;
            left = Node::or(left, right);
        }

        Ok(left)
    }

    /// Parse AND chains.
    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_primary()?;

        while self.peek().token == Token::And {
            self.next_token(); // consume AND
            let right = self.parse_primary()?;
            left = Node::and(left, right);
        }

        Ok(left)
    }

    /// Parse a parenthesized group or a field comparison.
    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let tok = self.next_token();
        match tok.token {
            Token::LParen => {
                self.depth += 1;
                if self.depth > self.config.max_depth {
                    return Err(ParseError::new(
                        format!(
                            "expression nests deeper than {} levels",
                            self.config.max_depth
                        ),
                        tok.span,
                    ));
                }
                let node = self.parse_or()?;
                self.expect_rparen(tok.span)?;
                self.depth -= 1;
                Ok(node)
            }
            Token::Field(field) => {
                self.terms += 1;
                if self.terms > self.config.max_terms {
                    return Err(ParseError::new(
                        format!(
                            "expression has more than {} conditions",
                            self.config.max_terms
                        ),
                        tok.span,
                    ));
                }
                self.parse_comparison(field, tok.span)
            }
            other => Err(ParseError::new(format!("unexpected token {}", other), tok.span)
                .with_hint("a condition starts with a field name or '('")),
        }
    }

    /// Parse what follows a field name.
    fn parse_comparison(&mut self, field: String, field_span: Span) -> Result<Node, ParseError> {
        let tok = self.peek().clone();
        match tok.token {
            Token::Compare(operator) => {
                self.next_token();
                let value = self.parse_value()?;
                Ok(Node::comparison(field, operator, value))
            }
            Token::Keyword(Keyword::Contains) => self.text_comparison(field, Operator::Contains),
            Token::Keyword(Keyword::StartsWith) => {
                self.text_comparison(field, Operator::StartsWith)
            }
            Token::Keyword(Keyword::EndsWith) => self.text_comparison(field, Operator::EndsWith),
            Token::Keyword(Keyword::Is) => {
                self.next_token(); // consume 'is'
                self.parse_is(field)
            }
            _ => Err(ParseError::new(
                format!("expected operator after field '{}'", field),
                field_span.merge(tok.span),
            )
            .with_hint("use =, !=, >, <, >=, <=, contains, startswith, endswith or is")),
        }
    }

    fn text_comparison(&mut self, field: String, operator: Operator) -> Result<Node, ParseError> {
        self.next_token(); // consume keyword
        let value = self.parse_value()?;
        Ok(Node::comparison(field, operator, value))
    }

    /// Parse the tail of `is null`, `is empty`, `is not null`, `is not empty`.
    fn parse_is(&mut self, field: String) -> Result<Node, ParseError> {
        let tok = self.next_token();
        let operator = match tok.token {
            Token::Keyword(Keyword::Null) => Operator::IsNull,
            Token::Keyword(Keyword::Empty) => Operator::IsEmpty,
            Token::Keyword(Keyword::Not) => {
                let tok = self.next_token();
                match tok.token {
                    Token::Keyword(Keyword::Null) => Operator::IsNotNull,
                    Token::Keyword(Keyword::Empty) => Operator::IsNotEmpty,
                    _ => {
                        return Err(ParseError::new(
                            "expected 'null' or 'empty' after 'is not'",
                            tok.span,
                        ))
                    }
                }
            }
            _ => {
                return Err(ParseError::new(
                    "expected 'null', 'not', or 'empty' after 'is'",
                    tok.span,
                ))
            }
        };
        Ok(Node::check(field, operator))
    }

    /// Parse a literal value.
    fn parse_value(&mut self) -> Result<Literal, ParseError> {
        let tok = self.next_token();
        match tok.token {
            Token::String(s) => Ok(Literal::String(s)),
            Token::Number(n) => Ok(Literal::Number(n)),
            Token::Bool(b) => Ok(Literal::Bool(b)),
            other => {
                let err = ParseError::new(format!("expected value, found {}", other), tok.span);
                Err(match other {
                    Token::Field(_) => err.with_hint("quote text values, e.g. \"active\""),
                    Token::Keyword(Keyword::Null) => err.with_hint("use 'is null' to match nulls"),
                    _ => err,
                })
            }
        }
    }

    /// Expect the `)` closing a group opened at `open`.
    fn expect_rparen(&mut self, open: Span) -> Result<(), ParseError> {
        let tok = self.next_token();
        if tok.token == Token::RParen {
            Ok(())
        } else {
            Err(ParseError::new("expected ')'", tok.span).with_hint(format!(
                "the '(' at offset {} is never closed",
                open.start
            )))
        }
    }

    /// Look at the current token. The stream always ends in `Eof`.
    fn peek(&self) -> &SpannedToken {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Consume the current token; `Eof` is never consumed past.
    fn next_token(&mut self) -> SpannedToken {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }
}

/// Parse a source string into an expression with default settings.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    parse_with_config(source, ParserConfig::default())
}

/// Parse a source string into an expression.
pub fn parse_with_config(source: &str, config: ParserConfig) -> Result<Node, ParseError> {
    Parser::new(source)?.with_config(config).parse_expression()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cmp(field: &str, op: Operator, value: Literal) -> Node {
        Node::comparison(field, op, value)
    }

    fn s(v: &str) -> Literal {
        Literal::String(v.to_string())
    }

    fn error(source: &str) -> ParseError {
        parse(source).unwrap_err()
    }

    #[test]
    fn test_parse_simple_comparison() {
        assert_eq!(parse(r#"status = "active""#).unwrap(), cmp("status", Operator::Eq, s("active")));
        assert_eq!(
            parse("price >= 9.99").unwrap(),
            cmp("price", Operator::Gte, Literal::Number(9.99))
        );
        assert_eq!(
            parse("active != false").unwrap(),
            cmp("active", Operator::Ne, Literal::Bool(false))
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse("").unwrap(), Node::Empty);
        assert_eq!(parse("   \n\t").unwrap(), Node::Empty);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let ast = parse("a = 1 OR b = 2 AND c = 3").unwrap();
        assert_eq!(
            ast,
            Node::or(
                cmp("a", Operator::Eq, Literal::Number(1.0)),
                Node::and(
                    cmp("b", Operator::Eq, Literal::Number(2.0)),
                    cmp("c", Operator::Eq, Literal::Number(3.0)),
                ),
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let ast = parse(r#"age > 18 AND (status = "active" OR status = "pending")"#).unwrap();
        assert_eq!(
            ast,
            Node::and(
                cmp("age", Operator::Gt, Literal::Number(18.0)),
                Node::or(
                    cmp("status", Operator::Eq, s("active")),
                    cmp("status", Operator::Eq, s("pending")),
                ),
            )
        );
    }

    #[test]
    fn test_connectives_are_left_associative() {
        let ast = parse("a = 1 and b = 2 AND c = 3").unwrap();
        assert_eq!(
            ast,
            Node::and(
                Node::and(
                    cmp("a", Operator::Eq, Literal::Number(1.0)),
                    cmp("b", Operator::Eq, Literal::Number(2.0)),
                ),
                cmp("c", Operator::Eq, Literal::Number(3.0)),
            )
        );

        let ast = parse("a = 1 or b = 2 Or c = 3").unwrap();
        assert!(matches!(ast, Node::Or { ref left, .. } if matches!(**left, Node::Or { .. })));
    }

    #[test]
    fn test_text_operators() {
        assert_eq!(
            parse(r#"name contains "john""#).unwrap(),
            cmp("name", Operator::Contains, s("john"))
        );
        assert_eq!(
            parse(r#"name STARTSWITH 'Jo'"#).unwrap(),
            cmp("name", Operator::StartsWith, s("Jo"))
        );
        assert_eq!(
            parse("code endswith 42").unwrap(),
            cmp("code", Operator::EndsWith, Literal::Number(42.0))
        );
    }

    #[test]
    fn test_null_and_empty_checks() {
        assert_eq!(parse("note is null").unwrap(), Node::check("note", Operator::IsNull));
        assert_eq!(parse("note IS NOT NULL").unwrap(), Node::check("note", Operator::IsNotNull));
        assert_eq!(parse("note is empty").unwrap(), Node::check("note", Operator::IsEmpty));
        assert_eq!(
            parse("description is not empty").unwrap(),
            Node::check("description", Operator::IsNotEmpty)
        );
    }

    #[test]
    fn test_escaped_quote_in_value() {
        assert_eq!(
            parse(r#"name = "O\"Brien""#).unwrap(),
            cmp("name", Operator::Eq, s("O\"Brien"))
        );
    }

    #[test]
    fn test_missing_value() {
        let err = error("status =");
        assert_eq!(err.message, "expected value, found end of input");
        assert_eq!(err.span, Span::point(8));

        let err = error("status = active");
        assert_eq!(err.message, "expected value, found field 'active'");
        assert!(err.hint.is_some());

        assert_eq!(error("x = null").message, "expected value, found keyword 'null'");
    }

    #[test]
    fn test_missing_operator() {
        assert_eq!(error("status").message, "expected operator after field 'status'");
        assert_eq!(
            error(r#"status "active""#).message,
            "expected operator after field 'status'"
        );
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(error(r#"(status = "x""#).message, "expected ')'");
        assert_eq!(
            error(r#"status = "x")"#).message,
            "unexpected token ')'"
        );
        assert_eq!(error("()").message, "unexpected token ')'");
    }

    #[test]
    fn test_bad_is_clauses() {
        assert_eq!(
            error("x is 5").message,
            "expected 'null', 'not', or 'empty' after 'is'"
        );
        assert_eq!(
            error("x is not true").message,
            "expected 'null' or 'empty' after 'is not'"
        );
        assert_eq!(
            error("x is").message,
            "expected 'null', 'not', or 'empty' after 'is'"
        );
    }

    #[test]
    fn test_trailing_and_dangling_tokens() {
        assert_eq!(error("a = 1 b = 2").message, "unexpected token field 'b'");
        assert_eq!(error("a = 1 AND").message, "unexpected token end of input");
        assert_eq!(error("AND a = 1").message, "unexpected token 'and'");
    }

    #[test]
    fn test_lex_errors_surface_through_parse() {
        assert_eq!(error("status @ active").message, "unexpected character: @");
        // The whole input is lexed before parsing starts.
        assert_eq!(error(r#"x = = "abc"#).message, "unterminated string");
    }

    #[test]
    fn test_depth_limit() {
        let config = ParserConfig {
            max_depth: 3,
            ..ParserConfig::default()
        };

        let ok = "(((a = 1)))";
        assert!(parse_with_config(ok, config).is_ok());

        let too_deep = "((((a = 1))))";
        let err = parse_with_config(too_deep, config).unwrap_err();
        assert_eq!(err.message, "expression nests deeper than 3 levels");
        assert_eq!(err.span, Span::new(3, 4));

        // Sibling groups do not accumulate depth.
        let siblings = "(((a = 1))) AND (((b = 2)))";
        assert!(parse_with_config(siblings, config).is_ok());
    }

    #[test]
    fn test_default_depth_limit_rejects_deep_input() {
        let deep = format!("{}a = 1{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.message, "expression nests deeper than 64 levels");

        let fine = format!("{}a = 1{}", "(".repeat(64), ")".repeat(64));
        assert!(parse(&fine).is_ok());
    }

    #[test]
    fn test_term_limit() {
        let config = ParserConfig {
            max_terms: 3,
            ..ParserConfig::default()
        };
        assert!(parse_with_config("a = 1 AND b = 2 OR c = 3", config).is_ok());

        let err = parse_with_config("a = 1 AND b = 2 OR c = 3 AND d = 4", config).unwrap_err();
        assert_eq!(err.message, "expression has more than 3 conditions");
        assert_eq!(err.span, Span::new(29, 30));

        // Conditions inside groups count too.
        assert!(parse_with_config("(a = 1 AND (b = 2 OR c = 3)) AND d = 4", config).is_err());
    }

    #[test]
    fn test_long_chains_fail_without_exhausting_the_stack() {
        for connective in [" AND ", " OR "] {
            let long = vec!["a = 1"; 100_000].join(connective);
            let err = parse(&long).unwrap_err();
            assert_eq!(err.message, "expression has more than 512 conditions");
        }

        let at_limit = vec!["a = 1"; DEFAULT_MAX_TERMS].join(" AND ");
        let ast = parse(&at_limit).unwrap();
        assert_eq!(ast.fields(), vec!["a"]);
    }

    #[test]
    fn test_four_terms_group_by_and() {
        assert_eq!(
            parse("a=1 AND b=2 OR c=3 AND d=4").unwrap(),
            Node::or(
                Node::and(
                    cmp("a", Operator::Eq, Literal::Number(1.0)),
                    cmp("b", Operator::Eq, Literal::Number(2.0)),
                ),
                Node::and(
                    cmp("c", Operator::Eq, Literal::Number(3.0)),
                    cmp("d", Operator::Eq, Literal::Number(4.0)),
                ),
            )
        );
    }

    #[test]
    fn test_connective_case_does_not_matter() {
        let upper = parse("a=1 AND b=2 OR c=3").unwrap();
        assert_eq!(parse("a=1 and b=2 or c=3").unwrap(), upper);
        assert_eq!(parse("a=1 And b=2 Or c=3").unwrap(), upper);
        assert_eq!(parse("a=1 aNd b=2 oR c=3").unwrap(), upper);
    }

    #[test]
    fn test_unspaced_input() {
        assert_eq!(parse("a=1").unwrap(), parse("a = 1").unwrap());
        assert_eq!(
            parse(r#"(x>=2)AND(y!="z")"#).unwrap(),
            Node::and(
                cmp("x", Operator::Gte, Literal::Number(2.0)),
                cmp("y", Operator::Ne, s("z")),
            )
        );
    }

    #[test]
    fn test_idempotent() {
        let source = r#"(a = 1 OR b contains "x") AND c is not empty"#;
        assert_eq!(parse(source).unwrap(), parse(source).unwrap());
    }

    #[test]
    fn test_from_tokens_without_terminator() {
        let mut tokens = tokenize("a = 1").unwrap();
        tokens.pop();
        let ast = Parser::from_tokens(tokens).parse_expression().unwrap();
        assert_eq!(ast, cmp("a", Operator::Eq, Literal::Number(1.0)));

        assert_eq!(Parser::from_tokens(Vec::new()).parse_expression().unwrap(), Node::Empty);
    }

    #[test]
    fn test_parse_tokens_matches_parse() {
        let source = r#"name startswith "Jo" OR age <= 3"#;
        let tokens = tokenize(source).unwrap();
        assert_eq!(Parser::parse_tokens(tokens).unwrap(), parse(source).unwrap());

        let tokens = tokenize("a =").unwrap();
        assert_eq!(
            Parser::parse_tokens(tokens).unwrap_err().message,
            "expected value, found end of input"
        );
    }
}

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{lex, Lexem};
use crate::options::SyntaxOptions;

type Result<T> = std::result::Result<T, ParseError>;

/// Recursive-descent parser over a lexem stream.
///
/// The cursor only moves forward. Whitespace lexems are skipped between
/// meaningful tokens but kept inside literals. A punctuation run that is not
/// an operator as a whole can be consumed piecewise, so the cursor may stand
/// inside such a lexem (`offset`).
pub struct Parser<'a, 'o> {
    lexems: Vec<Lexem<'a>>,
    pos: usize,
    offset: usize,
    end: usize,
    options: &'o SyntaxOptions,
}

impl<'a, 'o> Parser<'a, 'o> {
    pub fn new(input: &'a str, options: &'o SyntaxOptions) -> Self {
        Self {
            lexems: lex(input),
            pos: 0,
            offset: 0,
            end: input.len(),
            options,
        }
    }

    /// The lexem under the cursor, trimmed to the unconsumed part.
    fn current(&self) -> Lexem<'a> {
        match self.lexems.get(self.pos) {
            Some(l) if self.offset > 0 => Lexem::new(&l.text()[self.offset..], l.offset() + self.offset),
            Some(l) => *l,
            None => Lexem::terminal(self.end),
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.offset = 0;
    }

    /// Consumes `len` bytes of the current lexem.
    fn consume(&mut self, len: usize) {
        let remaining = self.current().text().len();
        if len >= remaining {
            self.advance();
        } else {
            self.offset += len;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.offset == 0 && self.current().is_whitespace() {
            self.advance();
        }
    }

    /// Next meaningful lexem without moving the cursor, and whether
    /// whitespace had to be skipped to reach it.
    fn lookahead(&self) -> (Lexem<'a>, bool) {
        if self.offset > 0 {
            return (self.current(), false);
        }
        let mut pos = self.pos;
        while let Some(l) = self.lexems.get(pos) {
            if !l.is_whitespace() {
                return (*l, pos > self.pos);
            }
            pos += 1;
        }
        (Lexem::terminal(self.end), pos > self.pos)
    }

    /// Next meaningful lexem text, or `None` at end of input.
    pub fn peek(&self) -> Option<&'a str> {
        let (lexem, _) = self.lookahead();
        (!lexem.is_terminal()).then(|| lexem.text())
    }

    pub fn is_at_end(&self) -> bool {
        self.lookahead().0.is_terminal()
    }

    /// Maps the start of a punctuation lexem to an operator: the whole text
    /// first, then its longest prefix that is one.
    fn match_op<T>(lexem: Lexem<'_>, lookup: impl Fn(&str) -> Option<T>) -> Option<(T, usize)> {
        if !lexem.is_punctuation() {
            return None;
        }
        let text = lexem.text();
        if let Some(op) = lookup(text) {
            return Some((op, text.len()));
        }
        text.char_indices()
            .map(|(i, _)| i)
            .filter(|&i| i > 0)
            .rev()
            .find_map(|len| lookup(&text[..len]).map(|op| (op, len)))
    }

    fn starts_operand(&self, lexem: Lexem<'_>) -> bool {
        lexem.is_identifier()
            || lexem.is_numeric()
            || lexem.quote().is_some()
            || lexem.bracket().and_then(BracketKind::from_open).is_some()
            || Self::match_op(lexem, |t| self.options.to_prefix_op(t)).is_some()
    }

    fn unexpected(lexem: Lexem<'_>, expected: &'static str) -> ParseError {
        if lexem.is_terminal() {
            ParseError::UnexpectedEnd { expected }
        } else {
            ParseError::UnexpectedToken {
                found: lexem.text().to_string(),
                offset: lexem.offset(),
                expected,
            }
        }
    }

    /// One identifier, numeral, bracketed group or quoted literal.
    pub fn parse_term(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        let lexem = self.current();

        if lexem.quote().is_some() {
            return self.parse_literal();
        }
        if lexem.bracket().and_then(BracketKind::from_open).is_some() {
            return self.parse_expr_in_brackets();
        }
        if lexem.is_identifier() {
            self.advance();
            return Ok(Expr::Identifier(lexem.text().to_string()));
        }
        if lexem.is_numeric() {
            self.advance();
            return Ok(Expr::Numeric(lexem.text().to_string()));
        }
        Err(Self::unexpected(lexem, "a term"))
    }

    /// Prefix operators, a term and at most one postfix operator.
    pub fn parse_operand(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        let options = self.options;

        if let Some((op, len)) = Self::match_op(self.current(), |t| options.to_prefix_op(t)) {
            self.consume(len);
            let operand = self.parse_operand()?;
            return Ok(Expr::prefix(op, operand));
        }

        let term = self.parse_term()?;

        // Whitespace before a postfix is skipped only when one follows, so a
        // whitespace separator after the term stays visible.
        let (next, _) = self.lookahead();
        if let Some((op, len)) = Self::match_op(next, |t| options.to_postfix_op(t)) {
            self.skip_whitespace();
            self.consume(len);
            return Ok(Expr::postfix(term, op));
        }
        Ok(term)
    }

    /// An operand followed by any number of infix operator/operand pairs,
    /// kept flat and in source order.
    pub fn parse_operation(&mut self) -> Result<Expr> {
        let first = self.parse_operand()?;
        let options = self.options;
        let mut rest = Vec::new();

        loop {
            let (lexem, _) = self.lookahead();
            let Some((op, len)) = Self::match_op(lexem, |t| options.to_infix_op(t)) else {
                break;
            };
            self.skip_whitespace();
            self.consume(len);
            let operand = self.parse_operand()?;
            rest.push((op, operand));
        }

        Ok(match rest.len() {
            0 => first,
            1 => {
                let (op, right) = rest.remove(0);
                Expr::binary(first, op, right)
            }
            _ => Expr::Chain {
                first: Box::new(first),
                rest,
            },
        })
    }

    /// Operations joined by one separator kind.
    pub fn parse_sequence(&mut self) -> Result<Expr> {
        self.parse_sequence_of(Self::parse_operation)
    }

    /// Terms joined by one separator kind.
    pub fn parse_term_sequence(&mut self) -> Result<Expr> {
        self.parse_sequence_of(Self::parse_term)
    }

    fn parse_sequence_of(&mut self, item: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        let mut terms = vec![item(self)?];
        let mut separator: Option<Separator> = None;

        loop {
            let (lexem, had_whitespace) = self.lookahead();
            let explicit = lexem
                .is_punctuation()
                .then(|| Separator::from_text(lexem.text()))
                .flatten();
            let found = match explicit {
                Some(sep) => sep,
                None if had_whitespace && self.starts_operand(lexem) => Separator::Whitespace,
                None => break,
            };

            match separator {
                None => separator = Some(found),
                Some(expected) if expected != found => {
                    return Err(ParseError::InconsistentSeparator {
                        expected,
                        found,
                        offset: lexem.offset(),
                    });
                }
                Some(_) => {}
            }

            if found != Separator::Whitespace {
                self.skip_whitespace();
                self.consume(lexem.text().len());
            }
            terms.push(item(self)?);
        }

        match separator {
            None => Ok(terms.remove(0)),
            Some(separator) => Ok(Expr::Sequence { terms, separator }),
        }
    }

    pub fn parse_expr_in_brackets(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        let open = self.current();
        let Some(kind) = open.bracket().and_then(BracketKind::from_open) else {
            return Err(Self::unexpected(open, "an opening bracket"));
        };
        if !self.options.allows_bracket(kind) {
            return Err(ParseError::DisallowedBracket {
                bracket: kind.open(),
                offset: open.offset(),
            });
        }
        self.advance();

        let inner = self.parse_sequence()?;

        self.skip_whitespace();
        let close = self.current();
        if close.is_terminal() {
            return Err(ParseError::UnexpectedEnd {
                expected: "a closing bracket",
            });
        }
        if close.bracket() != Some(kind.close()) {
            return Err(ParseError::MismatchedBracket {
                expected: kind.close(),
                found: close.text().to_string(),
                offset: close.offset(),
            });
        }
        self.advance();

        Ok(Expr::grouped(kind, inner))
    }

    /// Everything up to the same quote character, verbatim.
    pub fn parse_literal(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        let open = self.current();
        let Some(quote) = open.quote().and_then(QuoteKind::from_char) else {
            return Err(Self::unexpected(open, "a quoted literal"));
        };
        self.advance();

        let mut text = String::new();
        loop {
            let lexem = self.current();
            if lexem.is_terminal() {
                return Err(ParseError::UnterminatedLiteral {
                    quote: quote.as_char(),
                    offset: open.offset(),
                });
            }
            self.advance();
            if lexem.quote() == Some(quote.as_char()) {
                return Ok(Expr::Literal { quote, text });
            }
            text.push_str(lexem.text());
        }
    }

    /// Fails unless only whitespace is left.
    pub fn expect_end(&mut self) -> Result<()> {
        self.skip_whitespace();
        let lexem = self.current();
        if lexem.is_terminal() {
            Ok(())
        } else {
            Err(ParseError::TrailingInput {
                found: lexem.text().to_string(),
                offset: lexem.offset(),
            })
        }
    }
}

fn flatten(expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::Sequence { terms, .. } => terms,
        other => vec![other],
    }
}

/// Parses the whole input as one operation.
pub fn parse_expression(input: &str, options: &SyntaxOptions) -> Result<Expr> {
    let mut parser = Parser::new(input, options);
    let expr = parser.parse_operation()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parses the whole input as a single term.
pub fn parse_term(input: &str, options: &SyntaxOptions) -> Result<Expr> {
    let mut parser = Parser::new(input, options);
    let expr = parser.parse_term()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parses the whole input as a sequence and returns its terms.
pub fn parse_terms(input: &str, options: &SyntaxOptions) -> Result<Vec<Expr>> {
    let mut parser = Parser::new(input, options);
    let expr = parser.parse_term_sequence()?;
    parser.expect_end()?;
    Ok(flatten(expr))
}

/// Parses the whole input as a sequence of operations.
pub fn parse_expressions(input: &str, options: &SyntaxOptions) -> Result<Vec<Expr>> {
    let mut parser = Parser::new(input, options);
    let expr = parser.parse_sequence()?;
    parser.expect_end()?;
    Ok(flatten(expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> SyntaxOptions {
        SyntaxOptions::default()
    }

    fn id(name: &str) -> Expr {
        Expr::ident(name)
    }

    #[test]
    fn term_kinds() {
        let options = opts();
        assert_eq!(parse_term("foo", &options).unwrap(), id("foo"));
        assert_eq!(parse_term(" 42 ", &options).unwrap(), Expr::numeric("42"));
        assert_eq!(
            parse_term("'a b'", &options).unwrap(),
            Expr::literal(QuoteKind::Single, "a b")
        );
        assert_eq!(
            parse_term("(x)", &options).unwrap(),
            Expr::grouped(BracketKind::Paren, id("x"))
        );
    }

    #[test]
    fn term_rejects_punctuation_and_end() {
        let options = opts();
        let mut parser = Parser::new("+", &options);
        assert!(matches!(parser.parse_term(), Err(ParseError::UnexpectedToken { .. })));

        let mut parser = Parser::new("   ", &options);
        assert!(matches!(parser.parse_term(), Err(ParseError::UnexpectedEnd { .. })));
    }

    #[test]
    fn prefixes_nest_right_to_left() {
        let options = opts();
        let mut parser = Parser::new("++*a", &options);
        assert_eq!(
            parser.parse_operand().unwrap(),
            Expr::prefix(PrefixOp::Plus2, Expr::prefix(PrefixOp::Star, id("a")))
        );
        assert!(parser.is_at_end());
    }

    #[test]
    fn postfix_is_capped_at_one() {
        let options = opts();
        let mut parser = Parser::new("a++ ++", &options);
        assert_eq!(
            parser.parse_operand().unwrap(),
            Expr::postfix(id("a"), PostfixOp::Plus2)
        );
        assert_eq!(parser.peek(), Some("++"));
    }

    #[test]
    fn postfix_may_follow_whitespace() {
        let options = opts();
        let mut parser = Parser::new("a ++", &options);
        assert_eq!(
            parser.parse_operand().unwrap(),
            Expr::postfix(id("a"), PostfixOp::Plus2)
        );
        assert!(parser.is_at_end());

        let mut parser = Parser::new("a -- --", &options);
        assert_eq!(
            parser.parse_operand().unwrap(),
            Expr::postfix(id("a"), PostfixOp::Minus2)
        );
        assert_eq!(parser.peek(), Some("--"));
    }

    #[test]
    fn longest_operator_prefix_is_taken() {
        let options = opts();
        let mut parser = Parser::new("!!a", &options);
        assert_eq!(
            parser.parse_operand().unwrap(),
            Expr::prefix(PrefixOp::Not, Expr::prefix(PrefixOp::Not, id("a")))
        );
        assert_eq!(
            parse_expression("a<-1", &options).unwrap(),
            Expr::binary(id("a"), InfixOp::Lt, Expr::prefix(PrefixOp::Minus, Expr::numeric("1")))
        );
    }

    #[test]
    fn single_infix_is_binary() {
        let options = opts();
        assert_eq!(
            parse_expression("$foo=1", &options).unwrap(),
            Expr::binary(id("$foo"), InfixOp::Eq, Expr::numeric("1"))
        );
    }

    #[test]
    fn operator_chains_stay_flat() {
        let options = opts();
        assert_eq!(
            parse_expression("a + b * a", &options).unwrap(),
            Expr::Chain {
                first: Box::new(id("a")),
                rest: vec![(InfixOp::Plus, id("b")), (InfixOp::Mult, id("a"))],
            }
        );
    }

    #[test]
    fn punctuation_runs_split_into_operators() {
        let options = opts();
        assert_eq!(
            parse_expression("a=-1", &options).unwrap(),
            Expr::binary(id("a"), InfixOp::Eq, Expr::prefix(PrefixOp::Minus, Expr::numeric("1")))
        );
        assert_eq!(
            parse_expression("a!=b", &options).unwrap(),
            Expr::binary(id("a"), InfixOp::Ne, id("b"))
        );
    }

    #[test]
    fn denied_operator_is_not_an_operator() {
        let options = SyntaxOptions::new().deny_infix([InfixOp::Plus]);
        let err = parse_expression("a + b", &options).unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { ref found, .. } if found == "+"));
    }

    #[test]
    fn dot_sequence() {
        let options = opts();
        assert_eq!(
            parse_expressions("a.b.c", &options).unwrap(),
            vec![id("a"), id("b"), id("c")]
        );
        let mut parser = Parser::new("a.b.c", &options);
        assert!(matches!(
            parser.parse_sequence().unwrap(),
            Expr::Sequence { separator: Separator::Dot, ref terms } if terms.len() == 3
        ));
    }

    #[test]
    fn mixed_separators_fail() {
        let options = opts();
        let mut parser = Parser::new("a.b,c", &options);
        assert_eq!(
            parser.parse_sequence().unwrap_err(),
            ParseError::InconsistentSeparator {
                expected: Separator::Dot,
                found: Separator::Comma,
                offset: 3,
            }
        );

        let mut parser = Parser::new("a.b c", &options);
        assert!(matches!(
            parser.parse_sequence(),
            Err(ParseError::InconsistentSeparator { found: Separator::Whitespace, .. })
        ));
    }

    #[test]
    fn whitespace_sequence_of_operations() {
        let options = SyntaxOptions::attributes();
        assert_eq!(
            parse_expressions("$foo=1 $bar = 2 !$baz", &options).unwrap(),
            vec![
                Expr::binary(id("$foo"), InfixOp::Eq, Expr::numeric("1")),
                Expr::binary(id("$bar"), InfixOp::Eq, Expr::numeric("2")),
                Expr::prefix(PrefixOp::Not, id("$baz")),
            ]
        );
    }

    #[test]
    fn single_term_is_not_wrapped() {
        let options = opts();
        let mut parser = Parser::new("  x  ", &options);
        assert_eq!(parser.parse_sequence().unwrap(), id("x"));
    }

    #[test]
    fn brackets_hold_sequences() {
        let options = opts();
        assert_eq!(
            parse_expression("f(a, b)", &options).unwrap_err(),
            ParseError::TrailingInput {
                found: "(".to_string(),
                offset: 1,
            }
        );
        assert_eq!(
            parse_term("[a, b]", &options).unwrap(),
            Expr::grouped(
                BracketKind::Square,
                Expr::Sequence {
                    terms: vec![id("a"), id("b")],
                    separator: Separator::Comma,
                }
            )
        );
    }

    #[test]
    fn bracket_errors() {
        let options = opts();
        assert_eq!(
            parse_term("(a]", &options).unwrap_err(),
            ParseError::MismatchedBracket {
                expected: ')',
                found: "]".to_string(),
                offset: 2,
            }
        );
        assert!(matches!(parse_term("(a", &options), Err(ParseError::UnexpectedEnd { .. })));

        let options = SyntaxOptions::attributes();
        assert_eq!(
            parse_term("{a}", &options).unwrap_err(),
            ParseError::DisallowedBracket {
                bracket: '{',
                offset: 0,
            }
        );
    }

    #[test]
    fn literal_takes_everything_until_same_quote() {
        let options = opts();
        assert_eq!(
            parse_term("'a \"(b)\" = `c`'", &options).unwrap(),
            Expr::literal(QuoteKind::Single, "a \"(b)\" = `c`")
        );
        assert_eq!(parse_term("''", &options).unwrap(), Expr::literal(QuoteKind::Single, ""));
    }

    #[test]
    fn unterminated_literal() {
        let options = opts();
        assert_eq!(
            parse_term("  'abc", &options).unwrap_err(),
            ParseError::UnterminatedLiteral {
                quote: '\'',
                offset: 2,
            }
        );
    }

    #[test]
    fn grouped_chain_with_or() {
        let options = SyntaxOptions::attributes();
        let expr = parse_expression("($a = x || $b = y)", &options).unwrap();
        let Expr::Grouped { bracket, inner } = expr else {
            panic!("expected a group");
        };
        assert_eq!(bracket, BracketKind::Paren);
        assert!(matches!(*inner, Expr::Chain { ref rest, .. } if rest.len() == 3));
    }
}

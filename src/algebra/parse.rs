use crate::{
    algebra::{
        ops::{self, EvaluationError},
        Context, Expr, Number, Statement,
    },
    Error, Limits,
};
use num_bigint::BigInt;
use smol_str::SmolStr;
use std::{
    fmt::{self, Display, Formatter},
    iter::Peekable,
    ops::Range,
};

/// A recursive descent parser which evaluates as it goes, so every rule hands
/// back a canonical [`Expr`] instead of a syntax tree.
///
/// The grammar:
///
/// ```text
/// statement  := assignment | expr
/// assignment := IDENTIFIER "=" expr
/// expr       := term (("+" | "-") term)*
/// term       := factor (("*" | "/") factor)*
/// factor     := ("+" | "-")* power
/// power      := primary ("^" primary)*
/// primary    := IDENTIFIER "(" expr ")"
///             | "(" expr ")"
///             | INTEGER | FLOAT | IDENTIFIER
/// ```
///
/// `^` is right-associative, everything else is left-associative. Note that
/// the operand of `^` is a `primary`, so `2^-1` has to be written `2^(-1)`.
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a, C> {
    tokens: Peekable<Tokens<'a>>,
    ctx: &'a C,
    limits: &'a Limits,
    depth: usize,
    end: usize,
}

const BINARY_OPERATORS: &[TokenKind] = &[
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Times,
    TokenKind::Divide,
    TokenKind::Caret,
];

const PRIMARY: &[TokenKind] = &[
    TokenKind::Integer,
    TokenKind::Float,
    TokenKind::Identifier,
    TokenKind::OpenParen,
];

impl<'a, C: Context> Parser<'a, C> {
    pub(crate) fn new(src: &'a str, ctx: &'a C, limits: &'a Limits) -> Self {
        Parser {
            tokens: Tokens::new(src).peekable(),
            ctx,
            limits,
            depth: 0,
            end: src.len(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<Statement, Error> {
        let statement = self.statement()?;

        match self.tokens.next() {
            None => Ok(statement),
            Some(Ok(token)) => Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected: BINARY_OPERATORS,
            }
            .into()),
            Some(Err(e)) => Err(e.into()),
        }
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.tokens
            .peek()
            .and_then(|result| result.as_ref().ok())
            .map(|tok| tok.kind)
    }

    fn advance(
        &mut self,
        expected: &'static [TokenKind],
    ) -> Result<Token<'a>, ParseError> {
        match self.tokens.next() {
            Some(result) => result,
            None => Err(ParseError::UnexpectedEndOfInput {
                index: self.end,
                expected,
            }),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        let expected: &'static [TokenKind] = match kind {
            TokenKind::CloseParen => &[TokenKind::CloseParen],
            TokenKind::Equals => &[TokenKind::Equals],
            _ => unreachable!("{:?} is never expected on its own", kind),
        };

        let token = self.advance(expected)?;

        if token.kind == kind {
            Ok(token)
        } else {
            Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected,
            })
        }
    }

    fn statement(&mut self) -> Result<Statement, Error> {
        // an assignment needs two tokens of lookahead
        let mut lookahead = self.tokens.clone();
        let is_assignment = matches!(
            (lookahead.next(), lookahead.next()),
            (
                Some(Ok(Token { kind: TokenKind::Identifier, .. })),
                Some(Ok(Token { kind: TokenKind::Equals, .. })),
            )
        );

        if is_assignment {
            let target = self.advance(PRIMARY)?;
            self.expect(TokenKind::Equals)?;
            let value = self.expression()?;

            Ok(Statement::Assignment {
                target: SmolStr::new(target.text),
                value,
            })
        } else {
            self.expression().map(Statement::Expression)
        }
    }

    fn expression(&mut self) -> Result<Expr, Error> {
        let mut run = vec![Item::Operand(self.term()?)];

        while let Some(kind @ TokenKind::Plus) | Some(kind @ TokenKind::Minus) =
            self.peek()
        {
            let _ = self.advance(BINARY_OPERATORS)?;
            run.push(Item::Operator(kind));
            run.push(Item::Operand(self.term()?));
        }

        let limits = self.limits;
        let folded = fold(
            run,
            Associativity::Left,
            TokenKind::Plus,
            Expr::integer(0),
            |left, right| Ok(ops::add(left, right)),
            |left, right| ops::sub(left, right, limits),
        )?;

        Ok(folded)
    }

    fn term(&mut self) -> Result<Expr, Error> {
        let mut run = vec![Item::Operand(self.factor()?)];

        while let Some(kind @ TokenKind::Times) | Some(kind @ TokenKind::Divide) =
            self.peek()
        {
            let _ = self.advance(BINARY_OPERATORS)?;
            run.push(Item::Operator(kind));
            run.push(Item::Operand(self.factor()?));
        }

        let limits = self.limits;
        let folded = fold(
            run,
            Associativity::Left,
            TokenKind::Times,
            Expr::integer(1),
            |left, right| ops::mul(left, right, limits),
            |left, right| ops::div(left, right, limits),
        )?;

        Ok(folded)
    }

    fn factor(&mut self) -> Result<Expr, Error> {
        let mut negate = false;

        while let Some(kind @ TokenKind::Plus) | Some(kind @ TokenKind::Minus) =
            self.peek()
        {
            let _ = self.advance(PRIMARY)?;
            negate ^= kind == TokenKind::Minus;
        }

        let value = self.power()?;

        if negate {
            Ok(ops::neg(value, self.limits)?)
        } else {
            Ok(value)
        }
    }

    fn power(&mut self) -> Result<Expr, Error> {
        let mut run = vec![Item::Operand(self.primary()?)];

        while self.peek() == Some(TokenKind::Caret) {
            let _ = self.advance(BINARY_OPERATORS)?;
            run.push(Item::Operator(TokenKind::Caret));
            run.push(Item::Operand(self.primary()?));
        }

        let limits = self.limits;
        let folded = fold(
            run,
            Associativity::Right,
            TokenKind::Caret,
            Expr::integer(1),
            |base, exponent| ops::pow(base, exponent, limits),
            |base, exponent| ops::pow(base, exponent, limits),
        )?;

        Ok(folded)
    }

    fn primary(&mut self) -> Result<Expr, Error> {
        let token = self.advance(PRIMARY)?;

        match token.kind {
            TokenKind::Integer => {
                let value: BigInt =
                    token.text.parse().expect("Guaranteed correct by the lexer");
                Ok(Expr::integer(value))
            },
            TokenKind::Float => {
                Ok(Expr::Number(Number::parse_float(token.text, self.limits)?))
            },
            TokenKind::Identifier
                if self.peek() == Some(TokenKind::OpenParen) =>
            {
                self.function_call(token)
            },
            TokenKind::Identifier => Ok(Expr::Symbol(SmolStr::new(token.text))),
            TokenKind::OpenParen => {
                let expr = self.nested(token.span.start, |p| p.expression())?;
                self.expect(TokenKind::CloseParen)?;
                Ok(expr)
            },
            found => Err(ParseError::UnexpectedToken {
                found,
                span: token.span,
                expected: PRIMARY,
            }
            .into()),
        }
    }

    fn function_call(&mut self, identifier: Token<'a>) -> Result<Expr, Error> {
        let open_paren = self.advance(&[TokenKind::OpenParen])?;
        debug_assert_eq!(open_paren.kind, TokenKind::OpenParen);

        let argument = self.nested(open_paren.span.start, |p| p.expression())?;
        self.expect(TokenKind::CloseParen)?;

        let function = self.ctx.function(identifier.text).ok_or_else(|| {
            Error::UnknownFunction {
                name: SmolStr::new(identifier.text),
            }
        })?;

        Ok(function.apply(argument, self.limits)?)
    }

    /// Run `parse` one level of parentheses deeper.
    fn nested<F>(&mut self, index: usize, parse: F) -> Result<Expr, Error>
    where
        F: FnOnce(&mut Self) -> Result<Expr, Error>,
    {
        if self.depth >= self.limits.max_depth {
            return Err(ParseError::TooDeeplyNested {
                index,
                limit: self.limits.max_depth,
            }
            .into());
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;

        result
    }
}

#[derive(Debug)]
enum Item {
    Operator(TokenKind),
    Operand(Expr),
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Associativity {
    Left,
    Right,
}

/// Reduce a run of operands and operators (`a + b - c`) to a single value.
///
/// Starting from `seed`, each operand is merged into the result using
/// `first` if the operator before it was `primary` and `second` otherwise.
/// Right-associative runs are walked backwards with the operands swapped, so
/// `a^b^c` is `a^(b^c)`.
fn fold<F, G>(
    run: Vec<Item>,
    associativity: Associativity,
    primary: TokenKind,
    seed: Expr,
    mut first: F,
    mut second: G,
) -> Result<Expr, EvaluationError>
where
    F: FnMut(Expr, Expr) -> Result<Expr, EvaluationError>,
    G: FnMut(Expr, Expr) -> Result<Expr, EvaluationError>,
{
    let items: Box<dyn Iterator<Item = Item>> = match associativity {
        Associativity::Left => Box::new(run.into_iter()),
        Associativity::Right => Box::new(run.into_iter().rev()),
    };

    let mut result = seed;
    let mut use_first = true;

    for item in items {
        match item {
            Item::Operator(op) => use_first = op == primary,
            Item::Operand(operand) => {
                let (left, right) = match associativity {
                    Associativity::Left => (result, operand),
                    Associativity::Right => (operand, result),
                };

                result = if use_first {
                    first(left, right)?
                } else {
                    second(left, right)?
                };
            },
        }
    }

    Ok(result)
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("unexpected end of input, expected {}", one_of(.expected))]
    UnexpectedEndOfInput {
        index: usize,
        expected: &'static [TokenKind],
    },
    #[error(
        "found {found} at index {}, expected {}",
        .span.start,
        one_of(.expected)
    )]
    UnexpectedToken {
        found: TokenKind,
        span: Range<usize>,
        expected: &'static [TokenKind],
    },
    #[error("the input is {length} bytes long, the limit is {limit}")]
    InputTooLong { length: usize, limit: usize },
    #[error("nested more than {limit} levels deep at index {index}")]
    TooDeeplyNested { index: usize, limit: usize },
}

impl ParseError {
    /// The byte offset the error was detected at. Inputs that are too long
    /// are rejected at their end.
    pub fn position(&self) -> usize {
        match self {
            ParseError::InvalidCharacter { index, .. }
            | ParseError::UnexpectedEndOfInput { index, .. }
            | ParseError::TooDeeplyNested { index, .. } => *index,
            ParseError::UnexpectedToken { span, .. } => span.start,
            ParseError::InputTooLong { limit, .. } => *limit,
        }
    }
}

fn one_of(kinds: &[TokenKind]) -> String {
    let names: Vec<String> = kinds.iter().map(ToString::to_string).collect();

    match names.as_slice() {
        [] => String::from("nothing"),
        [single] => single.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tokens<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(src: &'a str) -> Self { Tokens { src, cursor: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn chomp(
        &mut self,
        kind: TokenKind,
    ) -> Option<Result<Token<'a>, ParseError>> {
        let start = self.cursor;
        self.advance()?;
        let end = self.cursor;

        Some(Ok(Token::from_text(self.src, start..end, kind)))
    }

    fn take_while<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        self.cursor - start
    }

    fn chomp_digits(&mut self) -> usize {
        self.take_while(|c| c.is_ascii_digit())
    }

    /// Integers are `0` or don't start with a zero. Floats need a decimal
    /// point, and may only have an exponent after one.
    fn chomp_number(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.cursor;

        let whole_digits = match self.peek() {
            Some('0') => {
                self.advance();
                1
            },
            Some('1'..='9') => self.chomp_digits(),
            _ => 0,
        };

        if self.peek() != Some('.') {
            return Ok(Token::from_text(
                self.src,
                start..self.cursor,
                TokenKind::Integer,
            ));
        }

        // skip past the decimal
        self.advance();
        let fraction_digits = self.chomp_digits();

        if whole_digits == 0 && fraction_digits == 0 {
            return Err(ParseError::InvalidCharacter {
                character: '.',
                index: start,
            });
        }

        self.chomp_exponent();

        Ok(Token::from_text(self.src, start..self.cursor, TokenKind::Float))
    }

    /// An optional `[eE][+-]?digits`, left alone if there are no digits.
    fn chomp_exponent(&mut self) {
        let before = self.cursor;

        if !matches!(self.peek(), Some('e') | Some('E')) {
            return;
        }
        self.advance();

        if matches!(self.peek(), Some('+') | Some('-')) {
            self.advance();
        }

        if self.chomp_digits() == 0 {
            self.cursor = before;
        }
    }

    fn chomp_identifier(&mut self) -> Token<'a> {
        let start = self.cursor;
        let mut seen_first_character = false;

        self.take_while(|c| {
            if seen_first_character {
                c.is_alphanumeric() || c == '_'
            } else {
                seen_first_character = true;
                c.is_alphabetic() || c == '_'
            }
        });

        Token::from_text(self.src, start..self.cursor, TokenKind::Identifier)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.peek()? {
                space if space.is_whitespace() => {
                    self.advance();
                    continue;
                },
                '(' => self.chomp(TokenKind::OpenParen),
                ')' => self.chomp(TokenKind::CloseParen),
                '+' => self.chomp(TokenKind::Plus),
                '-' => self.chomp(TokenKind::Minus),
                '*' => self.chomp(TokenKind::Times),
                '/' => self.chomp(TokenKind::Divide),
                '^' => self.chomp(TokenKind::Caret),
                '=' => self.chomp(TokenKind::Equals),
                '0'..='9' | '.' => Some(self.chomp_number()),
                c if c.is_alphabetic() || c == '_' => {
                    Some(Ok(self.chomp_identifier()))
                },
                other => {
                    let index = self.cursor;
                    // don't get stuck on the same character
                    self.advance();
                    Some(Err(ParseError::InvalidCharacter {
                        character: other,
                        index,
                    }))
                },
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token<'a> {
    text: &'a str,
    span: Range<usize>,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    fn from_text(
        original_source: &'a str,
        span: Range<usize>,
        kind: TokenKind,
    ) -> Self {
        Token {
            text: &original_source[span.clone()],
            span,
            kind,
        }
    }
}

/// The kinds of token that can appear in an [`Expr`]'s text form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    Float,
    OpenParen,
    CloseParen,
    Plus,
    Minus,
    Times,
    Divide,
    Caret,
    Equals,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "an identifier"),
            TokenKind::Integer => write!(f, "an integer"),
            TokenKind::Float => write!(f, "a decimal number"),
            TokenKind::OpenParen => write!(f, "\"(\""),
            TokenKind::CloseParen => write!(f, "\")\""),
            TokenKind::Plus => write!(f, "\"+\""),
            TokenKind::Minus => write!(f, "\"-\""),
            TokenKind::Times => write!(f, "\"*\""),
            TokenKind::Divide => write!(f, "\"/\""),
            TokenKind::Caret => write!(f, "\"^\""),
            TokenKind::Equals => write!(f, "\"=\""),
        }
    }
}

#[cfg(test)]
mod tokenizer_tests {
    use super::*;

    macro_rules! tokenize_test {
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let mut tokens = Tokens::new($src);

                let got = tokens.next().unwrap().unwrap();

                let Range { start, end } = got.span;
                assert_eq!(start, 0);
                assert_eq!(end, $src.len());
                assert_eq!(got.kind, $should_be);

                assert!(
                    tokens.next().is_none(),
                    "{:?} should be empty",
                    tokens
                );
            }
        };
    }

    tokenize_test!(open_paren, "(", TokenKind::OpenParen);
    tokenize_test!(close_paren, ")", TokenKind::CloseParen);
    tokenize_test!(plus, "+", TokenKind::Plus);
    tokenize_test!(minus, "-", TokenKind::Minus);
    tokenize_test!(times, "*", TokenKind::Times);
    tokenize_test!(divide, "/", TokenKind::Divide);
    tokenize_test!(caret, "^", TokenKind::Caret);
    tokenize_test!(equals, "=", TokenKind::Equals);
    tokenize_test!(zero, "0", TokenKind::Integer);
    tokenize_test!(single_digit_integer, "3", TokenKind::Integer);
    tokenize_test!(multi_digit_integer, "31", TokenKind::Integer);
    tokenize_test!(number_with_trailing_dot, "31.", TokenKind::Float);
    tokenize_test!(simple_decimal, "3.14", TokenKind::Float);
    tokenize_test!(leading_dot, ".5", TokenKind::Float);
    tokenize_test!(zero_point_something, "0.05", TokenKind::Float);
    tokenize_test!(decimal_with_exponent, "1.0e5", TokenKind::Float);
    tokenize_test!(trailing_dot_with_exponent, "1.e-5", TokenKind::Float);
    tokenize_test!(capital_exponent, ".5E+2", TokenKind::Float);
    tokenize_test!(simple_identifier, "x", TokenKind::Identifier);
    tokenize_test!(longer_identifier, "hello", TokenKind::Identifier);
    tokenize_test!(
        identifiers_can_have_underscores,
        "hello_world",
        TokenKind::Identifier
    );
    tokenize_test!(
        identifiers_can_start_with_underscores,
        "_hello_world",
        TokenKind::Identifier
    );
    tokenize_test!(
        identifiers_can_contain_numbers,
        "var5",
        TokenKind::Identifier
    );
    tokenize_test!(unicode_identifiers, "θ", TokenKind::Identifier);

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        Tokens::new(src)
            .map(|tok| tok.unwrap())
            .map(|tok| (tok.kind, tok.text))
            .collect()
    }

    #[test]
    fn leading_zeros_start_a_new_token() {
        let got = kinds("012");

        assert_eq!(
            got,
            vec![(TokenKind::Integer, "0"), (TokenKind::Integer, "12")]
        );
    }

    #[test]
    fn exponents_need_a_decimal_point() {
        let got = kinds("1e5");

        assert_eq!(
            got,
            vec![(TokenKind::Integer, "1"), (TokenKind::Identifier, "e5")]
        );
    }

    #[test]
    fn dangling_exponent_markers_are_not_part_of_the_float() {
        let got = kinds("1.0e+");

        assert_eq!(
            got,
            vec![
                (TokenKind::Float, "1.0"),
                (TokenKind::Identifier, "e"),
                (TokenKind::Plus, "+"),
            ]
        );
    }

    #[test]
    fn whitespace_is_skipped() {
        let got = kinds(" 2 *\tx ");

        assert_eq!(
            got,
            vec![
                (TokenKind::Integer, "2"),
                (TokenKind::Times, "*"),
                (TokenKind::Identifier, "x"),
            ]
        );
    }

    #[test]
    fn a_lone_dot_is_invalid() {
        let got = Tokens::new(". 5").next().unwrap();

        assert_eq!(
            got,
            Err(ParseError::InvalidCharacter {
                character: '.',
                index: 0
            })
        );
    }

    #[test]
    fn invalid_characters_are_reported_with_their_index() {
        let mut tokens = Tokens::new("1 $");

        assert!(tokens.next().unwrap().is_ok());
        assert_eq!(
            tokens.next().unwrap(),
            Err(ParseError::InvalidCharacter {
                character: '$',
                index: 2
            })
        );
        assert!(tokens.next().is_none());
    }
}

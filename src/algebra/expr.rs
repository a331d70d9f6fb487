use crate::algebra::{Function, Number};
use num_bigint::BigInt;
use smol_str::SmolStr;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A symbolic value.
///
/// Values are only ever built through the constructors in
/// [`crate::algebra::ops`], which keep them in canonical form. That makes the
/// derived `PartialEq` the equality relation used for grading: two values are
/// equal when their canonical shapes are the same.
///
/// The variant order is also the sort order of terms and factors, so a sum's
/// constant term and a product's coefficient always come first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Expr {
    Number(Number),
    /// A free variable.
    Symbol(SmolStr),
    Power {
        base: Box<Expr>,
        exponent: Box<Expr>,
    },
    /// At least two factors, with at most one (leading) number.
    Product(Vec<Expr>),
    /// At least two terms, with at most one (leading) number.
    Sum(Vec<Expr>),
    /// Invoke a builtin function.
    Apply {
        function: Function,
        argument: Box<Expr>,
    },
}

impl Expr {
    pub fn integer<I: Into<BigInt>>(value: I) -> Self {
        Expr::Number(Number::Integer(value.into()))
    }

    pub fn symbol(name: &str) -> Self { Expr::Symbol(SmolStr::new(name)) }

    /// Is this a negative number, or a product with a negative coefficient?
    pub fn has_negative_coefficient(&self) -> bool {
        match self {
            Expr::Number(number) => number.is_negative(),
            Expr::Product(factors) => match factors.first() {
                Some(Expr::Number(coefficient)) => coefficient.is_negative(),
                _ => false,
            },
            _ => false,
        }
    }

    /// Iterate over the names of all free variables, in no particular order.
    pub fn symbols(&self) -> Box<dyn Iterator<Item = &SmolStr> + '_> {
        match self {
            Expr::Number(_) => Box::new(std::iter::empty()),
            Expr::Symbol(name) => Box::new(std::iter::once(name)),
            Expr::Power { base, exponent } => {
                Box::new(base.symbols().chain(exponent.symbols()))
            },
            Expr::Product(items) | Expr::Sum(items) => {
                Box::new(items.iter().flat_map(|item| item.symbols()))
            },
            Expr::Apply { argument, .. } => argument.symbols(),
        }
    }

    /// Can this be written as the operand of `^` or `*` without parentheses?
    fn is_atomic(&self) -> bool {
        match self {
            Expr::Number(Number::Rational(_)) => false,
            Expr::Number(number) => !number.is_negative(),
            Expr::Symbol(_) | Expr::Apply { .. } => true,
            Expr::Power { .. } | Expr::Product(_) | Expr::Sum(_) => false,
        }
    }

    /// The same term with its sign flipped, if it is negative.
    fn negated_term(&self) -> Option<Expr> {
        match self {
            Expr::Number(number) if number.is_negative() => {
                Some(Expr::Number(-number))
            },
            Expr::Product(factors) if self.has_negative_coefficient() => {
                let coefficient = match &factors[0] {
                    Expr::Number(number) => -number,
                    _ => unreachable!(),
                };
                let mut rest = factors[1..].to_vec();

                if !coefficient.is_one() {
                    rest.insert(0, Expr::Number(coefficient));
                }

                if rest.len() == 1 {
                    rest.pop()
                } else {
                    Some(Expr::Product(rest))
                }
            },
            _ => None,
        }
    }
}

impl FromStr for Expr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { crate::evaluate(s) }
}

impl From<Number> for Expr {
    fn from(number: Number) -> Expr { Expr::Number(number) }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(number) => write!(f, "{}", number),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Power { base, exponent } => {
                write_operand(base, f)?;
                write!(f, "^")?;
                write_operand(exponent, f)
            },
            Expr::Product(factors) => write_product(factors, f),
            Expr::Sum(terms) => write_sum(terms, f),
            Expr::Apply { function, argument } => {
                write!(f, "{}({})", function, argument)
            },
        }
    }
}

fn write_operand(expr: &Expr, f: &mut Formatter<'_>) -> fmt::Result {
    if expr.is_atomic() {
        write!(f, "{}", expr)
    } else {
        write!(f, "({})", expr)
    }
}

fn write_product(factors: &[Expr], f: &mut Formatter<'_>) -> fmt::Result {
    let rest = match factors.split_first() {
        Some((Expr::Number(coefficient), rest)) => {
            if (-coefficient).is_one() {
                write!(f, "-")?;
            } else {
                write_operand_allowing_sign(coefficient, f)?;
                write!(f, "*")?;
            }
            rest
        },
        _ => factors,
    };

    for (i, factor) in rest.iter().enumerate() {
        if i > 0 {
            write!(f, "*")?;
        }

        match factor {
            Expr::Sum(_) => write!(f, "({})", factor)?,
            _ => write!(f, "{}", factor)?,
        }
    }

    Ok(())
}

/// A leading coefficient may keep its sign, `-2*x` reads back the same way.
fn write_operand_allowing_sign(
    coefficient: &Number,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    match coefficient {
        Number::Rational(_) => write!(f, "({})", coefficient),
        _ => write!(f, "{}", coefficient),
    }
}

fn write_sum(terms: &[Expr], f: &mut Formatter<'_>) -> fmt::Result {
    // constants read better at the end
    let (constants, others): (Vec<&Expr>, Vec<&Expr>) =
        terms.iter().partition(|term| matches!(term, Expr::Number(_)));

    for (i, term) in others.into_iter().chain(constants).enumerate() {
        match term.negated_term() {
            Some(positive) if i > 0 => write!(f, " - {}", positive)?,
            _ if i > 0 => write!(f, " + {}", term)?,
            _ => write!(f, "{}", term)?,
        }
    }

    Ok(())
}

/// The top level of a parsed input.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expr),
    /// `name = value`. Nothing is bound, the assignment is only recorded.
    Assignment { target: SmolStr, value: Expr },
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression(expr) => write!(f, "{}", expr),
            Statement::Assignment { target, value } => {
                write!(f, "{} = {}", target, value)
            },
        }
    }
}

//! Canonicalising [`Expr`] operations.
//!
//! Every value is simplified as it is built, so two values are equal exactly
//! when their canonical shapes match:
//!
//! - numbers fold immediately (`2 + 3` is `5`, `1/3` is an exact rational)
//! - `a - b` is `a + (-1)*b`, `a / b` is `a * b^-1` and `-a` is `(-1)*a`
//! - sums are flattened, like terms are collected (`x + x` is `2*x`) and the
//!   terms are sorted
//! - products are flattened, equal bases have their exponents added
//!   (`x*x` is `x^2`), numbers are multiplied into a single leading
//!   coefficient and the factors are sorted
//! - a number times a sum is distributed (`2*(x + 1)` is `2*x + 2`)
//!
//! Nothing is expanded or factored beyond that, so `x^2 - 1` and
//! `(x - 1)*(x + 1)` stay different values.

use crate::{
    algebra::{Expr, Function, Number},
    Limits,
};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive};

/// Errors raised while combining values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("the root of a negative number is not a real number")]
    NegativeRoot,
    #[error("{argument} is outside the domain of {function}")]
    Domain { function: Function, argument: String },
    #[error("exponents larger than {limit} are not evaluated")]
    ExponentTooLarge { limit: u32 },
    #[error("the result would need more than {limit} bits")]
    NumberTooLarge { limit: u64 },
}

pub fn add(left: Expr, right: Expr) -> Expr { sum(vec![left, right]) }

pub fn sub(
    left: Expr,
    right: Expr,
    limits: &Limits,
) -> Result<Expr, EvaluationError> {
    Ok(add(left, neg(right, limits)?))
}

pub fn mul(
    left: Expr,
    right: Expr,
    limits: &Limits,
) -> Result<Expr, EvaluationError> {
    product(vec![left, right], limits)
}

pub fn div(
    left: Expr,
    right: Expr,
    limits: &Limits,
) -> Result<Expr, EvaluationError> {
    if let Expr::Number(divisor) = &right {
        if divisor.is_zero() {
            return Err(EvaluationError::DivisionByZero);
        }
    }

    let reciprocal = pow(right, Expr::integer(-1), limits)?;
    mul(left, reciprocal, limits)
}

pub fn neg(expr: Expr, limits: &Limits) -> Result<Expr, EvaluationError> {
    match expr {
        Expr::Number(number) => Ok(Expr::Number(-&number)),
        other => mul(Expr::integer(-1), other, limits),
    }
}

/// Raise `base` to `exponent`.
pub fn pow(
    base: Expr,
    exponent: Expr,
    limits: &Limits,
) -> Result<Expr, EvaluationError> {
    match (base, exponent) {
        (_, Expr::Number(e)) if e.is_zero() => Ok(Expr::Number(Number::one())),
        (base, Expr::Number(e)) if e.is_one() => Ok(base),
        (Expr::Number(b), _) if b.is_one() => Ok(Expr::Number(b)),
        (Expr::Number(b), Expr::Number(e)) => numeric_pow(&b, &e, limits),
        // (x^a)^n = x^(a*n)
        (Expr::Power { base, exponent: inner }, Expr::Number(e))
            if e.is_integral() =>
        {
            let exponent = mul(*inner, Expr::Number(e), limits)?;
            pow(*base, exponent, limits)
        },
        // (x*y)^n = x^n * y^n
        (Expr::Product(factors), Expr::Number(e)) if e.is_integral() => {
            let factors = factors
                .into_iter()
                .map(|factor| pow(factor, Expr::Number(e.clone()), limits))
                .collect::<Result<Vec<_>, _>>()?;
            product(factors, limits)
        },
        (base, exponent) => Ok(Expr::Power {
            base: Box::new(base),
            exponent: Box::new(exponent),
        }),
    }
}

fn numeric_pow(
    base: &Number,
    exponent: &Number,
    limits: &Limits,
) -> Result<Expr, EvaluationError> {
    if exponent.is_integral() {
        let whole = exponent.ratio().to_integer();
        let mut value = base.pow_integer(&whole, limits)?;
        if exponent.is_float() {
            value = value.into_float();
        }
        return Ok(Expr::Number(value));
    }

    if base.is_zero() {
        return if exponent.is_negative() {
            Err(EvaluationError::DivisionByZero)
        } else {
            Ok(Expr::Number(base.clone()))
        };
    }

    if base.is_float() || exponent.is_float() {
        if base.is_negative() {
            return Err(EvaluationError::NegativeRoot);
        }
        let value = base.to_f64().powf(exponent.to_f64());
        return Number::from_f64(value).map(Expr::Number).ok_or(
            EvaluationError::NumberTooLarge {
                limit: limits.max_number_bits,
            },
        );
    }

    if base.is_negative() {
        return Err(EvaluationError::NegativeRoot);
    }

    match base {
        Number::Integer(value) => integer_root(value, &exponent.ratio(), limits),
        // (p/q)^e = p^e * q^-e
        _ => {
            let ratio = base.ratio();
            let numer = Expr::integer(ratio.numer().clone());
            let denom = Expr::integer(ratio.denom().clone());
            let numer = pow(numer, Expr::Number(exponent.clone()), limits)?;
            let denom = pow(denom, Expr::Number(-exponent), limits)?;
            product(vec![numer, denom], limits)
        },
    }
}

/// `value^(p/q)` for a positive integer and a non-integral exponent.
///
/// This is split into `value^whole * outside^rest * inside^(rest/q)` where
/// `0 < rest < q` and `outside^q * inside == value`, so `sqrt(8)` becomes
/// `2*2^(1/2)`.
fn integer_root(
    value: &BigInt,
    exponent: &BigRational,
    limits: &Limits,
) -> Result<Expr, EvaluationError> {
    let degree = exponent
        .denom()
        .to_u32()
        .filter(|&d| d <= limits.max_exponent)
        .ok_or(EvaluationError::ExponentTooLarge {
            limit: limits.max_exponent,
        })?;
    let (whole, rest) = exponent.numer().div_mod_floor(exponent.denom());
    let (outside, inside) = split_power(value, degree);

    let coefficient = &Number::from(value.clone())
        .pow_integer(&whole, limits)?
        * &Number::from(outside).pow_integer(&rest, limits)?;

    if inside.is_one() {
        return Ok(Expr::Number(coefficient));
    }

    let remainder = Expr::Power {
        base: Box::new(Expr::integer(inside)),
        exponent: Box::new(Expr::Number(Number::exact(BigRational::new(
            rest,
            exponent.denom().clone(),
        )))),
    };

    if coefficient.is_one() {
        Ok(remainder)
    } else {
        Ok(Expr::Product(vec![Expr::Number(coefficient), remainder]))
    }
}

/// Pull the perfect `degree`-th powers out of `value`, returning `outside`
/// and `inside` where `outside^degree * inside == value`.
fn split_power(value: &BigInt, degree: u32) -> (BigInt, BigInt) {
    const TRIAL_DIVISION_LIMIT: u32 = 1000;

    let mut outside = BigInt::one();
    let mut inside = value.clone();
    let mut factor = BigInt::from(2);

    while factor <= BigInt::from(TRIAL_DIVISION_LIMIT) {
        let power = factor.pow(degree);
        if power > inside {
            break;
        }

        while inside.is_multiple_of(&power) {
            inside /= &power;
            outside *= &factor;
        }
        factor += 1_u32;
    }

    let root = inside.nth_root(degree);
    if root.pow(degree) == inside {
        outside *= root;
        inside = BigInt::one();
    }

    (outside, inside)
}

/// Add a collection of terms.
pub fn sum(terms: Vec<Expr>) -> Expr {
    let mut constant = Number::zero();
    let mut collected: Vec<(Expr, Number)> = Vec::new();

    for term in flatten_sum(terms) {
        match term {
            Expr::Number(number) => constant = &constant + &number,
            other => {
                let (coefficient, rest) = split_coefficient(other);

                match collected.iter_mut().find(|(seen, _)| *seen == rest) {
                    Some((_, total)) => *total = &*total + &coefficient,
                    None => collected.push((rest, coefficient)),
                }
            },
        }
    }

    let mut terms: Vec<Expr> = collected
        .into_iter()
        .filter(|(_, coefficient)| !coefficient.is_zero())
        .map(|(rest, coefficient)| with_coefficient(coefficient, rest))
        .collect();
    terms.sort();

    if terms.is_empty() {
        return Expr::Number(constant);
    }
    if !constant.is_zero() {
        terms.insert(0, Expr::Number(constant));
    }

    match terms.len() {
        1 => terms.remove(0),
        _ => Expr::Sum(terms),
    }
}

fn flatten_sum(terms: Vec<Expr>) -> Vec<Expr> {
    let mut flattened = Vec::with_capacity(terms.len());

    for term in terms {
        match term {
            Expr::Sum(inner) => flattened.extend(inner),
            other => flattened.push(other),
        }
    }

    flattened
}

/// Split `3*x*y` into `3` and `x*y`.
fn split_coefficient(term: Expr) -> (Number, Expr) {
    match term {
        Expr::Product(mut factors) => match factors.first() {
            Some(Expr::Number(_)) => {
                let coefficient = match factors.remove(0) {
                    Expr::Number(number) => number,
                    _ => unreachable!(),
                };
                let rest = if factors.len() == 1 {
                    factors.remove(0)
                } else {
                    Expr::Product(factors)
                };
                (coefficient, rest)
            },
            _ => (Number::one(), Expr::Product(factors)),
        },
        other => (Number::one(), other),
    }
}

/// The inverse of [`split_coefficient()`].
fn with_coefficient(coefficient: Number, rest: Expr) -> Expr {
    if coefficient.is_one() {
        return rest;
    }

    match rest {
        Expr::Product(mut factors) => {
            factors.insert(0, Expr::Number(coefficient));
            Expr::Product(factors)
        },
        other => Expr::Product(vec![Expr::Number(coefficient), other]),
    }
}

/// Multiply a collection of factors.
pub fn product(
    factors: Vec<Expr>,
    limits: &Limits,
) -> Result<Expr, EvaluationError> {
    let mut coefficient = Number::one();
    let mut bases: Vec<(Expr, Expr)> = Vec::new();

    for factor in flatten_product(factors) {
        let (base, exponent) = match factor {
            Expr::Number(number) => {
                coefficient = &coefficient * &number;
                continue;
            },
            Expr::Power { base, exponent } => (*base, *exponent),
            other => (other, Expr::integer(1)),
        };

        match bases.iter_mut().find(|(seen, _)| *seen == base) {
            Some((_, total)) => {
                let previous = std::mem::replace(total, Expr::integer(0));
                *total = add(previous, exponent);
            },
            None => bases.push((base, exponent)),
        }
    }

    if coefficient.is_zero() {
        return Ok(Expr::Number(coefficient));
    }

    let mut rest = Vec::with_capacity(bases.len());

    for (base, exponent) in bases {
        match pow(base, exponent, limits)? {
            Expr::Number(number) => coefficient = &coefficient * &number,
            Expr::Product(factors) => {
                for factor in factors {
                    match factor {
                        Expr::Number(number) => {
                            coefficient = &coefficient * &number
                        },
                        other => rest.push(other),
                    }
                }
            },
            other => rest.push(other),
        }
    }

    // expanding a power may have exposed more factors with a shared base
    if has_repeated_bases(&rest) {
        rest.push(Expr::Number(coefficient));
        return product(rest, limits);
    }

    rest.sort();

    match rest.len() {
        0 => Ok(Expr::Number(coefficient)),
        1 if coefficient.is_one() => Ok(rest.remove(0)),
        1 if matches!(rest[0], Expr::Sum(_)) => {
            // distribute: 2*(x + 1) = 2*x + 2
            let terms = match rest.remove(0) {
                Expr::Sum(terms) => terms,
                _ => unreachable!(),
            };
            let terms = terms
                .into_iter()
                .map(|term| mul(Expr::Number(coefficient.clone()), term, limits))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(sum(terms))
        },
        _ => Ok(with_coefficient(coefficient, Expr::Product(rest))),
    }
}

fn base_of(factor: &Expr) -> &Expr {
    match factor {
        Expr::Power { base, .. } => &**base,
        other => other,
    }
}

fn has_repeated_bases(factors: &[Expr]) -> bool {
    factors.iter().enumerate().any(|(i, factor)| {
        factors[i + 1..]
            .iter()
            .any(|other| base_of(other) == base_of(factor))
    })
}

fn flatten_product(factors: Vec<Expr>) -> Vec<Expr> {
    let mut flattened = Vec::with_capacity(factors.len());

    for factor in factors {
        match factor {
            Expr::Product(inner) => flattened.extend(inner),
            other => flattened.push(other),
        }
    }

    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate;

    fn expr(src: &str) -> Expr {
        match evaluate(src) {
            Ok(expr) => expr,
            Err(e) => panic!("Unable to evaluate \"{}\": {}", src, e),
        }
    }

    #[test]
    fn constant_fold_simple_arithmetic() {
        let inputs = vec![
            ("1", Number::from(1)),
            ("1 + 1.5", Number::parse_float("2.5", &Limits::default()).unwrap()),
            ("2 * 3", Number::from(6)),
            ("4 / 2", Number::from(2)),
            ("8/2/2", Number::from(2)),
            ("2^3^2", Number::from(512)),
            ("2^10 - 24", Number::from(1000)),
            ("-(1 + 2)", Number::from(-3)),
            ("sqrt(4)", Number::from(2)),
            ("sqrt(2 + 2)", Number::from(2)),
            ("sqrt(2)*sqrt(2)", Number::from(2)),
            ("8^(1/3)", Number::from(2)),
            ("4^(3/2)", Number::from(8)),
            ("0 * x", Number::from(0)),
            ("x - x", Number::from(0)),
            ("x/x", Number::from(1)),
            ("(x + 1)/(x + 1)", Number::from(1)),
            ("x^0", Number::from(1)),
            ("1^x", Number::from(1)),
        ];

        for (src, should_be) in inputs {
            match expr(src) {
                Expr::Number(got) => {
                    assert_eq!(got, should_be, "{} -> {}", src, got)
                },
                other => panic!(
                    "Expected \"{}\" to be a number, but got \"{}\"",
                    src, other
                ),
            }
        }
    }

    #[test]
    fn rationals_stay_exact() {
        let got = expr("1/3");

        let should_be = Expr::Number(Number::exact(BigRational::new(
            1.into(),
            3.into(),
        )));
        assert_eq!(got, should_be);
        assert_eq!(expr("1/3 + 2/3"), Expr::integer(1));
        assert_eq!(expr("2^(-1)"), expr("1/2"));
    }

    #[test]
    fn canonical_forms_match_equivalent_spellings() {
        let inputs = vec![
            ("x + x", "2*x"),
            ("x*x", "x^2"),
            ("x*y", "y*x"),
            ("x + y + z", "z + (y + x)"),
            ("2 * x * 3", "6*x"),
            ("x + 5*2", "10 + x"),
            ("(x + x)*3 + 5", "6*x + 5"),
            ("2*(x + 1)", "2*x + 2"),
            ("-(x - 1)", "1 - x"),
            ("--x", "x"),
            ("x/2", "0.5*x"),
            ("x^2*x^3", "x^5"),
            ("(x^2)^3", "x^6"),
            ("(x*y)^2", "x^2*y^2"),
            ("sqrt(x)*sqrt(x)", "x"),
            ("sqrt(8)", "2*sqrt(2)"),
            ("sqrt(1/2)", "sqrt(2)/2"),
            ("x - 0", "x"),
            ("0 - x", "-x"),
            ("x / 1", "x"),
            ("1.50*x", "1.5*x"),
        ];

        for (left, right) in inputs {
            let got = expr(left);
            let should_be = expr(right);

            assert_eq!(got, should_be, "{} != {}", left, right);
        }
    }

    #[test]
    fn factor_order_does_not_matter() {
        let inputs = vec![
            ("x*sqrt(x*y)*sqrt(x*y)", "x^2*y"),
            ("sqrt(x*y)*sqrt(x*y)*x", "x^2*y"),
            ("sqrt(x*y)*x*sqrt(x*y)", "x^2*y"),
            ("x*sqrt(x^2)*sqrt(x^2)", "x^3"),
            ("y*(x*y)^(1/2)*(x*y)^(1/2)", "x*y^2"),
            ("x*(x*y)^2/y", "x^3*y"),
            ("sqrt(2)*x*sqrt(2)", "2*x"),
        ];

        for (left, right) in inputs {
            let got = expr(left);
            let should_be = expr(right);

            assert_eq!(got, should_be, "{} != {}", left, right);
        }
    }

    #[test]
    fn products_never_repeat_a_base() {
        let got = expr("x*sqrt(x*y)*sqrt(x*y)");

        let should_be = Expr::Product(vec![
            Expr::symbol("y"),
            Expr::Power {
                base: Box::new(Expr::symbol("x")),
                exponent: Box::new(Expr::integer(2)),
            },
        ]);
        assert_eq!(got, should_be);
    }

    #[test]
    fn canonicalisation_is_not_a_prover() {
        let inputs = vec![
            ("x^2 - 1", "(x - 1)*(x + 1)"),
            ("(x + 1)^2", "x^2 + 2*x + 1"),
            ("x*(y + 1)", "x*y + x"),
            ("sin(x)^2 + cos(x)^2", "1"),
        ];

        for (left, right) in inputs {
            assert_ne!(expr(left), expr(right), "{} == {}", left, right);
        }
    }

    #[test]
    fn canonical_shapes() {
        let x = Expr::symbol("x");
        let got = expr("3*x + 1");

        let should_be = Expr::Sum(vec![
            Expr::integer(1),
            Expr::Product(vec![Expr::integer(3), x.clone()]),
        ]);
        assert_eq!(got, should_be);

        let got = expr("x^2");
        let should_be = Expr::Power {
            base: Box::new(x),
            exponent: Box::new(Expr::integer(2)),
        };
        assert_eq!(got, should_be);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let limits = Limits::default();

        let got = div(Expr::integer(1), Expr::integer(0), &limits);
        assert_eq!(got, Err(EvaluationError::DivisionByZero));

        let got = div(Expr::symbol("x"), Expr::integer(0), &limits);
        assert_eq!(got, Err(EvaluationError::DivisionByZero));

        let got = pow(Expr::integer(0), Expr::integer(-2), &limits);
        assert_eq!(got, Err(EvaluationError::DivisionByZero));

        let zero = Number::parse_float("0.0", &limits).unwrap();
        let exponent = Number::parse_float("-0.5", &limits).unwrap();
        let got = pow(Expr::Number(zero), Expr::Number(exponent), &limits);
        assert_eq!(got, Err(EvaluationError::DivisionByZero));

        let got = expr("0.0^0.5");
        assert_eq!(got, Expr::integer(0));
    }

    #[test]
    fn roots_of_negative_numbers_are_errors() {
        let limits = Limits::default();
        let half = Expr::Number(Number::exact(BigRational::new(
            1.into(),
            2.into(),
        )));

        let got = pow(Expr::integer(-4), half, &limits);

        assert_eq!(got, Err(EvaluationError::NegativeRoot));
    }

    #[test]
    fn float_powers_are_approximated() {
        let got = expr("2.0^0.5");

        let should_be = Number::from_f64(2_f64.powf(0.5)).unwrap();
        assert_eq!(got, Expr::Number(should_be));
    }
}

use crate::{algebra::ops::EvaluationError, Limits};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    ops::{Add, Mul, Neg, Sub},
};

/// An exact number.
///
/// Numbers compare by magnitude, regardless of how they were written, so
/// `Float(2.0)`, `Integer(2)` and `Rational(4/2)` are all equal.
#[derive(Debug, Clone)]
pub enum Number {
    Integer(BigInt),
    /// A non-integral quotient in lowest terms.
    Rational(BigRational),
    /// A decimal literal (or anything computed from one). The value is kept
    /// exactly, so `1.50` and `1.5` are the same number.
    Float(BigRational),
}

impl Number {
    pub fn zero() -> Self { Number::Integer(BigInt::zero()) }

    pub fn one() -> Self { Number::Integer(BigInt::one()) }

    /// An exact number, collapsing whole quotients to [`Number::Integer`].
    pub fn exact(value: BigRational) -> Self {
        if value.is_integer() {
            Number::Integer(value.to_integer())
        } else {
            Number::Rational(value)
        }
    }

    fn with_kind(value: BigRational, float: bool) -> Self {
        if float {
            Number::Float(value)
        } else {
            Number::exact(value)
        }
    }

    /// Parse the text of a float literal (`1.5`, `.25e-3`, `10.`).
    pub fn parse_float(
        text: &str,
        limits: &Limits,
    ) -> Result<Number, EvaluationError> {
        let too_large = EvaluationError::NumberTooLarge {
            limit: limits.max_number_bits,
        };
        let (mantissa, exponent) = split_decimal(text).ok_or(too_large)?;

        // 10^n needs roughly 3.33 bits per digit
        let bits = exponent.unsigned_abs().saturating_mul(10) / 3;
        if bits > limits.max_number_bits {
            return Err(EvaluationError::NumberTooLarge {
                limit: limits.max_number_bits,
            });
        }

        Ok(Number::Float(scaled(mantissa, exponent)))
    }

    /// Convert a machine float into a [`Number::Float`], keeping the shortest
    /// decimal that round-trips to the same `f64`.
    pub fn from_f64(value: f64) -> Option<Number> {
        if !value.is_finite() {
            return None;
        }

        let (mantissa, exponent) = split_decimal(&format!("{:e}", value))?;
        Some(Number::Float(scaled(mantissa, exponent)))
    }

    pub fn is_float(&self) -> bool { matches!(self, Number::Float(_)) }

    /// The number's value as a fraction.
    pub fn ratio(&self) -> Cow<'_, BigRational> {
        match self {
            Number::Integer(value) => {
                Cow::Owned(BigRational::from_integer(value.clone()))
            },
            Number::Rational(value) | Number::Float(value) => {
                Cow::Borrowed(value)
            },
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(value) => value.is_zero(),
            Number::Rational(value) | Number::Float(value) => value.is_zero(),
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Integer(value) => value.is_one(),
            Number::Rational(value) | Number::Float(value) => value.is_one(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Integer(value) => value.is_negative(),
            Number::Rational(value) | Number::Float(value) => {
                value.is_negative()
            },
        }
    }

    /// Does this number have a whole value (`3`, `3.0`)?
    pub fn is_integral(&self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Rational(_) => false,
            Number::Float(value) => value.is_integer(),
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Integer(value) => Number::Integer(value.abs()),
            Number::Rational(value) => Number::Rational(value.abs()),
            Number::Float(value) => Number::Float(value.abs()),
        }
    }

    pub fn into_float(self) -> Number {
        match self {
            Number::Integer(value) => {
                Number::Float(BigRational::from_integer(value))
            },
            Number::Rational(value) | Number::Float(value) => {
                Number::Float(value)
            },
        }
    }

    pub fn to_f64(&self) -> f64 { self.ratio().to_f64().unwrap_or(f64::NAN) }

    /// Divide, returning `None` when `divisor` is zero.
    pub fn checked_div(&self, divisor: &Number) -> Option<Number> {
        if divisor.is_zero() {
            return None;
        }

        let quotient = &*self.ratio() / &*divisor.ratio();
        Some(Number::with_kind(
            quotient,
            self.is_float() || divisor.is_float(),
        ))
    }

    /// Raise this number to a whole power, exactly.
    pub fn pow_integer(
        &self,
        exponent: &BigInt,
        limits: &Limits,
    ) -> Result<Number, EvaluationError> {
        let float = self.is_float();
        let base = self.ratio();

        if base.is_zero() {
            return if exponent.is_negative() {
                Err(EvaluationError::DivisionByZero)
            } else if exponent.is_zero() {
                Ok(Number::with_kind(BigRational::one(), float))
            } else {
                Ok(self.clone())
            };
        }

        if base.abs().is_one() {
            let value = if base.is_negative() && exponent.is_odd() {
                -BigRational::one()
            } else {
                BigRational::one()
            };
            return Ok(Number::with_kind(value, float));
        }

        let magnitude = exponent
            .abs()
            .to_u32()
            .filter(|&e| e <= limits.max_exponent)
            .ok_or(EvaluationError::ExponentTooLarge {
                limit: limits.max_exponent,
            })?;

        let bits = base.numer().bits().max(base.denom().bits());
        if bits.saturating_mul(u64::from(magnitude)) > limits.max_number_bits {
            return Err(EvaluationError::NumberTooLarge {
                limit: limits.max_number_bits,
            });
        }

        let numer = base.numer().pow(magnitude);
        let denom = base.denom().pow(magnitude);
        let value = if exponent.is_negative() {
            BigRational::new(denom, numer)
        } else {
            BigRational::new(numer, denom)
        };

        Ok(Number::with_kind(value, float))
    }
}

/// Break decimal text into a mantissa and a power of ten.
fn split_decimal(text: &str) -> Option<(BigInt, i64)> {
    let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
        Some(index) => (&text[..index], text[index + 1..].parse::<i64>().ok()?),
        None => (text, 0),
    };
    let (negative, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa),
    };
    let (whole, fraction) = match mantissa.find('.') {
        Some(index) => (&mantissa[..index], &mantissa[index + 1..]),
        None => (mantissa, ""),
    };

    let digits = format!("{}{}", whole, fraction);
    let mut value = if digits.is_empty() {
        BigInt::zero()
    } else {
        digits.parse::<BigInt>().ok()?
    };
    if negative {
        value = -value;
    }

    Some((value, exponent.checked_sub(fraction.len() as i64)?))
}

fn scaled(mantissa: BigInt, exponent: i64) -> BigRational {
    let power = BigInt::from(10).pow(exponent.unsigned_abs() as u32);

    if exponent < 0 {
        BigRational::new(mantissa, power)
    } else {
        BigRational::from_integer(mantissa * power)
    }
}

fn write_decimal(value: &BigRational, f: &mut Formatter<'_>) -> fmt::Result {
    let two = BigInt::from(2);
    let five = BigInt::from(5);
    let mut remaining = value.denom().clone();
    let mut twos = 0_u32;
    let mut fives = 0_u32;

    while remaining.is_multiple_of(&two) {
        remaining /= &two;
        twos += 1;
    }
    while remaining.is_multiple_of(&five) {
        remaining /= &five;
        fives += 1;
    }

    if !remaining.is_one() {
        // no terminating expansion
        return match value.to_f64() {
            Some(approximation) => write!(f, "{:?}", approximation),
            None => write!(f, "{}/{}", value.numer(), value.denom()),
        };
    }

    let scale = twos.max(fives) as usize;
    let digits = (value.numer().abs() * BigInt::from(10).pow(scale as u32)
        / value.denom())
    .to_string();
    let sign = if value.is_negative() { "-" } else { "" };

    if scale == 0 {
        return write!(f, "{}{}.0", sign, digits);
    }

    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - scale);

    write!(f, "{}{}.{}", sign, whole, fraction)
}

impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Integer(left), Number::Integer(right)) => left == right,
            _ => self.ratio() == other.ratio(),
        }
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Number) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Number) -> Ordering {
        match (self, other) {
            (Number::Integer(left), Number::Integer(right)) => left.cmp(right),
            _ => self.ratio().cmp(&other.ratio()),
        }
    }
}

impl<'a, 'b> Add<&'b Number> for &'a Number {
    type Output = Number;

    fn add(self, rhs: &'b Number) -> Number {
        match (self, rhs) {
            (Number::Integer(left), Number::Integer(right)) => {
                Number::Integer(left + right)
            },
            _ => Number::with_kind(
                &*self.ratio() + &*rhs.ratio(),
                self.is_float() || rhs.is_float(),
            ),
        }
    }
}

impl<'a, 'b> Sub<&'b Number> for &'a Number {
    type Output = Number;

    fn sub(self, rhs: &'b Number) -> Number { self + &-rhs }
}

impl<'a, 'b> Mul<&'b Number> for &'a Number {
    type Output = Number;

    fn mul(self, rhs: &'b Number) -> Number {
        match (self, rhs) {
            (Number::Integer(left), Number::Integer(right)) => {
                Number::Integer(left * right)
            },
            _ => Number::with_kind(
                &*self.ratio() * &*rhs.ratio(),
                self.is_float() || rhs.is_float(),
            ),
        }
    }
}

impl<'a> Neg for &'a Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Integer(value) => Number::Integer(-value),
            Number::Rational(value) => Number::Rational(-value),
            Number::Float(value) => Number::Float(-value),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Number { Number::Integer(BigInt::from(value)) }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Number { Number::Integer(value) }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(value) => write!(f, "{}", value),
            Number::Rational(value) => {
                write!(f, "{}/{}", value.numer(), value.denom())
            },
            Number::Float(value) => write_decimal(value, f),
        }
    }
}

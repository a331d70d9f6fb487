//! The catalogue of named functions that may appear in call position.

use crate::{
    algebra::{
        ops::{self, EvaluationError},
        Expr, Number,
    },
    Limits,
};
use num_rational::BigRational;
use std::fmt::{self, Display, Formatter};

/// Resolves the names used in call position, e.g. the `sin` in `sin(x)`.
pub trait Context {
    /// Look up a function by name, returning `None` when it isn't available.
    fn function(&self, name: &str) -> Option<Function>;
}

/// The full set of builtin functions.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Builtins;

impl Context for Builtins {
    fn function(&self, name: &str) -> Option<Function> {
        Function::from_name(name)
    }
}

/// Various builtin functions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Function {
    Sqrt,
    CubeRoot,
    Exp,
    Log,
    Sine,
    Cosine,
    Tangent,
    ArcSine,
    ArcCosine,
    ArcTangent,
    HyperbolicSine,
    HyperbolicCosine,
    HyperbolicTangent,
    Abs,
}

const CATALOGUE: &[(&str, Function)] = &[
    ("sqrt", Function::Sqrt),
    ("cbrt", Function::CubeRoot),
    ("exp", Function::Exp),
    ("log", Function::Log),
    ("ln", Function::Log),
    ("sin", Function::Sine),
    ("cos", Function::Cosine),
    ("tan", Function::Tangent),
    ("asin", Function::ArcSine),
    ("acos", Function::ArcCosine),
    ("atan", Function::ArcTangent),
    ("sinh", Function::HyperbolicSine),
    ("cosh", Function::HyperbolicCosine),
    ("tanh", Function::HyperbolicTangent),
    ("abs", Function::Abs),
];

#[derive(Debug, Copy, Clone, PartialEq)]
enum Symmetry {
    /// `f(-x) = -f(x)`
    Odd,
    /// `f(-x) = f(x)`
    Even,
    Neither,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        CATALOGUE
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|&(_, function)| function)
    }

    /// Every name the builtins answer to.
    pub fn names() -> impl Iterator<Item = &'static str> {
        CATALOGUE.iter().map(|&(name, _)| name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::CubeRoot => "cbrt",
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Sine => "sin",
            Function::Cosine => "cos",
            Function::Tangent => "tan",
            Function::ArcSine => "asin",
            Function::ArcCosine => "acos",
            Function::ArcTangent => "atan",
            Function::HyperbolicSine => "sinh",
            Function::HyperbolicCosine => "cosh",
            Function::HyperbolicTangent => "tanh",
            Function::Abs => "abs",
        }
    }

    fn symmetry(self) -> Symmetry {
        match self {
            Function::Sine
            | Function::Tangent
            | Function::ArcSine
            | Function::ArcTangent
            | Function::HyperbolicSine
            | Function::HyperbolicTangent => Symmetry::Odd,
            Function::Cosine | Function::HyperbolicCosine | Function::Abs => {
                Symmetry::Even
            },
            Function::Sqrt
            | Function::CubeRoot
            | Function::Exp
            | Function::Log
            | Function::ArcCosine => Symmetry::Neither,
        }
    }

    /// Apply the function, simplifying where the result is known exactly.
    pub fn apply(
        self,
        argument: Expr,
        limits: &Limits,
    ) -> Result<Expr, EvaluationError> {
        match self {
            Function::Sqrt => return ops::pow(argument, root(2), limits),
            Function::CubeRoot => return ops::pow(argument, root(3), limits),
            _ => {},
        }

        if let Expr::Number(number) = &argument {
            if let Some(value) = self.exact_value(number)? {
                return Ok(Expr::Number(value));
            }
            if number.is_float() {
                return self.evaluate_float(number).map(Expr::Number);
            }
        }

        match self.symmetry() {
            Symmetry::Odd if argument.has_negative_coefficient() => {
                let positive = self.apply(ops::neg(argument, limits)?, limits)?;
                ops::neg(positive, limits)
            },
            Symmetry::Even if argument.has_negative_coefficient() => {
                self.apply(ops::neg(argument, limits)?, limits)
            },
            _ => Ok(Expr::Apply {
                function: self,
                argument: Box::new(argument),
            }),
        }
    }

    /// Results that are known exactly, and arguments outside the domain.
    fn exact_value(
        self,
        number: &Number,
    ) -> Result<Option<Number>, EvaluationError> {
        let out_of_domain = || EvaluationError::Domain {
            function: self,
            argument: number.to_string(),
        };

        let value = match self {
            Function::Abs => Some(number.abs()),
            Function::Log if number.is_zero() || number.is_negative() => {
                return Err(out_of_domain());
            },
            Function::ArcSine | Function::ArcCosine
                if number.abs() > Number::one() =>
            {
                return Err(out_of_domain());
            },
            Function::Sine
            | Function::Tangent
            | Function::ArcSine
            | Function::ArcTangent
            | Function::HyperbolicSine
            | Function::HyperbolicTangent
                if number.is_zero() =>
            {
                Some(number.clone())
            },
            Function::Cosine | Function::HyperbolicCosine | Function::Exp
                if number.is_zero() =>
            {
                Some(Number::one())
            },
            Function::Log | Function::ArcCosine if number.is_one() => {
                Some(Number::zero())
            },
            _ => None,
        };

        Ok(value)
    }

    fn evaluate_float(self, number: &Number) -> Result<Number, EvaluationError> {
        let x = number.to_f64();

        let value = match self {
            Function::Sqrt => x.sqrt(),
            Function::CubeRoot => x.cbrt(),
            Function::Exp => x.exp(),
            Function::Log => x.ln(),
            Function::Sine => x.sin(),
            Function::Cosine => x.cos(),
            Function::Tangent => x.tan(),
            Function::ArcSine => x.asin(),
            Function::ArcCosine => x.acos(),
            Function::ArcTangent => x.atan(),
            Function::HyperbolicSine => x.sinh(),
            Function::HyperbolicCosine => x.cosh(),
            Function::HyperbolicTangent => x.tanh(),
            Function::Abs => x.abs(),
        };

        Number::from_f64(value).ok_or_else(|| EvaluationError::Domain {
            function: self,
            argument: number.to_string(),
        })
    }
}

fn root(degree: i64) -> Expr {
    Expr::Number(Number::exact(BigRational::new(1.into(), degree.into())))
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

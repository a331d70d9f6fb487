//! Turn answers typed by people into symbolic values, and check whether two
//! answers are the same.
//!
//! Text is parsed and evaluated in a single pass. Every value is kept in a
//! canonical form as it is built, so checking two answers is a structural
//! comparison.
//!
//! ```rust
//! let reference = mathcheck::evaluate("2*(x + 1)").unwrap();
//! let submitted = mathcheck::evaluate("2 + x*2").unwrap();
//!
//! assert!(mathcheck::equal(&reference, &submitted));
//! assert!(mathcheck::check_answer("1/2", "0.5"));
//! ```
//!
//! This is not a theorem prover. Nothing is expanded or factored, so
//! `x^2 - 1` and `(x - 1)*(x + 1)` are different answers.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algebra;
mod config;
mod error;
mod evaluator;

pub use crate::{
    algebra::{
        Builtins, Context, EvaluationError, Expr, Function, Number,
        ParseError, Statement,
    },
    config::Limits,
    error::Error,
    evaluator::Evaluator,
};

/// Parse and evaluate a single expression using the builtin functions and
/// default [`Limits`].
pub fn evaluate(text: &str) -> Result<Expr, Error> {
    Evaluator::<Builtins>::default().evaluate(text)
}

/// Parse a statement, which may be an assignment (`y = 2*x`).
pub fn parse_statement(text: &str) -> Result<Statement, Error> {
    Evaluator::<Builtins>::default().parse_statement(text)
}

/// Are two values the same after simplification?
///
/// Numbers compare by value regardless of how they were written, so `1/2`,
/// `0.5` and `0.50` are all equal.
pub fn equal(left: &Expr, right: &Expr) -> bool { left == right }

/// Grade a `submission` against a `reference` answer.
///
/// Anything that fails to evaluate is wrong, as is an empty answer.
pub fn check_answer(reference: &str, submission: &str) -> bool {
    Evaluator::<Builtins>::default().check_answer(reference, submission)
}

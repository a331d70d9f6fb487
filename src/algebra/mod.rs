//! The symbolic algebra system.

mod expr;
pub mod functions;
mod number;
pub mod ops;
mod parse;

pub use expr::{Expr, Statement};
pub use functions::{Builtins, Context, Function};
pub use number::Number;
pub use ops::EvaluationError;
pub use parse::{ParseError, TokenKind};

pub(crate) use parse::Parser;

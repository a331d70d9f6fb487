use crate::algebra::{EvaluationError, ParseError};
use smol_str::SmolStr;

/// Everything that can go wrong while evaluating some text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unable to parse the input")]
    Parse(#[from] ParseError),
    #[error("unknown function \"{name}\"")]
    UnknownFunction { name: SmolStr },
    #[error("unable to evaluate the input")]
    Evaluation(#[from] EvaluationError),
    /// The input assigned to `target` where a value was expected.
    #[error("expected a value but found an assignment to \"{target}\"")]
    Assignment { target: SmolStr },
}

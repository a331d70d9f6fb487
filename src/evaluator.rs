use crate::{
    algebra::{Builtins, Context, Expr, ParseError, Parser, Statement},
    Error, Limits,
};

/// Evaluates text using a particular set of functions and [`Limits`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Evaluator<C = Builtins> {
    ctx: C,
    limits: Limits,
}

impl<C: Context> Evaluator<C> {
    pub fn new(ctx: C, limits: Limits) -> Self { Evaluator { ctx, limits } }

    /// Parse a statement, evaluating every expression in it.
    pub fn parse_statement(&self, text: &str) -> Result<Statement, Error> {
        if text.len() > self.limits.max_input_len {
            log::debug!(
                "Refusing to parse {} bytes, the limit is {}",
                text.len(),
                self.limits.max_input_len
            );
            return Err(ParseError::InputTooLong {
                length: text.len(),
                limit: self.limits.max_input_len,
            }
            .into());
        }

        let statement = Parser::new(text, &self.ctx, &self.limits).parse()?;
        log::trace!("Evaluated {:?} as {}", text, statement);

        Ok(statement)
    }

    /// Evaluate some text to its canonical value.
    ///
    /// Assignments are rejected with [`Error::Assignment`].
    pub fn evaluate(&self, text: &str) -> Result<Expr, Error> {
        match self.parse_statement(text)? {
            Statement::Expression(expr) => Ok(expr),
            Statement::Assignment { target, .. } => {
                Err(Error::Assignment { target })
            },
        }
    }

    /// Does the `submission` have the same value as the `reference` answer?
    ///
    /// An empty answer on either side is never correct, and neither is an
    /// answer that can't be evaluated.
    pub fn check_answer(&self, reference: &str, submission: &str) -> bool {
        if reference.is_empty() || submission.is_empty() {
            return false;
        }

        let reference = match self.evaluate(reference) {
            Ok(expr) => expr,
            Err(e) => {
                log::debug!("Unable to evaluate the reference answer: {}", e);
                return false;
            },
        };

        match self.evaluate(submission) {
            Ok(submitted) => crate::equal(&reference, &submitted),
            Err(e) => {
                log::debug!("Rejecting {:?}: {}", submission, e);
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::EvaluationError;

    #[test]
    fn long_inputs_are_rejected_before_parsing() {
        let evaluator = Evaluator::new(
            Builtins,
            Limits {
                max_input_len: 8,
                ..Limits::default()
            },
        );

        assert!(evaluator.evaluate("1 + 2").is_ok());
        assert_eq!(
            evaluator.evaluate("1 + 2 + 3 + 4"),
            Err(Error::Parse(ParseError::InputTooLong {
                length: 13,
                limit: 8
            }))
        );
    }

    #[test]
    fn assignments_are_parsed_but_not_evaluated() {
        let evaluator: Evaluator = Evaluator::default();

        let got = evaluator.parse_statement("x = 1 + 2").unwrap();

        assert_eq!(
            got,
            Statement::Assignment {
                target: "x".into(),
                value: Expr::integer(3),
            }
        );
        assert_eq!(
            evaluator.evaluate("x = 1 + 2"),
            Err(Error::Assignment { target: "x".into() })
        );
    }

    #[test]
    fn grading() {
        let evaluator: Evaluator = Evaluator::default();
        let inputs = vec![
            ("1/2", "0.5", true),
            ("1/2", "2/4", true),
            ("x^2", "x*x", true),
            ("2*(x + 1)", "2*x + 2", true),
            ("sqrt(8)", "2*sqrt(2)", true),
            ("x^2 - 1", "(x - 1)*(x + 1)", false),
            ("1/3", "0.333", false),
            ("1", "", false),
            ("", "", false),
            ("1", "1 +", false),
            ("1", "x = 1", false),
            ("1/0", "1/0", false),
        ];

        for (reference, submission, should_be) in inputs {
            let got = evaluator.check_answer(reference, submission);
            assert_eq!(got, should_be, "{:?} vs {:?}", reference, submission);
        }
    }

    #[test]
    fn exponents_are_bounded() {
        let evaluator = Evaluator::new(
            Builtins,
            Limits {
                max_exponent: 100,
                ..Limits::default()
            },
        );

        assert!(evaluator.evaluate("2^100").is_ok());
        assert_eq!(
            evaluator.evaluate("2^101"),
            Err(Error::Evaluation(EvaluationError::ExponentTooLarge {
                limit: 100
            }))
        );
    }
}

//! Grade answers read from stdin, one `reference ; submission` pair per line.
//!
//! ```console
//! $ echo "1/2 ; 0.5" | cargo run --example grade
//! 1/2 ; 0.5 => correct
//! ```
//!
//! Set `RUST_LOG=debug` to see why answers were rejected.

use env_logger::Env;
use mathcheck::{Builtins, Evaluator, Function, Limits};
use std::io::{BufRead, BufReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let limits = Limits::from_env();
    log::debug!("Grading with {:?}", limits);
    log::debug!(
        "Known functions: {}",
        Function::names().collect::<Vec<_>>().join(", ")
    );
    let evaluator = Evaluator::new(Builtins, limits);

    let stdin = std::io::stdin();
    let mut correct = 0;
    let mut total = 0;

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (reference, submission) = match line.split_once(';') {
            Some((reference, submission)) => {
                (reference.trim(), submission.trim())
            },
            None => {
                eprintln!(
                    "Expected \"reference ; submission\", found \"{}\"",
                    line
                );
                continue;
            },
        };

        total += 1;

        if evaluator.check_answer(reference, submission) {
            correct += 1;
            println!("{} ; {} => correct", reference, submission);
        } else {
            println!("{} ; {} => incorrect", reference, submission);
        }
    }

    log::info!("{} of {} answers were correct", correct, total);

    Ok(())
}

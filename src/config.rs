//! Bounds applied while parsing and evaluating untrusted input.

use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

/// Resource limits for a single evaluation.
///
/// Answers are typed by end users, so every evaluation is bounded. Each field
/// falls back to its default when missing from a deserialized config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// The longest input (in bytes) that will be looked at.
    pub max_input_len: usize,
    /// How deeply parentheses and function calls may nest.
    pub max_depth: usize,
    /// The largest integer exponent that will be computed exactly.
    pub max_exponent: u32,
    /// The largest number (in bits) an exact power may produce.
    pub max_number_bits: u64,
}

impl Limits {
    pub const MAX_INPUT_LEN_VAR: &'static str = "MATHCHECK_MAX_INPUT_LEN";
    pub const MAX_DEPTH_VAR: &'static str = "MATHCHECK_MAX_DEPTH";
    pub const MAX_EXPONENT_VAR: &'static str = "MATHCHECK_MAX_EXPONENT";
    pub const MAX_NUMBER_BITS_VAR: &'static str = "MATHCHECK_MAX_NUMBER_BITS";

    /// The default limits, overridden by any `MATHCHECK_*` environment
    /// variables that are set.
    pub fn from_env() -> Self {
        let defaults = Limits::default();

        Limits {
            max_input_len: env_or(
                Limits::MAX_INPUT_LEN_VAR,
                defaults.max_input_len,
            ),
            max_depth: env_or(Limits::MAX_DEPTH_VAR, defaults.max_depth),
            max_exponent: env_or(
                Limits::MAX_EXPONENT_VAR,
                defaults.max_exponent,
            ),
            max_number_bits: env_or(
                Limits::MAX_NUMBER_BITS_VAR,
                defaults.max_number_bits,
            ),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_input_len: 4096,
            max_depth: 128,
            max_exponent: 10_000,
            max_number_bits: 1 << 16,
        }
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => {
                log::debug!("Using {}={}", name, raw.trim());
                value
            },
            Err(_) => {
                log::warn!("Ignoring {}, \"{}\" is not a valid value", name, raw);
                default
            },
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_the_defaults() {
        let got: Limits = serde_json::from_str(r#"{ "max_depth": 8 }"#).unwrap();

        let should_be = Limits {
            max_depth: 8,
            ..Limits::default()
        };
        assert_eq!(got, should_be);
    }

    #[test]
    fn unparseable_values_fall_back_to_the_default() {
        let name = "MATHCHECK_TEST_UNPARSEABLE";
        env::set_var(name, "lots");

        let got: usize = env_or(name, 42);

        assert_eq!(got, 42);
        env::remove_var(name);
    }

    #[test]
    fn environment_values_are_trimmed_and_parsed() {
        let name = "MATHCHECK_TEST_TRIMMED";
        env::set_var(name, " 16 ");

        let got: usize = env_or(name, 42);

        assert_eq!(got, 16);
        env::remove_var(name);
    }
}

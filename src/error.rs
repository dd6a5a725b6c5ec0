//! Error types and handling for the calc-rs crate.
//!
//! Every failure the evaluator can produce is a [`CalcError`]. Callers that only
//! care about the broad category (what to show the user, whether the input was
//! rejected by the sandbox) can use [`CalcError::kind`].

extern crate alloc;

use alloc::string::{String, ToString};
use core::fmt;
use core::num::{ParseFloatError, ParseIntError};

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, CalcError>;

/// Error type for expression rewriting, parsing, evaluation and the keypad session.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    /// The text does not form a valid arithmetic expression.
    ///
    /// Trailing operators, empty input, stray separators and unexpected tokens
    /// all end up here. The string holds a message with the offending position.
    Syntax(String),

    /// A parenthesis without its partner.
    UnmatchedParenthesis { position: usize, found: String },

    /// A numeric literal that could not be read, such as `1e` or `2e+`.
    InvalidNumber(String),

    /// A whitelisted function called with the wrong number of arguments.
    ///
    /// This is also what `mod` reports when fewer than two operands are present.
    InvalidFunctionCall {
        /// User-facing name of the function (`sqrt`, `mod`, ...)
        name: String,
        /// Expected number of arguments
        expected: usize,
        /// Actual number of arguments provided
        found: usize,
    },

    /// An argument outside the mathematical domain of a function, or a result
    /// that cannot be represented as a finite number.
    Domain {
        /// Function or operator that failed
        function: &'static str,
        /// Human readable reason
        message: &'static str,
    },

    /// Division or modulo by zero, including `0 ** -1`.
    DivideByZero,

    /// The expression references something outside the whitelist: an unknown
    /// name, an attribute, a string literal, a comparison, etc.
    Disallowed { construct: String },

    /// Nesting too deep to evaluate safely.
    RecursionLimit(String),

    /// A bounded buffer (display or history) is full.
    CapacityExceeded(&'static str),
}

/// Coarse classification of [`CalcError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input.
    Syntax,
    /// Argument outside a function's domain or result out of range.
    Domain,
    /// Division or modulo by zero.
    Division,
    /// Sandbox violation.
    DisallowedConstruct,
}

impl CalcError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::Syntax(_)
            | CalcError::UnmatchedParenthesis { .. }
            | CalcError::InvalidNumber(_)
            | CalcError::InvalidFunctionCall { .. }
            | CalcError::RecursionLimit(_)
            | CalcError::CapacityExceeded(_) => ErrorKind::Syntax,
            CalcError::Domain { .. } => ErrorKind::Domain,
            CalcError::DivideByZero => ErrorKind::Division,
            CalcError::Disallowed { .. } => ErrorKind::DisallowedConstruct,
        }
    }

    pub(crate) fn domain(function: &'static str) -> Self {
        CalcError::Domain {
            function,
            message: "math domain error",
        }
    }

    pub(crate) fn range(function: &'static str) -> Self {
        CalcError::Domain {
            function,
            message: "math range error",
        }
    }

    pub(crate) fn disallowed(construct: impl Into<String>) -> Self {
        CalcError::Disallowed {
            construct: construct.into(),
        }
    }
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcError::Syntax(err) => write!(f, "Syntax error: {}", err),
            CalcError::UnmatchedParenthesis { position, found } => {
                write!(
                    f,
                    "Unmatched parenthesis at position {}: found '{}'",
                    position, found
                )
            }
            CalcError::InvalidNumber(text) => write!(f, "Invalid number: '{}'", text),
            CalcError::InvalidFunctionCall {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Invalid function call to '{}': expected {} arguments, found {}",
                    name, expected, found
                )
            }
            CalcError::Domain { function, message } => write!(f, "{} ({})", message, function),
            CalcError::DivideByZero => write!(f, "Division by zero"),
            CalcError::Disallowed { construct } => write!(f, "Not allowed: {}", construct),
            CalcError::RecursionLimit(err) => write!(f, "Recursion limit exceeded: {}", err),
            CalcError::CapacityExceeded(container) => {
                write!(f, "Capacity exceeded for {}", container)
            }
        }
    }
}

impl core::error::Error for CalcError {}

impl From<ParseFloatError> for CalcError {
    fn from(err: ParseFloatError) -> CalcError {
        CalcError::InvalidNumber(err.to_string())
    }
}

impl From<ParseIntError> for CalcError {
    fn from(err: ParseIntError) -> CalcError {
        CalcError::InvalidNumber(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(CalcError::Syntax("x".to_string()).kind(), ErrorKind::Syntax);
        assert_eq!(
            CalcError::InvalidFunctionCall {
                name: "mod".to_string(),
                expected: 2,
                found: 1
            }
            .kind(),
            ErrorKind::Syntax
        );
        assert_eq!(CalcError::domain("sqrt").kind(), ErrorKind::Domain);
        assert_eq!(CalcError::range("exp").kind(), ErrorKind::Domain);
        assert_eq!(CalcError::DivideByZero.kind(), ErrorKind::Division);
        assert_eq!(
            CalcError::disallowed("name 'os'").kind(),
            ErrorKind::DisallowedConstruct
        );
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CalcError::domain("sqrt").to_string(),
            "math domain error (sqrt)"
        );
        assert_eq!(CalcError::DivideByZero.to_string(), "Division by zero");
        assert_eq!(
            CalcError::disallowed("name 'os'").to_string(),
            "Not allowed: name 'os'"
        );
    }

    #[test]
    fn test_from_parse_errors() {
        let err: CalcError = "1e".parse::<f64>().unwrap_err().into();
        assert!(matches!(err, CalcError::InvalidNumber(_)));
        let err: CalcError = "x".parse::<i64>().unwrap_err().into();
        assert!(matches!(err, CalcError::InvalidNumber(_)));
    }
}

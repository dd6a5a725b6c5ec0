//! Numeric values produced by the evaluator.
//!
//! Integer literals stay integers through `+`, `-`, `*`, `%` and `**` with a
//! non-negative integer exponent. True division and every named function
//! produce floats. An integer operation that would overflow `i64` falls back to
//! floating point instead of wrapping.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;

use crate::Real;
use crate::error::{CalcError, Result};
use crate::functions;

/// A number flowing through the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(Real),
}

impl Value {
    /// Converts the value to floating point.
    pub fn as_real(self) -> Real {
        match self {
            Value::Int(i) => i as Real,
            Value::Float(f) => f,
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, Value::Int(_))
    }

    fn is_zero(self) -> bool {
        match self {
            Value::Int(i) => i == 0,
            Value::Float(f) => f == 0.0,
        }
    }

    /// Wraps a float result, rejecting infinities and NaN.
    pub(crate) fn finite(value: Real, operation: &'static str) -> Result<Value> {
        if value.is_finite() {
            Ok(Value::Float(value))
        } else {
            Err(CalcError::range(operation))
        }
    }

    pub fn neg(self) -> Value {
        match self {
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .unwrap_or(Value::Float(-(i as Real))),
            Value::Float(f) => Value::Float(-f),
        }
    }

    pub fn add(self, rhs: Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => match a.checked_add(b) {
                Some(sum) => Ok(Value::Int(sum)),
                None => Value::finite(a as Real + b as Real, "+"),
            },
            (a, b) => Value::finite(a.as_real() + b.as_real(), "+"),
        }
    }

    pub fn sub(self, rhs: Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => match a.checked_sub(b) {
                Some(diff) => Ok(Value::Int(diff)),
                None => Value::finite(a as Real - b as Real, "-"),
            },
            (a, b) => Value::finite(a.as_real() - b.as_real(), "-"),
        }
    }

    pub fn mul(self, rhs: Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => match a.checked_mul(b) {
                Some(product) => Ok(Value::Int(product)),
                None => Value::finite(a as Real * b as Real, "*"),
            },
            (a, b) => Value::finite(a.as_real() * b.as_real(), "*"),
        }
    }

    /// True division; always yields a float.
    pub fn div(self, rhs: Value) -> Result<Value> {
        if rhs.is_zero() {
            return Err(CalcError::DivideByZero);
        }
        Value::finite(self.as_real() / rhs.as_real(), "/")
    }

    /// Flooring remainder: the result takes the sign of the divisor.
    pub fn rem(self, rhs: Value) -> Result<Value> {
        if rhs.is_zero() {
            return Err(CalcError::DivideByZero);
        }
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => match a.checked_rem(b) {
                Some(r) if r != 0 && ((r < 0) != (b < 0)) => Ok(Value::Int(r + b)),
                Some(r) => Ok(Value::Int(r)),
                // i64::MIN % -1
                None => Ok(Value::Int(0)),
            },
            (a, b) => functions::fmod(a.as_real(), b.as_real()).map(Value::Float),
        }
    }

    pub fn pow(self, rhs: Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Int(base), Value::Int(exponent)) if exponent >= 0 => {
                let exact = u32::try_from(exponent)
                    .ok()
                    .and_then(|e| base.checked_pow(e));
                match exact {
                    Some(power) => Ok(Value::Int(power)),
                    None => float_pow(base as Real, exponent as Real),
                }
            }
            (base, exponent) => float_pow(base.as_real(), exponent.as_real()),
        }
    }
}

fn float_pow(base: Real, exponent: Real) -> Result<Value> {
    if base == 0.0 && exponent < 0.0 {
        return Err(CalcError::DivideByZero);
    }
    if base < 0.0 && exponent != functions::trunc(exponent) {
        return Err(CalcError::domain("**"));
    }
    Value::finite(functions::pow(base, exponent), "**")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_real(*x)),
        }
    }
}

/// Renders a float the way the calculator display shows it.
///
/// The shortest representation that reads back to the same value, always with a
/// decimal point or an exponent (`3.0`, `0.1`, `1e+16`, `2.5e-07`).
pub fn format_real(value: Real) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = format!("{:?}", value);
    match text.find('e') {
        Some(idx) => {
            let (mantissa, exponent) = (&text[..idx], &text[idx + 1..]);
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(3.0), "3.0");
        assert_eq!(format_real(0.5), "0.5");
        assert_eq!(format_real(-0.25), "-0.25");
        assert_eq!(format_real(1e16), "1e+16");
        assert_eq!(format_real(1e-5), "1e-05");
        assert_eq!(format_real(1.5e300), "1.5e+300");
        assert_eq!(format_real(0.0001), "0.0001");
    }

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        assert_eq!(Value::Int(2).add(Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(Value::Int(2).mul(Value::Int(3)).unwrap(), Value::Int(6));
        assert_eq!(Value::Int(2).pow(Value::Int(10)).unwrap(), Value::Int(1024));
        assert_eq!(Value::Int(6).div(Value::Int(3)).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn test_overflow_promotes_to_float() {
        let big = Value::Int(i64::MAX).add(Value::Int(1)).unwrap();
        assert!(!big.is_int());
        let huge = Value::Int(10).pow(Value::Int(30)).unwrap();
        assert!(!huge.is_int());
    }

    #[test]
    fn test_flooring_remainder() {
        assert_eq!(Value::Int(5).rem(Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(Value::Int(-7).rem(Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(Value::Int(7).rem(Value::Int(-3)).unwrap(), Value::Int(-2));
        assert_eq!(Value::Int(6).rem(Value::Int(3)).unwrap(), Value::Int(0));
        assert_eq!(
            Value::Float(-7.5).rem(Value::Int(2)).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_zero_divisors() {
        assert_eq!(Value::Int(1).div(Value::Int(0)), Err(CalcError::DivideByZero));
        assert_eq!(
            Value::Int(1).rem(Value::Float(0.0)),
            Err(CalcError::DivideByZero)
        );
        assert_eq!(Value::Int(0).pow(Value::Int(-1)), Err(CalcError::DivideByZero));
    }

    #[test]
    fn test_negative_base_fractional_exponent() {
        let err = Value::Int(-8).pow(Value::Float(0.5)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Domain);
        assert_eq!(Value::Int(-2).pow(Value::Int(3)).unwrap(), Value::Int(-8));
        assert_eq!(
            Value::Int(2).pow(Value::Int(-1)).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_negation() {
        assert_eq!(Value::Int(3).neg(), Value::Int(-3));
        assert!(!Value::Int(i64::MIN).neg().is_int());
        assert_eq!(Value::Float(1.5).neg(), Value::Float(-1.5));
    }
}

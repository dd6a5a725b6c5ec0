//! Whitelisted mathematical functions.
//!
//! These are the only functions an expression can call. Each wrapper checks the
//! mathematical domain of its argument before delegating to the math backend, so
//! `sqrt(-1)` or `ln(0)` become [`CalcError::Domain`] values instead of NaN or
//! infinity leaking into a result.
//!
//! The backend is the `libm` crate by default, which keeps the evaluator usable in
//! no_std builds. Without the `libm` feature the standard library float methods
//! are used. Depending on the selected floating-point precision (the `f32`
//! feature), the single or double precision variants are picked.

extern crate alloc;

use alloc::string::ToString;

use crate::Real;
use crate::error::{CalcError, Result};
use crate::types::MathFunction;

#[cfg(all(feature = "libm", not(feature = "f32")))]
mod backend {
    pub use libm::{exp, fmod, log as ln, log2, log10, pow, sqrt, trunc};
}

#[cfg(all(feature = "libm", feature = "f32"))]
mod backend {
    pub use libm::{
        expf as exp, fmodf as fmod, log2f as log2, log10f as log10, logf as ln, powf as pow,
        sqrtf as sqrt, truncf as trunc,
    };
}

#[cfg(not(feature = "libm"))]
mod backend {
    use crate::Real;

    pub fn exp(x: Real) -> Real {
        x.exp()
    }
    pub fn fmod(x: Real, y: Real) -> Real {
        x % y
    }
    pub fn ln(x: Real) -> Real {
        x.ln()
    }
    pub fn log2(x: Real) -> Real {
        x.log2()
    }
    pub fn log10(x: Real) -> Real {
        x.log10()
    }
    pub fn pow(x: Real, y: Real) -> Real {
        x.powf(y)
    }
    pub fn sqrt(x: Real) -> Real {
        x.sqrt()
    }
    pub fn trunc(x: Real) -> Real {
        x.trunc()
    }
}

/// Square root. Negative inputs are a domain error.
///
/// # Examples
///
/// ```
/// use calc_rs::functions::sqrt;
///
/// assert_eq!(sqrt(9.0).unwrap(), 3.0);
/// assert!(sqrt(-1.0).is_err());
/// ```
pub fn sqrt(x: Real) -> Result<Real> {
    if x < 0.0 {
        return Err(CalcError::domain("sqrt"));
    }
    Ok(backend::sqrt(x))
}

/// Alias of [`sqrt`] kept for the keypad's long-form label.
pub fn square_root(x: Real) -> Result<Real> {
    sqrt(x)
}

/// Exponential function. A result too large to represent is a range error.
pub fn exp(x: Real) -> Result<Real> {
    let result = backend::exp(x);
    if result.is_infinite() {
        return Err(CalcError::range("exp"));
    }
    Ok(result)
}

/// Base-10 logarithm, defined for positive inputs only.
pub fn log10(x: Real) -> Result<Real> {
    if x <= 0.0 {
        return Err(CalcError::domain("log10"));
    }
    Ok(backend::log10(x))
}

/// Base-2 logarithm, defined for positive inputs only.
pub fn log2(x: Real) -> Result<Real> {
    if x <= 0.0 {
        return Err(CalcError::domain("log2"));
    }
    Ok(backend::log2(x))
}

/// Natural logarithm, defined for positive inputs only.
pub fn ln(x: Real) -> Result<Real> {
    if x <= 0.0 {
        return Err(CalcError::domain("ln"));
    }
    Ok(backend::ln(x))
}

/// Flooring modulo: the result has the sign of `y`.
///
/// `fmod(-7.0, 3.0)` is `2.0` and `fmod(7.0, -3.0)` is `-2.0`. A zero divisor is
/// [`CalcError::DivideByZero`].
pub fn fmod(x: Real, y: Real) -> Result<Real> {
    if y == 0.0 {
        return Err(CalcError::DivideByZero);
    }
    let r = backend::fmod(x, y);
    if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
        Ok(r + y)
    } else {
        Ok(r)
    }
}

/// Calls `function` with already evaluated arguments.
///
/// A wrong number of arguments is [`CalcError::InvalidFunctionCall`]. A result
/// that is not a finite number is a range error.
pub fn apply(function: MathFunction, args: &[Real]) -> Result<Real> {
    let result = match (function, args) {
        (MathFunction::Exp, [x]) => exp(*x),
        (MathFunction::Log10, [x]) => log10(*x),
        (MathFunction::Log2, [x]) => log2(*x),
        (MathFunction::Ln, [x]) => ln(*x),
        (MathFunction::Sqrt, [x]) => sqrt(*x),
        (MathFunction::Fmod, [x, y]) => fmod(*x, *y),
        _ => Err(CalcError::InvalidFunctionCall {
            name: function.key_name().to_string(),
            expected: function.arity(),
            found: args.len(),
        }),
    }?;
    if !result.is_finite() {
        return Err(CalcError::range(function.key_name()));
    }
    Ok(result)
}

pub(crate) fn pow(base: Real, exponent: Real) -> Real {
    backend::pow(base, exponent)
}

pub(crate) fn trunc(x: Real) -> Real {
    backend::trunc(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use crate::constants::{E, TEST_PRECISION};
    use crate::error::ErrorKind;

    #[test]
    fn test_sqrt_and_square_root_agree() {
        assert_eq!(sqrt(16.0).unwrap(), 4.0);
        assert_eq!(square_root(16.0).unwrap(), 4.0);
        assert_eq!(sqrt(0.0).unwrap(), 0.0);
        assert_eq!(sqrt(-4.0).unwrap_err().kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_logarithms() {
        assert_approx_eq!(log10(1000.0).unwrap(), 3.0 as Real, TEST_PRECISION);
        assert_approx_eq!(log2(1024.0).unwrap(), 10.0 as Real, TEST_PRECISION);
        assert_approx_eq!(ln(E).unwrap(), 1.0 as Real, TEST_PRECISION);
        for f in [log10, log2, ln] {
            assert_eq!(f(0.0).unwrap_err().kind(), ErrorKind::Domain);
            assert_eq!(f(-1.0).unwrap_err().kind(), ErrorKind::Domain);
        }
    }

    #[test]
    fn test_exp() {
        assert_eq!(exp(0.0).unwrap(), 1.0);
        assert_approx_eq!(exp(1.0).unwrap(), E, TEST_PRECISION);
        assert_eq!(exp(1.0e6).unwrap_err(), CalcError::range("exp"));
        assert_eq!(exp(-1.0e6).unwrap(), 0.0);
    }

    #[test]
    fn test_fmod_floors() {
        assert_eq!(fmod(5.0, 3.0).unwrap(), 2.0);
        assert_eq!(fmod(-7.0, 3.0).unwrap(), 2.0);
        assert_eq!(fmod(7.0, -3.0).unwrap(), -2.0);
        assert_eq!(fmod(-6.0, 3.0).unwrap(), 0.0);
        assert_eq!(fmod(1.0, 0.0), Err(CalcError::DivideByZero));
    }

    #[test]
    fn test_apply_dispatch_and_arity() {
        assert_eq!(apply(MathFunction::Sqrt, &[25.0]).unwrap(), 5.0);
        assert_eq!(apply(MathFunction::Fmod, &[7.0, 3.0]).unwrap(), 1.0);
        assert_eq!(
            apply(MathFunction::Fmod, &[7.0]).unwrap_err(),
            CalcError::InvalidFunctionCall {
                name: "mod".to_string(),
                expected: 2,
                found: 1,
            }
        );
        assert!(apply(MathFunction::Ln, &[]).is_err());
    }

    #[test]
    fn test_apply_rejects_non_finite_results() {
        assert_eq!(
            apply(MathFunction::Ln, &[Real::INFINITY]).unwrap_err(),
            CalcError::range("ln")
        );
        assert_eq!(
            apply(MathFunction::Sqrt, &[Real::INFINITY]).unwrap_err(),
            CalcError::range("sqrt")
        );
        assert!(apply(MathFunction::Exp, &[Real::NAN]).is_err());
    }
}

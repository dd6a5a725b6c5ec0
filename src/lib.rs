#![cfg_attr(all(not(test), target_arch = "arm"), no_std)]
#![doc = r#"
# calc-rs

A small, sandboxed, no_std-friendly calculator expression evaluator.

## Overview

calc-rs turns the text typed on a calculator keypad into a result string. An
expression may use numbers, the arithmetic operators, parentheses and a fixed
set of named functions. Nothing else is reachable: there are no variables, no
attribute access and no way to call anything outside the function whitelist.

Key features:
- Integer arithmetic stays exact, true division and functions produce floats
- Short function names (`sqrt`, `ln`, `mod`, ...) as printed on the keys
- Domain errors (`sqrt(-1)`, `ln(0)`) reported as errors, never as NaN
- Errors classified as syntax, domain, division or disallowed construct
- A headless keypad [`Session`] with a bounded display and history
- Configurable floating-point precision (f32/f64)
- No_std compatibility with the `alloc` crate

## Quick Start

```rust
use calc_rs::engine::{calculate, evaluate};

assert_eq!(evaluate("2 + 3 * 4").unwrap(), "14");
assert_eq!(evaluate("7 / 2").unwrap(), "3.5");
assert_eq!(evaluate("2 + sqrt(9)").unwrap(), "5.0");
assert_eq!(calculate("sqrt(-1)"), "Error: math domain error (sqrt)");
```

## Keypad Sessions

```rust
use calc_rs::session::Session;

let mut session = Session::new();
for label in ["1", "2", "+", "sqrt", "4", ")", "="] {
    session.press_label(label).unwrap();
}
assert_eq!(session.display(), "14.0");
assert_eq!(session.render_history().lines().next(), Some("12+sqrt(4) = 14.0"));
```

## Supported Grammar

### Operator Precedence and Associativity

From lowest to highest precedence:

| Precedence | Operators             | Associativity |
|------------|-----------------------|---------------|
| 1          | `+` `-`               | Left          |
| 2          | `*` `/` `%` `mod`     | Left          |
| 3          | unary `+` `-`         | Right (unary) |
| 4          | `**` `^`              | Right         |

Exponentiation binds tighter than a unary minus on its left, so `-2 ** 2` is
`-4`, while `2 ** -1` is `0.5`.

### Functions

| Key     | Meaning                           |
|---------|-----------------------------------|
| `exp`   | e raised to the argument          |
| `ln`    | natural logarithm                 |
| `log10` | base-10 logarithm                 |
| `log2`  | base-2 logarithm                  |
| `sqrt`  | square root                       |
| `mod`   | flooring modulo, `a mod b` or `mod(a, b)` |

## Error Handling

```rust
use calc_rs::engine::evaluate;
use calc_rs::error::{CalcError, ErrorKind};

assert_eq!(evaluate("1 / 0").unwrap_err(), CalcError::DivideByZero);
assert_eq!(evaluate("2 +").unwrap_err().kind(), ErrorKind::Syntax);
assert_eq!(evaluate("log10(-5)").unwrap_err().kind(), ErrorKind::Domain);
assert_eq!(evaluate("x + 1").unwrap_err().kind(), ErrorKind::DisallowedConstruct);
```

## Feature Flags

- `libm` (default): use the `libm` crate for the math functions
- `f32`: use 32-bit floating point (single precision) for calculations

Without `f32`, 64-bit floating point is used.
"#]

extern crate alloc;

pub mod engine;
pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod rewrite;
pub mod session;
pub mod types;
pub mod value;

pub use engine::{calculate, evaluate, interp, parse_expression};
pub use error::{CalcError, ErrorKind};
pub use session::{DisplayState, HistoryEntry, InsertRules, Key, Session};
pub use types::{AstExpr, BinaryOperator, MathFunction, UnaryOperator};
pub use value::Value;

#[cfg(all(target_arch = "arm", not(feature = "libm")))]
compile_error!("The 'libm' feature is required on targets without std.");

/// Define the floating-point type based on feature flags
#[cfg(feature = "f32")]
pub type Real = f32;

#[cfg(not(feature = "f32"))]
pub type Real = f64;

pub mod constants {
    use super::Real;

    #[cfg(feature = "f32")]
    pub const PI: Real = core::f32::consts::PI;
    #[cfg(feature = "f32")]
    pub const E: Real = core::f32::consts::E;
    #[cfg(feature = "f32")]
    pub const TEST_PRECISION: Real = 1e-6;

    #[cfg(not(feature = "f32"))]
    pub const PI: Real = core::f64::consts::PI;
    #[cfg(not(feature = "f32"))]
    pub const E: Real = core::f64::consts::E;
    #[cfg(not(feature = "f32"))]
    pub const TEST_PRECISION: Real = 1e-10;
}

/// Checks that two floating point values are equal within an epsilon.
/// Accepts an optional message like `assert_eq!`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $crate::constants::TEST_PRECISION)
    };
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {
        $crate::assert_approx_eq!(
            $left,
            $right,
            $epsilon,
            "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`)",
            $left,
            $right,
            $epsilon
        )
    };
    ($left:expr, $right:expr, $epsilon:expr, $($arg:tt)+) => {{
        let left_val = $left;
        let right_val = $right;
        let eps = $epsilon;

        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.signum() == right_val.signum()
        {
            // Same-signed infinities are equal
        } else {
            assert!((left_val - right_val).abs() < eps, $($arg)+);
        }
    }};
}
